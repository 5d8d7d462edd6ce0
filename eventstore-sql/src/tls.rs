//! Custom TLS parameters for MySQL connections.
//!
//! The parameter bundle is a url-query encoded string, for example
//! `root_cert=/etc/ssl/ca.pem&client_cert=/etc/ssl/client.pem&client_key=/etc/ssl/client.key`.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Parsed custom TLS parameters. Each part is optional and applied independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub root_cert: Option<PathBuf>,
    /// Client certificate and key, always loaded together.
    pub client_identity: Option<(PathBuf, PathBuf)>,
    /// Encrypt without verifying the server certificate (`tls_mode=1`).
    pub insecure: bool,
}

impl TlsConfig {
    /// Parses the bundle, returning `None` for an empty value.
    pub fn parse(value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        let mut root_cert = None;
        let mut client_cert = None;
        let mut client_key = None;
        let mut tls_mode = None;

        for pair in value.split('&').filter(|pair| !pair.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded = urlencoding::decode(&raw.replace('+', " "))
                .map_err(|e| Error::InvalidTlsConfig(format!("unable to decode `{key}`: {e}")))?
                .into_owned();

            let slot = match key {
                "root_cert" => &mut root_cert,
                "client_cert" => &mut client_cert,
                "client_key" => &mut client_key,
                "tls_mode" => &mut tls_mode,
                other => {
                    tracing::warn!(key = other, "ignoring unknown custom tls parameter");
                    continue;
                }
            };

            *slot = Some(decoded).filter(|v| !v.is_empty());
        }

        let insecure = match tls_mode.as_deref() {
            None | Some("0") => false,
            Some("1") => true,
            Some(other) => {
                return Err(Error::InvalidTlsConfig(format!(
                    "unsupported tls_mode `{other}`, expected 0 or 1"
                )))
            }
        };

        let root_cert = root_cert.map(|p| existing_file("root_cert", p)).transpose()?;

        let client_identity = match (client_cert, client_key) {
            (Some(cert), Some(key)) => Some((
                existing_file("client_cert", cert)?,
                existing_file("client_key", key)?,
            )),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::InvalidTlsConfig(
                    "client_cert requires client_key".to_owned(),
                ))
            }
            (None, Some(_)) => {
                return Err(Error::InvalidTlsConfig(
                    "client_key requires client_cert".to_owned(),
                ))
            }
        };

        Ok(Some(Self {
            root_cert,
            client_identity,
            insecure,
        }))
    }

    /// Encryption is always required, server verification unless insecure.
    #[cfg(feature = "mysql")]
    pub(crate) fn ssl_mode(&self) -> sqlx::mysql::MySqlSslMode {
        use sqlx::mysql::MySqlSslMode;

        if self.insecure {
            MySqlSslMode::Required
        } else {
            MySqlSslMode::VerifyIdentity
        }
    }

    #[cfg(feature = "mysql")]
    pub(crate) fn apply(
        &self,
        options: sqlx::mysql::MySqlConnectOptions,
    ) -> sqlx::mysql::MySqlConnectOptions {
        let mut options = options.ssl_mode(self.ssl_mode());

        if let Some(root_cert) = &self.root_cert {
            options = options.ssl_ca(root_cert);
        }

        if let Some((cert, key)) = &self.client_identity {
            options = options.ssl_client_cert(cert).ssl_client_key(key);
        }

        options
    }
}

fn existing_file(key: &str, value: String) -> Result<PathBuf> {
    let path = PathBuf::from(value);
    if !Path::new(&path).is_file() {
        return Err(Error::InvalidTlsConfig(format!(
            "{key} `{}` is not a readable file",
            path.display()
        )));
    }

    Ok(path)
}
