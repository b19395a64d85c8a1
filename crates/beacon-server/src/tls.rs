//! TLS credential resolution.
//!
//! [`CredentialResolver`] turns the `[tls]` settings into a
//! [`ServerCredential`] or "plaintext". Both paths are checked independently
//! before anything is read:
//!
//! 1. an empty path is rejected
//! 2. a relative path is joined to the resolver's base directory
//! 3. the path must exist and must not be a directory
//!
//! The PEM contents are then parsed once. Credentials are never reloaded while
//! the server runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tonic::transport::{Identity, ServerTlsConfig};

use crate::error::CredentialError;

/// TLS settings as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// Whether TLS is requested at all.
    pub enabled: bool,
    /// PEM private key path, absolute or relative.
    pub key_file_path: String,
    /// PEM certificate chain path, absolute or relative.
    pub cert_file_path: String,
}

impl TlsSettings {
    /// Enabled settings for the given key and certificate paths.
    pub fn enabled(key_file_path: impl Into<String>, cert_file_path: impl Into<String>) -> Self {
        Self {
            enabled: true,
            key_file_path: key_file_path.into(),
            cert_file_path: cert_file_path.into(),
        }
    }
}

/// Transport identity loaded from validated PEM files.
#[derive(Debug, Clone)]
pub struct ServerCredential {
    key_path: PathBuf,
    cert_path: PathBuf,
    identity: Identity,
}

impl ServerCredential {
    /// Absolute path of the private key.
    #[must_use]
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Absolute path of the certificate chain.
    #[must_use]
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    /// Server TLS configuration for the transport.
    #[must_use]
    pub fn tls_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(self.identity.clone())
    }
}

/// Resolves [`TlsSettings`] into a [`ServerCredential`].
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    base_dir: PathBuf,
}

impl CredentialResolver {
    /// Resolver that joins relative paths onto `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolver rooted at the process working directory.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Io` if the working directory is unavailable.
    pub fn from_current_dir() -> Result<Self, CredentialError> {
        let cwd = std::env::current_dir().map_err(|e| CredentialError::io(".", e))?;
        Ok(Self::new(cwd))
    }

    /// Directory relative paths are joined onto.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolves settings into a credential.
    ///
    /// Absent or disabled settings yield `Ok(None)` without touching the
    /// filesystem.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if either path is empty
    /// - `PathNotFound` / `NotAFile` if either path does not name a file
    /// - `Io` if a file cannot be read
    /// - `CredentialLoad` if the PEM contents are unusable
    pub fn resolve(
        &self,
        settings: Option<&TlsSettings>,
    ) -> Result<Option<ServerCredential>, CredentialError> {
        let Some(settings) = settings.filter(|s| s.enabled) else {
            tracing::debug!("TLS disabled, serving plaintext");
            return Ok(None);
        };

        let key_path = self.resolve_path("key", &settings.key_file_path)?;
        let cert_path = self.resolve_path("cert", &settings.cert_file_path)?;

        let key_pem = fs::read(&key_path).map_err(|e| CredentialError::io(&key_path, e))?;
        let cert_pem = fs::read(&cert_path).map_err(|e| CredentialError::io(&cert_path, e))?;

        check_pem(&cert_path, &cert_pem, &key_path, &key_pem)?;

        tracing::info!(
            key = %key_path.display(),
            cert = %cert_path.display(),
            "TLS credentials loaded"
        );

        Ok(Some(ServerCredential {
            key_path,
            cert_path,
            identity: Identity::from_pem(cert_pem, key_pem),
        }))
    }

    fn resolve_path(&self, field: &'static str, raw: &str) -> Result<PathBuf, CredentialError> {
        if raw.trim().is_empty() {
            return Err(CredentialError::InvalidPath { field });
        }

        let path = Path::new(raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Err(CredentialError::NotAFile { path }),
            Ok(_) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CredentialError::PathNotFound { path })
            }
            Err(e) => Err(CredentialError::io(path, e)),
        }
    }
}

fn check_pem(
    cert_path: &Path,
    cert_pem: &[u8],
    key_path: &Path,
    key_pem: &[u8],
) -> Result<(), CredentialError> {
    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            CredentialError::CredentialLoad(format!(
                "invalid certificate in {}: {e}",
                cert_path.display()
            ))
        })?;
    if certs.is_empty() {
        return Err(CredentialError::CredentialLoad(format!(
            "no certificate found in {}",
            cert_path.display()
        )));
    }

    match rustls_pemfile::private_key(&mut &key_pem[..]) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(CredentialError::CredentialLoad(format!(
            "no private key found in {}",
            key_path.display()
        ))),
        Err(e) => Err(CredentialError::CredentialLoad(format!(
            "invalid private key in {}: {e}",
            key_path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_PEM: &str = include_str!("../tests/fixtures/server.crt");
    const KEY_PEM: &str = include_str!("../tests/fixtures/server.key");

    fn write_fixtures(dir: &Path) {
        fs::write(dir.join("server.crt"), CERT_PEM).unwrap();
        fs::write(dir.join("server.key"), KEY_PEM).unwrap();
    }

    #[test]
    fn test_absent_settings_yield_plaintext() {
        let resolver = CredentialResolver::new("/nonexistent");
        assert!(resolver.resolve(None).unwrap().is_none());
    }

    #[test]
    fn test_disabled_settings_skip_file_checks() {
        let resolver = CredentialResolver::new("/nonexistent");
        let settings = TlsSettings {
            enabled: false,
            key_file_path: "missing.key".to_string(),
            cert_file_path: String::new(),
        };
        assert!(resolver.resolve(Some(&settings)).unwrap().is_none());
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let resolver = CredentialResolver::new(dir.path());

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("", "server.crt")))
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidPath { field: "key" }));

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("server.key", "  ")))
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidPath { field: "cert" }));
    }

    #[test]
    fn test_missing_cert_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let resolver = CredentialResolver::new(dir.path());

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("server.key", "absent.crt")))
            .unwrap_err();

        let expected = dir.path().join("absent.crt");
        assert!(matches!(err, CredentialError::PathNotFound { ref path } if *path == expected));
        assert!(err.to_string().contains("absent.crt"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        fs::create_dir(dir.path().join("keys")).unwrap();
        let resolver = CredentialResolver::new(dir.path());

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("keys", "server.crt")))
            .unwrap_err();
        assert!(matches!(err, CredentialError::NotAFile { .. }));
    }

    #[test]
    fn test_relative_paths_join_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let resolver = CredentialResolver::new(dir.path());

        let credential = resolver
            .resolve(Some(&TlsSettings::enabled("server.key", "server.crt")))
            .unwrap()
            .expect("credential");

        assert_eq!(credential.key_path(), dir.path().join("server.key"));
        assert_eq!(credential.cert_path(), dir.path().join("server.crt"));
    }

    #[test]
    fn test_absolute_paths_ignore_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let resolver = CredentialResolver::new("/nonexistent");

        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");
        let settings = TlsSettings::enabled(
            key.to_string_lossy().into_owned(),
            cert.to_string_lossy().into_owned(),
        );

        let credential = resolver.resolve(Some(&settings)).unwrap().unwrap();
        assert_eq!(credential.cert_path(), cert);
        let _ = credential.tls_config();
    }

    #[test]
    fn test_garbage_certificate_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        fs::write(dir.path().join("garbage.crt"), "not a certificate").unwrap();
        let resolver = CredentialResolver::new(dir.path());

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("server.key", "garbage.crt")))
            .unwrap_err();
        assert!(matches!(err, CredentialError::CredentialLoad(_)));
    }

    #[test]
    fn test_certificate_as_key_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let resolver = CredentialResolver::new(dir.path());

        let err = resolver
            .resolve(Some(&TlsSettings::enabled("server.crt", "server.crt")))
            .unwrap_err();
        assert!(err.to_string().contains("no private key"));
    }
}
