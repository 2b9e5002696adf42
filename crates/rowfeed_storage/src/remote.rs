//! Remote directory session configuration.
//!
//! RowFeed does not ship a file-transfer client. A remote directory is
//! reached through a [`RemoteConnector`] supplied by the application, which
//! opens one session from a [`RemoteConfig`] and hands back a
//! [`DirectorySource`]. The session lives as long as the engine that owns it
//! and is released through [`DirectorySource::close`].
//!
//! ## Credential Handling
//!
//! - Passwords and key passphrases are held in [`Zeroizing`] buffers
//! - `Debug` output never contains secret material
//! - Credentials are validated before a connector is invoked

use crate::error::{StorageError, StorageResult};
use crate::source::DirectorySource;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Default port of a remote file-transfer session.
pub const DEFAULT_PORT: u16 = 22;

/// Authentication material for a remote session.
#[derive(Clone)]
pub enum Credential {
    /// Password authentication.
    Password(Zeroizing<String>),
    /// Private key authentication.
    KeyFile {
        /// Path of the private key.
        path: PathBuf,
        /// Optional passphrase protecting the key.
        passphrase: Option<Zeroizing<String>>,
    },
}

impl Credential {
    /// Creates a password credential.
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password(Zeroizing::new(password.into()))
    }

    /// Creates a key credential without a passphrase.
    pub fn key_file(path: impl Into<PathBuf>) -> Self {
        Self::KeyFile {
            path: path.into(),
            passphrase: None,
        }
    }

    /// Creates a key credential protected by a passphrase.
    pub fn key_file_with_passphrase(path: impl Into<PathBuf>, passphrase: impl Into<String>) -> Self {
        Self::KeyFile {
            path: path.into(),
            passphrase: Some(Zeroizing::new(passphrase.into())),
        }
    }

    /// Returns the credential type (`"password"` or `"key"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::KeyFile { .. } => "key",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.debug_tuple("Password").field(&"[REDACTED]").finish(),
            Self::KeyFile { path, passphrase } => f
                .debug_struct("KeyFile")
                .field("path", path)
                .field("passphrase", &passphrase.as_ref().map(|_| "[REDACTED]"))
                .finish(),
        }
    }
}

/// Connection settings for one remote directory session.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// User to authenticate as.
    pub username: String,
    /// Authentication material.
    pub credential: Credential,
}

impl RemoteConfig {
    /// Creates a configuration using [`DEFAULT_PORT`].
    pub fn new(host: impl Into<String>, username: impl Into<String>, credential: Credential) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            credential,
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks that every required setting is present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] naming the first missing or
    /// invalid setting.
    pub fn validate(&self) -> StorageResult<()> {
        if self.host.trim().is_empty() {
            return Err(StorageError::InvalidConfig("host is empty".into()));
        }
        if self.port == 0 {
            return Err(StorageError::InvalidConfig("port must be non-zero".into()));
        }
        if self.username.trim().is_empty() {
            return Err(StorageError::InvalidConfig("username is empty".into()));
        }
        match &self.credential {
            Credential::Password(password) if password.is_empty() => {
                Err(StorageError::InvalidConfig("password is empty".into()))
            }
            Credential::KeyFile { path, .. } if path.as_os_str().is_empty() => {
                Err(StorageError::InvalidConfig("key path is empty".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Opens remote directory sessions.
///
/// Implementations wrap a concrete file-transfer client. They are called
/// once per engine; the returned source is used until the engine is closed
/// and is never reconnected.
pub trait RemoteConnector {
    /// Opens a session described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Authentication`] when the remote side rejects
    /// the credential, or an I/O error when the host is unreachable.
    fn connect(&self, config: &RemoteConfig) -> StorageResult<Box<dyn DirectorySource>>;
}

impl<F> RemoteConnector for F
where
    F: Fn(&RemoteConfig) -> StorageResult<Box<dyn DirectorySource>>,
{
    fn connect(&self, config: &RemoteConfig) -> StorageResult<Box<dyn DirectorySource>> {
        self(config)
    }
}

/// Validates `config` and opens a session with `connector`.
///
/// # Errors
///
/// Returns the validation error, or whatever the connector reports.
pub fn connect(
    connector: &dyn RemoteConnector,
    config: &RemoteConfig,
) -> StorageResult<Box<dyn DirectorySource>> {
    config.validate()?;
    connector.connect(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDirectory;

    #[test]
    fn default_port() {
        let config = RemoteConfig::new("files.example.com", "tester", Credential::password("pw"));
        assert_eq!(config.port, 22);
        assert_eq!(config.address(), "files.example.com:22");
        assert_eq!(config.with_port(2222).address(), "files.example.com:2222");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = RemoteConfig::new("h", "u", Credential::password("hunter2"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));

        let key = Credential::key_file_with_passphrase("/keys/id", "s3cret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("/keys/id"));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let empty_host = RemoteConfig::new(" ", "u", Credential::password("p"));
        assert!(matches!(empty_host.validate(), Err(StorageError::InvalidConfig(_))));

        let empty_user = RemoteConfig::new("h", "", Credential::password("p"));
        assert!(matches!(empty_user.validate(), Err(StorageError::InvalidConfig(_))));

        let empty_password = RemoteConfig::new("h", "u", Credential::password(""));
        assert!(matches!(empty_password.validate(), Err(StorageError::InvalidConfig(_))));

        let zero_port = RemoteConfig::new("h", "u", Credential::key_file("/k")).with_port(0);
        assert!(matches!(zero_port.validate(), Err(StorageError::InvalidConfig(_))));

        let ok = RemoteConfig::new("h", "u", Credential::key_file("/k"));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn connect_skips_connector_on_invalid_config() {
        let connector = |_: &RemoteConfig| -> StorageResult<Box<dyn DirectorySource>> {
            panic!("connector must not be called")
        };
        let config = RemoteConfig::new("", "u", Credential::password("p"));
        assert!(connect(&connector, &config).is_err());
    }

    #[test]
    fn connector_errors_pass_through() {
        let connector = |config: &RemoteConfig| -> StorageResult<Box<dyn DirectorySource>> {
            Err(StorageError::Authentication {
                host: config.host.clone(),
                user: config.username.clone(),
                message: "permission denied".into(),
            })
        };
        let config = RemoteConfig::new("h", "tester", Credential::password("wrong"));
        let err = connect(&connector, &config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "authentication failed for tester@h: permission denied"
        );
    }

    #[test]
    fn connect_uses_connector() {
        let connector = |config: &RemoteConfig| -> StorageResult<Box<dyn DirectorySource>> {
            assert_eq!(config.username, "tester");
            Ok(Box::new(InMemoryDirectory::with_dirs(["/out"])))
        };
        let config = RemoteConfig::new("h", "tester", Credential::password("p"));
        let source = connect(&connector, &config).unwrap();
        assert_eq!(source.describe(), "memory");
    }
}
