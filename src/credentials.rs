//! Access-key loading for the bucket client
//!
//! Credentials come either from explicit configuration or from two
//! plaintext files under a credentials directory:
//! - `<dir>/key` — access key id, single line
//! - `<dir>/private_key` — secret access key, single line
//!
//! The default directory is `~/.s3`; the client config can point at a
//! different directory, which keeps tests off the real home directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name holding the access key id.
pub const ACCESS_KEY_FILE: &str = "key";

/// File name holding the secret access key.
pub const SECRET_KEY_FILE: &str = "private_key";

/// Directory credential files are read from when none is configured.
pub fn default_credentials_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".s3"))
        .unwrap_or_else(|| PathBuf::from(".s3"))
}

/// A static access-key pair for the storage service.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Read both credential files from `dir`.
    ///
    /// Both files must exist and be readable; partial presence is an
    /// error. File contents are trimmed to a single line.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        tracing::debug!("loading credentials from {:?}", dir);

        let access_path = dir.join(ACCESS_KEY_FILE);
        let secret_path = dir.join(SECRET_KEY_FILE);

        if !access_path.is_file() || !secret_path.is_file() {
            return Err(Error::CredentialsNotFound {
                dir: dir.to_path_buf(),
            });
        }

        Ok(Self {
            access_key_id: read_single_line(&access_path, dir)?,
            secret_access_key: read_single_line(&secret_path, dir)?,
        })
    }
}

fn read_single_line(path: &Path, dir: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|_| Error::CredentialsNotFound {
        dir: dir.to_path_buf(),
    })?;
    Ok(contents.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_credential_files(dir: &Path, access: &str, secret: &str) {
        fs::write(dir.join(ACCESS_KEY_FILE), access).unwrap();
        fs::write(dir.join(SECRET_KEY_FILE), secret).unwrap();
    }

    #[test]
    fn test_load_both_files() {
        let dir = tempfile::tempdir().unwrap();
        write_credential_files(dir.path(), "AKIAEXAMPLE", "wJalrXUtnFEMI");

        let credentials = Credentials::load_from_dir(dir.path()).unwrap();
        assert_eq!(credentials.access_key_id, "AKIAEXAMPLE");
        assert_eq!(credentials.secret_access_key, "wJalrXUtnFEMI");
    }

    #[test]
    fn test_trims_whitespace_and_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        write_credential_files(dir.path(), "AKIAEXAMPLE\n", "  wJalrXUtnFEMI \n");

        let credentials = Credentials::load_from_dir(dir.path()).unwrap();
        assert_eq!(credentials.access_key_id, "AKIAEXAMPLE");
        assert_eq!(credentials.secret_access_key, "wJalrXUtnFEMI");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = Credentials::load_from_dir(&missing).unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound { .. }));
    }

    #[test]
    fn test_missing_access_key_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SECRET_KEY_FILE), "secret").unwrap();

        let err = Credentials::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound { .. }));
    }

    #[test]
    fn test_missing_secret_key_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ACCESS_KEY_FILE), "access").unwrap();

        let err = Credentials::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound { .. }));
    }

    #[test]
    fn test_reported_directory_is_the_one_searched() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("elsewhere");

        match Credentials::load_from_dir(&missing).unwrap_err() {
            Error::CredentialsNotFound { dir } => assert_eq!(dir, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_dir_is_dot_s3() {
        let dir = default_credentials_dir();
        assert!(dir.ends_with(".s3"));
    }
}
