//! Persists the freshness token of the last successful run so the next run
//! can ask Onionoo for changes only (If-Modified-Since).

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(thiserror::Error, Debug)]
pub enum TimestampError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub trait TimestampStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TimestampError>;
    fn store(&self, token: &str) -> Result<(), TimestampError>;
}

/// Never remembers anything, so every run does a full fetch.
pub struct NoopTimestampStore;

impl TimestampStore for NoopTimestampStore {
    fn load(&self) -> Result<Option<String>, TimestampError> {
        Ok(None)
    }

    fn store(&self, _token: &str) -> Result<(), TimestampError> {
        Ok(())
    }
}

pub struct FilesystemTimestampStore {
    path: PathBuf,
}

impl FilesystemTimestampStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FilesystemTimestampStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: io::Error) -> TimestampError {
        TimestampError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TimestampStore for FilesystemTimestampStore {
    fn load(&self) -> Result<Option<String>, TimestampError> {
        match fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn store(&self, token: &str) -> Result<(), TimestampError> {
        fs::write(&self.path, token).map_err(|err| self.io_error(err))?;
        tracing::debug!(path = ?self.path, token, "Stored freshness token");
        Ok(())
    }
}

pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

pub fn http_date_now() -> String {
    http_date(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date() {
        let time = Utc.with_ymd_and_hms(2019, 10, 3, 12, 0, 0).unwrap();
        assert_eq!(http_date(time), "Thu, 03 Oct 2019 12:00:00 GMT");
    }

    #[test]
    fn test_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemTimestampStore::new(dir.path().join("timestamp"));

        assert_eq!(store.load().unwrap(), None);

        store.store("Thu, 03 Oct 2019 12:00:00 GMT").unwrap();
        assert_eq!(
            store.load().unwrap().as_deref(),
            Some("Thu, 03 Oct 2019 12:00:00 GMT")
        );

        store.store("").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_filesystem_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemTimestampStore::new(dir.path().join("missing").join("timestamp"));

        let err = store.store("token").unwrap_err();
        assert!(matches!(err, TimestampError::Io { .. }));
    }

    #[test]
    fn test_noop() {
        let store = NoopTimestampStore;
        store.store("token").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
