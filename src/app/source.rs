// ActionBoard - app/source.rs
//
// Raw retrieval of the source payload and parsing into a RecordSet.
//
// HTTP(S) sources use a blocking reqwest client with a bounded timeout.
// `file://` URLs and plain paths are read from disk.

use crate::core::model::RecordSet;
use crate::core::parse::parse_csv;
use crate::platform::fs::read_file_lossy;
use crate::util::constants::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::util::error::FetchError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Stable identifier of a source: a URL or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Local filesystem path for `file://` URLs and bare paths.
    pub fn local_path(&self) -> Option<PathBuf> {
        if self.is_remote() {
            return None;
        }
        let path = self.0.strip_prefix("file://").unwrap_or(&self.0);
        Some(PathBuf::from(path))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Retrieves a raw record set for a source.
///
/// Implementations must be safe to share across threads; the cache calls
/// them while holding a per-source slot lock.
pub trait SourceFetcher: Send + Sync {
    fn fetch(&self, source: &SourceId) -> Result<RecordSet, FetchError>;
}

/// Production fetcher: HTTP(S) via reqwest, everything else from disk.
pub struct DefaultFetcher {
    client: reqwest::blocking::Client,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("actionboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http {
                source_id: String::new(),
                source: e,
            })?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    fn fetch_remote(&self, source: &SourceId) -> Result<String, FetchError> {
        let http_err = |e| FetchError::Http {
            source_id: source.to_string(),
            source: e,
        };

        let resp = self.client.get(source.as_str()).send().map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                source_id: source.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(http_err)
    }
}

impl SourceFetcher for DefaultFetcher {
    fn fetch(&self, source: &SourceId) -> Result<RecordSet, FetchError> {
        let payload = match source.local_path() {
            Some(path) => read_local(&path)?,
            None => self.fetch_remote(source)?,
        };

        let records = parse_csv(&payload).map_err(|e| FetchError::Parse {
            source_id: source.to_string(),
            source: e,
        })?;

        tracing::info!(
            source = %source,
            rows = records.len(),
            columns = records.columns().len(),
            bytes = payload.len(),
            "Source fetched"
        );
        Ok(records)
    }
}

fn read_local(path: &Path) -> Result<String, FetchError> {
    read_file_lossy(path).map_err(|e| FetchError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
