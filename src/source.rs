//! Where node snapshots come from

use crate::settings::DataSettings;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failure to obtain or read a snapshot. Never fatal: the session falls back
/// to demo data and reports why.
#[derive(Debug)]
pub enum LoadError {
    Http { status: u16 },
    Transport(String),
    Io(io::Error),
    Parse(String),
    NoSource,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Http { status } => write!(f, "HTTP error! status: {}", status),
            LoadError::Transport(e) => write!(f, "Network error: {}", e),
            LoadError::Io(e) => write!(f, "Read error: {}", e),
            LoadError::Parse(e) => write!(f, "Parse error: {}", e),
            LoadError::NoSource => write!(f, "No data source configured"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}

pub trait DatasetSource {
    /// Raw snapshot text
    fn fetch(&self) -> Result<String, LoadError>;

    fn describe(&self) -> String;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), timeout }
    }
}

impl DatasetSource for HttpSource {
    fn fetch(&self) -> Result<String, LoadError> {
        match ureq::get(&self.url).timeout(self.timeout).call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| LoadError::Transport(e.to_string())),
            Err(ureq::Error::Status(status, _)) => Err(LoadError::Http { status }),
            Err(e) => Err(LoadError::Transport(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ============================================================================
// Local file
// ============================================================================

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn fetch(&self) -> Result<String, LoadError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ============================================================================
// In-memory / none
// ============================================================================

/// Snapshot already in memory
pub struct StaticSource(pub String);

impl DatasetSource for StaticSource {
    fn fetch(&self) -> Result<String, LoadError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "in-memory snapshot".to_string()
    }
}

/// No configured source; always falls through to demo data
pub struct NoSource;

impl DatasetSource for NoSource {
    fn fetch(&self) -> Result<String, LoadError> {
        Err(LoadError::NoSource)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// Pick a source from settings: local path first, then URL
pub fn from_settings(data: &DataSettings) -> Box<dyn DatasetSource> {
    if let Some(path) = &data.path {
        return Box::new(FileSource::new(path.clone()));
    }
    if let Some(url) = &data.url {
        return Box::new(HttpSource::new(url.clone(), Duration::from_secs(data.timeout_secs)));
    }
    Box::new(NoSource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let src = FileSource::new("/nonexistent/nodeglobe/snapshot.json");
        assert!(matches!(src.fetch(), Err(LoadError::Io(_))));
    }

    #[test]
    fn settings_prefer_path() {
        let data = DataSettings {
            url: Some("http://example.invalid/nodes.json".into()),
            path: Some("/tmp/nodes.json".into()),
            timeout_secs: 1,
        };
        assert_eq!(from_settings(&data).describe(), "/tmp/nodes.json");

        let data = DataSettings { path: None, ..data };
        assert_eq!(from_settings(&data).describe(), "http://example.invalid/nodes.json");

        assert!(matches!(from_settings(&DataSettings::default()).fetch(), Err(LoadError::NoSource)));
    }

    #[test]
    fn error_messages() {
        assert_eq!(LoadError::Http { status: 404 }.to_string(), "HTTP error! status: 404");
        assert_eq!(LoadError::Parse("eof".into()).to_string(), "Parse error: eof");
    }
}
