use std::fs;
use std::io;
use std::path::PathBuf;

use battlestat_core::{ProfilePayload, TelemetrySnapshot, TelemetrySource};
use clap::ValueEnum;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Flat snapshot document
    Snapshot,
    /// Nested profile + personalstats document
    Payload,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads telemetry from JSON files; the account key is the file path.
#[derive(Debug, Clone)]
pub struct FileSource {
    format: InputFormat,
    /// Observation instant applied when the document carries none.
    captured_at: i64,
    /// Replace the document's own observation instant.
    force_captured_at: bool,
}

impl FileSource {
    pub const fn new(format: InputFormat, captured_at: i64, force_captured_at: bool) -> Self {
        Self {
            format,
            captured_at,
            force_captured_at,
        }
    }

    fn parse(&self, json: &str) -> Result<TelemetrySnapshot, serde_json::Error> {
        let snapshot = match self.format {
            InputFormat::Snapshot => serde_json::from_str::<TelemetrySnapshot>(json)?,
            InputFormat::Payload => ProfilePayload::from_json(json)?.into_snapshot(0),
        };
        if self.force_captured_at || snapshot.captured_at == 0 {
            Ok(snapshot.with_captured_at(self.captured_at))
        } else {
            Ok(snapshot)
        }
    }
}

impl TelemetrySource for FileSource {
    type Error = SourceError;

    fn load_snapshot(&self, account: &str) -> Result<TelemetrySnapshot, Self::Error> {
        let path = PathBuf::from(account);
        let json = fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let snapshot = self
            .parse(&json)
            .map_err(|source| SourceError::Parse { path, source })?;
        log::debug!(
            "loaded {account}: age {} days, captured at {}",
            snapshot.age_days,
            snapshot.captured_at
        );
        Ok(snapshot)
    }
}
