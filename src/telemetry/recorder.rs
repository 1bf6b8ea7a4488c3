//! # Sample Recorder
//!
//! Appends one JSON object per accepted record:
//!
//! ```text
//! {"timestamp":"2024-05-01T10:00:00.120Z","accel":{"x":0.1,"y":0.0,"z":9.8},"gyro":{"x":0.0,"y":0.0,"z":0.0}}
//! ```
//!
//! Files are named `imu_<UTC timestamp>_<sequence>.jsonl` with a ten-digit
//! sequence so that name order is creation order, which retention relies on.
//! An existing file is never overwritten; the sequence skips past it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RecorderConfig;
use crate::error::Result;
use crate::protocol::wire::Sample3;

const FILE_PREFIX: &str = "imu_";
const FILE_EXTENSION: &str = "jsonl";

/// One accepted record, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleFrame {
    pub timestamp: DateTime<Utc>,
    pub accel: Option<Sample3>,
    pub gyro: Option<Sample3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnetometer: Option<Sample3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Rotating JSONL writer
#[derive(Debug)]
pub struct SampleRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    sequence: u32,
}

impl SampleRecorder {
    /// Create a recorder writing into `dir`, creating it if needed
    ///
    /// No file is created until the first record.
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Build a recorder from the `[recorder]` section, or `None` if disabled
    pub fn from_config(config: &RecorderConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep).map(Some)
    }

    /// Append one frame, rotating files as needed
    pub fn record(&mut self, frame: &SampleFrame) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate(frame.timestamp)?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, frame)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    fn rotate(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let file = loop {
            let path = self.dir.join(self.file_name(now));
            self.sequence = self.sequence.wrapping_add(1);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    info!("Recording samples to {}", path.display());
                    break file;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} already exists, trying next sequence", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        };
        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;

        self.prune()
    }

    fn file_name(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}{}_{:010}.{}",
            FILE_PREFIX,
            now.format("%Y%m%d_%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        )
    }

    fn prune(&self) -> Result<()> {
        let mut files = recorded_files(&self.dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for path in files.drain(..excess) {
            debug!("Removing old recording {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Recording files in `dir`, oldest first
pub fn recorded_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_recording = path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX));
        if is_recording {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
