//
// models.rs
// dcm2jpeg
//
// Defines serializable data structures for batch conversion reports.
//

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One successfully converted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One file that could not be converted, with the error rendered as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Outcome of a directory conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub converted: Vec<ConversionRecord>,
    pub failed: Vec<ConversionFailure>,
}

impl BatchReport {
    /// Number of files the run attempted, converted and failed combined.
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}
