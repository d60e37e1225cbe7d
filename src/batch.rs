use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::convert::{self, JpegExportOptions};
use crate::error::Result;
use crate::models::{BatchReport, ConversionFailure, ConversionRecord};

/// Collects every `.dcm` file under `dir`, sorted by path so runs are
/// deterministic regardless of directory iteration order.
pub fn collect_dicom_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "dcm"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Assigns one output name per input: `stem.jpeg` first, then `stem_1.jpeg`,
/// `stem_2.jpeg` and so on when stems repeat across subdirectories.
fn assign_output_names(files: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut used = HashSet::new();
    files
        .iter()
        .map(|input| {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            let mut name = format!("{}.jpeg", stem);
            let mut counter = 1;
            while used.contains(&name) {
                name = format!("{}_{}.jpeg", stem, counter);
                counter += 1;
            }
            used.insert(name.clone());
            output_dir.join(name)
        })
        .collect()
}

/// Converts every `.dcm` file under `input_dir`, writing JPEGs into
/// `output_dir` (created if needed). Files are converted in parallel; a
/// failing file is recorded in the report and never aborts the rest.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    options: &JpegExportOptions,
) -> Result<BatchReport> {
    fs::create_dir_all(output_dir)?;

    let files = collect_dicom_files(input_dir);
    debug!(
        "Found {} .dcm file(s) under {}",
        files.len(),
        input_dir.display()
    );

    let outputs = assign_output_names(&files, output_dir);
    let results: Vec<_> = files
        .par_iter()
        .zip(outputs.par_iter())
        .map(|(input, output)| {
            convert::convert_file(input, output, options)
                .map(|_| ConversionRecord {
                    input: input.clone(),
                    output: output.clone(),
                })
                .map_err(|e| {
                    warn!("Failed to convert {}: {}", input.display(), e);
                    ConversionFailure {
                        input: input.clone(),
                        error: e.to_string(),
                    }
                })
        })
        .collect();

    let mut report = BatchReport {
        output_dir: output_dir.to_path_buf(),
        ..BatchReport::default()
    };
    for result in results {
        match result {
            Ok(record) => report.converted.push(record),
            Err(failure) => report.failed.push(failure),
        }
    }
    Ok(report)
}

/// Renders `path` relative to `root` when possible, for compact report lines.
pub(crate) fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_stems_get_numbered_suffixes() {
        let files = vec![
            PathBuf::from("a/scan.dcm"),
            PathBuf::from("b/scan.dcm"),
            PathBuf::from("c/scan.dcm"),
            PathBuf::from("d/other.dcm"),
        ];
        let out = assign_output_names(&files, Path::new("/out"));
        assert_eq!(
            out,
            vec![
                PathBuf::from("/out/scan.jpeg"),
                PathBuf::from("/out/scan_1.jpeg"),
                PathBuf::from("/out/scan_2.jpeg"),
                PathBuf::from("/out/other.jpeg"),
            ]
        );
    }

    #[test]
    fn numbered_suffix_skips_taken_names() {
        let files = vec![
            PathBuf::from("a/scan_1.dcm"),
            PathBuf::from("b/scan.dcm"),
            PathBuf::from("c/scan.dcm"),
        ];
        let out = assign_output_names(&files, Path::new("/out"));
        assert_eq!(
            out,
            vec![
                PathBuf::from("/out/scan_1.jpeg"),
                PathBuf::from("/out/scan.jpeg"),
                PathBuf::from("/out/scan_2.jpeg"),
            ]
        );
    }

    #[test]
    fn relative_display_strips_the_scan_root() {
        let rendered = display_relative(Path::new("/data/sub/scan.dcm"), Path::new("/data"));
        assert_eq!(rendered, "sub/scan.dcm");
    }
}
