//
// convert.rs
// dcm2jpeg
//
// Single-file pipeline: load the DICOM file, normalize one frame to 8-bit,
// encode it as JPEG and write the result.
//

use std::path::{Path, PathBuf};

use dicom_pixeldata::WindowLevel;
use tracing::debug;

use crate::encoder;
use crate::error::Result;
use crate::loader;
use crate::normalize::{self, WindowFallback};

/// Options controlling how a DICOM file is rendered to JPEG.
#[derive(Debug, Clone, Copy)]
pub struct JpegExportOptions {
    pub quality: u8,
    pub frame: u32,
    pub window: Option<WindowLevel>,
    pub fallback: WindowFallback,
}

impl Default for JpegExportOptions {
    fn default() -> Self {
        Self {
            quality: 95,
            frame: 0,
            window: None,
            fallback: WindowFallback::Normalize,
        }
    }
}

/// Output path used when the caller does not supply one: the input path
/// with its extension replaced by `jpg`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("jpg");
    path
}

/// Converts one DICOM file to a JPEG at `output`.
pub fn convert_file(input: &Path, output: &Path, options: &JpegExportOptions) -> Result<()> {
    let file = loader::load(input)?;
    debug!(
        "Loaded {}: {}x{}, {} frame(s), {} bits allocated",
        input.display(),
        file.columns,
        file.rows,
        file.frames,
        file.bits_allocated
    );

    let frame = normalize::normalize_frame(&file, options.frame, options.window, options.fallback)?;
    encoder::write_jpeg(&frame, options.quality, output)?;
    debug!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_swaps_extension_for_jpg() {
        let path = default_output_path(Path::new("/scans/chest.dcm"));
        assert_eq!(path, PathBuf::from("/scans/chest.jpg"));
    }

    #[test]
    fn default_output_appends_jpg_when_no_extension() {
        let path = default_output_path(Path::new("chest"));
        assert_eq!(path, PathBuf::from("chest.jpg"));
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = JpegExportOptions::default();
        assert_eq!(options.quality, 95);
        assert_eq!(options.frame, 0);
        assert!(options.window.is_none());
        assert_eq!(options.fallback, WindowFallback::Normalize);
    }
}
