//
// loader.rs
// dcm2jpeg
//
// Reads a DICOM file's header and pixel data into an immutable DicomFile,
// decoding stored values without applying any LUT.
//

use std::fs;
use std::path::Path;

use dicom::core::Tag;
use dicom::object::{open_file, DefaultDicomObject};
use dicom_pixeldata::{
    ConvertOptions, ModalityLutOption, PixelDecoder, PixelRepresentation, VoiLutOption,
    WindowLevel,
};

use crate::error::{ConvertError, Result};

// Attributes consulted by the loader.
const ROWS: Tag = Tag(0x0028, 0x0010);
const COLUMNS: Tag = Tag(0x0028, 0x0011);
const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
const BITS_STORED: Tag = Tag(0x0028, 0x0101);
const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
const PIXEL_DATA: Tag = Tag(0x7fe0, 0x0010);

/// Photometric interpretation of the decoded samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotometricInterpretation {
    Monochrome1,
    Monochrome2,
    Rgb,
    Other(String),
}

impl PhotometricInterpretation {
    fn parse(raw: &str) -> Self {
        match raw {
            "MONOCHROME1" => Self::Monochrome1,
            "MONOCHROME2" => Self::Monochrome2,
            "RGB" => Self::Rgb,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Header metadata and raw pixel samples of one DICOM file.
///
/// The sample buffer holds the decoded stored values of every frame, prior
/// to any modality rescale or VOI transform. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct DicomFile {
    pub rows: u32,
    pub columns: u32,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub samples_per_pixel: u16,
    pub photometric: PhotometricInterpretation,
    pub signed: bool,
    pub frames: u32,
    pub rescale_slope: Option<f64>,
    pub rescale_intercept: Option<f64>,
    pub window: Option<WindowLevel>,
    samples: Vec<f32>,
}

impl DicomFile {
    /// Raw stored samples of one frame, row-major, channels interleaved.
    pub fn frame_samples(&self, frame: u32) -> Result<&[f32]> {
        if frame >= self.frames {
            return Err(ConvertError::InvalidFormat(format!(
                "requested frame {} but file has {} frame(s)",
                frame, self.frames
            )));
        }
        let len = self.frame_len();
        let start = frame as usize * len;
        Ok(&self.samples[start..start + len])
    }

    fn frame_len(&self) -> usize {
        self.rows as usize * self.columns as usize * self.samples_per_pixel as usize
    }
}

/// Read a DICOM file into memory, decoding pixel data to raw stored values.
pub fn load(path: &Path) -> Result<DicomFile> {
    // Surface unreadable paths as I/O failures before parse errors.
    fs::metadata(path)?;

    let obj = open_file(path)?;

    if obj.element(PIXEL_DATA).is_err() {
        return Err(ConvertError::InvalidFormat(
            "no PixelData attribute".to_string(),
        ));
    }

    let rows = require_u16(&obj, ROWS, "Rows")? as u32;
    let columns = require_u16(&obj, COLUMNS, "Columns")? as u32;
    require_u16(&obj, BITS_ALLOCATED, "BitsAllocated")?;
    if rows == 0 || columns == 0 {
        return Err(ConvertError::InvalidFormat(format!(
            "degenerate image dimensions {}x{}",
            rows, columns
        )));
    }

    let samples_per_pixel = element_u16(&obj, SAMPLES_PER_PIXEL).unwrap_or(1);
    let photometric = element_str(&obj, PHOTOMETRIC_INTERPRETATION)
        .map(|s| PhotometricInterpretation::parse(&s))
        .unwrap_or(PhotometricInterpretation::Monochrome2);

    match samples_per_pixel {
        1 | 3 => {}
        other => {
            return Err(ConvertError::UnsupportedEncoding(format!(
                "unsupported samples per pixel: {}",
                other
            )))
        }
    }
    if let PhotometricInterpretation::Other(name) = &photometric {
        if name.contains("PALETTE") {
            return Err(ConvertError::UnsupportedEncoding(format!(
                "photometric interpretation {} is not supported",
                name
            )));
        }
    }

    let decoded = obj.decode_pixel_data().map_err(decode_failure)?;
    let frames = decoded.number_of_frames();
    let bits_allocated = decoded.bits_allocated();
    let signed = decoded.pixel_representation() == PixelRepresentation::Signed;

    let expected =
        frames as usize * rows as usize * columns as usize * samples_per_pixel as usize;
    // A buffer shorter than the declared geometry is malformed input, caught
    // here before the sample converter trips over the missing frame bytes.
    if bits_allocated % 8 == 0 {
        let expected_bytes = expected * usize::from(bits_allocated / 8);
        if decoded.data().len() < expected_bytes {
            return Err(ConvertError::InvalidFormat(format!(
                "pixel data holds {} bytes, expected {} ({} frame(s) of {}x{} with {} sample(s) per pixel)",
                decoded.data().len(),
                expected_bytes,
                frames,
                rows,
                columns,
                samples_per_pixel
            )));
        }
    }

    // Raw stored values, no LUTs: rescale and windowing are the
    // normalizer's responsibility.
    let convert_options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::None)
        .with_voi_lut(VoiLutOption::Identity);

    let samples: Vec<f32> = if !signed {
        if bits_allocated <= 8 {
            decoded
                .to_vec_with_options::<u8>(&convert_options)
                .map_err(decode_failure)?
                .into_iter()
                .map(|v| v as f32)
                .collect()
        } else if bits_allocated <= 16 {
            decoded
                .to_vec_with_options::<u16>(&convert_options)
                .map_err(decode_failure)?
                .into_iter()
                .map(|v| v as f32)
                .collect()
        } else {
            decoded
                .to_vec_with_options::<u32>(&convert_options)
                .map_err(decode_failure)?
                .into_iter()
                .map(|v| v as f32)
                .collect()
        }
    } else if bits_allocated <= 8 {
        decoded
            .to_vec_with_options::<i8>(&convert_options)
            .map_err(decode_failure)?
            .into_iter()
            .map(|v| v as f32)
            .collect()
    } else if bits_allocated <= 16 {
        decoded
            .to_vec_with_options::<i16>(&convert_options)
            .map_err(decode_failure)?
            .into_iter()
            .map(|v| v as f32)
            .collect()
    } else {
        decoded
            .to_vec_with_options::<i32>(&convert_options)
            .map_err(decode_failure)?
            .into_iter()
            .map(|v| v as f32)
            .collect()
    };

    if samples.len() != expected {
        return Err(ConvertError::InvalidFormat(format!(
            "pixel buffer holds {} samples, expected {} ({} frame(s) of {}x{} with {} sample(s) per pixel)",
            samples.len(),
            expected,
            frames,
            rows,
            columns,
            samples_per_pixel
        )));
    }

    let window = match (
        element_f64(&obj, WINDOW_CENTER),
        element_f64(&obj, WINDOW_WIDTH),
    ) {
        (Some(center), Some(width)) => Some(WindowLevel { center, width }),
        // A lone center or width is not a usable window.
        _ => None,
    };

    Ok(DicomFile {
        rows,
        columns,
        bits_allocated,
        bits_stored: element_u16(&obj, BITS_STORED).unwrap_or(bits_allocated),
        samples_per_pixel,
        photometric,
        signed,
        frames,
        rescale_slope: element_f64(&obj, RESCALE_SLOPE),
        rescale_intercept: element_f64(&obj, RESCALE_INTERCEPT),
        window,
        samples,
    })
}

fn decode_failure(e: impl std::fmt::Display) -> ConvertError {
    ConvertError::UnsupportedEncoding(e.to_string())
}

fn element_str(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
    obj.element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim().to_string())
}

fn element_u16(obj: &DefaultDicomObject, tag: Tag) -> Option<u16> {
    obj.element(tag).ok().and_then(|e| e.to_int::<u16>().ok())
}

fn element_f64(obj: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    // Multi-valued attributes (VM > 1) contribute their first value.
    obj.element(tag)
        .ok()
        .and_then(|e| e.to_multi_float64().ok())
        .and_then(|values| values.first().copied())
}

fn require_u16(obj: &DefaultDicomObject, tag: Tag, name: &str) -> Result<u16> {
    let elem = obj
        .element(tag)
        .map_err(|_| ConvertError::InvalidFormat(format!("missing {} attribute", name)))?;
    Ok(elem.to_int::<u16>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photometric_parsing_covers_known_values() {
        assert_eq!(
            PhotometricInterpretation::parse("MONOCHROME1"),
            PhotometricInterpretation::Monochrome1
        );
        assert_eq!(
            PhotometricInterpretation::parse("MONOCHROME2"),
            PhotometricInterpretation::Monochrome2
        );
        assert_eq!(
            PhotometricInterpretation::parse("RGB"),
            PhotometricInterpretation::Rgb
        );
        assert_eq!(
            PhotometricInterpretation::parse("YBR_FULL_422"),
            PhotometricInterpretation::Other("YBR_FULL_422".to_string())
        );
    }
}
