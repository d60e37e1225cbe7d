//
// normalize.rs
// dcm2jpeg
//
// Maps raw DICOM samples to 8-bit intensities: modality rescale first,
// then VOI windowing (or a min-max fallback when no window is available).
//

use dicom_pixeldata::WindowLevel;

use crate::error::{ConvertError, Result};
use crate::loader::{DicomFile, PhotometricInterpretation};

/// Policy applied when neither the caller nor the file supplies a VOI window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFallback {
    /// Stretch the observed sample range onto the full 8-bit scale.
    #[default]
    Normalize,
    /// Refuse to guess and fail with `ConvertError::MissingParameters`.
    Require,
}

/// A single frame reduced to interleaved 8-bit samples, ready for encoding.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub pixels: Vec<u8>,
}

/// Normalizes one frame of `file` to 8-bit intensities.
///
/// An explicit `window` takes precedence over the window stored in the file.
/// Rescale slope and intercept are applied before windowing, so window bounds
/// are expressed in modality units (for example Hounsfield for CT).
pub fn normalize_frame(
    file: &DicomFile,
    frame: u32,
    window: Option<WindowLevel>,
    fallback: WindowFallback,
) -> Result<NormalizedImage> {
    let samples = file.frame_samples(frame)?;

    let slope = file.rescale_slope.unwrap_or(1.0);
    let intercept = file.rescale_intercept.unwrap_or(0.0);
    let rescaled: Vec<f64> = samples
        .iter()
        .map(|&s| f64::from(s) * slope + intercept)
        .collect();

    let window = window.or(file.window);
    let mut pixels = match window {
        Some(w) => apply_window(&rescaled, w)?,
        None => match fallback {
            WindowFallback::Normalize => normalize_range(&rescaled),
            WindowFallback::Require => {
                return Err(ConvertError::MissingParameters(
                    "no VOI window in file and none supplied".to_string(),
                ))
            }
        },
    };

    if file.photometric == PhotometricInterpretation::Monochrome1 {
        // MONOCHROME1 stores low values as bright; flip to the usual polarity.
        for p in pixels.iter_mut() {
            *p = 255 - *p;
        }
    }

    Ok(NormalizedImage {
        width: file.columns,
        height: file.rows,
        channels: file.samples_per_pixel,
        pixels,
    })
}

/// Clips samples to `center - width/2 ..= center + width/2` and maps the
/// clipped range linearly onto 0..=255.
fn apply_window(samples: &[f64], window: WindowLevel) -> Result<Vec<u8>> {
    if window.width <= 0.0 {
        return Err(ConvertError::InvalidFormat(format!(
            "window width must be positive, got {}",
            window.width
        )));
    }
    let lower = window.center - window.width / 2.0;
    let upper = window.center + window.width / 2.0;
    Ok(samples
        .iter()
        .map(|&v| {
            let clipped = v.clamp(lower, upper);
            ((clipped - lower) / window.width * 255.0) as u8
        })
        .collect())
}

/// Stretches the observed sample range onto 0..=255. A constant frame has no
/// range to stretch and comes out black.
fn normalize_range(samples: &[f64]) -> Vec<u8> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in samples {
        min = min.min(v);
        max = max.max(v);
    }
    let span = max - min;
    if span <= 0.0 {
        return vec![0; samples.len()];
    }
    samples
        .iter()
        .map(|&v| ((v - min) / span * 255.0) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_maps_clipped_range_onto_full_scale() {
        let samples = [0.0, 500.0, 1000.0, 2000.0];
        let window = WindowLevel {
            center: 500.0,
            width: 1000.0,
        };
        let out = apply_window(&samples, window).unwrap();
        assert_eq!(out, vec![0, 127, 255, 255]);
    }

    #[test]
    fn window_clips_out_of_range_samples() {
        let window = WindowLevel {
            center: 100.0,
            width: 100.0,
        };
        let out = apply_window(&[-500.0, 50.0, 150.0, 1000.0], window).unwrap();
        assert_eq!(out, vec![0, 0, 255, 255]);
    }

    #[test]
    fn nonpositive_window_width_is_rejected() {
        let window = WindowLevel {
            center: 0.0,
            width: 0.0,
        };
        let err = apply_window(&[1.0], window).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidFormat(_)));
    }

    #[test]
    fn range_normalization_stretches_observed_range() {
        let out = normalize_range(&[10.0, 74.0, 138.0, 265.0]);
        assert_eq!(out, vec![0, 64, 128, 255]);
    }

    #[test]
    fn constant_frame_normalizes_to_black() {
        let out = normalize_range(&[42.0; 5]);
        assert_eq!(out, vec![0; 5]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize_range(&[]).is_empty());
    }
}
