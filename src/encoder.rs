//
// encoder.rs
// dcm2jpeg
//
// Encodes normalized 8-bit frames as JPEG. Output is always 8-bit RGB;
// grayscale input is expanded by replicating the single channel.
//

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::{ConvertError, Result};
use crate::normalize::NormalizedImage;

/// Encodes `frame` into an in-memory JPEG at the given quality (1..=100).
pub fn encode_jpeg(frame: &NormalizedImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = expand_to_rgb(frame)?;
    let buffer = RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| {
        ConvertError::EncodingError(format!(
            "pixel buffer does not match {}x{} dimensions",
            frame.width, frame.height
        ))
    })?;

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut encoded), quality);
    buffer.write_with_encoder(encoder)?;
    Ok(encoded)
}

/// Encodes `frame` and writes the result to `path`.
pub fn write_jpeg(frame: &NormalizedImage, quality: u8, path: &Path) -> Result<()> {
    let bytes = encode_jpeg(frame, quality)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn expand_to_rgb(frame: &NormalizedImage) -> Result<Vec<u8>> {
    match frame.channels {
        1 => Ok(frame.pixels.iter().flat_map(|&p| [p, p, p]).collect()),
        3 => Ok(frame.pixels.clone()),
        other => Err(ConvertError::EncodingError(format!(
            "cannot encode {} channel(s) as RGB",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_expands_to_rgb_triples() {
        let frame = NormalizedImage {
            width: 2,
            height: 1,
            channels: 1,
            pixels: vec![7, 250],
        };
        let rgb = expand_to_rgb(&frame).unwrap();
        assert_eq!(rgb, vec![7, 7, 7, 250, 250, 250]);
    }

    #[test]
    fn encoded_jpeg_keeps_frame_dimensions() {
        let frame = NormalizedImage {
            width: 7,
            height: 5,
            channels: 1,
            pixels: vec![128; 35],
        };
        let bytes = encode_jpeg(&frame, 90).unwrap();
        assert_eq!(&bytes[..2], [0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }

    #[test]
    fn unexpected_channel_count_is_rejected() {
        let frame = NormalizedImage {
            width: 1,
            height: 1,
            channels: 2,
            pixels: vec![0, 0],
        };
        let err = encode_jpeg(&frame, 90).unwrap_err();
        assert!(matches!(err, ConvertError::EncodingError(_)));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let frame = NormalizedImage {
            width: 4,
            height: 4,
            channels: 1,
            pixels: vec![0; 3],
        };
        let err = encode_jpeg(&frame, 90).unwrap_err();
        assert!(matches!(err, ConvertError::EncodingError(_)));
    }
}
