use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Failure kinds surfaced by the conversion pipeline.
///
/// None of these are recovered silently; every conversion either produces
/// a JPEG or reports one of the kinds below.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The file is not a usable DICOM image (bad magic, unparsable header,
    /// required attribute missing, or a pixel buffer that does not match
    /// the declared geometry).
    #[error("invalid DICOM format: {0}")]
    InvalidFormat(String),

    /// The pixel data uses a transfer syntax or sample layout this tool
    /// cannot decode.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Windowing metadata is absent and the caller disallowed a fallback.
    #[error("missing parameters: {0}")]
    MissingParameters(String),

    /// JPEG serialization failed.
    #[error("JPEG encoding failed: {0}")]
    EncodingError(String),

    /// Reading or writing a file failed.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

impl From<dicom_object::ReadError> for ConvertError {
    fn from(e: dicom_object::ReadError) -> Self {
        ConvertError::InvalidFormat(e.to_string())
    }
}

impl From<dicom_core::value::ConvertValueError> for ConvertError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        ConvertError::InvalidFormat(e.to_string())
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(e: image::ImageError) -> Self {
        ConvertError::EncodingError(e.to_string())
    }
}
