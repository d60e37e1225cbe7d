//
// lib.rs
// dcm2jpeg
//
// Exposes the crate's modules and re-exports the conversion entry points for
// both binary and library consumers.
//

// Public surface of the library: the pipeline stages plus orchestration.
pub mod batch;
pub mod cli;
pub mod convert;
pub mod encoder;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;

pub use batch::convert_directory;
pub use convert::{convert_file, JpegExportOptions};
pub use error::{ConvertError, Result};
