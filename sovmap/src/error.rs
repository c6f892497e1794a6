use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the [`crate::Map`] API boundary.
#[derive(Debug, Error)]
pub enum MapError {
    /// Pixel coordinate outside the image. A programming error; propagated,
    /// never recovered from.
    #[error("pixel write out of bounds: {0}")]
    OutOfBounds(rasterium::Error),

    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input bytes inconsistent: truncated, unknown id, impossible value.
    #[error("corrupt data: {0}")]
    DataCorrupt(String),

    /// A loaded owner index does not match the configured dimensions.
    #[error("owner index is {found_width}x{found_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    /// Operation invoked in the wrong order.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl From<rasterium::Error> for MapError {
    fn from(e: rasterium::Error) -> Self {
        match e {
            rasterium::Error::Io(source) => MapError::Io {
                path: PathBuf::new(),
                source,
            },
            rasterium::Error::Encoding(msg) => MapError::DataCorrupt(msg),
            e @ rasterium::Error::OutOfBounds { .. } => MapError::OutOfBounds(e),
        }
    }
}
