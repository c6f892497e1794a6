use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Io(io::Error),
    Encoding(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "pixel ({}, {}) out of bounds for {}x{} image",
                x, y, width, height
            ),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Error::Io(io),
            other => Error::Encoding(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
