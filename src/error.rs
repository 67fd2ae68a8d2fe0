//! Error types for the lineart-trace crate.

/// Errors that can occur while building rasters or processing image files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw pixel buffer does not hold exactly `width * height` RGBA pixels.
    #[error("buffer size mismatch for {width}x{height} RGBA: expected {expected} bytes, got {actual}")]
    BufferSize {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Byte length implied by the dimensions.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// A zero-sized image reached an operation that must produce pixels.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The background worker thread has shut down.
    #[error("line-art worker is no longer running")]
    WorkerStopped,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("jpeg".to_string());
        assert!(unsupported.to_string().contains("jpeg"));

        let mismatch = Error::BufferSize {
            width: 10,
            height: 20,
            expected: 800,
            actual: 799,
        };
        let msg = mismatch.to_string();
        assert!(msg.contains("10x20"));
        assert!(msg.contains("800"));
        assert!(msg.contains("799"));

        let empty = Error::EmptyImage {
            width: 0,
            height: 7,
        };
        assert!(empty.to_string().contains("0x7"));
    }
}
