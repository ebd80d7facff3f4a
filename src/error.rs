use thiserror::Error;

/// Everything that can go wrong between receiving text and producing PNG bytes.
#[derive(Error, Debug)]
pub enum QrError {
    /// The caller handed us something that is not a usable URL.
    #[error("{0}")]
    InvalidInput(String),

    /// A character cannot be represented in the requested segment mode.
    #[error("cannot encode input: {0}")]
    Encoding(String),

    /// No version up to 40 holds the data at the requested error correction level.
    ///
    /// Ways to handle this:
    ///
    /// - Shorten the text.
    /// - Lower the error correction level.
    #[error("data too long for a QR code: {used_bits} bits needed, {capacity_bits} bits available")]
    CapacityExceeded {
        used_bits: usize,
        capacity_bits: usize,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl QrError {
    pub fn invalid_url() -> Self {
        Self::InvalidInput("Invalid URL".into())
    }
}
