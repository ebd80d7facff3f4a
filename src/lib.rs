#![forbid(unsafe_code)]
//! # qrserve
//!
//! An HTTP service that turns a URL into a PNG QR code, built on a QR encoder written from
//! scratch.
//!
//! `qrserve` encodes text into QR Code Model 2 symbols (versions 1 to 40, four error correction
//! levels, numeric/alphanumeric/byte modes), renders them to coloured PNG images, and serves
//! them from a single `GET /api/generate-qr` endpoint.
//!
//! ## Pipeline
//!
//! 1. [`segment`] packs the text into mode segments.
//! 2. [`ecc`] picks the smallest version, pads the data and adds Reed–Solomon codewords.
//! 3. [`qrcode`] lays out the symbol and selects the data mask.
//! 4. [`render`] scales the modules to pixels and encodes PNG.
//!
//! [`api`] wraps the pipeline in an `axum` router, described for clients by [`openapi`];
//! [`config`] holds the render and server settings.
//!
//! ## Example
//!
//! ```rust
//! use qrserve::{config::RenderConfig, generate_png};
//!
//! let png = generate_png("https://example.com/doc?id=42", 300, &RenderConfig::default()).unwrap();
//! assert!(png.starts_with(b"\x89PNG"));
//! ```

use tracing::debug;

pub mod api;
pub mod config;
pub mod ecc;
pub mod error;
pub mod openapi;
pub mod qrcode;
pub mod render;
pub mod segment;

use crate::config::RenderConfig;
use crate::error::QrError;
use crate::qrcode::QrCode;

/// Runs the whole pipeline: encodes `text` at the configured level and renders it to PNG bytes
/// fitting in `size` pixels (or larger, when `size` is too small for the symbol).
///
/// # Errors
///
/// [`QrError::CapacityExceeded`] when the text does not fit in a version 40 symbol.
pub fn generate_png(text: &str, size: u32, config: &RenderConfig) -> Result<Vec<u8>, QrError> {
    let qr = QrCode::encode_text(text, config.ec_level)?;
    let png = render::render_png(&qr, size, config)?;
    debug!(
        chars = text.chars().count(),
        version = qr.version().value(),
        modules = qr.size(),
        scale = render::module_scale(qr.size() as u32, size, config.quiet_zone),
        bytes = png.len(),
        "rendered QR code"
    );
    Ok(png)
}
