//! Rasterization of a finished [`QrCode`] into pixels and PNG bytes.

use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

use crate::config::RenderConfig;
use crate::error::QrError;
use crate::qrcode::QrCode;

const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

/// Pixels per module for a symbol of `symbol_size` modules framed by `quiet_zone` modules on
/// each side, so that the image fits in `requested` pixels.
///
/// Never returns 0: when `requested` is too small the scale is 1 and the image ends up larger
/// than requested.
pub fn module_scale(symbol_size: u32, requested: u32, quiet_zone: u32) -> u32 {
    (requested / (symbol_size + 2 * quiet_zone)).max(1)
}

/// Draws `qr` as an RGB image, each module a square block of pixels.
///
/// The side of the returned image is `scale * (qr.size() + 2 * quiet_zone)`, see
/// [`module_scale`].
pub fn render_image(qr: &QrCode, requested: u32, config: &RenderConfig) -> RgbImage {
    let symbol_size = qr.size() as u32;
    let border = config.quiet_zone as i32;
    let scale = module_scale(symbol_size, requested, config.quiet_zone);
    let side = (symbol_size + 2 * config.quiet_zone) * scale;
    let dark = Rgb(config.dark_color);

    ImageBuffer::from_fn(side, side, |x, y| {
        let module_x = (x / scale) as i32 - border;
        let module_y = (y / scale) as i32 - border;
        if qr.get_module(module_x, module_y) {
            dark
        } else {
            LIGHT
        }
    })
}

/// Renders `qr` and encodes it as an 8-bit RGB PNG.
///
/// # Example
///
/// ```rust
/// use qrserve::config::RenderConfig;
/// use qrserve::qrcode::{EcLevel, QrCode};
/// use qrserve::render::render_png;
///
/// let qr = QrCode::encode_text("https://example.com", EcLevel::High).unwrap();
/// let png = render_png(&qr, 300, &RenderConfig::default()).unwrap();
/// assert!(png.starts_with(b"\x89PNG"));
/// ```
pub fn render_png(qr: &QrCode, requested: u32, config: &RenderConfig) -> Result<Vec<u8>, QrError> {
    let img = render_image(qr, requested, config);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
