/// Decodes the single QR code in a PNG, panicking if there is not exactly one.
pub fn decode_png(png: &[u8]) -> String {
    let img = image::load_from_memory(png)
        .expect("response should be a readable image")
        .to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code in the image");
    let (_, content) = grids[0].decode().expect("QR code should decode");
    content
}
