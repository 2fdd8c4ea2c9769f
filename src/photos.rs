//! Photo upload handling.
//!
//! Decodes user-supplied image files into RGBA pixel data for the renderer,
//! and builds the default greeting card shown before any upload. Images that
//! fail to decode are logged and ignored; no entity is created for them.

use std::path::Path;

use image::RgbaImage;

/// Largest edge a photo texture is allowed; bigger uploads are downscaled.
const MAX_PHOTO_EDGE: u32 = 1024;

/// Decode an uploaded image file into RGBA pixels.
pub fn load_photo<P: AsRef<Path>>(path: P) -> Result<RgbaImage, String> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| format!("Failed to decode image {:?}: {}", path, e))?;

    let image = if image.width() > MAX_PHOTO_EDGE || image.height() > MAX_PHOTO_EDGE {
        image.resize(
            MAX_PHOTO_EDGE,
            MAX_PHOTO_EDGE,
            image::imageops::FilterType::Triangle,
        )
    } else {
        image
    };

    Ok(image.to_rgba8())
}

/// Procedural greeting card used as the scene's default photo: a dark
/// plaque with a double gold border.
pub fn default_greeting() -> RgbaImage {
    const SIZE: u32 = 256;
    const GOLD: [u8; 4] = [0xd4, 0xaf, 0x37, 0xff];
    const DARK: [u8; 4] = [0x1a, 0x1a, 0x1a, 0xff];

    let mut image = RgbaImage::from_pixel(SIZE, SIZE, image::Rgba(DARK));

    let mut paint_ring = |inset: u32, thickness: u32| {
        for y in 0..SIZE {
            for x in 0..SIZE {
                let edge = x
                    .min(y)
                    .min(SIZE - 1 - x)
                    .min(SIZE - 1 - y);
                if edge >= inset && edge < inset + thickness {
                    image.put_pixel(x, y, image::Rgba(GOLD));
                }
            }
        }
    };

    paint_ring(10, 6);
    paint_ring(24, 2);

    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_greeting_has_gold_border() {
        let image = default_greeting();
        assert_eq!(image.dimensions(), (256, 256));
        // Inside the outer ring.
        assert_eq!(image.get_pixel(12, 128).0, [0xd4, 0xaf, 0x37, 0xff]);
        // Center stays dark.
        assert_eq!(image.get_pixel(128, 128).0, [0x1a, 0x1a, 0x1a, 0xff]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_photo("/definitely/not/here.png").is_err());
    }
}
