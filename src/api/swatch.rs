//! Renders a palette as a grid of color swatches.

use image::{Rgba, RgbaImage};
use palette::{cast, Srgb, Srgba, WithAlpha};

/// The number of swatches in each row of a [`palette_swatch`] image.
pub const SWATCHES_PER_ROW: u32 = 8;

/// The width and height of a single swatch in pixels.
pub const SWATCH_SIZE: u32 = 10;

/// Draws each palette color as a `SWATCH_SIZE`×`SWATCH_SIZE` square, [`SWATCHES_PER_ROW`] per row,
/// in palette order. The last row is padded with transparent pixels.
///
/// # Examples
/// ```
/// # use octette::palette_swatch;
/// # use palette::Srgba;
/// let palette = vec![Srgba::new(255, 0, 0, 255); 9];
/// let swatch = palette_swatch(&palette);
/// assert_eq!(swatch.dimensions(), (80, 20));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn palette_swatch(palette: &[Srgba<u8>]) -> RgbaImage {
    let rows = (palette.len() as u32).div_ceil(SWATCHES_PER_ROW);
    RgbaImage::from_fn(
        SWATCHES_PER_ROW * SWATCH_SIZE,
        rows * SWATCH_SIZE,
        |x, y| {
            let i = (y / SWATCH_SIZE * SWATCHES_PER_ROW + x / SWATCH_SIZE) as usize;
            palette
                .get(i)
                .map_or(Rgba([0; 4]), |&color| Rgba(cast::into_array(color)))
        },
    )
}

/// Adds a fully opaque alpha channel to each color.
#[must_use]
pub fn opaque_palette(palette: &[Srgb<u8>]) -> Vec<Srgba<u8>> {
    palette.iter().map(|color| color.with_alpha(u8::MAX)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swatch_geometry() {
        assert_eq!(palette_swatch(&[]).dimensions(), (80, 0));

        let palette = opaque_palette(&[Srgb::new(1, 2, 3); 8]);
        assert_eq!(palette_swatch(&palette).dimensions(), (80, 10));

        let palette = opaque_palette(&[Srgb::new(1, 2, 3); 17]);
        assert_eq!(palette_swatch(&palette).dimensions(), (80, 30));
    }

    #[test]
    fn swatches_follow_palette_order() {
        let palette = (0..10)
            .map(|i| Srgba::new(i * 20, 0, 0, 255))
            .collect::<Vec<_>>();
        let swatch = palette_swatch(&palette);

        assert_eq!(swatch.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(swatch.get_pixel(9, 9), &Rgba([0, 0, 0, 255]));
        assert_eq!(swatch.get_pixel(10, 0), &Rgba([20, 0, 0, 255]));
        assert_eq!(swatch.get_pixel(79, 0), &Rgba([140, 0, 0, 255]));
        assert_eq!(swatch.get_pixel(15, 15), &Rgba([180, 0, 0, 255]));
        // padding after the last color
        assert_eq!(swatch.get_pixel(25, 15), &Rgba([0, 0, 0, 0]));
    }
}
