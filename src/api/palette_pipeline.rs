//! Contains the [`PalettePipeline`] builder struct for the high level API.

use crate::{
    octree::{self, OctreeOptions},
    ColorComponents, ColorSlice, ImagePipeline, PaletteSize, QuantizeError,
};

#[cfg(feature = "image")]
use {
    crate::AboveMaxLen,
    image::{RgbImage, RgbaImage},
    palette::{Srgb, Srgba},
};

/// A builder struct to specify options to create a color palette for an image or slice of colors.
///
/// # Examples
/// To start, create a [`PalettePipeline`] from a [`RgbImage`] or [`RgbaImage`]
/// (note that the `image` feature is needed):
/// ```no_run
/// # use octette::PalettePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let pipeline = PalettePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Or, from a slice of colors:
/// ```
/// # use octette::{PalettePipeline, ColorSlice};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let srgb = vec![Srgb::new(0u8, 0, 0), Srgb::new(255, 255, 255)];
/// let pipeline = PalettePipeline::new(ColorSlice::try_from(srgb.as_slice())?);
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change the tree depth and the number of colors in the palette:
/// ```
/// # use octette::{PalettePipeline, ColorSlice};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let srgb = vec![Srgb::new(0u8, 0, 0), Srgb::new(255, 255, 255)];
/// # let pipeline = PalettePipeline::new(ColorSlice::try_from(srgb.as_slice())?);
/// let palette = pipeline
///     .max_depth(5)
///     .palette_size(16.into())
///     .palette()?;
///
/// assert_eq!(palette, vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct PalettePipeline<'a, Color, const N: usize>
where
    Color: ColorComponents<u8, N>,
{
    /// The input colors.
    pub(crate) colors: ColorSlice<'a, Color>,
    /// The tree depth and palette size.
    pub(crate) options: OctreeOptions,
}

impl<'a, Color, const N: usize> PalettePipeline<'a, Color, N>
where
    Color: ColorComponents<u8, N>,
{
    /// Creates a new [`PalettePipeline`] with default options.
    pub fn new(colors: ColorSlice<'a, Color>) -> Self {
        Self { colors, options: OctreeOptions::new() }
    }

    /// Sets the tree depth, i.e., the number of bits of each channel to consider.
    ///
    /// The depth must be in the range `1..=8`; other values are reported
    /// as an error when the pipeline is run.
    ///
    /// The default depth is [`OctreeOptions::DEFAULT_MAX_DEPTH`].
    pub fn max_depth(mut self, max_depth: u8) -> Self {
        self.options = self.options.max_depth(max_depth);
        self
    }

    /// Sets the palette size which determines the (maximum) number of colors to have in the palette.
    ///
    /// The default palette size is [`PaletteSize::MAX`].
    pub fn palette_size(mut self, size: PaletteSize) -> Self {
        self.options = self.options.palette_size(size);
        self
    }

    /// Replaces all options at once.
    pub fn options(mut self, options: OctreeOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the pipeline and returns the computed color palette.
    ///
    /// # Errors
    /// Returns [`QuantizeError::InvalidParameter`] if the depth or palette size is invalid.
    pub fn palette(self) -> Result<Vec<Color>, QuantizeError> {
        let Self { colors, options } = self;
        Ok(octree::palette(colors, options)?.palette)
    }

    /// Runs the pipeline and returns the computed color palette
    /// alongside the number of colors represented by each palette entry.
    ///
    /// # Errors
    /// See [`PalettePipeline::palette`].
    pub fn palette_counts(self) -> Result<(Vec<Color>, Vec<u32>), QuantizeError> {
        let Self { colors, options } = self;
        let output = octree::palette(colors, options)?;
        Ok((output.palette, output.counts))
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for PalettePipeline<'a, Srgb<u8>, 3> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        Ok(Self::new(image.try_into()?))
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for PalettePipeline<'a, Srgba<u8>, 4> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        Ok(Self::new(image.try_into()?))
    }
}

impl<'a, Color, const N: usize> From<ImagePipeline<'a, Color, N>> for PalettePipeline<'a, Color, N>
where
    Color: ColorComponents<u8, N>,
{
    fn from(value: ImagePipeline<'a, Color, N>) -> Self {
        let ImagePipeline { colors, options, .. } = value;
        Self { colors, options }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgb;

    #[test]
    fn respects_palette_size() {
        let colors = test_data_1024();
        let colors = ColorSlice::try_from(colors.as_slice()).unwrap();

        for size in [1u8, 2, 16, 100] {
            let (palette, counts) = PalettePipeline::new(colors)
                .palette_size(size.into())
                .palette_counts()
                .unwrap();

            assert!(!palette.is_empty());
            assert!(palette.len() <= usize::from(size));
            assert_eq!(counts.len(), palette.len());
            assert_eq!(counts.iter().sum::<u32>(), 1024);
        }
    }

    #[test]
    fn invalid_depth_is_reported() {
        let colors = vec![Srgb::new(0u8, 0, 0)];
        let result = PalettePipeline::new(ColorSlice::try_from(colors.as_slice()).unwrap())
            .max_depth(9)
            .palette();

        assert!(matches!(
            result,
            Err(QuantizeError::InvalidParameter { parameter: "max_depth", .. })
        ));
    }
}
