//! Contains the [`ImagePipeline`] builder struct for the high level API.

use crate::{
    octree::{self, OctreeOptions},
    ColorComponents, ColorSlice, PalettePipeline, PaletteSize, QuantizeError, QuantizeOutput,
};

#[cfg(feature = "image")]
use {
    crate::AboveMaxLen,
    image::{RgbImage, RgbaImage},
    palette::{cast, Srgb, Srgba},
};

/// A builder struct to specify options to create a quantized image or an indexed palette from an image.
///
/// # Examples
/// To start, create a [`ImagePipeline`] from a [`RgbImage`] or a [`RgbaImage`]
/// (note that the `image` feature is needed):
/// ```no_run
/// # use octette::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let mut pipeline = ImagePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change different options like the tree depth or the number of colors in the palette:
/// ```
/// # use octette::ImagePipeline;
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let srgb = vec![Srgb::new(0u8, 0, 0)];
/// # let mut pipeline = ImagePipeline::new(srgb.as_slice().try_into()?, 1, 1)?;
/// let pipeline = pipeline
///     .max_depth(6)
///     .palette_size(64);
/// # Ok(())
/// # }
/// ```
///
/// Finally, run the pipeline:
/// ```no_run
/// # use octette::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let img = image::open("some image")?.into_rgb8();
/// # let pipeline = ImagePipeline::try_from(&img)?;
/// let image = pipeline.quantized_rgbimage()?;
/// # Ok(())
/// # }
/// ```
///
/// Instead of an [`RgbImage`] you can also get an indexed image
/// (a palette and a list of indices into the palette):
/// ```
/// # use octette::ImagePipeline;
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let srgb = vec![Srgb::new(0u8, 0, 0)];
/// # let pipeline = ImagePipeline::new(srgb.as_slice().try_into()?, 1, 1)?;
/// let output = pipeline.indexed_palette()?;
/// assert_eq!(output.palette, vec![Srgb::new(0, 0, 0)]);
/// assert_eq!(output.indices, vec![0]);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct ImagePipeline<'a, Color, const N: usize>
where
    Color: ColorComponents<u8, N>,
{
    /// The input image as a flat slice of pixels.
    pub(crate) colors: ColorSlice<'a, Color>,
    /// The dimensions of the image.
    pub(crate) dimensions: (u32, u32),
    /// The tree depth and palette size.
    pub(crate) options: OctreeOptions,
}

impl<'a, Color, const N: usize> ImagePipeline<'a, Color, N>
where
    Color: ColorComponents<u8, N>,
{
    /// Creates a new [`ImagePipeline`] with default options
    /// and does not validate the size of the input image/slice.
    fn new_unchecked(colors: ColorSlice<'a, Color>, width: u32, height: u32) -> Self {
        Self {
            colors,
            dimensions: (width, height),
            options: OctreeOptions::new(),
        }
    }

    /// Creates a new [`ImagePipeline`] with default options.
    ///
    /// # Errors
    /// Returns [`QuantizeError::DimensionMismatch`] if the length of `colors`
    /// is not equal to `width * height`.
    pub fn new(colors: ColorSlice<'a, Color>, width: u32, height: u32) -> Result<Self, QuantizeError> {
        let expected = width as usize * height as usize;
        if colors.len() == expected {
            Ok(Self::new_unchecked(colors, width, height))
        } else {
            Err(QuantizeError::DimensionMismatch { expected, actual: colors.len() })
        }
    }

    /// Sets the tree depth, i.e., the number of bits of each channel to consider.
    ///
    /// The default depth is [`OctreeOptions::DEFAULT_MAX_DEPTH`].
    pub fn max_depth(&mut self, max_depth: u8) -> &mut Self {
        self.options = self.options.max_depth(max_depth);
        self
    }

    /// Sets the palette size which determines the (maximum) number of colors to have in the palette.
    ///
    /// The default palette size is [`PaletteSize::MAX`].
    pub fn palette_size(&mut self, size: impl Into<PaletteSize>) -> &mut Self {
        self.options = self.options.palette_size(size.into());
        self
    }

    /// Replaces all options at once.
    pub fn options(&mut self, options: OctreeOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Runs the pipeline and returns the computed color palette.
    ///
    /// # Errors
    /// Returns [`QuantizeError::InvalidParameter`] if the depth or palette size is invalid.
    pub fn palette(&self) -> Result<Vec<Color>, QuantizeError> {
        PalettePipeline::from(self.clone()).palette()
    }

    /// Runs the pipeline and returns the quantized image as a list of indices into a palette.
    ///
    /// # Errors
    /// See [`ImagePipeline::palette`].
    pub fn indexed_palette(&self) -> Result<QuantizeOutput<Color>, QuantizeError> {
        octree::indexed_palette(self.colors, self.options)
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for ImagePipeline<'a, Srgb<u8>, 3> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        Ok(Self::new_unchecked(
            image.try_into()?,
            image.width(),
            image.height(),
        ))
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for ImagePipeline<'a, Srgba<u8>, 4> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        Ok(Self::new_unchecked(
            image.try_into()?,
            image.width(),
            image.height(),
        ))
    }
}

/// Replaces each index with its palette color and flattens the result into channel values.
#[cfg(feature = "image")]
fn remapped_components<Color, const N: usize>(output: QuantizeOutput<Color>) -> Vec<u8>
where
    Color: ColorComponents<u8, N>,
{
    let QuantizeOutput { palette, indices, .. } = output;
    let palette = palette.as_slice();
    indices
        .into_iter()
        .flat_map(|i| cast::into_array(palette[usize::from(i)]))
        .collect()
}

#[cfg(feature = "image")]
impl<'a> ImagePipeline<'a, Srgb<u8>, 3> {
    /// Runs the pipeline and returns the quantized image.
    ///
    /// # Errors
    /// See [`ImagePipeline::palette`].
    pub fn quantized_rgbimage(&self) -> Result<RgbImage, QuantizeError> {
        let (width, height) = self.dimensions;
        let buf = remapped_components::<_, 3>(self.indexed_palette()?);
        let len = buf.len();

        // indices.len() is equal to width * height, so this only fails on a bug
        RgbImage::from_vec(width, height, buf).ok_or(QuantizeError::DimensionMismatch {
            expected: width as usize * height as usize * 3,
            actual: len,
        })
    }
}

#[cfg(feature = "image")]
impl<'a> ImagePipeline<'a, Srgba<u8>, 4> {
    /// Runs the pipeline and returns the quantized image.
    ///
    /// Alpha is quantized along with the color channels.
    ///
    /// # Errors
    /// See [`ImagePipeline::palette`].
    pub fn quantized_rgbaimage(&self) -> Result<RgbaImage, QuantizeError> {
        let (width, height) = self.dimensions;
        let buf = remapped_components::<_, 4>(self.indexed_palette()?);
        let len = buf.len();

        RgbaImage::from_vec(width, height, buf).ok_or(QuantizeError::DimensionMismatch {
            expected: width as usize * height as usize * 4,
            actual: len,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgb;

    #[test]
    fn dimension_mismatch() {
        let colors = test_data_256();
        let colors = ColorSlice::try_from(colors.as_slice()).unwrap();
        assert!(ImagePipeline::new(colors, 16, 16).is_ok());
        assert!(matches!(
            ImagePipeline::new(colors, 16, 15),
            Err(QuantizeError::DimensionMismatch { expected: 240, actual: 256 })
        ));
    }

    #[test]
    fn indices_match_counts() {
        let colors = test_data_1024();
        let colors = ColorSlice::try_from(colors.as_slice()).unwrap();
        let output = ImagePipeline::new(colors, 32, 32)
            .unwrap()
            .max_depth(4)
            .palette_size(16)
            .indexed_palette()
            .unwrap();

        assert_eq!(output.indices.len(), 1024);
        assert!(output.palette.len() <= 16);
        let mut counts = vec![0; output.palette.len()];
        for &i in &output.indices {
            counts[usize::from(i)] += 1;
        }
        assert_eq!(counts, output.counts);
    }

    #[test]
    #[cfg(feature = "image")]
    fn black_and_white_image() {
        let mut img = RgbImage::new(10, 20);
        for (_, y, pixel) in img.enumerate_pixels_mut() {
            if y >= 10 {
                *pixel = image::Rgb([255, 255, 255]);
            }
        }

        let pipeline = ImagePipeline::try_from(&img).unwrap();
        assert_eq!(
            pipeline.palette().unwrap(),
            vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]
        );

        let quantized = pipeline.quantized_rgbimage().unwrap();
        assert_eq!(quantized, img);
    }

    #[test]
    #[cfg(feature = "image")]
    fn rgba_image_keeps_alpha() {
        let mut img = RgbaImage::new(4, 4);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 2 {
                image::Rgba([200, 100, 50, 0])
            } else {
                image::Rgba([200, 100, 50, 255])
            };
        }

        let quantized = ImagePipeline::try_from(&img)
            .unwrap()
            .quantized_rgbaimage()
            .unwrap();
        assert_eq!(quantized, img);
    }
}
