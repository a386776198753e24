//! Contains the [`FramePipeline`] builder struct for quantizing animations with a shared palette.

use crate::{
    error::invalid_parameter,
    octree::{ColorTree, IndexedTree, OctreeOptions},
    AboveMaxLen, ColorSlice, PaletteSize, QuantizeError, MAX_PIXELS,
};
use image::{Frame, RgbaImage};
use log::debug;
use palette::{
    cast::{self, ComponentsAs},
    Srgba,
};

#[cfg(feature = "gif")]
use {
    image::codecs::gif::{GifEncoder, Repeat},
    std::io::Write,
};

/// The palette entry used for fully transparent pixels.
const TRANSPARENT: Srgba<u8> = Srgba::new(0, 0, 0, 0);

/// A builder struct to quantize a sequence of frames (e.g., a decoded GIF) with one shared palette.
///
/// Every frame is expected to be fully composited already, as returned by
/// [`image::AnimationDecoder::into_frames`].
///
/// All frames contribute to one color tree. Fully transparent pixels (alpha `0`) are not
/// inserted into the tree; if any exist, one palette slot is set aside for them and a
/// transparent color is placed at the end of the palette.
///
/// # Examples
/// ```no_run
/// # use octette::{FramePipeline, encode_gif};
/// # use image::{AnimationDecoder, codecs::gif::GifDecoder};
/// # use std::{fs::File, io::BufReader};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let decoder = GifDecoder::new(BufReader::new(File::open("some animation.gif")?))?;
/// let frames = decoder.into_frames().collect_frames()?;
///
/// let quantized = FramePipeline::new(&frames)
///     .max_depth(6)
///     .palette_size(64.into())
///     .quantized_frames()?;
///
/// encode_gif(File::create("quantized.gif")?, quantized)?;
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Clone)]
pub struct FramePipeline<'a> {
    /// The composited input frames.
    frames: &'a [Frame],
    /// The tree depth and palette size, including the transparent slot.
    options: OctreeOptions,
}

impl<'a> FramePipeline<'a> {
    /// Creates a new [`FramePipeline`] with default options.
    pub fn new(frames: &'a [Frame]) -> Self {
        Self { frames, options: OctreeOptions::new() }
    }

    /// Sets the tree depth, i.e., the number of bits of each channel to consider.
    ///
    /// The default depth is [`OctreeOptions::DEFAULT_MAX_DEPTH`].
    pub fn max_depth(mut self, max_depth: u8) -> Self {
        self.options = self.options.max_depth(max_depth);
        self
    }

    /// Sets the (maximum) number of colors in the palette.
    ///
    /// If the frames contain transparent pixels, one of these colors is the transparent color.
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

    /// Views the pixels of a frame as colors.
    fn colors(frame: &Frame) -> &[Srgba<u8>] {
        let buffer = frame.buffer();
        let pixels = buffer.pixels().len();
        buffer.as_raw()[..(pixels * 4)].components_as()
    }

    /// Builds the shared tree, returning the tree palette and lookup
    /// and whether a transparent slot was reserved.
    fn build(&self) -> Result<(IndexedTree<Srgba<u8>, u8, 4>, bool), QuantizeError> {
        let mut total = 0u32;
        let mut has_transparent = false;
        for frame in self.frames {
            let colors = ColorSlice::try_from(Self::colors(frame))?;
            total = total
                .checked_add(colors.num_colors())
                .ok_or(AboveMaxLen(MAX_PIXELS))?;
            has_transparent |= colors.iter().any(|c| c.alpha == 0);
        }

        let mut options = self.options;
        if has_transparent {
            if options.palette_size.into_inner() < 2 {
                return Err(invalid_parameter(
                    "palette_size",
                    &options.palette_size,
                    &"must be at least 2 to make room for the transparent color",
                ));
            }
            options = options.palette_size(options.palette_size.reserve_one());
        }

        let mut tree = ColorTree::with_options(options)?;
        for frame in self.frames {
            for &color in Self::colors(frame) {
                if color.alpha != 0 {
                    tree.insert(color);
                }
            }
        }

        debug!(
            "inserted {total} pixels from {} frames (transparent: {has_transparent})",
            self.frames.len()
        );

        Ok((tree.build_palette()?, has_transparent))
    }

    /// Runs the pipeline and returns the shared palette.
    ///
    /// The transparent color, if any, is the last entry.
    ///
    /// # Errors
    /// Returns [`QuantizeError::TooManyPixels`] if the frames have more than [`MAX_PIXELS`]
    /// pixels in total, or [`QuantizeError::InvalidParameter`] if the options are invalid.
    pub fn palette(&self) -> Result<Vec<Srgba<u8>>, QuantizeError> {
        let (tree, has_transparent) = self.build()?;
        let (mut palette, _) = tree.into_palette();
        if has_transparent {
            palette.push(TRANSPARENT);
        }
        Ok(palette)
    }

    /// Runs the pipeline and returns the shared palette and, for each frame,
    /// a list of indices into the palette.
    ///
    /// # Errors
    /// See [`FramePipeline::palette`].
    pub fn indexed_frames(&self) -> Result<(Vec<Srgba<u8>>, Vec<Vec<u8>>), QuantizeError> {
        let (tree, has_transparent) = self.build()?;

        #[allow(clippy::cast_possible_truncation)]
        let transparent = tree.palette().len() as u8;

        let indices = self
            .frames
            .iter()
            .map(|frame| {
                Self::colors(frame)
                    .iter()
                    .map(|&color| {
                        if color.alpha == 0 {
                            transparent
                        } else {
                            tree.palette_index(color)
                        }
                    })
                    .collect()
            })
            .collect();

        let (mut palette, _) = tree.into_palette();
        if has_transparent {
            palette.push(TRANSPARENT);
        }

        Ok((palette, indices))
    }

    /// Runs the pipeline and returns the quantized frames.
    ///
    /// Frame delays and offsets are preserved.
    ///
    /// # Errors
    /// See [`FramePipeline::palette`].
    pub fn quantized_frames(&self) -> Result<Vec<Frame>, QuantizeError> {
        let (palette, indices) = self.indexed_frames()?;
        let palette = palette.as_slice();

        self.frames
            .iter()
            .zip(indices)
            .map(|(frame, indices)| {
                let (width, height) = frame.buffer().dimensions();
                let buf = indices
                    .into_iter()
                    .flat_map(|i| cast::into_array(palette[usize::from(i)]))
                    .collect::<Vec<_>>();
                let len = buf.len();

                let image = RgbaImage::from_vec(width, height, buf).ok_or(
                    QuantizeError::DimensionMismatch {
                        expected: width as usize * height as usize * 4,
                        actual: len,
                    },
                )?;

                Ok(Frame::from_parts(image, frame.left(), frame.top(), frame.delay()))
            })
            .collect()
    }
}

/// Writes `frames` as an infinitely looping GIF.
///
/// # Errors
/// Returns [`QuantizeError::Image`] if encoding or writing fails.
#[cfg(feature = "gif")]
pub fn encode_gif<W: Write>(writer: W, frames: Vec<Frame>) -> Result<(), QuantizeError> {
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;
    encoder.encode_frames(frames)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Delay, Rgba};

    fn frame(pixels: &[[u8; 4]], delay_ms: u32) -> Frame {
        #[allow(clippy::cast_possible_truncation)]
        let width = pixels.len() as u32;
        let image = RgbaImage::from_fn(width, 1, |x, _| Rgba(pixels[x as usize]));
        Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
    }

    #[test]
    fn opaque_frames_share_a_palette() {
        let frames = [
            frame(&[[0, 0, 0, 255], [255, 255, 255, 255]], 10),
            frame(&[[255, 255, 255, 255], [255, 0, 0, 255]], 20),
        ];

        let (palette, indices) = FramePipeline::new(&frames).indexed_frames().unwrap();
        assert_eq!(
            palette,
            vec![
                Srgba::new(0, 0, 0, 255),
                Srgba::new(255, 0, 0, 255),
                Srgba::new(255, 255, 255, 255),
            ]
        );
        assert_eq!(indices, vec![vec![0, 2], vec![2, 1]]);
    }

    #[test]
    fn transparent_pixels_get_the_last_slot() {
        let frames = [
            frame(&[[0, 0, 0, 0], [10, 20, 30, 255]], 10),
            frame(&[[10, 20, 30, 255], [0, 0, 0, 0]], 10),
        ];

        let (palette, indices) = FramePipeline::new(&frames).indexed_frames().unwrap();
        assert_eq!(palette, vec![Srgba::new(10, 20, 30, 255), TRANSPARENT]);
        assert_eq!(indices, vec![vec![1, 0], vec![0, 1]]);
    }

    #[test]
    fn transparent_slot_counts_towards_palette_size() {
        let colors = crate::tests::test_data_1024();
        let mut pixels = colors
            .iter()
            .map(|c| [c.red, c.green, c.blue, 255])
            .collect::<Vec<_>>();
        pixels.push([0, 0, 0, 0]);
        let frames = [frame(&pixels, 10)];

        let palette = FramePipeline::new(&frames)
            .palette_size(16.into())
            .palette()
            .unwrap();
        assert!(palette.len() <= 16);
        assert_eq!(palette.last(), Some(&TRANSPARENT));

        let result = FramePipeline::new(&frames).palette_size(1.into()).palette();
        assert!(matches!(
            result,
            Err(QuantizeError::InvalidParameter { parameter: "palette_size", .. })
        ));
    }

    #[test]
    fn quantized_frames_keep_delays() {
        let frames = [
            frame(&[[0, 0, 0, 255], [0, 0, 0, 0]], 30),
            frame(&[[255, 255, 255, 255], [0, 0, 0, 255]], 70),
        ];

        let quantized = FramePipeline::new(&frames).quantized_frames().unwrap();
        assert_eq!(quantized.len(), 2);
        for (original, quantized) in frames.iter().zip(&quantized) {
            assert_eq!(original.delay(), quantized.delay());
            assert_eq!(original.buffer(), quantized.buffer());
        }
    }

    #[test]
    #[cfg(feature = "gif")]
    fn encodes_a_gif() {
        let frames = [
            frame(&[[0, 0, 0, 255], [255, 255, 255, 255]], 10),
            frame(&[[255, 255, 255, 255], [0, 0, 0, 0]], 10),
        ];

        let quantized = FramePipeline::new(&frames).quantized_frames().unwrap();
        let mut bytes = Vec::new();
        encode_gif(&mut bytes, quantized).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }
}
