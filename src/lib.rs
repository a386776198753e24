//! A library for octree color quantization and palette generation.
//!
//! `octette` inserts the colors of an image into a trie with one level per bit of color
//! resolution, merges the deepest branches until the requested number of leaves remains,
//! and then uses the average color of each leaf as a palette entry.
//! Any color, inserted or not, can afterwards be mapped to a palette index by walking the same trie.
//!
//! Both RGB and RGBA colors with `u8` or `u16` channels are supported.
//!
//! # Features
//! To reduce dependencies and compile times, `octette` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes builder structs that serve as the high-level API (more details below).
//! - `image`: enables integration with the [`image`] crate.
//! - `gif`: adds [`FramePipeline`] support for animated GIFs.
//!
//! # High-Level API
//! To get started with the high-level API, see [`ImagePipeline`].
//! If you want a color palette instead of a quantized image, see [`PalettePipeline`] instead.
//! Both of these have examples in their documentation, but here is an additional example:
//! ```no_run
//! # use octette::ImagePipeline;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//!
//! let quantized = ImagePipeline::try_from(&img)?
//!     .max_depth(6) // only consider the top 6 bits of each channel
//!     .palette_size(48) // set the max number of colors in the palette
//!     .quantized_rgbimage()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The [`octree`] module exposes the [`ColorTree`](octree::ColorTree) itself,
//! for incremental insertion and for palette lookups of arbitrary colors.
//!
//! Note that some of the types and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod error;
mod traits;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub mod octree;

pub use error::QuantizeError;
pub use traits::*;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
///
/// This bounds the total number of colors inserted into a single tree,
/// including all frames of an animation quantized with a shared palette.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

#[cfg(test)]
pub(crate) mod tests {
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// Generates `len` pseudo-random colors from a fixed seed.
    fn test_data(len: usize, seed: u64) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        (0..len)
            .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
            .collect()
    }

    pub fn test_data_256() -> Vec<Srgb<u8>> {
        test_data(256, 42)
    }

    pub fn test_data_1024() -> Vec<Srgb<u8>> {
        test_data(1024, 0)
    }
}
