//! Contains the types and functions for the high level pipeline builder API.

#[cfg(feature = "image")]
mod frame_pipeline;
mod image_pipeline;
mod palette_pipeline;
#[cfg(feature = "image")]
mod swatch;

#[cfg(feature = "gif")]
pub use frame_pipeline::encode_gif;
#[cfg(feature = "image")]
pub use frame_pipeline::FramePipeline;
pub use image_pipeline::ImagePipeline;
pub use palette_pipeline::PalettePipeline;
#[cfg(feature = "image")]
pub use swatch::{opaque_palette, palette_swatch, SWATCHES_PER_ROW, SWATCH_SIZE};
