#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use clap::Parser;
use image::{codecs::gif::GifDecoder, AnimationDecoder};
use log::{LevelFilter, Metadata, Record};
use octette::{
    encode_gif, octree::OctreeOptions, opaque_palette, palette_swatch, FramePipeline,
    ImagePipeline, PaletteSize,
};

/// Quantize an image or animated GIF with an octree.
#[derive(Parser)]
pub struct Options {
    /// The image to quantize. Files ending in `.gif` are read as animations.
    input: PathBuf,

    /// Where to write the result. Defaults to `<stem>_quantized.<ext>` next to the input.
    output: Option<PathBuf>,

    /// The number of bits of each channel to consider.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=8))]
    depth: u8,

    /// The maximum number of palette colors. Defaults to `2^depth`, capped at 256.
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u16).range(2..=256))]
    colors: Option<u16>,

    /// Also write the palette as a swatch image to this path.
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Print timings and quantizer diagnostics.
    #[arg(long)]
    verbose: bool,
}

/// Prints log records to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().map_or("png".into(), |ext| ext.to_string_lossy());
    input.with_file_name(format!("{stem}_quantized.{ext}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let Options { input, output, depth, colors, palette, verbose } = Options::parse();

    if verbose {
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(LevelFilter::Debug))
            .map_err(|e| e.to_string())?;
    }

    macro_rules! timed {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let palette_size = colors.map_or(PaletteSize::for_depth(depth), PaletteSize::from_clamped);
    let options = OctreeOptions::new()
        .max_depth(depth)
        .palette_size(palette_size);

    let output = output.unwrap_or_else(|| default_output(&input));
    let is_gif = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));

    let swatch = if is_gif {
        let decoder = GifDecoder::new(BufReader::new(File::open(&input)?))?;
        let frames = timed!("decode frames", decoder.into_frames().collect_frames())?;
        let pipeline = FramePipeline::new(&frames).options(options);

        let quantized = timed!("quantization and remapping", pipeline.quantized_frames())?;
        timed!(
            "encode frames",
            encode_gif(BufWriter::new(File::create(&output)?), quantized)
        )?;

        if palette.is_some() {
            Some(pipeline.palette()?)
        } else {
            None
        }
    } else {
        let image = timed!("read image", image::open(&input))?;

        if image.color().has_alpha() {
            let image = image.into_rgba8();
            let mut pipeline = ImagePipeline::try_from(&image)?;
            pipeline.options(options);

            let quantized = timed!("quantization and remapping", pipeline.quantized_rgbaimage())?;
            timed!("write image", quantized.save(&output))?;

            if palette.is_some() {
                Some(pipeline.palette()?)
            } else {
                None
            }
        } else {
            let image = image.into_rgb8();
            let mut pipeline = ImagePipeline::try_from(&image)?;
            pipeline.options(options);

            let quantized = timed!("quantization and remapping", pipeline.quantized_rgbimage())?;
            timed!("write image", quantized.save(&output))?;

            if palette.is_some() {
                Some(opaque_palette(&pipeline.palette()?))
            } else {
                None
            }
        }
    };

    println!("Quantized image saved as {}", output.display());

    if let (Some(path), Some(colors)) = (palette, swatch) {
        timed!("write palette", palette_swatch(&colors).save(&path))?;
        println!("Palette image saved as {}", path.display());
    }

    Ok(())
}
