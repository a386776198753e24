use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use octette::{
    octree::{self, ColorTree, OctreeOptions},
    ColorSlice, PaletteSize,
};
use palette::{Srgb, Srgba, WithAlpha};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Pseudo-random pixels with a limited number of distinct colors, roughly like a photo.
fn synthetic_image(len: usize, distinct: usize, seed: u64) -> Vec<Srgb<u8>> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let colors = (0..distinct)
        .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
        .collect::<Vec<_>>();

    (0..len)
        .map(|_| colors[rng.gen_range(0..distinct)])
        .collect()
}

fn images() -> Vec<(String, Vec<Srgb<u8>>)> {
    [(256 * 256, 1000), (512 * 512, 20_000), (1024 * 1024, 100_000)]
        .into_iter()
        .map(|(len, distinct)| (format!("{len}px_{distinct}"), synthetic_image(len, distinct, 0)))
        .collect()
}

fn bench<Input>(
    c: &mut Criterion,
    group: &str,
    inputs: &[(String, Input)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(OctreeOptions, &Input)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (depth, size, secs) in [(8, PaletteSize::MAX, 4), (5, 32.into(), 3), (8, 16.into(), 2)] {
        let options = OctreeOptions::new().max_depth(depth).palette_size(size);
        group.measurement_time(Duration::from_secs(secs));
        for (name, input) in inputs {
            group.bench_with_input(
                BenchmarkId::new(format!("d{depth}_k{size}"), name),
                &(options, input),
                &mut f,
            );
        }
    }
}

fn octree_palette(c: &mut Criterion) {
    let images = images();
    bench(c, "octree_palette", &images, |b, &(options, image)| {
        b.iter(|| octree::palette(ColorSlice::try_from(image.as_slice()).unwrap(), options))
    })
}

fn octree_indexed_palette(c: &mut Criterion) {
    let images = images();
    bench(c, "octree_indexed_palette", &images, |b, &(options, image)| {
        b.iter(|| {
            octree::indexed_palette(ColorSlice::try_from(image.as_slice()).unwrap(), options)
        })
    })
}

fn octree_rgba_insert(c: &mut Criterion) {
    let images = images()
        .into_iter()
        .map(|(name, image)| {
            let image = image
                .into_iter()
                .enumerate()
                .map(|(i, color)| color.with_alpha(if i % 7 == 0 { 0 } else { 255 }))
                .collect::<Vec<Srgba<u8>>>();
            (name, image)
        })
        .collect::<Vec<_>>();

    bench(c, "octree_rgba_insert", &images, |b, &(options, image)| {
        b.iter(|| {
            let mut tree = ColorTree::<Srgba<u8>, u8, 4>::with_options(options).unwrap();
            tree.add_colors(ColorSlice::try_from(image.as_slice()).unwrap());
            tree.leaf_count()
        })
    })
}

criterion_group!(
    benches,
    octree_palette,
    octree_indexed_palette,
    octree_rgba_insert
);
criterion_main!(benches);
