use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wallflower::kmeans::{PaletteOptions, dominant_colors_image};

// a few flat color regions with per-pixel noise, like a 256x256 palette thumbnail
fn generate_image(width: u32, height: u32, regions: usize) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(42);
    let colors = (0..regions).map(|_| [rng.random::<u8>(), rng.random(), rng.random()]).collect::<Vec<_>>();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b] = colors[((x / 32 + y / 32) as usize) % regions];
        let noise = rng.random_range(0..8);
        Rgb([r.saturating_add(noise), g.saturating_add(noise), b.saturating_sub(noise)])
    })
}

fn bench_palette(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette");
    group.sample_size(10);

    let image = black_box(generate_image(256, 256, 12));
    for (k, restarts) in [(5, 1), (10, 1), (10, 10)] {
        let options = PaletteOptions { k, restarts, seed: Some(0), ..Default::default() };
        group.bench_function(format!("dominant_colors_k{k}_restarts{restarts}"), |b| {
            b.iter(|| dominant_colors_image(&image, &options))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_palette);
criterion_main!(benches);
