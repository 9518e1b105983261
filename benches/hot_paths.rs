use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quake_map::config::{MapView, TileSource};
use quake_map::feed::EarthquakeFeature;
use quake_map::map::{build_base_layers, build_overlay, compose_map, MapRenderer, Viewport};
use quake_map::style::FeatureStyler;

/// A week's worth of synthetic quakes scattered around the default view
fn synthetic_feed(count: usize) -> Vec<EarthquakeFeature> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            EarthquakeFeature {
                magnitude: Some((t * 0.37) % 7.0 - 0.5),
                place: Some(format!("{}km NE of Somewhere", i % 90)),
                longitude: -125.0 + (t * 0.61) % 12.0,
                latitude: 32.0 + (t * 0.29) % 10.0,
            }
        })
        .collect()
}

fn bench_overlay(c: &mut Criterion) {
    let features = synthetic_feed(2_000);
    let styler = FeatureStyler::default();

    c.bench_function("build_overlay_2k", |b| {
        b.iter(|| build_overlay(black_box(&features), &styler))
    });
}

fn bench_render(c: &mut Criterion) {
    let styler = FeatureStyler::default();
    let overlay = build_overlay(&synthetic_feed(2_000), &styler);
    let map = compose_map(build_base_layers(&TileSource::default()), overlay, MapView::default()).unwrap();
    let renderer = MapRenderer::new();
    let viewport = Viewport::from_view(&map.view, 400, 200);

    c.bench_function("render_markers_2k", |b| {
        b.iter(|| renderer.render(black_box(&map), 200, 50, &viewport))
    });
}

criterion_group!(benches, bench_overlay, bench_render);
criterion_main!(benches);
