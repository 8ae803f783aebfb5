use cereal_map::config::GlyphConfig;
use cereal_map::context::RenderContext;
use cereal_map::data::{GeoFeature, Polygon};
use cereal_map::link::StatIndex;
use cereal_map::map::{MapRenderer, Viewport};
use cereal_map::stats::{prepare, Element, Record};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const COUNTRIES: usize = 54;
const YEARS: [i32; 2] = [2016, 1980];

fn country_name(i: usize) -> String {
    format!("Country {i:02}")
}

/// A grid of square countries roughly covering Africa
fn synthetic_features() -> Vec<GeoFeature> {
    (0..COUNTRIES)
        .map(|i| {
            let lon = -17.0 + (i % 9) as f64 * 7.0;
            let lat = -34.0 + (i / 9) as f64 * 11.0;
            let exterior = (0..=64)
                .map(|k| {
                    let t = k as f64 / 64.0 * std::f64::consts::TAU;
                    (lon + 3.0 + 3.0 * t.cos(), lat + 5.0 + 5.0 * t.sin())
                })
                .collect();
            GeoFeature::new(country_name(i), vec![Polygon { exterior, holes: vec![] }])
        })
        .collect()
}

fn synthetic_records() -> Vec<Record> {
    let mut records = Vec::new();
    for i in 0..COUNTRIES {
        let name = country_name(i);
        for year in 1980..=2016 {
            let base = (i + 1) as f64 * 1000.0 + (year - 1980) as f64 * 37.0;
            records.push(Record::new(&name, Element::AreaHarvested, year, base, "ha"));
            records.push(Record::new(&name, Element::Production, year, base * 1.7, "tonnes"));
            records.push(Record::new(&name, Element::Yield, year, 17000.0, "hg/ha"));
        }
    }
    records
}

fn bench_prepare(c: &mut Criterion) {
    let records = synthetic_records();
    c.bench_function("prepare_area_harvested", |b| {
        b.iter(|| prepare(black_box(&records), Element::AreaHarvested, &YEARS, None))
    });
}

fn bench_lookup(c: &mut Criterion) {
    let records = synthetic_records();
    let index = StatIndex::new(prepare(&records, Element::Production, &YEARS, None));
    let names: Vec<String> = (0..COUNTRIES).map(country_name).chain(["Atlantis".to_string()]).collect();
    c.bench_function("stat_index_lookup", |b| {
        b.iter(|| {
            names
                .iter()
                .filter(|name| index.lookup(black_box(name)).stat().is_some())
                .count()
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let features = synthetic_features();
    let records = synthetic_records();
    let glyphs = GlyphConfig::default();
    let ctx = RenderContext::build(&records, &features, YEARS, &glyphs);
    let renderer = MapRenderer::new(features, glyphs.bar_width);
    let (width, height) = (400, 200);
    let viewport = Viewport::fit_bounds(renderer.bounds(), width, height);

    c.bench_function("render_full_map", |b| {
        b.iter(|| renderer.render(width, height, black_box(&viewport), &ctx, Some(0), 1.0))
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let renderer = MapRenderer::new(synthetic_features(), 2);
    c.bench_function("feature_at", |b| {
        b.iter(|| renderer.feature_at(black_box(17.0), black_box(2.0)))
    });
}

criterion_group!(benches, bench_prepare, bench_lookup, bench_render, bench_hit_test);
criterion_main!(benches);
