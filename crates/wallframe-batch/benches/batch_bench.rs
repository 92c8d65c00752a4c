// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for batch task expansion, output naming, and room
// cache lookups in the wallframe-batch crate.

use std::path::{Path, PathBuf};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use wallframe_batch::{BatchRequest, RoomCache};

fn request(photos: usize, templates: usize) -> BatchRequest {
    BatchRequest {
        photo_paths: (0..photos)
            .map(|i| PathBuf::from(format!("collections/landscapes/photo {i}.jpg")))
            .collect(),
        template_ids: (0..templates).map(|i| format!("room-{i}")).collect(),
        platforms: vec![
            "etsy".into(),
            "instagram-square".into(),
            "pinterest".into(),
            "web".into(),
        ],
        print_size: "24x36".into(),
        queue_to_agent: false,
    }
}

fn bench_expand(c: &mut Criterion) {
    let req = request(100, 20);
    c.bench_function("expand 100x20x4", |b| b.iter(|| black_box(&req).expand()));

    let tasks = req.expand();
    let dir = Path::new("/srv/wallframe/out/job");
    c.bench_function("output paths 8000 tasks", |b| {
        b.iter(|| {
            tasks
                .iter()
                .map(|t| t.output_path(dir, "jpg"))
                .count()
        })
    });
}

fn bench_room_cache(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("room.png");
    RgbaImage::from_pixel(640, 480, Rgba([200, 195, 185, 255]))
        .save(&path)
        .expect("save room");

    let cache = RoomCache::default();
    cache.get_or_load(&path).expect("warm cache");
    c.bench_function("room cache hit", |b| {
        b.iter(|| cache.get_or_load(black_box(&path)).expect("hit"))
    });
}

criterion_group!(benches, bench_expand, bench_room_cache);
criterion_main!(benches);
