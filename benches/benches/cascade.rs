// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_cascade`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_cascade::{
    CascadeConfigBuilder, ParentRef, PropertyIndex, StyleId, StyleName, StyleRegistry,
};

struct Chain {
    styles: StyleRegistry<u32>,
    color: PropertyIndex,
    size: PropertyIndex,
    leaf: StyleId,
}

/// `s0 <- s1 <- ... <- s(len-1)`, with `color` set on the root only and a few
/// layers per style.
fn chain(len: u32) -> Chain {
    let config = CascadeConfigBuilder::new()
        .variant("idle")
        .variant("hover")
        .variant("selected")
        .build();
    let mut styles = StyleRegistry::new(config);
    let color = styles.register_property("color");
    let size = styles.register_property("size");
    for i in 0..8 {
        styles.register_property(&format!("filler_{i}"));
    }

    let mut leaf = styles
        .create(StyleName::new("s0"), ParentRef::None)
        .expect("root style");
    styles
        .node_mut(leaf)
        .expect("live style")
        .set_property("color", 0xff_00_00);
    for i in 1..len {
        let parent = format!("s{}", i - 1);
        leaf = styles
            .create(StyleName::new(&format!("s{i}")), parent.as_str())
            .expect("chained style");
        let node = styles.node_mut(leaf).expect("live style");
        node.set_property("size", i);
        node.set_property("hover_size", i + 1);
    }
    Chain {
        styles,
        color,
        size,
        leaf,
    }
}

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/resolve");

    for len in [4_u32, 16, 64] {
        group.bench_function(BenchmarkId::new("warm_root_property", len), |b| {
            let Chain {
                mut styles,
                color,
                leaf,
                ..
            } = chain(len);
            styles.build(leaf).expect("build");
            b.iter(|| black_box(styles.get(leaf, color).expect("resolve").copied()));
        });

        group.bench_function(BenchmarkId::new("warm_own_property", len), |b| {
            let Chain {
                mut styles,
                size,
                leaf,
                ..
            } = chain(len);
            styles.build(leaf).expect("build");
            b.iter(|| black_box(styles.get(leaf, size).expect("resolve").copied()));
        });

        group.bench_function(BenchmarkId::new("cold_build_and_resolve", len), |b| {
            b.iter_batched(
                || chain(len),
                |Chain {
                     mut styles,
                     color,
                     leaf,
                     ..
                 }| black_box(styles.get(leaf, color).expect("resolve").copied()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();

    let mut group = c.benchmark_group("cascade/naming");

    group.bench_function("style/auto_create", |b| {
        b.iter_batched(
            || chain(4),
            |Chain { mut styles, .. }| {
                black_box(styles.style("hover_big_s3").expect("auto-created"));
                black_box(styles.style("missing").is_err());
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("rebuild/64", |b| {
        let Chain { mut styles, .. } = chain(64);
        b.iter(|| styles.rebuild().expect("rebuild"));
    });

    group.finish();
}

criterion_group!(benches, bench_cascade);
criterion_main!(benches);
