//! Benchmarks for the controller pipeline on large plans.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rustc_hash::FxHashMap;
use tui_ganttview::{
    ChartMode, ControllerConfig, DAY_MS, GanttController, GanttTree, HeightCache, ScrollRatio,
    Task, TaskNode, ViewportAnchor, build_visibility, linearize, reconcile,
};

// `phases` parents with `steps` dated children each; every other parent collapsed.
fn build_tree(phases: usize, steps: usize) -> GanttTree {
    let mut day = 0i64;
    let nodes = (0..phases)
        .map(|phase| {
            let children = (0..steps)
                .map(|step| {
                    let start = day * DAY_MS;
                    day += 1;
                    let task = Task::new(format!("step {phase}.{step}"))
                        .with_id(format!("{phase}.{step}"))
                        .with_actual(start, start + 3 * DAY_MS)
                        .with_progress(0.5);
                    let task = if step > 0 {
                        task.connect_to(format!("{phase}.{}", step - 1), None)
                    } else {
                        task
                    };
                    TaskNode::leaf(task)
                })
                .collect();
            TaskNode::new(
                Task::new(format!("phase {phase}")).collapsed(phase % 2 == 1),
                children,
            )
        })
        .collect();
    GanttTree::from_nodes(nodes)
}

fn heights(rows: usize) -> HeightCache {
    let mut cache = HeightCache::with_capacity(rows);
    for row in 0..rows {
        cache.push(if row % 7 == 0 { 41.0 } else { 21.0 });
    }
    cache
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let config = ControllerConfig::project();

    for phases in [100usize, 1_000] {
        let tree = build_tree(phases, 10);
        let label = format!("{}", tree.len());
        let empty = FxHashMap::default();

        group.bench_with_input(BenchmarkId::new("linearize", &label), &tree, |b, tree| {
            b.iter(|| black_box(linearize(tree, ChartMode::Project, &empty)));
        });

        let metas = linearize(&tree, ChartMode::Project, &empty).metas;
        group.bench_with_input(BenchmarkId::new("build_visibility", &label), &tree, |b, tree| {
            b.iter(|| black_box(build_visibility(tree, &metas, &config)));
        });

        group.bench_with_input(BenchmarkId::new("full_run", &label), &tree, |b, tree| {
            b.iter(|| {
                let mut controller = GanttController::new(config);
                controller.set_available_height(600.0);
                controller.run(tree);
                black_box(controller.viewport())
            });
        });
    }

    group.finish();
}

fn bench_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll");

    for rows in [10_000usize, 100_000] {
        let cache = heights(rows);
        let total = cache.total();

        group.bench_with_input(BenchmarkId::new("index_by_height", rows), &cache, |b, cache| {
            let mut px = 0.0;
            b.iter(|| {
                px = (px + 997.0) % total;
                black_box(cache.index_by_height(px))
            });
        });

        group.bench_with_input(BenchmarkId::new("reconcile_end", rows), &cache, |b, cache| {
            let anchor = ViewportAnchor::FromEnd { index: rows / 2 };
            b.iter(|| black_box(reconcile(cache, 800.0, anchor)));
        });
    }

    let tree = build_tree(1_000, 10);
    let mut controller = GanttController::new(ControllerConfig::project());
    controller.set_available_height(600.0);
    controller.run(&tree);
    group.bench_function("scroll_changed_and_run", |b| {
        let mut step = 0u32;
        b.iter(|| {
            step = (step + 1) % 100;
            let start = f64::from(step) / 100.0;
            controller.scroll_changed(ScrollRatio::new(start, start + 0.05));
            controller.run(&tree);
            black_box(controller.viewport())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_scroll);
criterion_main!(benches);
