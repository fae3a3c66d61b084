use criterion::{criterion_group, criterion_main, Criterion};

use dsbrot_core::{EscapeKernel, KernelOptions, MulPrecision, Resolution, ViewportParams};
use dsbrot_render::{render, ColorPolicy, RenderCancel};

fn bench_full_frame_render(c: &mut Criterion) {
    let res = Resolution::new(640, 480).unwrap();
    let kernel = EscapeKernel::new(ViewportParams::<f32>::standard(res), KernelOptions::default());
    let cancel = RenderCancel::new();

    c.bench_function("full_frame_640x480", |b| {
        b.iter(|| render(&kernel, res, &cancel));
    });
}

fn bench_multiply_precision(c: &mut Criterion) {
    let res = Resolution::new(256, 256).unwrap();
    let params = ViewportParams::<f32>::from_view(-0.75, 0.1, 1e-9, res, 1000.0).unwrap();
    let cancel = RenderCancel::new();

    let mut group = c.benchmark_group("deep_zoom_256x256_1000iter");
    for multiply in [MulPrecision::Fast, MulPrecision::Exact] {
        let kernel = EscapeKernel::new(
            params,
            KernelOptions {
                multiply,
                ..Default::default()
            },
        );
        group.bench_function(multiply.label(), |b| {
            b.iter(|| render(&kernel, res, &cancel));
        });
    }
    group.finish();
}

fn bench_double_double(c: &mut Criterion) {
    let res = Resolution::new(256, 256).unwrap();
    let kernel = EscapeKernel::new(
        ViewportParams::<f64>::from_view(-0.75, 0.1, 1e-9, res, 1000.0).unwrap(),
        KernelOptions::default(),
    );
    let cancel = RenderCancel::new();

    c.bench_function("deep_zoom_256x256_1000iter/double_double", |b| {
        b.iter(|| render(&kernel, res, &cancel));
    });
}

fn bench_colorize(c: &mut Criterion) {
    let res = Resolution::new(640, 480).unwrap();
    let kernel = EscapeKernel::new(ViewportParams::<f32>::standard(res), KernelOptions::default());
    let result = render(&kernel, res, &RenderCancel::new());
    let policy = ColorPolicy::default();

    c.bench_function("colorize_640x480", |b| {
        b.iter(|| policy.colorize(&result.iterations));
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_multiply_precision,
    bench_double_double,
    bench_colorize
);
criterion_main!(benches);
