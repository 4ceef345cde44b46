use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use rust_fcnet::{
    Topology, init_nn_weights, init_params, l_model_backward, l_model_forward, one_vs_all_gradients,
};

fn deep_forward_bench(c: &mut Criterion) {
    let params = init_params(&[128, 256, 256, 1], 0).unwrap();
    let x = Array2::from_elem((128, 64), 0.1);

    c.bench_function("deep_forward_128_256_256_1_m64", |b| {
        b.iter(|| {
            let (al, caches) = l_model_forward(black_box(x.view()), &params).unwrap();
            black_box((al, caches.len()));
        })
    });
}

fn deep_backward_bench(c: &mut Criterion) {
    let params = init_params(&[128, 256, 256, 1], 0).unwrap();
    let x = Array2::from_elem((128, 64), 0.1);
    let y = Array2::from_shape_fn((1, 64), |(_, j)| (j % 2) as f64);

    c.bench_function("deep_forward_backward_128_256_256_1_m64", |b| {
        b.iter(|| {
            let (al, caches) = l_model_forward(black_box(x.view()), &params).unwrap();
            let grads = l_model_backward(&al, y.view(), caches).unwrap();
            black_box(grads);
        })
    });
}

fn one_vs_all_gradient_bench(c: &mut Criterion) {
    let topology = Topology::new(64, 32, 10, 1).unwrap();
    let theta = init_nn_weights(&topology, &mut StdRng::seed_from_u64(0)).unwrap();
    let x = Array2::from_elem((100, 64), 0.1);
    let labels = Array1::from_iter((0..100).map(|i| i % 10));

    c.bench_function("one_vs_all_gradients_64_32_10_m100", |b| {
        b.iter(|| {
            let grads =
                one_vs_all_gradients(black_box(x.view()), labels.view(), &theta, 1.0).unwrap();
            black_box(grads);
        })
    });
}

criterion_group!(
    benches,
    deep_forward_bench,
    deep_backward_bench,
    one_vs_all_gradient_bench
);
criterion_main!(benches);
