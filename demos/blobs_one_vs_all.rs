use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::StandardNormal;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rust_fcnet::metrics::accuracy;
use rust_fcnet::{Classifier, ClassifierBuilder, FitConfig, Topology, feature_normalize};

fn main() -> rust_fcnet::Result<()> {
    // Four Gaussian blobs in 2D.
    let centers = [[0.0, 0.0], [5.0, 0.0], [0.0, 5.0], [5.0, 5.0]];
    let per_class = 50;
    let m = centers.len() * per_class;

    let mut rng = StdRng::seed_from_u64(42);
    let noise = Array2::<f64>::random_using((m, 2), StandardNormal, &mut rng);
    let mut x = Array2::zeros((m, 2));
    let mut labels = Array1::zeros(m);
    for i in 0..m {
        let c = i % centers.len();
        x[[i, 0]] = centers[c][0] + noise[[i, 0]];
        x[[i, 1]] = centers[c][1] + noise[[i, 1]];
        labels[i] = c;
    }
    let (x, mu, sigma) = feature_normalize(x.view())?;
    println!("mu={mu} sigma={sigma}");

    let topology = Topology::new(2, 10, centers.len(), 1)?;
    let mut net = ClassifierBuilder::one_vs_all(topology)?
        .lambda(0.1)?
        .build_with_rng(&mut rng)?;

    let report = net.fit(
        x.view(),
        labels.view(),
        &FitConfig {
            iterations: 2_000,
            learning_rate: 1.0,
            log_every: 200,
        },
    )?;

    let predicted = net.predict(x.view())?;
    println!(
        "final_cost={} train_accuracy={}",
        report.final_cost,
        accuracy(predicted.view(), labels.view())?
    );

    Ok(())
}
