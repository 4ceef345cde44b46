use ndarray::{Array1, Array2, arr1};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rust_fcnet::{
    Classifier, ClassifierBuilder, Error, FitConfig, OneVsAllClassifier, Theta, Topology,
    feature_normalize, gradient_descent, init_nn_weights, numerical_grad, one_vs_all_cost,
    one_vs_all_grad, regularization_term, relative_difference, unravel_params,
};

fn random_problem(
    topology: &Topology,
    m: usize,
    seed: u64,
) -> (Array2<f64>, Array1<usize>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Array2::random_using((m, topology.input_size), Uniform::new(-1.0, 1.0), &mut rng);
    let labels = Array1::from_iter((0..m).map(|i| i % topology.num_labels));
    let theta = init_nn_weights(topology, &mut rng).unwrap().flatten();
    (x, labels, theta)
}

#[test]
fn unravel_inverts_flatten() {
    for topology in [
        Topology::new(3, 5, 4, 1).unwrap(),
        Topology::new(2, 3, 2, 3).unwrap(),
        Topology::new(4, 0, 3, 0).unwrap(),
    ] {
        let theta = init_nn_weights(&topology, &mut StdRng::seed_from_u64(21)).unwrap();
        let flat = theta.flatten();
        assert_eq!(flat.len(), topology.param_count());

        let back = unravel_params(flat.view(), &topology).unwrap();
        assert_eq!(back, theta);
        let shapes: Vec<_> = back.layers().iter().map(Array2::dim).collect();
        assert_eq!(shapes, topology.layer_shapes());
    }
}

#[test]
fn unravel_rejects_wrong_length() {
    let topology = Topology::new(3, 5, 4, 1).unwrap();
    let flat = Array1::zeros(topology.param_count() - 1);
    assert!(matches!(
        unravel_params(flat.view(), &topology),
        Err(Error::InvalidShape(_))
    ));
}

#[test]
fn backprop_matches_numerical_gradient() {
    for (topology, lambda) in [
        (Topology::new(3, 5, 3, 1).unwrap(), 0.0),
        (Topology::new(3, 5, 3, 1).unwrap(), 1.0),
        (Topology::new(4, 3, 2, 2).unwrap(), 0.5),
        (Topology::new(2, 0, 3, 0).unwrap(), 3.0),
    ] {
        let (x, labels, theta) = random_problem(&topology, 6, 8);

        let analytic = one_vs_all_grad(theta.view(), x.view(), labels.view(), lambda, &topology)
            .unwrap();
        let numeric = numerical_grad(
            |t| {
                let theta = unravel_params(t, &topology)?;
                one_vs_all_cost(x.view(), labels.view(), &theta, lambda)
            },
            theta.view(),
            1e-5,
        )
        .unwrap();

        let diff = relative_difference(analytic.view(), numeric.view()).unwrap();
        assert!(diff < 1e-7, "{topology:?} lambda {lambda}: relative difference {diff}");
    }
}

#[test]
fn regularization_skips_intercept_weights() {
    let topology = Topology::new(3, 4, 2, 1).unwrap();
    let (x, labels, flat) = random_problem(&topology, 5, 2);
    let theta = unravel_params(flat.view(), &topology).unwrap();

    let mut shifted = theta.clone();
    for idx in 0..shifted.num_layers() {
        shifted.layer_mut(idx).unwrap().column_mut(0).mapv_inplace(|v| v + 5.0);
    }
    assert_eq!(
        regularization_term(&theta, 2.0, 5),
        regularization_term(&shifted, 2.0, 5)
    );

    // Regularizing adds (lambda / m) * Θ[:, 1:] and leaves column 0 alone.
    let plain = one_vs_all_grad(flat.view(), x.view(), labels.view(), 0.0, &topology).unwrap();
    let reg = one_vs_all_grad(flat.view(), x.view(), labels.view(), 2.0, &topology).unwrap();
    let plain = unravel_params(plain.view(), &topology).unwrap();
    let reg = unravel_params(reg.view(), &topology).unwrap();
    for ((p, r), w) in plain.layers().iter().zip(reg.layers()).zip(theta.layers()) {
        assert_eq!(p.column(0), r.column(0));
        let (rows, cols) = p.dim();
        for i in 0..rows {
            for j in 1..cols {
                approx::assert_abs_diff_eq!(
                    r[[i, j]] - p[[i, j]],
                    (2.0 / 5.0) * w[[i, j]],
                    epsilon = 1e-12
                );
            }
        }
    }
}

#[test]
fn cost_rejects_out_of_range_labels() {
    let topology = Topology::new(2, 3, 2, 1).unwrap();
    let (x, _, flat) = random_problem(&topology, 3, 0);
    let theta = unravel_params(flat.view(), &topology).unwrap();
    assert!(matches!(
        one_vs_all_cost(x.view(), arr1(&[0, 1, 2]).view(), &theta, 0.0),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn gradient_descent_reduces_cost() {
    let topology = Topology::new(2, 4, 3, 1).unwrap();
    let (x, labels, theta0) = random_problem(&topology, 9, 5);
    let lambda = 0.1;

    let cost_at = |flat: &Array1<f64>| {
        let theta = unravel_params(flat.view(), &topology).unwrap();
        one_vs_all_cost(x.view(), labels.view(), &theta, lambda).unwrap()
    };

    let theta = gradient_descent(theta0.view(), 0.5, 100, |t| {
        one_vs_all_grad(t, x.view(), labels.view(), lambda, &topology)
    })
    .unwrap();
    assert!(cost_at(&theta) < cost_at(&theta0));
}

#[test]
fn classifier_learns_separated_clusters() {
    let centers = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
    let mut rng = StdRng::seed_from_u64(17);
    let noise = Array2::random_using((30, 2), Uniform::new(-0.5, 0.5), &mut rng);
    let mut x = Array2::zeros((30, 2));
    let mut labels = Array1::zeros(30);
    for i in 0..30 {
        let c = i % 3;
        x[[i, 0]] = centers[c][0] + noise[[i, 0]];
        x[[i, 1]] = centers[c][1] + noise[[i, 1]];
        labels[i] = c;
    }
    let (x, _mu, _sigma) = feature_normalize(x.view()).unwrap();

    let topology = Topology::new(2, 6, 3, 1).unwrap();
    let mut net = ClassifierBuilder::one_vs_all(topology)
        .unwrap()
        .lambda(0.01)
        .unwrap()
        .build_with_seed(3)
        .unwrap();
    let report = net
        .fit(
            x.view(),
            labels.view(),
            &FitConfig {
                iterations: 1500,
                learning_rate: 2.0,
                log_every: 0,
            },
        )
        .unwrap();

    assert!(report.final_cost < report.costs[0]);
    let predicted = net.predict(x.view()).unwrap();
    let acc = rust_fcnet::metrics::accuracy(predicted.view(), labels.view()).unwrap();
    assert!(acc > 0.9, "accuracy {acc}");
}

#[test]
fn classifier_wraps_existing_theta() {
    let theta = Theta::from_layers(vec![Array2::zeros((3, 3))]).unwrap();
    let clf = OneVsAllClassifier::new(theta, 0.0).unwrap();
    let proba = clf.predict_proba(Array2::zeros((2, 2)).view()).unwrap();
    assert!(proba.iter().all(|&p| p == 0.5));
    // Ties go to the first class.
    assert_eq!(clf.predict(Array2::zeros((2, 2)).view()).unwrap(), arr1(&[0, 0]));
}
