use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rust_fcnet::{
    Topology, init_nn_weights, numerical_grad, one_vs_all_cost, one_vs_all_grad,
    relative_difference, unravel_params,
};

fn main() -> rust_fcnet::Result<()> {
    let topology = Topology::new(3, 5, 3, 2)?;
    let lambda = 3.0;
    let m = 5;

    let mut rng = StdRng::seed_from_u64(0);
    let x = Array2::random_using((m, topology.input_size), Uniform::new(-1.0, 1.0), &mut rng);
    let labels = Array1::from_iter((0..m).map(|i| i % topology.num_labels));
    let theta = init_nn_weights(&topology, &mut rng)?.flatten();

    let analytic = one_vs_all_grad(theta.view(), x.view(), labels.view(), lambda, &topology)?;
    let numeric = numerical_grad(
        |t| {
            let theta = unravel_params(t, &topology)?;
            one_vs_all_cost(x.view(), labels.view(), &theta, lambda)
        },
        theta.view(),
        1e-4,
    )?;

    for (a, n) in analytic.iter().zip(&numeric).take(10) {
        println!("{a:>12.8} {n:>12.8}");
    }
    let diff = relative_difference(analytic.view(), numeric.view())?;
    println!(
        "{} parameters, relative difference {diff:e} (should be below 1e-7)",
        theta.len()
    );

    Ok(())
}
