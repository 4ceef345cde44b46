use ndarray::{arr1, arr2};
use rust_fcnet::{Classifier, ClassifierBuilder, FitConfig};

fn main() -> rust_fcnet::Result<()> {
    // Classic XOR dataset, one example per row.
    let x = arr2(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
    let labels = arr1(&[0, 1, 1, 0]);

    // 2 -> 8 -> 4 -> 1 network.
    // ReLU hidden layers, sigmoid output.
    let mut net = ClassifierBuilder::deep(&[2, 8, 4, 1])?.build_with_seed(0)?;

    let report = net.fit(
        x.view(),
        labels.view(),
        &FitConfig {
            iterations: 5_000,
            learning_rate: 0.5,
            log_every: 500,
        },
    )?;
    println!(
        "first_cost={} final_cost={}",
        report.costs[0], report.final_cost
    );

    let proba = net.predict_proba(x.view())?;
    let predicted = net.predict(x.view())?;
    for ((row, p), label) in x.rows().into_iter().zip(proba.column(0)).zip(&predicted) {
        println!("x={row} p={p:.4} label={label}");
    }

    Ok(())
}
