use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::error::Result;
use crate::network::network::NeuralNet;
use crate::train::progress::{ProgressReport, TrainOutcome};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::check_dataset;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `net` online (one `fit` per sample) for `config.epochs` epochs.
///
/// Sample order is reshuffled every epoch. Samples are counted across the
/// whole run: every `config.report_every` samples the mean loss of that window
/// is logged and sent to `config.progress_tx`, and a NaN window aborts the run
/// as [`TrainOutcome::Diverged`]. A window may straddle an epoch boundary; its
/// report carries the epoch in which it closed. With a `model_path` the
/// network is saved every `config.save_every` samples and at the end of every
/// epoch.
///
/// # Early termination
/// The loop stops before the next sample if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop(
    net: &mut NeuralNet,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<TrainOutcome> {
    check_dataset(inputs, targets)?;

    let n = inputs.len();
    let mut order: Vec<usize> = (0..n).collect();
    let mut last_loss = f64::NAN;
    let mut run_seen = 0usize;
    let mut window_loss = 0.0;
    let mut window_len = 0usize;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        order.shuffle(&mut rand::thread_rng());

        let mut epoch_loss = 0.0;

        for (i, &idx) in order.iter().enumerate() {
            if stop_requested(config) {
                return Ok(TrainOutcome::Stopped { epochs: epoch - 1, loss: last_loss });
            }

            let loss = net.fit(&inputs[idx], &targets[idx])?;
            epoch_loss += loss;
            window_loss += loss;
            window_len += 1;
            let seen = i + 1;
            run_seen += 1;

            // ── Progress ─────────────────────────────────────────────────────
            if config.report_every > 0 && run_seen % config.report_every == 0 {
                let mean = window_loss / window_len as f64;
                if mean.is_nan() {
                    warn!(epoch, samples_seen = seen, "loss diverged, training abandoned");
                    return Ok(TrainOutcome::Diverged { epoch, samples_seen: seen });
                }

                let report = ProgressReport {
                    epoch,
                    total_epochs: config.epochs,
                    samples_seen: seen,
                    total_samples: n,
                    run_samples_seen: run_seen,
                    window_loss: mean,
                    elapsed_ms: t_start.elapsed().as_millis() as u64,
                };
                info!(epoch, samples_seen = seen, window_loss = mean, "training progress");

                if let Some(ref tx) = config.progress_tx {
                    // If the receiver has been dropped, stop training.
                    if tx.send(report).is_err() {
                        return Ok(TrainOutcome::Stopped { epochs: epoch - 1, loss: last_loss });
                    }
                }
                window_loss = 0.0;
                window_len = 0;
            }

            // ── Checkpoint ───────────────────────────────────────────────────
            if config.save_every > 0 && run_seen % config.save_every == 0 {
                checkpoint(net, config)?;
            }
        }

        let mean = epoch_loss / n as f64;
        if mean.is_nan() {
            warn!(epoch, "epoch loss diverged, training abandoned");
            return Ok(TrainOutcome::Diverged { epoch, samples_seen: n });
        }
        last_loss = mean;
        info!(epoch, loss = mean, elapsed_ms = t_start.elapsed().as_millis() as u64, "epoch finished");
        checkpoint(net, config)?;
    }

    Ok(TrainOutcome::Completed { epochs: config.epochs, loss: last_loss })
}

/// Fraction of samples whose largest output sits at the same index as the
/// largest target value.
pub fn evaluate_accuracy(net: &mut NeuralNet, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
    check_dataset(inputs, targets)?;

    let mut correct = 0usize;
    for (input, target) in inputs.iter().zip(targets) {
        let output = net.query(input)?;
        if argmax(&output) == argmax(target) {
            correct += 1;
        }
    }
    Ok(correct as f64 / inputs.len() as f64)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map_or(false, |flag| flag.load(Ordering::Relaxed))
}

fn checkpoint(net: &NeuralNet, config: &TrainConfig) -> Result<()> {
    match config.model_path {
        Some(ref path) => net.save_file(path),
        None => Ok(()),
    }
}

/// Index of the maximum element in a slice; the first one wins ties.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
