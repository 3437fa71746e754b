//! End-to-end integration tests over synthetic data.

use fconn::{
    analyze, order_by_network, ConfoundMatrix, ConnectivityPipeline, LabelAssignment,
    SignalMatrix,
};
use nalgebra::DMatrix;

/// Synthetic inputs: 120 timepoints, 12 vertices in 4 regions of 3.
///
/// Regions 1 and 2 share one oscillator, regions 3 and 4 share its
/// negation, so full correlation has clear block structure.
fn synthetic_inputs() -> (SignalMatrix, ConfoundMatrix, Vec<f64>, LabelAssignment) {
    let t = 120;
    let signal = DMatrix::from_fn(t, 12, |row, col| {
        let x = row as f64;
        let region = col / 3;
        let base = (x * 0.31).sin();
        let carrier = match region {
            0 | 1 => base,
            _ => -base,
        };
        // Per-vertex jitter keeps columns linearly independent.
        let jitter = (x * (0.91 + 0.13 * col as f64)).cos() * 0.4;
        // Shared drift that the confound model should absorb.
        let drift = x / t as f64;
        carrier + jitter + 0.5 * drift
    });
    let signal = SignalMatrix::new(signal).unwrap();

    let confounds = DMatrix::from_fn(t, 2, |row, col| {
        let x = row as f64;
        if col == 0 {
            x / t as f64
        } else {
            (x * 0.17).sin() * 0.2
        }
    });
    let confounds =
        ConfoundMatrix::new(confounds, vec!["drift".into(), "fd".into()]).unwrap();

    // Two motion spikes; everything else is quiet.
    let mut motion = vec![0.1; t];
    motion[30] = 0.9;
    motion[77] = 0.8;

    let labels = LabelAssignment::new(
        (0..12).map(|unit| (unit / 3 + 1) as u32).collect(),
    );

    (signal, confounds, motion, labels)
}

#[test]
fn smoke_test() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = analyze(&signal, &confounds, &motion, &labels).unwrap();

    // Scrub bookkeeping is self-consistent.
    assert_eq!(result.scrub.total, 120);
    assert_eq!(
        result.scrub.retained + result.scrub.removed,
        result.scrub.total
    );
    // Two spikes, each censoring [t-1, t+2]: eight timepoints gone.
    assert_eq!(result.scrub.removed, 8);
    assert_eq!(result.mask.len(), 120);
}

#[test]
fn both_variants_produced_from_raw_signal() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = analyze(&signal, &confounds, &motion, &labels).unwrap();

    let with = &result.with_global_signal;
    let without = &result.without_global_signal;
    assert_eq!(with.residual.timepoints(), 120);
    assert_eq!(without.residual.timepoints(), 120);
    // GSR removes additional variance, so the residuals differ.
    assert_ne!(with.residual.data(), without.residual.data());
    // Both parcel sets cover all four regions.
    assert_eq!(with.parcels.region_ids(), &[1, 2, 3, 4]);
    assert_eq!(without.parcels.region_ids(), &[1, 2, 3, 4]);
    // Scrubbed series dropped exactly the censored rows.
    assert_eq!(
        without.parcels_scrubbed.timepoints(),
        result.scrub.retained
    );
}

#[test]
fn correlation_invariants_hold() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = analyze(&signal, &confounds, &motion, &labels).unwrap();

    for variant in [&result.with_global_signal, &result.without_global_signal] {
        for estimate in [&variant.full_correlation, &variant.partial_correlation] {
            let m = estimate.matrix();
            for i in 0..m.nrows() {
                assert_eq!(m[(i, i)], 0.0);
                for j in 0..m.ncols() {
                    assert!((m[(i, j)] - m[(j, i)]).abs() < 1e-12);
                }
            }
        }
        // Both estimators agree on the exclusion set.
        assert_eq!(
            variant.full_correlation.region_ids(),
            variant.partial_correlation.region_ids()
        );
    }
}

#[test]
fn graph_stage_respects_density_request() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = ConnectivityPipeline::new()
        .edge_density(0.5)
        .run(&signal, &confounds, &motion, &labels)
        .unwrap();

    for variant in [&result.with_global_signal, &result.without_global_signal] {
        assert!(variant.thresholded.realized_density() <= 0.5 + 1e-12);
        let report = &variant.giant_component;
        assert!(report.retained <= report.total);
        assert_eq!(report.total, variant.full_correlation.regions());
    }
}

#[test]
fn seeded_pipeline_is_reproducible() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let run = || {
        ConnectivityPipeline::new()
            .seed(1234)
            .run(&signal, &confounds, &motion, &labels)
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(
        first.without_global_signal.communities_binary.labels(),
        second.without_global_signal.communities_binary.labels()
    );
    assert_eq!(
        first.without_global_signal.communities_signed.labels(),
        second.without_global_signal.communities_signed.labels()
    );
}

#[test]
fn builder_api() {
    let pipeline = ConnectivityPipeline::new()
        .motion_threshold(0.3)
        .scrub_window(4)
        .min_retained(20)
        .edge_density(0.25)
        .glasso_penalty(0.1)
        .seed(9);

    let config = pipeline.config();
    assert!((config.motion_threshold - 0.3).abs() < 1e-12);
    assert_eq!(config.scrub_window, 4);
    assert_eq!(config.min_retained, 20);
    assert!((config.edge_density - 0.25).abs() < 1e-12);
    assert!((config.glasso.penalty - 0.1).abs() < 1e-12);
    assert_eq!(config.modularity.seed, Some(9));
}

#[test]
fn result_serialization() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = analyze(&signal, &confounds, &motion, &labels).unwrap();

    let json = fconn::output::json::to_json(&result).expect("should serialize");
    assert!(json.contains("communities_binary"));
    assert!(json.contains("realized_density"));
    assert!(json.contains("elapsed_ms"));

    let report = fconn::output::terminal::format_result(&result);
    assert!(report.contains("fconn"));
    assert!(report.contains("Giant component"));
}

#[test]
fn excessive_motion_fails_loudly() {
    let (signal, confounds, _, labels) = synthetic_inputs();
    let motion = vec![2.0; 120];
    let err = analyze(&signal, &confounds, &motion, &labels).unwrap_err();
    assert!(matches!(
        err,
        fconn::PipelineError::InsufficientData { retained: 0, .. }
    ));
}

#[test]
fn misaligned_motion_rejected() {
    let (signal, confounds, _, labels) = synthetic_inputs();
    let motion = vec![0.0; 60];
    let err = analyze(&signal, &confounds, &motion, &labels).unwrap_err();
    assert!(matches!(err, fconn::PipelineError::ShapeMismatch { .. }));
}

#[test]
fn network_ordering_integrates_with_correlation_output() {
    let (signal, confounds, motion, labels) = synthetic_inputs();
    let result = analyze(&signal, &confounds, &motion, &labels).unwrap();
    let estimate = &result.without_global_signal.full_correlation;

    // External network table keyed by kept region ids.
    let networks: Vec<String> = estimate
        .region_ids()
        .iter()
        .map(|&id| {
            if id <= 2 {
                "anterior".to_string()
            } else {
                "posterior".to_string()
            }
        })
        .collect();
    let ordering = order_by_network(&networks);
    assert_eq!(ordering.len(), estimate.regions());

    let permuted = ordering.permute(estimate.matrix()).unwrap();
    let recovered = ordering.inverse_permute(&permuted).unwrap();
    assert_eq!(&recovered, estimate.matrix());
}
