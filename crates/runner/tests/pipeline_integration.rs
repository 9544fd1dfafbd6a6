//! Pipeline Integration Test
//!
//! Drives a full pipeline over an in-memory source with:
//! - Baseline model trained at startup
//! - Forecast and anomaly jobs on the fast pool
//! - Drift-triggered retraining on the slow pool
//! - Tick driver and shutdown

use argus_core::{ChannelSpec, RetrainOutcome};
use argus_detect::DriftAlgorithm;
use argus_retrain::RetrainAdmission;
use argus_ports::CandidateConfig;
use argus_runner::{ArgusConfig, DriverStop, Pipeline, TickDriver, VecSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

const PRELOAD: usize = 30;

fn channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::new("PM10").with_unit("µg/m3"),
        ChannelSpec::new("PM25").with_unit("µg/m3"),
        ChannelSpec::new("NO2").with_unit("µg/m3"),
    ]
}

/// Noisy sensor rows; from `shift_at` on every channel jumps by `shift`
fn rows(n: usize, shift_at: usize, shift: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let level = if i >= shift_at { shift } else { 0.0 };
            vec![
                20.0 + level + rng.gen_range(-0.5..0.5),
                12.0 + level + rng.gen_range(-0.5..0.5),
                30.0 + level + rng.gen_range(-0.5..0.5),
            ]
        })
        .collect()
}

fn config(artifact_dir: &std::path::Path) -> ArgusConfig {
    let mut config = ArgusConfig::default();
    config.tick_interval_secs = 1;
    config.history_preload = PRELOAD;
    config.baseline_rows = 60;
    config.forecast.window = 8;
    config.anomaly.window = 8;
    config.model.lags = 2;
    config.model.baseline_epochs = 5;
    config.drift.algorithm = DriftAlgorithm::PageHinkley;
    config.drift.grace_period = 10;
    config.retrain.data_gathering_period = 40;
    config.retrain.past_window = 8;
    config.retrain.artifact_dir = artifact_dir.to_path_buf();
    config.retrain.candidates = vec![
        CandidateConfig::new(5, 0.01),
        CandidateConfig::new(10, 0.005),
    ];
    config
}

fn pipeline(config: ArgusConfig, rows: Vec<Vec<f64>>) -> Arc<Pipeline> {
    let _ = env_logger::builder().is_test(true).try_init();
    let source = VecSource::new(channels(), rows);
    Arc::new(Pipeline::new(config, Arc::new(source), Handle::current()).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_startup_preloads_history() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 1));

    let state = pipeline.full_state();
    assert_eq!(state.ticks, PRELOAD);
    assert_eq!(state.series.len(), 3);
    assert_eq!(state.series[0].channel, "PM10");

    // Preloaded rows never get a forecast of their own
    assert!(state.series.iter().all(|s| s.predicted.iter().all(Option::is_none)));

    let model = pipeline.active_model();
    assert_eq!(model.version, 1);
    assert!(model.artifact.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_length_invariant_after_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 2));

    for _ in 0..20 {
        pipeline.tick().unwrap();
    }
    pipeline.settle().await;

    let state = pipeline.full_state();
    let n = PRELOAD + 20;
    assert_eq!(state.ticks, n);
    assert_eq!(state.timestamps.len(), n);
    for series in &state.series {
        assert_eq!(series.real.len(), n);
        assert_eq!(series.predicted.len(), n + 1);
        assert_eq!(series.anomaly.len(), n + 1);
        assert_eq!(series.retrain.len(), n + 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forecast_lands_in_next_slot() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 3));

    let report = pipeline.tick().unwrap();
    assert_eq!(report.idx, PRELOAD);
    assert!(report.forecast.is_some());
    assert!(report.anomaly.is_some());
    pipeline.settle().await;

    let state = pipeline.full_state();
    for series in &state.series {
        assert!(series.predicted[report.idx].is_none());
        let predicted = series.predicted[report.idx + 1].expect("forecast for idx + 1");
        assert!(predicted.is_finite());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_poll_fresh_reports_each_change_once() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 4));

    pipeline.tick().unwrap();
    pipeline.settle().await;

    let fresh = pipeline.poll_fresh().expect("state changed");
    assert_eq!(fresh.ticks, PRELOAD + 1);
    assert!(pipeline.poll_fresh().is_none());

    // full_state ignores freshness
    assert_eq!(pipeline.full_state(), fresh);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_of_data_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(PRELOAD + 2, 1000, 0.0, 5));

    pipeline.tick().unwrap();
    pipeline.tick().unwrap();
    let err = pipeline.tick().unwrap_err();
    assert!(err.is_end_of_data());

    pipeline.settle().await;
    assert_eq!(pipeline.ticks(), PRELOAD + 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_level_shift_triggers_retrain() {
    let dir = tempfile::tempdir().unwrap();
    let shift_at = 70;
    let pipeline = pipeline(config(dir.path()), rows(120, shift_at, 40.0, 6));

    let mut accepted = Vec::new();
    for _ in PRELOAD..120 {
        let report = pipeline.tick().unwrap();
        if let Some(RetrainAdmission::Accepted(_)) = report.retrain {
            assert!(report.drift.drifted);
            assert!(report.idx >= shift_at, "no drift before the shift");
            accepted.push(report.idx);
        }
    }
    pipeline.settle().await;

    assert!(!accepted.is_empty(), "level shift should trigger a retrain");
    assert!(!pipeline.is_retraining());

    let state = pipeline.full_state();
    for &idx in &accepted {
        let markers: Vec<_> = state.series.iter().map(|s| s.retrain[idx]).collect();
        let first = markers[0].expect("marker at the trigger tick");
        assert!(markers.iter().all(|m| *m == Some(first)));
        if first.outcome == RetrainOutcome::Accepted {
            assert!(first.model_version >= 2);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manual_retrain_marks_latest_tick() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 7));

    let admission = pipeline.request_retrain();
    assert!(matches!(admission, RetrainAdmission::Accepted(_)));

    pipeline.settle().await;
    assert!(!pipeline.is_retraining());

    let state = pipeline.full_state();
    let marker = state.series[0].retrain[PRELOAD - 1].expect("retrain marker");
    assert!(matches!(
        marker.outcome,
        RetrainOutcome::Accepted | RetrainOutcome::Rejected
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manual_retrain_twice_on_one_tick() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 10));

    assert!(matches!(
        pipeline.request_retrain(),
        RetrainAdmission::Accepted(_)
    ));
    pipeline.settle().await;
    let marker = pipeline.full_state().series[0].retrain[PRELOAD - 1];
    assert!(marker.is_some());

    assert_eq!(
        pipeline.request_retrain(),
        RetrainAdmission::AlreadyMarked {
            trigger_idx: PRELOAD - 1
        }
    );
    pipeline.settle().await;
    assert_eq!(pipeline.full_state().series[0].retrain[PRELOAD - 1], marker);

    // A new tick opens a new slot
    pipeline.tick().unwrap();
    assert!(matches!(
        pipeline.request_retrain(),
        RetrainAdmission::Accepted(_)
    ));
    pipeline.settle().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_driver_stops_at_end_of_data() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(PRELOAD + 5, 1000, 0.0, 8));

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let stop = TickDriver::new(pipeline.clone(), Duration::from_millis(5))
        .run(shutdown_rx)
        .await
        .unwrap();

    assert_eq!(stop, DriverStop::EndOfData { ticks: 5 });
    pipeline.shutdown().await;
    assert_eq!(pipeline.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_driver_honours_tick_budget_and_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(config(dir.path()), rows(100, 1000, 0.0, 9));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stop = TickDriver::new(pipeline.clone(), Duration::from_millis(5))
        .with_max_ticks(Some(3))
        .run(shutdown_rx.clone())
        .await
        .unwrap();
    assert_eq!(stop, DriverStop::MaxTicks { ticks: 3 });
    assert_eq!(pipeline.ticks(), PRELOAD + 3);

    shutdown_tx.send(true).unwrap();
    let stop = TickDriver::new(pipeline.clone(), Duration::from_millis(5))
        .run(shutdown_rx)
        .await
        .unwrap();
    assert_eq!(stop, DriverStop::Shutdown { ticks: 0 });
    pipeline.settle().await;
}
