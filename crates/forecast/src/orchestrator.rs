//! Forecast submission and write-back

use crate::active::ActiveModelCell;
use crate::error::ForecastError;
use argus_core::{ForecastResult, TickIndex};
use argus_executor::{JobId, TaskError, WorkerPool};
use argus_store::SharedStore;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Past points fed to the model
    pub window: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { window: 48 }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastOrchestrator {
    config: ForecastConfig,
    store: SharedStore,
    pool: WorkerPool,
    active: Arc<ActiveModelCell>,
}

impl ForecastOrchestrator {
    pub fn new(
        config: ForecastConfig,
        store: SharedStore,
        pool: WorkerPool,
        active: Arc<ActiveModelCell>,
    ) -> Self {
        Self {
            config,
            store,
            pool,
            active,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast slot `idx + 1` in the background
    ///
    /// Returns `InsufficientHistory` without submitting while the store is
    /// shorter than the window.
    pub fn submit(&self, idx: TickIndex) -> Result<JobId, ForecastError> {
        let window = self.store.lock().window_matrix(self.config.window)?;
        let active = self.active.clone();

        let handle = self.pool.submit(format!("forecast@{idx}"), move || {
            forecast(&active, window, idx).map_err(TaskError::failed)
        });
        let id = handle.id();

        let store = self.store.clone();
        handle.on_complete(move |result| match result {
            Ok(forecast) => match store.lock().record_forecast(&forecast) {
                Ok(()) => log::info!("Predictions updated (slot {})", forecast.target),
                Err(e) => log::error!("Prediction failed: {}", e),
            },
            Err(e) => log::error!("Prediction failed: {}", e),
        });

        Ok(id)
    }
}

/// One prediction with the serving model's pre-fitted scaler
fn forecast(
    active: &ActiveModelCell,
    window: Array2<f64>,
    idx: TickIndex,
) -> Result<ForecastResult, ForecastError> {
    let snapshot = active.current();
    let scaled = snapshot.scaler.transform(window.view())?;
    let prediction = snapshot.model.predict(scaled.view())?;
    let raw = snapshot
        .scaler
        .inverse_transform(prediction.insert_axis(Axis(0)).view())?;

    Ok(ForecastResult::new(idx + 1, raw.row(0).to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::ActiveModel;
    use crate::linear::LinearForecaster;
    use crate::scaler::MinMaxScaler;
    use argus_core::{ChannelId, ChannelSpec, ModelMetrics};
    use argus_ports::{ForecastModel, ModelError, ModelResult, Scaler};
    use argus_store::WindowedStore;
    use ndarray::{Array1, ArrayView2};
    use std::time::Duration;
    use tokio::runtime::Handle;

    #[derive(Debug)]
    struct Failing;

    impl ForecastModel for Failing {
        fn predict(&self, _window: ArrayView2<'_, f64>) -> ModelResult<Array1<f64>> {
            Err(ModelError::Training("weights corrupted".to_string()))
        }
        fn export(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    /// Persistence model whose first prediction waits for a release signal
    #[derive(Debug)]
    struct HoldFirst {
        inner: LinearForecaster,
        calls: std::sync::atomic::AtomicUsize,
        release: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl ForecastModel for HoldFirst {
        fn predict(&self, window: ArrayView2<'_, f64>) -> ModelResult<Array1<f64>> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                let _ = self
                    .release
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(5));
            }
            self.inner.predict(window)
        }
        fn export(&self) -> serde_json::Value {
            self.inner.export()
        }
    }

    fn fitted_scaler() -> Arc<dyn Scaler> {
        let mut scaler = MinMaxScaler::new();
        scaler
            .fit_once(ndarray::array![[0.0, 0.0], [100.0, 50.0]].view())
            .unwrap();
        Arc::new(scaler)
    }

    fn setup(
        points: usize,
        model: Arc<dyn ForecastModel>,
    ) -> (SharedStore, ForecastOrchestrator, WorkerPool) {
        let mut store = WindowedStore::new(vec![ChannelSpec::new("PM10"), ChannelSpec::new("NO2")]);
        for i in 0..points {
            store.advance(&[i as f64, 10.0], None).unwrap();
        }
        store.take_fresh();
        let store = store.into_shared();

        let active = Arc::new(ActiveModelCell::new(ActiveModel::initial(
            model,
            fitted_scaler(),
            ModelMetrics::new(1.0, 1.0, 1.0),
            None,
        )));
        let pool = WorkerPool::new("fast", 3, Handle::current());
        let orchestrator = ForecastOrchestrator::new(
            ForecastConfig::default(),
            store.clone(),
            pool.clone(),
            active,
        );
        (store, orchestrator, pool)
    }

    async fn settle(pool: &WorkerPool) {
        for _ in 0..200 {
            if pool.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("pool did not settle");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_forecast_lands_in_next_slot() {
        let (store, orchestrator, pool) = setup(50, Arc::new(LinearForecaster::persistence(1, 2)));

        orchestrator.submit(49).unwrap();
        settle(&pool).await;

        let store = store.lock();
        assert!(store.is_fresh());
        let pm10 = store.series(ChannelId::new(0)).unwrap();
        let no2 = store.series(ChannelId::new(1)).unwrap();
        assert!((pm10.predicted()[50].unwrap() - 49.0).abs() < 1e-9);
        assert!((no2.predicted()[50].unwrap() - 10.0).abs() < 1e-9);
        assert!(pm10.predicted()[49].is_none());
        assert_eq!(pm10.predicted().len(), 51);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_insufficient_history_submits_nothing() {
        let (store, orchestrator, pool) = setup(47, Arc::new(LinearForecaster::persistence(1, 2)));

        let err = orchestrator.submit(46).unwrap_err();
        assert!(err.is_insufficient_history());
        assert_eq!(pool.in_flight(), 0);
        assert!(!store.lock().is_fresh());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_prediction_leaves_slot_empty() {
        let (store, orchestrator, pool) = setup(48, Arc::new(Failing));

        orchestrator.submit(47).unwrap();
        settle(&pool).await;

        let store = store.lock();
        assert!(!store.is_fresh());
        assert!(store.series(ChannelId::new(0)).unwrap().predicted()[48].is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_late_forecast_lands_in_its_own_slot() {
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let model = Arc::new(HoldFirst {
            inner: LinearForecaster::persistence(1, 2),
            calls: Default::default(),
            release: std::sync::Mutex::new(release_rx),
        });
        let (store, orchestrator, pool) = setup(50, model.clone());

        orchestrator.submit(49).unwrap();
        while model.calls.load(std::sync::atomic::Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // Two more ticks complete while the first forecast is still held
        for idx in 50..52 {
            store.lock().advance(&[idx as f64, 10.0], None).unwrap();
            orchestrator.submit(idx).unwrap();
        }
        for _ in 0..200 {
            if store.lock().series(ChannelId::new(0)).unwrap().predicted()[52].is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(store.lock().series(ChannelId::new(0)).unwrap().predicted()[50].is_none());

        release_tx.send(()).unwrap();
        settle(&pool).await;

        let store = store.lock();
        let pm10 = store.series(ChannelId::new(0)).unwrap();
        assert_eq!(pm10.real().len(), 52);
        assert_eq!(pm10.predicted().len(), 53);
        for (slot, expected) in [(50, 49.0), (51, 50.0), (52, 51.0)] {
            assert!((pm10.predicted()[slot].unwrap() - expected).abs() < 1e-9);
        }
    }
}
