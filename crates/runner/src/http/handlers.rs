use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use argus_core::{PipelineState, TickIndex, Timestamp};
use argus_forecast::ActiveModelSummary;
use argus_retrain::RetrainAdmission;

use super::ApiError;
use crate::pipeline::{Pipeline, TickReport};

/// Body of `POST /tick`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResponse {
    pub idx: TickIndex,
    pub timestamp: Option<Timestamp>,
    pub drifted: bool,
    /// One-based ordinals of the channels that drifted
    pub drift_channels: Vec<usize>,
    /// `accepted`, `already_in_progress`, `dropped` or `already_marked`, when drift
    /// requested a retrain
    pub retrain: Option<&'static str>,
    pub forecast_submitted: bool,
    pub anomaly_submitted: bool,
}

impl From<TickReport> for TickResponse {
    fn from(report: TickReport) -> Self {
        Self {
            idx: report.idx,
            timestamp: report.timestamp,
            drifted: report.drift.drifted,
            drift_channels: report.drift.channels.iter().map(|c| c.ordinal()).collect(),
            retrain: report.retrain.map(|admission| match admission {
                RetrainAdmission::Accepted(_) => "accepted",
                RetrainAdmission::AlreadyInProgress => "already_in_progress",
                RetrainAdmission::Dropped { .. } => "dropped",
                RetrainAdmission::AlreadyMarked { .. } => "already_marked",
            }),
            forecast_submitted: report.forecast.is_some(),
            anomaly_submitted: report.anomaly.is_some(),
        }
    }
}

/// GET /fulldata
pub async fn full_data(State(pipeline): State<Arc<Pipeline>>) -> Json<PipelineState> {
    Json(pipeline.full_state())
}

/// GET /data
pub async fn fresh_data(State(pipeline): State<Arc<Pipeline>>) -> Json<Option<PipelineState>> {
    Json(pipeline.poll_fresh())
}

/// POST /tick
pub async fn tick(State(pipeline): State<Arc<Pipeline>>) -> Result<Json<TickResponse>, ApiError> {
    let report = tokio::task::spawn_blocking(move || pipeline.tick())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;
    Ok(Json(report.into()))
}

/// GET /model
pub async fn model(State(pipeline): State<Arc<Pipeline>>) -> Json<ActiveModelSummary> {
    Json(pipeline.active_model())
}
