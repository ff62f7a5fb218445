//! Request orchestration: validate, build features, score, render.
//!
//! Transport agnostic. A caller hands in the raw request body and gets back a
//! status code plus a JSON body; mapping that onto HTTP, a CLI or anything else
//! is the caller's job.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::common::config::AppCfg;
use crate::common::error::{PrepError, PrepResult};
use crate::inference::domain::{InferEngine, OrderContext, PredictionResult};
use crate::inference::service::ModelEngine;
use crate::inference::{features, validate};
use crate::training::service::ModelCell;

/// Message returned for every server-side failure. Causes stay in the logs.
pub const OPAQUE_FAILURE: &str = "model inference failed";

/// Status code and JSON body for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_error(err: &PrepError) -> Self {
        let status = err.code().status();
        let body = match err {
            PrepError::Validation(v) => json!({ "detail": v.errors() }),
            _ => json!({ "detail": OPAQUE_FAILURE }),
        };
        Self { status, body }
    }
}

/// Composition root for the prediction pipeline.
pub struct PredictionService<E = ModelEngine> {
    engine: E,
}

impl PredictionService<ModelEngine> {
    /// Wire the default model-backed engine. Nothing is loaded yet.
    pub fn from_cfg(cfg: &AppCfg) -> Self {
        Self::with_cell(Arc::new(ModelCell::from_cfg(cfg)))
    }

    pub fn with_cell(cell: Arc<ModelCell>) -> Self {
        Self::new(ModelEngine::new(cell))
    }
}

impl<E: InferEngine> PredictionService<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Force model construction. Call at startup; an error here means the
    /// process must not serve traffic.
    pub fn warm_up(&self) -> PrepResult<()> {
        self.engine.ensure_ready()
    }

    /// Liveness only; never touches the model.
    pub fn health(&self) -> ApiResponse {
        ApiResponse::ok(json!({ "status": "healthy" }))
    }

    /// Handle one prediction request body.
    pub fn handle_predict(&self, body: &str) -> ApiResponse {
        let started = Instant::now();
        let outcome = validate::validate_json(body)
            .map_err(PrepError::from)
            .and_then(|ctx| self.predict(&ctx));
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(result) => {
                info!(vendor_id = result.vendor_id, latency_ms, "prediction served");
                debug!(score = result.predicted_prep_time, "prediction score");
                match serde_json::to_value(&result) {
                    Ok(body) => ApiResponse::ok(body),
                    Err(err) => {
                        error!(error = %err, "failed to render prediction");
                        ApiResponse::from_error(&PrepError::from(err))
                    }
                }
            }
            Err(err) if err.is_client_error() => {
                warn!(detail = %err, "request rejected");
                ApiResponse::from_error(&err)
            }
            Err(err) => {
                let code = err.code() as u32;
                error!(error = %err, code, latency_ms, "prediction failed");
                ApiResponse::from_error(&err)
            }
        }
    }

    /// Typed pipeline for an already validated context.
    pub fn predict(&self, ctx: &OrderContext) -> PrepResult<PredictionResult> {
        let vector = features::build(ctx);
        self.engine.ensure_ready()?;
        let score = self.engine.predict(&vector)?;
        Ok(PredictionResult::new(ctx.vendor_id, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::domain::FeatureVector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Scripted {
        calls: AtomicUsize,
        fail: bool,
    }

    impl InferEngine for Scripted {
        fn ensure_ready(&self) -> PrepResult<()> {
            Ok(())
        }

        fn predict(&self, features: &FeatureVector) -> PrepResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PrepError::inference("tree walk exploded at /srv/secret/path"));
            }
            Ok(features.as_slice().iter().sum())
        }
    }

    const VALID: &str = r#"{"vendor_id":12345,"order_hour":19,"day_of_week":4,"item_count":3,"is_peak_hour":true,"historical_delay_avg":5.2}"#;

    #[test]
    fn renders_prediction() {
        let service = PredictionService::new(Scripted::default());
        let resp = service.handle_predict(VALID);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["vendor_id"], 12345);
        assert_eq!(resp.body["predicted_prep_time"], 19.0 + 4.0 + 3.0 + 1.0 + 5.2);
        assert_eq!(resp.body["feature_importance_top"], "historical_delay_avg");
        assert!(resp.body["confidence_interval_95"].is_null());
        assert_eq!(service.engine().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_failure_skips_engine() {
        let service = PredictionService::new(Scripted::default());
        let resp = service.handle_predict(&VALID.replace("\"order_hour\":19", "\"order_hour\":25"));
        assert_eq!(resp.status, 422);
        assert_eq!(resp.body["detail"][0]["field"], "order_hour");
        assert_eq!(service.engine().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inference_failure_is_opaque() {
        let service = PredictionService::new(Scripted {
            fail: true,
            ..Scripted::default()
        });
        let resp = service.handle_predict(VALID);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, json!({ "detail": OPAQUE_FAILURE }));
    }

    #[test]
    fn malformed_json_is_client_error() {
        let service = PredictionService::new(Scripted::default());
        let resp = service.handle_predict("not json");
        assert_eq!(resp.status, 422);
        assert_eq!(resp.body["detail"][0]["field"], "body");
    }

    #[test]
    fn health_is_static() {
        let service = PredictionService::new(Scripted::default());
        let resp = service.health();
        assert!(resp.is_success());
        assert_eq!(resp.body, json!({ "status": "healthy" }));
    }
}
