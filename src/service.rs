use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::dispatch::{DispatchResult, QueryDispatcher};
use crate::error::{GeoMeshError, Result};
use crate::facility::FacilityIndex;
use crate::map::MapView;
use crate::models::{Facility, Query};
use crate::transport::{OpenAiTransport, Transport};

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query.";

/// Everything shown to the user for one submission.
#[derive(Debug, Serialize, Clone)]
pub struct QueryReport {
    pub query_id: Uuid,
    pub question: String,
    pub facility: Facility,
    pub position: usize,
    pub distance_km: f64,
    pub response: DispatchResult,
}

/// Facility index plus dispatcher, built once at startup.
pub struct GeoMeshService {
    index: FacilityIndex,
    dispatcher: QueryDispatcher,
}

impl GeoMeshService {
    pub fn new(cfg: &Config, index: FacilityIndex) -> Result<Self> {
        let transport = Arc::new(OpenAiTransport::new(
            cfg.openai.api_key.clone(),
            &cfg.openai.base_url,
        )?);
        let endpoint = transport.endpoint().to_string();
        let service = Self::with_transport(
            index,
            transport as Arc<dyn Transport>,
            cfg.openai.model.clone(),
        );
        tracing::info!(
            "Dispatching to {} with model {}",
            endpoint,
            service.dispatcher.model()
        );
        Ok(service)
    }

    pub fn with_transport(index: FacilityIndex, tx: Arc<dyn Transport>, model: String) -> Self {
        Self {
            index,
            dispatcher: QueryDispatcher::new(tx, model),
        }
    }

    pub fn index(&self) -> &FacilityIndex {
        &self.index
    }

    /// Resolve the nearest facility, then ask about it.
    ///
    /// Errors are per-query (empty question, non-finite coordinate); a failed
    /// dispatch is reported inside the returned [`QueryReport`].
    pub async fn answer(&self, query: &Query) -> Result<QueryReport> {
        if query.text.trim().is_empty() {
            return Err(GeoMeshError::Validation(EMPTY_QUERY_MESSAGE.to_string()));
        }

        let query_id = Uuid::new_v4();
        let hit = self.index.nearest(query.latitude, query.longitude)?;
        let distance_km = hit.distance_km(query.latitude, query.longitude);
        tracing::info!(
            %query_id,
            facility = %hit.facility.name,
            distance_km,
            "Query routed to nearest facility"
        );

        let response = self.dispatcher.dispatch(&query.text, &hit.facility.name).await;
        tracing::info!(%query_id, success = response.is_success(), "Query dispatched");

        Ok(QueryReport {
            query_id,
            question: query.text.clone(),
            facility: hit.facility.clone(),
            position: hit.position,
            distance_km,
            response,
        })
    }

    pub fn map_view(&self, highlight: Option<usize>) -> MapView {
        MapView::world(self.index.facilities(), highlight)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::geo::DistanceMetric;
    use crate::models::{ChatMessage, ChatRequest, ChatResponse, Choice};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the system prompt back, or fails every call.
    pub(crate) struct EchoTransport {
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn chat(&self, req: &ChatRequest) -> std::result::Result<ChatResponse, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DispatchError::Service {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(ChatResponse {
                choices: vec![Choice {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: req.messages[0].content.clone(),
                    },
                }],
            })
        }
    }

    pub(crate) fn test_service(fail: bool) -> (GeoMeshService, Arc<EchoTransport>) {
        let index = FacilityIndex::new(
            vec![Facility::new("A", 0.0, 0.0), Facility::new("B", 10.0, 10.0)],
            DistanceMetric::Planar,
        )
        .expect("index should build");
        let tx = Arc::new(EchoTransport {
            fail,
            calls: AtomicUsize::new(0),
        });
        let service = GeoMeshService::with_transport(index, tx.clone(), "test-model".to_string());
        (service, tx)
    }

    #[tokio::test]
    async fn test_answer_routes_to_nearest_then_dispatches() {
        let (service, tx) = test_service(false);

        let report = service.answer(&Query::new("Any news?", 9.0, 9.0)).await.unwrap();
        assert_eq!(report.facility.name, "B");
        assert_eq!(report.position, 1);
        assert!(report.distance_km > 0.0);
        assert_eq!(
            report.response.text(),
            "You are an AI expert in geospatial networks assisting schools in B."
        );
        assert_eq!(tx.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_answer_tie_goes_to_first_loaded() {
        let (service, _) = test_service(false);
        let report = service.answer(&Query::new("q", 5.0, 5.0)).await.unwrap();
        assert_eq!(report.facility.name, "A");
    }

    #[tokio::test]
    async fn test_failed_dispatch_is_reported_not_raised() {
        let (service, _) = test_service(true);

        let report = service.answer(&Query::new("q", 1.0, 1.0)).await.unwrap();
        assert_eq!(report.facility.name, "A");
        assert!(!report.response.is_success());
        assert!(report.response.text().starts_with("AI Processing Failed:"));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_without_dispatch() {
        let (service, tx) = test_service(false);

        let err = service.answer(&Query::new("   \n", 1.0, 1.0)).await.unwrap_err();
        assert!(matches!(err, GeoMeshError::Validation(ref m) if m == EMPTY_QUERY_MESSAGE));
        assert_eq!(tx.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_finite_coordinate_is_rejected_without_dispatch() {
        let (service, tx) = test_service(false);

        let err = service.answer(&Query::new("q", f64::NAN, 1.0)).await.unwrap_err();
        assert!(matches!(err, GeoMeshError::InvalidCoordinate { .. }));
        assert_eq!(tx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_requires_credential() {
        let mut cfg = Config::default();
        cfg.openai.api_key = String::new();
        let index = FacilityIndex::new(vec![Facility::new("A", 0.0, 0.0)], DistanceMetric::Planar).unwrap();

        let err = GeoMeshService::new(&cfg, index).err().expect("missing key should fail");
        assert!(matches!(err, GeoMeshError::MissingCredential(_)));
    }

    #[test]
    fn test_new_uses_configured_model() {
        let mut cfg = Config::default();
        cfg.openai.api_key = "sk-test".to_string();
        cfg.openai.model = "gpt-4o-mini".to_string();
        let index = FacilityIndex::new(vec![Facility::new("A", 0.0, 0.0)], DistanceMetric::Planar).unwrap();

        let service = GeoMeshService::new(&cfg, index).unwrap();
        assert_eq!(service.dispatcher.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_map_view_highlights_resolved_facility() {
        let (service, _) = test_service(false);
        let view = service.map_view(Some(1));
        assert_eq!(view.markers.len(), 2);
        assert!(view.markers[1].highlighted);
    }
}
