//! RPC Method Handlers
//!
//! Thin mapping between wire types and the ingestion use cases. Storage
//! failures never surface as JSON-RPC errors: they come back as well-formed
//! responses (`accepted = false`, `not found`).

use crate::types::{GetStatusRequest, GetStatusResponse, IngestEventRequest, IngestEventResponse};
use ingestion_core::application::IngestionService;
use ingestion_core::domain::IncomingEvent;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<IngestionService>,
}

impl RpcHandler {
    pub fn new(service: Arc<IngestionService>) -> Self {
        Self { service }
    }

    /// events.ingest.v1
    pub async fn ingest_event(
        &self,
        params: IngestEventRequest,
    ) -> Result<IngestEventResponse, ErrorObjectOwned> {
        let ack = self
            .service
            .ingest(IncomingEvent::new(
                params.event_id,
                params.payload,
                params.timestamp,
            ))
            .await;

        Ok(IngestEventResponse {
            accepted: ack.accepted,
            message: ack.message,
            job_id: ack.job_id.unwrap_or_default(),
        })
    }

    /// jobs.status.v1
    pub async fn get_status(
        &self,
        params: GetStatusRequest,
    ) -> Result<GetStatusResponse, ErrorObjectOwned> {
        let status = self.service.status(&params.job_id).await;

        Ok(GetStatusResponse {
            status: status.to_string(),
        })
    }
}
