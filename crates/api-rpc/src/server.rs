//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP on a TCP port.

use crate::handler::RpcHandler;
use crate::types::{GetStatusRequest, IngestEventRequest, METHOD_GET_STATUS, METHOD_INGEST_EVENT};
use ingestion_core::application::IngestionService;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "0.0.0.0";
const DEFAULT_RPC_PORT: u16 = 50051;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, service: Arc<IngestionService>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service)),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_INGEST_EVENT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: IngestEventRequest = params.parse()?;
                    handler.ingest_event(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_GET_STATUS, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: GetStatusRequest = params.parse()?;
                    handler.get_status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Bind and start serving
    ///
    /// Returns the handle (for shutdown) and the bound address, which
    /// differs from the configured one when port 0 is requested.
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.module()?;

        info!(addr = %local_addr, "JSON-RPC server listening");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}
