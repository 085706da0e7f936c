//! Worker liveness endpoint.
//!
//! Served on a listener of its own, independent of the poll loop, so the
//! monitor's probes answer even while a batch is being computed. The
//! answer is unconditionally SERVING: a worker that cannot answer is
//! exactly the unhealthy signal the probe's transport failure conveys.

use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use helix_transport::grpc::generated::helix_cache_v1::{
    health_check_response::ServingStatus,
    health_server::{Health, HealthServer},
    HealthCheckRequest, HealthCheckResponse,
};

/// Liveness answer for the monitor's probes.
#[derive(Debug, Default, Clone)]
pub struct WorkerHealthService;

#[tonic::async_trait]
impl Health for WorkerHealthService {
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        debug!("Liveness probe (service: {:?})", request.into_inner().service);
        let mut resp = HealthCheckResponse::default();
        resp.set_status(ServingStatus::Serving);
        Ok(Response::new(resp))
    }
}

/// Serve the liveness endpoint on `addr` until the task is aborted.
pub async fn serve_health(addr: SocketAddr) -> Result<()> {
    info!("Health listener on {}", addr);
    Server::builder()
        .add_service(HealthServer::new(WorkerHealthService))
        .serve(addr)
        .await
        .map_err(|e| anyhow!("Health listener failed: {}", e))
}

/// Bind `addr` and serve in a spawned task, reporting the bound address.
/// Binding port 0 picks an ephemeral port.
pub async fn spawn_health_listener(addr: SocketAddr) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(HealthServer::new(WorkerHealthService))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await;
    });
    info!("Health listener on {}", bound);
    Ok((bound, handle))
}
