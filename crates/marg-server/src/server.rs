use std::future::Future;
use std::sync::Arc;

use marg_core::AnnotationRepository;
use marg_store::VersionedStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Annotation store server.
pub struct MarginaliaServer {
    config: ServerConfig,
    state: AppState,
}

impl MarginaliaServer {
    /// Serve `store` with the branch and committer from `config`.
    pub fn new(config: ServerConfig, store: Arc<dyn VersionedStore>) -> Self {
        let mut repository =
            AnnotationRepository::new(store).with_identity(config.committer.clone());
        if let Some(branch) = &config.branch {
            repository = repository.with_branch(branch.clone());
        }
        Self {
            config,
            state: AppState::new(repository),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn repository(&self) -> &AnnotationRepository {
        &self.state.repository
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests until the process is stopped.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start serving requests until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            branch = %self.state.repository.branch(),
            "marginalia listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
