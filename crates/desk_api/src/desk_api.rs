use crate::http::{run_http_server, DeskApiServices, HttpServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DeskApi {
    services: DeskApiServices,
    config: HttpServerConfig,
}

impl DeskApi {
    pub fn new(services: DeskApiServices, config: HttpServerConfig) -> Self {
        debug!("Initializing desk API module");
        Self { services, config }
    }

    /// Run the HTTP server until `ctx` is cancelled
    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        run_http_server(self.config, self.services, ctx).await
    }
}
