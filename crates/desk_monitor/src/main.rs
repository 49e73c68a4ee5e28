mod config;

use common::domain::{AlertNotifier, EventRepository, Settings, SettingsRepository};
use common::postgres::{PostgresClient, PostgresEventRepository, PostgresSettingsRepository};
use common::telemetry::{init_telemetry, TelemetryConfig};
use common::webhook::WebhookNotifier;
use crate::config::ServiceConfig;
use desk_api::domain::{
    AlertDispatcher, AlertDispatcherConfig, AnalyticsService, DashboardService, IngestionService,
    SettingsService, SimulatedOutdoorConditions,
};
use desk_api::http::{CorsConfig, DeskApiServices, HttpServerConfig};
use desk_api::DeskApi;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        service_name: "desk-monitor".to_string(),
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        http_port = config.http_port,
        public_dir = %config.public_dir,
        "Starting desk-monitor service"
    );
    debug!("Configuration: {:?}", config);

    let services = match initialize_services(&config).await {
        Ok(services) => services,
        Err(e) => {
            error!("Failed to initialize services: {:#}", e);
            std::process::exit(1);
        }
    };

    let desk_api = DeskApi::new(
        services,
        HttpServerConfig {
            host: config.http_host.clone(),
            port: config.http_port,
            public_dir: PathBuf::from(&config.public_dir),
            cors: CorsConfig::from_comma_separated(&config.cors_allowed_origins),
        },
    );

    let shutdown_token = CancellationToken::new();
    tokio::spawn({
        let token = shutdown_token.clone();
        async move {
            shutdown_signal().await;
            token.cancel();
        }
    });

    if let Err(e) = desk_api.run(shutdown_token).await {
        error!("Desk API exited with error: {:#}", e);
        std::process::exit(1);
    }

    info!("Shutdown complete");
}

async fn initialize_services(config: &ServiceConfig) -> anyhow::Result<DeskApiServices> {
    info!("Initializing PostgreSQL...");
    let postgres_client = PostgresClient::new(&config.database_url, config.postgres_max_pool_size)?;
    postgres_client.ping().await?;
    postgres_client.ensure_schema().await?;

    let event_repository: Arc<dyn EventRepository> =
        Arc::new(PostgresEventRepository::new(postgres_client.clone()));
    let settings_repository: Arc<dyn SettingsRepository> =
        Arc::new(PostgresSettingsRepository::new(postgres_client));

    let settings = Arc::new(
        SettingsService::load(
            settings_repository,
            Settings::with_defaults(config.default_co2_threshold, config.default_break_interval),
        )
        .await?,
    );

    let notifier: Arc<dyn AlertNotifier> =
        Arc::new(WebhookNotifier::new(&config.webhook_url, config.webhook_timeout())?);
    let alerts = Arc::new(AlertDispatcher::new(
        notifier,
        AlertDispatcherConfig {
            co2_cooldown: Duration::from_secs(config.co2_cooldown_secs),
            posture_cooldown: Duration::from_secs(config.posture_cooldown_secs),
            send_timeout: config.webhook_timeout(),
        },
    ));

    Ok(DeskApiServices {
        ingestion: Arc::new(IngestionService::new(event_repository.clone())),
        dashboard: Arc::new(DashboardService::new(
            event_repository.clone(),
            settings.clone(),
            Arc::new(SimulatedOutdoorConditions::new()),
            alerts,
            config.trend_length,
        )),
        analytics: Arc::new(AnalyticsService::new(
            event_repository,
            config.analytics_window(),
        )),
        settings,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
