//! Server runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, database
//! and migrations, outbound adapters (Stripe, SMTP), the REST API and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::ports::{Notifier, PaymentGateway};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::email::{EmailConfig, LogNotifier, SmtpNotifier};
use crate::infrastructure::payments::{StripeConfig, StripeGateway};
use crate::infrastructure::{init_database, run_migrations, DatabaseConfig};
use crate::interfaces::http::modules::metrics::describe_metrics;
use crate::interfaces::http::{create_api_router, AppState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running booking service.
///
/// ```rust,no_run
/// use stayhub::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Address the API is bound to (useful with port 0).
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting StayHub booking service...");

        let prometheus = prometheus_handle();

        let db = init_database(&database_config(&app_cfg)).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }

        let gateway = payment_gateway(&app_cfg)?;
        let notifier = notifier(&app_cfg)?;
        let event_bus = create_event_bus();

        let state = AppState::new(db.clone(), gateway, notifier, event_bus.clone(), &app_cfg);
        let repos = state.repos.clone();
        let router = create_api_router(state, &app_cfg.server, prometheus);

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            event_bus,
            repos,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until the API has stopped (bounded by the drain timeout once
    /// shutdown is triggered), then close the pool.
    pub async fn wait(self) {
        let signal = self.shutdown.signal();
        let drain = self.shutdown.timeout();
        let mut api_task = self.api_task;

        tokio::select! {
            result = &mut api_task => log_api_exit(result),
            _ = async {
                signal.wait().await;
                tokio::time::sleep(drain).await;
            } => {
                warn!(timeout_secs = drain.as_secs(), "In-flight requests did not drain in time");
                api_task.abort();
            }
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
        info!("StayHub shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down StayHub booking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

fn log_api_exit(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => info!("REST API server stopped"),
        Err(e) => error!("REST API server task panicked: {}", e),
    }
}

/// The global recorder can only be installed once per process; restarts
/// within one process reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_metrics();
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Metrics disabled, recorder could not be installed: {}", e);
                None
            }
        })
        .clone()
}

fn database_config(cfg: &AppConfig) -> DatabaseConfig {
    DatabaseConfig {
        url: cfg.database.url.clone(),
        max_connections: cfg.database.max_connections,
        min_connections: cfg.database.min_connections,
        connect_timeout_secs: cfg.database.connect_timeout_secs,
    }
}

fn payment_gateway(cfg: &AppConfig) -> Result<Arc<dyn PaymentGateway>, Box<dyn std::error::Error>> {
    let payments = &cfg.payments;
    if payments.stripe_secret_key.is_empty() {
        warn!("payments.stripe_secret_key is empty; card checkout will be rejected by Stripe");
    }
    if payments.webhook_secret.is_empty() {
        warn!("payments.webhook_secret is empty; the Stripe webhook endpoint is disabled");
    }

    let gateway = StripeGateway::new(StripeConfig {
        secret_key: payments.stripe_secret_key.clone(),
        api_base: payments.api_base.clone(),
        success_url: payments.success_url.clone(),
        cancel_url: payments.cancel_url.clone(),
        request_timeout: Duration::from_secs(payments.request_timeout_secs),
    })?;
    Ok(Arc::new(gateway))
}

fn notifier(cfg: &AppConfig) -> Result<Arc<dyn Notifier>, Box<dyn std::error::Error>> {
    let email = &cfg.email;
    match email.smtp_host.as_deref().map(str::trim) {
        Some(host) if !host.is_empty() => {
            let smtp = SmtpNotifier::new(EmailConfig {
                smtp_host: host.to_string(),
                smtp_port: email.smtp_port,
                from_address: email.from_address.clone(),
                smtp_user: email.smtp_user.clone(),
                smtp_password: email.smtp_password.clone(),
            })?;
            info!(host, port = email.smtp_port, "SMTP notifications enabled");
            Ok(Arc::new(smtp))
        }
        _ => {
            info!("No SMTP host configured, notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Initialize tracing from the config. `RUST_LOG` wins over
/// `logging.level`. Call once at process start.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
