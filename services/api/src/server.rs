use crate::cli::ServeArgs;
use crate::infra::{seed_admin, AppState, InMemoryApplicantRepository, InMemoryBlobStore};
use crate::routes::with_portal_routes;
use admissions_portal::admissions::{AdminConsole, AdmissionService, PortalState, ProfileService};
use admissions_portal::config::AppConfig;
use admissions_portal::error::AppError;
use admissions_portal::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicantRepository::default());
    let blobs = Arc::new(InMemoryBlobStore::default());

    if let Some(email) = args.admin_email.take() {
        seed_admin(repository.as_ref(), &email)?;
    }

    let portal_state = PortalState {
        admissions: Arc::new(AdmissionService::new(
            repository.clone(),
            blobs,
            &config.uploads,
        )),
        console: Arc::new(AdminConsole::new(repository.clone())),
        profile: Arc::new(ProfileService::new(repository.clone())),
        repository,
    };

    let app = with_portal_routes(portal_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admissions portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
