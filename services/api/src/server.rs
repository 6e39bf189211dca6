use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_board::clock::{Clock, SystemClock};
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::outcome::Outcome;
use job_board::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

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

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = Arc::new(Services::in_memory(&config.policy, clock));

    let sweeper = config
        .sweep
        .interval()
        .map(|every| spawn_sweeper(services.clone(), every));

    let app = router(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sweep_interval_secs = config.sweep.interval_secs,
        "job board api ready"
    );

    let served = axum::serve(listener, app).await;
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    served?;
    Ok(())
}

/// Archives expired vacancies and drops stale listings on a fixed interval.
fn spawn_sweeper(services: Arc<Services>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match services.lifecycle.sweep_expired() {
                Outcome::Success(report) => {
                    info!(summary = %report.summary(), "scheduled expiry sweep completed")
                }
                Outcome::Failure(failure) => {
                    error!(error = %failure, "scheduled expiry sweep had failures")
                }
            }
            let purged = services.listings.purge_expired();
            if purged > 0 {
                info!(purged, "purged expired listing cache entries");
            }
        }
    })
}
