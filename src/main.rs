use beatinblink_gateway::{
    config::{get_config, init_config},
    middleware::cors::browser_cors,
    routes,
    services::platform_client::PlatformClient,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let platform = PlatformClient::new(
        &config.platform_api_url,
        Duration::from_secs(config.platform_timeout_secs),
    )?;
    let app_state = AppState::new(config, Arc::new(platform));

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;
                match state.sessions.purge_expired() {
                    Ok(expired) => {
                        for id in expired {
                            if let Err(e) = state.attempts.teardown_session(id) {
                                tracing::error!(error = ?e, session_id = %id, "Attempt teardown failed");
                            }
                        }
                    }
                    Err(e) => tracing::error!(error = ?e, "Session sweep failed"),
                }
            }
        });
    }

    let app = routes::router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(browser_cors(config.allowed_origin.as_deref())),
    );

    let listener = TcpListener::bind(&config.server_address).await?;
    info!(
        address = %listener.local_addr()?,
        platform = %config.platform_api_url,
        "BeatInBlink gateway listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
