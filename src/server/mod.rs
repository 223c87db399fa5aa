//! # HTTP Server
//!
//! Upload form, print endpoint and banner pages.
//!
//! ## Usage
//!
//! ```bash
//! promptslip serve --listen 0.0.0.0:8000 --printer device --device /dev/usb/lp0
//! ```
//!
//! Then open http://localhost:8000 in a browser.
//!
//! ## Routes
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET | `/` | Upload form |
//! | POST | `/print` | Multipart upload: `file`, `raw_text`, `user_prompt`, `system_prompt` |
//! | GET | `/banner` | Banner form |
//! | POST | `/banner` | Render a banner, redirect to its preview |
//! | GET | `/banner/:token` | Banner preview page |
//! | GET | `/banner/:token/image.png` | Banner PNG |
//! | POST | `/banner/:token/print` | Print a banner |

mod error;
mod handlers;
mod state;

pub use error::AppError;
pub use state::{AppState, BANNER_CAPACITY, BANNER_TTL_SECS, Banner, BannerCache, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::PromptslipError;
use crate::topics::TopicSource;
use state::SWEEP_INTERVAL_SECS;

/// Upload size limit for `/print`.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::pages::index))
        .route(
            "/print",
            post(handlers::print::print).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/banner",
            get(handlers::pages::banner_form).post(handlers::banner::create),
        )
        .route("/banner/:token", get(handlers::banner::page))
        .route("/banner/:token/image.png", get(handlers::banner::image))
        .route("/banner/:token/print", post(handlers::banner::print))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use promptslip::server::{serve, ServerConfig};
/// use promptslip::topics::StaticTopicSource;
///
/// # async fn example() -> Result<(), promptslip::error::PromptslipError> {
/// serve(ServerConfig::default(), Arc::new(StaticTopicSource::default())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, topics: Arc<dyn TopicSource>) -> Result<(), PromptslipError> {
    let listen_addr = config.listen_addr.clone();
    let sink = config.sink.describe();
    let app_state = Arc::new(AppState::new(config, topics));

    tokio::spawn(sweep_banners(app_state.clone()));

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| PromptslipError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    info!(addr = %listen_addr, %sink, "promptslip HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| PromptslipError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task dropping expired banners.
async fn sweep_banners(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

    loop {
        interval.tick().await;
        let mut banners = state.banners.write().await;
        let removed = banners.sweep();
        if removed > 0 {
            debug!(removed, remaining = banners.len(), "Swept expired banners");
        }
    }
}
