//! Banner handlers: render, preview and print.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{job::PrintJob, render::banner::render_banner};

use super::super::{
    error::AppError,
    state::{AppState, Banner},
};
use super::{pages, print::run_job};

#[derive(Debug, Deserialize)]
pub struct BannerForm {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub printed: bool,
}

async fn lookup(state: &AppState, token: &str) -> Result<(Uuid, Banner), AppError> {
    let not_found = || AppError::NotFound("Banner not found or expired".to_string());
    let id = Uuid::parse_str(token).map_err(|_| not_found())?;
    let banner = state.banners.write().await.get(&id).ok_or_else(not_found)?;
    Ok((id, banner))
}

/// POST /banner - Render a banner and redirect to its preview.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<BannerForm>,
) -> Result<Redirect, AppError> {
    if form.text.trim().is_empty() {
        return Err(AppError::BadRequest("Banner text is required".to_string()));
    }

    let width = state.config.normalize.width;
    let text = form.text.clone();
    let bitmap = tokio::task::spawn_blocking(move || render_banner(&text, width)).await??;

    let id = state.banners.write().await.insert(Banner {
        text: form.text,
        bitmap: Arc::new(bitmap),
    });
    Ok(Redirect::to(&format!("/banner/{}", id)))
}

/// GET /banner/:token - Preview page.
pub async fn page(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Html<String>, AppError> {
    let (id, banner) = lookup(&state, &token).await?;
    Ok(Html(pages::render_banner_preview(
        &id.to_string(),
        &banner.text,
        query.printed,
    )))
}

/// GET /banner/:token/image.png - PNG of the rendered banner.
pub async fn image(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (_, banner) = lookup(&state, &token).await?;
    let png = tokio::task::spawn_blocking(move || banner.bitmap.to_png()).await??;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        png,
    ))
}

/// POST /banner/:token/print - Print a cached banner.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Redirect, AppError> {
    let (id, banner) = lookup(&state, &token).await?;
    let job = PrintJob::new(Some(banner.bitmap.as_ref().clone()), "");
    run_job(&state, job).await?;
    Ok(Redirect::to(&format!("/banner/{}?printed=true", id)))
}
