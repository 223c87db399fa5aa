//! Upload-and-print handler.

use axum::{
    extract::{Multipart, State},
    response::Redirect,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    job::{self, JobOptions, PrintJob},
    render::{Bitmap, normalize},
    sanitize::sanitize,
    sink,
    topics::FALLBACK_TOPICS,
};

use super::super::{error::AppError, state::AppState};

/// Uploaded file as received.
struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// Fields of the print form.
#[derive(Default)]
struct PrintForm {
    file: Option<Upload>,
    raw_text: Option<String>,
    user_prompt: Option<String>,
    system_prompt: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<PrintForm, AppError> {
    let mut form = PrintForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    form.file = Some(Upload {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            "raw_text" | "user_prompt" | "system_prompt" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                let slot = match name.as_str() {
                    "raw_text" => &mut form.raw_text,
                    "user_prompt" => &mut form.user_prompt,
                    _ => &mut form.system_prompt,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /print - Print an optional image with text under it.
///
/// The text is `raw_text` when given, otherwise generated conversation
/// topics. Redirects back to `/` with the printed text on success.
pub async fn print(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = read_form(multipart).await?;

    let image = match form.file {
        Some(upload) => {
            normalize::check_content_type(upload.content_type.as_deref())?;
            let options = state.config.normalize;
            let bitmap = tokio::task::spawn_blocking(move || {
                normalize::prepare_upload(&upload.bytes, upload.content_type.as_deref(), &options)
            })
            .await??;
            Some(bitmap)
        }
        None => None,
    };

    let text = match form.raw_text.filter(|t| !t.trim().is_empty()) {
        Some(raw) => raw,
        None => match state
            .topics
            .generate_topics(form.user_prompt.as_deref(), form.system_prompt.as_deref())
            .await
        {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "Using fallback topics");
                FALLBACK_TOPICS.to_string()
            }
        },
    };

    let printed = sanitize(&text);
    run_job(&state, PrintJob::new(image, text)).await?;

    let location = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("success", "true")
        .append_pair("conversation_text", &printed)
        .finish();
    Ok(Redirect::to(&format!("/?{}", location)))
}

/// Open the configured printer and run `job` on the blocking pool.
pub async fn run_job(state: &AppState, job: PrintJob) -> Result<(), AppError> {
    let sink_config = state.config.sink.clone();
    let printer = state.config.printer;
    let options = JobOptions {
        width: state.config.normalize.width,
        copies: state.config.copies,
    };

    info!(
        sink = %sink_config.describe(),
        image_rows = ?job.image.as_ref().map(Bitmap::height),
        "Printing job"
    );

    tokio::task::spawn_blocking(move || -> crate::error::Result<()> {
        let mut printer_sink = sink::open_sink(&sink_config, printer)?;
        job::execute(&mut *printer_sink, &job, &options)?;
        sink::persist_capture(&*printer_sink, &sink_config)?;
        Ok(())
    })
    .await??;

    Ok(())
}
