//! HTML pages: upload form and banner pages.

use axum::{extract::Query, response::Html};
use serde::Deserialize;

/// Query string of the index page, set by the redirect after a print.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub success: Option<String>,
    pub conversation_text: Option<String>,
    pub error: Option<String>,
}

/// GET / - Upload form.
pub async fn index(Query(query): Query<IndexQuery>) -> Html<String> {
    Html(render_index(&query))
}

/// GET /banner - Banner form.
pub async fn banner_form() -> Html<String> {
    Html(page(
        "Banner",
        r#"<h1>Banner</h1>
        <p class="subtitle">Render a line of text as large as the paper allows</p>

        <form method="POST" action="/banner">
            <div class="form-group">
                <label for="text">Text *</label>
                <input type="text" id="text" name="text" required placeholder="HAPPY BIRTHDAY">
                <p class="hint">Long text wraps onto several lines.</p>
            </div>

            <button type="submit">Preview Banner</button>
        </form>
        <p class="nav"><a href="/">Back to prompts</a></p>"#,
    ))
}

pub fn render_index(query: &IndexQuery) -> String {
    let mut notice = String::new();

    if query.success.as_deref() == Some("true") {
        notice.push_str(r#"<div class="success"><h2>Printed</h2>"#);
        if let Some(text) = query.conversation_text.as_deref().filter(|t| !t.is_empty()) {
            notice.push_str(&format!("<pre>{}</pre>", escape_html(text)));
        }
        notice.push_str("</div>");
    }
    if let Some(error) = query.error.as_deref().filter(|e| !e.is_empty()) {
        notice.push_str(&format!(
            r#"<div class="error"><h2>Print failed</h2><p>{}</p></div>"#,
            escape_html(error)
        ));
    }

    page(
        "Prompt Slip",
        &format!(
            r#"<h1>Prompt Slip</h1>
        <p class="subtitle">Print a photo with conversation prompts underneath</p>
        {notice}
        <form method="POST" action="/print" enctype="multipart/form-data">
            <div class="form-group">
                <label for="file">Image</label>
                <input type="file" id="file" name="file" accept="image/jpeg,image/png">
                <p class="hint">Optional. JPEG or PNG.</p>
            </div>

            <div class="form-group">
                <label for="raw_text">Text</label>
                <textarea id="raw_text" name="raw_text" placeholder="Leave empty to generate conversation topics"></textarea>
                <p class="hint">Printed as entered. Leave empty to generate topics.</p>
            </div>

            <div class="form-group">
                <label for="user_prompt">Topic hint</label>
                <input type="text" id="user_prompt" name="user_prompt" placeholder="make them about travel">
            </div>

            <div class="form-group">
                <label for="system_prompt">Prompt override</label>
                <textarea id="system_prompt" name="system_prompt" class="short" placeholder="Replaces the built-in prompt"></textarea>
            </div>

            <button type="submit">Print</button>
        </form>
        <p class="nav"><a href="/banner">Make a banner</a></p>"#
        ),
    )
}

pub fn render_banner_preview(token: &str, text: &str, printed: bool) -> String {
    let notice = if printed {
        r#"<div class="success"><h2>Printed</h2></div>"#
    } else {
        ""
    };

    page(
        "Banner Preview",
        &format!(
            r#"<h1>Banner Preview</h1>
        <p class="subtitle">{text}</p>
        {notice}
        <div class="preview"><img src="/banner/{token}/image.png" alt="Banner preview"></div>
        <form method="POST" action="/banner/{token}/print">
            <button type="submit">Print Banner</button>
        </form>
        <p class="nav"><a href="/banner">New banner</a></p>"#,
            text = escape_html(text),
        ),
    )
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {CSS_STYLES}
</head>
<body>
    <div class="container">
        {body}
    </div>
</body>
</html>"#
    )
}

/// CSS styles for the HTML pages.
const CSS_STYLES: &str = r#"<style>
    * {
        margin: 0;
        padding: 0;
        box-sizing: border-box;
    }

    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        background: #f4f1ea;
        min-height: 100vh;
        display: flex;
        align-items: center;
        justify-content: center;
        padding: 20px;
    }

    .container {
        background: white;
        border-radius: 12px;
        box-shadow: 0 10px 30px rgba(0, 0, 0, 0.15);
        max-width: 600px;
        width: 100%;
        padding: 40px;
    }

    h1 {
        color: #2d3748;
        font-size: 32px;
        margin-bottom: 8px;
    }

    h2 {
        font-size: 20px;
        margin-bottom: 8px;
    }

    .subtitle {
        color: #718096;
        margin-bottom: 24px;
    }

    .form-group {
        margin-bottom: 20px;
    }

    label {
        display: block;
        color: #4a5568;
        font-weight: 600;
        margin-bottom: 8px;
        font-size: 14px;
        text-transform: uppercase;
        letter-spacing: 0.5px;
    }

    input[type="text"],
    textarea {
        width: 100%;
        padding: 12px 16px;
        border: 2px solid #e2e8f0;
        border-radius: 8px;
        font-size: 16px;
        font-family: inherit;
    }

    input[type="text"]:focus,
    textarea:focus {
        outline: none;
        border-color: #2d3748;
    }

    textarea {
        min-height: 160px;
        resize: vertical;
        font-family: 'SF Mono', Monaco, Consolas, 'Courier New', monospace;
    }

    textarea.short {
        min-height: 80px;
    }

    .hint {
        color: #a0aec0;
        font-size: 13px;
        margin-top: 6px;
    }

    button {
        background: #2d3748;
        color: white;
        border: none;
        padding: 14px 32px;
        font-size: 16px;
        font-weight: 600;
        border-radius: 8px;
        cursor: pointer;
        width: 100%;
    }

    button:hover {
        background: #1a202c;
    }

    .success,
    .error {
        border-radius: 8px;
        padding: 16px;
        margin-bottom: 24px;
    }

    .success {
        background: #f0fff4;
        color: #276749;
    }

    .error {
        background: #fff5f5;
        color: #c53030;
        word-break: break-word;
    }

    pre {
        white-space: pre-wrap;
        font-size: 13px;
        color: #2d3748;
    }

    .preview {
        margin-bottom: 24px;
        border: 1px dashed #cbd5e0;
    }

    .preview img {
        width: 100%;
        image-rendering: pixelated;
        display: block;
    }

    .nav {
        margin-top: 20px;
        text-align: center;
    }

    @media (max-width: 640px) {
        .container {
            padding: 24px;
        }

        h1 {
            font-size: 24px;
        }
    }
</style>"#;
