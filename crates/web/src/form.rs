//! Handlers for the submission form.

use std::sync::Arc;

use {
    axum::{
        Form,
        extract::State,
        http::StatusCode,
        response::{Html, IntoResponse},
    },
    clipcast_pipeline::{Job, Outcome, Pipeline},
    serde::Deserialize,
    tracing::info,
};

use crate::templates::{FormPage, render_form};

/// Fields posted by the form. Missing fields read as empty and are
/// rejected by the pipeline with a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub youtube_url: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub caption: String,
}

pub async fn index_handler() -> Html<String> {
    Html(render_form(&FormPage::default()))
}

pub async fn submit_handler(
    State(pipeline): State<Arc<Pipeline>>,
    Form(form): Form<SendForm>,
) -> impl IntoResponse {
    info!(url = %form.youtube_url.trim(), "form submitted");

    let caption = Some(form.caption.clone()).filter(|c| !c.trim().is_empty());
    let outcome = pipeline
        .run(Job::new(&form.youtube_url, &form.phone_number, caption))
        .await;

    let status = match &outcome {
        Outcome::Delivered { .. } => StatusCode::OK,
        Outcome::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Outcome::FetchFailed(_) | Outcome::DeliveryFailed { .. } => StatusCode::BAD_GATEWAY,
    };
    let message = outcome.message();

    // A delivered job clears the form; anything else keeps the input for a retry.
    let page = if outcome.is_success() {
        FormPage {
            message: &message,
            success: true,
            ..Default::default()
        }
    } else {
        FormPage {
            message: &message,
            success: false,
            youtube_url: &form.youtube_url,
            phone_number: &form.phone_number,
            caption: &form.caption,
        }
    };
    (status, Html(render_form(&page)))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
