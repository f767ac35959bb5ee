//! Form page rendering.

use {askama::Template, tracing::warn};

#[derive(Template)]
#[template(path = "index.html", escape = "html")]
struct IndexHtmlTemplate<'a> {
    message: &'a str,
    success: bool,
    youtube_url: &'a str,
    phone_number: &'a str,
    caption: &'a str,
}

/// What the form shows: the previous input and the last run's message.
#[derive(Debug, Default)]
pub(crate) struct FormPage<'a> {
    pub(crate) message: &'a str,
    pub(crate) success: bool,
    pub(crate) youtube_url: &'a str,
    pub(crate) phone_number: &'a str,
    pub(crate) caption: &'a str,
}

pub(crate) fn render_form(page: &FormPage<'_>) -> String {
    let template = IndexHtmlTemplate {
        message: page.message,
        success: page.success,
        youtube_url: page.youtube_url,
        phone_number: page.phone_number,
        caption: page.caption,
    };
    match template.render() {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "failed to render form template");
            String::new()
        },
    }
}
