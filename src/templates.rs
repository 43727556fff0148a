use actix_web::{http::StatusCode, HttpResponse};
use askama::Template;

pub fn render<T: Template>(template: T) -> HttpResponse {
    render_with_status(StatusCode::OK, template)
}

/// Renders an HTML page; render failures are logged and answered with 500.
pub fn render_with_status<T: Template>(status: StatusCode, template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Template render error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
