use actix_web::{http::header, web, HttpResponse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppState, ServerEvent};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/events").route(web::get().to(stream_events)))
        .service(web::resource("/orders/{id}/events").route(web::get().to(stream_order_events)));
}

async fn stream_events(state: web::Data<AppState>) -> HttpResponse {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event))),
        Err(_) => None,
    });

    sse_response(stream)
}

/// Status and tracking updates for a single order.
async fn stream_order_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let order_id = path.into_inner();
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = result.ok()?;
        if event.order_id.as_deref() != Some(order_id.as_str()) {
            return None;
        }
        Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event)))
    });

    sse_response(stream)
}

fn sse_response<S>(stream: S) -> HttpResponse
where
    S: tokio_stream::Stream<Item = Result<web::Bytes, actix_web::Error>> + 'static,
{
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

pub fn event_to_bytes(event: &ServerEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: update\ndata: {}\n\n", payload))
}
