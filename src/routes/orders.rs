use actix_web::{web, HttpResponse};

use crate::{
    error::MarketError,
    models::ServiceOrder,
    state::{AppState, ServerEvent},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/orders").route(web::get().to(list_orders)))
        .service(web::resource("/api/orders/{id}").route(web::get().to(show_order)))
        .service(web::resource("/api/orders/{id}/select").route(web::post().to(select_order)))
        .service(web::resource("/api/orders/{id}/accept").route(web::post().to(accept_order)))
        .service(web::resource("/api/orders/{id}/reject").route(web::post().to(reject_order)))
        .service(web::resource("/api/orders/{id}/start").route(web::post().to(start_order)))
        .service(web::resource("/api/orders/{id}/complete").route(web::post().to(complete_order)))
        .service(web::resource("/api/orders/{id}/track").route(web::post().to(track_order)))
        .service(web::resource("/api/tracking").route(web::get().to(tracking)))
        .service(web::resource("/api/tracking/cancel").route(web::post().to(cancel_tracking)))
        .service(web::resource("/api/tracking/minimize").route(web::post().to(minimize)))
        .service(web::resource("/api/tracking/maximize").route(web::post().to(maximize)));
}

async fn list_orders(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    HttpResponse::Ok().json(market.my_orders())
}

async fn show_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let market = state.market.read().await;
    Ok(HttpResponse::Ok().json(market.order(&path)?))
}

async fn select_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.select_order(&path)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

fn order_changed(state: &AppState, kind: &str, order: &ServiceOrder) -> HttpResponse {
    log::info!("Order {} is now {}", order.id, order.status);
    state.publish(ServerEvent::from_order(kind, order));
    HttpResponse::Ok().json(order)
}

async fn accept_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let result = state.market.write().await.accept_order(&path);
    let order = result.inspect_err(|err| {
        if matches!(err, MarketError::ActiveJobInProgress) {
            log::warn!("Refused to accept order {}: active job in progress", path.as_str());
        }
    })?;
    Ok(order_changed(&state, "order_accepted", &order))
}

async fn reject_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let order = state.market.write().await.reject_order(&path)?;
    Ok(order_changed(&state, "order_rejected", &order))
}

async fn start_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let order = state.market.write().await.start_order(&path)?;
    Ok(order_changed(&state, "order_started", &order))
}

async fn complete_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let order = state.market.write().await.complete_order(&path)?;
    Ok(order_changed(&state, "order_completed", &order))
}

async fn track_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let snapshot = state.market.write().await.view_tracking(&path)?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn tracking(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    match market.tracking_snapshot() {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::NoContent().finish(),
    }
}

async fn cancel_tracking(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    let order = state.market.write().await.cancel_tracking()?;
    Ok(order_changed(&state, "order_cancelled", &order))
}

async fn minimize(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    set_maximized(&state, false).await
}

async fn maximize(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    set_maximized(&state, true).await
}

async fn set_maximized(state: &AppState, maximized: bool) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.set_tracking_maximized(maximized)?;
    Ok(HttpResponse::Ok().json(market.tracking_snapshot()))
}
