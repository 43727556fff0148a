use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::MarketError,
    estimate::EstimateQuery,
    state::{AppState, ServerEvent},
};

#[derive(Deserialize)]
struct DescriptionForm {
    description: String,
}

#[derive(Deserialize)]
struct ProviderQuery {
    name: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/providers").route(web::get().to(list_providers)))
        .service(web::resource("/api/providers/{id}").route(web::get().to(show_provider)))
        .service(web::resource("/api/providers/{id}/select").route(web::post().to(select_provider)))
        .service(web::resource("/api/request/begin").route(web::post().to(begin_request)))
        .service(web::resource("/api/request/description").route(web::post().to(set_description)))
        .service(web::resource("/api/request/send").route(web::post().to(send_request)))
        .service(web::resource("/api/estimate").route(web::post().to(estimate)));
}

/// Providers visible from the client's location under the current filter.
/// `?name=` looks a listing up by display name instead.
async fn list_providers(
    state: web::Data<AppState>,
    query: web::Query<ProviderQuery>,
) -> Result<HttpResponse, MarketError> {
    let market = state.market.read().await;
    if let Some(name) = query.name.as_deref() {
        let provider = market
            .provider_by_name(name)
            .ok_or_else(|| MarketError::not_found("provider", name))?;
        return Ok(HttpResponse::Ok().json(vec![provider]));
    }
    Ok(HttpResponse::Ok().json(market.visible_providers()))
}

async fn show_provider(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let market = state.market.read().await;
    Ok(HttpResponse::Ok().json(market.provider(&path)?))
}

async fn select_provider(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.select_provider(&path)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn begin_request(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.begin_request()?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn set_description(
    state: web::Data<AppState>,
    form: web::Json<DescriptionForm>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.set_request_description(&form.description)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn send_request(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    let (order, chat) = {
        let mut market = state.market.write().await;
        market.send_request()?
    };
    log::info!("Order {} sent to provider {}", order.id, order.provider_id);
    state.publish(ServerEvent::from_order("order_created", &order));
    Ok(HttpResponse::Created().json(json!({ "order": order, "chat": chat })))
}

async fn estimate(
    state: web::Data<AppState>,
    query: web::Json<EstimateQuery>,
) -> Result<HttpResponse, MarketError> {
    let query = query.into_inner();
    if query.service_name.trim().is_empty() {
        return Err(MarketError::InvalidInput("service_name is required".to_string()));
    }
    let result = state.estimator.estimate(&query).await;
    Ok(HttpResponse::Ok().json(result))
}
