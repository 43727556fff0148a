use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    error::MarketError,
    market::PublicRequestDraft,
    models::Role,
    state::{AppState, ServerEvent},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/public-requests")
            .route(web::get().to(list_requests))
            .route(web::post().to(create_request)),
    )
    .service(web::resource("/api/public-requests/begin").route(web::post().to(begin_request)))
    .service(
        web::resource("/api/public-requests/{id}")
            .route(web::get().to(show_request))
            .route(web::delete().to(delete_request)),
    )
    .service(web::resource("/api/public-requests/{id}/select").route(web::post().to(select_request)))
    .service(web::resource("/api/public-requests/{id}/apply").route(web::post().to(apply)))
    .service(
        web::resource("/api/public-requests/{id}/applicants/{provider_id}/accept")
            .route(web::post().to(accept_applicant)),
    );
}

/// Clients get their own posts, providers the open ones in their area.
async fn list_requests(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    let requests = match market.session().role {
        Role::Provider => market.requests_in_service_area(),
        _ => market.my_public_requests(),
    };
    HttpResponse::Ok().json(requests)
}

async fn show_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let market = state.market.read().await;
    Ok(HttpResponse::Ok().json(market.public_request(&path)?))
}

async fn begin_request(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.begin_public_request()?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn create_request(
    state: web::Data<AppState>,
    draft: web::Json<PublicRequestDraft>,
) -> Result<HttpResponse, MarketError> {
    let request = {
        let mut market = state.market.write().await;
        market.create_public_request(draft.into_inner())?
    };
    log::info!("Public request {} posted", request.id);
    state.publish(ServerEvent::from_request("public_request_created", &request));
    Ok(HttpResponse::Created().json(request))
}

async fn delete_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let id = path.into_inner();
    state.market.write().await.delete_public_request(&id)?;
    let mut event = ServerEvent::new("public_request_deleted");
    event.request_id = Some(id);
    state.publish(event);
    Ok(HttpResponse::NoContent().finish())
}

async fn select_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.select_public_request(&path)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn apply(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let request = {
        let mut market = state.market.write().await;
        market.apply_to_request(&path)?
    };
    let mut event = ServerEvent::from_request("public_request_applied", &request);
    if let Some(applicant) = request.applicants.last() {
        event.provider_id = Some(applicant.provider_id.clone());
        event.provider_name = Some(applicant.provider_name.clone());
    }
    state.publish(event);
    Ok(HttpResponse::Ok().json(request))
}

async fn accept_applicant(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, MarketError> {
    let (request_id, provider_id) = path.into_inner();
    let (order, chat) = {
        let mut market = state.market.write().await;
        market.accept_applicant(&request_id, &provider_id)?
    };
    log::info!("Request {request_id} hired provider {provider_id} as {}", order.id);
    let mut event = ServerEvent::from_order("order_created", &order);
    event.request_id = Some(request_id);
    state.publish(event);
    Ok(HttpResponse::Created().json(json!({ "order": order, "chat": chat })))
}
