use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::MarketError,
    market::ProfileUpdate,
    models::{category_catalog, Coordinates, Role},
    state::{AppState, ServerEvent},
};

#[derive(Deserialize)]
struct RoleForm {
    role: Role,
}

#[derive(Deserialize)]
struct FilterForm {
    category_id: String,
}

#[derive(Deserialize)]
struct AddressForm {
    name: String,
    #[serde(default)]
    address: String,
    coordinates: Option<Coordinates>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/categories").route(web::get().to(categories)))
        .service(web::resource("/api/session").route(web::get().to(session)))
        .service(web::resource("/api/session/role").route(web::post().to(set_role)))
        .service(web::resource("/api/session/filter").route(web::post().to(set_filter)))
        .service(web::resource("/api/session/location").route(web::post().to(set_location)))
        .service(web::resource("/api/session/map-center").route(web::post().to(set_map_center)))
        .service(web::resource("/api/selection/clear").route(web::post().to(clear_selection)))
        .service(web::resource("/api/markers").route(web::get().to(markers)))
        .service(
            web::resource("/api/addresses")
                .route(web::get().to(list_addresses))
                .route(web::post().to(add_address)),
        )
        .service(web::resource("/api/addresses/{id}").route(web::put().to(edit_address)))
        .service(web::resource("/api/addresses/{id}/select").route(web::post().to(select_address)))
        .service(
            web::resource("/api/profile")
                .route(web::get().to(profile))
                .route(web::put().to(update_profile)),
        );
}

async fn categories() -> HttpResponse {
    HttpResponse::Ok().json(category_catalog())
}

async fn session(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    HttpResponse::Ok().json(market.session_view())
}

async fn set_role(state: web::Data<AppState>, form: web::Json<RoleForm>) -> HttpResponse {
    let mut market = state.market.write().await;
    market.set_role(form.role);
    log::info!("Switched role to {}", form.role.as_str());
    HttpResponse::Ok().json(market.session_view())
}

async fn set_filter(
    state: web::Data<AppState>,
    form: web::Json<FilterForm>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.set_filter(&form.category_id)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn set_location(
    state: web::Data<AppState>,
    at: web::Json<Coordinates>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.set_client_location(at.into_inner())?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn set_map_center(
    state: web::Data<AppState>,
    at: web::Json<Coordinates>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.set_map_center(at.into_inner())?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn clear_selection(state: web::Data<AppState>) -> HttpResponse {
    let mut market = state.market.write().await;
    market.clear_selection();
    HttpResponse::Ok().json(market.session_view())
}

async fn markers(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    HttpResponse::Ok().json(market.markers())
}

async fn list_addresses(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    HttpResponse::Ok().json(json!({
        "addresses": market.addresses(),
        "current_address_id": market.current_address_id(),
        "current_address": market.session().current_address,
    }))
}

async fn add_address(
    state: web::Data<AppState>,
    form: web::Json<AddressForm>,
) -> Result<HttpResponse, MarketError> {
    let form = form.into_inner();
    let mut market = state.market.write().await;
    let saved = market.add_address(&form.name, &form.address, form.coordinates)?;
    Ok(HttpResponse::Created().json(saved))
}

async fn edit_address(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<AddressForm>,
) -> Result<HttpResponse, MarketError> {
    let form = form.into_inner();
    let mut market = state.market.write().await;
    let saved = market.edit_address(&path, &form.name, &form.address, form.coordinates)?;
    Ok(HttpResponse::Ok().json(saved))
}

async fn select_address(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let mut market = state.market.write().await;
    market.select_address(&path)?;
    Ok(HttpResponse::Ok().json(market.session_view()))
}

async fn profile(state: web::Data<AppState>) -> Result<HttpResponse, MarketError> {
    let market = state.market.read().await;
    Ok(HttpResponse::Ok().json(market.my_provider()?))
}

async fn update_profile(
    state: web::Data<AppState>,
    form: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, MarketError> {
    let provider = {
        let mut market = state.market.write().await;
        market.update_profile(form.into_inner())?
    };
    log::info!("Updated listing {}", provider.id);
    let mut event = ServerEvent::new("profile_updated");
    event.provider_id = Some(provider.id.clone());
    event.provider_name = Some(provider.name.clone());
    state.publish(event);
    Ok(HttpResponse::Ok().json(provider))
}
