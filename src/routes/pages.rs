use actix_web::{http::StatusCode, web, HttpResponse, Result};
use askama::Template;

use crate::{
    market::Marketplace,
    models::{
        category_catalog, ChatSession, OrderStatus, Role, ServiceCategory, ServiceOrder,
        CURRENT_ADDRESS_ID,
    },
    state::AppState,
    templates::{render, render_with_status},
};

#[derive(Clone, Debug)]
struct Nav {
    role: String,
    is_provider: bool,
    current_address: String,
}

impl Nav {
    fn from_market(market: &Marketplace) -> Self {
        let session = market.session();
        Self {
            role: session.role.as_str().to_string(),
            is_provider: session.role == Role::Provider,
            current_address: session.current_address.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "map.html")]
struct MapTemplate {
    nav: Nav,
    categories: Vec<ServiceCategory>,
    filter: String,
    center_lat: f64,
    center_lng: f64,
    ai_enabled: bool,
}

#[derive(Clone, Debug)]
struct OrderView {
    id: String,
    counterpart: String,
    description: String,
    status: String,
    status_class: &'static str,
    location: String,
    price_estimate: String,
    created_at: String,
    can_accept: bool,
    can_start: bool,
    can_complete: bool,
    can_track: bool,
    chat_id: String,
}

#[derive(Template)]
#[template(path = "orders.html")]
struct OrdersTemplate {
    nav: Nav,
    orders: Vec<OrderView>,
}

#[derive(Clone, Debug)]
struct ChatSummary {
    id: String,
    participants: String,
    last_message: String,
    last_time: String,
    unread_count: u32,
}

#[derive(Template)]
#[template(path = "chats.html")]
struct ChatsTemplate {
    nav: Nav,
    chats: Vec<ChatSummary>,
}

#[derive(Clone, Debug)]
struct MessageView {
    text: String,
    time: String,
    is_me: bool,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate {
    nav: Nav,
    found: bool,
    chat_id: String,
    participants: String,
    messages: Vec<MessageView>,
}

#[derive(Clone, Debug)]
struct AddressView {
    id: String,
    name: String,
    address: String,
    current: bool,
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    nav: Nav,
    user_name: String,
    has_listing: bool,
    listing_name: String,
    listing_category: String,
    price_base: String,
    description: String,
    status: String,
    range: f64,
    addresses: Vec<AddressView>,
    using_device_location: bool,
}

#[derive(Template)]
#[template(path = "tracking.html")]
struct TrackingTemplate {
    nav: Nav,
    active: bool,
    order_id: String,
    provider_name: String,
    status_label: String,
    remaining: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(map_page)))
        .service(web::resource("/orders").route(web::get().to(orders_page)))
        .service(web::resource("/chats").route(web::get().to(chats_page)))
        .service(web::resource("/chats/{id}").route(web::get().to(chat_page)))
        .service(web::resource("/profile").route(web::get().to(profile_page)))
        .service(web::resource("/tracking").route(web::get().to(tracking_page)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn map_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let market = state.market.read().await;
    let session = market.session();
    Ok(render(MapTemplate {
        nav: Nav::from_market(&market),
        categories: category_catalog(),
        filter: session.filter_category.clone(),
        center_lat: session.map_center.lat,
        center_lng: session.map_center.lng,
        ai_enabled: state.estimator.enabled(),
    }))
}

fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "status-pending",
        OrderStatus::Accepted | OrderStatus::InProgress => "status-active",
        OrderStatus::Completed => "status-done",
        OrderStatus::Cancelled => "status-cancelled",
    }
}

fn to_order_view(market: &Marketplace, order: &ServiceOrder) -> OrderView {
    let is_provider = market.session().role == Role::Provider;
    OrderView {
        id: order.id.clone(),
        counterpart: if is_provider {
            order.client_id.clone()
        } else {
            order.provider_name.clone()
        },
        description: order.description.clone(),
        status: order.status.as_str().to_string(),
        status_class: status_class(order.status),
        location: order.location.clone(),
        price_estimate: order.price_estimate.clone(),
        created_at: order.created_at.format("%d/%m %H:%M").to_string(),
        can_accept: is_provider && order.status == OrderStatus::Pending,
        can_start: is_provider && order.status == OrderStatus::Accepted,
        can_complete: is_provider && order.status == OrderStatus::InProgress,
        can_track: order.status.is_active(),
        chat_id: market
            .chat_for_order(&order.id)
            .map(|chat| chat.id.clone())
            .unwrap_or_default(),
    }
}

async fn orders_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let market = state.market.read().await;
    let orders = market
        .my_orders()
        .into_iter()
        .map(|order| to_order_view(&market, order))
        .collect();
    Ok(render(OrdersTemplate {
        nav: Nav::from_market(&market),
        orders,
    }))
}

fn to_chat_summary(chat: &ChatSession) -> ChatSummary {
    ChatSummary {
        id: chat.id.clone(),
        participants: chat.participants.clone(),
        last_message: chat.last_message.clone(),
        last_time: chat.last_timestamp.format("%H:%M").to_string(),
        unread_count: chat.unread_count,
    }
}

async fn chats_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let market = state.market.read().await;
    let chats = market.chat_list().into_iter().map(to_chat_summary).collect();
    Ok(render(ChatsTemplate {
        nav: Nav::from_market(&market),
        chats,
    }))
}

async fn chat_page(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let chat_id = path.into_inner();
    let mut market = state.market.write().await;
    let nav = Nav::from_market(&market);
    let chat = match market.open_chat(&chat_id) {
        Ok(chat) => chat,
        Err(_) => {
            return Ok(render_with_status(
                StatusCode::NOT_FOUND,
                ChatTemplate {
                    nav,
                    found: false,
                    chat_id,
                    participants: String::new(),
                    messages: Vec::new(),
                },
            ))
        }
    };
    Ok(render(ChatTemplate {
        nav,
        found: true,
        chat_id,
        participants: chat.participants,
        messages: chat
            .messages
            .iter()
            .map(|message| MessageView {
                text: message.text.clone(),
                time: message.timestamp.format("%H:%M").to_string(),
                is_me: message.is_me,
            })
            .collect(),
    }))
}

async fn profile_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let market = state.market.read().await;
    let session = market.session();
    let current_id = market.current_address_id();
    let addresses = market
        .addresses()
        .iter()
        .map(|saved| AddressView {
            id: saved.id.clone(),
            name: saved.name.clone(),
            address: saved.address.clone(),
            current: current_id == Some(saved.id.as_str()),
        })
        .collect();

    let listing = market.my_provider().ok();
    Ok(render(ProfileTemplate {
        nav: Nav::from_market(&market),
        user_name: session.user_name.clone(),
        has_listing: listing.is_some(),
        listing_name: listing.map(|p| p.name.clone()).unwrap_or_default(),
        listing_category: listing.map(|p| p.category_name.clone()).unwrap_or_default(),
        price_base: listing.map(|p| p.price_base.clone()).unwrap_or_default(),
        description: listing
            .and_then(|p| p.description.clone())
            .unwrap_or_default(),
        status: listing
            .map(|p| p.status.as_str().to_string())
            .unwrap_or_default(),
        range: listing.map(|p| p.range).unwrap_or_default(),
        addresses,
        using_device_location: current_id == Some(CURRENT_ADDRESS_ID),
    }))
}

async fn tracking_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let market = state.market.read().await;
    let nav = Nav::from_market(&market);
    let template = match market.tracking_snapshot() {
        Some(snapshot) => TrackingTemplate {
            nav,
            active: true,
            order_id: snapshot.order_id,
            provider_name: snapshot.provider_name,
            status_label: snapshot.status_label.to_string(),
            remaining: format!("{:.0} m", snapshot.remaining_m),
        },
        None => TrackingTemplate {
            nav,
            active: false,
            order_id: String::new(),
            provider_name: String::new(),
            status_label: String::new(),
            remaining: String::new(),
        },
    };
    Ok(render(template))
}
