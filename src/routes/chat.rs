use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    error::MarketError,
    state::{AppState, ServerEvent},
};

#[derive(Deserialize)]
struct StartChatForm {
    participant: String,
    order_id: String,
}

#[derive(Deserialize)]
struct MessageForm {
    text: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chats").route(web::get().to(list_chats)))
        .service(web::resource("/api/chats/start").route(web::post().to(start_chat)))
        .service(web::resource("/api/chats/{id}").route(web::get().to(open_chat)))
        .service(web::resource("/api/chats/{id}/messages").route(web::post().to(send_message)));
}

async fn list_chats(state: web::Data<AppState>) -> HttpResponse {
    let market = state.market.read().await;
    HttpResponse::Ok().json(market.chat_list())
}

async fn start_chat(
    state: web::Data<AppState>,
    form: web::Json<StartChatForm>,
) -> Result<HttpResponse, MarketError> {
    let form = form.into_inner();
    if form.participant.trim().is_empty() || form.order_id.trim().is_empty() {
        return Err(MarketError::InvalidInput(
            "participant and order_id are required".to_string(),
        ));
    }
    let chat = state
        .market
        .write()
        .await
        .start_chat(form.participant.trim(), form.order_id.trim())?;
    Ok(HttpResponse::Ok().json(chat))
}

/// Opening a conversation marks it read.
async fn open_chat(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketError> {
    let chat = state.market.write().await.open_chat(&path)?;
    Ok(HttpResponse::Ok().json(chat))
}

async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<MessageForm>,
) -> Result<HttpResponse, MarketError> {
    let chat_id = path.into_inner();
    let (message, order_id) = {
        let mut market = state.market.write().await;
        let message = market.send_chat_message(&chat_id, &form.text)?;
        let order_id = market.chat(&chat_id)?.order_id.clone();
        (message, order_id)
    };
    state.publish(ServerEvent::chat_message(&chat_id, &order_id, &message));
    Ok(HttpResponse::Created().json(message))
}
