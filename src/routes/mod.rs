use actix_web::web;

pub mod chat;
pub mod client;
pub mod events;
pub mod orders;
pub mod pages;
pub mod requests;
pub mod session;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(pages::configure)
        .configure(session::configure)
        .configure(client::configure)
        .configure(requests::configure)
        .configure(orders::configure)
        .configure(chat::configure)
        .configure(events::configure);
}
