use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::{
    estimate::PriceEstimator,
    market::Marketplace,
    models::{ChatMessage, PublicRequest, ServiceOrder},
    tracking::TrackingSnapshot,
};

pub const EVENT_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub market: Arc<RwLock<Marketplace>>,
    pub events: broadcast::Sender<ServerEvent>,
    pub estimator: PriceEstimator,
}

impl AppState {
    pub fn new(market: Marketplace, estimator: PriceEstimator) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            market: Arc::new(RwLock::new(market)),
            events,
            estimator,
        }
    }

    pub fn publish(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ServerEvent {
    pub kind: String,
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub client_id: Option<String>,
    pub request_id: Option<String>,
    pub chat_id: Option<String>,
    pub text: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub progress: Option<f64>,
    pub arrived: Option<bool>,
}

impl ServerEvent {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    pub fn from_order(kind: &str, order: &ServiceOrder) -> Self {
        Self {
            kind: kind.to_string(),
            order_id: Some(order.id.clone()),
            status: Some(order.status.as_str().to_string()),
            provider_id: Some(order.provider_id.clone()),
            provider_name: Some(order.provider_name.clone()),
            client_id: Some(order.client_id.clone()),
            latitude: Some(order.client_coordinates.lat),
            longitude: Some(order.client_coordinates.lng),
            ..Self::default()
        }
    }

    pub fn from_request(kind: &str, request: &PublicRequest) -> Self {
        Self {
            kind: kind.to_string(),
            request_id: Some(request.id.clone()),
            client_id: Some(request.client_id.clone()),
            latitude: Some(request.coordinates.lat),
            longitude: Some(request.coordinates.lng),
            ..Self::default()
        }
    }

    pub fn chat_message(chat_id: &str, order_id: &str, message: &ChatMessage) -> Self {
        Self {
            kind: "chat_message".to_string(),
            chat_id: Some(chat_id.to_string()),
            order_id: Some(order_id.to_string()),
            text: Some(message.text.clone()),
            ..Self::default()
        }
    }

    pub fn tracking(snapshot: &TrackingSnapshot) -> Self {
        Self {
            kind: "tracking_position".to_string(),
            order_id: Some(snapshot.order_id.clone()),
            status: Some(snapshot.status.as_str().to_string()),
            provider_id: Some(snapshot.provider_id.clone()),
            provider_name: Some(snapshot.provider_name.clone()),
            latitude: Some(snapshot.position.lat),
            longitude: Some(snapshot.position.lng),
            progress: Some(snapshot.progress),
            arrived: Some(snapshot.arrived),
            ..Self::default()
        }
    }
}
