use std::time::Duration;

use serde::Serialize;

use crate::{
    geo,
    models::{Coordinates, OrderStatus, ServiceOrder},
    state::{AppState, ServerEvent},
};

/// Start offset used when the assigned provider has no known position.
const UNKNOWN_PROVIDER_OFFSET: f64 = 0.01;

/// Straight-line route from the provider towards the client, walked in
/// fixed steps by the ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRoute {
    pub from: Coordinates,
    pub to: Coordinates,
    steps: u32,
    step: u32,
}

impl TrackingRoute {
    pub fn new(from: Coordinates, to: Coordinates, steps: u32) -> Self {
        Self {
            from,
            to,
            steps: steps.max(1),
            step: 0,
        }
    }

    pub fn for_order(order: &ServiceOrder, provider_at: Option<Coordinates>, steps: u32) -> Self {
        let to = order.client_coordinates;
        let from = provider_at
            .filter(Coordinates::is_valid)
            .unwrap_or_else(|| {
                Coordinates::new(to.lat + UNKNOWN_PROVIDER_OFFSET, to.lng + UNKNOWN_PROVIDER_OFFSET)
            });
        Self::new(from, to, steps)
    }

    pub fn progress(&self) -> f64 {
        f64::from(self.step) / f64::from(self.steps)
    }

    pub fn position(&self) -> Coordinates {
        if self.arrived() {
            return self.to;
        }
        geo::lerp(self.from, self.to, self.progress())
    }

    pub fn arrived(&self) -> bool {
        self.step >= self.steps
    }

    pub fn remaining_m(&self) -> f64 {
        geo::distance_m(self.position(), self.to)
    }

    /// Moves one step forward. Returns false once the route is finished.
    pub fn advance(&mut self) -> bool {
        if self.arrived() {
            return false;
        }
        self.step += 1;
        true
    }
}

#[derive(Debug, Clone)]
pub struct Tracking {
    pub order_id: String,
    pub maximized: bool,
    pub route: TrackingRoute,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingSnapshot {
    pub order_id: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub provider_id: String,
    pub provider_name: String,
    pub client_coordinates: Coordinates,
    pub position: Coordinates,
    pub progress: f64,
    pub remaining_m: f64,
    pub arrived: bool,
    pub maximized: bool,
}

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Accepted => "Provider on the way",
        _ => "Job in progress",
    }
}

impl TrackingSnapshot {
    pub fn new(tracking: &Tracking, order: &ServiceOrder) -> Self {
        Self {
            order_id: order.id.clone(),
            status: order.status,
            status_label: status_label(order.status),
            provider_id: order.provider_id.clone(),
            provider_name: order.provider_name.clone(),
            client_coordinates: order.client_coordinates,
            position: tracking.route.position(),
            progress: tracking.route.progress(),
            remaining_m: tracking.route.remaining_m(),
            arrived: tracking.route.arrived(),
            maximized: tracking.maximized,
        }
    }
}

/// Background ticker animating the tracked provider marker.
pub async fn run(state: AppState, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let snapshot = {
            let mut market = state.market.write().await;
            market.advance_tracking()
        };
        if let Some(snapshot) = snapshot {
            let _ = state.events.send(ServerEvent::tracking(&snapshot));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn order(at: Coordinates) -> ServiceOrder {
        ServiceOrder {
            id: "ord_1".to_string(),
            provider_id: "p1".to_string(),
            provider_name: "Esteban".to_string(),
            client_id: "Usuario Actual".to_string(),
            description: String::new(),
            status: OrderStatus::Accepted,
            location: String::new(),
            client_coordinates: at,
            price_estimate: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn walks_from_provider_to_client() {
        let from = Coordinates::new(0.0, 0.0);
        let to = Coordinates::new(1.0, 1.0);
        let mut route = TrackingRoute::new(from, to, 4);
        assert_eq!(route.position(), from);
        assert!(route.advance());
        assert_eq!(route.position(), Coordinates::new(0.25, 0.25));
        while route.advance() {}
        assert!(route.arrived());
        assert_eq!(route.position(), to);
        assert!(route.remaining_m() < 1e-6);
        assert!(!route.advance());
    }

    #[test]
    fn unknown_provider_starts_from_offset() {
        let client = Coordinates::new(-34.6, -58.38);
        let route = TrackingRoute::for_order(&order(client), None, 10);
        assert!((route.from.lat - (client.lat + 0.01)).abs() < 1e-12);
        assert!((route.from.lng - (client.lng + 0.01)).abs() < 1e-12);
        assert_eq!(route.to, client);
    }

    #[test]
    fn zero_steps_is_clamped() {
        let mut route = TrackingRoute::new(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0), 0);
        assert!(route.advance());
        assert!(route.arrived());
    }

    #[test]
    fn labels_follow_status() {
        assert_eq!(status_label(OrderStatus::Accepted), "Provider on the way");
        assert_eq!(status_label(OrderStatus::InProgress), "Job in progress");
    }
}
