//! Marketplace state and the discovery/matching state machine.
//!
//! Every user interaction is one method call on [`Marketplace`]. Methods
//! either apply the whole transition or return a [`MarketError`] without
//! touching state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MarketError, MarketResult},
    geo,
    models::{
        find_category, new_id, ApplicantStatus, ChatMessage, ChatSession, Coordinates,
        OrderStatus, ProviderStatus, ProviderStore, PublicRequest, PublicRequestStatus,
        RequestApplicant, Role, SavedAddress, ServiceOrder, CATEGORY_ALL, CURRENT_ADDRESS_ID,
        CURRENT_LOCATION_LABEL, DEFAULT_CENTER,
    },
    seed::Seed,
    tracking::{Tracking, TrackingRoute, TrackingSnapshot},
};

pub const CURRENT_USER_ID: &str = "current_user";
pub const CURRENT_USER_NAME: &str = "Usuario Actual";
pub const DEFAULT_OFFER: &str = "A convenir";

/// What the map sheet is currently showing. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapMode {
    Browsing,
    ProviderSelected { provider_id: String },
    ComposingRequest { provider_id: String, description: String },
    OrderSelected { order_id: String },
    PublicRequestSelected { request_id: String },
    CreatingPublicRequest,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub user_id: String,
    pub user_name: String,
    pub provider_id: String,
    pub filter_category: String,
    pub client_location: Coordinates,
    pub current_address: String,
    pub map_center: Coordinates,
    pub mode: MapMode,
    pub tracking: Option<Tracking>,
}

impl Session {
    fn new(provider_id: String) -> Self {
        Self {
            role: Role::Client,
            user_id: CURRENT_USER_ID.to_string(),
            user_name: CURRENT_USER_NAME.to_string(),
            provider_id,
            filter_category: CATEGORY_ALL.to_string(),
            client_location: DEFAULT_CENTER,
            current_address: CURRENT_LOCATION_LABEL.to_string(),
            map_center: DEFAULT_CENTER,
            mode: MapMode::Browsing,
            tracking: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub role: Role,
    pub user_id: String,
    pub user_name: String,
    /// Listing managed in provider mode.
    pub profile_id: String,
    pub filter_category: String,
    pub client_location: Coordinates,
    pub current_address: String,
    pub map_center: Coordinates,
    #[serde(flatten)]
    pub mode: MapMode,
    pub tracking: Option<TrackingSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    You,
    SavedAddress,
    Provider,
    OwnRequest,
    PublicRequest,
    Order,
    ServiceArea,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: String,
    pub kind: MarkerKind,
    pub coordinates: Coordinates,
    pub label: String,
    pub detail: String,
    pub category_id: Option<String>,
    pub selected: bool,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicRequestDraft {
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub offer_price: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub price_base: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProviderStatus>,
    pub range: Option<f64>,
}

pub struct Marketplace {
    providers: Vec<ProviderStore>,
    orders: Vec<ServiceOrder>,
    public_requests: Vec<PublicRequest>,
    chats: Vec<ChatSession>,
    addresses: Vec<SavedAddress>,
    session: Session,
    tracking_steps: u32,
}

impl Marketplace {
    pub fn new(seed: Seed, tracking_steps: u32) -> Self {
        Self {
            providers: seed.providers,
            orders: seed.orders,
            public_requests: seed.public_requests,
            chats: seed.chats,
            addresses: seed.addresses,
            session: Session::new(seed.provider_profile_id),
            tracking_steps,
        }
    }

    // ---- reads ----

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_view(&self) -> SessionView {
        SessionView {
            role: self.session.role,
            user_id: self.session.user_id.clone(),
            user_name: self.session.user_name.clone(),
            profile_id: self.session.provider_id.clone(),
            filter_category: self.session.filter_category.clone(),
            client_location: self.session.client_location,
            current_address: self.session.current_address.clone(),
            map_center: self.session.map_center,
            mode: self.session.mode.clone(),
            tracking: self.tracking_snapshot(),
        }
    }

    pub fn providers(&self) -> &[ProviderStore] {
        &self.providers
    }

    pub fn orders(&self) -> &[ServiceOrder] {
        &self.orders
    }

    pub fn public_requests(&self) -> &[PublicRequest] {
        &self.public_requests
    }

    pub fn addresses(&self) -> &[SavedAddress] {
        &self.addresses
    }

    pub fn provider(&self, id: &str) -> MarketResult<&ProviderStore> {
        self.providers
            .iter()
            .find(|provider| provider.id == id)
            .ok_or_else(|| MarketError::not_found("provider", id))
    }

    pub fn provider_by_name(&self, name: &str) -> Option<&ProviderStore> {
        self.providers.iter().find(|provider| provider.name == name)
    }

    pub fn my_provider(&self) -> MarketResult<&ProviderStore> {
        self.provider(&self.session.provider_id)
    }

    pub fn order(&self, id: &str) -> MarketResult<&ServiceOrder> {
        self.orders
            .iter()
            .find(|order| order.id == id)
            .ok_or_else(|| MarketError::not_found("order", id))
    }

    pub fn public_request(&self, id: &str) -> MarketResult<&PublicRequest> {
        self.public_requests
            .iter()
            .find(|request| request.id == id)
            .ok_or_else(|| MarketError::not_found("public request", id))
    }

    pub fn chat(&self, id: &str) -> MarketResult<&ChatSession> {
        self.chats
            .iter()
            .find(|chat| chat.id == id)
            .ok_or_else(|| MarketError::not_found("chat", id))
    }

    pub fn chat_for_order(&self, order_id: &str) -> Option<&ChatSession> {
        self.chats.iter().find(|chat| chat.order_id == order_id)
    }

    /// Chat sessions, most recent activity first.
    pub fn chat_list(&self) -> Vec<&ChatSession> {
        let mut chats: Vec<&ChatSession> = self.chats.iter().collect();
        chats.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));
        chats
    }

    /// Client discovery: category filter matches and the client stands
    /// inside the provider's coverage radius.
    pub fn visible_providers(&self) -> Vec<&ProviderStore> {
        let location = self.session.client_location;
        let filter = self.session.filter_category.as_str();
        self.providers
            .iter()
            .filter(|provider| filter == CATEGORY_ALL || provider.category_id == filter)
            .filter(|provider| provider.coordinates.is_valid())
            .filter(|provider| geo::within_radius(location, provider.coordinates, provider.range))
            .collect()
    }

    pub fn my_public_requests(&self) -> Vec<&PublicRequest> {
        self.public_requests
            .iter()
            .filter(|request| request.owner_id == self.session.user_id)
            .collect()
    }

    /// Open requests inside the current provider's service radius.
    pub fn requests_in_service_area(&self) -> Vec<&PublicRequest> {
        let Ok(me) = self.my_provider() else {
            return Vec::new();
        };
        self.public_requests
            .iter()
            .filter(|request| request.status == PublicRequestStatus::Open)
            .filter(|request| request.coordinates.is_valid())
            .filter(|request| geo::within_radius(me.coordinates, request.coordinates, me.range))
            .collect()
    }

    /// Orders relevant to the active role: incoming ones for the provider
    /// profile, or the ones the current user placed as a client.
    pub fn my_orders(&self) -> Vec<&ServiceOrder> {
        match self.session.role {
            Role::Provider => self
                .orders
                .iter()
                .filter(|order| order.provider_id == self.session.provider_id)
                .collect(),
            Role::Client => self
                .orders
                .iter()
                .filter(|order| order.client_id == self.session.user_name)
                .collect(),
            Role::Guest => Vec::new(),
        }
    }

    pub fn markers(&self) -> Vec<Marker> {
        let mut markers = match self.session.role {
            Role::Client | Role::Guest => self.client_markers(),
            Role::Provider => self.provider_markers(),
        };
        markers.retain(|marker| marker.coordinates.is_valid());
        markers
    }

    fn client_markers(&self) -> Vec<Marker> {
        let mut markers = vec![Marker {
            id: "you".to_string(),
            kind: MarkerKind::You,
            coordinates: self.session.client_location,
            label: self.session.current_address.clone(),
            detail: String::new(),
            category_id: None,
            selected: false,
            radius_m: None,
        }];

        markers.extend(self.addresses.iter().map(|address| Marker {
            id: address.id.clone(),
            kind: MarkerKind::SavedAddress,
            coordinates: address.coordinates,
            label: address.name.clone(),
            detail: address.address.clone(),
            category_id: None,
            selected: false,
            radius_m: None,
        }));

        let selected_provider = match &self.session.mode {
            MapMode::ProviderSelected { provider_id }
            | MapMode::ComposingRequest { provider_id, .. } => Some(provider_id.as_str()),
            _ => None,
        };
        markers.extend(self.visible_providers().into_iter().map(|provider| Marker {
            id: provider.id.clone(),
            kind: MarkerKind::Provider,
            coordinates: provider.coordinates,
            label: provider.name.clone(),
            detail: provider.price_base.clone(),
            category_id: Some(provider.category_id.clone()),
            selected: selected_provider == Some(provider.id.as_str()),
            radius_m: None,
        }));

        let selected_request = self.selected_request_id();
        markers.extend(
            self.my_public_requests()
                .into_iter()
                .filter(|request| request.status == PublicRequestStatus::Open)
                .map(|request| Marker {
                    id: request.id.clone(),
                    kind: MarkerKind::OwnRequest,
                    coordinates: request.coordinates,
                    label: request.category.name.clone(),
                    detail: request.offer_price.clone(),
                    category_id: Some(request.category.id.clone()),
                    selected: selected_request == Some(request.id.as_str()),
                    radius_m: None,
                }),
        );
        markers
    }

    fn provider_markers(&self) -> Vec<Marker> {
        let mut markers = Vec::new();
        if let Ok(me) = self.my_provider() {
            markers.push(Marker {
                id: format!("{}_area", me.id),
                kind: MarkerKind::ServiceArea,
                coordinates: me.coordinates,
                label: me.name.clone(),
                detail: String::new(),
                category_id: Some(me.category_id.clone()),
                selected: false,
                radius_m: Some(me.range),
            });
        }

        let selected_order = match &self.session.mode {
            MapMode::OrderSelected { order_id } => Some(order_id.as_str()),
            _ => None,
        };
        markers.extend(
            self.orders
                .iter()
                .filter(|order| order.provider_id == self.session.provider_id)
                .filter(|order| !order.status.is_terminal())
                .map(|order| Marker {
                    id: order.id.clone(),
                    kind: MarkerKind::Order,
                    coordinates: order.client_coordinates,
                    label: order.client_id.clone(),
                    detail: order.status.as_str().to_string(),
                    category_id: None,
                    selected: selected_order == Some(order.id.as_str()),
                    radius_m: None,
                }),
        );

        let selected_request = self.selected_request_id();
        markers.extend(self.requests_in_service_area().into_iter().map(|request| {
            Marker {
                id: request.id.clone(),
                kind: MarkerKind::PublicRequest,
                coordinates: request.coordinates,
                label: request.category.name.clone(),
                detail: request.offer_price.clone(),
                category_id: Some(request.category.id.clone()),
                selected: selected_request == Some(request.id.as_str()),
                radius_m: None,
            }
        }));
        markers
    }

    fn selected_request_id(&self) -> Option<&str> {
        match &self.session.mode {
            MapMode::PublicRequestSelected { request_id } => Some(request_id.as_str()),
            _ => None,
        }
    }

    // ---- session ----

    pub fn set_role(&mut self, role: Role) {
        self.session.role = role;
        self.session.mode = MapMode::Browsing;
        self.session.tracking = None;
    }

    pub fn set_filter(&mut self, category_id: &str) -> MarketResult<()> {
        if category_id != CATEGORY_ALL && find_category(category_id).is_none() {
            return Err(MarketError::UnknownCategory(category_id.to_string()));
        }
        self.session.filter_category = category_id.to_string();
        Ok(())
    }

    pub fn set_client_location(&mut self, at: Coordinates) -> MarketResult<()> {
        if !at.is_valid() {
            return Err(MarketError::InvalidCoordinates);
        }
        self.session.client_location = at;
        Ok(())
    }

    pub fn set_map_center(&mut self, at: Coordinates) -> MarketResult<()> {
        if !at.is_valid() {
            return Err(MarketError::InvalidCoordinates);
        }
        self.session.map_center = at;
        Ok(())
    }

    /// Map tap: drop whatever sheet is open.
    pub fn clear_selection(&mut self) {
        self.session.mode = MapMode::Browsing;
    }

    fn require_role(&self, role: Role) -> MarketResult<()> {
        if self.session.role == role {
            Ok(())
        } else {
            Err(MarketError::wrong_role(role))
        }
    }

    /// Guests browse only.
    fn require_member(&self) -> MarketResult<()> {
        if self.session.role == Role::Guest {
            return Err(MarketError::wrong_role(Role::Client));
        }
        Ok(())
    }

    /// The order's provider in provider mode, or its client in client mode.
    fn require_order_party(&self, order: &ServiceOrder) -> MarketResult<()> {
        self.require_member()?;
        let is_party = match self.session.role {
            Role::Provider => order.provider_id == self.session.provider_id,
            Role::Client => order.client_id == self.session.user_name,
            Role::Guest => false,
        };
        if !is_party {
            return Err(MarketError::NotOwner(order.id.clone()));
        }
        Ok(())
    }

    // ---- direct requests ----

    pub fn select_provider(&mut self, id: &str) -> MarketResult<&ProviderStore> {
        self.provider(id)?;
        self.session.mode = MapMode::ProviderSelected {
            provider_id: id.to_string(),
        };
        self.provider(id)
    }

    pub fn begin_request(&mut self) -> MarketResult<()> {
        self.require_role(Role::Client)?;
        let provider_id = match &self.session.mode {
            MapMode::ProviderSelected { provider_id }
            | MapMode::ComposingRequest { provider_id, .. } => provider_id.clone(),
            _ => return Err(MarketError::WrongMode("request")),
        };
        let provider = self.provider(&provider_id)?;
        if provider.status != ProviderStatus::Open {
            return Err(MarketError::ProviderUnavailable(provider.name.clone()));
        }
        if !matches!(self.session.mode, MapMode::ComposingRequest { .. }) {
            self.session.mode = MapMode::ComposingRequest {
                provider_id,
                description: String::new(),
            };
        }
        Ok(())
    }

    pub fn set_request_description(&mut self, text: &str) -> MarketResult<()> {
        match &mut self.session.mode {
            MapMode::ComposingRequest { description, .. } => {
                *description = text.to_string();
                Ok(())
            }
            _ => Err(MarketError::WrongMode("request")),
        }
    }

    /// Sends the composed request. Creates the order and its chat together.
    pub fn send_request(&mut self) -> MarketResult<(ServiceOrder, ChatSession)> {
        self.require_role(Role::Client)?;
        let (provider_id, description) = match &self.session.mode {
            MapMode::ComposingRequest {
                provider_id,
                description,
            } => (provider_id.clone(), description.clone()),
            _ => return Err(MarketError::WrongMode("request")),
        };
        let provider = self.provider(&provider_id)?;
        if provider.status != ProviderStatus::Open {
            return Err(MarketError::ProviderUnavailable(provider.name.clone()));
        }

        let order = ServiceOrder {
            id: new_id("ord"),
            provider_id: provider.id.clone(),
            provider_name: provider.name.clone(),
            client_id: self.session.user_name.clone(),
            description,
            status: OrderStatus::Pending,
            location: self.session.current_address.clone(),
            client_coordinates: self.session.client_location,
            price_estimate: provider.price_base.clone(),
            created_at: Utc::now(),
        };
        let chat = self.open_companion_chat(&order.id, &order.provider_name, "Solicitud enviada");

        self.orders.insert(0, order.clone());
        self.session.mode = MapMode::Browsing;
        Ok((order, chat))
    }

    fn open_companion_chat(&mut self, order_id: &str, participant: &str, text: &str) -> ChatSession {
        let now = Utc::now();
        let chat = ChatSession {
            id: format!("chat_{order_id}"),
            order_id: order_id.to_string(),
            participants: participant.to_string(),
            last_message: text.to_string(),
            last_timestamp: now,
            unread_count: 0,
            messages: vec![ChatMessage {
                id: new_id("msg"),
                sender_id: self.session.user_id.clone(),
                text: text.to_string(),
                timestamp: now,
                is_me: true,
            }],
        };
        self.chats.insert(0, chat.clone());
        chat
    }

    // ---- orders ----

    pub fn select_order(&mut self, id: &str) -> MarketResult<&ServiceOrder> {
        self.order(id)?;
        self.session.mode = MapMode::OrderSelected {
            order_id: id.to_string(),
        };
        self.order(id)
    }

    fn my_incoming_order(&self, id: &str) -> MarketResult<usize> {
        self.require_role(Role::Provider)?;
        let index = self
            .orders
            .iter()
            .position(|order| order.id == id)
            .ok_or_else(|| MarketError::not_found("order", id))?;
        if self.orders[index].provider_id != self.session.provider_id {
            return Err(MarketError::NotOwner(id.to_string()));
        }
        Ok(index)
    }

    fn has_active_job(&self, provider_id: &str) -> bool {
        self.orders
            .iter()
            .filter(|order| order.provider_id == provider_id)
            .any(|order| order.status.is_active())
    }

    fn transition(&mut self, index: usize, next: OrderStatus) -> MarketResult<()> {
        let order = &mut self.orders[index];
        if !order.status.can_transition_to(next) {
            return Err(MarketError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }
        order.status = next;
        Ok(())
    }

    /// Only one active job per provider; a second acceptance is refused
    /// and nothing changes.
    pub fn accept_order(&mut self, id: &str) -> MarketResult<ServiceOrder> {
        let index = self.my_incoming_order(id)?;
        let current = self.orders[index].status;
        if current != OrderStatus::Pending {
            return Err(MarketError::InvalidTransition {
                from: current,
                to: OrderStatus::Accepted,
            });
        }
        if self.has_active_job(&self.session.provider_id) {
            return Err(MarketError::ActiveJobInProgress);
        }
        self.transition(index, OrderStatus::Accepted)?;
        let order = self.orders[index].clone();
        self.open_tracking(&order);
        self.session.mode = MapMode::Browsing;
        Ok(order)
    }

    pub fn reject_order(&mut self, id: &str) -> MarketResult<ServiceOrder> {
        let index = self.my_incoming_order(id)?;
        let current = self.orders[index].status;
        if current != OrderStatus::Pending {
            return Err(MarketError::InvalidTransition {
                from: current,
                to: OrderStatus::Cancelled,
            });
        }
        self.transition(index, OrderStatus::Cancelled)?;
        self.session.mode = MapMode::Browsing;
        Ok(self.orders[index].clone())
    }

    pub fn start_order(&mut self, id: &str) -> MarketResult<ServiceOrder> {
        let index = self.my_incoming_order(id)?;
        self.transition(index, OrderStatus::InProgress)?;
        Ok(self.orders[index].clone())
    }

    pub fn complete_order(&mut self, id: &str) -> MarketResult<ServiceOrder> {
        let index = self.my_incoming_order(id)?;
        self.transition(index, OrderStatus::Completed)?;
        if self.tracked_order_id() == Some(id) {
            self.session.tracking = None;
        }
        Ok(self.orders[index].clone())
    }

    // ---- tracking ----

    fn open_tracking(&mut self, order: &ServiceOrder) {
        let provider_at = self
            .provider(&order.provider_id)
            .ok()
            .map(|provider| provider.coordinates);
        self.session.tracking = Some(Tracking {
            order_id: order.id.clone(),
            maximized: true,
            route: TrackingRoute::for_order(order, provider_at, self.tracking_steps),
        });
    }

    pub fn tracked_order_id(&self) -> Option<&str> {
        self.session
            .tracking
            .as_ref()
            .map(|tracking| tracking.order_id.as_str())
    }

    pub fn tracking_snapshot(&self) -> Option<TrackingSnapshot> {
        let tracking = self.session.tracking.as_ref()?;
        let order = self.order(&tracking.order_id).ok()?;
        Some(TrackingSnapshot::new(tracking, order))
    }

    /// Re-opens the tracking view for an order that already has a job running.
    pub fn view_tracking(&mut self, id: &str) -> MarketResult<TrackingSnapshot> {
        let order = self.order(id)?.clone();
        self.require_order_party(&order)?;
        if !order.status.is_active() {
            return Err(MarketError::InvalidInput(format!(
                "Order {id} has no active job to track"
            )));
        }
        let keeps_route = self.tracked_order_id() == Some(id);
        if keeps_route {
            if let Some(tracking) = self.session.tracking.as_mut() {
                tracking.maximized = true;
            }
        } else {
            self.open_tracking(&order);
        }
        self.tracking_snapshot()
            .ok_or(MarketError::WrongMode("tracking"))
    }

    pub fn set_tracking_maximized(&mut self, maximized: bool) -> MarketResult<()> {
        let tracking = self
            .session
            .tracking
            .as_mut()
            .ok_or(MarketError::WrongMode("tracking"))?;
        tracking.maximized = maximized;
        Ok(())
    }

    pub fn cancel_tracking(&mut self) -> MarketResult<ServiceOrder> {
        self.require_member()?;
        let order_id = self
            .tracked_order_id()
            .ok_or(MarketError::WrongMode("tracking"))?
            .to_string();
        let index = self
            .orders
            .iter()
            .position(|order| order.id == order_id)
            .ok_or_else(|| MarketError::not_found("order", order_id.as_str()))?;
        self.require_order_party(&self.orders[index])?;
        self.transition(index, OrderStatus::Cancelled)?;
        self.session.tracking = None;
        Ok(self.orders[index].clone())
    }

    /// One animation step for the tracked order, if it is still running.
    pub fn advance_tracking(&mut self) -> Option<TrackingSnapshot> {
        let order_id = self.tracked_order_id()?.to_string();
        let active = self.order(&order_id).ok()?.status.is_active();
        if !active {
            return None;
        }
        let moved = self.session.tracking.as_mut()?.route.advance();
        if !moved {
            return None;
        }
        self.tracking_snapshot()
    }

    // ---- public requests ----

    pub fn select_public_request(&mut self, id: &str) -> MarketResult<&PublicRequest> {
        self.public_request(id)?;
        self.session.mode = MapMode::PublicRequestSelected {
            request_id: id.to_string(),
        };
        self.public_request(id)
    }

    pub fn begin_public_request(&mut self) -> MarketResult<()> {
        self.require_role(Role::Client)?;
        self.session.mode = MapMode::CreatingPublicRequest;
        Ok(())
    }

    pub fn create_public_request(&mut self, draft: PublicRequestDraft) -> MarketResult<PublicRequest> {
        self.require_role(Role::Client)?;
        let category = find_category(&draft.category_id)
            .filter(|category| category.id != CATEGORY_ALL)
            .ok_or_else(|| MarketError::UnknownCategory(draft.category_id.clone()))?;
        let coordinates = draft.coordinates.unwrap_or(self.session.map_center);
        if !coordinates.is_valid() {
            return Err(MarketError::InvalidCoordinates);
        }
        let address = draft
            .address
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.session.current_address.clone());

        let request = PublicRequest {
            id: new_id("pub"),
            owner_id: self.session.user_id.clone(),
            client_id: self.session.user_name.clone(),
            category,
            description: draft.description.trim().to_string(),
            offer_price: format_offer(draft.offer_price.as_deref()),
            coordinates,
            address,
            created_at: Utc::now(),
            status: PublicRequestStatus::Open,
            applicants: Vec::new(),
        };
        self.public_requests.insert(0, request.clone());
        self.session.mode = MapMode::Browsing;
        Ok(request)
    }

    pub fn delete_public_request(&mut self, id: &str) -> MarketResult<()> {
        self.require_member()?;
        let request = self.public_request(id)?;
        if request.owner_id != self.session.user_id {
            return Err(MarketError::NotOwner(id.to_string()));
        }
        self.public_requests.retain(|request| request.id != id);
        if self.selected_request_id() == Some(id) {
            self.session.mode = MapMode::Browsing;
        }
        Ok(())
    }

    pub fn apply_to_request(&mut self, id: &str) -> MarketResult<PublicRequest> {
        self.require_role(Role::Provider)?;
        let me = self.my_provider()?;
        let applicant = RequestApplicant {
            provider_id: me.id.clone(),
            provider_name: me.name.clone(),
            rating: me.rating,
            status: ApplicantStatus::Pending,
        };

        let (origin, range) = (me.coordinates, me.range);

        let request = self
            .public_requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| MarketError::not_found("public request", id))?;
        if !request.coordinates.is_valid()
            || !geo::within_radius(origin, request.coordinates, range)
        {
            return Err(MarketError::OutsideServiceArea(id.to_string()));
        }
        if request.status != PublicRequestStatus::Open {
            return Err(MarketError::RequestClosed(id.to_string()));
        }
        if request
            .applicants
            .iter()
            .any(|existing| existing.provider_id == applicant.provider_id)
        {
            return Err(MarketError::AlreadyApplied(id.to_string()));
        }
        request.applicants.push(applicant);
        let request = request.clone();
        self.session.mode = MapMode::Browsing;
        Ok(request)
    }

    /// Hires an applicant: the public request turns into an accepted order
    /// with its chat and leaves the open list.
    pub fn accept_applicant(
        &mut self,
        request_id: &str,
        provider_id: &str,
    ) -> MarketResult<(ServiceOrder, ChatSession)> {
        self.require_role(Role::Client)?;
        let request = self.public_request(request_id)?;
        if request.owner_id != self.session.user_id {
            return Err(MarketError::NotOwner(request_id.to_string()));
        }
        if request.status != PublicRequestStatus::Open {
            return Err(MarketError::RequestClosed(request_id.to_string()));
        }
        let applicant = request
            .applicants
            .iter()
            .find(|applicant| applicant.provider_id == provider_id)
            .ok_or_else(|| MarketError::not_found("applicant", provider_id))?;
        if self.has_active_job(provider_id) {
            return Err(MarketError::ActiveJobInProgress);
        }

        let order = ServiceOrder {
            id: format!("ord_pub_{request_id}"),
            provider_id: applicant.provider_id.clone(),
            provider_name: applicant.provider_name.clone(),
            client_id: self.session.user_name.clone(),
            description: request.description.clone(),
            status: OrderStatus::Accepted,
            location: request.address.clone(),
            client_coordinates: request.coordinates,
            price_estimate: request.offer_price.clone(),
            created_at: Utc::now(),
        };
        let chat = self.open_companion_chat(
            &order.id,
            &order.provider_name,
            "¡He aceptado tu postulación!",
        );

        self.orders.insert(0, order.clone());
        self.open_tracking(&order);
        self.public_requests.retain(|request| request.id != request_id);
        self.session.mode = MapMode::Browsing;
        Ok((order, chat))
    }

    // ---- chats ----

    pub fn start_chat(&mut self, participant: &str, order_id: &str) -> MarketResult<ChatSession> {
        self.require_member()?;
        if let Some(existing) = self.chat_for_order(order_id) {
            return Ok(existing.clone());
        }
        let chat = ChatSession {
            id: new_id("chat"),
            order_id: order_id.to_string(),
            participants: participant.to_string(),
            last_message: "Hola, vi tu solicitud.".to_string(),
            last_timestamp: Utc::now(),
            unread_count: 0,
            messages: Vec::new(),
        };
        self.chats.insert(0, chat.clone());
        Ok(chat)
    }

    pub fn open_chat(&mut self, id: &str) -> MarketResult<ChatSession> {
        let chat = self
            .chats
            .iter_mut()
            .find(|chat| chat.id == id)
            .ok_or_else(|| MarketError::not_found("chat", id))?;
        chat.unread_count = 0;
        Ok(chat.clone())
    }

    pub fn send_chat_message(&mut self, id: &str, text: &str) -> MarketResult<ChatMessage> {
        self.require_member()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketError::InvalidInput("Message is empty".to_string()));
        }
        let sender_id = self.session.user_id.clone();
        let chat = self
            .chats
            .iter_mut()
            .find(|chat| chat.id == id)
            .ok_or_else(|| MarketError::not_found("chat", id))?;
        let message = ChatMessage {
            id: new_id("msg"),
            sender_id,
            text: text.to_string(),
            timestamp: Utc::now(),
            is_me: true,
        };
        chat.last_message = message.text.clone();
        chat.last_timestamp = message.timestamp;
        chat.messages.push(message.clone());
        Ok(message)
    }

    // ---- addresses ----

    pub fn add_address(
        &mut self,
        name: &str,
        address: &str,
        coordinates: Option<Coordinates>,
    ) -> MarketResult<SavedAddress> {
        self.require_member()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::InvalidInput("Address name is required".to_string()));
        }
        let coordinates = match coordinates {
            Some(at) if at.is_valid() => at,
            Some(_) => return Err(MarketError::InvalidCoordinates),
            None if self.session.map_center.is_valid() => self.session.map_center,
            None => DEFAULT_CENTER,
        };
        let saved = SavedAddress {
            id: new_id("addr"),
            name: name.to_string(),
            address: address.trim().to_string(),
            coordinates,
        };
        self.addresses.push(saved.clone());
        self.select_address(&saved.id)?;
        Ok(saved)
    }

    pub fn edit_address(
        &mut self,
        id: &str,
        name: &str,
        address: &str,
        coordinates: Option<Coordinates>,
    ) -> MarketResult<SavedAddress> {
        self.require_member()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::InvalidInput("Address name is required".to_string()));
        }
        if coordinates.is_some_and(|at| !at.is_valid()) {
            return Err(MarketError::InvalidCoordinates);
        }
        let current_label = self.session.current_address.clone();
        let saved = self
            .addresses
            .iter_mut()
            .find(|saved| saved.id == id)
            .ok_or_else(|| MarketError::not_found("address", id))?;
        let was_current = saved.name == current_label;
        saved.name = name.to_string();
        saved.address = address.trim().to_string();
        if let Some(at) = coordinates {
            saved.coordinates = at;
        }
        let saved = saved.clone();
        if was_current {
            self.session.current_address = saved.name.clone();
        }
        Ok(saved)
    }

    pub fn select_address(&mut self, id: &str) -> MarketResult<()> {
        if id == CURRENT_ADDRESS_ID {
            self.session.current_address = CURRENT_LOCATION_LABEL.to_string();
            return Ok(());
        }
        let saved = self
            .addresses
            .iter()
            .find(|saved| saved.id == id)
            .ok_or_else(|| MarketError::not_found("address", id))?;
        self.session.client_location = saved.coordinates;
        self.session.current_address = saved.name.clone();
        Ok(())
    }

    /// Id of the saved address currently in use, or `current` for the
    /// device location.
    pub fn current_address_id(&self) -> Option<&str> {
        if self.session.current_address == CURRENT_LOCATION_LABEL {
            return Some(CURRENT_ADDRESS_ID);
        }
        self.addresses
            .iter()
            .find(|saved| saved.name == self.session.current_address)
            .map(|saved| saved.id.as_str())
    }

    // ---- provider profile ----

    pub fn update_profile(&mut self, update: ProfileUpdate) -> MarketResult<ProviderStore> {
        self.require_member()?;
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(MarketError::InvalidInput("Name is required".to_string()));
            }
        }
        if let Some(range) = update.range {
            if !range.is_finite() || range <= 0.0 {
                return Err(MarketError::InvalidInput(
                    "Service radius must be a positive number of meters".to_string(),
                ));
            }
        }
        let profile_id = self.session.provider_id.clone();
        let provider = self
            .providers
            .iter_mut()
            .find(|provider| provider.id == profile_id)
            .ok_or_else(|| MarketError::not_found("provider", profile_id.as_str()))?;

        if let Some(name) = update.name {
            provider.name = name.trim().to_string();
        }
        if let Some(price_base) = update.price_base {
            provider.price_base = price_base;
        }
        if let Some(description) = update.description {
            provider.description = Some(description);
        }
        if let Some(status) = update.status {
            provider.status = status;
        }
        if let Some(range) = update.range {
            provider.range = range;
        }
        Ok(provider.clone())
    }
}

fn format_offer(offer: Option<&str>) -> String {
    match offer.map(str::trim).filter(|value| !value.is_empty()) {
        None => DEFAULT_OFFER.to_string(),
        Some(value) if value.starts_with('$') => value.to_string(),
        Some(value) => format!("${value}"),
    }
}
