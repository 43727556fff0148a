use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CATEGORY_ALL: &str = "all";
pub const CURRENT_ADDRESS_ID: &str = "current";
pub const CURRENT_LOCATION_LABEL: &str = "Mi Ubicación Actual";
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: -34.6037,
    lng: -58.3816,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Provider,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Provider => "PROVIDER",
            Role::Guest => "GUEST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
}

pub fn category_catalog() -> Vec<ServiceCategory> {
    [
        (CATEGORY_ALL, "Todos", "grid"),
        ("plomeria", "Plomería", "wrench"),
        ("electricidad", "Electricidad", "zap"),
        ("mudanza", "Fletes", "truck"),
        ("limpieza", "Limpieza", "sparkles"),
    ]
    .into_iter()
    .map(|(id, name, icon)| ServiceCategory {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

pub fn find_category(id: &str) -> Option<ServiceCategory> {
    category_catalog().into_iter().find(|category| category.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Open,
    Busy,
    Closed,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Open => "OPEN",
            ProviderStatus::Busy => "BUSY",
            ProviderStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStore {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub category_name: String,
    pub rating: f64,
    pub reviews_count: u32,
    pub coordinates: Coordinates,
    /// Service radius in meters.
    pub range: f64,
    pub address: String,
    pub status: ProviderStatus,
    pub price_base: String,
    pub hero_image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub portfolio_images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// A provider holding an active job cannot accept another one.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Accepted | OrderStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Accepted)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: String,
    pub provider_id: String,
    pub provider_name: String,
    pub client_id: String,
    pub description: String,
    pub status: OrderStatus,
    pub location: String,
    pub client_coordinates: Coordinates,
    pub price_estimate: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestApplicant {
    pub provider_id: String,
    pub provider_name: String,
    pub rating: f64,
    pub status: ApplicantStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicRequestStatus {
    Open,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicRequest {
    pub id: String,
    pub owner_id: String,
    pub client_id: String,
    pub category: ServiceCategory,
    pub description: String,
    pub offer_price: String,
    pub coordinates: Coordinates,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub status: PublicRequestStatus,
    pub applicants: Vec<RequestApplicant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub order_id: String,
    /// Display name of the other party.
    pub participants: String,
    pub last_message: String,
    pub last_timestamp: DateTime<Utc>,
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
}

pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}
