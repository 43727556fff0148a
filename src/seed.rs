use chrono::{Duration, Utc};

use crate::models::{
    find_category, ChatMessage, ChatSession, Coordinates, OrderStatus, ProviderStatus,
    ProviderStore, PublicRequest, PublicRequestStatus, SavedAddress, ServiceCategory,
    ServiceOrder,
};

/// Initial contents of the marketplace. Everything lives for one process run.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub providers: Vec<ProviderStore>,
    pub orders: Vec<ServiceOrder>,
    pub public_requests: Vec<PublicRequest>,
    pub chats: Vec<ChatSession>,
    pub addresses: Vec<SavedAddress>,
    /// Listing edited from the profile page while in provider mode.
    pub provider_profile_id: String,
}

impl Seed {
    pub fn empty(provider_profile_id: &str) -> Self {
        Self {
            provider_profile_id: provider_profile_id.to_string(),
            ..Self::default()
        }
    }

    /// Buenos Aires demo data: four providers around the Obelisco, two
    /// incoming orders for the first one and a public plumbing request.
    pub fn demo() -> Self {
        let providers = vec![
            provider(
                "p1",
                "Esteban \"El Rayo\" K.",
                "electricidad",
                4.9,
                154,
                Coordinates::new(-34.6050, -58.3850),
                800.0,
                "Av. Corrientes 1200",
                ProviderStatus::Open,
                "Visita $15.000",
                Some("https://images.unsplash.com/photo-1621905251189-08b45d6a269e?q=80&w=2069&auto=format&fit=crop"),
                "Especialista en instalaciones domiciliarias e industriales. Urgencias 24hs. Matriculado con más de 10 años de experiencia en CABA.",
                vec![
                    "https://images.unsplash.com/photo-1558402529-d2638a7023e9?q=80&w=800&auto=format&fit=crop".to_string(),
                    "https://images.unsplash.com/photo-1581092918056-0c4c3acd3789?q=80&w=800&auto=format&fit=crop".to_string(),
                ],
            ),
            provider(
                "p2",
                "Plomería Total S.A.",
                "plomeria",
                4.5,
                89,
                Coordinates::new(-34.6020, -58.3790),
                1200.0,
                "Florida 500",
                ProviderStatus::Busy,
                "Visita $20.000",
                Some("https://images.unsplash.com/photo-1607472586893-edb57bdc0e39?q=80&w=2000&auto=format&fit=crop"),
                "Empresa líder en soluciones sanitarias. Destapaciones con máquina, filtraciones y reparaciones generales. Garantía escrita.",
                Vec::new(),
            ),
            provider(
                "p3",
                "Fletes Rapidos",
                "mudanza",
                4.8,
                32,
                Coordinates::new(-34.5990, -58.3890),
                3000.0,
                "Callao 200",
                ProviderStatus::Open,
                "Hora $25.000",
                None,
                "Mudanzas pequeñas y medianas. Servicio puerta a puerta.",
                Vec::new(),
            ),
            provider(
                "p4",
                "Limpieza Profunda",
                "limpieza",
                4.2,
                12,
                Coordinates::new(-34.6080, -58.3750),
                800.0,
                "San Telmo Central",
                ProviderStatus::Open,
                "Hora $12.000",
                None,
                "Limpieza final de obra, consorcios y oficinas.",
                Vec::new(),
            ),
        ];

        let now = Utc::now();
        let orders = vec![
            ServiceOrder {
                id: "req_101".to_string(),
                provider_id: "p1".to_string(),
                provider_name: "Esteban \"El Rayo\" K.".to_string(),
                client_id: "Juan Pérez (Demo)".to_string(),
                description: "Tengo un corto en la cocina, urgente.".to_string(),
                status: OrderStatus::Pending,
                location: "Av. Córdoba 1500".to_string(),
                client_coordinates: Coordinates::new(-34.5980, -58.3860),
                price_estimate: "$15.000".to_string(),
                created_at: now,
            },
            ServiceOrder {
                id: "req_102".to_string(),
                provider_id: "p1".to_string(),
                provider_name: "Esteban \"El Rayo\" K.".to_string(),
                client_id: "Maria Gonzalez".to_string(),
                description: "Instalación de luminarias LED en local.".to_string(),
                status: OrderStatus::Accepted,
                location: "Talcahuano 800".to_string(),
                client_coordinates: Coordinates::new(-34.6010, -58.3830),
                price_estimate: "$45.000".to_string(),
                created_at: now - Duration::hours(1),
            },
        ];

        let plumbing = find_category("plomeria").unwrap_or_else(|| ServiceCategory {
            id: "plomeria".to_string(),
            name: "Plomería".to_string(),
            icon: "wrench".to_string(),
        });
        let public_requests = vec![PublicRequest {
            id: "pub_1".to_string(),
            owner_id: "other_client".to_string(),
            client_id: "Ana García".to_string(),
            category: plumbing,
            description: "Cambio de cuerito canilla baño".to_string(),
            offer_price: "$8.000".to_string(),
            coordinates: Coordinates::new(-34.6060, -58.3820),
            address: "Talcahuano 400".to_string(),
            created_at: now,
            status: PublicRequestStatus::Open,
            applicants: Vec::new(),
        }];

        let chats = vec![
            chat("c1", "req_101", "Juan Pérez (Demo)", "Estoy llegando en 5 min.", 1, now),
            chat(
                "c2",
                "old_1",
                "María G.",
                "Gracias por el servicio!",
                0,
                now - Duration::days(1),
            ),
        ];

        Self {
            providers,
            orders,
            public_requests,
            chats,
            addresses: Vec::new(),
            provider_profile_id: "p1".to_string(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn provider(
    id: &str,
    name: &str,
    category_id: &str,
    rating: f64,
    reviews_count: u32,
    coordinates: Coordinates,
    range: f64,
    address: &str,
    status: ProviderStatus,
    price_base: &str,
    hero_image: Option<&str>,
    description: &str,
    portfolio_images: Vec<String>,
) -> ProviderStore {
    let category_name = find_category(category_id)
        .map(|category| category.name)
        .unwrap_or_default();
    ProviderStore {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
        category_name,
        rating,
        reviews_count,
        coordinates,
        range,
        address: address.to_string(),
        status,
        price_base: price_base.to_string(),
        hero_image: hero_image.map(str::to_string),
        description: Some(description.to_string()),
        portfolio_images,
    }
}

fn chat(
    id: &str,
    order_id: &str,
    participants: &str,
    last_message: &str,
    unread_count: u32,
    at: chrono::DateTime<Utc>,
) -> ChatSession {
    ChatSession {
        id: id.to_string(),
        order_id: order_id.to_string(),
        participants: participants.to_string(),
        last_message: last_message.to_string(),
        last_timestamp: at,
        unread_count,
        messages: vec![ChatMessage {
            id: format!("{id}_m1"),
            sender_id: participants.to_string(),
            text: last_message.to_string(),
            timestamp: at,
            is_me: false,
        }],
    }
}
