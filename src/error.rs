use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::models::{OrderStatus, Role};

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("You already have a job in progress. Finish it before accepting another.")]
    ActiveJobInProgress,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Provider {0} is not taking requests right now")]
    ProviderUnavailable(String),

    #[error("This action requires the {expected} role")]
    WrongRole { expected: &'static str },

    #[error("Only the owner of {0} can do that")]
    NotOwner(String),

    #[error("Already applied to request {0}")]
    AlreadyApplied(String),

    #[error("Request {0} is no longer open")]
    RequestClosed(String),

    #[error("Request {0} is outside your service area")]
    OutsideServiceArea(String),

    #[error("Unknown category {0}")]
    UnknownCategory(String),

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Nothing selected for {0}")]
    WrongMode(&'static str),
}

impl MarketError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        MarketError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn wrong_role(expected: Role) -> Self {
        MarketError::WrongRole {
            expected: expected.as_str(),
        }
    }
}

impl ResponseError for MarketError {
    fn status_code(&self) -> StatusCode {
        match self {
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::ActiveJobInProgress
            | MarketError::InvalidTransition { .. }
            | MarketError::ProviderUnavailable(_)
            | MarketError::AlreadyApplied(_)
            | MarketError::RequestClosed(_)
            | MarketError::OutsideServiceArea(_)
            | MarketError::WrongMode(_) => StatusCode::CONFLICT,
            MarketError::WrongRole { .. } | MarketError::NotOwner(_) => StatusCode::FORBIDDEN,
            MarketError::UnknownCategory(_)
            | MarketError::InvalidCoordinates
            | MarketError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
