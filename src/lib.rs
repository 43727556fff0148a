pub mod config;
pub mod error;
pub mod estimate;
pub mod geo;
pub mod market;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod templates;
pub mod tracking;

use crate::{
    config::Config, estimate::PriceEstimator, market::Marketplace, seed::Seed, state::AppState,
};

/// Profile used when starting without demo data.
pub const DEFAULT_PROFILE_ID: &str = "p1";

pub fn build_state(config: &Config) -> Result<AppState, reqwest::Error> {
    let seed = if config.seed_demo {
        Seed::demo()
    } else {
        Seed::empty(DEFAULT_PROFILE_ID)
    };
    let market = Marketplace::new(seed, config.tracking_steps);
    let estimator = PriceEstimator::new(config)?;
    Ok(AppState::new(market, estimator))
}
