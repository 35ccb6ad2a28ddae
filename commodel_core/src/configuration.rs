//! Process wide defaults used when building models and communities
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Default values used throughout model and community construction
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Default lower flux bound for new reactions
    pub lower_bound: f64,
    /// Default upper flux bound for new reactions, also used as the "open" bound
    /// magnitude when wiring RedCom style exchanges
    pub upper_bound: f64,
    /// Tolerance used for floating point comparisons
    pub tolerance: f64,
    /// Id of the shared exchange compartment
    pub exchange_compartment_id: String,
    /// Prefix of the community (environment <-> exchange compartment) exchange reactions
    pub community_exchange_prefix: String,
    /// Prefix of the species <-> exchange compartment reactions
    pub species_exchange_prefix: String,
    /// Number of decimal digits fluxes are rounded to in summaries
    pub flux_rounding_digits: i32,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            exchange_compartment_id: "exchg".to_string(),
            community_exchange_prefix: "EX_C_".to_string(),
            species_exchange_prefix: "EXCHG_".to_string(),
            flux_rounding_digits: 3,
        }
    }
}

/// Restore the global configuration to its defaults
pub fn reset_configuration() {
    *CONFIGURATION.write().unwrap() = Configuration::default();
}
