//! This module provides the Compartment struct

use derive_builder::Builder;

/// A compartment of a metabolic model (e.g. cytosol, periplasm, or the shared exchange
/// compartment of a community model)
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Compartment {
    /// Short identifier of the compartment (e.g. `c`, `e`, `exchg`)
    #[builder(setter(into))]
    pub id: String,
    /// Human readable compartment name
    #[builder(default = "None")]
    pub name: Option<String>,
}

impl Compartment {
    /// Create a new compartment
    pub fn new(id: &str, name: Option<&str>) -> Compartment {
        Compartment {
            id: id.to_string(),
            name: name.map(|n| n.to_string()),
        }
    }
}
