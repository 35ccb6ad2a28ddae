//! This module provides the metabolite struct representing a metabolite

use std::hash::Hash;

use derive_builder::Builder;

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Notes about the metabolite
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Metabolite annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// Create a new metabolite with only an id
    pub fn new_id_only(id: &str) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: 0,
            formula: None,
            notes: None,
            annotation: None,
        }
    }

    /// Create a new metabolite with a name and compartment, leaving everything else empty
    pub fn new(id: &str, name: Option<&str>, compartment: Option<&str>) -> Metabolite {
        Metabolite {
            name: name.map(|n| n.to_string()),
            compartment: compartment.map(|c| c.to_string()),
            ..Metabolite::new_id_only(id)
        }
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // Hash by id
                             // If the metabolite has an associated compartment, also hash by that
        if let Some(ref compartment) = self.compartment {
            compartment.hash(state)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let met = MetaboliteBuilder::default()
            .id("glc__D_e")
            .name(Some("D-Glucose".to_string()))
            .compartment(Some("e".to_string()))
            .formula(Some("C6H12O6".to_string()))
            .build()
            .unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.charge, 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
    }

    #[test]
    fn new_with_compartment() {
        let met = Metabolite::new("ac_exchg", Some("Acetate"), Some("exchg"));
        assert_eq!(met.compartment.as_deref(), Some("exchg"));
        assert_eq!(met.name.as_deref(), Some("Acetate"));
        assert!(met.annotation.is_none());
    }
}
