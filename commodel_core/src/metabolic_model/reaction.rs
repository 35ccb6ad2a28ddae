//! This module provides a struct for representing reactions
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::gene::Gpr;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction, keyed by metabolite id.
    ///
    /// Negative coefficients are consumed, positive coefficients are produced.
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Create a reaction with an id, name and bounds but no metabolites
    pub fn new(id: &str, name: Option<&str>, lower_bound: f64, upper_bound: f64) -> Reaction {
        Reaction {
            id: id.to_string(),
            metabolites: IndexMap::new(),
            name: name.map(|n| n.to_string()),
            gpr: None,
            lower_bound,
            upper_bound,
            subsystem: None,
            notes: None,
            annotation: None,
        }
    }

    /// Whether the reaction can carry negative flux
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0.
    }

    /// Whether the reaction only involves a single metabolite (exchange, sink or demand)
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// Metabolites consumed by the reaction, along with their coefficients
    pub fn reactants(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.metabolites.iter().filter(|(_, coef)| **coef < 0.)
    }

    /// Metabolites produced by the reaction, along with their coefficients
    pub fn products(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.metabolites.iter().filter(|(_, coef)| **coef > 0.)
    }

    /// Add metabolites to the reaction
    ///
    /// # Note:
    /// Coefficients are combined with any existing coefficient of the same metabolite,
    /// and metabolites whose combined coefficient is zero are dropped from the reaction.
    pub fn add_metabolites(&mut self, stoichiometry: &IndexMap<String, f64>) {
        for (met_id, coef) in stoichiometry {
            let combined = self.metabolites.get(met_id).copied().unwrap_or(0.) + coef;
            if combined == 0. {
                self.metabolites.shift_remove(met_id);
            } else {
                self.metabolites.insert(met_id.clone(), combined);
            }
        }
    }

    /// Add a single metabolite to the reaction, see [`Reaction::add_metabolites`]
    pub fn add_metabolite(&mut self, met_id: &str, coefficient: f64) {
        let mut stoichiometry = IndexMap::new();
        stoichiometry.insert(met_id.to_string(), coefficient);
        self.add_metabolites(&stoichiometry);
    }

    /// Stoichiometry with all coefficients negated
    pub fn reversed_stoichiometry(&self) -> IndexMap<String, f64> {
        self.metabolites
            .iter()
            .map(|(met_id, coef)| (met_id.clone(), -coef))
            .collect()
    }

    /// Scale the finite flux bounds of the reaction by `fraction`
    ///
    /// # Note:
    /// Infinite bounds of either sign, on either side, are never multiplied. They stay
    /// as they are for a non-zero fraction and are closed to zero for a zero fraction,
    /// so a bound never becomes NaN.
    pub fn scale_bounds(&mut self, fraction: f64) {
        if self.upper_bound.is_finite() {
            self.upper_bound *= fraction;
        } else if fraction == 0. {
            self.upper_bound = 0.;
        }
        if self.lower_bound.is_finite() {
            self.lower_bound *= fraction;
        } else if fraction == 0. {
            self.lower_bound = 0.;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfk() -> Reaction {
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), -1.0);
        metabolites.insert("f6p_c".to_string(), -1.0);
        metabolites.insert("adp_c".to_string(), 1.0);
        metabolites.insert("fdp_c".to_string(), 1.0);
        metabolites.insert("h_c".to_string(), 1.0);
        ReactionBuilder::default()
            .id("PFK")
            .name(Some("Phosphofructokinase".to_string()))
            .metabolites(metabolites)
            .lower_bound(0.)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_defaults() {
        let reaction = ReactionBuilder::default().id("R1").build().unwrap();
        assert!((reaction.lower_bound + 1000.).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.).abs() < 1e-25);
        assert!(reaction.metabolites.is_empty());
        assert!(reaction.is_reversible());
    }

    #[test]
    fn reactants_and_products() {
        let reaction = pfk();
        let reactants: Vec<&String> = reaction.reactants().map(|(id, _)| id).collect();
        let products: Vec<&String> = reaction.products().map(|(id, _)| id).collect();
        assert_eq!(reactants, vec!["atp_c", "f6p_c"]);
        assert_eq!(products, vec!["adp_c", "fdp_c", "h_c"]);
        assert!(!reaction.is_reversible());
        assert!(!reaction.is_boundary());
    }

    #[test]
    fn add_metabolites_combines() {
        let mut reaction = pfk();
        reaction.add_metabolite("h_c", 1.0);
        assert!((reaction.metabolites["h_c"] - 2.0).abs() < 1e-25);
        // Cancelling out a metabolite removes it
        reaction.add_metabolite("atp_c", 1.0);
        assert!(!reaction.metabolites.contains_key("atp_c"));
        // New metabolites are appended
        reaction.add_metabolite("community_biomass", 1.0);
        assert_eq!(
            reaction.metabolites.last().map(|(id, _)| id.as_str()),
            Some("community_biomass")
        );
    }

    #[test]
    fn reversed() {
        let reaction = pfk();
        let reversed = reaction.reversed_stoichiometry();
        assert!((reversed["atp_c"] - 1.0).abs() < 1e-25);
        assert!((reversed["fdp_c"] + 1.0).abs() < 1e-25);
    }

    #[test]
    fn scale_bounds() {
        let mut reaction = Reaction::new("R1", None, -10., f64::INFINITY);
        reaction.scale_bounds(0.5);
        assert!((reaction.lower_bound + 5.).abs() < 1e-25);
        assert!(reaction.upper_bound.is_infinite());

        let mut closed = Reaction::new("R2", None, f64::NEG_INFINITY, f64::INFINITY);
        closed.scale_bounds(0.);
        assert_eq!(closed.lower_bound, 0.);
        assert_eq!(closed.upper_bound, 0.);
    }

    #[test]
    fn scale_inverted_infinite_bounds() {
        let mut halved = Reaction::new("R3", None, f64::INFINITY, f64::NEG_INFINITY);
        halved.scale_bounds(0.5);
        assert_eq!(halved.lower_bound, f64::INFINITY);
        assert_eq!(halved.upper_bound, f64::NEG_INFINITY);

        let mut closed = Reaction::new("R4", None, f64::INFINITY, f64::NEG_INFINITY);
        closed.scale_bounds(0.);
        assert_eq!(closed.lower_bound, 0.);
        assert_eq!(closed.upper_bound, 0.);
    }
}
