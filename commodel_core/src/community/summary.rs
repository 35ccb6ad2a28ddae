//! Textual summary of a flux distribution of a community model
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};

use crate::community::CommunityError;
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Model;

/// Community and species exchange fluxes of a flux distribution, along with the species
/// which take part in it
#[derive(Clone, Debug, PartialEq)]
pub struct CommunityFluxSummary {
    pub title: String,
    /// Linear expression of the model's objective
    pub objective_expression: String,
    pub objective_value: Option<f64>,
    /// Metabolites taken up by the community, with their (negative) flux
    pub community_in_fluxes: Vec<(String, f64)>,
    /// Metabolites secreted by the community
    pub community_out_fluxes: Vec<(String, f64)>,
    /// Species exchange reactions (without prefix) carrying flux into the species
    pub species_in_fluxes: Vec<(String, f64)>,
    /// Species exchange reactions (without prefix) carrying flux out of the species
    pub species_out_fluxes: Vec<(String, f64)>,
    /// Species with at least one active exchange
    pub active_organisms: Vec<String>,
    /// Species without any active exchange
    pub inactive_organisms: Vec<String>,
}

impl CommunityFluxSummary {
    /// Summarize a flux distribution of a community model
    ///
    /// # Parameters
    /// - `model`: The community model the fluxes belong to
    /// - `fluxes`: Reaction id to flux, must contain every community and species exchange
    /// - `objective_value`: Value of the objective, if known
    /// - `community_exchange_prefix`: Prefix of the community exchange reactions (e.g. `EX_C_`)
    /// - `title`: Title of the summary
    ///
    /// # Returns
    /// The summary, or [`CommunityError::MissingFlux`] if an exchange has no flux
    ///
    /// # Note:
    /// Fluxes are rounded to the configured number of digits before being classified, so
    /// tiny fluxes count as inactive. Labels drop only the leading prefix of the reaction id,
    /// a later repetition of the prefix is kept.
    ///
    /// # Panics
    /// If the lock of the global configuration is poisoned
    pub fn from_fluxes(
        model: &Model,
        fluxes: &IndexMap<String, f64>,
        objective_value: Option<f64>,
        community_exchange_prefix: &str,
        title: &str,
    ) -> Result<CommunityFluxSummary, CommunityError> {
        let (digits, species_prefix) = {
            let config = CONFIGURATION.read().unwrap();
            (config.flux_rounding_digits, config.species_exchange_prefix.clone())
        };
        let flux_of = |reaction_id: &str| -> Result<f64, CommunityError> {
            fluxes
                .get(reaction_id)
                .map(|flux| round_flux(*flux, digits))
                .ok_or_else(|| CommunityError::MissingFlux(reaction_id.to_string()))
        };

        let mut summary = CommunityFluxSummary {
            title: title.to_string(),
            objective_expression: model.objective.expression(),
            objective_value,
            community_in_fluxes: Vec::new(),
            community_out_fluxes: Vec::new(),
            species_in_fluxes: Vec::new(),
            species_out_fluxes: Vec::new(),
            active_organisms: Vec::new(),
            inactive_organisms: Vec::new(),
        };

        for (reaction_id, label) in model
            .reactions
            .keys()
            .filter_map(|id| id.strip_prefix(community_exchange_prefix).map(|label| (id, label)))
        {
            let flux = flux_of(reaction_id)?;
            if flux < 0. {
                summary.community_in_fluxes.push((label.to_string(), flux));
            } else if flux > 0. {
                summary.community_out_fluxes.push((label.to_string(), flux));
            }
        }

        let mut active: IndexSet<String> = IndexSet::new();
        let mut inactive: IndexSet<String> = IndexSet::new();
        for (reaction_id, label) in model
            .reactions
            .keys()
            .filter_map(|id| id.strip_prefix(species_prefix.as_str()).map(|label| (id, label)))
        {
            let flux = flux_of(reaction_id)?;
            let organism = label.split('_').next().unwrap_or(label).to_string();
            if flux < 0. {
                summary.species_in_fluxes.push((label.to_string(), flux));
                active.insert(organism);
            } else if flux > 0. {
                summary.species_out_fluxes.push((label.to_string(), flux));
                active.insert(organism);
            } else {
                inactive.insert(organism);
            }
        }
        summary.inactive_organisms = inactive
            .into_iter()
            .filter(|organism| !active.contains(organism))
            .collect();
        summary.active_organisms = active.into_iter().collect();
        Ok(summary)
    }

    /// Species to 1 if it is active in the flux distribution, 0 otherwise
    pub fn organism_occurrence(&self) -> IndexMap<String, u8> {
        self.active_organisms
            .iter()
            .map(|organism| (organism.clone(), 1))
            .chain(
                self.inactive_organisms
                    .iter()
                    .map(|organism| (organism.clone(), 0)),
            )
            .collect()
    }
}

fn round_flux(flux: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (flux * factor).round() / factor
}

fn write_fluxes(f: &mut Formatter<'_>, header: &str, fluxes: &[(String, f64)]) -> std::fmt::Result {
    write!(f, "{}", header)?;
    for (label, flux) in fluxes {
        write!(f, "\n{}: {:?}", label, flux)?;
    }
    writeln!(f)
}

impl Display for CommunityFluxSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "===SUMMARY OF {}===", self.title)?;
        write_fluxes(f, "COMMUNITY IN FLUXES:", &self.community_in_fluxes)?;
        write_fluxes(f, "\nCOMMUNITY OUT FLUXES:", &self.community_out_fluxes)?;
        write_fluxes(f, "\nSPECIES-INTERNAL IN FLUXES:", &self.species_in_fluxes)?;
        write_fluxes(f, "\nSPECIES-INTERNAL OUT FLUXES:", &self.species_out_fluxes)?;
        match self.objective_value {
            Some(value) => writeln!(
                f,
                "\nObjective {} has the value...\n{:?}",
                self.objective_expression, value
            )?,
            None => writeln!(
                f,
                "\nObjective {} has no value",
                self.objective_expression
            )?,
        }
        write!(f, "\nActive organisms: ")?;
        for organism in &self.active_organisms {
            write!(f, "\n* {}", organism)?;
        }
        write!(f, "\n\nInactive organisms: ")?;
        for organism in &self.inactive_organisms {
            write!(f, "\n* {}", organism)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::redcom::generate_redcom_community_model;
    use crate::community::test_communities::toy_community;

    fn zero_fluxes(model: &Model) -> IndexMap<String, f64> {
        model.reactions.keys().map(|id| (id.clone(), 0.)).collect()
    }

    #[test]
    fn classify_fluxes() {
        let model = generate_redcom_community_model(&toy_community()).unwrap();
        let mut fluxes = zero_fluxes(&model);
        fluxes.insert("EX_C_S_exchg".to_string(), -10.00012);
        fluxes.insert("EX_C_P_exchg".to_string(), 10.);
        fluxes.insert("EXCHG_species1_S_c_to_S".to_string(), -10.);
        fluxes.insert("EXCHG_species1_P_c_to_P".to_string(), 10.);
        // Rounded away
        fluxes.insert("EXCHG_species2_A_c_to_A".to_string(), 1e-5);

        let summary =
            CommunityFluxSummary::from_fluxes(&model, &fluxes, Some(10.), "EX_C_", "FBA").unwrap();
        assert_eq!(summary.community_in_fluxes, vec![("S_exchg".to_string(), -10.)]);
        assert_eq!(summary.community_out_fluxes, vec![("P_exchg".to_string(), 10.)]);
        assert_eq!(
            summary.species_in_fluxes,
            vec![("species1_S_c_to_S".to_string(), -10.)]
        );
        assert_eq!(summary.active_organisms, vec!["species1"]);
        assert_eq!(summary.inactive_organisms, vec!["species2"]);

        let occurrence = summary.organism_occurrence();
        assert_eq!(occurrence["species1"], 1);
        assert_eq!(occurrence["species2"], 0);
    }

    #[test]
    fn report() {
        let model = generate_redcom_community_model(&toy_community()).unwrap();
        let mut fluxes = zero_fluxes(&model);
        fluxes.insert("EX_C_S_exchg".to_string(), -1.5);
        fluxes.insert("EXCHG_species2_S_c_to_S".to_string(), -1.5);
        let summary =
            CommunityFluxSummary::from_fluxes(&model, &fluxes, Some(1.5), "EX_C_", "TOY").unwrap();
        let report = summary.to_string();
        assert!(report.starts_with("===SUMMARY OF TOY===\nCOMMUNITY IN FLUXES:\nS_exchg: -1.5\n"));
        assert!(report.contains("\nSPECIES-INTERNAL IN FLUXES:\nspecies2_S_c_to_S: -1.5\n"));
        assert!(report.contains("Objective 1.0*COMMUNITY_GROWTH has the value...\n1.5\n"));
        assert!(report.contains("Active organisms: \n* species2\n"));
        assert!(report.ends_with("Inactive organisms: \n* species1\n"));
    }

    #[test]
    fn missing_flux() {
        let model = generate_redcom_community_model(&toy_community()).unwrap();
        let mut fluxes = zero_fluxes(&model);
        fluxes.shift_remove("EXCHG_species2_P_c_to_P");
        assert!(matches!(
            CommunityFluxSummary::from_fluxes(&model, &fluxes, None, "EX_C_", "FBA"),
            Err(CommunityError::MissingFlux(id)) if id == "EXCHG_species2_P_c_to_P"
        ));
    }
}
