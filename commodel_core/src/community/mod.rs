//! Assembly of single species models into community models
//!
//! Every assembler works on clones of the [`SingleModel`]s of a [`Community`]. The ids of
//! each species' metabolites and reactions are suffixed with `_<species abbreviation>`, the
//! species models are merged, and a shared exchange compartment is wired to every species
//! through `EXCHG_` reactions. Three flavours are available:
//! - [`generate_redcom_community_model`]: RedCom style model with a `COMMUNITY_GROWTH` objective
//! - [`generate_community_model_with_no_growth`]: fixed species fractions
//! - [`create_community_model_with_balanced_growth`]: fixed community growth rate
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::io::IoError;
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

pub mod balanced_growth;
pub mod definition;
pub mod no_growth;
pub mod redcom;
pub mod split;
pub mod summary;

pub use balanced_growth::create_community_model_with_balanced_growth;
pub use definition::{load_community, CommunityDefinition, SingleModelDefinition};
pub use no_growth::generate_community_model_with_no_growth;
pub use redcom::generate_redcom_community_model;
pub use split::{split_reversible_organism_reactions, SplitNaming};
pub use summary::CommunityFluxSummary;

/// Id of the mock biomass metabolite shared by all species
pub const COMMUNITY_BIOMASS_METABOLITE: &str = "community_biomass";
const MOCK_BIOMASS_NAME: &str =
    "Mock community biomass metabolite for ASTHERISC package species recognition";

/// A single species model along with the information needed to place it in a community
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct SingleModel {
    /// The species' metabolic model
    pub model: Model,
    /// Short id of the species, appended to every metabolite and reaction id. Must not
    /// contain `_`
    #[builder(setter(into))]
    pub species_abbreviation: String,
    /// Id of the species' biomass (objective) reaction, before namespacing
    #[builder(setter(into))]
    pub objective_reaction_id: String,
    /// Prefix of the species' own exchange reactions (e.g. `EX_`)
    #[builder(setter(into), default = "\"EX_\".to_string()")]
    pub exchange_reaction_id_prefix: String,
    /// Model metabolite ids the species may take up from the exchange compartment
    #[builder(default)]
    pub input_metabolite_ids: Vec<String>,
    /// Model metabolite ids the species may secrete into the exchange compartment
    #[builder(default)]
    pub output_metabolite_ids: Vec<String>,
    /// Model metabolite id to exchange metabolite id, the latter without the exchange
    /// compartment suffix
    #[builder(default)]
    pub model_metabolite_to_exchange_id_mapping: IndexMap<String, String>,
}

/// A community of species sharing an exchange compartment
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Community {
    pub single_models: Vec<SingleModel>,
    /// Id of the shared exchange compartment
    #[builder(
        setter(into),
        default = "CONFIGURATION.read().unwrap().exchange_compartment_id.clone()"
    )]
    pub exchange_compartment_id: String,
    /// Prefix of the community exchange reactions
    #[builder(
        setter(into),
        default = "CONFIGURATION.read().unwrap().community_exchange_prefix.clone()"
    )]
    pub exchange_reaction_id_prefix: String,
    /// Exchange metabolite ids (without compartment suffix) the community can take up
    #[builder(default)]
    pub input_metabolite_ids: Vec<String>,
    /// Exchange metabolite ids (without compartment suffix) the community can secrete
    #[builder(default)]
    pub output_metabolite_ids: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CommunityError {
    #[error("Less than 2 models in the community (found {0})")]
    TooFewModels(usize),
    #[error("Underscore in the species abbreviation {0}")]
    InvalidSpeciesAbbreviation(String),
    #[error("Species abbreviation {0} is used more than once")]
    DuplicateSpecies(String),
    #[error("Species {0} is not part of the community")]
    UnknownSpecies(String),
    #[error("Number of given fractions ({fractions}) does not match number of single models ({models})")]
    FractionCountMismatch { fractions: usize, models: usize },
    #[error("No fraction given for species {0}")]
    MissingFraction(String),
    #[error("Fraction {fraction} of species {species} is not within [0, 1]")]
    InvalidFraction { species: String, fraction: f64 },
    #[error("Growth rate must be finite and positive, got {0}")]
    InvalidGrowthRate(f64),
    #[error("Reaction {reaction} of species {species} not found")]
    MissingObjectiveReaction { species: String, reaction: String },
    #[error("Species {species} has no exchange mapping for metabolite {metabolite}")]
    MissingExchangeMapping { species: String, metabolite: String },
    #[error("Species {species} has no metabolite {metabolite}")]
    MissingSpeciesMetabolite { species: String, metabolite: String },
    #[error("No species exchanges the community metabolite {0}")]
    MissingExchangeMetabolite(String),
    #[error("No flux given for reaction {0}")]
    MissingFlux(String),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Unable to read model: {0}")]
    ModelIo(#[from] IoError),
    #[error("Unable to parse community definition: {0}")]
    Definition(#[from] serde_json::Error),
    #[error("Unable to read file: {0}")]
    File(#[from] std::io::Error),
}

// region Validation
/// Checks shared by every assembler
pub(crate) fn validate_single_models(community: &Community) -> Result<(), CommunityError> {
    let num_single_models = community.single_models.len();
    if num_single_models <= 1 {
        return Err(CommunityError::TooFewModels(num_single_models));
    }
    let mut seen: IndexSet<&str> = IndexSet::new();
    for single_model in &community.single_models {
        let abbreviation = single_model.species_abbreviation.as_str();
        if abbreviation.is_empty() || abbreviation.contains('_') {
            return Err(CommunityError::InvalidSpeciesAbbreviation(
                abbreviation.to_string(),
            ));
        }
        if !seen.insert(abbreviation) {
            return Err(CommunityError::DuplicateSpecies(abbreviation.to_string()));
        }
    }
    Ok(())
}
// endregion Validation

// region Assembly helpers
/// Ids of `first` followed by those of `second`, without repeats
pub(crate) fn unique_ids(first: &[String], second: &[String]) -> Vec<String> {
    first
        .iter()
        .chain(second.iter())
        .cloned()
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Id of an exchange metabolite inside the exchange compartment
pub(crate) fn exchange_metabolite_id(exchange_id: &str, exchange_compartment_id: &str) -> String {
    format!("{}_{}", exchange_id, exchange_compartment_id)
}

/// Id a species' reaction or metabolite gets inside the community model
pub(crate) fn species_id(id: &str, species_abbreviation: &str) -> String {
    format!("{}_{}", id, species_abbreviation)
}

/// Merge the namespaced species models, the first model provides id and objective
pub(crate) fn merge_species_models(models: Vec<Model>) -> Model {
    let mut models = models.into_iter();
    let mut merged = models.next().unwrap_or_else(Model::new_empty);
    for model in models {
        merged.merge(&model);
    }
    debug!(
        "Merged species models into {} reactions and {} metabolites",
        merged.reactions.len(),
        merged.metabolites.len()
    );
    merged
}

pub(crate) fn add_exchange_compartment(model: &mut Model, community: &Community) {
    model.add_compartment(Compartment::new(
        &community.exchange_compartment_id,
        Some("Exchange compartment"),
    ));
}

/// Add a metabolite to the exchange compartment unless it is already present
pub(crate) fn ensure_exchange_metabolite(
    model: &mut Model,
    exchange_id: &str,
    exchange_compartment_id: &str,
) -> String {
    let id = exchange_metabolite_id(exchange_id, exchange_compartment_id);
    model.ensure_metabolite(Metabolite::new(
        &id,
        Some(&format!("Exchange compartment metabolite {}", exchange_id)),
        Some(exchange_compartment_id),
    ));
    id
}

pub(crate) fn add_mock_biomass_metabolite(
    model: &mut Model,
    id: &str,
    exchange_compartment_id: &str,
) -> Result<(), CommunityError> {
    model.add_metabolite(Metabolite::new(
        id,
        Some(MOCK_BIOMASS_NAME),
        Some(exchange_compartment_id),
    ))?;
    Ok(())
}

/// Add the environment exchange reactions for `unique(inputs ++ outputs)` of the community,
/// open towards `-inf` for inputs and `+inf` for outputs
pub(crate) fn add_community_exchanges(
    model: &mut Model,
    community: &Community,
) -> Result<(), CommunityError> {
    for exchange_id in unique_ids(
        &community.input_metabolite_ids,
        &community.output_metabolite_ids,
    ) {
        let lower_bound = if community.input_metabolite_ids.contains(&exchange_id) {
            f64::NEG_INFINITY
        } else {
            0.
        };
        let upper_bound = if community.output_metabolite_ids.contains(&exchange_id) {
            f64::INFINITY
        } else {
            0.
        };
        let met_id =
            ensure_exchange_metabolite(model, &exchange_id, &community.exchange_compartment_id);
        let mut reaction = Reaction::new(
            &format!("{}{}", community.exchange_reaction_id_prefix, met_id),
            Some(&format!("Community exchange for {}", exchange_id)),
            lower_bound,
            upper_bound,
        );
        reaction.add_metabolite(&met_id, -1.);
        model.add_reaction(reaction)?;
    }
    Ok(())
}

/// Add the reaction moving a species metabolite into the exchange compartment
///
/// # Parameters
/// - `model`: the merged community model
/// - `single_model`: the species the metabolite belongs to
/// - `model_metabolite_id`: id of the metabolite in the species' own model
/// - `exchange_compartment_id`: id of the shared exchange compartment
/// - `lower_bound`, `upper_bound`: flux bounds of the new reaction
///
/// # Returns
/// The id of the new `EXCHG_<species>_<metabolite>_to_<exchange id>` reaction
pub(crate) fn add_species_exchange_reaction(
    model: &mut Model,
    single_model: &SingleModel,
    model_metabolite_id: &str,
    exchange_compartment_id: &str,
    lower_bound: f64,
    upper_bound: f64,
) -> Result<String, CommunityError> {
    let abbreviation = &single_model.species_abbreviation;
    let exchange_id = single_model
        .model_metabolite_to_exchange_id_mapping
        .get(model_metabolite_id)
        .ok_or_else(|| CommunityError::MissingExchangeMapping {
            species: abbreviation.clone(),
            metabolite: model_metabolite_id.to_string(),
        })?;
    let internal_id = species_id(model_metabolite_id, abbreviation);
    if !model.metabolites.contains_key(&internal_id) {
        return Err(CommunityError::MissingSpeciesMetabolite {
            species: abbreviation.clone(),
            metabolite: model_metabolite_id.to_string(),
        });
    }
    let exchange_met_id = ensure_exchange_metabolite(model, exchange_id, exchange_compartment_id);
    let prefix = CONFIGURATION.read().unwrap().species_exchange_prefix.clone();
    let reaction_id = format!(
        "{}{}_{}_to_{}",
        prefix, abbreviation, model_metabolite_id, exchange_id
    );
    let mut reaction = Reaction::new(
        &reaction_id,
        Some(&format!(
            "Exchange for {} from single species {} to exchange compartment",
            internal_id, abbreviation
        )),
        lower_bound,
        upper_bound,
    );
    reaction.add_metabolite(&internal_id, -1.);
    reaction.add_metabolite(&exchange_met_id, 1.);
    model.add_reaction(reaction)?;
    Ok(reaction_id)
}

/// Id of a species' biomass reaction in the community model, checking that it exists
pub(crate) fn species_biomass_reaction(
    model: &Model,
    single_model: &SingleModel,
    reaction_id: &str,
) -> Result<String, CommunityError> {
    let id = species_id(reaction_id, &single_model.species_abbreviation);
    if model.reactions.contains_key(&id) {
        Ok(id)
    } else {
        Err(CommunityError::MissingObjectiveReaction {
            species: single_model.species_abbreviation.clone(),
            reaction: reaction_id.to_string(),
        })
    }
}
// endregion Assembly helpers


#[cfg(test)]
mod tests {
    use super::test_communities::*;
    use super::*;

    #[test]
    fn builder_defaults() {
        let community = toy_community();
        assert_eq!(community.exchange_compartment_id, "exchg");
        assert_eq!(community.exchange_reaction_id_prefix, "EX_C_");
    }

    #[test]
    fn validation() {
        let mut community = toy_community();
        validate_single_models(&community).unwrap();

        community.single_models[1].species_abbreviation = "species1".to_string();
        assert!(matches!(
            validate_single_models(&community),
            Err(CommunityError::DuplicateSpecies(s)) if s == "species1"
        ));

        community.single_models[1].species_abbreviation = "species_2".to_string();
        assert!(matches!(
            validate_single_models(&community),
            Err(CommunityError::InvalidSpeciesAbbreviation(_))
        ));

        community.single_models.truncate(1);
        assert!(matches!(
            validate_single_models(&community),
            Err(CommunityError::TooFewModels(1))
        ));
    }

    #[test]
    fn unique_ids_keep_first_occurrence() {
        let inputs = vec!["S".to_string(), "A".to_string()];
        let outputs = vec!["A".to_string(), "P".to_string(), "S".to_string()];
        assert_eq!(unique_ids(&inputs, &outputs), vec!["S", "A", "P"]);
    }
}
