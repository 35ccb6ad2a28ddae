//! Community models with fixed species fractions
use indexmap::IndexMap;
use log::{info, warn};

use crate::community::{
    add_community_exchanges, add_exchange_compartment, add_mock_biomass_metabolite,
    add_species_exchange_reaction, merge_species_models, species_biomass_reaction, species_id,
    unique_ids, validate_single_models, Community, CommunityError, COMMUNITY_BIOMASS_METABOLITE,
};
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::objective::ObjectiveSense;
use crate::metabolic_model::reaction::Reaction;

/// Id of the objective reaction created when biomass reactions are given
pub const COMMUNITY_BIOMASS_REACTION: &str = "community_biomass_reaction";

/// Generate a community model in which every species has a fixed fraction of the community
/// biomass
///
/// Every finite flux bound of a species reaction is multiplied by the species' fraction, so
/// that only the growth rate remains free. Infinite bounds stay infinite, unless the
/// fraction is zero, in which case they are closed.
///
/// # Parameters
/// - `community`: The community to assemble, it is not modified
/// - `fractions`: Species abbreviation to fraction of the total community biomass, one entry
///   per species. The fractions should sum to one.
/// - `biomass_reactions`: Species abbreviation to the id of its biomass reaction (before
///   namespacing). If not empty, the mock metabolite `community_biomass_<species>` is added
///   as product to each of these reactions, and a `community_biomass_reaction` consuming them
///   becomes the objective. If empty, the objective of the first species is kept.
///
/// # Returns
/// The community model, or a [`CommunityError`] if the fractions don't match the species
///
/// # Panics
/// If the lock of the global configuration is poisoned
pub fn generate_community_model_with_no_growth(
    community: &Community,
    fractions: &IndexMap<String, f64>,
    biomass_reactions: &IndexMap<String, String>,
) -> Result<Model, CommunityError> {
    validate_single_models(community)?;
    validate_fractions(community, fractions)?;
    for species in biomass_reactions.keys() {
        if !fractions.contains_key(species) {
            return Err(CommunityError::UnknownSpecies(species.clone()));
        }
    }
    let exchange_compartment_id = community.exchange_compartment_id.as_str();

    let mut species_models = Vec::with_capacity(community.single_models.len());
    for single_model in &community.single_models {
        let fraction = fractions[&single_model.species_abbreviation];
        let mut model = single_model.model.clone();
        model
            .reactions
            .values_mut()
            .for_each(|rxn| rxn.scale_bounds(fraction));
        model.remove_reactions_with_prefix(&single_model.exchange_reaction_id_prefix);
        model.add_id_suffix(&single_model.species_abbreviation);
        species_models.push(model);
    }
    let mut merged = merge_species_models(species_models);
    add_exchange_compartment(&mut merged, community);
    add_community_exchanges(&mut merged, community)?;
    add_mock_biomass_metabolite(&mut merged, COMMUNITY_BIOMASS_METABOLITE, exchange_compartment_id)?;

    for single_model in &community.single_models {
        add_mock_biomass_metabolite(
            &mut merged,
            &species_id(COMMUNITY_BIOMASS_METABOLITE, &single_model.species_abbreviation),
            exchange_compartment_id,
        )?;
        for model_metabolite_id in unique_ids(
            &single_model.input_metabolite_ids,
            &single_model.output_metabolite_ids,
        ) {
            let lower_bound = if single_model.input_metabolite_ids.contains(&model_metabolite_id) {
                f64::NEG_INFINITY
            } else {
                0.
            };
            let upper_bound = if single_model.output_metabolite_ids.contains(&model_metabolite_id)
            {
                f64::INFINITY
            } else {
                0.
            };
            add_species_exchange_reaction(
                &mut merged,
                single_model,
                &model_metabolite_id,
                exchange_compartment_id,
                lower_bound,
                upper_bound,
            )?;
        }
    }

    if !biomass_reactions.is_empty() {
        let mut objective_reaction =
            Reaction::new(COMMUNITY_BIOMASS_REACTION, None, 0., f64::INFINITY);
        for single_model in &community.single_models {
            let abbreviation = &single_model.species_abbreviation;
            let Some(reaction_id) = biomass_reactions.get(abbreviation) else {
                continue;
            };
            let biomass_id = species_biomass_reaction(&merged, single_model, reaction_id)?;
            let mock_id = species_id(COMMUNITY_BIOMASS_METABOLITE, abbreviation);
            merged.reaction_mut(&biomass_id)?.add_metabolite(&mock_id, 1.);
            objective_reaction.add_metabolite(&mock_id, -fractions[abbreviation]);
        }
        merged.add_reaction(objective_reaction)?;
        merged.set_objective(COMMUNITY_BIOMASS_REACTION, ObjectiveSense::Maximize)?;
    }

    info!(
        "Generated fixed fraction community model with {} species",
        community.single_models.len()
    );
    Ok(merged)
}

fn validate_fractions(
    community: &Community,
    fractions: &IndexMap<String, f64>,
) -> Result<(), CommunityError> {
    if fractions.len() != community.single_models.len() {
        return Err(CommunityError::FractionCountMismatch {
            fractions: fractions.len(),
            models: community.single_models.len(),
        });
    }
    for single_model in &community.single_models {
        let species = &single_model.species_abbreviation;
        let fraction = *fractions
            .get(species)
            .ok_or_else(|| CommunityError::MissingFraction(species.clone()))?;
        if !(0. ..=1.).contains(&fraction) {
            return Err(CommunityError::InvalidFraction {
                species: species.clone(),
                fraction,
            });
        }
    }
    let total: f64 = fractions.values().sum();
    let tolerance = CONFIGURATION.read().unwrap().tolerance;
    if (total - 1.).abs() > tolerance {
        warn!("Species fractions sum to {} instead of 1", total);
    }
    Ok(())
}
