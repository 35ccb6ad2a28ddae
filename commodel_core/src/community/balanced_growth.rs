//! Community models growing at a fixed, balanced growth rate
use indexmap::IndexMap;
use log::{debug, info};

use crate::community::split::{split_reversible_organism_reactions, SplitNaming};
use crate::community::{
    add_community_exchanges, add_exchange_compartment, add_mock_biomass_metabolite,
    add_species_exchange_reaction, merge_species_models, species_biomass_reaction, species_id,
    unique_ids, validate_single_models, Community, CommunityError, COMMUNITY_BIOMASS_METABOLITE,
};
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::objective::ObjectiveSense;
use crate::metabolic_model::reaction::Reaction;

/// Id of both the community biomass metabolite and the community biomass reaction
pub const COMMUNITY_BIOMASS: &str = "COMMUNITY_BIOMASS";

/// Which flux bound a pseudo metabolite enforces
#[derive(Clone, Copy, Debug)]
enum BoundSide {
    Upper,
    Lower,
}

impl BoundSide {
    fn tag(self) -> &'static str {
        match self {
            BoundSide::Upper => "UPPER",
            BoundSide::Lower => "LOWER",
        }
    }

    fn description(self) -> &'static str {
        match self {
            BoundSide::Upper => "Upper",
            BoundSide::Lower => "Lower",
        }
    }
}

/// Create a community model in which all species grow at the same, fixed growth rate
///
/// Flux bounds of the species reactions are expressed relative to the species' biomass
/// formation: for every finite bound of a species reaction a pseudo metabolite
/// `Msnake_<UPPER|LOWER>_<reaction>` is produced by the reaction and consumed by the species'
/// biomass reaction with coefficient `-bound / growth_rate`. The pseudo metabolite is balanced
/// by a delivery reaction `Rsnake_<UPPER|LOWER>_<reaction>`. Reversible species reactions are
/// split into `_forward_` and `_reverse_` reactions beforehand.
///
/// # Parameters
/// - `community`: The community to assemble, it is not modified
/// - `growth_rate`: The fixed growth rate of the community, must be finite and positive
///
/// # Returns
/// The community model, with the `COMMUNITY_BIOMASS` reaction fixed to `growth_rate` as
/// maximized objective
///
/// # Panics
/// If the lock of the global configuration is poisoned
pub fn create_community_model_with_balanced_growth(
    community: &Community,
    growth_rate: f64,
) -> Result<Model, CommunityError> {
    validate_single_models(community)?;
    if !growth_rate.is_finite() || growth_rate <= 0. {
        return Err(CommunityError::InvalidGrowthRate(growth_rate));
    }
    let exchange_compartment_id = community.exchange_compartment_id.as_str();
    let default_upper_bound = CONFIGURATION.read().unwrap().upper_bound;

    let species_models: Vec<Model> = community
        .single_models
        .iter()
        .map(|single_model| {
            let mut model = single_model.model.clone();
            model.remove_reactions_with_prefix(&single_model.exchange_reaction_id_prefix);
            model.add_id_suffix(&single_model.species_abbreviation);
            model
        })
        .collect();
    let mut merged = merge_species_models(species_models);
    add_exchange_compartment(&mut merged, community);

    // Species abbreviation -> namespaced biomass reaction
    let mut biomass_reactions: IndexMap<String, String> = IndexMap::new();
    for single_model in &community.single_models {
        let biomass_id =
            species_biomass_reaction(&merged, single_model, &single_model.objective_reaction_id)?;
        let biomass = merged.reaction_mut(&biomass_id)?;
        biomass.lower_bound = 0.;
        biomass.upper_bound = f64::INFINITY;
        biomass_reactions.insert(single_model.species_abbreviation.clone(), biomass_id);
    }

    merged.add_metabolite(Metabolite::new(
        COMMUNITY_BIOMASS,
        Some("Community biomass metabolite"),
        Some(exchange_compartment_id),
    ))?;
    for biomass_id in biomass_reactions.values() {
        merged
            .reaction_mut(biomass_id)?
            .add_metabolite(COMMUNITY_BIOMASS, 1.);
    }

    add_community_exchanges(&mut merged, community)?;
    split_reversible_organism_reactions(&mut merged, &biomass_reactions, &SplitNaming::default())?;

    // Bounds relative to biomass formation
    let reaction_ids: Vec<String> = merged.reactions.keys().cloned().collect();
    for reaction_id in reaction_ids {
        let Some(biomass_id) = reaction_id
            .rsplit_once('_')
            .and_then(|(_, organism)| biomass_reactions.get(organism))
        else {
            continue;
        };
        let reaction = merged.reaction(&reaction_id)?;
        let (lower_bound, upper_bound) = (reaction.lower_bound, reaction.upper_bound);
        if upper_bound != f64::INFINITY {
            add_bound_enforcement(
                &mut merged,
                &reaction_id,
                biomass_id,
                BoundSide::Upper,
                upper_bound / growth_rate,
                exchange_compartment_id,
                default_upper_bound,
            )?;
        }
        if lower_bound != f64::NEG_INFINITY && lower_bound != 0. {
            add_bound_enforcement(
                &mut merged,
                &reaction_id,
                biomass_id,
                BoundSide::Lower,
                lower_bound / growth_rate,
                exchange_compartment_id,
                default_upper_bound,
            )?;
        }
    }

    // Species <-> exchange compartment
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
            // Bounds follow the community's lists, not the species' lists
            let (lower_bound, upper_bound) = match single_model
                .model_metabolite_to_exchange_id_mapping
                .get(&model_metabolite_id)
            {
                Some(exchange_id) => (
                    if community.input_metabolite_ids.contains(exchange_id) {
                        f64::NEG_INFINITY
                    } else {
                        0.
                    },
                    if community.output_metabolite_ids.contains(exchange_id) {
                        f64::INFINITY
                    } else {
                        0.
                    },
                ),
                None => (0., 0.),
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

    let mut community_biomass = Reaction::new(
        COMMUNITY_BIOMASS,
        Some("Biomass reaction for the whole community"),
        growth_rate,
        growth_rate,
    );
    community_biomass.add_metabolite(COMMUNITY_BIOMASS, -1.);
    merged.add_reaction(community_biomass)?;
    merged.set_objective(COMMUNITY_BIOMASS, ObjectiveSense::Maximize)?;

    info!(
        "Generated balanced growth community model with {} species at growth rate {}",
        community.single_models.len(),
        growth_rate
    );
    Ok(merged)
}

/// Add the pseudo metabolite and delivery reaction enforcing one bound of `reaction_id`
fn add_bound_enforcement(
    model: &mut Model,
    reaction_id: &str,
    biomass_id: &str,
    side: BoundSide,
    biomass_coefficient: f64,
    exchange_compartment_id: &str,
    default_upper_bound: f64,
) -> Result<(), CommunityError> {
    let met_id = format!("Msnake_{}_{}", side.tag(), reaction_id);
    model.add_metabolite(Metabolite::new(
        &met_id,
        Some(&format!(
            "{} bound enforcing metabolite for {}",
            side.description(),
            reaction_id
        )),
        Some(exchange_compartment_id),
    ))?;
    model.reaction_mut(reaction_id)?.add_metabolite(&met_id, 1.);
    model
        .reaction_mut(biomass_id)?
        .add_metabolite(&met_id, -biomass_coefficient);

    let mut delivery = Reaction::new(
        &format!("Rsnake_{}_{}", side.tag(), reaction_id),
        Some(&format!(
            "Delivery reaction of {} bound enforcing metabolite for {}",
            side.description().to_lowercase(),
            reaction_id
        )),
        0.,
        default_upper_bound,
    );
    let delivery_coefficient = match side {
        BoundSide::Upper => 1.,
        BoundSide::Lower => -1.,
    };
    delivery.add_metabolite(&met_id, delivery_coefficient);
    model.add_reaction(delivery)?;
    debug!("Enforcing {} bound of {} through {}", side.tag(), reaction_id, met_id);
    Ok(())
}
