//! RedCom style community models
use log::{debug, info};

use crate::community::{
    add_exchange_compartment, add_species_exchange_reaction, exchange_metabolite_id,
    merge_species_models, species_biomass_reaction, species_id, unique_ids,
    validate_single_models, Community, CommunityError, COMMUNITY_BIOMASS_METABOLITE,
};
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::objective::ObjectiveSense;
use crate::metabolic_model::reaction::Reaction;

/// Id of the community growth reaction of RedCom models
pub const COMMUNITY_GROWTH_REACTION: &str = "COMMUNITY_GROWTH";

/// Generate a RedCom style community model
///
/// The species' own exchange reactions are kept but closed, every mapped metabolite gets an
/// `EXCHG_` reaction to the exchange compartment, and a `community_biomass` metabolite
/// produced by every species' objective reaction is drained by `COMMUNITY_GROWTH`, which
/// becomes the maximized objective.
///
/// # Parameters
/// - `community`: The community to assemble, it is not modified
///
/// # Returns
/// The community model
///
/// # Note:
/// Bounds use the configured default upper bound `B` as the open magnitude. Species exchanges
/// of metabolites which are input and output get `[-B, B]`, input only `[-B, 0]`, output
/// only `[0, B]`. Mapped metabolites in neither list keep the open default `[0, B]`.
///
/// # Panics
/// If the lock of the global configuration is poisoned
///
/// # Examples
/// ```rust
/// use commodel_core::community::{generate_redcom_community_model, CommunityBuilder, SingleModelBuilder};
/// use commodel_core::metabolic_model::model::Model;
/// use commodel_core::metabolic_model::metabolite::Metabolite;
/// use commodel_core::metabolic_model::reaction::Reaction;
/// fn species(abbreviation: &str) -> commodel_core::community::SingleModel {
///     let mut growth = Reaction::new("growth", None, 0., 1000.);
///     growth.add_metabolite("glc_c", -1.);
///     let model = Model::from_parts(
///         "species",
///         vec![],
///         vec![Metabolite::new("glc_c", None, Some("c"))],
///         vec![growth],
///     )
///     .unwrap();
///     SingleModelBuilder::default()
///         .model(model)
///         .species_abbreviation(abbreviation)
///         .objective_reaction_id("growth")
///         .input_metabolite_ids(vec!["glc_c".to_string()])
///         .model_metabolite_to_exchange_id_mapping(
///             [("glc_c".to_string(), "glc".to_string())].into_iter().collect(),
///         )
///         .build()
///         .unwrap()
/// }
/// let community = CommunityBuilder::default()
///     .single_models(vec![species("ecoli"), species("bsub")])
///     .input_metabolite_ids(vec!["glc".to_string()])
///     .build()
///     .unwrap();
/// let model = generate_redcom_community_model(&community).unwrap();
/// assert!(model.reactions.contains_key("EXCHG_ecoli_glc_c_to_glc"));
/// assert!(model.reactions.contains_key("EX_C_glc_exchg"));
/// assert_eq!(model.objective.expression(), "1.0*COMMUNITY_GROWTH");
/// ```
pub fn generate_redcom_community_model(community: &Community) -> Result<Model, CommunityError> {
    validate_single_models(community)?;
    let bound = CONFIGURATION.read().unwrap().upper_bound;
    let exchange_compartment_id = community.exchange_compartment_id.as_str();

    // Close the species' own exchanges and namespace every species
    let species_models: Vec<Model> = community
        .single_models
        .iter()
        .map(|single_model| {
            let mut model = single_model.model.clone();
            model
                .reactions
                .values_mut()
                .filter(|rxn| rxn.id.starts_with(&single_model.exchange_reaction_id_prefix))
                .for_each(|rxn| {
                    rxn.lower_bound = 0.;
                    rxn.upper_bound = 0.;
                });
            model.add_id_suffix(&single_model.species_abbreviation);
            model
        })
        .collect();
    let mut merged = merge_species_models(species_models);
    add_exchange_compartment(&mut merged, community);

    // Species <-> exchange compartment
    for single_model in &community.single_models {
        for model_metabolite_id in single_model.model_metabolite_to_exchange_id_mapping.keys() {
            let is_input = single_model.input_metabolite_ids.contains(model_metabolite_id);
            let is_output = single_model.output_metabolite_ids.contains(model_metabolite_id);
            let (lower_bound, upper_bound) = match (is_input, is_output) {
                (true, true) => (-bound, bound),
                (true, false) => (-bound, 0.),
                (false, true) => (0., bound),
                (false, false) => (0., bound),
            };
            add_species_exchange_reaction(
                &mut merged,
                single_model,
                model_metabolite_id,
                exchange_compartment_id,
                lower_bound,
                upper_bound,
            )?;
        }
    }

    // Exchange compartment <-> environment
    for input_id in unique_ids(&community.input_metabolite_ids, &[]) {
        let met_id = exchange_metabolite_id(&input_id, exchange_compartment_id);
        if !merged.metabolites.contains_key(&met_id) {
            return Err(CommunityError::MissingExchangeMetabolite(input_id));
        }
        let mut reaction = Reaction::new(
            &format!("{}{}", community.exchange_reaction_id_prefix, met_id),
            None,
            -bound,
            0.,
        );
        reaction.add_metabolite(&met_id, -1.);
        merged.add_reaction(reaction)?;
    }
    for output_id in unique_ids(&community.output_metabolite_ids, &[]) {
        let met_id = exchange_metabolite_id(&output_id, exchange_compartment_id);
        if !merged.metabolites.contains_key(&met_id) {
            return Err(CommunityError::MissingExchangeMetabolite(output_id));
        }
        let reaction_id = format!("{}{}", community.exchange_reaction_id_prefix, met_id);
        match merged.reactions.get_mut(&reaction_id) {
            Some(reaction) => reaction.upper_bound = bound,
            None => {
                let mut reaction = Reaction::new(&reaction_id, None, 0., bound);
                reaction.add_metabolite(&met_id, -1.);
                merged.add_reaction(reaction)?;
            }
        }
    }

    // Community growth
    merged.add_metabolite(Metabolite::new(
        COMMUNITY_BIOMASS_METABOLITE,
        None,
        Some(exchange_compartment_id),
    ))?;
    for single_model in &community.single_models {
        let objective_id =
            species_biomass_reaction(&merged, single_model, &single_model.objective_reaction_id)?;
        merged
            .reaction_mut(&objective_id)?
            .add_metabolite(COMMUNITY_BIOMASS_METABOLITE, 1.);
        debug!(
            "Species {} contributes to community growth through {}",
            single_model.species_abbreviation,
            species_id(&single_model.objective_reaction_id, &single_model.species_abbreviation)
        );
    }
    let mut growth = Reaction::new(COMMUNITY_GROWTH_REACTION, None, 0., bound);
    growth.add_metabolite(COMMUNITY_BIOMASS_METABOLITE, -1.);
    merged.add_reaction(growth)?;
    merged.set_objective(COMMUNITY_GROWTH_REACTION, ObjectiveSense::Maximize)?;

    info!(
        "Generated RedCom community model with {} species",
        community.single_models.len()
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::test_communities::toy_community;

    #[test]
    fn redcom_structure() {
        let community = toy_community();
        let model = generate_redcom_community_model(&community).unwrap();

        // Species exchanges closed but kept
        let ex = model.reaction("EX_A_species1").unwrap();
        assert_eq!((ex.lower_bound, ex.upper_bound), (0., 0.));
        assert!(model.reactions.contains_key("EX_P_species2"));

        // S is input only, P input and output
        let s = model.reaction("EXCHG_species1_S_c_to_S").unwrap();
        assert_eq!((s.lower_bound, s.upper_bound), (-1000., 0.));
        let p = model.reaction("EXCHG_species2_P_c_to_P").unwrap();
        assert_eq!((p.lower_bound, p.upper_bound), (-1000., 1000.));
        assert!((p.metabolites["P_c_species2"] + 1.).abs() < 1e-25);
        assert!((p.metabolites["P_exchg"] - 1.).abs() < 1e-25);

        // Exchange metabolites are shared
        assert_eq!(model.reactions_of_metabolite("P_exchg").len(), 3);
        assert_eq!(
            model.metabolite("P_exchg").unwrap().compartment.as_deref(),
            Some("exchg")
        );
        assert_eq!(
            model.compartments["exchg"].name.as_deref(),
            Some("Exchange compartment")
        );

        // Community exchanges
        let input = model.reaction("EX_C_S_exchg").unwrap();
        assert_eq!((input.lower_bound, input.upper_bound), (-1000., 0.));
        let output = model.reaction("EX_C_P_exchg").unwrap();
        assert_eq!((output.lower_bound, output.upper_bound), (0., 1000.));

        // Community growth
        let biomass = model.reaction("C_to_P_species1").unwrap();
        assert!((biomass.metabolites[COMMUNITY_BIOMASS_METABOLITE] - 1.).abs() < 1e-25);
        let growth = model.reaction(COMMUNITY_GROWTH_REACTION).unwrap();
        assert_eq!((growth.lower_bound, growth.upper_bound), (0., 1000.));
        assert_eq!(model.objective.expression(), "1.0*COMMUNITY_GROWTH");
        model.validate().unwrap();
    }

    #[test]
    fn unlisted_mapping_stays_open() {
        let mut community = toy_community();
        let species = &mut community.single_models[0];
        species.input_metabolite_ids.retain(|id| id == "S_c");
        species.output_metabolite_ids.clear();
        let model = generate_redcom_community_model(&community).unwrap();
        let a = model.reaction("EXCHG_species1_A_c_to_A").unwrap();
        assert_eq!((a.lower_bound, a.upper_bound), (0., 1000.));
        let s = model.reaction("EXCHG_species1_S_c_to_S").unwrap();
        assert_eq!((s.lower_bound, s.upper_bound), (-1000., 0.));
    }

    #[test]
    fn input_and_output_share_reaction() {
        let mut community = toy_community();
        community.output_metabolite_ids.push("S".to_string());
        let model = generate_redcom_community_model(&community).unwrap();
        let s = model.reaction("EX_C_S_exchg").unwrap();
        assert_eq!((s.lower_bound, s.upper_bound), (-1000., 1000.));
    }

    #[test]
    fn inputs_not_mutated() {
        let community = toy_community();
        let before = community.clone();
        generate_redcom_community_model(&community).unwrap();
        assert_eq!(community, before);
    }

    #[test]
    fn unknown_community_metabolite() {
        let mut community = toy_community();
        community.input_metabolite_ids.push("glc".to_string());
        assert!(matches!(
            generate_redcom_community_model(&community),
            Err(CommunityError::MissingExchangeMetabolite(id)) if id == "glc"
        ));
    }

    #[test]
    fn missing_objective() {
        let mut community = toy_community();
        community.single_models[0].objective_reaction_id = "BIOMASS".to_string();
        assert!(matches!(
            generate_redcom_community_model(&community),
            Err(CommunityError::MissingObjectiveReaction { .. })
        ));
    }
}
