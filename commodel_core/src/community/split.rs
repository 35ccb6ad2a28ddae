//! Splitting of reversible species reactions into irreversible pairs
use indexmap::IndexMap;
use log::debug;

use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

/// Infixes marking the two directions of a split reaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitNaming {
    pub forward: String,
    pub reverse: String,
}

impl Default for SplitNaming {
    /// `<stem>_forward_<species>` and `<stem>_reverse_<species>`
    fn default() -> Self {
        SplitNaming {
            forward: "forward".to_string(),
            reverse: "reverse".to_string(),
        }
    }
}

impl SplitNaming {
    /// `<stem>_fwd_<species>` and `<stem>_rev_<species>`, as used by RedCom
    pub fn short() -> Self {
        SplitNaming {
            forward: "fwd".to_string(),
            reverse: "rev".to_string(),
        }
    }
}

/// Split every reversible species reaction into a forward and a reverse reaction
///
/// A reaction is split if its lower bound is negative, it is not the biomass reaction of a
/// species, and the last `_` separated token of its id is one of the species in
/// `biomass_reactions`.
///
/// # Parameters
/// - `model`: A community model, with species namespaced ids
/// - `biomass_reactions`: Species abbreviation to the (namespaced) id of its biomass reaction
/// - `naming`: Infixes of the new reaction ids
///
/// # Note:
/// The reaction `<stem>_<species>` is renamed in place to `<stem>_<forward>_<species>` and
/// its lower bound set to 0. A new reaction `<stem>_<reverse>_<species>` with bounds
/// `[0, -lower bound]` and negated stoichiometry is appended to the model. Objective terms
/// follow the forward reaction.
pub fn split_reversible_organism_reactions(
    model: &mut Model,
    biomass_reactions: &IndexMap<String, String>,
    naming: &SplitNaming,
) -> Result<(), ModelError> {
    let candidates: Vec<(String, String)> = model
        .reactions
        .values()
        .filter(|rxn| rxn.lower_bound < 0.)
        .filter(|rxn| !biomass_reactions.values().any(|id| *id == rxn.id))
        .filter_map(|rxn| {
            let (_, organism) = rxn.id.rsplit_once('_')?;
            biomass_reactions
                .contains_key(organism)
                .then(|| (rxn.id.clone(), organism.to_string()))
        })
        .collect();

    for (reaction_id, organism) in candidates {
        let stem = &reaction_id[..reaction_id.len() - organism.len() - 1];
        let forward_id = format!("{}_{}_{}", stem, naming.forward, organism);
        let reverse_id = format!("{}_{}_{}", stem, naming.reverse, organism);
        if model.reactions.contains_key(&reverse_id) {
            return Err(ModelError::DuplicateReaction(reverse_id));
        }
        model.rename_reaction(&reaction_id, &forward_id)?;

        let forward = model.reaction_mut(&forward_id)?;
        let mut reverse = Reaction::new(&reverse_id, None, 0., -forward.lower_bound);
        forward.lower_bound = 0.;
        reverse.name = forward.name.clone();
        reverse.gpr = forward.gpr.clone();
        reverse.subsystem = forward.subsystem.clone();
        reverse.metabolites = forward.reversed_stoichiometry();
        model.add_reaction(reverse)?;
        debug!("Split {} into {} and {}", reaction_id, forward_id, reverse_id);
    }
    Ok(())
}
