//! Clean-up of species models before they are assembled into a community
use indexmap::IndexMap;
use log::debug;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

/// SBML id escapes and their replacements
const ID_ESCAPES: [(&str, &str); 3] = [("_DASH_", "__"), ("_LPAREN_", "_"), ("_RPAREN_", "")];

/// Treat bounds at or beyond `threshold` as unbounded
///
/// Upper bounds `>= threshold` become `+inf`, lower bounds `<= -threshold` become `-inf`.
///
/// # Returns
/// The number of changed bounds
pub fn unbound_large_bounds(model: &mut Model, threshold: f64) -> usize {
    let mut changed = 0;
    for rxn in model.reactions.values_mut() {
        if rxn.upper_bound.is_finite() && rxn.upper_bound >= threshold {
            rxn.upper_bound = f64::INFINITY;
            changed += 1;
        }
        if rxn.lower_bound.is_finite() && rxn.lower_bound <= -threshold {
            rxn.lower_bound = f64::NEG_INFINITY;
            changed += 1;
        }
    }
    changed
}

fn unescaped(id: &str) -> String {
    ID_ESCAPES
        .iter()
        .fold(id.to_string(), |id, (escape, replacement)| {
            id.replace(escape, replacement)
        })
}

/// Replace the `_DASH_`, `_LPAREN_` and `_RPAREN_` escapes in reaction and metabolite ids
///
/// # Returns
/// An error if a cleaned id collides with an existing one
pub fn clean_id_escapes(model: &mut Model) -> Result<(), ModelError> {
    let reaction_ids: Vec<String> = model.reactions.keys().cloned().collect();
    for id in reaction_ids {
        let cleaned = unescaped(&id);
        if cleaned != id {
            debug!("Renaming reaction {} to {}", id, cleaned);
            model.rename_reaction(&id, &cleaned)?;
        }
    }
    let metabolite_ids: Vec<String> = model.metabolites.keys().cloned().collect();
    for id in metabolite_ids {
        let cleaned = unescaped(&id);
        if cleaned != id {
            debug!("Renaming metabolite {} to {}", id, cleaned);
            model.rename_metabolite(&id, &cleaned)?;
        }
    }
    Ok(())
}

/// Remove every metabolite whose id ends with `suffix`, e.g. unbalanced `_ex` metabolites
pub fn remove_metabolites_with_suffix(model: &mut Model, suffix: &str) -> Vec<Metabolite> {
    let ids: Vec<String> = model
        .metabolites
        .keys()
        .filter(|id| id.ends_with(suffix))
        .cloned()
        .collect();
    let ids: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    model.remove_metabolites(&ids)
}

/// Remove reactions without any metabolites
pub fn remove_empty_reactions(model: &mut Model) -> Vec<Reaction> {
    let ids: Vec<String> = model
        .reactions
        .values()
        .filter(|rxn| rxn.metabolites.is_empty())
        .map(|rxn| rxn.id.clone())
        .collect();
    let ids: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    model.remove_reactions(&ids)
}

/// Strip a compartment suffix from a metabolite id (`glc__D_e` -> `glc__D`)
///
/// Ids without the suffix are returned unchanged.
pub fn strip_compartment_suffix<'a>(id: &'a str, suffix: &str) -> &'a str {
    id.strip_suffix(suffix).unwrap_or(id)
}

/// Build a model metabolite to exchange id mapping by stripping compartment suffixes
///
/// The first suffix in `suffixes` which matches an id is stripped.
///
/// # Examples
/// ```rust
/// use commodel_core::curation::exchange_mapping_for;
/// let mapping = exchange_mapping_for(&["glc__D_e", "ac_p"], &["_e", "_p"]);
/// assert_eq!(mapping["glc__D_e"], "glc__D");
/// assert_eq!(mapping["ac_p"], "ac");
/// ```
pub fn exchange_mapping_for<S: AsRef<str>>(ids: &[S], suffixes: &[&str]) -> IndexMap<String, String> {
    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            let exchange_id = suffixes
                .iter()
                .find(|suffix| id.ends_with(*suffix))
                .map(|suffix| strip_compartment_suffix(id, suffix))
                .unwrap_or(id);
            (id.to_string(), exchange_id.to_string())
        })
        .collect()
}
