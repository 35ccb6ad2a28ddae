//! Small models shared by the unit tests
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::objective::ObjectiveSense;
use crate::metabolic_model::reaction::Reaction;

fn reaction(id: &str, lower_bound: f64, upper_bound: f64, stoichiometry: &[(&str, f64)]) -> Reaction {
    let mut rxn = Reaction::new(id, None, lower_bound, upper_bound);
    for (met_id, coef) in stoichiometry {
        rxn.add_metabolite(met_id, *coef);
    }
    rxn
}

/// Linear pathway S -> A -> B -> C -> P with the cofactor X alternately produced and consumed
pub(crate) fn toy_model() -> Model {
    let inf = f64::INFINITY;
    let metabolites = ["S_c", "A_c", "B_c", "C_c", "P_c", "X_c"]
        .iter()
        .map(|id| Metabolite::new(id, None, Some("c")))
        .collect();
    let reactions = vec![
        reaction("EX_A", 0., 1000., &[("S_c", 1.)]),
        reaction("S_to_A", 0., inf, &[("S_c", -1.), ("A_c", 1.), ("X_c", 1.)]),
        reaction("A_to_B", 0., inf, &[("A_c", -1.), ("B_c", 1.), ("X_c", -1.)]),
        reaction("B_to_C", 0., inf, &[("B_c", -1.), ("C_c", 1.), ("X_c", 1.)]),
        reaction("C_to_P", 0., inf, &[("C_c", -1.), ("P_c", 1.), ("X_c", -1.)]),
        reaction("EX_P", 0., inf, &[("P_c", -1.)]),
    ];
    let mut model = Model::from_parts(
        "toy_model",
        vec![Compartment::new("c", Some("cytosol"))],
        metabolites,
        reactions,
    )
    .unwrap();
    model.set_objective("EX_P", ObjectiveSense::Maximize).unwrap();
    model
}

/// The toy model with a reversible step, used for testing reaction splitting
pub(crate) fn reversible_toy_model() -> Model {
    let mut model = toy_model();
    let rxn = model.reaction_mut("B_to_C").unwrap();
    rxn.lower_bound = -10.;
    rxn.upper_bound = 20.;
    model
}
