//! Module providing the records that make up a stoichiometric metabolic model
//! (compartments, metabolites, reactions, genes and objectives), and the Model
//! struct which ties them together.

pub mod compartment;
pub mod gene;
pub mod metabolite;
pub mod model;
pub mod objective;
pub mod reaction;
