//! Core rust implementation of commodel, a crate for building stoichiometric multi-species
//! community models from single species metabolic models.

pub mod community;
pub mod configuration;
pub mod curation;
pub mod io;
pub mod metabolic_model;
pub mod thermodynamics;

#[cfg(test)]
mod test_models;
