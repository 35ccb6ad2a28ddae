//! Standard Gibbs free energy (dG0) data of community model reactions
//!
//! The data is stored as JSON objects mapping reaction ids to their dG0 and its uncertainty,
//! `{"PGI_ecoli": {"dG0": 2.6, "uncertainty": 0}}`. Species models carry data for their own
//! reaction ids, which has to be namespaced for the community model, and the exchanges
//! between species and exchange compartment are thermodynamically neutral.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Model;

/// Faraday constant in kJ/mV/mol
const FARADAY: f64 = 0.10026;
/// Membrane potential in mV
const DELTA_PSI: f64 = -130.;
const DELTA_PH: f64 = 0.4;
/// Gas constant in kJ/K/mol
const GAS_CONSTANT: f64 = 8.314e-3;
/// Temperature in K
const TEMPERATURE: f64 = 298.15;

/// Net charge and protons moved across the membrane by known transport reactions, by
/// reaction id prefix
const MEMBRANE_TRANSPORT: [(&str, f64, f64); 6] = [
    ("ATPS4", 4.0, 4.0),
    ("NADH16", -3.5, -3.5),
    ("NADH17", -2.0, -2.0),
    ("NADH18", -2.8, -2.8),
    ("CYTBD", -2.0, -2.0),
    ("CYTBO3", -2.5, -2.5),
];

/// dG0 of a single reaction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dg0Entry {
    #[serde(rename = "dG0")]
    pub dg0: f64,
    #[serde(default)]
    pub uncertainty: f64,
}

/// Reaction id to dG0 data
pub type Dg0Mapping = IndexMap<String, Dg0Entry>;

#[derive(Debug, Error)]
pub enum ThermodynamicsError {
    #[error("Unable to parse dG0 data: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Unable to access dG0 file: {0}")]
    Io(#[from] std::io::Error),
}

// region IO
/// Read dG0 data from a JSON file
pub fn read_dg0_json<P: AsRef<Path>>(path: P) -> Result<Dg0Mapping, ThermodynamicsError> {
    let data = fs::read_to_string(path)?;
    dg0_from_json_str(&data)
}

/// Parse dG0 data from a JSON string
pub fn dg0_from_json_str(data: &str) -> Result<Dg0Mapping, ThermodynamicsError> {
    Ok(serde_json::from_str(data)?)
}

/// Write dG0 data to a JSON file
pub fn write_dg0_json<P: AsRef<Path>>(
    mapping: &Dg0Mapping,
    path: P,
) -> Result<(), ThermodynamicsError> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_string_pretty(mapping)?)?;
    info!("Wrote dG0 data of {} reactions to {}", mapping.len(), path.display());
    Ok(())
}
// endregion IO

/// Namespace species dG0 data for a community model
///
/// Every entry `<rid>` of `base` becomes one entry `<rid>_<abbreviation>` per species.
pub fn expand_for_species<S: AsRef<str>>(base: &Dg0Mapping, species: &[S]) -> Dg0Mapping {
    base.iter()
        .flat_map(|(reaction_id, entry)| {
            species.iter().map(move |abbreviation| {
                (format!("{}_{}", reaction_id, abbreviation.as_ref()), *entry)
            })
        })
        .collect()
}

/// Add a zero dG0 entry for every species exchange reaction of a community model
///
/// Exchanges of metabolites in `excluded_metabolites` (matched by the exchange id the
/// reaction id ends with, `..._to_<exchange id>`) are skipped, as are reactions which
/// already have an entry.
///
/// # Returns
/// The number of added entries
pub fn add_species_exchange_entries<S: AsRef<str>>(
    mapping: &mut Dg0Mapping,
    model: &Model,
    excluded_metabolites: &[S],
) -> usize {
    let prefix = CONFIGURATION.read().unwrap().species_exchange_prefix.clone();
    let excluded_suffixes: Vec<String> = excluded_metabolites
        .iter()
        .map(|met| format!("_to_{}", met.as_ref()))
        .collect();
    let mut added = 0;
    for reaction_id in model.reactions.keys().filter(|id| id.starts_with(&prefix)) {
        if excluded_suffixes
            .iter()
            .any(|suffix| reaction_id.ends_with(suffix.as_str()))
        {
            debug!("No dG0 entry for excluded exchange {}", reaction_id);
            continue;
        }
        if !mapping.contains_key(reaction_id) {
            mapping.insert(
                reaction_id.clone(),
                Dg0Entry {
                    dg0: 0.,
                    uncertainty: 0.,
                },
            );
            added += 1;
        }
    }
    added
}

/// dG0 correction of a membrane bound reaction
///
/// `c_j·F·ΔΨ − 2.3·h_j·R·T·ΔpH` with `c_j` the net charge moved from outside to inside and
/// `h_j` the number of protons moved across the membrane.
pub fn membrane_correction(c_j: f64, h_j: f64) -> f64 {
    c_j * FARADAY * DELTA_PSI - 2.3 * h_j * GAS_CONSTANT * TEMPERATURE * DELTA_PH
}

/// `(c_j, h_j)` of well known membrane bound reactions, recognized by their id prefix
pub fn known_membrane_transport(reaction_id: &str) -> Option<(f64, f64)> {
    MEMBRANE_TRANSPORT
        .iter()
        .find(|(prefix, _, _)| reaction_id.starts_with(prefix))
        .map(|(_, c_j, h_j)| (*c_j, *h_j))
}

/// Apply [`membrane_correction`] to every entry of a known membrane bound reaction
///
/// # Returns
/// The number of corrected entries
pub fn correct_membrane_transport(mapping: &mut Dg0Mapping) -> usize {
    let mut corrected = 0;
    for (reaction_id, entry) in mapping.iter_mut() {
        if let Some((c_j, h_j)) = known_membrane_transport(reaction_id) {
            let correction = membrane_correction(c_j, h_j);
            entry.dg0 += correction;
            debug!("Corrected dG0 of {} by {}", reaction_id, correction);
            corrected += 1;
        }
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::redcom::generate_redcom_community_model;
    use crate::community::test_communities::toy_community;

    fn toy_dg0() -> Dg0Mapping {
        dg0_from_json_str(
            r#"{
                "S_to_A": {"dG0": 4, "uncertainty": 0},
                "A_to_B": {"dG0": -5, "uncertainty": 0},
                "B_to_C": {"dG0": -5, "uncertainty": 0},
                "C_to_P": {"dG0": 4}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parse_and_write() {
        let mapping = toy_dg0();
        assert_eq!(mapping.len(), 4);
        assert!((mapping["A_to_B"].dg0 + 5.).abs() < 1e-25);
        assert!((mapping["C_to_P"].uncertainty).abs() < 1e-25);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dG0.json");
        write_dg0_json(&mapping, &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"dG0\""));
        assert_eq!(read_dg0_json(&path).unwrap(), mapping);
    }

    #[test]
    fn invalid_data() {
        assert!(matches!(
            dg0_from_json_str(r#"{"R": {"uncertainty": 1}}"#),
            Err(ThermodynamicsError::SerdeJson(_))
        ));
        assert!(matches!(
            read_dg0_json("does/not/exist.json"),
            Err(ThermodynamicsError::Io(_))
        ));
    }

    #[test]
    fn species_expansion() {
        let expanded = expand_for_species(&toy_dg0(), &["species1", "species2"]);
        assert_eq!(expanded.len(), 8);
        assert_eq!(expanded.get_index(0).unwrap().0, "S_to_A_species1");
        assert_eq!(expanded.get_index(1).unwrap().0, "S_to_A_species2");
        assert!((expanded["C_to_P_species2"].dg0 - 4.).abs() < 1e-25);
    }

    #[test]
    fn exchange_entries() {
        let model = generate_redcom_community_model(&toy_community()).unwrap();
        let mut mapping = expand_for_species(&toy_dg0(), &["species1", "species2"]);
        // 5 mapped metabolites per species, S is excluded
        let added = add_species_exchange_entries(&mut mapping, &model, &["S"]);
        assert_eq!(added, 8);
        assert!(mapping.contains_key("EXCHG_species1_A_c_to_A"));
        assert!(!mapping.contains_key("EXCHG_species1_S_c_to_S"));
        assert!(mapping["EXCHG_species2_P_c_to_P"].dg0.abs() < 1e-25);
        assert_eq!(add_species_exchange_entries(&mut mapping, &model, &["S"]), 0);
    }

    #[test]
    fn membrane_transport() {
        let (c_j, h_j) = known_membrane_transport("ATPS4rpp_ecoli1").unwrap();
        assert_eq!((c_j, h_j), (4., 4.));
        assert!(known_membrane_transport("PGI").is_none());
        let expected = 4. * 0.10026 * -130. - 2.3 * 4. * 8.314e-3 * 298.15 * 0.4;
        assert!((membrane_correction(4., 4.) - expected).abs() < 1e-12);

        let mut mapping = dg0_from_json_str(
            r#"{"CYTBO3_4pp_ecoli": {"dG0": -10, "uncertainty": 0}, "PGI_ecoli": {"dG0": 2, "uncertainty": 0}}"#,
        )
        .unwrap();
        assert_eq!(correct_membrane_transport(&mut mapping), 1);
        assert!((mapping["CYTBO3_4pp_ecoli"].dg0 - (-10. + membrane_correction(-2.5, -2.5))).abs() < 1e-12);
        assert!((mapping["PGI_ecoli"].dg0 - 2.).abs() < 1e-25);
    }
}
