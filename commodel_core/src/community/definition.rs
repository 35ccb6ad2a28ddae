//! JSON files describing a community through the paths of its species models
//!
//! ```json
//! {
//!   "single_models": [
//!     {
//!       "model_path": "ecoli.xml",
//!       "species_abbreviation": "ecoli",
//!       "objective_reaction_id": "BIOMASS_Ec_iML1515_core_75p37M",
//!       "input_metabolite_ids": ["glc__D_e"],
//!       "output_metabolite_ids": ["ac_e"],
//!       "model_metabolite_to_exchange_id_mapping": {"glc__D_e": "glc__D", "ac_e": "ac"}
//!     }
//!   ],
//!   "input_metabolite_ids": ["glc__D"],
//!   "output_metabolite_ids": ["ac"]
//! }
//! ```
//! Relative model paths are resolved against the directory of the definition file.
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::community::{Community, CommunityError, SingleModel};
use crate::configuration::CONFIGURATION;
use crate::io::read_model;

fn default_species_exchange_prefix() -> String {
    "EX_".to_string()
}

fn default_exchange_compartment_id() -> String {
    CONFIGURATION.read().unwrap().exchange_compartment_id.clone()
}

fn default_community_exchange_prefix() -> String {
    CONFIGURATION.read().unwrap().community_exchange_prefix.clone()
}

/// A species of a [`CommunityDefinition`], see [`SingleModel`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleModelDefinition {
    /// Path of the species' SBML (`.xml`/`.sbml`) or JSON (`.json`) model
    pub model_path: PathBuf,
    pub species_abbreviation: String,
    pub objective_reaction_id: String,
    #[serde(default = "default_species_exchange_prefix")]
    pub exchange_reaction_id_prefix: String,
    #[serde(default)]
    pub input_metabolite_ids: Vec<String>,
    #[serde(default)]
    pub output_metabolite_ids: Vec<String>,
    #[serde(default)]
    pub model_metabolite_to_exchange_id_mapping: IndexMap<String, String>,
}

/// A community whose species models still have to be read, see [`Community`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunityDefinition {
    pub single_models: Vec<SingleModelDefinition>,
    #[serde(default = "default_exchange_compartment_id")]
    pub exchange_compartment_id: String,
    #[serde(default = "default_community_exchange_prefix")]
    pub exchange_reaction_id_prefix: String,
    #[serde(default)]
    pub input_metabolite_ids: Vec<String>,
    #[serde(default)]
    pub output_metabolite_ids: Vec<String>,
}

impl CommunityDefinition {
    /// Read a community definition from a JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<CommunityDefinition, CommunityError> {
        let definition_str = fs::read_to_string(path)?;
        Self::from_json_str(&definition_str)
    }

    /// Parse a community definition from a JSON string
    pub fn from_json_str(definition_str: &str) -> Result<CommunityDefinition, CommunityError> {
        Ok(serde_json::from_str(definition_str)?)
    }

    /// Read every species model and build the [`Community`]
    ///
    /// # Parameters
    /// - `base_dir`: Directory relative model paths are resolved against
    pub fn load<P: AsRef<Path>>(&self, base_dir: P) -> Result<Community, CommunityError> {
        let base_dir = base_dir.as_ref();
        let single_models = self
            .single_models
            .iter()
            .map(|definition| definition.load(base_dir))
            .collect::<Result<Vec<SingleModel>, CommunityError>>()?;
        Ok(Community {
            single_models,
            exchange_compartment_id: self.exchange_compartment_id.clone(),
            exchange_reaction_id_prefix: self.exchange_reaction_id_prefix.clone(),
            input_metabolite_ids: self.input_metabolite_ids.clone(),
            output_metabolite_ids: self.output_metabolite_ids.clone(),
        })
    }
}

impl SingleModelDefinition {
    fn load(&self, base_dir: &Path) -> Result<SingleModel, CommunityError> {
        let path = if self.model_path.is_absolute() {
            self.model_path.clone()
        } else {
            base_dir.join(&self.model_path)
        };
        let model = read_model(&path)?;
        info!(
            "Read model of species {} from {}",
            self.species_abbreviation,
            path.display()
        );
        Ok(SingleModel {
            model,
            species_abbreviation: self.species_abbreviation.clone(),
            objective_reaction_id: self.objective_reaction_id.clone(),
            exchange_reaction_id_prefix: self.exchange_reaction_id_prefix.clone(),
            input_metabolite_ids: self.input_metabolite_ids.clone(),
            output_metabolite_ids: self.output_metabolite_ids.clone(),
            model_metabolite_to_exchange_id_mapping: self
                .model_metabolite_to_exchange_id_mapping
                .clone(),
        })
    }
}

/// Read a community definition file along with all of its species models
///
/// Relative model paths are resolved against the directory containing `path`.
pub fn load_community<P: AsRef<Path>>(path: P) -> Result<Community, CommunityError> {
    let path = path.as_ref();
    let definition = CommunityDefinition::read_json(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    definition.load(base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::toy_model;

    const DEFINITION: &str = r#"{
        "single_models": [
            {
                "model_path": "toy1.json",
                "species_abbreviation": "species1",
                "objective_reaction_id": "C_to_P",
                "input_metabolite_ids": ["S_c"],
                "output_metabolite_ids": ["P_c"],
                "model_metabolite_to_exchange_id_mapping": {"S_c": "S", "P_c": "P"}
            },
            {
                "model_path": "toy2.xml",
                "species_abbreviation": "species2",
                "objective_reaction_id": "C_to_P",
                "exchange_reaction_id_prefix": "EX_",
                "input_metabolite_ids": ["S_c"],
                "model_metabolite_to_exchange_id_mapping": {"S_c": "S"}
            }
        ],
        "input_metabolite_ids": ["S"],
        "output_metabolite_ids": ["P"]
    }"#;

    #[test]
    fn parse_definition() {
        let definition = CommunityDefinition::from_json_str(DEFINITION).unwrap();
        assert_eq!(definition.single_models.len(), 2);
        assert_eq!(definition.exchange_compartment_id, "exchg");
        assert_eq!(definition.exchange_reaction_id_prefix, "EX_C_");
        let first = &definition.single_models[0];
        assert_eq!(first.exchange_reaction_id_prefix, "EX_");
        assert_eq!(first.model_metabolite_to_exchange_id_mapping["P_c"], "P");
        assert!(definition.single_models[1].output_metabolite_ids.is_empty());
    }

    #[test]
    fn invalid_definition() {
        assert!(matches!(
            CommunityDefinition::from_json_str(r#"{"single_models": [{"model_path": "a.xml"}]}"#),
            Err(CommunityError::Definition(_))
        ));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let model = toy_model();
        model.write_json(dir.path().join("toy1.json")).unwrap();
        model.write_sbml(dir.path().join("toy2.xml")).unwrap();
        let definition_path = dir.path().join("community.json");
        fs::write(&definition_path, DEFINITION).unwrap();

        let community = load_community(&definition_path).unwrap();
        assert_eq!(community.single_models.len(), 2);
        assert_eq!(community.single_models[0].model.reactions.len(), 6);
        assert_eq!(community.single_models[1].model.reactions.len(), 6);
        assert_eq!(community.single_models[1].species_abbreviation, "species2");
        assert_eq!(community.input_metabolite_ids, vec!["S"]);
    }

    #[test]
    fn missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let definition = CommunityDefinition::from_json_str(DEFINITION).unwrap();
        assert!(matches!(
            definition.load(dir.path()),
            Err(CommunityError::ModelIo(_))
        ));
    }
}
