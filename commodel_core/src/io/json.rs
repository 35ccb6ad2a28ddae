//! Module providing JSON IO for Models, compatible with the cobrapy JSON format
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::objective::{Objective, ObjectiveSense};
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    /// `max` or `min`, missing means `max`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_direction: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    compartment: Option<String>,
    #[serde(default)]
    charge: Option<i32>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default)]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    #[serde(with = "json_bound")]
    lower_bound: f64,
    #[serde(with = "json_bound")]
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

/// Flux bounds are written as numbers, with infinite values written as `"inf"`/`"-inf"`
mod json_bound {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(if *value > 0. { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBound {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match RawBound::deserialize(deserializer)? {
            RawBound::Number(value) => Ok(value),
            RawBound::Text(text) => match text.to_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse::<f64>().map_err(D::Error::custom),
            },
        }
    }
}
// endregion JSON Model

// region Conversions
/// Notes and annotations are kept as their JSON text
fn value_to_text(value: Option<Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn text_to_value(text: &Option<String>) -> Option<Value> {
    text.as_ref()
        .map(|t| serde_json::from_str(t).unwrap_or_else(|_| Value::String(t.clone())))
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: value_to_text(g.notes),
            annotation: value_to_text(g.annotation),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: value_to_text(m.notes),
            annotation: value_to_text(m.annotation),
        }
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            notes: text_to_value(&g.notes),
            annotation: text_to_value(&g.annotation),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: Some(m.charge),
            formula: m.formula.clone(),
            notes: text_to_value(&m.notes),
            annotation: text_to_value(&m.annotation),
        }
    }
}

impl Model {
    /// Read a model from a cobrapy style JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = fs::read_to_string(path)?;
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a cobrapy style JSON string
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = serde_json::from_str::<JsonModel>(model_str)?;
        Model::from_json(json_model)
    }

    /// Write the model to a cobrapy style JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path.as_ref(), model_string)?;
        info!("Wrote model to {}", path.as_ref().display());
        Ok(())
    }

    /// Serialize the model into a cobrapy style JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        model.id = json_model.id;
        model.name = json_model.name;
        model.version = json_model.version;
        if let Some(compartments) = json_model.compartments {
            for (id, name) in compartments {
                model.add_compartment(Compartment::new(&id, Some(&name)));
            }
        }
        // Start by converting the genes and metabolites using the From methods
        json_model.genes.into_iter().for_each(|g| {
            model.add_gene(Gene::from(g));
        });
        for met in json_model.metabolites {
            model.add_metabolite(Metabolite::from(met))?;
        }
        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way
        */
        let mut objective = match json_model.objective_direction.as_deref() {
            Some("min") => Objective::new(ObjectiveSense::Minimize),
            _ => Objective::new(ObjectiveSense::Maximize),
        };
        for rxn in json_model.reactions {
            let gpr = parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?;
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(value_to_text(rxn.notes))
                .annotation(value_to_text(rxn.annotation))
                .build()?;
            model.add_reaction(new_reaction)?;
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0. {
                    objective.coefficients.insert(rxn.id, coef);
                }
            }
        }
        model.objective = objective;
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let json_reactions: Vec<JsonReaction> = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r
                    .gpr
                    .as_ref()
                    .map(|rule| rule.to_string_id())
                    .unwrap_or_default(),
                objective_coefficient: self.objective.coefficients.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: text_to_value(&r.notes),
                annotation: text_to_value(&r.annotation),
            })
            .collect();
        let compartments: IndexMap<String, String> = self
            .compartments
            .values()
            .map(|c| (c.id.clone(), c.name.clone().unwrap_or_default()))
            .collect();

        JsonModel {
            metabolites: self.metabolites.values().map(JsonMetabolite::from).collect(),
            reactions: json_reactions,
            genes: self.genes.values().map(JsonGene::from).collect(),
            id: self.id.clone(),
            name: self.name.clone(),
            compartments: Some(compartments),
            version: self.version.clone(),
            objective_direction: Some(
                match self.objective.sense {
                    ObjectiveSense::Maximize => "max",
                    ObjectiveSense::Minimize => "min",
                }
                .to_string(),
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a GPR rule during conversion from JSON: {0}")]
    GprParserError(#[from] GprParseError),
    #[error("Unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("Serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Unable to read or write file: {0}")]
    Io(#[from] std::io::Error),
}

// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{
"original_bigg_ids":[
"glc_D_e"
]
},
"annotation":{
"bigg.metabolite":[
"glc__D"
],
"kegg.compound":[
"C00031"
],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        let model_met = Metabolite::from(met);
        assert_eq!(model_met.id, "glc__D_e");
        assert_eq!(model_met.name.clone().unwrap(), "D-Glucose");
        assert_eq!(model_met.compartment.clone().unwrap(), "e");
        assert_eq!(model_met.charge, 0);
        assert_eq!(model_met.formula.clone().unwrap(), "C6H12O6");
        // Annotations survive as JSON
        let back = JsonMetabolite::from(&model_met);
        assert_eq!(back.annotation.unwrap()["sbo"], "SBO:0000247");
    }

    #[test]
    fn json_reaction_bounds() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{
"atp_c":-1.0,
"f6p_c":-1.0,
"adp_c":1.0,
"fdp_c":1.0,
"h_c":1.0
},
"lower_bound":0,
"upper_bound":"inf",
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis"
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert!((reaction.lower_bound - 0.0).abs() < 1e-25);
        assert!(reaction.upper_bound.is_infinite() && reaction.upper_bound > 0.);
        assert_eq!(
            reaction.metabolites.keys().collect::<Vec<_>>(),
            vec!["atp_c", "f6p_c", "adp_c", "fdp_c", "h_c"]
        );
        let text = serde_json::to_string(&reaction).unwrap();
        assert!(text.contains(r#""upper_bound":"inf""#));
        assert!(text.contains(r#""lower_bound":0.0"#));
    }

    #[test]
    fn json_gene() {
        let data = r#"{"id":"b1241","name":"adhE","notes":{"original_bigg_ids":["b1241"]}}"#;
        let gene: JsonGene = serde_json::from_str(data).unwrap();
        let gene = Gene::from(gene);
        assert_eq!(gene.id, "b1241");
        assert_eq!(gene.name.unwrap(), "adhE");
        assert_eq!(gene.notes.unwrap(), r#"{"original_bigg_ids":["b1241"]}"#);
    }
}
