//! Module providing SBML IO for Models
//!
//! Models are written as SBML Level 3 Version 1 documents using the flux balance constraints
//! (FBC) package version 2. Metabolite, reaction and gene product ids are prefixed with `M_`,
//! `R_` and `G_` respectively, and flux bounds are stored as global parameters. The reader
//! understands the same subset, which is enough to round-trip a constraint based model.
use std::borrow::Cow;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::gene::{Gene, GprError, Gpr, GprOperation, GprOperatorType};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::objective::{Objective, ObjectiveSense};
use crate::metabolic_model::reaction::Reaction;

const SBML_NAMESPACE: &str = "http://www.sbml.org/sbml/level3/version1/core";
const FBC_NAMESPACE: &str = "http://www.sbml.org/sbml/level3/version1/fbc/version2";
const METABOLITE_PREFIX: &str = "M_";
const REACTION_PREFIX: &str = "R_";
const GENE_PREFIX: &str = "G_";
/// SBO term for flux bound parameters
const FLUX_BOUND_SBO: &str = "SBO:0000626";
const OBJECTIVE_ID: &str = "obj";

#[derive(Debug, Error)]
pub enum SbmlError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Unable to read or write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Written document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("GPR of reaction {0} uses `not`, which can not be expressed as a gene product association")]
    UnsupportedGpr(String),
    #[error("Empty `and`/`or` element in the gene product association of reaction {0}")]
    EmptyGpr(String),
    #[error("Invalid GPR: {0}")]
    InvalidGpr(#[from] GprError),
    #[error("Invalid numeric value `{value}` for attribute {attribute}")]
    InvalidNumber { attribute: String, value: String },
    #[error("Element {element} is missing the required attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },
    #[error("Flux bound of reaction {reaction} refers to unknown parameter {parameter}")]
    UnknownParameter { reaction: String, parameter: String },
    #[error("Document does not contain a model element")]
    MissingModel,
    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ModelError),
}

// region Values and Ids
/// Format a value the way SBML expects, with infinities written as `INF`/`-INF`
fn format_value(value: f64) -> String {
    if value.is_infinite() {
        if value > 0. {
            "INF".to_string()
        } else {
            "-INF".to_string()
        }
    } else {
        format!("{}", value)
    }
}

fn parse_value(attribute: &str, value: &str) -> Result<f64, SbmlError> {
    match value.trim().to_uppercase().as_str() {
        "INF" | "+INF" | "INFINITY" => Ok(f64::INFINITY),
        "-INF" | "-INFINITY" => Ok(f64::NEG_INFINITY),
        other => other.parse::<f64>().map_err(|_| SbmlError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }),
    }
}

fn strip_prefix<'a>(id: &'a str, prefix: &str) -> &'a str {
    id.strip_prefix(prefix).unwrap_or(id)
}
// endregion Values and Ids

// region Writing
impl Model {
    /// Write the model to an SBML file
    pub fn write_sbml<P: AsRef<Path>>(&self, path: P) -> Result<(), SbmlError> {
        let document = self.to_sbml_string()?;
        fs::write(path.as_ref(), document)?;
        info!("Wrote SBML model to {}", path.as_ref().display());
        Ok(())
    }

    /// Serialize the model into an SBML document
    ///
    /// # Returns
    /// The SBML document, or an [`SbmlError`] if the model contains something that
    /// can't be expressed in SBML FBC (e.g. a GPR using `not`)
    pub fn to_sbml_string(&self) -> Result<String, SbmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut sbml = BytesStart::new("sbml");
        sbml.push_attribute(("xmlns", SBML_NAMESPACE));
        sbml.push_attribute(("xmlns:fbc", FBC_NAMESPACE));
        sbml.push_attribute(("level", "3"));
        sbml.push_attribute(("version", "1"));
        sbml.push_attribute(("fbc:required", "false"));
        writer.write_event(Event::Start(sbml))?;

        let mut model_element = BytesStart::new("model");
        if let Some(ref id) = self.id {
            model_element.push_attribute(("id", id.as_str()));
        }
        if let Some(ref name) = self.name {
            model_element.push_attribute(("name", name.as_str()));
        }
        model_element.push_attribute(("fbc:strict", "true"));
        writer.write_event(Event::Start(model_element))?;

        self.write_compartments(&mut writer)?;
        self.write_species(&mut writer)?;
        let bound_ids = self.write_parameters(&mut writer)?;
        self.write_reactions(&mut writer, &bound_ids)?;
        self.write_objectives(&mut writer)?;
        self.write_gene_products(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("model")))?;
        writer.write_event(Event::End(BytesEnd::new("sbml")))?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_compartments(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), SbmlError> {
        // Compartments referenced by metabolites but not declared are still written
        let mut compartments = self.compartments.clone();
        for met in self.metabolites.values() {
            if let Some(ref compartment) = met.compartment {
                if !compartments.contains_key(compartment) {
                    compartments.insert(compartment.clone(), Compartment::new(compartment, None));
                }
            }
        }
        if compartments.is_empty() {
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("listOfCompartments")))?;
        for compartment in compartments.values() {
            let mut element = BytesStart::new("compartment");
            element.push_attribute(("id", compartment.id.as_str()));
            if let Some(ref name) = compartment.name {
                element.push_attribute(("name", name.as_str()));
            }
            element.push_attribute(("constant", "true"));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfCompartments")))?;
        Ok(())
    }

    fn write_species(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), SbmlError> {
        if self.metabolites.is_empty() {
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("listOfSpecies")))?;
        for met in self.metabolites.values() {
            let id = format!("{}{}", METABOLITE_PREFIX, met.id);
            let charge = met.charge.to_string();
            let mut element = BytesStart::new("species");
            element.push_attribute(("id", id.as_str()));
            if let Some(ref name) = met.name {
                element.push_attribute(("name", name.as_str()));
            }
            if let Some(ref compartment) = met.compartment {
                element.push_attribute(("compartment", compartment.as_str()));
            }
            element.push_attribute(("hasOnlySubstanceUnits", "false"));
            element.push_attribute(("boundaryCondition", "false"));
            element.push_attribute(("constant", "false"));
            element.push_attribute(("fbc:charge", charge.as_str()));
            if let Some(ref formula) = met.formula {
                element.push_attribute(("fbc:chemicalFormula", formula.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfSpecies")))?;
        Ok(())
    }

    /// Write the flux bound parameters, returning the (lower, upper) parameter ids of
    /// every reaction
    fn write_parameters(
        &self,
        writer: &mut Writer<Vec<u8>>,
    ) -> Result<IndexMap<String, (String, String)>, SbmlError> {
        let (default_lb, default_ub) = {
            let config = CONFIGURATION.read().unwrap();
            (config.lower_bound, config.upper_bound)
        };
        let mut parameters: IndexMap<String, f64> = IndexMap::new();
        parameters.insert("cobra_default_lb".to_string(), default_lb);
        parameters.insert("cobra_default_ub".to_string(), default_ub);
        parameters.insert("cobra_0_bound".to_string(), 0.);
        parameters.insert("minus_inf".to_string(), f64::NEG_INFINITY);
        parameters.insert("plus_inf".to_string(), f64::INFINITY);

        let mut bound_ids = IndexMap::new();
        for rxn in self.reactions.values() {
            let lower = Self::bound_parameter(&mut parameters, &rxn.id, "lower", rxn.lower_bound);
            let upper = Self::bound_parameter(&mut parameters, &rxn.id, "upper", rxn.upper_bound);
            bound_ids.insert(rxn.id.clone(), (lower, upper));
        }

        writer.write_event(Event::Start(BytesStart::new("listOfParameters")))?;
        for (id, value) in &parameters {
            let value = format_value(*value);
            let mut element = BytesStart::new("parameter");
            element.push_attribute(("sboTerm", FLUX_BOUND_SBO));
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("value", value.as_str()));
            element.push_attribute(("constant", "true"));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfParameters")))?;
        Ok(bound_ids)
    }

    /// Find a shared parameter holding `value`, or create a reaction specific one
    fn bound_parameter(
        parameters: &mut IndexMap<String, f64>,
        reaction_id: &str,
        side: &str,
        value: f64,
    ) -> String {
        // The five shared parameters are always the first entries
        if let Some((id, _)) = parameters.iter().take(5).find(|(_, v)| **v == value) {
            return id.clone();
        }
        let id = format!("{}{}_{}_bound", REACTION_PREFIX, reaction_id, side);
        parameters.insert(id.clone(), value);
        id
    }

    fn write_reactions(
        &self,
        writer: &mut Writer<Vec<u8>>,
        bound_ids: &IndexMap<String, (String, String)>,
    ) -> Result<(), SbmlError> {
        if self.reactions.is_empty() {
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("listOfReactions")))?;
        for rxn in self.reactions.values() {
            let id = format!("{}{}", REACTION_PREFIX, rxn.id);
            let mut element = BytesStart::new("reaction");
            element.push_attribute(("id", id.as_str()));
            if let Some(ref name) = rxn.name {
                element.push_attribute(("name", name.as_str()));
            }
            element.push_attribute(("reversible", if rxn.is_reversible() { "true" } else { "false" }));
            element.push_attribute(("fast", "false"));
            if let Some((lower, upper)) = bound_ids.get(&rxn.id) {
                element.push_attribute(("fbc:lowerFluxBound", lower.as_str()));
                element.push_attribute(("fbc:upperFluxBound", upper.as_str()));
            }
            writer.write_event(Event::Start(element))?;

            Self::write_species_references(writer, "listOfReactants", rxn.reactants())?;
            Self::write_species_references(writer, "listOfProducts", rxn.products())?;
            if let Some(ref gpr) = rxn.gpr {
                writer.write_event(Event::Start(BytesStart::new("fbc:geneProductAssociation")))?;
                write_gpr(writer, gpr, &rxn.id)?;
                writer.write_event(Event::End(BytesEnd::new("fbc:geneProductAssociation")))?;
            }

            writer.write_event(Event::End(BytesEnd::new("reaction")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfReactions")))?;
        Ok(())
    }

    fn write_species_references<'a>(
        writer: &mut Writer<Vec<u8>>,
        list: &str,
        references: impl Iterator<Item = (&'a String, &'a f64)>,
    ) -> Result<(), SbmlError> {
        let references: Vec<(&String, &f64)> = references.collect();
        if references.is_empty() {
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new(list)))?;
        for (met_id, coef) in references {
            let species = format!("{}{}", METABOLITE_PREFIX, met_id);
            let stoichiometry = format_value(coef.abs());
            let mut element = BytesStart::new("speciesReference");
            element.push_attribute(("species", species.as_str()));
            element.push_attribute(("stoichiometry", stoichiometry.as_str()));
            element.push_attribute(("constant", "true"));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new(list)))?;
        Ok(())
    }

    fn write_objectives(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), SbmlError> {
        if self.objective.is_empty() {
            return Ok(());
        }
        let mut list = BytesStart::new("fbc:listOfObjectives");
        list.push_attribute(("fbc:activeObjective", OBJECTIVE_ID));
        writer.write_event(Event::Start(list))?;
        let sense = self.objective.sense.to_string();
        let mut objective = BytesStart::new("fbc:objective");
        objective.push_attribute(("fbc:id", OBJECTIVE_ID));
        objective.push_attribute(("fbc:type", sense.as_str()));
        writer.write_event(Event::Start(objective))?;
        writer.write_event(Event::Start(BytesStart::new("fbc:listOfFluxObjectives")))?;
        for (rxn_id, coef) in &self.objective.coefficients {
            let reaction = format!("{}{}", REACTION_PREFIX, rxn_id);
            let coefficient = format_value(*coef);
            let mut element = BytesStart::new("fbc:fluxObjective");
            element.push_attribute(("fbc:reaction", reaction.as_str()));
            element.push_attribute(("fbc:coefficient", coefficient.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("fbc:listOfFluxObjectives")))?;
        writer.write_event(Event::End(BytesEnd::new("fbc:objective")))?;
        writer.write_event(Event::End(BytesEnd::new("fbc:listOfObjectives")))?;
        Ok(())
    }

    fn write_gene_products(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), SbmlError> {
        if self.genes.is_empty() {
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("fbc:listOfGeneProducts")))?;
        for gene in self.genes.values() {
            let id = format!("{}{}", GENE_PREFIX, gene.id);
            let mut element = BytesStart::new("fbc:geneProduct");
            element.push_attribute(("fbc:id", id.as_str()));
            element.push_attribute(("fbc:label", gene.id.as_str()));
            if let Some(ref name) = gene.name {
                element.push_attribute(("fbc:name", name.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("fbc:listOfGeneProducts")))?;
        Ok(())
    }
}

/// Write a GPR as nested `fbc:and`/`fbc:or` elements, flattening chains of the same operator
fn write_gpr(writer: &mut Writer<Vec<u8>>, gpr: &Gpr, reaction_id: &str) -> Result<(), SbmlError> {
    match gpr {
        Gpr::GeneNode(gene_id) => {
            let product = format!("{}{}", GENE_PREFIX, gene_id);
            let mut element = BytesStart::new("fbc:geneProductRef");
            element.push_attribute(("fbc:geneProduct", product.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        Gpr::Operation(GprOperation::Not { .. }) => {
            return Err(SbmlError::UnsupportedGpr(reaction_id.to_string()))
        }
        Gpr::Operation(op) => {
            let (tag, is_and) = match op {
                GprOperation::And { .. } => ("fbc:and", true),
                _ => ("fbc:or", false),
            };
            let mut operands = Vec::new();
            flatten_operands(gpr, is_and, &mut operands);
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            for operand in operands {
                write_gpr(writer, operand, reaction_id)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

fn flatten_operands<'a>(gpr: &'a Gpr, is_and: bool, operands: &mut Vec<&'a Gpr>) {
    match gpr {
        Gpr::Operation(GprOperation::And { left, right }) if is_and => {
            flatten_operands(left, is_and, operands);
            flatten_operands(right, is_and, operands);
        }
        Gpr::Operation(GprOperation::Or { left, right }) if !is_and => {
            flatten_operands(left, is_and, operands);
            flatten_operands(right, is_and, operands);
        }
        other => operands.push(other),
    }
}
// endregion Writing

// region Reading
#[derive(Clone, Copy, PartialEq)]
enum Side {
    Reactants,
    Products,
}

#[derive(Clone, Copy, PartialEq)]
enum Junction {
    Association,
    And,
    Or,
}

/// A reaction whose flux bounds still refer to parameter ids
struct PendingReaction {
    reaction: Reaction,
    lower_parameter: Option<String>,
    upper_parameter: Option<String>,
}

/// Event driven state while reading an SBML document
struct SbmlReader {
    model: Option<Model>,
    parameters: IndexMap<String, f64>,
    reactions: Vec<PendingReaction>,
    side: Option<Side>,
    gpr_stack: Vec<(Junction, Vec<Gpr>)>,
    objectives: IndexMap<String, Objective>,
    active_objective: Option<String>,
    current_objective: Option<String>,
    /// Gene product id to gene id (label)
    gene_labels: IndexMap<String, String>,
}

fn attributes(element: &BytesStart) -> Result<IndexMap<String, String>, SbmlError> {
    let mut attrs = IndexMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value: Cow<str> = attr.unescape_value()?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}

fn required(
    attrs: &IndexMap<String, String>,
    element: &str,
    attribute: &str,
) -> Result<String, SbmlError> {
    attrs
        .get(attribute)
        .cloned()
        .ok_or_else(|| SbmlError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        })
}

impl SbmlReader {
    fn new() -> Self {
        SbmlReader {
            model: None,
            parameters: IndexMap::new(),
            reactions: Vec::new(),
            side: None,
            gpr_stack: Vec::new(),
            objectives: IndexMap::new(),
            active_objective: None,
            current_objective: None,
            gene_labels: IndexMap::new(),
        }
    }

    fn model_mut(&mut self) -> Result<&mut Model, SbmlError> {
        self.model.as_mut().ok_or(SbmlError::MissingModel)
    }

    fn current_reaction_id(&self) -> String {
        self.reactions
            .last()
            .map(|p| p.reaction.id.clone())
            .unwrap_or_default()
    }

    fn start(&mut self, element: &BytesStart) -> Result<(), SbmlError> {
        let local_name = element.local_name();
        let name = String::from_utf8_lossy(local_name.as_ref()).into_owned();
        match name.as_str() {
            "model" => {
                let attrs = attributes(element)?;
                let mut model = Model::new_empty();
                model.id = attrs.get("id").cloned();
                model.name = attrs.get("name").cloned();
                self.model = Some(model);
            }
            "compartment" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let compartment = Compartment::new(&id, attrs.get("name").map(|n| n.as_str()));
                self.model_mut()?.add_compartment(compartment);
            }
            "species" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let mut met = Metabolite::new(
                    strip_prefix(&id, METABOLITE_PREFIX),
                    attrs.get("name").map(|n| n.as_str()),
                    attrs.get("compartment").map(|c| c.as_str()),
                );
                if let Some(charge) = attrs.get("charge") {
                    met.charge = parse_value("charge", charge)? as i32;
                }
                met.formula = attrs.get("chemicalFormula").cloned();
                self.model_mut()?.add_metabolite(met)?;
            }
            "parameter" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let value = match attrs.get("value") {
                    Some(value) => parse_value("value", value)?,
                    None => f64::NAN,
                };
                self.parameters.insert(id, value);
            }
            "reaction" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let mut reaction = Reaction::new(
                    strip_prefix(&id, REACTION_PREFIX),
                    attrs.get("name").map(|n| n.as_str()),
                    0.,
                    0.,
                );
                // Used when the reaction has no flux bound parameters
                let (default_lb, default_ub) = {
                    let config = CONFIGURATION.read().unwrap();
                    (config.lower_bound, config.upper_bound)
                };
                let reversible = attrs.get("reversible").map(|r| r == "true").unwrap_or(true);
                reaction.lower_bound = if reversible { default_lb } else { 0. };
                reaction.upper_bound = default_ub;
                self.reactions.push(PendingReaction {
                    reaction,
                    lower_parameter: attrs.get("lowerFluxBound").cloned(),
                    upper_parameter: attrs.get("upperFluxBound").cloned(),
                });
            }
            "listOfReactants" => self.side = Some(Side::Reactants),
            "listOfProducts" => self.side = Some(Side::Products),
            "speciesReference" => {
                let attrs = attributes(element)?;
                let species = required(&attrs, &name, "species")?;
                let stoichiometry = match attrs.get("stoichiometry") {
                    Some(value) => parse_value("stoichiometry", value)?,
                    None => 1.,
                };
                let coefficient = match self.side {
                    Some(Side::Reactants) => -stoichiometry,
                    _ => stoichiometry,
                };
                if let Some(pending) = self.reactions.last_mut() {
                    pending
                        .reaction
                        .add_metabolite(strip_prefix(&species, METABOLITE_PREFIX), coefficient);
                }
            }
            "geneProductAssociation" => self.gpr_stack.push((Junction::Association, Vec::new())),
            // MathML uses the same element names, only gene product associations matter here
            "and" if !self.gpr_stack.is_empty() => self.gpr_stack.push((Junction::And, Vec::new())),
            "or" if !self.gpr_stack.is_empty() => self.gpr_stack.push((Junction::Or, Vec::new())),
            "not" if !self.gpr_stack.is_empty() => {
                return Err(SbmlError::UnsupportedGpr(self.current_reaction_id()))
            }
            "geneProductRef" => {
                let attrs = attributes(element)?;
                let product = required(&attrs, &name, "geneProduct")?;
                if let Some((_, children)) = self.gpr_stack.last_mut() {
                    children.push(Gpr::GeneNode(product));
                }
            }
            "listOfObjectives" => {
                let attrs = attributes(element)?;
                self.active_objective = attrs.get("activeObjective").cloned();
            }
            "objective" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let sense = match attrs.get("type").map(|t| t.as_str()) {
                    Some("minimize") => ObjectiveSense::Minimize,
                    _ => ObjectiveSense::Maximize,
                };
                self.objectives.insert(id.clone(), Objective::new(sense));
                self.current_objective = Some(id);
            }
            "fluxObjective" => {
                let attrs = attributes(element)?;
                let reaction = required(&attrs, &name, "reaction")?;
                let coefficient = match attrs.get("coefficient") {
                    Some(value) => parse_value("coefficient", value)?,
                    None => 1.,
                };
                if let Some(objective) = self
                    .current_objective
                    .as_ref()
                    .and_then(|id| self.objectives.get_mut(id))
                {
                    objective.coefficients.insert(
                        strip_prefix(&reaction, REACTION_PREFIX).to_string(),
                        coefficient,
                    );
                }
            }
            "geneProduct" => {
                let attrs = attributes(element)?;
                let id = required(&attrs, &name, "id")?;
                let label = attrs
                    .get("label")
                    .cloned()
                    .unwrap_or_else(|| strip_prefix(&id, GENE_PREFIX).to_string());
                let mut gene = Gene::new_id_only(&label);
                gene.name = attrs.get("name").cloned();
                self.gene_labels.insert(id, label);
                self.model_mut()?.add_gene(gene);
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), SbmlError> {
        match name {
            b"listOfReactants" | b"listOfProducts" => self.side = None,
            b"and" | b"or"
                if matches!(
                    self.gpr_stack.last(),
                    Some((Junction::And | Junction::Or, _))
                ) =>
            {
                let reaction_id = self.current_reaction_id();
                let (junction, children) = self
                    .gpr_stack
                    .pop()
                    .ok_or_else(|| SbmlError::EmptyGpr(reaction_id.clone()))?;
                let mut operands = children.into_iter();
                let first = operands
                    .next()
                    .ok_or_else(|| SbmlError::EmptyGpr(reaction_id.clone()))?;
                let node = operands.try_fold(first, |left, right| {
                    let operator = match junction {
                        Junction::And => GprOperatorType::And,
                        _ => GprOperatorType::Or,
                    };
                    Gpr::new_binary_operation(left, operator, right)
                })?;
                match self.gpr_stack.last_mut() {
                    Some((_, parent)) => parent.push(node),
                    None => return Err(SbmlError::EmptyGpr(reaction_id)),
                }
            }
            b"geneProductAssociation" => {
                if let Some((_, mut children)) = self.gpr_stack.pop() {
                    if let Some(pending) = self.reactions.last_mut() {
                        pending.reaction.gpr = children.pop();
                    }
                }
            }
            b"objective" => self.current_objective = None,
            _ => {}
        }
        Ok(())
    }

    /// Resolve flux bounds and gene ids, and assemble the final model
    fn finish(self) -> Result<Model, SbmlError> {
        let mut model = self.model.ok_or(SbmlError::MissingModel)?;
        for pending in self.reactions {
            let mut reaction = pending.reaction;
            if let Some(ref parameter) = pending.lower_parameter {
                reaction.lower_bound = Self::resolve(&self.parameters, &reaction.id, parameter)?;
            }
            if let Some(ref parameter) = pending.upper_parameter {
                reaction.upper_bound = Self::resolve(&self.parameters, &reaction.id, parameter)?;
            }
            reaction.gpr = reaction
                .gpr
                .map(|gpr| relabel_genes(gpr, &self.gene_labels));
            model.add_reaction(reaction)?;
        }
        let objective_id = self
            .active_objective
            .or_else(|| self.objectives.keys().next().cloned());
        if let Some(objective) = objective_id.and_then(|id| self.objectives.get(&id).cloned()) {
            model.objective = objective;
        }
        debug!(
            "Read SBML model with {} metabolites and {} reactions",
            model.metabolites.len(),
            model.reactions.len()
        );
        Ok(model)
    }

    fn resolve(
        parameters: &IndexMap<String, f64>,
        reaction_id: &str,
        parameter: &str,
    ) -> Result<f64, SbmlError> {
        parameters
            .get(parameter)
            .copied()
            .filter(|value| !value.is_nan())
            .ok_or_else(|| SbmlError::UnknownParameter {
                reaction: reaction_id.to_string(),
                parameter: parameter.to_string(),
            })
    }
}

/// Replace gene product ids in a GPR with the gene ids they are labelled with
fn relabel_genes(gpr: Gpr, labels: &IndexMap<String, String>) -> Gpr {
    match gpr {
        Gpr::GeneNode(product) => match labels.get(&product) {
            Some(label) => Gpr::GeneNode(label.clone()),
            None => Gpr::GeneNode(strip_prefix(&product, GENE_PREFIX).to_string()),
        },
        Gpr::Operation(GprOperation::And { left, right }) => Gpr::Operation(GprOperation::And {
            left: Box::new(relabel_genes(*left, labels)),
            right: Box::new(relabel_genes(*right, labels)),
        }),
        Gpr::Operation(GprOperation::Or { left, right }) => Gpr::Operation(GprOperation::Or {
            left: Box::new(relabel_genes(*left, labels)),
            right: Box::new(relabel_genes(*right, labels)),
        }),
        Gpr::Operation(GprOperation::Not { val }) => Gpr::Operation(GprOperation::Not {
            val: Box::new(relabel_genes(*val, labels)),
        }),
    }
}

impl Model {
    /// Read a model from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let document = fs::read_to_string(path)?;
        Model::from_sbml_str(&document)
    }

    /// Parse a model from an SBML document
    ///
    /// # Note:
    /// Only the elements needed for constraint based models are read, everything else
    /// (units, notes, annotations, groups) is skipped.
    pub fn from_sbml_str(document: &str) -> Result<Model, SbmlError> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);
        let mut state = SbmlReader::new();
        loop {
            match reader.read_event()? {
                Event::Start(element) => state.start(&element)?,
                Event::Empty(element) => {
                    state.start(&element)?;
                    state.end(element.local_name().as_ref())?;
                }
                Event::End(element) => state.end(element.local_name().as_ref())?,
                Event::Eof => break,
                _ => {}
            }
        }
        if state.model.is_none() {
            warn!("SBML document has no model element");
        }
        state.finish()
    }
}

// endregion Reading

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GprOperatorType;
    use crate::test_models::toy_model;

    const MINIMAL_SBML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level3/version1/core" xmlns:fbc="http://www.sbml.org/sbml/level3/version1/fbc/version2" level="3" version="1" fbc:required="false">
  <model id="mini" fbc:strict="true">
    <listOfCompartments>
      <compartment id="c" name="cytosol" constant="true"/>
    </listOfCompartments>
    <listOfSpecies>
      <species id="M_glc__D_c" name="D-Glucose" compartment="c" fbc:charge="0" fbc:chemicalFormula="C6H12O6" hasOnlySubstanceUnits="false" boundaryCondition="false" constant="false"/>
      <species id="M_g6p_c" compartment="c" fbc:charge="-2" hasOnlySubstanceUnits="false" boundaryCondition="false" constant="false"/>
    </listOfSpecies>
    <listOfParameters>
      <parameter id="cobra_0_bound" value="0" constant="true"/>
      <parameter id="plus_inf" value="INF" constant="true"/>
      <parameter id="R_HEX1_upper_bound" value="12.5" constant="true"/>
    </listOfParameters>
    <listOfReactions>
      <reaction id="R_HEX1" reversible="false" fast="false" fbc:lowerFluxBound="cobra_0_bound" fbc:upperFluxBound="R_HEX1_upper_bound">
        <listOfReactants>
          <speciesReference species="M_glc__D_c" stoichiometry="1" constant="true"/>
        </listOfReactants>
        <listOfProducts>
          <speciesReference species="M_g6p_c" stoichiometry="1" constant="true"/>
        </listOfProducts>
        <fbc:geneProductAssociation>
          <fbc:or>
            <fbc:geneProductRef fbc:geneProduct="G_b2388"/>
            <fbc:and>
              <fbc:geneProductRef fbc:geneProduct="G_b1"/>
              <fbc:geneProductRef fbc:geneProduct="G_b2"/>
            </fbc:and>
          </fbc:or>
        </fbc:geneProductAssociation>
      </reaction>
      <reaction id="R_SINK" reversible="false" fast="false" fbc:lowerFluxBound="cobra_0_bound" fbc:upperFluxBound="plus_inf">
        <listOfReactants>
          <speciesReference species="M_g6p_c" stoichiometry="2" constant="true"/>
        </listOfReactants>
      </reaction>
    </listOfReactions>
    <fbc:listOfObjectives fbc:activeObjective="obj">
      <fbc:objective fbc:id="obj" fbc:type="minimize">
        <fbc:listOfFluxObjectives>
          <fbc:fluxObjective fbc:reaction="R_SINK" fbc:coefficient="1"/>
        </fbc:listOfFluxObjectives>
      </fbc:objective>
    </fbc:listOfObjectives>
    <fbc:listOfGeneProducts>
      <fbc:geneProduct fbc:id="G_b2388" fbc:label="b2388" fbc:name="glk"/>
      <fbc:geneProduct fbc:id="G_b1" fbc:label="b1"/>
      <fbc:geneProduct fbc:id="G_b2" fbc:label="b2"/>
    </fbc:listOfGeneProducts>
  </model>
</sbml>"#;

    #[test]
    fn read_minimal_document() {
        let model = Model::from_sbml_str(MINIMAL_SBML).unwrap();
        assert_eq!(model.id.as_deref(), Some("mini"));
        let glc = model.metabolite("glc__D_c").unwrap();
        assert_eq!(glc.formula.as_deref(), Some("C6H12O6"));
        assert_eq!(model.metabolite("g6p_c").unwrap().charge, -2);

        let hex = model.reaction("HEX1").unwrap();
        assert!((hex.lower_bound - 0.).abs() < 1e-25);
        assert!((hex.upper_bound - 12.5).abs() < 1e-25);
        assert!((hex.metabolites["glc__D_c"] + 1.).abs() < 1e-25);
        assert_eq!(
            hex.gpr.as_ref().unwrap().to_string_id(),
            "(b2388 or (b1 and b2))"
        );
        assert_eq!(model.genes["b2388"].name.as_deref(), Some("glk"));

        let sink = model.reaction("SINK").unwrap();
        assert!(sink.upper_bound.is_infinite());
        assert!((sink.metabolites["g6p_c"] + 2.).abs() < 1e-25);
        assert_eq!(model.objective.sense, ObjectiveSense::Minimize);
        assert_eq!(model.objective.expression(), "1.0*SINK");
    }

    #[test]
    fn written_bounds_use_shared_parameters() {
        let mut model = toy_model();
        model.reaction_mut("EX_A").unwrap().upper_bound = 10.;
        let document = model.to_sbml_string().unwrap();
        assert!(document.contains(r#"<parameter sboTerm="SBO:0000626" id="plus_inf" value="INF" constant="true"/>"#));
        assert!(document.contains(r#"id="R_EX_A_upper_bound" value="10""#));
        assert!(document.contains(r#"fbc:lowerFluxBound="cobra_0_bound" fbc:upperFluxBound="plus_inf""#));
        assert!(document.contains(r#"<species id="M_S_c" compartment="c""#));
        assert!(document.contains(r#"fbc:reaction="R_EX_P""#));
    }

    #[test]
    fn roundtrip() {
        let mut model = toy_model();
        model.reaction_mut("A_to_B").unwrap().gpr = Some(
            Gpr::new_binary_operation(
                Gpr::new_gene_node("g1"),
                GprOperatorType::And,
                Gpr::new_binary_operation(
                    Gpr::new_gene_node("g2"),
                    GprOperatorType::And,
                    Gpr::new_gene_node("g3"),
                )
                .unwrap(),
            )
            .unwrap(),
        );
        model.reaction_mut("B_to_C").unwrap().lower_bound = -1000.;
        let document = model.to_sbml_string().unwrap();
        let read = Model::from_sbml_str(&document).unwrap();
        assert_eq!(read.metabolites, model.metabolites);
        assert_eq!(read.compartments, model.compartments);
        assert_eq!(read.objective, model.objective);
        for (id, rxn) in &model.reactions {
            let other = read.reaction(id).unwrap();
            assert_eq!(other.metabolites, rxn.metabolites);
            assert_eq!(other.lower_bound, rxn.lower_bound);
            assert_eq!(other.upper_bound, rxn.upper_bound);
        }
        // Chains of `and` are flattened on writing and rebuilt left to right on reading
        assert_eq!(
            read.reaction("A_to_B").unwrap().gpr.as_ref().unwrap().genes(),
            vec!["g1", "g2", "g3"]
        );
        assert!(read.reaction("B_to_C").unwrap().is_reversible());
    }

    #[test]
    fn not_is_rejected() {
        let mut model = toy_model();
        model.reaction_mut("A_to_B").unwrap().gpr = Some(
            Gpr::new_unary_operation(GprOperatorType::Not, Gpr::new_gene_node("g1")).unwrap(),
        );
        assert!(matches!(
            model.to_sbml_string(),
            Err(SbmlError::UnsupportedGpr(id)) if id == "A_to_B"
        ));
    }

    #[test]
    fn unknown_parameter() {
        let document = MINIMAL_SBML.replace(
            r#"fbc:upperFluxBound="plus_inf""#,
            r#"fbc:upperFluxBound="missing""#,
        );
        assert!(matches!(
            Model::from_sbml_str(&document),
            Err(SbmlError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy_model.xml");
        toy_model().write_sbml(&path).unwrap();
        let read = Model::read_sbml(&path).unwrap();
        assert_eq!(read.reactions.len(), 6);
    }
}
