//! This module provides the Model struct for representing an entire metabolic model
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::objective::{Objective, ObjectiveSense};
use crate::metabolic_model::reaction::Reaction;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

/// Represents a stoichiometric metabolic model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
    /// Compartments in the model, keyed by compartment id
    pub compartments: IndexMap<String, Compartment>,
    /// Map of metabolite ids to Metabolites
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to Reactions
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Genes
    pub genes: IndexMap<String, Gene>,
    /// Objective of the model
    pub objective: Objective,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Reaction {0} is already present in the model")]
    DuplicateReaction(String),
    #[error("Metabolite {0} is already present in the model")]
    DuplicateMetabolite(String),
    #[error("Reaction {0} not found in the model")]
    ReactionNotFound(String),
    #[error("Metabolite {0} not found in the model")]
    MetaboliteNotFound(String),
    #[error("Reaction {reaction} references metabolite {metabolite} which is not in the model")]
    UnknownMetabolite { reaction: String, metabolite: String },
    #[error("Reaction {reaction} has a lower bound ({lower}) above its upper bound ({upper})")]
    InvalidBounds {
        reaction: String,
        lower: f64,
        upper: f64,
    },
}

impl Model {
    /// Create a new model without any content
    pub fn new_empty() -> Self {
        Model {
            id: None,
            name: None,
            compartments: IndexMap::new(),
            metabolites: IndexMap::new(),
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            objective: Objective::default(),
            version: None,
        }
    }

    /// Create a new empty model with an id
    pub fn new(id: &str) -> Self {
        Model {
            id: Some(id.to_string()),
            ..Model::new_empty()
        }
    }

    /// Assemble a single species model from its parts
    ///
    /// # Parameters
    /// - `id`: Id of the new model
    /// - `compartments`: Compartments of the model
    /// - `metabolites`: Metabolites of the model
    /// - `reactions`: Reactions of the model, which may only reference the given metabolites
    ///
    /// # Returns
    /// The assembled model, or a [`ModelError`] if ids are duplicated or a reaction
    /// references an unknown metabolite
    ///
    /// # Examples
    /// ```rust
    /// use commodel_core::metabolic_model::compartment::Compartment;
    /// use commodel_core::metabolic_model::metabolite::Metabolite;
    /// use commodel_core::metabolic_model::model::Model;
    /// use commodel_core::metabolic_model::reaction::Reaction;
    /// let mut uptake = Reaction::new("EX_S", None, 0., 1000.);
    /// uptake.add_metabolite("S_c", 1.0);
    /// let model = Model::from_parts(
    ///     "toy_model",
    ///     vec![Compartment::new("c", Some("cytosol"))],
    ///     vec![Metabolite::new("S_c", None, Some("c"))],
    ///     vec![uptake],
    /// )
    /// .unwrap();
    /// assert_eq!(model.reactions.len(), 1);
    /// ```
    pub fn from_parts(
        id: &str,
        compartments: Vec<Compartment>,
        metabolites: Vec<Metabolite>,
        reactions: Vec<Reaction>,
    ) -> Result<Model, ModelError> {
        let mut model = Model::new(id);
        compartments
            .into_iter()
            .for_each(|c| model.add_compartment(c));
        for met in metabolites {
            model.add_metabolite(met)?;
        }
        for rxn in reactions {
            model.add_reaction(rxn)?;
        }
        Ok(model)
    }

    // region Adding
    /// Add a compartment to the model, replacing any compartment with the same id
    pub fn add_compartment(&mut self, compartment: Compartment) {
        self.compartments.insert(compartment.id.clone(), compartment);
    }

    /// Add a metabolite to the model
    ///
    /// # Parameters
    /// - metabolite: Metabolite to add, its id must not already be in the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) -> Result<(), ModelError> {
        if self.metabolites.contains_key(&metabolite.id) {
            return Err(ModelError::DuplicateMetabolite(metabolite.id));
        }
        self.metabolites.insert(metabolite.id.clone(), metabolite);
        Ok(())
    }

    /// Return the metabolite with the id of `metabolite`, inserting `metabolite` first if
    /// no such metabolite exists yet
    pub fn ensure_metabolite(&mut self, metabolite: Metabolite) -> &Metabolite {
        self.metabolites
            .entry(metabolite.id.clone())
            .or_insert(metabolite)
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Note:
    /// All metabolites of the reaction must already be part of the model. Genes referenced
    /// by the reaction's GPR are added to the model if they are missing.
    ///
    /// # Examples
    /// ```rust
    /// use commodel_core::metabolic_model::model::Model;
    /// use commodel_core::metabolic_model::reaction::{Reaction, ReactionBuilder};
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction").build().unwrap();
    /// model.add_reaction(new_reaction).unwrap();
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        if self.reactions.contains_key(&reaction.id) {
            return Err(ModelError::DuplicateReaction(reaction.id));
        }
        if let Some(missing) = reaction
            .metabolites
            .keys()
            .find(|met_id| !self.metabolites.contains_key(*met_id))
        {
            return Err(ModelError::UnknownMetabolite {
                reaction: reaction.id.clone(),
                metabolite: missing.clone(),
            });
        }
        if let Some(ref gpr) = reaction.gpr {
            for gene_id in gpr.genes() {
                if !self.genes.contains_key(&gene_id) {
                    self.genes
                        .insert(gene_id.clone(), Gene::new_id_only(&gene_id));
                }
            }
        }
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(())
    }

    /// Add a gene to the model, replacing any gene with the same id
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }
    // endregion Adding

    // region Lookup
    /// Get a reaction by id
    pub fn reaction(&self, id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))
    }

    /// Get a mutable reference to a reaction by id
    pub fn reaction_mut(&mut self, id: &str) -> Result<&mut Reaction, ModelError> {
        self.reactions
            .get_mut(id)
            .ok_or_else(|| ModelError::ReactionNotFound(id.to_string()))
    }

    /// Get a metabolite by id
    pub fn metabolite(&self, id: &str) -> Result<&Metabolite, ModelError> {
        self.metabolites
            .get(id)
            .ok_or_else(|| ModelError::MetaboliteNotFound(id.to_string()))
    }

    /// Ids of all reactions in which the metabolite takes part
    pub fn reactions_of_metabolite(&self, met_id: &str) -> Vec<String> {
        self.reactions
            .values()
            .filter(|rxn| rxn.metabolites.contains_key(met_id))
            .map(|rxn| rxn.id.clone())
            .collect()
    }
    // endregion Lookup

    // region Removal
    /// Remove reactions from the model, returning the removed reactions
    ///
    /// Ids which are not in the model are ignored. Metabolites of the removed reactions
    /// stay in the model.
    pub fn remove_reactions(&mut self, ids: &[&str]) -> Vec<Reaction> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(rxn) = self.reactions.shift_remove(*id) {
                self.objective.coefficients.shift_remove(*id);
                removed.push(rxn);
            }
        }
        removed
    }

    /// Remove all reactions whose id starts with `prefix`
    pub fn remove_reactions_with_prefix(&mut self, prefix: &str) -> Vec<Reaction> {
        let ids: Vec<String> = self
            .reactions
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        let ids: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        self.remove_reactions(&ids)
    }

    /// Remove metabolites from the model, also removing them from every reaction they
    /// take part in. The reactions themselves are kept.
    pub fn remove_metabolites(&mut self, ids: &[&str]) -> Vec<Metabolite> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(met) = self.metabolites.shift_remove(*id) {
                self.reactions.values_mut().for_each(|rxn| {
                    rxn.metabolites.shift_remove(*id);
                });
                removed.push(met);
            }
        }
        removed
    }
    // endregion Removal

    // region Renaming
    /// Change the id of a reaction, keeping its position in the model and objective
    pub fn rename_reaction(&mut self, old_id: &str, new_id: &str) -> Result<(), ModelError> {
        if old_id == new_id {
            return Ok(());
        }
        if self.reactions.contains_key(new_id) {
            return Err(ModelError::DuplicateReaction(new_id.to_string()));
        }
        let (index, _, mut rxn) = self
            .reactions
            .shift_remove_full(old_id)
            .ok_or_else(|| ModelError::ReactionNotFound(old_id.to_string()))?;
        rxn.id = new_id.to_string();
        self.reactions.shift_insert(index, new_id.to_string(), rxn);
        if let Some((index, _, coef)) = self.objective.coefficients.shift_remove_full(old_id) {
            self.objective
                .coefficients
                .shift_insert(index, new_id.to_string(), coef);
        }
        Ok(())
    }

    /// Change the id of a metabolite, updating every reaction it takes part in
    pub fn rename_metabolite(&mut self, old_id: &str, new_id: &str) -> Result<(), ModelError> {
        if old_id == new_id {
            return Ok(());
        }
        if self.metabolites.contains_key(new_id) {
            return Err(ModelError::DuplicateMetabolite(new_id.to_string()));
        }
        let (index, _, mut met) = self
            .metabolites
            .shift_remove_full(old_id)
            .ok_or_else(|| ModelError::MetaboliteNotFound(old_id.to_string()))?;
        met.id = new_id.to_string();
        self.metabolites.shift_insert(index, new_id.to_string(), met);
        for rxn in self.reactions.values_mut() {
            if let Some((index, _, coef)) = rxn.metabolites.shift_remove_full(old_id) {
                rxn.metabolites.shift_insert(index, new_id.to_string(), coef);
            }
        }
        Ok(())
    }

    /// Namespace the model by appending `_{suffix}` to every metabolite and reaction id
    ///
    /// # Note:
    /// Stoichiometries and the objective follow the new ids. Genes and compartments
    /// are left untouched.
    pub fn add_id_suffix(&mut self, suffix: &str) {
        let suffixed = |id: &str| format!("{}_{}", id, suffix);
        self.metabolites = std::mem::take(&mut self.metabolites)
            .into_iter()
            .map(|(id, mut met)| {
                met.id = suffixed(&id);
                (met.id.clone(), met)
            })
            .collect();
        self.reactions = std::mem::take(&mut self.reactions)
            .into_iter()
            .map(|(id, mut rxn)| {
                rxn.id = suffixed(&id);
                rxn.metabolites = std::mem::take(&mut rxn.metabolites)
                    .into_iter()
                    .map(|(met_id, coef)| (suffixed(&met_id), coef))
                    .collect();
                (rxn.id.clone(), rxn)
            })
            .collect();
        self.objective.coefficients = std::mem::take(&mut self.objective.coefficients)
            .into_iter()
            .map(|(id, coef)| (suffixed(&id), coef))
            .collect();
    }
    // endregion Renaming

    /// Merge another model into this one
    ///
    /// Reactions of `other` whose ids are not yet present are appended, along with all
    /// metabolites, genes and compartments of `other` which are missing here. The
    /// objective of this model is kept.
    pub fn merge(&mut self, other: &Model) {
        for (id, compartment) in &other.compartments {
            if !self.compartments.contains_key(id) {
                self.compartments.insert(id.clone(), compartment.clone());
            }
        }
        for (id, met) in &other.metabolites {
            if !self.metabolites.contains_key(id) {
                self.metabolites.insert(id.clone(), met.clone());
            }
        }
        for (id, gene) in &other.genes {
            if !self.genes.contains_key(id) {
                self.genes.insert(id.clone(), gene.clone());
            }
        }
        for (id, rxn) in &other.reactions {
            if self.reactions.contains_key(id) {
                debug!("Reaction {} already present, skipping it during merge", id);
                continue;
            }
            self.reactions.insert(id.clone(), rxn.clone());
        }
    }

    /// Set the objective to a single reaction with coefficient 1
    pub fn set_objective(&mut self, reaction_id: &str, sense: ObjectiveSense) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::ReactionNotFound(reaction_id.to_string()));
        }
        let mut objective = Objective::single(reaction_id);
        objective.sense = sense;
        self.objective = objective;
        Ok(())
    }

    /// Check the internal consistency of the model
    ///
    /// Every reaction may only reference metabolites of the model and must have a lower
    /// bound which is not above its upper bound, and every objective term must refer to a
    /// reaction of the model.
    pub fn validate(&self) -> Result<(), ModelError> {
        for rxn in self.reactions.values() {
            if let Some(missing) = rxn
                .metabolites
                .keys()
                .find(|met_id| !self.metabolites.contains_key(*met_id))
            {
                return Err(ModelError::UnknownMetabolite {
                    reaction: rxn.id.clone(),
                    metabolite: missing.clone(),
                });
            }
            if rxn.lower_bound > rxn.upper_bound {
                return Err(ModelError::InvalidBounds {
                    reaction: rxn.id.clone(),
                    lower: rxn.lower_bound,
                    upper: rxn.upper_bound,
                });
            }
        }
        if let Some(missing) = self
            .objective
            .coefficients
            .keys()
            .find(|rxn_id| !self.reactions.contains_key(*rxn_id))
        {
            return Err(ModelError::ReactionNotFound(missing.clone()));
        }
        Ok(())
    }
}
