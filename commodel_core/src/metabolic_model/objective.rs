//! Provides struct for representing the objective of a metabolic model
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

/// Represents the Objective of a metabolic model, a linear combination of reaction fluxes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub sense: ObjectiveSense,
    /// Map of reaction ids to objective coefficients
    pub coefficients: IndexMap<String, f64>,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            sense,
            coefficients: IndexMap::new(),
        }
    }

    /// Create an objective maximizing the flux through a single reaction
    pub fn single(reaction_id: &str) -> Self {
        let mut objective = Self::new(ObjectiveSense::Maximize);
        objective.coefficients.insert(reaction_id.to_string(), 1.0);
        objective
    }

    /// Whether the objective has no terms
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Linear expression of the objective, e.g. `1.0*COMMUNITY_GROWTH`
    pub fn expression(&self) -> String {
        self.coefficients
            .iter()
            .map(|(id, coef)| format!("{:?}*{}", coef, id))
            .collect::<Vec<String>>()
            .join(" + ")
    }
}

impl Display for Objective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.sense, self.expression())
    }
}

/// Sense of the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    /// The objective is maximized
    #[default]
    Maximize,
    /// The objective is minimized
    Minimize,
}

impl Display for ObjectiveSense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveSense::Maximize => write!(f, "maximize"),
            ObjectiveSense::Minimize => write!(f, "minimize"),
        }
    }
}
