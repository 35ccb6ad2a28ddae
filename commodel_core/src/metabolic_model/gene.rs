//! This module provides the Gene struct, representing a gene, and the Gpr enum, representing a
//! gene protein reaction rule
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use thiserror::Error;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    /// Create a gene with only an id
    pub fn new_id_only(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            notes: None,
            annotation: None,
        }
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// region GPR
/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on one or two sub rules (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene node, holding the gene id
    GeneNode(String),
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
    /// Not, results in active if val is inactive
    Not,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprError {
    #[error("Invalid binary operation")]
    InvalidBinaryOp,
    #[error("Invalid unary operation")]
    InvalidUnaryOp,
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Not => GprOperation::Not {
                val: Box::new(operand),
            },
            _ => return Err(GprError::InvalidUnaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val.to_string_id())
                }
            },
            Gpr::GeneNode(gene_id) => gene_id.to_string(),
        }
    }

    /// Ids of all genes referenced in the rule, in order of first appearance
    pub fn genes(&self) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        self.collect_genes(&mut found);
        found
    }

    fn collect_genes(&self, found: &mut Vec<String>) {
        match self {
            Gpr::Operation(GprOperation::Or { left, right })
            | Gpr::Operation(GprOperation::And { left, right }) => {
                left.collect_genes(found);
                right.collect_genes(found);
            }
            Gpr::Operation(GprOperation::Not { val }) => val.collect_genes(found),
            Gpr::GeneNode(gene_id) => {
                if !found.contains(gene_id) {
                    found.push(gene_id.clone());
                }
            }
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}
// endregion GPR

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gene_builder() {
        let gene = GeneBuilder::default()
            .id("b1241")
            .name(Some("adhE".to_string()))
            .build()
            .unwrap();
        assert_eq!(gene.id, "b1241");
        assert_eq!(gene.name.unwrap(), "adhE");
        assert_eq!(format!("{}", Gene::new_id_only("b0001")), "b0001");
    }

    #[test]
    fn display() {
        // Test single gene display
        let gene_node = Gpr::GeneNode("Gene1".to_string());
        assert_eq!(format!("{}", gene_node), "Gene1");

        // Test or display
        let gpr_or = Gpr::new_binary_operation(
            Gpr::new_gene_node("Gene1"),
            GprOperatorType::Or,
            Gpr::new_gene_node("Gene2"),
        )
        .unwrap();
        assert_eq!(format!("{}", gpr_or), "(Gene1 or Gene2)");

        // Test nested with not
        let gpr_nested = Gpr::new_binary_operation(
            gpr_or,
            GprOperatorType::And,
            Gpr::new_unary_operation(GprOperatorType::Not, Gpr::new_gene_node("Gene3")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            format!("{}", gpr_nested),
            "((Gene1 or Gene2) and (not Gene3))"
        );
    }

    #[test]
    fn invalid_operations() {
        let res = Gpr::new_binary_operation(
            Gpr::new_gene_node("a"),
            GprOperatorType::Not,
            Gpr::new_gene_node("b"),
        );
        assert_eq!(res, Err(GprError::InvalidBinaryOp));
        let res = Gpr::new_unary_operation(GprOperatorType::And, Gpr::new_gene_node("a"));
        assert_eq!(res, Err(GprError::InvalidUnaryOp));
    }

    #[test]
    fn collect_genes() {
        let gpr = Gpr::new_binary_operation(
            Gpr::new_binary_operation(
                Gpr::new_gene_node("b3916"),
                GprOperatorType::And,
                Gpr::new_gene_node("b1723"),
            )
            .unwrap(),
            GprOperatorType::Or,
            Gpr::new_gene_node("b3916"),
        )
        .unwrap();
        assert_eq!(gpr.genes(), vec!["b3916".to_string(), "b1723".to_string()]);
    }
}
