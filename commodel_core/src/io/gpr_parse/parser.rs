use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::{Gene, Gpr, GprOperatorType};

use indexmap::IndexMap;
use thiserror::Error;

static EOF: Token = Token::Eof;
/*
GPR Grammar:
expression -> or ;
or -> and ( "OR" and )* ;
and -> unary ( "AND" unary )* ;
unary -> "NOT" unary | primary ;
primary -> GENE | "(" expression ")" ;

e.g. ( Gene1 AND Gene2) OR (Gene3 AND NOT Gene4)
 */

/// GPR Parser
pub struct GprParser<'gm> {
    /// Vector of tokens from the GPR string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Map containing the Genes
    pub(crate) gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    /// Create a new GprParser, `tokens` must end with [`Token::Eof`]
    pub fn new(tokens: Vec<Token>, gene_map: &'gm mut IndexMap<String, Gene>) -> GprParser<'gm> {
        GprParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.or()?;
        if !self.is_at_end() {
            // If entire expression has not been parsed, and error has occured
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn or(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.and()?;
        while self.match_token(Token::Or) {
            let right = self.and()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::Or, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_token(Token::And) {
            let right = self.unary()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::And, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Gpr, ParseError> {
        if self.match_token(Token::Not) {
            let right = self.unary()?;
            return Gpr::new_unary_operation(GprOperatorType::Not, right)
                .map_err(|_| ParseError::InvalidUnaryOperator);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Some(identifier) = self.match_identifier() {
            self.insert_if_needed(&identifier);
            return Ok(Gpr::new_gene_node(&identifier));
        }

        if self.match_token(Token::LeftParen) {
            let expr = self.or()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches `token`,
    /// if it does advance [`self.current`] and return true, otherwise return false
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// Similar to [`match_token`], but for matching an identifier token. If the current
    /// token is an identifier return `Some(GeneId)`, otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            let id = id.clone();
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek() == token
    }

    /// Advance `self.current` one position unless at end of the token Vec
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// Check whether the parser is at the end of the source Vec
    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis.
    fn consume(&mut self, token: Token, msg: &str) -> Result<(), ParseError> {
        if self.check(&token) {
            self.advance();
            return Ok(());
        }

        Err(ParseError::MissingToken(format!("{} (found {})", msg, self.peek())))
    }

    // endregion parsing helper functions

    // region Gene Map Functions

    /// Check if a gene_id exists as a key in gene_map, if it doesn't insert a new gene with that id
    fn insert_if_needed(&mut self, gene_id: &str) {
        if !self.gene_map.contains_key(gene_id) {
            self.gene_map
                .insert(gene_id.to_string(), Gene::new_id_only(gene_id));
        }
    }

    // endregion Gene Map Functions
}

/// Enum representing possible parse errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    /// Token was expected to be a binary operator but was not
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    /// Token was expected to be a unary operator but was not
    #[error("Invalid unary operator encountered, expected only `not`")]
    InvalidUnaryOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for a `not` between two gene identifiers/grouped expressions")]
    EarlyTermination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::lexer::Lexer;
    use crate::metabolic_model::gene::GprOperation;

    fn parse(input: &str, gene_map: &mut IndexMap<String, Gene>) -> Result<Gpr, ParseError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex().unwrap();
        let mut parser = GprParser::new(tokens, gene_map);
        parser.parse()
    }

    #[test]
    fn single_gene_parse() {
        let mut gene_map = IndexMap::new();
        let gpr = parse("Rv1304", &mut gene_map).unwrap();
        assert_eq!(gpr, Gpr::new_gene_node("Rv1304"));
        assert!(gene_map.contains_key("Rv1304"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let mut gene_map = IndexMap::new();
        let gpr = parse("a or b and c", &mut gene_map).unwrap();
        match gpr {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                assert_eq!(*left, Gpr::new_gene_node("a"));
                assert_eq!(right.to_string_id(), "(b and c)");
            }
            _ => panic!("Incorrect Parse"),
        }
        assert_eq!(gene_map.len(), 3);
    }

    #[test]
    fn grouping_and_not() {
        let mut gene_map = IndexMap::new();
        let gpr = parse("(Gene1 AND Gene2) or (Gene3 and not Gene4)", &mut gene_map).unwrap();
        assert_eq!(
            gpr.to_string_id(),
            "((Gene1 and Gene2) or (Gene3 and (not Gene4)))"
        );
    }

    #[test]
    fn existing_genes_kept() {
        let mut gene_map = IndexMap::new();
        let mut gene = Gene::new_id_only("b0001");
        gene.name = Some("thrL".to_string());
        gene_map.insert("b0001".to_string(), gene);
        parse("b0001 or b0002", &mut gene_map).unwrap();
        assert_eq!(gene_map["b0001"].name.as_deref(), Some("thrL"));
        assert_eq!(gene_map.get_index_of("b0002"), Some(1));
    }

    #[test]
    fn parse_errors() {
        let mut gene_map = IndexMap::new();
        assert_eq!(parse("", &mut gene_map), Err(ParseError::ExpectedExpression));
        assert!(matches!(
            parse("(a or b", &mut gene_map),
            Err(ParseError::MissingToken(msg)) if msg.ends_with("(found end of rule)")
        ));
        assert_eq!(parse("a b", &mut gene_map), Err(ParseError::EarlyTermination));
        assert_eq!(parse("a and", &mut gene_map), Err(ParseError::ExpectedExpression));
    }
}
