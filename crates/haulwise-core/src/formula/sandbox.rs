//! Whitelisting front end over `evalexpr`.
//!
//! `evalexpr` builds the operator tree. This module lowers that tree into
//! the small [`Expr`] the evaluator understands and rejects every node
//! outside plain arithmetic.
//!
//! ```text
//!   source ──► alphabet + brace check ──► evalexpr::build_operator_tree
//!                                                   │
//!                                                   ▼
//!             Expr ◄── lower: RootNode, + - * /, Neg, Int/Float, variable
//!                      anything else ──► FormulaError
//! ```

use evalexpr::{Node, Operator, Value};

use crate::error::FormulaError;
use crate::validation::is_identifier;

/// Maximum depth of nested parentheses / unary minus.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Arithmetic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parses `source` into an arithmetic [`Expr`].
pub(crate) fn parse(source: &str) -> Result<Expr, FormulaError> {
    if source.trim().is_empty() {
        return Err(FormulaError::Empty);
    }
    check_alphabet(source)?;

    let tree = evalexpr::build_operator_tree(source).map_err(|err| FormulaError::Syntax {
        message: err.to_string(),
    })?;

    Lowering { source }.root(&tree)
}

/// Rejects characters outside the formula alphabet and unbalanced or
/// too deeply nested parentheses, before `evalexpr` sees the text.
fn check_alphabet(source: &str) -> Result<(), FormulaError> {
    let mut depth = 0usize;

    for (position, c) in source.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(FormulaError::NestingTooDeep {
                        max: MAX_NESTING_DEPTH,
                    });
                }
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| FormulaError::UnexpectedToken {
                        found: ")".to_string(),
                        position,
                    })?;
            }
            c if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() => {}
            '_' | '.' | '+' | '-' | '*' | '/' | ',' => {}
            found => return Err(FormulaError::UnexpectedChar { found, position }),
        }
    }

    if depth > 0 {
        return Err(FormulaError::UnexpectedEnd);
    }
    Ok(())
}

// =============================================================================
// Lowering
// =============================================================================

struct Lowering<'a> {
    source: &'a str,
}

impl Lowering<'_> {
    fn root(&self, tree: &Node) -> Result<Expr, FormulaError> {
        if !matches!(tree.operator(), Operator::RootNode) {
            return self.lower(tree, 0);
        }
        // The outermost root is not a parenthesis
        match tree.children() {
            [] => Err(FormulaError::Empty),
            [only] => self.lower(only, 0),
            [_, extra, ..] => Err(self.unexpected(extra)),
        }
    }

    fn lower(&self, node: &Node, depth: usize) -> Result<Expr, FormulaError> {
        match node.operator() {
            Operator::RootNode => match node.children() {
                [inner] => self.lower(inner, enter(depth)?),
                [] => Err(FormulaError::Syntax {
                    message: "empty parentheses".to_string(),
                }),
                [_, extra, ..] => Err(self.unexpected(extra)),
            },
            Operator::Neg => match node.children() {
                [operand] => Ok(Expr::Neg(Box::new(self.lower(operand, enter(depth)?)?))),
                _ => Err(FormulaError::UnexpectedEnd),
            },
            Operator::Add => self.binary(BinaryOp::Add, node, depth),
            Operator::Sub => self.binary(BinaryOp::Sub, node, depth),
            Operator::Mul => self.binary(BinaryOp::Mul, node, depth),
            Operator::Div => self.binary(BinaryOp::Div, node, depth),
            Operator::Const { value } => self.constant(value),
            Operator::VariableIdentifierRead { identifier } => self.variable(identifier),
            Operator::FunctionIdentifier { identifier } => Err(FormulaError::UnsupportedFunction {
                name: identifier.clone(),
                position: self.locate_word(identifier),
            }),
            _ => Err(self.unexpected(node)),
        }
    }

    fn binary(&self, op: BinaryOp, node: &Node, depth: usize) -> Result<Expr, FormulaError> {
        match node.children() {
            [lhs, rhs] => Ok(Expr::Binary {
                op,
                lhs: Box::new(self.lower(lhs, depth)?),
                rhs: Box::new(self.lower(rhs, depth)?),
            }),
            _ => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn constant(&self, value: &Value) -> Result<Expr, FormulaError> {
        let number = match value {
            Value::Int(int) => *int as f64,
            Value::Float(float) => *float,
            other => {
                let found = other.to_string();
                return Err(FormulaError::UnexpectedToken {
                    position: self.locate_word(&found),
                    found,
                });
            }
        };

        // "inf" and "NaN" parse as floats
        if !number.is_finite() {
            let literal = value.to_string();
            return Err(FormulaError::InvalidNumber {
                position: self.locate_word(&literal),
                literal,
            });
        }
        Ok(Expr::Number(number))
    }

    fn variable(&self, identifier: &str) -> Result<Expr, FormulaError> {
        if is_identifier(identifier) {
            return Ok(Expr::Var(identifier.to_string()));
        }

        let position = self.locate_word(identifier);
        if identifier.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return Err(FormulaError::InvalidNumber {
                literal: identifier.to_string(),
                position,
            });
        }
        match identifier
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
        {
            Some((offset, found)) => Err(FormulaError::UnexpectedChar {
                found,
                position: position + offset,
            }),
            None => Err(FormulaError::Syntax {
                message: format!("invalid identifier '{identifier}'"),
            }),
        }
    }

    fn unexpected(&self, node: &Node) -> FormulaError {
        let found = match node.operator() {
            Operator::Tuple => ",".to_string(),
            Operator::Const { value } => value.to_string(),
            Operator::VariableIdentifierRead { identifier }
            | Operator::FunctionIdentifier { identifier } => identifier.clone(),
            other => format!("{other:?}"),
        };
        FormulaError::UnexpectedToken {
            position: self.source.find(found.as_str()).unwrap_or(0),
            found,
        }
    }

    /// Byte offset of the first whole-word occurrence of `word`.
    fn locate_word(&self, word: &str) -> usize {
        let is_word_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.';

        self.source
            .match_indices(word)
            .find(|(at, _)| {
                let before = self.source[..*at].chars().next_back();
                let after = self.source[at + word.len()..].chars().next();
                !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
            })
            .map_or(0, |(at, _)| at)
    }
}

fn enter(depth: usize) -> Result<usize, FormulaError> {
    let depth = depth + 1;
    if depth > MAX_NESTING_DEPTH {
        return Err(FormulaError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(depth)
}
