//! Program tree consumed from the front end.
//!
//! Every statement and expression may carry a debug node id; lowering wraps
//! the node's code in an `ast:<id>` label span.

use serde::{Deserialize, Serialize};
use tickvm_isa::Word;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: Option<String>,
    pub kind: StatementKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `name = value`
    Declaration { name: String, value: Expression },
    Expression(Expression),
}

impl Statement {
    pub fn declaration(name: impl Into<String>, value: Expression) -> Self {
        Self {
            id: None,
            kind: StatementKind::Declaration { name: name.into(), value },
        }
    }

    pub fn expression(expression: Expression) -> Self {
        Self {
            id: None,
            kind: StatementKind::Expression(expression),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Multiply,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub id: Option<String>,
    pub kind: ExpressionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Number(Word),
    String(String),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Function {
        parameters: Vec<String>,
        body: Vec<Statement>,
    },
}

impl Expression {
    fn new(kind: ExpressionKind) -> Self {
        Self { id: None, kind }
    }

    pub fn number(value: Word) -> Self {
        Self::new(ExpressionKind::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExpressionKind::String(value.into()))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(ExpressionKind::Identifier(name.into()))
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::new(ExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn add(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn multiply(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Multiply, left, right)
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn function<S: Into<String>>(
        parameters: impl IntoIterator<Item = S>,
        body: Vec<Statement>,
    ) -> Self {
        Self::new(ExpressionKind::Function {
            parameters: parameters.into_iter().map(Into::into).collect(),
            body,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
