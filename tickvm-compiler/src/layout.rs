//! Struct layout: named, ordered, unique word fields.
//!
//! Used for static frames and the globals segment. Every field is one word,
//! so `size == field count` and `offset(field) == field index`.

use crate::error::{CompileError, Result};
use crate::il::Argument;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    name: String,
    fields: Vec<String>,
}

impl StructDefinition {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut unique: Vec<String> = Vec::new();

        for field in fields {
            let field = field.into();
            if unique.contains(&field) {
                return Err(CompileError::DuplicateField { name, field });
            }
            unique.push(field);
        }

        Ok(Self { name, fields: unique })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Size in words
    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Word offset of `field` from the struct base
    pub fn offset(&self, field: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| CompileError::UnknownField {
                name: self.name.clone(),
                field: field.to_string(),
            })
    }

    /// Initial contents: listed fields take the given value, the rest are 0
    pub fn words(&self, values: &[(&str, Argument)]) -> Result<Vec<Argument>> {
        let mut words = vec![Argument::Literal(0); self.size()];
        for (field, value) in values {
            words[self.offset(field)?] = value.clone();
        }
        Ok(words)
    }
}
