use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reference table entry returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LookupItem {
    pub id: i64,
    pub nombre: String,
}

impl LookupItem {
    pub fn new(id: i64, nombre: impl Into<String>) -> Self {
        Self {
            id,
            nombre: nombre.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    DocumentTypes,
    Genders,
    Departments,
    Municipalities,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::DocumentTypes => "document-types",
            LookupKind::Genders => "genders",
            LookupKind::Departments => "departments",
            LookupKind::Municipalities => "municipalities",
        }
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document-types" => Ok(LookupKind::DocumentTypes),
            "genders" => Ok(LookupKind::Genders),
            "departments" => Ok(LookupKind::Departments),
            "municipalities" => Ok(LookupKind::Municipalities),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
