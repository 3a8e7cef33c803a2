use std::borrow::Cow;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::rules::{Rule, RuleSet};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern")
});

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern"));

static DOCUMENTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{7,11}$").expect("documento pattern"));

/// Field name → messages, in the order fields were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn add(&mut self, field: &str, message: String) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn first(&self) -> Option<&str> {
        self.fields
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(name, messages)| (name, messages)))
    }
}

/// Evaluates a [`RuleSet`] against a flat JSON record.
///
/// Every rule of every field runs; each violation appends one message. The error
/// map is rebuilt on each call to [`Validator::validate`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self, record: &Map<String, Value>, rules: &RuleSet) -> bool {
        self.errors = ValidationErrors::default();

        for (field, field_rules) in rules.iter() {
            let value = record.get(field).unwrap_or(&Value::Null);
            for rule in field_rules {
                if let Some(message) = check(field, value, *rule) {
                    self.errors.add(field, message);
                }
            }
        }

        self.errors.is_empty()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first()
    }
}

fn check(field: &str, value: &Value, rule: Rule) -> Option<String> {
    if is_empty(value) {
        return match rule {
            Rule::Required => Some(format!("{} is required", field)),
            _ => None,
        };
    }

    let text = as_text(value);
    let text = text.as_deref();

    let valid = match rule {
        Rule::Required => true,
        Rule::Email => text.is_some_and(|t| EMAIL.is_match(t)),
        Rule::Min(n) => text.is_some_and(|t| t.chars().count() >= n),
        Rule::Max(n) => text.is_some_and(|t| t.chars().count() <= n),
        Rule::Numeric => value.is_number() || text.is_some_and(is_numeric),
        Rule::Phone => text.is_some_and(|t| PHONE.is_match(t)),
        Rule::Documento => text.is_some_and(|t| DOCUMENTO.is_match(t)),
        Rule::Date => text.is_some_and(is_date),
    };

    if valid {
        return None;
    }

    Some(match rule {
        Rule::Required => format!("{} is required", field),
        Rule::Email => format!("{} must be a valid email address", field),
        Rule::Min(n) => format!("{} must be at least {} characters", field, n),
        Rule::Max(n) => format!("{} may not exceed {} characters", field, n),
        Rule::Numeric => format!("{} must be numeric", field),
        Rule::Phone => format!("{} must be a valid phone number (10 digits)", field),
        Rule::Documento => format!("{} must be a valid document number (7-11 digits)", field),
        Rule::Date => format!("{} must be a valid date (YYYY-MM-DD)", field),
    })
}

/// Null, empty strings and zero-length collections count as missing.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Requires an exact `YYYY-MM-DD` round trip, so `2024-02-30` and `2024-2-3` fail.
fn is_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string() == text)
        .unwrap_or(false)
}
