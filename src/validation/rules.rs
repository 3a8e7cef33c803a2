use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single named constraint on one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Min(usize),
    Max(usize),
    Numeric,
    Phone,
    Documento,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("rule '{0}' requires a numeric parameter")]
    MissingParameter(String),

    #[error("invalid parameter '{value}' for rule '{rule}'")]
    InvalidParameter { rule: String, value: String },

    #[error("rule '{0}' takes no parameter")]
    UnexpectedParameter(String),
}

impl FromStr for Rule {
    type Err = RuleParseError;

    /// Parses one rule token such as `required` or `min:2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (s.trim(), None),
        };

        match name {
            "min" => Ok(Rule::Min(length_param(name, param)?)),
            "max" => Ok(Rule::Max(length_param(name, param)?)),
            _ => {
                let rule = match name {
                    "required" => Rule::Required,
                    "email" => Rule::Email,
                    "numeric" => Rule::Numeric,
                    "phone" => Rule::Phone,
                    "documento" => Rule::Documento,
                    "date" => Rule::Date,
                    other => return Err(RuleParseError::UnknownRule(other.to_string())),
                };
                match param {
                    Some(_) => Err(RuleParseError::UnexpectedParameter(name.to_string())),
                    None => Ok(rule),
                }
            }
        }
    }
}

fn length_param(rule: &str, param: Option<&str>) -> Result<usize, RuleParseError> {
    let value = param.ok_or_else(|| RuleParseError::MissingParameter(rule.to_string()))?;
    value.parse().map_err(|_| RuleParseError::InvalidParameter {
        rule: rule.to_string(),
        value: value.to_string(),
    })
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::Email => f.write_str("email"),
            Rule::Min(n) => write!(f, "min:{}", n),
            Rule::Max(n) => write!(f, "max:{}", n),
            Rule::Numeric => f.write_str("numeric"),
            Rule::Phone => f.write_str("phone"),
            Rule::Documento => f.write_str("documento"),
            Rule::Date => f.write_str("date"),
        }
    }
}

/// Parses a pipe-separated rule list, e.g. `required|min:2|max:100`.
pub fn parse_rules(list: &str) -> Result<Vec<Rule>, RuleParseError> {
    list.split('|')
        .filter(|token| !token.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Ordered field → rules declaration for one request type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rules for `name`; repeated calls for the same field extend its list.
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((name, rules.into_iter().collect())),
        }
        self
    }

    pub fn parse_field(self, name: impl Into<String>, list: &str) -> Result<Self, RuleParseError> {
        let rules = parse_rules(list)?;
        Ok(self.field(name, rules))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields
            .iter()
            .map(|(field, rules)| (field.as_str(), rules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
