pub mod rules;
pub mod sanitizer;
pub mod validator;

pub use rules::{parse_rules, Rule, RuleParseError, RuleSet};
pub use sanitizer::{sanitize_record, sanitize_string, sanitize_value};
pub use validator::{ValidationErrors, Validator};
