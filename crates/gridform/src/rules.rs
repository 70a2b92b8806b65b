//! Typed validation rules derived from the template's dropdown sheet.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Data type a rule validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Free text; required-ness is the only constraint.
    Text,
    /// Integer, optionally bounded on both sides.
    Numeric,
    /// Fixed yes/no vocabulary.
    Boolean,
    /// Text matching an optional pattern.
    Date,
    /// Integer rating bounded by the template's scale dropdown.
    Scale,
    /// Exact membership in a derived value set.
    Enum,
}

impl Default for RuleKind {
    fn default() -> Self {
        RuleKind::Text
    }
}

/// A validation rule for one or more columns.
///
/// The `kind` determines which constraint fields are meaningful; unused
/// fields are ignored. Rules are stateless and reentrant: `validate` never
/// mutates the rule, so one instance may back several column bindings.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    kind: RuleKind,
    allowed_values: Option<BTreeSet<String>>,
    min_value: Option<i64>,
    max_value: Option<i64>,
    pattern: Option<Regex>,
    required: bool,
}

impl ValidationRule {
    /// Create a rule for the given kind with no constraints and
    /// `required = true`.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            allowed_values: None,
            min_value: None,
            max_value: None,
            pattern: None,
            required: true,
        }
    }

    /// Set the allowed values for enumerated kinds.
    pub fn with_allowed_values(mut self, values: BTreeSet<String>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Set inclusive numeric bounds for numeric/scale kinds.
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    /// Set the pattern checked by the date kind.
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Mark blank values as acceptable.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn min_value(&self) -> Option<i64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<i64> {
        self.max_value
    }

    pub fn allowed_values(&self) -> Option<&BTreeSet<String>> {
        self.allowed_values.as_ref()
    }

    /// Validate a raw cell value against this rule.
    ///
    /// Returns one message per violated constraint; empty means valid.
    /// Blank values pass unless the rule is required; no type check is
    /// attempted on blank input.
    pub fn validate(&self, value: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let clean = value.trim();
        if clean.is_empty() {
            if self.required {
                errors.push("Value is required".to_string());
            }
            return errors;
        }

        match self.kind {
            RuleKind::Enum => {
                if let Some(allowed) = &self.allowed_values {
                    if !allowed.contains(clean) {
                        let joined = allowed.iter().cloned().collect::<Vec<_>>().join(", ");
                        errors.push(format!("Value must be one of: {joined}"));
                    }
                }
            }

            RuleKind::Numeric | RuleKind::Scale => match clean.parse::<i64>() {
                Ok(number) => {
                    if let Some(min) = self.min_value {
                        if number < min {
                            errors.push(format!("Value must be >= {min}"));
                        }
                    }
                    if let Some(max) = self.max_value {
                        if number > max {
                            errors.push(format!("Value must be <= {max}"));
                        }
                    }
                }
                Err(_) => errors.push("Value must be a number".to_string()),
            },

            RuleKind::Boolean => {
                let lowered = clean.to_lowercase();
                if lowered != "yes" && lowered != "no" {
                    errors.push("Value must be Yes/No".to_string());
                }
            }

            RuleKind::Date => {
                if let Some(pattern) = &self.pattern {
                    if !pattern.is_match(clean) {
                        errors.push("Value does not match expected pattern".to_string());
                    }
                }
            }

            RuleKind::Text => {}
        }

        errors
    }
}

impl PartialEq for ValidationRule {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.allowed_values == other.allowed_values
            && self.min_value == other.min_value
            && self.max_value == other.max_value
            && self.pattern.as_ref().map(Regex::as_str) == other.pattern.as_ref().map(Regex::as_str)
            && self.required == other.required
    }
}
