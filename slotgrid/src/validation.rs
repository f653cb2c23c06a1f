use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::value::format_number;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A caller-supplied predicate over the raw editor text.
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleKind {
    Required,
    Email,
    Numeric,
    Range,
    Custom,
}

/// A single validation rule attached to a column.
///
/// Rules run against the raw editor text in declaration order.
#[derive(Clone)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// `local@domain.tld` with no whitespace.
    Email,
    /// Parses as a number; empty passes.
    Numeric,
    /// Numeric and within `[min, max]`; empty passes.
    Range { min: f64, max: f64 },
    Custom { predicate: Predicate, message: String },
}

impl Rule {
    pub fn range(min: f64, max: f64) -> Self {
        Self::Range { min, max }
    }

    pub fn custom(
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self::Custom {
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Required => RuleKind::Required,
            Self::Email => RuleKind::Email,
            Self::Numeric => RuleKind::Numeric,
            Self::Range { .. } => RuleKind::Range,
            Self::Custom { .. } => RuleKind::Custom,
        }
    }

    pub fn check(&self, text: &str) -> bool {
        match self {
            Self::Required => !text.trim().is_empty(),
            Self::Email => EMAIL.is_match(text),
            Self::Numeric => parse_number(text).is_some(),
            Self::Range { min, max } => {
                if text.is_empty() {
                    return true;
                }
                parse_number(text).is_some_and(|n| n >= *min && n <= *max)
            }
            Self::Custom { predicate, .. } => predicate(text),
        }
    }

    pub fn message(&self, messages: &ValidationMessages) -> String {
        match self {
            Self::Required => messages.required.clone(),
            Self::Email => messages.email.clone(),
            Self::Numeric => messages.numeric.clone(),
            Self::Range { min, max } => messages.range_message(*min, *max),
            Self::Custom { message, .. } => message.clone(),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Email => f.write_str("Email"),
            Self::Numeric => f.write_str("Numeric"),
            Self::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Custom { message, .. } => f
                .debug_struct("Custom")
                .field("message", message)
                .finish_non_exhaustive(),
        }
    }
}

/// User-visible messages for the built-in rules.
///
/// `range` may contain `{min}` and `{max}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationMessages {
    pub required: String,
    pub email: String,
    pub numeric: String,
    pub range: String,
}

impl ValidationMessages {
    pub fn range_message(&self, min: f64, max: f64) -> String {
        self.range
            .replace("{min}", &format_number(min))
            .replace("{max}", &format_number(max))
    }
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            required: "This field is required".to_string(),
            email: "Invalid email address".to_string(),
            numeric: "Must be a number".to_string(),
            range: "Must be between {min} and {max}".to_string(),
        }
    }
}

/// The first rule that rejected an input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub rule: RuleKind,
    pub message: String,
}

/// Runs `rules` in order and stops at the first failure.
pub fn validate(
    rules: &[Rule],
    text: &str,
    messages: &ValidationMessages,
) -> Result<(), ValidationError> {
    match rules.iter().find(|rule| !rule.check(text)) {
        None => Ok(()),
        Some(rule) => Err(ValidationError {
            rule: rule.kind(),
            message: rule.message(messages),
        }),
    }
}

/// Lenient numeric parse of editor text.
///
/// Surrounding whitespace is ignored and blank text reads as zero, so a blank
/// input passes `Numeric`. `NaN` never parses.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let n = match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            return None;
        }
        _ => trimmed.parse::<f64>().ok()?,
    };
    (!n.is_nan()).then_some(n)
}
