//! Translation of a logger's own level field into the entry [`Severity`].
//!
//! Most structured loggers put the level in a field of the record, e.g.
//! `{"level":"warn","msg":"disk almost full"}`. Cloud Logging wants it in the
//! dedicated `severity` attribute of the entry instead. A [`LevelModifier`] finds the
//! field, maps its value and optionally strips it from the payload.
//!
//! Values that cannot be mapped never fail a write: they get [`Severity::Default`].
use std::collections::HashMap;
use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::Arc;

use googlelog::Severity;
use serde_json::Value;

use crate::metrics;
use crate::parser::StructuredLog;

/// Maps the value of a level field to a severity.
pub type LevelMapping = Arc<dyn Fn(&Value) -> Severity + Send + Sync + RefUnwindSafe>;

/// Where the level of a log line lives and what to do with it.
///
/// The default modifier does nothing: entries keep the default severity and the
/// payload is forwarded untouched.
#[derive(Clone, Default)]
pub struct LevelModifier {
    field: String,
    remove_original: bool,
    mapping: Option<LevelMapping>,
}

impl fmt::Debug for LevelModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelModifier")
            .field("field", &self.field)
            .field("remove_original", &self.remove_original)
            .field("mapping", &self.mapping.as_ref().map(|_| "Fn(&Value) -> Severity"))
            .finish()
    }
}

impl LevelModifier {
    pub fn new(field: impl Into<String>) -> Self {
        LevelModifier {
            field: field.into(),
            ..Default::default()
        }
    }

    /// Whether the level field is removed from the payload once read.
    pub fn remove_original(self, remove_original: bool) -> Self {
        LevelModifier {
            remove_original,
            ..self
        }
    }

    pub fn with_mapping<F>(self, mapping: F) -> Self
    where
        F: Fn(&Value) -> Severity + Send + Sync + RefUnwindSafe + 'static,
    {
        LevelModifier {
            mapping: Some(Arc::new(mapping)),
            ..self
        }
    }

    pub fn with_table(self, table: LevelTable) -> Self {
        self.with_mapping(move |value| table.severity_of(value))
    }

    /// Reads (and maybe removes) the level field of `fields`.
    ///
    /// Returns `None` when the entry should keep the default severity: nothing is
    /// mapped, or the field is absent.
    pub fn apply(&self, fields: &mut StructuredLog) -> Option<Severity> {
        if self.mapping.is_none() && !self.remove_original {
            return None;
        }
        let severity = match (&self.mapping, fields.get(&self.field)) {
            (Some(mapping), Some(value)) => Some(mapping(value)),
            (Some(_), None) => {
                metrics::LEVEL_FALLBACKS.with_label_values(&["absent"]).inc();
                None
            }
            (None, _) => None,
        };
        if self.remove_original {
            fields.remove(&self.field);
        }
        severity
    }
}

/// A lookup table from level names to severities.
///
/// Names are matched case-insensitively. Anything that is not a string, or not in
/// the table, maps to [`Severity::Default`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelTable {
    levels: HashMap<String, Severity>,
}

impl LevelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, severity: Severity) -> Self {
        self.levels.insert(name.to_ascii_lowercase(), severity);
        self
    }

    pub fn severity_of(&self, value: &Value) -> Severity {
        let found = value
            .as_str()
            .and_then(|name| self.levels.get(&name.to_ascii_lowercase()))
            .copied();
        found.unwrap_or_else(|| {
            metrics::LEVEL_FALLBACKS.with_label_values(&["unknown"]).inc();
            Severity::Default
        })
    }
}

impl<'a> FromIterator<(&'a str, Severity)> for LevelTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, Severity)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LevelTable::new(), |table, (name, severity)| {
                table.with(name, severity)
            })
    }
}

/// The level names used by common JSON loggers.
pub fn common_table() -> LevelTable {
    [
        ("trace", Severity::Debug),
        ("debug", Severity::Debug),
        ("info", Severity::Info),
        ("notice", Severity::Notice),
        ("warn", Severity::Warning),
        ("warning", Severity::Warning),
        ("error", Severity::Error),
        ("err", Severity::Error),
        ("crit", Severity::Critical),
        ("critical", Severity::Critical),
        ("fatal", Severity::Critical),
        ("panic", Severity::Critical),
        ("alert", Severity::Alert),
        ("emerg", Severity::Emergency),
        ("emergency", Severity::Emergency),
    ]
    .into_iter()
    .collect()
}
