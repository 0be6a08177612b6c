use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The severity of a log entry, as accepted by Cloud Logging.
///
/// Variants are ordered by importance and render with the names of the
/// [LogSeverity](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#logseverity)
/// enum, e.g. `WARNING`. Parsing is case-insensitive.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Severity {
    /// No assigned severity level.
    #[default]
    Default,
    Debug,
    Info,
    /// Normal but significant events, such as start up or shut down.
    Notice,
    Warning,
    Error,
    Critical,
    /// A person must take an action immediately.
    Alert,
    /// One or more systems are unusable.
    Emergency,
}

#[cfg(test)]
mod tests {
    use super::Severity;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn renders_backend_names() {
        let names: Vec<String> = Severity::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "DEFAULT",
                "DEBUG",
                "INFO",
                "NOTICE",
                "WARNING",
                "ERROR",
                "CRITICAL",
                "ALERT",
                "EMERGENCY"
            ]
        );
    }

    #[test]
    fn parses_any_case() {
        assert_eq!(Severity::from_str("warning").unwrap(), Severity::Warning);
        assert_eq!(Severity::from_str("Emergency").unwrap(), Severity::Emergency);
        assert!(Severity::from_str("warn").is_err());
    }

    #[test]
    fn ordered_by_importance() {
        assert!(Severity::Default < Severity::Debug);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Alert < Severity::Emergency);
    }
}
