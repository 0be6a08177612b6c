use std::path::PathBuf;

use googlelog::{CloudLogger, CloudLoggerBuilder};
use serde::Deserialize;

use crate::error::Error;
use crate::level::LevelModifier;
use crate::parser::LogParser;

/// Where logs go in Google Cloud and how to authenticate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GcpConfig {
    pub project_id: String,
    /// A service account key file. Without it, credentials come from the metadata
    /// server (workload identity).
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

impl GcpConfig {
    pub fn new(project_id: &str) -> Self {
        GcpConfig {
            project_id: project_id.to_string(),
            credentials_file: None,
        }
    }

    pub fn with_credentials_file(self, path: impl Into<PathBuf>) -> Self {
        GcpConfig {
            credentials_file: Some(path.into()),
            ..self
        }
    }

    /// A client builder for `log_id`, for callers that need more of its settings.
    pub fn client_builder(&self, log_id: &str) -> CloudLoggerBuilder {
        let builder = CloudLoggerBuilder::new(&self.project_id, log_id);
        match &self.credentials_file {
            Some(path) => builder.with_credentials_file(path.clone()),
            None => builder,
        }
    }

    pub fn cloud_logger(&self, log_id: &str) -> Result<CloudLogger, Error> {
        Ok(self.client_builder(log_id).build()?)
    }
}

/// Everything an [`EntryWriter`](crate::EntryWriter) needs.
#[derive(Debug, Clone, Default)]
pub struct GcpLogConfig {
    pub gcp: GcpConfig,
    pub log_id: String,
    pub parser: LogParser,
    pub level_modifier: LevelModifier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_from_json() {
        let config: GcpConfig = serde_json::from_str(
            r#"{"project_id": "my-project", "credentials_file": "/etc/gcp/key.json"}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            GcpConfig::new("my-project").with_credentials_file("/etc/gcp/key.json")
        );

        let config: GcpConfig = serde_json::from_str(r#"{"project_id": "p"}"#).unwrap();
        assert_eq!(config.credentials_file, None);
    }

    #[test]
    fn client_builder_addresses_the_log() {
        let builder = GcpConfig::new("my-project").client_builder("my-service");
        assert_eq!(
            builder.log_name().unwrap(),
            "projects/my-project/logs/my-service"
        );
    }

    #[test]
    fn bad_credentials_fail_construction() {
        let dir = tempfile::tempdir().unwrap();
        let config = GcpConfig::new("p").with_credentials_file(dir.path().join("absent.json"));
        assert!(matches!(
            config.cloud_logger("l"),
            Err(Error::Client(googlelog::Error::CredentialsFile { .. }))
        ));
    }

    #[test]
    fn empty_project_fails_construction() {
        assert!(matches!(
            GcpConfig::default().cloud_logger("l"),
            Err(Error::Client(googlelog::Error::MissingProjectId))
        ));
    }
}
