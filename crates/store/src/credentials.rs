use std::fmt;

use anyhow::{Context, Result, bail};
use loadgen_runtime::{PROJECT_ID_ENV, SERVICE_ACCOUNT_ENV};
use log::warn;
use serde_json::{Map, Value};

/// Project and service account the store connection is opened with.
#[derive(Clone)]
pub struct Credentials {
    pub project_id: String,
    service_account: Map<String, Value>,
}

impl Credentials {
    /// Read `FIREBASE_PROJECT_ID` and `FIREBASE_SERVICE_ACCOUNT_JSON`.
    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var(PROJECT_ID_ENV).unwrap_or_default();
        let service_account = std::env::var(SERVICE_ACCOUNT_ENV).unwrap_or_default();
        Self::from_values(&project_id, &service_account)
    }

    pub fn from_values(project_id: &str, service_account_json: &str) -> Result<Self> {
        if project_id.is_empty() {
            bail!("{PROJECT_ID_ENV} not set");
        }

        let trimmed = service_account_json.trim();
        if trimmed.is_empty() {
            bail!("{SERVICE_ACCOUNT_ENV} not set");
        }

        let value: Value = serde_json::from_str(trimmed)
            .with_context(|| format!("{SERVICE_ACCOUNT_ENV} is not valid JSON"))?;
        let Value::Object(service_account) = value else {
            bail!("{SERVICE_ACCOUNT_ENV} must be a JSON object");
        };

        if let Some(Value::String(embedded)) = service_account.get("project_id")
            && embedded != project_id
        {
            warn!(
                "service account belongs to project {embedded:?} but {PROJECT_ID_ENV} is {project_id:?}"
            );
        }

        Ok(Self {
            project_id: project_id.to_owned(),
            service_account,
        })
    }

    pub fn client_email(&self) -> Option<&str> {
        self.service_account.get("client_email")?.as_str()
    }
}

// Keys stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
