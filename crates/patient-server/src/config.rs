//! Runtime configuration.
//!
//! Sources, later ones winning: built-in defaults, the optional TOML file,
//! `PATIENT_SERVICE_*` environment variables, and finally the two table-name
//! variables `PATIENT_TABLE_NAME` and `AUDIT_TABLE_NAME`.

use std::{collections::HashMap, path::Path, path::PathBuf};

use patient_api::DispatchSettings;
use patient_store_sqlite::TableNames;
use serde::{Deserialize, Serialize};

/// Environment variable naming the patient table.
pub const PATIENT_TABLE_VAR: &str = "PATIENT_TABLE_NAME";
/// Environment variable naming the audit table.
pub const AUDIT_TABLE_VAR: &str = "AUDIT_TABLE_NAME";

const ENV_PREFIX: &str = "PATIENT_SERVICE";

/// Runtime server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub patient_table:       String,
  pub audit_table:         String,
  /// Answer 400 to unparseable bodies instead of treating them as `{}`.
  pub strict_json:         bool,
  pub max_list_limit:      usize,
  /// Audit the `X-Forwarded-For` address instead of the socket peer.
  pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let tables = TableNames::default();
    let dispatch = DispatchSettings::default();
    Self {
      host:                "0.0.0.0".to_owned(),
      port:                8080,
      store_path:          PathBuf::from("patients.db"),
      patient_table:       tables.patients,
      audit_table:         tables.audit,
      strict_json:         dispatch.strict_json,
      max_list_limit:      dispatch.max_list_limit,
      trust_forwarded_for: dispatch.trust_forwarded_for,
    }
  }
}

impl ServerConfig {
  /// Build the configuration from `file` (if it exists) and `env`.
  pub fn load(
    file: &Path,
    env: &HashMap<String, String>,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .try_parsing(true)
          .source(Some(env.clone())),
      )
      .set_override_option("patient_table", env.get(PATIENT_TABLE_VAR).cloned())?
      .set_override_option("audit_table", env.get(AUDIT_TABLE_VAR).cloned())?
      .build()?
      .try_deserialize()
  }

  pub fn tables(&self) -> TableNames {
    TableNames::new(&self.patient_table, &self.audit_table)
  }

  pub fn dispatch(&self) -> DispatchSettings {
    DispatchSettings {
      strict_json:         self.strict_json,
      max_list_limit:      self.max_list_limit,
      trust_forwarded_for: self.trust_forwarded_for,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
