//! Shared types used across Skiff crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user-supplied configuration payload for one deployment attempt.
///
/// Keys are recipe option names (lowercase snake case); values are
/// arbitrary scalars as submitted by the caller.
pub type UserConfig = BTreeMap<String, serde_json::Value>;

/// Render a config scalar as the string that ends up in an environment
/// variable. Strings pass through unquoted; everything else uses its
/// JSON form.
pub fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The closed set of configuration option types a recipe may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Number,
    Boolean,
    Password,
    Email,
    Secret,
    ApiKey,
    Domain,
    Hostname,
    /// Anything a source declared that we don't recognize.
    /// Recipe validation rejects this.
    #[serde(other)]
    Unknown,
}

impl OptionKind {
    /// Options whose values are secrets: auto-generated when the user
    /// leaves them blank, never logged.
    pub fn is_secret_like(&self) -> bool {
        matches!(self, OptionKind::Secret | OptionKind::Password | OptionKind::ApiKey)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Number => "number",
            OptionKind::Boolean => "boolean",
            OptionKind::Password => "password",
            OptionKind::Email => "email",
            OptionKind::Secret => "secret",
            OptionKind::ApiKey => "api_key",
            OptionKind::Domain => "domain",
            OptionKind::Hostname => "hostname",
            OptionKind::Unknown => "unknown",
        }
    }
}

/// A single named, typed configuration field a recipe exposes.
///
/// The `name` doubles as the config key and, upper-cased, as the
/// synthesized environment variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOption {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl ConfigOption {
    /// The environment variable this option synthesizes into.
    pub fn env_key(&self) -> String {
        self.name.to_uppercase()
    }
}

/// Minimum and recommended resource figures a recipe declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub min_ram_mb: u64,
    pub recommended_ram_mb: u64,
    pub min_storage_gb: u64,
    pub cpu_cores: u32,
}

impl ResourceRequirements {
    /// Conservative defaults for catalog feeds that carry no resource
    /// metadata.
    pub fn conservative() -> Self {
        Self {
            min_ram_mb: 512,
            recommended_ram_mb: 1024,
            min_storage_gb: 2,
            cpu_cores: 1,
        }
    }
}

/// Health check parameters for a deployed workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    #[serde(default = "default_health_path")]
    pub path: String,
    pub port: u16,
    #[serde(default = "default_health_status")]
    pub expected_status: u16,
    #[serde(default = "default_health_timeout")]
    pub timeout_secs: u64,
}

fn default_health_path() -> String {
    "/".to_string()
}

fn default_health_status() -> u16 {
    200
}

fn default_health_timeout() -> u64 {
    10
}

/// Database provisioning spec: whether a database should be allocated
/// for the deployment and under which env-var prefix its credentials
/// are injected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    #[serde(default)]
    pub auto_provision: bool,
    #[serde(default = "default_db_prefix")]
    pub env_prefix: String,
}

impl Default for DatabaseSpec {
    fn default() -> Self {
        Self {
            auto_provision: false,
            env_prefix: default_db_prefix(),
        }
    }
}

fn default_db_prefix() -> String {
    "DB_".to_string()
}

/// Provenance and quality metadata attached to a recipe by its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub source: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub quality_score: f32,
}

/// A declarative definition of a deployable service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub options: Vec<ConfigOption>,
    pub resources: ResourceRequirements,
    pub health_check: HealthCheckSpec,
    #[serde(default)]
    pub database: DatabaseSpec,
    /// The service definition shipped to the device, with `${VAR}`
    /// placeholders.
    pub template: String,
    /// Declared named storage volumes: volume name → mount description.
    #[serde(default)]
    pub volumes: BTreeMap<String, String>,
    pub metadata: RecipeMetadata,
}

impl Recipe {
    /// Look up a declared config option by name.
    pub fn option(&self, name: &str) -> Option<&ConfigOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Iterate the options the operator must supply.
    pub fn required_options(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.iter().filter(|o| o.required)
    }
}

/// Liveness status of a managed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Unknown,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, DeviceStatus::Online)
    }
}

/// A managed device, as read from the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Network address the remote executor reaches the device on.
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    pub status: DeviceStatus,
}

fn default_ssh_port() -> u16 {
    22
}

/// Identity of one concrete deployment of a recipe onto a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub recipe_slug: String,
    pub device_id: String,
    /// Compose project name used to namespace the workload on-device.
    pub compose_project: String,
}

/// Database engine families Skiff knows how to build connection
/// strings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Mysql,
}

impl DatabaseEngine {
    pub fn scheme(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgresql",
            DatabaseEngine::Mysql => "mysql",
        }
    }
}

/// A database instance and credential set allocated to a deployment.
/// The password itself stays in the vault, referenced by `password_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedDatabase {
    pub id: String,
    pub engine: DatabaseEngine,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password_key: String,
}

/// Live resource admission snapshot for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCheck {
    pub required_ram_mb: u64,
    pub available_ram_mb: u64,
    pub required_storage_gb: u64,
    pub available_storage_gb: u64,
    pub ram_sufficient: bool,
    pub storage_sufficient: bool,
    pub docker_installed: bool,
    pub docker_running: bool,
}

/// Aggregated verdict of one admission attempt.
///
/// Created fresh per call and never persisted. `valid` reflects only
/// the error list; warnings never affect validity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub resource_check: Option<ResourceCheck>,
    pub conflicting_ports: Option<Vec<u16>>,
    pub template_preview: Option<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hard-stop verdict carrying exactly one error.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn record_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Settle `valid` once every check has run.
    pub fn finalize(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}
