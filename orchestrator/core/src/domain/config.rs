// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Frontdesk Configuration Types
//
// Defines the configuration schema for a Frontdesk node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Knowledge matching thresholds
// - Embedding provider selection (BYO embedding API)
// - Escalation backend and wait limits
// - Storage backend, network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "frontdesk.dev/v1";
pub const KIND: &str = "FrontdeskConfig";

const EMBEDDING_PROVIDER_TYPES: [&str; 3] = ["gemini", "openai", "hash"];

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontdeskConfigManifest {
    /// API version (must be "frontdesk.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FrontdeskConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: FrontdeskConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Manifest body (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontdeskConfigSpec {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Minimum cosine similarity for a stored answer to be reused
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Minimum lexical similarity that rescues a low-cosine match
    #[serde(default = "default_lexical_threshold")]
    pub lexical_threshold: f64,

    #[serde(default)]
    pub backfill: BackfillConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_backfill_interval")]
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type: "gemini", "openai" or "hash"
    #[serde(rename = "type", default = "default_embedding_type")]
    pub provider_type: String,

    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key; supports "env:VAR_NAME" indirection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Vector size for the hash provider
    #[serde(default = "default_hash_dimensions")]
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Help desk API the receptionist files requests with
    #[serde(default = "default_escalation_url")]
    pub backend_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How long a conversation waits for a supervisor answer
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" or "sled"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Database directory for the sled backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser (supervisor dashboard)
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus listener port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_match_threshold() -> f64 {
    0.55
}

fn default_lexical_threshold() -> f64 {
    0.6
}

fn default_backfill_interval() -> u64 {
    600
}

fn default_embedding_type() -> String {
    "gemini".to_string()
}

fn default_embedding_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "models/text-embedding-004".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_hash_dimensions() -> usize {
    384
}

fn default_escalation_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_max_wait() -> u64 {
    3600
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            lexical_threshold: default_lexical_threshold(),
            backfill: BackfillConfig::default(),
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_backfill_interval(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider_type: default_embedding_type(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key: Some("env:GOOGLE_API_KEY".to_string()),
            timeout_seconds: default_request_timeout(),
            dimensions: default_hash_dimensions(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            backend_url: default_escalation_url(),
            request_timeout_seconds: default_request_timeout(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for FrontdeskConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "frontdesk".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: FrontdeskConfigSpec::default(),
        }
    }
}

impl FrontdeskConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. FRONTDESK_CONFIG_PATH environment variable
    /// 2. ./frontdesk-config.yaml (working directory)
    /// 3. ~/.frontdesk/config.yaml (user home)
    /// 4. /etc/frontdesk/config.yaml (system, Unix) or C:\ProgramData\Frontdesk\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FRONTDESK_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./frontdesk-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".frontdesk").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/frontdesk/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Frontdesk\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides()?;
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration.
    /// Thresholds that do not parse as floats are an error, not a warning.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(val) = lookup("KB_MATCH_THRESHOLD") {
            self.spec.knowledge.match_threshold = parse_threshold("KB_MATCH_THRESHOLD", &val)?;
            tracing::info!("Environment override: KB_MATCH_THRESHOLD={}", val.trim());
        }

        if let Some(val) = lookup("KB_LEXICAL_THRESHOLD") {
            self.spec.knowledge.lexical_threshold = parse_threshold("KB_LEXICAL_THRESHOLD", &val)?;
            tracing::info!("Environment override: KB_LEXICAL_THRESHOLD={}", val.trim());
        }

        if let Some(val) = lookup("FRONTDESK_ESCALATION_URL") {
            if !val.trim().is_empty() {
                tracing::info!("Environment override: FRONTDESK_ESCALATION_URL={}", val.trim());
                self.spec.escalation.backend_url = val.trim().to_string();
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let knowledge = &self.spec.knowledge;
        for (name, value) in [
            ("match_threshold", knowledge.match_threshold),
            ("lexical_threshold", knowledge.lexical_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("spec.knowledge.{} must be within [0, 1], got {}", name, value);
            }
        }
        if knowledge.backfill.enabled && knowledge.backfill.interval_seconds == 0 {
            anyhow::bail!("spec.knowledge.backfill.interval_seconds must be greater than zero");
        }

        let embedding = &self.spec.embedding;
        if !EMBEDDING_PROVIDER_TYPES.contains(&embedding.provider_type.as_str()) {
            anyhow::bail!(
                "Unknown embedding provider type: '{}'. Expected one of {:?}",
                embedding.provider_type,
                EMBEDDING_PROVIDER_TYPES
            );
        }
        if embedding.provider_type != "hash" {
            if embedding.endpoint.trim().is_empty() {
                anyhow::bail!("Embedding endpoint cannot be empty for: {}", embedding.provider_type);
            }
            if embedding.model.trim().is_empty() {
                anyhow::bail!("Embedding model cannot be empty for: {}", embedding.provider_type);
            }
        } else if embedding.dimensions == 0 {
            anyhow::bail!("spec.embedding.dimensions must be greater than zero");
        }
        if embedding.timeout_seconds == 0 {
            anyhow::bail!("spec.embedding.timeout_seconds must be greater than zero");
        }

        let escalation = &self.spec.escalation;
        if escalation.backend_url.trim().is_empty() {
            anyhow::bail!("spec.escalation.backend_url cannot be empty");
        }
        if escalation.request_timeout_seconds == 0 || escalation.max_wait_seconds == 0 {
            anyhow::bail!("spec.escalation timeouts must be greater than zero");
        }

        match self.spec.storage.backend.as_str() {
            "memory" => {}
            "sled" => {
                if self.spec.storage.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
                    anyhow::bail!("spec.storage.path is required for the sled backend");
                }
            }
            other => anyhow::bail!("Unknown storage backend: '{}'. Expected 'memory' or 'sled'", other),
        }

        Ok(())
    }
}

fn parse_threshold(name: &str, raw: &str) -> anyhow::Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number in [0, 1], got '{}'", name, raw))?;
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{} must be within [0, 1], got {}", name, value);
    }
    Ok(value)
}

/// Resolve an API key that may use the "env:VAR_NAME" indirection
pub fn resolve_api_key(value: &str) -> anyhow::Result<String> {
    if let Some(var) = value.strip_prefix("env:") {
        std::env::var(var)
            .map_err(|_| anyhow::anyhow!("Environment variable {} is not set", var))
    } else {
        Ok(value.to_string())
    }
}
