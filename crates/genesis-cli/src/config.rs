use anyhow::{Context, Result, bail};
use genesis_core::{DispatcherConfig, GeminiEndpoint, SpeechConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub support: SupportConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub analyst: AnalystConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.0-flash-exp".to_string()
}

/// Credentials and placement for Gemini and BigQuery.
///
/// An access token selects Vertex AI (and enables BigQuery); otherwise the
/// API key selects the Generative Language endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub access_token: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("api_key", &mask_secret(&self.api_key))
            .field("access_token", &mask_secret(&self.access_token))
            .finish()
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            location: default_location(),
            api_key: String::new(),
            access_token: String::new(),
        }
    }
}

fn default_project() -> String {
    "bank-moc".to_string()
}

fn default_location() -> String {
    "us-central1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default = "default_datastore")]
    pub datastore: String,
    #[serde(default = "default_support_temperature")]
    pub temperature: f32,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            datastore: default_datastore(),
            temperature: default_support_temperature(),
        }
    }
}

fn default_datastore() -> String {
    DispatcherConfig::default().support_datastore
}

fn default_support_temperature() -> f32 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_sample_rate() -> u32 {
    24000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    #[serde(default = "default_table")]
    pub table: String,
    /// BigQuery job location
    #[serde(default = "default_bq_location")]
    pub location: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            location: default_bq_location(),
            limit: default_limit(),
        }
    }
}

fn default_table() -> String {
    "bank-moc.bank_demo.transaction_records".to_string()
}

fn default_bq_location() -> String {
    "US".to_string()
}

fn default_limit() -> usize {
    50
}

/// Mask a secret for display. Shows first 3 and last 4 chars of longer keys.
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".genesis")
}

impl GenesisConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        check_permissions(&path)?;

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `genesis init` first.",
                path.display()
            )
        })?;

        let config = Self::parse(&content, |name| std::env::var(name).ok())
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        if config.google.api_key.starts_with("AIza") {
            warn!(
                "API key is hardcoded in config file. For security, use environment variables: api_key = \"${{GOOGLE_AI_API_KEY}}\""
            );
        }
        if config.google.access_token.starts_with("ya29.") {
            warn!(
                "Access token is hardcoded in config file. For security, use environment variables: access_token = \"${{GOOGLE_ACCESS_TOKEN}}\""
            );
        }

        Ok(config)
    }

    /// Parse TOML after expanding allowlisted `${VAR}` references via `lookup`
    fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Socket address for the gateway, with an optional port override
    pub fn bind_addr(&self, port: Option<u16>) -> Result<SocketAddr> {
        let port = port.unwrap_or(self.server.port);
        format!("{}:{}", self.server.bind, port)
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.server.bind))
    }

    /// Pick the Gemini endpoint from the configured credentials
    pub fn gemini_endpoint(&self) -> Result<GeminiEndpoint> {
        let google = &self.google;
        if !google.access_token.is_empty() && !google.project.is_empty() {
            return Ok(GeminiEndpoint::VertexAi {
                project: google.project.clone(),
                location: google.location.clone(),
                access_token: google.access_token.clone(),
            });
        }
        if !google.api_key.is_empty() {
            return Ok(GeminiEndpoint::GenerativeLanguage {
                api_key: google.api_key.clone(),
            });
        }
        bail!(
            "No Gemini credentials configured. Set google.access_token (Vertex AI) \
             or google.api_key (Generative Language API)."
        )
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            support_datastore: self.support.datastore.clone(),
            support_temperature: self.support.temperature,
            analyst_limit: self.analyst.limit,
        }
    }

    pub fn speech_config(&self) -> SpeechConfig {
        SpeechConfig {
            voice: self.news.voice.clone(),
            sample_rate: self.news.sample_rate,
        }
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.google.api_key = mask_secret(&config.google.api_key);
        config.google.access_token = mask_secret(&config.google.access_token);
        config
    }
}

/// Refuse config files that group or other can read (Unix only)
fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            let mode = metadata.permissions().mode();
            if mode & 0o077 != 0 {
                bail!(
                    "Config file {:?} has overly permissive permissions ({:o}). \
                     It may contain secrets. Fix with: chmod 600 {:?}",
                    path,
                    mode & 0o777,
                    path
                );
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Environment variables that may be expanded in config files
const ALLOWED_ENV_VARS: &[&str] = &[
    "GOOGLE_AI_API_KEY",
    "GOOGLE_ACCESS_TOKEN",
    "GOOGLE_CLOUD_PROJECT",
    "GENESIS_DATASTORE",
    "HOME",
    "USER",
];

fn expand_env_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            pos = abs_start + end + 1;
            continue;
        }

        let value = lookup(&var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value.len();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(name: &str) -> Option<String> {
        match name {
            "GOOGLE_AI_API_KEY" => Some("AIzaTestKey123456".to_string()),
            "GOOGLE_ACCESS_TOKEN" => Some("ya29.token-abcdef".to_string()),
            "HOME" => Some("/home/genesis".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_match_deployment() {
        let config = GenesisConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.name, "gemini-2.0-flash-exp");
        assert_eq!(config.google.project, "bank-moc");
        assert_eq!(config.google.location, "us-central1");
        assert_eq!(config.analyst.table, "bank-moc.bank_demo.transaction_records");
        assert_eq!(config.analyst.location, "US");
        assert_eq!(config.analyst.limit, 50);
        assert_eq!(config.news.voice, "Kore");
        assert_eq!(config.news.sample_rate, 24000);
        assert!(config.support.datastore.ends_with("bank-moc-faq_1765851574533"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = GenesisConfig::parse("", env).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.support.temperature, 0.1);
    }

    #[test]
    fn test_bundled_default_config_parses() {
        let config = GenesisConfig::parse(include_str!("../../../config/default.toml"), env).unwrap();
        assert_eq!(config.google.api_key, "AIzaTestKey123456");
        assert_eq!(config.google.access_token, "ya29.token-abcdef");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_expand_allowlisted_vars() {
        let out = expand_env_vars("key = \"${GOOGLE_AI_API_KEY}\" home=${HOME}", env);
        assert_eq!(out, "key = \"AIzaTestKey123456\" home=/home/genesis");
    }

    #[test]
    fn test_expand_skips_unknown_vars() {
        let out = expand_env_vars("a = \"${AWS_SECRET_ACCESS_KEY}\" b = \"${HOME}\"", env);
        assert_eq!(out, "a = \"${AWS_SECRET_ACCESS_KEY}\" b = \"/home/genesis\"");
    }

    #[test]
    fn test_expand_unset_var_is_empty() {
        let out = expand_env_vars("p = \"${GOOGLE_CLOUD_PROJECT}\"", env);
        assert_eq!(out, "p = \"\"");
    }

    #[test]
    fn test_endpoint_selection() {
        let mut config = GenesisConfig::default();
        assert!(config.gemini_endpoint().is_err());

        config.google.api_key = "AIzaKey".to_string();
        assert_eq!(config.gemini_endpoint().unwrap().label(), "generative_language");

        config.google.access_token = "ya29.tok".to_string();
        assert_eq!(config.gemini_endpoint().unwrap().label(), "vertex_ai");
    }

    #[test]
    fn test_bind_addr_override() {
        let config = GenesisConfig::default();
        assert_eq!(config.bind_addr(None).unwrap().port(), 8000);
        assert_eq!(config.bind_addr(Some(9090)).unwrap().port(), 9090);

        let mut bad = GenesisConfig::default();
        bad.server.bind = "not an ip".to_string();
        assert!(bad.bind_addr(None).is_err());
    }

    #[test]
    fn test_secrets_masked() {
        let mut config = GenesisConfig::default();
        config.google.api_key = "AIzaSyVerySecretKey9876".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("VerySecret"));
        assert!(debug.contains("AIz...9876"));

        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("VerySecret"));
        assert!(shown.contains("(empty)"));
    }

    #[test]
    fn test_mask_secret_short_and_multibyte() {
        assert_eq!(mask_secret(""), "(empty)");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("秘密のキーです長い"), "秘密の...です長い");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nport = 8123\n\n[analyst]\nlimit = 10").unwrap();
        drop(file);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }

        let config = GenesisConfig::load(&Some(path)).unwrap();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.analyst.limit, 10);
        assert_eq!(config.dispatcher_config().analyst_limit, 10);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_rejects_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = GenesisConfig::load(&Some(path)).unwrap_err();
        assert!(err.to_string().contains("chmod 600"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GenesisConfig::load(&Some(dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("genesis init"));
    }
}
