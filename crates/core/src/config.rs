//! Configuration management for TextFusion.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults (Tavily, Groq, k = 3, temperature 0.0)
//! - Config file (`.textfusion/config.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags
//!
//! The resulting [`AppConfig`] is built once at startup and passed by
//! reference into the search pipeline. Nothing is written back into the
//! process environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the completion client factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["groq", "openai"];

/// Default number of search results fed into the prompt.
pub const DEFAULT_MAX_RESULTS: u32 = 3;

/// Default sampling temperature (fully deterministic sampling).
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

/// Default search service endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com";

/// An API credential. Never printed in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Expose the raw credential for an outbound request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the workspace root (contains .textfusion/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Search service settings
    pub retriever: RetrieverSettings,

    /// Completion service settings
    pub llm: LlmSettings,

    /// Optional prompt definition file replacing the built-in template
    pub prompt_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Search service settings.
#[derive(Debug, Clone)]
pub struct RetrieverSettings {
    /// Environment variable holding the search API key
    pub api_key_env: String,

    /// Resolved search API key
    pub api_key: Option<ApiKey>,

    /// Retrieval width (k)
    pub max_results: u32,

    /// Base URL of the search service
    pub endpoint: String,
}

/// Completion service settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Provider identifier ("groq", "openai")
    pub provider: String,

    /// Environment variable holding the completion API key
    pub api_key_env: String,

    /// Resolved completion API key
    pub api_key: Option<ApiKey>,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Optional base URL override (provider default otherwise)
    pub endpoint: Option<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    retriever: Option<RetrieverSection>,
    llm: Option<LlmSection>,
    prompt: Option<PromptSection>,
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieverSection {
    api_key_env: Option<String>,
    max_results: Option<u32>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    api_key_env: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PromptSection {
    file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            api_key_env: "TAVILY_API_KEY".to_string(),
            api_key: None,
            max_results: DEFAULT_MAX_RESULTS,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            endpoint: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            retriever: RetrieverSettings::default(),
            llm: LlmSettings::default(),
            prompt_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `TEXTFUSION_WORKSPACE`: Override workspace path
    /// - `TEXTFUSION_CONFIG`: Path to config file
    /// - `TEXTFUSION_PROVIDER`: Completion provider
    /// - `TEXTFUSION_MODEL`: Model identifier
    /// - `TEXTFUSION_MAX_RESULTS`: Retrieval width
    /// - `RUST_LOG`: Log filter, used by logging when no level is configured
    /// - `NO_COLOR`: Disable colored output
    ///
    /// API keys are read from the variables named by `apiKeyEnv`
    /// (`TAVILY_API_KEY` and `GROQ_API_KEY` by default).
    ///
    /// # Example
    /// ```no_run
    /// use textfusion_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Model: {}", config.llm.model);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit paths win over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("TEXTFUSION_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("TEXTFUSION_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.textfusion_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        config.apply_env(|name| std::env::var(name).ok())?;

        Ok(config)
    }

    /// Apply the `TEXTFUSION_*` and `NO_COLOR` variables, then resolve API keys.
    ///
    /// `RUST_LOG` is not copied here; logging falls back to it on its own
    /// when no level was configured.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("TEXTFUSION_PROVIDER") {
            self.llm.provider = provider;
        }

        if let Some(model) = lookup("TEXTFUSION_MODEL") {
            self.llm.model = model;
        }

        if let Some(max_results) = lookup("TEXTFUSION_MAX_RESULTS") {
            self.retriever.max_results = max_results.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "TEXTFUSION_MAX_RESULTS must be a positive integer, got '{}'",
                    max_results
                ))
            })?;
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        self.resolve_api_keys(lookup);
        Ok(())
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Config(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents).map_err(|e| AppError::Config(e.to_string()))?
        };

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retriever) = config_file.retriever {
            if let Some(env) = retriever.api_key_env {
                result.retriever.api_key_env = env;
            }
            if let Some(max_results) = retriever.max_results {
                result.retriever.max_results = max_results;
            }
            if let Some(endpoint) = retriever.endpoint {
                result.retriever.endpoint = endpoint;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.llm.provider = provider;
            }
            if let Some(env) = llm.api_key_env {
                result.llm.api_key_env = env;
            }
            if let Some(model) = llm.model {
                result.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                result.llm.temperature = temperature;
            }
            if llm.endpoint.is_some() {
                result.llm.endpoint = llm.endpoint;
            }
        }

        // Relative prompt paths resolve against the workspace
        if let Some(file) = config_file.prompt.and_then(|p| p.file) {
            let path = PathBuf::from(file);
            result.prompt_file = Some(if path.is_relative() {
                result.workspace.join(path)
            } else {
                path
            });
        }

        Ok(result)
    }

    /// Fill in API keys from the variables named by `api_key_env`.
    ///
    /// Blank values are treated as absent.
    pub fn resolve_api_keys<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(ApiKey::new)
        };

        self.retriever.api_key = resolve(&self.retriever.api_key_env);
        self.llm.api_key = resolve(&self.llm.api_key_env);
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the
    /// config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        max_results: Option<u32>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(max_results) = max_results {
            self.retriever.max_results = max_results;
        }

        if verbose {
            self.verbose = true;
        }

        // An explicit --log-level wins; --verbose beats config file and env
        match log_level {
            Some(log_level) => self.log_level = Some(log_level),
            None if verbose => self.log_level = Some("debug".to_string()),
            None => {}
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .textfusion directory.
    pub fn textfusion_dir(&self) -> PathBuf {
        self.workspace.join(".textfusion")
    }

    /// Validate everything the pipeline needs before it is constructed.
    ///
    /// Missing credentials fail here rather than on the first search.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if !self.llm.temperature.is_finite() || !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.retriever.max_results == 0 {
            return Err(AppError::Config(
                "Retrieval width (maxResults) must be at least 1".to_string(),
            ));
        }

        validate_endpoint("retriever.endpoint", &self.retriever.endpoint)?;
        if let Some(ref endpoint) = self.llm.endpoint {
            validate_endpoint("llm.endpoint", endpoint)?;
        }

        if self.retriever.api_key.is_none() {
            return Err(AppError::Config(format!(
                "Search API key not found in environment variable: {}",
                self.retriever.api_key_env
            )));
        }

        if self.llm.api_key.is_none() {
            return Err(AppError::Config(format!(
                "Completion API key not found in environment variable: {}",
                self.llm.api_key_env
            )));
        }

        Ok(())
    }
}

fn validate_endpoint(field: &str, endpoint: &str) -> AppResult<()> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, endpoint
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.resolve_api_keys(|name| match name {
            "TAVILY_API_KEY" => Some("tvly-test".to_string()),
            "GROQ_API_KEY" => Some("gsk-test".to_string()),
            _ => None,
        });
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.model, "mixtral-8x7b-32768");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.retriever.max_results, 3);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_textfusion_dir() {
        let config = AppConfig::default();
        assert!(config.textfusion_dir().ends_with(".textfusion"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            Some(5),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "openai");
        assert_eq!(overridden.llm.model, "gpt-4o-mini");
        assert_eq!(overridden.retriever.max_results, 5);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_verbose_overrides_configured_level() {
        let mut config = AppConfig::default()
            .merge_yaml_str("logging:\n  level: warn\n")
            .unwrap();
        config.apply_env(env(&[("RUST_LOG", "warn")])).unwrap();

        let config = config.with_overrides(None, None, None, None, true, false);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_log_level_beats_verbose() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            None,
            Some("trace".to_string()),
            true,
            false,
        );
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("trace".to_string()));
    }

    #[test]
    fn test_rust_log_is_left_to_logging() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("RUST_LOG", "warn")])).unwrap();
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("TEXTFUSION_PROVIDER", "openai"),
                ("TEXTFUSION_MODEL", "gpt-4o-mini"),
                ("TEXTFUSION_MAX_RESULTS", " 5 "),
                ("NO_COLOR", "1"),
                ("TAVILY_API_KEY", "tvly-test"),
                ("GROQ_API_KEY", "gsk-test"),
            ]))
            .unwrap();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.retriever.max_results, 5);
        assert!(config.no_color);
        assert_eq!(
            config.retriever.api_key.as_ref().map(ApiKey::expose),
            Some("tvly-test")
        );
        assert_eq!(config.llm.api_key.as_ref().map(ApiKey::expose), Some("gsk-test"));
    }

    #[test]
    fn test_apply_env_rejects_non_numeric_max_results() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("TEXTFUSION_MAX_RESULTS", "three")]))
            .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("'three'"));
    }

    #[test]
    fn test_apply_env_without_variables_keeps_defaults() {
        let mut config = AppConfig::default();
        config.apply_env(|_| None).unwrap();

        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.retriever.max_results, 3);
        assert!(!config.no_color);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
retriever:
  apiKeyEnv: MY_SEARCH_KEY
  maxResults: 5
llm:
  provider: openai
  model: gpt-4o-mini
  temperature: 0.2
  endpoint: http://localhost:9000/v1
prompt:
  file: prompts/search.yml
logging:
  level: debug
  color: false
"#;
        let base = AppConfig {
            workspace: PathBuf::from("/srv/textfusion"),
            ..AppConfig::default()
        };
        let merged = base.merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.retriever.api_key_env, "MY_SEARCH_KEY");
        assert_eq!(merged.retriever.max_results, 5);
        assert_eq!(merged.retriever.endpoint, DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(merged.llm.provider, "openai");
        assert_eq!(merged.llm.model, "gpt-4o-mini");
        assert_eq!(merged.llm.temperature, 0.2);
        assert_eq!(merged.llm.endpoint.as_deref(), Some("http://localhost:9000/v1"));
        assert_eq!(
            merged.prompt_file,
            Some(PathBuf::from("/srv/textfusion/prompts/search.yml"))
        );
        assert_eq!(merged.log_level, Some("debug".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let result = AppConfig::default().merge_yaml_str("llm: [not, a, map]");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_with_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "retriever:\n  maxResults: 7\n").unwrap();

        let config = AppConfig::load_with(
            Some(temp_dir.path().to_path_buf()),
            Some(config_path),
        )
        .unwrap();
        assert_eq!(config.retriever.max_results, 7);
    }

    #[test]
    fn test_load_missing_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp_dir.path().to_path_buf()),
            Some(temp_dir.path().join("missing.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_missing_workspace() {
        let result = AppConfig::load_with(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_complete_config() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_search_key() {
        let mut config = configured();
        config.retriever.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_validate_blank_completion_key() {
        let mut config = AppConfig::default();
        config.resolve_api_keys(|name| match name {
            "TAVILY_API_KEY" => Some("tvly-test".to_string()),
            "GROQ_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = configured();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = configured();
        config.llm.model = String::new();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = configured();
        config.retriever.max_results = 0;
        assert!(config.validate().is_err());

        let mut config = configured();
        config.retriever.endpoint = "api.tavily.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let config = configured();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("tvly-test"));
        assert!(!debug.contains("gsk-test"));
    }
}
