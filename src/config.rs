use crate::adapters::outbound::LlmEndpoint;
use crate::application::FailureHandling;
use crate::domains::environment::{default_name_denylist, MAX_OBJECT_EXTENT};
use crate::domains::history::DEFAULT_HISTORY_CAPACITY;
use crate::domains::narration::{
    FailurePolicy, PipelineSettings, DEFAULT_FAILURE_TEXT, DEFAULT_MAX_PRIOR_RESPONSES, DEFAULT_SUMMARY_PROMPT,
    DEFAULT_SYSTEM_PROMPT,
};
use crate::domains::relativity::{
    ClassifierMode, EventBuilder, ProximityGate, RelativePositionClassifier, HORIZONTAL_THRESHOLD,
    PROXIMITY_THRESHOLD, VERTICAL_THRESHOLD,
};
use crate::common::DomainError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "STORYGEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub classifier: ClassifierConfig,
    pub proximity: ProximityConfig,
    pub history: HistoryConfig,
    pub environment: EnvironmentConfig,
    pub llm: LlmConfig,
    pub response: ResponseConfig,
    pub summary: SummaryConfig,
    pub hud: HudConfig,
    pub journal: JournalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub sample_interval_ms: u64,
    pub position_epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub mode: ClassifierMode,
    pub vertical_threshold: f64,
    pub horizontal_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub max_prior_responses: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub scene_path: String,
    pub name_denylist: Vec<String>,
    pub max_extent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenaiChat,
    Completions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub path: String,
    pub failure_policy: FailurePolicy,
    pub failure_text: String,
}

/// World summary requested once at startup and shown in its own HUD pane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub enabled: bool,
    pub path: String,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub poll_interval_ms: u64,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Also write domain logs to this file through fast_log.
    pub file: Option<String>,
    pub buffered: bool,
    pub buffer_capacity: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            position_epsilon: crate::common::KINDA_SMALL_NUMBER,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::ThreeAxis,
            vertical_threshold: VERTICAL_THRESHOLD,
            horizontal_threshold: HORIZONTAL_THRESHOLD,
        }
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            threshold: PROXIMITY_THRESHOLD,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            max_prior_responses: DEFAULT_MAX_PRIOR_RESPONSES,
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            scene_path: "resources/scenes/demo_scene.json".to_string(),
            name_denylist: default_name_denylist(),
            max_extent: MAX_OBJECT_EXTENT,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenaiChat,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 150,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 30,
            system_prompt: None,
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            path: crate::adapters::outbound::DEFAULT_RESPONSE_PATH.to_string(),
            failure_policy: FailurePolicy::WriteFailureText,
            failure_text: DEFAULT_FAILURE_TEXT.to_string(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: crate::adapters::outbound::DEFAULT_SUMMARY_PATH.to_string(),
            system_prompt: None,
        }
    }
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4000,
            lines: 3,
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "journal".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            buffered: false,
            buffer_capacity: 1024,
        }
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Layers an optional TOML file under `STORYGEN__SECTION__KEY` environment
    /// overrides, on top of the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.sample_interval_ms == 0 {
            return Err(invalid("tracking.sample_interval_ms must be positive"));
        }
        if self.tracking.position_epsilon.is_nan() || self.tracking.position_epsilon < 0.0 {
            return Err(invalid("tracking.position_epsilon must be non-negative"));
        }
        for (name, value) in [
            ("classifier.vertical_threshold", self.classifier.vertical_threshold),
            ("classifier.horizontal_threshold", self.classifier.horizontal_threshold),
        ] {
            if !is_positive(value) || value > 1.0 {
                return Err(invalid(format!("{} must be within (0, 1], got {}", name, value)));
            }
        }
        if !is_positive(self.proximity.threshold) {
            return Err(invalid("proximity.threshold must be positive"));
        }
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity must be positive"));
        }
        if !is_positive(self.environment.max_extent) {
            return Err(invalid("environment.max_extent must be positive"));
        }
        if self.hud.poll_interval_ms == 0 || self.hud.lines == 0 {
            return Err(invalid("hud.poll_interval_ms and hud.lines must be positive"));
        }
        if self.summary.enabled && self.summary.path == self.response.path {
            return Err(invalid("summary.path must differ from response.path"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.tracking.sample_interval_ms)
    }

    pub fn hud_poll_interval(&self) -> Duration {
        Duration::from_millis(self.hud.poll_interval_ms)
    }

    pub fn event_builder(&self) -> EventBuilder {
        EventBuilder::new(
            RelativePositionClassifier {
                mode: self.classifier.mode,
                vertical_threshold: self.classifier.vertical_threshold,
                horizontal_threshold: self.classifier.horizontal_threshold,
            },
            ProximityGate::new(self.proximity.threshold),
        )
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            system_prompt: self
                .llm
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_prior_responses: self.history.max_prior_responses,
        }
    }

    pub fn summary_prompt(&self) -> String {
        self.summary
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string())
    }

    pub fn failure_handling(&self) -> FailureHandling {
        FailureHandling {
            policy: self.response.failure_policy,
            text: self.response.failure_text.clone(),
        }
    }

    /// The API key is read from the environment here, never from the file.
    pub fn llm_endpoint(&self) -> LlmEndpoint {
        LlmEndpoint {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            api_key: self
                .llm
                .api_key_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
                .filter(|key| !key.is_empty()),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }
}

fn invalid(reason: impl Into<String>) -> anyhow::Error {
    DomainError::InvalidConfiguration { reason: reason.into() }.into()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
