use serde::{Deserialize, Serialize};

use super::LlmError;

/// Token cap sent with every completion unless the model sets its own.
pub const MAX_TOKENS: u32 = 16000;

/// One selectable model and where to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub model_key: String,
    pub label: String,
    pub provider: String,
    #[serde(default, skip_serializing)]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub use_image: bool,
    #[serde(default)]
    pub function_call: bool,
}

impl ModelEntry {
    fn new(model_key: &str, label: &str, provider: &str) -> Self {
        Self {
            model_key: model_key.to_string(),
            label: label.to_string(),
            provider: provider.to_string(),
            api_url: None,
            api_key: None,
            max_tokens: None,
            use_image: false,
            function_call: true,
        }
    }

    /// Output cap for this model. Claude models need an explicit one:
    /// 3.7 Sonnet accepts 128000, the others 8192.
    pub fn effective_max_tokens(&self) -> u32 {
        if let Some(max) = self.max_tokens {
            return max;
        }
        if self.provider.contains("claude") {
            if self.provider.contains("claude-3-7-sonnet") {
                128000
            } else {
                8192
            }
        } else {
            MAX_TOKENS
        }
    }
}

/// Endpoint used when a model entry carries no URL or key of its own.
#[derive(Debug, Clone, Default)]
pub struct DefaultProvider {
    pub api_url: String,
    pub api_key: String,
}

/// Resolved endpoint for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
    default_provider: DefaultProvider,
}

impl ModelRegistry {
    pub fn new(entries: Vec<ModelEntry>, default_provider: DefaultProvider) -> Self {
        Self {
            entries,
            default_provider,
        }
    }

    pub fn with_defaults(default_provider: DefaultProvider) -> Self {
        Self::new(default_models(), default_provider)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn resolve(&self, model_key: &str) -> Result<&ModelEntry, LlmError> {
        self.entries
            .iter()
            .find(|e| e.model_key == model_key)
            .ok_or_else(|| LlmError::UnknownModel(model_key.to_string()))
    }

    pub fn endpoint(&self, entry: &ModelEntry) -> Endpoint {
        Endpoint {
            api_url: entry
                .api_url
                .clone()
                .unwrap_or_else(|| self.default_provider.api_url.clone()),
            api_key: entry
                .api_key
                .clone()
                .unwrap_or_else(|| self.default_provider.api_key.clone()),
        }
    }
}

pub fn default_models() -> Vec<ModelEntry> {
    let mut gemini = ModelEntry::new("gemini-2.5-flash", "Gemini 2.5 Flash", "gemini");
    gemini.use_image = true;

    let mut sonnet_37 = ModelEntry::new("claude-3-7-sonnet", "Claude 3.7 Sonnet", "claude-3-7-sonnet");
    sonnet_37.use_image = true;

    let mut sonnet_35 = ModelEntry::new("claude-3-5-sonnet", "Claude 3.5 Sonnet", "claude");
    sonnet_35.use_image = true;

    vec![
        gemini,
        sonnet_37,
        sonnet_35,
        ModelEntry::new("gpt-4o-mini", "GPT-4o Mini", "openai"),
        ModelEntry::new("deepseek-chat", "DeepSeek V3", "deepseek"),
        ModelEntry::new("DeepSeek-R1", "DeepSeek R1", "deepseek"),
    ]
}
