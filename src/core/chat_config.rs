//! Generation settings for a chat session and their validation rules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::models::{find_model, DEFAULT_MODEL_ID};
use crate::core::error::ChatError;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS_LIMIT: u32 = 8192;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

pub type SafetyThresholds = BTreeMap<HarmCategory, BlockThreshold>;

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn as_api_str(self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }

    /// Short name used in commands and the defaults file.
    pub fn key(self) -> &'static str {
        match self {
            HarmCategory::Harassment => "harassment",
            HarmCategory::HateSpeech => "hate-speech",
            HarmCategory::SexuallyExplicit => "sexually-explicit",
            HarmCategory::DangerousContent => "dangerous-content",
        }
    }
}

impl fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HarmCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = normalized
            .strip_prefix("harm-category-")
            .unwrap_or(normalized.as_str());
        match normalized {
            "harassment" => Ok(HarmCategory::Harassment),
            "hate" | "hate-speech" => Ok(HarmCategory::HateSpeech),
            "sexual" | "sexually-explicit" => Ok(HarmCategory::SexuallyExplicit),
            "dangerous" | "dangerous-content" => Ok(HarmCategory::DangerousContent),
            _ => Err(format!("unknown harm category: {s}")),
        }
    }
}

impl BlockThreshold {
    pub fn as_api_str(self) -> &'static str {
        match self {
            BlockThreshold::BlockNone => "BLOCK_NONE",
            BlockThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            BlockThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            BlockThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            BlockThreshold::BlockNone => "none",
            BlockThreshold::BlockOnlyHigh => "high",
            BlockThreshold::BlockMediumAndAbove => "medium",
            BlockThreshold::BlockLowAndAbove => "low",
        }
    }
}

impl fmt::Display for BlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BlockThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "block_none" => Ok(BlockThreshold::BlockNone),
            "high" | "only_high" | "block_only_high" => Ok(BlockThreshold::BlockOnlyHigh),
            "medium" | "medium_and_above" | "block_medium_and_above" => {
                Ok(BlockThreshold::BlockMediumAndAbove)
            }
            "low" | "low_and_above" | "block_low_and_above" => {
                Ok(BlockThreshold::BlockLowAndAbove)
            }
            _ => Err(format!("unknown block threshold: {s}")),
        }
    }
}

pub fn default_safety_thresholds() -> SafetyThresholds {
    HarmCategory::ALL
        .into_iter()
        .map(|category| (category, BlockThreshold::BlockMediumAndAbove))
        .collect()
}

/// Active generation settings. Fields are only reachable through
/// [`ChatConfig::apply`], so every value held here has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    model_id: String,
    temperature: f32,
    max_output_tokens: u32,
    system_prompt: Option<String>,
    safety_thresholds: SafetyThresholds,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            system_prompt: None,
            safety_thresholds: default_safety_thresholds(),
        }
    }
}

/// A partial update to [`ChatConfig`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// `Some(None)` clears the system prompt.
    pub system_prompt: Option<Option<String>>,
    /// Merged per category; categories not listed keep their threshold.
    pub safety_thresholds: SafetyThresholds,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    pub fn safety_threshold(mut self, category: HarmCategory, threshold: BlockThreshold) -> Self {
        self.safety_thresholds.insert(category, threshold);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &ConfigPatch::default()
    }
}

impl ChatConfig {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn safety_thresholds(&self) -> &SafetyThresholds {
        &self.safety_thresholds
    }

    pub fn threshold_for(&self, category: HarmCategory) -> Option<BlockThreshold> {
        self.safety_thresholds.get(&category).copied()
    }

    /// Merge `patch` into this config. Every field is validated before any of
    /// them is written, so a failure leaves the config exactly as it was.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), ChatError> {
        let mut next = self.clone();

        if let Some(model_id) = &patch.model_id {
            next.model_id = validate_model_id(model_id)?;
        }
        if let Some(temperature) = patch.temperature {
            next.temperature = validate_temperature(temperature)?;
        }
        if let Some(max_output_tokens) = patch.max_output_tokens {
            next.max_output_tokens = validate_max_output_tokens(max_output_tokens)?;
        }
        if let Some(prompt) = &patch.system_prompt {
            next.system_prompt = normalize_system_prompt(prompt.as_deref());
        }
        for (category, threshold) in &patch.safety_thresholds {
            next.safety_thresholds.insert(*category, *threshold);
        }

        *self = next;
        Ok(())
    }
}

/// Resolve a model id (or display name) to its canonical catalogue id.
pub fn validate_model_id(model_id: &str) -> Result<String, ChatError> {
    find_model(model_id)
        .map(|model| model.id.to_string())
        .ok_or_else(|| ChatError::UnsupportedModel(model_id.trim().to_string()))
}

pub fn validate_temperature(temperature: f32) -> Result<f32, ChatError> {
    if temperature.is_finite() && (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(ChatError::InvalidConfig {
            field: "temperature",
            reason: format!(
                "{temperature} is outside [{MIN_TEMPERATURE:.1}, {MAX_TEMPERATURE:.1}]"
            ),
        })
    }
}

pub fn validate_max_output_tokens(max_output_tokens: u32) -> Result<u32, ChatError> {
    if (1..=MAX_OUTPUT_TOKENS_LIMIT).contains(&max_output_tokens) {
        Ok(max_output_tokens)
    } else {
        Err(ChatError::InvalidConfig {
            field: "max_output_tokens",
            reason: format!("{max_output_tokens} is outside [1, {MAX_OUTPUT_TOKENS_LIMIT}]"),
        })
    }
}

pub fn normalize_system_prompt(prompt: Option<&str>) -> Option<String> {
    prompt
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn parse_temperature(input: &str) -> Result<f32, ChatError> {
    let value = input
        .trim()
        .parse::<f32>()
        .map_err(|_| ChatError::InvalidConfig {
            field: "temperature",
            reason: format!("'{}' is not a number", input.trim()),
        })?;
    validate_temperature(value)
}

pub fn parse_max_output_tokens(input: &str) -> Result<u32, ChatError> {
    let value = input
        .trim()
        .parse::<u32>()
        .map_err(|_| ChatError::InvalidConfig {
            field: "max_output_tokens",
            reason: format!("'{}' is not a positive integer", input.trim()),
        })?;
    validate_max_output_tokens(value)
}

pub fn parse_safety_setting(
    category: &str,
    threshold: &str,
) -> Result<(HarmCategory, BlockThreshold), ChatError> {
    let category = category
        .parse::<HarmCategory>()
        .map_err(|reason| ChatError::InvalidConfig {
            field: "safety_thresholds",
            reason,
        })?;
    let threshold = threshold
        .parse::<BlockThreshold>()
        .map_err(|reason| ChatError::InvalidConfig {
            field: "safety_thresholds",
            reason,
        })?;
    Ok((category, threshold))
}
