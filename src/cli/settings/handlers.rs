//! Handlers for each key of the defaults file.

use super::error::SettingError;
use super::{success_set, success_unset, SettingHandler};
use crate::core::chat_config::{
    normalize_system_prompt, parse_max_output_tokens, parse_safety_setting, parse_temperature,
    validate_model_id, HarmCategory,
};
use crate::core::config::data::Config;
use crate::core::error::ChatError;

fn invalid(key: &'static str) -> impl Fn(ChatError) -> SettingError {
    move |err| SettingError::InvalidValue {
        key,
        reason: err.to_string(),
    }
}

/// Handler for the `default-model` setting.
pub struct DefaultModelHandler;

impl SettingHandler for DefaultModelHandler {
    fn key(&self) -> &'static str {
        "default-model"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a default model, specify the model id or name:",
                example: "gemichat set default-model gemini-1.5-pro-latest",
            });
        }

        let model = validate_model_id(&args.join(" ")).map_err(invalid("default-model"))?;
        let message = success_set("default-model", &model);
        config.default_model = Some(model);
        Ok(message)
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.default_model = None;
        Ok(success_unset("default-model"))
    }
}

/// Handler for the `temperature` setting.
pub struct TemperatureHandler;

impl SettingHandler for TemperatureHandler {
    fn key(&self) -> &'static str {
        "temperature"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [value] = args else {
            return Err(SettingError::MissingArgs {
                hint: "To set a default temperature, give one value between 0.0 and 1.0:",
                example: "gemichat set temperature 0.4",
            });
        };

        let temperature = parse_temperature(value).map_err(invalid("temperature"))?;
        config.temperature = Some(temperature);
        Ok(success_set("temperature", &temperature.to_string()))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.temperature = None;
        Ok(success_unset("temperature"))
    }
}

/// Handler for the `max-output-tokens` setting.
pub struct MaxOutputTokensHandler;

impl SettingHandler for MaxOutputTokensHandler {
    fn key(&self) -> &'static str {
        "max-output-tokens"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [value] = args else {
            return Err(SettingError::MissingArgs {
                hint: "To set a reply length limit, give one number between 1 and 8192:",
                example: "gemichat set max-output-tokens 1024",
            });
        };

        let limit = parse_max_output_tokens(value).map_err(invalid("max-output-tokens"))?;
        config.max_output_tokens = Some(limit);
        Ok(success_set("max-output-tokens", &limit.to_string()))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.max_output_tokens = None;
        Ok(success_unset("max-output-tokens"))
    }
}

/// Handler for the `system-prompt` setting.
pub struct SystemPromptHandler;

impl SettingHandler for SystemPromptHandler {
    fn key(&self) -> &'static str {
        "system-prompt"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(prompt) = normalize_system_prompt(Some(&args.join(" "))) else {
            return Err(SettingError::MissingArgs {
                hint: "To set a system prompt, give the prompt text:",
                example: "gemichat set system-prompt You are a concise assistant.",
            });
        };

        let message = success_set("system-prompt", &prompt);
        config.system_prompt = Some(prompt);
        Ok(message)
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.system_prompt = None;
        Ok(success_unset("system-prompt"))
    }
}

/// Handler for the `safety` setting, keyed by harm category.
pub struct SafetyHandler;

impl SettingHandler for SafetyHandler {
    fn key(&self) -> &'static str {
        "safety"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [category, threshold] = args else {
            return Err(SettingError::MissingArgs {
                hint: "To set a safety threshold, give a category and a level (none, high, medium, low):",
                example: "gemichat set safety harassment low",
            });
        };

        let (category, threshold) =
            parse_safety_setting(category, threshold).map_err(invalid("safety"))?;
        config
            .safety
            .insert(category.key().to_string(), threshold.key().to_string());
        Ok(success_set(
            &format!("safety {}", category.key()),
            threshold.key(),
        ))
    }

    fn unset(&self, arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        let Some(category) = arg else {
            config.safety.clear();
            return Ok(success_unset("safety"));
        };

        let category = category
            .parse::<HarmCategory>()
            .map_err(|reason| SettingError::InvalidValue {
                key: "safety",
                reason,
            })?;
        config.safety.remove(category.key());
        Ok(success_unset(&format!("safety {}", category.key())))
    }
}

/// Handler for the `base-url` setting.
pub struct BaseUrlHandler;

impl SettingHandler for BaseUrlHandler {
    fn key(&self) -> &'static str {
        "base-url"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [url] = args else {
            return Err(SettingError::MissingArgs {
                hint: "To point at another endpoint, give its base URL:",
                example: "gemichat set base-url https://generativelanguage.googleapis.com/v1beta",
            });
        };

        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingError::InvalidValue {
                key: "base-url",
                reason: format!("'{url}' is not an http(s) URL"),
            });
        }
        config.base_url = Some(url.to_string());
        Ok(success_set("base-url", url))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.base_url = None;
        Ok(success_unset("base-url"))
    }
}

/// Handler for the `request-timeout` setting, in seconds.
pub struct RequestTimeoutHandler;

impl SettingHandler for RequestTimeoutHandler {
    fn key(&self) -> &'static str {
        "request-timeout"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let [value] = args else {
            return Err(SettingError::MissingArgs {
                hint: "To limit how long a request may take, give a number of seconds (0 disables):",
                example: "gemichat set request-timeout 60",
            });
        };

        let secs = value
            .trim()
            .parse::<u64>()
            .map_err(|_| SettingError::InvalidValue {
                key: "request-timeout",
                reason: format!("'{value}' is not a whole number of seconds"),
            })?;
        config.request_timeout_secs = Some(secs);
        Ok(success_set("request-timeout", &format!("{secs}s")))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.request_timeout_secs = None;
        Ok(success_unset("request-timeout"))
    }
}
