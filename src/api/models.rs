//! Catalogue of Gemini models the client accepts.

/// A model the client knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub display_name: &'static str,
}

pub const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash-latest";

const SUPPORTED_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-1.5-flash-latest",
        display_name: "Gemini 1.5 Flash (Latest)",
    },
    ModelInfo {
        id: "gemini-1.0-pro",
        display_name: "Gemini 1.0 Pro",
    },
    ModelInfo {
        id: "gemini-1.5-pro-latest",
        display_name: "Gemini 1.5 Pro (Latest)",
    },
];

pub fn supported_models() -> &'static [ModelInfo] {
    SUPPORTED_MODELS
}

/// Look a model up by id or display name (case-insensitive).
pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    let name = name.trim();
    SUPPORTED_MODELS.iter().find(|model| {
        model.id.eq_ignore_ascii_case(name) || model.display_name.eq_ignore_ascii_case(name)
    })
}

pub fn is_supported_model(id: &str) -> bool {
    find_model(id).is_some()
}

pub fn display_name_for(id: &str) -> &str {
    find_model(id).map(|model| model.display_name).unwrap_or(id)
}
