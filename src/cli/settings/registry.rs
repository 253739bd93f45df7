//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    BaseUrlHandler, DefaultModelHandler, MaxOutputTokensHandler, RequestTimeoutHandler,
    SafetyHandler, SystemPromptHandler, TemperatureHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in the order they are listed to the user.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(DefaultModelHandler));
        registry.register(Box::new(TemperatureHandler));
        registry.register(Box::new(MaxOutputTokensHandler));
        registry.register(Box::new(SystemPromptHandler));
        registry.register(Box::new(SafetyHandler));
        registry.register(Box::new(BaseUrlHandler));
        registry.register(Box::new(RequestTimeoutHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
