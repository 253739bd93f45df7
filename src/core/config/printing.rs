use crate::core::config::data::Config;

impl Config {
    pub fn describe(&self) -> String {
        let mut out = String::from("Current configuration:\n");
        let unset = || "(unset)".to_string();

        out.push_str(&format!(
            "  default-model: {}\n",
            self.default_model.clone().unwrap_or_else(unset)
        ));
        out.push_str(&format!(
            "  temperature: {}\n",
            self.temperature.map(|t| t.to_string()).unwrap_or_else(unset)
        ));
        out.push_str(&format!(
            "  max-output-tokens: {}\n",
            self.max_output_tokens
                .map(|n| n.to_string())
                .unwrap_or_else(unset)
        ));
        out.push_str(&format!(
            "  system-prompt: {}\n",
            self.system_prompt.clone().unwrap_or_else(unset)
        ));
        if self.safety.is_empty() {
            out.push_str("  safety: (defaults)\n");
        } else {
            out.push_str("  safety:\n");
            for (category, threshold) in &self.safety {
                out.push_str(&format!("    {category}: {threshold}\n"));
            }
        }
        out.push_str(&format!(
            "  base-url: {}\n",
            self.base_url.clone().unwrap_or_else(unset)
        ));
        out.push_str(&format!(
            "  request-timeout: {}",
            self.request_timeout_secs
                .map(|secs| format!("{secs}s"))
                .unwrap_or_else(unset)
        ));
        out
    }

    pub fn print_all(&self) {
        println!("{}", self.describe());
    }
}
