use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration struct for Gemini API
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    /// File the system instruction text is read from at startup.
    pub system_instruction_file: Option<PathBuf>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: Some("gemini-2.0-flash".to_string()),
            system_instruction_file: Some(PathBuf::from("system_instruction.txt")),
        }
    }
}

impl GeminiConfig {
    /// Read the system instruction text, if a file is configured.
    ///
    /// A missing or unreadable file logs a warning and yields no instruction
    /// rather than failing startup.
    pub fn load_system_instruction(&self) -> Option<String> {
        let path = self.system_instruction_file.as_ref()?;
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read system instruction file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_model_but_no_key() {
        let config = GeminiConfig::default();

        assert!(config.api_key.is_none());
        assert_eq!(config.model_name.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn missing_instruction_file_yields_none() {
        let config = GeminiConfig {
            system_instruction_file: Some(PathBuf::from("/nonexistent/instruction.txt")),
            ..GeminiConfig::default()
        };

        assert_eq!(config.load_system_instruction(), None);
    }

    #[test]
    fn unconfigured_instruction_file_yields_none() {
        let config = GeminiConfig {
            system_instruction_file: None,
            ..GeminiConfig::default()
        };

        assert_eq!(config.load_system_instruction(), None);
    }
}
