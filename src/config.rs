use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::target::DEFAULT_MAX_NESTING;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub interp: InterpConfig,

    #[serde(default)]
    pub args: ArgsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpConfig {
    /// Name of the command the target uses to call host globals
    #[serde(default = "default_adhoc_command")]
    pub adhoc_command: String,

    /// Script evaluated right after creation
    #[serde(default)]
    pub init_script: Option<String>,

    #[serde(default = "default_system_encoding")]
    pub system_encoding: String,

    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgsConfig {
    /// Marker prepended to map keys by `callt` and `makearglist`
    #[serde(default = "default_option_prefix")]
    pub option_prefix: String,
}

impl Default for InterpConfig {
    fn default() -> Self {
        Self {
            adhoc_command: default_adhoc_command(),
            init_script: None,
            system_encoding: default_system_encoding(),
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl Default for ArgsConfig {
    fn default() -> Self {
        Self {
            option_prefix: default_option_prefix(),
        }
    }
}

fn default_adhoc_command() -> String { "lua".to_string() }
fn default_system_encoding() -> String { "utf-8".to_string() }
fn default_max_nesting() -> usize { DEFAULT_MAX_NESTING }
fn default_option_prefix() -> String { "-".to_string() }

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.interp.adhoc_command.is_empty() {
            return Err("Invalid config: interp.adhoc_command must not be empty".to_string());
        }
        if self.interp.max_nesting == 0 {
            return Err("Invalid config: interp.max_nesting must be positive".to_string());
        }
        Ok(())
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }
}
