use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_input_config")]
    pub input: InputConfig,
    #[serde(default = "default_output_config")]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

fn default_input_config() -> InputConfig {
    InputConfig {
        path: default_input_path(),
    }
}

fn default_output_config() -> OutputConfig {
    OutputConfig {
        dir: default_output_dir(),
    }
}

fn default_input_path() -> String {
    "data/raw/trips.csv".to_string()
}

fn default_output_dir() -> String {
    "data/processed".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;

        let settings: Settings = config.try_deserialize()?;

        debug!(
            input = %settings.input.path,
            output = %settings.output.dir,
            "Loaded pipeline settings"
        );

        Ok(settings)
    }
}
