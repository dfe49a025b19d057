use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Final gain applied outside the pool's own gain staging.
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_master_gain() -> f32 {
    1.0
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            master_gain: 1.0,
        }
    }
}

impl BackendConfig {
    /// Write a default configuration file for the user to edit.
    pub fn generate_default(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let toml_str = toml::to_string_pretty(&BackendConfig::default())?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

pub static CONFIG: Lazy<BackendConfig> = Lazy::new(|| {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    if let Ok(txt) = std::fs::read_to_string(&path) {
        toml::from_str(&txt).unwrap_or_default()
    } else {
        BackendConfig::default()
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_default_round_trips() {
        let path = std::env::temp_dir().join("drone_engine_config_test.toml");
        BackendConfig::generate_default(path.to_str().unwrap()).unwrap();
        let txt = std::fs::read_to_string(&path).unwrap();
        let cfg: BackendConfig = toml::from_str(&txt).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("output"));
        assert_eq!(cfg.master_gain, 1.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: BackendConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.master_gain, 1.0);
    }
}
