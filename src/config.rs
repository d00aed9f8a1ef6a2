use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// File locations for the four parameter blobs and the input image.
///
/// The defaults are the canonical artifact names produced by the training
/// step; a JSON config file may override any subset of them.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InferenceConfig {
    pub hidden_weights_path: String,
    pub hidden_bias_path: String,
    pub output_weights_path: String,
    pub output_bias_path: String,
    pub image_path: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            hidden_weights_path: "hweights8.bin".to_string(),
            hidden_bias_path: "hbias32.bin".to_string(),
            output_weights_path: "outweights8.bin".to_string(),
            output_bias_path: "outbias32.bin".to_string(),
            image_path: "sean.png".to_string(),
        }
    }
}

impl InferenceConfig {
    pub fn load(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if !Path::new(config_path).exists() {
            return Err(format!("Config file not found at: {}", config_path).into());
        }

        let mut file = File::open(config_path)
            .map_err(|e| format!("Failed to open config file {}: {}", config_path, e))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| format!("Failed to read config file {}: {}", config_path, e))?;

        let config: InferenceConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to deserialize JSON from {}: {}", config_path, e))?;

        Ok(config)
    }
}
