use granite_raster::RasterizerConfig;
use granite_terrain::TerrainConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub terrain: TerrainConfig,
    pub rasterizer: RasterizerConfig,
}

impl Config {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = std::fs::File::open(path)?;

        Ok(ron::de::from_reader(reader)?)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(s)?)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_ron_str("(terrain: (low_quality: true), rasterizer: (width: 640))").unwrap();
        assert!(config.terrain.low_quality);
        assert_eq!(
            config.terrain.initial_instance_capacity,
            TerrainConfig::default().initial_instance_capacity
        );
        assert_eq!(config.rasterizer.width, 640);
        assert_eq!(config.rasterizer.height, RasterizerConfig::default().height);

        assert_eq!(Config::from_ron_str("()").unwrap(), Config::default());
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(matches!(
            Config::from_ron_str("(terrain: 3)"),
            Err(ConfigError::Ron(_))
        ));
        assert!(matches!(
            Config::read_file("does/not/exist.ron"),
            Err(ConfigError::Io(_))
        ));
    }
}
