use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Starts the first LOD range closer to the camera, so fewer patches are drawn at full detail.
    pub low_quality: bool,
    /// Number of instance slots allocated up front. The buffer grows when a selection overflows it.
    pub initial_instance_capacity: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            low_quality: false,
            initial_instance_capacity: 1024,
        }
    }
}
