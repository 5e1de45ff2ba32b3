use crate::CpuRasterizer;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RasterizerConfig {
    /// Viewport size in pixels.
    pub width: u32,
    pub height: u32,
    /// Objects covering fewer pixels than this are culled.
    pub threshold: f32,
    pub use_simd: bool,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 128,
            threshold: 16.0,
            use_simd: true,
        }
    }
}

impl RasterizerConfig {
    pub fn build(&self) -> CpuRasterizer {
        CpuRasterizer::new(self.width, self.height, self.threshold, self.use_simd)
    }
}
