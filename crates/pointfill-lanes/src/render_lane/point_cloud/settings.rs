// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration of the point-cloud post-processor.

use pointfill_core::math::LinearRgba;
use pointfill_core::renderer::PassKind;
use serde::{Deserialize, Serialize};

use super::error::PostProcessError;

/// Upper bound on [`PostProcessSettings::region_growing_iterations`].
pub const MAX_REGION_GROWING_ITERATIONS: u32 = 64;

/// Tunables of the point-cloud post-processor.
///
/// Missing fields take their default when deserialized, so a RON file only
/// needs to name what it changes:
///
/// ```ron
/// (region_growing_iterations: 6)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessSettings {
    /// Number of region-growing passes run after the occlusion stage.
    pub region_growing_iterations: u32,
    /// Pass tag given to captured upstream draws and to every emitted command.
    pub pass: PassKind,
    /// Color used when clearing the offscreen targets.
    pub clear_color: [f32; 4],
    /// Depth used when clearing the offscreen targets.
    pub clear_depth: f32,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            region_growing_iterations: 4,
            pass: PassKind::PointCloud,
            clear_color: LinearRgba::TRANSPARENT.to_array(),
            clear_depth: 1.0,
        }
    }
}

impl PostProcessSettings {
    /// Parses settings from RON and validates them.
    pub fn from_ron_str(source: &str) -> Result<Self, PostProcessError> {
        let settings: Self =
            ron::from_str(source).map_err(|e| PostProcessError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes the settings to pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, PostProcessError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| PostProcessError::InvalidSettings(e.to_string()))
    }

    /// Checks the values against what the pipeline can run with.
    pub fn validate(&self) -> Result<(), PostProcessError> {
        if !(1..=MAX_REGION_GROWING_ITERATIONS).contains(&self.region_growing_iterations) {
            return Err(PostProcessError::InvalidSettings(format!(
                "region_growing_iterations {} is outside [1, {MAX_REGION_GROWING_ITERATIONS}]",
                self.region_growing_iterations
            )));
        }
        if let Some(c) = self.clear_color.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(PostProcessError::InvalidSettings(format!(
                "clear_color component {c} is outside [0, 1]"
            )));
        }
        if !(0.0..=1.0).contains(&self.clear_depth) {
            return Err(PostProcessError::InvalidSettings(format!(
                "clear_depth {} is outside [0, 1]",
                self.clear_depth
            )));
        }
        Ok(())
    }

    /// The clear color as a [`LinearRgba`].
    pub fn clear_color(&self) -> LinearRgba {
        LinearRgba::from_array(self.clear_color)
    }

    /// Total number of full-screen draws: occlusion plus region growing.
    pub fn stage_count(&self) -> usize {
        1 + self.region_growing_iterations as usize
    }
}
