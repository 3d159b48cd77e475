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

//! [`Lane`] adapter around [`PointCloudPostProcessor`].

use pointfill_core::lane::{Lane, LaneContext, LaneError, LaneKind, Slot, UpstreamCommands};
use pointfill_core::renderer::{FrameState, GraphicsDevice};
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::PostProcessError;
use super::settings::PostProcessSettings;
use super::targets::footprint_for;
use super::PointCloudPostProcessor;

/// Cost of one full-screen pass over one MiB of render targets.
const COST_PER_MIB_PASS: f32 = 0.01;

/// Runs the point-cloud post-processor as a post-process lane.
///
/// Context keys read by [`execute`](Lane::execute):
/// - `Arc<dyn GraphicsDevice>` (required)
/// - `Slot<FrameState>` (required)
/// - [`UpstreamCommands`] (optional, defaults to the whole command list)
#[derive(Debug, Default)]
pub struct PointCloudPostProcessLane {
    processor: Mutex<PointCloudPostProcessor>,
}

impl PointCloudPostProcessLane {
    /// Creates a lane with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a lane with the given settings, rejecting invalid ones.
    pub fn with_settings(settings: PostProcessSettings) -> Result<Self, PostProcessError> {
        Ok(Self {
            processor: Mutex::new(PointCloudPostProcessor::with_settings(settings)?),
        })
    }

    /// Locks the wrapped processor.
    pub fn processor(&self) -> Result<MutexGuard<'_, PointCloudPostProcessor>, LaneError> {
        self.processor
            .lock()
            .map_err(|_| LaneError::ExecutionFailed("point cloud processor lock poisoned".into()))
    }
}

impl Lane for PointCloudPostProcessLane {
    fn strategy_name(&self) -> &'static str {
        "PointCloudPostProcess"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::PostProcess
    }

    fn estimate_cost(&self, ctx: &LaneContext) -> f32 {
        let Ok(processor) = self.processor() else {
            return 1.0;
        };
        let bytes = match ctx.get::<Slot<FrameState>>() {
            Some(frame) => footprint_for(frame.get_ref().drawing_buffer_size),
            None => processor.pool().memory_usage_bytes(),
        };
        if bytes == 0 {
            return 1.0;
        }
        // Occlusion, K growing passes and the blend.
        let passes = processor.settings().stage_count() + 1;
        let mib = bytes as f32 / (1024.0 * 1024.0);
        mib * passes as f32 * COST_PER_MIB_PASS
    }

    fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError> {
        let device = ctx
            .get::<Arc<dyn GraphicsDevice>>()
            .ok_or(LaneError::missing("Arc<dyn GraphicsDevice>"))?
            .clone();
        let frame = ctx
            .get::<Slot<FrameState>>()
            .ok_or(LaneError::missing("Slot<FrameState>"))?
            .get();
        let upstream = match ctx.get::<UpstreamCommands>() {
            Some(UpstreamCommands(range)) => range.clone(),
            None => 0..frame.commands.len(),
        };

        self.processor()?
            .process(device.as_ref(), frame, upstream)
            .map_err(|e| LaneError::ExecutionFailed(Box::new(e)))
    }

    fn on_shutdown(&self, ctx: &mut LaneContext) {
        let Some(device) = ctx.get::<Arc<dyn GraphicsDevice>>() else {
            log::warn!("PointCloudPostProcessLane: no device in context, resources not released");
            return;
        };
        match self.processor() {
            Ok(mut processor) => processor.destroy(device.as_ref()),
            Err(e) => log::warn!("PointCloudPostProcessLane: {e}"),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
