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

//! Screen-space post-processing of sparse point-cloud renders.
//!
//! The upstream renderer splats points into the frame. This module redirects
//! those draws into an offscreen `prior` target, repairs the gaps between
//! points with an occlusion stage followed by K region-growing iterations that
//! ping-pong between two color/depth pairs, and blends the result back into
//! the caller's framebuffer.
//!
//! ```text
//! Capture -> Occlude -> GrowA -> GrowB -> ... -> Blend -> ClearPrior
//! ```
//!
//! - [`RenderTargetPool`] owns the offscreen textures and framebuffers.
//! - [`CapabilityGate`] turns the pipeline into a pass-through on devices
//!   without depth textures.
//! - [`build_commands`] produces the stage templates.
//! - [`PointCloudPostProcessor`] drives all of the above once per frame.
//! - [`PointCloudPostProcessLane`] exposes the driver as a [`Lane`](pointfill_core::lane::Lane).

mod capability;
mod error;
mod lane;
mod settings;
mod stages;
mod targets;

pub use capability::CapabilityGate;
pub use error::{PostProcessError, StageError};
pub use lane::PointCloudPostProcessLane;
pub use settings::{PostProcessSettings, MAX_REGION_GROWING_ITERATIONS};
pub use stages::{
    build_commands, resolve_sequence, ClearTemplate, StageCommands, StageInput, StageTemplate,
    COLOR_INPUT, DEPTH_INPUT, EYE_SPACE_INPUT,
};
pub use targets::{
    footprint_for, FramebufferName, PoolStatus, RenderTargetPool, TextureSlot, COLOR_FORMAT,
    DEPTH_FORMAT, EYE_SPACE_FORMAT,
};

use pointfill_core::renderer::{CommandOwner, FrameState, GraphicsDevice};
use std::ops::Range;

/// The frame driver of the point-cloud post-processing pipeline.
#[derive(Debug)]
pub struct PointCloudPostProcessor {
    settings: PostProcessSettings,
    gate: CapabilityGate,
    pool: RenderTargetPool,
    stages: Option<StageCommands>,
    owner: CommandOwner,
    destroyed: bool,
}

impl Default for PointCloudPostProcessor {
    fn default() -> Self {
        Self::from_valid_settings(PostProcessSettings::default())
    }
}

impl PointCloudPostProcessor {
    /// Creates a processor with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor with the given settings.
    ///
    /// Fails with [`PostProcessError::InvalidSettings`] if
    /// [`PostProcessSettings::validate`] rejects them.
    pub fn with_settings(settings: PostProcessSettings) -> Result<Self, PostProcessError> {
        settings.validate()?;
        Ok(Self::from_valid_settings(settings))
    }

    fn from_valid_settings(settings: PostProcessSettings) -> Self {
        Self {
            settings,
            gate: CapabilityGate::new(),
            pool: RenderTargetPool::new(),
            stages: None,
            owner: CommandOwner::unique(),
            destroyed: false,
        }
    }

    /// The settings the processor runs with.
    pub fn settings(&self) -> &PostProcessSettings {
        &self.settings
    }

    /// The render-target pool.
    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    /// The current stage templates, if they have been built.
    pub fn stages(&self) -> Option<&StageCommands> {
        self.stages.as_ref()
    }

    /// The owner tag carried by every command this processor emits.
    pub fn owner(&self) -> CommandOwner {
        self.owner
    }

    /// Post-processes one frame.
    ///
    /// Draw commands in `upstream` are redirected into the `prior` target, then
    /// the stage sequence is appended to the command list. On devices without
    /// depth-texture support the frame is left untouched.
    ///
    /// Either every stage command is appended or the frame is not modified.
    pub fn process(
        &mut self,
        device: &dyn GraphicsDevice,
        frame: &mut FrameState,
        upstream: Range<usize>,
    ) -> Result<(), PostProcessError> {
        if self.destroyed {
            return Err(PostProcessError::Destroyed);
        }
        if !self.gate.is_supported(device) {
            return Ok(());
        }

        let len = frame.commands.len();
        if upstream.start > upstream.end || upstream.end > len {
            return Err(PostProcessError::InvalidRange {
                start: upstream.start,
                end: upstream.end,
                len,
            });
        }

        let status = self
            .pool
            .ensure_resources(device, frame.drawing_buffer_size)?;
        if status.handles_changed() || self.stages.is_none() {
            self.stages = Some(build_commands(&self.pool, &self.settings)?);
        }
        let stages = self.stages.as_ref().ok_or(StageError::PoolNotReady)?;

        let pass = self.settings.pass;
        let appended = resolve_sequence(stages, &self.pool, pass, self.owner)?;
        let prior = self
            .pool
            .resolve_framebuffer(FramebufferName::Prior)
            .ok_or(StageError::UnknownFramebuffer(FramebufferName::Prior))?;

        let mut captured = 0usize;
        for draw in frame.commands[upstream]
            .iter_mut()
            .filter_map(|command| command.as_draw_mut())
        {
            draw.framebuffer = Some(prior);
            draw.cast_shadows = false;
            draw.receive_shadows = false;
            draw.pass = pass;
            captured += 1;
        }

        log::debug!(
            "PointCloudPostProcessor: captured {} upstream draws, appended {} commands",
            captured,
            appended.len()
        );
        frame.commands.extend(appended);
        Ok(())
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Releases every GPU resource. Idempotent.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if self.destroyed {
            return;
        }
        self.pool.release(device);
        self.stages = None;
        self.destroyed = true;
        log::info!("PointCloudPostProcessor: destroyed");
    }
}
