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

//! The stage builder.
//!
//! Stages are kept as templates that name pool textures by [`TextureSlot`]
//! and framebuffers by [`FramebufferName`]. Handles are looked up in the pool
//! only when a template is turned into a [`Command`], so a template outlives
//! any number of pool reallocations.

use pointfill_core::math::LinearRgba;
use pointfill_core::renderer::{
    ClearCommand, Command, CommandOwner, DrawCommand, FramebufferId, PassKind, RenderState,
    TextureBinding,
};

use super::error::StageError;
use super::settings::PostProcessSettings;
use super::targets::{FramebufferName, RenderTargetPool, TextureSlot};
use crate::render_lane::shaders::{BLEND_WGSL, POINT_OCCLUSION_WGSL, REGION_GROWING_WGSL};

/// Shader-visible name of the color input.
pub const COLOR_INPUT: &str = "pointCloud_colorTexture";
/// Shader-visible name of the eye-space position input.
pub const EYE_SPACE_INPUT: &str = "pointCloud_ECTexture";
/// Shader-visible name of the depth input.
pub const DEPTH_INPUT: &str = "pointCloud_depthTexture";

/// A texture input of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInput {
    /// Binding name in the shader.
    pub name: &'static str,
    /// Pool texture bound under that name.
    pub slot: TextureSlot,
}

/// A full-screen draw whose resources are resolved at emission.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTemplate {
    /// Debug label, also the shader cache key.
    pub label: &'static str,
    /// WGSL source of the stage.
    pub source: &'static str,
    /// Sampled inputs.
    pub inputs: Vec<StageInput>,
    /// Target framebuffer. `None` draws into the caller's framebuffer.
    pub target: Option<FramebufferName>,
    /// Fixed-function state.
    pub render_state: RenderState,
}

impl StageTemplate {
    /// Resolves the template against the live pool.
    pub fn resolve(
        &self,
        pool: &RenderTargetPool,
        pass: PassKind,
        owner: CommandOwner,
    ) -> Result<DrawCommand, StageError> {
        let sampler = pool.sampler().ok_or(StageError::PoolNotReady)?;
        let textures = self
            .inputs
            .iter()
            .map(|input| {
                pool.resolve_texture(input.slot)
                    .map(|texture| TextureBinding {
                        name: input.name.into(),
                        texture,
                        sampler,
                    })
                    .ok_or(StageError::UnknownTexture(input.slot))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut draw = DrawCommand::viewport_quad(self.label, self.source);
        draw.textures = textures;
        draw.framebuffer = self.target.map(|name| resolve_target(pool, name)).transpose()?;
        draw.render_state = self.render_state;
        draw.pass = pass;
        draw.owner = Some(owner);
        Ok(draw)
    }

    /// The color slot this stage reads, if any.
    pub fn color_input(&self) -> Option<TextureSlot> {
        self.inputs
            .iter()
            .find(|input| input.name == COLOR_INPUT)
            .map(|input| input.slot)
    }
}

/// A clear of one pool framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearTemplate {
    /// The framebuffer to clear.
    pub target: FramebufferName,
    /// Color clear value.
    pub color: LinearRgba,
    /// Depth clear value.
    pub depth: f32,
}

impl ClearTemplate {
    /// Resolves the template against the live pool.
    pub fn resolve(
        &self,
        pool: &RenderTargetPool,
        pass: PassKind,
        owner: CommandOwner,
    ) -> Result<ClearCommand, StageError> {
        Ok(ClearCommand {
            framebuffer: Some(resolve_target(pool, self.target)?),
            color: Some(self.color),
            depth: Some(self.depth),
            pass,
            owner: Some(owner),
        })
    }
}

fn resolve_target(
    pool: &RenderTargetPool,
    name: FramebufferName,
) -> Result<FramebufferId, StageError> {
    pool.resolve_framebuffer(name)
        .ok_or(StageError::UnknownFramebuffer(name))
}

/// The full stage sequence of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCommands {
    /// Occlusion stage at index 0, then one entry per region-growing iteration.
    pub draw_commands: Vec<StageTemplate>,
    /// Composite into the caller's framebuffer.
    pub blend_command: StageTemplate,
    /// One clear per framebuffer, in [`FramebufferName::ALL`] order.
    pub clear_commands: Vec<ClearTemplate>,
}

impl StageCommands {
    /// The clear of the given framebuffer.
    pub fn clear_for(&self, name: FramebufferName) -> Option<&ClearTemplate> {
        self.clear_commands.iter().find(|clear| clear.target == name)
    }

    /// The framebuffer cleared right before draw stage `stage`.
    pub fn clear_target_for_stage(stage: usize) -> FramebufferName {
        match stage {
            0 => FramebufferName::ScreenSpacePass,
            i if i % 2 == 1 => FramebufferName::RegionGrowingPassA,
            _ => FramebufferName::RegionGrowingPassB,
        }
    }
}

/// Builds the occlusion stage.
fn point_occlusion_stage() -> StageTemplate {
    StageTemplate {
        label: "pointcloud.point_occlusion",
        source: POINT_OCCLUSION_WGSL,
        inputs: vec![
            StageInput {
                name: COLOR_INPUT,
                slot: TextureSlot::Color(0),
            },
            StageInput {
                name: EYE_SPACE_INPUT,
                slot: TextureSlot::EyeSpace,
            },
        ],
        target: Some(FramebufferName::ScreenSpacePass),
        render_state: RenderState::opaque(),
    }
}

/// Builds region-growing iteration `iteration` (0-based).
///
/// Reads the pair at `iteration % 2` and writes the other one.
fn region_growing_stage(iteration: usize) -> StageTemplate {
    let i = iteration % 2;
    let target = if i == 0 {
        FramebufferName::RegionGrowingPassA
    } else {
        FramebufferName::RegionGrowingPassB
    };
    StageTemplate {
        label: "pointcloud.region_growing",
        source: REGION_GROWING_WGSL,
        inputs: vec![
            StageInput {
                name: COLOR_INPUT,
                slot: TextureSlot::Color(i),
            },
            StageInput {
                name: DEPTH_INPUT,
                slot: TextureSlot::Depth(i),
            },
        ],
        target: Some(target),
        render_state: RenderState::opaque(),
    }
}

/// Builds the composite stage, reading the color at `1 - draw_count % 2`.
fn blend_stage(draw_count: usize) -> StageTemplate {
    let i = 1 - draw_count % 2;
    StageTemplate {
        label: "pointcloud.blend",
        source: BLEND_WGSL,
        inputs: vec![StageInput {
            name: COLOR_INPUT,
            slot: TextureSlot::Color(i),
        }],
        target: None,
        render_state: RenderState::alpha_blended(),
    }
}

/// Builds the stage sequence for the current pool.
///
/// Fails with [`StageError::PoolNotReady`] if the pool holds no resources.
pub fn build_commands(
    pool: &RenderTargetPool,
    settings: &PostProcessSettings,
) -> Result<StageCommands, StageError> {
    if !pool.is_allocated() {
        return Err(StageError::PoolNotReady);
    }

    let iterations = settings.region_growing_iterations as usize;
    let mut draw_commands = Vec::with_capacity(1 + iterations);
    draw_commands.push(point_occlusion_stage());
    draw_commands.extend((0..iterations).map(region_growing_stage));

    let blend_command = blend_stage(draw_commands.len());

    let clear_commands = FramebufferName::ALL
        .iter()
        .map(|&target| ClearTemplate {
            target,
            color: settings.clear_color(),
            depth: settings.clear_depth,
        })
        .collect();

    Ok(StageCommands {
        draw_commands,
        blend_command,
        clear_commands,
    })
}

/// Resolves the stage sequence into the commands appended after the capture.
///
/// Layout: for every draw stage, its clear then its draw; then the blend; then
/// the clear of `prior`. Nothing is returned unless every command resolves.
pub fn resolve_sequence(
    stages: &StageCommands,
    pool: &RenderTargetPool,
    pass: PassKind,
    owner: CommandOwner,
) -> Result<Vec<Command>, StageError> {
    let clear = |name: FramebufferName| -> Result<Command, StageError> {
        let template = stages
            .clear_for(name)
            .ok_or(StageError::UnknownFramebuffer(name))?;
        Ok(template.resolve(pool, pass, owner)?.into())
    };

    let mut commands = Vec::with_capacity(stages.draw_commands.len() * 2 + 2);
    for (stage, template) in stages.draw_commands.iter().enumerate() {
        commands.push(clear(StageCommands::clear_target_for_stage(stage))?);
        commands.push(template.resolve(pool, pass, owner)?.into());
    }
    commands.push(stages.blend_command.resolve(pool, pass, owner)?.into());
    commands.push(clear(FramebufferName::Prior)?);
    Ok(commands)
}
