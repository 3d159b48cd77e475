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

//! The frame command model.
//!
//! Renderers do not talk to the GPU directly while building a frame. They push
//! [`Command`]s into the frame's ordered command list, and the scheduler
//! executes that list later. Post-processing lanes work by rewriting and
//! extending this list.

use crate::math::LinearRgba;
use crate::renderer::api::framebuffer::FramebufferId;
use crate::renderer::api::texture::{SamplerId, TextureId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

/// Classifies a command into the render pass it belongs to.
///
/// The scheduler sorts and batches commands by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PassKind {
    /// Regular opaque geometry.
    #[default]
    Opaque,
    /// Sparse point-cloud splats and their screen-space repair.
    PointCloud,
    /// Alpha-blended geometry drawn after opaque.
    Translucent,
}

/// How a draw's output is combined with the target's existing contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Output replaces the destination.
    #[default]
    Disabled,
    /// Standard `src_alpha, one_minus_src_alpha` blending.
    AlphaBlend,
}

/// Fixed-function state a draw command runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// Color blending.
    pub blending: BlendMode,
    /// Whether fragments are tested against the depth attachment.
    pub depth_test: bool,
    /// Whether fragments write to the depth attachment.
    pub depth_write: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            blending: BlendMode::Disabled,
            depth_test: true,
            depth_write: true,
        }
    }
}

impl RenderState {
    /// Depth-tested, depth-writing state without blending.
    pub const fn opaque() -> Self {
        Self {
            blending: BlendMode::Disabled,
            depth_test: true,
            depth_write: true,
        }
    }

    /// Alpha-blended state that ignores depth.
    pub const fn alpha_blended() -> Self {
        Self {
            blending: BlendMode::AlphaBlend,
            depth_test: false,
            depth_write: false,
        }
    }
}

/// An opaque handle to a shader program compiled by the upstream renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgramId(pub usize);

/// The shader a draw command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderBinding {
    /// A program already compiled by the upstream renderer.
    Program(ShaderProgramId),
    /// A full-screen quad driven by a WGSL fragment shader.
    ///
    /// The backend compiles and caches these by label.
    ViewportQuad {
        /// Cache key and debug label.
        label: Cow<'static, str>,
        /// WGSL source with `vs_main` and `fs_main` entry points.
        source: Cow<'static, str>,
    },
}

/// A texture sampled by a draw command, bound under a shader-visible name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    /// The name of the binding in the shader.
    pub name: Cow<'static, str>,
    /// The texture read by the shader.
    pub texture: TextureId,
    /// The sampler used to read it.
    pub sampler: SamplerId,
}

/// Identifies the object that produced a command.
///
/// Used by debugging tools and for picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandOwner(pub u64);

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

impl CommandOwner {
    /// Allocates a process-unique owner tag.
    pub fn unique() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Shader to run.
    pub shader: ShaderBinding,
    /// Sampled texture inputs.
    pub textures: Vec<TextureBinding>,
    /// Target framebuffer. `None` draws into whatever the caller has bound.
    pub framebuffer: Option<FramebufferId>,
    /// Fixed-function state.
    pub render_state: RenderState,
    /// Pass classification.
    pub pass: PassKind,
    /// Whether the geometry casts shadows.
    pub cast_shadows: bool,
    /// Whether the geometry receives shadows.
    pub receive_shadows: bool,
    /// The object that issued the command.
    pub owner: Option<CommandOwner>,
}

impl DrawCommand {
    /// A draw of a full-screen quad with the given WGSL source.
    pub fn viewport_quad(
        label: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            shader: ShaderBinding::ViewportQuad {
                label: label.into(),
                source: source.into(),
            },
            textures: Vec::new(),
            framebuffer: None,
            render_state: RenderState::opaque(),
            pass: PassKind::default(),
            cast_shadows: false,
            receive_shadows: false,
            owner: None,
        }
    }
}

/// Clears some attachments of a framebuffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearCommand {
    /// The framebuffer to clear. `None` clears the caller's bound target.
    pub framebuffer: Option<FramebufferId>,
    /// Clear value for color attachments, if they are cleared.
    pub color: Option<LinearRgba>,
    /// Clear value for the depth attachment, if it is cleared.
    pub depth: Option<f32>,
    /// Pass classification.
    pub pass: PassKind,
    /// The object that issued the command.
    pub owner: Option<CommandOwner>,
}

/// One entry of a frame's command list.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A draw call.
    Draw(DrawCommand),
    /// A clear.
    Clear(ClearCommand),
}

impl Command {
    /// The framebuffer this command writes to.
    pub fn framebuffer(&self) -> Option<FramebufferId> {
        match self {
            Command::Draw(draw) => draw.framebuffer,
            Command::Clear(clear) => clear.framebuffer,
        }
    }

    /// The pass classification of the command.
    pub fn pass(&self) -> PassKind {
        match self {
            Command::Draw(draw) => draw.pass,
            Command::Clear(clear) => clear.pass,
        }
    }

    /// Returns the draw command, if this is one.
    pub fn as_draw(&self) -> Option<&DrawCommand> {
        match self {
            Command::Draw(draw) => Some(draw),
            Command::Clear(_) => None,
        }
    }

    /// Returns the draw command mutably, if this is one.
    pub fn as_draw_mut(&mut self) -> Option<&mut DrawCommand> {
        match self {
            Command::Draw(draw) => Some(draw),
            Command::Clear(_) => None,
        }
    }

    /// Returns the clear command, if this is one.
    pub fn as_clear(&self) -> Option<&ClearCommand> {
        match self {
            Command::Clear(clear) => Some(clear),
            Command::Draw(_) => None,
        }
    }
}

impl From<DrawCommand> for Command {
    fn from(draw: DrawCommand) -> Self {
        Command::Draw(draw)
    }
}

impl From<ClearCommand> for Command {
    fn from(clear: ClearCommand) -> Self {
        Command::Clear(clear)
    }
}
