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

//! Error types of the point-cloud post-processor.

use pointfill_core::math::Extent2D;
use pointfill_core::renderer::ResourceError;
use thiserror::Error;

use super::targets::{FramebufferName, TextureSlot};

/// Violations detected while building or resolving stage commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Stage commands were requested before the pool held any resources.
    #[error("stage commands requested before render targets were allocated")]
    PoolNotReady,

    /// A stage referenced a texture slot the pool does not have.
    #[error("texture slot {0:?} does not exist in the render-target pool")]
    UnknownTexture(TextureSlot),

    /// A stage referenced a framebuffer the pool does not have.
    #[error("framebuffer '{0}' does not exist in the render-target pool")]
    UnknownFramebuffer(FramebufferName),
}

/// The error type returned by the point-cloud post-processor.
#[derive(Error, Debug)]
pub enum PostProcessError {
    /// The device failed to allocate or release a render target.
    #[error("render target allocation failed: {0}")]
    Allocation(#[from] ResourceError),

    /// The processor was used after `destroy`.
    #[error("point cloud post-processor used after destroy")]
    Destroyed,

    /// The upstream command range does not lie inside the command list.
    #[error("upstream command range {start}..{end} is outside the command list (len {len})")]
    InvalidRange {
        /// Requested start (inclusive).
        start: usize,
        /// Requested end (exclusive).
        end: usize,
        /// Length of the command list.
        len: usize,
    },

    /// The drawing buffer has a zero dimension.
    #[error("drawing buffer {0} has a zero dimension")]
    EmptyDrawingBuffer(Extent2D),

    /// Stage commands could not be built or resolved.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Settings failed to parse or validate.
    #[error("invalid post-process settings: {0}")]
    InvalidSettings(String),
}
