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

//! Per-frame state shared between the renderer and post-processing lanes.

use crate::math::Extent2D;
use crate::renderer::api::command::Command;

/// The state of the frame being built.
///
/// The upstream renderer fills `commands`; lanes may rewrite entries and
/// append new ones. The list is executed in order once every lane has run.
#[derive(Debug, Clone, Default)]
pub struct FrameState {
    /// Size of the drawing buffer (the caller's render target), in pixels.
    pub drawing_buffer_size: Extent2D,
    /// Ordered command list for this frame.
    pub commands: Vec<Command>,
}

impl FrameState {
    /// Creates an empty frame of the given size.
    pub fn new(drawing_buffer_size: Extent2D) -> Self {
        Self {
            drawing_buffer_size,
            commands: Vec::new(),
        }
    }

    /// Appends a command, returning its index.
    pub fn push(&mut self, command: impl Into<Command>) -> usize {
        self.commands.push(command.into());
        self.commands.len() - 1
    }
}
