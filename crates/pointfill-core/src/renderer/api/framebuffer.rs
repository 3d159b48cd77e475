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

//! Framebuffers: named sets of attachments used as render targets.
//!
//! A framebuffer never owns its attachments. Destroying one releases only the
//! binding; the textures it references stay alive until their owner destroys
//! them. This lets several framebuffers alias the same texture.

use crate::renderer::api::texture::TextureId;
use std::borrow::Cow;

/// A descriptor used to create a [`FramebufferId`].
#[derive(Debug, Clone)]
pub struct FramebufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Color attachments, in shader output order.
    pub color_attachments: Cow<'a, [TextureId]>,
    /// An optional depth/stencil attachment.
    pub depth_stencil_attachment: Option<TextureId>,
}

impl FramebufferDescriptor<'_> {
    /// Returns `true` if the descriptor binds no attachment at all.
    pub fn is_empty(&self) -> bool {
        self.color_attachments.is_empty() && self.depth_stencil_attachment.is_none()
    }

    /// Iterates every referenced texture, colors first.
    pub fn attachments(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.color_attachments
            .iter()
            .copied()
            .chain(self.depth_stencil_attachment)
    }
}

/// An opaque handle to a framebuffer (attachment set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);
