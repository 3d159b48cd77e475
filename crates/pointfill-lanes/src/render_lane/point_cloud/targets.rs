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

//! The render-target pool.
//!
//! The pool owns every offscreen resource of the pipeline, all sized to the
//! drawing buffer:
//!
//! | Resource      | Format                | Count |
//! |---------------|-----------------------|-------|
//! | color         | `Rgba8Unorm`          | 2     |
//! | eye-space     | `Rgba32Float`         | 1     |
//! | depth         | `Depth24PlusStencil8` | 3     |
//! | sampler       | clamp / nearest       | 1     |
//! | framebuffers  | see [`FramebufferName`] | 4   |
//!
//! Textures are reused across passes, so the framebuffers alias them:
//!
//! ```text
//! prior               color[0] + eye-space, depth[2]
//! screenSpacePass     depth[0]
//! regionGrowingPassA  color[1], depth[1]
//! regionGrowingPassB  color[0], depth[0]
//! ```
//!
//! The whole group is created, destroyed and resized together.

use pointfill_core::math::Extent2D;
use pointfill_core::renderer::{
    FramebufferDescriptor, FramebufferId, GraphicsDevice, ResourceError, SamplerDescriptor,
    SamplerId, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use std::borrow::Cow;
use std::fmt;

use super::error::PostProcessError;

/// Format of the two ping-pong color targets.
pub const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
/// Format of the eye-space position target.
pub const EYE_SPACE_FORMAT: TextureFormat = TextureFormat::Rgba32Float;
/// Format of the three depth targets.
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

const COLOR_COUNT: usize = 2;
const DEPTH_COUNT: usize = 3;

const COLOR_LABELS: [&str; COLOR_COUNT] = ["pointcloud.color0", "pointcloud.color1"];
const DEPTH_LABELS: [&str; DEPTH_COUNT] =
    ["pointcloud.depth0", "pointcloud.depth1", "pointcloud.depth2"];

/// A texture of the pool, addressed by role rather than by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// One of the two ping-pong color targets.
    Color(usize),
    /// The eye-space position target written during capture.
    EyeSpace,
    /// One of the three depth targets.
    Depth(usize),
}

/// The four framebuffers of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferName {
    /// Capture target of the upstream point draws.
    Prior,
    /// Output of the occlusion stage.
    ScreenSpacePass,
    /// Written by even region-growing iterations.
    RegionGrowingPassA,
    /// Written by odd region-growing iterations.
    RegionGrowingPassB,
}

impl FramebufferName {
    /// Every framebuffer, in creation order.
    pub const ALL: [FramebufferName; 4] = [
        FramebufferName::Prior,
        FramebufferName::ScreenSpacePass,
        FramebufferName::RegionGrowingPassA,
        FramebufferName::RegionGrowingPassB,
    ];

    /// The name the framebuffer is known by in logs and labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FramebufferName::Prior => "prior",
            FramebufferName::ScreenSpacePass => "screenSpacePass",
            FramebufferName::RegionGrowingPassA => "regionGrowingPassA",
            FramebufferName::RegionGrowingPassB => "regionGrowingPassB",
        }
    }

    const fn index(&self) -> usize {
        *self as usize
    }

    /// The attachments of this framebuffer: colors, then depth.
    pub fn attachments(&self) -> (&'static [TextureSlot], TextureSlot) {
        match self {
            FramebufferName::Prior => (
                &[TextureSlot::Color(0), TextureSlot::EyeSpace],
                TextureSlot::Depth(2),
            ),
            FramebufferName::ScreenSpacePass => (&[], TextureSlot::Depth(0)),
            FramebufferName::RegionGrowingPassA => (&[TextureSlot::Color(1)], TextureSlot::Depth(1)),
            FramebufferName::RegionGrowingPassB => (&[TextureSlot::Color(0)], TextureSlot::Depth(0)),
        }
    }
}

impl fmt::Display for FramebufferName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`RenderTargetPool::ensure_resources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Resources already matched the drawing buffer.
    Unchanged,
    /// Resources were allocated for the first time.
    Created,
    /// The previous group was destroyed and a new one allocated.
    Resized,
}

impl PoolStatus {
    /// Returns `true` if handles changed and stage commands must be rebuilt.
    pub fn handles_changed(&self) -> bool {
        !matches!(self, PoolStatus::Unchanged)
    }
}

#[derive(Debug)]
struct PoolResources {
    size: Extent2D,
    color: [TextureId; COLOR_COUNT],
    eye_space: TextureId,
    depth: [TextureId; DEPTH_COUNT],
    sampler: SamplerId,
    framebuffers: [FramebufferId; 4],
}

/// Owns the offscreen textures, sampler and framebuffers of the pipeline.
///
/// The pool is lazy: nothing exists on the device until the first
/// [`ensure_resources`](Self::ensure_resources).
#[derive(Debug, Default)]
pub struct RenderTargetPool {
    resources: Option<PoolResources>,
}

impl RenderTargetPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the pool holds resources sized to `size`.
    ///
    /// Idempotent for a given size. When the size changed, the previous group
    /// is released before the new one is allocated.
    pub fn ensure_resources(
        &mut self,
        device: &dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<PoolStatus, PostProcessError> {
        if size.is_empty() {
            return Err(PostProcessError::EmptyDrawingBuffer(size));
        }

        let status = match &self.resources {
            Some(resources) if resources.size == size => return Ok(PoolStatus::Unchanged),
            Some(resources) => {
                log::info!(
                    "PointCloudPostProcessor: resizing render targets {} -> {}",
                    resources.size,
                    size
                );
                self.release(device);
                PoolStatus::Resized
            }
            None => PoolStatus::Created,
        };

        let resources = allocate(device, size)?;
        log::info!(
            "PointCloudPostProcessor: allocated render targets at {} ({} bytes)",
            size,
            footprint_for(size)
        );
        self.resources = Some(resources);
        Ok(status)
    }

    /// Destroys every resource of the pool. A no-op on an empty pool.
    ///
    /// Failures are logged and the remaining handles are still released.
    pub fn release(&mut self, device: &dyn GraphicsDevice) {
        let Some(resources) = self.resources.take() else {
            return;
        };

        for id in resources.framebuffers {
            if let Err(e) = device.destroy_framebuffer(id) {
                log::warn!("PointCloudPostProcessor: failed to destroy framebuffer {id:?}: {e}");
            }
        }
        let textures = resources
            .color
            .into_iter()
            .chain(std::iter::once(resources.eye_space))
            .chain(resources.depth);
        for id in textures {
            if let Err(e) = device.destroy_texture(id) {
                log::warn!("PointCloudPostProcessor: failed to destroy texture {id:?}: {e}");
            }
        }
        if let Err(e) = device.destroy_sampler(resources.sampler) {
            log::warn!(
                "PointCloudPostProcessor: failed to destroy sampler {:?}: {e}",
                resources.sampler
            );
        }
        log::debug!(
            "PointCloudPostProcessor: released render targets at {}",
            resources.size
        );
    }

    /// Returns `true` if the pool currently holds resources.
    pub fn is_allocated(&self) -> bool {
        self.resources.is_some()
    }

    /// The size the resources were allocated at.
    pub fn size(&self) -> Option<Extent2D> {
        self.resources.as_ref().map(|r| r.size)
    }

    /// The shared sampler.
    pub fn sampler(&self) -> Option<SamplerId> {
        self.resources.as_ref().map(|r| r.sampler)
    }

    /// Resolves a texture slot to the live handle.
    pub fn resolve_texture(&self, slot: TextureSlot) -> Option<TextureId> {
        let resources = self.resources.as_ref()?;
        match slot {
            TextureSlot::Color(i) => resources.color.get(i).copied(),
            TextureSlot::EyeSpace => Some(resources.eye_space),
            TextureSlot::Depth(i) => resources.depth.get(i).copied(),
        }
    }

    /// Resolves a framebuffer name to the live handle.
    pub fn resolve_framebuffer(&self, name: FramebufferName) -> Option<FramebufferId> {
        self.resources
            .as_ref()
            .map(|r| r.framebuffers[name.index()])
    }

    /// Every live texture handle.
    pub fn textures(&self) -> Vec<TextureId> {
        match &self.resources {
            Some(r) => r
                .color
                .iter()
                .copied()
                .chain(std::iter::once(r.eye_space))
                .chain(r.depth.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }

    /// VRAM used by the pool's textures, in bytes. Zero when empty.
    pub fn memory_usage_bytes(&self) -> u64 {
        self.size().map(footprint_for).unwrap_or(0)
    }
}

/// VRAM a pool allocated at `size` would use, in bytes.
pub fn footprint_for(size: Extent2D) -> u64 {
    let per_pixel = COLOR_COUNT as u64 * COLOR_FORMAT.bytes_per_pixel() as u64
        + EYE_SPACE_FORMAT.bytes_per_pixel() as u64
        + DEPTH_COUNT as u64 * DEPTH_FORMAT.bytes_per_pixel() as u64;
    size.area() * per_pixel
}

fn target_descriptor(label: &str, size: Extent2D, format: TextureFormat) -> TextureDescriptor<'_> {
    TextureDescriptor {
        label: Some(Cow::Borrowed(label)),
        size: size.into(),
        mip_level_count: 1,
        format,
        usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    }
}

/// Tracks what has been created so far and releases it if dropped armed.
struct PartialGroup<'a> {
    device: &'a dyn GraphicsDevice,
    textures: Vec<TextureId>,
    sampler: Option<SamplerId>,
    framebuffers: Vec<FramebufferId>,
    armed: bool,
}

impl<'a> PartialGroup<'a> {
    fn new(device: &'a dyn GraphicsDevice) -> Self {
        Self {
            device,
            textures: Vec::with_capacity(COLOR_COUNT + 1 + DEPTH_COUNT),
            sampler: None,
            framebuffers: Vec::with_capacity(FramebufferName::ALL.len()),
            armed: true,
        }
    }

    fn texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = self.device.create_texture(descriptor)?;
        self.textures.push(id);
        Ok(id)
    }

    fn sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let id = self.device.create_sampler(descriptor)?;
        self.sampler = Some(id);
        Ok(id)
    }

    fn framebuffer(
        &mut self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        let id = self.device.create_framebuffer(descriptor)?;
        self.framebuffers.push(id);
        Ok(id)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialGroup<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::warn!(
            "PointCloudPostProcessor: allocation failed, releasing {} textures and {} framebuffers",
            self.textures.len(),
            self.framebuffers.len()
        );
        for id in self.framebuffers.drain(..) {
            let _ = self.device.destroy_framebuffer(id);
        }
        for id in self.textures.drain(..) {
            let _ = self.device.destroy_texture(id);
        }
        if let Some(id) = self.sampler.take() {
            let _ = self.device.destroy_sampler(id);
        }
    }
}

fn allocate(device: &dyn GraphicsDevice, size: Extent2D) -> Result<PoolResources, ResourceError> {
    let mut group = PartialGroup::new(device);

    let color = [
        group.texture(&target_descriptor(COLOR_LABELS[0], size, COLOR_FORMAT))?,
        group.texture(&target_descriptor(COLOR_LABELS[1], size, COLOR_FORMAT))?,
    ];
    let eye_space = group.texture(&target_descriptor(
        "pointcloud.eye_space",
        size,
        EYE_SPACE_FORMAT,
    ))?;
    let depth = [
        group.texture(&target_descriptor(DEPTH_LABELS[0], size, DEPTH_FORMAT))?,
        group.texture(&target_descriptor(DEPTH_LABELS[1], size, DEPTH_FORMAT))?,
        group.texture(&target_descriptor(DEPTH_LABELS[2], size, DEPTH_FORMAT))?,
    ];
    let sampler = group.sampler(&SamplerDescriptor::nearest_clamped("pointcloud.sampler"))?;

    let lookup = |slot: TextureSlot| match slot {
        TextureSlot::Color(i) => color[i],
        TextureSlot::EyeSpace => eye_space,
        TextureSlot::Depth(i) => depth[i],
    };

    let mut framebuffers = [FramebufferId(0); 4];
    for name in FramebufferName::ALL {
        let (colors, depth_slot) = name.attachments();
        let color_attachments: Vec<TextureId> = colors.iter().map(|&s| lookup(s)).collect();
        framebuffers[name.index()] = group.framebuffer(&FramebufferDescriptor {
            label: Some(Cow::Borrowed(name.as_str())),
            color_attachments: Cow::Owned(color_attachments),
            depth_stencil_attachment: Some(lookup(depth_slot)),
        })?;
    }

    group.disarm();
    Ok(PoolResources {
        size,
        color,
        eye_space,
        depth,
        sampler,
        framebuffers,
    })
}
