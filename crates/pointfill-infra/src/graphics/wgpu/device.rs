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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pointfill_core::math::Extent3D;
use pointfill_core::renderer::{
    features, FramebufferDescriptor, FramebufferId, GraphicsAdapterInfo, GraphicsDevice,
    ResourceError, SamplerDescriptor, SamplerId, TextureDescriptor, TextureFormat, TextureId,
};

use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) extent: Extent3D,
    pub(crate) format: TextureFormat,
    pub(crate) size: u64, // To track VRAM accurately on destruction
}

#[derive(Debug)]
pub(crate) struct WgpuSamplerEntry {
    pub(crate) wgpu_sampler: Arc<wgpu::Sampler>,
}

/// Views of the attachments of a framebuffer.
///
/// The views keep the underlying textures alive on the wgpu side even if the
/// texture entry is destroyed first; the registry entry is what counts as
/// ownership for [`GraphicsDevice`] callers.
#[derive(Debug, Clone)]
pub struct WgpuFramebufferViews {
    /// One view per color attachment, in attachment order.
    pub color: Vec<Arc<wgpu::TextureView>>,
    /// The depth/stencil view, if any.
    pub depth_stencil: Option<Arc<wgpu::TextureView>>,
    /// Size shared by every attachment.
    pub extent: Extent3D,
}

#[derive(Debug)]
pub(crate) struct WgpuFramebufferEntry {
    pub(crate) views: WgpuFramebufferViews,
}

/// The internal, non-clonable state of the WgpuDevice.
#[derive(Debug)]
pub struct WgpuDeviceInternal {
    context: Arc<WgpuGraphicsContext>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    samplers: Mutex<HashMap<SamplerId, WgpuSamplerEntry>>,
    framebuffers: Mutex<HashMap<FramebufferId, WgpuFramebufferEntry>>,

    next_texture_id: AtomicUsize,
    next_sampler_id: AtomicUsize,
    next_framebuffer_id: AtomicUsize,

    // VRAM Tracking
    vram_allocated_bytes: AtomicUsize,
    vram_peak_bytes: AtomicU64,
}

/// A clonable, thread-safe handle to the WGPU graphics device.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Failed to lock {what} registry: {e}")))
}

impl WgpuDevice {
    /// Wraps a context into a device.
    pub fn new(context: Arc<WgpuGraphicsContext>) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                textures: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                framebuffers: Mutex::new(HashMap::new()),
                next_texture_id: AtomicUsize::new(0),
                next_sampler_id: AtomicUsize::new(0),
                next_framebuffer_id: AtomicUsize::new(0),
                vram_allocated_bytes: AtomicUsize::new(0),
                vram_peak_bytes: AtomicU64::new(0),
            }),
        }
    }

    // --- ID Generation Helpers ---

    fn generate_texture_id(&self) -> TextureId {
        TextureId(
            self.internal
                .next_texture_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_sampler_id(&self) -> SamplerId {
        SamplerId(
            self.internal
                .next_sampler_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_framebuffer_id(&self) -> FramebufferId {
        FramebufferId(
            self.internal
                .next_framebuffer_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn context(&self) -> &WgpuGraphicsContext {
        &self.internal.context
    }

    fn validate_texture_descriptor(&self, descriptor: &TextureDescriptor) -> Result<(), ResourceError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth_or_array_layers == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture '{}' has a zero dimension",
                descriptor.label.as_deref().unwrap_or("unlabeled")
            )));
        }
        if descriptor.mip_level_count == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "mip_level_count must be at least 1".to_string(),
            ));
        }
        let max = self.context().device_limits.max_texture_dimension_2d;
        if size.width > max || size.height > max {
            return Err(ResourceError::AllocationFailed {
                label: descriptor.label.as_deref().unwrap_or("unlabeled").to_string(),
                details: format!(
                    "{}x{} exceeds the device limit of {max}",
                    size.width, size.height
                ),
            });
        }
        Ok(())
    }

    /// Bytes of VRAM currently held by textures created through this device.
    pub fn vram_allocated_bytes(&self) -> usize {
        self.internal.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Highest value [`vram_allocated_bytes`](Self::vram_allocated_bytes) has reached.
    pub fn vram_peak_bytes(&self) -> u64 {
        self.internal.vram_peak_bytes.load(Ordering::Relaxed)
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.internal.textures.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Number of live framebuffers.
    pub fn framebuffer_count(&self) -> usize {
        self.internal
            .framebuffers
            .lock()
            .map(|f| f.len())
            .unwrap_or(0)
    }

    /// Retrieves the internal WGPU texture. `None` if the ID is invalid.
    pub fn get_wgpu_texture(&self, id: TextureId) -> Option<Arc<wgpu::Texture>> {
        let textures = self.internal.textures.lock().ok()?;
        textures.get(&id).map(|entry| Arc::clone(&entry.wgpu_texture))
    }

    /// Retrieves the internal WGPU sampler. `None` if the ID is invalid.
    pub fn get_wgpu_sampler(&self, id: SamplerId) -> Option<Arc<wgpu::Sampler>> {
        let samplers = self.internal.samplers.lock().ok()?;
        samplers.get(&id).map(|entry| Arc::clone(&entry.wgpu_sampler))
    }

    /// Retrieves the attachment views of a framebuffer. `None` if the ID is invalid.
    pub fn get_framebuffer_views(&self, id: FramebufferId) -> Option<WgpuFramebufferViews> {
        let framebuffers = self.internal.framebuffers.lock().ok()?;
        framebuffers.get(&id).map(|entry| entry.views.clone())
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.validate_texture_descriptor(descriptor)?;

        let wgpu_texture = self
            .context()
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            });
        let id = self.generate_texture_id();
        let size_in_bytes = descriptor.size_in_bytes();

        // Track VRAM usage
        self.internal
            .vram_allocated_bytes
            .fetch_add(size_in_bytes as usize, Ordering::Relaxed);
        let current_vram = self.internal.vram_allocated_bytes.load(Ordering::Relaxed) as u64;
        self.internal
            .vram_peak_bytes
            .fetch_max(current_vram, Ordering::Relaxed);

        lock(&self.internal.textures, "texture")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(wgpu_texture),
                extent: descriptor.size,
                format: descriptor.format,
                size: size_in_bytes,
            },
        );

        log::debug!(
            "WgpuDevice: Created texture '{}' with ID: {:?}, size: {} bytes (VRAM)",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size_in_bytes
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut textures = lock(&self.internal.textures, "texture")?;

        if let Some(entry) = textures.remove(&id) {
            self.internal
                .vram_allocated_bytes
                .fetch_sub(entry.size as usize, Ordering::Relaxed);
            entry.wgpu_texture.destroy();
            log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let wgpu_sampler = self
            .context()
            .device
            .create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                address_mode_w: descriptor.address_mode_w.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
                ..Default::default()
            });
        let id = self.generate_sampler_id();
        lock(&self.internal.samplers, "sampler")?.insert(
            id,
            WgpuSamplerEntry {
                wgpu_sampler: Arc::new(wgpu_sampler),
            },
        );
        log::debug!("WgpuDevice: Created sampler with ID: {id:?}");
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        let mut samplers = lock(&self.internal.samplers, "sampler")?;
        if samplers.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        if descriptor.is_empty() {
            return Err(ResourceError::InvalidDescriptor(
                "framebuffer has no attachments".to_string(),
            ));
        }

        let textures = lock(&self.internal.textures, "texture")?;
        let mut extent: Option<Extent3D> = None;
        let mut view_of = |id: TextureId, want_depth: bool| -> Result<_, ResourceError> {
            let entry = textures.get(&id).ok_or(ResourceError::NotFound)?;
            if entry.format.is_depth() != want_depth {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "texture {id:?} has format {:?}, which cannot be used as a {} attachment",
                    entry.format,
                    if want_depth { "depth/stencil" } else { "color" }
                )));
            }
            match extent {
                Some(e) if e != entry.extent => {
                    return Err(ResourceError::InvalidDescriptor(format!(
                        "attachment {id:?} is {}x{}, expected {}x{}",
                        entry.extent.width, entry.extent.height, e.width, e.height
                    )));
                }
                _ => extent = Some(entry.extent),
            }
            Ok(Arc::new(
                entry
                    .wgpu_texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
            ))
        };

        let color = descriptor
            .color_attachments
            .iter()
            .map(|&id| view_of(id, false))
            .collect::<Result<Vec<_>, _>>()?;
        let depth_stencil = descriptor
            .depth_stencil_attachment
            .map(|id| view_of(id, true))
            .transpose()?;
        drop(textures);

        let extent = extent.ok_or_else(|| {
            ResourceError::InvalidDescriptor("framebuffer has no attachments".to_string())
        })?;
        let id = self.generate_framebuffer_id();
        lock(&self.internal.framebuffers, "framebuffer")?.insert(
            id,
            WgpuFramebufferEntry {
                views: WgpuFramebufferViews {
                    color,
                    depth_stencil,
                    extent,
                },
            },
        );
        log::debug!(
            "WgpuDevice: Created framebuffer '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError> {
        let mut framebuffers = lock(&self.internal.framebuffers, "framebuffer")?;
        if framebuffers.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed framebuffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn get_adapter_info(&self) -> GraphicsAdapterInfo {
        self.context().adapter_info.clone()
    }

    fn supports_feature(&self, feature_name: &str) -> bool {
        match feature_name {
            features::DEPTH_TEXTURE => self.context().depth_texture_supported,
            _ => {
                log::warn!(
                    "WgpuDevice: Unsupported feature_name query in supports_feature: {feature_name}"
                );
                false
            }
        }
    }
}
