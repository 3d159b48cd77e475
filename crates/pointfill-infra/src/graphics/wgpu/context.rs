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

use anyhow::{anyhow, Result};
use pointfill_core::renderer::GraphicsAdapterInfo;
use wgpu::{Adapter, Instance};

use super::conversions::{from_wgpu_backend, from_wgpu_device_type};

/// Depth format whose support decides the `depth_texture` capability.
const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Holds the core WGPU state objects used to allocate offscreen targets.
///
/// The context is headless: post-processing renders into textures it owns
/// and never presents to a surface.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The adapter the device was created from.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue of the device.
    pub queue: wgpu::Queue,
    /// Backend-agnostic description of the adapter.
    pub adapter_info: GraphicsAdapterInfo,
    /// Whether depth textures can be both rendered to and sampled.
    pub depth_texture_supported: bool,
    /// Limits of the logical device.
    pub device_limits: wgpu::Limits,
}

impl WgpuGraphicsContext {
    /// Requests the default adapter of `instance` and creates a device on it.
    pub async fn new_headless(instance: &Instance) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a suitable adapter: {}", e))?;
        Self::from_adapter(adapter).await
    }

    /// Creates the logical device and queue on a pre-selected adapter.
    pub async fn from_adapter(adapter: Adapter) -> Result<Self> {
        let info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Pointfill Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let depth_texture_supported = Self::query_depth_texture_support(&adapter);
        log::info!("Depth texture support: {depth_texture_supported}");

        let device_limits = device.limits();
        Ok(Self {
            adapter_info: GraphicsAdapterInfo {
                name: info.name.clone(),
                backend_type: from_wgpu_backend(info.backend),
                device_type: from_wgpu_device_type(info.device_type),
            },
            adapter,
            device,
            queue,
            depth_texture_supported,
            device_limits,
        })
    }

    /// Blocking variant of [`new_headless`](Self::new_headless) with a fresh instance.
    pub fn new_headless_blocking() -> Result<Self> {
        let instance = Instance::default();
        pollster::block_on(Self::new_headless(&instance))
    }

    fn query_depth_texture_support(adapter: &Adapter) -> bool {
        let features = adapter.get_texture_format_features(DEPTH_TEXTURE_FORMAT);
        features.allowed_usages.contains(
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
