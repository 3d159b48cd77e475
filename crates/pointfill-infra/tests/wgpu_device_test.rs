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

//! Tests for the wgpu-backed graphics device.
//!
//! These need a physical (or software) adapter and are skipped when none is
//! available.

use std::borrow::Cow;
use std::sync::Arc;

use pointfill_core::math::{Extent2D, Extent3D};
use pointfill_core::renderer::{
    features, DrawCommand, FrameState, FramebufferDescriptor, GraphicsDevice, ResourceError,
    SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage,
};
use pointfill_infra::{WgpuDevice, WgpuGraphicsContext};
use pointfill_lanes::PointCloudPostProcessor;

fn create_test_device() -> Option<WgpuDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    match WgpuGraphicsContext::new_headless_blocking() {
        Ok(context) => Some(WgpuDevice::new(Arc::new(context))),
        Err(e) => {
            println!("Skipping wgpu device test: {e}");
            None
        }
    }
}

fn target_descriptor(
    label: &str,
    width: u32,
    height: u32,
    format: TextureFormat,
) -> TextureDescriptor<'_> {
    TextureDescriptor {
        label: Some(Cow::Borrowed(label)),
        size: Extent3D {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        format,
        usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    }
}

#[test]
fn texture_lifecycle_tracks_vram() {
    let Some(device) = create_test_device() else {
        return;
    };

    let desc = target_descriptor("vram", 64, 32, TextureFormat::Rgba8Unorm);
    let id = device.create_texture(&desc).unwrap();
    assert_eq!(device.vram_allocated_bytes() as u64, desc.size_in_bytes());
    assert!(device.get_wgpu_texture(id).is_some());

    device.destroy_texture(id).unwrap();
    assert_eq!(device.vram_allocated_bytes(), 0);
    assert_eq!(device.vram_peak_bytes(), desc.size_in_bytes());
    assert!(device.get_wgpu_texture(id).is_none());
    assert!(matches!(
        device.destroy_texture(id),
        Err(ResourceError::NotFound)
    ));
}

#[test]
fn zero_sized_texture_is_rejected() {
    let Some(device) = create_test_device() else {
        return;
    };

    let desc = target_descriptor("empty", 0, 16, TextureFormat::Rgba8Unorm);
    assert!(matches!(
        device.create_texture(&desc),
        Err(ResourceError::InvalidDescriptor(_))
    ));
    assert_eq!(device.texture_count(), 0);
}

#[test]
fn framebuffer_attachments_are_validated() {
    let Some(device) = create_test_device() else {
        return;
    };

    let color = device
        .create_texture(&target_descriptor("c", 16, 16, TextureFormat::Rgba8Unorm))
        .unwrap();
    let small_color = device
        .create_texture(&target_descriptor("c2", 8, 8, TextureFormat::Rgba8Unorm))
        .unwrap();

    let empty = FramebufferDescriptor {
        label: None,
        color_attachments: Cow::Borrowed(&[]),
        depth_stencil_attachment: None,
    };
    assert!(matches!(
        device.create_framebuffer(&empty),
        Err(ResourceError::InvalidDescriptor(_))
    ));

    let mismatched = [color, small_color];
    let desc = FramebufferDescriptor {
        label: Some(Cow::Borrowed("mismatched")),
        color_attachments: Cow::Borrowed(&mismatched),
        depth_stencil_attachment: None,
    };
    assert!(matches!(
        device.create_framebuffer(&desc),
        Err(ResourceError::InvalidDescriptor(_))
    ));

    let depth_as_color = FramebufferDescriptor {
        label: None,
        color_attachments: Cow::Borrowed(&[]),
        depth_stencil_attachment: Some(color),
    };
    assert!(matches!(
        device.create_framebuffer(&depth_as_color),
        Err(ResourceError::InvalidDescriptor(_))
    ));

    let single = [color];
    let fb = device
        .create_framebuffer(&FramebufferDescriptor {
            label: Some(Cow::Borrowed("ok")),
            color_attachments: Cow::Borrowed(&single),
            depth_stencil_attachment: None,
        })
        .unwrap();
    let views = device.get_framebuffer_views(fb).unwrap();
    assert_eq!(views.color.len(), 1);
    assert!(views.depth_stencil.is_none());
    assert_eq!(views.extent.width, 16);

    device.destroy_framebuffer(fb).unwrap();
    assert_eq!(device.framebuffer_count(), 0);
    device.destroy_texture(color).unwrap();
    device.destroy_texture(small_color).unwrap();
}

#[test]
fn samplers_round_trip_through_registry() {
    let Some(device) = create_test_device() else {
        return;
    };

    let id = device
        .create_sampler(&SamplerDescriptor::nearest_clamped("nearest"))
        .unwrap();
    assert!(device.get_wgpu_sampler(id).is_some());
    device.destroy_sampler(id).unwrap();
    assert!(matches!(
        device.destroy_sampler(id),
        Err(ResourceError::NotFound)
    ));
}

#[test]
fn unknown_feature_is_not_supported() {
    let Some(device) = create_test_device() else {
        return;
    };
    assert!(!device.supports_feature("geometry_shaders"));
}

#[test]
fn post_processor_allocates_and_releases_on_wgpu() {
    let Some(device) = create_test_device() else {
        return;
    };
    if !device.supports_feature(features::DEPTH_TEXTURE) {
        println!("Skipping post-process test: depth textures unsupported.");
        return;
    }

    let mut processor = PointCloudPostProcessor::new();
    let mut frame = FrameState::new(Extent2D::new(128, 64));
    frame.push(DrawCommand::viewport_quad("points", ""));

    processor
        .process(&device, &mut frame, 0..1)
        .expect("post-processing should succeed on a depth-capable adapter");

    assert!(processor.pool().is_allocated());
    assert_eq!(device.texture_count(), 6);
    assert_eq!(device.framebuffer_count(), 4);
    assert_eq!(
        device.vram_allocated_bytes() as u64,
        processor.pool().memory_usage_bytes()
    );
    assert!(frame.commands.len() > 1);

    processor.destroy(&device);
    assert_eq!(device.texture_count(), 0);
    assert_eq!(device.framebuffer_count(), 0);
    assert_eq!(device.vram_allocated_bytes(), 0);
}
