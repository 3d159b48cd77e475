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

//! Capability gate: the pipeline only runs on devices with depth textures.

use pointfill_core::renderer::{features, GraphicsDevice};
use std::sync::atomic::{AtomicBool, Ordering};

/// Decides whether the post-processing pipeline can run on a device.
///
/// A denial is not an error. The frame driver passes the frame through
/// untouched; the first denial is logged and later ones are silent.
#[derive(Debug, Default)]
pub struct CapabilityGate {
    denial_logged: AtomicBool,
}

impl CapabilityGate {
    /// Creates a gate that has not logged anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff the device reports the `depth_texture` feature.
    pub fn is_supported(&self, device: &dyn GraphicsDevice) -> bool {
        let supported = device.supports_feature(features::DEPTH_TEXTURE);
        if !supported && !self.denial_logged.swap(true, Ordering::Relaxed) {
            log::info!(
                "PointCloudPostProcessor: '{}' is not supported by adapter '{}', point cloud post-processing disabled",
                features::DEPTH_TEXTURE,
                device.get_adapter_info().name
            );
        }
        supported
    }

    /// Returns `true` once a denial has been reported.
    pub fn has_denied(&self) -> bool {
        self.denial_logged.load(Ordering::Relaxed)
    }
}
