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

//! Built-in WGSL sources for the point-cloud post-processing stages.
//!
//! Every shader draws a single viewport-covering triangle (`vs_main`) and
//! samples its inputs with the pool's shared nearest/clamp sampler bound at
//! `@binding(0)`.
//!
//! - [`POINT_OCCLUSION_WGSL`] - Screen-space point occlusion
//! - [`REGION_GROWING_WGSL`] - One region-growing iteration
//! - [`BLEND_WGSL`] - Final composite into the caller's framebuffer

/// Point occlusion stage.
///
/// `color.rgb * 0.5 + normalize(ec.xyz) * 0.1`, where `ec` is the eye-space
/// position captured alongside the color.
pub const POINT_OCCLUSION_WGSL: &str = include_str!("point_occlusion.wgsl");

/// Region-growing stage.
///
/// `color.rgb * 0.5 + depth * 0.1`, reading one color/depth pair of the
/// ping-pong set.
pub const REGION_GROWING_WGSL: &str = include_str!("region_growing.wgsl");

/// Passthrough blend of the final grown color.
pub const BLEND_WGSL: &str = include_str!("blend.wgsl");
