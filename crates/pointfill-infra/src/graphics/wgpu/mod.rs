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

//! The `wgpu` backend.
//!
//! - [`WgpuGraphicsContext`]: adapter, logical device and queue.
//! - [`WgpuDevice`]: the [`GraphicsDevice`](pointfill_core::GraphicsDevice) implementation.
//! - [`conversions`]: mapping between core types and `wgpu` types.

pub mod context;
pub mod conversions;
pub mod device;

pub use self::context::WgpuGraphicsContext;
pub use self::device::{WgpuDevice, WgpuFramebufferViews};
