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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" shared by the post-processing
//! lanes and the graphics backends: the abstract [`GraphicsDevice`] trait,
//! texture and framebuffer descriptors, the per-frame command model
//! ([`DrawCommand`], [`ClearCommand`], [`FrameState`]) and the error types.
//!
//! The lanes decide *what* to allocate and *which* commands to emit; a
//! concrete backend (e.g. the `wgpu` device in `pointfill-infra`) decides
//! *how* those resources exist on the GPU.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::ResourceError;
pub use self::traits::{features, GraphicsDevice};
