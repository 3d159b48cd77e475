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

//! Backend-agnostic rendering API.
//!
//! - **[`adapter`]**: Information about the graphics adapter behind a device.
//! - **[`texture`]**: Texture and sampler handles and their descriptors.
//! - **[`framebuffer`]**: Named attachment sets used as render targets.
//! - **[`command`]**: Draw and clear commands, render state, pass tags.
//! - **[`frame`]**: The per-frame state handed to post-processing lanes.

pub mod adapter;
pub mod command;
pub mod frame;
pub mod framebuffer;
pub mod texture;

pub use self::adapter::*;
pub use self::command::*;
pub use self::frame::*;
pub use self::framebuffer::*;
pub use self::texture::*;
