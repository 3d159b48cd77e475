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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Well-known capability names accepted by [`GraphicsDevice::supports_feature`].
pub mod features {
    /// Depth textures that can be both rendered to and sampled.
    pub const DEPTH_TEXTURE: &str = "depth_texture";
}

/// The backend-agnostic resource interface of a graphics device.
///
/// Every method takes `&self`; implementations synchronize internally so a
/// device can be shared as `Arc<dyn GraphicsDevice>`.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new texture.
    /// ## Errors
    /// * `ResourceError` - If the descriptor is invalid or allocation fails.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys the texture associated with the given ID.
    /// ## Errors
    /// * `ResourceError::NotFound` - If the ID is unknown.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a new sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Destroys the sampler associated with the given ID.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Binds existing textures into a framebuffer.
    ///
    /// The framebuffer references its attachments; it does not own them.
    /// ## Errors
    /// * `ResourceError::NotFound` - If an attachment does not exist.
    /// * `ResourceError::InvalidDescriptor` - If attachments differ in size.
    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError>;

    /// Destroys a framebuffer without touching its attachments.
    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError>;

    /// Returns information about the adapter behind this device.
    fn get_adapter_info(&self) -> GraphicsAdapterInfo;

    /// Returns `true` if the device supports the named capability.
    ///
    /// See [`features`] for the recognized names. Unknown names report `false`.
    fn supports_feature(&self, feature_name: &str) -> bool;
}
