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

//! Context key types for [`LaneContext`](super::LaneContext).
//!
//! | Key                    | Meaning                                               |
//! |------------------------|-------------------------------------------------------|
//! | `Arc<dyn GraphicsDevice>` | The device lanes allocate resources on             |
//! | `Slot<FrameState>`     | The frame being built (mutable borrow)                |
//! | [`UpstreamCommands`]   | Range of commands produced by the upstream renderer   |

use std::ops::Range;

/// Half-open range `[start, end)` of the frame's command list that holds the
/// upstream point-cloud draws a post-process lane should capture.
///
/// When absent, lanes treat the whole command list as upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamCommands(pub Range<usize>);
