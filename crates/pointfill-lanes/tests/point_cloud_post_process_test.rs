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

use pointfill_core::lane::{Lane, LaneContext, LaneError, LaneKind, Slot, UpstreamCommands};
use pointfill_core::math::{Extent2D, Extent3D, LinearRgba};
use pointfill_core::renderer::{
    features, BlendMode, ClearCommand, Command, DrawCommand, FrameState, FramebufferDescriptor,
    FramebufferId, GraphicsAdapterInfo, GraphicsDevice, PassKind, RenderState, ResourceError,
    SamplerDescriptor, SamplerId, ShaderBinding, ShaderProgramId, TextureDescriptor, TextureId,
};
use pointfill_lanes::render_lane::point_cloud::{
    FramebufferName, PointCloudPostProcessLane, PointCloudPostProcessor, PoolStatus,
    PostProcessError, PostProcessSettings, RenderTargetPool, TextureSlot, COLOR_INPUT,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    next_id: usize,
    textures: HashMap<usize, Extent3D>,
    samplers: HashSet<usize>,
    framebuffers: HashMap<usize, Vec<TextureId>>,
    textures_created: usize,
    destroyed_textures: Vec<TextureId>,
    fail_texture_at: Option<usize>,
    /// Live (textures, framebuffers) seen by each texture creation, in order.
    live_at_texture_creation: Vec<(usize, usize)>,
}

#[derive(Debug)]
struct MockGraphicsDevice {
    depth_texture: bool,
    state: Mutex<MockState>,
}

impl MockGraphicsDevice {
    fn new() -> Self {
        Self {
            depth_texture: true,
            state: Mutex::new(MockState::default()),
        }
    }

    fn without_depth_texture() -> Self {
        Self {
            depth_texture: false,
            ..Self::new()
        }
    }

    /// Makes the `n`-th texture creation (0-based, counted from now) fail.
    fn fail_texture_creation_at(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.fail_texture_at = Some(state.textures_created + n);
    }

    fn live_textures(&self) -> usize {
        self.state.lock().unwrap().textures.len()
    }

    fn live_samplers(&self) -> usize {
        self.state.lock().unwrap().samplers.len()
    }

    fn live_framebuffers(&self) -> usize {
        self.state.lock().unwrap().framebuffers.len()
    }

    fn textures_created(&self) -> usize {
        self.state.lock().unwrap().textures_created
    }

    fn texture_size(&self, id: TextureId) -> Option<Extent3D> {
        self.state.lock().unwrap().textures.get(&id.0).copied()
    }

    fn is_live_framebuffer(&self, id: FramebufferId) -> bool {
        self.state.lock().unwrap().framebuffers.contains_key(&id.0)
    }

    fn live_at_texture_creation(&self, n: usize) -> (usize, usize) {
        self.state.lock().unwrap().live_at_texture_creation[n]
    }

    fn was_destroyed(&self, id: TextureId) -> bool {
        self.state.lock().unwrap().destroyed_textures.contains(&id)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        let live = (state.textures.len(), state.framebuffers.len());
        state.live_at_texture_creation.push(live);
        if state.fail_texture_at == Some(state.textures_created) {
            state.fail_texture_at = None;
            return Err(ResourceError::AllocationFailed {
                label: descriptor.label.as_deref().unwrap_or("unlabeled").to_string(),
                details: "mock out of memory".to_string(),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.textures.insert(id, descriptor.size);
        state.textures_created += 1;
        Ok(TextureId(id))
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        state.textures.remove(&id.0).ok_or(ResourceError::NotFound)?;
        state.destroyed_textures.push(id);
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.samplers.insert(id);
        Ok(SamplerId(id))
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        if state.samplers.remove(&id.0) {
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        let mut size = None;
        for attachment in descriptor.attachments() {
            let extent = state
                .textures
                .get(&attachment.0)
                .copied()
                .ok_or(ResourceError::NotFound)?;
            if size.is_some_and(|s| s != extent) {
                return Err(ResourceError::InvalidDescriptor(
                    "attachment size mismatch".to_string(),
                ));
            }
            size = Some(extent);
        }
        state.next_id += 1;
        let id = state.next_id;
        state
            .framebuffers
            .insert(id, descriptor.attachments().collect());
        Ok(FramebufferId(id))
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        state
            .framebuffers
            .remove(&id.0)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn get_adapter_info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: "Mock Adapter".to_string(),
            ..Default::default()
        }
    }

    fn supports_feature(&self, feature_name: &str) -> bool {
        feature_name == features::DEPTH_TEXTURE && self.depth_texture
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn upstream_draw() -> Command {
    Command::Draw(DrawCommand {
        shader: ShaderBinding::Program(ShaderProgramId(7)),
        textures: Vec::new(),
        framebuffer: None,
        render_state: RenderState::default(),
        pass: PassKind::Translucent,
        cast_shadows: true,
        receive_shadows: true,
        owner: None,
    })
}

fn frame_with_upstream(size: Extent2D, draws: usize) -> FrameState {
    let mut frame = FrameState::new(size);
    for _ in 0..draws {
        frame.push(upstream_draw());
    }
    frame
}

fn draw(command: &Command) -> &DrawCommand {
    command.as_draw().expect("expected a draw command")
}

fn clear(command: &Command) -> &ClearCommand {
    command.as_clear().expect("expected a clear command")
}

fn color_input(command: &DrawCommand) -> TextureId {
    command
        .textures
        .iter()
        .find(|binding| binding.name == COLOR_INPUT)
        .map(|binding| binding.texture)
        .expect("draw has no color input")
}

#[test]
fn pool_textures_match_drawing_buffer_size() {
    for (w, h) in [(1, 1), (640, 480), (1920, 1080), (3, 7)] {
        let device = MockGraphicsDevice::new();
        let mut pool = RenderTargetPool::new();
        let size = Extent2D::new(w, h);

        assert_eq!(pool.ensure_resources(&device, size).unwrap(), PoolStatus::Created);

        assert_eq!(pool.textures().len(), 6);
        for id in pool.textures() {
            assert_eq!(device.texture_size(id).unwrap().to_2d(), size);
        }
        assert_eq!(device.live_textures(), 6);
        assert_eq!(device.live_samplers(), 1);
        assert_eq!(device.live_framebuffers(), 4);
        assert_eq!(pool.memory_usage_bytes(), size.area() * 36);

        let created = device.textures_created();
        assert_eq!(pool.ensure_resources(&device, size).unwrap(), PoolStatus::Unchanged);
        assert_eq!(device.textures_created(), created);
        assert_eq!(device.live_framebuffers(), 4);
    }
}

#[test]
fn pool_is_lazy() {
    let device = MockGraphicsDevice::new();
    let _processor = PointCloudPostProcessor::new();
    assert_eq!(device.live_textures(), 0);
    assert_eq!(device.live_framebuffers(), 0);
}

#[test]
fn resize_releases_the_previous_group() {
    let device = MockGraphicsDevice::new();
    let mut pool = RenderTargetPool::new();
    pool.ensure_resources(&device, Extent2D::new(800, 600)).unwrap();
    let old_textures = pool.textures();
    let old_prior = pool.resolve_framebuffer(FramebufferName::Prior).unwrap();
    let first_new_texture = device.state.lock().unwrap().live_at_texture_creation.len();

    let status = pool
        .ensure_resources(&device, Extent2D::new(1024, 768))
        .unwrap();
    assert_eq!(status, PoolStatus::Resized);

    // The old group is gone before the first texture of the new one is created.
    assert_eq!(device.live_at_texture_creation(first_new_texture), (0, 0));

    for id in &old_textures {
        assert!(device.was_destroyed(*id));
    }
    assert!(!device.is_live_framebuffer(old_prior));
    assert_eq!(device.live_textures(), 6);
    assert_eq!(device.live_samplers(), 1);
    assert_eq!(device.live_framebuffers(), 4);
    for id in pool.textures() {
        assert_eq!(
            device.texture_size(id).unwrap().to_2d(),
            Extent2D::new(1024, 768)
        );
    }
}

#[test]
fn failed_resize_leaves_frame_untouched_and_recovers() {
    init_logging();
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(800, 600), 1);
    processor.process(&device, &mut frame, 0..1).unwrap();

    device.fail_texture_creation_at(2);
    let mut frame = frame_with_upstream(Extent2D::new(1024, 768), 1);
    let before = frame.commands.clone();
    let err = processor.process(&device, &mut frame, 0..1).unwrap_err();
    assert!(matches!(err, PostProcessError::Allocation(_)));
    assert_eq!(frame.commands, before);
    assert!(!processor.pool().is_allocated());
    assert_eq!(device.live_textures(), 0);
    assert_eq!(device.live_samplers(), 0);
    assert_eq!(device.live_framebuffers(), 0);

    processor.process(&device, &mut frame, 0..1).unwrap();
    assert_eq!(frame.commands.len(), 1 + 2 * 5 + 2);
    assert_eq!(device.live_textures(), 6);
    assert_eq!(device.live_framebuffers(), 4);
    assert_eq!(processor.pool().size(), Some(Extent2D::new(1024, 768)));
    let prior = processor
        .pool()
        .resolve_framebuffer(FramebufferName::Prior)
        .unwrap();
    assert_eq!(draw(&frame.commands[0]).framebuffer, Some(prior));
}

#[test]
fn invalid_settings_are_rejected_at_construction() {
    let huge = PostProcessSettings {
        region_growing_iterations: u32::MAX,
        ..Default::default()
    };
    assert!(matches!(
        PointCloudPostProcessor::with_settings(huge.clone()),
        Err(PostProcessError::InvalidSettings(_))
    ));
    assert!(matches!(
        PointCloudPostProcessLane::with_settings(huge),
        Err(PostProcessError::InvalidSettings(_))
    ));

    let bad_color = PostProcessSettings {
        clear_color: [1.0, 2.0, -5.0, 9.0],
        ..Default::default()
    };
    assert!(PointCloudPostProcessor::with_settings(bad_color).is_err());
}

#[test]
fn framebuffers_alias_pool_textures() {
    let device = MockGraphicsDevice::new();
    let mut pool = RenderTargetPool::new();
    pool.ensure_resources(&device, Extent2D::new(64, 64)).unwrap();

    let state = device.state.lock().unwrap();
    let attachments = |name| {
        state.framebuffers[&pool.resolve_framebuffer(name).unwrap().0].clone()
    };
    let tex = |slot| pool.resolve_texture(slot).unwrap();

    assert_eq!(
        attachments(FramebufferName::Prior),
        vec![
            tex(TextureSlot::Color(0)),
            tex(TextureSlot::EyeSpace),
            tex(TextureSlot::Depth(2))
        ]
    );
    assert_eq!(
        attachments(FramebufferName::ScreenSpacePass),
        vec![tex(TextureSlot::Depth(0))]
    );
    assert_eq!(
        attachments(FramebufferName::RegionGrowingPassA),
        vec![tex(TextureSlot::Color(1)), tex(TextureSlot::Depth(1))]
    );
    assert_eq!(
        attachments(FramebufferName::RegionGrowingPassB),
        vec![tex(TextureSlot::Color(0)), tex(TextureSlot::Depth(0))]
    );
}

#[test]
fn allocation_failure_releases_partial_group() {
    init_logging();
    let device = MockGraphicsDevice::new();
    device.fail_texture_creation_at(3);
    let mut pool = RenderTargetPool::new();

    let err = pool
        .ensure_resources(&device, Extent2D::new(256, 256))
        .unwrap_err();
    assert!(matches!(
        err,
        PostProcessError::Allocation(ResourceError::AllocationFailed { .. })
    ));
    assert!(!pool.is_allocated());
    assert_eq!(device.live_textures(), 0);
    assert_eq!(device.live_samplers(), 0);
    assert_eq!(device.live_framebuffers(), 0);
}

#[test]
fn empty_drawing_buffer_is_rejected() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(0, 720), 2);

    let err = processor.process(&device, &mut frame, 0..2).unwrap_err();
    assert!(matches!(err, PostProcessError::EmptyDrawingBuffer(_)));
    assert_eq!(device.live_textures(), 0);
    assert_eq!(frame.commands, frame_with_upstream(Extent2D::new(0, 720), 2).commands);
}

#[test]
fn unsupported_device_leaves_frame_unchanged() {
    init_logging();
    let device = MockGraphicsDevice::without_depth_texture();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(320, 240), 3);
    let before = frame.commands.clone();

    processor.process(&device, &mut frame, 0..3).unwrap();
    processor.process(&device, &mut frame, 0..3).unwrap();

    assert_eq!(frame.commands, before);
    assert_eq!(device.live_textures(), 0);
    assert!(!processor.pool().is_allocated());
}

#[test]
fn three_upstream_draws_produce_the_full_sequence() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(1280, 720), 3);

    processor.process(&device, &mut frame, 0..3).unwrap();

    let pool = processor.pool();
    let prior = pool.resolve_framebuffer(FramebufferName::Prior).unwrap();
    for command in &frame.commands[..3] {
        let draw = draw(command);
        assert_eq!(draw.framebuffer, Some(prior));
        assert!(!draw.cast_shadows);
        assert!(!draw.receive_shadows);
        assert_eq!(draw.pass, PassKind::PointCloud);
    }

    let k = processor.settings().region_growing_iterations as usize;
    let appended = &frame.commands[3..];
    assert_eq!(appended.len(), 2 * (k + 1) + 2);

    let expected_targets = [
        FramebufferName::ScreenSpacePass,
        FramebufferName::RegionGrowingPassA,
        FramebufferName::RegionGrowingPassB,
        FramebufferName::RegionGrowingPassA,
        FramebufferName::RegionGrowingPassB,
    ];
    for (stage, pair) in appended[..2 * (k + 1)].chunks(2).enumerate() {
        let target = pool.resolve_framebuffer(expected_targets[stage]);
        let clear = clear(&pair[0]);
        let draw = draw(&pair[1]);
        assert_eq!(clear.framebuffer, target);
        assert_eq!(draw.framebuffer, target);
        assert_eq!(clear.color, Some(LinearRgba::TRANSPARENT));
        assert_eq!(clear.depth, Some(1.0));
        assert_eq!(draw.pass, PassKind::PointCloud);
        assert_eq!(draw.owner, Some(processor.owner()));
    }

    let blend = draw(&appended[2 * (k + 1)]);
    assert_eq!(blend.framebuffer, None);
    assert_eq!(blend.render_state.blending, BlendMode::AlphaBlend);
    assert_eq!(
        color_input(blend),
        pool.resolve_texture(TextureSlot::Color(1)).unwrap()
    );

    let final_clear = clear(&appended[2 * (k + 1) + 1]);
    assert_eq!(final_clear.framebuffer, Some(prior));
}

#[test]
fn region_growing_reads_by_parity() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(100, 100), 1);
    processor.process(&device, &mut frame, 0..1).unwrap();

    let pool = processor.pool();
    let draws: Vec<&DrawCommand> = frame.commands[1..]
        .iter()
        .filter_map(Command::as_draw)
        .collect();

    // Occlusion reads color 0, then iteration i reads color i % 2.
    assert_eq!(
        color_input(draws[0]),
        pool.resolve_texture(TextureSlot::Color(0)).unwrap()
    );
    for iteration in 0..4 {
        let read = pool.resolve_texture(TextureSlot::Color(iteration % 2)).unwrap();
        let draw = draws[1 + iteration];
        assert_eq!(color_input(draw), read);

        let written = device.state.lock().unwrap().framebuffers[&draw.framebuffer.unwrap().0]
            .clone();
        for binding in &draw.textures {
            assert!(!written.contains(&binding.texture));
        }
    }
}

#[test]
fn iteration_count_comes_from_settings() {
    let device = MockGraphicsDevice::new();
    let settings = PostProcessSettings::from_ron_str("(region_growing_iterations: 2)").unwrap();
    let mut processor = PointCloudPostProcessor::with_settings(settings).unwrap();
    let mut frame = frame_with_upstream(Extent2D::new(100, 100), 1);
    processor.process(&device, &mut frame, 0..1).unwrap();

    let appended = &frame.commands[1..];
    assert_eq!(appended.len(), 2 * 3 + 2);

    // Three draws: the blend reads color 1 - 3 % 2 = 0.
    let blend = draw(&appended[6]);
    assert_eq!(
        color_input(blend),
        processor
            .pool()
            .resolve_texture(TextureSlot::Color(0))
            .unwrap()
    );
}

#[test]
fn only_draws_inside_the_range_are_captured() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(200, 100), 2);
    frame.push(ClearCommand {
        framebuffer: None,
        color: Some(LinearRgba::BLACK),
        depth: None,
        pass: PassKind::Opaque,
        owner: None,
    });
    frame.push(upstream_draw());
    frame.push(upstream_draw());
    let untouched_clear = frame.commands[2].clone();

    processor.process(&device, &mut frame, 2..4).unwrap();

    let prior = processor
        .pool()
        .resolve_framebuffer(FramebufferName::Prior)
        .unwrap();
    assert_eq!(draw(&frame.commands[0]).framebuffer, None);
    assert_eq!(draw(&frame.commands[1]).framebuffer, None);
    assert_eq!(frame.commands[2], untouched_clear);
    assert_eq!(draw(&frame.commands[3]).framebuffer, Some(prior));
    assert_eq!(draw(&frame.commands[4]).framebuffer, None);
    assert!(draw(&frame.commands[4]).cast_shadows);
}

#[test]
fn out_of_bounds_range_is_rejected_before_mutation() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(200, 100), 2);
    let before = frame.commands.clone();

    let err = processor.process(&device, &mut frame, 1..5).unwrap_err();
    assert!(matches!(
        err,
        PostProcessError::InvalidRange {
            start: 1,
            end: 5,
            len: 2
        }
    ));
    assert_eq!(frame.commands, before);
    assert_eq!(device.live_textures(), 0);
}

#[test]
fn commands_follow_the_pool_across_resizes() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();

    let mut first = frame_with_upstream(Extent2D::new(640, 480), 1);
    processor.process(&device, &mut first, 0..1).unwrap();
    let mut second = frame_with_upstream(Extent2D::new(800, 600), 1);
    processor.process(&device, &mut second, 0..1).unwrap();

    for command in &second.commands {
        if let Some(id) = command.framebuffer() {
            assert!(device.is_live_framebuffer(id));
        }
        if let Some(draw) = command.as_draw() {
            for binding in &draw.textures {
                assert_eq!(
                    device.texture_size(binding.texture).unwrap().to_2d(),
                    Extent2D::new(800, 600)
                );
            }
        }
    }
    for command in &first.commands {
        if let Some(id) = command.framebuffer() {
            assert!(!device.is_live_framebuffer(id));
        }
    }
}

#[test]
fn steady_state_frames_allocate_nothing() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    for _ in 0..3 {
        let mut frame = frame_with_upstream(Extent2D::new(640, 480), 2);
        processor.process(&device, &mut frame, 0..2).unwrap();
    }
    assert_eq!(device.textures_created(), 6);
}

#[test]
fn destroy_releases_everything_and_guards_process() {
    let device = MockGraphicsDevice::new();
    let mut processor = PointCloudPostProcessor::new();
    let mut frame = frame_with_upstream(Extent2D::new(640, 480), 1);
    processor.process(&device, &mut frame, 0..1).unwrap();
    assert!(!processor.is_destroyed());

    processor.destroy(&device);
    assert!(processor.is_destroyed());
    assert_eq!(device.live_textures(), 0);
    assert_eq!(device.live_samplers(), 0);
    assert_eq!(device.live_framebuffers(), 0);

    processor.destroy(&device);
    assert!(processor.is_destroyed());

    let mut frame = frame_with_upstream(Extent2D::new(640, 480), 1);
    let err = processor.process(&device, &mut frame, 0..1).unwrap_err();
    assert!(matches!(err, PostProcessError::Destroyed));
}

#[test]
fn lane_runs_the_processor_from_context() {
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new());
    let lane = PointCloudPostProcessLane::new();
    assert_eq!(lane.strategy_name(), "PointCloudPostProcess");
    assert_eq!(lane.lane_kind(), LaneKind::PostProcess);

    let mut frame = frame_with_upstream(Extent2D::new(1280, 720), 2);
    frame.push(upstream_draw());
    {
        let mut ctx = LaneContext::new();
        ctx.insert(device.clone());
        ctx.insert(Slot::new(&mut frame));
        ctx.insert(UpstreamCommands(0..2));

        assert!(lane.estimate_cost(&ctx) > 0.0);
        lane.execute(&mut ctx).unwrap();
    }

    let processor = lane.processor().unwrap();
    let prior = processor
        .pool()
        .resolve_framebuffer(FramebufferName::Prior)
        .unwrap();
    assert_eq!(draw(&frame.commands[0]).framebuffer, Some(prior));
    assert_eq!(draw(&frame.commands[1]).framebuffer, Some(prior));
    assert_eq!(draw(&frame.commands[2]).framebuffer, None);
    assert_eq!(frame.commands.len(), 3 + 12);
}

#[test]
fn lane_defaults_to_the_whole_command_list() {
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new());
    let lane = PointCloudPostProcessLane::new();
    let mut frame = frame_with_upstream(Extent2D::new(320, 200), 3);
    {
        let mut ctx = LaneContext::new();
        ctx.insert(device.clone());
        ctx.insert(Slot::new(&mut frame));
        lane.execute(&mut ctx).unwrap();
    }
    for command in &frame.commands[..3] {
        assert_eq!(draw(command).pass, PassKind::PointCloud);
        assert!(draw(command).framebuffer.is_some());
    }
}

#[test]
fn lane_reports_missing_context() {
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new());
    let lane = PointCloudPostProcessLane::new();
    let mut ctx = LaneContext::new();
    ctx.insert(device);

    let err = lane.execute(&mut ctx).unwrap_err();
    assert!(matches!(
        err,
        LaneError::InvalidContext {
            expected: "Slot<FrameState>",
            ..
        }
    ));
}

#[test]
fn lane_shutdown_releases_resources() {
    let mock = Arc::new(MockGraphicsDevice::new());
    let device: Arc<dyn GraphicsDevice> = mock.clone();
    let lane = PointCloudPostProcessLane::new();
    let mut frame = frame_with_upstream(Extent2D::new(320, 200), 1);

    let mut ctx = LaneContext::new();
    ctx.insert(device);
    ctx.insert(Slot::new(&mut frame));
    lane.execute(&mut ctx).unwrap();
    assert_eq!(mock.live_textures(), 6);

    lane.on_shutdown(&mut ctx);
    assert_eq!(mock.live_textures(), 0);
    assert_eq!(mock.live_framebuffers(), 0);
    assert!(lane.processor().unwrap().is_destroyed());
}

#[test]
fn lane_wraps_processor_errors() {
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new());
    let lane = PointCloudPostProcessLane::new();
    let mut frame = frame_with_upstream(Extent2D::new(320, 200), 1);

    let mut ctx = LaneContext::new();
    ctx.insert(device);
    ctx.insert(Slot::new(&mut frame));
    ctx.insert(UpstreamCommands(0..9));

    let err = lane.execute(&mut ctx).unwrap_err();
    assert!(matches!(err, LaneError::ExecutionFailed(_)));
    assert!(err.to_string().contains("0..9"));
}
