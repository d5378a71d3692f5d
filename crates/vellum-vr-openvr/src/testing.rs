//! Test doubles for the collaborator seams: a scripted hardware runtime, a
//! recording GL facade, and a recording pipeline.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use vellum_vr::runtime::{
    ControllerState, FloatProperty, Interface, LoadPoll, RawDevicePose, RawModel, RawTextureMap,
    RuntimeEvent, StringProperty, TrackingSpace,
};
use vellum_vr::{
    ColorSpace, DeviceIndex, Eye, Hand, RenderPipeline, ShaderId, VrError, VrResult, VrRuntime,
};

use crate::gl::{FramebufferId, FramebufferTarget, GlFacade, RenderbufferId, TextureId};

pub(crate) fn valid_pose_at(position: [f32; 3]) -> RawDevicePose {
    RawDevicePose {
        valid: true,
        connected: true,
        transform: [
            [1.0, 0.0, 0.0, position[0]],
            [0.0, 1.0, 0.0, position[1]],
            [0.0, 0.0, 1.0, position[2]],
        ],
        linear_velocity: [0.0; 3],
        angular_velocity: [0.0; 3],
    }
}

pub(crate) struct MockRuntime {
    pub hmd_present: bool,
    pub runtime_installed: bool,
    pub fail_init: bool,
    pub fail_interface: Option<Interface>,
    pub manufacturer: String,
    pub render_model_name: String,
    pub refresh_hz: f32,
    pub vsync_to_photons: f32,
    pub render_size: (u32, u32),
    pub left_device: Option<DeviceIndex>,
    pub right_device: Option<DeviceIndex>,
    pub connected: HashSet<DeviceIndex>,
    pub poses: HashMap<DeviceIndex, RawDevicePose>,
    pub predicted_calls: Cell<u32>,
    pub predicted_seconds: Cell<f32>,
    /// When set, every fresh prediction drifts along x so repeated queries
    /// are distinguishable from batch reads.
    pub predicted_drift: bool,
    pub time_since_vsync: Option<f32>,
    pub events: VecDeque<RuntimeEvent>,
    pub controller_states: HashMap<DeviceIndex, ControllerState>,
    pub haptic_pulses: Vec<(DeviceIndex, u32, u16)>,
    pub submitted: Vec<(Eye, u32, ColorSpace)>,
    pub wait_poses_calls: u32,
    pub fail_wait_poses: bool,
    pub model: RawModel,
    pub model_texture: RawTextureMap,
    pub remaining_model_polls: u32,
    pub remaining_texture_polls: u32,
    pub fail_model_load: bool,
    pub model_requests: Vec<String>,
    pub tracking_space: TrackingSpace,
    pub play_area: Option<(f32, f32)>,
    pub play_area_corners: Option<[[f32; 3]; 4]>,
}

impl MockRuntime {
    pub fn available() -> Self {
        Self {
            hmd_present: true,
            runtime_installed: true,
            fail_init: false,
            fail_interface: None,
            manufacturer: "HTC".into(),
            render_model_name: "vellum_controller".into(),
            refresh_hz: 90.0,
            vsync_to_photons: 0.011,
            render_size: (1512, 1680),
            left_device: None,
            right_device: None,
            connected: HashSet::new(),
            poses: HashMap::new(),
            predicted_calls: Cell::new(0),
            predicted_seconds: Cell::new(0.0),
            predicted_drift: true,
            time_since_vsync: Some(0.0),
            events: VecDeque::new(),
            controller_states: HashMap::new(),
            haptic_pulses: Vec::new(),
            submitted: Vec::new(),
            wait_poses_calls: 0,
            fail_wait_poses: false,
            model: RawModel::default(),
            model_texture: RawTextureMap { width: 1, height: 1, rgba: vec![255; 4] },
            remaining_model_polls: 0,
            remaining_texture_polls: 0,
            fail_model_load: false,
            model_requests: Vec::new(),
            tracking_space: TrackingSpace::Seated,
            play_area: None,
            play_area_corners: None,
        }
    }

    pub fn absent() -> Self {
        Self {
            hmd_present: false,
            runtime_installed: false,
            ..Self::available()
        }
    }
}

impl VrRuntime for MockRuntime {
    fn hmd_present(&self) -> bool {
        self.hmd_present
    }

    fn runtime_installed(&self) -> bool {
        self.runtime_installed
    }

    fn init(&mut self) -> VrResult<()> {
        if self.fail_init {
            return Err(VrError::Runtime("init failed".into()));
        }
        Ok(())
    }

    fn acquire_interface(&mut self, interface: Interface) -> VrResult<()> {
        if self.fail_interface == Some(interface) {
            return Err(VrError::Runtime(format!("interface {interface:?} missing")));
        }
        Ok(())
    }

    fn string_property(&self, _device: DeviceIndex, property: StringProperty) -> Option<String> {
        match property {
            StringProperty::ManufacturerName => Some(self.manufacturer.clone()),
            StringProperty::RenderModelName => Some(self.render_model_name.clone()),
        }
    }

    fn float_property(&self, _device: DeviceIndex, property: FloatProperty) -> Option<f32> {
        match property {
            FloatProperty::DisplayFrequency => Some(self.refresh_hz),
            FloatProperty::SecondsFromVsyncToPhotons => Some(self.vsync_to_photons),
        }
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        self.render_size
    }

    fn projection_matrix(&self, eye: Eye, near: f32, far: f32) -> [[f32; 4]; 4] {
        let shift = match eye {
            Eye::Left => -0.05,
            Eye::Right => 0.05,
        };
        [
            [1.0, 0.0, shift, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, -(far + near) / (far - near), -(2.0 * far * near) / (far - near)],
            [0.0, 0.0, -1.0, 0.0],
        ]
    }

    fn eye_to_head_transform(&self, eye: Eye) -> [[f32; 4]; 3] {
        let x = match eye {
            Eye::Left => -0.032,
            Eye::Right => 0.032,
        };
        [
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ]
    }

    fn wait_poses(&mut self) -> VrResult<HashMap<DeviceIndex, RawDevicePose>> {
        self.wait_poses_calls += 1;
        if self.fail_wait_poses {
            return Err(VrError::Runtime("compositor lost".into()));
        }
        Ok(self.poses.clone())
    }

    fn time_since_vsync(&self) -> Option<f32> {
        self.time_since_vsync
    }

    fn predicted_pose(&self, device: DeviceIndex, seconds_in_future: f32) -> RawDevicePose {
        self.predicted_calls.set(self.predicted_calls.get() + 1);
        self.predicted_seconds.set(seconds_in_future);
        let mut pose = self.poses.get(&device).copied().unwrap_or_default();
        if self.predicted_drift {
            pose.transform[0][3] += self.predicted_calls.get() as f32;
        }
        pose
    }

    fn device_for_hand(&self, hand: Hand) -> Option<DeviceIndex> {
        match hand {
            Hand::Left => self.left_device,
            Hand::Right => self.right_device,
            Hand::Unknown => None,
        }
    }

    fn hand_for_device(&self, device: DeviceIndex) -> Hand {
        if self.left_device == Some(device) {
            Hand::Left
        } else if self.right_device == Some(device) {
            Hand::Right
        } else {
            Hand::Unknown
        }
    }

    fn device_connected(&self, device: DeviceIndex) -> bool {
        self.connected.contains(&device)
            || self.left_device == Some(device)
            || self.right_device == Some(device)
    }

    fn controller_state(&self, device: DeviceIndex) -> Option<ControllerState> {
        self.controller_states.get(&device).copied()
    }

    fn trigger_haptic_pulse(&mut self, device: DeviceIndex, axis: u32, microseconds: u16) {
        self.haptic_pulses.push((device, axis, microseconds));
    }

    fn poll_event(&mut self) -> Option<RuntimeEvent> {
        self.events.pop_front()
    }

    fn load_render_model(&mut self, name: &str) -> LoadPoll<RawModel> {
        self.model_requests.push(name.to_string());
        if self.fail_model_load {
            return LoadPoll::Failed("render model load failed".into());
        }
        if self.remaining_model_polls > 0 {
            self.remaining_model_polls -= 1;
            return LoadPoll::Pending;
        }
        LoadPoll::Ready(self.model.clone())
    }

    fn load_texture(&mut self, _texture_id: i32) -> LoadPoll<RawTextureMap> {
        if self.remaining_texture_polls > 0 {
            self.remaining_texture_polls -= 1;
            return LoadPoll::Pending;
        }
        LoadPoll::Ready(self.model_texture.clone())
    }

    fn submit(&mut self, eye: Eye, texture: u32, color_space: ColorSpace) -> VrResult<()> {
        self.submitted.push((eye, texture, color_space));
        Ok(())
    }

    fn tracking_space(&self) -> TrackingSpace {
        self.tracking_space
    }

    fn play_area_size(&self) -> Option<(f32, f32)> {
        self.play_area
    }

    fn play_area_rect(&self) -> Option<[[f32; 3]; 4]> {
        self.play_area_corners
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeAttachment {
    Texture(TextureId),
    TextureLayer(TextureId, u32),
    Multiview(TextureId, u32),
    Renderbuffer(RenderbufferId),
}

#[derive(Default)]
struct FakeGlState {
    next_id: u32,
    complete: bool,
    framebuffers_created: u32,
    bound_read: Option<FramebufferId>,
    bound_draw: Option<FramebufferId>,
    bound_renderbuffer: Option<RenderbufferId>,
    attachments: HashMap<(FramebufferId, u32), FakeAttachment>,
    renderbuffer_storage: HashMap<RenderbufferId, (u32, u32, u32, u32)>,
    /// Last clear color observed per framebuffer; 0 stands for the default
    /// surface. Blits copy it from the read binding to the draw binding.
    fills: HashMap<FramebufferId, [f32; 4]>,
    texture_binds: Vec<Option<TextureId>>,
    deleted_framebuffers: Vec<FramebufferId>,
    deleted_renderbuffers: Vec<RenderbufferId>,
    deleted_textures: Vec<TextureId>,
}

pub(crate) struct FakeGl {
    state: RefCell<FakeGlState>,
}

impl FakeGl {
    pub fn new() -> Self {
        let state = FakeGlState { next_id: 1, complete: true, ..Default::default() };
        Self { state: RefCell::new(state) }
    }

    pub fn incomplete() -> Self {
        let gl = Self::new();
        gl.state.borrow_mut().complete = false;
        gl
    }

    pub fn attachment(&self, framebuffer: FramebufferId, attachment: u32) -> Option<FakeAttachment> {
        self.state.borrow().attachments.get(&(framebuffer, attachment)).copied()
    }

    pub fn renderbuffer_format(&self, renderbuffer: RenderbufferId) -> Option<u32> {
        self.state
            .borrow()
            .renderbuffer_storage
            .get(&renderbuffer)
            .map(|&(_, format, _, _)| format)
    }

    pub fn fill_of(&self, framebuffer: FramebufferId) -> Option<[f32; 4]> {
        self.state.borrow().fills.get(&framebuffer).copied()
    }

    pub fn created_framebuffers(&self) -> u32 {
        self.state.borrow().framebuffers_created
    }

    pub fn texture_binds(&self) -> Vec<Option<TextureId>> {
        self.state.borrow().texture_binds.clone()
    }

    pub fn deleted_framebuffers(&self) -> Vec<FramebufferId> {
        self.state.borrow().deleted_framebuffers.clone()
    }

    pub fn deleted_renderbuffers(&self) -> Vec<RenderbufferId> {
        self.state.borrow().deleted_renderbuffers.clone()
    }

    pub fn deleted_textures(&self) -> Vec<TextureId> {
        self.state.borrow().deleted_textures.clone()
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    fn draw_target(&self) -> FramebufferId {
        self.state.borrow().bound_draw.unwrap_or(0)
    }

    fn attach(&self, attachment: u32, value: FakeAttachment) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound_draw.expect("attach with no framebuffer bound");
        state.attachments.insert((framebuffer, attachment), value);
    }
}

impl GlFacade for FakeGl {
    fn create_framebuffer(&self) -> FramebufferId {
        let id = self.next_id();
        self.state.borrow_mut().framebuffers_created += 1;
        id
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>) {
        let mut state = self.state.borrow_mut();
        match target {
            FramebufferTarget::Both => {
                state.bound_read = framebuffer;
                state.bound_draw = framebuffer;
            }
            FramebufferTarget::Read => state.bound_read = framebuffer,
            FramebufferTarget::Draw => state.bound_draw = framebuffer,
        }
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        self.state.borrow_mut().deleted_framebuffers.push(framebuffer);
    }

    fn create_renderbuffer(&self) -> RenderbufferId {
        self.next_id()
    }

    fn bind_renderbuffer(&self, renderbuffer: RenderbufferId) {
        self.state.borrow_mut().bound_renderbuffer = Some(renderbuffer);
    }

    fn renderbuffer_storage(&self, samples: u32, internal_format: u32, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        let renderbuffer = state.bound_renderbuffer.expect("storage with no renderbuffer bound");
        state
            .renderbuffer_storage
            .insert(renderbuffer, (samples, internal_format, width, height));
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        self.state.borrow_mut().deleted_renderbuffers.push(renderbuffer);
    }

    fn create_color_texture(&self, _width: u32, _height: u32, _internal_format: u32) -> TextureId {
        self.next_id()
    }

    fn create_array_texture(
        &self,
        _width: u32,
        _height: u32,
        _layers: u32,
        _internal_format: u32,
    ) -> TextureId {
        self.next_id()
    }

    fn delete_texture(&self, texture: TextureId) {
        self.state.borrow_mut().deleted_textures.push(texture);
    }

    fn attach_renderbuffer(&self, attachment: u32, renderbuffer: RenderbufferId) {
        self.attach(attachment, FakeAttachment::Renderbuffer(renderbuffer));
    }

    fn attach_texture_2d(&self, attachment: u32, texture: TextureId) {
        self.attach(attachment, FakeAttachment::Texture(texture));
    }

    fn attach_texture_layer(&self, attachment: u32, texture: TextureId, layer: u32) {
        self.attach(attachment, FakeAttachment::TextureLayer(texture, layer));
    }

    fn attach_texture_multiview(&self, attachment: u32, texture: TextureId, views: u32) {
        self.attach(attachment, FakeAttachment::Multiview(texture, views));
    }

    fn framebuffer_complete(&self) -> bool {
        self.state.borrow().complete
    }

    fn blit_full_rect(&self, _width: u32, _height: u32) {
        let mut state = self.state.borrow_mut();
        let source = state.bound_read.unwrap_or(0);
        let target = state.bound_draw.unwrap_or(0);
        if let Some(fill) = state.fills.get(&source).copied() {
            state.fills.insert(target, fill);
        }
    }

    fn clear(&self, color: [f32; 4], _depth: f32) {
        let target = self.draw_target();
        self.state.borrow_mut().fills.insert(target, color);
    }

    fn select_texture_unit(&self, _unit: u32) {}

    fn bind_texture_2d(&self, texture: Option<TextureId>) {
        self.state.borrow_mut().texture_binds.push(texture);
    }
}

pub(crate) struct FakePipeline {
    pub cameras: Vec<(Eye, [f32; 16], [f32; 16])>,
    pub clears: u32,
    pub push_views: u32,
    pub pop_views: u32,
    pub pushes: u32,
    pub pops: u32,
    pub shader: Option<ShaderId>,
    pub shader_sets: Vec<Option<ShaderId>>,
    pub color: [f32; 4],
    pub color_sets: Vec<[f32; 4]>,
    pub gamma: bool,
    pub texture: u32,
    pub quads: Vec<u32>,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self {
            cameras: Vec::new(),
            clears: 0,
            push_views: 0,
            pop_views: 0,
            pushes: 0,
            pops: 0,
            shader: None,
            shader_sets: Vec::new(),
            color: [1.0, 1.0, 1.0, 1.0],
            color_sets: Vec::new(),
            gamma: false,
            texture: 0,
            quads: Vec::new(),
        }
    }
}

impl RenderPipeline for FakePipeline {
    fn push_view(&mut self) {
        self.push_views += 1;
    }

    fn pop_view(&mut self) {
        self.pop_views += 1;
    }

    fn push(&mut self) {
        self.pushes += 1;
    }

    fn pop(&mut self) {
        self.pops += 1;
    }

    fn set_camera(&mut self, eye: Eye, view: [f32; 16], projection: [f32; 16]) {
        self.cameras.push((eye, view, projection));
    }

    fn clear(&mut self, _color: bool, _depth: bool) {
        self.clears += 1;
    }

    fn active_shader(&self) -> Option<ShaderId> {
        self.shader
    }

    fn set_shader(&mut self, shader: Option<ShaderId>) {
        self.shader = shader;
        self.shader_sets.push(shader);
    }

    fn draw_color(&self) -> [f32; 4] {
        self.color
    }

    fn set_draw_color(&mut self, color: [f32; 4]) {
        self.color = color;
        self.color_sets.push(color);
    }

    fn is_gamma_correct(&self) -> bool {
        self.gamma
    }

    fn bound_texture(&self) -> u32 {
        self.texture
    }

    fn draw_fullscreen_quad(&mut self, texture: u32) {
        self.quads.push(texture);
    }
}
