//! Seam to the hardware/runtime collaborator. The driver talks to the VR
//! runtime exclusively through [`VrRuntime`] so the whole session can be
//! exercised against a mock.

use std::collections::HashMap;

use crate::types::{ColorSpace, DeviceIndex, Eye, Hand};
use crate::VrResult;

/// One tracked device's transform snapshot as the runtime reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawDevicePose {
    pub valid: bool,
    pub connected: bool,
    /// Row-major 3x4 device-to-absolute-tracking transform.
    pub transform: [[f32; 4]; 3],
    pub linear_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
}

/// Raw controller input snapshot: 64-bit capability masks plus the axis
/// slots, indexed the way the runtime indexes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerState {
    pub pressed: u64,
    pub touched: u64,
    /// Axis slots as (x, y) pairs.
    pub axes: [[f32; 2]; 5],
}

/// Hardware events drained once per outer loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    DeviceActivated { device: DeviceIndex },
    DeviceDeactivated { device: DeviceIndex },
    DeviceRoleChanged { device: DeviceIndex },
    ButtonPressed { device: DeviceIndex, button: u32 },
    ButtonReleased { device: DeviceIndex, button: u32 },
    FocusCaptured,
    FocusReleased,
}

/// Versioned SDK interfaces acquired during session init. Failure to acquire
/// any of them aborts initialization for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    System,
    Compositor,
    Chaperone,
    RenderModels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringProperty {
    ManufacturerName,
    RenderModelName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatProperty {
    DisplayFrequency,
    SecondsFromVsyncToPhotons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingSpace {
    Seated,
    Standing,
}

/// Poll result of the runtime's asynchronous asset loaders.
#[derive(Debug, Clone)]
pub enum LoadPoll<T> {
    Pending,
    Ready(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct RawModel {
    pub vertices: Vec<RawModelVertex>,
    pub indices: Vec<u32>,
    pub diffuse_texture_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RawTextureMap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait VrRuntime {
    fn hmd_present(&self) -> bool;
    fn runtime_installed(&self) -> bool;
    fn init(&mut self) -> VrResult<()>;
    fn acquire_interface(&mut self, interface: Interface) -> VrResult<()>;

    fn string_property(&self, device: DeviceIndex, property: StringProperty) -> Option<String>;
    fn float_property(&self, device: DeviceIndex, property: FloatProperty) -> Option<f32>;

    fn recommended_render_target_size(&self) -> (u32, u32);
    /// Row-major projection for one eye and the given clip planes.
    fn projection_matrix(&self, eye: Eye, near: f32, far: f32) -> [[f32; 4]; 4];
    fn eye_to_head_transform(&self, eye: Eye) -> [[f32; 4]; 3];

    /// Blocks until the compositor releases the pose batch for the next
    /// frame. The batch covers every tracked device slot.
    fn wait_poses(&mut self) -> VrResult<HashMap<DeviceIndex, RawDevicePose>>;
    fn time_since_vsync(&self) -> Option<f32>;
    fn predicted_pose(&self, device: DeviceIndex, seconds_in_future: f32) -> RawDevicePose;

    fn device_for_hand(&self, hand: Hand) -> Option<DeviceIndex>;
    fn hand_for_device(&self, device: DeviceIndex) -> Hand;
    fn device_connected(&self, device: DeviceIndex) -> bool;
    fn controller_state(&self, device: DeviceIndex) -> Option<ControllerState>;
    fn trigger_haptic_pulse(&mut self, device: DeviceIndex, axis: u32, microseconds: u16);

    fn poll_event(&mut self) -> Option<RuntimeEvent>;

    fn load_render_model(&mut self, name: &str) -> LoadPoll<RawModel>;
    fn load_texture(&mut self, texture_id: i32) -> LoadPoll<RawTextureMap>;

    /// Hands one resolved eye texture to the compositor. The call is known to
    /// disturb the GL texture binding as a side effect; callers must restore
    /// it afterwards.
    fn submit(&mut self, eye: Eye, texture: u32, color_space: ColorSpace) -> VrResult<()>;

    fn tracking_space(&self) -> TrackingSpace;
    fn play_area_size(&self) -> Option<(f32, f32)>;
    fn play_area_rect(&self) -> Option<[[f32; 3]; 4]>;
}
