//! Headset session: explicit init/teardown lifecycle around the runtime and
//! GL collaborators. Initialization fails softly; an absent headset is an
//! expected runtime condition, so an unavailable session answers every query
//! with a neutral value instead of an error.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Quat;
use log::{info, warn};

use vellum_vr::runtime::{
    FloatProperty, Interface, RawDevicePose, RuntimeEvent, StringProperty, TrackingSpace,
};
use vellum_vr::{
    Axis, Button, Controller, DeviceIndex, DevicePose, DisplayTiming, Event, EventSink, Eye, Hand,
    HeadsetFamily, Origin, VrError, VrResult, VrRuntime, HMD_INDEX,
};

use crate::canvas::Canvas;
use crate::controller::ControllerRegistry;
use crate::gl::GlFacade;
use crate::input;
use crate::model::{ModelCache, ModelData, LOAD_TIMEOUT};
use crate::pose;

pub(crate) const DEFAULT_CLIP_NEAR: f32 = 0.1;
pub(crate) const DEFAULT_CLIP_FAR: f32 = 30.0;

pub(crate) struct SessionState {
    pub family: HeadsetFamily,
    pub timing: DisplayTiming,
    pub clip_near: f32,
    pub clip_far: f32,
    pub render_size: (u32, u32),
    pub mirrored: bool,
    pub rendering: bool,
    pub render_poses: HashMap<DeviceIndex, RawDevicePose>,
    pub registry: ControllerRegistry,
    pub canvas: Option<Canvas>,
    pub models: ModelCache,
}

pub struct OpenVrHeadset<R: VrRuntime, G: GlFacade> {
    pub(crate) runtime: R,
    pub(crate) gl: G,
    pub(crate) state: Option<SessionState>,
}

impl<R: VrRuntime, G: GlFacade> OpenVrHeadset<R, G> {
    /// Brings up the session. A missing headset, missing runtime, failed init
    /// call, or missing SDK interface leaves it permanently unavailable.
    pub fn new(mut runtime: R, gl: G, sink: &mut dyn EventSink) -> Self {
        let state = match Self::start(&mut runtime, sink) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!("headset unavailable: {err}");
                None
            }
        };
        Self { runtime, gl, state }
    }

    fn start(runtime: &mut R, sink: &mut dyn EventSink) -> VrResult<SessionState> {
        if !runtime.hmd_present() {
            return Err(VrError::Unavailable("no headset detected".into()));
        }
        if !runtime.runtime_installed() {
            return Err(VrError::Unavailable("runtime not installed".into()));
        }
        runtime.init()?;
        for interface in [
            Interface::System,
            Interface::Compositor,
            Interface::Chaperone,
            Interface::RenderModels,
        ] {
            runtime.acquire_interface(interface)?;
        }

        let manufacturer = runtime
            .string_property(HMD_INDEX, StringProperty::ManufacturerName)
            .unwrap_or_default();
        let family = match manufacturer.as_str() {
            "HTC" => HeadsetFamily::Vive,
            "Oculus" => HeadsetFamily::Rift,
            _ => HeadsetFamily::Unknown,
        };
        let timing = DisplayTiming {
            refresh_hz: runtime
                .float_property(HMD_INDEX, FloatProperty::DisplayFrequency)
                .unwrap_or(0.0),
            vsync_to_photons: runtime
                .float_property(HMD_INDEX, FloatProperty::SecondsFromVsyncToPhotons)
                .unwrap_or(0.0),
        };
        let render_size = runtime.recommended_render_target_size();
        info!(
            "headset session ready: family {family:?}, {} Hz, {}x{} per eye",
            timing.refresh_hz, render_size.0, render_size.1
        );

        let mut registry = ControllerRegistry::new();
        registry.refresh(runtime, sink);

        Ok(SessionState {
            family,
            timing,
            clip_near: DEFAULT_CLIP_NEAR,
            clip_far: DEFAULT_CLIP_FAR,
            render_size,
            mirrored: true,
            rendering: false,
            render_poses: HashMap::new(),
            registry,
            canvas: None,
            models: ModelCache::new(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_present(&self) -> bool {
        self.state.is_some() && self.runtime.device_connected(HMD_INDEX)
    }

    pub fn family(&self) -> HeadsetFamily {
        self.state
            .as_ref()
            .map(|s| s.family)
            .unwrap_or(HeadsetFamily::Unknown)
    }

    pub fn tracking_origin(&self) -> Origin {
        if self.state.is_none() {
            return Origin::Head;
        }
        match self.runtime.tracking_space() {
            TrackingSpace::Seated => Origin::Head,
            TrackingSpace::Standing => Origin::Floor,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.state.as_ref().map(|s| s.mirrored).unwrap_or(false)
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        if let Some(state) = &mut self.state {
            state.mirrored = mirrored;
        }
    }

    pub fn display_dimensions(&self) -> (u32, u32) {
        self.state.as_ref().map(|s| s.render_size).unwrap_or((0, 0))
    }

    pub fn clip_distance(&self) -> (f32, f32) {
        self.state
            .as_ref()
            .map(|s| (s.clip_near, s.clip_far))
            .unwrap_or((0.0, 0.0))
    }

    pub fn set_clip_distance(&mut self, near: f32, far: f32) {
        if let Some(state) = &mut self.state {
            state.clip_near = near;
            state.clip_far = far;
        }
    }

    pub fn bounds_width(&self) -> f32 {
        match &self.state {
            Some(_) => self.runtime.play_area_size().map(|(w, _)| w).unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn bounds_depth(&self) -> f32 {
        match &self.state {
            Some(_) => self.runtime.play_area_size().map(|(_, d)| d).unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Play-area corners as four xyz triples, zeroed when unavailable.
    pub fn bounds_geometry(&self) -> [f32; 12] {
        let mut geometry = [0.0; 12];
        if self.state.is_none() {
            return geometry;
        }
        if let Some(corners) = self.runtime.play_area_rect() {
            for (i, corner) in corners.iter().enumerate() {
                geometry[3 * i..3 * i + 3].copy_from_slice(corner);
            }
        }
        geometry
    }

    pub(crate) fn raw_device_pose(&self, device: DeviceIndex) -> RawDevicePose {
        let Some(state) = &self.state else {
            return RawDevicePose::default();
        };
        pose::resolve_pose(
            &self.runtime,
            state.timing,
            state.rendering,
            &state.render_poses,
            device,
        )
    }

    pub fn device_pose(&self, device: DeviceIndex) -> DevicePose {
        pose::device_pose(&self.raw_device_pose(device))
    }

    pub fn position(&self) -> [f32; 3] {
        self.device_pose(HMD_INDEX).position
    }

    /// Headset orientation as angle-axis: `[angle, x, y, z]`, all zero when
    /// the pose is unknown.
    pub fn orientation(&self) -> [f32; 4] {
        let raw = self.raw_device_pose(HMD_INDEX);
        if !raw.valid || !raw.connected {
            return [0.0; 4];
        }
        let rotation = Quat::from_mat4(&pose::mat4_from_raw34(&raw.transform));
        let (axis, angle) = rotation.to_axis_angle();
        [angle, axis.x, axis.y, axis.z]
    }

    pub fn velocity(&self) -> [f32; 3] {
        self.device_pose(HMD_INDEX).linear_velocity
    }

    pub fn angular_velocity(&self) -> [f32; 3] {
        self.device_pose(HMD_INDEX).angular_velocity
    }

    pub fn eye_position(&self, eye: Eye) -> [f32; 3] {
        let raw = self.raw_device_pose(HMD_INDEX);
        if !raw.valid || !raw.connected {
            return [0.0; 3];
        }
        let head = pose::mat4_from_raw34(&raw.transform);
        let eye_to_head = pose::mat4_from_raw34(&self.runtime.eye_to_head_transform(eye));
        (head * eye_to_head).w_axis.truncate().to_array()
    }

    pub fn controllers(&self) -> Vec<Arc<Controller>> {
        self.state
            .as_ref()
            .map(|s| s.registry.controllers().to_vec())
            .unwrap_or_default()
    }

    pub fn controller_count(&self) -> usize {
        self.state
            .as_ref()
            .map(|s| s.registry.controllers().len())
            .unwrap_or(0)
    }

    pub fn is_controller_present(&self, controller: &Controller) -> bool {
        self.state.is_some() && self.runtime.device_connected(controller.index)
    }

    pub fn controller_hand(&self, controller: &Controller) -> Hand {
        if self.state.is_none() {
            return Hand::Unknown;
        }
        self.runtime.hand_for_device(controller.index)
    }

    pub fn controller_position(&self, controller: &Controller) -> [f32; 3] {
        self.device_pose(controller.index).position
    }

    pub fn controller_orientation(&self, controller: &Controller) -> [f32; 4] {
        let raw = self.raw_device_pose(controller.index);
        if !raw.valid || !raw.connected {
            return [0.0; 4];
        }
        let rotation = Quat::from_mat4(&pose::mat4_from_raw34(&raw.transform));
        let (axis, angle) = rotation.to_axis_angle();
        [angle, axis.x, axis.y, axis.z]
    }

    pub fn controller_axis(&self, controller: &Controller, axis: Axis) -> f32 {
        let Some(state) = &self.state else { return 0.0 };
        let Some(input_state) = self.runtime.controller_state(controller.index) else {
            return 0.0;
        };
        input::axis_value(state.family, &input_state, axis)
    }

    pub fn controller_is_down(&self, controller: &Controller, button: Button) -> bool {
        self.controller_mask(controller, button, |state| state.pressed)
    }

    pub fn controller_is_touched(&self, controller: &Controller, button: Button) -> bool {
        self.controller_mask(controller, button, |state| state.touched)
    }

    fn controller_mask(
        &self,
        controller: &Controller,
        button: Button,
        mask: impl Fn(&vellum_vr::runtime::ControllerState) -> u64,
    ) -> bool {
        let Some(state) = &self.state else { return false };
        let Some(input_state) = self.runtime.controller_state(controller.index) else {
            return false;
        };
        let hand = self.runtime.hand_for_device(controller.index);
        input::button_is_set(mask(&input_state), state.family, button, hand)
    }

    /// Triggers a haptic pulse for `duration` seconds. Non-positive durations
    /// are ignored.
    pub fn controller_vibrate(&mut self, controller: &Controller, duration: f32, _power: f32) {
        if self.state.is_none() || duration <= 0.0 {
            return;
        }
        let microseconds = (duration * 1e6) as u16;
        self.runtime.trigger_haptic_pulse(controller.index, 0, microseconds);
    }

    pub fn controller_model(&mut self, controller: &Controller) -> VrResult<ModelData> {
        match &mut self.state {
            Some(state) => state.models.model_for(&mut self.runtime, controller.index, LOAD_TIMEOUT),
            None => Err(VrError::Unavailable("no headset session".into())),
        }
    }

    /// Drains hardware events once per outer loop tick. Connectivity changes
    /// re-run the role mapping diff; button events go through the family
    /// translation table before reaching the queue.
    pub fn poll(&mut self, sink: &mut dyn EventSink) {
        let Some(state) = &mut self.state else { return };
        while let Some(event) = self.runtime.poll_event() {
            match event {
                RuntimeEvent::DeviceActivated { .. }
                | RuntimeEvent::DeviceDeactivated { .. }
                | RuntimeEvent::DeviceRoleChanged { .. } => {
                    state.registry.refresh(&self.runtime, sink);
                }
                RuntimeEvent::ButtonPressed { device, button }
                | RuntimeEvent::ButtonReleased { device, button } => {
                    let pressed = matches!(event, RuntimeEvent::ButtonPressed { .. });
                    if let Some(controller) = state.registry.find(device) {
                        let hand = self.runtime.hand_for_device(device);
                        let mapped = input::button_from_raw(state.family, button, hand);
                        let controller = Arc::clone(controller);
                        sink.push(if pressed {
                            Event::ControllerPressed { controller, button: mapped }
                        } else {
                            Event::ControllerReleased { controller, button: mapped }
                        });
                    }
                }
                RuntimeEvent::FocusCaptured => sink.push(Event::Focus { focused: false }),
                RuntimeEvent::FocusReleased => sink.push(Event::Focus { focused: true }),
            }
        }
    }
}

impl<R: VrRuntime, G: GlFacade> Drop for OpenVrHeadset<R, G> {
    fn drop(&mut self) {
        if let Some(mut state) = self.state.take() {
            if let Some(canvas) = state.canvas.take() {
                let color = canvas.color_texture();
                canvas.destroy(&self.gl);
                // The base color texture belongs to the texture subsystem.
                self.gl.delete_texture(color);
            }
        }
    }
}
