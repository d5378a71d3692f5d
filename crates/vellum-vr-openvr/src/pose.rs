//! Device pose resolution and the matrix conversions between the runtime's
//! row-major transforms and the engine's column-major math.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec4};

use vellum_vr::runtime::RawDevicePose;
use vellum_vr::{DeviceIndex, DevicePose, DisplayTiming, VrRuntime};

pub(crate) fn mat4_from_raw34(m: &[[f32; 4]; 3]) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(m[0][0], m[1][0], m[2][0], 0.0),
        Vec4::new(m[0][1], m[1][1], m[2][1], 0.0),
        Vec4::new(m[0][2], m[1][2], m[2][2], 0.0),
        Vec4::new(m[0][3], m[1][3], m[2][3], 1.0),
    )
}

pub(crate) fn mat4_from_raw44(m: &[[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(m[0][0], m[1][0], m[2][0], m[3][0]),
        Vec4::new(m[0][1], m[1][1], m[2][1], m[3][1]),
        Vec4::new(m[0][2], m[1][2], m[2][2], m[3][2]),
        Vec4::new(m[0][3], m[1][3], m[2][3], m[3][3]),
    )
}

/// Converts a raw snapshot into the public pose. Invalid or disconnected
/// devices yield the zeroed pose, which callers must read as "unknown".
pub(crate) fn device_pose(raw: &RawDevicePose) -> DevicePose {
    if !raw.valid || !raw.connected {
        return DevicePose::default();
    }
    let transform = mat4_from_raw34(&raw.transform);
    DevicePose {
        position: transform.w_axis.truncate().to_array(),
        orientation: Quat::from_mat4(&transform).to_array(),
        linear_velocity: raw.linear_velocity,
        angular_velocity: raw.angular_velocity,
    }
}

/// Resolves one device's pose under the two retrieval regimes. Inside the
/// render window the per-frame batch is authoritative so every query within
/// the frame observes the same snapshot; outside it, a fresh prediction for
/// the next photon time keeps perceived latency low.
pub(crate) fn resolve_pose<R: VrRuntime>(
    runtime: &R,
    timing: DisplayTiming,
    rendering: bool,
    render_poses: &HashMap<DeviceIndex, RawDevicePose>,
    device: DeviceIndex,
) -> RawDevicePose {
    if rendering {
        return render_poses.get(&device).copied().unwrap_or_default();
    }

    let frame_duration = if timing.refresh_hz > 0.0 {
        1.0 / timing.refresh_hz
    } else {
        0.0
    };
    let since_vsync = runtime.time_since_vsync().unwrap_or(0.0);
    let seconds_in_future = frame_duration - since_vsync + timing.vsync_to_photons;
    runtime.predicted_pose(device, seconds_in_future)
}
