//! Translation between the runtime's raw button/axis identifiers and the
//! abstract vocabulary, per headset family. Pure functions; the mapping is
//! total and unrecognized identifiers land on `Button::Unknown`.

use vellum_vr::runtime::ControllerState;
use vellum_vr::{Axis, Button, Hand, HeadsetFamily};

// Raw button identifiers as the runtime reports them.
pub const RAW_SYSTEM: u32 = 0;
pub const RAW_APPLICATION_MENU: u32 = 1;
pub const RAW_GRIP: u32 = 2;
pub const RAW_A: u32 = 7;
pub const RAW_AXIS0: u32 = 32;
pub const RAW_AXIS1: u32 = 33;
pub const RAW_AXIS2: u32 = 34;

pub fn button_from_raw(family: HeadsetFamily, raw: u32, hand: Hand) -> Button {
    match family {
        HeadsetFamily::Rift => match raw {
            RAW_AXIS1 => Button::Trigger,
            RAW_AXIS2 => Button::Grip,
            RAW_AXIS0 => Button::Touchpad,
            // The face buttons share raw identifiers across hands.
            RAW_A => match hand {
                Hand::Left => Button::X,
                Hand::Right => Button::A,
                Hand::Unknown => Button::Unknown,
            },
            RAW_APPLICATION_MENU => match hand {
                Hand::Left => Button::Y,
                Hand::Right => Button::B,
                Hand::Unknown => Button::Unknown,
            },
            _ => Button::Unknown,
        },
        HeadsetFamily::Vive | HeadsetFamily::Unknown => match raw {
            RAW_SYSTEM => Button::System,
            RAW_APPLICATION_MENU => Button::Menu,
            RAW_AXIS1 => Button::Trigger,
            RAW_GRIP => Button::Grip,
            RAW_AXIS0 => Button::Touchpad,
            _ => Button::Unknown,
        },
    }
}

/// Re-derives the family-specific bit for `button` and tests it against the
/// 64-bit capability mask. Buttons the family cannot represent are false.
pub fn button_is_set(mask: u64, family: HeadsetFamily, button: Button, hand: Hand) -> bool {
    let bit = match family {
        HeadsetFamily::Rift => match button {
            Button::Trigger => Some(RAW_AXIS1),
            Button::Grip => Some(RAW_AXIS2),
            Button::Touchpad => Some(RAW_AXIS0),
            Button::A if hand == Hand::Right => Some(RAW_A),
            Button::B if hand == Hand::Right => Some(RAW_APPLICATION_MENU),
            Button::X if hand == Hand::Left => Some(RAW_A),
            Button::Y if hand == Hand::Left => Some(RAW_APPLICATION_MENU),
            _ => None,
        },
        HeadsetFamily::Vive | HeadsetFamily::Unknown => match button {
            Button::System => Some(RAW_SYSTEM),
            Button::Menu => Some(RAW_APPLICATION_MENU),
            Button::Trigger => Some(RAW_AXIS1),
            Button::Grip => Some(RAW_GRIP),
            Button::Touchpad => Some(RAW_AXIS0),
            _ => None,
        },
    };
    bit.map(|bit| (mask >> bit) & 1 == 1).unwrap_or(false)
}

pub fn axis_value(family: HeadsetFamily, state: &ControllerState, axis: Axis) -> f32 {
    match family {
        HeadsetFamily::Rift => match axis {
            Axis::Trigger => state.axes[1][0],
            Axis::Grip => state.axes[2][0],
            Axis::TouchpadX => state.axes[0][0],
            Axis::TouchpadY => state.axes[0][1],
        },
        HeadsetFamily::Vive | HeadsetFamily::Unknown => match axis {
            Axis::Trigger => state.axes[1][0],
            Axis::TouchpadX => state.axes[0][0],
            Axis::TouchpadY => state.axes[0][1],
            Axis::Grip => 0.0,
        },
    }
}
