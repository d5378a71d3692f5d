#![forbid(unsafe_code)]

pub mod event;
pub mod pipeline;
pub mod runtime;
pub mod types;

pub use event::{Event, EventSink};
pub use pipeline::{RenderPipeline, ShaderId};
pub use runtime::VrRuntime;
pub use types::{
    Axis, Button, ColorSpace, Controller, DeviceIndex, DevicePose, DisplayTiming, Eye, Hand,
    HeadsetFamily, Origin, HMD_INDEX,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VrError {
    #[error("headset unavailable: {0}")]
    Unavailable(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("asset load timed out after {0:?}")]
    LoadTimeout(std::time::Duration),
}

pub type VrResult<T> = Result<T, VrError>;
