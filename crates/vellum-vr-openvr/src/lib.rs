//! OpenVR-shaped headset driver: stereo render target, pose resolution,
//! controller lifecycle, input translation, and per-frame compositor
//! submission, all behind the collaborator seams defined in `vellum-vr`.

pub mod canvas;
pub mod gl;
pub mod input;
pub mod model;
pub mod session;

mod controller;
mod frame;
mod pose;

#[cfg(test)]
pub(crate) mod testing;

pub use canvas::{Canvas, CanvasDesc, CanvasFormat};
pub use gl::GlowFacade;
pub use model::{ModelData, TextureData};
pub use session::OpenVrHeadset;
