use crate::types::Eye;

pub type ShaderId = u64;

/// Seam to the rendering pipeline collaborator: transform/view stacks,
/// per-eye camera registration, and the handful of state accessors the
/// stereo orchestrator needs to save and restore around it.
pub trait RenderPipeline {
    fn push_view(&mut self);
    fn pop_view(&mut self);
    fn push(&mut self);
    fn pop(&mut self);

    /// Registers the view and projection for one eye's camera slot. Both
    /// matrices are column-major.
    fn set_camera(&mut self, eye: Eye, view: [f32; 16], projection: [f32; 16]);
    fn clear(&mut self, color: bool, depth: bool);

    fn active_shader(&self) -> Option<ShaderId>;
    fn set_shader(&mut self, shader: Option<ShaderId>);
    fn draw_color(&self) -> [f32; 4];
    fn set_draw_color(&mut self, color: [f32; 4]);
    fn is_gamma_correct(&self) -> bool;

    /// Texture bound to the first texture unit.
    fn bound_texture(&self) -> u32;
    fn draw_fullscreen_quad(&mut self, texture: u32);
}
