//! Per-frame stereo orchestration: fetch the pose batch, derive per-eye
//! cameras, render each eye through the caller's callback, resolve, submit to
//! the compositor, and optionally mirror to the default surface.

use glam::Mat4;
use log::warn;

use vellum_vr::{ColorSpace, Eye, RenderPipeline, VrRuntime, HMD_INDEX};

use crate::canvas::{Canvas, CanvasDesc, CanvasFormat};
use crate::gl::{FramebufferTarget, GlFacade};
use crate::pose;
use crate::session::OpenVrHeadset;

pub(crate) const CANVAS_MSAA: u32 = 4;

impl<R: VrRuntime, G: GlFacade> OpenVrHeadset<R, G> {
    /// Renders and submits one stereo frame. The callback is invoked exactly
    /// once per eye, left then right, against the bound render target; it
    /// must not rebind the target or submit frames itself. On an unavailable
    /// session this is a silent no-op.
    pub fn render_to<F>(&mut self, pipeline: &mut dyn RenderPipeline, mut callback: F)
    where
        F: FnMut(Eye, &mut dyn RenderPipeline),
    {
        let Some(state) = &mut self.state else { return };

        if state.canvas.is_none() {
            let (width, height) = self.runtime.recommended_render_target_size();
            state.render_size = (width, height);
            state.canvas = Some(Canvas::new(
                &self.gl,
                CanvasDesc {
                    width,
                    height,
                    format: CanvasFormat::Rgb,
                    msaa: CANVAS_MSAA,
                    depth: true,
                    stencil: false,
                    multiview: false,
                    srgb: pipeline.is_gamma_correct(),
                },
            ));
        }

        pipeline.push_view();
        state.rendering = true;
        match self.runtime.wait_poses() {
            Ok(poses) => state.render_poses = poses,
            Err(err) => {
                warn!("pose fetch failed, skipping frame: {err}");
                state.rendering = false;
                pipeline.pop_view();
                return;
            }
        }

        pipeline.push();

        let head = state
            .render_poses
            .get(&HMD_INDEX)
            .map(|pose| pose::mat4_from_raw34(&pose.transform))
            .unwrap_or(Mat4::IDENTITY)
            .inverse();

        for eye in Eye::BOTH {
            let eye_to_head = pose::mat4_from_raw34(&self.runtime.eye_to_head_transform(eye));
            let view = eye_to_head.inverse() * head;
            let projection = pose::mat4_from_raw44(&self.runtime.projection_matrix(
                eye,
                state.clip_near,
                state.clip_far,
            ));
            pipeline.set_camera(eye, view.to_cols_array(), projection.to_cols_array());
        }

        let Some(canvas) = state.canvas.as_ref() else { return };
        let color_texture = canvas.color_texture();

        for eye in Eye::BOTH {
            canvas.bind(&self.gl);
            pipeline.clear(true, true);
            callback(eye, pipeline);
            canvas.resolve(&self.gl, eye);

            // The compositor call disturbs the GL texture binding.
            self.gl.select_texture_unit(0);
            let previous = pipeline.bound_texture();
            let color_space = if pipeline.is_gamma_correct() {
                ColorSpace::Linear
            } else {
                ColorSpace::Gamma
            };
            if let Err(err) = self.runtime.submit(eye, color_texture, color_space) {
                warn!("compositor rejected {eye:?} frame: {err}");
            }
            self.gl.bind_texture_2d(Some(previous));
        }

        state.rendering = false;
        pipeline.pop();
        pipeline.pop_view();
        self.gl.bind_framebuffer(FramebufferTarget::Both, None);

        if state.mirrored {
            mirror(pipeline, color_texture);
        }
    }
}

/// Full-screen pass-through of the resolved eye texture onto the default
/// surface, preserving the caller's shader and draw color.
fn mirror(pipeline: &mut dyn RenderPipeline, texture: u32) {
    let previous_color = pipeline.draw_color();
    let previous_shader = pipeline.active_shader();
    pipeline.set_draw_color([1.0, 1.0, 1.0, 1.0]);
    pipeline.set_shader(None);
    pipeline.draw_fullscreen_quad(texture);
    pipeline.set_shader(previous_shader);
    pipeline.set_draw_color(previous_color);
}
