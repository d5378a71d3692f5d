//! Narrow facade over the slice of GL the stereo render target needs. The
//! production implementation wraps a live `glow::Context`; tests substitute a
//! recording fake so the canvas logic runs without a GPU.

use std::num::NonZeroU32;

use glow::HasContext;

pub type TextureId = u32;
pub type FramebufferId = u32;
pub type RenderbufferId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferTarget {
    Both,
    Read,
    Draw,
}

pub trait GlFacade {
    fn create_framebuffer(&self) -> FramebufferId;
    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>);
    fn delete_framebuffer(&self, framebuffer: FramebufferId);

    fn create_renderbuffer(&self) -> RenderbufferId;
    fn bind_renderbuffer(&self, renderbuffer: RenderbufferId);
    /// `samples == 0` allocates single-sample storage.
    fn renderbuffer_storage(&self, samples: u32, internal_format: u32, width: u32, height: u32);
    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId);

    fn create_color_texture(&self, width: u32, height: u32, internal_format: u32) -> TextureId;
    fn create_array_texture(
        &self,
        width: u32,
        height: u32,
        layers: u32,
        internal_format: u32,
    ) -> TextureId;
    fn delete_texture(&self, texture: TextureId);

    fn attach_renderbuffer(&self, attachment: u32, renderbuffer: RenderbufferId);
    fn attach_texture_2d(&self, attachment: u32, texture: TextureId);
    fn attach_texture_layer(&self, attachment: u32, texture: TextureId, layer: u32);
    fn attach_texture_multiview(&self, attachment: u32, texture: TextureId, views: u32);

    /// Whether the currently bound framebuffer reached the complete state.
    fn framebuffer_complete(&self) -> bool;
    /// Linear-filtered blit covering the full rect, read binding to draw
    /// binding.
    fn blit_full_rect(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4], depth: f32);

    fn select_texture_unit(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Option<TextureId>);
}

pub struct GlowFacade {
    gl: glow::Context,
}

impl GlowFacade {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

fn name(id: u32) -> NonZeroU32 {
    NonZeroU32::new(id).expect("null GL object name")
}

fn fb(id: FramebufferId) -> glow::NativeFramebuffer {
    glow::NativeFramebuffer(name(id))
}

fn rb(id: RenderbufferId) -> glow::NativeRenderbuffer {
    glow::NativeRenderbuffer(name(id))
}

fn tex(id: TextureId) -> glow::NativeTexture {
    glow::NativeTexture(name(id))
}

impl GlFacade for GlowFacade {
    fn create_framebuffer(&self) -> FramebufferId {
        unsafe {
            self.gl
                .create_framebuffer()
                .expect("framebuffer allocation failed")
                .0
                .get()
        }
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferId>) {
        let target = match target {
            FramebufferTarget::Both => glow::FRAMEBUFFER,
            FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
            FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
        };
        unsafe { self.gl.bind_framebuffer(target, framebuffer.map(fb)) }
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        unsafe { self.gl.delete_framebuffer(fb(framebuffer)) }
    }

    fn create_renderbuffer(&self) -> RenderbufferId {
        unsafe {
            self.gl
                .create_renderbuffer()
                .expect("renderbuffer allocation failed")
                .0
                .get()
        }
    }

    fn bind_renderbuffer(&self, renderbuffer: RenderbufferId) {
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb(renderbuffer))) }
    }

    fn renderbuffer_storage(&self, samples: u32, internal_format: u32, width: u32, height: u32) {
        unsafe {
            if samples > 0 {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER,
                    samples as i32,
                    internal_format,
                    width as i32,
                    height as i32,
                );
            } else {
                self.gl.renderbuffer_storage(
                    glow::RENDERBUFFER,
                    internal_format,
                    width as i32,
                    height as i32,
                );
            }
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        unsafe { self.gl.delete_renderbuffer(rb(renderbuffer)) }
    }

    fn create_color_texture(&self, width: u32, height: u32, internal_format: u32) -> TextureId {
        unsafe {
            let texture = self.gl.create_texture().expect("texture allocation failed");
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .tex_storage_2d(glow::TEXTURE_2D, 1, internal_format, width as i32, height as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            texture.0.get()
        }
    }

    fn create_array_texture(
        &self,
        width: u32,
        height: u32,
        layers: u32,
        internal_format: u32,
    ) -> TextureId {
        unsafe {
            let texture = self.gl.create_texture().expect("texture allocation failed");
            self.gl.bind_texture(glow::TEXTURE_2D_ARRAY, Some(texture));
            self.gl.tex_storage_3d(
                glow::TEXTURE_2D_ARRAY,
                1,
                internal_format,
                width as i32,
                height as i32,
                layers as i32,
            );
            texture.0.get()
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(tex(texture)) }
    }

    fn attach_renderbuffer(&self, attachment: u32, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment,
                glow::RENDERBUFFER,
                Some(rb(renderbuffer)),
            )
        }
    }

    fn attach_texture_2d(&self, attachment: u32, texture: TextureId) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                Some(tex(texture)),
                0,
            )
        }
    }

    fn attach_texture_layer(&self, attachment: u32, texture: TextureId, layer: u32) {
        unsafe {
            self.gl.framebuffer_texture_layer(
                glow::FRAMEBUFFER,
                attachment,
                Some(tex(texture)),
                0,
                layer as i32,
            )
        }
    }

    fn attach_texture_multiview(&self, attachment: u32, texture: TextureId, views: u32) {
        unsafe {
            self.gl.framebuffer_texture_multiview_ovr(
                glow::FRAMEBUFFER,
                attachment,
                Some(tex(texture)),
                0,
                0,
                views as i32,
            )
        }
    }

    fn framebuffer_complete(&self) -> bool {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE }
    }

    fn blit_full_rect(&self, width: u32, height: u32) {
        unsafe {
            self.gl.blit_framebuffer(
                0,
                0,
                width as i32,
                height as i32,
                0,
                0,
                width as i32,
                height as i32,
                glow::COLOR_BUFFER_BIT,
                glow::LINEAR,
            )
        }
    }

    fn clear(&self, color: [f32; 4], depth: f32) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear_depth_f32(depth);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn select_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&self, texture: Option<TextureId>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture.map(tex)) }
    }
}
