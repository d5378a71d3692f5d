//! Stereo render target: a color attachment (plain, multisampled, or a
//! two-layer multiview array), an optional combined depth/stencil buffer, and
//! the resolve path down to a single sampleable texture.

use vellum_vr::Eye;

use crate::gl::{FramebufferId, FramebufferTarget, GlFacade, RenderbufferId, TextureId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasFormat {
    Rgb,
    Rgba,
    Rgba16F,
    Rgba32F,
    Rg11B10F,
    Dxt1,
    Dxt3,
    Dxt5,
}

impl CanvasFormat {
    /// Compressed formats cannot back a render target.
    pub fn is_renderable(self) -> bool {
        !matches!(self, CanvasFormat::Dxt1 | CanvasFormat::Dxt3 | CanvasFormat::Dxt5)
    }

    fn gl_internal_format(self, srgb: bool) -> u32 {
        match self {
            CanvasFormat::Rgb => {
                if srgb {
                    glow::SRGB8
                } else {
                    glow::RGB8
                }
            }
            CanvasFormat::Rgba => {
                if srgb {
                    glow::SRGB8_ALPHA8
                } else {
                    glow::RGBA8
                }
            }
            CanvasFormat::Rgba16F => glow::RGBA16F,
            CanvasFormat::Rgba32F => glow::RGBA32F,
            CanvasFormat::Rg11B10F => glow::R11F_G11F_B10F,
            CanvasFormat::Dxt1 | CanvasFormat::Dxt3 | CanvasFormat::Dxt5 => {
                panic!("compressed canvas format")
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CanvasDesc {
    pub width: u32,
    pub height: u32,
    pub format: CanvasFormat,
    pub msaa: u32,
    pub depth: bool,
    pub stencil: bool,
    pub multiview: bool,
    pub srgb: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorStore {
    /// Color texture attached directly; nothing to resolve.
    Texture,
    Multisample(RenderbufferId),
    Array(TextureId),
}

pub struct Canvas {
    framebuffer: FramebufferId,
    eye_framebuffers: [Option<FramebufferId>; 2],
    resolve_framebuffer: Option<FramebufferId>,
    depth_stencil: Option<RenderbufferId>,
    store: ColorStore,
    color: TextureId,
    width: u32,
    height: u32,
    msaa: u32,
    multiview: bool,
}

impl Canvas {
    /// Builds the framebuffer layout for `desc`. An incomplete framebuffer
    /// after attachment indicates an unrecoverable driver/configuration
    /// mismatch and aborts the process.
    pub fn new<G: GlFacade>(gl: &G, desc: CanvasDesc) -> Canvas {
        assert!(
            desc.format.is_renderable(),
            "canvas format {:?} is not renderable",
            desc.format
        );

        let internal_format = desc.format.gl_internal_format(desc.srgb);
        let color = gl.create_color_texture(desc.width, desc.height, internal_format);

        let framebuffer = gl.create_framebuffer();
        gl.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));

        let store = if desc.multiview {
            let array = gl.create_array_texture(desc.width, desc.height, 2, internal_format);
            gl.attach_texture_multiview(glow::COLOR_ATTACHMENT0, array, 2);
            ColorStore::Array(array)
        } else if desc.msaa > 0 {
            let renderbuffer = gl.create_renderbuffer();
            gl.bind_renderbuffer(renderbuffer);
            gl.renderbuffer_storage(desc.msaa, internal_format, desc.width, desc.height);
            gl.attach_renderbuffer(glow::COLOR_ATTACHMENT0, renderbuffer);
            ColorStore::Multisample(renderbuffer)
        } else {
            gl.attach_texture_2d(glow::COLOR_ATTACHMENT0, color);
            ColorStore::Texture
        };

        let depth_stencil = if desc.depth || desc.stencil {
            let format = if desc.stencil {
                glow::DEPTH24_STENCIL8
            } else {
                glow::DEPTH_COMPONENT24
            };
            let renderbuffer = gl.create_renderbuffer();
            gl.bind_renderbuffer(renderbuffer);
            gl.renderbuffer_storage(desc.msaa, format, desc.width, desc.height);
            if desc.depth {
                gl.attach_renderbuffer(glow::DEPTH_ATTACHMENT, renderbuffer);
            }
            if desc.stencil {
                gl.attach_renderbuffer(glow::STENCIL_ATTACHMENT, renderbuffer);
            }
            Some(renderbuffer)
        } else {
            None
        };

        let mut eye_framebuffers = [None, None];
        let resolve_framebuffer = if desc.msaa > 0 || desc.multiview {
            if let ColorStore::Array(array) = store {
                for layer in 0..2u32 {
                    let eye_framebuffer = gl.create_framebuffer();
                    gl.bind_framebuffer(FramebufferTarget::Both, Some(eye_framebuffer));
                    gl.attach_texture_layer(glow::COLOR_ATTACHMENT0, array, layer);
                    eye_framebuffers[layer as usize] = Some(eye_framebuffer);
                }
            }
            let resolve = gl.create_framebuffer();
            gl.bind_framebuffer(FramebufferTarget::Both, Some(resolve));
            gl.attach_texture_2d(glow::COLOR_ATTACHMENT0, color);
            gl.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));
            Some(resolve)
        } else {
            None
        };

        if !gl.framebuffer_complete() {
            panic!("stereo render target is incomplete; the driver rejected the requested layout");
        }

        gl.clear([0.0, 0.0, 0.0, 0.0], 1.0);
        gl.bind_framebuffer(FramebufferTarget::Both, None);

        Canvas {
            framebuffer,
            eye_framebuffers,
            resolve_framebuffer,
            depth_stencil,
            store,
            color,
            width: desc.width,
            height: desc.height,
            msaa: desc.msaa,
            multiview: desc.multiview,
        }
    }

    pub fn bind<G: GlFacade>(&self, gl: &G) {
        gl.bind_framebuffer(FramebufferTarget::Both, Some(self.framebuffer));
    }

    /// Blits the multisample (or per-eye array) storage into the resolve
    /// target. Must not be called on a canvas created without either.
    pub fn resolve<G: GlFacade>(&self, gl: &G, eye: Eye) {
        debug_assert!(
            self.msaa > 0 || self.multiview,
            "resolve on a single-sample canvas"
        );
        let source = if self.multiview {
            self.eye_framebuffers[eye.index()]
        } else {
            Some(self.framebuffer)
        };
        gl.bind_framebuffer(FramebufferTarget::Read, source);
        gl.bind_framebuffer(FramebufferTarget::Draw, self.resolve_framebuffer);
        gl.blit_full_rect(self.width, self.height);
    }

    pub fn color_texture(&self) -> TextureId {
        self.color
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn msaa(&self) -> u32 {
        self.msaa
    }

    pub fn is_multiview(&self) -> bool {
        self.multiview
    }

    /// Releases every owned GPU object. The base color texture is not
    /// released here; its teardown belongs to the texture subsystem.
    pub fn destroy<G: GlFacade>(&self, gl: &G) {
        gl.delete_framebuffer(self.framebuffer);
        if let Some(resolve) = self.resolve_framebuffer {
            gl.delete_framebuffer(resolve);
        }
        for eye_framebuffer in self.eye_framebuffers.into_iter().flatten() {
            gl.delete_framebuffer(eye_framebuffer);
        }
        if let Some(depth_stencil) = self.depth_stencil {
            gl.delete_renderbuffer(depth_stencil);
        }
        match self.store {
            ColorStore::Texture => {}
            ColorStore::Multisample(renderbuffer) => gl.delete_renderbuffer(renderbuffer),
            ColorStore::Array(array) => gl.delete_texture(array),
        }
    }
}
