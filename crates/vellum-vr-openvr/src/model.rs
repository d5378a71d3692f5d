//! Controller render-model loading. The runtime's loaders are asynchronous
//! and polled; the poll is bounded by an explicit deadline instead of
//! spinning forever, and raw results are cached per device index.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

use vellum_vr::runtime::{LoadPoll, RawModel, RawTextureMap, StringProperty};
use vellum_vr::{DeviceIndex, VrError, VrResult, VrRuntime};

pub(crate) const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub(crate) const LOAD_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// Interleaved position/normal/uv, eight floats per vertex.
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub texture: TextureData,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 8
    }
}

#[derive(Default)]
pub(crate) struct ModelCache {
    loaded: HashMap<DeviceIndex, (RawModel, RawTextureMap)>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads (or reuses) the raw model and diffuse texture for one device and
    /// assembles the interleaved mesh. The blocking wait happens at most once
    /// per device.
    pub fn model_for<R: VrRuntime>(
        &mut self,
        runtime: &mut R,
        device: DeviceIndex,
        timeout: Duration,
    ) -> VrResult<ModelData> {
        if !self.loaded.contains_key(&device) {
            let name = runtime
                .string_property(device, StringProperty::RenderModelName)
                .ok_or_else(|| VrError::Runtime(format!("device {device} has no render model")))?;
            debug!("loading render model '{name}' for device {device}");
            let model = poll_until(timeout, || runtime.load_render_model(&name))?;
            let texture = poll_until(timeout, || runtime.load_texture(model.diffuse_texture_id))?;
            self.loaded.insert(device, (model, texture));
        }
        let (model, texture) = &self.loaded[&device];
        Ok(assemble(model, texture))
    }
}

/// Polls the loader until it settles, sleeping between attempts, giving up at
/// the deadline.
fn poll_until<T>(timeout: Duration, mut poll: impl FnMut() -> LoadPoll<T>) -> VrResult<T> {
    let deadline = Instant::now() + timeout;
    loop {
        match poll() {
            LoadPoll::Ready(value) => return Ok(value),
            LoadPoll::Failed(reason) => return Err(VrError::Runtime(reason)),
            LoadPoll::Pending => {
                if Instant::now() >= deadline {
                    return Err(VrError::LoadTimeout(timeout));
                }
                std::thread::sleep(LOAD_POLL_INTERVAL);
            }
        }
    }
}

fn assemble(model: &RawModel, texture: &RawTextureMap) -> ModelData {
    let mut vertices = Vec::with_capacity(model.vertices.len() * 8);
    for vertex in &model.vertices {
        vertices.extend_from_slice(&vertex.position);
        vertices.extend_from_slice(&vertex.normal);
        vertices.extend_from_slice(&vertex.uv);
    }
    ModelData {
        vertices,
        indices: model.indices.clone(),
        texture: TextureData {
            width: texture.width,
            height: texture.height,
            pixels: texture.rgba.clone(),
        },
    }
}
