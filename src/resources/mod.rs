//! Reading selected files and turning them into asset trees.
//!
//! [`FormatParser`] is the [`AssetParser`] the viewer ships with. It reads
//! the bytes behind a [`TransientHandle`], picks glTF or OBJ by extension,
//! media type or content, and optionally uploads the result to the GPU.

use anyhow::{Context, bail};
use futures::future::LocalBoxFuture;

use crate::{
    config::extension_of,
    data_structures::scene_graph::SceneNode,
    loader::{AssetParser, ProgressSink, TransientHandle},
};

pub mod gltf;
pub mod obj;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Gltf,
    Obj,
}

impl AssetFormat {
    /// Extension first, then declared media type, then the leading bytes.
    pub fn detect(name: &str, media_type: Option<&str>, bytes: &[u8]) -> Option<Self> {
        match extension_of(name).as_deref() {
            Some("glb" | "gltf") => return Some(Self::Gltf),
            Some("obj") => return Some(Self::Obj),
            _ => {}
        }
        match media_type {
            Some("model/gltf-binary" | "model/gltf+json") => return Some(Self::Gltf),
            Some("model/obj") => return Some(Self::Obj),
            _ => {}
        }
        let head = bytes.trim_ascii_start();
        if bytes.starts_with(b"glTF") || head.starts_with(b"{") {
            Some(Self::Gltf)
        } else if head.starts_with(b"v ") || head.starts_with(b"#") || head.starts_with(b"o ") {
            Some(Self::Obj)
        } else {
            None
        }
    }
}

/// Device and queue used to upload parsed assets.
#[derive(Clone, Debug)]
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

#[derive(Default)]
pub struct FormatParser {
    gpu: Option<Gpu>,
}

impl FormatParser {
    /// Parses into CPU-side geometry only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gpu(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            gpu: Some(Gpu { device, queue }),
        }
    }

    pub async fn parse_bytes(
        &self,
        name: &str,
        media_type: Option<&str>,
        bytes: &[u8],
    ) -> anyhow::Result<Box<dyn SceneNode>> {
        let mut root = match AssetFormat::detect(name, media_type, bytes) {
            Some(AssetFormat::Gltf) => gltf::parse_gltf(bytes, name)?,
            Some(AssetFormat::Obj) => obj::parse_obj(bytes, name).await?,
            None => bail!("{name} is neither glTF nor OBJ"),
        };
        if let Some(gpu) = &self.gpu {
            root.write_to_buffers(&gpu.queue, &gpu.device)
                .with_context(|| format!("uploading {name} to the GPU"))?;
        }
        Ok(root)
    }
}

impl AssetParser for FormatParser {
    fn parse<'a>(
        &'a self,
        handle: &'a TransientHandle,
        progress: ProgressSink,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn SceneNode>>> {
        Box::pin(async move {
            let bytes = load_binary(handle.locator(), &progress)
                .await
                .with_context(|| format!("reading {}", handle.name()))?;
            self.parse_bytes(handle.name(), handle.media_type(), &bytes)
                .await
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
const CHUNK_SIZE: usize = 64 * 1024;

/// Reads the whole file at `locator`, reporting progress per chunk.
#[cfg(not(target_arch = "wasm32"))]
pub async fn load_binary(locator: &str, progress: &ProgressSink) -> anyhow::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(locator)
        .await
        .with_context(|| format!("opening {locator}"))?;
    let total = file.metadata().await?.len();
    let mut data = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    progress.report(0, Some(total));
    loop {
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
        progress.report(data.len() as u64, Some(total));
    }
    Ok(data)
}

/// Streams the object URL at `locator` through `fetch`, reporting progress
/// per chunk.
#[cfg(target_arch = "wasm32")]
pub async fn load_binary(locator: &str, progress: &ProgressSink) -> anyhow::Result<Vec<u8>> {
    use anyhow::anyhow;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let js_err = |e: wasm_bindgen::JsValue| anyhow!("{e:?}");
    let window = web_sys::window().context("no window")?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(locator))
        .await
        .map_err(js_err)?
        .dyn_into()
        .map_err(js_err)?;
    if !response.ok() {
        bail!("fetching {locator} returned status {}", response.status());
    }
    let total = response
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|len| len.parse::<u64>().ok());

    let body = response.body().context("response has no body")?;
    let reader: web_sys::ReadableStreamDefaultReader =
        body.get_reader().dyn_into().map_err(js_err)?;
    let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
    progress.report(0, total);
    loop {
        let result = JsFuture::from(reader.read()).await.map_err(js_err)?;
        let done = js_sys::Reflect::get(&result, &"done".into())
            .map_err(js_err)?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&result, &"value".into()).map_err(js_err)?;
        data.extend(js_sys::Uint8Array::new(&value).to_vec());
        progress.report(data.len() as u64, total);
    }
    Ok(data)
}

/// A file on disk chosen by a native file dialog or command line.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: std::path::PathBuf,
    pub media_type: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalFile {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl crate::loader::SelectedFile for LocalFile {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    fn media_type(&self) -> Option<String> {
        self.media_type.clone()
    }

    fn open(&self) -> anyhow::Result<TransientHandle> {
        if !self.path.is_file() {
            bail!("{} is not a readable file", self.path.display());
        }
        Ok(TransientHandle::unmanaged(
            &self.name(),
            &self.path.to_string_lossy(),
            self.media_type.clone(),
        ))
    }
}
