//! Browser entry points.
//!
//! `WebViewer` owns the viewer context and the loader. The page forwards the
//! file input's `change` event and the canvas' `dragover`/`drop` events; the
//! render loop reads `view_proj()` each frame.

use std::{cell::RefCell, rc::Rc};

use futures::StreamExt;
use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{DragEvent, Event, File, FileList, HtmlInputElement, Url};

use crate::{
    config::ViewerConfig,
    context::ViewerContext,
    error::LoadError,
    loader::{AssetLoader, SelectedFile, TransientHandle, progress_channel},
    replace::reset,
    resources::FormatParser,
};

/// A file from a picker or a drop, read through an object URL.
struct WebFile(File);

impl SelectedFile for WebFile {
    fn name(&self) -> String {
        self.0.name()
    }

    fn media_type(&self) -> Option<String> {
        Some(self.0.type_()).filter(|media_type| !media_type.is_empty())
    }

    fn open(&self) -> anyhow::Result<TransientHandle> {
        let url = Url::create_object_url_with_blob(&self.0)
            .map_err(|e| anyhow::anyhow!("could not create object URL: {e:?}"))?;
        log::debug!("Created {url} for {}", self.0.name());
        Ok(TransientHandle::new(
            &self.0.name(),
            &url,
            self.media_type(),
            |url| {
                if let Err(e) = Url::revoke_object_url(url) {
                    log::warn!("Could not revoke {url}: {e:?}");
                }
            },
        ))
    }
}

fn files_of(list: Option<FileList>) -> Vec<WebFile> {
    list.map(|list| (0..list.length()).filter_map(|i| list.get(i)).map(WebFile).collect())
        .unwrap_or_default()
}

fn notify(error: &LoadError) {
    log::error!("{error}");
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.alert_with_message(&error.notice()) {
            log::warn!("Could not show notice: {e:?}");
        }
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    ctx: Rc<RefCell<ViewerContext>>,
    loader: Rc<RefCell<AssetLoader>>,
    on_progress: Rc<RefCell<Option<js_sys::Function>>>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Usage from JS: `const viewer = new WebViewer(optionsToml);`
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<WebViewer, JsValue> {
        crate::init_logging();
        let config = match config_toml {
            Some(toml) => ViewerConfig::from_toml_str(&toml)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => ViewerConfig::default(),
        };
        let loader = AssetLoader::from_config(Rc::new(FormatParser::new()), &config);
        Ok(WebViewer {
            ctx: Rc::new(RefCell::new(ViewerContext::new(config))),
            loader: Rc::new(RefCell::new(loader)),
            on_progress: Rc::new(RefCell::new(None)),
        })
    }

    /// `callback(loaded, total)` is called for every chunk read; `total` is
    /// `undefined` when unknown.
    pub fn set_progress_callback(&self, callback: js_sys::Function) {
        *self.on_progress.borrow_mut() = Some(callback);
    }

    /// Handler for an `<input type="file">` change event.
    pub fn on_file_input(&self, event: Event) {
        let input = event
            .target()
            .and_then(|target| target.dyn_into::<HtmlInputElement>().ok());
        let files = files_of(input.as_ref().and_then(|input| input.files()));
        self.start_load(files);
        // Allows selecting the same file again.
        if let Some(input) = input {
            input.set_value("");
        }
    }

    pub fn on_drag_over(&self, event: DragEvent) {
        event.prevent_default();
        self.loader.borrow_mut().await_file();
    }

    pub fn on_drop(&self, event: DragEvent) {
        event.prevent_default();
        let files = files_of(event.data_transfer().and_then(|transfer| transfer.files()));
        self.start_load(files);
    }

    pub fn reset(&self) {
        if self.loader.borrow().is_loading() {
            notify(&LoadError::LoadInProgress);
            return;
        }
        reset(&mut self.ctx.borrow_mut());
    }

    /// Abandons a load that never completes, e.g. a stalled fetch. Its late
    /// result is discarded and new selections are accepted again.
    pub fn cancel(&self) {
        self.loader.borrow_mut().cancel();
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.ctx.borrow_mut().resize(width, height);
    }

    pub fn is_loading(&self) -> bool {
        self.loader.borrow().is_loading()
    }

    /// Column-major view projection matrix for the render loop.
    pub fn view_proj(&self) -> Vec<f32> {
        let matrix: [[f32; 4]; 4] = self.ctx.borrow().camera_uniform.view_proj().into();
        matrix.iter().flatten().copied().collect()
    }

    pub fn asset_name(&self) -> Option<String> {
        self.ctx.borrow().asset_info().map(|info| info.name)
    }

    pub fn asset_size(&self) -> Option<Vec<f32>> {
        self.ctx.borrow().asset_info().map(|info| info.size.to_vec())
    }

    fn start_load(&self, files: Vec<WebFile>) {
        let pending = match self.loader.borrow_mut().select(&files) {
            Ok(pending) => pending,
            Err(e) => return notify(&e),
        };

        let (sink, mut progress) = progress_channel();
        let ctx = self.ctx.clone();
        let loader = self.loader.clone();
        let on_progress = self.on_progress.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let report_progress = async {
                while let Some(update) = progress.next().await {
                    if let Some(callback) = on_progress.borrow().as_ref() {
                        let total = update
                            .total
                            .map(|total| JsValue::from_f64(total as f64))
                            .unwrap_or(JsValue::UNDEFINED);
                        let loaded = JsValue::from_f64(update.loaded as f64);
                        if let Err(e) = callback.call2(&JsValue::NULL, &loaded, &total) {
                            log::warn!("Progress callback failed: {e:?}");
                        }
                    }
                }
            };
            let (completed, ()) = futures::join!(pending.run(sink), report_progress);

            let result = loader.borrow_mut().finish(&mut ctx.borrow_mut(), completed);
            if let Err(e) = result {
                notify(&e);
            }
        });
    }
}
