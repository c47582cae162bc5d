//! The asset load pipeline.
//!
//! A load runs in three phases so that the viewer context is never borrowed
//! while the parser is suspended:
//!
//! 1. [`AssetLoader::select`] validates the file event and opens a
//!    [`TransientHandle`] to the file's bytes.
//! 2. [`PendingLoad::run`] drives the parser to its single terminal result,
//!    reporting [`Progress`] through a separate channel, and revokes the
//!    handle as soon as the parser is done.
//! 3. [`AssetLoader::finish`] swaps the new asset into the scene and frames
//!    the camera on it, or reports the failure and leaves the scene alone.
//!
//! [`AssetLoader::load`] chains the three for callers that can keep the
//! context across the await.

use std::{fmt, rc::Rc, time::Duration};

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    future::LocalBoxFuture,
};
use log::{error, info, warn};

use crate::{
    config::{AcceptedTypes, ViewerConfig},
    context::ViewerContext,
    data_structures::{
        bounds::{AssetInfo, BoundingVolume},
        scene_graph::SceneNode,
    },
    error::LoadError,
    framing::{Framer, place_asset},
    replace::{ReplaceReport, replace},
};

/// Bytes read so far. `total` is known when the source reports a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.loaded as f64 / total as f64).min(1.0) as f32),
            None => None,
        }
    }
}

/// Sending half of a progress channel. Reports are dropped silently when
/// nobody listens.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<Progress>>,
}

impl ProgressSink {
    pub fn discard() -> Self {
        Self { sender: None }
    }

    pub fn report(&self, loaded: u64, total: Option<u64>) {
        if let Some(sender) = &self.sender {
            // A closed receiver only means the UI stopped listening.
            let _ = sender.unbounded_send(Progress { loaded, total });
        }
    }
}

pub fn progress_channel() -> (ProgressSink, UnboundedReceiver<Progress>) {
    let (sender, receiver) = mpsc::unbounded();
    (
        ProgressSink {
            sender: Some(sender),
        },
        receiver,
    )
}

/// An addressable reference to a selected file's bytes: an object URL in the
/// browser, a path on native targets.
///
/// The handle is revoked exactly once: either explicitly through
/// [`TransientHandle::revoke`], which consumes it, or when it is dropped.
pub struct TransientHandle {
    name: String,
    locator: String,
    media_type: Option<String>,
    revoker: Option<Box<dyn FnOnce(&str)>>,
}

impl TransientHandle {
    pub fn new(
        name: &str,
        locator: &str,
        media_type: Option<String>,
        revoker: impl FnOnce(&str) + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            locator: locator.to_string(),
            media_type,
            revoker: Some(Box::new(revoker)),
        }
    }

    /// A handle whose locator needs no cleanup, such as a file path.
    pub fn unmanaged(name: &str, locator: &str, media_type: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            locator: locator.to_string(),
            media_type,
            revoker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(revoker) = self.revoker.take() {
            revoker(&self.locator);
        }
    }
}

impl Drop for TransientHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for TransientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientHandle")
            .field("name", &self.name)
            .field("locator", &self.locator)
            .field("media_type", &self.media_type)
            .field("managed", &self.revoker.is_some())
            .finish()
    }
}

/// A file as delivered by a picker or a drop event.
pub trait SelectedFile {
    fn name(&self) -> String;

    /// The media type declared by the source, if any.
    fn media_type(&self) -> Option<String>;

    fn open(&self) -> anyhow::Result<TransientHandle>;
}

/// Turns file bytes into an asset tree.
///
/// Exactly one terminal result per call; any number of progress reports may
/// precede it.
pub trait AssetParser {
    fn parse<'a>(
        &'a self,
        handle: &'a TransientHandle,
        progress: ProgressSink,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn SceneNode>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    /// A picker is open or a drag hovers the viewer.
    AwaitingFile,
    Loading { attempt: u64, file_name: String },
}

/// A selection that passed validation, waiting to be parsed.
pub struct PendingLoad {
    attempt: u64,
    file_name: String,
    handle: TransientHandle,
    parser: Rc<dyn AssetParser>,
}

impl PendingLoad {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub async fn run(self, progress: ProgressSink) -> CompletedLoad {
        let PendingLoad {
            attempt,
            file_name,
            handle,
            parser,
        } = self;
        let start = instant::Instant::now();
        info!("Loading {file_name}");

        let result = parser.parse(&handle, progress).await;
        handle.revoke();

        CompletedLoad {
            attempt,
            file_name,
            result,
            elapsed: start.elapsed(),
        }
    }
}

/// The parser's terminal result for one attempt.
pub struct CompletedLoad {
    pub attempt: u64,
    pub file_name: String,
    pub result: anyhow::Result<Box<dyn SceneNode>>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub file_name: String,
    pub info: AssetInfo,
    pub replace: ReplaceReport,
    pub elapsed: Duration,
}

pub struct AssetLoader {
    state: LoadState,
    parser: Rc<dyn AssetParser>,
    accepted: Option<AcceptedTypes>,
    next_attempt: u64,
}

impl AssetLoader {
    /// A loader that hands every selected file to `parser`.
    pub fn new(parser: Rc<dyn AssetParser>) -> Self {
        Self {
            state: LoadState::Idle,
            parser,
            accepted: None,
            next_attempt: 1,
        }
    }

    /// A loader that rejects files outside `config.accepted_types` before
    /// parsing.
    pub fn from_config(parser: Rc<dyn AssetParser>, config: &ViewerConfig) -> Self {
        Self::new(parser).with_accepted_types(config.accepted_types.clone())
    }

    pub fn with_accepted_types(mut self, accepted: AcceptedTypes) -> Self {
        self.accepted = Some(accepted);
        self
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading { .. })
    }

    /// Marks that the user is choosing a file. Ignored while loading.
    pub fn await_file(&mut self) {
        if !self.is_loading() {
            self.state = LoadState::AwaitingFile;
        }
    }

    pub fn select<F: SelectedFile>(&mut self, files: &[F]) -> Result<PendingLoad, LoadError> {
        let Some((file, ignored)) = files.split_first() else {
            if !self.is_loading() {
                self.state = LoadState::Idle;
            }
            return Err(LoadError::NoFileSelected);
        };

        if self.is_loading() {
            warn!("Ignoring {} while another file is loading", file.name());
            return Err(LoadError::LoadInProgress);
        }

        let name = file.name();
        for extra in ignored {
            warn!("Only one file is loaded at a time, ignoring {}", extra.name());
        }

        let media_type = file.media_type();
        if let Some(accepted) = &self.accepted {
            if !accepted.accepts(&name, media_type.as_deref()) {
                self.state = LoadState::Idle;
                warn!("Rejected {name} with media type {media_type:?}");
                return Err(LoadError::UnsupportedFileType { name, media_type });
            }
        }

        let handle = match file.open() {
            Ok(handle) => handle,
            Err(source) => {
                self.state = LoadState::Idle;
                error!("Could not open {name}: {source:#}");
                return Err(LoadError::ParseFailure { name, source });
            }
        };

        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.state = LoadState::Loading {
            attempt,
            file_name: name.clone(),
        };

        Ok(PendingLoad {
            attempt,
            file_name: name,
            handle,
            parser: self.parser.clone(),
        })
    }

    pub fn finish(
        &mut self,
        ctx: &mut ViewerContext,
        completed: CompletedLoad,
    ) -> Result<LoadReport, LoadError> {
        let CompletedLoad {
            attempt,
            file_name,
            result,
            elapsed,
        } = completed;

        match &self.state {
            LoadState::Loading { attempt: pending, .. } if *pending == attempt => {}
            _ => {
                warn!("Discarding result of cancelled load {attempt} ({file_name})");
                return Err(LoadError::Cancelled { name: file_name });
            }
        }
        self.state = LoadState::Idle;

        let mut asset = match result {
            Ok(asset) => asset,
            Err(source) => {
                error!("Failed to load {file_name}: {source:#}");
                return Err(LoadError::ParseFailure {
                    name: file_name,
                    source,
                });
            }
        };

        place_asset(asset.as_mut(), &ctx.config.placement);
        let volume = BoundingVolume::of(asset.as_ref());
        let info = AssetInfo::of(asset.as_ref());

        let replace = replace(&mut ctx.scene, Some(asset));
        Framer::new(&ctx.config.framing).frame(ctx, &volume);

        info!(
            "Loaded {file_name} in {:.1} ms ({} nodes, diagonal {:.3})",
            elapsed.as_secs_f64() * 1000.0,
            info.node_count,
            info.diagonal
        );

        Ok(LoadReport {
            file_name,
            info,
            replace,
            elapsed,
        })
    }

    pub async fn load<F: SelectedFile>(
        &mut self,
        ctx: &mut ViewerContext,
        files: &[F],
        progress: ProgressSink,
    ) -> Result<LoadReport, LoadError> {
        let pending = self.select(files)?;
        let completed = pending.run(progress).await;
        self.finish(ctx, completed)
    }

    /// Returns to `Idle`. A still running [`PendingLoad`] revokes its handle
    /// when dropped; its completion is discarded by [`AssetLoader::finish`].
    pub fn cancel(&mut self) {
        if let LoadState::Loading { attempt, file_name } = &self.state {
            warn!("Cancelled load {attempt} ({file_name})");
        }
        self.state = LoadState::Idle;
    }
}
