//! flow-viewer
//!
//! Scene lifecycle and camera framing core of a 3D asset viewer that runs
//! natively and in the browser. A selected glTF/GLB or OBJ file is parsed
//! into a scene graph, swapped in for the previously displayed asset (whose
//! GPU resources are released) and framed by the camera. Rendering and input
//! handling stay with the embedding application.
//!
//! High-level modules
//! - `camera`: camera, projection, uniform and orbit controls
//! - `config`: viewer options with TOML support
//! - `context`: the state the load pipeline operates on
//! - `data_structures`: scene graph, geometry and bounding volumes
//! - `error`: errors reported to the user interface
//! - `framing`: camera framing and asset placement
//! - `loader`: the asynchronous load pipeline and its parser contract
//! - `replace`: swapping the displayed asset and resetting the view
//! - `resources`: glTF and OBJ parsers and byte loading
//! - `web`: wasm-bindgen entry points (wasm32 only)
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod framing;
pub mod loader;
pub mod replace;
pub mod resources;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::ViewerContext;
pub use error::LoadError;
pub use loader::{AssetLoader, AssetParser, SelectedFile, TransientHandle};

/// Installs the logger. Calling it again is harmless.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("Logger already initialised: {e}");
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("Logger already initialised: {e}");
        }
    }
}
