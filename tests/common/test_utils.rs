#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use flow_viewer::{
    config::ViewerConfig,
    context::ViewerContext,
    data_structures::{
        model::{Dispose, MaterialDesc, Primitive},
        scene_graph::{ContainerNode, MeshNode, SceneNode},
    },
    loader::{AssetParser, ProgressSink, SelectedFile, TransientHandle},
};
use futures::future::LocalBoxFuture;

pub(crate) fn test_context() -> ViewerContext {
    ViewerContext::new(ViewerConfig::default())
}

/// Counts how often something happened, shared between a fake and the test.
#[derive(Clone, Default)]
pub(crate) struct Counter(Rc<Cell<u32>>);

impl Counter {
    pub fn increment(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// A GPU resource stand-in that records its disposal.
pub(crate) struct TrackedResource {
    pub label: String,
    pub disposals: Counter,
    pub fail: bool,
}

impl TrackedResource {
    pub fn boxed(label: &str, disposals: &Counter) -> Box<dyn Dispose> {
        Box::new(Self {
            label: label.to_string(),
            disposals: disposals.clone(),
            fail: false,
        })
    }

    pub fn failing(label: &str, disposals: &Counter) -> Box<dyn Dispose> {
        Box::new(Self {
            label: label.to_string(),
            disposals: disposals.clone(),
            fail: true,
        })
    }
}

impl Dispose for TrackedResource {
    fn label(&self) -> &str {
        &self.label
    }

    fn dispose(&mut self) -> anyhow::Result<()> {
        self.disposals.increment();
        if self.fail {
            anyhow::bail!("device lost");
        }
        Ok(())
    }
}

/// Axis-aligned box geometry given by its eight corners.
pub(crate) fn box_primitive(min: [f32; 3], max: [f32; 3]) -> Primitive {
    let mut positions = Vec::with_capacity(8);
    for x in [min[0], max[0]] {
        for y in [min[1], max[1]] {
            for z in [min[2], max[2]] {
                positions.push([x, y, z]);
            }
        }
    }
    Primitive::from_positions(positions)
}

/// An asset root with one box mesh child owning a tracked mesh and material.
pub(crate) fn box_asset(name: &str, min: [f32; 3], max: [f32; 3], disposals: &Counter) -> Box<dyn SceneNode> {
    let mut mesh = MeshNode::new(
        &format!("{name}-mesh"),
        vec![box_primitive(min, max)],
        vec![MaterialDesc::default()],
    );
    mesh.attach_resources(
        vec![TrackedResource::boxed(&format!("{name}-buffers"), disposals)],
        vec![TrackedResource::boxed(&format!("{name}-material"), disposals)],
    );
    let mut root = ContainerNode::new(name);
    root.add_child(Box::new(mesh));
    Box::new(root)
}

pub(crate) type AssetFactory = Box<dyn Fn() -> anyhow::Result<Box<dyn SceneNode>>>;

/// Parser that reports fixed progress steps and then returns whatever the
/// factory builds.
pub(crate) struct FakeParser {
    factory: AssetFactory,
    pub progress_steps: Vec<u64>,
    pub calls: Counter,
}

impl FakeParser {
    pub fn new(factory: impl Fn() -> anyhow::Result<Box<dyn SceneNode>> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            progress_steps: vec![25, 50, 100],
            calls: Counter::default(),
        }
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move || Err(anyhow::anyhow!(message)))
    }
}

impl AssetParser for FakeParser {
    fn parse<'a>(
        &'a self,
        _handle: &'a TransientHandle,
        progress: ProgressSink,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn SceneNode>>> {
        Box::pin(async move {
            self.calls.increment();
            for loaded in &self.progress_steps {
                progress.report(*loaded, Some(100));
            }
            (self.factory)()
        })
    }
}

/// A selected file whose handle counts its revocations.
pub(crate) struct FakeFile {
    pub name: String,
    pub media_type: Option<String>,
    pub revocations: Counter,
    pub fail_open: bool,
}

impl FakeFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            media_type: None,
            revocations: Counter::default(),
            fail_open: false,
        }
    }

    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = Some(media_type.to_string());
        self
    }
}

impl SelectedFile for FakeFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn media_type(&self) -> Option<String> {
        self.media_type.clone()
    }

    fn open(&self) -> anyhow::Result<TransientHandle> {
        if self.fail_open {
            anyhow::bail!("object URL could not be created");
        }
        let revocations = self.revocations.clone();
        Ok(TransientHandle::new(
            &self.name,
            &format!("blob:test/{}", self.name),
            self.media_type.clone(),
            move |_| revocations.increment(),
        ))
    }
}
