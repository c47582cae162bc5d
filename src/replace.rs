//! Swapping the displayed asset.
//!
//! [`replace`] removes every non-persistent member of the scene, releases the
//! GPU resources of its whole subtree and appends the new asset behind the
//! fixtures. [`reset`] is a replacement with nothing followed by framing an
//! empty volume.

use log::{debug, warn};

use crate::{
    context::ViewerContext,
    data_structures::{bounds::BoundingVolume, scene::Scene, scene_graph::SceneNode},
    error::DisposalWarning,
    framing::Framer,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaceReport {
    /// Top-level members detached from the scene.
    pub removed: usize,
    /// GPU resources released successfully.
    pub disposed: usize,
    pub warnings: Vec<DisposalWarning>,
}

pub fn replace(scene: &mut Scene, asset: Option<Box<dyn SceneNode>>) -> ReplaceReport {
    let mut report = ReplaceReport::default();
    let (persistent, removed): (Vec<_>, Vec<_>) = scene
        .take_members()
        .into_iter()
        .partition(|member| member.role().is_persistent());

    for member in persistent {
        scene.add(member);
    }

    for mut member in removed {
        dispose_subtree(member.as_mut(), &mut report);
        report.removed += 1;
    }

    if let Some(asset) = asset {
        scene.add(asset);
    }

    debug!(
        "Replaced scene asset: {} removed, {} resources disposed, {} warnings",
        report.removed,
        report.disposed,
        report.warnings.len()
    );
    report
}

fn dispose_subtree(node: &mut dyn SceneNode, report: &mut ReplaceReport) {
    let id = node.id();
    for resource in node.get_resources_mut() {
        match resource.dispose() {
            Ok(()) => report.disposed += 1,
            Err(e) => {
                let warning = DisposalWarning {
                    node: id,
                    name: resource.label().to_string(),
                    reason: format!("{e:#}"),
                };
                warn!("{warning}");
                report.warnings.push(warning);
            }
        }
    }
    for child in node.get_children_mut().iter_mut() {
        dispose_subtree(child.as_mut(), report);
    }
}

/// Clears the asset and frames the empty scene. Calling it repeatedly
/// leaves the same state.
pub fn reset(ctx: &mut ViewerContext) -> ReplaceReport {
    let report = replace(&mut ctx.scene, None);
    Framer::new(&ctx.config.framing).frame(ctx, &BoundingVolume::empty());
    report
}
