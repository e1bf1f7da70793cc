//! A loaded model: uploaded meshes keyed by scene node name.

use asset::MeshRecord;

use crate::backend::{Backend, DrawPass, Uploader};
use crate::mesh::MeshResource;

/// Meshes in scene traversal order. Read-only once uploaded.
pub struct ModelResource<B: Backend> {
    meshes: Vec<(String, MeshResource<B>)>,
}

impl<B: Backend> ModelResource<B> {
    /// Upload every record, preserving order.
    pub fn upload(uploader: &mut impl Uploader<B>, records: &[MeshRecord]) -> Self {
        let meshes = records
            .iter()
            .map(|record| {
                let mesh = MeshResource::new(uploader, &record.name, &record.mesh);
                (record.name.clone(), mesh)
            })
            .collect::<Vec<_>>();

        log::info!(
            "Uploaded model: {} meshes, {} indices total",
            meshes.len(),
            meshes.iter().map(|(_, m)| m.index_count() as u64).sum::<u64>()
        );
        Self { meshes }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&MeshResource<B>> {
        self.meshes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, mesh)| mesh)
    }

    /// Draw every mesh.
    pub fn render(&self, pass: &mut impl DrawPass<B>) {
        self.render_filtered(pass, |_| true);
    }

    /// Draw only the meshes whose name satisfies `predicate`. Opaque meshes
    /// go first, then translucent ones, each group in traversal order.
    pub fn render_filtered(&self, pass: &mut impl DrawPass<B>, predicate: impl Fn(&str) -> bool) {
        for translucent in [false, true] {
            for (name, mesh) in &self.meshes {
                if mesh.is_translucent() == translucent && predicate(name) {
                    mesh.render(pass);
                }
            }
        }
    }
}
