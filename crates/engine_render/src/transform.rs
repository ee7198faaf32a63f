// crates/engine_render/src/transform.rs

use glam::{Mat4, Quat, Vec3};

use crate::error::RenderError;

/// Walking more parents than this means the hierarchy is malformed.
const MAX_CHAIN_DEPTH: usize = 64;

/// A single positioning node. Parents are arena indices, never owning
/// pointers, so a child cannot keep its parent alive or form an ownership
/// cycle.
#[derive(Clone, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub parent: Option<usize>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Arena of positioning nodes for the renderables in a scene.
#[derive(Default)]
pub struct TransformArena {
    nodes: Vec<Transform>,
}

impl TransformArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transform: Transform) -> usize {
        self.nodes.push(transform);
        self.nodes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Transform> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Transform> {
        self.nodes.get_mut(index)
    }

    /// Composes the world matrix by walking the parent chain.
    ///
    /// Callers are trusted not to create cycles, but a malformed hierarchy
    /// is reported as an error instead of hanging the frame.
    pub fn world_matrix(&self, index: usize) -> Result<Mat4, RenderError> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(index);
        let mut depth = 0;

        while let Some(i) = current {
            let node = self
                .nodes
                .get(i)
                .ok_or(RenderError::InvalidTransform { index: i })?;

            matrix = node.local_matrix() * matrix;
            current = node.parent;

            depth += 1;
            if depth > MAX_CHAIN_DEPTH {
                return Err(RenderError::TransformCycle {
                    max_depth: MAX_CHAIN_DEPTH,
                });
            }
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_composes_with_parent() {
        let mut arena = TransformArena::new();
        let parent = arena.insert(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let mut child = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
        child.parent = Some(parent);
        let child = arena.insert(child);

        let world = arena.world_matrix(child).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn cycle_is_reported_not_hung() {
        let mut arena = TransformArena::new();
        let a = arena.insert(Transform::default());
        let mut b = Transform::default();
        b.parent = Some(a);
        let b = arena.insert(b);
        // Close the loop.
        arena.get_mut(a).unwrap().parent = Some(b);

        match arena.world_matrix(a) {
            Err(RenderError::TransformCycle { .. }) => {}
            other => panic!("expected TransformCycle, got {other:?}"),
        }
    }

    #[test]
    fn unknown_parent_index_is_an_error() {
        let mut arena = TransformArena::new();
        let mut t = Transform::default();
        t.parent = Some(42);
        let i = arena.insert(t);
        assert!(matches!(
            arena.world_matrix(i),
            Err(RenderError::InvalidTransform { index: 42 })
        ));
    }
}
