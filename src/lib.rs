// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG Kernel
//!
//! Geometric primitives for constructive solid geometry: n-dimensional
//! axis-aligned bounding boxes, a half-edge mesh model with open/closed edge
//! caches, and a boundary repair engine that closes holes in open meshes.

pub mod config;
pub mod error;
pub mod geometry;
pub mod mesh;

pub use config::KernelConfig;
pub use error::{KernelError, KernelResult};
pub use geometry::{Aabb, Bounded, Bvh, Intersects};
pub use mesh::{
    close_mesh_set, close_mesh_set_with, close_mesh_sets, validate_mesh_set, MeshSet,
    PolygonSoup, RepairReport,
};

/// Build a mesh set from polygon soup and close every hole it can
pub fn repair_soup(soup: PolygonSoup, config: &KernelConfig) -> KernelResult<(MeshSet, RepairReport)> {
    let mut set = soup.into_mesh_set()?;
    let report = close_mesh_set_with(&mut set, config);
    Ok((set, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_open_box_soup() {
        let mut soup = mesh::Primitive::cube(nalgebra::Vector3::new(1.0, 1.0, 1.0), false)
            .to_soup()
            .unwrap();
        soup.faces.pop();
        let (set, report) = repair_soup(soup, &KernelConfig::default()).unwrap();
        assert!(report.fully_closed());
        assert_eq!(set.face_count(), 7);
        assert!(validate_mesh_set(&set).is_closed());
    }
}
