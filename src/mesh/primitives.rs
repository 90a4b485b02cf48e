// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed polyhedra generators, mostly for tests and benchmarks

use super::mesh_set::{MeshSet, PolygonSoup};
use crate::error::{KernelError, KernelResult};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Tetrahedron { size: f64 },
    Prism { h: f64, r: f64, segments: usize },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn tetrahedron(size: f64) -> Self {
        Self::Tetrahedron { size }
    }

    pub fn prism(h: f64, r: f64, segments: usize) -> Self {
        Self::Prism { h, r, segments }
    }

    /// Vertex and face-loop data, faces wound counter-clockwise from outside
    pub fn to_soup(&self) -> KernelResult<PolygonSoup> {
        match self {
            Self::Cube { size, center } => Ok(cube_soup(*size, *center)),
            Self::Tetrahedron { size } => Ok(tetrahedron_soup(*size)),
            Self::Prism { h, r, segments } => prism_soup(*h, *r, *segments),
        }
    }

    pub fn to_mesh_set(&self) -> KernelResult<MeshSet> {
        self.to_soup()?.into_mesh_set()
    }
}

/// Axis-aligned cube spanning `[0, 1]^3`
pub fn unit_cube() -> KernelResult<MeshSet> {
    Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh_set()
}

/// Corner tetrahedron with unit legs along each axis
pub fn tetrahedron() -> KernelResult<MeshSet> {
    Primitive::tetrahedron(1.0).to_mesh_set()
}

fn cube_soup(size: Vector3<f64>, center: bool) -> PolygonSoup {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = min + size;

    let vertices = vec![
        [min.x, min.y, min.z],
        [max.x, min.y, min.z],
        [max.x, max.y, min.z],
        [min.x, max.y, min.z],
        [min.x, min.y, max.z],
        [max.x, min.y, max.z],
        [max.x, max.y, max.z],
        [min.x, max.y, max.z],
    ];

    let faces = vec![
        vec![0, 3, 2, 1], // bottom
        vec![4, 5, 6, 7], // top
        vec![0, 1, 5, 4], // front
        vec![2, 3, 7, 6], // back
        vec![0, 4, 7, 3], // left
        vec![1, 2, 6, 5], // right
    ];

    PolygonSoup { vertices, faces }
}

fn tetrahedron_soup(size: f64) -> PolygonSoup {
    PolygonSoup {
        vertices: vec![
            [0.0, 0.0, 0.0],
            [size, 0.0, 0.0],
            [0.0, size, 0.0],
            [0.0, 0.0, size],
        ],
        faces: vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
    }
}

fn prism_soup(h: f64, r: f64, segments: usize) -> KernelResult<PolygonSoup> {
    if segments < 3 {
        return Err(KernelError::degenerate(
            "Primitive::prism",
            format!("{} segments, at least 3 required", segments),
        ));
    }

    let mut vertices = Vec::with_capacity(segments * 2);
    for z in [0.0, h] {
        for i in 0..segments {
            let angle = 2.0 * PI * i as f64 / segments as f64;
            vertices.push([r * angle.cos(), r * angle.sin(), z]);
        }
    }

    let n = segments;
    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(n + 2);
    faces.push((0..n).rev().collect());
    faces.push((n..2 * n).collect());
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(vec![i, j, n + j, n + i]);
    }

    Ok(PolygonSoup { vertices, faces })
}
