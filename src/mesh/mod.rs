// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh module - half-edge mesh sets and boundary repair

pub mod face;
pub mod halfedge;
pub mod mesh_set;
pub mod primitives;
pub mod repair;
pub mod validate;

pub use face::{newell_normal, Face, FaceBuilder};
pub use halfedge::{EdgeId, FaceId, HalfEdge, MeshId, VertexId};
pub use mesh_set::{Mesh, MeshSet, PolygonSoup};
pub use primitives::Primitive;
pub use repair::{close_mesh_set, close_mesh_set_with, close_mesh_sets, RepairReport};
pub use validate::{validate_mesh_set, MeshSetReport};
