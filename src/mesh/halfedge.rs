// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge records and the typed indices that address the mesh arenas

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index into the mesh set's vertex store
    VertexId,
    "v"
);
arena_id!(
    /// Index into the mesh set's half-edge arena
    EdgeId,
    "e"
);
arena_id!(
    /// Index into the mesh set's face arena
    FaceId,
    "f"
);
arena_id!(
    /// Index of a mesh (connected component) within its mesh set
    MeshId,
    "m"
);

/// Directed edge `v1 -> v2` on a face loop
///
/// Only the start vertex is stored; the end vertex is the start vertex of
/// `next`. `rev` is the opposing half-edge of the neighboring face, or
/// `None` when the edge lies on an open boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    /// Start vertex (`v1`)
    pub vert: VertexId,
    /// Face whose loop this half-edge belongs to
    pub face: FaceId,
    /// Next half-edge around the face
    pub next: EdgeId,
    /// Previous half-edge around the face
    pub prev: EdgeId,
    /// Twin across the shared undirected edge
    pub rev: Option<EdgeId>,
    /// Tombstone; the slot sits on the free list
    pub(crate) removed: bool,
}

impl HalfEdge {
    pub(crate) fn new(vert: VertexId, face: FaceId, next: EdgeId, prev: EdgeId) -> Self {
        Self {
            vert,
            face,
            next,
            prev,
            rev: None,
            removed: false,
        }
    }

    /// True when the half-edge has no twin
    pub fn is_open(&self) -> bool {
        self.rev.is_none()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}
