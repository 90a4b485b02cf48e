// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh sets: the arena that owns vertices, half-edges and faces, split into
//! twin-connected meshes

use super::face::{newell_normal, Face, FaceBuilder};
use super::halfedge::{EdgeId, FaceId, HalfEdge, MeshId, VertexId};
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{Aabb, Bvh};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Raw vertex / face-loop data a mesh set is built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonSoup {
    pub vertices: Vec<[f64; 3]>,
    /// Each face is a loop of vertex indices, counter-clockwise seen from outside
    pub faces: Vec<Vec<usize>>,
}

impl PolygonSoup {
    pub fn into_mesh_set(self) -> KernelResult<MeshSet> {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        MeshSet::from_polygons(vertices, &self.faces)
    }
}

/// Maximal set of faces connected through twinned half-edges
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub faces: Vec<FaceId>,
    /// Half-edges without a twin (the boundary)
    pub open_edges: Vec<EdgeId>,
    /// One half-edge per twinned pair (the lower id)
    pub closed_edges: Vec<EdgeId>,
    /// Faces wind inwards
    pub is_negative: bool,
    pub(crate) dirty: bool,
}

impl Mesh {
    /// No open edges. Only meaningful while the caches are fresh.
    pub fn is_closed(&self) -> bool {
        self.open_edges.is_empty()
    }

    /// Topology changed since the edge caches were last rebuilt
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Owner of all vertex, half-edge and face storage
#[derive(Debug, Clone, Default)]
pub struct MeshSet {
    vertices: Vec<Point3<f64>>,
    edges: Vec<HalfEdge>,
    faces: Vec<Face>,
    meshes: Vec<Mesh>,
    free_edges: Vec<EdgeId>,
    free_faces: Vec<FaceId>,
    /// A face was removed, so a mesh may have come apart
    split_pending: bool,
}

impl MeshSet {
    /// Build from vertex positions and face loops (indices into `vertices`)
    ///
    /// Twins are linked only where an undirected edge is used exactly once
    /// in each direction; anything else stays open. Faces are then grouped
    /// into meshes and every cache is computed.
    pub fn from_polygons(vertices: Vec<Point3<f64>>, polygons: &[Vec<usize>]) -> KernelResult<Self> {
        for (face, polygon) in polygons.iter().enumerate() {
            if polygon.len() < 3 {
                return Err(KernelError::DegenerateFace {
                    face,
                    reason: format!("{} vertices, at least 3 required", polygon.len()),
                });
            }
            for (i, &index) in polygon.iter().enumerate() {
                if index >= vertices.len() {
                    return Err(KernelError::InvalidVertexIndex {
                        face,
                        index,
                        vertex_count: vertices.len(),
                    });
                }
                if index == polygon[(i + 1) % polygon.len()] {
                    return Err(KernelError::DegenerateFace {
                        face,
                        reason: format!("vertex {} repeats along the loop", index),
                    });
                }
            }
        }

        let mut set = Self {
            vertices,
            ..Self::default()
        };

        // Face records first; the owning mesh is assigned once components are known
        for polygon in polygons {
            let face = FaceId(set.faces.len());
            let base = set.edges.len();
            let n = polygon.len();
            for (i, &v) in polygon.iter().enumerate() {
                set.edges.push(HalfEdge::new(
                    VertexId(v),
                    face,
                    EdgeId(base + (i + 1) % n),
                    EdgeId(base + (i + n - 1) % n),
                ));
            }
            set.faces.push(Face::new(EdgeId(base), n, MeshId(0)));
            set.update_face_normal(face);
        }

        set.link_twins();
        set.split_meshes();
        for m in 0..set.meshes.len() {
            set.cache_edges(MeshId(m));
            set.calc_orientation(MeshId(m));
        }
        Ok(set)
    }

    fn link_twins(&mut self) {
        let mut directed: AHashMap<(VertexId, VertexId), Vec<EdgeId>> = AHashMap::new();
        for idx in 0..self.edges.len() {
            let e = EdgeId(idx);
            directed.entry((self.v1(e), self.v2(e))).or_default().push(e);
        }

        let mut non_manifold = 0usize;
        for (&(a, b), forward) in &directed {
            let Some(backward) = directed.get(&(b, a)) else {
                non_manifold += usize::from(forward.len() > 1);
                continue;
            };
            if a > b {
                continue;
            }
            if forward.len() == 1 && backward.len() == 1 {
                let (e, r) = (forward[0], backward[0]);
                self.edges[e.0].rev = Some(r);
                self.edges[r.0].rev = Some(e);
            } else {
                non_manifold += 1;
            }
        }
        if non_manifold > 0 {
            warn!(
                "{} non-manifold edges left open while linking twins",
                non_manifold
            );
        }
    }

    /// Group faces into twin-connected components, one mesh each
    fn split_meshes(&mut self) {
        self.meshes.clear();
        let mut assigned = vec![false; self.faces.len()];
        let mut queue = VecDeque::new();
        for seed in 0..self.faces.len() {
            if assigned[seed] || self.faces[seed].removed {
                continue;
            }
            let mesh_id = MeshId(self.meshes.len());
            let mut mesh = Mesh::default();
            assigned[seed] = true;
            queue.push_back(FaceId(seed));
            while let Some(face) = queue.pop_front() {
                self.faces[face.0].mesh = mesh_id;
                mesh.faces.push(face);
                for e in self.face_edges(face) {
                    if let Some(r) = self.edges[e.0].rev {
                        let neighbor = self.edges[r.0].face;
                        if !assigned[neighbor.0] {
                            assigned[neighbor.0] = true;
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
            mesh.faces.sort_unstable();
            self.meshes.push(mesh);
        }
        debug!("split {} faces into {} meshes", self.faces.len(), self.meshes.len());
    }

    // ---- accessors -------------------------------------------------------

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn vertex(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.0]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge(&self, e: EdgeId) -> &HalfEdge {
        &self.edges[e.0]
    }

    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.0]
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, m: MeshId) -> &Mesh {
        &self.meshes[m.0]
    }

    pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> {
        (0..self.meshes.len()).map(MeshId)
    }

    /// Live faces across all meshes
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Live half-edges
    pub fn half_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| !e.removed).count()
    }

    /// Cached open edges across all meshes
    pub fn open_edge_count(&self) -> usize {
        self.meshes.iter().map(|m| m.open_edges.len()).sum()
    }

    /// Every mesh is closed (caches are refreshed first by the caller)
    pub fn is_closed(&self) -> bool {
        self.meshes.iter().all(Mesh::is_closed)
    }

    pub fn is_dirty(&self) -> bool {
        self.meshes.iter().any(Mesh::is_dirty)
    }

    // ---- traversal -------------------------------------------------------

    /// Start vertex
    pub fn v1(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].vert
    }

    /// End vertex (start vertex of `next`)
    pub fn v2(&self, e: EdgeId) -> VertexId {
        self.edges[self.edges[e.0].next.0].vert
    }

    pub fn next(&self, e: EdgeId) -> EdgeId {
        self.edges[e.0].next
    }

    pub fn prev(&self, e: EdgeId) -> EdgeId {
        self.edges[e.0].prev
    }

    pub fn rev(&self, e: EdgeId) -> Option<EdgeId> {
        self.edges[e.0].rev
    }

    /// Next open half-edge along the boundary after the open edge `e`
    ///
    /// Rotates around `v2(e)` through twinned edges until an untwinned one
    /// is found. `None` if `e` has a twin or the rotation never reaches an
    /// open edge (non-manifold fan).
    pub fn perim_next(&self, e: EdgeId) -> Option<EdgeId> {
        if self.edges[e.0].rev.is_some() {
            return None;
        }
        let mut cur = self.edges[e.0].next;
        for _ in 0..=self.edges.len() {
            match self.edges[cur.0].rev {
                None => return Some(cur),
                Some(r) => cur = self.edges[r.0].next,
            }
        }
        None
    }

    /// Previous open half-edge along the boundary before the open edge `e`
    pub fn perim_prev(&self, e: EdgeId) -> Option<EdgeId> {
        if self.edges[e.0].rev.is_some() {
            return None;
        }
        let mut cur = self.edges[e.0].prev;
        for _ in 0..=self.edges.len() {
            match self.edges[cur.0].rev {
                None => return Some(cur),
                Some(r) => cur = self.edges[r.0].prev,
            }
        }
        None
    }

    /// Half-edges of `face` in loop order, starting at `face.edge`
    pub fn face_edges(&self, face: FaceId) -> Vec<EdgeId> {
        let f = &self.faces[face.0];
        let mut out = Vec::with_capacity(f.n_edges);
        let mut e = f.edge;
        for _ in 0..f.n_edges {
            out.push(e);
            e = self.edges[e.0].next;
        }
        out
    }

    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face_edges(face).into_iter().map(|e| self.v1(e)).collect()
    }

    pub fn face_points(&self, face: FaceId) -> Vec<Point3<f64>> {
        self.face_edges(face)
            .into_iter()
            .map(|e| self.vertices[self.v1(e).0])
            .collect()
    }

    /// Live faces of every mesh, in mesh order
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.meshes.iter().flat_map(|m| m.faces.iter().copied())
    }

    // ---- derived geometry -------------------------------------------------

    /// Box around every stored vertex
    pub fn aabb(&self) -> Aabb<3> {
        Aabb::fitted(&self.vertices)
    }

    pub fn face_aabb(&self, face: FaceId) -> Aabb<3> {
        let mut bbox = Aabb::empty();
        bbox.fit_with(self.face_edges(face), |e| self.vertices[self.v1(e).0]);
        bbox
    }

    /// BVH over live faces, keyed by `FaceId::index`
    pub fn face_bvh(&self) -> Bvh<3> {
        let items = self
            .face_ids()
            .map(|f| (f.index(), self.face_aabb(f)))
            .collect();
        Bvh::build(items)
    }

    /// BVH over live faces with padded boxes and the configured leaf size
    pub fn face_bvh_with(&self, config: &KernelConfig) -> Bvh<3> {
        let items = self
            .face_ids()
            .map(|f| {
                let mut bbox = self.face_aabb(f);
                bbox.expand(config.aabb_padding);
                (f.index(), bbox)
            })
            .collect();
        Bvh::build_with_leaf_size(items, config.bvh_leaf_size)
    }

    /// Signed volume enclosed by the mesh (divergence theorem over a fan
    /// triangulation of each face); negative for inward winding
    pub fn mesh_volume(&self, mesh: MeshId) -> f64 {
        let mut volume = 0.0;
        for &face in &self.meshes[mesh.0].faces {
            let pts = self.face_points(face);
            for i in 1..pts.len() - 1 {
                volume += pts[0].coords.dot(&pts[i].coords.cross(&pts[i + 1].coords));
            }
        }
        volume / 6.0
    }

    /// Export live faces as index loops over a compacted vertex list
    pub fn to_polygons(&self) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let mut remap: AHashMap<VertexId, usize> = AHashMap::new();
        let mut vertices = Vec::new();
        let mut polygons = Vec::new();
        for face in self.face_ids() {
            let polygon: Vec<usize> = self
                .face_vertices(face)
                .into_iter()
                .map(|v| {
                    *remap.entry(v).or_insert_with(|| {
                        vertices.push(self.vertices[v.0]);
                        vertices.len() - 1
                    })
                })
                .collect();
            polygons.push(polygon);
        }
        (vertices, polygons)
    }

    pub fn to_soup(&self) -> PolygonSoup {
        let (vertices, faces) = self.to_polygons();
        PolygonSoup {
            vertices: vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            faces,
        }
    }

    // ---- structural edits ------------------------------------------------

    fn alloc_edge(&mut self, edge: HalfEdge) -> EdgeId {
        match self.free_edges.pop() {
            Some(id) => {
                self.edges[id.0] = edge;
                id
            }
            None => {
                self.edges.push(edge);
                EdgeId(self.edges.len() - 1)
            }
        }
    }

    fn alloc_face(&mut self, face: Face) -> FaceId {
        match self.free_faces.pop() {
            Some(id) => {
                self.faces[id.0] = face;
                id
            }
            None => {
                self.faces.push(face);
                FaceId(self.faces.len() - 1)
            }
        }
    }

    fn update_face_normal(&mut self, face: FaceId) {
        let normal = newell_normal(&self.face_points(face));
        self.faces[face.0].normal = normal;
    }

    /// Validate a staged loop and move it into `mesh`
    ///
    /// `start` becomes the face's first half-edge. Each staged twin must be
    /// an open half-edge of the set; it is linked back to its new partner.
    /// On error nothing is allocated and the set is unchanged.
    pub fn commit_face(
        &mut self,
        builder: FaceBuilder,
        start: usize,
        expected: usize,
        mesh: MeshId,
    ) -> KernelResult<FaceId> {
        builder.validate(start, expected)?;
        for staged in &builder.edges {
            if let Some(twin) = staged.twin {
                let existing = &self.edges[twin.0];
                if existing.removed || existing.rev.is_some() {
                    return Err(KernelError::degenerate(
                        "MeshSet::commit_face",
                        format!("twin {} is not an open half-edge", twin),
                    ));
                }
            }
        }

        let placeholder = EdgeId(usize::MAX);
        let face = self.alloc_face(Face::new(placeholder, expected, mesh));
        let ids: Vec<EdgeId> = builder
            .edges
            .iter()
            .map(|staged| self.alloc_edge(HalfEdge::new(staged.vert, face, placeholder, placeholder)))
            .collect();

        for (staged, &id) in builder.edges.iter().zip(&ids) {
            let edge = &mut self.edges[id.0];
            edge.next = ids[staged.next];
            edge.prev = ids[staged.prev];
            edge.rev = staged.twin;
            if let Some(twin) = staged.twin {
                self.edges[twin.0].rev = Some(id);
            }
        }

        self.faces[face.0].edge = ids[start];
        self.update_face_normal(face);
        let m = &mut self.meshes[mesh.0];
        m.faces.push(face);
        m.dirty = true;
        Ok(face)
    }

    /// Delete a face, leaving its neighbors' shared edges open
    ///
    /// Returns `false` if the face was already removed. If the removal
    /// disconnects the mesh, the pieces become separate meshes on the next
    /// [`refresh`](Self::refresh).
    pub fn remove_face(&mut self, face: FaceId) -> bool {
        if self.faces[face.0].removed {
            return false;
        }
        for e in self.face_edges(face) {
            if let Some(r) = self.edges[e.0].rev.take() {
                self.edges[r.0].rev = None;
            }
            self.edges[e.0].removed = true;
            self.free_edges.push(e);
        }
        let mesh = self.faces[face.0].mesh;
        self.faces[face.0].removed = true;
        self.free_faces.push(face);
        self.split_pending = true;

        let m = &mut self.meshes[mesh.0];
        m.faces.retain(|&f| f != face);
        m.dirty = true;
        true
    }

    /// Reverse the winding of every face in `mesh`
    pub fn invert(&mut self, mesh: MeshId) {
        let faces = self.meshes[mesh.0].faces.clone();
        for face in faces {
            let loop_edges = self.face_edges(face);
            let ends: Vec<VertexId> = loop_edges.iter().map(|&e| self.v2(e)).collect();
            for (&e, &end) in loop_edges.iter().zip(&ends) {
                let edge = &mut self.edges[e.0];
                edge.vert = end;
                std::mem::swap(&mut edge.next, &mut edge.prev);
            }
            self.faces[face.0].normal = -self.faces[face.0].normal;
        }
        self.cache_edges(mesh);
        self.calc_orientation(mesh);
    }

    // ---- cache maintenance -------------------------------------------------

    /// Compact the vertex store to the vertices used by live faces, in
    /// first-use order. Vertex ids change.
    pub fn collect_vertices(&mut self) {
        let mut remap: Vec<Option<VertexId>> = vec![None; self.vertices.len()];
        let mut compacted = Vec::with_capacity(self.vertices.len());
        let face_ids: Vec<FaceId> = self.face_ids().collect();
        for face in face_ids {
            for e in self.face_edges(face) {
                let old = self.edges[e.0].vert;
                let new = *remap[old.0].get_or_insert_with(|| {
                    compacted.push(self.vertices[old.0]);
                    VertexId(compacted.len() - 1)
                });
                self.edges[e.0].vert = new;
            }
        }
        if compacted.len() != self.vertices.len() {
            debug!(
                "collected {} of {} vertices",
                compacted.len(),
                self.vertices.len()
            );
        }
        self.vertices = compacted;
    }

    /// Rebuild the open / closed edge lists of `mesh` in face order
    pub fn cache_edges(&mut self, mesh: MeshId) {
        let mut open = Vec::new();
        let mut closed = Vec::new();
        for &face in &self.meshes[mesh.0].faces {
            for e in self.face_edges(face) {
                match self.edges[e.0].rev {
                    None => open.push(e),
                    Some(r) if e < r => closed.push(e),
                    Some(_) => {}
                }
            }
        }
        let m = &mut self.meshes[mesh.0];
        m.open_edges = open;
        m.closed_edges = closed;
        m.dirty = false;
    }

    /// Decide whether `mesh` winds inwards
    ///
    /// Looks at the faces around the vertex with the smallest x coordinate:
    /// the one whose normal has the largest |x| must point towards -x for an
    /// outward-facing mesh. Open or edgeless meshes are never negative.
    pub fn calc_orientation(&mut self, mesh: MeshId) {
        let m = &self.meshes[mesh.0];
        if !m.open_edges.is_empty() || m.closed_edges.is_empty() {
            self.meshes[mesh.0].is_negative = false;
            return;
        }

        let x = |e: EdgeId| self.vertices[self.v1(e).0].x;
        let mut emin = m.closed_edges[0];
        for &e in &m.closed_edges {
            if x(e) < x(emin) {
                emin = e;
            }
            if let Some(r) = self.edges[e.0].rev {
                if x(r) < x(emin) {
                    emin = r;
                }
            }
        }

        let mut max_abs_x: f64 = 0.0;
        let mut e = emin;
        for _ in 0..self.edges.len() {
            let nx = self.faces[self.edges[e.0].face.0].normal.x;
            if nx.abs() > max_abs_x.abs() {
                max_abs_x = nx;
            }
            match self.edges[e.0].rev {
                Some(r) => e = self.edges[r.0].next,
                None => break,
            }
            if e == emin {
                break;
            }
        }
        self.meshes[mesh.0].is_negative = max_abs_x > 0.0;
    }

    /// Recompute every cache invalidated by structural edits
    ///
    /// After a face removal the meshes are regrouped into connected
    /// components, so mesh ids and face order within a mesh may change.
    pub fn refresh(&mut self) {
        if !self.is_dirty() {
            return;
        }
        self.collect_vertices();
        if std::mem::take(&mut self.split_pending) {
            self.split_meshes();
            for m in 0..self.meshes.len() {
                self.cache_edges(MeshId(m));
                self.calc_orientation(MeshId(m));
            }
            return;
        }
        for m in 0..self.meshes.len() {
            if self.meshes[m].dirty {
                self.cache_edges(MeshId(m));
                self.calc_orientation(MeshId(m));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_cube_topology() {
        let set = primitives::unit_cube().unwrap();
        assert_eq!(set.meshes().len(), 1);
        assert_eq!(set.face_count(), 6);
        assert_eq!(set.half_edge_count(), 24);
        assert_eq!(set.open_edge_count(), 0);
        assert_eq!(set.mesh(MeshId(0)).closed_edges.len(), 12);
        assert!(!set.mesh(MeshId(0)).is_negative);
        assert!((set.mesh_volume(MeshId(0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_twins_are_symmetric() {
        let set = primitives::unit_cube().unwrap();
        for face in set.face_ids() {
            for e in set.face_edges(face) {
                let r = set.rev(e).unwrap();
                assert_eq!(set.rev(r), Some(e));
                assert_eq!(set.v1(r), set.v2(e));
                assert_eq!(set.v2(r), set.v1(e));
            }
        }
    }

    #[test]
    fn test_disjoint_faces_become_separate_meshes() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let set = MeshSet::from_polygons(vertices, &[vec![0, 1, 2], vec![3, 4, 5]]).unwrap();
        assert_eq!(set.meshes().len(), 2);
        assert_eq!(set.open_edge_count(), 6);
        assert!(!set.is_closed());
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert!(matches!(
            MeshSet::from_polygons(vertices.clone(), &[vec![0, 1, 7]]),
            Err(KernelError::InvalidVertexIndex { index: 7, .. })
        ));
        assert!(matches!(
            MeshSet::from_polygons(vertices.clone(), &[vec![0, 1]]),
            Err(KernelError::DegenerateFace { face: 0, .. })
        ));
        assert!(matches!(
            MeshSet::from_polygons(vertices, &[vec![0, 1, 1, 2]]),
            Err(KernelError::DegenerateFace { face: 0, .. })
        ));
    }

    #[test]
    fn test_perimeter_walk_of_single_triangle() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let set = MeshSet::from_polygons(vertices, &[vec![0, 1, 2]]).unwrap();
        let start = set.mesh(MeshId(0)).open_edges[0];
        let second = set.perim_next(start).unwrap();
        assert_eq!(set.v1(second), set.v2(start));
        assert_eq!(set.perim_prev(second), Some(start));
    }

    #[test]
    fn test_perimeter_walk_skips_interior_edges() {
        // Two triangles sharing the diagonal of a square
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let set = MeshSet::from_polygons(vertices, &[vec![0, 1, 2], vec![0, 2, 3]]).unwrap();
        let mesh = set.mesh(MeshId(0));
        assert_eq!(mesh.open_edges.len(), 4);
        assert_eq!(mesh.closed_edges.len(), 1);

        let start = mesh.open_edges[0];
        let mut e = start;
        let mut visited = Vec::new();
        loop {
            visited.push(set.v1(e));
            e = set.perim_next(e).unwrap();
            assert!(set.rev(e).is_none());
            if e == start {
                break;
            }
        }
        assert_eq!(visited, vec![VertexId(0), VertexId(1), VertexId(2), VertexId(3)]);
        assert_eq!(set.perim_next(mesh.closed_edges[0]), None);
    }

    #[test]
    fn test_remove_face_opens_neighbors() {
        let mut set = primitives::unit_cube().unwrap();
        assert!(set.remove_face(FaceId(0)));
        assert!(!set.remove_face(FaceId(0)));
        assert!(set.is_dirty());

        set.refresh();
        let mesh = set.mesh(MeshId(0));
        assert_eq!(mesh.faces.len(), 5);
        assert_eq!(mesh.open_edges.len(), 4);
        assert!(!mesh.is_negative);
        assert_eq!(set.half_edge_count(), 20);
    }

    #[test]
    fn test_removing_a_bridge_face_splits_the_mesh() {
        // Strip of three triangles; the middle one joins the outer two
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let polygons = vec![vec![0, 1, 2], vec![1, 3, 2], vec![2, 3, 4]];
        let mut set = MeshSet::from_polygons(vertices, &polygons).unwrap();
        assert_eq!(set.meshes().len(), 1);

        assert!(set.remove_face(FaceId(1)));
        set.refresh();
        assert!(!set.is_dirty());
        assert_eq!(set.meshes().len(), 2);
        for id in set.mesh_ids() {
            let mesh = set.mesh(id);
            assert_eq!(mesh.faces.len(), 1);
            assert_eq!(mesh.open_edges.len(), 3);
            assert!(mesh.closed_edges.is_empty());
            assert_eq!(set.face(mesh.faces[0]).mesh, id);
        }
    }

    #[test]
    fn test_invert_flips_orientation_and_volume() {
        let mut set = primitives::unit_cube().unwrap();
        set.invert(MeshId(0));
        assert!(set.mesh(MeshId(0)).is_negative);
        assert!((set.mesh_volume(MeshId(0)) + 1.0).abs() < 1e-12);

        for face in set.face_ids() {
            for e in set.face_edges(face) {
                let r = set.rev(e).unwrap();
                assert_eq!(set.v1(r), set.v2(e));
            }
        }

        set.invert(MeshId(0));
        assert!(!set.mesh(MeshId(0)).is_negative);
    }

    #[test]
    fn test_collect_vertices_drops_unused() {
        let vertices = vec![
            Point3::new(9.0, 9.0, 9.0),
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut set = MeshSet::from_polygons(vertices, &[vec![1, 2, 3]]).unwrap();
        set.collect_vertices();
        assert_eq!(set.vertex_count(), 3);
        assert_eq!(set.face_vertices(FaceId(0)), vec![VertexId(0), VertexId(1), VertexId(2)]);
        assert_eq!(*set.vertex(VertexId(0)), Point3::origin());
    }

    #[test]
    fn test_soup_round_trip() {
        let set = primitives::tetrahedron().unwrap();
        let soup = set.to_soup();
        let rebuilt = soup.clone().into_mesh_set().unwrap();
        assert_eq!(rebuilt.face_count(), 4);
        assert!(rebuilt.is_closed());
        assert_eq!(rebuilt.to_soup(), soup);
    }

    #[test]
    fn test_face_bvh_finds_touching_faces() {
        let set = primitives::unit_cube().unwrap();
        let bvh = set.face_bvh();
        assert_eq!(bvh.len(), 6);
        let corner = Aabb::from_point(&Point3::origin());
        let mut hits: Vec<usize> = bvh
            .query_aabb(&corner)
            .into_iter()
            .filter(|&f| set.face_aabb(FaceId(f)).intersects_aabb(&corner))
            .collect();
        hits.sort_unstable();
        assert_eq!(hits.len(), 3);

        // One face per leaf, so the far faces are pruned even when padded
        let config = KernelConfig {
            aabb_padding: 0.25,
            bvh_leaf_size: 1,
            ..KernelConfig::default()
        };
        let padded = set.face_bvh_with(&config);
        assert_eq!(padded.len(), 6);
        assert_eq!(padded.query_aabb(&corner).len(), 3);
    }
}
