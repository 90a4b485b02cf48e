// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary repair: closes holes in open meshes one face at a time
//!
//! Each pass picks the first cached open edge of a mesh, walks the boundary
//! loop it belongs to and either caps the loop with a single face (exactly
//! three edges) or cuts one triangular ear off it (more than three edges).
//! Edge caches and orientation are rebuilt after every pass.

use super::face::FaceBuilder;
use super::halfedge::{EdgeId, MeshId};
use super::mesh_set::MeshSet;
use crate::config::KernelConfig;
use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counters collected while repairing one mesh set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Meshes that had open edges when repair started
    pub meshes_repaired: usize,
    /// Three-edge loops closed with a single face
    pub triangles_capped: usize,
    /// Ears cut off longer loops
    pub ears_cut: usize,
    /// Loops left alone (too short, pinched or not walkable)
    pub loops_skipped: usize,
    /// Staged faces rejected during validation
    pub faces_discarded: usize,
    pub open_edges_before: usize,
    pub open_edges_after: usize,
    /// Meshes inverted because they closed inside-out
    pub meshes_inverted: usize,
}

impl RepairReport {
    /// No mesh has open edges left
    pub fn fully_closed(&self) -> bool {
        self.open_edges_after == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn absorb(&mut self, other: &RepairReport) {
        self.meshes_repaired += other.meshes_repaired;
        self.triangles_capped += other.triangles_capped;
        self.ears_cut += other.ears_cut;
        self.loops_skipped += other.loops_skipped;
        self.faces_discarded += other.faces_discarded;
        self.meshes_inverted += other.meshes_inverted;
    }
}

/// Outcome of a single pass over one boundary loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Capped,
    EarCut,
    Skipped,
    Discarded,
}

/// Close the open boundaries of every mesh in `set` with default settings
pub fn close_mesh_set(set: &mut MeshSet) -> RepairReport {
    close_mesh_set_with(set, &KernelConfig::default())
}

/// Close the open boundaries of every mesh in `set`
///
/// The set is refreshed first if structural edits left stale caches. The
/// returned report is advisory; `Mesh::open_edges` remains authoritative.
pub fn close_mesh_set_with(set: &mut MeshSet, config: &KernelConfig) -> RepairReport {
    set.refresh();

    let mut report = RepairReport {
        open_edges_before: set.open_edge_count(),
        ..RepairReport::default()
    };

    let mesh_ids: Vec<MeshId> = set.mesh_ids().collect();
    for mesh in mesh_ids {
        let mesh_report = close_mesh(set, mesh, config);
        report.absorb(&mesh_report);
    }

    report.open_edges_after = set.open_edge_count();
    info!(
        "repair: {} -> {} open edges ({} capped, {} ears, {} skipped, {} discarded)",
        report.open_edges_before,
        report.open_edges_after,
        report.triangles_capped,
        report.ears_cut,
        report.loops_skipped,
        report.faces_discarded
    );
    report
}

/// Repair independent mesh sets in parallel
pub fn close_mesh_sets(sets: &mut [MeshSet], config: &KernelConfig) -> Vec<RepairReport> {
    sets.par_iter_mut()
        .map(|set| close_mesh_set_with(set, config))
        .collect()
}

fn close_mesh(set: &mut MeshSet, mesh: MeshId, config: &KernelConfig) -> RepairReport {
    let mut report = RepairReport::default();
    let initial = set.mesh(mesh).open_edges.len();
    if initial == 0 {
        return report;
    }
    report.meshes_repaired = 1;

    let budget = config.repair_pass_budget(initial);
    for pass in 0..budget {
        let Some(&start) = set.mesh(mesh).open_edges.first() else {
            break;
        };

        let outcome = close_step(set, mesh, start, config);
        match outcome {
            Pass::Capped => report.triangles_capped += 1,
            Pass::EarCut => report.ears_cut += 1,
            Pass::Skipped => report.loops_skipped += 1,
            Pass::Discarded => report.faces_discarded += 1,
        }

        set.collect_vertices();
        set.cache_edges(mesh);
        set.calc_orientation(mesh);

        debug!(
            "{} pass {}: {:?}, {} open edges left",
            mesh,
            pass,
            outcome,
            set.mesh(mesh).open_edges.len()
        );

        if matches!(outcome, Pass::Skipped | Pass::Discarded) {
            break;
        }
    }

    let m = set.mesh(mesh);
    if !m.is_closed() {
        warn!("{} left with {} open edges", mesh, m.open_edges.len());
    } else if m.is_negative && config.fix_orientation {
        set.invert(mesh);
        report.meshes_inverted = 1;
        debug!("{} inverted after closing inside-out", mesh);
    }
    report
}

/// Walk the boundary loop through `start`, returning its edges and the first
/// pair of consecutive open edges
fn boundary_loop(
    set: &MeshSet,
    mesh: MeshId,
    start: EdgeId,
) -> Option<(Vec<EdgeId>, EdgeId, EdgeId)> {
    let open: AHashSet<EdgeId> = set.mesh(mesh).open_edges.iter().copied().collect();
    let mut loop_edges = Vec::new();
    let mut anchor = None;
    let mut edge = start;
    loop {
        if loop_edges.len() >= open.len() {
            return None;
        }
        loop_edges.push(edge);
        let next = set.perim_next(edge)?;
        if anchor.is_none() && open.contains(&next) {
            anchor = Some((edge, next));
        }
        edge = next;
        if edge == start {
            break;
        }
    }
    let (first, second) = anchor?;
    Some((loop_edges, first, second))
}

fn close_step(set: &mut MeshSet, mesh: MeshId, start: EdgeId, config: &KernelConfig) -> Pass {
    let Some((loop_edges, open_edge1, open_edge2)) = boundary_loop(set, mesh, start) else {
        warn!("{}: boundary through {} does not close", mesh, start);
        return Pass::Skipped;
    };

    match loop_edges.len() {
        3 => cap_loop(set, mesh, &loop_edges, open_edge1),
        n if n > 3 => cut_ear(set, mesh, open_edge1, open_edge2, config),
        n => {
            debug!("{}: {}-edge loop through {} cannot be capped", mesh, n, start);
            Pass::Skipped
        }
    }
}

/// Close a loop with one face twinned against every loop edge
fn cap_loop(set: &mut MeshSet, mesh: MeshId, loop_edges: &[EdgeId], anchor: EdgeId) -> Pass {
    let n = loop_edges.len();
    let start = loop_edges.iter().position(|&e| e == anchor).unwrap_or(0);
    let mut builder = FaceBuilder::with_capacity(n);
    for &e in loop_edges {
        builder.push(set.v2(e), Some(e));
    }
    // The new face runs against the boundary direction
    for i in 0..n {
        builder.link((i + 1) % n, i);
    }

    match set.commit_face(builder, start, n, mesh) {
        Ok(face) => {
            debug!("{}: capped {}-edge loop with {}", mesh, n, face);
            Pass::Capped
        }
        Err(err) => {
            warn!("{}: discarded cap face: {}", mesh, err);
            Pass::Discarded
        }
    }
}

/// Add the triangle (v2, v1, w) over two consecutive open edges
/// `v1 -> v2` and `v2 -> w`, leaving `v1 -> w` open
fn cut_ear(
    set: &mut MeshSet,
    mesh: MeshId,
    open_edge1: EdgeId,
    open_edge2: EdgeId,
    config: &KernelConfig,
) -> Pass {
    let v1 = set.v1(open_edge1);
    let v2 = set.v2(open_edge1);
    let w = set.v2(open_edge2);

    let pinched = w == v1 || (set.vertex(w) - set.vertex(v1)).norm() <= config.epsilon;
    if pinched {
        debug!("{}: pinched ear at {} skipped", mesh, open_edge1);
        return Pass::Skipped;
    }

    let mut builder = FaceBuilder::with_capacity(3);
    builder.push(v2, Some(open_edge1));
    builder.push(v1, None);
    builder.push(w, Some(open_edge2));
    builder.link_in_order();

    match set.commit_face(builder, 0, 3, mesh) {
        Ok(face) => {
            debug!("{}: cut ear {} over {} and {}", mesh, face, open_edge1, open_edge2);
            Pass::EarCut
        }
        Err(err) => {
            warn!("{}: discarded ear face: {}", mesh, err);
            Pass::Discarded
        }
    }
}
