// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for kernel operations

use thiserror::Error;

/// Result type for fallible kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors raised by the geometric kernel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A geometric input collapsed (zero-length direction, zero-area normal, ...)
    #[error("{operation}: degenerate input ({reason})")]
    Degenerate {
        /// Operation that rejected the input
        operation: &'static str,
        /// What was degenerate about it
        reason: String,
    },

    /// A face loop references a vertex outside the vertex store
    #[error("face {face} references vertex {index} (only {vertex_count} vertices)")]
    InvalidVertexIndex {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    /// A face loop is too short or repeats a vertex back-to-back
    #[error("face {face} is degenerate: {reason}")]
    DegenerateFace { face: usize, reason: String },

    /// Walking a face loop did not visit the expected number of half-edges
    #[error("edge loop mismatch: expected {expected} half-edges, walked {actual}")]
    EdgeLoopMismatch { expected: usize, actual: usize },
}

impl KernelError {
    pub(crate) fn degenerate(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            operation,
            reason: reason.into(),
        }
    }
}
