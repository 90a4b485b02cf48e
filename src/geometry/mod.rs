// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - bounding boxes, query shapes and spatial acceleration

pub mod aabb;
pub mod bvh;
pub mod shapes;

pub use aabb::{Aabb, Bounded, Intersects};
pub use bvh::{Bvh, BvhNode};
pub use shapes::{LineSegment, Plane, Ray, Sphere, Triangle3};
