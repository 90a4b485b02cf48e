// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Query shapes tested against bounding boxes

use super::aabb::{Aabb, Bounded};
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point, Point3, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Lengths at or below this are treated as zero when normalizing
const ZERO_LENGTH: f64 = 1e-12;

fn normalized<const D: usize>(
    v: &SVector<f64, D>,
    operation: &'static str,
) -> KernelResult<SVector<f64, D>> {
    let length = v.norm();
    if !length.is_finite() || length <= ZERO_LENGTH {
        return Err(KernelError::degenerate(
            operation,
            format!("vector length {} cannot be normalized", length),
        ));
    }
    Ok(v / length)
}

/// Solid ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere<const D: usize> {
    pub center: Point<f64, D>,
    pub radius: f64,
}

impl<const D: usize> Sphere<D> {
    pub fn new(center: Point<f64, D>, radius: f64) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    pub fn contains_point(&self, p: &Point<f64, D>) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }
}

impl<const D: usize> Bounded<D> for Sphere<D> {
    fn aabb(&self) -> Aabb<D> {
        Aabb::new(self.center.coords, SVector::from_element(self.radius))
    }
}

/// Hyperplane `normal · x + offset = 0` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane<const D: usize> {
    pub normal: SVector<f64, D>,
    pub offset: f64,
}

impl<const D: usize> Plane<D> {
    /// Build from a (not necessarily unit) normal and offset; both are scaled
    /// so the stored normal has unit length
    pub fn new(normal: SVector<f64, D>, offset: f64) -> KernelResult<Self> {
        let length = normal.norm();
        let unit = normalized(&normal, "Plane::new")?;
        Ok(Self {
            normal: unit,
            offset: offset / length,
        })
    }

    /// Plane through `point` facing `normal`
    pub fn from_point_normal(point: &Point<f64, D>, normal: SVector<f64, D>) -> KernelResult<Self> {
        let unit = normalized(&normal, "Plane::from_point_normal")?;
        Ok(Self {
            normal: unit,
            offset: -unit.dot(&point.coords),
        })
    }

    pub fn signed_distance(&self, p: &Point<f64, D>) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }
}

impl Plane<3> {
    /// Plane through three points, facing along `(b - a) × (c - a)`
    pub fn from_triangle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> KernelResult<Self> {
        let normal = (b - a).cross(&(c - a));
        let unit = normalized(&normal, "Plane::from_triangle")?;
        Ok(Self {
            normal: unit,
            offset: -unit.dot(&a.coords),
        })
    }
}

/// Half-line `origin + t * direction`, `t >= 0`, with a unit direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray<const D: usize> {
    pub origin: Point<f64, D>,
    pub direction: SVector<f64, D>,
}

impl<const D: usize> Ray<D> {
    pub fn new(origin: Point<f64, D>, direction: SVector<f64, D>) -> KernelResult<Self> {
        Ok(Self {
            origin,
            direction: normalized(&direction, "Ray::new")?,
        })
    }

    /// Ray starting at `from` and passing through `to`
    pub fn through(from: Point<f64, D>, to: &Point<f64, D>) -> KernelResult<Self> {
        Ok(Self {
            origin: from,
            direction: normalized(&(to - from), "Ray::through")?,
        })
    }

    pub fn point_at(&self, t: f64) -> Point<f64, D> {
        self.origin + self.direction * t
    }

    /// Distance from `p` to the closest point of the ray
    pub fn distance_to_point(&self, p: &Point<f64, D>) -> f64 {
        let t = (p - self.origin).dot(&self.direction).max(0.0);
        (p - self.point_at(t)).norm()
    }
}

/// Closed segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment<const D: usize> {
    pub a: Point<f64, D>,
    pub b: Point<f64, D>,
}

impl<const D: usize> LineSegment<D> {
    pub fn new(a: Point<f64, D>, b: Point<f64, D>) -> Self {
        Self { a, b }
    }

    pub fn midpoint(&self) -> Point<f64, D> {
        Point::from((self.a.coords + self.b.coords) * 0.5)
    }

    pub fn half_vector(&self) -> SVector<f64, D> {
        (self.b - self.a) * 0.5
    }

    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }

    /// Closest point on the segment to `p`
    pub fn closest_point(&self, p: &Point<f64, D>) -> Point<f64, D> {
        let ab = self.b - self.a;
        let len2 = ab.norm_squared();
        if len2 == 0.0 {
            return self.a;
        }
        let t = ((p - self.a).dot(&ab) / len2).clamp(0.0, 1.0);
        self.a + ab * t
    }
}

impl<const D: usize> Bounded<D> for LineSegment<D> {
    fn aabb(&self) -> Aabb<D> {
        Aabb::from_points(&self.a, &self.b)
    }
}

/// Triangle in 3-space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle3 {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub c: Point3<f64>,
}

impl Triangle3 {
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// Unnormalized normal `(b - a) × (c - a)`; zero for degenerate triangles
    pub fn normal(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> f64 {
        self.normal().norm() * 0.5
    }
}

impl Bounded<3> for Triangle3 {
    fn aabb(&self) -> Aabb<3> {
        Aabb::from_triple(&self.a, &self.b, &self.c)
    }
}
