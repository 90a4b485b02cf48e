// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis-aligned bounding boxes in `D` dimensions
//!
//! A box is stored as its center `pos` and half-size `extent`. A box whose
//! extent is negative on any axis is *empty*: it contains nothing, intersects
//! nothing and is ignored when fitting or taking unions.

use super::shapes::{LineSegment, Plane, Ray, Sphere, Triangle3};
use nalgebra::{Point, Point3, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Anything that can report a bounding box of itself
pub trait Bounded<const D: usize> {
    fn aabb(&self) -> Aabb<D>;
}

/// Overlap test between a box and some other geometry
pub trait Intersects<Rhs: ?Sized> {
    fn intersects(&self, other: &Rhs) -> bool;
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb<const D: usize> {
    /// Box center
    pub pos: SVector<f64, D>,
    /// Half-size along each axis
    pub extent: SVector<f64, D>,
}

impl<const D: usize> Aabb<D> {
    pub fn new(pos: SVector<f64, D>, extent: SVector<f64, D>) -> Self {
        Self { pos, extent }
    }

    /// The empty box
    pub fn empty() -> Self {
        Self {
            pos: SVector::zeros(),
            extent: SVector::from_element(-1.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extent.iter().any(|&e| e < 0.0)
    }

    /// Box spanning `lo..=hi`; empty if the bounds are inverted on any axis
    ///
    /// The rounded bounds `pos - extent` and `pos + extent` always enclose
    /// `lo` and `hi`, so the box contains every input it was fitted to.
    pub fn from_bounds(lo: &SVector<f64, D>, hi: &SVector<f64, D>) -> Self {
        if (0..D).any(|i| !(lo[i] <= hi[i])) {
            return Self::empty();
        }
        let pos = (lo + hi) * 0.5;
        let extent = SVector::from_fn(|i, _| covering_extent(lo[i], hi[i], pos[i]));
        Self { pos, extent }
    }

    /// Zero-extent box at `p`
    pub fn from_point(p: &Point<f64, D>) -> Self {
        Self {
            pos: p.coords,
            extent: SVector::zeros(),
        }
    }

    pub fn from_points(a: &Point<f64, D>, b: &Point<f64, D>) -> Self {
        Self::from_bounds(&a.coords.inf(&b.coords), &a.coords.sup(&b.coords))
    }

    pub fn from_triple(a: &Point<f64, D>, b: &Point<f64, D>, c: &Point<f64, D>) -> Self {
        let lo = a.coords.inf(&b.coords).inf(&c.coords);
        let hi = a.coords.sup(&b.coords).sup(&c.coords);
        Self::from_bounds(&lo, &hi)
    }

    pub fn fit_point(&mut self, p: &Point<f64, D>) {
        *self = Self::from_point(p);
    }

    pub fn fit_pair(&mut self, a: &Point<f64, D>, b: &Point<f64, D>) {
        *self = Self::from_points(a, b);
    }

    pub fn fit_triple(&mut self, a: &Point<f64, D>, b: &Point<f64, D>, c: &Point<f64, D>) {
        *self = Self::from_triple(a, b, c);
    }

    /// Refit to the tightest box around every bounded item. Empty items are
    /// skipped; if nothing remains the box becomes empty.
    pub fn fit_iter<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Bounded<D>,
    {
        self.fit_with(items, |item| item);
    }

    /// Like [`Aabb::fit_iter`], converting each item through `adapter` first
    pub fn fit_with<I, F, B>(&mut self, items: I, mut adapter: F)
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> B,
        B: Bounded<D>,
    {
        let mut lo = SVector::<f64, D>::from_element(f64::INFINITY);
        let mut hi = SVector::<f64, D>::from_element(f64::NEG_INFINITY);
        for item in items {
            let b = adapter(item).aabb();
            if b.is_empty() {
                continue;
            }
            lo = lo.inf(&(b.pos - b.extent));
            hi = hi.sup(&(b.pos + b.extent));
        }
        *self = Self::from_bounds(&lo, &hi);
    }

    /// Fresh box fitted around `items`
    pub fn fitted<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Bounded<D>,
    {
        let mut aabb = Self::empty();
        aabb.fit_iter(items);
        aabb
    }

    /// Grow to enclose `other`
    pub fn union_aabb(&mut self, other: &Aabb<D>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        let lo = self.min_vec().inf(&other.min_vec());
        let hi = self.max_vec().sup(&other.max_vec());
        *self = Self::from_bounds(&lo, &hi);
    }

    pub fn union(&self, other: &Aabb<D>) -> Aabb<D> {
        let mut out = *self;
        out.union_aabb(other);
        out
    }

    /// Pad every axis by `pad`
    pub fn expand(&mut self, pad: f64) {
        if self.is_empty() {
            return;
        }
        self.extent.add_scalar_mut(pad);
    }

    /// Signed gap between the boxes along `axis`; positive means separated
    pub fn axis_separation(&self, other: &Aabb<D>, axis: usize) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::INFINITY;
        }
        (other.pos[axis] - self.pos[axis]).abs() - (self.extent[axis] + other.extent[axis])
    }

    /// Largest [`Aabb::axis_separation`] over all axes
    pub fn max_axis_separation(&self, other: &Aabb<D>) -> f64 {
        (0..D)
            .map(|axis| self.axis_separation(other, axis))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn intersects_aabb(&self, other: &Aabb<D>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.max_axis_separation(other) <= 0.0
    }

    pub fn intersects_sphere(&self, sphere: &Sphere<D>) -> bool {
        if self.is_empty() {
            return false;
        }
        let dist2: f64 = (0..D)
            .map(|i| {
                let d = (sphere.center[i] - self.pos[i]).abs() - self.extent[i];
                if d > 0.0 {
                    d * d
                } else {
                    0.0
                }
            })
            .sum();
        dist2 <= sphere.radius * sphere.radius
    }

    pub fn intersects_plane(&self, plane: &Plane<D>) -> bool {
        if self.is_empty() {
            return false;
        }
        let d = plane.normal.dot(&self.pos) + plane.offset;
        d.abs() <= self.range_in_direction(&plane.normal)
    }

    pub fn intersects_ray(&self, ray: &Ray<D>) -> bool {
        self.clip_line(&ray.origin, &ray.direction, 0.0, f64::INFINITY)
    }

    pub fn intersects_segment(&self, segment: &LineSegment<D>) -> bool {
        self.clip_line(&segment.a, &(segment.b - segment.a), 0.0, 1.0)
    }

    /// Slab test of `origin + t * dir` for `t` in `t0..=t1`
    fn clip_line(
        &self,
        origin: &Point<f64, D>,
        dir: &SVector<f64, D>,
        mut t0: f64,
        mut t1: f64,
    ) -> bool {
        if self.is_empty() {
            return false;
        }
        for i in 0..D {
            let lo = self.min_axis(i);
            let hi = self.max_axis(i);
            if dir[i] == 0.0 {
                if origin[i] < lo || origin[i] > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir[i];
            let mut near = (lo - origin[i]) * inv;
            let mut far = (hi - origin[i]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return false;
            }
        }
        true
    }

    pub fn contains_point(&self, p: &Point<f64, D>) -> bool {
        !self.is_empty() && (0..D).all(|i| self.min_axis(i) <= p[i] && p[i] <= self.max_axis(i))
    }

    /// True if `other` lies entirely inside this box. The empty box is
    /// contained by everything.
    pub fn completely_contains(&self, other: &Aabb<D>) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() {
            return false;
        }
        (0..D).all(|i| {
            self.min_axis(i) <= other.min_axis(i) && other.max_axis(i) <= self.max_axis(i)
        })
    }

    /// Half-width of the box projected onto `v`
    pub fn range_in_direction(&self, v: &SVector<f64, D>) -> f64 {
        v.abs().dot(&self.extent)
    }

    /// Product of the side lengths; zero for the empty box and for `D == 0`
    pub fn volume(&self) -> f64 {
        if D == 0 || self.is_empty() {
            return 0.0;
        }
        self.extent.iter().map(|e| 2.0 * e).product()
    }

    pub fn min_vec(&self) -> SVector<f64, D> {
        self.pos - self.extent
    }

    pub fn max_vec(&self) -> SVector<f64, D> {
        self.pos + self.extent
    }

    pub fn min(&self) -> Point<f64, D> {
        Point::from(self.min_vec())
    }

    pub fn mid(&self) -> Point<f64, D> {
        Point::from(self.pos)
    }

    pub fn max(&self) -> Point<f64, D> {
        Point::from(self.max_vec())
    }

    pub fn min_axis(&self, axis: usize) -> f64 {
        self.pos[axis] - self.extent[axis]
    }

    pub fn mid_axis(&self, axis: usize) -> f64 {
        self.pos[axis]
    }

    pub fn max_axis(&self, axis: usize) -> f64 {
        self.pos[axis] + self.extent[axis]
    }

    /// Axis with the largest extent (first one on ties)
    pub fn longest_axis(&self) -> usize {
        let mut best = 0;
        for i in 1..D {
            if self.extent[i] > self.extent[best] {
                best = i;
            }
        }
        best
    }
}

impl Aabb<3> {
    /// Separating-axis test against a triangle: the three box axes, the
    /// triangle normal and the nine edge/axis cross products
    pub fn intersects_triangle(&self, tri: &Triangle3) -> bool {
        if self.is_empty() {
            return false;
        }
        let h = self.extent;
        let v = [
            tri.a.coords - self.pos,
            tri.b.coords - self.pos,
            tri.c.coords - self.pos,
        ];

        let separated = |axis: &Vector3<f64>| {
            let p0 = axis.dot(&v[0]);
            let p1 = axis.dot(&v[1]);
            let p2 = axis.dot(&v[2]);
            let r = h.x * axis.x.abs() + h.y * axis.y.abs() + h.z * axis.z.abs();
            p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r
        };

        let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];
        for edge in &edges {
            for unit in [Vector3::x(), Vector3::y(), Vector3::z()] {
                if separated(&unit.cross(edge)) {
                    return false;
                }
            }
        }

        for i in 0..3 {
            let lo = v[0][i].min(v[1][i]).min(v[2][i]);
            let hi = v[0][i].max(v[1][i]).max(v[2][i]);
            if lo > h[i] || hi < -h[i] {
                return false;
            }
        }

        !separated(&edges[0].cross(&edges[1]))
    }
}

impl<const D: usize> Default for Aabb<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> Bounded<D> for Aabb<D> {
    fn aabb(&self) -> Aabb<D> {
        *self
    }
}

impl<const D: usize> Bounded<D> for Point<f64, D> {
    fn aabb(&self) -> Aabb<D> {
        Aabb::from_point(self)
    }
}

impl<const D: usize, T: Bounded<D> + ?Sized> Bounded<D> for &T {
    fn aabb(&self) -> Aabb<D> {
        (**self).aabb()
    }
}

impl<const D: usize> Intersects<Aabb<D>> for Aabb<D> {
    fn intersects(&self, other: &Aabb<D>) -> bool {
        self.intersects_aabb(other)
    }
}

impl<const D: usize> Intersects<Sphere<D>> for Aabb<D> {
    fn intersects(&self, other: &Sphere<D>) -> bool {
        self.intersects_sphere(other)
    }
}

impl<const D: usize> Intersects<Plane<D>> for Aabb<D> {
    fn intersects(&self, other: &Plane<D>) -> bool {
        self.intersects_plane(other)
    }
}

impl<const D: usize> Intersects<Ray<D>> for Aabb<D> {
    fn intersects(&self, other: &Ray<D>) -> bool {
        self.intersects_ray(other)
    }
}

impl<const D: usize> Intersects<LineSegment<D>> for Aabb<D> {
    fn intersects(&self, other: &LineSegment<D>) -> bool {
        self.intersects_segment(other)
    }
}

impl Intersects<Triangle3> for Aabb<3> {
    fn intersects(&self, other: &Triangle3) -> bool {
        self.intersects_triangle(other)
    }
}

/// Unit cube `[0, 1]^3`, handy for tests and examples
pub fn unit_cube() -> Aabb<3> {
    Aabb::from_points(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0))
}

/// Rounding can leave the bounds a few ulps short of the range
const MAX_ULP_STEPS: usize = 8;

/// Half-width around `mid` whose rounded bounds reach both `lo` and `hi`
fn covering_extent(lo: f64, hi: f64, mid: f64) -> f64 {
    let mut extent = (hi - mid).max(mid - lo);
    for _ in 0..MAX_ULP_STEPS {
        if mid - extent <= lo && mid + extent >= hi {
            break;
        }
        extent = next_up(extent);
    }
    extent
}

fn next_up(x: f64) -> f64 {
    let x = x.abs();
    if x.is_finite() {
        f64::from_bits(x.to_bits() + 1)
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};

    #[test]
    fn test_fit_pair_and_accessors() {
        let mut bbox = Aabb::<3>::empty();
        bbox.fit_pair(&Point3::new(1.0, 2.0, 3.0), &Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min(), Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.mid(), Point3::origin());
        assert_eq!(bbox.volume(), 48.0);
        assert_eq!(bbox.longest_axis(), 2);
    }

    #[test]
    fn test_fit_empty_range_stays_empty() {
        let mut bbox = unit_cube();
        bbox.fit_iter(Vec::<Point3<f64>>::new());
        assert!(bbox.is_empty());
        assert_eq!(bbox.volume(), 0.0);
        assert!(!bbox.contains_point(&Point3::origin()));
    }

    #[test]
    fn test_fit_with_adapter_skips_empty_items() {
        let items = vec![
            (0usize, Aabb::empty()),
            (1, Aabb::from_point(&Point2::new(2.0, 3.0))),
            (2, Aabb::from_point(&Point2::new(-1.0, 0.0))),
        ];
        let mut bbox = Aabb::<2>::empty();
        bbox.fit_with(&items, |(_, b)| *b);
        assert_eq!(bbox.min(), Point2::new(-1.0, 0.0));
        assert_eq!(bbox.max(), Point2::new(2.0, 3.0));
    }

    #[test]
    fn test_empty_box_never_intersects() {
        let empty = Aabb::<3>::empty();
        let cube = unit_cube();
        assert!(!empty.intersects(&cube));
        assert!(!cube.intersects(&empty));
        assert!(!empty.intersects(&empty));
        assert!(!empty.intersects(&Sphere::new(Point3::origin(), 100.0)));
        assert!(cube.completely_contains(&empty));
        assert_eq!(cube.union(&empty), cube);
        assert_eq!(empty.union(&cube), cube);
    }

    #[test]
    fn test_axis_separation() {
        let a = Aabb::from_points(&Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0));
        let b = Aabb::from_points(&Point2::new(3.0, 0.5), &Point2::new(4.0, 2.0));
        assert_eq!(a.axis_separation(&b, 0), 2.0);
        assert_eq!(a.axis_separation(&b, 1), -0.5);
        assert_eq!(a.max_axis_separation(&b), 2.0);
        assert!(!a.intersects(&b));

        let touching = Aabb::from_points(&Point2::new(1.0, 1.0), &Point2::new(2.0, 2.0));
        assert_eq!(a.max_axis_separation(&touching), 0.0);
        assert!(a.intersects(&touching));
    }

    #[test]
    fn test_expand_pads_every_axis() {
        let mut a = Aabb::from_points(&Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0));
        let b = Aabb::from_point(&Point2::new(1.25, 0.5));
        assert!(!a.intersects(&b));
        a.expand(0.25);
        assert!(a.intersects(&b));
        assert_eq!(a.extent, Vector2::new(0.75, 0.75));
    }

    #[test]
    fn test_sphere_and_plane() {
        let cube = unit_cube();
        assert!(cube.intersects(&Sphere::new(Point3::new(2.0, 0.5, 0.5), 1.0)));
        assert!(!cube.intersects(&Sphere::new(Point3::new(2.0, 2.0, 0.5), 1.0)));

        let cutting = Plane::new(Vector3::new(1.0, 1.0, 1.0), -1.5).unwrap();
        let missing = Plane::new(Vector3::new(1.0, 1.0, 1.0), -3.5).unwrap();
        assert!(cube.intersects(&cutting));
        assert!(!cube.intersects(&missing));
    }

    #[test]
    fn test_ray_and_segment() {
        let cube = unit_cube();
        let hit = Ray::new(Point3::new(-1.0, 0.5, 0.5), Vector3::x()).unwrap();
        let behind = Ray::new(Point3::new(2.0, 0.5, 0.5), Vector3::x()).unwrap();
        let parallel = Ray::new(Point3::new(-1.0, 2.0, 0.5), Vector3::x()).unwrap();
        assert!(cube.intersects(&hit));
        assert!(!cube.intersects(&behind));
        assert!(!cube.intersects(&parallel));

        let short = LineSegment::new(Point3::new(-2.0, 0.5, 0.5), Point3::new(-1.0, 0.5, 0.5));
        let through = LineSegment::new(Point3::new(-2.0, 0.5, 0.5), Point3::new(3.0, 0.5, 0.5));
        let point = LineSegment::new(Point3::new(0.5, 0.5, 0.5), Point3::new(0.5, 0.5, 0.5));
        assert!(!cube.intersects(&short));
        assert!(cube.intersects(&through));
        assert!(cube.intersects(&point));
    }

    #[test]
    fn test_triangle_sat() {
        let cube = unit_cube();
        let crossing = Triangle3::new(
            Point3::new(-1.0, -1.0, 0.5),
            Point3::new(3.0, -1.0, 0.5),
            Point3::new(-1.0, 3.0, 0.5),
        );
        let above = Triangle3::new(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        );
        // Bounding boxes overlap but the triangle passes beside the corner
        let diagonal = Triangle3::new(
            Point3::new(2.5, 0.0, 0.0),
            Point3::new(0.0, 2.5, 0.0),
            Point3::new(2.0, 2.0, 2.5),
        );
        assert!(cube.intersects(&crossing));
        assert!(!cube.intersects(&above));
        assert!(cube.aabb().intersects(&diagonal.aabb()));
        assert!(!cube.intersects(&diagonal));
    }

    #[test]
    fn test_fit_contains_inexact_midpoints() {
        // (lo + hi) / 2 rounds here, so a plain half-difference extent
        // leaves `lo` just outside the box
        let lo = Point2::new(-206.719573177832, 0.1);
        let hi = Point2::new(871.3310243190371, 0.7);
        let bbox = Aabb::from_points(&lo, &hi);
        assert!(bbox.contains_point(&lo));
        assert!(bbox.contains_point(&hi));
        assert!(bbox.min_axis(0) <= lo.x && bbox.max_axis(0) >= hi.x);

        let other = Aabb::from_point(&Point2::new(1e3 / 3.0, -7.1));
        let u = bbox.union(&other);
        assert!(u.completely_contains(&bbox));
        assert!(u.completely_contains(&other));
    }

    #[test]
    fn test_touching_separation_is_symmetric() {
        let a = Aabb::<1>::new(SVector::from_element(1.9533), SVector::from_element(0.0899));
        let b = Aabb::<1>::new(
            SVector::from_element(1.9533 + 0.0899 + 2.1845),
            SVector::from_element(2.1845),
        );
        assert_eq!(a.axis_separation(&b, 0), b.axis_separation(&a, 0));
        assert_eq!(a.intersects_aabb(&b), b.intersects_aabb(&a));
    }

    #[test]
    fn test_degenerate_box_behaves_as_point() {
        let p = Aabb::from_point(&Point3::new(0.5, 0.5, 0.5));
        assert!(p.contains_point(&Point3::new(0.5, 0.5, 0.5)));
        assert!(!p.contains_point(&Point3::new(0.5, 0.5, 0.6)));
        assert!(unit_cube().intersects(&p));
        assert!(unit_cube().completely_contains(&p));
        assert_eq!(p.volume(), 0.0);
    }
}
