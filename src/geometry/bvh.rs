// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) over indexed boxes
//! Used to prune candidate pairs before exact intersection tests

use super::aabb::Aabb;

/// Default maximum number of items stored in a leaf
pub const DEFAULT_LEAF_SIZE: usize = 4;

const MAX_DEPTH: usize = 32;

/// BVH node
#[derive(Debug, Clone)]
pub struct BvhNode<const D: usize> {
    /// Box enclosing every item below this node
    pub bbox: Aabb<D>,
    /// Left child (None for leaf)
    pub left: Option<Box<BvhNode<D>>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BvhNode<D>>>,
    /// Item indices (only for leaf nodes)
    pub items: Vec<usize>,
}

impl<const D: usize> BvhNode<D> {
    fn leaf(bbox: Aabb<D>, items: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    fn internal(left: Box<BvhNode<D>>, right: Box<BvhNode<D>>) -> Self {
        Self {
            bbox: left.bbox.union(&right.bbox),
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy keyed by caller-chosen item indices
#[derive(Debug, Clone)]
pub struct Bvh<const D: usize> {
    root: BvhNode<D>,
    len: usize,
}

impl<const D: usize> Bvh<D> {
    /// Build from `(index, bbox)` pairs. Items with empty boxes are dropped.
    pub fn build(items: Vec<(usize, Aabb<D>)>) -> Self {
        Self::build_with_leaf_size(items, DEFAULT_LEAF_SIZE)
    }

    pub fn build_with_leaf_size(items: Vec<(usize, Aabb<D>)>, leaf_size: usize) -> Self {
        let items: Vec<_> = items.into_iter().filter(|(_, b)| !b.is_empty()).collect();
        let len = items.len();
        if items.is_empty() {
            return Self {
                root: BvhNode::leaf(Aabb::empty(), Vec::new()),
                len,
            };
        }
        let root = Self::build_recursive(items, leaf_size.max(1), 0);
        Self { root, len }
    }

    fn build_recursive(mut items: Vec<(usize, Aabb<D>)>, leaf_size: usize, depth: usize) -> BvhNode<D> {
        let mut bbox = Aabb::empty();
        bbox.fit_with(&items, |(_, b)| *b);

        if items.len() <= leaf_size || depth >= MAX_DEPTH {
            return BvhNode::leaf(bbox, items.into_iter().map(|(idx, _)| idx).collect());
        }

        // Median split on the longest axis of the node box
        let axis = bbox.longest_axis();
        items.sort_by(|(_, a), (_, b)| a.mid_axis(axis).total_cmp(&b.mid_axis(axis)));

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, leaf_size, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, leaf_size, depth + 1));

        BvhNode::internal(left, right)
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Box around every item
    pub fn bounds(&self) -> &Aabb<D> {
        &self.root.bbox
    }

    /// Items whose subtree boxes intersect `bbox`. Leaves are not refined,
    /// so callers still run their exact test on the returned candidates.
    pub fn query_aabb(&self, bbox: &Aabb<D>) -> Vec<usize> {
        self.query_with(|node_box| node_box.intersects_aabb(bbox))
    }

    /// Items reached by descending every node whose box satisfies `hit`
    pub fn query_with<F>(&self, hit: F) -> Vec<usize>
    where
        F: Fn(&Aabb<D>) -> bool,
    {
        let mut result = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.bbox.is_empty() || !hit(&node.bbox) {
                continue;
            }
            if node.is_leaf() {
                result.extend_from_slice(&node.items);
                continue;
            }
            if let Some(ref left) = node.left {
                stack.push(left);
            }
            if let Some(ref right) = node.right {
                stack.push(right);
            }
        }
        result
    }

    /// Get root node (for testing)
    #[cfg(test)]
    pub fn root(&self) -> &BvhNode<D> {
        &self.root
    }
}
