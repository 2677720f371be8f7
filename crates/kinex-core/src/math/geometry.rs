// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides geometric primitive shapes for spatial calculations.

use super::Vec3;

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// An AABB is a rectangular prism aligned with the coordinate axes, defined by its
/// minimum and maximum corner points. It is the volume used by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from two corner points.
    ///
    /// The constructor orders the components, so the points may be passed in any order.
    #[inline]
    pub fn from_min_max(min_pt: Vec3, max_pt: Vec3) -> Self {
        Self {
            min: Vec3::new(
                min_pt.x.min(max_pt.x),
                min_pt.y.min(max_pt.y),
                min_pt.z.min(max_pt.z),
            ),
            max: Vec3::new(
                min_pt.x.max(max_pt.x),
                min_pt.y.max(max_pt.y),
                min_pt.z.max(max_pt.z),
            ),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    ///
    /// The provided `half_extents` will be made non-negative.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let safe_half_extents = half_extents.abs();
        Self {
            min: center - safe_half_extents,
            max: center + safe_half_extents,
        }
    }

    /// Calculates the center point of the `Aabb`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents (half the size on each axis) of the `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Calculates the full size (width, height, depth) of the `Aabb`.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns a copy grown by `margin` on every side.
    #[inline]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Checks if this `Aabb` intersects with another `Aabb`.
    ///
    /// Touching faces count as an intersection.
    #[inline]
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        (self.min.x <= other.max.x && self.max.x >= other.min.x)
            && (self.min.y <= other.max.y && self.max.y >= other.min.y)
            && (self.min.z <= other.max.z && self.max.z >= other.min.z)
    }

    /// Checks if a point is contained within or on the boundary of the `Aabb`.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point.x >= self.min.x && point.x <= self.max.x)
            && (point.y >= self.min.y && point.y <= self.max.y)
            && (point.z >= self.min.z && point.z <= self.max.z)
    }
}
