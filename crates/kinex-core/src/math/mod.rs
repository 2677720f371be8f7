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

//! Provides the mathematics primitives used by the simulator.
//!
//! All quantities are `f64` and SI units (meters, seconds, kilograms). Every
//! division and normalization in this module is zero-safe: degenerate inputs
//! produce a documented fallback instead of NaN or infinity.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons and zero checks.
pub const EPSILON: f64 = 1e-9;

pub use std::f64::consts::PI;

// --- Declare Sub-Modules ---

pub mod geometry;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::geometry::Aabb;
pub use self::vector::{Vec2, Vec3};

// --- Utility Functions ---

/// Clamps a value to a specified minimum and maximum range.
///
/// # Examples
///
/// ```
/// use kinex_core::math::clamp;
/// assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
/// assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
/// assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
/// ```
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min_val: T, max_val: T) -> T {
    if value < min_val {
        min_val
    } else if value > max_val {
        max_val
    } else {
        value
    }
}

/// Clamps a value to the `[0.0, 1.0]` range, mapping NaN to `fallback`.
///
/// # Examples
///
/// ```
/// use kinex_core::math::saturate_or;
/// assert_eq!(saturate_or(1.5, 0.3), 1.0);
/// assert_eq!(saturate_or(-0.5, 0.3), 0.0);
/// assert_eq!(saturate_or(f64::NAN, 0.3), 0.3);
/// ```
#[inline]
pub fn saturate_or(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        clamp(value, 0.0, 1.0)
    }
}

/// Returns `value` if it is finite, otherwise `fallback` if that is finite,
/// otherwise `0.0`.
///
/// # Examples
///
/// ```
/// use kinex_core::math::finite_or;
/// assert_eq!(finite_or(2.0, 1.0), 2.0);
/// assert_eq!(finite_or(f64::NAN, 1.0), 1.0);
/// assert_eq!(finite_or(f64::INFINITY, f64::NAN), 0.0);
/// ```
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else if fallback.is_finite() {
        fallback
    } else {
        0.0
    }
}
