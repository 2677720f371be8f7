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

//! Error taxonomy for the physics core.
//!
//! None of these errors abort a simulation. The hot path turns them into
//! `false` returns or sanitized state; the `try_*` APIs expose them so callers
//! can tell the failure modes apart.

use thiserror::Error;

/// A specialized `Result` type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// An error that can occur while operating on a physics world.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// An operation referenced a body id that is not registered.
    #[error("unknown body id `{0}`")]
    InvalidReference(String),

    /// A force or impulse targeted a body whose effective inverse mass is zero.
    #[error("body `{0}` is immovable (static or kinematic)")]
    ImmovableBody(String),

    /// A joint operation targeted a body without an actuated joint.
    #[error("body `{0}` has no actuated joint")]
    NotAJoint(String),

    /// Two bodies were coincident and no contact normal could be derived.
    #[error("degenerate contact geometry between `{0}` and `{1}`")]
    DegenerateGeometry(String, String),

    /// A computed quantity was NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFiniteValue(&'static str),

    /// The per-step operation budget was exhausted.
    #[error("operation budget exhausted: {used} of {budget} ops used")]
    ResourceExhausted {
        /// Operations consumed when the budget ran out.
        used: u64,
        /// The configured per-step budget.
        budget: u64,
    },

    /// A mass value at or below zero was supplied and corrected.
    #[error("mass {0} is not strictly positive")]
    ZeroOrNegativeMass(f64),

    /// Joint limits were inverted or non-finite.
    #[error("invalid joint limits [{min}, {max}]")]
    InvalidJointLimits {
        /// The requested lower limit.
        min: f64,
        /// The requested upper limit.
        max: f64,
    },

    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A checkpoint or configuration document could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PhysicsError::InvalidReference("arm".to_string());
        assert_eq!(err.to_string(), "unknown body id `arm`");

        let err = PhysicsError::ResourceExhausted {
            used: 120,
            budget: 100,
        };
        assert_eq!(
            err.to_string(),
            "operation budget exhausted: 120 of 100 ops used"
        );
    }
}
