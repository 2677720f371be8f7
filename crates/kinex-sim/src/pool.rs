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

//! Reuse of body allocations on embedded targets.

use kinex_core::physics::PhysicsBody;

/// A bounded free-list of removed bodies.
#[derive(Debug, Clone)]
pub struct ObjectPool {
    free: Vec<PhysicsBody>,
    capacity: usize,
}

impl ObjectPool {
    /// Creates an empty pool holding at most `capacity` bodies.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Takes a pooled body, reset and renamed to `id`.
    ///
    /// Returns `None` when the pool is empty; the caller then constructs a
    /// fresh body.
    pub fn get(&mut self, id: impl Into<String>) -> Option<PhysicsBody> {
        self.free.pop().map(|body| body.recycle(id))
    }

    /// Resets `body` and returns it to the pool.
    ///
    /// Returns `false` when the pool is full, in which case the body is dropped.
    pub fn release(&mut self, mut body: PhysicsBody) -> bool {
        if self.free.len() >= self.capacity {
            return false;
        }
        body.reset_motion();
        self.free.push(body);
        true
    }

    /// Number of bodies waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Maximum number of pooled bodies.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every pooled body.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinex_core::math::Vec3;

    #[test]
    fn test_released_bodies_come_back_reset() {
        let mut pool = ObjectPool::new(4);
        assert!(pool.get("a").is_none());

        let mut body = PhysicsBody::robot_arm("old", Vec3::ONE).with_velocity(Vec3::X);
        body.acceleration = Vec3::Y;
        body.joint.torque = 2.0;
        assert!(pool.release(body));
        assert_eq!(pool.available(), 1);

        let reused = pool.get("new").unwrap();
        assert_eq!(reused.id(), "new");
        assert_eq!(reused.velocity, Vec3::ZERO);
        assert_eq!(reused.acceleration, Vec3::ZERO);
        assert_eq!(reused.joint.torque, 0.0);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_full_pool_drops_bodies() {
        let mut pool = ObjectPool::new(1);
        assert!(pool.release(PhysicsBody::dynamic("a", Vec3::ZERO, Vec3::ONE, 1.0)));
        assert!(!pool.release(PhysicsBody::dynamic("b", Vec3::ZERO, Vec3::ONE, 1.0)));
        assert_eq!(pool.available(), pool.capacity());
    }
}
