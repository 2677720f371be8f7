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

use kinex_core::physics::PhysicsBody;

/// Bodies of one world, kept sorted by id.
///
/// The ordering makes every pass over the registry (integration, pair
/// enumeration, snapshots) deterministic regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct BodyRegistry {
    bodies: Vec<PhysicsBody>,
}

impl BodyRegistry {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.bodies.binary_search_by(|b| b.id().cmp(id)).ok()
    }

    pub fn get(&self, id: &str) -> Option<&PhysicsBody> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PhysicsBody> {
        self.index_of(id).map(move |i| &mut self.bodies[i])
    }

    /// Inserts `body`, returning the body it replaced, if any.
    pub fn insert(&mut self, body: PhysicsBody) -> Option<PhysicsBody> {
        match self.bodies.binary_search_by(|b| b.id().cmp(body.id())) {
            Ok(i) => Some(std::mem::replace(&mut self.bodies[i], body)),
            Err(i) => {
                self.bodies.insert(i, body);
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<PhysicsBody> {
        self.index_of(id).map(|i| self.bodies.remove(i))
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn as_slice(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    pub fn as_mut_slice(&mut self) -> &mut [PhysicsBody] {
        &mut self.bodies
    }

    /// Mutable access to two distinct bodies. `i` must be less than `j`.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> (&mut PhysicsBody, &mut PhysicsBody) {
        debug_assert!(i < j);
        let (head, tail) = self.bodies.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    }
}
