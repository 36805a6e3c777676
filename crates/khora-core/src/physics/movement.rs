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

//! The movement-resolution contract.
//!
//! The scheduler treats movement resolution as opaque: it only decides when
//! `unstick` and `move_*` run and under which locks.

use super::{PhysicsProvider, ProjectileFrameData, Ray, RayFilter, WorldFrameData};
use super::frame::ActorFrameData;

/// Resolves the motion of simulated objects against the physics engine.
///
/// Implementations are shared by every worker of the job system and must not
/// keep per-call mutable state.
pub trait MovementSolver: Send + Sync {
    /// Frees an actor that got embedded in geometry. Runs once per step on
    /// the orchestrator thread, before the movement jobs.
    fn unstick(&self, frame: &mut ActorFrameData, provider: &dyn PhysicsProvider);

    /// Advances one actor by `dt`. Runs on a worker thread.
    fn move_actor(
        &self,
        frame: &mut ActorFrameData,
        dt: f32,
        provider: &dyn PhysicsProvider,
        world: &WorldFrameData,
    );

    /// Advances one projectile by `dt` with a swept ray, stopping at the
    /// first hit. Projectiles that already hit stay put.
    fn move_projectile(
        &self,
        frame: &mut ProjectileFrameData,
        dt: f32,
        provider: &dyn PhysicsProvider,
        _world: &WorldFrameData,
    ) {
        if frame.has_hit() {
            return;
        }

        let target = frame.position + frame.velocity * dt;
        let Some((ray, distance)) = Ray::between(frame.position, target) else {
            return;
        };

        let mut filter = RayFilter::new(frame.mask);
        if let Some(caster) = frame.caster {
            filter = filter.excluding(caster);
        }

        match provider.cast_ray(&ray, distance, &filter) {
            Ok(Some(hit)) => {
                frame.position = hit.point;
                frame.hit = Some(hit);
            }
            Ok(None) => frame.position = target,
            Err(e) => {
                log::trace!("Projectile sweep failed ({e}), moving unobstructed");
                frame.position = target;
            }
        }
    }
}
