use crate::components::{BOUNDS, Kinematics};

/// Velocity scale applied to a user force when it is applied.
pub const FORCE_SCALE: f32 = 0.01;

pub struct PhysicsSystem {
    gravity: f32, // per tick, downward
}

impl PhysicsSystem {
    pub fn new() -> Self {
        Self { gravity: 0.01 }
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Run one fixed tick: semi-implicit Euler, then clamp to the bounding box.
    pub fn step(&self, body: &mut Kinematics) {
        if body.gravity_enabled {
            body.velocity[1] -= self.gravity;
        }

        for axis in 0..2 {
            body.position[axis] += body.velocity[axis];

            // Inelastic: stop dead on contact.
            if body.position[axis] > BOUNDS {
                body.position[axis] = BOUNDS;
                body.velocity[axis] = 0.0;
            } else if body.position[axis] < -BOUNDS {
                body.position[axis] = -BOUNDS;
                body.velocity[axis] = 0.0;
            }
        }
    }

    /// Replaces the velocity with the scaled force.
    pub fn apply_force(&self, body: &mut Kinematics, force: [f32; 2]) {
        body.velocity = [force[0] * FORCE_SCALE, force[1] * FORCE_SCALE];
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a numeric force field. Anything non-numeric counts as zero.
pub fn parse_force(input: &str) -> f32 {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
