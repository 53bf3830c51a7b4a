use crate::area::FlowerArea;
use crate::config::SimConfig;
use crate::math::{direction_to_pitch_yaw, Quat, Vec3};
use crate::physics::StaticColliderIndex;
use rand::Rng;
use std::{error::Error, fmt};

/// A roll-free spawn pose. Pitch/yaw are kept as scalars because the agent's
/// rotation state is pitch/yaw, not a free quaternion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub pitch_deg: f32,
    pub yaw_deg: f32,
}

impl Pose {
    pub fn rotation(&self) -> Quat {
        Quat::from_pitch_yaw_deg(self.pitch_deg, self.yaw_deg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Anchored placement needs at least one flower in the area.
    NoFlowers,
    /// No collision-free pose found within the sampling budget. The caller
    /// decides whether to retry, widen bounds, or skip the episode.
    AttemptsExhausted { attempts: u32 },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::NoFlowers => {
                write!(f, "cannot anchor a spawn pose: area has no flowers")
            }
            PlacementError::AttemptsExhausted { attempts } => {
                write!(f, "no collision-free spawn pose after {attempts} attempts")
            }
        }
    }
}

impl Error for PlacementError {}

/// Rejection-sample a collision-free pose for an agent.
///
/// Anchored mode picks any flower (full or empty) and places the agent a
/// short distance along the flower's up axis, beak pointed at the nectar.
/// Free mode places the agent on a random horizontal circle above the area
/// with a random attitude. A candidate is accepted iff no obstacle overlaps
/// the probe sphere around it.
pub fn safe_random_pose<R: Rng + ?Sized>(
    config: &SimConfig,
    area: &FlowerArea,
    colliders: &StaticColliderIndex,
    in_front_of_flower: bool,
    rng: &mut R,
) -> Result<Pose, PlacementError> {
    if in_front_of_flower && area.flower_count() == 0 {
        return Err(PlacementError::NoFlowers);
    }

    for _ in 0..config.spawn_attempts {
        let candidate = if in_front_of_flower {
            let flower = &area.flowers()[rng.random_range(0..area.flower_count())];
            let (min_d, max_d) = config.spawn_flower_distance;
            let distance = rng.random_range(min_d..max_d);
            let position = flower.center_position() + flower.up_vector() * distance;
            let (pitch_deg, yaw_deg) = direction_to_pitch_yaw(flower.center_position() - position);
            Pose {
                position,
                pitch_deg,
                yaw_deg,
            }
        } else {
            let (min_h, max_h) = config.spawn_height;
            let (min_r, max_r) = config.spawn_radius;
            let height = rng.random_range(min_h..max_h);
            let radius = rng.random_range(min_r..max_r);
            let bearing = rng.random_range(-180.0f32..180.0);
            let offset = Quat::from_pitch_yaw_deg(0.0, bearing).rotate(Vec3::FORWARD) * radius;
            Pose {
                position: area.center() + Vec3::UP * height + offset,
                pitch_deg: rng.random_range(-config.spawn_max_pitch_deg..config.spawn_max_pitch_deg),
                yaw_deg: rng.random_range(-180.0f32..180.0),
            }
        };

        if colliders
            .overlap_sphere(candidate.position, config.spawn_probe_radius)
            .is_empty()
        {
            return Ok(candidate);
        }
    }

    Err(PlacementError::AttemptsExhausted {
        attempts: config.spawn_attempts,
    })
}
