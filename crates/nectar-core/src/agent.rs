use crate::area::{AreaError, FlowerArea};
use crate::config::{SimConfig, SimConfigError};
use crate::flower::FlowerError;
use crate::math::{clamp01, move_towards, wrap_angle_deg, Quat, Vec3};
use crate::physics::{ColliderKind, ContactEvent, ContactPhase, StaticColliderIndex};
use crate::spawn::{self, PlacementError};
use rand::Rng;
use std::{error::Error, fmt};

/// Length of the action vector consumed each step: world-space force (3)
/// plus desired pitch/yaw rates (2).
pub const ACTION_SIZE: usize = 5;

/// Length of the observation vector: local rotation (4), normalized
/// beak-to-flower direction (3), approach and alignment dot products (2),
/// normalized distance (1). The layout is a contract with external policy
/// code and must not be reordered.
pub const OBSERVATION_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Freeze/unfreeze would corrupt the training reward/episode contract.
    TrainingMode,
    Flower(FlowerError),
    Area(AreaError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::TrainingMode => {
                write!(f, "freeze/unfreeze is not supported in training mode")
            }
            AgentError::Flower(e) => write!(f, "{e}"),
            AgentError::Area(e) => write!(f, "{e}"),
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AgentError::TrainingMode => None,
            AgentError::Flower(e) => Some(e),
            AgentError::Area(e) => Some(e),
        }
    }
}

impl From<FlowerError> for AgentError {
    fn from(e: FlowerError) -> Self {
        AgentError::Flower(e)
    }
}

impl From<AreaError> for AgentError {
    fn from(e: AreaError) -> Self {
        AgentError::Area(e)
    }
}

/// One foraging hummingbird: consumes action vectors, produces observations
/// and rewards, and feeds from flowers on gated contact events.
///
/// The current target is held as an index into the area's flower list, never
/// an owning reference; it may go stale between recomputations and is
/// refreshed reactively.
pub struct Agent {
    pub(crate) config: SimConfig,
    training: bool,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) pitch_deg: f32,
    pub(crate) yaw_deg: f32,
    smooth_pitch_change: f32,
    smooth_yaw_change: f32,
    nectar_obtained: f32,
    cumulative_reward: f32,
    frozen: bool,
    nearest_flower: Option<usize>,
}

impl Agent {
    pub fn new(config: SimConfig, training: bool) -> Result<Self, SimConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            training,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            pitch_deg: 0.0,
            yaw_deg: 0.0,
            smooth_pitch_change: 0.0,
            smooth_yaw_change: 0.0,
            nectar_obtained: 0.0,
            cumulative_reward: 0.0,
            frozen: false,
            nearest_flower: None,
        })
    }

    pub fn training(&self) -> bool {
        self.training
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_pitch_yaw_deg(self.pitch_deg, self.yaw_deg)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation().rotate(Vec3::FORWARD)
    }

    /// World position of the beak tip, the agent's interaction point.
    pub fn beak_tip_position(&self) -> Vec3 {
        self.position + self.rotation().rotate(self.config.beak_tip_offset)
    }

    /// Radius of the body collider used for overlap queries.
    pub fn body_radius(&self) -> f32 {
        self.config.body_radius
    }

    /// Nectar extracted so far this episode.
    pub fn nectar_obtained(&self) -> f32 {
        self.nectar_obtained
    }

    /// Reward accumulated so far this episode (training mode only).
    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Index of the current target flower, if any.
    pub fn nearest_flower(&self) -> Option<usize> {
        self.nearest_flower
    }

    /// Reset for a new episode: in training mode the shared area is reset
    /// here (in play mode only the orchestrator resets it), kinematics and
    /// totals are zeroed, a safe spawn pose is sampled, and the target is
    /// recomputed.
    ///
    /// Training mode anchors the spawn to a flower 50% of the time; demo
    /// mode always anchors so the bird starts facing a flower.
    pub fn on_episode_begin<R: Rng + ?Sized>(
        &mut self,
        area: &mut FlowerArea,
        colliders: &StaticColliderIndex,
        rng: &mut R,
    ) -> Result<(), PlacementError> {
        if self.training {
            area.reset_flowers(rng);
        }
        self.nectar_obtained = 0.0;
        self.cumulative_reward = 0.0;
        self.velocity = Vec3::ZERO;
        self.smooth_pitch_change = 0.0;
        self.smooth_yaw_change = 0.0;

        let in_front_of_flower = if self.training {
            rng.random::<f32>() > 0.5
        } else {
            true
        };
        let pose = spawn::safe_random_pose(&self.config, area, colliders, in_front_of_flower, rng)?;
        self.position = pose.position;
        self.pitch_deg = pose.pitch_deg;
        self.yaw_deg = pose.yaw_deg;

        self.update_nearest_flower(area);
        Ok(())
    }

    /// Advance one fixed timestep with the given action vector.
    ///
    /// action[0..3]: world-space force direction (x, y, z), each in [-1, 1].
    /// action[3]:    desired pitch rate. action[4]: desired yaw rate. Both
    /// are rate-limited toward the request, pitch clamped to prevent
    /// inversion, yaw free.
    pub fn step(&mut self, action: [f32; ACTION_SIZE], area: &FlowerArea) {
        // Reactive staleness check: never carry an exhausted target into the
        // next observation.
        if let Some(idx) = self.nearest_flower {
            let stale = area.flower(idx).map(|f| !f.has_nectar()).unwrap_or(true);
            if stale {
                self.update_nearest_flower(area);
            }
        }

        if self.frozen {
            return;
        }
        let dt = self.config.dt;

        let force = Vec3::new(action[0], action[1], action[2]) * self.config.move_force;
        self.velocity += force * dt;
        self.position += self.velocity * dt;

        self.smooth_pitch_change = move_towards(
            self.smooth_pitch_change,
            action[3],
            self.config.rotation_smoothing_rate * dt,
        );
        self.smooth_yaw_change = move_towards(
            self.smooth_yaw_change,
            action[4],
            self.config.rotation_smoothing_rate * dt,
        );

        let pitch = self.pitch_deg + self.smooth_pitch_change * dt * self.config.pitch_speed;
        self.pitch_deg =
            wrap_angle_deg(pitch).clamp(-self.config.max_pitch_deg, self.config.max_pitch_deg);
        self.yaw_deg =
            wrap_angle_deg(self.yaw_deg + self.smooth_yaw_change * dt * self.config.yaw_speed);
    }

    /// Collect the 10-element observation vector. With no target the vector
    /// is all zeros; that is the defined degenerate case, not a failure.
    pub fn observe(&self, area: &FlowerArea) -> [f32; OBSERVATION_SIZE] {
        let Some(flower) = self.nearest_flower.and_then(|idx| area.flower(idx).ok()) else {
            return [0.0; OBSERVATION_SIZE];
        };

        let rotation = self.rotation().normalized();
        let beak_tip = self.beak_tip_position();
        let to_flower = flower.center_position() - beak_tip;
        let to_flower_unit = to_flower.normalized();
        let flower_down = -flower.up_vector();

        [
            rotation.x,
            rotation.y,
            rotation.z,
            rotation.w,
            to_flower_unit.x,
            to_flower_unit.y,
            to_flower_unit.z,
            to_flower_unit.dot(flower_down),
            self.forward().dot(flower_down),
            to_flower.length() / FlowerArea::AREA_DIAMETER,
        ]
    }

    /// Handle an overlap event from the collision service.
    ///
    /// Nectar contacts feed only when the closest point of the nectar volume
    /// lies within the beak-tip tolerance, so a wing brushing the flower
    /// does not count. Boundary contacts penalize once per Enter event.
    pub fn on_contact(
        &mut self,
        event: ContactEvent,
        area: &mut FlowerArea,
        colliders: &StaticColliderIndex,
    ) -> Result<(), AgentError> {
        match event.kind {
            ColliderKind::Nectar => self.try_feed(event, area, colliders),
            ColliderKind::Boundary => {
                if self.training && event.phase == ContactPhase::Enter {
                    self.cumulative_reward += self.config.boundary_penalty;
                }
                Ok(())
            }
            ColliderKind::Obstacle => Ok(()),
        }
    }

    fn try_feed(
        &mut self,
        event: ContactEvent,
        area: &mut FlowerArea,
        colliders: &StaticColliderIndex,
    ) -> Result<(), AgentError> {
        let beak_tip = self.beak_tip_position();
        let closest = colliders
            .closest_point(event.collider, beak_tip)
            .ok_or(AreaError::UnknownCollider(event.collider))?;
        if beak_tip.distance(closest) >= self.config.beak_tip_radius {
            return Ok(());
        }

        let idx = area.flower_from_nectar(event.collider)?;

        // Alignment is measured against the current target when one exists.
        let shaping_up = self
            .nearest_flower
            .and_then(|t| area.flower(t).ok())
            .map(|f| f.up_vector())
            .unwrap_or_else(|| {
                area.flower(idx)
                    .map(|f| f.up_vector())
                    .unwrap_or(Vec3::UP)
            });

        let flower = area.flower_mut(idx)?;
        let taken = flower.feed(self.config.nectar_per_feed)?;
        self.nectar_obtained += taken;

        if self.training {
            let bonus =
                self.config.alignment_bonus * clamp01(self.forward().dot(-shaping_up));
            self.cumulative_reward += self.config.feed_reward + bonus;
        }

        if !area.flower(idx)?.has_nectar() {
            self.update_nearest_flower(area);
        }
        Ok(())
    }

    /// Pause the agent: no actions are applied and the body is forced to
    /// rest so it cannot drift. Only valid outside training.
    pub fn freeze(&mut self) -> Result<(), AgentError> {
        if self.training {
            return Err(AgentError::TrainingMode);
        }
        self.frozen = true;
        self.velocity = Vec3::ZERO;
        self.smooth_pitch_change = 0.0;
        self.smooth_yaw_change = 0.0;
        Ok(())
    }

    pub fn unfreeze(&mut self) -> Result<(), AgentError> {
        if self.training {
            return Err(AgentError::TrainingMode);
        }
        self.frozen = false;
        Ok(())
    }

    /// Recompute the target: the flower with nectar closest to the beak tip.
    /// Active flowers always beat inactive ones; with none active the target
    /// clears to `None`.
    pub fn update_nearest_flower(&mut self, area: &FlowerArea) {
        let beak_tip = self.beak_tip_position();
        self.nearest_flower = area
            .flowers()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.has_nectar())
            .min_by(|(_, a), (_, b)| {
                a.center_position()
                    .distance(beak_tip)
                    .total_cmp(&b.center_position().distance(beak_tip))
            })
            .map(|(idx, _)| idx);
    }
}
