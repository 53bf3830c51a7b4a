//! Competitive nectar-foraging simulation core.
//!
//! Two hummingbird agents share a bounded flower area, extract nectar
//! through proximity-gated feeding, and (in training mode) accumulate a
//! shaped reward signal. The crate owns the per-step simulation loop;
//! rendering, UI and policy/training infrastructure live elsewhere and talk
//! to it through action vectors, observation vectors and contact events.

pub mod agent;
pub mod area;
pub mod config;
pub mod flower;
pub mod game;
pub mod math;
pub mod physics;
pub mod spawn;

pub use agent::{Agent, AgentError, ACTION_SIZE, OBSERVATION_SIZE};
pub use area::{AreaError, FlowerArea, FlowerSpec, NodeTag, PlantRotation, SceneNode};
pub use config::{SimConfig, SimConfigError};
pub use flower::{Flower, FlowerError, FlowerVisual};
pub use game::{Match, MatchConfig, MatchError, MatchState, MatchSummary, Winner};
pub use math::{Quat, Vec3};
pub use physics::{
    ColliderId, ColliderKind, ContactEvent, ContactPhase, ContactTracker, PhysicsError,
    SphereCollider, StaticColliderIndex,
};
pub use spawn::{safe_random_pose, PlacementError, Pose};
