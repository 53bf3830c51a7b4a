/// Collision service consumed by the simulation core: a static sphere-collider
/// index answering overlap and closest-point queries, plus the contact
/// tracker that turns per-tick overlap sets into enter/stay events.
///
/// The index is built once from the level geometry; only the per-collider
/// enabled flag changes afterwards (flowers disable their nectar collider
/// when they empty).
use crate::math::Vec3;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::{HashMap, HashSet};
use std::{error::Error, fmt};

pub type ColliderId = u32;

/// Semantic category attached to every collider, used to route contact
/// events inside the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderKind {
    Nectar,
    Boundary,
    Obstacle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    pub collider: ColliderId,
    pub kind: ColliderKind,
    pub phase: ContactPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    DuplicateCollider(ColliderId),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::DuplicateCollider(id) => {
                write!(f, "collider id {id} registered more than once")
            }
        }
    }
}

impl Error for PhysicsError {}

#[derive(Clone, Copy, Debug)]
pub struct SphereCollider {
    pub id: ColliderId,
    pub kind: ColliderKind,
    pub center: Vec3,
    pub radius: f32,
}

impl RTreeObject for SphereCollider {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [
                self.center.x - self.radius,
                self.center.y - self.radius,
                self.center.z - self.radius,
            ],
            [
                self.center.x + self.radius,
                self.center.y + self.radius,
                self.center.z + self.radius,
            ],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapHit {
    pub collider: ColliderId,
    pub kind: ColliderKind,
}

/// R*-tree over the level's sphere colliders via bulk_load (O(n log n)).
pub struct StaticColliderIndex {
    tree: RTree<SphereCollider>,
    by_id: HashMap<ColliderId, SphereCollider>,
    disabled: HashSet<ColliderId>,
}

impl StaticColliderIndex {
    pub fn new(colliders: Vec<SphereCollider>) -> Result<Self, PhysicsError> {
        let mut by_id = HashMap::with_capacity(colliders.len());
        for c in &colliders {
            if by_id.insert(c.id, *c).is_some() {
                return Err(PhysicsError::DuplicateCollider(c.id));
            }
        }
        Ok(Self {
            tree: RTree::bulk_load(colliders),
            by_id,
            disabled: HashSet::new(),
        })
    }

    /// All enabled colliders whose volume intersects the probe sphere.
    /// AABB envelope query first, then exact sphere-sphere filtering.
    pub fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<OverlapHit> {
        let envelope = AABB::from_corners(
            [center.x - radius, center.y - radius, center.z - radius],
            [center.x + radius, center.y + radius, center.z + radius],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|c| !self.disabled.contains(&c.id))
            .filter(|c| {
                let reach = radius + c.radius;
                (c.center - center).length_sq() <= reach * reach
            })
            .map(|c| OverlapHit {
                collider: c.id,
                kind: c.kind,
            })
            .collect()
    }

    /// Closest point on the collider's volume to `point`; the point itself
    /// when it lies inside. `None` for an unknown collider.
    pub fn closest_point(&self, collider: ColliderId, point: Vec3) -> Option<Vec3> {
        let c = self.by_id.get(&collider)?;
        let offset = point - c.center;
        if offset.length_sq() <= c.radius * c.radius {
            Some(point)
        } else {
            Some(c.center + offset.normalized() * c.radius)
        }
    }

    pub fn kind(&self, collider: ColliderId) -> Option<ColliderKind> {
        self.by_id.get(&collider).map(|c| c.kind)
    }

    /// Enable or disable a collider; disabled colliders are invisible to
    /// overlap queries. Returns false for an unknown id.
    pub fn set_enabled(&mut self, collider: ColliderId, enabled: bool) -> bool {
        if !self.by_id.contains_key(&collider) {
            return false;
        }
        if enabled {
            self.disabled.remove(&collider);
        } else {
            self.disabled.insert(collider);
        }
        true
    }

    pub fn is_enabled(&self, collider: ColliderId) -> bool {
        self.by_id.contains_key(&collider) && !self.disabled.contains(&collider)
    }
}

/// Tracks which colliders a body overlapped last tick so each overlap can be
/// tagged Enter (new this tick) or Stay (continued contact).
#[derive(Default)]
pub struct ContactTracker {
    active: HashSet<ColliderId>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert this tick's overlap set into phased events and remember it
    /// for the next tick. Colliders absent from `overlaps` simply drop out.
    pub fn update(&mut self, overlaps: &[OverlapHit]) -> Vec<ContactEvent> {
        let events = overlaps
            .iter()
            .map(|hit| ContactEvent {
                collider: hit.collider,
                kind: hit.kind,
                phase: if self.active.contains(&hit.collider) {
                    ContactPhase::Stay
                } else {
                    ContactPhase::Enter
                },
            })
            .collect();
        self.active = overlaps.iter().map(|hit| hit.collider).collect();
        events
    }

    /// Forget all contacts, e.g. after teleporting the body at episode begin.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
