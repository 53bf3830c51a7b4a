use crate::flower::Flower;
use crate::math::Vec3;
use crate::physics::ColliderId;
use rand::Rng;
use std::collections::HashMap;
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaError {
    /// Nectar collider not registered during discovery.
    UnknownCollider(ColliderId),
    /// Two flowers in the scene claim the same nectar collider.
    DuplicateCollider(ColliderId),
    /// Flower index out of range (stale back-reference misuse).
    InvalidFlowerIndex(usize),
}

impl fmt::Display for AreaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaError::UnknownCollider(id) => {
                write!(f, "no flower registered for nectar collider {id}")
            }
            AreaError::DuplicateCollider(id) => {
                write!(f, "nectar collider {id} claimed by more than one flower")
            }
            AreaError::InvalidFlowerIndex(idx) => write!(f, "flower index {idx} out of range"),
        }
    }
}

impl Error for AreaError {}

/// Geometry a scene node contributes when discovery records it as a flower.
#[derive(Clone, Copy, Debug)]
pub struct FlowerSpec {
    pub center: Vec3,
    pub up: Vec3,
    pub nectar_collider: ColliderId,
}

#[derive(Clone, Debug)]
pub enum NodeTag {
    /// A flower plant: recorded for cosmetic re-orientation, and its subtree
    /// is still searched (plants can nest).
    FlowerPlant,
    /// A flower: recorded, and its subtree is NOT searched (flowers are
    /// leaves, never nested inside one another).
    Flower(FlowerSpec),
    /// Anything else: searched recursively.
    Other,
}

/// One node of the level hierarchy handed to `FlowerArea::from_scene`.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub tag: NodeTag,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(children: Vec<SceneNode>) -> Self {
        Self {
            tag: NodeTag::Other,
            children,
        }
    }

    pub fn plant(children: Vec<SceneNode>) -> Self {
        Self {
            tag: NodeTag::FlowerPlant,
            children,
        }
    }

    pub fn flower(spec: FlowerSpec) -> Self {
        Self {
            tag: NodeTag::Flower(spec),
            children: Vec::new(),
        }
    }
}

/// Cosmetic orientation of one flower plant, euler degrees (x, y, z).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlantRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The collection of flower plants and flowers in one play area.
///
/// Built once when the level loads; `reset_flowers` is the only later
/// mutation of the collection itself (flower contents change via `feed`).
pub struct FlowerArea {
    center: Vec3,
    plants: Vec<PlantRotation>,
    flowers: Vec<Flower>,
    nectar_lookup: HashMap<ColliderId, usize>,
}

impl FlowerArea {
    /// Diameter of the area, used to normalize observed distances.
    pub const AREA_DIAMETER: f32 = 20.0;

    /// Discover plants and flowers by walking the scene hierarchy.
    ///
    /// The recursion is deliberately asymmetric: a plant's subtree is still
    /// searched (nested plants contribute their flowers), while a flower's
    /// subtree is skipped. Flattening this into uniform recursion would
    /// change the discovered set.
    pub fn from_scene(center: Vec3, root: &SceneNode) -> Result<Self, AreaError> {
        let mut area = Self {
            center,
            plants: Vec::new(),
            flowers: Vec::new(),
            nectar_lookup: HashMap::new(),
        };
        area.discover(root)?;
        Ok(area)
    }

    fn discover(&mut self, parent: &SceneNode) -> Result<(), AreaError> {
        for child in &parent.children {
            match &child.tag {
                NodeTag::FlowerPlant => {
                    self.plants.push(PlantRotation::default());
                    self.discover(child)?;
                }
                NodeTag::Flower(spec) => {
                    let idx = self.flowers.len();
                    if self
                        .nectar_lookup
                        .insert(spec.nectar_collider, idx)
                        .is_some()
                    {
                        return Err(AreaError::DuplicateCollider(spec.nectar_collider));
                    }
                    self.flowers
                        .push(Flower::new(spec.center, spec.up, spec.nectar_collider));
                }
                NodeTag::Other => self.discover(child)?,
            }
        }
        Ok(())
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn flowers(&self) -> &[Flower] {
        &self.flowers
    }

    pub fn flower_count(&self) -> usize {
        self.flowers.len()
    }

    pub fn flower(&self, idx: usize) -> Result<&Flower, AreaError> {
        self.flowers.get(idx).ok_or(AreaError::InvalidFlowerIndex(idx))
    }

    pub fn flower_mut(&mut self, idx: usize) -> Result<&mut Flower, AreaError> {
        self.flowers
            .get_mut(idx)
            .ok_or(AreaError::InvalidFlowerIndex(idx))
    }

    /// Resolve a nectar collider to the index of its owning flower.
    pub fn flower_from_nectar(&self, collider: ColliderId) -> Result<usize, AreaError> {
        self.nectar_lookup
            .get(&collider)
            .copied()
            .ok_or(AreaError::UnknownCollider(collider))
    }

    pub fn plant_rotations(&self) -> &[PlantRotation] {
        &self.plants
    }

    /// Re-randomize the cosmetic plant orientations (wide spin around Y,
    /// subtle lean on X and Z) and refill every flower.
    pub fn reset_flowers<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for plant in &mut self.plants {
            plant.x = rng.random_range(-5.0f32..5.0);
            plant.y = rng.random_range(-180.0f32..180.0);
            plant.z = rng.random_range(-5.0f32..5.0);
        }
        for flower in &mut self.flowers {
            flower.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn spec(id: ColliderId) -> FlowerSpec {
        FlowerSpec {
            center: Vec3::new(id as f32, 1.0, 0.0),
            up: Vec3::UP,
            nectar_collider: id,
        }
    }

    /// Plant containing two flowers plus a nested plant with one more.
    fn nested_scene() -> SceneNode {
        SceneNode::group(vec![
            SceneNode::plant(vec![
                SceneNode::flower(spec(1)),
                SceneNode::flower(spec(2)),
                SceneNode::plant(vec![SceneNode::flower(spec(3))]),
            ]),
            SceneNode::group(vec![SceneNode::flower(spec(4))]),
        ])
    }

    #[test]
    fn discovery_recurses_into_plants_but_not_flowers() {
        let area = FlowerArea::from_scene(Vec3::ZERO, &nested_scene()).unwrap();
        assert_eq!(area.flower_count(), 4);
        assert_eq!(area.plant_rotations().len(), 2);

        // A flower subtree is never searched: this nested flower is ignored.
        let mut shadowed = SceneNode::flower(spec(10));
        shadowed.children.push(SceneNode::flower(spec(11)));
        let root = SceneNode::group(vec![shadowed]);
        let area = FlowerArea::from_scene(Vec3::ZERO, &root).unwrap();
        assert_eq!(area.flower_count(), 1);
        assert!(area.flower_from_nectar(11).is_err());
    }

    #[test]
    fn lookup_maps_each_collider_to_its_flower() {
        let area = FlowerArea::from_scene(Vec3::ZERO, &nested_scene()).unwrap();
        for id in 1..=4 {
            let idx = area.flower_from_nectar(id).unwrap();
            assert_eq!(area.flower(idx).unwrap().nectar_collider(), id);
        }
        assert!(matches!(
            area.flower_from_nectar(99),
            Err(AreaError::UnknownCollider(99))
        ));
    }

    #[test]
    fn duplicate_nectar_collider_is_rejected() {
        let root = SceneNode::group(vec![
            SceneNode::flower(spec(5)),
            SceneNode::flower(spec(5)),
        ]);
        assert!(matches!(
            FlowerArea::from_scene(Vec3::ZERO, &root),
            Err(AreaError::DuplicateCollider(5))
        ));
    }

    #[test]
    fn reset_refills_flowers_and_samples_rotations_in_range() {
        let mut area = FlowerArea::from_scene(Vec3::ZERO, &nested_scene()).unwrap();
        let idx = area.flower_from_nectar(1).unwrap();
        area.flower_mut(idx).unwrap().feed(5.0).unwrap();
        assert!(!area.flower(idx).unwrap().has_nectar());

        let mut rng = ChaCha12Rng::seed_from_u64(7);
        area.reset_flowers(&mut rng);

        assert!(area.flowers().iter().all(|f| f.has_nectar()));
        for rot in area.plant_rotations() {
            assert!((-5.0..5.0).contains(&rot.x));
            assert!((-180.0..180.0).contains(&rot.y));
            assert!((-5.0..5.0).contains(&rot.z));
        }
    }

    #[test]
    fn reset_is_deterministic_for_a_fixed_seed() {
        let mut a = FlowerArea::from_scene(Vec3::ZERO, &nested_scene()).unwrap();
        let mut b = FlowerArea::from_scene(Vec3::ZERO, &nested_scene()).unwrap();
        let mut rng_a = ChaCha12Rng::seed_from_u64(42);
        let mut rng_b = ChaCha12Rng::seed_from_u64(42);
        a.reset_flowers(&mut rng_a);
        b.reset_flowers(&mut rng_b);
        assert_eq!(a.plant_rotations(), b.plant_rotations());
    }
}
