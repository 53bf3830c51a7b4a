use crate::math::Vec3;
use crate::physics::ColliderId;
use std::{error::Error, fmt};

/// Visual state tag mirrored to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowerVisual {
    Full,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowerError {
    /// `feed` requires a non-negative, finite amount.
    InvalidAmount(f32),
}

impl fmt::Display for FlowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowerError::InvalidAmount(amount) => {
                write!(f, "feed amount must be finite and >= 0, got {amount}")
            }
        }
    }
}

impl Error for FlowerError {}

/// A single depletable flower. Nectar is refilled only by `reset`; the
/// collider-enabled flag and visual tag are derived from the nectar level.
#[derive(Clone, Debug)]
pub struct Flower {
    nectar: f32,
    center: Vec3,
    up: Vec3,
    nectar_collider: ColliderId,
    colliders_enabled: bool,
    visual: FlowerVisual,
}

impl Flower {
    pub const FULL_NECTAR: f32 = 1.0;

    pub fn new(center: Vec3, up: Vec3, nectar_collider: ColliderId) -> Self {
        Self {
            nectar: Self::FULL_NECTAR,
            center,
            up: up.normalized(),
            nectar_collider,
            colliders_enabled: true,
            visual: FlowerVisual::Full,
        }
    }

    /// Center of the nectar collider, the point the agent feeds at.
    pub fn center_position(&self) -> Vec3 {
        self.center
    }

    /// Unit normal pointing straight out of the flower.
    pub fn up_vector(&self) -> Vec3 {
        self.up
    }

    pub fn nectar_amount(&self) -> f32 {
        self.nectar
    }

    pub fn has_nectar(&self) -> bool {
        self.nectar > 0.0
    }

    pub fn nectar_collider(&self) -> ColliderId {
        self.nectar_collider
    }

    pub fn colliders_enabled(&self) -> bool {
        self.colliders_enabled
    }

    pub fn visual(&self) -> FlowerVisual {
        self.visual
    }

    /// Attempt to extract nectar. Returns the amount actually taken, clamped
    /// to what was available before the call.
    ///
    /// The internal level is decremented by the full requested amount, not by
    /// the taken amount: overshoot drives the flower to exactly empty rather
    /// than clamping the subtraction. Changing this would alter reward totals.
    pub fn feed(&mut self, amount: f32) -> Result<f32, FlowerError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FlowerError::InvalidAmount(amount));
        }
        let taken = amount.clamp(0.0, self.nectar);
        self.nectar -= amount;
        if self.nectar <= 0.0 {
            self.nectar = 0.0;
            self.colliders_enabled = false;
            self.visual = FlowerVisual::Empty;
        }
        Ok(taken)
    }

    /// Refill the flower and re-enable its colliders.
    pub fn reset(&mut self) {
        self.nectar = Self::FULL_NECTAR;
        self.colliders_enabled = true;
        self.visual = FlowerVisual::Full;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flower() -> Flower {
        Flower::new(Vec3::new(1.0, 2.0, 3.0), Vec3::UP, 7)
    }

    #[test]
    fn feed_returns_clamped_taken_and_subtracts_requested() {
        let mut f = flower();
        let taken = f.feed(0.3).unwrap();
        assert!((taken - 0.3).abs() < 1e-6);
        assert!((f.nectar_amount() - 0.7).abs() < 1e-6);

        // Overshoot: only the remainder is reported taken, level hits zero.
        let taken = f.feed(2.0).unwrap();
        assert!((taken - 0.7).abs() < 1e-6);
        assert_eq!(f.nectar_amount(), 0.0);
        assert!(!f.has_nectar());
        assert!(!f.colliders_enabled());
        assert_eq!(f.visual(), FlowerVisual::Empty);
    }

    #[test]
    fn feed_at_zero_is_idempotent() {
        let mut f = flower();
        f.feed(1.0).unwrap();
        assert_eq!(f.nectar_amount(), 0.0);
        for amount in [0.0, 0.01, 5.0] {
            assert_eq!(f.feed(amount).unwrap(), 0.0);
            assert_eq!(f.nectar_amount(), 0.0);
        }
    }

    #[test]
    fn feed_rejects_negative_and_non_finite_amounts() {
        let mut f = flower();
        assert!(matches!(f.feed(-0.1), Err(FlowerError::InvalidAmount(_))));
        assert!(matches!(
            f.feed(f32::NAN),
            Err(FlowerError::InvalidAmount(_))
        ));
        // A rejected call must not change state.
        assert_eq!(f.nectar_amount(), Flower::FULL_NECTAR);
    }

    #[test]
    fn reset_restores_full_state_from_any_prior_state() {
        let mut f = flower();
        f.reset();
        assert_eq!(f.nectar_amount(), Flower::FULL_NECTAR);

        f.feed(5.0).unwrap();
        assert!(!f.has_nectar());
        f.reset();
        assert_eq!(f.nectar_amount(), Flower::FULL_NECTAR);
        assert!(f.has_nectar());
        assert!(f.colliders_enabled());
        assert_eq!(f.visual(), FlowerVisual::Full);
    }

    #[test]
    fn depletion_ledger_matches_clamp_behavior() {
        // Drain to 0.1, then nine 0.01 feeds and one 0.05 overshoot.
        let mut f = flower();
        f.feed(0.9).unwrap();
        let mut total_taken = 0.0;
        for _ in 0..9 {
            total_taken += f.feed(0.01).unwrap();
        }
        let last = f.feed(0.05).unwrap();
        total_taken += last;

        assert!((last - 0.01).abs() < 1e-5, "final feed reports remainder");
        assert_eq!(f.nectar_amount(), 0.0);
        assert!(!f.has_nectar());
        assert!((total_taken - 0.10).abs() < 1e-5);
    }
}
