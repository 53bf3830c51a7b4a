/// Match orchestration: a thin state machine over the simulation core that
/// sequences menu, countdown, play and game-over, and decides termination
/// from the agents' accumulated nectar and the match timer.
///
/// The countdown is modeled as explicit tick-counted delayed transitions;
/// the core itself never suspends.
use crate::agent::{Agent, AgentError, ACTION_SIZE};
use crate::area::FlowerArea;
use crate::config::{SimConfig, SimConfigError};
use crate::math::clamp01;
use crate::physics::{ContactTracker, StaticColliderIndex};
use crate::spawn::PlacementError;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    MainMenu,
    Preparing { ticks_remaining: u32 },
    Playing { ticks_remaining: u32 },
    GameOver { winner: Winner },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    Config(SimConfigError),
    Placement(PlacementError),
    Agent(AgentError),
    /// `start` is only valid from the main menu.
    StartOutsideMainMenu,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::Config(e) => write!(f, "{e}"),
            MatchError::Placement(e) => write!(f, "{e}"),
            MatchError::Agent(e) => write!(f, "{e}"),
            MatchError::StartOutsideMainMenu => {
                write!(f, "match can only start from the main menu")
            }
        }
    }
}

impl Error for MatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MatchError::Config(e) => Some(e),
            MatchError::Placement(e) => Some(e),
            MatchError::Agent(e) => Some(e),
            MatchError::StartOutsideMainMenu => None,
        }
    }
}

impl From<SimConfigError> for MatchError {
    fn from(e: SimConfigError) -> Self {
        MatchError::Config(e)
    }
}

impl From<PlacementError> for MatchError {
    fn from(e: PlacementError) -> Self {
        MatchError::Placement(e)
    }
}

impl From<AgentError> for MatchError {
    fn from(e: AgentError) -> Self {
        MatchError::Agent(e)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The match ends when either agent collects this much nectar.
    pub max_nectar: f32,
    /// Play time limit in seconds.
    pub time_limit_secs: f32,
    /// Countdown length before play begins, seconds.
    pub countdown_secs: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_nectar: 8.0,
            time_limit_secs: 60.0,
            countdown_secs: 4.0,
        }
    }
}

/// End-of-match record for logging and the CLI's JSON output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSummary {
    pub ticks_played: u32,
    pub player_nectar: f32,
    pub opponent_nectar: f32,
    pub winner: Option<Winner>,
}

/// A two-agent competitive match over one shared flower area.
pub struct Match {
    match_config: MatchConfig,
    dt: f32,
    area: FlowerArea,
    colliders: StaticColliderIndex,
    player: Agent,
    opponent: Agent,
    player_contacts: ContactTracker,
    opponent_contacts: ContactTracker,
    rng: ChaCha12Rng,
    state: MatchState,
    ticks_played: u32,
}

impl Match {
    /// Both agents run in play mode: the orchestrator is the only authority
    /// that resets the shared area, and freezing must stay legal.
    pub fn new(
        sim_config: SimConfig,
        match_config: MatchConfig,
        area: FlowerArea,
        colliders: StaticColliderIndex,
    ) -> Result<Self, MatchError> {
        sim_config.validate()?;
        let seed = sim_config.seed;
        let dt = sim_config.dt;
        let player = Agent::new(sim_config.clone(), false)?;
        let opponent = Agent::new(sim_config, false)?;
        Ok(Self {
            match_config,
            dt,
            area,
            colliders,
            player,
            opponent,
            player_contacts: ContactTracker::new(),
            opponent_contacts: ContactTracker::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
            state: MatchState::MainMenu,
            ticks_played: 0,
        })
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn player(&self) -> &Agent {
        &self.player
    }

    pub fn opponent(&self) -> &Agent {
        &self.opponent
    }

    pub fn area(&self) -> &FlowerArea {
        &self.area
    }

    /// Seconds of play time left; zero outside the playing state.
    pub fn time_remaining_secs(&self) -> f32 {
        match self.state {
            MatchState::Playing { ticks_remaining } => ticks_remaining as f32 * self.dt,
            _ => 0.0,
        }
    }

    /// Player nectar as a fraction of the win threshold, for progress bars.
    pub fn player_progress(&self) -> f32 {
        clamp01(self.player.nectar_obtained() / self.match_config.max_nectar)
    }

    pub fn opponent_progress(&self) -> f32 {
        clamp01(self.opponent.nectar_obtained() / self.match_config.max_nectar)
    }

    /// Enter the main menu: reset the shared area, respawn both agents, and
    /// freeze them until play starts. Valid from any state.
    pub fn main_menu(&mut self) -> Result<(), MatchError> {
        self.area.reset_flowers(&mut self.rng);
        self.player
            .on_episode_begin(&mut self.area, &self.colliders, &mut self.rng)?;
        self.opponent
            .on_episode_begin(&mut self.area, &self.colliders, &mut self.rng)?;
        self.player.freeze()?;
        self.opponent.freeze()?;
        self.player_contacts.clear();
        self.opponent_contacts.clear();
        self.sync_colliders();
        self.ticks_played = 0;
        self.state = MatchState::MainMenu;
        Ok(())
    }

    /// Begin the pre-play countdown.
    pub fn start(&mut self) -> Result<(), MatchError> {
        if self.state != MatchState::MainMenu {
            return Err(MatchError::StartOutsideMainMenu);
        }
        self.state = MatchState::Preparing {
            ticks_remaining: self.secs_to_ticks(self.match_config.countdown_secs),
        };
        Ok(())
    }

    /// Advance the match by one fixed timestep. Actions are ignored outside
    /// the playing state (the agents are frozen anyway).
    pub fn tick(
        &mut self,
        player_action: [f32; ACTION_SIZE],
        opponent_action: [f32; ACTION_SIZE],
    ) -> Result<MatchState, MatchError> {
        match self.state {
            MatchState::MainMenu | MatchState::GameOver { .. } => {}
            MatchState::Preparing { ticks_remaining } => {
                if ticks_remaining > 1 {
                    self.state = MatchState::Preparing {
                        ticks_remaining: ticks_remaining - 1,
                    };
                } else {
                    self.player.unfreeze()?;
                    self.opponent.unfreeze()?;
                    self.state = MatchState::Playing {
                        ticks_remaining: self.secs_to_ticks(self.match_config.time_limit_secs),
                    };
                }
            }
            MatchState::Playing { ticks_remaining } => {
                self.player.step(player_action, &self.area);
                self.opponent.step(opponent_action, &self.area);

                // Feed calls are serialized: player first, then opponent.
                Self::deliver_contacts(
                    &mut self.player,
                    &mut self.player_contacts,
                    &mut self.area,
                    &self.colliders,
                )?;
                Self::deliver_contacts(
                    &mut self.opponent,
                    &mut self.opponent_contacts,
                    &mut self.area,
                    &self.colliders,
                )?;
                self.sync_colliders();
                self.ticks_played += 1;

                let time_up = ticks_remaining <= 1;
                let target_reached = self.player.nectar_obtained()
                    >= self.match_config.max_nectar
                    || self.opponent.nectar_obtained() >= self.match_config.max_nectar;
                if time_up || target_reached {
                    // The player wins ties.
                    let winner =
                        if self.player.nectar_obtained() >= self.opponent.nectar_obtained() {
                            Winner::Player
                        } else {
                            Winner::Opponent
                        };
                    self.player.freeze()?;
                    self.opponent.freeze()?;
                    self.state = MatchState::GameOver { winner };
                } else {
                    self.state = MatchState::Playing {
                        ticks_remaining: ticks_remaining - 1,
                    };
                }
            }
        }
        Ok(self.state)
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            ticks_played: self.ticks_played,
            player_nectar: self.player.nectar_obtained(),
            opponent_nectar: self.opponent.nectar_obtained(),
            winner: match self.state {
                MatchState::GameOver { winner } => Some(winner),
                _ => None,
            },
        }
    }

    fn deliver_contacts(
        agent: &mut Agent,
        tracker: &mut ContactTracker,
        area: &mut FlowerArea,
        colliders: &StaticColliderIndex,
    ) -> Result<(), MatchError> {
        let hits = colliders.overlap_sphere(agent.position(), agent.body_radius());
        for event in tracker.update(&hits) {
            agent.on_contact(event, area, colliders)?;
        }
        Ok(())
    }

    /// Mirror each flower's collider-enabled flag into the collision index
    /// so emptied flowers stop producing overlap events.
    fn sync_colliders(&mut self) {
        for flower in self.area.flowers() {
            self.colliders
                .set_enabled(flower.nectar_collider(), flower.colliders_enabled());
        }
    }

    fn secs_to_ticks(&self, secs: f32) -> u32 {
        (secs / self.dt).ceil().max(1.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{FlowerSpec, SceneNode};
    use crate::math::Vec3;
    use crate::physics::{ColliderKind, SphereCollider};

    fn scene() -> SceneNode {
        SceneNode::group(vec![
            SceneNode::flower(FlowerSpec {
                center: Vec3::new(0.0, 1.5, 2.0),
                up: Vec3::UP,
                nectar_collider: 1,
            }),
            SceneNode::flower(FlowerSpec {
                center: Vec3::new(3.0, 1.5, -2.0),
                up: Vec3::UP,
                nectar_collider: 2,
            }),
        ])
    }

    fn build_match(match_config: MatchConfig) -> Match {
        let area = FlowerArea::from_scene(Vec3::ZERO, &scene()).unwrap();
        let colliders = StaticColliderIndex::new(
            area.flowers()
                .iter()
                .map(|f| SphereCollider {
                    id: f.nectar_collider(),
                    kind: ColliderKind::Nectar,
                    center: f.center_position(),
                    radius: 0.01,
                })
                .collect(),
        )
        .unwrap();
        Match::new(SimConfig::default(), match_config, area, colliders).unwrap()
    }

    #[test]
    fn menu_freezes_agents_and_start_counts_down_into_play() {
        let mut m = build_match(MatchConfig::default());
        m.main_menu().unwrap();
        assert_eq!(m.state(), MatchState::MainMenu);
        assert!(m.player().is_frozen());
        assert!(m.opponent().is_frozen());
        assert_eq!(m.time_remaining_secs(), 0.0);

        m.start().unwrap();
        assert!(matches!(m.state(), MatchState::Preparing { .. }));

        // Countdown: 4 s at dt = 0.02 is 200 ticks before play begins.
        let mut ticks = 0;
        loop {
            let state = m.tick([0.0; ACTION_SIZE], [0.0; ACTION_SIZE]).unwrap();
            ticks += 1;
            if matches!(state, MatchState::Playing { .. }) {
                break;
            }
            assert!(ticks < 1000, "countdown never ended");
        }
        assert_eq!(ticks, 200);
        assert!(!m.player().is_frozen());
        assert!((m.time_remaining_secs() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn start_is_rejected_outside_main_menu() {
        let mut m = build_match(MatchConfig::default());
        m.main_menu().unwrap();
        m.start().unwrap();
        assert_eq!(m.start(), Err(MatchError::StartOutsideMainMenu));
    }

    #[test]
    fn timer_expiry_ends_the_match_and_player_wins_ties() {
        let mut m = build_match(MatchConfig {
            time_limit_secs: 0.1,
            countdown_secs: 0.02,
            ..MatchConfig::default()
        });
        m.main_menu().unwrap();
        m.start().unwrap();
        for _ in 0..100 {
            if let MatchState::GameOver { .. } =
                m.tick([0.0; ACTION_SIZE], [0.0; ACTION_SIZE]).unwrap()
            {
                break;
            }
        }
        assert_eq!(
            m.state(),
            MatchState::GameOver {
                winner: Winner::Player
            }
        );
        assert!(m.player().is_frozen(), "agents freeze at game over");

        let summary = m.summary();
        assert_eq!(summary.winner, Some(Winner::Player));
        assert_eq!(summary.player_nectar, 0.0);
    }

    #[test]
    fn reaching_the_nectar_target_ends_the_match() {
        let mut m = build_match(MatchConfig {
            max_nectar: 0.005,
            ..MatchConfig::default()
        });
        m.main_menu().unwrap();
        m.start().unwrap();
        while !matches!(m.state(), MatchState::Playing { .. }) {
            m.tick([0.0; ACTION_SIZE], [0.0; ACTION_SIZE]).unwrap();
        }

        // Park the player's beak on flower 0's nectar.
        let center = m.area.flower(0).unwrap().center_position();
        m.player.position = center - SimConfig::default().beak_tip_offset;
        m.player.pitch_deg = 0.0;
        m.player.yaw_deg = 0.0;
        m.player.update_nearest_flower(&m.area);

        let state = m.tick([0.0; ACTION_SIZE], [0.0; ACTION_SIZE]).unwrap();
        assert_eq!(
            state,
            MatchState::GameOver {
                winner: Winner::Player
            }
        );
        assert!(m.player().nectar_obtained() >= 0.005);
    }

    #[test]
    fn emptied_flowers_stop_producing_contacts_after_sync() {
        let mut m = build_match(MatchConfig::default());
        m.main_menu().unwrap();
        let idx = 0;
        m.area.flower_mut(idx).unwrap().feed(5.0).unwrap();
        m.sync_colliders();
        let id = m.area.flower(idx).unwrap().nectar_collider();
        assert!(!m.colliders.is_enabled(id));

        // A menu reset refills the flower and re-enables its collider.
        m.main_menu().unwrap();
        assert!(m.colliders.is_enabled(id));
    }

    #[test]
    fn match_summary_serializes_for_the_cli() {
        let mut m = build_match(MatchConfig::default());
        m.main_menu().unwrap();
        let json = serde_json::to_string(&m.summary()).unwrap();
        assert!(json.contains("\"player_nectar\""));
        assert!(json.contains("\"winner\":null"));
    }
}
