use anyhow::{bail, Context, Result};
use clap::Parser;
use nectar_core::{
    ColliderKind, FlowerSpec, Match, MatchConfig, MatchState, MatchSummary, SceneNode, SimConfig,
    SphereCollider, StaticColliderIndex, Vec3, ACTION_SIZE,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Headless driver for the nectar foraging simulation: builds a demo flower
/// area, runs complete matches with a simple chase policy on both agents,
/// and reports the results.
#[derive(Parser, Debug)]
#[command(name = "nectar-sim", about = "Run headless nectar-foraging matches")]
struct Cli {
    /// Deterministic seed for the scene, spawns and flower resets.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of matches to run.
    #[arg(long, default_value_t = 1)]
    matches: u32,

    /// Nectar needed to win a match.
    #[arg(long, default_value_t = 8.0)]
    max_nectar: f32,

    /// Play time limit per match, seconds.
    #[arg(long, default_value_t = 60.0)]
    time_limit: f32,

    /// Emit match summaries as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// A ring of flower plants around the area center, each carrying a few
/// flowers, plus a shell of boundary colliders.
fn demo_scene(seed: u64) -> (SceneNode, Vec<SphereCollider>) {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let mut next_id = 1u32;
    let mut plants = Vec::new();
    let mut colliders = Vec::new();

    for p in 0..6 {
        let bearing = (p as f32 / 6.0) * std::f32::consts::TAU;
        let radius = rng.random_range(4.0f32..8.0);
        let base = Vec3::new(bearing.cos() * radius, 0.0, bearing.sin() * radius);

        let mut flowers = Vec::new();
        for f in 0..3 {
            let offset = Vec3::new(
                rng.random_range(-0.5f32..0.5),
                1.2 + 0.3 * f as f32,
                rng.random_range(-0.5f32..0.5),
            );
            let lean = Vec3::new(
                rng.random_range(-0.3f32..0.3),
                1.0,
                rng.random_range(-0.3f32..0.3),
            );
            let spec = FlowerSpec {
                center: base + offset,
                up: lean,
                nectar_collider: next_id,
            };
            colliders.push(SphereCollider {
                id: next_id,
                kind: ColliderKind::Nectar,
                center: spec.center,
                radius: 0.01,
            });
            next_id += 1;
            flowers.push(SceneNode::flower(spec));
        }
        plants.push(SceneNode::plant(flowers));
    }

    // Boundary shell well outside the spawn radius.
    for b in 0..8 {
        let bearing = (b as f32 / 8.0) * std::f32::consts::TAU;
        colliders.push(SphereCollider {
            id: next_id,
            kind: ColliderKind::Boundary,
            center: Vec3::new(bearing.cos() * 12.0, 2.0, bearing.sin() * 12.0),
            radius: 2.0,
        });
        next_id += 1;
    }

    (SceneNode::group(plants), colliders)
}

/// Steer toward the agent's current target: full thrust along the beak-to-
/// flower direction, pitch/yaw rates proportional to the attitude error.
fn chase_action(m: &Match, player: bool) -> [f32; ACTION_SIZE] {
    let agent = if player { m.player() } else { m.opponent() };
    let Some(idx) = agent.nearest_flower() else {
        return [0.0; ACTION_SIZE];
    };
    let Ok(flower) = m.area().flower(idx) else {
        return [0.0; ACTION_SIZE];
    };

    let to_flower = (flower.center_position() - agent.position()).normalized();
    let forward = agent.forward();
    // Yaw error from the horizontal cross product, pitch error from height.
    let yaw_error = forward.cross(to_flower).y;
    let pitch_error = forward.y - to_flower.y;
    [
        to_flower.x,
        to_flower.y,
        to_flower.z,
        pitch_error.clamp(-1.0, 1.0),
        yaw_error.clamp(-1.0, 1.0),
    ]
}

fn run_match(cli: &Cli, match_index: u32) -> Result<MatchSummary> {
    let (scene, colliders) = demo_scene(cli.seed);
    let area = nectar_core::FlowerArea::from_scene(Vec3::ZERO, &scene)
        .context("building demo flower area")?;
    let index = StaticColliderIndex::new(colliders).context("building collider index")?;

    let sim_config = SimConfig {
        seed: cli.seed.wrapping_add(match_index as u64),
        ..SimConfig::default()
    };
    let match_config = MatchConfig {
        max_nectar: cli.max_nectar,
        time_limit_secs: cli.time_limit,
        ..MatchConfig::default()
    };
    let mut m = Match::new(sim_config, match_config, area, index)?;
    m.main_menu()?;
    m.start()?;

    // Countdown plus play time, with headroom.
    let max_ticks = ((cli.time_limit + 10.0) / 0.02) as u32;
    for _ in 0..max_ticks {
        let player_action = chase_action(&m, true);
        let opponent_action = chase_action(&m, false);
        if let MatchState::GameOver { .. } = m.tick(player_action, opponent_action)? {
            return Ok(m.summary());
        }
    }
    bail!("match did not terminate within {max_ticks} ticks");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut summaries = Vec::with_capacity(cli.matches as usize);
    for i in 0..cli.matches {
        let summary = run_match(&cli, i).with_context(|| format!("match {i}"))?;
        if !cli.json {
            println!(
                "match {i}: winner {:?}, player {:.2} vs opponent {:.2} nectar, {} ticks",
                summary.winner, summary.player_nectar, summary.opponent_nectar,
                summary.ticks_played,
            );
        }
        summaries.push(summary);
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }
    Ok(())
}
