//! Headless симуляция: один агент, угроза идёт прямо на него.
//!
//! Запуск: `fugitive_simulation [path/to/flee_config.json]`

use bevy::prelude::*;
use fugitive_simulation::{
    create_headless_app, logger, spawn_flee_agent, tick, BehaviorState, FleeConfig, GridNavMesh, GroundService,
    NavMeshService, FIXED_TIMESTEP,
};

const TICKS: usize = 3600;
const THREAT_SPEED: f32 = 3.0;

fn load_config() -> FleeConfig {
    let Some(path) = std::env::args().nth(1) else {
        return FleeConfig::default();
    };

    match std::fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|json| FleeConfig::from_json(&json).map_err(|err| err.to_string()))
    {
        Ok(config) => config,
        Err(err) => {
            logger::log_error(&format!("Config {}: {}, using defaults", path, err));
            FleeConfig::default()
        }
    }
}

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    logger::log_info(&format!("Starting fugitive headless simulation (seed: {})", seed));

    // 80×80м арена со стеной посередине
    let arena = GridNavMesh::centered(80, 80, 1.0).with_blocked_rect(38, 10, 41, 69);
    app.insert_resource(NavMeshService::new(arena.clone()))
        .insert_resource(GroundService::new(arena));

    let world = app.world_mut();
    let threat = world.spawn(Transform::from_xyz(-30.0, 0.0, -30.0)).id();
    let agent = match spawn_flee_agent(world, Vec3::new(10.0, 0.0, 10.0), Some(threat), load_config()) {
        Ok(agent) => agent,
        Err(err) => {
            logger::log_error(&format!("Failed to spawn agent: {}", err));
            return;
        }
    };

    for tick_index in 0..TICKS {
        // Угроза идёт прямо к агенту
        let agent_position = world.get::<Transform>(agent).map(|t| t.translation).unwrap_or_default();
        if let Some(mut threat_transform) = world.get_mut::<Transform>(threat) {
            let to_agent = agent_position - threat_transform.translation;
            threat_transform.translation += to_agent.normalize_or_zero() * THREAT_SPEED * FIXED_TIMESTEP.as_secs_f32();
        }

        tick(world, FIXED_TIMESTEP);

        let state = world.get::<BehaviorState>(agent).copied().unwrap_or_default();
        if tick_index % 120 == 0 {
            let position = world.get::<Transform>(agent).map(|t| t.translation).unwrap_or_default();
            logger::log_info(&format!("Tick {}: agent {:?} at {:?}", tick_index, state, position));
        }

        if state.is_caught() {
            logger::log_info(&format!("Agent caught after {} ticks", tick_index + 1));
            break;
        }
    }

    logger::log_info("Simulation complete!");
}
