//! Fugitive Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: NPC, который бродит по NavMesh, убегает от
//! угрозы и в итоге бывает пойман.
//!
//! Архитектура:
//! - ECS = decision layer (FSM, planners, motion intent)
//! - NavMesh / ground probe = внешние сервисы за traits (инжектятся resources)
//! - Animation / audio = потребители `AnimationSignal` и `AgentCaught`

use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod config;
pub mod error;
pub mod logger;
pub mod motion;
pub mod navigation;

// Re-export базовых типов для удобства
pub use ai::{
    AIPlugin, AgentCaught, AnimationSignal, BehaviorState, CaptureRequest, DestinationKind, FleeAgent,
    FleePlanningFailed,
};
pub use config::FleeConfig;
pub use error::{BehaviorError, ConfigError};
pub use logger::{log, log_error, log_info, log_warning};
pub use motion::{MotionPlugin, NavAgent};
pub use navigation::{GridNavMesh, GroundProbe, GroundService, NavMeshQuery, NavMeshService};

/// Seed по умолчанию (если хост не вставил свой DeterministicRng)
pub const DEFAULT_SEED: u64 = 42;

/// Fixed тик симуляции (60Hz)
pub const FIXED_TIMESTEP: Duration = Duration::from_nanos(16_666_667);

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Детерминистичный RNG: не перетираем seed, вставленный хостом
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(DEFAULT_SEED));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_duration(FIXED_TIMESTEP))
            .add_plugins((AIPlugin, MotionPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (SimulationPlugin включён)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Один simulation тик: сдвигает fixed clock на `delta` и прогоняет FixedUpdate.
///
/// Не зависит от wall-clock — тесты и хосты с собственным game loop
/// вызывают его напрямую вместо `App::update`.
///
/// `First` здесь не выполняется, поэтому event буферы ротируем сами в начале
/// тика: события тика N живут до начала тика N + 2 (double buffer).
pub fn tick(world: &mut World, delta: Duration) {
    update_events::<CaptureRequest>(world);
    update_events::<AgentCaught>(world);
    update_events::<FleePlanningFailed>(world);

    world.resource_mut::<Time<Fixed>>().advance_by(delta);
    world.run_schedule(FixedUpdate);
}

fn update_events<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}

/// Спавнит flee агента. Threat резолвится здесь один раз (владелец уровня
/// передаёт entity явно).
pub fn spawn_flee_agent(
    world: &mut World,
    position: Vec3,
    threat: Option<Entity>,
    config: FleeConfig,
) -> Result<Entity, ConfigError> {
    config.validate()?;

    let nav = NavAgent::new(config.walk_speed, config.random_walk_arrival_threshold);
    let entity = world
        .spawn((
            Transform::from_translation(position),
            FleeAgent::new(threat),
            BehaviorState::default(),
            AnimationSignal::default(),
            nav,
            config,
        ))
        .id();

    logger::log(&format!("Spawned flee agent {:?} at {:?} (threat {:?})", entity, position, threat));
    Ok(entity)
}

/// Внешний onCaught: агент будет пойман в начале следующего тика
pub fn request_capture(world: &mut World, agent: Entity) {
    world.send_event(CaptureRequest { agent });
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
