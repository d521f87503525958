//! Базовые компоненты акторов: Health, Enemy, ControlLock
//!
//! Hit reaction приходит событием `HitReceived`.

use bevy::prelude::*;

use crate::logger;

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

/// Враг - кандидат для lock-on
///
/// Отбор кандидатов идёт по collision layer (`LAYER_ENEMIES`), маркер нужен
/// для spawn helpers и debug вывода.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Enemy;

/// Control lock - пока висит, input игрока не обрабатывается
///
/// Ставится на hit reaction (stagger). Снимается когда `remaining` истёк.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ControlLock {
    /// Оставшееся время (секунды)
    pub remaining: f32,
}

impl ControlLock {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration.max(0.0),
        }
    }

    /// Тик таймера. Возвращает true когда lock истёк.
    pub fn tick(&mut self, delta: f32) -> bool {
        self.remaining -= delta;
        self.remaining <= 0.0
    }
}

/// Система: отсчёт control lock, снятие по истечении
pub fn tick_control_locks(
    mut commands: Commands,
    mut query: Query<(Entity, &mut ControlLock)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (entity, mut lock) in query.iter_mut() {
        if lock.tick(delta) {
            commands.entity(entity).remove::<ControlLock>();
        }
    }
}

/// Событие: по entity пришёл удар (пишет хост или боевая логика)
#[derive(Event, Debug, Clone, Copy)]
pub struct HitReceived {
    pub target: Entity,
    pub damage: u32,
    /// Длительность control lock (секунды)
    pub stagger: f32,
}

/// Система: HitReceived → hit reaction на целях с Health
pub fn apply_hit_events(
    mut commands: Commands,
    mut hit_events: EventReader<HitReceived>,
    mut targets: Query<&mut Health>,
) {
    for hit in hit_events.read() {
        let Ok(mut health) = targets.get_mut(hit.target) else {
            continue;
        };

        apply_hit_reaction(&mut commands, hit.target, &mut health, hit.damage, hit.stagger);
        logger::log(&format!(
            "{:?} hit for {} (hp {}/{}), stagger {:.2}s",
            hit.target, hit.damage, health.current, health.max, hit.stagger
        ));
    }
}

/// Hit reaction: урон + control lock на `stagger` секунд
pub fn apply_hit_reaction(
    commands: &mut Commands,
    entity: Entity,
    health: &mut Health,
    damage: u32,
    stagger: f32,
) {
    health.take_damage(damage);
    commands.entity(entity).insert(ControlLock::new(stagger));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        health.take_damage(30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        health.take_damage(100); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal_clamped() {
        let mut health = Health::new(100);
        health.take_damage(50);
        health.heal(30);
        assert_eq!(health.current, 80);

        health.heal(100);
        assert_eq!(health.current, 100);
    }

    #[test]
    fn test_hit_reaction_damages_and_locks() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut health = Health::new(100);

        {
            let mut commands = world.commands();
            apply_hit_reaction(&mut commands, entity, &mut health, 25, 0.3);
        }
        world.flush();

        assert_eq!(health.current, 75);
        let lock = world.get::<ControlLock>(entity).expect("control lock inserted");
        assert_eq!(lock.remaining, 0.3);
    }

    #[test]
    fn test_control_lock_expires() {
        let mut lock = ControlLock::new(0.5);
        assert!(!lock.tick(0.25));
        assert!(lock.tick(0.25));
    }
}
