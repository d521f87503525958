//! Animation parameters - контракт между контроллером и анимацией
//!
//! ECS ответственность:
//! - контроллер пишет типизированные `AnimationParam` в `AnimatorParameters`
//! - `flush_animation_signals` раз в кадр превращает изменения в
//!   `AnimationSignal` события и раздаёт их зарегистрированным `AnimationSink`
//!
//! Внешний animation backend (AnimationTree, blend graph) подписывается на
//! события или регистрирует sink; сам проигрыш анимаций здесь не живёт.

use std::collections::BTreeMap;

use bevy::prelude::*;

/// Именованный параметр анимации (typed)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AnimationParam {
    /// Скорость для blend tree
    Speed(f32),
    /// Величина input (0..1)
    MotionSpeed(f32),
    Grounded(bool),
    FreeFall(bool),
    /// Trigger: прыжок
    Jump,
    /// Сброс jump trigger'а (приземление); тот же ключ "Jump"
    JumpCleared,
    /// Trigger: кувырок
    Roll,
    IsRolling(bool),
    /// Trigger: удар
    Attack,
    ComboCount(u32),
    Armed(bool),
    Moving(bool),
    Blocking(bool),
    /// Trigger: использование фляги
    Heal,
}

/// Значение параметра в key/value представлении
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    Int(u32),
    Trigger,
}

impl AnimationParam {
    /// Стабильное имя параметра (ключ для animation backend)
    pub fn name(&self) -> &'static str {
        match self {
            AnimationParam::Speed(_) => "Speed",
            AnimationParam::MotionSpeed(_) => "MotionSpeed",
            AnimationParam::Grounded(_) => "Grounded",
            AnimationParam::FreeFall(_) => "FreeFall",
            AnimationParam::Jump | AnimationParam::JumpCleared => "Jump",
            AnimationParam::Roll => "Roll",
            AnimationParam::IsRolling(_) => "IsRolling",
            AnimationParam::Attack => "Attack",
            AnimationParam::ComboCount(_) => "ComboCount",
            AnimationParam::Armed(_) => "Armed",
            AnimationParam::Moving(_) => "isMoving",
            AnimationParam::Blocking(_) => "Blocking",
            AnimationParam::Heal => "Heal",
        }
    }

    pub fn value(&self) -> ParamValue {
        match *self {
            AnimationParam::Speed(v) | AnimationParam::MotionSpeed(v) => ParamValue::Float(v),
            AnimationParam::Grounded(v)
            | AnimationParam::FreeFall(v)
            | AnimationParam::IsRolling(v)
            | AnimationParam::Armed(v)
            | AnimationParam::Moving(v)
            | AnimationParam::Blocking(v) => ParamValue::Bool(v),
            AnimationParam::JumpCleared => ParamValue::Bool(false),
            AnimationParam::ComboCount(v) => ParamValue::Int(v),
            AnimationParam::Jump
            | AnimationParam::Roll
            | AnimationParam::Attack
            | AnimationParam::Heal => ParamValue::Trigger,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.value(), ParamValue::Trigger)
    }
}

/// Event: параметр анимации изменился (или сработал trigger)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AnimationSignal {
    pub entity: Entity,
    pub param: AnimationParam,
}

/// Float параметры считаются изменившимися только при разнице больше этого
const FLOAT_CHANGE_EPSILON: f32 = 1e-3;

/// Последние значения параметров + очередь изменений текущего кадра
#[derive(Component, Debug, Clone, Default)]
pub struct AnimatorParameters {
    values: BTreeMap<&'static str, ParamValue>,
    pending: Vec<AnimationParam>,
}

impl AnimatorParameters {
    /// Записать параметр. Trigger всегда уходит в очередь, значения - только
    /// если изменились. Возвращает true если параметр попал в очередь.
    pub fn set(&mut self, param: AnimationParam) -> bool {
        let value = param.value();
        let changed = match (self.values.get(param.name()), value) {
            (_, ParamValue::Trigger) => true,
            (Some(ParamValue::Float(old)), ParamValue::Float(new)) => {
                (old - new).abs() > FLOAT_CHANGE_EPSILON
            }
            (Some(old), new) => *old != new,
            (None, _) => true,
        };

        if changed {
            self.values.insert(param.name(), value);
            self.pending.push(param);
        }
        changed
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn pending(&self) -> &[AnimationParam] {
        &self.pending
    }

    pub fn drain_pending(&mut self) -> Vec<AnimationParam> {
        std::mem::take(&mut self.pending)
    }
}

/// Observer интерфейс для внешнего animation backend
pub trait AnimationSink: Send + Sync {
    fn on_param(&self, entity: Entity, param: AnimationParam);
}

/// Зарегистрированные sinks (вызываются в порядке регистрации)
#[derive(Resource, Default)]
pub struct AnimationSinks {
    sinks: Vec<Box<dyn AnimationSink>>,
}

impl AnimationSinks {
    pub fn register(&mut self, sink: Box<dyn AnimationSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn dispatch(&self, entity: Entity, param: AnimationParam) {
        for sink in &self.sinks {
            sink.on_param(entity, param);
        }
    }
}

/// Система: очередь изменений → `AnimationSignal` + sinks
pub fn flush_animation_signals(
    mut query: Query<(Entity, &mut AnimatorParameters)>,
    sinks: Res<AnimationSinks>,
    mut signals: EventWriter<AnimationSignal>,
) {
    for (entity, mut params) in query.iter_mut() {
        if params.pending.is_empty() {
            continue;
        }

        for param in params.drain_pending() {
            sinks.dispatch(entity, param);
            signals.write(AnimationSignal { entity, param });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_queued_only_on_change() {
        let mut params = AnimatorParameters::default();

        assert!(params.set(AnimationParam::Grounded(true)));
        assert!(!params.set(AnimationParam::Grounded(true)));
        assert!(params.set(AnimationParam::Grounded(false)));

        assert!(params.set(AnimationParam::Speed(1.0)));
        assert!(!params.set(AnimationParam::Speed(1.0005)));
        assert!(params.set(AnimationParam::Speed(2.0)));

        assert_eq!(params.pending().len(), 4);
        assert_eq!(params.bool("Grounded"), Some(false));
        assert_eq!(params.float("Speed"), Some(2.0));
    }

    #[test]
    fn test_triggers_always_queued() {
        let mut params = AnimatorParameters::default();
        assert!(params.set(AnimationParam::Attack));
        assert!(params.set(AnimationParam::Attack));
        assert_eq!(params.drain_pending().len(), 2);
        assert!(params.pending().is_empty());
        assert_eq!(params.get("Attack"), Some(ParamValue::Trigger));
    }

    #[test]
    fn test_param_names_are_stable() {
        assert_eq!(AnimationParam::ComboCount(2).name(), "ComboCount");
        assert_eq!(AnimationParam::Moving(true).name(), "isMoving");
        assert_eq!(AnimationParam::ComboCount(2).value(), ParamValue::Int(2));
        assert!(AnimationParam::Roll.is_trigger());
        assert!(!AnimationParam::Armed(true).is_trigger());
        assert_eq!(AnimationParam::JumpCleared.name(), AnimationParam::Jump.name());
    }

    #[test]
    fn test_jump_cleared_after_trigger() {
        let mut params = AnimatorParameters::default();
        params.set(AnimationParam::Jump);

        assert!(params.set(AnimationParam::JumpCleared));
        assert!(!params.set(AnimationParam::JumpCleared));
        assert_eq!(params.get("Jump"), Some(ParamValue::Bool(false)));
    }
}
