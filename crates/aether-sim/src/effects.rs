//! Pool of weather particle-effect slots.
//!
//! The pool grows to fit the largest preset it has seen and never shrinks.
//! Applying a preset clears every slot first, so slots past the preset's
//! effect count end up empty and inactive.

use std::collections::BTreeMap;

use aether_common::EffectHandle;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::preset::WeatherEffectDefinition;

/// A parameter value pushed to a particle effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectParameter {
    /// Scalar.
    Float(f32),
    /// Three-component vector.
    Vector(Vec3),
}

/// One particle-effect instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectSlot {
    asset: Option<EffectHandle>,
    active: bool,
    parameters: BTreeMap<String, EffectParameter>,
}

impl EffectSlot {
    /// The assigned effect asset.
    #[must_use]
    pub fn asset(&self) -> Option<&EffectHandle> {
        self.asset.as_ref()
    }

    /// Whether the effect is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Parameter overrides, by name.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, EffectParameter> {
        &self.parameters
    }

    fn reset(&mut self) {
        self.active = false;
        self.asset = None;
        self.parameters.clear();
    }
}

/// Growable pool of effect slots.
#[derive(Debug, Clone, Default)]
pub struct EffectPool {
    slots: Vec<EffectSlot>,
}

impl EffectPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool with `count` empty slots.
    #[must_use]
    pub fn with_slots(count: usize) -> Self {
        Self {
            slots: vec![EffectSlot::default(); count],
        }
    }

    /// Grows the pool to at least `count` slots. Returns how many were added.
    pub fn ensure_capacity(&mut self, count: usize) -> usize {
        let missing = count.saturating_sub(self.slots.len());
        self.slots
            .extend(std::iter::repeat_with(EffectSlot::default).take(missing));
        missing
    }

    /// Deactivates every slot and clears its asset.
    pub fn clear_all(&mut self) {
        self.slots.iter_mut().for_each(EffectSlot::reset);
    }

    /// Assigns a definition to a slot. A definition without an effect leaves
    /// the slot empty. Returns `false` if the slot does not exist.
    pub fn assign(&mut self, index: usize, definition: &WeatherEffectDefinition) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        slot.reset();
        if let Some(effect) = &definition.effect {
            slot.asset = Some(effect.clone());
            for (name, value) in &definition.float_parameters {
                slot.parameters
                    .insert(name.clone(), EffectParameter::Float(*value));
            }
            for (name, value) in &definition.vector_parameters {
                slot.parameters
                    .insert(name.clone(), EffectParameter::Vector(*value));
            }
        }
        true
    }

    /// Loads a preset's effects: grow, clear, then assign in order.
    ///
    /// Returns how many slots were added.
    pub fn apply(&mut self, definitions: &[WeatherEffectDefinition]) -> usize {
        let added = self.ensure_capacity(definitions.len());
        self.clear_all();
        for (index, definition) in definitions.iter().enumerate() {
            self.assign(index, definition);
        }
        added
    }

    /// Activates or deactivates every slot that has an asset.
    ///
    /// Returns the indices of the slots that were toggled.
    pub fn set_active_all(&mut self, active: bool) -> Vec<usize> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.asset.is_some())
            .map(|(index, slot)| {
                slot.active = active;
                index
            })
            .collect()
    }

    /// Slot by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EffectSlot> {
        self.slots.get(index)
    }

    /// All slots.
    #[must_use]
    pub fn slots(&self) -> &[EffectSlot] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(path: &str) -> WeatherEffectDefinition {
        WeatherEffectDefinition::new(EffectHandle::new(path))
    }

    #[test]
    fn test_grows_to_fit_and_keeps_existing_slot() {
        let mut pool = EffectPool::with_slots(1);
        let added = pool.apply(&[effect("a"), effect("b"), effect("c")]);
        assert_eq!(added, 2);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(0).and_then(EffectSlot::asset), Some(&EffectHandle::new("a")));
    }

    #[test]
    fn test_never_shrinks() {
        let mut pool = EffectPool::new();
        pool.apply(&[effect("a"), effect("b"), effect("c")]);
        pool.set_active_all(true);

        let added = pool.apply(&[effect("d")]);
        assert_eq!(added, 0);
        assert_eq!(pool.len(), 3);
        // Stale slots are cleared and inactive
        for index in 1..3 {
            let slot = pool.get(index).expect("slot");
            assert!(slot.asset().is_none());
            assert!(!slot.is_active());
        }
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_only_slots_with_assets_activate() {
        let mut pool = EffectPool::new();
        pool.apply(&[effect("rain"), WeatherEffectDefinition::default()]);
        assert_eq!(pool.set_active_all(true), vec![0]);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_parameters_are_copied() {
        let mut pool = EffectPool::new();
        let definition = effect("snow")
            .with_float("SpawnRate", 250.0)
            .with_vector("Wind", Vec3::new(1.0, 0.0, 0.0));
        pool.apply(&[definition]);

        let slot = pool.get(0).expect("slot");
        assert_eq!(
            slot.parameters().get("SpawnRate"),
            Some(&EffectParameter::Float(250.0))
        );
        assert_eq!(
            slot.parameters().get("Wind"),
            Some(&EffectParameter::Vector(Vec3::X))
        );
    }

    #[test]
    fn test_assign_out_of_range() {
        let mut pool = EffectPool::new();
        assert!(!pool.assign(0, &effect("a")));
    }
}
