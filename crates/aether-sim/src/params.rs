//! Shared weather material parameters.
//!
//! The sky presenter writes these and ground-effect consumers read them. Only
//! declared parameters can be written, the same way a material parameter
//! collection rejects unknown names.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The scalar parameters the weather system drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherParameter {
    /// Snow cover on the landscape, [0, 1].
    SnowStrength,
    /// Rain puddles on the landscape, [0, 1].
    ShowPuddles,
    /// Ripples in puddles, 0 or 1.
    ShowRipples,
}

impl WeatherParameter {
    /// Parameter name in the collection.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SnowStrength => "SnowStrength",
            Self::ShowPuddles => "ShowPuddles",
            Self::ShowRipples => "ShowRipples",
        }
    }

    /// Every weather parameter.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::SnowStrength, Self::ShowPuddles, Self::ShowRipples]
    }
}

/// A named set of scalar parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterCollection {
    scalars: HashMap<String, f32>,
}

/// Parameter collection shared between writer and readers.
pub type SharedParameters = Arc<RwLock<ParameterCollection>>;

impl ParameterCollection {
    /// Creates a collection with nothing declared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection declaring every weather parameter at zero.
    #[must_use]
    pub fn weather() -> Self {
        let mut collection = Self::new();
        for parameter in WeatherParameter::all() {
            collection.declare(parameter.name(), 0.0);
        }
        collection
    }

    /// Wraps the collection for sharing.
    #[must_use]
    pub fn into_shared(self) -> SharedParameters {
        Arc::new(RwLock::new(self))
    }

    /// Declares a parameter, overwriting its value if it exists.
    pub fn declare(&mut self, name: impl Into<String>, value: f32) {
        self.scalars.insert(name.into(), value);
    }

    /// Sets a declared parameter. Returns `false` if `name` is not declared.
    pub fn set_scalar(&mut self, name: &str, value: f32) -> bool {
        match self.scalars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            },
            None => false,
        }
    }

    /// Reads a declared parameter.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.scalars.get(name).copied()
    }

    /// Sets a weather parameter.
    pub fn set(&mut self, parameter: WeatherParameter, value: f32) -> bool {
        self.set_scalar(parameter.name(), value)
    }

    /// Reads a weather parameter.
    #[must_use]
    pub fn get(&self, parameter: WeatherParameter) -> Option<f32> {
        self.scalar(parameter.name())
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_collection_declares_all() {
        let collection = ParameterCollection::weather();
        assert_eq!(collection.len(), 3);
        for parameter in WeatherParameter::all() {
            assert_eq!(collection.get(parameter), Some(0.0));
        }
    }

    #[test]
    fn test_undeclared_write_is_rejected() {
        let mut collection = ParameterCollection::new();
        assert!(!collection.set(WeatherParameter::SnowStrength, 1.0));
        assert_eq!(collection.get(WeatherParameter::SnowStrength), None);

        collection.declare("SnowStrength", 0.0);
        assert!(collection.set(WeatherParameter::SnowStrength, 0.75));
        assert_eq!(collection.scalar("SnowStrength"), Some(0.75));
    }

    #[test]
    fn test_shared_access() {
        let shared = ParameterCollection::weather().into_shared();
        let reader = Arc::clone(&shared);
        shared.write().set(WeatherParameter::ShowPuddles, 1.0);
        assert_eq!(reader.read().get(WeatherParameter::ShowPuddles), Some(1.0));
    }
}
