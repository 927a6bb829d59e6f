//! Weather presets: lighting, atmosphere, fog and effect bundles.
//!
//! Presets are plain data loaded from RON and shared read-only through
//! `Arc`. The library validates every field against the ranges the renderer
//! accepts before a preset becomes visible to the simulation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use aether_common::{EffectHandle, PresetError};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A linear-space RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl LinearColor {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a colour from components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from RGB.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same colour with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// As a shader vector.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// Sun or moon light parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLightSettings {
    /// Intensity, [0, 150].
    pub intensity: f32,
    /// Light colour.
    pub color: LinearColor,
    /// Angular diameter of the light source, [0, 5].
    pub source_angle: f32,
    /// Colour temperature in Kelvin, [0, 12000].
    pub temperature: f32,
}

impl Default for DirectionalLightSettings {
    fn default() -> Self {
        Self {
            intensity: 7.0,
            color: LinearColor::WHITE,
            source_angle: 0.5357,
            temperature: 6500.0,
        }
    }
}

/// Ambient sky light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyLightSettings {
    /// Intensity, [0, 50000].
    pub intensity: f32,
}

impl Default for SkyLightSettings {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// Atmosphere scattering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereSettings {
    /// Multi-scattering factor, [0, 1].
    pub multi_scattering: f32,
    /// Rayleigh scattering colour.
    pub rayleigh_scattering: LinearColor,
    /// [0, 5].
    pub mie_scattering_scale: f32,
    /// [0, 5].
    pub mie_absorption_scale: f32,
    /// [0, 0.999].
    pub mie_anisotropy: f32,
    /// [0, 3].
    pub aerial_perspective_view_distance: f32,
}

impl Default for AtmosphereSettings {
    fn default() -> Self {
        Self {
            multi_scattering: 1.0,
            rayleigh_scattering: LinearColor::rgb(0.17, 0.41, 1.0),
            mie_scattering_scale: 0.003_996,
            mie_absorption_scale: 0.000_44,
            mie_anisotropy: 0.8,
            aerial_perspective_view_distance: 1.0,
        }
    }
}

/// Volumetric height fog parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    /// Emissive colour of the fog.
    pub emissive: LinearColor,
    /// Extinction scale, [0, 10].
    pub extinction_scale: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            emissive: LinearColor::TRANSPARENT,
            extinction_scale: 0.5,
        }
    }
}

/// Light and atmosphere parameters for one half of the day.
///
/// In a day configuration the directional light is the sun; in a night
/// configuration it is the moon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfiguration {
    /// Sky light.
    pub sky_light: SkyLightSettings,
    /// Sun or moon.
    pub directional_light: DirectionalLightSettings,
    /// Height fog.
    pub fog: FogSettings,
    /// Atmosphere.
    pub atmosphere: AtmosphereSettings,
}

impl WeatherConfiguration {
    fn validate(&self, preset: &str) -> Result<(), PresetError> {
        let light = &self.directional_light;
        let atmosphere = &self.atmosphere;
        let checks: [(&'static str, f32, f32, f32); 10] = [
            ("directional_light.intensity", light.intensity, 0.0, 150.0),
            ("directional_light.source_angle", light.source_angle, 0.0, 5.0),
            ("directional_light.temperature", light.temperature, 0.0, 12_000.0),
            ("sky_light.intensity", self.sky_light.intensity, 0.0, 50_000.0),
            ("atmosphere.multi_scattering", atmosphere.multi_scattering, 0.0, 1.0),
            ("atmosphere.mie_scattering_scale", atmosphere.mie_scattering_scale, 0.0, 5.0),
            ("atmosphere.mie_absorption_scale", atmosphere.mie_absorption_scale, 0.0, 5.0),
            ("atmosphere.mie_anisotropy", atmosphere.mie_anisotropy, 0.0, 0.999),
            (
                "atmosphere.aerial_perspective_view_distance",
                atmosphere.aerial_perspective_view_distance,
                0.0,
                3.0,
            ),
            ("fog.extinction_scale", self.fog.extinction_scale, 0.0, 10.0),
        ];

        for (field, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(PresetError::OutOfRange {
                    preset: preset.to_string(),
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// One particle effect a preset wants running, with parameter overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherEffectDefinition {
    /// Effect asset; `None` leaves its slot empty.
    pub effect: Option<EffectHandle>,
    /// Named float overrides.
    pub float_parameters: BTreeMap<String, f32>,
    /// Named vector overrides.
    pub vector_parameters: BTreeMap<String, Vec3>,
}

impl WeatherEffectDefinition {
    /// An effect with no parameter overrides.
    #[must_use]
    pub fn new(effect: EffectHandle) -> Self {
        Self {
            effect: Some(effect),
            ..Default::default()
        }
    }

    /// Adds a float override.
    #[must_use]
    pub fn with_float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.float_parameters.insert(name.into(), value);
        self
    }

    /// Adds a vector override.
    #[must_use]
    pub fn with_vector(mut self, name: impl Into<String>, value: Vec3) -> Self {
        self.vector_parameters.insert(name.into(), value);
        self
    }
}

/// Weather classification, selecting which ground parameter animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherType {
    /// No special effects.
    #[default]
    Sunny,
    /// Snow accumulates on the ground.
    Snowy,
    /// Puddles form on the ground.
    Rainy,
}

impl WeatherType {
    /// Get the display name for this weather type.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Snowy => "Snowy",
            Self::Rainy => "Rainy",
        }
    }

    /// Whether this type animates a ground parameter on transition.
    #[must_use]
    pub fn is_precipitation(self) -> bool {
        matches!(self, Self::Snowy | Self::Rainy)
    }
}

/// A named bundle of weather-dependent rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPreset {
    /// Unique name within a library.
    pub name: String,
    /// Classification.
    #[serde(default)]
    pub weather_type: WeatherType,
    /// Disables every cloud layer.
    #[serde(default)]
    pub hide_clouds: bool,
    /// Sun-lit configuration.
    #[serde(default)]
    pub day: WeatherConfiguration,
    /// Moon-lit configuration.
    #[serde(default)]
    pub night: WeatherConfiguration,
    /// Stars at night. Always off during the day.
    #[serde(default = "default_true")]
    pub show_stars: bool,
    /// Moon at night. Always off during the day.
    #[serde(default = "default_true")]
    pub show_moon: bool,
    /// Particle effects, one slot each.
    #[serde(default)]
    pub effects: Vec<WeatherEffectDefinition>,
    /// Rain puddles on the landscape.
    #[serde(default)]
    pub show_rain_puddles: bool,
    /// Ripples in the puddles; no effect without puddles.
    #[serde(default)]
    pub show_rain_puddle_ripples: bool,
}

fn default_true() -> bool {
    true
}

impl WeatherPreset {
    /// A preset with default lighting.
    #[must_use]
    pub fn new(name: impl Into<String>, weather_type: WeatherType) -> Self {
        Self {
            name: name.into(),
            weather_type,
            hide_clouds: false,
            day: WeatherConfiguration::default(),
            night: WeatherConfiguration::default(),
            show_stars: true,
            show_moon: true,
            effects: Vec::new(),
            show_rain_puddles: false,
            show_rain_puddle_ripples: false,
        }
    }

    /// Adds an effect definition.
    #[must_use]
    pub fn with_effect(mut self, effect: WeatherEffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    /// Configuration for the current half of the day.
    #[must_use]
    pub fn configuration(&self, is_daytime: bool) -> &WeatherConfiguration {
        if is_daytime {
            &self.day
        } else {
            &self.night
        }
    }

    /// Checks every field against its renderer range.
    pub fn validate(&self) -> Result<(), PresetError> {
        if self.name.trim().is_empty() {
            return Err(PresetError::Parse("preset name cannot be empty".to_string()));
        }
        self.day.validate(&self.name)?;
        self.night.validate(&self.name)
    }
}

/// On-disk layout of a preset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetFile {
    /// Presets in the file.
    #[serde(default)]
    pub presets: Vec<WeatherPreset>,
}

impl PresetFile {
    /// Parses a RON preset file.
    pub fn from_ron_str(source: &str) -> Result<Self, PresetError> {
        ron::from_str(source).map_err(|e| PresetError::Parse(e.to_string()))
    }

    /// Renders the file as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, PresetError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PresetError::Parse(e.to_string()))
    }
}

/// Validated presets keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: HashMap<String, Arc<WeatherPreset>>,
}

impl PresetLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a library from RON source.
    pub fn from_ron_str(source: &str) -> Result<Self, PresetError> {
        let mut library = Self::new();
        library.load_ron_str(source)?;
        Ok(library)
    }

    /// Adds every preset in a RON document. Returns how many were added.
    ///
    /// Nothing is added if any preset in the document is invalid.
    pub fn load_ron_str(&mut self, source: &str) -> Result<usize, PresetError> {
        let file = PresetFile::from_ron_str(source)?;
        for preset in &file.presets {
            preset.validate()?;
            if self.presets.contains_key(&preset.name) {
                return Err(PresetError::DuplicatePreset(preset.name.clone()));
            }
        }
        let count = file.presets.len();
        for preset in file.presets {
            self.insert(preset)?;
        }
        debug!("Loaded {count} weather presets");
        Ok(count)
    }

    /// Validates and registers a preset.
    pub fn insert(&mut self, preset: WeatherPreset) -> Result<Arc<WeatherPreset>, PresetError> {
        preset.validate()?;
        if self.presets.contains_key(&preset.name) {
            return Err(PresetError::DuplicatePreset(preset.name));
        }
        let preset = Arc::new(preset);
        info!(
            "Registered weather preset '{}' ({})",
            preset.name,
            preset.weather_type.display_name()
        );
        self.presets.insert(preset.name.clone(), Arc::clone(&preset));
        Ok(preset)
    }

    /// Looks up a preset by name.
    pub fn get(&self, name: &str) -> Result<Arc<WeatherPreset>, PresetError> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| PresetError::UnknownPreset(name.to_string()))
    }

    /// Whether a preset with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Preset names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of presets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESETS: &str = r#"(
        presets: [
            (
                name: "Clear",
            ),
            (
                name: "Blizzard",
                weather_type: Snowy,
                hide_clouds: true,
                night: (
                    directional_light: (intensity: 0.5, temperature: 8500.0),
                ),
                effects: [
                    (effect: Some("vfx/snowfall"), float_parameters: {"SpawnRate": 400.0}),
                    (effect: None),
                ],
            ),
        ],
    )"#;

    #[test]
    fn test_defaults_match_renderer_defaults() {
        let config = WeatherConfiguration::default();
        assert!((config.directional_light.intensity - 7.0).abs() < f32::EPSILON);
        assert!((config.directional_light.temperature - 6500.0).abs() < f32::EPSILON);
        assert!((config.atmosphere.mie_anisotropy - 0.8).abs() < f32::EPSILON);
        assert!((config.fog.extinction_scale - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.fog.emissive, LinearColor::TRANSPARENT);
    }

    #[test]
    fn test_load_from_ron() {
        let library = PresetLibrary::from_ron_str(PRESETS).expect("valid presets");
        assert_eq!(library.names(), vec!["Blizzard", "Clear"]);

        let clear = library.get("Clear").expect("clear");
        assert_eq!(clear.weather_type, WeatherType::Sunny);
        assert!(clear.show_stars);
        assert!(clear.effects.is_empty());

        let blizzard = library.get("Blizzard").expect("blizzard");
        assert_eq!(blizzard.weather_type, WeatherType::Snowy);
        assert!(blizzard.hide_clouds);
        assert!((blizzard.night.directional_light.intensity - 0.5).abs() < f32::EPSILON);
        // Unset fields keep their defaults
        assert!((blizzard.night.directional_light.source_angle - 0.5357).abs() < f32::EPSILON);
        assert_eq!(blizzard.effects.len(), 2);
        assert_eq!(
            blizzard.effects[0].effect,
            Some(EffectHandle::new("vfx/snowfall"))
        );
        assert_eq!(blizzard.effects[0].float_parameters.get("SpawnRate"), Some(&400.0));
        assert!(blizzard.effects[1].effect.is_none());
    }

    #[test]
    fn test_unknown_preset() {
        let library = PresetLibrary::new();
        assert!(matches!(
            library.get("Fog"),
            Err(PresetError::UnknownPreset(name)) if name == "Fog"
        ));
    }

    #[test]
    fn test_duplicate_rejected_atomically() {
        let mut library = PresetLibrary::new();
        library
            .insert(WeatherPreset::new("Clear", WeatherType::Sunny))
            .expect("first insert");

        let err = library.load_ron_str(PRESETS).expect_err("duplicate");
        assert!(matches!(err, PresetError::DuplicatePreset(_)));
        // Blizzard was not added either
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut preset = WeatherPreset::new("Glare", WeatherType::Sunny);
        preset.day.directional_light.intensity = 200.0;
        let err = preset.validate().expect_err("too bright");
        assert!(matches!(
            err,
            PresetError::OutOfRange { field: "directional_light.intensity", .. }
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            PresetLibrary::from_ron_str("(presets: [ (name: ) ])"),
            Err(PresetError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let file = PresetFile {
            presets: vec![WeatherPreset::new("Drizzle", WeatherType::Rainy)
                .with_effect(WeatherEffectDefinition::new(EffectHandle::new("vfx/rain")))],
        };
        let text = file.to_ron_string().expect("serialize");
        let library = PresetLibrary::from_ron_str(&text).expect("parse back");
        let drizzle = library.get("Drizzle").expect("drizzle");
        assert_eq!(*drizzle, file.presets[0]);
    }

    #[test]
    fn test_configuration_by_half_of_day() {
        let mut preset = WeatherPreset::new("Dusk", WeatherType::Sunny);
        preset.night.sky_light.intensity = 0.25;
        assert!((preset.configuration(true).sky_light.intensity - 1.0).abs() < f32::EPSILON);
        assert!((preset.configuration(false).sky_light.intensity - 0.25).abs() < f32::EPSILON);
    }
}
