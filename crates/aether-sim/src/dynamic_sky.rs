//! The dynamic sky: the presenter that turns time and weather into renderer
//! state.
//!
//! `DynamicSky` receives time-of-day pushes from the world clock, places the
//! sun and moon, and applies the current weather preset's lighting,
//! atmosphere, fog, clouds and particle effects. Weather transitions are
//! sampled from `tick` and written to the shared parameter collection.

use std::sync::Arc;

use aether_common::{ConfigError, EnvironmentResult};
use glam::Vec4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::TimeOfDayPresenter;
use crate::effects::EffectPool;
use crate::params::{SharedParameters, WeatherParameter};
use crate::preset::{DirectionalLightSettings, LinearColor, WeatherPreset, WeatherType};
use crate::renderer::{
    RenderCommand, SkyRenderer, CLOUDS_2D_SETTINGS, CLOUDS_2D_VISIBLE, MOON_FUNDAMENTAL_SETTINGS,
    MOON_VISIBLE, STARS_VISIBLE, VOLUMETRIC_CLOUD_ALBEDO, VOLUMETRIC_PANNING_SPEED,
};
use crate::sky::{CelestialBody, SkyAngles, SkyPositionModel};
use crate::time::HOURS_PER_DAY;
use crate::transition::{
    TransitionCurve, TransitionStep, WeatherTransitionController, DEFAULT_PLAY_RATE,
};

/// Which cloud layer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CloudMode {
    /// No clouds.
    #[default]
    None,
    /// Clouds painted on the sky sphere.
    Texture2D,
    /// Volumetric cloud layer.
    Volumetric,
}

/// Moon light and disc settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonSettings {
    /// Moon light intensity.
    pub light_intensity: f32,
    /// Moon light temperature in Kelvin.
    pub light_temperature: f32,
    /// Moon light source angle.
    pub light_source_angle: f32,
    /// Moon disc scale on the sky sphere.
    pub scale: f32,
    /// Moon disc rotation.
    pub rotation: f32,
    /// Moon disc brightness.
    pub brightness: f32,
    /// Moon light colour.
    pub light_color: LinearColor,
}

impl Default for MoonSettings {
    fn default() -> Self {
        Self {
            light_intensity: 1.0,
            light_temperature: 8500.0,
            light_source_angle: 0.0,
            scale: 0.1,
            rotation: 1.0,
            brightness: 1.0,
            light_color: LinearColor::WHITE,
        }
    }
}

impl MoonSettings {
    fn fundamental(&self) -> Vec4 {
        Vec4::new(self.scale, self.rotation, self.brightness, 1.0)
    }

    fn light(&self) -> DirectionalLightSettings {
        DirectionalLightSettings {
            intensity: self.light_intensity,
            color: self.light_color,
            source_angle: self.light_source_angle,
            temperature: self.light_temperature,
        }
    }
}

/// Sky sphere cloud settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cloud2DSettings {
    /// Texture tiling.
    pub tiling: f32,
    /// Panning speed.
    pub panning_speed: f32,
    /// Brightness.
    pub brightness: f32,
    /// How much the atmosphere tints clouds by day, [0, 1].
    pub day_tint: f32,
    /// How much the atmosphere tints clouds by night, [0, 1].
    pub night_tint: f32,
}

impl Default for Cloud2DSettings {
    fn default() -> Self {
        Self {
            tiling: 3.0,
            panning_speed: 1.0,
            brightness: 1.0,
            day_tint: 0.1,
            night_tint: 0.95,
        }
    }
}

impl Cloud2DSettings {
    fn vector(&self, is_daytime: bool) -> Vec4 {
        let tint = if is_daytime {
            self.day_tint
        } else {
            self.night_tint
        };
        Vec4::new(self.tiling, self.panning_speed, self.brightness, tint)
    }
}

/// Volumetric cloud layer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricCloudSettings {
    /// Layer bottom in kilometres, [0, 20].
    pub bottom_altitude: f32,
    /// Layer height in kilometres, [0.1, 20].
    pub layer_height: f32,
    /// Material panning speed.
    pub panning_speed: f32,
    /// Brightness by day, [0, 1].
    pub day_brightness: f32,
    /// Brightness by night, [0, 1].
    pub night_brightness: f32,
    /// Albedo tint.
    pub tint: LinearColor,
}

impl Default for VolumetricCloudSettings {
    fn default() -> Self {
        Self {
            bottom_altitude: 5.0,
            layer_height: 8.0,
            panning_speed: 0.1,
            day_brightness: 1.0,
            night_brightness: 0.2,
            tint: LinearColor::WHITE,
        }
    }
}

impl VolumetricCloudSettings {
    fn albedo(&self, is_daytime: bool) -> Vec4 {
        let brightness = if is_daytime {
            self.day_brightness
        } else {
            self.night_brightness
        };
        self.tint.with_alpha(brightness).to_vec4()
    }
}

/// Everything configurable about the dynamic sky.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkySettings {
    /// Time of day before the clock pushes one, [0, 24].
    pub time_of_day: f32,
    /// Sky sphere mesh scale.
    pub sky_sphere_scale: f32,
    /// Cloud layer.
    pub cloud_mode: CloudMode,
    /// Weather transitions per real second.
    pub transition_play_rate: f32,
    /// Dawn, dusk and light yaw.
    pub position: SkyPositionModel,
    /// Moon light and disc.
    pub moon: MoonSettings,
    /// 2D clouds.
    pub clouds_2d: Cloud2DSettings,
    /// Volumetric clouds.
    pub volumetric_clouds: VolumetricCloudSettings,
    /// Shape of weather transitions.
    pub transition_curve: TransitionCurve,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            time_of_day: 9.0,
            sky_sphere_scale: 100_000.0,
            cloud_mode: CloudMode::default(),
            transition_play_rate: DEFAULT_PLAY_RATE,
            position: SkyPositionModel::default(),
            moon: MoonSettings::default(),
            clouds_2d: Cloud2DSettings::default(),
            volumetric_clouds: VolumetricCloudSettings::default(),
            transition_curve: TransitionCurve::default(),
        }
    }
}

impl SkySettings {
    /// Validates ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.position.validate()?;
        let clouds = &self.clouds_2d;
        let volumetric = &self.volumetric_clouds;
        let checks: [(&'static str, f32, f32, f32); 7] = [
            ("time_of_day", self.time_of_day, 0.0, HOURS_PER_DAY),
            ("clouds_2d.day_tint", clouds.day_tint, 0.0, 1.0),
            ("clouds_2d.night_tint", clouds.night_tint, 0.0, 1.0),
            ("volumetric_clouds.bottom_altitude", volumetric.bottom_altitude, 0.0, 20.0),
            ("volumetric_clouds.layer_height", volumetric.layer_height, 0.1, 20.0),
            ("volumetric_clouds.day_brightness", volumetric.day_brightness, 0.0, 1.0),
            ("volumetric_clouds.night_brightness", volumetric.night_brightness, 0.0, 1.0),
        ];
        for (name, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Sky presenter driving a renderer from time and weather.
#[derive(Debug)]
pub struct DynamicSky<R> {
    settings: SkySettings,
    renderer: R,
    parameters: SharedParameters,
    preset: Option<Arc<WeatherPreset>>,
    effects: EffectPool,
    transition: WeatherTransitionController,
    cloud_mode: CloudMode,
    time_of_day: f32,
    angles: SkyAngles,
    initialized: bool,
}

impl<R: SkyRenderer> DynamicSky<R> {
    /// Creates a sky. Nothing reaches the renderer until `initialize`.
    pub fn new(
        settings: SkySettings,
        renderer: R,
        parameters: SharedParameters,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let transition = WeatherTransitionController::new(
            settings.transition_play_rate,
            settings.transition_curve.clone(),
        )?;
        let time_of_day = settings.time_of_day;
        let angles = settings
            .position
            .angles(time_of_day, SkyAngles::default().moon_angle);

        Ok(Self {
            cloud_mode: settings.cloud_mode,
            settings,
            renderer,
            parameters,
            preset: None,
            effects: EffectPool::new(),
            transition,
            time_of_day,
            angles,
            initialized: false,
        })
    }

    /// Sets the preset applied by `initialize`.
    #[must_use]
    pub fn with_preset(mut self, preset: Arc<WeatherPreset>) -> Self {
        self.preset = Some(preset);
        self
    }

    /// Replaces the current preset without applying it.
    pub fn set_preset(&mut self, preset: Option<Arc<WeatherPreset>>) {
        self.preset = preset;
    }

    /// Settings.
    #[must_use]
    pub fn settings(&self) -> &SkySettings {
        &self.settings
    }

    /// The renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Shared weather parameters.
    #[must_use]
    pub fn parameters(&self) -> &SharedParameters {
        &self.parameters
    }

    /// Current weather preset.
    #[must_use]
    pub fn preset(&self) -> Option<&Arc<WeatherPreset>> {
        self.preset.as_ref()
    }

    /// Current time of day in hours.
    #[must_use]
    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Current sun and moon placement.
    #[must_use]
    pub fn angles(&self) -> SkyAngles {
        self.angles
    }

    /// Whether the sun is up.
    #[must_use]
    pub fn is_daytime(&self) -> bool {
        self.angles.is_daytime
    }

    /// Whether the moon is up.
    #[must_use]
    pub fn is_night_time(&self) -> bool {
        !self.angles.is_daytime
    }

    /// Cloud layer in effect. A rainy preset can override the configured mode.
    #[must_use]
    pub fn cloud_mode(&self) -> CloudMode {
        self.cloud_mode
    }

    /// Changes the cloud layer and re-applies clouds.
    pub fn set_cloud_mode(&mut self, mode: CloudMode) {
        self.cloud_mode = mode;
        if self.initialized {
            self.apply_cloud_mode();
        }
    }

    /// Effect slots.
    #[must_use]
    pub fn effects(&self) -> &EffectPool {
        &self.effects
    }

    /// The transition controller.
    #[must_use]
    pub fn transition(&self) -> &WeatherTransitionController {
        &self.transition
    }

    /// The transition controller, for subscribing to steps.
    pub fn transition_mut(&mut self) -> &mut WeatherTransitionController {
        &mut self.transition
    }

    /// Whether `initialize` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Pushes the full sky state to the renderer: sky sphere, weather,
    /// clouds, then sun and moon.
    pub fn initialize(&mut self) {
        self.init_sky_sphere();
        self.apply_weather_settings();
        self.apply_cloud_mode();
        self.update_sun_and_moon();
        self.initialized = true;
        info!(
            "Dynamic sky initialized at {:.2}h with preset {}",
            self.time_of_day,
            self.preset
                .as_ref()
                .map_or("<none>", |preset| preset.name.as_str())
        );
    }

    /// Moves to `time_of_day` without touching the renderer, then initializes.
    pub fn initialize_at(&mut self, time_of_day: f32) {
        self.time_of_day = time_of_day.clamp(0.0, HOURS_PER_DAY);
        self.angles = self
            .settings
            .position
            .angles(self.time_of_day, self.angles.moon_angle);
        self.initialize();
    }

    /// Applies a preset at full strength without animating.
    ///
    /// Any running transition is dropped. Returns how many effect slots were
    /// added to fit the preset.
    pub fn apply_preset_immediate(&mut self, preset: Arc<WeatherPreset>) -> usize {
        info!("Applying weather preset '{}'", preset.name);
        self.transition.reset();
        self.preset = Some(preset);
        let added = self.apply_weather_settings();
        self.apply_cloud_mode();
        added
    }

    /// Starts an animated transition to `preset`, replacing any in flight.
    ///
    /// A preset other than the current one has its settings applied first.
    /// Effects are switched on straight away; the ground parameter ramps in
    /// over subsequent `tick` calls.
    pub fn start_transition(&mut self, preset: Arc<WeatherPreset>) {
        let is_current = self
            .preset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &preset));
        if !is_current {
            self.preset = Some(Arc::clone(&preset));
            self.apply_weather_settings();
            self.apply_cloud_mode();
        }

        self.transition.start(preset);
        self.toggle_weather_effects(true);
    }

    /// Advances the weather transition by real time.
    pub fn tick(&mut self, delta_real_seconds: f32) -> EnvironmentResult<Option<TransitionStep>> {
        let step = self.transition.sample(delta_real_seconds)?;
        if let Some(TransitionStep {
            target: Some(parameter),
            value,
            ..
        }) = step
        {
            self.set_parameter(parameter, value);
        }
        Ok(step)
    }

    /// Moves the sky to `time_of_day`, clamped to [0, 24].
    pub fn set_time_of_day(&mut self, time_of_day: f32) {
        let was_daytime = self.angles.is_daytime;
        self.time_of_day = time_of_day.clamp(0.0, HOURS_PER_DAY);
        self.angles = self
            .settings
            .position
            .angles(self.time_of_day, self.angles.moon_angle);
        self.update_sun_and_moon();

        if self.initialized && was_daytime != self.angles.is_daytime {
            debug!(
                "Sky switched to {}",
                if self.angles.is_daytime { "day" } else { "night" }
            );
            if let Some(preset) = self.preset.clone() {
                self.apply_light_properties(&preset);
            }
            self.apply_cloud_mode();
        }
    }

    fn init_sky_sphere(&mut self) {
        self.renderer
            .submit(RenderCommand::SkySphereScale(self.settings.sky_sphere_scale));
        self.renderer.submit(RenderCommand::SkyVector {
            name: MOON_FUNDAMENTAL_SETTINGS,
            value: self.settings.moon.fundamental(),
        });
        self.renderer.submit(RenderCommand::DirectionalLight {
            body: CelestialBody::Moon,
            settings: self.settings.moon.light(),
        });
    }

    fn update_sun_and_moon(&mut self) {
        let position = self.settings.position;
        self.renderer.submit(RenderCommand::LightRotation {
            body: CelestialBody::Sun,
            pitch: self.angles.sun_angle,
            yaw: position.yaw,
        });
        if position.moon_angle(self.time_of_day).is_some() {
            self.renderer.submit(RenderCommand::LightRotation {
                body: CelestialBody::Moon,
                pitch: self.angles.moon_angle,
                yaw: position.yaw,
            });
        }

        for body in [CelestialBody::Sun, CelestialBody::Moon] {
            self.renderer.submit(RenderCommand::LightVisibility {
                body,
                visible: self.angles.is_visible(body),
            });
        }
    }

    fn apply_weather_settings(&mut self) -> usize {
        let Some(preset) = self.preset.clone() else {
            debug!("No weather preset configured; skipping weather settings");
            return 0;
        };

        let added = self.apply_effects(&preset);
        self.apply_light_properties(&preset);

        match preset.weather_type {
            WeatherType::Snowy => {
                self.toggle_weather_effects(true);
                self.set_parameter(WeatherParameter::SnowStrength, 1.0);
            },
            WeatherType::Rainy => {
                self.toggle_weather_effects(true);
                self.cloud_mode = CloudMode::Texture2D;
                self.set_parameter(WeatherParameter::SnowStrength, 0.0);
            },
            WeatherType::Sunny => {
                self.toggle_weather_effects(false);
                self.set_parameter(WeatherParameter::SnowStrength, 0.0);
            },
        }
        added
    }

    fn apply_effects(&mut self, preset: &WeatherPreset) -> usize {
        let added = self.effects.apply(&preset.effects);
        if added > 0 {
            debug!(
                "Added {added} weather effect slots ({} total)",
                self.effects.len()
            );
        }

        for (index, slot) in self.effects.slots().iter().enumerate() {
            self.renderer.submit(RenderCommand::EffectActive {
                slot: index,
                active: false,
            });
            self.renderer.submit(RenderCommand::EffectAsset {
                slot: index,
                asset: slot.asset().cloned(),
            });
            for (name, value) in slot.parameters() {
                self.renderer.submit(RenderCommand::EffectParameter {
                    slot: index,
                    name: name.clone(),
                    value: *value,
                });
            }
        }

        self.set_parameter(
            WeatherParameter::ShowPuddles,
            f32::from(u8::from(preset.show_rain_puddles)),
        );
        self.set_parameter(
            WeatherParameter::ShowRipples,
            f32::from(u8::from(preset.show_rain_puddle_ripples)),
        );
        added
    }

    fn toggle_weather_effects(&mut self, active: bool) {
        for slot in self.effects.set_active_all(active) {
            self.renderer
                .submit(RenderCommand::EffectActive { slot, active });
        }
    }

    fn apply_light_properties(&mut self, preset: &WeatherPreset) {
        let is_daytime = self.angles.is_daytime;
        let (active_body, idle_body) = if is_daytime {
            (CelestialBody::Sun, CelestialBody::Moon)
        } else {
            (CelestialBody::Moon, CelestialBody::Sun)
        };
        let active = preset.configuration(is_daytime);
        let idle = preset.configuration(!is_daytime);

        self.renderer.submit(RenderCommand::DirectionalLight {
            body: idle_body,
            settings: idle.directional_light,
        });
        self.renderer.submit(RenderCommand::DirectionalLight {
            body: active_body,
            settings: active.directional_light,
        });
        self.renderer.submit(RenderCommand::SkyLight(active.sky_light));
        self.renderer.submit(RenderCommand::Atmosphere(active.atmosphere));
        self.renderer.submit(RenderCommand::Fog(active.fog));

        let night = !is_daytime;
        self.renderer.submit(RenderCommand::SkyScalar {
            name: STARS_VISIBLE,
            value: f32::from(u8::from(night && preset.show_stars)),
        });
        self.renderer.submit(RenderCommand::SkyScalar {
            name: MOON_VISIBLE,
            value: f32::from(u8::from(night && preset.show_moon)),
        });
    }

    fn apply_cloud_mode(&mut self) {
        if self.preset.as_ref().is_some_and(|preset| preset.hide_clouds) {
            self.toggle_clouds_2d(false);
            self.toggle_volumetric_clouds(false);
            return;
        }

        match self.cloud_mode {
            CloudMode::None => {
                self.toggle_clouds_2d(false);
                self.toggle_volumetric_clouds(false);
            },
            CloudMode::Texture2D => {
                self.toggle_clouds_2d(true);
                self.renderer.submit(RenderCommand::SkyVector {
                    name: CLOUDS_2D_SETTINGS,
                    value: self.settings.clouds_2d.vector(self.angles.is_daytime),
                });
                self.toggle_volumetric_clouds(false);
            },
            CloudMode::Volumetric => {
                self.toggle_clouds_2d(false);
                self.toggle_volumetric_clouds(true);
                self.apply_volumetric_cloud_settings();
            },
        }
    }

    fn toggle_clouds_2d(&mut self, visible: bool) {
        self.renderer.submit(RenderCommand::SkyScalar {
            name: CLOUDS_2D_VISIBLE,
            value: f32::from(u8::from(visible)),
        });
    }

    fn toggle_volumetric_clouds(&mut self, visible: bool) {
        self.renderer
            .submit(RenderCommand::VolumetricClouds { visible });
    }

    fn apply_volumetric_cloud_settings(&mut self) {
        let clouds = self.settings.volumetric_clouds;
        self.renderer.submit(RenderCommand::VolumetricCloudLayer {
            bottom_altitude: clouds.bottom_altitude,
            height: clouds.layer_height,
        });
        self.renderer.submit(RenderCommand::VolumetricCloudScalar {
            name: VOLUMETRIC_PANNING_SPEED,
            value: clouds.panning_speed,
        });
        self.renderer.submit(RenderCommand::VolumetricCloudVector {
            name: VOLUMETRIC_CLOUD_ALBEDO,
            value: clouds.albedo(self.angles.is_daytime),
        });
    }

    fn set_parameter(&self, parameter: WeatherParameter, value: f32) {
        if !self.parameters.write().set(parameter, value) {
            warn!(
                "Weather parameter {} is not declared in the collection",
                parameter.name()
            );
        }
    }
}

impl<R: SkyRenderer> TimeOfDayPresenter for DynamicSky<R> {
    fn on_time_of_day_changed(&mut self, time_of_day: f32) {
        self.set_time_of_day(time_of_day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{SharedPresenter, WorldClock};
    use crate::params::ParameterCollection;
    use crate::preset::WeatherEffectDefinition;
    use crate::renderer::RecordingRenderer;
    use aether_common::EffectHandle;
    use parking_lot::Mutex;

    fn sky() -> DynamicSky<RecordingRenderer> {
        DynamicSky::new(
            SkySettings::default(),
            RecordingRenderer::new(),
            ParameterCollection::weather().into_shared(),
        )
        .expect("valid settings")
    }

    fn preset_with_effects(name: &str, weather_type: WeatherType, count: usize) -> Arc<WeatherPreset> {
        let mut preset = WeatherPreset::new(name, weather_type);
        for index in 0..count {
            preset = preset.with_effect(WeatherEffectDefinition::new(EffectHandle::new(format!(
                "vfx/{name}_{index}"
            ))));
        }
        Arc::new(preset)
    }

    fn parameter(sky: &DynamicSky<RecordingRenderer>, parameter: WeatherParameter) -> f32 {
        sky.parameters().read().get(parameter).expect("declared")
    }

    #[test]
    fn test_initialize_sequence() {
        let mut sky = sky().with_preset(preset_with_effects("Clear", WeatherType::Sunny, 0));
        sky.initialize();

        let commands = sky.renderer().commands();
        assert_eq!(commands[0], RenderCommand::SkySphereScale(100_000.0));
        assert_eq!(
            commands[1],
            RenderCommand::SkyVector {
                name: MOON_FUNDAMENTAL_SETTINGS,
                value: Vec4::new(0.1, 1.0, 1.0, 1.0),
            }
        );
        // Sun and moon placement comes last
        assert!(matches!(
            commands[commands.len() - 1],
            RenderCommand::LightVisibility { body: CelestialBody::Moon, visible: false }
        ));
        assert!(sky.is_initialized());
        assert!(sky.is_daytime());
    }

    #[test]
    fn test_effect_pool_grows_by_missing_slots() {
        let mut sky = sky();
        assert_eq!(sky.apply_preset_immediate(preset_with_effects("Drizzle", WeatherType::Rainy, 1)), 1);
        assert_eq!(sky.effects().len(), 1);

        let added = sky.apply_preset_immediate(preset_with_effects("Storm", WeatherType::Rainy, 3));
        assert_eq!(added, 2);
        assert_eq!(sky.effects().len(), 3);

        let added = sky.apply_preset_immediate(preset_with_effects("Clear", WeatherType::Sunny, 0));
        assert_eq!(added, 0);
        assert_eq!(sky.effects().len(), 3);
        assert!(sky.effects().slots().iter().all(|slot| slot.asset().is_none() && !slot.is_active()));
    }

    #[test]
    fn test_snowy_applies_full_strength() {
        let mut sky = sky();
        sky.apply_preset_immediate(preset_with_effects("Snow", WeatherType::Snowy, 2));
        assert!((parameter(&sky, WeatherParameter::SnowStrength) - 1.0).abs() < f32::EPSILON);
        assert_eq!(sky.effects().active_count(), 2);

        sky.apply_preset_immediate(preset_with_effects("Clear", WeatherType::Sunny, 1));
        assert!(parameter(&sky, WeatherParameter::SnowStrength).abs() < f32::EPSILON);
        assert_eq!(sky.effects().active_count(), 0);
    }

    #[test]
    fn test_rainy_forces_2d_clouds() {
        let mut settings = SkySettings::default();
        settings.cloud_mode = CloudMode::Volumetric;
        let mut sky = DynamicSky::new(
            settings,
            RecordingRenderer::new(),
            ParameterCollection::weather().into_shared(),
        )
        .expect("valid settings");

        let mut rain = WeatherPreset::new("Rain", WeatherType::Rainy);
        rain.show_rain_puddles = true;
        sky.apply_preset_immediate(Arc::new(rain));

        assert_eq!(sky.cloud_mode(), CloudMode::Texture2D);
        assert_eq!(sky.renderer().last_sky_scalar(CLOUDS_2D_VISIBLE), Some(1.0));
        assert_eq!(sky.renderer().last_volumetric_visibility(), Some(false));
        assert!((parameter(&sky, WeatherParameter::ShowPuddles) - 1.0).abs() < f32::EPSILON);
        assert!(parameter(&sky, WeatherParameter::ShowRipples).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hidden_clouds_override_mode() {
        let mut sky = sky();
        sky.set_cloud_mode(CloudMode::Volumetric);
        let mut fog = WeatherPreset::new("Fog", WeatherType::Sunny);
        fog.hide_clouds = true;
        sky.apply_preset_immediate(Arc::new(fog));

        assert_eq!(sky.renderer().last_sky_scalar(CLOUDS_2D_VISIBLE), Some(0.0));
        assert_eq!(sky.renderer().last_volumetric_visibility(), Some(false));
    }

    #[test]
    fn test_superseded_transition_stops_writing() {
        let mut sky = sky();
        let snow = preset_with_effects("Snow", WeatherType::Snowy, 1);
        sky.apply_preset_immediate(Arc::clone(&snow));
        sky.start_transition(snow);
        sky.tick(5.0).expect("tick");
        assert!((parameter(&sky, WeatherParameter::SnowStrength) - 0.5).abs() < 1e-6);

        sky.start_transition(preset_with_effects("Rain", WeatherType::Rainy, 1));
        let snow_after_switch = parameter(&sky, WeatherParameter::SnowStrength);
        for _ in 0..40 {
            sky.tick(0.5).expect("tick");
        }

        assert!((parameter(&sky, WeatherParameter::SnowStrength) - snow_after_switch).abs() < f32::EPSILON);
        assert!((parameter(&sky, WeatherParameter::ShowPuddles) - 1.0).abs() < f32::EPSILON);
        assert_eq!(sky.transition().progress(), Some(1.0));
        assert_eq!(sky.effects().active_count(), 1);
    }

    #[test]
    fn test_apply_immediate_cancels_transition() {
        let mut sky = sky();
        sky.start_transition(preset_with_effects("Snow", WeatherType::Snowy, 1));
        sky.tick(2.0).expect("tick");
        sky.apply_preset_immediate(preset_with_effects("Clear", WeatherType::Sunny, 0));

        assert!(sky.transition().progress().is_none());
        assert!(sky.tick(1.0).expect("tick").is_none());
        assert!(parameter(&sky, WeatherParameter::SnowStrength).abs() < f32::EPSILON);
    }

    #[test]
    fn test_night_switches_lights_and_stars() {
        let mut sky = sky().with_preset(preset_with_effects("Clear", WeatherType::Sunny, 0));
        sky.initialize();
        assert_eq!(sky.renderer().last_sky_scalar(STARS_VISIBLE), Some(0.0));

        sky.on_time_of_day_changed(21.0);
        assert!(sky.is_night_time());
        assert_eq!(sky.renderer().last_light_visibility(CelestialBody::Sun), Some(false));
        assert_eq!(sky.renderer().last_light_visibility(CelestialBody::Moon), Some(true));
        assert_eq!(sky.renderer().last_sky_scalar(STARS_VISIBLE), Some(1.0));
        assert_eq!(sky.renderer().last_sky_scalar(MOON_VISIBLE), Some(1.0));
    }

    #[test]
    fn test_time_of_day_is_clamped() {
        let mut sky = sky();
        sky.on_time_of_day_changed(30.0);
        assert!((sky.time_of_day() - 24.0).abs() < f32::EPSILON);
        sky.on_time_of_day_changed(-3.0);
        assert!(sky.time_of_day().abs() < f32::EPSILON);
    }

    #[test]
    fn test_moon_rotation_only_on_its_arcs() {
        let mut sky = sky();
        sky.renderer_mut().take();
        sky.set_time_of_day(12.0);
        assert_eq!(sky.renderer().last_light_pitch(CelestialBody::Moon), None);

        sky.set_time_of_day(2.4);
        let pitch = sky.renderer().last_light_pitch(CelestialBody::Moon).expect("moon moved");
        assert!((pitch - (-45.0)).abs() < 1e-4);
    }

    #[test]
    fn test_missing_preset_is_skipped() {
        let mut sky = sky();
        sky.initialize();
        assert!(sky.preset().is_none());
        assert!(sky.effects().is_empty());
        assert!(parameter(&sky, WeatherParameter::SnowStrength).abs() < f32::EPSILON);
    }

    #[test]
    fn test_undeclared_parameters_do_not_panic() {
        let mut sky = DynamicSky::new(
            SkySettings::default(),
            RecordingRenderer::new(),
            ParameterCollection::new().into_shared(),
        )
        .expect("valid settings");
        sky.apply_preset_immediate(preset_with_effects("Snow", WeatherType::Snowy, 1));
        assert!(sky.parameters().read().is_empty());
    }

    #[test]
    fn test_receives_pushes_from_clock() {
        let sky = Arc::new(Mutex::new(sky()));
        let presenter: SharedPresenter = sky.clone();
        let mut clock = WorldClock::default();
        clock.register_presenter(&presenter);

        clock.advance(1.0).expect("advance");
        let expected = 12.0 + 1.0 / 60.0;
        assert!((sky.lock().time_of_day() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = SkySettings::default();
        settings.transition_play_rate = 0.0;
        assert!(DynamicSky::new(
            settings,
            RecordingRenderer::new(),
            ParameterCollection::weather().into_shared()
        )
        .is_err());
    }
}
