//! Renderer boundary for the dynamic sky.
//!
//! The sky never talks to a graphics API. It describes each change as a
//! `RenderCommand` and hands it to whatever `SkyRenderer` the embedding
//! application supplies.

use aether_common::EffectHandle;
use glam::Vec4;

use crate::effects::EffectParameter;
use crate::preset::{AtmosphereSettings, DirectionalLightSettings, FogSettings, SkyLightSettings};
use crate::sky::CelestialBody;

/// Sky sphere material parameter toggling stars.
pub const STARS_VISIBLE: &str = "AreStarsVisible";
/// Sky sphere material parameter toggling the moon disc.
pub const MOON_VISIBLE: &str = "IsMoonVisible";
/// Sky sphere material vector: moon scale, rotation, brightness.
pub const MOON_FUNDAMENTAL_SETTINGS: &str = "MoonFundamentalSettings";
/// Sky sphere material parameter toggling 2D clouds.
pub const CLOUDS_2D_VISIBLE: &str = "Are2DCloudsVisible";
/// Sky sphere material vector: tiling, panning, brightness, tint.
pub const CLOUDS_2D_SETTINGS: &str = "Cloud2DSettings";
/// Volumetric cloud material scalar.
pub const VOLUMETRIC_PANNING_SPEED: &str = "PanningSpeed";
/// Volumetric cloud material vector: tint with brightness in alpha.
pub const VOLUMETRIC_CLOUD_ALBEDO: &str = "CloudAlbedo";

/// A single change for the renderer to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Uniform scale of the sky sphere mesh.
    SkySphereScale(f32),
    /// Scalar parameter on the sky sphere material.
    SkyScalar {
        /// Parameter name.
        name: &'static str,
        /// Value.
        value: f32,
    },
    /// Vector parameter on the sky sphere material.
    SkyVector {
        /// Parameter name.
        name: &'static str,
        /// Value.
        value: Vec4,
    },
    /// Orientation of the sun or moon light, in degrees.
    LightRotation {
        /// Which light.
        body: CelestialBody,
        /// Pitch.
        pitch: f32,
        /// Yaw.
        yaw: f32,
    },
    /// Sun or moon light on or off.
    LightVisibility {
        /// Which light.
        body: CelestialBody,
        /// Visible.
        visible: bool,
    },
    /// Sun or moon light parameters.
    DirectionalLight {
        /// Which light.
        body: CelestialBody,
        /// Parameters.
        settings: DirectionalLightSettings,
    },
    /// Ambient sky light.
    SkyLight(SkyLightSettings),
    /// Atmosphere scattering.
    Atmosphere(AtmosphereSettings),
    /// Height fog.
    Fog(FogSettings),
    /// Volumetric cloud component on or off.
    VolumetricClouds {
        /// Visible and ticking.
        visible: bool,
    },
    /// Volumetric cloud layer placement, in kilometres.
    VolumetricCloudLayer {
        /// Bottom altitude.
        bottom_altitude: f32,
        /// Layer height.
        height: f32,
    },
    /// Scalar parameter on the volumetric cloud material.
    VolumetricCloudScalar {
        /// Parameter name.
        name: &'static str,
        /// Value.
        value: f32,
    },
    /// Vector parameter on the volumetric cloud material.
    VolumetricCloudVector {
        /// Parameter name.
        name: &'static str,
        /// Value.
        value: Vec4,
    },
    /// Effect asset for a slot; `None` clears it.
    EffectAsset {
        /// Slot index.
        slot: usize,
        /// Asset.
        asset: Option<EffectHandle>,
    },
    /// Effect slot running or stopped.
    EffectActive {
        /// Slot index.
        slot: usize,
        /// Running.
        active: bool,
    },
    /// Named effect parameter on a slot.
    EffectParameter {
        /// Slot index.
        slot: usize,
        /// Parameter name.
        name: String,
        /// Value.
        value: EffectParameter,
    },
}

/// Sink for sky render commands.
pub trait SkyRenderer {
    /// Applies one command.
    fn submit(&mut self, command: RenderCommand);
}

impl<R: SkyRenderer + ?Sized> SkyRenderer for Box<R> {
    fn submit(&mut self, command: RenderCommand) {
        (**self).submit(command);
    }
}

/// Renderer that keeps every command, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    commands: Vec<RenderCommand>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Takes the recorded commands, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Last value written to a sky sphere scalar.
    #[must_use]
    pub fn last_sky_scalar(&self, name: &str) -> Option<f32> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::SkyScalar { name: n, value } if *n == name => Some(*value),
            _ => None,
        })
    }

    /// Last visibility set for a light.
    #[must_use]
    pub fn last_light_visibility(&self, body: CelestialBody) -> Option<bool> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::LightVisibility { body: b, visible } if *b == body => Some(*visible),
            _ => None,
        })
    }

    /// Last pitch set for a light.
    #[must_use]
    pub fn last_light_pitch(&self, body: CelestialBody) -> Option<f32> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::LightRotation { body: b, pitch, .. } if *b == body => Some(*pitch),
            _ => None,
        })
    }

    /// Last volumetric cloud visibility.
    #[must_use]
    pub fn last_volumetric_visibility(&self) -> Option<bool> {
        self.commands.iter().rev().find_map(|command| match command {
            RenderCommand::VolumetricClouds { visible } => Some(*visible),
            _ => None,
        })
    }
}

impl SkyRenderer for RecordingRenderer {
    fn submit(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }
}
