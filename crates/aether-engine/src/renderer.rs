//! Headless sky renderer that logs what a real renderer would draw.

use aether_sim::{RenderCommand, SkyRenderer};
use tracing::{debug, trace};

/// Logs render commands instead of drawing them.
///
/// Visibility changes go to `debug!`, everything else to `trace!`.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    submitted: u64,
}

impl TracingRenderer {
    /// Creates a renderer with no commands submitted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total commands submitted.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }
}

impl SkyRenderer for TracingRenderer {
    fn submit(&mut self, command: RenderCommand) {
        self.submitted += 1;
        match &command {
            RenderCommand::LightVisibility { body, visible } => {
                debug!("{body:?} light visible: {visible}");
            },
            RenderCommand::VolumetricClouds { visible } => {
                debug!("Volumetric clouds visible: {visible}");
            },
            RenderCommand::EffectActive { slot, active } => {
                debug!("Weather effect {slot} active: {active}");
            },
            RenderCommand::EffectAsset { slot, asset } => {
                debug!("Weather effect {slot} asset: {asset:?}");
            },
            other => trace!("{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_sim::CelestialBody;

    #[test]
    fn test_counts_submissions() {
        let mut renderer = TracingRenderer::new();
        renderer.submit(RenderCommand::SkySphereScale(10.0));
        renderer.submit(RenderCommand::LightVisibility {
            body: CelestialBody::Sun,
            visible: true,
        });
        assert_eq!(renderer.submitted(), 2);
    }
}
