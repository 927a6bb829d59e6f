//! Headless run loop.

use aether_sim::{
    DynamicSky, Environment, EnvironmentEvent, ParameterCollection, PresetLibrary, SeasonCycle,
    WorldClock, WorldDateTime,
};
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::assets::WeatherAssetLoader;
use crate::config::EngineConfig;
use crate::renderer::TracingRenderer;
use crate::timing::FrameTiming;

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Frames driven.
    pub frames: u32,
    /// Simulated date-time at exit.
    pub finished_at: Option<WorldDateTime>,
    /// Hour, day and week rollovers seen.
    pub calendar_events: usize,
    /// Weather transitions that reached full strength.
    pub transitions_finished: usize,
    /// Render commands submitted.
    pub render_commands: u64,
}

/// Builds an environment from configuration and loaded weather data.
pub fn build_environment(
    config: &EngineConfig,
    presets: PresetLibrary,
    seasons: SeasonCycle,
) -> Result<Environment<TracingRenderer>> {
    let clock_settings = config
        .clock
        .settings()
        .context("invalid clock configuration")?;
    let clock = WorldClock::starting_at(clock_settings, config.clock.start());

    let sky = DynamicSky::new(
        config.sky.clone(),
        TracingRenderer::new(),
        ParameterCollection::weather().into_shared(),
    )
    .context("invalid sky configuration")?;

    let mut environment = Environment::new(clock, sky, presets).with_seasons(seasons)?;
    if let Some(name) = &config.run.initial_preset {
        environment = environment
            .with_initial_preset(name)
            .with_context(|| format!("initial preset '{name}'"))?;
    }
    Ok(environment)
}

/// Drives `frames` frames, logging calendar events as they arrive.
pub fn run_frames(
    environment: &mut Environment<TracingRenderer>,
    timing: &mut FrameTiming,
    frames: u32,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for _ in 0..frames {
        let dt = timing.delta_time();
        environment.update(dt)?;
        summary.frames += 1;

        for event in environment.events().drain() {
            match event {
                EnvironmentEvent::Calendar(notice) => {
                    info!("{} at {}", notice.event.display_name(), notice.at);
                    summary.calendar_events += 1;
                },
                EnvironmentEvent::TransitionFinished { preset } => {
                    info!("Weather settled on '{preset}'");
                    summary.transitions_finished += 1;
                },
                other => debug!("{other:?}"),
            }
        }

        timing.sleep_remainder();
    }

    summary.finished_at = Some(environment.clock().date_time());
    summary.render_commands = environment.sky().lock().renderer().submitted();
    Ok(summary)
}

/// Loads weather data, builds the environment and runs it.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let mut loader = WeatherAssetLoader::new(&config.run.presets_dir);
    loader
        .load_all()
        .with_context(|| format!("loading weather assets from {}", config.run.presets_dir))?;
    let (presets, seasons) = loader.into_parts();

    for season in &seasons.seasons {
        let forecast: Vec<String> = season
            .forecast()
            .iter()
            .map(|info| format!("{} {:.0}%", info.name, info.probability * 100.0))
            .collect();
        info!("{} forecast: {}", season.name, forecast.join(", "));
    }

    let mut environment = build_environment(config, presets, seasons)?;
    environment.initialize();

    let mut timing = if config.run.headless {
        FrameTiming::headless(config.run.target_fps)
    } else {
        FrameTiming::new(config.run.target_fps)
    };
    let summary = run_frames(&mut environment, &mut timing, config.run.frames)?;

    environment.shutdown();
    info!(
        "Ran {} frames at ~{:.0} fps, {} render commands",
        summary.frames,
        timing.current_fps(),
        summary.render_commands
    );
    Ok(summary)
}
