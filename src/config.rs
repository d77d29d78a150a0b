//! Game instance configuration

use crate::util::vec2::Vec2;

/// Configuration for one simulation instance
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Simulation tick rate in Hz
    pub tick_rate: u32,
    /// World width in units
    pub map_width: f32,
    /// World height in units
    pub map_height: f32,
    /// Delay between the start condition being met and the match going
    /// active, in seconds (debounce so a quick leave cancels the start)
    pub start_delay: f32,
    /// Delay between the match ending and instance teardown, in seconds
    pub over_delay: f32,
    /// Whether dead/disconnected players despawn or stay frozen in place
    pub allow_despawn: bool,
    /// Observer visible-set recompute threshold: ticks-with-movement since
    /// the last recompute before the spatial query is re-run
    pub visibility_recompute_moves: u32,
}

impl GameConfig {
    /// Duration of one tick in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Duration of one tick as a [`std::time::Duration`]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate as f64)
    }

    /// Start debounce delay in ticks
    pub fn start_delay_ticks(&self) -> u32 {
        (self.start_delay * self.tick_rate as f32).ceil() as u32
    }

    /// Teardown grace delay in ticks
    pub fn over_delay_ticks(&self) -> u32 {
        (self.over_delay * self.tick_rate as f32).ceil() as u32
    }

    /// World center point
    pub fn map_center(&self) -> Vec2 {
        Vec2::new(self.map_width / 2.0, self.map_height / 2.0)
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("TICK_RATE") {
            match rate.parse::<u32>() {
                Ok(parsed) if parsed > 0 && parsed <= 240 => config.tick_rate = parsed,
                _ => tracing::warn!("Invalid TICK_RATE '{}', using default", rate),
            }
        }

        if let Ok(delay) = std::env::var("START_DELAY") {
            match delay.parse::<f32>() {
                Ok(parsed) if parsed >= 0.0 => config.start_delay = parsed,
                _ => tracing::warn!("Invalid START_DELAY '{}', using default", delay),
            }
        }

        if let Ok(despawn) = std::env::var("ALLOW_DESPAWN") {
            match despawn.parse::<bool>() {
                Ok(parsed) => config.allow_despawn = parsed,
                Err(_) => tracing::warn!("Invalid ALLOW_DESPAWN '{}', using default", despawn),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.map_width <= 0.0 || self.map_height <= 0.0 {
            return Err("map dimensions must be positive".to_string());
        }
        if self.visibility_recompute_moves == 0 {
            return Err("visibility_recompute_moves must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::game::constants::tick::RATE,
            map_width: 720.0,
            map_height: 720.0,
            start_delay: 3.0,
            over_delay: 5.0,
            allow_despawn: true,
            visibility_recompute_moves: 8,
        }
    }
}
