use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const VOLUME_SILENT: i32 = -10000;
pub const MAX_GAMMA_LEVEL: i32 = 8;

/// Player-facing settings plus the knobs the headless runner exposes.
/// Volumes are hundredths of a decibel: 0 is full volume, -10000 silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sfx_volume: i32,
    pub ambient_volume: i32,
    pub voice_volume: i32,
    pub music_volume: i32,
    pub gamma_level: i32,
    /// 1..=5; transparency tables and crossfades need more than 1.
    pub performance: i32,
    pub random_seed: u64,
    /// Propagate content faults out of `Engine::tick` instead of ending the
    /// offending script and carrying on.
    pub strict_content_errors: bool,
    pub max_steps_per_tick: usize,
    /// Pixels an actor covers per tick while walking.
    pub walk_step: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sfx_volume: -500,
            ambient_volume: -750,
            voice_volume: -250,
            music_volume: -1000,
            gamma_level: 0,
            performance: 5,
            random_seed: 0x6173_796c,
            strict_content_errors: true,
            max_steps_per_tick: 4096,
            walk_step: 8,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(EngineConfig::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config json: {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing config")?;
        fs::write(path, json).with_context(|| format!("writing config to {}", path.display()))
    }

    /// Clamps every field into the range the engine understands.
    pub fn sanitized(mut self) -> Self {
        for volume in [
            &mut self.sfx_volume,
            &mut self.ambient_volume,
            &mut self.voice_volume,
            &mut self.music_volume,
        ] {
            *volume = (*volume).clamp(VOLUME_SILENT, 0);
        }
        self.gamma_level = self.gamma_level.clamp(0, MAX_GAMMA_LEVEL);
        self.performance = self.performance.clamp(1, 5);
        self.max_steps_per_tick = self.max_steps_per_tick.max(1);
        self.walk_step = self.walk_step.max(1);
        self
    }
}
