//! Startup settings, read from `MAZE_RACE_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::game::MatchSettings;
use crate::grid::Dimensions;

pub const DEFAULT_ROWS: usize = 9;
pub const DEFAULT_COLS: usize = 12;
pub const DEFAULT_TICK_MS: u64 = 16;
pub const DEFAULT_RENDER_FPS: u64 = 60;
pub const DEFAULT_RESTART_MS: u64 = 3000;
pub const WORLD_WIDTH: f32 = 960.0;
pub const WORLD_HEIGHT: f32 = 540.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub dims: Dimensions,
    pub tick: Duration,
    pub render_fps: u64,
    pub restart_delay: Duration,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dims: Dimensions::new(DEFAULT_ROWS, DEFAULT_COLS)
                .unwrap_or_else(|_| unreachable!("default dimensions are positive")),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            render_fps: DEFAULT_RENDER_FPS,
            restart_delay: Duration::from_millis(DEFAULT_RESTART_MS),
            seed: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source. Unset keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rows = positive(&lookup, "MAZE_RACE_ROWS", DEFAULT_ROWS)?;
        let cols = positive(&lookup, "MAZE_RACE_COLS", DEFAULT_COLS)?;
        let tick_ms = positive(&lookup, "MAZE_RACE_TICK_MS", DEFAULT_TICK_MS)?;
        let render_fps = positive(&lookup, "MAZE_RACE_FPS", DEFAULT_RENDER_FPS)?;
        let restart_ms = setting(&lookup, "MAZE_RACE_RESTART_MS", DEFAULT_RESTART_MS)?;
        let seed = match lookup("MAZE_RACE_SEED") {
            Some(raw) => Some(parse("MAZE_RACE_SEED", &raw)?),
            None => None,
        };
        let log_file = lookup("MAZE_RACE_LOG_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            dims: Dimensions::new(rows, cols)?,
            tick: Duration::from_millis(tick_ms),
            render_fps,
            restart_delay: Duration::from_millis(restart_ms),
            seed,
            log_file,
        })
    }

    /// Whole ticks covering the restart delay, at least one.
    pub fn restart_ticks(&self) -> u32 {
        let tick = self.tick.as_millis().max(1);
        let ticks = self.restart_delay.as_millis().div_ceil(tick).max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.render_fps.max(1))
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            dims: self.dims,
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            restart_ticks: self.restart_ticks(),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| Error::InvalidSetting {
        key,
        value: raw.to_string(),
    })
}

fn setting<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn positive<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let value = setting(lookup, key, default)?;
    if value <= T::default() {
        return Err(Error::InvalidSetting {
            key,
            value: lookup(key).unwrap_or_default(),
        });
    }
    Ok(value)
}
