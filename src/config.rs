use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::DEFAULT_EFFECT_DURATION_MS;
use crate::engine::sample_filter::{DEFAULT_MAX_SPEED_M_S, DEFAULT_MIN_DISTANCE_METERS};
use crate::engine::road_polygon::DEFAULT_ROAD_HALF_WIDTH_METERS;
use crate::engine::smoother::DEFAULT_SMOOTH_ALPHA;
use crate::engine::FilterThresholds;
use crate::game::duel::{DuelConfig, DEFAULT_DUEL_DURATION_SECONDS};
use crate::game::matchmaking::MatchmakingConfig;
use crate::game::tracking::TrackingConfig;
use crate::snapping::batcher::{
    DEFAULT_SNAP_BATCH_SIZE, DEFAULT_SNAP_DEDUP_METERS, DEFAULT_SNAP_DELAY_MS,
};
use crate::snapping::SnapConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub roads_api_url: String,
    /// Snapping is disabled when absent.
    pub roads_api_key: Option<String>,
    pub tuning: Tuning,
}

/// Every numeric knob of the game pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub min_distance_meters: f64,
    pub max_speed_m_s: f64,
    pub smooth_alpha: f64,
    pub snap_batch_size: usize,
    pub snap_delay_ms: u64,
    pub snap_dedup_meters: f64,
    pub road_half_width_meters: f64,
    pub effect_duration_ms: i64,
    pub duel_duration_seconds: u64,
    pub duel_grace_ms: u64,
    pub weight_kg: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_distance_meters: DEFAULT_MIN_DISTANCE_METERS,
            max_speed_m_s: DEFAULT_MAX_SPEED_M_S,
            smooth_alpha: DEFAULT_SMOOTH_ALPHA,
            snap_batch_size: DEFAULT_SNAP_BATCH_SIZE,
            snap_delay_ms: DEFAULT_SNAP_DELAY_MS,
            snap_dedup_meters: DEFAULT_SNAP_DEDUP_METERS,
            road_half_width_meters: DEFAULT_ROAD_HALF_WIDTH_METERS,
            effect_duration_ms: DEFAULT_EFFECT_DURATION_MS,
            duel_duration_seconds: DEFAULT_DUEL_DURATION_SECONDS,
            duel_grace_ms: 300,
            weight_kg: 70.0,
        }
    }
}

impl Tuning {
    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            filter: FilterThresholds {
                min_distance_meters: self.min_distance_meters,
                max_speed_m_s: self.max_speed_m_s,
            },
            smooth_alpha: self.smooth_alpha,
            road_half_width_meters: self.road_half_width_meters,
            weight_kg: self.weight_kg,
            ..TrackingConfig::default()
        }
    }

    pub fn snap_config(&self) -> SnapConfig {
        SnapConfig {
            batch_size: self.snap_batch_size,
            delay: Duration::from_millis(self.snap_delay_ms),
            dedup_meters: self.snap_dedup_meters,
            ..SnapConfig::default()
        }
    }

    pub fn duel_config(&self) -> DuelConfig {
        DuelConfig {
            duration: Duration::from_secs(self.duel_duration_seconds),
            grace: Duration::from_millis(self.duel_grace_ms),
            ..DuelConfig::default()
        }
    }

    pub fn matchmaking_config(&self) -> MatchmakingConfig {
        MatchmakingConfig::default()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let roads_api_url = env_map
            .get("ROADS_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://roads.googleapis.com".to_string());

        let roads_api_key = env_map
            .get("ROADS_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let tuning = parse_tuning_from_map(&env_map)?;

        Ok(Config {
            port,
            database_path,
            roads_api_url,
            roads_api_key,
            tuning,
        })
    }
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
        None => Ok(default),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), reason.to_string())
}

fn parse_tuning_from_map(env_map: &HashMap<String, String>) -> Result<Tuning, ConfigError> {
    let d = Tuning::default();
    let tuning = Tuning {
        min_distance_meters: parse_or(
            env_map,
            "MIN_DISTANCE_METERS",
            d.min_distance_meters,
            "must be a number",
        )?,
        max_speed_m_s: parse_or(env_map, "MAX_SPEED_M_S", d.max_speed_m_s, "must be a number")?,
        smooth_alpha: parse_or(env_map, "SMOOTH_ALPHA", d.smooth_alpha, "must be a number")?,
        snap_batch_size: parse_or(
            env_map,
            "SNAP_BATCH_SIZE",
            d.snap_batch_size,
            "must be a valid usize",
        )?,
        snap_delay_ms: parse_or(env_map, "SNAP_DELAY_MS", d.snap_delay_ms, "must be a valid u64")?,
        snap_dedup_meters: parse_or(
            env_map,
            "SNAP_DEDUP_METERS",
            d.snap_dedup_meters,
            "must be a number",
        )?,
        road_half_width_meters: parse_or(
            env_map,
            "ROAD_HALF_WIDTH_METERS",
            d.road_half_width_meters,
            "must be a number",
        )?,
        effect_duration_ms: parse_or(
            env_map,
            "EFFECT_DURATION_MS",
            d.effect_duration_ms,
            "must be a valid i64",
        )?,
        duel_duration_seconds: parse_or(
            env_map,
            "DUEL_DURATION_SECONDS",
            d.duel_duration_seconds,
            "must be a valid u64",
        )?,
        duel_grace_ms: parse_or(env_map, "DUEL_GRACE_MS", d.duel_grace_ms, "must be a valid u64")?,
        weight_kg: parse_or(env_map, "WEIGHT_KG", d.weight_kg, "must be a number")?,
    };

    if tuning.min_distance_meters.is_nan() || tuning.min_distance_meters < 0.0 {
        return Err(invalid("MIN_DISTANCE_METERS", "must be >= 0"));
    }
    if tuning.max_speed_m_s.is_nan() || tuning.max_speed_m_s <= 0.0 {
        return Err(invalid("MAX_SPEED_M_S", "must be > 0"));
    }
    if tuning.smooth_alpha.is_nan() || tuning.smooth_alpha <= 0.0 || tuning.smooth_alpha > 1.0 {
        return Err(invalid("SMOOTH_ALPHA", "must be in (0, 1]"));
    }
    if tuning.snap_batch_size == 0 {
        return Err(invalid("SNAP_BATCH_SIZE", "must be >= 1"));
    }
    if tuning.snap_dedup_meters.is_nan() || tuning.snap_dedup_meters < 0.0 {
        return Err(invalid("SNAP_DEDUP_METERS", "must be >= 0"));
    }
    if tuning.road_half_width_meters.is_nan() || tuning.road_half_width_meters <= 0.0 {
        return Err(invalid("ROAD_HALF_WIDTH_METERS", "must be > 0"));
    }
    if tuning.effect_duration_ms <= 0 {
        return Err(invalid("EFFECT_DURATION_MS", "must be > 0"));
    }
    if tuning.duel_duration_seconds == 0 {
        return Err(invalid("DUEL_DURATION_SECONDS", "must be > 0"));
    }
    if tuning.weight_kg.is_nan() || tuning.weight_kg <= 0.0 {
        return Err(invalid("WEIGHT_KG", "must be > 0"));
    }

    Ok(tuning)
}
