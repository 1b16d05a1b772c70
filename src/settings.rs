//! Runtime settings
//!
//! Options the host can flip without touching balance data. Loaded from JSON;
//! anything unreadable falls back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DT, MAX_DT};

/// How overlapping blasts treat a target caught in more than one radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExplosionPolicy {
    /// Every blast applies its damage independently
    #[default]
    Stack,
    /// A target takes blast damage at most once per frame
    Dedup,
}

impl ExplosionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplosionPolicy::Stack => "stack",
            ExplosionPolicy::Dedup => "dedup",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stack" | "stacking" => Some(ExplosionPolicy::Stack),
            "dedup" | "deduplicate" | "once" => Some(ExplosionPolicy::Dedup),
            _ => None,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overlapping blast behavior
    pub explosion_policy: ExplosionPolicy,
    /// Frame time used when the host reports none
    pub default_dt: f32,
    /// Upper clamp on a single frame
    pub max_dt: f32,
    /// Fixed run seed (None = host picks one)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            explosion_policy: ExplosionPolicy::Stack,
            default_dt: DEFAULT_DT,
            max_dt: MAX_DT,
            seed: None,
        }
    }
}

impl Settings {
    /// Parse settings from JSON, falling back to defaults on any problem
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring unreadable settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Clamp out-of-range frame times back to sane values
    pub fn sanitized(mut self) -> Self {
        if !(self.default_dt.is_finite() && self.default_dt > 0.0) {
            log::warn!("default_dt {} rejected", self.default_dt);
            self.default_dt = DEFAULT_DT;
        }
        if !(self.max_dt.is_finite() && self.max_dt >= self.default_dt) {
            log::warn!("max_dt {} rejected", self.max_dt);
            self.max_dt = MAX_DT.max(self.default_dt);
        }
        self
    }

    /// Effective frame time for a host-reported delta
    pub fn frame_dt(&self, raw: Option<f32>) -> f32 {
        crate::clamp_dt(raw, self.default_dt, self.max_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!(ExplosionPolicy::from_str("Stack"), Some(ExplosionPolicy::Stack));
        assert_eq!(ExplosionPolicy::from_str("dedup"), Some(ExplosionPolicy::Dedup));
        assert_eq!(ExplosionPolicy::from_str("sometimes"), None);
        assert_eq!(ExplosionPolicy::Dedup.as_str(), "dedup");
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(r#"{ "explosion_policy": "dedup", "seed": 7 }"#);
        assert_eq!(settings.explosion_policy, ExplosionPolicy::Dedup);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.default_dt, DEFAULT_DT);
    }

    #[test]
    fn test_from_json_garbage_falls_back() {
        let settings = Settings::from_json("not json");
        assert_eq!(settings.explosion_policy, ExplosionPolicy::Stack);
        assert_eq!(settings.max_dt, MAX_DT);
    }

    #[test]
    fn test_sanitize_bad_dt() {
        let settings = Settings::from_json(r#"{ "default_dt": -1.0, "max_dt": 0.0 }"#);
        assert_eq!(settings.default_dt, DEFAULT_DT);
        assert!(settings.max_dt >= settings.default_dt);
        assert_eq!(settings.frame_dt(None), DEFAULT_DT);
    }
}
