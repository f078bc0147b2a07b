use serde::{Deserialize, Serialize};
use std::fmt;

/// Gamified progression counters (level, xp, streaks).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Progression {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next: u64,
    pub streak_days: u32,
    pub shields: u32,
    pub multiplier: f64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: 100,
            streak_days: 0,
            shields: 0,
            multiplier: 1.0,
        }
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level {} ({}/{} xp), streak {} day{}",
            self.level,
            self.xp,
            self.xp_to_next,
            self.streak_days,
            if self.streak_days == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_default_is_zeroed() {
        let p = Progression::default();
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 0);
        assert_eq!(p.streak_days, 0);
        assert_eq!(p.shields, 0);
        assert_eq!(p.multiplier, 1.0);
    }

    #[test]
    fn test_progression_camel_case_fields() {
        let json = serde_json::to_value(Progression::default()).unwrap();
        assert!(json.get("xpToNext").is_some());
        assert!(json.get("streakDays").is_some());
    }

    #[test]
    fn test_progression_partial_json_uses_defaults() {
        let p: Progression = serde_json::from_str(r#"{"level": 4}"#).unwrap();
        assert_eq!(p.level, 4);
        assert_eq!(p.xp_to_next, 100);
    }

    #[test]
    fn test_progression_display() {
        let p = Progression {
            streak_days: 1,
            ..Progression::default()
        };
        assert_eq!(format!("{}", p), "Level 1 (0/100 xp), streak 1 day");
    }
}
