use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub progress: u32,
    pub target: u32,
    pub completed: bool,
}

impl Quest {
    pub fn new(id: impl Into<String>, title: impl Into<String>, target: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            progress: 0,
            target,
            completed: false,
        }
    }

    /// Advances progress, marking the quest complete once the target is hit.
    pub fn advance(&mut self, by: u32) {
        self.progress = self.progress.saturating_add(by).min(self.target);
        self.completed = self.progress >= self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_caps_at_target() {
        let mut q = Quest::new("q1", "Log 3 workouts", 3);
        q.advance(2);
        assert!(!q.completed);
        q.advance(5);
        assert_eq!(q.progress, 3);
        assert!(q.completed);
    }
}
