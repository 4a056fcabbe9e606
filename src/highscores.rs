//! Local leaderboard and the score submission boundary
//!
//! The top ten runs are kept in LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

pub const MAX_HIGH_SCORES: usize = 10;

/// Receives the final score of a run (game over or quit to menu)
pub trait ScoreSink {
    fn submit_score(&mut self, score: u64, level: u32) -> Result<(), PersistenceError>;
}

/// One finished run on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level the run ended on
    pub level: u32,
    /// Unix time in ms
    pub timestamp: f64,
}

/// Best runs, highest score first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "debug_defender_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Index a score would be inserted at. Ties rank below existing entries.
    fn slot_for(&self, score: u64) -> usize {
        self.entries.partition_point(|e| e.score >= score)
    }

    /// Zero never qualifies; otherwise the board must have room or the
    /// score must beat its last entry
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0 && self.slot_for(score) < MAX_HIGH_SCORES
    }

    /// 1-based rank the score would get, `None` if it would not be listed
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        self.qualifies(score).then(|| self.slot_for(score) + 1)
    }

    /// Record a run. Returns its 1-based rank if it made the board.
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(rank - 1, HighScoreEntry { score, level, timestamp });
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Stored leaderboard, or an empty one if missing or unreadable
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::platform::storage::read(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores;
                }
                Err(e) => log::warn!("Ignoring corrupt high scores: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("High scores unavailable: {}", e),
        }
        Self::new()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        crate::platform::storage::write(Self::STORAGE_KEY, &json)?;
        log::debug!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Native builds keep the board in memory only
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
fn timestamp_ms() -> f64 {
    crate::platform::storage::timestamp_ms()
}

#[cfg(not(target_arch = "wasm32"))]
fn timestamp_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

impl ScoreSink for HighScores {
    fn submit_score(&mut self, score: u64, level: u32) -> Result<(), PersistenceError> {
        if let Some(rank) = self.add_score(score, level, timestamp_ms()) {
            log::info!("New high score #{}: {} (level {})", rank, score, level);
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_stay_sorted_and_capped() {
        let mut scores = HighScores::new();
        for (i, s) in [300u64, 100, 500, 200].iter().enumerate() {
            scores.add_score(*s, 1, i as f64);
        }
        let ordered: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(ordered, vec![500, 300, 200, 100]);

        for s in 1000..1020 {
            scores.add_score(s, 2, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1019));
        assert!(!scores.qualifies(500));
    }

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.potential_rank(0), None);
        assert_eq!(scores.potential_rank(10), Some(1));
    }

    #[test]
    fn test_submit_records_level() {
        let mut scores = HighScores::new();
        scores.submit_score(1200, 3).unwrap();
        scores.submit_score(0, 1).unwrap();
        assert_eq!(scores.entries.len(), 1);
        assert_eq!(scores.entries[0].level, 3);
    }
}
