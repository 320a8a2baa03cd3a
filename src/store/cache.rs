use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Result;

use crate::api::types::Rule;

/// Fixed application-scoped key the rule mirror is stored under.
const CACHE_KEY: &str = "sweep_rules";

/// Persisted mirror of the last known rule set. A durability fallback for
/// when a live fetch fails, never a second writable copy: the only writer
/// is a successful non-empty refresh.
pub struct RulesCache {
    path: Option<PathBuf>,
}

impl RulesCache {
    pub fn new() -> Self {
        Self {
            path: dirs::cache_dir().map(|p| p.join("sweeptui").join(format!("{}.json", CACHE_KEY))),
        }
    }

    /// Cache backed by an explicit file, for tests.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Load the cached rules. Any miss or corruption reads as empty.
    pub fn load(&self) -> Vec<Rule> {
        let path = match &self.path {
            Some(p) => p,
            None => return Vec::new(),
        };

        if !path.exists() {
            return Vec::new();
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
    }

    pub fn save(&self, rules: &[Rule]) -> Result<()> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), rules)?;
        Ok(())
    }
}

impl Default for RulesCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{MatchType, RuleAction};
    use chrono::Utc;

    fn rule(id: &str) -> Rule {
        Rule {
            id: id.to_string(),
            email_pattern: "news@example.com".to_string(),
            match_type: MatchType::Exact,
            action: RuleAction::Move,
            destination_label_name: Some("@News".to_string()),
            enabled: true,
            mark_as_read: false,
            times_applied: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_rules() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RulesCache::at_path(dir.path().join("sweep_rules.json"));

        cache.save(&[rule("r1"), rule("r2")]).unwrap();
        let loaded = cache.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "r1");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RulesCache::at_path(dir.path().join("nope.json"));
        assert!(cache.load().is_empty());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep_rules.json");
        std::fs::write(&path, "{not json").unwrap();
        let cache = RulesCache::at_path(path);
        assert!(cache.load().is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/sweep_rules.json");
        let cache = RulesCache::at_path(path);
        cache.save(&[rule("r1")]).unwrap();
        assert_eq!(cache.load().len(), 1);
    }
}
