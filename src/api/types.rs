use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a rule's pattern is matched against a sender address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Domain,
    Contains,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Domain => "domain",
            MatchType::Contains => "contains",
        }
    }

    pub fn next(&self) -> MatchType {
        match self {
            MatchType::Exact => MatchType::Domain,
            MatchType::Domain => MatchType::Contains,
            MatchType::Contains => MatchType::Exact,
        }
    }
}

/// What happens to a matching email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Move,
    BlockDelete,
    ReadArchive,
}

impl RuleAction {
    pub fn label(&self) -> &'static str {
        match self {
            RuleAction::Move => "move",
            RuleAction::BlockDelete => "block & delete",
            RuleAction::ReadArchive => "read & archive",
        }
    }

    pub fn next(&self) -> RuleAction {
        match self {
            RuleAction::Move => RuleAction::BlockDelete,
            RuleAction::BlockDelete => RuleAction::ReadArchive,
            RuleAction::ReadArchive => RuleAction::Move,
        }
    }
}

/// One sorting directive, as stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub email_pattern: String,
    pub match_type: MatchType,
    pub action: RuleAction,
    #[serde(default)]
    pub destination_label_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub mark_as_read: bool,
    #[serde(default)]
    pub times_applied: u64,
    pub created_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn destination_display(&self) -> &str {
        match self.action {
            RuleAction::Move => self.destination_label_name.as_deref().unwrap_or("(none)"),
            RuleAction::BlockDelete => "(deleted)",
            RuleAction::ReadArchive => "(archive)",
        }
    }
}

/// Payload for POST /rules. The server assigns the id and counters.
#[derive(Debug, Clone, Serialize)]
pub struct RuleCreate {
    pub email_pattern: String,
    pub match_type: MatchType,
    pub action: RuleAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_label_name: Option<String>,
    pub mark_as_read: bool,
}

/// Partial update for PUT /rules/{id}; only set fields go over the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_label_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_as_read: Option<bool>,
}

impl RuleUpdate {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Merge the set fields into a rule (the optimistic half of an update).
    pub fn apply_to(&self, rule: &mut Rule) {
        if let Some(ref pattern) = self.email_pattern {
            rule.email_pattern = pattern.clone();
        }
        if let Some(match_type) = self.match_type {
            rule.match_type = match_type;
        }
        if let Some(action) = self.action {
            rule.action = action;
        }
        if let Some(ref dest) = self.destination_label_name {
            rule.destination_label_name = Some(dest.clone());
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(mark_as_read) = self.mark_as_read {
            rule.mark_as_read = mark_as_read;
        }
    }
}

/// A distinguished provider label; names start with `@` by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicFolder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hours,
    Days,
}

impl TimeUnit {
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    pub fn toggled(&self) -> TimeUnit {
        match self {
            TimeUnit::Hours => TimeUnit::Days,
            TimeUnit::Days => TimeUnit::Hours,
        }
    }

    /// Largest value the backend accepts for this unit.
    pub fn max_value(&self) -> u32 {
        match self {
            TimeUnit::Hours => 720,
            TimeUnit::Days => 365,
        }
    }
}

/// Per-folder auto-archive policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSettings {
    #[serde(default)]
    pub archive_read_enabled: bool,
    #[serde(default = "default_archive_read_value")]
    pub archive_read_value: u32,
    #[serde(default = "default_unit")]
    pub archive_read_unit: TimeUnit,
    #[serde(default)]
    pub archive_unread_enabled: bool,
    #[serde(default = "default_archive_unread_value")]
    pub archive_unread_value: u32,
    #[serde(default = "default_unit")]
    pub archive_unread_unit: TimeUnit,
}

fn default_archive_read_value() -> u32 {
    30
}

fn default_archive_unread_value() -> u32 {
    60
}

fn default_unit() -> TimeUnit {
    TimeUnit::Days
}

impl Default for FolderSettings {
    fn default() -> Self {
        Self {
            archive_read_enabled: false,
            archive_read_value: default_archive_read_value(),
            archive_read_unit: default_unit(),
            archive_unread_enabled: false,
            archive_unread_value: default_archive_unread_value(),
            archive_unread_unit: default_unit(),
        }
    }
}

/// Partial update for PUT /magic-folders/{id}/settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_read_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_read_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_read_unit: Option<TimeUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_unread_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_unread_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_unread_unit: Option<TimeUnit>,
}

impl FolderSettingsUpdate {
    pub fn apply_to(&self, settings: &mut FolderSettings) {
        if let Some(v) = self.archive_read_enabled {
            settings.archive_read_enabled = v;
        }
        if let Some(v) = self.archive_read_value {
            settings.archive_read_value = v;
        }
        if let Some(v) = self.archive_read_unit {
            settings.archive_read_unit = v;
        }
        if let Some(v) = self.archive_unread_enabled {
            settings.archive_unread_enabled = v;
        }
        if let Some(v) = self.archive_unread_value {
            settings.archive_unread_value = v;
        }
        if let Some(v) = self.archive_unread_unit {
            settings.archive_unread_unit = v;
        }
    }

    /// Capture the current values of exactly the keys this update sets,
    /// so a failed PUT can restore them without touching anything else.
    pub fn previous_of(&self, settings: &FolderSettings) -> FolderSettingsUpdate {
        FolderSettingsUpdate {
            archive_read_enabled: self
                .archive_read_enabled
                .map(|_| settings.archive_read_enabled),
            archive_read_value: self.archive_read_value.map(|_| settings.archive_read_value),
            archive_read_unit: self.archive_read_unit.map(|_| settings.archive_read_unit),
            archive_unread_enabled: self
                .archive_unread_enabled
                .map(|_| settings.archive_unread_enabled),
            archive_unread_value: self
                .archive_unread_value
                .map(|_| settings.archive_unread_value),
            archive_unread_unit: self
                .archive_unread_unit
                .map(|_| settings.archive_unread_unit),
        }
    }
}

/// Account-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_enabled")]
    pub blackhole_enabled: bool,
    #[serde(default = "default_blackhole_days")]
    pub blackhole_delete_days: u32,
}

fn default_blackhole_days() -> u32 {
    7
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            blackhole_enabled: true,
            blackhole_delete_days: default_blackhole_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blackhole_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blackhole_delete_days: Option<u32>,
}

impl UserSettingsUpdate {
    pub fn apply_to(&self, settings: &mut UserSettings) {
        if let Some(v) = self.blackhole_enabled {
            settings.blackhole_enabled = v;
        }
        if let Some(v) = self.blackhole_delete_days {
            settings.blackhole_delete_days = v;
        }
    }

    pub fn previous_of(&self, settings: &UserSettings) -> UserSettingsUpdate {
        UserSettingsUpdate {
            blackhole_enabled: self.blackhole_enabled.map(|_| settings.blackhole_enabled),
            blackhole_delete_days: self
                .blackhole_delete_days
                .map(|_| settings.blackhole_delete_days),
        }
    }
}

/// Server-side processing counters shown on the stats view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    #[serde(default)]
    pub emails_processed: u64,
    #[serde(default)]
    pub rules_count: u64,
    #[serde(default)]
    pub last_processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WatchStatus {
    #[serde(default)]
    pub watching: bool,
}

/// DELETE /magic-folders/{id} reports how many rules the cascade removed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FolderDeleted {
    #[serde(default)]
    pub rules_deleted: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupResult {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUrl {
    pub authorization_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
