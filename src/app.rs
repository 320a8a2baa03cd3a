use std::sync::Arc;

use ratatui::widgets::ListState;

use crate::api::types::{MatchType, Rule, RuleAction, RuleCreate, RuleUpdate};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SignIn,
    Rules,
    Folders,
    Stats,
    Settings,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::SignIn => "Sign in",
            View::Rules => "Rules",
            View::Folders => "Folders",
            View::Stats => "Stats",
            View::Settings => "Settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Status,
    Pattern,
    Match,
    Destination,
    Created,
    Used,
}

impl SortColumn {
    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Status => "status",
            SortColumn::Pattern => "pattern",
            SortColumn::Match => "match",
            SortColumn::Destination => "destination",
            SortColumn::Created => "created",
            SortColumn::Used => "used",
        }
    }

    pub fn next(&self) -> SortColumn {
        match self {
            SortColumn::Status => SortColumn::Pattern,
            SortColumn::Pattern => SortColumn::Match,
            SortColumn::Match => SortColumn::Destination,
            SortColumn::Destination => SortColumn::Created,
            SortColumn::Created => SortColumn::Used,
            SortColumn::Used => SortColumn::Status,
        }
    }

    /// Date and usage columns read most-recent / most-used first.
    fn default_descending(&self) -> bool {
        matches!(self, SortColumn::Created | SortColumn::Used)
    }
}

/// Which field of the rule form has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Pattern,
    MatchType,
    Action,
    Destination,
    MarkAsRead,
}

impl FormField {
    pub fn next(&self) -> FormField {
        match self {
            FormField::Pattern => FormField::MatchType,
            FormField::MatchType => FormField::Action,
            FormField::Action => FormField::Destination,
            FormField::Destination => FormField::MarkAsRead,
            FormField::MarkAsRead => FormField::Pattern,
        }
    }

    pub fn previous(&self) -> FormField {
        match self {
            FormField::Pattern => FormField::MarkAsRead,
            FormField::MatchType => FormField::Pattern,
            FormField::Action => FormField::MatchType,
            FormField::Destination => FormField::Action,
            FormField::MarkAsRead => FormField::Destination,
        }
    }
}

/// Modal form for creating or editing a rule.
#[derive(Debug, Clone)]
pub struct RuleForm {
    /// Set when editing an existing rule
    pub editing_id: Option<String>,
    pub field: FormField,
    pub email_pattern: String,
    pub match_type: MatchType,
    pub action: RuleAction,
    pub destination: String,
    pub mark_as_read: bool,
}

impl RuleForm {
    pub fn blank() -> Self {
        Self {
            editing_id: None,
            field: FormField::Pattern,
            email_pattern: String::new(),
            match_type: MatchType::Exact,
            action: RuleAction::Move,
            destination: String::new(),
            mark_as_read: false,
        }
    }

    pub fn for_rule(rule: &Rule) -> Self {
        Self {
            editing_id: Some(rule.id.clone()),
            field: FormField::Pattern,
            email_pattern: rule.email_pattern.clone(),
            match_type: rule.match_type,
            action: rule.action,
            destination: rule.destination_label_name.clone().unwrap_or_default(),
            mark_as_read: rule.mark_as_read,
        }
    }

    fn destination_or_none(&self) -> Option<String> {
        let trimmed = self.destination.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Why the form can't be submitted yet, if anything.
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.email_pattern.trim().is_empty() {
            return Some("Pattern is required");
        }
        if self.action == RuleAction::Move && self.destination_or_none().is_none() {
            return Some("Move rules need a destination folder");
        }
        None
    }

    pub fn to_create(&self) -> RuleCreate {
        RuleCreate {
            email_pattern: self.email_pattern.trim().to_string(),
            match_type: self.match_type,
            action: self.action,
            destination_label_name: self.destination_or_none(),
            mark_as_read: self.mark_as_read,
        }
    }

    pub fn to_update(&self) -> RuleUpdate {
        RuleUpdate {
            email_pattern: Some(self.email_pattern.trim().to_string()),
            match_type: Some(self.match_type),
            action: Some(self.action),
            destination_label_name: self.destination_or_none(),
            enabled: None,
            mark_as_read: Some(self.mark_as_read),
        }
    }
}

/// Rows of the expanded folder settings panel.
pub const FOLDER_SETTING_ROWS: usize = 4;

/// A modal layered over the current view.
#[derive(Debug, Clone)]
pub enum Overlay {
    None,
    RuleForm(RuleForm),
    ConfirmDeleteRule(String),
    FolderName(String),
    ConfirmDeleteFolder(String),
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }
}

pub struct App {
    pub config: Arc<Config>,
    pub view: View,
    pub should_quit: bool,
    /// True while the browser sign-in roundtrip is in flight
    pub signing_in: bool,

    pub list_state: ListState,
    pub folder_state: ListState,
    pub settings_cursor: usize,

    pub search_query: String,
    /// Keystrokes go to the filter instead of navigation
    pub searching: bool,
    pub sort_column: SortColumn,
    pub sort_descending: bool,

    pub overlay: Overlay,
    /// Folder whose settings panel is open, plus the row cursor inside it
    pub expanded_folder: Option<String>,
    pub folder_setting_cursor: usize,

    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Arc<Config>, authenticated: bool) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let mut folder_state = ListState::default();
        folder_state.select(Some(0));

        Self {
            config,
            view: if authenticated {
                View::Rules
            } else {
                View::SignIn
            },
            should_quit: false,
            signing_in: false,
            list_state,
            folder_state,
            settings_cursor: 0,
            search_query: String::new(),
            searching: false,
            sort_column: SortColumn::Created,
            sort_descending: true,
            overlay: Overlay::None,
            expanded_folder: None,
            folder_setting_cursor: 0,
            status_message: None,
        }
    }

    /// The rule list as rendered: filtered by the search query, then
    /// sorted by the active column. Filtering matches the pattern and the
    /// destination, case-insensitively.
    pub fn visible_rules(&self, rules: &[Rule]) -> Vec<Rule> {
        let query = self.search_query.to_lowercase();
        let mut visible: Vec<Rule> = rules
            .iter()
            .filter(|r| {
                query.is_empty()
                    || r.email_pattern.to_lowercase().contains(&query)
                    || r.destination_display().to_lowercase().contains(&query)
            })
            .cloned()
            .collect();

        visible.sort_by(|a, b| {
            let ord = match self.sort_column {
                // Enabled rules first when ascending
                SortColumn::Status => b.enabled.cmp(&a.enabled),
                SortColumn::Pattern => a
                    .email_pattern
                    .to_lowercase()
                    .cmp(&b.email_pattern.to_lowercase()),
                SortColumn::Match => a.match_type.label().cmp(b.match_type.label()),
                SortColumn::Destination => a
                    .destination_display()
                    .to_lowercase()
                    .cmp(&b.destination_display().to_lowercase()),
                SortColumn::Created => a.created_at.cmp(&b.created_at),
                SortColumn::Used => a.times_applied.cmp(&b.times_applied),
            };
            if self.sort_descending {
                ord.reverse()
            } else {
                ord
            }
        });

        visible
    }

    /// Cycle to the given sort column, or flip direction when it's already
    /// the active one.
    pub fn sort_by(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.sort_descending = !self.sort_descending;
        } else {
            self.sort_column = column;
            self.sort_descending = column.default_descending();
        }
    }

    pub fn selected_rule(&self, visible: &[Rule]) -> Option<Rule> {
        self.list_state
            .selected()
            .and_then(|i| visible.get(i).cloned())
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn select_previous(&mut self) {
        let i = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(i.saturating_sub(1)));
    }

    /// Keep the selection inside the (possibly shrunken) visible list.
    pub fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.list_state.select(Some(0));
        } else if self.list_state.selected().unwrap_or(0) >= len {
            self.list_state.select(Some(len - 1));
        }
    }

    pub fn folder_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.folder_state.selected().unwrap_or(0);
        self.folder_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn folder_previous(&mut self) {
        let i = self.folder_state.selected().unwrap_or(0);
        self.folder_state.select(Some(i.saturating_sub(1)));
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn app() -> App {
        App::new(Arc::new(Config::default()), true)
    }

    fn rule(id: &str, pattern: &str, dest: Option<&str>, used: u64, day: u32) -> Rule {
        Rule {
            id: id.to_string(),
            email_pattern: pattern.to_string(),
            match_type: MatchType::Exact,
            action: if dest.is_some() {
                RuleAction::Move
            } else {
                RuleAction::BlockDelete
            },
            destination_label_name: dest.map(|s| s.to_string()),
            enabled: true,
            mark_as_read: false,
            times_applied: used,
            created_at: Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn defaults_to_newest_first() {
        let app = app();
        let rules = vec![
            rule("r1", "a@b.com", None, 0, 1),
            rule("r2", "c@d.com", None, 0, 5),
            rule("r3", "e@f.com", None, 0, 3),
        ];
        let ids: Vec<String> = app
            .visible_rules(&rules)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r2", "r3", "r1"]);
    }

    #[test]
    fn filter_matches_pattern_and_destination() {
        let mut app = app();
        let rules = vec![
            rule("r1", "news@daily.com", Some("@News"), 0, 1),
            rule("r2", "billing@shop.com", Some("@Receipts"), 0, 2),
            rule("r3", "promo@daily.com", Some("@Receipts"), 0, 3),
        ];

        app.search_query = "DAILY".to_string();
        let ids: Vec<String> = app
            .visible_rules(&rules)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r3", "r1"]);

        app.search_query = "receipts".to_string();
        let ids: Vec<String> = app
            .visible_rules(&rules)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r3", "r2"]);
    }

    #[test]
    fn sorting_by_pattern_is_case_insensitive() {
        let mut app = app();
        app.sort_by(SortColumn::Pattern);
        assert!(!app.sort_descending);

        let rules = vec![
            rule("r1", "Zebra@x.com", None, 0, 1),
            rule("r2", "apple@x.com", None, 0, 2),
        ];
        let ids: Vec<String> = app
            .visible_rules(&rules)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r2", "r1"]);
    }

    #[test]
    fn repeated_sort_flips_direction() {
        let mut app = app();
        app.sort_by(SortColumn::Used);
        assert!(app.sort_descending);
        app.sort_by(SortColumn::Used);
        assert!(!app.sort_descending);
        app.sort_by(SortColumn::Pattern);
        assert!(!app.sort_descending);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = app();
        app.select_next(3);
        app.select_next(3);
        app.select_next(3);
        app.select_next(3);
        assert_eq!(app.list_state.selected(), Some(2));

        app.clamp_selection(1);
        assert_eq!(app.list_state.selected(), Some(0));

        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn form_requires_pattern_and_move_destination() {
        let mut form = RuleForm::blank();
        assert_eq!(form.validation_error(), Some("Pattern is required"));

        form.email_pattern = "a@b.com".to_string();
        assert_eq!(
            form.validation_error(),
            Some("Move rules need a destination folder")
        );

        form.destination = "@Work".to_string();
        assert!(form.validation_error().is_none());

        form.destination.clear();
        form.action = RuleAction::BlockDelete;
        assert!(form.validation_error().is_none());
        assert!(form.to_create().destination_label_name.is_none());
    }

    #[test]
    fn edit_form_prefills_from_rule() {
        let source = rule("r1", "news@daily.com", Some("@News"), 3, 1);
        let form = RuleForm::for_rule(&source);
        assert_eq!(form.editing_id.as_deref(), Some("r1"));
        assert_eq!(form.email_pattern, "news@daily.com");
        assert_eq!(form.destination, "@News");

        let update = form.to_update();
        assert_eq!(update.email_pattern.as_deref(), Some("news@daily.com"));
        assert_eq!(update.enabled, None);
    }
}
