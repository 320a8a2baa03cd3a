mod cache;
mod folders;
mod rules;
mod settings;
mod stats;

pub use cache::RulesCache;
pub use folders::FoldersStore;
pub use rules::RulesStore;
pub use settings::SettingsStore;
pub use stats::StatsStore;
