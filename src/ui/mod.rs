mod folders;
mod help;
mod pane;
mod rules;
mod settings;
mod signin;
mod stats;
mod toast;

pub use folders::{render_folder_name, render_folders};
pub use help::render_help;
pub use rules::{render_confirm, render_rule_form, render_rules};
pub use settings::{SETTINGS_ROWS, render_settings};
pub use signin::render_signin;
pub use stats::render_stats;
pub use toast::render_toasts;
