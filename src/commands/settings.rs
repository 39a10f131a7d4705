use anyhow::Result;

use crate::commands::{CommandReport, GlobalOptions, record_audit, run_with_host};
use crate::report::settings::{self as settings_store, SETTING_KEYS, Settings};

const PASSWORD_KEY: &str = "Mail.mailServer.password";
const UNSAFE_PREFIX: &str = "Mail.mailServer.unsafe.";

#[derive(Debug, Clone)]
pub enum SettingsAction {
    Show { include_unsafe: bool },
    Get { key: String },
    Set { key: String, value: String },
    Path,
}

fn masked(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// `key=value` lines for display. The password is never shown in clear.
pub fn render_lines(settings: &Settings, include_unsafe: bool) -> Vec<String> {
    let include_unsafe = include_unsafe || settings.mail.show_unsafe;
    SETTING_KEYS
        .iter()
        .filter(|key| include_unsafe || !key.starts_with(UNSAFE_PREFIX))
        .filter_map(|key| {
            let value = settings.get_field(key).ok()?;
            let value = if *key == PASSWORD_KEY {
                masked(&value)
            } else {
                value
            };
            Some(format!("{key}={value}"))
        })
        .collect()
}

pub fn run(global: &GlobalOptions, action: &SettingsAction) -> Result<CommandReport> {
    run_with_host(global, "settings", |host, report| {
        match action {
            SettingsAction::Show { include_unsafe } => {
                for line in render_lines(&host.settings, *include_unsafe) {
                    report.detail(line);
                }
            }
            SettingsAction::Get { key } => {
                report.detail(host.settings.get_field(key)?);
            }
            SettingsAction::Set { key, value } => {
                // Env overrides stay out of the persisted file.
                let mut persisted = settings_store::load(&host.paths.settings_file);
                persisted.set_field(key, value)?;
                settings_store::save(&host.paths.settings_file, &persisted)?;

                let shown = if key.as_str() == PASSWORD_KEY {
                    masked(value)
                } else {
                    persisted.get_field(key)?
                };
                report.detail(format!("{key}={shown}"));
                record_audit(&host.paths, "settings", "ok", &format!("set {key}"));
            }
            SettingsAction::Path => {
                report.detail(host.paths.settings_file.display().to_string());
            }
        }
        Ok(())
    })
}
