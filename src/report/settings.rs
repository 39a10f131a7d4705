use crate::error::ReportError;
use crate::report::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub reports_folder: String,
    pub template: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            reports_folder: "Reports".to_string(),
            template: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRecipients {
    pub teamleaders: String,
    pub tracker: String,
    pub manager: String,
    pub team: String,
}

impl DefaultRecipients {
    pub fn all(&self) -> [&str; 4] {
        [&self.teamleaders, &self.tracker, &self.manager, &self.team]
    }
}

/// Connection knobs kept behind `Mail.showUnsafe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailServerUnsafe {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    #[serde(rename = "requireTLS")]
    pub require_tls: bool,
    #[serde(rename = "rejectUnauthorized")]
    pub reject_unauthorized: bool,
}

impl Default for MailServerUnsafe {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            secure: false,
            require_tls: true,
            reject_unauthorized: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailServerSettings {
    pub username: String,
    pub password: String,
    #[serde(rename = "unsafe")]
    pub unsafe_: MailServerUnsafe,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSettings {
    pub subject_name: String,
    pub default_recipients: DefaultRecipients,
    pub mail_server: MailServerSettings,
    pub show_unsafe: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "General")]
    pub general: GeneralSettings,
    #[serde(rename = "Mail")]
    pub mail: MailSettings,
}

/// Every key `settings get`/`settings set` understands, in display order.
pub const SETTING_KEYS: &[&str] = &[
    "General.reportsFolder",
    "General.template",
    "Mail.subjectName",
    "Mail.showUnsafe",
    "Mail.defaultRecipients.teamleaders",
    "Mail.defaultRecipients.tracker",
    "Mail.defaultRecipients.manager",
    "Mail.defaultRecipients.team",
    "Mail.mailServer.username",
    "Mail.mailServer.password",
    "Mail.mailServer.unsafe.host",
    "Mail.mailServer.unsafe.port",
    "Mail.mailServer.unsafe.secure",
    "Mail.mailServer.unsafe.requireTLS",
    "Mail.mailServer.unsafe.rejectUnauthorized",
];

fn parse_bool(key: &str, raw: &str) -> Result<bool, ReportError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ReportError::InvalidSetting {
            key: key.to_string(),
            reason: format!("expected a boolean, got `{}`", raw.trim()),
        }),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ReportError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ReportError::InvalidSetting {
            key: key.to_string(),
            reason: format!("port must be an integer between 1 and 65535, got `{trimmed}`"),
        }),
    }
}

impl Settings {
    /// Read one field by its dotted JSON key.
    pub fn get_field(&self, key: &str) -> Result<String, ReportError> {
        let mail = &self.mail;
        let server = &mail.mail_server;
        let value = match key {
            "General.reportsFolder" => self.general.reports_folder.clone(),
            "General.template" => self.general.template.clone(),
            "Mail.subjectName" => mail.subject_name.clone(),
            "Mail.showUnsafe" => mail.show_unsafe.to_string(),
            "Mail.defaultRecipients.teamleaders" => mail.default_recipients.teamleaders.clone(),
            "Mail.defaultRecipients.tracker" => mail.default_recipients.tracker.clone(),
            "Mail.defaultRecipients.manager" => mail.default_recipients.manager.clone(),
            "Mail.defaultRecipients.team" => mail.default_recipients.team.clone(),
            "Mail.mailServer.username" => server.username.clone(),
            "Mail.mailServer.password" => server.password.clone(),
            "Mail.mailServer.unsafe.host" => server.unsafe_.host.clone(),
            "Mail.mailServer.unsafe.port" => server.unsafe_.port.to_string(),
            "Mail.mailServer.unsafe.secure" => server.unsafe_.secure.to_string(),
            "Mail.mailServer.unsafe.requireTLS" => server.unsafe_.require_tls.to_string(),
            "Mail.mailServer.unsafe.rejectUnauthorized" => {
                server.unsafe_.reject_unauthorized.to_string()
            }
            other => return Err(ReportError::UnknownSetting(other.to_string())),
        };
        Ok(value)
    }

    /// Validate and assign one field. Nothing changes when validation fails.
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ReportError> {
        let text = raw.trim().to_string();
        let mail = &mut self.mail;
        match key {
            "General.reportsFolder" => {
                let folder = text.trim_end_matches('/').to_string();
                if folder.is_empty() {
                    return Err(ReportError::InvalidSetting {
                        key: key.to_string(),
                        reason: "reports folder cannot be empty".to_string(),
                    });
                }
                self.general.reports_folder = folder;
            }
            "General.template" => self.general.template = text,
            "Mail.subjectName" => mail.subject_name = text,
            "Mail.showUnsafe" => mail.show_unsafe = parse_bool(key, raw)?,
            "Mail.defaultRecipients.teamleaders" => mail.default_recipients.teamleaders = text,
            "Mail.defaultRecipients.tracker" => mail.default_recipients.tracker = text,
            "Mail.defaultRecipients.manager" => mail.default_recipients.manager = text,
            "Mail.defaultRecipients.team" => mail.default_recipients.team = text,
            "Mail.mailServer.username" => mail.mail_server.username = text,
            "Mail.mailServer.password" => mail.mail_server.password = raw.to_string(),
            "Mail.mailServer.unsafe.host" => mail.mail_server.unsafe_.host = text,
            "Mail.mailServer.unsafe.port" => mail.mail_server.unsafe_.port = parse_port(key, raw)?,
            "Mail.mailServer.unsafe.secure" => {
                mail.mail_server.unsafe_.secure = parse_bool(key, raw)?
            }
            "Mail.mailServer.unsafe.requireTLS" => {
                mail.mail_server.unsafe_.require_tls = parse_bool(key, raw)?
            }
            "Mail.mailServer.unsafe.rejectUnauthorized" => {
                mail.mail_server.unsafe_.reject_unauthorized = parse_bool(key, raw)?
            }
            other => return Err(ReportError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

/// Whether `overlay` may replace the default leaf `base`. The only numeric
/// setting is a port.
fn leaf_fits(base: &Value, overlay: &Value) -> bool {
    match (base, overlay) {
        (Value::Number(_), Value::Number(n)) => n
            .as_u64()
            .is_some_and(|port| port > 0 && u16::try_from(port).is_ok()),
        (Value::Bool(_), Value::Bool(_))
        | (Value::String(_), Value::String(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_)) => true,
        _ => false,
    }
}

/// Overlay wins leaf by leaf. Leaves whose type does not match the default
/// keep the default and their dotted key is pushed onto `rejected`.
fn deep_merge(base: Value, overlay: Value, key_path: &str, rejected: &mut Vec<String>) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let child = if key_path.is_empty() {
                    key.clone()
                } else {
                    format!("{key_path}.{key}")
                };
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val, &child, rejected),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (base, overlay) if !leaf_fits(&base, &overlay) => {
            rejected.push(if key_path.is_empty() {
                "<root>".to_string()
            } else {
                key_path.to_string()
            });
            base
        }
        (_base, overlay) => overlay,
    }
}

struct Merged {
    settings: Settings,
    rejected: Vec<String>,
}

fn merge_over_defaults(raw: &str) -> Result<Merged> {
    let persisted: Value = json5::from_str(raw).context("settings are not valid JSON")?;
    let defaults = serde_json::to_value(Settings::default())?;
    let mut rejected = Vec::new();
    let merged = deep_merge(defaults, persisted, "", &mut rejected);
    let settings = serde_json::from_value(merged).context("settings have the wrong shape")?;
    Ok(Merged { settings, rejected })
}

fn warn_rejected_leaf(path: &Path, key: &str) {
    warn::emit(WarnEvent {
        code: "SETTING_TYPE_MISMATCH",
        stage: "settings",
        action: "load",
        path: &path.display().to_string(),
        reason: key,
        err: "kept-default",
    });
}

fn warn_unusable(path: &Path, err: &anyhow::Error) {
    warn::emit(WarnEvent {
        code: "SETTINGS_UNUSABLE",
        stage: "settings",
        action: "load",
        path: &path.display().to_string(),
        reason: "falling-back-to-defaults",
        err: &format!("{err:#}"),
    });
}

/// Persisted values merged leaf by leaf over the defaults. Never fails: a
/// missing file means defaults, an unreadable one is reported and ignored.
pub fn load(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }

    let loaded = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|raw| merge_over_defaults(&raw));
    match loaded {
        Ok(merged) => {
            for key in &merged.rejected {
                warn_rejected_leaf(path, key);
            }
            merged.settings
        }
        Err(err) => {
            warn_unusable(path, &err);
            Settings::default()
        }
    }
}

pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let data = serde_json::to_string_pretty(settings)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage settings in {}", parent.display()))?;
    tmp.write_all(format!("{data}\n").as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn env_string(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_or_string(var: &str, fallback: &mut String) {
    if let Some(value) = env_string(var) {
        *fallback = value;
    }
}

fn env_or_port(var: &str, fallback: u16) -> u16 {
    env_string(var)
        .and_then(|v| parse_port(var, &v).ok())
        .unwrap_or(fallback)
}

/// Runtime-only overrides; these never reach the settings file.
pub fn apply_env_overrides(settings: &mut Settings) {
    env_or_string(
        "DAILY_REPORT_REPORTS_FOLDER",
        &mut settings.general.reports_folder,
    );
    env_or_string("DAILY_REPORT_TEMPLATE", &mut settings.general.template);
    env_or_string("DAILY_REPORT_SUBJECT_NAME", &mut settings.mail.subject_name);

    let server = &mut settings.mail.mail_server;
    env_or_string("DAILY_REPORT_SMTP_USERNAME", &mut server.username);
    if let Ok(password) = env::var("DAILY_REPORT_SMTP_PASSWORD") {
        if !password.is_empty() {
            server.password = password;
        }
    }
    env_or_string("DAILY_REPORT_SMTP_HOST", &mut server.unsafe_.host);
    server.unsafe_.port = env_or_port("DAILY_REPORT_SMTP_PORT", server.unsafe_.port);
}

/// Settings as commands should see them: file over defaults, then env.
pub fn load_effective(path: &Path) -> Settings {
    let mut settings = load(path);
    apply_env_overrides(&mut settings);
    settings
}
