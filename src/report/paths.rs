use std::env;
use std::path::{Path, PathBuf};

const STATE_DIR: &str = ".daily-report";

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub vault_root: PathBuf,
    pub settings_file: PathBuf,
    pub logs_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl ReportPaths {
    pub fn for_vault(vault_root: &Path, settings_file: Option<PathBuf>) -> Self {
        let state_dir = vault_root.join(STATE_DIR);
        Self {
            vault_root: vault_root.to_path_buf(),
            settings_file: settings_file.unwrap_or_else(|| state_dir.join("data.json")),
            logs_dir: state_dir.join("logs"),
            lock_file: state_dir.join("batch.lock"),
        }
    }

    pub fn audit_log(&self) -> PathBuf {
        self.logs_dir.join("audit.log")
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

/// Flags win over `DAILY_REPORT_VAULT` / `DAILY_REPORT_SETTINGS`; the vault
/// falls back to the working directory.
pub fn resolve_paths(vault: Option<PathBuf>, settings: Option<PathBuf>) -> ReportPaths {
    let vault_root = vault
        .or_else(|| env_path("DAILY_REPORT_VAULT"))
        .unwrap_or_else(|| PathBuf::from("."));
    let settings_file = settings.or_else(|| env_path("DAILY_REPORT_SETTINGS"));
    ReportPaths::for_vault(&vault_root, settings_file)
}
