pub mod archive_reports;
pub mod insert_template;
pub mod list_reports;
pub mod open_report;
pub mod send_reports;
pub mod settings;

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::ReportError;
use crate::report::audit;
use crate::report::paths::{ReportPaths, resolve_paths};
use crate::report::settings::{self as settings_store, Settings};
use crate::report::vault::FsVault;
use crate::report::warn::{self, WarnEvent};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Where the vault and its settings live, from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub vault: Option<PathBuf>,
    pub settings: Option<PathBuf>,
}

/// Everything a command needs: resolved paths, effective settings, and the
/// vault on disk.
pub struct Host {
    pub paths: ReportPaths,
    pub settings: Settings,
    pub vault: FsVault,
}

impl Host {
    pub fn open(opts: &GlobalOptions) -> Self {
        let paths = resolve_paths(opts.vault.clone(), opts.settings.clone());
        let settings = settings_store::load_effective(&paths.settings_file);
        let vault = FsVault::new(paths.vault_root.clone());
        Self {
            paths,
            settings,
            vault,
        }
    }
}

/// Audit failures are warned about, never fatal to the command.
pub fn record_audit(paths: &ReportPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = audit::append_event(paths, phase, status, message) {
        warn::emit(WarnEvent {
            code: "AUDIT_WRITE_FAILED",
            stage: phase,
            action: "append-audit",
            path: &paths.audit_log().display().to_string(),
            reason: status,
            err: &format!("{err:#}"),
        });
    }
}

pub fn run_with_host<F>(opts: &GlobalOptions, command: &str, body: F) -> Result<CommandReport>
where
    F: FnOnce(&Host, &mut CommandReport) -> Result<()>,
{
    let host = Host::open(opts);
    let mut report = CommandReport::new(command);
    if let Err(err) = body(&host, &mut report) {
        if let Some(domain) = err.downcast_ref::<ReportError>() {
            warn::emit(WarnEvent {
                code: domain.code(),
                stage: command,
                action: "run-command",
                path: &host.paths.vault_root.display().to_string(),
                reason: "aborted",
                err: &domain.to_string(),
            });
        }
        report.issue(format!("{err:#}"));
    }
    Ok(report)
}
