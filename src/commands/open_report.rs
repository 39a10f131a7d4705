use anyhow::Result;
use chrono::Utc;

use crate::commands::{CommandReport, GlobalOptions, run_with_host};
use crate::report::repository::ReportRepository;
use crate::report::workspace::EditorWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Create,
    OpenToday,
}

impl OpenMode {
    fn command(self) -> &'static str {
        match self {
            Self::Create => "create-new-daily-report",
            Self::OpenToday => "open-todays-report",
        }
    }

    fn start_notice(self) -> &'static str {
        match self {
            Self::Create => "Creating New Daily Report...",
            Self::OpenToday => "Opening Daily Report...",
        }
    }

    fn failure_notice(self) -> &'static str {
        match self {
            Self::Create => "Error Creating New Daily Report",
            Self::OpenToday => "Failed to open today's daily report",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenReportOptions {
    pub mode: OpenMode,
    pub no_open: bool,
}

pub fn run(global: &GlobalOptions, opts: &OpenReportOptions) -> Result<CommandReport> {
    run_with_host(global, opts.mode.command(), |host, report| {
        report.detail(opts.mode.start_notice());

        let workspace = if opts.no_open {
            EditorWorkspace::detached(&host.paths.vault_root)
        } else {
            EditorWorkspace::from_env(&host.paths.vault_root)
        };
        let repo = ReportRepository::new(&host.vault, &host.settings.general);

        // Report names follow the UTC calendar date.
        match repo.open_or_create_today(&workspace, Utc::now().date_naive()) {
            Ok(outcome) => {
                if outcome.folder_created {
                    report.detail(format!(
                        "created reports folder {}",
                        host.settings.general.reports_folder
                    ));
                }
                let state = if outcome.report_created {
                    "created"
                } else {
                    "existing"
                };
                report.detail(format!("report={} ({state})", outcome.path));
                report.detail(format!(
                    "file={}",
                    host.vault.absolute(&outcome.path).display()
                ));
                if let Some(editor) = workspace.editor() {
                    report.detail(format!("opened with {editor}"));
                }
            }
            Err(err) => report.issue(format!("{}: {err:#}", opts.mode.failure_notice())),
        }
        Ok(())
    })
}
