use anyhow::Result;
use chrono::Local;

use crate::commands::{CommandReport, GlobalOptions, record_audit, run_with_host};
use crate::report::archiver::{Disposition, archive_old_reports};
use crate::report::frontmatter::FrontmatterStore;
use crate::report::lock::BatchLock;
use crate::report::repository::ReportRepository;

pub fn run(global: &GlobalOptions) -> Result<CommandReport> {
    run_with_host(global, "archive-daily-reports", |host, report| {
        let _lock = BatchLock::acquire(&host.paths.lock_file)?;
        let repo = ReportRepository::new(&host.vault, &host.settings.general);
        let store = FrontmatterStore::new(&host.vault);

        let outcome = archive_old_reports(&host.vault, &store, &repo, Local::now().date_naive())?;
        if outcome.folder_created {
            report.detail(format!(
                "created reports folder {}",
                host.settings.general.reports_folder
            ));
        }
        if outcome.no_files() {
            report.detail("No daily report files found");
            return Ok(());
        }

        for entry in &outcome.entries {
            let path = entry.path.as_str();
            match &entry.disposition {
                Disposition::Archived { to } => {
                    report.detail(format!("Daily report {path} has been archived."));
                    record_audit(&host.paths, "archive", "ok", &format!("{path} -> {to}"));
                }
                Disposition::Skipped(reason) => {
                    report.detail(format!("kept {path} ({})", reason.as_str()));
                }
                Disposition::Failed { error } => {
                    report.issue(format!("Error archiving daily report {path}: {error}"));
                    record_audit(&host.paths, "archive", "failed", &format!("{path}: {error}"));
                }
            }
        }

        report.detail(format!(
            "archived={} failed={}",
            outcome.archived(),
            outcome.failed()
        ));
        Ok(())
    })
}
