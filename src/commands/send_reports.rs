use anyhow::Result;
use chrono::Local;

use crate::commands::{CommandReport, GlobalOptions, record_audit, run_with_host};
use crate::report::dispatch::{SendDisposition, send_all};
use crate::report::frontmatter::FrontmatterStore;
use crate::report::lock::BatchLock;
use crate::report::mailer::SmtpMailer;
use crate::report::repository::ReportRepository;

pub fn run(global: &GlobalOptions) -> Result<CommandReport> {
    run_with_host(global, "send-daily-reports", |host, report| {
        let _lock = BatchLock::acquire(&host.paths.lock_file)?;
        let mailer = SmtpMailer::from_settings(&host.settings.mail.mail_server)?;
        let repo = ReportRepository::new(&host.vault, &host.settings.general);
        let store = FrontmatterStore::new(&host.vault);

        report.detail("Sending Daily Reports...");
        let outcome = send_all(
            &host.vault,
            &store,
            &mailer,
            &repo,
            &host.settings.mail,
            Local::now(),
        )?;

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
                SendDisposition::Sent => {
                    report.detail(format!("Daily report {path} sent."));
                    record_audit(&host.paths, "send", "ok", path);
                }
                SendDisposition::AlreadySent => {
                    report.detail(format!("skipped {path} (already sent)"));
                }
                SendDisposition::NotANote => {
                    report.detail(format!("skipped {path} (not a note)"));
                }
                SendDisposition::SentUnmarked { error } => {
                    report.issue(format!("Error marking report as sent {path}: {error}"));
                    record_audit(
                        &host.paths,
                        "send",
                        "unmarked",
                        &format!("{path}: {error}"),
                    );
                }
                SendDisposition::Failed { error } => {
                    report.issue(format!("Error sending daily report {path}: {error}"));
                    record_audit(&host.paths, "send", "failed", &format!("{path}: {error}"));
                }
            }
        }

        report.detail(format!("delivered={}", outcome.delivered()));
        report.detail("Daily Reports Sent!");
        Ok(())
    })
}
