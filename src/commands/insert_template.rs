use anyhow::Result;
use chrono::Utc;

use crate::commands::{CommandReport, GlobalOptions, run_with_host};
use crate::report::repository::ReportRepository;
use crate::report::template::{Cursor, insert_template};

#[derive(Debug, Clone, Default)]
pub struct InsertTemplateOptions {
    /// Vault-relative note; today's report when unset.
    pub note: Option<String>,
    pub cursor: Cursor,
}

pub fn run(global: &GlobalOptions, opts: &InsertTemplateOptions) -> Result<CommandReport> {
    run_with_host(global, "insert-daily-report-template", |host, report| {
        let repo = ReportRepository::new(&host.vault, &host.settings.general);
        let note = match &opts.note {
            Some(note) => note.clone(),
            None => repo.resolve_today_path(Utc::now().date_naive())?,
        };

        let inserted = insert_template(&host.vault, &repo, &note, opts.cursor)?;
        report.detail(format!("note={note}"));
        report.detail(format!(
            "inserted {inserted} bytes from {}",
            host.settings.general.template
        ));
        Ok(())
    })
}
