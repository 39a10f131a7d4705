use anyhow::Result;

use crate::commands::{CommandReport, GlobalOptions, run_with_host};
use crate::report::frontmatter::{FrontmatterStore, MetadataCache};
use crate::report::metadata::{SENT_AT_KEY, is_sent};
use crate::report::repository::ReportRepository;

pub fn run(global: &GlobalOptions) -> Result<CommandReport> {
    run_with_host(global, "list-daily-reports", |host, report| {
        let repo = ReportRepository::new(&host.vault, &host.settings.general);
        let store = FrontmatterStore::new(&host.vault);

        let files = repo.list_reports()?;
        if files.is_empty() {
            report.detail("No daily report files found");
            return Ok(());
        }

        for path in files {
            let Some(cache) = store.file_cache(&path)? else {
                continue;
            };
            if is_sent(Some(&cache)) {
                let sent_at = cache
                    .frontmatter
                    .as_ref()
                    .and_then(|fm| fm.get(SENT_AT_KEY))
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                report.detail(format!("{path} sent_at={sent_at}"));
            } else {
                report.detail(format!("{path} unsent"));
            }
        }
        Ok(())
    })
}
