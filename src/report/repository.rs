use crate::error::ReportError;
use crate::report::settings::GeneralSettings;
use crate::report::vault::{Vault, file_name, join_path};
use crate::report::workspace::Workspace;
use anyhow::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOutcome {
    pub path: String,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    pub path: String,
    pub folder_created: bool,
    pub report_created: bool,
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("{}.md", date.format("%Y-%m-%d"))
}

/// Dated report notes under the configured reports folder.
pub struct ReportRepository<'a> {
    vault: &'a dyn Vault,
    general: &'a GeneralSettings,
}

impl<'a> ReportRepository<'a> {
    pub fn new(vault: &'a dyn Vault, general: &'a GeneralSettings) -> Self {
        Self { vault, general }
    }

    pub fn reports_folder(&self) -> Result<&'a str, ReportError> {
        let folder = self.general.reports_folder.trim().trim_end_matches('/');
        if folder.is_empty() {
            return Err(ReportError::ReportsFolderUnset);
        }
        Ok(folder)
    }

    pub fn report_path(&self, date: NaiveDate) -> Result<String, ReportError> {
        Ok(join_path(self.reports_folder()?, &report_file_name(date)))
    }

    pub fn resolve_today_path(&self, today: NaiveDate) -> Result<String, ReportError> {
        self.report_path(today)
    }

    /// Returns whether the folder had to be created.
    pub fn ensure_folder_exists(&self) -> Result<bool> {
        let folder = self.reports_folder()?;
        if self.vault.exists(folder)? {
            return Ok(false);
        }
        self.vault.create_folder(folder)?;
        Ok(true)
    }

    /// Template contents, or `None` when no template is configured.
    pub fn read_template(&self) -> Result<Option<String>> {
        let template = self.general.template.trim();
        if template.is_empty() {
            return Ok(None);
        }
        let unreadable = |reason: String| ReportError::TemplateUnreadable {
            path: template.to_string(),
            reason,
        };
        if self.vault.file(template)?.is_none() {
            return Err(unreadable("no such file".to_string()).into());
        }
        let content = self
            .vault
            .read(template)
            .map_err(|err| unreadable(format!("{err:#}")))?;
        Ok(Some(content))
    }

    /// Leaves an existing report untouched; otherwise seeds it from the
    /// template, or empty when none is configured.
    pub fn ensure_report_exists(&self, path: &str) -> Result<EnsureOutcome> {
        if self.vault.exists(path)? {
            return Ok(EnsureOutcome {
                path: path.to_string(),
                created: false,
            });
        }
        let content = self.read_template()?.unwrap_or_default();
        self.vault.create(path, &content)?;
        Ok(EnsureOutcome {
            path: path.to_string(),
            created: true,
        })
    }

    pub fn ensure_report_for(&self, date: NaiveDate) -> Result<OpenOutcome> {
        let path = self.report_path(date)?;
        let folder_created = self.ensure_folder_exists()?;
        let ensured = self.ensure_report_exists(&path)?;
        Ok(OpenOutcome {
            path,
            folder_created,
            report_created: ensured.created,
        })
    }

    /// The note is opened whether it was just created or already there.
    pub fn open_or_create_today(
        &self,
        workspace: &dyn Workspace,
        today: NaiveDate,
    ) -> Result<OpenOutcome> {
        let outcome = self.ensure_report_for(today)?;
        workspace.open_link_text(file_name(&outcome.path), self.reports_folder()?)?;
        Ok(outcome)
    }

    /// Files directly under the reports folder; archived notes are not included.
    pub fn list_reports(&self) -> Result<Vec<String>> {
        let folder = self.reports_folder()?;
        if !self.vault.exists(folder)? {
            return Ok(Vec::new());
        }
        Ok(self.vault.list(folder)?.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::vault::memory::MemoryVault;
    use chrono::Local;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingWorkspace {
        opened: RefCell<Vec<(String, String)>>,
    }

    impl Workspace for RecordingWorkspace {
        fn open_link_text(&self, name: &str, folder: &str) -> Result<()> {
            self.opened
                .borrow_mut()
                .push((name.to_string(), folder.to_string()));
            Ok(())
        }
    }

    fn general(folder: &str, template: &str) -> GeneralSettings {
        GeneralSettings {
            reports_folder: folder.to_string(),
            template: template.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn today_path_is_folder_plus_iso_date() {
        let vault = MemoryVault::new(Local::now());
        let settings = general("Work/Reports/", "");
        let repo = ReportRepository::new(&vault, &settings);

        assert_eq!(
            repo.resolve_today_path(date(2026, 2, 3)).expect("path"),
            "Work/Reports/2026-02-03.md"
        );
        assert_eq!(
            repo.resolve_today_path(date(2026, 2, 3)).expect("path"),
            repo.resolve_today_path(date(2026, 2, 3)).expect("path")
        );
    }

    #[test]
    fn blank_folder_is_a_configuration_error() {
        let vault = MemoryVault::new(Local::now());
        let settings = general("  ", "");
        let repo = ReportRepository::new(&vault, &settings);
        assert!(matches!(
            repo.report_path(date(2026, 1, 1)),
            Err(ReportError::ReportsFolderUnset)
        ));
    }

    #[test]
    fn new_report_copies_template_exactly() {
        let vault = MemoryVault::new(Local::now());
        let template = "## Done\n- \n\n## Planned\n- \n";
        vault.add_file("Templates/daily.md", template, Local::now());
        let settings = general("Reports", "Templates/daily.md");
        let repo = ReportRepository::new(&vault, &settings);

        let outcome = repo.ensure_report_for(date(2026, 5, 6)).expect("ensure");
        assert!(outcome.folder_created);
        assert!(outcome.report_created);
        assert_eq!(
            vault.content("Reports/2026-05-06.md").as_deref(),
            Some(template)
        );
    }

    #[test]
    fn new_report_without_template_is_empty() {
        let vault = MemoryVault::new(Local::now());
        let settings = general("Reports", "");
        let repo = ReportRepository::new(&vault, &settings);

        repo.ensure_report_for(date(2026, 5, 6)).expect("ensure");
        assert_eq!(vault.content("Reports/2026-05-06.md").as_deref(), Some(""));
    }

    #[test]
    fn existing_report_is_left_untouched() {
        let vault = MemoryVault::new(Local::now());
        vault.add_file("Reports/2026-05-06.md", "my notes", Local::now());
        vault.add_file("Templates/daily.md", "template", Local::now());
        let settings = general("Reports", "Templates/daily.md");
        let repo = ReportRepository::new(&vault, &settings);

        let outcome = repo
            .ensure_report_exists("Reports/2026-05-06.md")
            .expect("ensure");
        assert!(!outcome.created);
        assert_eq!(
            vault.content("Reports/2026-05-06.md").as_deref(),
            Some("my notes")
        );
    }

    #[test]
    fn missing_template_fails_without_creating_report() {
        let vault = MemoryVault::new(Local::now());
        let settings = general("Reports", "Templates/gone.md");
        let repo = ReportRepository::new(&vault, &settings);

        let err = repo.ensure_report_for(date(2026, 5, 6)).expect_err("fails");
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::TemplateUnreadable { .. })
        ));
        assert!(!vault.has_file("Reports/2026-05-06.md"));
        assert!(vault.has_folder("Reports"));
    }

    #[test]
    fn open_or_create_always_opens() {
        let vault = MemoryVault::new(Local::now());
        let settings = general("Reports", "");
        let repo = ReportRepository::new(&vault, &settings);
        let workspace = RecordingWorkspace::default();

        let first = repo
            .open_or_create_today(&workspace, date(2026, 5, 6))
            .expect("first");
        let second = repo
            .open_or_create_today(&workspace, date(2026, 5, 6))
            .expect("second");

        assert!(first.report_created);
        assert!(!second.report_created);
        let opened = workspace.opened.borrow();
        assert_eq!(opened.len(), 2);
        assert_eq!(
            opened[0],
            ("2026-05-06.md".to_string(), "Reports".to_string())
        );
    }

    #[test]
    fn list_reports_skips_archive_subtree() {
        let vault = MemoryVault::new(Local::now());
        vault.add_file("Reports/2026-05-06.md", "", Local::now());
        vault.add_file("Reports/archive/2026/week-1/2026-01-01.md", "", Local::now());
        let settings = general("Reports", "");
        let repo = ReportRepository::new(&vault, &settings);

        assert_eq!(
            repo.list_reports().expect("list"),
            vec!["Reports/2026-05-06.md".to_string()]
        );
    }
}
