use crate::report::frontmatter::MetadataCache;
use crate::report::mailer::{MailTransport, compose};
use crate::report::metadata::{mark_sent, sent_flag};
use crate::report::repository::ReportRepository;
use crate::report::settings::MailSettings;
use crate::report::vault::Vault;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendDisposition {
    Sent,
    AlreadySent,
    NotANote,
    /// Delivered, but the `sent` flag could not be written back.
    SentUnmarked { error: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEntry {
    pub path: String,
    pub disposition: SendDisposition,
}

#[derive(Debug, Clone, Default)]
pub struct SendOutcome {
    pub folder_created: bool,
    pub entries: Vec<SendEntry>,
}

impl SendOutcome {
    pub fn no_files(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, pred: impl Fn(&SendDisposition) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.disposition)).count()
    }

    pub fn delivered(&self) -> usize {
        self.count(|d| {
            matches!(
                d,
                SendDisposition::Sent | SendDisposition::SentUnmarked { .. }
            )
        })
    }
}

fn send_one(
    vault: &dyn Vault,
    metadata: &dyn MetadataCache,
    transport: &dyn MailTransport,
    mail: &MailSettings,
    now: DateTime<Local>,
    path: &str,
) -> SendDisposition {
    let cache = match metadata.file_cache(path) {
        Ok(Some(cache)) => cache,
        Ok(None) => return SendDisposition::NotANote,
        Err(err) => {
            return SendDisposition::Failed {
                error: format!("{err:#}"),
            };
        }
    };
    if cache.frontmatter.as_ref().is_some_and(sent_flag) {
        return SendDisposition::AlreadySent;
    }

    let delivered = vault
        .read(path)
        .and_then(|content| transport.deliver(&compose(mail, now.date_naive(), &content)));
    if let Err(err) = delivered {
        return SendDisposition::Failed {
            error: format!("{err:#}"),
        };
    }

    match mark_sent(metadata, path, now.with_timezone(&Utc)) {
        Ok(()) => SendDisposition::Sent,
        Err(err) => SendDisposition::SentUnmarked {
            error: format!("{err:#}"),
        },
    }
}

/// Email every unsent report in the reports folder and flag it as sent.
/// Returns once every file has an outcome.
pub fn send_all(
    vault: &dyn Vault,
    metadata: &dyn MetadataCache,
    transport: &dyn MailTransport,
    repo: &ReportRepository<'_>,
    mail: &MailSettings,
    now: DateTime<Local>,
) -> Result<SendOutcome> {
    let folder_created = repo.ensure_folder_exists()?;
    if folder_created {
        return Ok(SendOutcome {
            folder_created,
            entries: Vec::new(),
        });
    }

    let entries = repo
        .list_reports()?
        .into_iter()
        .map(|path| {
            let disposition = send_one(vault, metadata, transport, mail, now, &path);
            SendEntry { path, disposition }
        })
        .collect();

    Ok(SendOutcome {
        folder_created,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::frontmatter::FrontmatterStore;
    use crate::report::mailer::OutgoingMail;
    use crate::report::metadata::is_sent;
    use crate::report::settings::Settings;
    use crate::report::vault::memory::MemoryVault;
    use anyhow::bail;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeTransport {
        delivered: RefCell<Vec<OutgoingMail>>,
        reject_body_containing: Option<&'static str>,
    }

    impl MailTransport for FakeTransport {
        fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
            if let Some(marker) = self.reject_body_containing {
                if mail.text.contains(marker) {
                    bail!("535 authentication failed");
                }
            }
            self.delivered.borrow_mut().push(mail.clone());
            Ok(())
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.mail.subject_name = "Alice".to_string();
        settings.mail.mail_server.username = "alice@example.com".to_string();
        settings.mail.default_recipients.team = "team@example.com".to_string();
        settings
    }

    #[test]
    fn sends_unsent_reports_and_marks_them() {
        let now = Local::now();
        let vault = MemoryVault::new(now);
        vault.add_file("Reports/a.md", "# A\n", now);
        vault.add_file(
            "Reports/b.md",
            "---\nsent: true\nsent_at: 2026-01-01T00:00:00.000Z\n---\n# B\n",
            now,
        );
        vault.add_file("Reports/notes.txt", "ignored", now);
        let store = FrontmatterStore::new(&vault);
        let transport = FakeTransport::default();
        let settings = settings();
        let repo = ReportRepository::new(&vault, &settings.general);

        let outcome =
            send_all(&vault, &store, &transport, &repo, &settings.mail, now).expect("send");

        let delivered = transport.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text, "# A\n");
        assert_eq!(delivered[0].to, vec!["team@example.com".to_string()]);
        assert_eq!(outcome.delivered(), 1);
        assert_eq!(outcome.count(|d| *d == SendDisposition::AlreadySent), 1);
        assert_eq!(outcome.count(|d| *d == SendDisposition::NotANote), 1);

        let cache = store.file_cache("Reports/a.md").expect("cache");
        assert!(is_sent(cache.as_ref()));
    }

    #[test]
    fn one_failed_delivery_does_not_stop_the_rest() {
        let now = Local::now();
        let vault = MemoryVault::new(now);
        vault.add_file("Reports/a.md", "fine", now);
        vault.add_file("Reports/b.md", "poison", now);
        vault.add_file("Reports/c.md", "fine too", now);
        let store = FrontmatterStore::new(&vault);
        let transport = FakeTransport {
            reject_body_containing: Some("poison"),
            ..FakeTransport::default()
        };
        let settings = settings();
        let repo = ReportRepository::new(&vault, &settings.general);

        let outcome =
            send_all(&vault, &store, &transport, &repo, &settings.mail, now).expect("send");

        assert_eq!(outcome.delivered(), 2);
        let failed = outcome
            .entries
            .iter()
            .find(|e| matches!(e.disposition, SendDisposition::Failed { .. }))
            .expect("failed entry");
        assert_eq!(failed.path, "Reports/b.md");
        assert_eq!(vault.content("Reports/b.md").as_deref(), Some("poison"));
    }

    #[test]
    fn delivered_but_unmarkable_note_is_reported_and_batch_continues() {
        let now = Local::now();
        let vault = MemoryVault::new(now);
        let malformed = "---\n: : [\n---\nbody\n";
        vault.add_file("Reports/a.md", "# A\n", now);
        vault.add_file("Reports/b.md", malformed, now);
        vault.add_file("Reports/c.md", "# C\n", now);
        let store = FrontmatterStore::new(&vault);
        let transport = FakeTransport::default();
        let settings = settings();
        let repo = ReportRepository::new(&vault, &settings.general);

        let outcome =
            send_all(&vault, &store, &transport, &repo, &settings.mail, now).expect("send");

        let dispositions = outcome
            .entries
            .iter()
            .map(|e| (e.path.as_str(), &e.disposition))
            .collect::<Vec<_>>();
        assert_eq!(dispositions[0], ("Reports/a.md", &SendDisposition::Sent));
        assert_eq!(dispositions[2], ("Reports/c.md", &SendDisposition::Sent));
        assert_eq!(dispositions[1].0, "Reports/b.md");
        assert!(matches!(
            dispositions[1].1,
            SendDisposition::SentUnmarked { error } if error.contains("malformed front-matter")
        ));

        assert_eq!(transport.delivered.borrow().len(), 3);
        assert_eq!(outcome.delivered(), 3);
        assert_eq!(vault.content("Reports/b.md").as_deref(), Some(malformed));
        let marked = store.file_cache("Reports/c.md").expect("cache");
        assert!(is_sent(marked.as_ref()));
    }

    #[test]
    fn flag_without_timestamp_still_counts_as_sent_here() {
        let now = Local::now();
        let vault = MemoryVault::new(now);
        vault.add_file("Reports/a.md", "---\nsent: true\n---\n", now);
        let store = FrontmatterStore::new(&vault);
        let transport = FakeTransport::default();
        let settings = settings();
        let repo = ReportRepository::new(&vault, &settings.general);

        let outcome =
            send_all(&vault, &store, &transport, &repo, &settings.mail, now).expect("send");
        assert_eq!(outcome.count(|d| *d == SendDisposition::AlreadySent), 1);
        assert!(transport.delivered.borrow().is_empty());
    }

    #[test]
    fn missing_folder_is_created_with_nothing_sent() {
        let now = Local::now();
        let vault = MemoryVault::new(now);
        let store = FrontmatterStore::new(&vault);
        let transport = FakeTransport::default();
        let settings = settings();
        let repo = ReportRepository::new(&vault, &settings.general);

        let outcome =
            send_all(&vault, &store, &transport, &repo, &settings.mail, now).expect("send");
        assert!(outcome.folder_created);
        assert!(outcome.no_files());
        assert!(vault.has_folder("Reports"));
    }
}
