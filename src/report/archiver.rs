use crate::report::frontmatter::MetadataCache;
use crate::report::metadata::sent_flag;
use crate::report::repository::ReportRepository;
use crate::report::vault::{Vault, file_name, join_path};
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Reports younger than this many days stay in the reports folder.
pub const ARCHIVE_AFTER_DAYS: i64 = 7;
pub const ARCHIVE_DIR: &str = "archive";

/// Seven-day bucket counted from January 1st. This is not ISO-8601 week
/// numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBucket {
    pub year: i32,
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekBucket {
    pub fn folder_name(&self) -> String {
        format!(
            "week-{} ({} to {})",
            self.week,
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    pub fn year_folder(&self, reports_folder: &str) -> String {
        join_path(&join_path(reports_folder, ARCHIVE_DIR), &self.year.to_string())
    }

    pub fn week_folder(&self, reports_folder: &str) -> String {
        join_path(&self.year_folder(reports_folder), &self.folder_name())
    }
}

fn january_first(year: i32) -> NaiveDate {
    NaiveDate::from_yo_opt(year, 1).unwrap_or(NaiveDate::MIN)
}

/// `ceil((fractional days since Jan 1 + 1) / 7)`, time of day included.
/// Days are real elapsed time since midnight of Jan 1 in `created`'s zone.
pub fn week_bucket<Tz: TimeZone>(created: &DateTime<Tz>) -> WeekBucket {
    let year = created.year();
    let jan1 = january_first(year);
    let midnight = jan1.and_time(NaiveTime::MIN);
    let elapsed = match created.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => created.clone().signed_duration_since(start),
        None => created.naive_local() - midnight,
    };
    let elapsed_days = elapsed.num_milliseconds() as f64 / 86_400_000.0;
    let week = ((elapsed_days + 1.0) / 7.0).ceil().max(1.0) as u32;

    let start = jan1 + Duration::days(i64::from(week - 1) * 7);
    let end = jan1 + Duration::days(i64::from(week) * 7 - 1);
    WeekBucket {
        year,
        week,
        start,
        end,
    }
}

/// Midnight at the start of `today - 7 days`.
pub fn archive_cutoff(today: NaiveDate) -> NaiveDateTime {
    (today - Duration::days(ARCHIVE_AFTER_DAYS)).and_time(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotANote,
    NoFrontmatter,
    NotSent,
    TooRecent,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotANote => "not-a-note",
            Self::NoFrontmatter => "no-front-matter",
            Self::NotSent => "not-sent",
            Self::TooRecent => "too-recent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Archived { to: String },
    Skipped(SkipReason),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveOutcome {
    pub folder_created: bool,
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveOutcome {
    pub fn no_files(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn archived(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.disposition, Disposition::Archived { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.disposition, Disposition::Failed { .. }))
            .count()
    }
}

fn ensure_folder(vault: &dyn Vault, path: &str) -> Result<()> {
    if !vault.exists(path)? {
        vault.create_folder(path)?;
    }
    Ok(())
}

fn archive_one(
    vault: &dyn Vault,
    metadata: &dyn MetadataCache,
    reports_folder: &str,
    cutoff: NaiveDateTime,
    path: &str,
) -> Result<Disposition> {
    let Some(note) = vault.file(path)? else {
        return Ok(Disposition::Skipped(SkipReason::NotANote));
    };
    let Some(frontmatter) = metadata.file_cache(path)?.and_then(|c| c.frontmatter) else {
        return Ok(Disposition::Skipped(SkipReason::NoFrontmatter));
    };
    if !sent_flag(&frontmatter) {
        return Ok(Disposition::Skipped(SkipReason::NotSent));
    }

    if note.created.naive_local() >= cutoff {
        return Ok(Disposition::Skipped(SkipReason::TooRecent));
    }

    let bucket = week_bucket(&note.created);
    let year_folder = bucket.year_folder(reports_folder);
    let week_folder = bucket.week_folder(reports_folder);
    ensure_folder(vault, &year_folder)?;
    ensure_folder(vault, &week_folder)?;

    let target = join_path(&week_folder, file_name(&note.path));
    vault.rename(&note.path, &target)?;
    Ok(Disposition::Archived { to: target })
}

/// Move sent reports older than a week into `archive/<year>/week-<n> (...)`.
/// Every file gets an entry; one failure never stops the rest.
pub fn archive_old_reports(
    vault: &dyn Vault,
    metadata: &dyn MetadataCache,
    repo: &ReportRepository<'_>,
    today: NaiveDate,
) -> Result<ArchiveOutcome> {
    let reports_folder = repo.reports_folder()?;
    let folder_created = repo.ensure_folder_exists()?;
    if folder_created {
        return Ok(ArchiveOutcome {
            folder_created,
            entries: Vec::new(),
        });
    }

    let cutoff = archive_cutoff(today);
    let entries = repo
        .list_reports()?
        .into_iter()
        .map(|path| {
            let disposition = archive_one(vault, metadata, reports_folder, cutoff, &path)
                .unwrap_or_else(|err| Disposition::Failed {
                    error: format!("{err:#}"),
                });
            ArchiveEntry { path, disposition }
        })
        .collect();

    Ok(ArchiveOutcome {
        folder_created,
        entries,
    })
}
