use crate::report::frontmatter::{FileCache, MetadataCache};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_yaml::{Mapping, Value};

pub const SENT_KEY: &str = "sent";
pub const SENT_AT_KEY: &str = "sent_at";

/// `sent` is literally the boolean `true`; strings like `"true"` do not count.
pub fn sent_flag(frontmatter: &Mapping) -> bool {
    matches!(frontmatter.get(SENT_KEY), Some(Value::Bool(true)))
}

fn has_sent_at(frontmatter: &Mapping) -> bool {
    match frontmatter.get(SENT_AT_KEY) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Sent means both `sent: true` and a non-empty `sent_at`.
pub fn is_sent(cache: Option<&FileCache>) -> bool {
    cache
        .and_then(|c| c.frontmatter.as_ref())
        .is_some_and(|fm| sent_flag(fm) && has_sent_at(fm))
}

pub fn sent_at_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn mark_sent(metadata: &dyn MetadataCache, path: &str, now: DateTime<Utc>) -> Result<()> {
    let stamp = sent_at_stamp(now);
    metadata.process_front_matter(path, &mut |fm: &mut Mapping| {
        fm.insert(Value::from(SENT_KEY), Value::Bool(true));
        fm.insert(Value::from(SENT_AT_KEY), Value::from(stamp.clone()));
    })
}
