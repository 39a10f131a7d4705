use std::env;
use std::path::PathBuf;

use crate::report::warn::{self, WarnEvent};

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

const ENV_PREFIX: &str = "DAILY_REPORT_";

fn fallback_dotenv_path(home_dir: Option<PathBuf>) -> Option<PathBuf> {
    Some(home_dir?.join(".daily-report/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let Some(path) = fallback_dotenv_path(dirs::home_dir()) else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

fn unknown_env_keys<I>(keys: I, allowlist: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = keys
        .into_iter()
        .filter(|key| key.starts_with(ENV_PREFIX))
        .filter(|key| !allowlist.contains(&key.as_str()))
        .collect::<Vec<_>>();
    out.sort();
    out
}

/// Flag `DAILY_REPORT_*` variables nothing reads, usually a typo in `.env`.
pub fn warn_unknown_env_keys() {
    let keys = env::vars_os().filter_map(|(key, _)| key.into_string().ok());
    for key in unknown_env_keys(keys, GENERATED_ENV_ALLOWLIST) {
        warn::emit(WarnEvent {
            code: "UNKNOWN_ENV_KEY",
            stage: "startup",
            action: "load-env",
            path: &key,
            reason: "not-read-by-daily-report",
            err: "",
        });
    }
}
