use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("reports folder is not set; run `daily-report settings set General.reportsFolder <dir>`")]
    ReportsFolderUnset,
    #[error("Template file is not set!")]
    TemplateUnset,
    #[error("template {path} is not a readable file: {reason}")]
    TemplateUnreadable { path: String, reason: String },
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),
    #[error("invalid value for `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },
    #[error("no recipients configured under Mail.defaultRecipients")]
    NoRecipients,
    #[error("another archive or send run holds {0}")]
    BatchLocked(String),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReportsFolderUnset => "E001_REPORTS_FOLDER_UNSET",
            Self::TemplateUnset => "E002_TEMPLATE_UNSET",
            Self::TemplateUnreadable { .. } => "E003_TEMPLATE_UNREADABLE",
            Self::UnknownSetting(_) => "E004_UNKNOWN_SETTING",
            Self::InvalidSetting { .. } => "E005_INVALID_SETTING",
            Self::NoRecipients => "E006_NO_RECIPIENTS",
            Self::BatchLocked(_) => "E007_BATCH_LOCKED",
        }
    }
}
