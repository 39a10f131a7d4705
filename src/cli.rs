use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::archive_reports;
use crate::commands::insert_template::{self, InsertTemplateOptions};
use crate::commands::list_reports;
use crate::commands::open_report::{self, OpenMode, OpenReportOptions};
use crate::commands::send_reports;
use crate::commands::settings::{self, SettingsAction};
use crate::commands::{CommandReport, GlobalOptions};
use crate::report::template::Cursor;

/// Daily work reports kept as dated notes in a vault folder.
#[derive(Parser, Debug)]
#[command(name = "daily-report")]
#[command(version, about = "Write, email and archive daily reports")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Vault directory (defaults to DAILY_REPORT_VAULT, then the working directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Settings file (defaults to <vault>/.daily-report/data.json)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Print the command report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create today's report from the template and open it
    #[command(name = "create-new-daily-report", alias = "create")]
    Create(OpenArgs),

    /// Open today's report, creating it first when missing
    #[command(name = "open-todays-report", alias = "open")]
    Open(OpenArgs),

    /// Email every unsent report and mark it as sent
    #[command(name = "send-daily-reports", alias = "send")]
    Send,

    /// Insert the template into a note at a cursor position
    #[command(name = "insert-daily-report-template", alias = "insert-template")]
    InsertTemplate(InsertArgs),

    /// Move sent reports older than a week into the archive
    #[command(name = "archive-daily-reports", alias = "archive")]
    Archive,

    /// List active reports with their sent state
    #[command(name = "list-daily-reports", alias = "list")]
    List,

    /// Inspect or change persisted settings
    Settings(SettingsArgs),
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Do not launch the editor, only print the note path
    #[arg(long)]
    pub no_open: bool,
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Vault-relative note path (defaults to today's report)
    #[arg(long)]
    pub note: Option<String>,

    /// Zero-based line (defaults to the end of the note)
    #[arg(long)]
    pub line: Option<usize>,

    /// Zero-based character within the line (defaults to the end of the line)
    #[arg(long, requires = "line")]
    pub ch: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print effective settings with the password masked
    Show {
        /// Include the mail server connection block
        #[arg(long = "unsafe")]
        include_unsafe: bool,
    },
    /// Print one field by dotted key, e.g. Mail.subjectName
    Get { key: String },
    /// Validate and persist one field
    Set { key: String, value: String },
    /// Print the resolved settings file path
    Path,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for line in &report.details {
        println!("{line}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let global = GlobalOptions {
        vault: cli.vault,
        settings: cli.settings,
    };

    let report = match cli.command {
        Commands::Create(args) => open_report::run(
            &global,
            &OpenReportOptions {
                mode: OpenMode::Create,
                no_open: args.no_open,
            },
        )?,
        Commands::Open(args) => open_report::run(
            &global,
            &OpenReportOptions {
                mode: OpenMode::OpenToday,
                no_open: args.no_open,
            },
        )?,
        Commands::Send => send_reports::run(&global)?,
        Commands::InsertTemplate(args) => insert_template::run(
            &global,
            &InsertTemplateOptions {
                note: args.note,
                cursor: Cursor {
                    line: args.line,
                    ch: args.ch,
                },
            },
        )?,
        Commands::Archive => archive_reports::run(&global)?,
        Commands::List => list_reports::run(&global)?,
        Commands::Settings(args) => {
            let action = match args.command {
                SettingsCommand::Show { include_unsafe } => SettingsAction::Show { include_unsafe },
                SettingsCommand::Get { key } => SettingsAction::Get { key },
                SettingsCommand::Set { key, value } => SettingsAction::Set { key, value },
                SettingsCommand::Path => SettingsAction::Path,
            };
            settings::run(&global, &action)?
        }
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} finished with {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
