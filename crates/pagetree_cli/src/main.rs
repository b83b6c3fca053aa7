//! Command-line front end for the document API.
//!
//! # Responsibility
//! - Parse one document operation per invocation.
//! - Print the API response envelope as JSON on stdout.
//!
//! # Invariants
//! - Exit status is non-zero whenever the envelope reports `ok = false`.
//! - The caller identity comes only from `--as`; omitting it is an
//!   unauthenticated call.

use clap::{Args, Parser, Subcommand};
use pagetree_api::DocumentApi;
use pagetree_core::{init_logging_from_config, CoreConfig, DocumentPatch};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pagetree")]
#[command(about = "Hierarchical document store with trash and publishing", version)]
struct Cli {
    /// SQLite database file; overrides PAGETREE_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Subject of the calling identity.
    #[arg(long = "as", global = true, value_name = "SUBJECT")]
    subject: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a document
    Create {
        title: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Move a document and its descendants to trash
    Archive { id: String },
    /// Restore a document and its descendants from trash
    Restore { id: String },
    /// Permanently delete a document
    Remove {
        id: String,
        /// Also delete every descendant instead of orphaning them
        #[arg(long)]
        cascade: bool,
    },
    /// Patch document fields
    Update(UpdateArgs),
    /// Read one document
    Get { id: String },
    /// List active documents under a parent (roots by default)
    Sidebar {
        #[arg(long)]
        parent: Option<String>,
    },
    /// List archived documents
    Trash,
    /// List all active documents
    Search,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, conflicts_with = "clear_content")]
    content: Option<String>,
    #[arg(long)]
    clear_content: bool,
    #[arg(long, conflicts_with = "clear_icon")]
    icon: Option<String>,
    #[arg(long)]
    clear_icon: bool,
    #[arg(long, conflicts_with = "clear_cover_image")]
    cover_image: Option<String>,
    #[arg(long)]
    clear_cover_image: bool,
    #[arg(long, conflicts_with = "unpublish")]
    publish: bool,
    #[arg(long)]
    unpublish: bool,
}

impl UpdateArgs {
    fn to_patch(&self) -> DocumentPatch {
        DocumentPatch {
            title: self.title.clone(),
            content: optional_field(&self.content, self.clear_content),
            cover_image: optional_field(&self.cover_image, self.clear_cover_image),
            icon: optional_field(&self.icon, self.clear_icon),
            is_published: match (self.publish, self.unpublish) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }
}

fn optional_field(value: &Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        return Some(None);
    }
    value.clone().map(Some)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pagetree: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("pagetree: logging disabled: {err}");
    }

    let api = DocumentApi::new(config);
    let subject = cli.subject.as_deref();

    match &cli.command {
        Command::Create { title, parent } => {
            let response = api.create(subject, title, parent.as_deref());
            emit(response.ok, &response)
        }
        Command::Archive { id } => {
            let response = api.archive(subject, id);
            emit(response.ok, &response)
        }
        Command::Restore { id } => {
            let response = api.restore(subject, id);
            emit(response.ok, &response)
        }
        Command::Remove { id, cascade } => {
            let response = api.remove(subject, id, *cascade);
            emit(response.ok, &response)
        }
        Command::Update(args) => {
            let response = api.update(subject, &args.id, &args.to_patch());
            emit(response.ok, &response)
        }
        Command::Get { id } => {
            let response = api.get_by_id(subject, id);
            emit(response.ok, &response)
        }
        Command::Sidebar { parent } => {
            let response = api.list_sidebar(subject, parent.as_deref());
            emit(response.ok, &response)
        }
        Command::Trash => {
            let response = api.list_trash(subject);
            emit(response.ok, &response)
        }
        Command::Search => {
            let response = api.list_searchable(subject);
            emit(response.ok, &response)
        }
    }
}

fn emit(ok: bool, response: &impl Serialize) -> ExitCode {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("pagetree: failed to encode response: {err}");
            return ExitCode::FAILURE;
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_flags_build_partial_patch() {
        let cli = Cli::parse_from([
            "pagetree",
            "--as",
            "user_1",
            "update",
            "0b6f5e7e-0000-4000-8000-000000000000",
            "--title",
            "Renamed",
            "--clear-icon",
            "--publish",
        ]);
        assert_eq!(cli.subject.as_deref(), Some("user_1"));
        let Command::Update(args) = cli.command else {
            panic!("expected update command");
        };
        let patch = args.to_patch();
        assert_eq!(patch.title.as_deref(), Some("Renamed"));
        assert_eq!(patch.icon, Some(None));
        assert_eq!(patch.content, None);
        assert_eq!(patch.cover_image, None);
        assert_eq!(patch.is_published, Some(true));
    }

    #[test]
    fn update_rejects_conflicting_publish_flags() {
        let result = Cli::try_parse_from([
            "pagetree",
            "update",
            "0b6f5e7e-0000-4000-8000-000000000000",
            "--publish",
            "--unpublish",
        ]);
        assert!(result.is_err());
    }
}
