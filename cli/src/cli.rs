//! CLI argument definitions for the `items` binary.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use items_core::{ItemId, SortDirection, SortField, SortState};

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "items",
    version,
    about = "Browse and edit items stored in the items REST backend",
    long_about = "Browse and edit items stored in the items REST backend.\n\n\
                  The backend URL is taken from --base-url, then ITEMS_API_URL \
                  (a .env file is honored), then http://127.0.0.1:8000/api."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL, e.g. http://127.0.0.1:8000/api.
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of items as a table.
    List(ListArgs),

    /// Show a single item.
    Show {
        #[arg(value_name = "ID")]
        id: ItemId,
    },

    /// Create an item.
    Create(CreateArgs),

    /// Change an item's name and/or group.
    Update(UpdateArgs),

    /// Delete an item.
    Delete(DeleteArgs),

    /// Interactive list view with a create/edit form.
    Shell,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Sort the page by name, group, created_at or updated_at.
    #[arg(long, value_name = "FIELD")]
    pub sort: Option<SortField>,

    /// Sort descending.
    #[arg(long, conflicts_with = "asc")]
    pub desc: bool,

    /// Sort ascending.
    #[arg(long)]
    pub asc: bool,
}

impl ListArgs {
    /// Without `--sort` the table keeps its default column; a chosen column
    /// starts ascending like a header click would.
    pub fn sort_state(&self) -> SortState {
        let mut state = match self.sort {
            Some(field) => SortState::new(field, SortDirection::Asc),
            None => SortState::default(),
        };
        if self.desc {
            state.direction = SortDirection::Desc;
        } else if self.asc {
            state.direction = SortDirection::Asc;
        }
        state
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    /// Primary or Secondary (case-insensitive). Defaults to Primary.
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(value_name = "ID")]
    pub id: ItemId,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(value_name = "ID")]
    pub id: ItemId,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("items").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_defaults_to_first_page_newest_update_first() {
        let Command::List(args) = parse(&["list"]).command else {
            panic!("expected list");
        };
        assert_eq!(args.page, 1);
        assert_eq!(args.sort_state(), SortState::default());
    }

    #[test]
    fn list_sort_flags() {
        let Command::List(args) = parse(&["list", "--sort", "name"]).command else {
            panic!("expected list");
        };
        assert_eq!(
            args.sort_state(),
            SortState::new(SortField::Name, SortDirection::Asc)
        );

        let Command::List(args) = parse(&["list", "--sort", "created-at", "--desc"]).command else {
            panic!("expected list");
        };
        assert_eq!(
            args.sort_state(),
            SortState::new(SortField::CreatedAt, SortDirection::Desc)
        );

        let Command::List(args) = parse(&["list", "--asc"]).command else {
            panic!("expected list");
        };
        assert_eq!(
            args.sort_state(),
            SortState::new(SortField::UpdatedAt, SortDirection::Asc)
        );
    }

    #[test]
    fn list_rejects_page_zero_and_bad_fields() {
        let args = ["items", "list", "--page", "0"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["items", "list", "--sort", "colour"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["items", "list", "--asc", "--desc"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = parse(&["delete", "4", "--yes", "-vv", "--base-url", "http://h/api"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.base_url.as_deref(), Some("http://h/api"));
        let Command::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.id, 4);
        assert!(args.yes);
    }
}
