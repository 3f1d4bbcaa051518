//! Interactive list view with a create/edit form.
//!
//! # Design
//! The shell is a small state machine over two views. The list view shows
//! the current page through [`ItemTable`] and reads one command per line.
//! `add` and `edit` switch to the form view, which prompts for each field,
//! re-prompts with inline field errors until the input validates, and goes
//! back to the list once the backend accepts it. A lone `.` cancels. So does
//! an empty name on a new item; when editing, Enter keeps the value shown in
//! brackets, as it does for the group.
//!
//! Input and output are generic so the whole loop runs against in-memory
//! buffers in tests.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use items_core::{ItemForm, ItemId, ItemTable, SortField, SubmitError, TableView, Transport};

use crate::app::App;
use crate::render;

pub const PROMPT: &str = "items> ";

/// Typed at a form prompt to leave the form.
pub const CANCEL_INPUT: &str = ".";

/// Asked before every delete.
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this item? [y/N] ";

pub const HELP: &str = "\
Commands:
  page N       go to page N
  next, prev   move one page forward or back
  sort FIELD   sort by name, group, created_at or updated_at (again to flip)
  add          create a new item
  edit ID      edit an item
  delete ID    delete an item
  show ID      show one item
  refresh      reload the current page
  help         show this help
  quit         leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Page(u32),
    Next,
    Prev,
    Sort(SortField),
    Add,
    Edit(ItemId),
    Delete(ItemId),
    Show(ItemId),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command {0:?}; type `help` for a list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{command}` does not take {extra:?}")]
    UnexpectedArgument { command: &'static str, extra: String },
    #[error("{0:?} is not a valid page number")]
    InvalidPage(String),
    #[error("{0:?} is not a valid item id")]
    InvalidId(String),
    #[error(transparent)]
    InvalidSort(#[from] items_core::sort::UnknownSortField),
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let verb = verb.to_ascii_lowercase();
        let arg = words.next();
        if let Some(extra) = words.next() {
            let command = Self::name(&verb).ok_or_else(|| ParseError::Unknown(verb.clone()))?;
            return Err(ParseError::UnexpectedArgument {
                command,
                extra: extra.to_string(),
            });
        }

        let command = match (verb.as_str(), arg) {
            ("page", Some(raw)) => ShellCommand::Page(
                raw.parse::<u32>()
                    .ok()
                    .filter(|page| *page >= 1)
                    .ok_or_else(|| ParseError::InvalidPage(raw.to_string()))?,
            ),
            ("next" | "n", None) => ShellCommand::Next,
            ("prev" | "p", None) => ShellCommand::Prev,
            ("sort", Some(raw)) => ShellCommand::Sort(SortField::from_str(raw)?),
            ("add" | "new", None) => ShellCommand::Add,
            ("edit", Some(raw)) => ShellCommand::Edit(parse_id(raw)?),
            ("delete" | "rm", Some(raw)) => ShellCommand::Delete(parse_id(raw)?),
            ("show", Some(raw)) => ShellCommand::Show(parse_id(raw)?),
            ("refresh" | "r", None) => ShellCommand::Refresh,
            ("help" | "?", None) => ShellCommand::Help,
            ("quit" | "exit" | "q", None) => ShellCommand::Quit,
            (verb, None) => match Self::name(verb) {
                Some(command) => return Err(ParseError::MissingArgument(command)),
                None => return Err(ParseError::Unknown(verb.to_string())),
            },
            (verb, Some(extra)) => match Self::name(verb) {
                Some(command) => {
                    return Err(ParseError::UnexpectedArgument {
                        command,
                        extra: extra.to_string(),
                    })
                }
                None => return Err(ParseError::Unknown(verb.to_string())),
            },
        };
        Ok(Some(command))
    }

    fn name(verb: &str) -> Option<&'static str> {
        Some(match verb {
            "page" => "page",
            "next" | "n" => "next",
            "prev" | "p" => "prev",
            "sort" => "sort",
            "add" | "new" => "add",
            "edit" => "edit",
            "delete" | "rm" => "delete",
            "show" => "show",
            "refresh" | "r" => "refresh",
            "help" | "?" => "help",
            "quit" | "exit" | "q" => "quit",
            _ => return None,
        })
    }
}

fn parse_id(raw: &str) -> Result<ItemId, ParseError> {
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| ParseError::InvalidId(raw.to_string()))
}

/// Read one line without its terminator. `None` at end of input.
pub fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

pub fn prompt<R: BufRead, W: Write>(
    text: &str,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    read_line(input)
}

/// Ask a yes/no question; anything but `y`/`yes` means no.
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> io::Result<bool> {
    let answer = prompt(question, input, out)?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// How the form view ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Saved(items_core::Item),
    Cancelled,
}

pub struct Shell<'a, T, R, W> {
    app: &'a App<T>,
    table: ItemTable,
    view: Option<TableView>,
    input: R,
    out: W,
}

impl<'a, T, R, W> Shell<'a, T, R, W>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    pub fn new(app: &'a App<T>, input: R, out: W) -> Self {
        Self {
            app,
            table: ItemTable::new(),
            view: None,
            input,
            out,
        }
    }

    /// Run until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        self.show_list().await?;
        loop {
            let Some(line) = prompt(PROMPT, &mut self.input, &mut self.out)? else {
                writeln!(self.out)?;
                return Ok(());
            };
            match ShellCommand::parse(&line) {
                Ok(None) => {}
                Ok(Some(ShellCommand::Quit)) => return Ok(()),
                Ok(Some(command)) => self.dispatch(command).await?,
                Err(err) => writeln!(self.out, "{err}")?,
            }
        }
    }

    pub async fn dispatch(&mut self, command: ShellCommand) -> io::Result<()> {
        match command {
            ShellCommand::Page(page) => {
                self.table.select_page(page);
                self.show_list().await
            }
            ShellCommand::Next => {
                match self.pagination().and_then(|controls| controls.next()) {
                    Some(page) => {
                        self.table.select_page(page);
                        self.show_list().await
                    }
                    None => writeln!(self.out, "Already on the last page."),
                }
            }
            ShellCommand::Prev => {
                match self.pagination().and_then(|controls| controls.previous()) {
                    Some(page) => {
                        self.table.select_page(page);
                        self.show_list().await
                    }
                    None => writeln!(self.out, "Already on the first page."),
                }
            }
            ShellCommand::Sort(field) => {
                self.table.sort_by(field);
                self.show_list().await
            }
            ShellCommand::Add => {
                self.form(ItemForm::default()).await?;
                self.show_list().await
            }
            ShellCommand::Edit(id) => match self.app.service().item(id).await {
                Ok(item) => {
                    self.form(ItemForm::new(Some(&item))).await?;
                    self.show_list().await
                }
                Err(err) => writeln!(self.out, "Error loading item: {err}"),
            },
            ShellCommand::Delete(id) => {
                if !confirm(DELETE_CONFIRMATION, &mut self.input, &mut self.out)? {
                    return writeln!(self.out, "Cancelled.");
                }
                // Failures are reported through the notification.
                let _ = self.app.service().delete_item(id).await;
                self.app.flush_notifications(&mut self.out)?;
                self.show_list().await
            }
            ShellCommand::Show(id) => match self.app.service().item(id).await {
                Ok(item) => writeln!(self.out, "{}", render::item_detail(&item)),
                Err(err) => writeln!(self.out, "Error loading item: {err}"),
            },
            ShellCommand::Refresh => {
                self.app.service().invalidate_lists();
                self.show_list().await
            }
            ShellCommand::Help => writeln!(self.out, "{HELP}"),
            ShellCommand::Quit => Ok(()),
        }
    }

    /// Form view: prompt, validate, submit; repeat until saved or cancelled.
    pub async fn form(&mut self, mut form: ItemForm) -> io::Result<FormOutcome> {
        writeln!(self.out, "{}", render::form_title(&form))?;
        if form.editing().is_some() {
            writeln!(self.out, "(Enter keeps the current value, `{CANCEL_INPUT}` cancels)")?;
        } else {
            writeln!(self.out, "(empty name or `{CANCEL_INPUT}` cancels)")?;
        }
        loop {
            let current = if form.editing().is_some() && !form.name.is_empty() {
                format!("Name [{}]: ", form.name)
            } else {
                "Name: ".to_string()
            };
            let Some(name) = prompt(&current, &mut self.input, &mut self.out)? else {
                return self.cancelled();
            };
            match name.trim() {
                CANCEL_INPUT => return self.cancelled(),
                "" if form.editing().is_none() || form.name.is_empty() => {
                    return self.cancelled()
                }
                "" => {}
                _ => form.name = name,
            }

            let question = format!("Group (Primary/Secondary) [{}]: ", form.group);
            let Some(group) = prompt(&question, &mut self.input, &mut self.out)? else {
                return self.cancelled();
            };
            match group.trim() {
                CANCEL_INPUT => return self.cancelled(),
                "" => {}
                _ => form.group = group,
            }

            match form.submit(self.app.service()).await {
                Ok(item) => {
                    self.app.flush_notifications(&mut self.out)?;
                    return Ok(FormOutcome::Saved(item));
                }
                Err(SubmitError::Invalid(errors)) => {
                    writeln!(self.out, "{}", render::field_errors(&errors))?;
                }
                Err(SubmitError::Api(_)) => {
                    self.app.flush_notifications(&mut self.out)?;
                }
            }
        }
    }

    fn cancelled(&mut self) -> io::Result<FormOutcome> {
        writeln!(self.out, "Cancelled.")?;
        Ok(FormOutcome::Cancelled)
    }

    async fn show_list(&mut self) -> io::Result<()> {
        let view = self.table.load(self.app.service()).await;
        writeln!(self.out, "{}", render::table_view(&view))?;
        self.view = Some(view);
        Ok(())
    }

    fn pagination(&self) -> Option<items_core::pagination::PaginationControls> {
        match &self.view {
            Some(TableView::Rows { pagination, .. }) => *pagination,
            _ => None,
        }
    }
}
