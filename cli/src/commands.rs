//! One-shot subcommands.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::Context;
use items_core::{ItemForm, ItemId, ItemTable, SubmitError, TableView, Transport};

use crate::app::App;
use crate::cli::{Command, CreateArgs, DeleteArgs, ListArgs, UpdateArgs};
use crate::render;
use crate::shell::{self, Shell};

/// Whether a command did what was asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

/// Run `command`. Backend failures are printed to `out` and reported as
/// [`Outcome::Failure`]; only I/O on `input`/`out` fails with `Err`.
pub async fn run<T, R, W>(
    app: &App<T>,
    command: Command,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Outcome>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    match command {
        Command::List(args) => list(app, &args, out).await,
        Command::Show { id } => show(app, id, out).await,
        Command::Create(args) => create(app, args, out).await,
        Command::Update(args) => update(app, args, out).await,
        Command::Delete(args) => delete(app, &args, input, out).await,
        Command::Shell => {
            Shell::new(app, input, out)
                .run()
                .await
                .context("shell I/O failed")?;
            Ok(Outcome::Success)
        }
    }
}

async fn list<T: Transport, W: Write>(
    app: &App<T>,
    args: &ListArgs,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    let mut table = ItemTable::new();
    table.select_page(args.page);
    table.set_sort(args.sort_state());

    let view = table.load(app.service()).await;
    writeln!(out, "{}", render::table_view(&view))?;
    Ok(match view {
        TableView::Error(_) => Outcome::Failure,
        _ => Outcome::Success,
    })
}

async fn show<T: Transport, W: Write>(
    app: &App<T>,
    id: ItemId,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    match app.service().item(id).await {
        Ok(item) => {
            writeln!(out, "{}", render::item_detail(&item))?;
            Ok(Outcome::Success)
        }
        Err(err) => {
            writeln!(out, "Error loading item: {err}")?;
            Ok(Outcome::Failure)
        }
    }
}

async fn create<T: Transport, W: Write>(
    app: &App<T>,
    args: CreateArgs,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    let mut form = ItemForm::default();
    form.name = args.name;
    if let Some(group) = args.group {
        form.group = group;
    }
    submit(app, &form, out).await
}

/// Fields not given on the command line keep the item's current values.
async fn update<T: Transport, W: Write>(
    app: &App<T>,
    args: UpdateArgs,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    let item = match app.service().item(args.id).await {
        Ok(item) => item,
        Err(err) => {
            writeln!(out, "Error loading item: {err}")?;
            return Ok(Outcome::Failure);
        }
    };

    let mut form = ItemForm::new(Some(&item));
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(group) = args.group {
        form.group = group;
    }
    submit(app, &form, out).await
}

async fn submit<T: Transport, W: Write>(
    app: &App<T>,
    form: &ItemForm,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    let result = form.submit(app.service()).await;
    app.flush_notifications(out)?;
    match result {
        Ok(item) => {
            writeln!(out, "{}", render::item_detail(&item))?;
            Ok(Outcome::Success)
        }
        Err(SubmitError::Invalid(errors)) => {
            writeln!(out, "{}", render::field_errors(&errors))?;
            Ok(Outcome::Failure)
        }
        Err(SubmitError::Api(_)) => Ok(Outcome::Failure),
    }
}

async fn delete<T: Transport, R: BufRead, W: Write>(
    app: &App<T>,
    args: &DeleteArgs,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    if !args.yes && !shell::confirm(shell::DELETE_CONFIRMATION, input, out)? {
        writeln!(out, "Cancelled.")?;
        return Ok(Outcome::Success);
    }
    let result = app.service().delete_item(args.id).await;
    app.flush_notifications(out)?;
    Ok(match result {
        Ok(()) => Outcome::Success,
        Err(_) => Outcome::Failure,
    })
}
