use std::fmt;
use std::io::Write;

use anyhow::{anyhow, Context, Result};

use crate::cli::{AddArgs, CliCommand, DeleteArgs, EditArgs, LookupArgs, UsersArgs};
use crate::config::AppConfig;
use crate::core::validation::{check_documento, MSG_USER_NOT_REGISTERED};
use crate::core::{Card, Field, FormDriver, Outcome, UserLookup};
use crate::model::{RecordId, User};
use crate::remote::{HttpBackend, MemoryBackend, UserRegistry};

pub fn execute<W: Write>(
    config: &AppConfig,
    offline: bool,
    command: CliCommand,
    mut writer: W,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let mut driver = connect(config, offline)?;
    runtime.block_on(run(&mut driver, command, &mut writer))
}

/// Bind a driver to the configured server, or to the sample registry when
/// running offline.
pub fn connect(config: &AppConfig, offline: bool) -> Result<FormDriver> {
    if offline {
        tracing::info!("using in-process sample backend");
        return Ok(FormDriver::with_backend(MemoryBackend::seeded()));
    }
    tracing::info!(api_url = %config.api_url(), "using REST backend");
    Ok(FormDriver::with_backend(HttpBackend::from_config(config)?))
}

pub async fn run<W: Write>(driver: &mut FormDriver, command: CliCommand, writer: W) -> Result<()> {
    match command {
        CliCommand::List => handle_list(driver, writer).await,
        CliCommand::Users(args) => handle_users(driver, &args, writer).await,
        CliCommand::Lookup(args) => handle_lookup(driver, &args, writer).await,
        CliCommand::Add(args) => handle_add(driver, &args, writer).await,
        CliCommand::Edit(args) => handle_edit(driver, &args, writer).await,
        CliCommand::Delete(args) => handle_delete(driver, &args, writer).await,
        CliCommand::Tui => Err(anyhow!("launch interactive surfaces directly")),
    }
}

fn unexpected(outcome: Outcome) -> anyhow::Error {
    match outcome {
        Outcome::Failed(err) => err.into(),
        Outcome::Rejected(errors) => anyhow!("{errors}"),
        Outcome::UserNotFound => anyhow!(MSG_USER_NOT_REGISTERED),
        Outcome::UnknownTask(id) => anyhow!("task {id} not found"),
        other => anyhow!("unexpected outcome: {other:?}"),
    }
}

async fn sync(driver: &mut FormDriver) -> Result<()> {
    match driver.refresh().await {
        Outcome::Loaded { .. } => Ok(()),
        other => Err(unexpected(other)),
    }
}

async fn handle_list<W: Write>(driver: &mut FormDriver, mut writer: W) -> Result<()> {
    sync(driver).await?;
    let deck = driver.controller().deck();
    if deck.shows_empty_state() {
        writeln!(writer, "No hay tareas")?;
        return Ok(());
    }
    for card in deck.cards() {
        writeln!(writer, "{}", CardLine(card))?;
    }
    writeln!(writer, "{}", deck.count_label())?;
    Ok(())
}

async fn handle_users<W: Write>(
    driver: &mut FormDriver,
    args: &UsersArgs,
    mut writer: W,
) -> Result<()> {
    let registry = driver.user_registry();
    let mut lookup = UserLookup::new();
    lookup.replace_cache(registry.list_users().await?);

    let users: Vec<&User> = match args.prefix.as_deref() {
        Some(prefix) => lookup.suggest_by_prefix(prefix),
        None => lookup.cached().iter().collect(),
    };
    if users.is_empty() {
        writeln!(writer, "No matching users")?;
    }
    for user in users {
        writeln!(writer, "{}\t{}", user.documento, user.nombre_completo)?;
    }
    Ok(())
}

async fn handle_lookup<W: Write>(
    driver: &mut FormDriver,
    args: &LookupArgs,
    mut writer: W,
) -> Result<()> {
    let documento = args.documento.trim();
    check_documento(documento).map_err(|message| anyhow!(message))?;

    let registry = driver.user_registry();
    let mut lookup = UserLookup::new();
    match lookup
        .find_by_identifier(registry.as_ref(), documento)
        .await?
    {
        Some(user) => {
            writeln!(writer, "{}\t{}", user.documento, user.nombre_completo)?;
            let others: Vec<&str> = lookup
                .names_for_identifier(documento)
                .into_iter()
                .filter(|name| *name != user.nombre_completo)
                .collect();
            if !others.is_empty() {
                writeln!(writer, "Also registered: {}", others.join(", "))?;
            }
        }
        None => writeln!(writer, "{MSG_USER_NOT_REGISTERED}")?,
    }
    Ok(())
}

async fn handle_add<W: Write>(driver: &mut FormDriver, args: &AddArgs, mut writer: W) -> Result<()> {
    driver.input(Field::Documento, &args.documento);
    match driver.submit().await {
        Outcome::UserResolved(_) => {}
        other => return Err(unexpected(other)),
    }

    driver.input(Field::Title, &args.title);
    driver.input(Field::Description, &args.description);
    driver.input(Field::Status, args.status.as_str());
    match driver.submit().await {
        Outcome::Created(task) => {
            writeln!(
                writer,
                "Created task #{} for {}: {}",
                task.id, task.nombre_completo, task.title
            )?;
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn handle_edit<W: Write>(driver: &mut FormDriver, args: &EditArgs, mut writer: W) -> Result<()> {
    sync(driver).await?;
    let id = RecordId::new(args.id.clone());
    match driver.begin_edit(&id) {
        Outcome::EditStarted(_) => {}
        other => return Err(unexpected(other)),
    }

    if let Some(title) = &args.title {
        driver.input(Field::Title, title);
    }
    if let Some(description) = &args.description {
        driver.input(Field::Description, description);
    }
    if let Some(status) = args.status {
        driver.input(Field::Status, status.as_str());
    }

    match driver.submit().await {
        Outcome::Updated(task) => {
            writeln!(
                writer,
                "Updated task #{}: {} [{}]",
                task.id,
                task.title,
                task.status.label()
            )?;
            Ok(())
        }
        Outcome::Unchanged => {
            writeln!(writer, "No changes for task #{id}")?;
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn handle_delete<W: Write>(
    driver: &mut FormDriver,
    args: &DeleteArgs,
    mut writer: W,
) -> Result<()> {
    sync(driver).await?;
    let mut summary = DeleteSummary::default();
    for raw in &args.ids {
        let id = RecordId::new(raw.clone());
        match driver.delete(&id).await {
            Outcome::Deleted(_) => summary.deleted += 1,
            Outcome::UnknownTask(_) => summary.missing.push(raw.clone()),
            Outcome::Failed(err) => summary.failed.push(format!("{raw} ({err})")),
            other => return Err(unexpected(other)),
        }
    }
    summary.write_to(&mut writer)
}

struct CardLine<'a>(&'a Card);

impl fmt::Display for CardLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let card = self.0;
        write!(
            f,
            "#{:<4} {:<8} {} · {} {} ({}) · {}",
            card.task_id(),
            card.badge.label,
            card.title,
            card.avatar,
            card.username,
            card.documento(),
            card.timestamp
        )
    }
}

#[derive(Default)]
struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
    failed: Vec<String>,
}

impl DeleteSummary {
    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", SummaryLine::deleted(self.deleted))?;
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        if !self.failed.is_empty() {
            writeln!(writer, "Failed: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

enum SummaryLine {
    Deleted(usize),
    NoneDeleted,
}

impl SummaryLine {
    fn deleted(count: usize) -> Self {
        if count > 0 {
            SummaryLine::Deleted(count)
        } else {
            SummaryLine::NoneDeleted
        }
    }
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::Deleted(count) => {
                write!(
                    f,
                    "Deleted {} task{}",
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
            SummaryLine::NoneDeleted => write!(f, "No tasks deleted"),
        }
    }
}
