use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::instrument;

use crate::{
    commands::{Command, ShellLine},
    dispatch::{dispatch, App},
    error::{Error, Result},
};

const PROMPT: &str = "quizmaker> ";

/// Reads commands from stdin until `quit` or end of input.
#[instrument(level = "info", skip(app))]
pub async fn run_shell(app: &mut App) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    log::info!("Shell started");

    loop {
        write_out(&mut stdout, PROMPT).await?;
        let Some(line) = lines.next_line().await.map_err(|e| Error::io("<stdin>", e))? else {
            break;
        };
        let words = split_line(&line);
        if words.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // also covers `help` and `--help`
                write_out(&mut stdout, &format!("{}\n", e.render())).await?;
                continue;
            }
        };

        match dispatch(app, command).await {
            Ok(outcome) => {
                write_out(&mut stdout, &format!("{}\n", outcome.message)).await?;
                if outcome.quit {
                    break;
                }
            }
            Err(e) => {
                log::warn!("Command '{}' failed: {}", line.trim(), e);
                write_out(&mut stdout, &format!("Error: {e}\n")).await?;
            }
        }
    }

    if app.session.is_dirty() {
        log::warn!("Leaving the shell with unsaved changes");
    }
    app.close().await;
    Ok(())
}

/// Runs a single command against `file`, saving afterwards when it changed anything.
#[instrument(level = "info", skip(app, command))]
pub async fn run_once(app: &mut App, file: Option<PathBuf>, command: Command) -> Result<String> {
    match &command {
        Command::Shell => return Err(Error::ShellOnly("shell")),
        Command::Quit { .. } => return Err(Error::ShellOnly("quit")),
        _ => {}
    }

    let creates = matches!(command, Command::New(_));
    let starts_fresh = creates || matches!(command, Command::Open { .. });
    if let Some(file) = &file {
        if !starts_fresh && file.exists() {
            app.session.open(file)?;
        }
    }

    let mut message = dispatch(app, command).await?.message;

    // `new` always writes the file, even a blank one
    if app.session.is_dirty() || (creates && file.is_some()) {
        if app.session.file_path().is_none() {
            if let Some(file) = file {
                app.session.set_file_path(file);
            }
        }
        if app.session.file_path().is_some() {
            let report = app.session.save(&app.config.media_dir)?;
            message = format!("{message}\n{}", crate::view::save_report(&report));
        } else {
            log::warn!("Changes were not written: no --file given");
            message.push_str("\nChanges were not written, pass --file to keep them.");
        }
    }

    app.close().await;
    Ok(message)
}

/// Splits a shell line into words. Single or double quotes group words, a backslash escapes
/// the next character.
pub fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

async fn write_out(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout
        .write_all(text.as_bytes())
        .await
        .map_err(|e| Error::io("<stdout>", e))?;
    stdout.flush().await.map_err(|e| Error::io("<stdout>", e))
}
