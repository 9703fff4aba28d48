//! Interactive prompt.
//!
//! Plain lines are command lines. A leading `?` previews instead of
//! recording; `:`-prefixed lines are directives.

use std::io::Write;

use engine::{Engine, EngineError, ErrorCategory};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{error::Result, render};

const HELP: &str = "\
commands: [-|<][account] 5k 2c ...   record a movement
          ?LINE                      preview without recording
          :use NAME | :clear         select or clear the account
          :totals | :aliases         show totals or account shorthands
          :find QUERY                search units
          :quit";

#[derive(Debug, PartialEq, Eq)]
enum Directive<'a> {
    Nothing,
    Help,
    Quit,
    Use(&'a str),
    Clear,
    Totals,
    Find(&'a str),
    Aliases,
    Preview(&'a str),
    Execute(&'a str),
}

fn directive(line: &str) -> Directive<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Directive::Nothing;
    }
    if let Some(rest) = line.strip_prefix('?') {
        return Directive::Preview(rest.trim());
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Directive::Execute(line);
    };

    let (name, argument) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, argument)| (name, argument.trim()));
    match name {
        "q" | "quit" | "exit" => Directive::Quit,
        "use" if !argument.is_empty() => Directive::Use(argument),
        "clear" => Directive::Clear,
        "totals" => Directive::Totals,
        "find" if !argument.is_empty() => Directive::Find(argument),
        "aliases" => Directive::Aliases,
        _ => Directive::Help,
    }
}

/// Print recoverable errors and keep going; storage failures end the session.
fn feedback<T>(result: std::result::Result<T, EngineError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.category() == ErrorCategory::Storage => Err(err.into()),
        Err(err) => {
            tracing::debug!(category = ?err.category(), "command rejected: {err}");
            println!("error: {err}");
            Ok(None)
        }
    }
}

fn prompt(selected: Option<&str>) -> Result<()> {
    let mut out = std::io::stdout();
    match selected {
        Some(name) => write!(out, "[{name}]> ")?,
        None => write!(out, "> ")?,
    }
    out.flush()?;
    Ok(())
}

pub async fn run(engine: &Engine) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut selected: Option<String> = None;

    println!("{HELP}");
    prompt(selected.as_deref())?;
    while let Some(line) = lines.next_line().await? {
        match directive(&line) {
            Directive::Nothing => {}
            Directive::Help => println!("{HELP}"),
            Directive::Quit => break,
            Directive::Use(name) => match feedback(engine.resolve_account(name).await)? {
                Some(Some(account)) => selected = Some(account.name),
                Some(None) if engine.auto_create() => {
                    println!("{name} will be created with the first command");
                    selected = Some(name.to_string());
                }
                Some(None) => println!("error: unknown account alias: {name}"),
                None => {}
            },
            Directive::Clear => selected = None,
            Directive::Totals => {
                if let Some(totals) = feedback(engine.totals().await)? {
                    print!("{}", render::totals(&totals, engine.units()));
                }
            }
            Directive::Find(query) => {
                println!("{}", render::search(engine.units(), query, 10));
            }
            Directive::Aliases => {
                let shorthand = feedback(engine.shorthand().await)?;
                let registered = feedback(engine.registered_aliases().await)?;
                if let (Some(shorthand), Some(registered)) = (shorthand, registered) {
                    print!("{}", render::aliases(&shorthand, &registered));
                }
            }
            Directive::Preview(input) => {
                if let Some(preview) = feedback(engine.preview(input, selected.as_deref()).await)? {
                    println!("{}", preview.text);
                }
            }
            Directive::Execute(input) => {
                let result = engine.parse_and_execute(input, selected.as_deref()).await;
                if let Some(recorded) = feedback(result)? {
                    println!("{}", render::recorded(&recorded, engine.units()));
                }
            }
        }
        prompt(selected.as_deref())?;
    }
    Ok(())
}
