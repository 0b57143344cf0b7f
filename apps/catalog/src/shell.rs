//! Interactive front end: one line per user action, session events printed
//! as they arrive.

use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use client_core::{
    CarForm, CatalogSession, FetchStatus, ResultState, SessionEvent, SubmitError, View,
};
use shared::domain::{Car, CarId, SortPreset};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::SortArg;

const COMMANDS: &str = "\
commands:
  type <text>          edit the search box (debounced)
  search [text]        run the search now
  clear                clear the search box
  filter [type=T] [tags=a,b]
  sort <preset>
  open <id> | close
  delete <id> | confirm | cancel
  add <name>|<description>|<image url>|<type>[|tag,tag]
  back                 return to the list after a failed add
  refresh
  help | quit";

pub fn help_text() -> String {
    let mut out = COMMANDS.to_string();
    out.push_str("\nsort presets:");
    for preset in SortPreset::ALL {
        let name = SortArg::from(preset)
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        out.push_str(&format!("\n  {name:<10} {}", preset.label()));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Type(String),
    Search(String),
    Clear,
    Filter {
        car_type: Option<String>,
        tags: Vec<String>,
    },
    Sort(SortPreset),
    Open(CarId),
    Close,
    Delete(CarId),
    Confirm,
    Cancel,
    Add(CarForm),
    Back,
    Refresh,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    match verb.to_ascii_lowercase().as_str() {
        // Keystrokes keep their spacing; only the separator is dropped.
        "type" => Ok(ShellCommand::Type(
            line.get(verb.len() + 1..).unwrap_or_default().to_string(),
        )),
        "search" => Ok(ShellCommand::Search(rest.to_string())),
        "clear" => Ok(ShellCommand::Clear),
        "filter" => parse_filter(rest),
        "sort" => SortArg::from_str(rest, true)
            .map(|arg| ShellCommand::Sort(arg.into()))
            .map_err(|_| format!("unknown sort '{rest}'")),
        "open" => parse_id(rest).map(ShellCommand::Open),
        "close" => Ok(ShellCommand::Close),
        "delete" => parse_id(rest).map(ShellCommand::Delete),
        "confirm" | "y" | "yes" => Ok(ShellCommand::Confirm),
        "cancel" | "n" | "no" => Ok(ShellCommand::Cancel),
        "add" => parse_add(rest),
        "back" | "list" => Ok(ShellCommand::Back),
        "refresh" => Ok(ShellCommand::Refresh),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        "" => Err("empty command".into()),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn parse_id(raw: &str) -> Result<CarId, String> {
    raw.parse::<i64>()
        .map(CarId)
        .map_err(|_| format!("expected a numeric car id, got '{raw}'"))
}

fn parse_filter(rest: &str) -> Result<ShellCommand, String> {
    let mut car_type = None;
    let mut tags = Vec::new();
    for part in rest.split_whitespace() {
        match part.split_once('=') {
            Some(("type", value)) => car_type = Some(value.to_string()).filter(|v| !v.is_empty()),
            Some(("tags", value)) => tags = split_list(value),
            _ => return Err(format!("unexpected filter argument '{part}'")),
        }
    }
    Ok(ShellCommand::Filter { car_type, tags })
}

fn parse_add(rest: &str) -> Result<ShellCommand, String> {
    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
    if fields.len() < 4 {
        return Err("add needs name|description|image url|type[|tags]".into());
    }
    Ok(ShellCommand::Add(CarForm {
        name: fields[0].to_string(),
        description: fields[1].to_string(),
        image_url: fields[2].to_string(),
        car_type: fields[3].to_string(),
        tags: fields.get(4).map(|raw| split_list(raw)).unwrap_or_default(),
    }))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn render_results(results: &ResultState) -> String {
    match results.status {
        FetchStatus::Loading => "loading...".to_string(),
        FetchStatus::Error => format!(
            "error: {}",
            results.error_message.as_deref().unwrap_or("Unknown error")
        ),
        FetchStatus::Ready if results.items.is_empty() => "No cars found".to_string(),
        FetchStatus::Ready => {
            let mut out = results.count_label();
            for item in &results.items {
                out.push_str(&format!("\n  #{} {}", item.id, item.name));
                if let Some(tags) = item.tags.as_ref().filter(|tags| !tags.is_empty()) {
                    out.push_str(&format!("  [{}]", tags.join(", ")));
                }
            }
            out
        }
    }
}

pub fn render_car(car: &Car) -> String {
    let mut out = format!(
        "#{} {}\n  type: {}\n  {}\n  image: {}",
        car.id, car.name, car.car_type, car.description, car.image_url
    );
    if !car.tags.is_empty() {
        out.push_str(&format!("\n  tags: {}", car.tags.join(", ")));
    }
    if let Some(specs) = car.specifications.as_ref().filter(|specs| !specs.is_empty()) {
        out.push_str("\n  specifications:");
        for line in specs {
            out.push_str(&format!("\n    - {line}"));
        }
    }
    out.push_str(&format!("\n  added: {}", car.created_at.format("%Y-%m-%d")));
    out
}

/// Text to print for one session event, if any.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::QueryChanged(query) => Some(format!(
            "query: \"{}\" ({})",
            query.search,
            query.sort_preset().label()
        )),
        SessionEvent::ResultsChanged(results) => Some(render_results(results)),
        SessionEvent::VocabularyChanged(vocabulary) => Some(format!(
            "types: {} | tags: {}",
            join_set(&vocabulary.car_types),
            join_set(&vocabulary.tags)
        )),
        SessionEvent::ViewChanged(View::List) => Some("[list]".to_string()),
        SessionEvent::ViewChanged(View::AddCar) => Some("[add car]".to_string()),
        SessionEvent::DetailsChanged(Some(car)) => Some(render_car(car)),
        SessionEvent::DetailsChanged(None) => Some("details closed".to_string()),
        SessionEvent::DeletePromptChanged(Some(pending)) => {
            Some(format!("{} (confirm/cancel)", pending.prompt()))
        }
        SessionEvent::DeletePromptChanged(None) => None,
        SessionEvent::Notice(notice) => Some(format!("! {}", notice.message)),
    }
}

fn join_set(values: &std::collections::BTreeSet<String>) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}

pub async fn run(session: Arc<CatalogSession>) -> Result<()> {
    let printer = tokio::spawn(print_events(session.subscribe_events()));
    let mounted = session.mount().await;
    println!("{}", help_text());

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        execute(&session, command).await;
    }

    session.shutdown().await;
    mounted.settled().await;
    printer.abort();
    Ok(())
}

async fn execute(session: &Arc<CatalogSession>, command: ShellCommand) {
    debug!(?command, "shell: executing");
    // Failures surface as notices through the event stream.
    match command {
        ShellCommand::Type(text) => session.set_search_text(text).await,
        ShellCommand::Search(text) => {
            session.submit_search(text).await;
        }
        ShellCommand::Clear => {
            session.clear_search().await;
        }
        ShellCommand::Filter { car_type, tags } => {
            session.set_type_and_tags(car_type, tags).await;
        }
        ShellCommand::Sort(preset) => {
            session.apply_sort_preset(preset).await;
        }
        ShellCommand::Open(id) => {
            let _ = session.open_details(id).await;
        }
        ShellCommand::Close => session.close_details().await,
        ShellCommand::Delete(id) => {
            let name = session
                .results()
                .await
                .items
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.name.clone())
                .unwrap_or_else(|| format!("car #{id}"));
            session.request_delete(id, name).await;
        }
        ShellCommand::Confirm => {
            let _ = session.confirm_delete().await;
        }
        ShellCommand::Cancel => session.cancel_delete().await,
        ShellCommand::Add(form) => {
            session.navigate(View::AddCar).await;
            match session.submit_new_car(&form).await {
                Ok((car, _)) => println!("created #{} {}", car.id, car.name),
                // The add view stays open; rejections also arrive as a notice.
                Err(SubmitError::Invalid(errors)) => {
                    for (field, message) in errors.iter() {
                        println!("  {}: {message}", field.as_str());
                    }
                }
                Err(SubmitError::Api(_)) => {}
            }
        }
        ShellCommand::Back => session.navigate(View::List).await,
        ShellCommand::Refresh => {
            session.refetch().await;
        }
        ShellCommand::Help => println!("{}", help_text()),
        ShellCommand::Quit => {}
    }
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(text) = render_event(&event) {
                    println!("{text}");
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "shell: event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
