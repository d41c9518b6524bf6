use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use agentview_sessions::{build_sessions, Event, EventKind, EventSource, Session};

use crate::config::Settings;

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List sessions, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a session's events
    Show {
        /// Session ID or unique prefix (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_sessions_command(action: SessionsAction, settings: &Settings) -> Result<()> {
    let source = settings.event_source()?;
    let sessions = load_sessions(source.as_ref()).await?;

    match action {
        SessionsAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!(
                    "{}",
                    format!("No sessions found in {}.", source.describe()).dimmed()
                );
            } else {
                print_sessions_table(&sessions);
            }
        }
        SessionsAction::Show { id, json } => {
            let id = resolve_session_id(&sessions, id)?;
            let session = sessions
                .iter()
                .find(|s| s.session_id == id)
                .with_context(|| format!("Session not found: {}", id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(session)?);
            } else {
                print_session_detail(session);
            }
        }
    }

    Ok(())
}

/// Fetch every record from the source and group it into sessions.
pub async fn load_sessions(source: &dyn EventSource) -> Result<Vec<Session>> {
    let records = source
        .fetch_all()
        .await
        .with_context(|| format!("Failed to load events from {}", source.describe()))?;
    Ok(build_sessions(records))
}

/// Turn a full id, a unique id prefix, or nothing (interactive picker) into a
/// session id.
pub fn resolve_session_id(sessions: &[Session], id: Option<String>) -> Result<String> {
    if let Some(id) = id {
        return match_session(sessions, &id).map(|s| s.session_id.clone());
    }

    if sessions.is_empty() {
        anyhow::bail!("No sessions found.");
    }

    let items: Vec<String> = sessions
        .iter()
        .map(|s| {
            let prompt = s
                .prompts()
                .first()
                .map(|p| preview(&p.text, 60))
                .unwrap_or_else(|| "(no prompt)".to_string());
            format!(
                "{} | {:8} ({} events) | \"{}\"",
                format_start(s),
                s.short_id(),
                s.events.len(),
                prompt
            )
        })
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a session")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(sessions[selection].session_id.clone())
}

fn match_session<'a>(sessions: &'a [Session], id: &str) -> Result<&'a Session> {
    if let Some(exact) = sessions.iter().find(|s| s.session_id == id) {
        return Ok(exact);
    }

    let mut candidates = sessions.iter().filter(|s| s.session_id.starts_with(id));
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Ok(only),
        (Some(_), Some(_)) => anyhow::bail!("Session id prefix '{}' is ambiguous", id),
        (None, _) => anyhow::bail!("Session not found: {}", id),
    }
}

fn print_sessions_table(sessions: &[Session]) {
    println!(
        "{:<17} {:<10} {:<7} {:<8} {:<6} {}",
        "STARTED".dimmed(),
        "SESSION".dimmed(),
        "EVENTS".dimmed(),
        "PROMPTS".dimmed(),
        "TOOLS".dimmed(),
        "FIRST PROMPT".dimmed(),
    );

    for s in sessions {
        let prompts = s.prompts();
        let first = prompts
            .first()
            .map(|p| preview(&p.text, 50))
            .unwrap_or_default();

        println!(
            "{:<17} {:<10} {:<7} {:<8} {:<6} {}",
            format_start(s),
            s.short_id().bright_cyan(),
            s.events.len(),
            prompts.len(),
            s.count_of(EventKind::PreToolUse),
            first
        );
    }
}

fn print_session_detail(session: &Session) {
    println!("{}", "=== Session Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), session.session_id);
    println!("{}  {}", "Started:".dimmed(), format_start(session));
    if let Some(ctx) = session.events.iter().find_map(|e| e.content.context()) {
        println!("{}  {}", "Working Dir:".dimmed(), ctx.cwd);
        println!("{}  {}", "Platform:".dimmed(), ctx.platform);
    }

    let prompts = session.prompts();
    if !prompts.is_empty() {
        println!();
        println!("{}", format!("--- Prompts ({}) ---", prompts.len()).dimmed());
        for p in &prompts {
            println!("  {} {}", format!("[{}]", p.index + 1).bright_blue(), p.text);
        }
    }

    println!();
    println!(
        "{}",
        format!("--- Events ({}) ---", session.events.len()).dimmed()
    );
    for record in &session.events {
        let time = agentview_sessions::parse_timestamp(record.content.iso_timestamp())
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        let kind = record.content.kind();
        let label = match kind {
            EventKind::SessionStart => kind.hook_name().bright_green(),
            EventKind::UserPromptSubmitted => kind.hook_name().bright_cyan(),
            EventKind::PreToolUse => kind.hook_name().bright_yellow(),
            EventKind::PostToolUse => kind.hook_name().yellow(),
        };
        println!("  {}  {:<22} {}", time, label, describe_event(&record.content));
    }
}

/// One-line summary of what an event carries.
fn describe_event(event: &Event) -> String {
    match event {
        Event::SessionStart(e) => format!("source: {}", e.input.source),
        Event::UserPromptSubmitted(e) => preview(&e.input.prompt, 80),
        Event::PreToolUse(e) => match e.input.tool_input.command {
            Some(ref cmd) => format!("{} $ {}", e.input.tool_name, preview(cmd, 60)),
            None => e.input.tool_name.clone(),
        },
        Event::PostToolUse(e) => {
            format!("{} -> {}", e.input.tool_name, preview(&e.input.tool_response, 60))
        }
    }
}

fn format_start(session: &Session) -> String {
    session
        .started_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// First line of `text`, cut to `max` characters.
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}
