use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use agentview_feedback::{
    compute_analytics, filter_feedback, Complexity, FeedbackFilters, FeedbackPatch,
    FeedbackRecord, FeedbackStats, FeedbackStore, NewFeedback, TaskCategory,
    RECENT_TRENDS_LIMIT,
};

use crate::config::Settings;
use crate::sessions::{load_sessions, preview, resolve_session_id};

#[derive(Subcommand, Debug)]
pub enum FeedbackAction {
    /// Record feedback for a session
    Add {
        /// Session ID (launches interactive picker if omitted)
        #[arg(long)]
        session: Option<String>,

        /// Overall accuracy, 1-5
        #[arg(long)]
        accuracy: u8,

        /// Overall satisfaction, 1-5
        #[arg(long)]
        satisfaction: u8,

        /// The task was completed
        #[arg(long)]
        completed: bool,

        #[command(flatten)]
        details: DetailArgs,
    },

    /// List feedback records
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one feedback record
    Show {
        /// Feedback ID
        #[arg(required_unless_present = "session", conflicts_with = "session")]
        id: Option<String>,

        /// Show the first feedback recorded for this session instead
        #[arg(long)]
        session: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of a feedback record
    Update {
        /// Feedback ID
        id: String,

        /// Overall accuracy, 1-5
        #[arg(long)]
        accuracy: Option<u8>,

        /// Overall satisfaction, 1-5
        #[arg(long)]
        satisfaction: Option<u8>,

        /// Mark the task as completed
        #[arg(long, conflicts_with = "not_completed")]
        completed: bool,

        /// Mark the task as not completed
        #[arg(long)]
        not_completed: bool,

        #[command(flatten)]
        details: DetailArgs,
    },

    /// Delete a feedback record
    Delete {
        /// Feedback ID
        id: String,
    },

    /// Show aggregate statistics
    Stats {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write feedback records as a JSON array
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Optional feedback fields shared by `add` and `update`.
#[derive(Args, Debug, Default, Clone)]
pub struct DetailArgs {
    /// Task category (bug-fix, feature-development, documentation, refactoring,
    /// testing, debugging, code-review, other)
    #[arg(long)]
    pub category: Option<TaskCategory>,

    /// Task complexity (low, medium, high)
    #[arg(long)]
    pub complexity: Option<Complexity>,

    /// Code quality, 1-5
    #[arg(long)]
    pub code_quality: Option<u8>,

    /// Response relevance, 1-5
    #[arg(long)]
    pub relevance: Option<u8>,

    /// Efficiency, 1-5
    #[arg(long)]
    pub efficiency: Option<u8>,

    /// What worked well
    #[arg(long)]
    pub worked_well: Option<String>,

    /// What needs improvement
    #[arg(long)]
    pub needs_improvement: Option<String>,

    /// Additional comments
    #[arg(long)]
    pub comments: Option<String>,

    /// Your role (e.g. reviewer, author)
    #[arg(long)]
    pub role: Option<String>,

    /// Notes on task completion
    #[arg(long)]
    pub completion_notes: Option<String>,
}

/// Filter flags shared by `list`, `stats` and `export`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Minimum overall accuracy
    #[arg(long)]
    pub min_accuracy: Option<u8>,

    /// Maximum overall accuracy
    #[arg(long)]
    pub max_accuracy: Option<u8>,

    /// Only completed tasks
    #[arg(long, conflicts_with = "not_completed")]
    pub completed: bool,

    /// Only tasks that were not completed
    #[arg(long)]
    pub not_completed: bool,

    /// Only this task category
    #[arg(long)]
    pub category: Option<TaskCategory>,

    /// Only feedback at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub after: Option<String>,

    /// Only feedback at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub before: Option<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> FeedbackFilters {
        FeedbackFilters {
            min_accuracy: self.min_accuracy,
            max_accuracy: self.max_accuracy,
            task_completed: completion_flag(self.completed, self.not_completed),
            task_category: self.category,
            start_date: self.after.clone(),
            end_date: self.before.clone(),
        }
    }
}

impl DetailArgs {
    fn apply_to_new(self, new: &mut NewFeedback) {
        new.task_category = self.category;
        new.complexity = self.complexity;
        new.code_quality = self.code_quality;
        new.response_relevance = self.relevance;
        new.efficiency = self.efficiency;
        new.what_worked_well = self.worked_well;
        new.what_needs_improvement = self.needs_improvement;
        new.additional_comments = self.comments;
        new.user_role = self.role;
        new.task_completion_notes = self.completion_notes;
    }

    fn into_patch(self) -> FeedbackPatch {
        FeedbackPatch {
            task_category: self.category,
            complexity: self.complexity,
            code_quality: self.code_quality,
            response_relevance: self.relevance,
            efficiency: self.efficiency,
            what_worked_well: self.worked_well,
            what_needs_improvement: self.needs_improvement,
            additional_comments: self.comments,
            user_role: self.role,
            task_completion_notes: self.completion_notes,
            ..Default::default()
        }
    }
}

fn completion_flag(completed: bool, not_completed: bool) -> Option<bool> {
    match (completed, not_completed) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

pub async fn handle_feedback_command(action: FeedbackAction, settings: &Settings) -> Result<()> {
    let db = settings.open_database()?;
    let store: &dyn FeedbackStore = &db;

    match action {
        FeedbackAction::Add {
            session,
            accuracy,
            satisfaction,
            completed,
            details,
        } => {
            // An explicit id is not checked against the logs.
            let session_id = match session {
                Some(id) => id,
                None => {
                    let source = settings.event_source()?;
                    let sessions = load_sessions(source.as_ref()).await?;
                    resolve_session_id(&sessions, None)?
                }
            };

            let mut new = NewFeedback::new(session_id, accuracy, satisfaction, completed);
            details.apply_to_new(&mut new);
            let record = store.create(new)?;

            println!(
                "{} feedback {} for session {}",
                "Saved".bright_green(),
                record.id,
                record.session_id
            );
        }
        FeedbackAction::List { filters, json } => {
            let records = filtered_records(store, &filters)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("{}", "No feedback found.".dimmed());
            } else {
                print_feedback_table(&records);
            }
        }
        FeedbackAction::Show { id, session, json } => {
            let record = match (id, session) {
                (Some(id), _) => store
                    .get(&id)?
                    .with_context(|| format!("Feedback not found: {}", id))?,
                (None, Some(session_id)) => store
                    .find_by_session(&session_id)?
                    .with_context(|| format!("No feedback for session: {}", session_id))?,
                (None, None) => anyhow::bail!("Give a feedback ID or --session"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_feedback_detail(&record);
            }
        }
        FeedbackAction::Update {
            id,
            accuracy,
            satisfaction,
            completed,
            not_completed,
            details,
        } => {
            let patch = FeedbackPatch {
                overall_accuracy: accuracy,
                overall_satisfaction: satisfaction,
                task_completed: completion_flag(completed, not_completed),
                ..details.into_patch()
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one field flag.");
            }

            match store.update(&id, patch)? {
                Some(record) => println!("{} feedback {}", "Updated".bright_green(), record.id),
                None => println!("{}", format!("Feedback not found: {}", id).dimmed()),
            }
        }
        FeedbackAction::Delete { id } => {
            if store.delete(&id)? {
                println!("{} feedback {}", "Deleted".bright_green(), id);
            } else {
                println!("{}", format!("Feedback not found: {}", id).dimmed());
            }
        }
        FeedbackAction::Stats { filters, json } => {
            let records = filtered_records(store, &filters)?;
            let stats = compute_analytics(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        FeedbackAction::Export { filters, output } => {
            let records = filtered_records(store, &filters)?;
            let json = serde_json::to_string_pretty(&records)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Exported {} records to {}", records.len(), path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn filtered_records(store: &dyn FeedbackStore, args: &FilterArgs) -> Result<Vec<FeedbackRecord>> {
    let records = store.list()?;
    Ok(filter_feedback(&records, &args.to_filters())?)
}

fn print_feedback_table(records: &[FeedbackRecord]) {
    println!(
        "{:<17} {:<9} {:<10} {:<4} {:<4} {:<5} {}",
        "DATE".dimmed(),
        "ID".dimmed(),
        "SESSION".dimmed(),
        "ACC".dimmed(),
        "SAT".dimmed(),
        "DONE".dimmed(),
        "CATEGORY".dimmed(),
    );

    for r in records {
        let done = if r.task_completed {
            "yes".bright_green()
        } else {
            "no".bright_red()
        };
        println!(
            "{:<17} {:<9} {:<10} {:<4} {:<4} {:<5} {}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            short(&r.id, 8),
            short(&r.session_id, 10),
            rating_colored(r.overall_accuracy),
            rating_colored(r.overall_satisfaction),
            done,
            r.task_category.map(|c| c.label()).unwrap_or_default()
        );
    }
}

fn print_feedback_detail(record: &FeedbackRecord) {
    println!("{}", "=== Feedback Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), record.id);
    println!("{}  {}", "Session:".dimmed(), record.session_id);
    println!(
        "{}  {}",
        "Submitted:".dimmed(),
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{}  {}/5", "Accuracy:".dimmed(), record.overall_accuracy);
    println!("{}  {}/5", "Satisfaction:".dimmed(), record.overall_satisfaction);
    println!(
        "{}  {}",
        "Completed:".dimmed(),
        if record.task_completed { "yes" } else { "no" }
    );

    let optional_ratings = [
        ("Code Quality:", record.code_quality),
        ("Relevance:", record.response_relevance),
        ("Efficiency:", record.efficiency),
    ];
    for (label, value) in optional_ratings {
        if let Some(value) = value {
            println!("{}  {}/5", label.dimmed(), value);
        }
    }
    if let Some(category) = record.task_category {
        println!("{}  {}", "Category:".dimmed(), category.label());
    }
    if let Some(complexity) = record.complexity {
        println!("{}  {}", "Complexity:".dimmed(), complexity);
    }
    if let Some(ref role) = record.user_role {
        println!("{}  {}", "Role:".dimmed(), role);
    }

    let notes = [
        ("Completion Notes:", &record.task_completion_notes),
        ("Worked Well:", &record.what_worked_well),
        ("Needs Improvement:", &record.what_needs_improvement),
        ("Comments:", &record.additional_comments),
    ];
    for (label, text) in notes {
        if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
            println!();
            println!("{}", label.dimmed());
            println!("  {}", text);
        }
    }

    if let Some(ref prompts) = record.prompt_feedback {
        println!();
        println!("{}", format!("--- Prompts ({}) ---", prompts.len()).dimmed());
        for p in prompts {
            println!(
                "  {} {} ({}/5, {})",
                format!("[{}]", p.prompt_index + 1).bright_blue(),
                preview(&p.prompt_text, 60),
                p.response_accuracy,
                if p.response_helpful {
                    "helpful"
                } else {
                    "not helpful"
                }
            );
            if let Some(ref issues) = p.issues {
                let labels: Vec<String> = issues.iter().map(|i| i.label()).collect();
                if !labels.is_empty() {
                    println!("      {} {}", "Issues:".dimmed(), labels.join(", "));
                }
            }
            if let Some(ref notes) = p.notes {
                println!("      {} {}", "Notes:".dimmed(), notes);
            }
        }
    }
}

fn print_stats(stats: &FeedbackStats) {
    println!("{}", "=== Feedback Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total Feedback:".dimmed(), stats.total_feedback);
    println!("{}  {:.1}/5", "Avg Accuracy:".dimmed(), stats.avg_accuracy);
    println!(
        "{}  {:.1}/5",
        "Avg Satisfaction:".dimmed(),
        stats.avg_satisfaction
    );
    println!(
        "{}  {:.1}%",
        "Completion Rate:".dimmed(),
        stats.completion_rate
    );

    let categories = stats.category_entries();
    if !categories.is_empty() {
        println!();
        println!("{}", "By Category:".dimmed());
        for entry in categories {
            println!("  {:<22} {}", entry.category.label(), entry.count);
        }
    }

    let recent = stats.recent(RECENT_TRENDS_LIMIT);
    if !recent.is_empty() {
        println!();
        println!("{}", "Recent Trends:".dimmed());
        for point in recent {
            println!(
                "  {:<12} accuracy {}  satisfaction {}",
                point.date, point.accuracy, point.satisfaction
            );
        }
    }
}

fn rating_colored(value: u8) -> colored::ColoredString {
    let text = value.to_string();
    match value {
        4..=5 => text.bright_green(),
        3 => text.bright_yellow(),
        _ => text.bright_red(),
    }
}

fn short(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}
