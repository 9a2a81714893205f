//! CLI command definitions for sprint-board.
//!
//! The CLI is a thin driver over `BoardService`; it plays the role of both
//! the command source and the identity/session collaborator (it supplies
//! the team id and today's date).

use clap::{Args, Parser, Subcommand};

/// Sprint board engine CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Team the command operates on
    #[arg(short, long, global = true, default_value = "default")]
    pub team: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the board grouped by column
    Board,

    /// Task operations
    #[command(subcommand)]
    Task(TaskCommand),

    /// Sprint operations
    #[command(subcommand)]
    Sprint(SprintCommand),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task (appended at the end of its column)
    Add(AddTaskArgs),

    /// Move a task to a column at an index
    Move {
        /// Task id
        task: String,
        /// Destination column id
        status: String,
        /// Destination index (defaults to the end of the column)
        index: Option<usize>,
    },

    /// Reorder a task within its column
    Reorder {
        /// Task id
        task: String,
        /// Destination index
        index: usize,
    },

    /// Delete a task, closing the gap in its column
    Rm {
        /// Task id
        task: String,
    },

    /// List tasks as a flat list, optionally filtered by sprint
    List {
        /// Only tasks assigned to this sprint
        #[arg(long)]
        sprint: Option<String>,
    },

    /// Assign a task to a sprint (omit --sprint to clear)
    Assign {
        /// Task id
        task: String,
        /// Sprint id
        #[arg(long)]
        sprint: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct AddTaskArgs {
    /// Task title
    pub title: String,

    /// Task description
    #[arg(long)]
    pub description: Option<String>,

    /// Target column (defaults to the first column)
    #[arg(long)]
    pub status: Option<String>,

    /// Priority: high, medium, low, or an integer
    #[arg(long, default_value = "medium")]
    pub priority: String,

    /// Tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Estimated effort in hours
    #[arg(long)]
    pub estimate: Option<f64>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Sprint id
    #[arg(long)]
    pub sprint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SprintCommand {
    /// Generate the sprint windows for a year (idempotent)
    Generate {
        /// Reference year
        year: i32,
        /// Window length in weeks (defaults to the configured duration)
        #[arg(long)]
        weeks: Option<u32>,
    },

    /// Recompute sprint statuses from today's date
    Refresh,

    /// List the team's sprints and the default selection
    List,
}
