//! sprint-board CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use sprint_board::cli::{AddTaskArgs, Cli, Command, SprintCommand, TaskCommand};
use sprint_board::config::BoardConfig;
use sprint_board::db::Database;
use sprint_board::format::{format_board, format_sprints, format_tasks};
use sprint_board::service::{BoardService, NewTask};
use sprint_board::sprints::compute_status;
use sprint_board::types::parse_priority;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let mut config = BoardConfig::load(cli.config.as_deref().map(Path::new))?;
    if let Some(database) = cli.database {
        config.db_path = PathBuf::from(database);
    }

    let db = Database::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    let mut service = BoardService::new(db, config, &cli.team)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Board => {
            print!("{}", format_board(service.snapshot(), service.config()));
        }
        Command::Task(task_command) => run_task_command(&mut service, task_command)?,
        Command::Sprint(sprint_command) => {
            run_sprint_command(&mut service, sprint_command, today)?
        }
    }

    Ok(())
}

fn run_task_command(service: &mut BoardService<Database>, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add(args) => {
            let task = service.add_task(new_task_from_args(args)?)?;
            println!("added {} at {}[{}]", task.id, task.status, task.position);
        }
        TaskCommand::Move { task, status, index } => {
            let index = match index {
                Some(index) => index,
                None => {
                    // Default to the end of the destination column.
                    let snapshot = service.snapshot();
                    let same_column = snapshot
                        .tasks
                        .iter()
                        .any(|t| t.id == task && t.status == status);
                    let len = snapshot.tasks.iter().filter(|t| t.status == status).count();
                    if same_column { len.saturating_sub(1) } else { len }
                }
            };
            let changes = service.move_task(&task, &status, index)?;
            println!("moved {task} to {status}[{index}] ({} rows changed)", changes.len());
        }
        TaskCommand::Reorder { task, index } => {
            let changes = service.reorder_task(&task, index)?;
            println!("reordered {task} to [{index}] ({} rows changed)", changes.len());
        }
        TaskCommand::Rm { task } => {
            service.remove_task(&task)?;
            println!("removed {task}");
        }
        TaskCommand::List { sprint } => {
            let tasks = service
                .snapshot()
                .tasks
                .iter()
                .filter(|t| sprint.is_none() || t.sprint_id == sprint);
            print!("{}", format_tasks(tasks));
        }
        TaskCommand::Assign { task, sprint } => {
            service.assign_sprint(&task, sprint.as_deref())?;
            match sprint {
                Some(sprint) => println!("assigned {task} to sprint {sprint}"),
                None => println!("cleared sprint for {task}"),
            }
        }
    }
    Ok(())
}

fn run_sprint_command(
    service: &mut BoardService<Database>,
    command: SprintCommand,
    today: chrono::NaiveDate,
) -> Result<()> {
    match command {
        SprintCommand::Generate { year, weeks } => {
            let created = service.generate_sprints(year, weeks)?;
            println!("created {} sprints for {year}", created.len());
        }
        SprintCommand::Refresh => {
            let changes = service.refresh_sprint_statuses(today)?;
            for change in &changes {
                println!("{} -> {}", change.id, change.status.as_str());
            }
            println!("{} sprints updated", changes.len());
        }
        SprintCommand::List => {
            print!("{}", format_sprints(service.snapshot().sprints.as_slice()));
            if let Some(default) = service.default_sprint(today) {
                println!(
                    "default: {} ({})",
                    default.name,
                    compute_status(&default, today).as_str()
                );
            }
        }
    }
    Ok(())
}

fn new_task_from_args(args: AddTaskArgs) -> Result<NewTask> {
    let due_date = args
        .due
        .map(|due| {
            due.parse::<chrono::NaiveDate>()
                .with_context(|| format!("invalid due date '{due}' (expected YYYY-MM-DD)"))
        })
        .transpose()?;

    Ok(NewTask {
        title: args.title,
        description: args.description,
        status: args.status,
        sprint_id: args.sprint,
        assignee_id: None,
        priority: parse_priority(&args.priority),
        tags: args.tags,
        estimated_effort: args.estimate,
        due_date,
    })
}
