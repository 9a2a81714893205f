//! Text rendering for CLI output.

use crate::board::BoardView;
use crate::config::BoardConfig;
use crate::types::{priority_to_str, Sprint, Task, TeamSnapshot};

/// Render a team's board grouped by configured column, in column order.
pub fn format_board(snapshot: &TeamSnapshot, config: &BoardConfig) -> String {
    let view = BoardView::new(&snapshot.tasks);
    let mut out = String::new();

    out.push_str(&format!(
        "# Board: {} ({} tasks)\n\n",
        snapshot.team_id,
        snapshot.tasks.len()
    ));

    for column in &config.columns {
        let tasks = view.column(&column.id);
        match column.wip_limit {
            Some(limit) => {
                out.push_str(&format!("## {} ({}/{})\n", column.name, tasks.len(), limit))
            }
            None => out.push_str(&format!("## {} ({})\n", column.name, tasks.len())),
        }
        for task in tasks {
            out.push_str(&format_task_line(task));
        }
        out.push('\n');
    }

    // Tasks whose status is not a configured column (stale config, foreign
    // writer) still show up rather than silently disappearing.
    let mut orphans: Vec<&str> = view
        .statuses()
        .filter(|s| config.find_column(s).is_none())
        .collect();
    orphans.sort_unstable();
    for status in orphans {
        let tasks = view.column(status);
        out.push_str(&format!("## {status} (unconfigured, {})\n", tasks.len()));
        for task in tasks {
            out.push_str(&format_task_line(task));
        }
        out.push('\n');
    }

    out
}

/// First eight characters of an id. Char-based so a foreign writer's
/// non-ASCII ids render instead of panicking on a byte boundary.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!("{}. [{}] {}", task.position, short_id(&task.id), task.title);
    if task.priority != 0 {
        line.push_str(&format!(" ({})", priority_to_str(task.priority)));
    }
    if let Some(ref due) = task.due_date {
        line.push_str(&format!(" due {due}"));
    }
    if !task.tags.is_empty() {
        line.push_str(&format!(" #{}", task.tags.join(" #")));
    }
    line.push('\n');
    line
}

/// Render a flat task list in board order.
pub fn format_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) -> String {
    let mut out = String::new();
    let mut count = 0;
    for task in tasks {
        out.push_str(&format!("{}/", task.status));
        out.push_str(&format_task_line(task));
        count += 1;
    }
    out.push_str(&format!("{count} tasks\n"));
    out
}

/// Render a sprint list, one line per sprint.
pub fn format_sprints(sprints: &[Sprint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Sprints ({})\n", sprints.len()));
    for sprint in sprints {
        out.push_str(&format!(
            "{} [{}] {} — {} ({})\n",
            sprint.name,
            short_id(&sprint.id),
            sprint.start_date,
            sprint.end_date,
            sprint.status.as_str()
        ));
    }
    out
}
