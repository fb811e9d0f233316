//! Snapshot codec: a self-describing JSON document carrying project metadata
//! and the full task list.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::models::{Column, Project, Task};

/// A portable copy of one board.
///
/// `project_metadata` and `tasks` are required on import; `columns` only
/// documents the fixed column set for human readers, `task.column` is
/// authoritative.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub project_metadata: Project,
    #[serde(default = "column_listing")]
    pub columns: Value,
    pub tasks: Vec<Task>,
}

fn column_listing() -> Value {
    let mut map = Map::new();
    for column in Column::ALL {
        map.insert(column.as_str().to_string(), json!([]));
    }
    Value::Object(map)
}

/// Serialize a board to an indented snapshot document.
pub fn export(project: &Project, tasks: &[Task]) -> Result<String> {
    let snapshot = Snapshot {
        project_metadata: project.clone(),
        columns: column_listing(),
        tasks: tasks.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Parse a snapshot document, rejecting it when `project_metadata` or
/// `tasks` is missing or malformed.
pub fn parse(document: &str) -> Result<Snapshot> {
    Ok(serde_json::from_str(document)?)
}

/// `kanban_project_<code>_<YYYYMMDD_HHMMSS>.<ext>`
pub fn export_filename(code: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("kanban_project_{code}_{timestamp}.{extension}")
}
