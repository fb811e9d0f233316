mod access;
mod board;
mod config;
mod db;
mod error;
mod logo;
mod models;
mod pdf_gen;
mod snapshot;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::board::Session;
use crate::config::Config;
use crate::db::Database;
use crate::models::{Column, NoteColor};

/// Shared kanban board: projects joined by 8-character codes, tasks moved
/// across five fixed columns, JSON snapshots and a printable PDF export.
#[derive(Parser)]
#[command(name = "kanban-board", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project and print its access code
    CreateProject {
        /// Your name; you become the project admin
        #[arg(long)]
        admin_name: String,
        #[arg(long, default_value = "My Kanban Project")]
        title: String,
    },
    /// Print the board for a project, column by column
    Show {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
    },
    /// Create a task in a column
    AddTask {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "Backlog")]
        column: Column,
        #[arg(long, default_value = "Yellow")]
        color: NoteColor,
        #[arg(long)]
        content: String,
    },
    /// Move a task to another column (open to any project member)
    MoveTask {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        task_id: Uuid,
        #[arg(long)]
        to: Column,
    },
    /// Edit a task's content and color (owner or admin)
    EditTask {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        task_id: Uuid,
        #[arg(long)]
        content: String,
        #[arg(long)]
        color: NoteColor,
        /// Supply the admin passphrase to act as admin
        #[arg(long)]
        admin_password: Option<String>,
    },
    /// Delete a task (owner or admin)
    DeleteTask {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        task_id: Uuid,
        #[arg(long)]
        admin_password: Option<String>,
    },
    /// Delete every task in the project (admin, requires --yes)
    ClearTasks {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        admin_password: String,
        /// Confirm that all tasks should be removed
        #[arg(long)]
        yes: bool,
    },
    /// Rename the project (admin)
    SetTitle {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        admin_password: String,
        #[arg(long)]
        title: String,
    },
    /// Upload a project logo image (admin)
    SetLogo {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        admin_password: String,
        /// PNG or JPEG file; resized to fit 200x200
        #[arg(long)]
        file: PathBuf,
    },
    /// Export the project as a JSON snapshot
    ExportJson {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        /// Output path; defaults to kanban_project_<code>_<timestamp>.json
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a JSON snapshot, replacing the project it names
    ImportJson {
        #[arg(long)]
        user: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Render the board to a PDF file
    ExportPdf {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
        /// Output path; defaults to kanban_project_<code>_<timestamp>.pdf
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::init()?;

    // Fatal on retry exhaustion; nothing below can run without the store.
    let db = db::init(&config).await?;

    run(cli.command, &config, &db).await
}

/// Open a session for an existing project, elevating to admin when a
/// passphrase is supplied.
async fn open_session(
    db: &Database,
    config: &Config,
    code: &str,
    user: &str,
    admin_password: Option<&str>,
) -> Result<Session> {
    let mut session = Session::join_project(db, code, user).await?;
    if let Some(password) = admin_password {
        session.elevate(config, password)?;
    }
    Ok(session)
}

async fn run(command: Command, config: &Config, db: &Database) -> Result<()> {
    match command {
        Command::CreateProject { admin_name, title } => {
            let session = Session::create_project(db, &admin_name, &title).await?;
            println!("Project '{}' created.", session.project.title);
            println!("Access code: {}", session.project.code);
            println!("Share this code with your team.");
        }
        Command::Show { code, user } => {
            let session = open_session(db, config, &code, &user, None).await?;
            print_board(&session);
        }
        Command::AddTask {
            code,
            user,
            column,
            color,
            content,
        } => {
            let mut session = open_session(db, config, &code, &user, None).await?;
            let id = session.create_task(db, column, color, content).await?;
            println!("Created task {id} in {column}.");
        }
        Command::MoveTask {
            code,
            user,
            task_id,
            to,
        } => {
            let mut session = open_session(db, config, &code, &user, None).await?;
            session.move_task(db, task_id, to).await?;
            println!("Moved task {task_id} to {to}.");
        }
        Command::EditTask {
            code,
            user,
            task_id,
            content,
            color,
            admin_password,
        } => {
            let mut session =
                open_session(db, config, &code, &user, admin_password.as_deref()).await?;
            session.edit_task(db, task_id, content, color).await?;
            println!("Updated task {task_id}.");
        }
        Command::DeleteTask {
            code,
            user,
            task_id,
            admin_password,
        } => {
            let mut session =
                open_session(db, config, &code, &user, admin_password.as_deref()).await?;
            session.delete_task(db, task_id).await?;
            println!("Deleted task {task_id}.");
        }
        Command::ClearTasks {
            code,
            user,
            admin_password,
            yes,
        } => {
            let mut session =
                open_session(db, config, &code, &user, Some(&admin_password)).await?;
            session.clear_tasks(db, yes).await?;
            println!("All tasks removed from {code}.");
        }
        Command::SetTitle {
            code,
            user,
            admin_password,
            title,
        } => {
            let mut session =
                open_session(db, config, &code, &user, Some(&admin_password)).await?;
            session.set_title(db, title).await?;
            println!("Project renamed.");
        }
        Command::SetLogo {
            code,
            user,
            admin_password,
            file,
        } => {
            let bytes = fs::read(&file)
                .with_context(|| format!("failed to read logo file {}", file.display()))?;
            let mut session =
                open_session(db, config, &code, &user, Some(&admin_password)).await?;
            session.set_logo(db, &bytes).await?;
            println!("Logo updated.");
        }
        Command::ExportJson { code, user, out } => {
            let session = open_session(db, config, &code, &user, None).await?;
            let document = session.export_snapshot()?;
            let path =
                out.unwrap_or_else(|| PathBuf::from(snapshot::export_filename(&code, "json")));
            fs::write(&path, document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Snapshot written to {}.", path.display());
        }
        Command::ImportJson { user, file } => {
            let document = fs::read_to_string(&file)
                .with_context(|| format!("failed to read snapshot {}", file.display()))?;
            let session = Session::import_project(db, &user, &document).await?;
            println!(
                "Imported project '{}' ({} tasks). Access code: {}",
                session.project.title,
                session.tasks.len(),
                session.project.code
            );
        }
        Command::ExportPdf { code, user, out } => {
            let session = open_session(db, config, &code, &user, None).await?;
            let bytes = pdf_gen::render_board(&session.project, &session.tasks)?;
            let path =
                out.unwrap_or_else(|| PathBuf::from(snapshot::export_filename(&code, "pdf")));
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Board rendered to {}.", path.display());
        }
    }

    Ok(())
}

fn print_board(session: &Session) {
    println!(
        "{} [{}] - admin {}",
        session.project.title, session.project.code, session.project.admin_name
    );
    for column in Column::ALL {
        println!("\n== {column} ==");
        for task in session.tasks_in(column) {
            let color = NoteColor::from_hex(&task.color)
                .map(|c| c.name())
                .unwrap_or("custom");
            println!(
                "  {}  [{}] {}  ({}, edited {})",
                task.id,
                color,
                task.content,
                task.owner,
                task.updated_at.format("%d/%m %H:%M")
            );
        }
    }
}
