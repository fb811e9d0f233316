//! Board state manager: the in-memory task list and project metadata for the
//! actor currently working on a board.
//!
//! Every mutation is a synchronous sequence: change the in-memory state,
//! write the full task set to the store, then read it back so the session
//! reflects exactly what was durably committed. Two sessions saving at
//! overlapping times race at whole-project granularity and the later write
//! wins; that lost-update behavior is accepted, not hidden.

use uuid::Uuid;

use crate::access;
use crate::config::Config;
use crate::db::Database;
use crate::error::{KanbanError, Result};
use crate::logo;
use crate::models::{Column, NoteColor, Project, Task};
use crate::snapshot;

/// How many fresh codes to try when a generated one collides with a stored
/// project.
const CODE_ATTEMPTS: u32 = 5;

/// One actor's view of one project, created when they create or join a board
/// and dropped when they leave it.
#[derive(Debug)]
pub struct Session {
    pub user: String,
    pub is_admin: bool,
    pub project: Project,
    pub tasks: Vec<Task>,
}

impl Session {
    /// Create a new project; the creator becomes its admin.
    ///
    /// Generated codes are checked against the store and regenerated on
    /// collision a bounded number of times.
    pub async fn create_project(db: &Database, admin_name: &str, title: &str) -> Result<Session> {
        let mut code = Project::generate_code();
        for _ in 0..CODE_ATTEMPTS {
            if db.load_project(&code).await?.is_none() {
                break;
            }
            tracing::warn!(%code, "generated project code already taken, retrying");
            code = Project::generate_code();
        }

        let project = Project::new(code, title.to_string(), admin_name.to_string());
        db.save_project(&project).await?;
        tracing::info!(code = %project.code, "project created");

        Ok(Session {
            user: admin_name.to_string(),
            is_admin: true,
            project,
            tasks: Vec::new(),
        })
    }

    /// Join an existing project by code. Joining never grants admin rights.
    pub async fn join_project(db: &Database, code: &str, user: &str) -> Result<Session> {
        let project = db
            .load_project(code)
            .await?
            .ok_or_else(|| KanbanError::ProjectNotFound(code.to_string()))?;
        let tasks = db.load_tasks(code).await?;

        Ok(Session {
            user: user.to_string(),
            is_admin: false,
            project,
            tasks,
        })
    }

    /// Grant admin status for the rest of this session on passphrase match.
    pub fn elevate(&mut self, config: &Config, password: &str) -> Result<()> {
        if !access::verify_admin_password(config, password) {
            return Err(KanbanError::IncorrectPassword);
        }
        self.is_admin = true;
        Ok(())
    }

    /// Create a task owned by the session user and persist the board.
    pub async fn create_task(
        &mut self,
        db: &Database,
        column: Column,
        color: NoteColor,
        content: String,
    ) -> Result<Uuid> {
        let task = Task::new(content, color, self.user.clone(), column);
        let id = task.id;
        self.tasks.push(task);
        self.persist_and_reload(db).await?;
        Ok(id)
    }

    /// Move a task to a different column. Not ownership-gated.
    pub async fn move_task(&mut self, db: &Database, id: Uuid, to: Column) -> Result<()> {
        let actor = self.user.clone();
        let is_admin = self.is_admin;
        let task = self.task_mut(id)?;
        if !access::can_move(&actor, is_admin, task) {
            return Err(KanbanError::PermissionDenied(
                "moving tasks is not allowed for this actor",
            ));
        }
        if task.column == to {
            return Err(KanbanError::ColumnUnchanged(to));
        }
        task.column = to;
        task.touch();
        self.persist_and_reload(db).await
    }

    /// Replace a task's content and color; owner or admin only.
    pub async fn edit_task(
        &mut self,
        db: &Database,
        id: Uuid,
        content: String,
        color: NoteColor,
    ) -> Result<()> {
        let actor = self.user.clone();
        let is_admin = self.is_admin;
        let task = self.task_mut(id)?;
        if !access::can_edit_content(&actor, is_admin, task) {
            return Err(KanbanError::PermissionDenied(
                "only the owner or an admin may edit a task",
            ));
        }
        task.content = content;
        task.color = color.hex().to_string();
        task.touch();
        self.persist_and_reload(db).await
    }

    /// Remove a task from the board; owner or admin only.
    pub async fn delete_task(&mut self, db: &Database, id: Uuid) -> Result<()> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(KanbanError::TaskNotFound(id))?;
        if !access::can_delete(&self.user, self.is_admin, task) {
            return Err(KanbanError::PermissionDenied(
                "only the owner or an admin may delete a task",
            ));
        }
        self.tasks.retain(|t| t.id != id);
        self.persist_and_reload(db).await
    }

    /// Discard the in-memory task list and reload it from the store, picking
    /// up other sessions' changes.
    pub async fn refresh(&mut self, db: &Database) -> Result<()> {
        self.tasks = db.load_tasks(&self.project.code).await?;
        Ok(())
    }

    /// Delete every task on the board. Admin only, and the caller must pass
    /// an explicit confirmation flag.
    pub async fn clear_tasks(&mut self, db: &Database, confirmed: bool) -> Result<()> {
        if !self.is_admin {
            return Err(KanbanError::PermissionDenied(
                "only an admin may clear the project",
            ));
        }
        if !confirmed {
            return Err(KanbanError::ConfirmationRequired);
        }
        self.tasks.clear();
        self.persist_and_reload(db).await
    }

    /// Rename the project; admin only.
    pub async fn set_title(&mut self, db: &Database, title: String) -> Result<()> {
        if !access::can_edit_project(self.is_admin) {
            return Err(KanbanError::PermissionDenied(
                "only an admin may rename the project",
            ));
        }
        self.project.title = title;
        db.save_project(&self.project).await?;
        Ok(())
    }

    /// Replace the project logo; admin only. The image is resized to fit
    /// 200x200 and stored base64-encoded.
    pub async fn set_logo(&mut self, db: &Database, image_bytes: &[u8]) -> Result<()> {
        if !access::can_edit_project(self.is_admin) {
            return Err(KanbanError::PermissionDenied(
                "only an admin may change the project logo",
            ));
        }
        self.project.logo_base64 = logo::encode(image_bytes)?;
        db.save_project(&self.project).await?;
        Ok(())
    }

    /// Serialize the current board to a snapshot document.
    pub fn export_snapshot(&self) -> Result<String> {
        snapshot::export(&self.project, &self.tasks)
    }

    /// Open a session on the project a snapshot document names, creating or
    /// replacing that project in the store. The project need not exist
    /// beforehand.
    pub async fn import_project(db: &Database, user: &str, document: &str) -> Result<Session> {
        let parsed = snapshot::parse(document)?;

        db.save_project(&parsed.project_metadata).await?;
        db.save_tasks(&parsed.project_metadata.code, &parsed.tasks)
            .await?;

        tracing::info!(code = %parsed.project_metadata.code, "snapshot imported");
        Ok(Session {
            user: user.to_string(),
            is_admin: false,
            project: parsed.project_metadata,
            tasks: parsed.tasks,
        })
    }

    /// Replace the active project with the contents of a snapshot document,
    /// both in memory and in the store. A document that fails to parse
    /// leaves the session untouched.
    pub async fn import_snapshot(&mut self, db: &Database, document: &str) -> Result<()> {
        let imported = Session::import_project(db, &self.user, document).await?;
        self.project = imported.project;
        self.tasks = imported.tasks;
        Ok(())
    }

    /// Tasks of one column, in in-memory order.
    pub fn tasks_in(&self, column: Column) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.column == column)
    }

    fn task_mut(&mut self, id: Uuid) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(KanbanError::TaskNotFound(id))
    }

    /// Write the full task set, then read it back so the in-memory view
    /// matches what was committed.
    async fn persist_and_reload(&mut self, db: &Database) -> Result<()> {
        db.save_tasks(&self.project.code, &self.tasks).await?;
        self.tasks = db.load_tasks(&self.project.code).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_db;

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            admin_password: "admin123".to_string(),
        }
    }

    async fn acme_session(db: &Database) -> Session {
        Session::create_project(db, "Alice", "Acme").await.unwrap()
    }

    #[tokio::test]
    async fn create_project_generates_valid_code_and_admin() {
        let db = memory_db().await;
        let session = acme_session(&db).await;

        assert_eq!(session.project.code.len(), 8);
        assert!(session.is_admin);
        assert!(session.tasks.is_empty());
        assert!(db.load_project(&session.project.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn join_unknown_code_is_rejected() {
        let db = memory_db().await;
        let err = Session::join_project(&db, "NOPE0000", "Bob")
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn created_task_is_persisted_with_palette_hex() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;

        session
            .create_task(&db, Column::Backlog, NoteColor::Yellow, "Fix bug".into())
            .await
            .unwrap();

        let stored = db.load_tasks(&session.project.code).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].color, "#FFF59D");
        assert_eq!(stored[0].column, Column::Backlog);
        assert_eq!(stored[0].owner, "Alice");
        assert_eq!(stored[0].created_at, stored[0].updated_at);
    }

    #[tokio::test]
    async fn move_task_changes_column_and_advances_updated_at() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;
        let id = session
            .create_task(&db, Column::Backlog, NoteColor::Blue, "triage me".into())
            .await
            .unwrap();
        let created = session.tasks[0].created_at;

        session.move_task(&db, id, Column::Analysis).await.unwrap();

        let task = session.tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.column, Column::Analysis);
        assert!(task.updated_at > created);
    }

    #[tokio::test]
    async fn move_to_same_column_is_refused() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;
        let id = session
            .create_task(&db, Column::Backlog, NoteColor::Blue, "stay".into())
            .await
            .unwrap();

        let err = session.move_task(&db, id, Column::Backlog).await.unwrap_err();
        assert!(matches!(err, KanbanError::ColumnUnchanged(Column::Backlog)));
    }

    #[tokio::test]
    async fn non_owner_may_move_but_not_edit() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        let id = alice
            .create_task(&db, Column::Backlog, NoteColor::Yellow, "Alice's".into())
            .await
            .unwrap();

        let mut bob = Session::join_project(&db, &alice.project.code, "Bob")
            .await
            .unwrap();

        // Moving is open to any joined actor.
        bob.move_task(&db, id, Column::Development).await.unwrap();

        // Editing someone else's task without admin rights is not.
        let err = bob
            .edit_task(&db, id, "Bob's now".into(), NoteColor::Pink)
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::PermissionDenied(_)));

        bob.refresh(&db).await.unwrap();
        let task = bob.tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.content, "Alice's");
        assert_eq!(task.column, Column::Development);
    }

    #[tokio::test]
    async fn admin_elevation_unlocks_edit_of_foreign_task() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        let id = alice
            .create_task(&db, Column::Backlog, NoteColor::Yellow, "original".into())
            .await
            .unwrap();

        let mut bob = Session::join_project(&db, &alice.project.code, "Bob")
            .await
            .unwrap();
        let config = test_config();

        assert!(matches!(
            bob.elevate(&config, "wrong"),
            Err(KanbanError::IncorrectPassword)
        ));
        assert!(!bob.is_admin);

        bob.elevate(&config, "admin123").unwrap();
        bob.edit_task(&db, id, "edited by admin".into(), NoteColor::Green)
            .await
            .unwrap();

        let stored = db.load_tasks(&bob.project.code).await.unwrap();
        assert_eq!(stored[0].content, "edited by admin");
    }

    #[tokio::test]
    async fn delete_requires_ownership_or_admin() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        let id = alice
            .create_task(&db, Column::Done, NoteColor::Orange, "done".into())
            .await
            .unwrap();

        let mut bob = Session::join_project(&db, &alice.project.code, "Bob")
            .await
            .unwrap();
        assert!(matches!(
            bob.delete_task(&db, id).await.unwrap_err(),
            KanbanError::PermissionDenied(_)
        ));

        alice.delete_task(&db, id).await.unwrap();
        assert!(db.load_tasks(&alice.project.code).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_task_id_is_a_not_found_error() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;
        let err = session
            .move_task(&db, Uuid::new_v4(), Column::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn clear_requires_admin_and_confirmation() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;
        session
            .create_task(&db, Column::Backlog, NoteColor::Yellow, "a".into())
            .await
            .unwrap();
        session
            .create_task(&db, Column::Done, NoteColor::Pink, "b".into())
            .await
            .unwrap();

        // Without the confirmation flag nothing happens.
        assert!(matches!(
            session.clear_tasks(&db, false).await.unwrap_err(),
            KanbanError::ConfirmationRequired
        ));
        assert_eq!(session.tasks.len(), 2);

        session.clear_tasks(&db, true).await.unwrap();
        assert!(session.tasks.is_empty());
        assert!(db.load_tasks(&session.project.code).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn title_update_is_admin_gated_and_persisted() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        let mut bob = Session::join_project(&db, &alice.project.code, "Bob")
            .await
            .unwrap();

        assert!(matches!(
            bob.set_title(&db, "hijacked".into()).await.unwrap_err(),
            KanbanError::PermissionDenied(_)
        ));

        alice.set_title(&db, "Acme v2".into()).await.unwrap();
        let stored = db.load_project(&alice.project.code).await.unwrap().unwrap();
        assert_eq!(stored.title, "Acme v2");
    }

    #[tokio::test]
    async fn refresh_picks_up_other_sessions_changes() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        let mut bob = Session::join_project(&db, &alice.project.code, "Bob")
            .await
            .unwrap();
        assert!(bob.tasks.is_empty());

        alice
            .create_task(&db, Column::Backlog, NoteColor::Green, "new".into())
            .await
            .unwrap();

        bob.refresh(&db).await.unwrap();
        assert_eq!(bob.tasks.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_import_switches_the_active_project() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        alice
            .create_task(&db, Column::Testing, NoteColor::Blue, "exported".into())
            .await
            .unwrap();
        let document = alice.export_snapshot().unwrap();
        let exported_code = alice.project.code.clone();

        let mut other = Session::create_project(&db, "Carol", "Other").await.unwrap();
        other.import_snapshot(&db, &document).await.unwrap();

        assert_eq!(other.project.code, exported_code);
        assert_eq!(other.tasks.len(), 1);
        assert_eq!(other.tasks[0].content, "exported");
        assert_eq!(
            db.load_tasks(&exported_code).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn import_project_opens_a_session_on_a_previously_unknown_board() {
        let db = memory_db().await;
        let mut alice = acme_session(&db).await;
        alice
            .create_task(&db, Column::Backlog, NoteColor::Orange, "carried over".into())
            .await
            .unwrap();
        let document = alice.export_snapshot().unwrap();
        let code = alice.project.code.clone();

        // A fresh store that has never seen this project.
        let other_db = memory_db().await;
        let session = Session::import_project(&other_db, "Bob", &document)
            .await
            .unwrap();

        assert_eq!(session.user, "Bob");
        assert!(!session.is_admin);
        assert_eq!(session.project.code, code);
        assert_eq!(session.tasks.len(), 1);
        assert!(other_db.load_project(&code).await.unwrap().is_some());
        assert_eq!(other_db.load_tasks(&code).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_snapshot_import_leaves_state_untouched() {
        let db = memory_db().await;
        let mut session = acme_session(&db).await;
        let code_before = session.project.code.clone();
        session
            .create_task(&db, Column::Backlog, NoteColor::Yellow, "keep me".into())
            .await
            .unwrap();

        let err = session
            .import_snapshot(&db, r#"{"tasks": []}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Snapshot(_)));
        assert_eq!(session.project.code, code_before);
        assert_eq!(session.tasks.len(), 1);
    }
}
