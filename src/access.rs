//! Identity and access policy: pure functions deciding what an actor may do
//! to a task or project. Admin status is granted per session by passphrase.

use crate::config::Config;
use crate::models::Task;

/// Content and color edits are reserved to the admin or the task owner.
pub fn can_edit_content(actor: &str, is_admin: bool, task: &Task) -> bool {
    is_admin || actor == task.owner
}

/// Deletion follows the same rule as editing.
pub fn can_delete(actor: &str, is_admin: bool, task: &Task) -> bool {
    is_admin || actor == task.owner
}

/// Any joined actor may move a task between columns; triaging board position
/// is deliberately not ownership-gated.
pub fn can_move(_actor: &str, _is_admin: bool, _task: &Task) -> bool {
    true
}

/// Project title and logo changes are admin-only.
pub fn can_edit_project(is_admin: bool) -> bool {
    is_admin
}

/// Exact match against the configured admin passphrase. No rate limiting.
pub fn verify_admin_password(config: &Config, supplied: &str) -> bool {
    supplied == config.admin_password
}
