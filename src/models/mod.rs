mod color;
mod column;
mod project;
mod task;

pub use color::NoteColor;
pub use column::Column;
pub use project::Project;
pub use task::Task;
