pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, Task, TaskChanges};
pub use user::{NewUser, User};
