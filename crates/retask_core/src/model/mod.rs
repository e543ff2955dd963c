mod status;
mod task;

pub use status::{TaskStatusColor, TaskTimeStatus, TimeComponents, TimeUnitGranularity};
pub use task::{Task, TaskDetail, TaskItem};
