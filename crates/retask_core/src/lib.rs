pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod recorder;
pub mod refresh;
pub mod seed;
pub mod status;
pub mod storage;
pub mod task_api;
