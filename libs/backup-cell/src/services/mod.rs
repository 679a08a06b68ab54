pub mod backup;
pub mod scheduler;
pub mod tools;

pub use backup::BackupService;
pub use scheduler::spawn_scheduler;
