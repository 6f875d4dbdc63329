//! Background job scheduler and job implementations.

mod reminder_dispatch;
mod scheduler;
mod session_cleanup;

pub use reminder_dispatch::ReminderDispatchJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
