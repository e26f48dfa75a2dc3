//! Background jobs for Publink.
//!
//! Two batch jobs from the share lifecycle (expiry sweep, notification
//! digest) plus session-cache pruning, runnable either from the cron
//! scheduler inside the server process or standalone via the CLI.

pub mod jobs;
pub mod scheduler;

pub use jobs::digest::{DigestJob, DigestReport};
pub use jobs::sweep::{SweepJob, SweepReport};
pub use scheduler::CronScheduler;
