//! Byte channels between a launcher and its forked helpers.
//!
//! Forking severs shared memory and exec severs everything else, so the
//! helpers talk to their launcher through exactly two kinds of pipe:
//!
//! - the **error channel** ([`report`]): the first failing step writes a
//!   report and exits; end-of-file without data means every step succeeded.
//! - the **pid relay** ([`relay`]): a one-shot hand-off of the anchor pid
//!   from the namespace-creating helper to the orchestrator.
//!
//! Both are created with `O_CLOEXEC` so they never leak into an exec'd image.

pub mod relay;
pub mod report;
pub mod step;

pub use relay::{PidReceiver, PidSender, pid_relay};
pub use report::{HelperOutcome, ReportReader, ReportWriter, error_channel};
pub use step::{Step, StepContext, StepError};
