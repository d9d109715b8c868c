// Daemon module - Startup guards for the daemon process

pub mod output;
pub mod pid;
pub mod startup;

pub use output::{attach_output, OutputFile, OutputRedirector};
pub use pid::{Acquisition, PidFile, PidStatus, ProcTable, ProcessProbe, RetryPolicy, SignalProbe};
pub use startup::Running;
