/// Process-wide execution flags, captured once at startup and passed down
/// explicitly to the executor and the prompt collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionMode {
    /// Trace state-changing external commands instead of running them.
    pub dry_run: bool,
    /// Resolve every prompt to its default without blocking on input.
    pub non_interactive: bool,
    /// Verbose tracing of every operation.
    pub debug: bool,
}

impl ExecutionMode {
    pub fn new(dry_run: bool, non_interactive: bool, debug: bool) -> Self {
        Self {
            dry_run,
            non_interactive,
            debug,
        }
    }
}
