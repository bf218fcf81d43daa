//! Operation mode of the break reminder.

/// The application core's operation mode.
///
/// Owned by the core; adapters only read it to pick the matching visuals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OperationMode {
    /// Breaks are enforced as configured.
    #[default]
    Normal,
    /// Timers run but no break prompts are shown.
    Quiet,
    /// Timers are stopped.
    Suspended,
}
