pub mod event_driven;
pub mod kahn;

/// Multiplier for the event-driven tick cap: a pass may run at most
/// `MAX_EVAL_CYCLES × (|components| + |instructions|)` waves before the
/// graph is declared unstable.
pub const MAX_EVAL_CYCLES: usize = 5;
