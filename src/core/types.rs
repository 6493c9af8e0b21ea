use serde::{Deserialize, Serialize};

/// Arena handle identifying a component inside one [`CircuitGraph`].
///
/// Handles are issued by the graph and are never reused within its lifetime.
///
/// [`CircuitGraph`]: crate::core::graph::CircuitGraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub(crate) u64);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag for every built-in component.
///
/// `Custom` instances are created from a [`CustomDescriptor`] rather than
/// through `add_component`, but still carry the tag.
///
/// [`CustomDescriptor`]: crate::core::components::custom::CustomDescriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Input,
    Output,
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    Not,
    HalfAdder,
    FullAdder,
    Adder32,
    AluSimple,
    AluAdvanced,
    AluControl,
    ControlUnit,
    DLatch,
    Register,
    RegisterBlock,
    ProgramCounter,
    InstructionMemory,
    DataMemory,
    Decoder3,
    Encoder8,
    SignExtend,
    ShiftLeft2,
    Collector1to2,
    Collector1to3,
    Collector1to6,
    Collector1to8,
    Collector8to16,
    Collector8to32,
    Splitter8to1,
    Splitter32to8,
    Mux2,
    Mux4,
    Mux8,
    Custom,
}

/// Outcome of `add_connection`.
///
/// Unknown components or port names are reported as `Err` instead; this enum
/// only covers the recoverable wiring outcomes. Nothing is mutated unless the
/// result is `Added`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectResult {
    /// Both half-edges were recorded.
    Added,
    /// A width-adaptive check refused the edge.
    Rejected(String),
    /// The destination input slot already holds a connection.
    DuplicateSlot,
}
