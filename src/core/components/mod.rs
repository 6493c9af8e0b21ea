pub mod arithmetic;
pub mod control;
pub mod custom;
pub mod gates;
pub mod routing;
pub mod storage;

use crate::core::events::{self, Payload};
use crate::core::signal::Signal;
use crate::core::types::{ComponentId, Kind};
use indexmap::IndexMap;

/// Input port: declared width plus the at most one incoming half-edge.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub width: u8,
    pub source: Option<(ComponentId, String)>,
}

/// Output port: declared width, current signal, outgoing half-edges.
#[derive(Debug, Clone)]
pub struct OutputPort {
    pub width: u8,
    pub signal: Signal,
    pub targets: Vec<(ComponentId, String)>,
}

/// Kind-specific private state. Combinational kinds carry `None`.
pub enum KindState {
    None,
    Register(storage::RegisterState),
    RegisterBlock(storage::RegisterBlockState),
    ProgramCounter(storage::ProgramCounterState),
    InstructionMemory(storage::InstructionMemoryState),
    DataMemory(storage::DataMemoryState),
    Custom(custom::CustomState),
}

/// Read-only view of a component's input values for one evaluation.
///
/// Unconnected inputs read as zero of the declared width.
pub struct InputView {
    entries: IndexMap<String, (u8, Option<Signal>)>,
}

impl InputView {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, declared_width: u8, signal: Option<Signal>) {
        self.entries
            .insert(name.to_string(), (declared_width, signal));
    }

    /// Convenience constructor for per-kind evaluation tests.
    pub fn from_values(values: &[(&str, Signal)]) -> Self {
        let mut view = Self::new();
        for (name, signal) in values {
            view.insert(name, signal.bit_width, Some(*signal));
        }
        view
    }

    pub fn value(&self, name: &str) -> u32 {
        match self.entries.get(name) {
            Some((_, Some(signal))) => signal.value,
            _ => 0,
        }
    }

    pub fn signal(&self, name: &str) -> Signal {
        match self.entries.get(name) {
            Some((_, Some(signal))) => *signal,
            Some((width, None)) => Signal::zero(*width),
            None => Signal::zero(0),
        }
    }

    pub fn is_connected(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some((_, Some(_))))
    }
}

impl Default for InputView {
    fn default() -> Self {
        Self::new()
    }
}

/// One instantiated logic component: kind tag, label, port maps, output
/// state, and kind-specific private state.
///
/// Structural operations shared by all kinds live here; per-kind evaluation
/// rules live in the sibling modules and are dispatched from [`eval`].
///
/// [`eval`]: Component::eval
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) kind: Kind,
    label: String,
    pub(crate) inputs: IndexMap<String, InputPort>,
    pub(crate) outputs: IndexMap<String, OutputPort>,
    pub(crate) state: KindState,
}

/// Declared input and output ports per kind. Width 0 is the unbound sentinel
/// of the width-adaptive kinds.
fn port_layout(kind: Kind) -> (&'static [(&'static str, u8)], &'static [(&'static str, u8)]) {
    match kind {
        Kind::Input => (&[], &[("outValue", 1)]),
        Kind::Output => (&[("input", 0)], &[("outValue", 0)]),
        Kind::And | Kind::Or | Kind::Nand | Kind::Nor | Kind::Xor | Kind::Xnor => {
            (&[("input1", 1), ("input2", 1)], &[("outValue", 1)])
        }
        Kind::Not => (&[("input", 1)], &[("outValue", 1)]),
        Kind::HalfAdder => (
            &[("inputA", 1), ("inputB", 1)],
            &[("sum", 1), ("carry", 1)],
        ),
        Kind::FullAdder => (
            &[("inputA", 1), ("inputB", 1), ("inputCin", 1)],
            &[("outSum", 1), ("cOut", 1)],
        ),
        Kind::Adder32 => (&[("inputA", 32), ("inputB", 32)], &[("outSum", 32)]),
        Kind::AluSimple => (
            &[
                ("input1", 32),
                ("input2", 32),
                ("OP", 2),
                ("Ainvert", 1),
                ("Binvert", 1),
                ("CarryIn", 1),
            ],
            &[("outValue", 32)],
        ),
        Kind::AluAdvanced => (
            &[
                ("input1", 32),
                ("input2", 32),
                ("OP", 2),
                ("Ainvert", 1),
                ("Bnegate", 1),
            ],
            &[("outValue", 32), ("zero", 1)],
        ),
        Kind::AluControl => (
            &[("ALUop", 2), ("funct", 6)],
            &[("ainvert", 1), ("binvert", 1), ("operation", 2)],
        ),
        Kind::ControlUnit => (
            &[("input", 6)],
            &[
                ("RegDst", 1),
                ("Branch", 1),
                ("MemRead", 1),
                ("MemtoReg", 1),
                ("AluOp", 2),
                ("MemWrite", 1),
                ("AluSrc", 1),
                ("RegWrite", 1),
            ],
        ),
        Kind::DLatch => (
            &[("inputC", 1), ("inputD", 1)],
            &[("outQ", 1), ("out!Q", 1)],
        ),
        Kind::Register => (&[("input", 32), ("clk", 1)], &[("outValue", 32)]),
        Kind::RegisterBlock => (
            &[
                ("readReg1", 5),
                ("readReg2", 5),
                ("writeReg", 5),
                ("writeData", 32),
                ("regWrite", 1),
            ],
            &[("readData1", 32), ("readData2", 32)],
        ),
        Kind::ProgramCounter => (&[("input", 32)], &[("outValue", 32)]),
        Kind::InstructionMemory => (&[("readAddress", 32)], &[("instruction", 32)]),
        Kind::DataMemory => (
            &[
                ("address", 32),
                ("writeData", 32),
                ("memRead", 1),
                ("memWrite", 1),
            ],
            &[("readData", 32)],
        ),
        Kind::Decoder3 => (
            &[("input1", 1), ("input2", 1), ("input3", 1)],
            &[
                ("outValue1", 1),
                ("outValue2", 1),
                ("outValue3", 1),
                ("outValue4", 1),
                ("outValue5", 1),
                ("outValue6", 1),
                ("outValue7", 1),
                ("outValue8", 1),
            ],
        ),
        Kind::Encoder8 => (
            &[
                ("input1", 1),
                ("input2", 1),
                ("input3", 1),
                ("input4", 1),
                ("input5", 1),
                ("input6", 1),
                ("input7", 1),
                ("input8", 1),
            ],
            &[("outValue1", 1), ("outValue2", 1), ("outValue3", 1)],
        ),
        Kind::SignExtend => (&[("input1", 16)], &[("outValue", 32)]),
        Kind::ShiftLeft2 => (&[("input1", 0)], &[("outValue", 0)]),
        Kind::Collector1to2 => (&[("input1", 1), ("input2", 1)], &[("outValue", 2)]),
        Kind::Collector1to3 => (
            &[("input1", 1), ("input2", 1), ("input3", 1)],
            &[("outValue", 3)],
        ),
        Kind::Collector1to6 => (
            &[
                ("input1", 1),
                ("input2", 1),
                ("input3", 1),
                ("input4", 1),
                ("input5", 1),
                ("input6", 1),
            ],
            &[("outValue", 6)],
        ),
        Kind::Collector1to8 => (
            &[
                ("input1", 1),
                ("input2", 1),
                ("input3", 1),
                ("input4", 1),
                ("input5", 1),
                ("input6", 1),
                ("input7", 1),
                ("input8", 1),
            ],
            &[("outValue", 8)],
        ),
        Kind::Collector8to16 => (&[("input1", 8), ("input2", 8)], &[("outValue", 16)]),
        Kind::Collector8to32 => (
            &[("input1", 8), ("input2", 8), ("input3", 8), ("input4", 8)],
            &[("outValue", 32)],
        ),
        Kind::Splitter8to1 => (
            &[("input1", 8)],
            &[
                ("outValue1", 1),
                ("outValue2", 1),
                ("outValue3", 1),
                ("outValue4", 1),
                ("outValue5", 1),
                ("outValue6", 1),
                ("outValue7", 1),
                ("outValue8", 1),
            ],
        ),
        Kind::Splitter32to8 => (
            &[("input1", 32)],
            &[
                ("outValue1", 8),
                ("outValue2", 8),
                ("outValue3", 8),
                ("outValue4", 8),
            ],
        ),
        Kind::Mux2 => (
            &[("selection", 0), ("input1", 0), ("input2", 0)],
            &[("outputValue", 0)],
        ),
        Kind::Mux4 => (
            &[
                ("selection", 0),
                ("input1", 0),
                ("input2", 0),
                ("input3", 0),
                ("input4", 0),
            ],
            &[("outputValue", 0)],
        ),
        Kind::Mux8 => (
            &[
                ("selection", 0),
                ("input1", 0),
                ("input2", 0),
                ("input3", 0),
                ("input4", 0),
                ("input5", 0),
                ("input6", 0),
                ("input7", 0),
                ("input8", 0),
            ],
            &[("outputValue", 0)],
        ),
        // Custom ports come from the descriptor, never from this table.
        Kind::Custom => (&[], &[]),
    }
}

/// Number of data inputs a multiplexer kind selects between.
pub(crate) fn mux_data_count(kind: Kind) -> Option<u32> {
    match kind {
        Kind::Mux2 => Some(2),
        Kind::Mux4 => Some(4),
        Kind::Mux8 => Some(8),
        _ => None,
    }
}

impl Component {
    /// Instantiate a built-in kind with its declared ports and default state.
    pub(crate) fn new(id: ComponentId, kind: Kind) -> Result<Self, String> {
        if kind == Kind::Custom {
            return Err("custom components are created from a descriptor".to_string());
        }
        let (input_layout, output_layout) = port_layout(kind);
        let mut inputs = IndexMap::new();
        for (name, width) in input_layout {
            inputs.insert(
                name.to_string(),
                InputPort {
                    width: *width,
                    source: None,
                },
            );
        }
        let mut outputs = IndexMap::new();
        for (name, width) in output_layout {
            outputs.insert(
                name.to_string(),
                OutputPort {
                    width: *width,
                    signal: Signal::zero(*width),
                    targets: Vec::new(),
                },
            );
        }
        let state = match kind {
            Kind::Register => KindState::Register(storage::RegisterState::default()),
            Kind::RegisterBlock => KindState::RegisterBlock(storage::RegisterBlockState::default()),
            Kind::ProgramCounter => {
                KindState::ProgramCounter(storage::ProgramCounterState::default())
            }
            Kind::InstructionMemory => {
                KindState::InstructionMemory(storage::InstructionMemoryState::default())
            }
            Kind::DataMemory => KindState::DataMemory(storage::DataMemoryState::default()),
            _ => KindState::None,
        };
        Ok(Self {
            id,
            kind,
            label: format!("{:?}", kind),
            inputs,
            outputs,
            state,
        })
    }

    /// Instantiate a custom component: external ports from the descriptor,
    /// internal children and wiring materialised into a private graph.
    pub(crate) fn new_custom(
        id: ComponentId,
        descriptor: &custom::CustomDescriptor,
    ) -> Result<Self, String> {
        let state = custom::CustomState::build(descriptor)?;
        let mut inputs = IndexMap::new();
        for (name, width) in &descriptor.input_map {
            inputs.insert(
                name.clone(),
                InputPort {
                    width: *width,
                    source: None,
                },
            );
        }
        let mut outputs = IndexMap::new();
        for (name, width) in &descriptor.output_map {
            outputs.insert(
                name.clone(),
                OutputPort {
                    width: *width,
                    signal: Signal::zero(*width),
                    targets: Vec::new(),
                },
            );
        }
        Ok(Self {
            id,
            kind: Kind::Custom,
            label: descriptor.name.clone(),
            inputs,
            outputs,
            state: KindState::Custom(state),
        })
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    /// Current output signal of one port.
    pub fn output_signal(&self, name: &str) -> Option<Signal> {
        self.outputs.get(name).map(|port| port.signal)
    }

    /// Snapshot of the full output state, in declaration order.
    pub fn output_state(&self) -> IndexMap<String, Signal> {
        self.outputs
            .iter()
            .map(|(name, port)| (name.clone(), port.signal))
            .collect()
    }

    /// Mask `value` to the port's declared width and store it. Returns
    /// whether the stored signal changed.
    pub(crate) fn write_output(&mut self, name: &str, value: u32) -> bool {
        let Some(port) = self.outputs.get_mut(name) else {
            return false;
        };
        let next = Signal::new(value, port.width);
        if port.signal == next {
            return false;
        }
        port.signal = next;
        true
    }

    /// Externally set an Input component's emitted signal. The signal's own
    /// width becomes the port width (1, 8 or 32 in the palette).
    pub(crate) fn set_input_value(&mut self, signal: Signal) -> Result<bool, String> {
        if self.kind != Kind::Input {
            return Err(format!("component {} is not an Input", self.id));
        }
        let port = self
            .outputs
            .get_mut("outValue")
            .ok_or_else(|| "Input has no outValue port".to_string())?;
        let next = Signal::new(signal.value, signal.bit_width);
        let changed = port.signal != next;
        port.width = signal.bit_width;
        port.signal = next;
        Ok(changed)
    }

    /// Cycle an Input's width through 1 -> 8 -> 32 -> 1, resetting the value.
    /// Post-condition: `outValue = (0, new_width)`.
    pub(crate) fn cycle_bitwidth(&mut self) -> Result<u8, String> {
        if self.kind != Kind::Input {
            return Err(format!("component {} is not an Input", self.id));
        }
        let port = self
            .outputs
            .get_mut("outValue")
            .ok_or_else(|| "Input has no outValue port".to_string())?;
        let next_width = match port.width {
            1 => 8,
            8 => 32,
            _ => 1,
        };
        port.width = next_width;
        port.signal = Signal::zero(next_width);
        Ok(next_width)
    }

    /// Evaluate this component against the given input readings.
    ///
    /// Writes new output values into the component's own state and returns
    /// whether anything changed. Semantic errors (invalid ALU opcode,
    /// simultaneous memory read+write) abort with `Err`.
    pub(crate) fn eval(&mut self, view: &InputView) -> Result<bool, String> {
        match self.kind {
            // A no-op that reports a change so propagation can begin.
            Kind::Input => Ok(true),

            Kind::Output => Ok(self.write_output("outValue", view.value("input"))),

            Kind::And | Kind::Or | Kind::Nand | Kind::Nor | Kind::Xor | Kind::Xnor => {
                let value = gates::eval_gate(self.kind, view.value("input1"), view.value("input2"));
                Ok(self.write_output("outValue", value))
            }

            Kind::Not => Ok(self.write_output("outValue", gates::eval_not(view.value("input")))),

            Kind::HalfAdder => {
                let (sum, carry) = arithmetic::half_adder(view.value("inputA"), view.value("inputB"));
                let mut changed = self.write_output("sum", sum);
                changed |= self.write_output("carry", carry);
                Ok(changed)
            }

            Kind::FullAdder => {
                let (sum, carry) = arithmetic::full_adder(
                    view.value("inputA"),
                    view.value("inputB"),
                    view.value("inputCin"),
                );
                let mut changed = self.write_output("outSum", sum);
                changed |= self.write_output("cOut", carry);
                Ok(changed)
            }

            Kind::Adder32 => {
                let sum = view.value("inputA").wrapping_add(view.value("inputB"));
                Ok(self.write_output("outSum", sum))
            }

            Kind::AluSimple => {
                let value = arithmetic::alu_simple(view)?;
                Ok(self.write_output("outValue", value))
            }

            Kind::AluAdvanced => {
                let (value, zero) = arithmetic::alu_advanced(view)?;
                let mut changed = self.write_output("outValue", value);
                changed |= self.write_output("zero", zero);
                Ok(changed)
            }

            Kind::AluControl => {
                let (ainvert, binvert, operation) = control::alu_control(
                    view.value("ALUop"),
                    view.value("funct"),
                );
                let mut changed = self.write_output("ainvert", ainvert);
                changed |= self.write_output("binvert", binvert);
                changed |= self.write_output("operation", operation);
                Ok(changed)
            }

            Kind::ControlUnit => {
                let lines = control::control_unit(view.value("input"));
                let mut changed = false;
                for (name, value) in lines {
                    changed |= self.write_output(name, value);
                }
                Ok(changed)
            }

            Kind::DLatch => {
                // Level-sensitive: transparent while C is high, holds otherwise.
                if view.value("inputC") == 1 {
                    let d = view.value("inputD");
                    let mut changed = self.write_output("outQ", d);
                    changed |= self.write_output("out!Q", 1 - d);
                    Ok(changed)
                } else {
                    Ok(false)
                }
            }

            Kind::Register => {
                if let KindState::Register(state) = &mut self.state {
                    storage::register_stash(state, view);
                }
                // The visible output moves only in update_registers.
                Ok(false)
            }

            Kind::RegisterBlock => {
                let (read1, read2) = match &self.state {
                    KindState::RegisterBlock(state) => storage::register_block_read(state, view),
                    _ => (0, 0),
                };
                let mut changed = self.write_output("readData1", read1);
                changed |= self.write_output("readData2", read2);
                Ok(changed)
            }

            Kind::ProgramCounter => {
                let value = view.value("input");
                let max_value = match &self.state {
                    KindState::ProgramCounter(state) => state.max_value,
                    _ => 0,
                };
                if value >= max_value {
                    // Wrap: emit zero and report no change.
                    self.write_output("outValue", 0);
                    return Ok(false);
                }
                let changed = self.write_output("outValue", value);
                if changed {
                    events::emit(events::NEW_CYCLE, Payload::None);
                }
                Ok(changed)
            }

            Kind::InstructionMemory => {
                let word = match &self.state {
                    KindState::InstructionMemory(state) => {
                        storage::instruction_memory_read(state, view.value("readAddress"))
                    }
                    _ => 0,
                };
                Ok(self.write_output("instruction", word))
            }

            Kind::DataMemory => {
                let read = match &mut self.state {
                    KindState::DataMemory(state) => storage::data_memory_access(state, view)?,
                    _ => None,
                };
                match read {
                    Some(word) => Ok(self.write_output("readData", word)),
                    None => Ok(false),
                }
            }

            Kind::Decoder3 => {
                let index = routing::decoder3_index(
                    view.value("input1"),
                    view.value("input2"),
                    view.value("input3"),
                );
                let mut changed = false;
                for slot in 0..8 {
                    let name = format!("outValue{}", slot + 1);
                    changed |= self.write_output(&name, u32::from(slot == index));
                }
                Ok(changed)
            }

            Kind::Encoder8 => {
                let index = routing::encoder8_index(view);
                let mut changed = self.write_output("outValue1", index & 1);
                changed |= self.write_output("outValue2", (index >> 1) & 1);
                changed |= self.write_output("outValue3", (index >> 2) & 1);
                Ok(changed)
            }

            // Copies the value and relabels it 32-bit; high-order bits of
            // negative 16-bit values are not replicated (source behaviour).
            Kind::SignExtend => Ok(self.write_output("outValue", view.value("input1"))),

            Kind::ShiftLeft2 => {
                let value = view.value("input1") << 2;
                Ok(self.write_output("outValue", value))
            }

            Kind::Collector1to2 => Ok(self.write_output("outValue", routing::collect(view, 2, 1))),
            Kind::Collector1to3 => Ok(self.write_output("outValue", routing::collect(view, 3, 1))),
            Kind::Collector1to6 => Ok(self.write_output("outValue", routing::collect(view, 6, 1))),
            Kind::Collector1to8 => Ok(self.write_output("outValue", routing::collect(view, 8, 1))),
            Kind::Collector8to16 => Ok(self.write_output("outValue", routing::collect(view, 2, 8))),
            Kind::Collector8to32 => Ok(self.write_output("outValue", routing::collect(view, 4, 8))),

            Kind::Splitter8to1 => self.eval_splitter(view.value("input1"), 8, 1),
            Kind::Splitter32to8 => self.eval_splitter(view.value("input1"), 4, 8),

            Kind::Mux2 | Kind::Mux4 | Kind::Mux8 => {
                let lanes = mux_data_count(self.kind).unwrap_or(0);
                let value = routing::mux_select(view, lanes);
                Ok(self.write_output("outputValue", value))
            }

            Kind::Custom => {
                let values = match &mut self.state {
                    KindState::Custom(state) => state.eval(view, &self.inputs)?,
                    _ => {
                        return Err(format!(
                            "custom component {} has no internal graph",
                            self.id
                        ))
                    }
                };
                let names: Vec<String> = self.outputs.keys().cloned().collect();
                let mut changed = false;
                for (name, value) in names.iter().zip(values) {
                    changed |= self.write_output(name, value);
                }
                Ok(changed)
            }
        }
    }

    /// Unpack `value` into `lanes` outputs of `lane_width` bits, LSB first.
    fn eval_splitter(&mut self, value: u32, lanes: u32, lane_width: u8) -> Result<bool, String> {
        let mut changed = false;
        for lane in 0..lanes {
            let name = format!("outValue{}", lane + 1);
            let piece = routing::split_lane(value, lane, lane_width);
            changed |= self.write_output(&name, piece);
        }
        Ok(changed)
    }
}
