use super::InputView;

/// Number of registers in a RegisterBlock.
pub const REGISTER_COUNT: usize = 20;
/// DataMemory capacity in 32-bit words.
pub const DATA_MEMORY_WORDS: usize = 1024;

/// Two-phase register state: `eval` stashes, `update_registers` publishes.
#[derive(Debug, Default, Clone)]
pub struct RegisterState {
    pub(crate) next: u32,
    pub(crate) dirty: bool,
}

#[derive(Debug, Clone)]
pub struct RegisterBlockState {
    pub(crate) regs: [u32; REGISTER_COUNT],
}

impl Default for RegisterBlockState {
    fn default() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProgramCounterState {
    /// Wrap boundary, `4 × instruction count`. Zero until a program loads,
    /// which keeps the counter inert.
    pub(crate) max_value: u32,
}

#[derive(Debug, Default, Clone)]
pub struct InstructionMemoryState {
    pub(crate) instructions: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct DataMemoryState {
    pub(crate) words: Vec<u32>,
}

impl Default for DataMemoryState {
    fn default() -> Self {
        Self {
            words: vec![0; DATA_MEMORY_WORDS],
        }
    }
}

/// First phase of the register discipline: while `clk` is high and the data
/// input is wired, remember the input for the next `update_registers`.
pub(crate) fn register_stash(state: &mut RegisterState, view: &InputView) {
    if view.value("clk") == 1 && view.is_connected("input") {
        state.next = view.value("input");
        state.dirty = true;
    }
}

/// Second phase: hand over the stashed value, if any.
pub(crate) fn register_publish(state: &mut RegisterState) -> Option<u32> {
    if state.dirty {
        state.dirty = false;
        Some(state.next)
    } else {
        None
    }
}

/// Combinational read ports; out-of-range register numbers read 0.
pub(crate) fn register_block_read(state: &RegisterBlockState, view: &InputView) -> (u32, u32) {
    let read = |index: u32| -> u32 {
        state
            .regs
            .get(index as usize)
            .copied()
            .unwrap_or(0)
    };
    (read(view.value("readReg1")), read(view.value("readReg2")))
}

/// Deferred write port, driven from `update_registers`.
pub(crate) fn register_block_write(state: &mut RegisterBlockState, view: &InputView) {
    if view.value("regWrite") != 1 {
        return;
    }
    let index = view.value("writeReg") as usize;
    if let Some(slot) = state.regs.get_mut(index) {
        *slot = view.value("writeData");
    }
}

/// Word-addressed instruction fetch; out-of-range addresses read 0.
pub(crate) fn instruction_memory_read(state: &InstructionMemoryState, address: u32) -> u32 {
    state
        .instructions
        .get((address / 4) as usize)
        .copied()
        .unwrap_or(0)
}

/// Word-addressed data memory. Returns `Some(word)` when a read produced an
/// output, `None` when the output must stay untouched (write or idle).
pub(crate) fn data_memory_access(
    state: &mut DataMemoryState,
    view: &InputView,
) -> Result<Option<u32>, String> {
    let mem_read = view.value("memRead") == 1;
    let mem_write = view.value("memWrite") == 1;
    if mem_read && mem_write {
        return Err("DataMemory read and write asserted in the same pass".to_string());
    }
    let index = (view.value("address") / 4) as usize;
    if mem_write {
        // Out-of-range writes are dropped silently.
        if let Some(slot) = state.words.get_mut(index) {
            *slot = view.value("writeData");
        }
        return Ok(None);
    }
    if mem_read {
        return Ok(Some(state.words.get(index).copied().unwrap_or(0)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::Signal;

    #[test]
    fn test_register_stash_and_publish() {
        let mut state = RegisterState::default();
        let view = InputView::from_values(&[
            ("input", Signal::new(42, 32)),
            ("clk", Signal::bit(1)),
        ]);
        register_stash(&mut state, &view);
        assert!(state.dirty);
        assert_eq!(register_publish(&mut state), Some(42));
        assert_eq!(register_publish(&mut state), None);
    }

    #[test]
    fn test_register_ignores_low_clock_and_unwired_input() {
        let mut state = RegisterState::default();
        let low_clk = InputView::from_values(&[
            ("input", Signal::new(42, 32)),
            ("clk", Signal::bit(0)),
        ]);
        register_stash(&mut state, &low_clk);
        assert!(!state.dirty);

        let no_input = InputView::from_values(&[("clk", Signal::bit(1))]);
        register_stash(&mut state, &no_input);
        assert!(!state.dirty);
    }

    #[test]
    fn test_register_block_write_then_read() {
        let mut state = RegisterBlockState::default();
        let write = InputView::from_values(&[
            ("writeReg", Signal::new(7, 5)),
            ("writeData", Signal::new(1234, 32)),
            ("regWrite", Signal::bit(1)),
        ]);
        register_block_write(&mut state, &write);

        let read = InputView::from_values(&[
            ("readReg1", Signal::new(7, 5)),
            ("readReg2", Signal::new(31, 5)),
        ]);
        let (data1, data2) = register_block_read(&state, &read);
        assert_eq!(data1, 1234);
        // Register 31 is out of range for the 20-entry file.
        assert_eq!(data2, 0);
    }

    #[test]
    fn test_register_block_write_needs_enable() {
        let mut state = RegisterBlockState::default();
        let write = InputView::from_values(&[
            ("writeReg", Signal::new(3, 5)),
            ("writeData", Signal::new(9, 32)),
            ("regWrite", Signal::bit(0)),
        ]);
        register_block_write(&mut state, &write);
        assert_eq!(state.regs[3], 0);
    }

    #[test]
    fn test_instruction_memory_word_addressing() {
        let state = InstructionMemoryState {
            instructions: vec![10, 20, 30],
        };
        assert_eq!(instruction_memory_read(&state, 0), 10);
        assert_eq!(instruction_memory_read(&state, 4), 20);
        assert_eq!(instruction_memory_read(&state, 8), 30);
        assert_eq!(instruction_memory_read(&state, 12), 0);
    }

    #[test]
    fn test_data_memory_write_then_read() {
        let mut state = DataMemoryState::default();
        let write = InputView::from_values(&[
            ("address", Signal::new(16, 32)),
            ("writeData", Signal::new(1234, 32)),
            ("memWrite", Signal::bit(1)),
        ]);
        assert_eq!(data_memory_access(&mut state, &write).unwrap(), None);

        let read = InputView::from_values(&[
            ("address", Signal::new(16, 32)),
            ("memRead", Signal::bit(1)),
        ]);
        assert_eq!(data_memory_access(&mut state, &read).unwrap(), Some(1234));
    }

    #[test]
    fn test_data_memory_simultaneous_read_write_is_error() {
        let mut state = DataMemoryState::default();
        let both = InputView::from_values(&[
            ("address", Signal::new(0, 32)),
            ("memRead", Signal::bit(1)),
            ("memWrite", Signal::bit(1)),
        ]);
        assert!(data_memory_access(&mut state, &both).is_err());
    }

    #[test]
    fn test_data_memory_idle_keeps_output() {
        let mut state = DataMemoryState::default();
        let idle = InputView::from_values(&[("address", Signal::new(0, 32))]);
        assert_eq!(data_memory_access(&mut state, &idle).unwrap(), None);
    }
}
