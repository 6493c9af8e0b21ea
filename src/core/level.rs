use crate::core::controller::Controller;
use crate::core::signal::Signal;
use serde::{Deserialize, Serialize};

/// One row of a level's test vector: values for the primary inputs in
/// palette order and the outputs they must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    pub inputs: Vec<Signal>,
    pub expected_output: Vec<Signal>,
}

/// The test-vector list of one level descriptor. The core is otherwise
/// agnostic to levels; file I/O stays with the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTests {
    pub vectors: Vec<TestVector>,
}

/// Apply each vector's inputs, run a full evaluation, and compare every
/// primary output. Returns `Ok(false)` on the first mismatch (or when the
/// circuit fails to stabilise).
pub fn run_level_tests(controller: &mut Controller, tests: &LevelTests) -> Result<bool, String> {
    let primary_inputs = controller.primary_inputs();
    let primary_outputs = controller.primary_outputs();

    for vector in &tests.vectors {
        if vector.inputs.len() != primary_inputs.len() {
            return Err(format!(
                "test vector drives {} inputs, circuit has {}",
                vector.inputs.len(),
                primary_inputs.len()
            ));
        }
        if vector.expected_output.len() != primary_outputs.len() {
            return Err(format!(
                "test vector expects {} outputs, circuit has {}",
                vector.expected_output.len(),
                primary_outputs.len()
            ));
        }

        for (id, signal) in primary_inputs.iter().zip(&vector.inputs) {
            controller.set_input(*id, *signal)?;
        }
        if !controller.eval()? {
            return Ok(false);
        }
        for (id, expected) in primary_outputs.iter().zip(&vector.expected_output) {
            let actual = controller
                .output_signal(*id, "outValue")
                .unwrap_or(Signal::zero(0));
            if actual != *expected {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
