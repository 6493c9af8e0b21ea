use crate::core::controller::Controller;
use crate::core::level::{LevelTests, TestVector};
use crate::core::signal::Signal;
use crate::core::types::{ComponentId, Kind};

fn xor_circuit() -> (Controller, ComponentId, ComponentId) {
    let mut controller = Controller::new();
    let a = controller.add_component(Kind::Input).unwrap();
    let b = controller.add_component(Kind::Input).unwrap();
    let xor = controller.add_component(Kind::Xor).unwrap();
    let out = controller.add_component(Kind::Output).unwrap();
    controller.add_connection(a, "outValue", xor, "input1").unwrap();
    controller.add_connection(b, "outValue", xor, "input2").unwrap();
    controller.add_connection(xor, "outValue", out, "input").unwrap();
    (controller, a, b)
}

fn xor_vectors() -> LevelTests {
    LevelTests {
        vectors: [(0u32, 0u32, 0u32), (0, 1, 1), (1, 0, 1), (1, 1, 0)]
            .into_iter()
            .map(|(a, b, out)| TestVector {
                inputs: vec![Signal::bit(a), Signal::bit(b)],
                expected_output: vec![Signal::bit(out)],
            })
            .collect(),
    }
}

#[test]
fn test_level_passes_on_correct_circuit() {
    let (mut controller, _, _) = xor_circuit();
    assert!(controller.check_level(&xor_vectors()).unwrap());
}

#[test]
fn test_level_fails_on_wrong_expectation() {
    let (mut controller, _, _) = xor_circuit();
    let mut tests = xor_vectors();
    tests.vectors[3].expected_output[0] = Signal::bit(1);
    assert!(!controller.check_level(&tests).unwrap());
}

#[test]
fn test_level_rejects_vector_arity_mismatch() {
    let (mut controller, _, _) = xor_circuit();
    let tests = LevelTests {
        vectors: vec![TestVector {
            inputs: vec![Signal::bit(0)],
            expected_output: vec![Signal::bit(0)],
        }],
    };
    assert!(controller.check_level(&tests).is_err());
}

/// The serialised vector shape the level files carry.
#[test]
fn test_level_vectors_deserialize() {
    let json = r#"{
        "vectors": [
            {"inputs": [{"value": 1, "bit_width": 1}, {"value": 1, "bit_width": 1}],
             "expected_output": [{"value": 0, "bit_width": 1}]}
        ]
    }"#;
    let tests: LevelTests = serde_json::from_str(json).unwrap();
    let (mut controller, _, _) = xor_circuit();
    assert!(controller.check_level(&tests).unwrap());
}
