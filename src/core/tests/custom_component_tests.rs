use crate::core::components::custom::{
    CustomDescriptor, DescriptorConnection, DescriptorFrom, DescriptorTo,
};
use crate::core::controller::Controller;
use crate::core::signal::Signal;
use crate::core::types::Kind;
use indexmap::IndexMap;

fn wire(from_idx: usize, output: &str, to_idx: usize, input: &str) -> DescriptorConnection {
    DescriptorConnection {
        from: DescriptorFrom {
            component_idx: from_idx,
            output: output.to_string(),
        },
        to: DescriptorTo {
            component_idx: to_idx,
            input: input.to_string(),
        },
    }
}

/// A half adder packaged as a custom component: two Inputs, XOR and AND,
/// two Outputs.
fn half_adder_descriptor() -> CustomDescriptor {
    let mut input_map = IndexMap::new();
    input_map.insert("a".to_string(), 1u8);
    input_map.insert("b".to_string(), 1u8);
    let mut output_map = IndexMap::new();
    output_map.insert("sum".to_string(), 1u8);
    output_map.insert("carry".to_string(), 1u8);
    CustomDescriptor {
        name: "halfAdder".to_string(),
        input_map,
        output_map,
        components: vec![
            Kind::Input,
            Kind::Input,
            Kind::Xor,
            Kind::And,
            Kind::Output,
            Kind::Output,
        ],
        connections: vec![
            wire(0, "outValue", 2, "input1"),
            wire(1, "outValue", 2, "input2"),
            wire(0, "outValue", 3, "input1"),
            wire(1, "outValue", 3, "input2"),
            wire(2, "outValue", 4, "input"),
            wire(3, "outValue", 5, "input"),
        ],
    }
}

#[test]
fn test_custom_half_adder_behaves_like_the_real_one() {
    super::init_logging();
    let mut controller = Controller::new();
    let a = controller.add_component(Kind::Input).unwrap();
    let b = controller.add_component(Kind::Input).unwrap();
    let custom = controller
        .add_custom_component(&half_adder_descriptor())
        .unwrap();
    controller.add_connection(a, "outValue", custom, "a").unwrap();
    controller.add_connection(b, "outValue", custom, "b").unwrap();

    assert_eq!(controller.component_kind(custom), Some(Kind::Custom));
    assert_eq!(controller.label(custom).as_deref(), Some("halfAdder"));

    for (va, vb, sum, carry) in [(0, 0, 0, 0), (0, 1, 1, 0), (1, 0, 1, 0), (1, 1, 0, 1)] {
        controller.set_input(a, Signal::bit(va)).unwrap();
        controller.set_input(b, Signal::bit(vb)).unwrap();
        assert!(controller.eval().unwrap());
        assert_eq!(
            controller.output_signal(custom, "sum").unwrap().value,
            sum,
            "sum({}, {})",
            va,
            vb
        );
        assert_eq!(
            controller.output_signal(custom, "carry").unwrap().value,
            carry,
            "carry({}, {})",
            va,
            vb
        );
    }
}

#[test]
fn test_custom_output_feeds_downstream_logic() {
    let mut controller = Controller::new();
    let a = controller.add_component(Kind::Input).unwrap();
    let b = controller.add_component(Kind::Input).unwrap();
    let custom = controller
        .add_custom_component(&half_adder_descriptor())
        .unwrap();
    let not = controller.add_component(Kind::Not).unwrap();
    controller.add_connection(a, "outValue", custom, "a").unwrap();
    controller.add_connection(b, "outValue", custom, "b").unwrap();
    controller.add_connection(custom, "sum", not, "input").unwrap();

    controller.set_input(a, Signal::bit(1)).unwrap();
    controller.set_input(b, Signal::bit(0)).unwrap();
    assert!(controller.eval().unwrap());
    assert_eq!(controller.output_signal(not, "outValue").unwrap().value, 0);
}

#[test]
fn test_descriptor_json_round_trip() {
    let descriptor = half_adder_descriptor();
    let json = descriptor.to_json().unwrap();
    let parsed = CustomDescriptor::from_json(&json).unwrap();
    assert_eq!(parsed.name, descriptor.name);
    assert_eq!(parsed.input_map, descriptor.input_map);
    assert_eq!(parsed.output_map, descriptor.output_map);
    assert_eq!(parsed.components, descriptor.components);
    assert_eq!(parsed.connections.len(), descriptor.connections.len());
}

#[test]
fn test_descriptor_json_shape_is_stable() {
    let json = r#"{
        "name": "passThrough",
        "input_map": {"value": 1},
        "output_map": {"result": 1},
        "components": ["Input", "Output"],
        "connections": [
            {"from": {"component_idx": 0, "output": "outValue"},
             "to": {"component_idx": 1, "input": "input"}}
        ]
    }"#;
    let descriptor = CustomDescriptor::from_json(json).unwrap();
    assert_eq!(descriptor.components, vec![Kind::Input, Kind::Output]);

    let mut controller = Controller::new();
    let a = controller.add_component(Kind::Input).unwrap();
    let custom = controller.add_custom_component(&descriptor).unwrap();
    controller.add_connection(a, "outValue", custom, "value").unwrap();
    controller.set_input(a, Signal::bit(1)).unwrap();
    assert!(controller.eval().unwrap());
    assert_eq!(controller.output_signal(custom, "result").unwrap().value, 1);
}

#[test]
fn test_descriptor_boundary_mismatch_is_rejected() {
    let mut descriptor = half_adder_descriptor();
    descriptor.input_map.shift_remove("b");
    let mut controller = Controller::new();
    assert!(controller.add_custom_component(&descriptor).is_err());
}

#[test]
fn test_descriptor_rejects_nested_custom() {
    let mut descriptor = half_adder_descriptor();
    descriptor.components.push(Kind::Custom);
    let mut controller = Controller::new();
    assert!(controller.add_custom_component(&descriptor).is_err());
}

#[test]
fn test_descriptor_rejects_bad_internal_wiring() {
    let mut descriptor = half_adder_descriptor();
    descriptor.connections.push(wire(0, "outValue", 99, "input"));
    let mut controller = Controller::new();
    assert!(controller.add_custom_component(&descriptor).is_err());
}
