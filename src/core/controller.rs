use crate::core::components::custom::CustomDescriptor;
use crate::core::events::{self, Payload};
use crate::core::graph::CircuitGraph;
use crate::core::level::{self, LevelTests};
use crate::core::signal::Signal;
use crate::core::types::{ComponentId, ConnectResult, Kind};
use indexmap::IndexMap;
use log::warn;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Public facade over one [`CircuitGraph`].
///
/// Owns the graph and wires the incremental-evaluation subscription: every
/// `model:input_changed` announcement re-evaluates the changed component's
/// downstream cone with the event-driven evaluator.
pub struct Controller {
    graph: Rc<RefCell<CircuitGraph>>,
}

impl Controller {
    pub fn new() -> Self {
        let graph = Rc::new(RefCell::new(CircuitGraph::new()));
        Self::subscribe_incremental(Rc::downgrade(&graph));
        Self { graph }
    }

    fn subscribe_incremental(graph: Weak<RefCell<CircuitGraph>>) {
        events::subscribe(events::MODEL_INPUT_CHANGED, move |payload| {
            let Payload::Component(id) = payload else {
                return;
            };
            let Some(graph) = graph.upgrade() else {
                return;
            };
            // A graph already borrowed is mid-operation; that operation is
            // responsible for its own evaluation.
            let Ok(mut graph) = graph.try_borrow_mut() else {
                return;
            };
            if let Err(err) = graph.event_driven_eval(&[*id]) {
                warn!("incremental evaluation aborted: {}", err);
            }
        });
    }

    /// Instantiate a built-in component kind.
    pub fn add_component(&mut self, kind: Kind) -> Result<ComponentId, String> {
        self.graph.borrow_mut().add_component(kind)
    }

    /// Instantiate a custom component from its descriptor.
    pub fn add_custom_component(
        &mut self,
        descriptor: &CustomDescriptor,
    ) -> Result<ComponentId, String> {
        self.graph.borrow_mut().add_custom_component(descriptor)
    }

    /// Remove a component and every connection incident to it.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<(), String> {
        let affected = self.graph.borrow_mut().remove_component(id)?;
        for target in affected {
            events::emit(events::MODEL_INPUT_CHANGED, Payload::Component(target));
        }
        Ok(())
    }

    /// Connect an output port to a vacant input port.
    pub fn add_connection(
        &mut self,
        src: ComponentId,
        src_port: &str,
        dst: ComponentId,
        dst_port: &str,
    ) -> Result<ConnectResult, String> {
        let result = self
            .graph
            .borrow_mut()
            .add_connection(src, src_port, dst, dst_port)?;
        if result == ConnectResult::Added {
            events::emit(events::MODEL_INPUT_CHANGED, Payload::Component(dst));
        }
        Ok(result)
    }

    /// Remove one connection.
    pub fn remove_connection(
        &mut self,
        src: ComponentId,
        src_port: &str,
        dst: ComponentId,
        dst_port: &str,
    ) -> Result<(), String> {
        self.graph
            .borrow_mut()
            .remove_connection(src, src_port, dst, dst_port)?;
        events::emit(events::MODEL_INPUT_CHANGED, Payload::Component(dst));
        Ok(())
    }

    /// Set the signal an Input component emits. A change announces itself on
    /// the bus, which drives the incremental re-evaluation of its cone.
    pub fn set_input(&mut self, id: ComponentId, signal: Signal) -> Result<(), String> {
        let changed = self.graph.borrow_mut().set_input(id, signal)?;
        if changed {
            events::emit(events::MODEL_INPUT_CHANGED, Payload::Component(id));
        }
        Ok(())
    }

    /// Cycle an Input component's width through 1 -> 8 -> 32.
    pub fn cycle_bitwidth(&mut self, id: ComponentId) -> Result<u8, String> {
        let width = self.graph.borrow_mut().cycle_bitwidth(id)?;
        events::emit(events::MODEL_INPUT_CHANGED, Payload::Component(id));
        Ok(width)
    }

    /// Load an InstructionMemory's word list and announce the new count.
    pub fn load_instructions(
        &mut self,
        id: ComponentId,
        words: Vec<u32>,
    ) -> Result<(), String> {
        let count = self.graph.borrow_mut().load_instructions(id, words)?;
        events::emit(events::LOGIC_INSTRUCTION_COUNT, Payload::Count(count));
        Ok(())
    }

    /// Full evaluation: Kahn first, event-driven fallback. `Ok(false)` means
    /// the graph has no stable fixed point or nothing to start from.
    pub fn eval(&mut self) -> Result<bool, String> {
        self.graph.borrow_mut().eval()
    }

    /// Event-driven evaluation from an explicit starting set.
    pub fn event_driven_eval(&mut self, starting: &[ComponentId]) -> Result<bool, String> {
        self.graph.borrow_mut().event_driven_eval(starting)
    }

    /// Advance all Register and RegisterBlock two-phase state.
    pub fn update_registers(&mut self) {
        self.graph.borrow_mut().update_registers();
    }

    /// Drop all components and connections.
    pub fn clear_components(&mut self) {
        self.graph.borrow_mut().clear();
    }

    pub fn component_kind(&self, id: ComponentId) -> Option<Kind> {
        self.graph.borrow().component_kind(id)
    }

    pub fn label(&self, id: ComponentId) -> Option<String> {
        self.graph
            .borrow()
            .component(id)
            .map(|component| component.label().to_string())
    }

    pub fn set_label(&mut self, id: ComponentId, label: &str) -> Result<(), String> {
        let mut graph = self.graph.borrow_mut();
        let component = graph
            .component_mut(id)
            .ok_or_else(|| format!("component {} not found", id))?;
        component.set_label(label);
        Ok(())
    }

    pub fn output_signal(&self, id: ComponentId, port: &str) -> Option<Signal> {
        self.graph.borrow().output_signal(id, port)
    }

    /// Snapshot of a component's output state, in declaration order.
    pub fn output_state(&self, id: ComponentId) -> Option<IndexMap<String, Signal>> {
        self.graph
            .borrow()
            .component(id)
            .map(|component| component.output_state())
    }

    pub fn primary_inputs(&self) -> Vec<ComponentId> {
        self.graph.borrow().primary_inputs().to_vec()
    }

    pub fn primary_outputs(&self) -> Vec<ComponentId> {
        self.graph.borrow().primary_outputs().to_vec()
    }

    /// Run a level's test vectors against the current circuit.
    pub fn check_level(&mut self, tests: &LevelTests) -> Result<bool, String> {
        level::run_level_tests(self, tests)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
