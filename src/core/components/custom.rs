use super::{InputPort, InputView};
use crate::core::events;
use crate::core::graph::CircuitGraph;
use crate::core::signal::Signal;
use crate::core::types::{ComponentId, ConnectResult, Kind};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

/// Source end of a descriptor connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorFrom {
    pub component_idx: usize,
    pub output: String,
}

/// Destination end of a descriptor connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorTo {
    pub component_idx: usize,
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorConnection {
    pub from: DescriptorFrom,
    pub to: DescriptorTo,
}

/// Declarative shape of a custom component, as persisted to JSON.
///
/// External inputs map to the Input children in declaration order, external
/// outputs to the Output children likewise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDescriptor {
    pub name: String,
    pub input_map: IndexMap<String, u8>,
    pub output_map: IndexMap<String, u8>,
    pub components: Vec<Kind>,
    pub connections: Vec<DescriptorConnection>,
}

impl CustomDescriptor {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|err| format!("invalid descriptor: {}", err))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|err| format!("descriptor serialisation: {}", err))
    }
}

/// Private state of an instantiated custom component: the internal graph and
/// the index-ordered handles of its boundary children.
pub struct CustomState {
    graph: CircuitGraph,
    input_children: Vec<ComponentId>,
    output_children: Vec<ComponentId>,
}

impl CustomState {
    /// Materialise the descriptor's children and internal wiring. Runs with
    /// the event bus muted so internal wiring cannot trigger evaluations.
    pub(crate) fn build(descriptor: &CustomDescriptor) -> Result<Self, String> {
        events::with_muted(|| {
            let mut graph = CircuitGraph::new();
            let mut children = Vec::with_capacity(descriptor.components.len());
            for kind in &descriptor.components {
                if *kind == Kind::Custom {
                    return Err(format!(
                        "descriptor '{}' nests a custom component",
                        descriptor.name
                    ));
                }
                children.push(graph.add_component(*kind)?);
            }

            let input_children: Vec<ComponentId> = children
                .iter()
                .copied()
                .filter(|id| graph.component_kind(*id) == Some(Kind::Input))
                .collect();
            let output_children: Vec<ComponentId> = children
                .iter()
                .copied()
                .filter(|id| graph.component_kind(*id) == Some(Kind::Output))
                .collect();

            if input_children.len() != descriptor.input_map.len() {
                return Err(format!(
                    "descriptor '{}': {} external inputs but {} Input children",
                    descriptor.name,
                    descriptor.input_map.len(),
                    input_children.len()
                ));
            }
            if output_children.len() != descriptor.output_map.len() {
                return Err(format!(
                    "descriptor '{}': {} external outputs but {} Output children",
                    descriptor.name,
                    descriptor.output_map.len(),
                    output_children.len()
                ));
            }

            // Seed the boundary Inputs with their external widths before
            // wiring, so fixed-width children see the right port widths.
            for (child, width) in input_children.iter().zip(descriptor.input_map.values()) {
                graph.set_input(*child, Signal::zero(*width))?;
            }

            for connection in &descriptor.connections {
                let src = *children.get(connection.from.component_idx).ok_or_else(|| {
                    format!(
                        "descriptor '{}': connection source index {} out of range",
                        descriptor.name, connection.from.component_idx
                    )
                })?;
                let dst = *children.get(connection.to.component_idx).ok_or_else(|| {
                    format!(
                        "descriptor '{}': connection target index {} out of range",
                        descriptor.name, connection.to.component_idx
                    )
                })?;
                match graph.add_connection(src, &connection.from.output, dst, &connection.to.input)? {
                    ConnectResult::Added => {}
                    ConnectResult::Rejected(reason) => {
                        return Err(format!(
                            "descriptor '{}': internal connection rejected: {}",
                            descriptor.name, reason
                        ));
                    }
                    ConnectResult::DuplicateSlot => {
                        return Err(format!(
                            "descriptor '{}': input slot wired twice",
                            descriptor.name
                        ));
                    }
                }
            }

            Ok(Self {
                graph,
                input_children,
                output_children,
            })
        })
    }

    /// Drive the internal Inputs from the external readings, run a full
    /// internal evaluation, and report the internal Outputs' values in
    /// external-output declaration order.
    pub(crate) fn eval(
        &mut self,
        view: &InputView,
        external_inputs: &IndexMap<String, InputPort>,
    ) -> Result<Vec<u32>, String> {
        events::with_muted(|| {
            for (index, name) in external_inputs.keys().enumerate() {
                let child = self.input_children[index];
                self.graph.set_input(child, view.signal(name))?;
            }

            if !self.graph.eval()? {
                warn!("custom component internal graph did not stabilise");
            }

            let mut values = Vec::with_capacity(self.output_children.len());
            for child in &self.output_children {
                let value = self
                    .graph
                    .output_signal(*child, "outValue")
                    .map(|signal| signal.value)
                    .unwrap_or(0);
                values.push(value);
            }
            Ok(values)
        })
    }
}
