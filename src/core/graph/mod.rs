use crate::core::components::custom::CustomDescriptor;
use crate::core::components::{mux_data_count, storage, Component, InputView, KindState};
use crate::core::execution::{event_driven, kahn};
use crate::core::signal::Signal;
use crate::core::types::{ComponentId, ConnectResult, Kind};
use indexmap::{IndexMap, IndexSet};
use log::debug;

/// Owns the instantiated components and the directed, typed connections
/// between them.
///
/// Components live in an arena keyed by integer handles; every connection is
/// recorded on both half-edges (the destination's input slot and the
/// source's target list) for O(1) traversal in either direction.
pub struct CircuitGraph {
    components: IndexMap<ComponentId, Component>,
    primary_inputs: Vec<ComponentId>,
    primary_outputs: Vec<ComponentId>,
    next_id: u64,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self {
            components: IndexMap::new(),
            primary_inputs: Vec::new(),
            primary_outputs: Vec::new(),
            next_id: 0,
        }
    }

    fn issue_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Instantiate a built-in kind and register it. Input and Output
    /// components also join the primary lists used by level checking.
    pub fn add_component(&mut self, kind: Kind) -> Result<ComponentId, String> {
        let id = self.issue_id();
        let component = Component::new(id, kind)?;
        self.components.insert(id, component);
        match kind {
            Kind::Input => self.primary_inputs.push(id),
            Kind::Output => self.primary_outputs.push(id),
            _ => {}
        }
        Ok(id)
    }

    /// Instantiate a custom component from its descriptor, materialising its
    /// internal children and wiring as part of construction.
    pub fn add_custom_component(&mut self, descriptor: &CustomDescriptor) -> Result<ComponentId, String> {
        let id = self.issue_id();
        let component = Component::new_custom(id, descriptor)?;
        self.components.insert(id, component);
        Ok(id)
    }

    /// Remove a component and purge every incident connection. Returns the
    /// downstream components whose inputs were disconnected.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Vec<ComponentId>, String> {
        if !self.components.contains_key(&id) {
            return Err(format!("component {} not found", id));
        }

        // Incoming edges: drop this component from each source's target list.
        let incoming: Vec<(ComponentId, String)> = self.components[&id]
            .inputs
            .values()
            .filter_map(|port| port.source.clone())
            .collect();
        for (src, src_port) in incoming {
            if let Some(source) = self.components.get_mut(&src) {
                if let Some(port) = source.outputs.get_mut(&src_port) {
                    port.targets.retain(|(target, _)| *target != id);
                }
            }
            self.release_source_widths(src);
        }

        // Outgoing edges: vacate each destination's input slot.
        let outgoing: Vec<(ComponentId, String)> = self.components[&id]
            .outputs
            .values()
            .flat_map(|port| port.targets.clone())
            .collect();
        let mut affected = Vec::new();
        for (dst, dst_port) in outgoing {
            if let Some(target) = self.components.get_mut(&dst) {
                if let Some(port) = target.inputs.get_mut(&dst_port) {
                    port.source = None;
                }
            }
            self.release_target_widths(dst, &dst_port);
            if dst != id && self.components.contains_key(&dst) && !affected.contains(&dst) {
                affected.push(dst);
            }
        }

        self.components.shift_remove(&id);
        self.primary_inputs.retain(|other| *other != id);
        self.primary_outputs.retain(|other| *other != id);
        Ok(affected)
    }

    /// Record a connection between two ports.
    ///
    /// Unknown components or port names are `Err`; an occupied input slot is
    /// `DuplicateSlot`; a failed width check is `Rejected`. Nothing is
    /// mutated unless the result is `Added`.
    pub fn add_connection(
        &mut self,
        src: ComponentId,
        src_port: &str,
        dst: ComponentId,
        dst_port: &str,
    ) -> Result<ConnectResult, String> {
        let src_comp = self
            .components
            .get(&src)
            .ok_or_else(|| format!("source component {} not found", src))?;
        let dst_comp = self
            .components
            .get(&dst)
            .ok_or_else(|| format!("target component {} not found", dst))?;
        if !src_comp.has_output(src_port) {
            return Err(format!("component {} has no output port '{}'", src, src_port));
        }
        if !dst_comp.has_input(dst_port) {
            return Err(format!("component {} has no input port '{}'", dst, dst_port));
        }
        if dst_comp.inputs[dst_port].source.is_some() {
            return Ok(ConnectResult::DuplicateSlot);
        }

        let src_width = src_comp.outputs[src_port].width;
        let dst_width = dst_comp.inputs[dst_port].width;
        let src_kind = src_comp.kind;
        let dst_kind = dst_comp.kind;

        // Width plan: decided before any mutation so a rejection leaves the
        // graph untouched.
        let mut lock_dst: Option<u8> = None;
        let mut lock_src: Option<u8> = None;
        let mut lock_selection = false;

        if mux_data_count(dst_kind).is_some() && dst_port == "selection" {
            let lanes = mux_data_count(dst_kind).unwrap_or(0);
            if src_width == 0 || (1u32 << src_width.min(31)) < lanes {
                return Ok(ConnectResult::Rejected(format!(
                    "selection width {} cannot index {} data ports",
                    src_width, lanes
                )));
            }
            lock_selection = true;
        } else if dst_width == 0 && adaptive_input(dst_kind, dst_port) {
            if src_width > 0 {
                lock_dst = Some(src_width);
            }
            // Both ends unbound: the edge is recorded width-free.
        } else if src_width == 0 {
            if adaptive_output(src_kind, src_port) && dst_width > 0 {
                lock_src = Some(dst_width);
            } else {
                return Ok(ConnectResult::Rejected(format!(
                    "source port '{}' has no bound width", src_port
                )));
            }
        } else if src_width != dst_width {
            return Ok(ConnectResult::Rejected(format!(
                "width mismatch: {} bit output into {} bit input",
                src_width, dst_width
            )));
        }

        // Commit.
        if let Some(width) = lock_dst {
            if let Some(component) = self.components.get_mut(&dst) {
                apply_width_lock(component, width);
            }
        }
        if let Some(width) = lock_src {
            if let Some(component) = self.components.get_mut(&src) {
                apply_width_lock(component, width);
            }
        }
        if lock_selection {
            if let Some(component) = self.components.get_mut(&dst) {
                if let Some(port) = component.inputs.get_mut("selection") {
                    port.width = src_width;
                }
            }
        }
        if let Some(component) = self.components.get_mut(&dst) {
            if let Some(port) = component.inputs.get_mut(dst_port) {
                port.source = Some((src, src_port.to_string()));
            }
        }
        if let Some(component) = self.components.get_mut(&src) {
            if let Some(port) = component.outputs.get_mut(src_port) {
                port.targets.push((dst, dst_port.to_string()));
            }
        }
        Ok(ConnectResult::Added)
    }

    /// Remove one connection; `Err` if no such edge exists.
    pub fn remove_connection(
        &mut self,
        src: ComponentId,
        src_port: &str,
        dst: ComponentId,
        dst_port: &str,
    ) -> Result<(), String> {
        let recorded = self
            .components
            .get(&dst)
            .ok_or_else(|| format!("target component {} not found", dst))?
            .inputs
            .get(dst_port)
            .ok_or_else(|| format!("component {} has no input port '{}'", dst, dst_port))?
            .source
            .clone();
        match recorded {
            Some((source, ref port)) if source == src && port == src_port => {}
            _ => {
                return Err(format!(
                    "no connection {}.{} -> {}.{}",
                    src, src_port, dst, dst_port
                ))
            }
        }

        if let Some(component) = self.components.get_mut(&dst) {
            if let Some(port) = component.inputs.get_mut(dst_port) {
                port.source = None;
            }
        }
        if let Some(component) = self.components.get_mut(&src) {
            if let Some(port) = component.outputs.get_mut(src_port) {
                port.targets
                    .retain(|(target, target_port)| !(*target == dst && target_port == dst_port));
            }
        }
        self.release_target_widths(dst, dst_port);
        self.release_source_widths(src);
        Ok(())
    }

    /// Relax a width-adaptive destination after one of its inputs was
    /// vacated. Locking only relaxes once the component is effectively
    /// disconnected on the relevant side.
    fn release_target_widths(&mut self, id: ComponentId, port: &str) {
        let Some(component) = self.components.get_mut(&id) else {
            return;
        };
        match component.kind {
            Kind::Output => {
                apply_width_lock(component, 0);
            }
            Kind::ShiftLeft2 => {
                let output_used = component
                    .outputs
                    .get("outValue")
                    .map(|out| !out.targets.is_empty())
                    .unwrap_or(false);
                if !output_used {
                    apply_width_lock(component, 0);
                }
            }
            kind if mux_data_count(kind).is_some() => {
                if port == "selection" {
                    if let Some(selection) = component.inputs.get_mut("selection") {
                        selection.width = 0;
                    }
                    return;
                }
                release_mux_if_disconnected(component);
            }
            _ => {}
        }
    }

    /// Relax a width-adaptive source after one of its output edges was
    /// removed.
    fn release_source_widths(&mut self, id: ComponentId) {
        let Some(component) = self.components.get_mut(&id) else {
            return;
        };
        match component.kind {
            Kind::ShiftLeft2 => {
                let input_used = component
                    .inputs
                    .get("input1")
                    .map(|port| port.source.is_some())
                    .unwrap_or(false);
                let output_used = component
                    .outputs
                    .get("outValue")
                    .map(|out| !out.targets.is_empty())
                    .unwrap_or(false);
                if !input_used && !output_used {
                    apply_width_lock(component, 0);
                }
            }
            kind if mux_data_count(kind).is_some() => {
                release_mux_if_disconnected(component);
            }
            _ => {}
        }
    }

    /// Drop all components and connections.
    pub fn clear(&mut self) {
        self.components.clear();
        self.primary_inputs.clear();
        self.primary_outputs.clear();
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.keys().copied().collect()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub fn component_kind(&self, id: ComponentId) -> Option<Kind> {
        self.components.get(&id).map(|component| component.kind)
    }

    pub fn primary_inputs(&self) -> &[ComponentId] {
        &self.primary_inputs
    }

    pub fn primary_outputs(&self) -> &[ComponentId] {
        &self.primary_outputs
    }

    pub fn output_signal(&self, id: ComponentId, port: &str) -> Option<Signal> {
        self.components
            .get(&id)
            .and_then(|component| component.output_signal(port))
    }

    /// Externally set an Input component's emitted signal.
    pub fn set_input(&mut self, id: ComponentId, signal: Signal) -> Result<bool, String> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| format!("component {} not found", id))?;
        component.set_input_value(signal)
    }

    /// Cycle an Input component's width through 1 -> 8 -> 32.
    pub fn cycle_bitwidth(&mut self, id: ComponentId) -> Result<u8, String> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| format!("component {} not found", id))?;
        component.cycle_bitwidth()
    }

    /// Load an InstructionMemory's word list and push the new wrap boundary
    /// (`4 × count`) into every ProgramCounter.
    pub fn load_instructions(&mut self, id: ComponentId, words: Vec<u32>) -> Result<usize, String> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| format!("component {} not found", id))?;
        let count = words.len();
        match &mut component.state {
            KindState::InstructionMemory(state) => state.instructions = words,
            _ => return Err(format!("component {} is not an InstructionMemory", id)),
        }
        for component in self.components.values_mut() {
            if let KindState::ProgramCounter(state) = &mut component.state {
                state.max_value = (count as u32) * 4;
            }
        }
        Ok(count)
    }

    /// Total instruction words across all InstructionMemory components;
    /// feeds the event-driven cycle cap.
    pub fn instruction_word_total(&self) -> usize {
        self.components
            .values()
            .map(|component| match &component.state {
                KindState::InstructionMemory(state) => state.instructions.len(),
                _ => 0,
            })
            .sum()
    }

    /// Every ProgramCounter handle, the last-resort starting set for
    /// event-driven evaluation.
    pub fn program_counters(&self) -> Vec<ComponentId> {
        self.components
            .values()
            .filter(|component| component.kind == Kind::ProgramCounter)
            .map(|component| component.id)
            .collect()
    }

    /// Distinct downstream components of `id`, in edge order.
    pub fn downstream(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut seen = IndexSet::new();
        if let Some(component) = self.components.get(&id) {
            for port in component.outputs.values() {
                for (target, _) in &port.targets {
                    seen.insert(*target);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Distinct upstream components feeding `id`.
    pub fn upstream(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut seen = IndexSet::new();
        if let Some(component) = self.components.get(&id) {
            for port in component.inputs.values() {
                if let Some((source, _)) = &port.source {
                    seen.insert(*source);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Current input readings of `id`: connected inputs carry the upstream
    /// output signal, unconnected ones read as zero of the declared width.
    pub fn collect_view(&self, id: ComponentId) -> InputView {
        let mut view = InputView::new();
        if let Some(component) = self.components.get(&id) {
            for (name, port) in &component.inputs {
                let signal = port.source.as_ref().and_then(|(source, source_port)| {
                    self.components
                        .get(source)
                        .and_then(|upstream| upstream.output_signal(source_port))
                });
                view.insert(name, port.width, signal);
            }
        }
        view
    }

    /// Evaluate one component against its current input readings.
    pub fn eval_component(&mut self, id: ComponentId) -> Result<bool, String> {
        let view = self.collect_view(id);
        let component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| format!("component {} not found", id))?;
        component.eval(&view)
    }

    /// Full evaluation: Kahn wavefront first, event-driven fallback. The
    /// event bus is muted for the duration so mid-pass wiring cannot
    /// recursively trigger more evaluations.
    pub fn eval(&mut self) -> Result<bool, String> {
        crate::core::events::with_muted(|| {
            if kahn::kahn_frontier_eval(self, None)? {
                return Ok(true);
            }
            debug!("kahn evaluation found a cycle, falling back to event-driven");
            event_driven::event_driven_eval(self, &[])
        })
    }

    /// Kahn wavefront evaluation with an optional per-tick observer.
    pub fn kahn_frontier_eval(
        &mut self,
        observer: Option<&mut dyn FnMut(usize, &[ComponentId])>,
    ) -> Result<bool, String> {
        kahn::kahn_frontier_eval(self, observer)
    }

    /// Event-driven fixed-point evaluation from an explicit starting set.
    pub fn event_driven_eval(&mut self, starting: &[ComponentId]) -> Result<bool, String> {
        event_driven::event_driven_eval(self, starting)
    }

    /// Advance the two-phase state of every Register and RegisterBlock:
    /// registers publish the value stashed at the last `eval`, register
    /// blocks perform their deferred write.
    pub fn update_registers(&mut self) {
        let mut advanced = 0usize;
        let ids = self.component_ids();
        for id in ids {
            match self.component_kind(id) {
                Some(Kind::Register) => {
                    if let Some(component) = self.components.get_mut(&id) {
                        let published = match &mut component.state {
                            KindState::Register(state) => storage::register_publish(state),
                            _ => None,
                        };
                        if let Some(value) = published {
                            component.write_output("outValue", value);
                            advanced += 1;
                        }
                    }
                }
                Some(Kind::RegisterBlock) => {
                    let view = self.collect_view(id);
                    if let Some(component) = self.components.get_mut(&id) {
                        if let KindState::RegisterBlock(state) = &mut component.state {
                            storage::register_block_write(state, &view);
                        }
                    }
                }
                _ => {}
            }
        }
        if advanced > 0 {
            debug!("update_registers: published {} stashed register values", advanced);
        }
    }
}

impl Default for CircuitGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Input ports that discover their width from the first connection.
fn adaptive_input(kind: Kind, port: &str) -> bool {
    match kind {
        Kind::Output => port == "input",
        Kind::ShiftLeft2 => port == "input1",
        kind if mux_data_count(kind).is_some() => port.starts_with("input"),
        _ => false,
    }
}

/// Output ports that may take their width from the first downstream input.
fn adaptive_output(kind: Kind, port: &str) -> bool {
    match kind {
        Kind::ShiftLeft2 => port == "outValue",
        kind if mux_data_count(kind).is_some() => port == "outputValue",
        _ => false,
    }
}

/// Bind (or, with width 0, release) every adaptive port of a component.
fn apply_width_lock(component: &mut Component, width: u8) {
    match component.kind {
        Kind::Output => {
            if let Some(port) = component.inputs.get_mut("input") {
                port.width = width;
            }
            if let Some(port) = component.outputs.get_mut("outValue") {
                port.width = width;
                port.signal = Signal::new(port.signal.value, width);
            }
        }
        Kind::ShiftLeft2 => {
            if let Some(port) = component.inputs.get_mut("input1") {
                port.width = width;
            }
            if let Some(port) = component.outputs.get_mut("outValue") {
                port.width = width;
                port.signal = Signal::new(port.signal.value, width);
            }
        }
        kind if mux_data_count(kind).is_some() => {
            for (name, port) in component.inputs.iter_mut() {
                if name.starts_with("input") {
                    port.width = width;
                }
            }
            if let Some(port) = component.outputs.get_mut("outputValue") {
                port.width = width;
                port.signal = Signal::new(port.signal.value, width);
            }
        }
        _ => {}
    }
}

/// Reset a multiplexer to unbound once every data input and every output
/// edge is gone.
fn release_mux_if_disconnected(component: &mut Component) {
    let data_connected = component
        .inputs
        .iter()
        .any(|(name, port)| name.starts_with("input") && port.source.is_some());
    let output_connected = component
        .outputs
        .get("outputValue")
        .map(|port| !port.targets.is_empty())
        .unwrap_or(false);
    if !data_connected && !output_connected {
        apply_width_lock(component, 0);
    }
}
