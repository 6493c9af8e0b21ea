use super::MAX_EVAL_CYCLES;
use crate::core::events::{self, Payload};
use crate::core::graph::CircuitGraph;
use crate::core::types::ComponentId;
use indexmap::IndexSet;
use log::debug;

/// BFS fixed-point evaluation, the path that tolerates feedback cycles with
/// a stable equilibrium.
///
/// The starting set is taken as given; with an empty slice it falls back to
/// the primary inputs, then to the ProgramCounters. A graph with neither
/// returns `Ok(false)` (nothing can start a wave). Each wave evaluates its
/// components and schedules the downstream neighbours of everything that
/// changed; exceeding the tick cap declares the graph unstable, also
/// `Ok(false)`.
pub fn event_driven_eval(
    graph: &mut CircuitGraph,
    starting: &[ComponentId],
) -> Result<bool, String> {
    let mut wave: Vec<ComponentId> = if !starting.is_empty() {
        starting.to_vec()
    } else {
        graph.primary_inputs().to_vec()
    };
    if wave.is_empty() {
        wave = graph.program_counters();
    }
    if wave.is_empty() {
        debug!("event-driven: no starting point");
        return Ok(false);
    }

    let cap = MAX_EVAL_CYCLES * (graph.len() + graph.instruction_word_total());
    let mut ticks = 0usize;

    while !wave.is_empty() {
        ticks += 1;
        if ticks > cap {
            debug!("event-driven: tick cap {} exceeded, graph is unstable", cap);
            return Ok(false);
        }

        let mut next = IndexSet::new();
        for id in &wave {
            if !graph.contains(*id) {
                continue;
            }
            if graph.eval_component(*id)? {
                for target in graph.downstream(*id) {
                    next.insert(target);
                }
            }
        }
        events::emit(
            events::VIEW_COMPONENTS_UPDATED,
            Payload::Components(wave.clone()),
        );
        wave = next.into_iter().collect();
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::Signal;
    use crate::core::types::Kind;

    #[test]
    fn test_propagates_only_downstream_of_changes() {
        let mut graph = CircuitGraph::new();
        let a = graph.add_component(Kind::Input).unwrap();
        let not = graph.add_component(Kind::Not).unwrap();
        let out = graph.add_component(Kind::Output).unwrap();
        graph.add_connection(a, "outValue", not, "input").unwrap();
        graph.add_connection(not, "outValue", out, "input").unwrap();

        assert!(event_driven_eval(&mut graph, &[]).unwrap());
        assert_eq!(graph.output_signal(out, "outValue").unwrap().value, 1);

        graph.set_input(a, Signal::bit(1)).unwrap();
        assert!(event_driven_eval(&mut graph, &[a]).unwrap());
        assert_eq!(graph.output_signal(out, "outValue").unwrap().value, 0);
    }

    #[test]
    fn test_empty_graph_has_no_starting_point() {
        let mut graph = CircuitGraph::new();
        assert!(!event_driven_eval(&mut graph, &[]).unwrap());
    }

    #[test]
    fn test_graph_without_inputs_starts_from_program_counters() {
        let mut graph = CircuitGraph::new();
        let pc = graph.add_component(Kind::ProgramCounter).unwrap();
        // A lone counter evaluates (and wraps to 0) without erroring.
        assert!(event_driven_eval(&mut graph, &[]).unwrap());
        assert_eq!(graph.output_signal(pc, "outValue").unwrap().value, 0);
    }
}
