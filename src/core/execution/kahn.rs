use crate::core::events::{self, Payload};
use crate::core::graph::CircuitGraph;
use crate::core::types::{ComponentId, Kind};
use indexmap::IndexMap;
use log::debug;

/// Kahn's algorithm over distinct component dependencies, organised into
/// per-tick frontiers.
///
/// A component's in-degree counts each distinct upstream component once,
/// however many of its input ports that neighbour feeds. Register sources
/// are excluded so that feedback loops closed through a register do not
/// count as cycles. Returns `None` when a non-register-mediated cycle (or a
/// region unreachable from the primary inputs) leaves residual in-degree.
pub fn build_tick_map(graph: &CircuitGraph) -> Option<Vec<Vec<ComponentId>>> {
    let ids = graph.component_ids();
    let mut in_degree: IndexMap<ComponentId, usize> = ids.iter().map(|id| (*id, 0)).collect();

    for id in &ids {
        if graph.component_kind(*id) == Some(Kind::Register) {
            continue;
        }
        for target in graph.downstream(*id) {
            if let Some(degree) = in_degree.get_mut(&target) {
                *degree += 1;
            }
        }
    }

    let mut tick_map = Vec::new();
    let mut frontier: Vec<ComponentId> = graph.primary_inputs().to_vec();
    let mut evaluated = 0usize;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for id in &frontier {
            evaluated += 1;
            if graph.component_kind(*id) == Some(Kind::Register) {
                // The register's downstream never counted it.
                continue;
            }
            for target in graph.downstream(*id) {
                if let Some(degree) = in_degree.get_mut(&target) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(target);
                    }
                }
            }
        }
        tick_map.push(frontier);
        frontier = next;
    }

    let residual = in_degree.values().filter(|degree| **degree > 0).count();
    if residual > 0 {
        debug!(
            "kahn: {} components with residual in-degree after {} evaluated",
            residual, evaluated
        );
        return None;
    }
    Some(tick_map)
}

/// Topological wavefront evaluation.
///
/// Returns `Ok(false)` when the graph contains a cycle not mediated by a
/// register; callers fall back to the event-driven evaluator. The optional
/// observer runs after each tick with the tick index and the frontier just
/// evaluated, for animated playback.
pub fn kahn_frontier_eval(
    graph: &mut CircuitGraph,
    mut observer: Option<&mut dyn FnMut(usize, &[ComponentId])>,
) -> Result<bool, String> {
    let Some(tick_map) = build_tick_map(graph) else {
        return Ok(false);
    };

    for (tick, frontier) in tick_map.iter().enumerate() {
        for id in frontier {
            graph.eval_component(*id)?;
        }
        events::emit(
            events::VIEW_COMPONENTS_UPDATED,
            Payload::Components(frontier.clone()),
        );
        if let Some(callback) = observer.as_deref_mut() {
            callback(tick, frontier);
        }
    }
    Ok(true)
}
