use crate::core::types::ComponentId;
use std::cell::RefCell;
use std::collections::HashMap;

/// Published by a component whenever one of its inputs is (re)wired,
/// disconnected, or its externally set value changes.
pub const MODEL_INPUT_CHANGED: &str = "model:input_changed";
/// Published by the evaluators with the handles just evaluated this tick.
pub const VIEW_COMPONENTS_UPDATED: &str = "view:components_updated";
/// Published when an InstructionMemory's word list is loaded.
pub const LOGIC_INSTRUCTION_COUNT: &str = "logic:instruction_count";
/// Published by a ProgramCounter whenever its output actually changed.
pub const NEW_CYCLE: &str = "newCycle";

/// Payload carried by a bus event.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Component(ComponentId),
    Components(Vec<ComponentId>),
    Count(usize),
}

type Handler = Box<dyn FnMut(&Payload)>;

/// Synchronous publish/subscribe channel shared by the model and the
/// evaluator facade.
///
/// Handlers are invoked inline from `emit`; there is no queueing and no
/// threading. The `manual` flag mutes every `emit` so that wiring performed
/// inside a controlled evaluation pass (custom-component construction, width
/// adaptation) does not recursively spawn new evaluations.
struct EventBus {
    handlers: HashMap<String, Vec<Handler>>,
    manual: bool,
}

impl EventBus {
    fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            manual: false,
        }
    }
}

thread_local! {
    static BUS: RefCell<EventBus> = RefCell::new(EventBus::new());
}

/// Register a handler for a topic.
pub fn subscribe(topic: &str, handler: impl FnMut(&Payload) + 'static) {
    BUS.with(|bus| {
        bus.borrow_mut()
            .handlers
            .entry(topic.to_string())
            .or_default()
            .push(Box::new(handler));
    });
}

/// Invoke every handler subscribed to `topic`. No-op while the bus is muted.
pub fn emit(topic: &str, payload: Payload) {
    // The topic's handler list is moved out for the duration of the dispatch
    // so handlers may themselves subscribe or emit without re-borrowing the
    // bus. A nested emit on the same topic sees an empty list and returns.
    let taken = BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        if bus.manual {
            return None;
        }
        bus.handlers.get_mut(topic).map(std::mem::take)
    });

    let Some(mut handlers) = taken else {
        return;
    };

    for handler in handlers.iter_mut() {
        handler(&payload);
    }

    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let slot = bus.handlers.entry(topic.to_string()).or_default();
        // Handlers subscribed during dispatch land behind the originals.
        handlers.append(slot);
        *slot = handlers;
    });
}

/// Set or clear the `manual` mute flag, returning the previous value.
pub fn set_manual(manual: bool) -> bool {
    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        std::mem::replace(&mut bus.manual, manual)
    })
}

/// Whether the bus is currently muted.
pub fn manual() -> bool {
    BUS.with(|bus| bus.borrow().manual)
}

/// Run `f` with the bus muted, restoring the previous flag afterwards.
pub fn with_muted<T>(f: impl FnOnce() -> T) -> T {
    let previous = set_manual(true);
    let result = f();
    set_manual(previous);
    result
}

/// Drop every subscription and clear the mute flag.
pub fn clear() {
    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        bus.handlers.clear();
        bus.manual = false;
    });
}
