use std::sync::Arc;

use crate::types::{Button, Controller};

/// Typed records handed to the engine's event queue. Controller events carry
/// a shared handle so the controller outlives delivery even if the registry
/// drops it in the meantime.
#[derive(Debug, Clone)]
pub enum Event {
    ControllerAdded { controller: Arc<Controller> },
    ControllerRemoved { controller: Arc<Controller> },
    ControllerPressed { controller: Arc<Controller>, button: Button },
    ControllerReleased { controller: Arc<Controller>, button: Button },
    Focus { focused: bool },
}

pub trait EventSink {
    fn push(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn push(&mut self, event: Event) {
        Vec::push(self, event);
    }
}
