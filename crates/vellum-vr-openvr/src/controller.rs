//! Live set of hand-role controllers, diffed against the hardware role
//! mapping on every connectivity-relevant event.

use std::sync::Arc;

use vellum_vr::{Controller, DeviceIndex, Event, EventSink, Hand, VrRuntime};

#[derive(Default)]
pub(crate) struct ControllerRegistry {
    controllers: Vec<Arc<Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controllers(&self) -> &[Arc<Controller>] {
        &self.controllers
    }

    pub fn find(&self, device: DeviceIndex) -> Option<&Arc<Controller>> {
        self.controllers.iter().find(|c| c.index == device)
    }

    pub fn contains(&self, device: DeviceIndex) -> bool {
        self.find(device).is_some()
    }

    /// Re-reads the left/right role mapping and diffs the tracked set against
    /// it. Removals are fully processed before additions; each removal event
    /// takes over the registry's handle so the controller survives delivery.
    pub fn refresh<R: VrRuntime>(&mut self, runtime: &R, sink: &mut dyn EventSink) {
        let mapped = [
            runtime.device_for_hand(Hand::Left),
            runtime.device_for_hand(Hand::Right),
        ];

        let mut i = self.controllers.len();
        while i > 0 {
            i -= 1;
            if !mapped.contains(&Some(self.controllers[i].index)) {
                let controller = self.controllers.remove(i);
                sink.push(Event::ControllerRemoved { controller });
            }
        }

        for device in mapped.into_iter().flatten() {
            if let Some(controller) = self.add(device) {
                sink.push(Event::ControllerAdded { controller });
            }
        }
    }

    /// No-op returning `None` when the device is already tracked, so a
    /// redundantly fired role event cannot create duplicates.
    fn add(&mut self, device: DeviceIndex) -> Option<Arc<Controller>> {
        if self.contains(device) {
            return None;
        }
        let controller = Arc::new(Controller { index: device });
        self.controllers.push(Arc::clone(&controller));
        Some(controller)
    }
}
