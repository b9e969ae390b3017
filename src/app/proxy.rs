//! Abstraction over the event loop's event sender.

use super::events::UserEvent;
use tao::event_loop::EventLoopProxy;

/// Fire-and-forget sender for backend-to-UI events. Abstracted as a trait
/// so tests can capture events instead of needing a running event loop.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

impl EventProxy for EventLoopProxy<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // The loop only disappears at shutdown; a failed send is not worth
        // more than a log line.
        if let Err(e) = self.send_event(event) {
            tracing::warn!("Failed to send event to event loop: {}", e);
        }
    }
}
