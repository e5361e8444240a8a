use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::models::touch::TouchEvent;
use crate::traits::touch_source::TouchSink;

/// Whether `pop` waits for an event or returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopMode {
    Blocking,
    NonBlocking,
}

#[derive(Debug, Default)]
struct BusState {
    queue: VecDeque<TouchEvent>,
    closed: bool,
}

#[derive(Debug, Default)]
struct BusInner {
    state: Mutex<BusState>,
    available: Condvar,
}

/// Unbounded FIFO of touch events between the touch source and the orchestrator.
///
/// Cloning yields another handle to the same queue. The touch source is the
/// only producer and the orchestrator the only consumer; every event is
/// delivered at most once.
///
/// Closing the bus wakes a blocked consumer. Events queued before `close`
/// are still delivered; after that `pop` returns `None`.
#[derive(Debug, Clone, Default)]
pub struct TouchEventBus {
    inner: Arc<BusInner>,
}

impl TouchEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Never blocks; events pushed after `close` are dropped.
    pub fn push(&self, event: TouchEvent) {
        let mut state = self.inner.state.lock();
        if state.closed {
            log::debug!("touch bus closed, dropping touch at {},{}", event.x, event.y);
            return;
        }
        state.queue.push_back(event);
        drop(state);
        self.inner.available.notify_one();
    }

    /// Take the oldest event.
    ///
    /// In `Blocking` mode this waits until an event arrives or the bus is
    /// closed. Returns `None` when nothing is queued and either the mode is
    /// `NonBlocking` or the bus is closed.
    pub fn pop(&self, mode: PopMode) -> Option<TouchEvent> {
        let mut state = self.inner.state.lock();
        loop {
            if let Some(event) = state.queue.pop_front() {
                return Some(event);
            }
            if state.closed || mode == PopMode::NonBlocking {
                return None;
            }
            self.inner.available.wait(&mut state);
        }
    }

    /// Shorthand for a non-blocking `pop`.
    pub fn try_pop(&self) -> Option<TouchEvent> {
        self.pop(PopMode::NonBlocking)
    }

    /// Discard every queued event and return how many were dropped.
    ///
    /// Events pushed after the lock is released are kept for the next wait.
    pub fn drain(&self) -> usize {
        let mut state = self.inner.state.lock();
        let count = state.queue.len();
        state.queue.clear();
        count
    }

    /// Stop accepting events and wake any blocked consumer.
    pub fn close(&self) {
        self.inner.state.lock().closed = true;
        self.inner.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Producer-side callback for a `TouchSource`.
    pub fn sink(&self) -> TouchSink {
        let bus = self.clone();
        Arc::new(move |event: TouchEvent| {
            log::debug!("screen pressed at {},{}, enqueuing", event.x, event.y);
            bus.push(event);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let bus = TouchEventBus::new();
        bus.push(TouchEvent::new(1, 1));
        bus.push(TouchEvent::new(2, 2));
        bus.push(TouchEvent::new(3, 3));

        assert_eq!(bus.len(), 3);
        assert_eq!(bus.pop(PopMode::Blocking), Some(TouchEvent::new(1, 1)));
        assert_eq!(bus.try_pop(), Some(TouchEvent::new(2, 2)));
        assert_eq!(bus.try_pop(), Some(TouchEvent::new(3, 3)));
        assert!(bus.is_empty());
    }

    #[test]
    fn non_blocking_pop_on_empty() {
        let bus = TouchEventBus::new();
        assert_eq!(bus.pop(PopMode::NonBlocking), None);
    }

    #[test]
    fn drain_discards_everything() {
        let bus = TouchEventBus::new();
        for i in 0..5 {
            bus.push(TouchEvent::new(i, i));
        }

        assert_eq!(bus.drain(), 5);
        assert!(bus.is_empty());
        assert_eq!(bus.drain(), 0);
        assert_eq!(bus.try_pop(), None);
    }

    #[test]
    fn push_after_drain_is_kept() {
        let bus = TouchEventBus::new();
        bus.push(TouchEvent::new(1, 1));
        bus.drain();
        bus.push(TouchEvent::new(2, 2));

        assert_eq!(bus.try_pop(), Some(TouchEvent::new(2, 2)));
    }

    #[test]
    fn blocking_pop_waits_for_producer() {
        let bus = TouchEventBus::new();
        let producer = bus.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(TouchEvent::new(10, 20));
        });

        assert_eq!(bus.pop(PopMode::Blocking), Some(TouchEvent::new(10, 20)));
        handle.join().unwrap();
    }

    #[test]
    fn close_wakes_blocked_consumer() {
        let bus = TouchEventBus::new();
        let closer = bus.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        assert_eq!(bus.pop(PopMode::Blocking), None);
        assert!(bus.is_closed());
        handle.join().unwrap();
    }

    #[test]
    fn close_still_delivers_queued_events() {
        let bus = TouchEventBus::new();
        bus.push(TouchEvent::new(5, 5));
        bus.close();
        bus.push(TouchEvent::new(6, 6));

        assert_eq!(bus.pop(PopMode::Blocking), Some(TouchEvent::new(5, 5)));
        assert_eq!(bus.pop(PopMode::Blocking), None);
    }

    #[test]
    fn sink_pushes_into_bus() {
        let bus = TouchEventBus::new();
        let sink = bus.sink();
        sink(TouchEvent::new(7, 8));

        assert_eq!(bus.try_pop(), Some(TouchEvent::new(7, 8)));
    }

    #[test]
    fn events_from_another_thread_arrive_once_in_order() {
        let bus = TouchEventBus::new();
        let sink = bus.sink();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                sink(TouchEvent::new(i, 0));
            }
        });
        handle.join().unwrap();

        let received: Vec<i32> = std::iter::from_fn(|| bus.try_pop()).map(|e| e.x).collect();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
