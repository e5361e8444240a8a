pub mod touch_event_bus;
