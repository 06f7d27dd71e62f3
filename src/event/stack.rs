//! LIFO container of pending events.

use super::Event;

/// Last-in, first-out store of events awaiting processing.
#[derive(Debug, Clone, Default)]
pub struct EventStack {
    events: Vec<Event>,
}

impl EventStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event on top.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Remove and return the top event.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop()
    }

    /// Top event without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Whether no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Drop every pending event, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.events.len();
        self.events.clear();
        discarded
    }

    /// Pending events from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Intent;

    fn event(sequence: u64) -> Event {
        Event::stamp(Intent::end_turn(1), sequence)
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = EventStack::new();
        stack.push(event(1));
        stack.push(event(2));
        stack.push(event(3));

        assert_eq!(stack.peek().map(Event::sequence), Some(3));
        assert_eq!(stack.pop().map(|e| e.sequence()), Some(3));
        assert_eq!(stack.pop().map(|e| e.sequence()), Some(2));
        assert_eq!(stack.pop().map(|e| e.sequence()), Some(1));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_empty_and_len() {
        let mut stack = EventStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);

        stack.push(event(0));
        assert!(!stack.is_empty());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_pop_empty_is_none() {
        let mut stack = EventStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.peek().is_none());
    }

    #[test]
    fn test_clear_reports_discarded() {
        let mut stack = EventStack::new();
        for seq in 0..4 {
            stack.push(event(seq));
        }
        assert_eq!(stack.clear(), 4);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_iter_bottom_to_top() {
        let mut stack = EventStack::new();
        stack.push(event(5));
        stack.push(event(6));
        let order: Vec<u64> = stack.iter().map(Event::sequence).collect();
        assert_eq!(order, vec![5, 6]);
    }
}
