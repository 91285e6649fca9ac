//! Wire: a variable-arity component that shorts all its pins together.

use crate::circuit::{ComponentId, Event, EventQueue, Time};

/// Delay between a wire seeing a change and its other pins following.
pub const WIRE_DELAY: Time = 1;

/// Re-emit the triggering pin's state on every other pin of the wire.
///
/// The trigger is the input applied exactly at `now`. If none matches, the
/// earliest input stamped after `now` is used instead; if there is none of
/// those either, the wire emits nothing.
pub fn solve(inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId) {
    let trigger = inputs
        .iter()
        .find(|input| input.time == now)
        .or_else(|| {
            inputs
                .iter()
                .filter(|input| input.time > now)
                .min_by_key(|input| input.time)
        })
        .copied();

    let Some(trigger) = trigger else {
        tracing::trace!(%component, now, "wire has no triggering input");
        return;
    };

    let time = trigger.time + WIRE_DELAY;
    for input in inputs.iter().filter(|input| input.pin != trigger.pin) {
        queue.insert(Event::from_component(time, trigger.state, input.pin, component));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{PinId, Signal};

    fn drain(queue: &mut EventQueue) -> Vec<Event> {
        std::iter::from_fn(|| queue.pop_minimum()).collect()
    }

    #[test]
    fn test_broadcasts_trigger_to_other_pins() {
        let inputs = [
            Event::new(0, Signal::LOW, PinId(0)),
            Event::new(5, Signal::HIGH, PinId(1)),
            Event::new(2, Signal::LOW, PinId(2)),
        ];
        let mut queue = EventQueue::new();
        solve(&inputs, &mut queue, 5, ComponentId(3));

        let out = drain(&mut queue);
        assert_eq!(out.len(), 2);
        for event in &out {
            assert_eq!(event.time, 6);
            assert_eq!(event.state, Signal::HIGH);
            assert_eq!(event.source, Some(ComponentId(3)));
            assert_ne!(event.pin, PinId(1));
        }
    }

    #[test]
    fn test_falls_back_to_earliest_later_input() {
        let inputs = [
            Event::new(9, Signal::splat(9), PinId(0)),
            Event::new(7, Signal::splat(7), PinId(1)),
            Event::new(1, Signal::LOW, PinId(2)),
        ];
        let mut queue = EventQueue::new();
        solve(&inputs, &mut queue, 4, ComponentId(0));

        let out = drain(&mut queue);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.state == Signal::splat(7) && e.time == 8));
    }

    #[test]
    fn test_no_trigger_emits_nothing() {
        let inputs = [Event::new(1, Signal::HIGH, PinId(0)), Event::new(2, Signal::HIGH, PinId(1))];
        let mut queue = EventQueue::new();
        solve(&inputs, &mut queue, 3, ComponentId(0));
        assert!(queue.is_empty());
    }
}
