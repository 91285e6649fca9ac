//! End-to-end propagation scenarios through the public `Circuit` API.

use std::sync::Arc;

use tapsim_core::{
    components::{ComponentType, SolverKind, SETTLE_DELAY},
    circuit::EventQueue,
    Circuit, CircuitConfig, ComponentId, Event, PinId, Signal, TapIn, TapOut, Time, WIRE_TYPE,
};

fn circuit() -> Arc<Circuit> {
    Circuit::instantiated(CircuitConfig::new())
}

fn pins(circuit: &Circuit, n: usize) -> Vec<PinId> {
    (0..n).map(|_| circuit.add_pin(Signal::LOW).unwrap()).collect()
}

#[test]
fn wire_broadcasts_to_every_other_pin() {
    let circuit = circuit();
    let p = pins(&circuit, 3);
    circuit.add_component(&p, WIRE_TYPE).unwrap();

    let s = Signal::new(0x1234, 0x4321);
    circuit.push_event(5, s, p[0]).unwrap();
    circuit.process_to(6).unwrap();

    for &pin in &p[1..] {
        let event = circuit.get_pin_event(pin).unwrap();
        assert_eq!(event.state, s);
        assert_eq!(event.time, 6);
    }
    // the wire does not echo back onto the driving pin
    assert_eq!(circuit.event_count(), 0);
}

#[test]
fn adder_settles_after_delay() {
    let circuit = circuit();
    let adder = circuit.add_component_type(ComponentType::adder()).unwrap();
    let p = pins(&circuit, 4);
    circuit.add_component(&p, adder).unwrap();

    circuit.push_event(10, Signal::splat(1), p[0]).unwrap();
    circuit.push_event(10, Signal::splat(2), p[1]).unwrap();

    circuit.process_to(10 + SETTLE_DELAY - 1).unwrap();
    assert_eq!(circuit.get_pin_state(p[2]), Some(Signal::LOW));

    circuit.process_to(10 + SETTLE_DELAY).unwrap();
    assert_eq!(circuit.get_pin_state(p[2]), Some(Signal::splat(3)));
    assert_eq!(circuit.get_pin_state(p[3]), Some(Signal::LOW));
}

#[test]
fn adder_overflow_drives_carry() {
    let circuit = circuit();
    let adder = circuit.add_component_type(ComponentType::adder()).unwrap();
    let p = pins(&circuit, 4);
    circuit.add_component(&p, adder).unwrap();

    circuit.push_event(0, Signal::new(u16::MAX, 1), p[0]).unwrap();
    circuit.push_event(0, Signal::new(1, 1), p[1]).unwrap();
    circuit.process_to(SETTLE_DELAY).unwrap();

    assert_eq!(circuit.get_pin_state(p[2]), Some(Signal::new(0, 2)));
    assert_eq!(circuit.get_pin_state(p[3]), Some(Signal::new(u16::MAX, 0)));
}

#[test]
fn process_to_stops_at_boundary() {
    let circuit = circuit();
    let p = pins(&circuit, 1);
    circuit.push_event(7, Signal::splat(7), p[0]).unwrap();
    circuit.push_event(8, Signal::splat(8), p[0]).unwrap();

    assert_eq!(circuit.process_to(7).unwrap(), 1);
    assert_eq!(circuit.get_pin_state(p[0]), Some(Signal::splat(7)));
    assert_eq!(circuit.next_event_time(), Some(8));
}

#[test]
fn wire_chain_propagates_hop_by_hop() {
    let circuit = circuit();
    let p = pins(&circuit, 4);
    for pair in p.windows(2) {
        circuit.add_component(pair, WIRE_TYPE).unwrap();
    }

    circuit.push_event(100, Signal::HIGH, p[0]).unwrap();
    circuit.process_to(102).unwrap();
    assert_eq!(circuit.get_pin_state(p[2]), Some(Signal::HIGH));
    assert_eq!(circuit.get_pin_state(p[3]), Some(Signal::LOW));

    circuit.process_to(103).unwrap();
    assert_eq!(circuit.get_pin_state(p[3]), Some(Signal::HIGH));
}

#[test]
fn rejected_component_leaves_circuit_untouched() {
    let circuit = circuit();
    let adder = circuit.add_component_type(ComponentType::adder()).unwrap();
    let p = pins(&circuit, 4);

    let before_pins = circuit.get_all_pin_connections();
    let before_components = circuit.get_all_component_connections();

    let err = circuit.add_component(&[p[0], p[0]], WIRE_TYPE).unwrap_err();
    assert!(err.is_validation());
    let err = circuit.add_component(&[p[0], PinId(40)], WIRE_TYPE).unwrap_err();
    assert!(err.is_validation());
    let err = circuit.add_component(&p[..3], adder).unwrap_err();
    assert!(err.is_validation());
    assert!(circuit.add_component(&[], WIRE_TYPE).is_err());

    assert_eq!(circuit.get_all_pin_connections(), before_pins);
    assert_eq!(circuit.get_all_component_connections(), before_components);
}

#[test]
fn removed_labels_are_reused_lowest_first() {
    let circuit = circuit();
    let p = pins(&circuit, 3);
    assert_eq!(p, vec![PinId(0), PinId(1), PinId(2)]);

    assert!(circuit.remove_pin(PinId(1)));
    assert!(!circuit.has_pin(PinId(1)));
    assert_eq!(circuit.add_pin(Signal::LOW).unwrap(), PinId(1));
    assert_eq!(circuit.add_pin(Signal::LOW).unwrap(), PinId(3));

    let a = circuit.add_component(&[p[0], p[2]], WIRE_TYPE).unwrap();
    let b = circuit.add_component(&[p[0], PinId(1)], WIRE_TYPE).unwrap();
    assert_eq!((a, b), (ComponentId(0), ComponentId(1)));
    assert!(circuit.remove_component(a));
    assert_eq!(circuit.add_component(&[PinId(3), p[2]], WIRE_TYPE).unwrap(), ComponentId(0));
}

#[test]
fn moved_component_follows_new_pins() {
    let circuit = circuit();
    let p = pins(&circuit, 4);
    let wire = circuit.add_component(&[p[0], p[1]], WIRE_TYPE).unwrap();

    circuit.move_component(wire, &[p[2], p[3]]).unwrap();
    assert!(circuit.get_pin_connections(p[0]).is_empty());
    assert_eq!(circuit.get_pin_connections(p[2]), vec![wire]);
    assert_eq!(circuit.get_component_connections(wire), vec![p[2], p[3]]);

    circuit.push_event(1, Signal::HIGH, p[0]).unwrap();
    circuit.push_event(1, Signal::HIGH, p[2]).unwrap();
    circuit.process_to(10).unwrap();
    assert_eq!(circuit.get_pin_state(p[1]), Some(Signal::LOW));
    assert_eq!(circuit.get_pin_state(p[3]), Some(Signal::HIGH));
}

fn invert(inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId) {
    let state = inputs[0].state;
    queue.insert(Event::from_component(
        now + 2,
        Signal::new(!state.left, !state.right),
        inputs[1].pin,
        component,
    ));
}

#[test]
fn custom_solver_runs_in_propagation() {
    let circuit = circuit();
    let inverter = ComponentType::new("Inverter", "invert", SolverKind::Custom(invert))
        .with_pin_count(2)
        .with_sensitivity(vec![0]);
    let index = circuit.add_component_type(inverter).unwrap();
    let p = pins(&circuit, 2);
    circuit.add_component(&p, index).unwrap();

    circuit.push_event(4, Signal::new(0x00FF, 0xFF00), p[0]).unwrap();
    circuit.process_to(6).unwrap();
    assert_eq!(circuit.get_pin_state(p[1]), Some(Signal::new(0xFF00, 0x00FF)));
    assert_eq!(
        circuit.get_component_type(ComponentId(0)).unwrap().name,
        "Inverter"
    );
}

#[test]
fn taps_stream_through_adder() {
    let circuit = Circuit::instantiated(CircuitConfig::new().with_tick_rate(16));
    let adder = circuit.add_component_type(ComponentType::adder()).unwrap();
    let p = pins(&circuit, 4);
    circuit.add_component(&p, adder).unwrap();

    let mut tap_in = TapIn::new(Arc::clone(&circuit), vec![p[0]]);
    let mut tap_out = TapOut::new(Arc::clone(&circuit), vec![p[2]]);
    assert!(tap_in.start());
    assert!(tap_out.start());

    let frames = [-0.5f32, 0.0, 0.5];
    let mut out = [9.0f32; 3];
    assert_eq!(tap_in.mix(&frames), 3);
    assert_eq!(tap_out.process(&mut out), 3);

    // in1 stays at level 0, so out follows in0 one frame late
    assert!((out[0] + 1.0).abs() < 1e-3);
    assert!((out[1] + 0.5).abs() < 1e-3);
    assert!((out[2] - 0.0).abs() < 1e-3);
}
