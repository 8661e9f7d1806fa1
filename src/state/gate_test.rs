use super::*;

fn session(authorized: bool, room_id: Option<i64>) -> RoomSession {
    RoomSession {
        room_uuid: "room".to_owned(),
        numeric_room_id: room_id,
        title: String::new(),
        authorized,
    }
}

#[test]
fn ready_requires_all_three_inputs() {
    let full = session(true, Some(1));
    assert!(is_ready(true, Some(&full)));
    assert!(!is_ready(false, Some(&full)));
    assert!(!is_ready(true, Some(&session(false, Some(1)))));
    assert!(!is_ready(true, Some(&session(true, None))));
    assert!(!is_ready(true, None));
}

#[test]
fn ready_is_false_whenever_an_input_is_false_in_any_order() {
    // Every ordering of flipping the three inputs on, then off again.
    let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let mut gate = ConnectionGate::new();
        let mut inputs = [false; 3];
        for step in order.iter().chain(order.iter()) {
            inputs[*step] = !inputs[*step];
            let current = session(inputs[1], inputs[2].then_some(9));
            gate.update(inputs[0], Some(&current));
            assert_eq!(gate.is_ready(), inputs.iter().all(|v| *v), "order {order:?} inputs {inputs:?}");
        }
    }
}

#[test]
fn update_reports_only_transitions() {
    let mut gate = ConnectionGate::new();
    let full = session(true, Some(1));
    assert_eq!(gate.update(false, Some(&full)), None);
    assert_eq!(gate.update(true, Some(&full)), Some(true));
    assert_eq!(gate.update(true, Some(&full)), None);
    assert_eq!(gate.update(false, Some(&full)), Some(false));
}
