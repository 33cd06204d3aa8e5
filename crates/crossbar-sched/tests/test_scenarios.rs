//! Scheduling scenarios against the physical model.

use std::f64::consts::PI;

use crossbar_model::{
    CrossbarModel, ModelError, PlacementEntry, QubitId, QubitKind, RotationAxis, Site, Topology,
};
use crossbar_ops::{
    AncillaSide, Direction, Measure, Move, Operation, ParkSide, Program, Rotation, Slot,
};
use crossbar_sched::{SchedError, Scheduler};

fn mv(q: u32, direction: Direction, line: u32) -> Operation {
    Operation::Move(Move::new(QubitId(q), direction, line))
}

fn placed(entries: &[(u32, QubitKind, (i32, i32))]) -> Vec<PlacementEntry> {
    entries
        .iter()
        .map(|&(id, kind, (i, j))| PlacementEntry {
            id: QubitId(id),
            kind,
            site: Site::new(i, j),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Simple shuttle
// ---------------------------------------------------------------------------

#[test]
fn simple_shuttle_opens_exactly_one_barrier() {
    let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
    let program = Program::from_slots(vec![Slot::single(mv(0, Direction::Right, 1))]);
    let scheduler = Scheduler::new(&program);

    // Cycle 0 commits the line assignment; the qubit has not moved yet.
    scheduler.run_cycle(&mut model, 0).unwrap();
    assert!(model.is_v_barrier_down(0));
    assert!(model.is_v_barrier_up(1));
    assert!(model.is_v_barrier_up(2));
    for i in 0..3 {
        assert!(model.is_h_barrier_up(i));
    }
    // Destination diagonal strictly above the origin's before the move.
    assert!(model.bias(1).unwrap() > model.bias(0).unwrap());
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));

    // Cycle 1 carries the qubit over.
    scheduler.run_cycle(&mut model, 1).unwrap();
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 1));
}

#[test]
fn shuttle_holds_idle_neighbors_in_place() {
    // A full checkerboard around the moving qubit: the solve must add
    // hold orderings so nobody drifts through the opened barrier.
    let mut model = CrossbarModel::new(Topology::square(4, 4, 4)).unwrap();
    let program = Program::from_slots(vec![Slot::single(mv(0, Direction::Right, 1))]);
    let scheduler = Scheduler::new(&program);

    let before: Vec<(QubitId, Site)> = model.iter_qubits().map(|q| (q.id, q.site)).collect();
    scheduler.validate(&mut model).unwrap();
    for (id, site) in before {
        let expected = if id == QubitId(0) {
            Site::new(0, 1)
        } else {
            site
        };
        assert_eq!(model.qubit(id).unwrap().site, expected);
    }
}

// ---------------------------------------------------------------------------
// Conflicting parallel operations
// ---------------------------------------------------------------------------

#[test]
fn head_on_moves_conflict() {
    // q0 and q1 race for the same empty site.
    let mut model = CrossbarModel::new(Topology::square(4, 2, 0)).unwrap();
    let program = Program::from_slots(vec![Slot::parallel(vec![
        mv(0, Direction::Right, 10),
        mv(1, Direction::Left, 11),
    ])]);
    let scheduler = Scheduler::new(&program);
    let err = scheduler.validate(&mut model).unwrap_err();
    assert!(matches!(err, SchedError::ParallelConflict { cycle: 0, .. }));
    assert!(err.to_string().contains("Conflict between parallel operations"));
    // No mutation beyond the last committed cycle — which is none.
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));
    assert_eq!(model.qubit(QubitId(1)).unwrap().site, Site::new(0, 2));
    assert!(model.is_v_barrier_up(0));
}

#[test]
fn contradictory_bias_directions_conflict() {
    // Distant qubits whose shuttles demand opposite orderings of the
    // same two diagonals: q0 (0,0) → (0,1) wants d0 < d1, q1 (2,3) →
    // (2,2) wants d1 < d0.
    let topology = Topology::grid(4, 4, 2, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (2, 3)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let program = Program::from_slots(vec![Slot::parallel(vec![
        mv(0, Direction::Right, 5),
        mv(1, Direction::Left, 6),
    ])]);
    let scheduler = Scheduler::new(&program);
    let err = scheduler.validate(&mut model).unwrap_err();
    match err {
        SchedError::ParallelConflict { cycle, lines } => {
            assert_eq!(cycle, 0);
            assert_eq!(lines, vec![5, 6]);
        }
        other => panic!("expected parallel conflict, got {other}"),
    }
}

#[test]
fn compatible_parallel_moves_commit() {
    // Two shuttles through the same barrier on different rows, pulling
    // the same way on disjoint diagonal pairs.
    let topology = Topology::grid(4, 4, 2, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (1, 1)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let program = Program::from_slots(vec![Slot::parallel(vec![
        mv(0, Direction::Right, 1),
        mv(1, Direction::Left, 2),
    ])]);
    let scheduler = Scheduler::new(&program);
    scheduler.validate(&mut model).unwrap();
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 1));
    assert_eq!(model.qubit(QubitId(1)).unwrap().site, Site::new(1, 0));
}

// ---------------------------------------------------------------------------
// Idle-qubit adjacency safety
// ---------------------------------------------------------------------------

#[test]
fn opened_barrier_between_idle_qubits_aborts() {
    // q1 and q2 idle side by side across the barrier q0's move opens.
    let topology = Topology::grid(4, 4, 3, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (2, 0)),
        (2, QubitKind::Data, (2, 1)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let program = Program::from_slots(vec![Slot::single(mv(0, Direction::Right, 1))]);
    let scheduler = Scheduler::new(&program);
    let err = scheduler.validate(&mut model).unwrap_err();
    assert!(matches!(err, SchedError::HorizontallyAdjacent(0)));
}

// ---------------------------------------------------------------------------
// Rotations
// ---------------------------------------------------------------------------

#[test]
fn rotation_quiets_device_and_rotates() {
    let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
    let program = Program::from_slots(vec![Slot::single(Operation::Rotation(Rotation::new(
        QubitId(0),
        RotationAxis::X,
        PI,
        1,
    )))]);
    let scheduler = Scheduler::new(&program);

    scheduler.run_cycle(&mut model, 0).unwrap();
    // Pulse active, device quiet.
    assert!(model.wave().is_some());
    assert!(model.bias_lines().iter().all(|(_, v)| v == 0));

    scheduler.run_cycle(&mut model, 1).unwrap();
    // X(π) takes the resting |1⟩ to |0⟩ (up to phase); pulse off again.
    let state = model.qubit(QubitId(0)).unwrap().state;
    assert!((state.alpha().norm_sqr() - 1.0).abs() < 1e-12);
    assert!(model.wave().is_none());
}

#[test]
fn identical_parallel_rotations_share_the_pulse() {
    // Same pulse, both targets on even columns: one wave serves both.
    let topology = Topology::grid(4, 4, 2, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (0, 2)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let rot = |q: u32, line: u32| {
        Operation::Rotation(Rotation::new(QubitId(q), RotationAxis::X, PI, line))
    };
    let program = Program::from_slots(vec![Slot::parallel(vec![rot(0, 1), rot(1, 1)])]);
    let scheduler = Scheduler::new(&program);
    scheduler.validate(&mut model).unwrap();
    for id in [QubitId(0), QubitId(1)] {
        let state = model.qubit(id).unwrap().state;
        assert!((state.alpha().norm_sqr() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn different_parallel_rotations_conflict() {
    let topology = Topology::grid(4, 4, 2, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (0, 2)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let program = Program::from_slots(vec![Slot::parallel(vec![
        Operation::Rotation(Rotation::new(QubitId(0), RotationAxis::X, PI, 1)),
        Operation::Rotation(Rotation::new(QubitId(1), RotationAxis::Z, PI, 2)),
    ])]);
    let scheduler = Scheduler::new(&program);
    assert!(matches!(
        scheduler.validate(&mut model).unwrap_err(),
        SchedError::ParallelConflict { .. }
    ));
}

#[test]
fn rotation_with_concurrent_move_conflicts() {
    // The rotation pins every bias line to zero; the move needs a strict
    // gradient.
    let topology = Topology::grid(4, 4, 2, 0).with_placement(placed(&[
        (0, QubitKind::Data, (0, 0)),
        (1, QubitKind::Data, (2, 2)),
    ]));
    let mut model = CrossbarModel::new(topology).unwrap();
    let program = Program::from_slots(vec![Slot::parallel(vec![
        mv(0, Direction::Right, 1),
        Operation::Rotation(Rotation::new(QubitId(1), RotationAxis::X, PI, 2)),
    ])]);
    let scheduler = Scheduler::new(&program);
    assert!(matches!(
        scheduler.validate(&mut model).unwrap_err(),
        SchedError::ParallelConflict { .. }
    ));
}

// ---------------------------------------------------------------------------
// Undecidable configurations
// ---------------------------------------------------------------------------

#[test]
fn colinear_open_barriers_fail_before_any_movement() {
    let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
    model.toggle_v_line(0).unwrap();
    model.toggle_v_line(1).unwrap();

    // The transport step rejects the configuration outright.
    let err = model.evolve_all().unwrap_err();
    assert!(matches!(err, ModelError::Undecidable { .. }));
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));

    // And so does an operation validated against it.
    let op = Move::new(QubitId(0), Direction::Right, 1);
    assert!(Operation::Move(op).static_check(&model).is_err());
}

// ---------------------------------------------------------------------------
// Measurement protocol
// ---------------------------------------------------------------------------

#[test]
fn measurement_protocol_round_trips_the_target() {
    // q0 data at (0,0); q1 ancilla at (1,1) shuttles down to (0,1) to
    // serve as the readout partner, then q0 is measured against it.
    let mut model = CrossbarModel::new(Topology::square(2, 1, 1)).unwrap();
    let program = Program::from_slots(vec![
        Slot::single(mv(1, Direction::Down, 1)),
        Slot::single(Operation::Measure(Measure::new(
            QubitId(0),
            AncillaSide::Right,
            ParkSide::Up,
            2,
        ))),
    ]);
    let scheduler = Scheduler::new(&program);
    let cycles = scheduler.validate(&mut model).unwrap();
    assert_eq!(cycles, 8);

    // The target parked and came back; the ancilla stayed put.
    assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));
    assert_eq!(model.qubit(QubitId(1)).unwrap().site, Site::new(0, 1));
    // The measured qubit collapsed to a basis state.
    assert!(model.qubit(QubitId(0)).unwrap().state.is_basis());
}
