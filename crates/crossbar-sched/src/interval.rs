//! Temporal intervals of scheduled operations.

use crossbar_ops::{Operation, Program};

/// One scheduled occupancy of shared physical resources.
///
/// The range is inclusive at both ends: an operation still *applies* its
/// final effect at `high`, but stops requesting constraints there (it is
/// finishing, not running).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// First cycle of the interval.
    pub low: u32,
    /// Last cycle of the interval (`low + duration`).
    pub high: u32,
    /// Index of the operation in the scheduler's arena.
    pub op: usize,
}

/// Point-stab index over the schedule's intervals.
///
/// Programs are short-lived and small, so this is a sorted vector with a
/// linear stab that early-exits once `low` passes the query point.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    intervals: Vec<Interval>,
}

impl IntervalIndex {
    /// Build the intervals for a program, returning the index together
    /// with the flattened operation arena.
    ///
    /// A slot consisting of a single Wait advances the running cycle by
    /// the wait's duration and inserts nothing. Every other slot inserts
    /// one interval per non-wait operation and advances the cycle by one:
    /// parallel issue, not stacked durations.
    pub fn from_program(program: &Program) -> (Self, Vec<Operation>) {
        let mut ops: Vec<Operation> = Vec::new();
        let mut intervals: Vec<Interval> = Vec::new();
        let mut cycle: u32 = 0;

        for slot in &program.slots {
            if slot.ops.is_empty() {
                continue;
            }
            if slot.ops.len() == 1 && slot.ops[0].is_wait() {
                cycle += slot.ops[0].cycle_duration();
                continue;
            }
            for op in &slot.ops {
                if op.is_wait() {
                    // A wait issued alongside other operations occupies
                    // nothing and is dropped from the schedule.
                    continue;
                }
                let index = ops.len();
                intervals.push(Interval {
                    low: cycle,
                    high: cycle + op.cycle_duration(),
                    op: index,
                });
                ops.push(op.clone());
            }
            cycle += 1;
        }

        intervals.sort_by_key(|iv| (iv.low, iv.high, iv.op));
        (Self { intervals }, ops)
    }

    /// All intervals containing `cycle` (inclusive on both ends).
    pub fn containing(&self, cycle: u32) -> impl Iterator<Item = &Interval> {
        self.intervals
            .iter()
            .take_while(move |iv| iv.low <= cycle)
            .filter(move |iv| iv.high >= cycle)
    }

    /// One past the highest interval end; the loop bound of a run.
    pub fn max_cycle(&self) -> u32 {
        self.intervals
            .iter()
            .map(|iv| iv.high)
            .max()
            .map_or(0, |high| high + 1)
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbar_model::QubitId;
    use crossbar_ops::{Direction, Move, Slot, Wait};

    fn mv(q: u32, line: u32) -> Operation {
        Operation::Move(Move::new(QubitId(q), Direction::Right, line))
    }

    #[test]
    fn test_single_slot_interval() {
        let program = Program::from_slots(vec![Slot::single(mv(0, 1))]);
        let (index, ops) = IntervalIndex::from_program(&program);
        assert_eq!(ops.len(), 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.max_cycle(), 2); // move spans [0, 1]
        assert_eq!(index.containing(0).count(), 1);
        assert_eq!(index.containing(1).count(), 1);
        assert_eq!(index.containing(2).count(), 0);
    }

    #[test]
    fn test_wait_advances_without_interval() {
        let program = Program::from_slots(vec![
            Slot::single(Operation::Wait(Wait::new(5, 1))),
            Slot::single(mv(0, 2)),
        ]);
        let (index, _) = IntervalIndex::from_program(&program);
        assert_eq!(index.len(), 1);
        assert_eq!(index.containing(4).count(), 0);
        let iv = index.containing(5).next().unwrap();
        assert_eq!((iv.low, iv.high), (5, 6));
    }

    #[test]
    fn test_parallel_slot_shares_cycle() {
        let program = Program::from_slots(vec![
            Slot::parallel(vec![mv(0, 1), mv(1, 1)]),
            Slot::single(mv(2, 2)),
        ]);
        let (index, _) = IntervalIndex::from_program(&program);
        assert_eq!(index.len(), 3);
        // Both parallel moves start at 0; the next slot starts at 1.
        assert_eq!(index.containing(0).count(), 2);
        assert_eq!(index.containing(1).count(), 3);
    }

    #[test]
    fn test_empty_program() {
        let (index, ops) = IntervalIndex::from_program(&Program::new());
        assert!(index.is_empty());
        assert!(ops.is_empty());
        assert_eq!(index.max_cycle(), 0);
    }
}
