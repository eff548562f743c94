use crate::{
    BasicSnowflakeGenerator, Error, IdField, LockSnowflakeGenerator, Poll, SnowflakeGenerator,
    SnowflakeId, SystemClock, TimeSource,
};
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread::scope;

#[derive(Clone)]
struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test can move in either direction.
#[derive(Clone)]
struct SharedMockTime {
    millis: Rc<Cell<u64>>,
}

impl SharedMockTime {
    fn at(millis: u64) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.set(millis);
    }
}

impl TimeSource for SharedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis.get()
    }
}

/// Reports `stuck_at` for the first `stuck_reads` reads, then one tick
/// later.
struct StuckTime {
    stuck_at: u64,
    stuck_reads: usize,
    reads: Cell<usize>,
}

impl TimeSource for StuckTime {
    fn current_millis(&self) -> u64 {
        let reads = self.reads.get();
        self.reads.set(reads + 1);
        if reads < self.stuck_reads {
            self.stuck_at
        } else {
            self.stuck_at + 1
        }
    }
}

trait PollExt {
    fn unwrap_ready(self) -> SnowflakeId;
    fn unwrap_pending(self) -> u64;
}

impl PollExt for Poll {
    fn unwrap_ready(self) -> SnowflakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn run_id_sequence_increments_within_same_tick<G, T>(generator: &G)
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();
    let id3 = generator.next_id().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

fn run_two_ids_in_one_millisecond<G, T>(generator: &G)
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    let first = generator.next_id().unwrap();
    let second = generator.next_id().unwrap();

    assert_eq!(second.sequence(), first.sequence() + 1);
    assert_eq!(second.timestamp(), first.timestamp());
    assert_eq!(first.worker_id(), 1);
    assert_eq!(first.datacenter_id(), 1);
    assert_eq!(second.worker_id(), 1);
    assert_eq!(second.datacenter_id(), 1);
    assert!(u64::from(second) > u64::from(first));
}

fn run_sequence_wrap_spins_to_next_tick<G, T>(generator: &G)
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    for i in 0..=SnowflakeId::max_sequence() {
        let id = generator.next_id().unwrap();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), 42);
    }

    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

fn run_poll_pending_when_sequence_exhausted<G, T>(generator: &G)
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    for i in 0..=SnowflakeId::max_sequence() {
        let id = generator.poll_id().unwrap().unwrap_ready();
        assert_eq!(id.sequence(), i);
    }

    assert_eq!(generator.poll_id().unwrap().unwrap_pending(), 1);
    // Pending does not consume a sequence number.
    assert_eq!(generator.poll_id().unwrap().unwrap_pending(), 1);
}

fn run_clock_regression<G>(generator: &G, time: &SharedMockTime)
where
    G: SnowflakeGenerator<SharedMockTime>,
{
    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();
    assert_eq!(id2.sequence(), 1);

    time.set(90);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackward {
            last_timestamp: 100,
            behind_by: 10,
        })
    );
    assert!(matches!(
        generator.poll_id(),
        Err(Error::ClockMovedBackward {
            last_timestamp: 100,
            behind_by: 10,
        })
    ));

    // Back at the stalled tick: the sequence picks up where it left off.
    time.set(100);
    let id3 = generator.next_id().unwrap();
    assert_eq!(id3.timestamp(), 100);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);

    time.set(101);
    let id4 = generator.next_id().unwrap();
    assert_eq!(id4.timestamp(), 101);
    assert_eq!(id4.sequence(), 0);
}

fn run_timestamp_overflow<G>(generator: &G, time: &SharedMockTime)
where
    G: SnowflakeGenerator<SharedMockTime>,
{
    let max = SnowflakeId::max_timestamp();
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), max);

    time.set(max + 1);
    assert_eq!(
        generator.next_id(),
        Err(Error::TimestampOverflow {
            timestamp: max + 1,
            max,
        })
    );

    time.set(max);
    let next = generator.next_id().unwrap();
    assert_eq!(next.sequence(), 1);
    assert!(next.is_valid());
}

fn run_generator_monotonic<G>(generator: &G)
where
    G: SnowflakeGenerator<SystemClock>,
{
    const TOTAL_IDS: u64 = 4096 * 64;

    let mut last: Option<SnowflakeId> = None;
    for _ in 0..TOTAL_IDS {
        let id = generator.next_id().unwrap();
        assert_eq!(id.worker_id(), 3);
        assert_eq!(id.datacenter_id(), 7);
        if let Some(prev) = last {
            assert!(id > prev);
            if id.timestamp() == prev.timestamp() {
                assert_eq!(id.sequence(), prev.sequence() + 1);
            } else {
                assert!(id.timestamp() > prev.timestamp());
                assert_eq!(id.sequence(), 0);
            }
        }
        last = Some(id);
    }
}

#[test]
fn basic_generator_sequence_test() {
    let generator = BasicSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();
    run_id_sequence_increments_within_same_tick(&generator);
}

#[test]
fn lock_generator_sequence_test() {
    let generator = LockSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();
    run_id_sequence_increments_within_same_tick(&generator);
}

#[test]
fn basic_generator_two_ids_in_one_millisecond() {
    let generator = BasicSnowflakeGenerator::new(1, 1, MockTime { millis: 7 }).unwrap();
    run_two_ids_in_one_millisecond(&generator);
}

#[test]
fn lock_generator_two_ids_in_one_millisecond() {
    let generator = LockSnowflakeGenerator::new(1, 1, MockTime { millis: 7 }).unwrap();
    run_two_ids_in_one_millisecond(&generator);
}

#[test]
fn basic_generator_sequence_wrap_test() {
    let time = StuckTime {
        stuck_at: 42,
        stuck_reads: 4096 + 5,
        reads: Cell::new(0),
    };
    let generator = BasicSnowflakeGenerator::new(2, 3, &time).unwrap();
    run_sequence_wrap_spins_to_next_tick(&generator);
    // The 4097th call kept reading the stalled clock before it advanced.
    assert!(time.reads.get() > 4096 + 5);
}

#[test]
fn lock_generator_sequence_wrap_test() {
    let time = StuckTime {
        stuck_at: 42,
        stuck_reads: 4096 + 5,
        reads: Cell::new(0),
    };
    let generator = LockSnowflakeGenerator::new(2, 3, &time).unwrap();
    run_sequence_wrap_spins_to_next_tick(&generator);
    assert!(time.reads.get() > 4096 + 5);
}

#[test]
fn basic_generator_pending_test() {
    let generator = BasicSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();
    run_poll_pending_when_sequence_exhausted(&generator);
}

#[test]
fn lock_generator_pending_test() {
    let generator = LockSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();
    run_poll_pending_when_sequence_exhausted(&generator);
}

#[test]
fn basic_generator_clock_regression_test() {
    let time = SharedMockTime::at(100);
    let generator = BasicSnowflakeGenerator::new(4, 5, time.clone()).unwrap();
    run_clock_regression(&generator, &time);
}

#[test]
fn lock_generator_clock_regression_test() {
    let time = SharedMockTime::at(100);
    let generator = LockSnowflakeGenerator::new(4, 5, time.clone()).unwrap();
    run_clock_regression(&generator, &time);
}

#[test]
fn clock_regression_leaves_last_timestamp_untouched() {
    let time = SharedMockTime::at(100);
    let generator = LockSnowflakeGenerator::new(0, 0, time.clone()).unwrap();
    assert_eq!(generator.last_timestamp().unwrap(), None);

    generator.next_id().unwrap();
    time.set(50);
    assert!(generator.next_id().is_err());
    assert_eq!(generator.last_timestamp().unwrap(), Some(100));
}

#[test]
fn basic_generator_timestamp_overflow_test() {
    let time = SharedMockTime::at(SnowflakeId::max_timestamp());
    let generator = BasicSnowflakeGenerator::new(0, 0, time.clone()).unwrap();
    run_timestamp_overflow(&generator, &time);
}

#[test]
fn lock_generator_timestamp_overflow_test() {
    let time = SharedMockTime::at(SnowflakeId::max_timestamp());
    let generator = LockSnowflakeGenerator::new(0, 0, time.clone()).unwrap();
    run_timestamp_overflow(&generator, &time);
}

#[test]
fn first_id_uses_initial_clock_even_at_zero() {
    let generator = BasicSnowflakeGenerator::new(0, 0, MockTime { millis: 0 }).unwrap();
    assert_eq!(generator.last_timestamp(), None);
    let id = generator.next_id().unwrap();
    assert_eq!(id.to_raw(), 0);
    assert_eq!(generator.last_timestamp(), Some(0));
}

#[test]
fn constructors_validate_ranges() {
    assert!(LockSnowflakeGenerator::new(31, 31, MockTime { millis: 0 }).is_ok());
    assert!(BasicSnowflakeGenerator::new(31, 31, MockTime { millis: 0 }).is_ok());

    assert!(matches!(
        LockSnowflakeGenerator::new(32, 0, MockTime { millis: 0 }),
        Err(Error::InvalidConfiguration {
            field: IdField::WorkerId,
            value: 32,
            max: 31,
        })
    ));
    assert!(matches!(
        BasicSnowflakeGenerator::new(0, -1, MockTime { millis: 0 }),
        Err(Error::InvalidConfiguration {
            field: IdField::DatacenterId,
            value: -1,
            max: 31,
        })
    ));
}

#[test]
fn accessors_and_display() {
    let generator = LockSnowflakeGenerator::new(9, 17, MockTime { millis: 0 }).unwrap();
    assert_eq!(generator.worker_id(), 9);
    assert_eq!(generator.datacenter_id(), 17);
    assert_eq!(SnowflakeGenerator::worker_id(&generator), 9);
    assert_eq!(SnowflakeGenerator::datacenter_id(&generator), 17);
    assert_eq!(
        generator.to_string(),
        "timestamp left shift 22, datacenter id bits 5, worker id bits 5, sequence bits 12, workerid 9, datacenterId 17"
    );
}

#[test]
fn ids_round_trip_through_raw() {
    let time = SystemClock::default();
    let generator = LockSnowflakeGenerator::new(13, 27, time).unwrap();
    let before = time.current_millis();
    let id = generator.next_id().unwrap();
    let after = time.current_millis();

    let decoded = SnowflakeId::from_raw(u64::from(id));
    assert_eq!(decoded.worker_id(), 13);
    assert_eq!(decoded.datacenter_id(), 27);
    assert!(decoded.timestamp() >= before && decoded.timestamp() <= after);
    assert!(decoded.unix_millis(time.epoch()) > 1_514_736_000_000);
    assert!(decoded.is_valid());
}

#[test]
fn basic_generator_system_clock_monotonic() {
    let generator = BasicSnowflakeGenerator::try_default(3, 7).unwrap();
    run_generator_monotonic(&generator);
}

#[test]
fn lock_generator_system_clock_monotonic() {
    let generator = LockSnowflakeGenerator::try_default(3, 7).unwrap();
    run_generator_monotonic(&generator);
}

#[test]
fn lock_generator_threaded_unique() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096 * 32;
    const TOTAL_IDS: usize = THREADS * IDS_PER_THREAD;

    let generator = LockSnowflakeGenerator::try_default(1, 2).unwrap();
    let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(TOTAL_IDS)));

    scope(|s| {
        for _ in 0..THREADS {
            let generator = &generator;
            let seen_ids = Arc::clone(&seen_ids);

            s.spawn(move || {
                let mut ids = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    ids.push(generator.next_id().unwrap());
                }
                // Each thread observes its own IDs in increasing order.
                assert!(ids.windows(2).all(|w| w[0] < w[1]));

                let mut seen = seen_ids.lock().unwrap();
                for id in ids {
                    assert!(seen.insert(id));
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, TOTAL_IDS, "Expected {TOTAL_IDS} unique IDs");
}

#[test]
fn lock_generator_clones_share_state() {
    let generator = LockSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();
    let clone = generator.clone();

    assert_eq!(generator.next_id().unwrap().sequence(), 0);
    assert_eq!(clone.next_id().unwrap().sequence(), 1);
    assert_eq!(generator.next_id().unwrap().sequence(), 2);
}

#[cfg(not(feature = "parking-lot"))]
#[test]
fn poisoned_lock_is_reported() {
    let generator = LockSnowflakeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();

    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = generator.state.lock().unwrap();
        panic!("poison the generator lock");
    }));

    assert_eq!(generator.next_id(), Err(Error::LockPoisoned));
    assert_eq!(generator.poll_id(), Err(Error::LockPoisoned));
}
