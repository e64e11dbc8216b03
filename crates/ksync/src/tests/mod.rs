// Scenario tests for the blocking primitives.
//
// Every host thread acts as one CPU and one execution context (`MockTask`);
// wait channels come from a test-local `MockWaitQueueOps` so that tests can
// observe how many contexts are asleep on a given primitive.

extern crate alloc;
extern crate std;
extern crate test_support;

use crate::{Condvar, Lock, Semaphore, SyncError};
use core::time::Duration;
use test_support::mock::sched::{MockTask, MockWaitQueueOps};

/// Upper bound for "the other thread should get there" polling.
const TIMEOUT: Duration = Duration::from_secs(10);

/// Blocks until `n` contexts are asleep on the channel named `label`.
fn wait_for_sleepers(ops: &MockWaitQueueOps, label: &str, n: usize) {
    test_support::wait_until(TIMEOUT, || ops.sleepers(label) == n);
}

mod lock;
