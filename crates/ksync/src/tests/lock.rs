use super::*;

use core::mem::ManuallyDrop;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn test_do_i_hold_tracks_holder() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("owned", &ops).unwrap();
    let a = MockTask::new();
    let b = MockTask::new();

    assert!(!lock.is_held());
    assert!(!lock.do_i_hold(&a));

    lock.acquire(&a);
    assert!(lock.is_held());
    assert!(lock.do_i_hold(&a));
    assert!(!lock.do_i_hold(&b));

    lock.release(&a);
    assert!(!lock.is_held());
    assert!(!lock.do_i_hold(&a));

    lock.acquire(&b);
    assert!(lock.do_i_hold(&b));
    lock.release(&b);
}

#[test]
fn test_acquire_sleeps_until_holder_releases() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("contended", &ops).unwrap();
    let a = MockTask::new();

    lock.acquire(&a);
    thread::scope(|s| {
        let b = s.spawn(|| {
            let me = MockTask::new();
            lock.acquire(&me);
            assert!(lock.do_i_hold(&me));
            lock.release(&me);
        });

        wait_for_sleepers(&ops, "contended", 1);
        assert!(lock.do_i_hold(&a));
        assert!(!b.is_finished());

        lock.release(&a);
        b.join().unwrap();
    });

    assert!(!lock.is_held());
}

#[test]
fn test_ten_contexts_increment_shared_counter() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("scenario-b", &ops).unwrap();
    // Deliberately a split load/store: only the lock makes the increment atomic.
    let counter = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..10 {
            s.spawn(|| {
                let me = MockTask::new();
                for _ in 0..1000 {
                    lock.acquire(&me);
                    let value = counter.load(Ordering::Relaxed);
                    counter.store(value + 1, Ordering::Relaxed);
                    lock.release(&me);
                }
            });
        }
    });

    assert_eq!(counter.load(Ordering::Relaxed), 10000);
}

#[test]
fn test_never_two_holders() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("exclusive", &ops).unwrap();
    let holders = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..6 {
            s.spawn(|| {
                let me = MockTask::new();
                for _ in 0..300 {
                    lock.acquire(&me);
                    assert_eq!(holders.fetch_add(1, Ordering::SeqCst), 0);
                    assert!(lock.do_i_hold(&me));
                    holders.fetch_sub(1, Ordering::SeqCst);
                    lock.release(&me);
                    assert!(!lock.do_i_hold(&me));
                }
            });
        }
    });

    assert_eq!(holders.load(Ordering::SeqCst), 0);
}

#[test]
#[should_panic(expected = "Lock::release requires holding lock 'free'")]
fn test_release_of_free_lock_is_fatal() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("free", &ops).unwrap();
    lock.release(&MockTask::new());
}

#[test]
#[should_panic(expected = "Lock::release requires holding lock 'theirs'")]
fn test_release_by_other_context_is_fatal() {
    let ops = MockWaitQueueOps::new();
    // Still held when the panic unwinds; skip the destroy check.
    let lock = ManuallyDrop::new(Lock::new_in("theirs", &ops).unwrap());
    let owner = MockTask::new();
    let intruder = MockTask::new();

    lock.acquire(&owner);
    lock.release(&intruder);
}

#[test]
#[should_panic(expected = "lock 'again' acquired again by its holder")]
fn test_recursive_acquire_is_fatal() {
    let ops = MockWaitQueueOps::new();
    let lock = ManuallyDrop::new(Lock::new_in("again", &ops).unwrap());
    let me = MockTask::new();

    lock.acquire(&me);
    lock.acquire(&me);
}

#[test]
#[should_panic(expected = "Lock::acquire on 'irq-lock' called from interrupt context")]
fn test_acquire_from_interrupt_is_fatal() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("irq-lock", &ops).unwrap();
    let irq = MockTask::new();
    irq.set_in_interrupt(true);

    lock.acquire(&irq);
}

#[test]
fn test_do_i_hold_allowed_in_interrupt_context() {
    let ops = MockWaitQueueOps::new();
    let lock = Lock::new_in("query", &ops).unwrap();
    let irq = MockTask::new();
    irq.set_in_interrupt(true);

    assert!(!lock.do_i_hold(&irq));
}
