//! Host adapters that plug the test-support mocks into ksync's public
//! registration API, the way the kernel plugs in its own scheduler.

#![allow(dead_code)]

use std::sync::Once;

use ksync::{
    ArchOps, ContextId, ExecContext, RawSpinLockGuard, SyncError, SyncResult, WaitChannel,
    WaitChannelOps,
};
use test_support::mock::arch::MOCK_ARCH_OPS;
use test_support::mock::sched::{MockTask, MockWaitQueue, MockWaitQueueOps};

pub struct HostArch;

impl ArchOps for HostArch {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        unsafe { MOCK_ARCH_OPS.read_and_disable_interrupts() }
    }

    unsafe fn restore_interrupts(&self, flags: usize) {
        unsafe { MOCK_ARCH_OPS.restore_interrupts(flags) }
    }

    fn interrupts_enabled(&self, flags: usize) -> bool {
        flags != 0
    }

    fn cpu_id(&self) -> usize {
        MOCK_ARCH_OPS.cpu_id()
    }
}

pub struct HostTask(MockTask);

impl HostTask {
    pub fn new() -> Self {
        Self(MockTask::new())
    }

    pub fn enter_interrupt(&self) {
        self.0.set_in_interrupt(true);
    }
}

impl ExecContext for HostTask {
    fn id(&self) -> ContextId {
        ContextId::new(self.0.id())
    }

    fn in_interrupt(&self) -> bool {
        self.0.in_interrupt()
    }
}

pub struct HostChannel(MockWaitQueue);

impl WaitChannel for HostChannel {
    fn label(&self) -> &str {
        self.0.label()
    }

    fn sleep(&self, _cx: &dyn ExecContext, guard: RawSpinLockGuard<'_>) {
        self.0.sleep(guard);
    }

    fn wake_one(&self, _guard: &RawSpinLockGuard<'_>) {
        self.0.wake_one();
    }

    fn wake_all(&self, _guard: &RawSpinLockGuard<'_>) {
        self.0.wake_all();
    }

    fn is_empty(&self, _guard: &RawSpinLockGuard<'_>) -> bool {
        self.0.is_empty()
    }
}

pub struct HostChannels(pub MockWaitQueueOps);

impl WaitChannelOps for HostChannels {
    fn create(&self, label: &str) -> SyncResult<Box<dyn WaitChannel>> {
        self.0
            .create(label)
            .map(|queue| Box::new(HostChannel(queue)) as Box<dyn WaitChannel>)
            .ok_or(SyncError::NoMemory)
    }
}

static HOST_ARCH: HostArch = HostArch;
pub static HOST_CHANNELS: HostChannels = HostChannels(MockWaitQueueOps::new());

static INIT: Once = Once::new();

/// Registers the host adapters exactly once per test binary.
pub fn init_once() {
    INIT.call_once(|| unsafe {
        ksync::register_arch_ops(&HOST_ARCH);
        ksync::register_wait_channel_ops(&HOST_CHANNELS);
    });
}
