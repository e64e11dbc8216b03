//! 计数信号量
//!
//! 经典的 P / V 信号量：计数为 0 时 P 睡眠在等待通道上，V 增加计数并唤醒至多一个睡眠者。
//!
//! 不保证 FIFO：被唤醒的上下文需要重新竞争自旋锁，
//! 在它复查计数之前，新到来的调用者可能已经拿走了资源，它只能再次睡眠。

use crate::lifecycle::{self, Parts};
use crate::spin_lock::{SpinLock, SpinLockGuard};
use crate::wait_channel::wait_channel_ops;
use crate::{ContractViolation, ExecContext, SyncResult, WaitChannelOps, violated};

/// 计数信号量
///
/// # Invariants
/// - 计数只在持有内部自旋锁时修改
/// - 计数始终非负，只有大于 0 时才会被减一
pub struct Semaphore {
    count: SpinLock<usize>,
    parts: Parts,
}

impl Semaphore {
    /// 使用已注册的等待通道工厂创建信号量
    pub fn new(name: &str, initial: usize) -> SyncResult<Self> {
        Self::new_in(name, initial, wait_channel_ops())
    }

    /// 使用指定的等待通道工厂创建信号量
    pub fn new_in(name: &str, initial: usize, ops: &dyn WaitChannelOps) -> SyncResult<Self> {
        let parts = lifecycle::create_parts("semaphore", name, ops)?;
        Ok(Self {
            count: SpinLock::new(initial),
            parts,
        })
    }

    /// 显式销毁信号量，等价于 drop
    ///
    /// 仍有上下文在等待时触发违约。
    pub fn destroy(self) {
        drop(self);
    }

    /// 信号量名
    pub fn name(&self) -> &str {
        &self.parts.name
    }

    /// 当前计数的快照，返回后可能立即过时
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// P 操作：计数为 0 时睡眠，直到能够把计数减一
    ///
    /// 不可在中断上下文中调用，即使此时计数大于 0。
    pub fn acquire(&self, cx: &dyn ExecContext) {
        lifecycle::ensure_blockable(cx, "Semaphore::acquire", self.name());

        let mut count = self.count.lock();
        while *count == 0 {
            self.parts.wchan.sleep(cx, SpinLockGuard::into_raw(count));
            count = self.count.lock();
        }
        *count -= 1;
    }

    /// 不睡眠的 P 操作，计数为 0 时返回 false
    ///
    /// 不会阻塞，因此可以在中断上下文中使用。
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// V 操作：计数加一并唤醒至多一个等待者
    pub fn release(&self) {
        let mut count = self.count.lock();
        *count = match count.checked_add(1) {
            Some(next) => next,
            None => violated(ContractViolation::SemaphoreOverflow { name: self.name() }),
        };
        self.parts.wchan.wake_one(SpinLockGuard::raw(&count));
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        let count = self.count.lock();
        lifecycle::ensure_no_waiters("semaphore", &self.parts, SpinLockGuard::raw(&count));
    }
}

impl core::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Semaphore")
            .field("name", &self.name())
            .field("count", &self.count())
            .finish()
    }
}
