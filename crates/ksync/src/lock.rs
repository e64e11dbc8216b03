//! 睡眠互斥锁
//!
//! 状态机只有两个状态：
//!
//! ```text
//! FREE --acquire(C)--> HELD(C)
//! HELD(C) --release(C)--> FREE
//! HELD(C) --acquire(C')--> 睡眠，直到 FREE 后重新竞争
//! ```
//!
//! 持有者以 [`ContextId`] 记录。不支持递归获取，也不支持由非持有者释放，
//! 两者都会触发违约。

use crate::lifecycle::{self, Parts};
use crate::spin_lock::{SpinLock, SpinLockGuard};
use crate::wait_channel::wait_channel_ops;
use crate::{ContextId, ContractViolation, ExecContext, SyncResult, WaitChannelOps, violated};

/// 可睡眠的互斥锁
///
/// # Invariants
/// - 被持有当且仅当 `holder` 为 `Some`
/// - 任意时刻至多一个持有者
pub struct Lock {
    holder: SpinLock<Option<ContextId>>,
    parts: Parts,
}

impl Lock {
    /// 使用已注册的等待通道工厂创建锁
    pub fn new(name: &str) -> SyncResult<Self> {
        Self::new_in(name, wait_channel_ops())
    }

    /// 使用指定的等待通道工厂创建锁
    pub fn new_in(name: &str, ops: &dyn WaitChannelOps) -> SyncResult<Self> {
        let parts = lifecycle::create_parts("lock", name, ops)?;
        Ok(Self {
            holder: SpinLock::new(None),
            parts,
        })
    }

    /// 显式销毁锁，等价于 drop
    ///
    /// 锁仍被持有或仍有等待者时触发违约。
    pub fn destroy(self) {
        drop(self);
    }

    /// 锁名
    pub fn name(&self) -> &str {
        &self.parts.name
    }

    /// 获取锁，被占用时睡眠
    ///
    /// 不可重入：持有者再次获取同一把锁会触发违约，而不是死锁。
    pub fn acquire(&self, cx: &dyn ExecContext) {
        lifecycle::ensure_blockable(cx, "Lock::acquire", self.name());

        let me = cx.id();
        let mut holder = self.holder.lock();
        if *holder == Some(me) {
            violated(ContractViolation::RecursiveAcquire { name: self.name() });
        }
        while holder.is_some() {
            self.parts.wchan.sleep(cx, SpinLockGuard::into_raw(holder));
            holder = self.holder.lock();
        }
        *holder = Some(me);
    }

    /// 释放锁并唤醒至多一个等待者
    ///
    /// 调用者必须是当前持有者。
    pub fn release(&self, cx: &dyn ExecContext) {
        let mut holder = self.holder.lock();
        if *holder != Some(cx.id()) {
            violated(ContractViolation::LockNotHeld {
                op: "Lock::release",
                name: self.name(),
            });
        }
        *holder = None;
        self.parts.wchan.wake_one(SpinLockGuard::raw(&holder));
    }

    /// 调用者是否持有该锁
    pub fn do_i_hold(&self, cx: &dyn ExecContext) -> bool {
        *self.holder.lock() == Some(cx.id())
    }

    /// 锁是否被任意上下文持有，返回后可能立即过时
    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let holder = self.holder.lock();
        if holder.is_some() {
            violated(ContractViolation::DestroyWhileHeld { name: &self.parts.name });
        }
        lifecycle::ensure_no_waiters("lock", &self.parts, SpinLockGuard::raw(&holder));
    }
}

impl core::fmt::Debug for Lock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Lock")
            .field("name", &self.name())
            .field("holder", &*self.holder.lock())
            .finish()
    }
}
