//! Mesa 语义条件变量
//!
//! 条件变量本身不保存任何条件状态，也不记录等待者身份，只持有一个等待通道
//! 和一个保护该通道的自旋锁。条件由调用者在外部 [`Lock`] 保护下自行判断：
//!
//! ```ignore
//! lock.acquire(cx);
//! while !condition() {
//!     cv.wait(cx, &lock);
//! }
//! // ... 条件成立，操作共享数据 ...
//! lock.release(cx);
//! ```
//!
//! `signal` 只表示条件*可能*已经成立：被唤醒者需要和其它上下文重新竞争锁，
//! 拿到锁时条件可能又被破坏了，因此必须在循环中复查。
//!
//! # 不丢失唤醒
//!
//! `wait` 在持有条件变量自旋锁的情况下释放外部锁，再由 [`WaitChannel::sleep`]
//! 在入队之后才释放自旋锁；`signal` / `broadcast` 的调用者持有外部锁，
//! 同样要先拿到这把自旋锁才能唤醒。因此"释放外部锁"与"进入队列"
//! 之间不存在可被唤醒者插入的窗口。
//!
//! [`WaitChannel::sleep`]: crate::WaitChannel::sleep

use crate::lifecycle::{self, Parts};
use crate::raw_spin_lock::RawSpinLock;
use crate::wait_channel::wait_channel_ops;
use crate::{ContractViolation, ExecContext, Lock, SyncResult, WaitChannelOps, violated};

/// 条件变量
pub struct Condvar {
    guard: RawSpinLock,
    parts: Parts,
}

impl Condvar {
    /// 使用已注册的等待通道工厂创建条件变量
    pub fn new(name: &str) -> SyncResult<Self> {
        Self::new_in(name, wait_channel_ops())
    }

    /// 使用指定的等待通道工厂创建条件变量
    pub fn new_in(name: &str, ops: &dyn WaitChannelOps) -> SyncResult<Self> {
        let parts = lifecycle::create_parts("condvar", name, ops)?;
        Ok(Self {
            guard: RawSpinLock::new(),
            parts,
        })
    }

    /// 显式销毁条件变量，等价于 drop
    ///
    /// 仍有上下文在等待时触发违约。
    pub fn destroy(self) {
        drop(self);
    }

    /// 条件变量名
    pub fn name(&self) -> &str {
        &self.parts.name
    }

    /// 释放 `lock` 并睡眠，被唤醒后重新获取 `lock` 再返回
    ///
    /// 调用者必须持有 `lock`，且处于可阻塞的上下文。
    pub fn wait(&self, cx: &dyn ExecContext, lock: &Lock) {
        lifecycle::ensure_blockable(cx, "Condvar::wait", self.name());
        self.ensure_holds(cx, lock, "Condvar::wait");

        let guard = self.guard.lock();
        lock.release(cx);
        self.parts.wchan.sleep(cx, guard);

        lock.acquire(cx);
    }

    /// 唤醒至多一个等待者，不保证顺序
    ///
    /// 调用者必须持有 `lock`。
    pub fn signal(&self, cx: &dyn ExecContext, lock: &Lock) {
        self.ensure_holds(cx, lock, "Condvar::signal");

        let guard = self.guard.lock();
        self.parts.wchan.wake_one(&guard);
    }

    /// 唤醒调用时刻的全部等待者，之后开始等待的上下文不受影响
    ///
    /// 调用者必须持有 `lock`。
    pub fn broadcast(&self, cx: &dyn ExecContext, lock: &Lock) {
        self.ensure_holds(cx, lock, "Condvar::broadcast");

        let guard = self.guard.lock();
        self.parts.wchan.wake_all(&guard);
    }

    fn ensure_holds(&self, cx: &dyn ExecContext, lock: &Lock, op: &'static str) {
        if !lock.do_i_hold(cx) {
            violated(ContractViolation::LockNotHeld {
                op,
                name: lock.name(),
            });
        }
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        let guard = self.guard.lock();
        lifecycle::ensure_no_waiters("condvar", &self.parts, &guard);
    }
}

impl core::fmt::Debug for Condvar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Condvar").field("name", &self.name()).finish()
    }
}
