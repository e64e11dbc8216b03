//! 等待通道
//!
//! 等待通道是与某个条件绑定的睡眠队列，队列本身的实现属于调度器。
//! 本 crate 只依赖以下约定：
//!
//! - 所有操作都在调用者持有保护该条件的自旋锁时进行，
//!   `wake_*` 与 `is_empty` 借用该锁的保护器作为凭证
//! - [`WaitChannel::sleep`] 消耗保护器：调用者先进入队列，之后锁才被释放，
//!   因此任何在锁释放之后发出的唤醒都能看到这个睡眠者
//! - `sleep` 返回时不会重新持有锁，调用者需要自己重新获取并复查条件
//!
//! 通道由 [`WaitChannelOps`] 创建。通道被 drop 时必须为空，
//! 这一点由持有它的同步原语在销毁时检查。

use alloc::boxed::Box;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::{ExecContext, RawSpinLockGuard, SyncResult};

/// 睡眠/唤醒队列
pub trait WaitChannel: Send + Sync {
    /// 通道名，仅用于诊断
    fn label(&self) -> &str;

    /// 把 `cx` 放入队列并释放 `guard`，然后挂起，直到被唤醒
    ///
    /// 入队与释放对唤醒者而言是原子的。返回时 `guard` 对应的锁未被持有。
    fn sleep(&self, cx: &dyn ExecContext, guard: RawSpinLockGuard<'_>);

    /// 唤醒至多一个睡眠者，不保证顺序
    fn wake_one(&self, guard: &RawSpinLockGuard<'_>);

    /// 唤醒调用时刻队列中的全部睡眠者
    fn wake_all(&self, guard: &RawSpinLockGuard<'_>);

    /// 队列是否为空
    fn is_empty(&self, guard: &RawSpinLockGuard<'_>) -> bool;
}

/// 等待通道工厂
///
/// 由调度器实现并注册。
pub trait WaitChannelOps: Send + Sync {
    /// 创建一个以 `label` 命名的空通道
    ///
    /// 分配失败时返回 [`SyncError::NoMemory`](crate::SyncError::NoMemory)。
    fn create(&self, label: &str) -> SyncResult<Box<dyn WaitChannel>>;
}

// 使用 AtomicUsize 存储 fat pointer 的两部分
static WCHAN_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static WCHAN_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册等待通道工厂
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_wait_channel_ops(ops: &'static dyn WaitChannelOps) {
    let ptr = ops as *const dyn WaitChannelOps;
    // SAFETY: 将 fat pointer 拆分为 data 和 vtable 两部分存储
    let (data, vtable) =
        unsafe { core::mem::transmute::<*const dyn WaitChannelOps, (usize, usize)>(ptr) };
    WCHAN_OPS_DATA.store(data, Ordering::Release);
    WCHAN_OPS_VTABLE.store(vtable, Ordering::Release);
}

/// 获取已注册的等待通道工厂
///
/// # Panics
/// 如果尚未调用 [`register_wait_channel_ops`] 注册实现，则 panic
#[inline]
pub(crate) fn wait_channel_ops() -> &'static dyn WaitChannelOps {
    let data = WCHAN_OPS_DATA.load(Ordering::Acquire);
    let vtable = WCHAN_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        #[cfg(test)]
        {
            extern crate test_support;
            return &test_support::mock::sched::MOCK_WAIT_QUEUE_OPS;
        }
        #[cfg(not(test))]
        panic!("ksync: WaitChannelOps not registered");
    }
    // SAFETY: 重组 fat pointer
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn WaitChannelOps>((data, vtable)) }
}
