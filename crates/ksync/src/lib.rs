//! 阻塞式同步原语
//!
//! 向其它内核模块提供可睡眠的同步设施：
//! 计数信号量 [`Semaphore`]、互斥锁 [`Lock`] 与 Mesa 语义条件变量 [`Condvar`]。
//!
//! 这些原语只由两种底层构件搭建：
//! - [`RawSpinLock`] / [`SpinLock`]：不会睡眠的短临界区保护（同时屏蔽本地中断）
//! - [`WaitChannel`]：睡眠/唤醒队列，提供"入队并释放自旋锁"的原子睡眠
//!
//! # 外部依赖
//!
//! 此 crate 通过 trait 与架构和调度器解耦，使用前必须在启动阶段注册实现：
//! - [`ArchOps`]：中断控制和 CPU 信息，通过 [`register_arch_ops`] 注册
//! - [`WaitChannelOps`]：等待通道工厂，通过 [`register_wait_channel_ops`] 注册
//! - 违约处理（可选）：通过 [`register_violation_handler`] 替换默认的 panic 策略
//!
//! 当前执行上下文不是全局状态，而是以 [`ExecContext`] 的形式显式传给每个操作。
//!
//! # 错误分类
//!
//! - 资源耗尽：构造函数返回 [`SyncError::NoMemory`]，已分配的部分会在返回前释放
//! - 违反约定：在中断上下文中阻塞、非持有者释放锁、带着等待者销毁等，
//!   统一经由 [`violated`] 进入致命路径

#![no_std]

extern crate alloc;

mod condvar;
mod context;
mod error;
mod intr_guard;
mod lifecycle;
mod lock;
mod raw_spin_lock;
mod semaphore;
mod spin_lock;
mod violation;
mod wait_channel;

#[cfg(test)]
mod tests;

pub use condvar::Condvar;
pub use context::{ContextId, ExecContext};
pub use error::{SyncError, SyncResult};
pub use intr_guard::*;
pub use lock::Lock;
pub use raw_spin_lock::*;
pub use semaphore::Semaphore;
pub use spin_lock::*;
pub use violation::{ContractViolation, ViolationHandler, register_violation_handler, violated};
pub use wait_channel::{WaitChannel, WaitChannelOps, register_wait_channel_ops};

use core::sync::atomic::{AtomicUsize, Ordering};

/// 架构相关操作的 trait
///
/// 由 os crate 实现并注册，提供中断控制和 CPU 信息
pub trait ArchOps: Send + Sync {
    /// 读取并禁用中断，返回之前的状态
    ///
    /// # Safety
    /// 调用者必须确保在适当的上下文中调用
    unsafe fn read_and_disable_interrupts(&self) -> usize;

    /// 恢复中断状态
    ///
    /// # Safety
    /// flags 必须是之前 read_and_disable_interrupts 返回的值
    unsafe fn restore_interrupts(&self, flags: usize);

    /// 判断 `flags` 所描述的状态下中断是否处于启用状态
    fn interrupts_enabled(&self, flags: usize) -> bool;

    /// 获取当前 CPU ID
    fn cpu_id(&self) -> usize;
}

/// 全局架构操作实例（存储 fat pointer 的两个部分）
static ARCH_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static ARCH_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册架构操作实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_arch_ops(ops: &'static dyn ArchOps) {
    let ptr = ops as *const dyn ArchOps;
    // SAFETY: transmute 在这里是安全的，因为 fat pointer 的布局是 (data, vtable)
    let (data, vtable) = unsafe { core::mem::transmute::<*const dyn ArchOps, (usize, usize)>(ptr) };
    ARCH_OPS_DATA.store(data, Ordering::Release);
    ARCH_OPS_VTABLE.store(vtable, Ordering::Release);
}

/// 获取架构操作实例
///
/// # Panics
/// 如果尚未调用 [`register_arch_ops`] 注册实现，则 panic
#[inline]
pub(crate) fn arch_ops() -> &'static dyn ArchOps {
    let data = ARCH_OPS_DATA.load(Ordering::Acquire);
    let vtable = ARCH_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        #[cfg(test)]
        {
            extern crate test_support;
            return &test_support::mock::arch::MOCK_ARCH_OPS;
        }
        #[cfg(not(test))]
        panic!("ksync: ArchOps not registered, call register_arch_ops first");
    }
    // SAFETY: data 和 vtable 是通过 register_arch_ops 设置的有效指针
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ArchOps>((data, vtable)) }
}
