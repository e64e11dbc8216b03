//! 自旋锁实现
//!
//! 基于原子操作实现自旋锁机制，结合 IntrGuard 实现中断保护。
//! 阻塞原语用它保护自身字段，并把它的保护器交给
//! [`WaitChannel::sleep`](crate::WaitChannel::sleep) 完成原子的"入队并解锁"。

use crate::intr_guard::IntrGuard;
use crate::{ContractViolation, arch_ops, violated};
use core::{
    hint,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// 表示没有 CPU 持有锁
const NO_OWNER: usize = usize::MAX;

/// 自旋锁结构体，提供互斥访问临界区的能力。
///
/// 不可重入：同一 CPU 重复获取会被判定为违约，而不是永远自旋。
/// 持有期间禁止睡眠，唯一的例外是把保护器交给等待通道的 `sleep`。
///
/// # 示例
/// ```ignore
/// let lock = RawSpinLock::new();
/// {
///   let guard = lock.lock(); // 获取锁，禁用中断
///   // 临界区代码
/// } // 离开作用域，自动释放锁并恢复中断状态
/// ```
#[derive(Debug)]
pub struct RawSpinLock {
    lock: AtomicBool,
    /// 持有者 CPU ID，仅用于诊断
    owner: AtomicUsize,
}

impl RawSpinLock {
    /// 创建一个新的 RawSpinLock 实例。
    pub const fn new() -> Self {
        RawSpinLock {
            lock: AtomicBool::new(false),
            owner: AtomicUsize::new(NO_OWNER),
        }
    }

    /// 获取自旋锁，并返回一个 RAII 保护器。
    ///
    /// 先在当前 CPU 禁用本地中断，再自旋直到获得锁。
    pub fn lock(&self) -> RawSpinLockGuard<'_> {
        let guard = IntrGuard::new();

        if self.is_held_by_current_cpu() {
            violated(ContractViolation::SpinLockRecursion);
        }

        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }
        self.owner.store(arch_ops().cpu_id(), Ordering::Relaxed);

        RawSpinLockGuard {
            lock: self,
            _intr_guard: guard,
        }
    }

    /// 尝试获取自旋锁，如果成功则返回 RAII 保护器，否则返回 None。
    ///
    /// 获取失败时会立即恢复中断状态（通过 Drop IntrGuard）。
    pub fn try_lock(&self) -> Option<RawSpinLockGuard<'_>> {
        let guard = IntrGuard::new();

        if self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.owner.store(arch_ops().cpu_id(), Ordering::Relaxed);
            Some(RawSpinLockGuard {
                lock: self,
                _intr_guard: guard,
            })
        } else {
            None
        }
    }

    /// 当前 CPU 是否持有该锁
    ///
    /// 持有者只会被它自己写入和清除，所以对当前 CPU 而言结果是确定的。
    pub fn is_held_by_current_cpu(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
            && self.owner.load(Ordering::Relaxed) == arch_ops().cpu_id()
    }

    /// 锁是否被任意 CPU 占用（仅用于调试/测试）
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }

    /// 清除持有者并释放锁标志。
    fn unlock(&self) {
        self.owner.store(NO_OWNER, Ordering::Relaxed);
        self.lock.store(false, Ordering::Release);
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RawSpinLock {
    fn drop(&mut self) {
        if *self.lock.get_mut() {
            violated(ContractViolation::SpinLockHeldOnDrop);
        }
    }
}

/// 自动释放自旋锁和恢复中断状态的 RAII 结构体
///
/// 字段按声明顺序 drop：先在 [`Drop::drop`] 中释放锁标志，再由 IntrGuard 恢复中断。
pub struct RawSpinLockGuard<'a> {
    lock: &'a RawSpinLock,
    _intr_guard: IntrGuard,
}

impl Drop for RawSpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_lock_marks_owner() {
        let lock = RawSpinLock::new();
        assert!(!lock.is_locked());
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
            assert!(lock.is_held_by_current_cpu());
        }
        assert!(!lock.is_locked());
        assert!(!lock.is_held_by_current_cpu());
    }

    #[test]
    fn test_try_lock_contended() {
        let lock = RawSpinLock::new();
        let guard = lock.lock();

        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(lock.try_lock().is_none());
                assert!(!lock.is_held_by_current_cpu());
            });
        });

        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    #[should_panic(expected = "spin lock acquired twice")]
    fn test_recursive_lock_is_fatal() {
        let lock = RawSpinLock::new();
        let _outer = lock.lock();
        let _inner = lock.lock();
    }

    #[test]
    #[should_panic(expected = "spin lock destroyed while held")]
    fn test_drop_while_held_is_fatal() {
        let lock = RawSpinLock::new();
        core::mem::forget(lock.lock());
        drop(lock);
    }

    #[test]
    fn test_guard_restores_interrupts() {
        let lock = RawSpinLock::new();
        {
            let _guard = lock.lock();
            assert!(!IntrGuard::new().was_enabled());
        }
        assert!(IntrGuard::new().was_enabled());
    }
}
