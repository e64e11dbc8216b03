//! 自旋锁封装
//!
//! 提供对数据的互斥访问的自旋锁结构体。

use core::cell::UnsafeCell;

use crate::raw_spin_lock::{RawSpinLock, RawSpinLockGuard};

/// 提供对数据的互斥访问的自旋锁结构体。
///
/// 内部包含一个 RawSpinLock 和一个 UnsafeCell 用于存储数据。
/// 阻塞原语用它保存计数或持有者，字段只在持锁期间读写。
///
/// # 示例
/// ```ignore
/// let lock = SpinLock::new(0);
/// {
///     let mut guard = lock.lock(); // 获取锁
///     *guard += 1; // 访问和修改数据
/// } // 离开作用域，自动释放锁
/// ```
///
/// # 注意
/// SpinLock 不是可重入的，且持锁期间中断被屏蔽，临界区应当短小。
#[derive(Debug)]
pub struct SpinLock<T> {
    raw_lock: RawSpinLock,
    data: UnsafeCell<T>,
}

impl<T> SpinLock<T> {
    /// 创建一个新的 SpinLock 实例，初始化内部数据。
    pub const fn new(data: T) -> Self {
        SpinLock {
            raw_lock: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// 获取自旋锁，并返回一个 RAII 保护器，用于访问和修改内部数据。
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let raw_guard = self.raw_lock.lock();
        SpinLockGuard {
            raw_guard,
            // SAFETY: 持有 raw_lock 期间只有这一个可变引用
            data: unsafe { &mut *self.data.get() },
        }
    }

    /// 尝试获取自旋锁，如果成功则返回 RAII 保护器，否则返回 None。
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        self.raw_lock.try_lock().map(|raw_guard| SpinLockGuard {
            raw_guard,
            // SAFETY: 同 lock()
            data: unsafe { &mut *self.data.get() },
        })
    }

    /// 当前 CPU 是否持有该锁
    pub fn is_held_by_current_cpu(&self) -> bool {
        self.raw_lock.is_held_by_current_cpu()
    }
}

/// SpinLock 的 RAII 保护器，提供对锁定数据的访问。
///
/// 当保护器离开作用域时，自动释放锁。
pub struct SpinLockGuard<'a, T> {
    raw_guard: RawSpinLockGuard<'a>,
    data: &'a mut T,
}

impl<'a, T> SpinLockGuard<'a, T> {
    /// 借出底层的 RawSpinLockGuard，用于证明调用者正持有锁（例如唤醒等待通道）。
    pub fn raw(this: &Self) -> &RawSpinLockGuard<'a> {
        &this.raw_guard
    }

    /// 放弃数据访问权但保持锁定，返回底层的 RawSpinLockGuard。
    ///
    /// 用于把保护器交给 [`WaitChannel::sleep`](crate::WaitChannel::sleep)。
    pub fn into_raw(this: Self) -> RawSpinLockGuard<'a> {
        this.raw_guard
    }
}

impl<T> core::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T> core::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

// Safety: SpinLock 可以在线程间安全共享，
// 因为它通过 RawSpinLock 保证了对数据的互斥访问。
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}
