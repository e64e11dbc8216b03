//! 中断保护器
//!
//! 自旋锁持有期间必须屏蔽本地中断，否则中断处理程序可能在同一 CPU 上
//! 试图获取同一把自旋锁而永远自旋。
//!
//! 注意：禁用中断只能阻止**本地 CPU** 的"任务 vs 本地中断"并发，
//! 多核之间的互斥仍由 [`RawSpinLock`](crate::RawSpinLock) 的原子标志负责。

use crate::arch_ops;

/// 中断保护器，基于 RAII 实现中断屏蔽。
///
/// 创建时禁用中断并保存之前的状态，销毁时恢复。
/// 嵌套使用时按后进先出的顺序恢复，最外层的保护器负责重新开启中断。
pub struct IntrGuard {
    flags: usize,
}

impl IntrGuard {
    /// 禁用中断并返回一个 IntrGuard 实例。
    pub fn new() -> Self {
        // SAFETY: 保存的 flags 只会在本保护器 drop 时原样写回
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        IntrGuard { flags }
    }

    /// 进入临界区前中断是否处于启用状态
    pub fn was_enabled(&self) -> bool {
        arch_ops().interrupts_enabled(self.flags)
    }
}

impl Default for IntrGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IntrGuard {
    fn drop(&mut self) {
        // SAFETY: flags 是在创建 IntrGuard 时保存的
        unsafe { arch_ops().restore_interrupts(self.flags) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_guards_restore_in_order() {
        let outer = IntrGuard::new();
        assert!(outer.was_enabled());
        {
            let inner = IntrGuard::new();
            assert!(!inner.was_enabled());
        }
        let probe = IntrGuard::new();
        assert!(!probe.was_enabled());
        drop(probe);
        drop(outer);

        let after = IntrGuard::new();
        assert!(after.was_enabled());
    }
}
