//! 架构相关操作的 Mock 实现
//!
//! 注意：这里不直接依赖 `ksync` crate（避免循环依赖）。
//! `ksync` crate 在 `cfg(test)` 下为这些类型实现其 trait（例如 `ArchOps`）。
//!
//! 每个宿主线程被视为一个 CPU：中断开关状态与 CPU ID 都是线程局部的。

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

const UNASSIGNED: usize = usize::MAX;

static NEXT_CPU_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static INTERRUPTS_ENABLED: Cell<bool> = const { Cell::new(true) };
    static CPU_ID: Cell<usize> = const { Cell::new(UNASSIGNED) };
}

/// Mock 架构操作
pub struct MockArchOps;

impl MockArchOps {
    pub const fn new() -> Self {
        Self
    }

    /// 关闭当前线程的"中断"，返回之前的状态（1 表示开启）
    ///
    /// # Safety
    /// 与真实实现保持相同的签名；mock 本身没有不安全的操作。
    pub unsafe fn read_and_disable_interrupts(&self) -> usize {
        INTERRUPTS_ENABLED.with(|enabled| enabled.replace(false)) as usize
    }

    /// 恢复当前线程的"中断"状态
    ///
    /// # Safety
    /// 同上。
    pub unsafe fn restore_interrupts(&self, flags: usize) {
        INTERRUPTS_ENABLED.with(|enabled| enabled.set(flags != 0));
    }

    /// 当前线程的"中断"是否开启
    pub fn interrupts_enabled(&self) -> bool {
        INTERRUPTS_ENABLED.with(Cell::get)
    }

    /// 当前线程的 CPU ID，首次调用时分配
    pub fn cpu_id(&self) -> usize {
        CPU_ID.with(|id| {
            if id.get() == UNASSIGNED {
                id.set(NEXT_CPU_ID.fetch_add(1, Ordering::Relaxed));
            }
            id.get()
        })
    }
}

impl Default for MockArchOps {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();
