//! 执行上下文
//!
//! 阻塞原语需要知道"谁在调用"：锁要记录持有者，睡眠前要确认调用者可以阻塞。
//! 这两项信息由调用者以 [`ExecContext`] 的形式显式传入，而不是读取全局的当前线程。

use core::fmt;

/// 执行上下文的不透明标识
///
/// 只用于相等比较；数值本身没有含义，由调度器分配。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

impl ContextId {
    /// 由调度器分配的原始值构造标识
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// 调用阻塞原语的执行上下文
///
/// 由调度器为每个线程（或任务）实现。实现者必须保证：
/// - 同一时刻不同的执行上下文返回不同的 [`ContextId`]
/// - [`in_interrupt`](ExecContext::in_interrupt) 如实反映调用者是否处于不可阻塞的上下文
pub trait ExecContext: Send + Sync {
    /// 调用者的标识
    fn id(&self) -> ContextId;

    /// 调用者是否处于不可阻塞的上下文（如中断处理程序）
    fn in_interrupt(&self) -> bool;
}
