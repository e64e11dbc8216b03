//! 违约处理
//!
//! 调用约定被破坏（在中断上下文中阻塞、非持有者释放锁、带着等待者销毁原语等）
//! 意味着内核已处于不可信的状态，不存在恢复路径。所有检查点都汇聚到
//! [`violated`]：先记录错误日志，再交给已注册的处理函数。
//!
//! 默认处理函数直接 `panic!`，在以 `panic = "abort"` 构建的内核中即终止运行；
//! 宿主机测试可以注册其它处理函数（例如计数后再 panic）。

use core::fmt;
use core::sync::atomic::{AtomicPtr, Ordering};

/// 违约处理函数类型
pub type ViolationHandler = fn(&ContractViolation<'_>) -> !;

/// 违反同步原语调用约定的具体情形
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation<'a> {
    /// 在不可阻塞的上下文中调用了可能阻塞的操作
    BlockingInInterrupt {
        /// 操作名
        op: &'static str,
        /// 原语名
        name: &'a str,
    },
    /// 信号量计数溢出
    SemaphoreOverflow {
        /// 信号量名
        name: &'a str,
    },
    /// 调用者没有持有要求其持有的锁
    LockNotHeld {
        /// 操作名
        op: &'static str,
        /// 锁名
        name: &'a str,
    },
    /// 锁的持有者再次获取同一把锁
    RecursiveAcquire {
        /// 锁名
        name: &'a str,
    },
    /// 销毁仍有等待者的原语
    DestroyWithWaiters {
        /// 原语种类
        kind: &'static str,
        /// 原语名
        name: &'a str,
    },
    /// 销毁仍被持有的锁
    DestroyWhileHeld {
        /// 锁名
        name: &'a str,
    },
    /// 同一 CPU 重复获取自旋锁
    SpinLockRecursion,
    /// 销毁仍被持有的自旋锁
    SpinLockHeldOnDrop,
}

impl fmt::Display for ContractViolation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockingInInterrupt { op, name } => {
                write!(f, "{op} on '{name}' called from interrupt context")
            }
            Self::SemaphoreOverflow { name } => write!(f, "semaphore '{name}' count overflow"),
            Self::LockNotHeld { op, name } => {
                write!(f, "{op} requires holding lock '{name}'")
            }
            Self::RecursiveAcquire { name } => {
                write!(f, "lock '{name}' acquired again by its holder")
            }
            Self::DestroyWithWaiters { kind, name } => {
                write!(f, "{kind} '{name}' destroyed with waiters")
            }
            Self::DestroyWhileHeld { name } => write!(f, "lock '{name}' destroyed while held"),
            Self::SpinLockRecursion => f.write_str("spin lock acquired twice on the same CPU"),
            Self::SpinLockHeldOnDrop => f.write_str("spin lock destroyed while held"),
        }
    }
}

fn default_handler(violation: &ContractViolation<'_>) -> ! {
    panic!("ksync: contract violation: {violation}");
}

/// 已注册的处理函数，空指针表示使用默认处理函数
static HANDLER: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// 注册违约处理函数
///
/// 处理函数不得返回；后注册的会覆盖先注册的。
pub fn register_violation_handler(handler: ViolationHandler) {
    HANDLER.store(handler as *mut (), Ordering::Release);
}

fn handler() -> ViolationHandler {
    let ptr = HANDLER.load(Ordering::Acquire);
    if ptr.is_null() {
        return default_handler;
    }
    // SAFETY: 非空值只可能由 register_violation_handler 从同类型的函数指针写入
    unsafe { core::mem::transmute::<*mut (), ViolationHandler>(ptr) }
}

/// 违约的唯一触发点
#[cold]
#[inline(never)]
#[track_caller]
pub fn violated(violation: ContractViolation<'_>) -> ! {
    let location = core::panic::Location::caller();
    log::error!("contract violation at {location}: {violation}");
    handler()(&violation)
}
