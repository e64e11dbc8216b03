//! 原语的创建与销毁
//!
//! 三种阻塞原语的生命周期完全相同：复制名字、创建以该名字命名的等待通道；
//! 销毁时确认通道中没有等待者。这里集中实现这些步骤。

use alloc::boxed::Box;
use alloc::string::String;

use crate::{
    ContractViolation, ExecContext, RawSpinLockGuard, SyncError, SyncResult, WaitChannel,
    WaitChannelOps, violated,
};

/// 每个原语都拥有的资源：名字副本和等待通道
pub(crate) struct Parts {
    pub(crate) name: String,
    pub(crate) wchan: Box<dyn WaitChannel>,
}

/// 分配原语的名字副本和等待通道
///
/// 任一步失败都返回 [`SyncError::NoMemory`]，已完成的分配随之释放。
pub(crate) fn create_parts(
    kind: &'static str,
    name: &str,
    ops: &dyn WaitChannelOps,
) -> SyncResult<Parts> {
    let result = dup_name(name).and_then(|name| {
        let wchan = ops.create(&name)?;
        Ok(Parts { name, wchan })
    });
    match &result {
        Ok(_) => log::trace!("{kind} '{name}' created"),
        Err(err) => log::warn!("failed to create {kind} '{name}': {err}"),
    }
    result
}

/// 使用可失败的分配复制名字
fn dup_name(name: &str) -> SyncResult<String> {
    let mut copy = String::new();
    copy.try_reserve_exact(name.len())
        .map_err(|_| SyncError::NoMemory)?;
    copy.push_str(name);
    Ok(copy)
}

/// 销毁前确认没有执行上下文在通道上等待
pub(crate) fn ensure_no_waiters(kind: &'static str, parts: &Parts, guard: &RawSpinLockGuard<'_>) {
    if !parts.wchan.is_empty(guard) {
        violated(ContractViolation::DestroyWithWaiters {
            kind,
            name: &parts.name,
        });
    }
    log::trace!("{kind} '{}' destroyed", parts.name);
}

/// 阻塞操作的前置检查：调用者必须可以睡眠
///
/// 即使本次调用实际上不会阻塞也要检查。
#[inline]
pub(crate) fn ensure_blockable(cx: &dyn ExecContext, op: &'static str, name: &str) {
    if cx.in_interrupt() {
        violated(ContractViolation::BlockingInInterrupt { op, name });
    }
}
