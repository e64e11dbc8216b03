//! 同步原语错误类型
//!
//! 只覆盖可恢复的资源耗尽；违反调用约定不是错误值，而是走
//! [`violated`](crate::violated) 的致命路径。

use core::fmt;

/// 创建同步原语时可能返回的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// 内存不足，名字副本或等待通道分配失败 (-ENOMEM)
    NoMemory,
}

impl SyncError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            SyncError::NoMemory => -12,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NoMemory => f.write_str("out of memory"),
        }
    }
}

impl core::error::Error for SyncError {}

/// 同步原语操作结果
pub type SyncResult<T> = Result<T, SyncError>;
