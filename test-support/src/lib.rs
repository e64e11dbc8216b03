//! 测试支持 crate
//!
//! 在宿主机上为内核 crate 的单元测试提供 Mock 实现和测试工具。
//!
//! 与内核 crate 不同，这里依赖 std：每个宿主线程被视为一个独立的 CPU 和执行上下文，
//! 等待队列通过 `std::thread::park` / `unpark` 挂起和唤醒线程。

pub mod mock;

use std::time::{Duration, Instant};

/// 轮询 `cond` 直到其成立，超过 `timeout` 则 panic
///
/// 用于等待另一个线程到达某个可观察的状态（例如已经睡在等待队列上）。
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !cond() {
        if Instant::now() >= deadline {
            panic!("condition not reached within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
