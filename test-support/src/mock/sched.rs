//! 调度相关的 Mock 实现
//!
//! 注意：这里不直接依赖 `ksync` crate（避免循环依赖）。
//! `ksync` crate 在 `cfg(test)` 下为这些类型实现其 trait
//! （`ExecContext`、`WaitChannel`、`WaitChannelOps`）。
//!
//! - [`MockTask`]：执行上下文，带唯一 ID 和可切换的"中断上下文"标志
//! - [`MockWaitQueue`]：基于线程 park/unpark 的等待队列
//! - [`MockWaitQueueOps`]：等待队列工厂，可统计存活队列、注入分配失败和伪造等待者

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, Thread};

static NEXT_TASK_ID: AtomicUsize = AtomicUsize::new(1);

/// Mock 的执行上下文
pub struct MockTask {
    id: usize,
    in_interrupt: AtomicBool,
}

impl MockTask {
    /// 创建一个具有唯一 ID 的上下文
    pub fn new() -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            in_interrupt: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn in_interrupt(&self) -> bool {
        self.in_interrupt.load(Ordering::Relaxed)
    }

    /// 模拟进入/离开中断处理程序
    pub fn set_in_interrupt(&self, in_interrupt: bool) {
        self.in_interrupt.store(in_interrupt, Ordering::Relaxed);
    }
}

impl Default for MockTask {
    fn default() -> Self {
        Self::new()
    }
}

/// 队列中的一个睡眠者
struct Sleeper {
    thread: Thread,
    woken: AtomicBool,
}

impl Sleeper {
    fn current() -> Arc<Self> {
        Arc::new(Self {
            thread: thread::current(),
            woken: AtomicBool::new(false),
        })
    }

    fn wake(&self) {
        self.woken.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

struct QueueInner {
    label: String,
    sleepers: Mutex<VecDeque<Arc<Sleeper>>>,
}

impl QueueInner {
    fn sleepers(&self) -> MutexGuard<'_, VecDeque<Arc<Sleeper>>> {
        self.sleepers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock 的等待队列
pub struct MockWaitQueue {
    inner: Arc<QueueInner>,
}

impl MockWaitQueue {
    /// 创建一个独立的空队列（不经过工厂统计）
    pub fn new(label: &str) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                label: label.to_string(),
                sleepers: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// 入队、释放 `guard`，然后挂起当前线程直到被唤醒
    ///
    /// 入队发生在 `guard` 释放之前，所以持有同一把锁的唤醒者一定能看到本睡眠者。
    pub fn sleep<G>(&self, guard: G) {
        let me = Sleeper::current();
        self.inner.sleepers().push_back(Arc::clone(&me));
        drop(guard);

        while !me.woken.load(Ordering::Acquire) {
            thread::park();
        }
    }

    /// 唤醒队首的睡眠者，队列为空时返回 false
    pub fn wake_one(&self) -> bool {
        let sleeper = self.inner.sleepers().pop_front();
        match sleeper {
            Some(sleeper) => {
                sleeper.wake();
                true
            }
            None => false,
        }
    }

    /// 唤醒全部睡眠者，返回唤醒的数量
    pub fn wake_all(&self) -> usize {
        let drained: Vec<_> = self.inner.sleepers().drain(..).collect();
        for sleeper in &drained {
            sleeper.wake();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.inner.sleepers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mock 的等待队列工厂
pub struct MockWaitQueueOps {
    queues: Mutex<Vec<Weak<QueueInner>>>,
    fail_next: AtomicBool,
}

impl MockWaitQueueOps {
    pub const fn new() -> Self {
        Self {
            queues: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    fn queues(&self) -> MutexGuard<'_, Vec<Weak<QueueInner>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 创建队列；若之前调用过 [`fail_next_create`](Self::fail_next_create)，本次返回 None
    pub fn create(&self, label: &str) -> Option<MockWaitQueue> {
        if self.fail_next.swap(false, Ordering::AcqRel) {
            return None;
        }
        let queue = MockWaitQueue::new(label);
        let mut queues = self.queues();
        queues.retain(|weak| weak.strong_count() > 0);
        queues.push(Arc::downgrade(&queue.inner));
        Some(queue)
    }

    /// 让下一次 create 模拟分配失败
    pub fn fail_next_create(&self) {
        self.fail_next.store(true, Ordering::Release);
    }

    /// 仍存活（尚未 drop）的队列数量
    pub fn live_channels(&self) -> usize {
        self.queues()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// 名为 `label` 的存活队列上的睡眠者总数
    pub fn sleepers(&self, label: &str) -> usize {
        self.live(label).iter().map(|queue| queue.sleepers().len()).sum()
    }

    /// 在名为 `label` 的存活队列上登记一个永不等待的伪睡眠者
    ///
    /// 用于构造"销毁时仍有等待者"的场景。找不到队列时返回 false。
    pub fn inject_sleeper(&self, label: &str) -> bool {
        let live = self.live(label);
        for queue in &live {
            queue.sleepers().push_back(Sleeper::current());
        }
        !live.is_empty()
    }

    fn live(&self, label: &str) -> Vec<Arc<QueueInner>> {
        self.queues()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|queue| queue.label == label)
            .collect()
    }
}

impl Default for MockWaitQueueOps {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局 Mock 实例
pub static MOCK_WAIT_QUEUE_OPS: MockWaitQueueOps = MockWaitQueueOps::new();
