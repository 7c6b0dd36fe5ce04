// ==========================================
// 订单履约管理台 - 重算调度器
// ==========================================
// 职责: 把同一产品的连续编辑合并为一次延迟重算，
//       多个产品的重算结果聚合为一次下游通知
// 红线: 重算观察的是触发时刻的最新值，绝不是排队时刻的快照
// ==========================================
// 取消语义: 每次新编辑重置延迟（已排队产品保留，不提前也不丢弃）；
//           编辑不停则重算一直顺延——这是对打字速度交互的既定取舍
// ==========================================

use crate::engine::events::ProjectionTrigger;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 重算处理器
///
/// 调度器定时触发时回调；实现方（预测引擎）在回调中
/// 实时读取工作数据集，保证观察到最新值。
pub trait RecomputeHandler: Send + Sync {
    /// 重算单个产品（同一批内每个产品恰好调用一次，顺序不限）
    fn recompute(&self, product_code: &str);

    /// 本批全部重算完成后的聚合通知（一批只发一次）
    fn batch_completed(&self, product_codes: &[String], trigger: ProjectionTrigger);
}

/// 调度器内部状态
struct SchedulerState {
    /// 待重算产品集合
    pending: HashSet<String>,
    /// 世代号——每次 schedule/cancel 递增，旧定时器据此自行作废
    generation: u64,
    /// 最近一次触发类型（聚合通知采用）
    trigger: ProjectionTrigger,
}

/// 重算调度器
///
/// 防抖实现: 可变的世代号 + 待重算集合。每次 `schedule`
/// 递增世代号并派生一个新定时器；定时器醒来时若世代号
/// 已变化则直接作废，从而实现"重置延迟"。
///
/// 必须在 tokio 运行时内使用（定时器经 `tokio::spawn` 派生）。
pub struct RecomputeScheduler {
    state: Arc<Mutex<SchedulerState>>,
    handler: Arc<dyn RecomputeHandler>,
    delay: Duration,
}

impl RecomputeScheduler {
    /// 创建调度器
    ///
    /// # 参数
    /// - `handler`: 重算处理器
    /// - `delay`: 防抖延迟（典型值 100~200 毫秒）
    pub fn new(handler: Arc<dyn RecomputeHandler>, delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                pending: HashSet::new(),
                generation: 0,
                trigger: ProjectionTrigger::ManualFlush,
            })),
            handler,
            delay,
        }
    }

    /// 登记产品待重算并（重新）启动延迟定时器
    ///
    /// 定时器到期且期间无新调用时，集合内每个产品恰好重算一次，
    /// 集合清空，随后发出一次聚合完成通知。
    pub fn schedule(&self, product_code: &str, trigger: ProjectionTrigger) {
        let generation = {
            let Ok(mut state) = self.state.lock() else {
                tracing::error!("调度器状态锁中毒，本次调度丢弃");
                return;
            };
            state.pending.insert(product_code.to_string());
            state.generation += 1;
            state.trigger = trigger;
            state.generation
        };

        tracing::debug!(product_code, generation, "重算已登记，延迟定时器重置");

        let state = Arc::clone(&self.state);
        let handler = Arc::clone(&self.handler);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let (batch, trigger) = {
                let Ok(mut state) = state.lock() else {
                    return;
                };
                if state.generation != generation {
                    // 期间有新的编辑重置了延迟，本定时器作废
                    return;
                }
                let batch: Vec<String> = state.pending.drain().collect();
                (batch, state.trigger.clone())
            };

            if batch.is_empty() {
                return;
            }

            // 锁已释放，处理器在此刻实时读取最新值
            for code in &batch {
                handler.recompute(code);
            }
            handler.batch_completed(&batch, trigger);

            tracing::debug!(products = batch.len(), "合并重算完成");
        });
    }

    /// 立即冲刷: 同步重算全部待重算产品，不等定时器
    ///
    /// # 返回
    /// 本次实际重算的产品编码
    pub fn flush_now(&self) -> Vec<String> {
        let batch: Vec<String> = {
            let Ok(mut state) = self.state.lock() else {
                tracing::error!("调度器状态锁中毒，冲刷失败");
                return Vec::new();
            };
            // 世代号递增使在途定时器作废
            state.generation += 1;
            state.pending.drain().collect()
        };

        if batch.is_empty() {
            return batch;
        }

        for code in &batch {
            self.handler.recompute(code);
        }
        self.handler
            .batch_completed(&batch, ProjectionTrigger::ManualFlush);
        batch
    }

    /// 取消全部待重算（在途定时器作废，集合清空）
    pub fn cancel(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.generation += 1;
            let dropped = state.pending.len();
            state.pending.clear();
            tracing::debug!(dropped, "待重算集合已取消");
        }
    }

    /// 当前待重算产品数
    pub fn pending_count(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }
}
