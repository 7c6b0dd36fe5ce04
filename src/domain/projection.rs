// ==========================================
// 订单履约管理台 - 预测派生类型
// ==========================================
// 职责: 定义库存事件、预测日账、预测结果
// 红线: 派生数据，不持久化；随时可由三类输入重新生成
// ==========================================

use crate::domain::demand::DqNote;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 库存事件 - 归一化后的出库/入库数量
///
/// 采集器的输出、预测计算器的输入。
/// 出库与入库共用此结构，入库的次日偏移由计算器处理。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockEvent {
    /// 事件日期（出库: 已归一化；入库: 产出日，尚未偏移）
    pub date: NaiveDate,
    /// 数量（非负，允许小数）
    pub quantity: f64,
}

impl StockEvent {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// 预测日账 - 单日结余
///
/// 不变式:
/// - `opening_balance(0) == 现有库存`
/// - `opening_balance(d) == closing_balance(d-1)`  (d > 0)
/// - `closing_balance(d) == opening_balance(d) - outbound_qty(d) + inbound_qty(d)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDay {
    /// 日序号 0..=28
    pub day_index: usize,
    /// 日期（今天 + day_index）
    pub date: NaiveDate,
    /// 期初结余
    pub opening_balance: f64,
    /// 当日出库合计
    pub outbound_qty: f64,
    /// 当日入库合计（已含次日偏移）
    pub inbound_qty: f64,
    /// 期末结余（负数即缺货信号，不是错误）
    pub closing_balance: f64,
}

/// 预测结果 - 29 日滚动日账
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// 29 个日账桶（day_index 0..=28）
    pub days: Vec<ProjectionDay>,
    /// 前 8 日（day_index 0..=7）期末结余最小值
    pub min_balance_first_8_days: f64,
}

impl ProjectionResult {
    /// 是否存在缺货信号（区间内任一日期末结余为负）
    pub fn has_stockout(&self) -> bool {
        self.days.iter().any(|d| d.closing_balance < 0.0)
    }

    /// 取指定日序号的期末结余
    pub fn closing(&self, day_index: usize) -> Option<f64> {
        self.days.get(day_index).map(|d| d.closing_balance)
    }
}

/// 产品预测快照 - 引擎缓存的最新一次计算结果
///
/// 渲染层按产品编码读取；每次重算整体替换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    /// 规范产品编码（同一化编码组内任一编码均可查到同一份）
    pub product_code: String,
    /// 预测结果
    pub result: ProjectionResult,
    /// 本次采集产生的数据质量备注
    pub notes: Vec<DqNote>,
}
