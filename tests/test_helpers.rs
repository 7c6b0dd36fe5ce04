// ==========================================
// 集成测试共享辅助
// ==========================================

use chrono::NaiveDate;
use order_console::{DatasetBatch, DemandLine, NonVisibleOutflow, ProductionRecord};
use std::collections::HashMap;

/// 测试基准日
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 构建典型测试批量数据
///
/// - 产品 A 与 B 同一化（同一物理品项）
/// - 订单行: SO-1/A 原始承诺 100，已分配 60（LOT-1），剩余 40
/// - 库存: A 100
/// - 生产入库: A 今日产出 20
/// - 不可见出库: B 下挂 今日+2 出库 10
pub fn sample_batch() -> DatasetBatch {
    let order = DemandLine::new_order("A", "SO-1", 20.0, Some(d(2026, 8, 25)), 100.0, 40.0);
    let alloc = DemandLine::new_allocation("A", "SO-1", "LOT-1", 60.0, Some(d(2026, 8, 26)));

    let mut unification_groups = HashMap::new();
    unification_groups.insert("A".to_string(), vec!["B".to_string()]);

    let mut current_stock = HashMap::new();
    current_stock.insert("A".to_string(), 100.0);

    let mut non_visible_outflows = HashMap::new();
    non_visible_outflows.insert(
        "B".to_string(),
        vec![NonVisibleOutflow {
            date: "2026-08-25".to_string(),
            quantity: 10.0,
        }],
    );

    DatasetBatch {
        today: today(),
        order_lines: vec![order],
        allocation_lines: vec![alloc],
        production: vec![ProductionRecord {
            product_code: "A".to_string(),
            date: "2026-08-23".to_string(),
            quantity: 20.0,
        }],
        non_visible_outflows,
        unification_groups,
        current_stock,
    }
}

/// 取批量数据中首条订单行的 line_id
pub fn first_order_line_id(batch: &DatasetBatch) -> String {
    batch.order_lines[0].line_id.clone()
}
