// ==========================================
// 订单履约管理台 - 需求采集器
// ==========================================
// 职责: 为指定产品汇总全部出库承诺（可编辑订单行 + 已承诺分配行 + 不可见出库）
// 红线: 每次调用实时读取当前值，绝不缓存——连续快速编辑必须立即反映
// ==========================================
// 输入: 工作数据集 + 可编辑值读取能力 + 产品编码 + 基准日
// 输出: 归一化出库事件列表 + 数据质量备注
// ==========================================

use crate::dataset::WorkingSet;
use crate::domain::{DemandKind, DqNote, StockEvent};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::instrument;

/// 可编辑行值读取能力
///
/// 订单行的数量/日期在 UI 上仍可编辑，采集器通过此抽象在
/// 调用时刻读取"当前值"，而不自己持有这些值。
/// 默认实现读工作数据集中已提交的行值；UI 层可注入实时实现。
pub trait EditableLineStore {
    /// 当前可编辑数量（未设置返回 None，按 0 处理）
    fn current_quantity(&self, line_id: &str) -> Option<f64>;
    /// 当前可编辑出库日期（允许未设置）
    fn current_outbound_date(&self, line_id: &str) -> Option<NaiveDate>;
}

/// 需求采集器
///
/// 无状态；所有输入显式传入。
pub struct DemandCollector;

impl DemandCollector {
    /// 采集产品的全部出库承诺
    ///
    /// # 算法
    /// 1. 解析同一化编码组
    /// 2. 经需求索引取候选行，按类别取有效数量/日期
    ///    （订单行经 `EditableLineStore` 读当前值）
    /// 3. 丢弃数量为 0 的行
    /// 4. 无日期或早于基准日的承诺归一化到基准日
    ///    （逾期需求前移到首个可预测日，避免从预测区间里消失）
    /// 5. 追加同组每个编码的不可见出库，日期原样采用；
    ///    解析失败的条目降级为数据质量备注
    /// 6. 不做去重——各行本就是彼此独立的承诺，允许同日
    ///
    /// # 返回
    /// (出库事件列表, 数据质量备注)
    #[instrument(skip(working_set, store))]
    pub fn collect(
        working_set: &WorkingSet,
        store: &dyn EditableLineStore,
        product_code: &str,
        today: NaiveDate,
    ) -> (Vec<StockEvent>, Vec<DqNote>) {
        let group = working_set.unification().resolve(product_code);
        let mut events: Vec<StockEvent> = Vec::new();
        let mut notes: Vec<DqNote> = Vec::new();

        // 同组各编码下索引着同一批行，按行 ID 去重遍历
        let mut seen: HashSet<&str> = HashSet::new();
        for code in &group {
            for line_id in working_set.index().index_of(code) {
                if !seen.insert(line_id.as_str()) {
                    continue;
                }
                let Some(line) = working_set.line(line_id) else {
                    continue;
                };

                let (quantity, date) = match line.kind {
                    DemandKind::Order => (
                        store.current_quantity(line_id).unwrap_or(0.0),
                        store.current_outbound_date(line_id),
                    ),
                    DemandKind::Allocation => (line.quantity, line.outbound_date),
                };

                if quantity <= 0.0 {
                    continue;
                }

                let effective_date = match date {
                    Some(d) if d >= today => d,
                    Some(d) => {
                        // 逾期承诺前移到基准日
                        tracing::debug!(line_id = %line_id, overdue = %d, "逾期出库承诺归一化到基准日");
                        today
                    }
                    None => today,
                };

                events.push(StockEvent::new(effective_date, quantity));
            }
        }

        // 不可见出库: 屏幕之外的承诺也计入总需求
        for code in &group {
            for outflow in working_set.non_visible_of(code) {
                match NaiveDate::parse_from_str(&outflow.date, "%Y-%m-%d") {
                    Ok(date) => events.push(StockEvent::new(date, outflow.quantity)),
                    Err(e) => {
                        tracing::warn!(
                            product_code = %code,
                            raw_date = %outflow.date,
                            "不可见出库日期无法解析，已排除"
                        );
                        notes.push(DqNote {
                            product_code: code.clone(),
                            field: "non_visible_outflow.date".to_string(),
                            raw_value: outflow.date.clone(),
                            reason: format!("日期解析失败: {}", e),
                        });
                    }
                }
            }
        }

        (events, notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetBatch;
    use crate::domain::{DemandLine, NonVisibleOutflow};
    use std::collections::HashMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2026, 8, 23)
    }

    fn load_ws(
        orders: Vec<DemandLine>,
        allocations: Vec<DemandLine>,
        non_visible: HashMap<String, Vec<NonVisibleOutflow>>,
        groups: HashMap<String, Vec<String>>,
    ) -> WorkingSet {
        let mut ws = WorkingSet::empty();
        ws.load(DatasetBatch {
            today: today(),
            order_lines: orders,
            allocation_lines: allocations,
            non_visible_outflows: non_visible,
            unification_groups: groups,
            ..Default::default()
        });
        ws
    }

    #[test]
    fn test_zero_quantity_lines_discarded() {
        let order = DemandLine::new_order("A", "SO-1", 0.0, Some(today()), 10.0, 10.0);
        let ws = load_ws(vec![order], vec![], HashMap::new(), HashMap::new());

        let (events, notes) = DemandCollector::collect(&ws, &ws, "A", today());
        assert!(events.is_empty());
        assert!(notes.is_empty());
    }

    #[test]
    fn test_overdue_and_undated_normalized_to_today() {
        let overdue = DemandLine::new_order("A", "SO-1", 10.0, Some(d(2026, 8, 21)), 10.0, 10.0);
        let undated = DemandLine::new_order("A", "SO-2", 5.0, None, 5.0, 5.0);
        let ws = load_ws(vec![overdue, undated], vec![], HashMap::new(), HashMap::new());

        let (events, _) = DemandCollector::collect(&ws, &ws, "A", today());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.date == today()));
    }

    #[test]
    fn test_unified_code_event_reachable_from_sibling() {
        // 事件只挂在编码 B 下，从 A 采集也必须拿到
        let alloc = DemandLine::new_allocation("B", "SO-1", "LOT-1", 7.0, Some(d(2026, 8, 26)));
        let mut groups = HashMap::new();
        groups.insert("A".to_string(), vec!["B".to_string()]);
        let ws = load_ws(vec![], vec![alloc], HashMap::new(), groups);

        let (events, _) = DemandCollector::collect(&ws, &ws, "A", today());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].quantity, 7.0);
        assert_eq!(events[0].date, d(2026, 8, 26));
    }

    #[test]
    fn test_non_visible_outflows_appended_verbatim() {
        let mut non_visible = HashMap::new();
        non_visible.insert(
            "A".to_string(),
            vec![
                NonVisibleOutflow {
                    date: "2026-08-30".to_string(),
                    quantity: 12.0,
                },
                NonVisibleOutflow {
                    date: "##bad##".to_string(),
                    quantity: 4.0,
                },
            ],
        );
        let ws = load_ws(vec![], vec![], non_visible, HashMap::new());

        let (events, notes) = DemandCollector::collect(&ws, &ws, "A", today());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, d(2026, 8, 30));
        // 解析失败的条目降级为备注，不中断采集
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].field, "non_visible_outflow.date");
    }

    #[test]
    fn test_shared_dates_not_deduplicated() {
        let o1 = DemandLine::new_order("A", "SO-1", 3.0, Some(d(2026, 8, 25)), 3.0, 3.0);
        let o2 = DemandLine::new_order("A", "SO-2", 4.0, Some(d(2026, 8, 25)), 4.0, 4.0);
        let ws = load_ws(vec![o1, o2], vec![], HashMap::new(), HashMap::new());

        let (events, _) = DemandCollector::collect(&ws, &ws, "A", today());
        // 同日的两条承诺都保留
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_reads_live_values_from_store() {
        struct LiveStore;
        impl EditableLineStore for LiveStore {
            fn current_quantity(&self, _line_id: &str) -> Option<f64> {
                Some(99.0)
            }
            fn current_outbound_date(&self, _line_id: &str) -> Option<NaiveDate> {
                Some(NaiveDate::from_ymd_opt(2026, 8, 28).unwrap())
            }
        }

        let order = DemandLine::new_order("A", "SO-1", 1.0, None, 100.0, 100.0);
        let ws = load_ws(vec![order], vec![], HashMap::new(), HashMap::new());

        let (events, _) = DemandCollector::collect(&ws, &LiveStore, "A", today());
        // 订单行取注入实现的实时值，而不是已提交值
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].quantity, 99.0);
        assert_eq!(events[0].date, d(2026, 8, 28));
    }
}
