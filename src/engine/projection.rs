// ==========================================
// 订单履约管理台 - 滚动预测计算器
// ==========================================
// 职责: 由现有库存 + 出库事件 + 入库事件推出 29 日滚动结余日账
// 红线: 纯函数——确定性、无副作用、无隐藏状态，可随时重跑
// ==========================================
// 数值语义: 数量为实数（允许小数）；结余可为负——负结余是
//           缺货信号而非错误
// 截断策略: 区间外事件静默丢弃，不计入结余也不上报（既定策略）
// ==========================================

use crate::domain::{ProjectionDay, ProjectionResult, StockEvent};
use chrono::{Duration, NaiveDate};
use tracing::instrument;

/// 预测区间天数（今天 至 今天+28）
pub const HORIZON_DAYS: usize = 29;

/// 最低结余观察窗口天数（day_index 0..=7）
pub const MIN_BALANCE_WINDOW_DAYS: usize = 8;

/// 滚动预测计算器
///
/// 无状态；所有输入显式传入，输出显式返回。
pub struct ProjectionCalculator;

impl ProjectionCalculator {
    /// 计算 29 日滚动结余日账
    ///
    /// # 参数
    /// - `current_stock`: 现有库存（day 0 期初结余）
    /// - `outbound`: 出库事件（日期已由采集器归一化，不早于基准日）
    /// - `inbound`: 入库事件（产出日原值，此处统一后移一天生效）
    /// - `today`: 基准日（day 0 的日期）
    ///
    /// # 算法
    /// 1. 建 29 个日账桶，date(d) = today + d
    /// 2. 出库事件落在区间内则累加到对应日，区间外静默丢弃
    /// 3. 入库事件生效日 = 产出日 + 1，落在区间内则累加，否则丢弃
    /// 4. 按日推进: opening(0)=现有库存, opening(d)=closing(d-1),
    ///    closing(d)=opening(d)-出库(d)+入库(d)
    /// 5. 最低结余 = min(closing(0..=7))
    #[instrument(skip(outbound, inbound), fields(outbound = outbound.len(), inbound = inbound.len()))]
    pub fn project(
        current_stock: f64,
        outbound: &[StockEvent],
        inbound: &[StockEvent],
        today: NaiveDate,
    ) -> ProjectionResult {
        Self::project_horizon(current_stock, outbound, inbound, today, HORIZON_DAYS)
    }

    /// 指定区间长度的日账计算
    ///
    /// 区间长度为 0 属于调用方编程错误，直接 panic；
    /// 数据质量问题（区间外事件）不在此列，按丢弃处理。
    pub fn project_horizon(
        current_stock: f64,
        outbound: &[StockEvent],
        inbound: &[StockEvent],
        today: NaiveDate,
        horizon_days: usize,
    ) -> ProjectionResult {
        assert!(horizon_days > 0, "预测区间长度必须大于 0");

        let last_date = today + Duration::days(horizon_days as i64 - 1);

        let mut outbound_qty = vec![0.0_f64; horizon_days];
        let mut inbound_qty = vec![0.0_f64; horizon_days];

        for event in outbound {
            if event.date >= today && event.date <= last_date {
                let idx = (event.date - today).num_days() as usize;
                outbound_qty[idx] += event.quantity;
            }
            // 区间外: 静默丢弃
        }

        for event in inbound {
            // X 日产出，X+1 日可用
            let effective = event.date + Duration::days(1);
            if effective >= today && effective <= last_date {
                let idx = (effective - today).num_days() as usize;
                inbound_qty[idx] += event.quantity;
            }
        }

        let mut days = Vec::with_capacity(horizon_days);
        let mut opening = current_stock;
        for d in 0..horizon_days {
            let closing = opening - outbound_qty[d] + inbound_qty[d];
            days.push(ProjectionDay {
                day_index: d,
                date: today + Duration::days(d as i64),
                opening_balance: opening,
                outbound_qty: outbound_qty[d],
                inbound_qty: inbound_qty[d],
                closing_balance: closing,
            });
            opening = closing;
        }

        let window = MIN_BALANCE_WINDOW_DAYS.min(horizon_days);
        let min_balance_first_8_days = days[..window]
            .iter()
            .map(|d| d.closing_balance)
            .fold(f64::INFINITY, f64::min);

        ProjectionResult {
            days,
            min_balance_first_8_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2026, 8, 23)
    }

    #[test]
    fn test_day_zero_anchor_and_ledger_continuity() {
        let outbound = vec![
            StockEvent::new(d(2026, 8, 24), 10.0),
            StockEvent::new(d(2026, 9, 5), 3.5),
        ];
        let inbound = vec![StockEvent::new(d(2026, 8, 27), 8.0)];
        let result = ProjectionCalculator::project(100.0, &outbound, &inbound, today());

        assert_eq!(result.days.len(), HORIZON_DAYS);
        assert_eq!(result.days[0].opening_balance, 100.0);
        for w in result.days.windows(2) {
            assert_eq!(w[1].opening_balance, w[0].closing_balance);
        }
        for day in &result.days {
            let expected = day.opening_balance - day.outbound_qty + day.inbound_qty;
            assert!((day.closing_balance - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_idempotence() {
        let outbound = vec![StockEvent::new(d(2026, 8, 25), 7.25)];
        let inbound = vec![StockEvent::new(d(2026, 8, 30), 2.5)];
        let a = ProjectionCalculator::project(50.0, &outbound, &inbound, today());
        let b = ProjectionCalculator::project(50.0, &outbound, &inbound, today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_horizon_truncation_outbound() {
        // 区间 +5 天的出库对任何一天都没有贡献
        let far = today() + Duration::days(HORIZON_DAYS as i64 + 5);
        let outbound = vec![StockEvent::new(far, 40.0)];
        let result = ProjectionCalculator::project(100.0, &outbound, &[], today());

        for day in &result.days {
            assert_eq!(day.closing_balance, 100.0);
        }
    }

    #[test]
    fn test_production_offset_lands_on_next_day() {
        // 今日产出只贡献 day 1，绝不贡献 day 0
        let inbound = vec![StockEvent::new(today(), 20.0)];
        let result = ProjectionCalculator::project(0.0, &[], &inbound, today());

        assert_eq!(result.days[0].inbound_qty, 0.0);
        assert_eq!(result.days[1].inbound_qty, 20.0);
    }

    #[test]
    fn test_production_on_last_day_dropped() {
        // 产出日落在 day 28，其生效日越界，丢弃
        let last = today() + Duration::days(HORIZON_DAYS as i64 - 1);
        let inbound = vec![StockEvent::new(last, 20.0)];
        let result = ProjectionCalculator::project(10.0, &[], &inbound, today());
        assert_eq!(result.days[HORIZON_DAYS - 1].closing_balance, 10.0);
    }

    #[test]
    fn test_scenario_outbound_and_production_same_day() {
        // 库存 100，今日出库 30，今日产出 20
        // closing(0) = 70, closing(1) = 90
        let outbound = vec![StockEvent::new(today(), 30.0)];
        let inbound = vec![StockEvent::new(today(), 20.0)];
        let result = ProjectionCalculator::project(100.0, &outbound, &inbound, today());

        assert_eq!(result.closing(0), Some(70.0));
        assert_eq!(result.closing(1), Some(90.0));
    }

    #[test]
    fn test_scenario_overdue_normalized_outbound() {
        // 逾期需求已由采集器归一化到 day 0: closing(0) = 50 - 10 = 40
        let outbound = vec![StockEvent::new(today(), 10.0)];
        let result = ProjectionCalculator::project(50.0, &outbound, &[], today());
        assert_eq!(result.closing(0), Some(40.0));
    }

    #[test]
    fn test_min_balance_first_8_days() {
        // day 3 出库 60 导致前 8 日最低点 -10，day 10 的回升不影响窗口
        let outbound = vec![StockEvent::new(today() + Duration::days(3), 60.0)];
        let inbound = vec![StockEvent::new(today() + Duration::days(9), 100.0)];
        let result = ProjectionCalculator::project(50.0, &outbound, &inbound, today());

        assert_eq!(result.min_balance_first_8_days, -10.0);
        assert!(result.has_stockout());
    }

    #[test]
    fn test_negative_balance_is_signal_not_error() {
        let outbound = vec![StockEvent::new(today(), 75.5)];
        let result = ProjectionCalculator::project(50.0, &outbound, &[], today());
        assert_eq!(result.closing(0), Some(-25.5));
    }

    #[test]
    #[should_panic(expected = "预测区间长度必须大于 0")]
    fn test_zero_horizon_panics() {
        ProjectionCalculator::project_horizon(0.0, &[], &[], today(), 0);
    }
}
