// ==========================================
// 订单履约管理台 - 可见性对账器
// ==========================================
// 职责: 重算订单行剩余可分配量并推导显示/隐藏状态
// 规则: 剩余量 = 原始承诺量 - 同组同订单全部分配行数量之和
//       剩余量为 0 隐藏，否则显示（双向切换，行可以重新出现）
// ==========================================
// 触发时机: 任何分配行创建/更新/删除之后、全量重载之后
// ==========================================

use crate::dataset::WorkingSet;
use crate::domain::VisibilityState;

/// 可见性对账器
///
/// 数量为 f64 小数，求和之差与 0 的比较使用 epsilon。
pub struct VisibilityReconciler {
    epsilon: f64,
}

impl VisibilityReconciler {
    /// 创建对账器
    ///
    /// # 参数
    /// - `epsilon`: 剩余量与 0 比较的容差
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// 对账单条订单行
    ///
    /// 找不到对应订单行时为空操作（不是错误）。
    ///
    /// # 返回
    /// 推导出的可见性状态；未命中订单行返回 None
    pub fn reconcile(
        &self,
        working_set: &mut WorkingSet,
        order_id: &str,
        product_code: &str,
    ) -> Option<VisibilityState> {
        let group = working_set.unification().resolve(product_code);

        // 同组同订单的分配行数量之和
        let allocated: f64 = working_set
            .lines()
            .iter()
            .filter(|l| {
                l.is_allocation() && l.order_id == order_id && group.contains(&l.product_code)
            })
            .map(|l| l.quantity)
            .sum();

        let order_line_id = working_set
            .lines()
            .iter()
            .find(|l| l.is_order() && l.order_id == order_id && group.contains(&l.product_code))
            .map(|l| l.line_id.clone())?;

        let line = working_set.line_mut(&order_line_id)?;
        let balance = line.original_committed_qty - allocated;
        line.remaining_balance = balance;
        // 可编辑数量不得超出新的剩余量
        if line.quantity > balance {
            line.quantity = balance.max(0.0);
        }

        let state = if balance.abs() <= self.epsilon {
            VisibilityState::Hidden
        } else {
            VisibilityState::Shown
        };
        working_set.set_visibility(&order_line_id, state);

        tracing::debug!(
            order_id,
            product_code,
            allocated,
            remaining_balance = balance,
            visibility = state.as_str(),
            "订单行可见性已对账"
        );

        Some(state)
    }

    /// 对账全部订单行（全量重载之后调用）
    pub fn reconcile_all(&self, working_set: &mut WorkingSet) {
        let targets: Vec<(String, String)> = working_set
            .lines()
            .iter()
            .filter(|l| l.is_order())
            .map(|l| (l.order_id.clone(), l.product_code.clone()))
            .collect();

        for (order_id, product_code) in targets {
            self.reconcile(working_set, &order_id, &product_code);
        }
    }
}
