// ==========================================
// 订单履约管理台 - 领域基础类型
// ==========================================
// 职责: 定义需求行类别、可见性状态等基础枚举
// 红线: 不含任何计算逻辑
// ==========================================

use serde::{Deserialize, Serialize};

/// 需求行类别
///
/// - `Order`: 订单行，数量/日期仍可由用户编辑，受剩余可分配量约束
/// - `Allocation`: 分配行，已承诺到具体出库批次；按批次 ID 联动编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandKind {
    /// 订单行（可编辑）
    Order,
    /// 分配行（已承诺批次）
    Allocation,
}

impl DemandKind {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            DemandKind::Order => "ORDER",
            DemandKind::Allocation => "ALLOCATION",
        }
    }
}

/// 订单行可见性状态
///
/// 派生状态: 剩余可分配量为 0 时隐藏，否则显示。
/// 分配行数量变化后必须重新推导（双向切换，行可以重新出现）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityState {
    /// 显示
    Shown,
    /// 隐藏（剩余可分配量为 0）
    Hidden,
}

impl VisibilityState {
    pub fn as_str(&self) -> &str {
        match self {
            VisibilityState::Shown => "SHOWN",
            VisibilityState::Hidden => "HIDDEN",
        }
    }

    /// 是否隐藏
    pub fn is_hidden(&self) -> bool {
        matches!(self, VisibilityState::Hidden)
    }
}
