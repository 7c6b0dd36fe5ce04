// ==========================================
// 订单履约管理台 - 需求与入库实体
// ==========================================
// 职责: 定义需求行、生产入库、不可见出库等实体
// 红线: 不含数据访问逻辑，不含预测计算逻辑
// ==========================================
// 输入来源: 批量加载接口（订单行/分配行/不可见出库/同一化编码组）
// ==========================================

use crate::domain::types::DemandKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// DemandLine - 需求行（出库承诺）
// ==========================================

/// 需求行 - 一条出库承诺
///
/// 订单行与分配行共用同一结构，按 `kind` 区分：
/// - 订单行: `quantity`/`outbound_date` 可编辑，`quantity` 受 `remaining_balance` 约束
/// - 分配行: 携带 `lot_id`，同批次的行编辑时联动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandLine {
    /// 行 ID（本地生成，会话内唯一）
    pub line_id: String,
    /// 行类别
    pub kind: DemandKind,
    /// 产品编码
    pub product_code: String,
    /// 订单 ID
    pub order_id: String,
    /// 出库批次 ID（仅分配行持有）
    pub lot_id: Option<String>,
    /// 数量（非负，允许小数）
    pub quantity: f64,
    /// 出库日期（缺失或已过期的承诺按"今天"参与预测）
    pub outbound_date: Option<NaiveDate>,
    /// 剩余可分配量（仅订单行有意义，服务端为权威来源）
    pub remaining_balance: f64,
    /// 原始承诺数量（仅订单行有意义）
    pub original_committed_qty: f64,
}

impl DemandLine {
    /// 创建订单行
    pub fn new_order(
        product_code: &str,
        order_id: &str,
        quantity: f64,
        outbound_date: Option<NaiveDate>,
        original_committed_qty: f64,
        remaining_balance: f64,
    ) -> Self {
        Self {
            line_id: Uuid::new_v4().to_string(),
            kind: DemandKind::Order,
            product_code: product_code.to_string(),
            order_id: order_id.to_string(),
            lot_id: None,
            quantity,
            outbound_date,
            remaining_balance,
            original_committed_qty,
        }
    }

    /// 创建分配行
    pub fn new_allocation(
        product_code: &str,
        order_id: &str,
        lot_id: &str,
        quantity: f64,
        outbound_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            line_id: Uuid::new_v4().to_string(),
            kind: DemandKind::Allocation,
            product_code: product_code.to_string(),
            order_id: order_id.to_string(),
            lot_id: Some(lot_id.to_string()),
            quantity,
            outbound_date,
            remaining_balance: 0.0,
            original_committed_qty: 0.0,
        }
    }

    /// 是否订单行
    pub fn is_order(&self) -> bool {
        self.kind == DemandKind::Order
    }

    /// 是否分配行
    pub fn is_allocation(&self) -> bool {
        self.kind == DemandKind::Allocation
    }
}

// ==========================================
// ProductionEntry - 生产入库事件
// ==========================================

/// 生产入库事件
///
/// 生效日期为自身日期的次日（X 日产出，X+1 日可用）。
/// 次日偏移由预测计算器统一处理，此处仅保存原始日期。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionEntry {
    /// 产品编码
    pub product_code: String,
    /// 产出日期
    pub date: NaiveDate,
    /// 产出数量
    pub quantity: f64,
}

/// 生产入库原始记录（加载接口传入，日期尚未解析）
///
/// 日期解析失败的记录被排除在预测之外，并生成数据质量备注，
/// 不会中断加载。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub product_code: String,
    /// 原始日期文本（格式 YYYY-MM-DD）
    pub date: String,
    pub quantity: f64,
}

// ==========================================
// NonVisibleOutflow - 不可见出库承诺
// ==========================================

/// 不可见出库承诺
///
/// 服务端汇总的、不在当前加载数据集中的出库承诺。
/// 没有它，预测只反映屏幕上的需求而非总需求。
/// 日期由服务端解析完成，但传输层仍是文本，采集时解析；
/// 解析失败按数据质量问题降级处理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonVisibleOutflow {
    /// 出库日期（原始文本，格式 YYYY-MM-DD）
    pub date: String,
    /// 出库数量
    pub quantity: f64,
}

// ==========================================
// AllocationMutationResult - 分配变更回执
// ==========================================

/// 分配变更回执（服务端返回）
///
/// 可见性判定优先采用服务端的 `remaining_balance`；
/// 逐日预测数字始终采用本地最新计算结果，服务端的
/// `server_min_balance` 仅用于对账告警。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationMutationResult {
    pub order_id: String,
    pub product_code: String,
    /// 服务端重算后的剩余可分配量
    pub remaining_balance: f64,
    /// 服务端刷新的现有库存（可选）
    pub refreshed_stock: Option<f64>,
    /// 服务端独立计算的前 8 日最低结余（可选，仅对账用）
    pub server_min_balance: Option<f64>,
}

// ==========================================
// DqNote - 数据质量备注
// ==========================================

/// 数据质量备注
///
/// 记录被降级排除的数据（如无法解析的日期）。
/// 只是观察项，不是错误，调用方自行决定是否展示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqNote {
    /// 产品编码
    pub product_code: String,
    /// 问题字段
    pub field: String,
    /// 原始值
    pub raw_value: String,
    /// 排除原因
    pub reason: String,
}

/// 数据集加载报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// 加载的订单行数
    pub order_line_count: usize,
    /// 加载的分配行数
    pub allocation_line_count: usize,
    /// 加载的生产入库事件数（解析成功）
    pub production_count: usize,
    /// 数据质量备注
    pub notes: Vec<DqNote>,
}
