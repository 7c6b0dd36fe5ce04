// ==========================================
// 订单履约管理台 - 领域模型层
// ==========================================
// 职责: 定义领域实体与派生类型
// 红线: 不含数据访问逻辑，不含引擎逻辑
// ==========================================

pub mod demand;
pub mod projection;
pub mod types;

// 重导出核心类型
pub use demand::{
    AllocationMutationResult, DemandLine, DqNote, LoadReport, NonVisibleOutflow, ProductionEntry,
    ProductionRecord,
};
pub use projection::{ProjectionDay, ProjectionResult, ProjectionSnapshot, StockEvent};
pub use types::{DemandKind, VisibilityState};
