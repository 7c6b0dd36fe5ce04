// ==========================================
// 订单履约管理台 - 引擎层
// ==========================================
// 职责: 实现滚动库存预测的业务规则引擎
// 红线: 计算器保持纯函数; 所有降级排除必须输出数据质量备注
// ==========================================

pub mod collector;
pub mod demand_index;
pub mod error;
pub mod events;
pub mod projection;
pub mod recompute;
pub mod scheduler;
pub mod unification;
pub mod visibility;

// 重导出核心引擎
pub use collector::{DemandCollector, EditableLineStore};
pub use demand_index::DemandIndex;
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ProjectionEvent, ProjectionEventPublisher,
    ProjectionTrigger,
};
pub use projection::{ProjectionCalculator, HORIZON_DAYS, MIN_BALANCE_WINDOW_DAYS};
pub use recompute::ProjectionEngine;
pub use scheduler::{RecomputeHandler, RecomputeScheduler};
pub use unification::UnificationMap;
pub use visibility::VisibilityReconciler;
