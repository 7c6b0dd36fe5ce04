// ==========================================
// 订单履约管理台 - 核心库
// ==========================================
// 系统定位: 滚动库存预测引擎（进程内计算库）
// 职责: 为可见订单/分配行引用的每个产品维护 29 日滚动结余预测，
//       并在连续快速编辑下保持一致，而不是每次按键全量重推
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与派生类型
pub mod domain;

// 数据集层 - 工作数据集
pub mod dataset;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AllocationMutationResult, DemandKind, DemandLine, DqNote, LoadReport, NonVisibleOutflow,
    ProductionEntry, ProductionRecord, ProjectionDay, ProjectionResult, ProjectionSnapshot,
    StockEvent, VisibilityState,
};

// 数据集
pub use dataset::{DatasetBatch, DatasetError, DatasetResult, WorkingSet};

// 引擎
pub use engine::{
    DemandCollector, DemandIndex, EditableLineStore, EngineError, EngineResult,
    NoOpEventPublisher, ProjectionCalculator, ProjectionEngine, ProjectionEvent,
    ProjectionEventPublisher, ProjectionTrigger, RecomputeHandler, RecomputeScheduler,
    UnificationMap, VisibilityReconciler, HORIZON_DAYS, MIN_BALANCE_WINDOW_DAYS,
};

// 配置
pub use config::EngineConfig;

// API
pub use api::ProjectionApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单履约管理台";
