// ==========================================
// 订单履约管理台 - 数据集层
// ==========================================
// 职责: 工作数据集的持有与受控变更
// 红线: 不含预测计算逻辑；派生视图可随时整体重建
// ==========================================

pub mod error;
pub mod working_set;

pub use error::{DatasetError, DatasetResult};
pub use working_set::{DatasetBatch, WorkingSet};
