// ==========================================
// 订单履约管理台 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 负结余、区间外事件等属于领域信号，不在此列
// ==========================================

use crate::dataset::error::DatasetError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 数据完整性错误 =====
    #[error("索引失效: line_id={line_id} 存在于数据集但未被编码 {product_code} 索引，需要全量重建")]
    StaleIndex {
        line_id: String,
        product_code: String,
    },

    // ===== 数据集错误 =====
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    // ===== 并发控制错误 =====
    #[error("锁获取失败: {0}")]
    LockError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
