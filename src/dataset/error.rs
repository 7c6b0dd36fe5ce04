// ==========================================
// 订单履约管理台 - 数据集层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 变更失败必须保持数据集处于编辑前状态
// ==========================================

use thiserror::Error;

/// 数据集层错误类型
#[derive(Error, Debug)]
pub enum DatasetError {
    // ===== 定位错误 =====
    #[error("需求行未找到: line_id={line_id}")]
    LineNotFound { line_id: String },

    #[error("出库批次未找到: lot_id={lot_id}")]
    LotNotFound { lot_id: String },

    // ===== 类别错误 =====
    #[error("行类别不符: line_id={line_id}, 期望 {expected}")]
    KindMismatch { line_id: String, expected: String },

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 并发控制错误 =====
    #[error("锁获取失败: {0}")]
    LockError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type DatasetResult<T> = Result<T, DatasetError>;
