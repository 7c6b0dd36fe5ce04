// ==========================================
// 订单履约管理台 - 引擎层事件发布
// ==========================================
// 职责: 定义预测更新事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，渲染/外层实现适配器
// 优势: Engine 不依赖任何 UI 细节，批量更新一次性通知
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// 预测更新触发类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionTrigger {
    /// 订单行数量编辑
    QuantityEdited,
    /// 订单行日期编辑
    DateEdited,
    /// 分配行生命周期变化（创建/更新/删除）
    AllocationChanged,
    /// 服务端回执对账
    MutationReconciled,
    /// 数据集全量重载
    DatasetReloaded,
    /// 手动冲刷
    ManualFlush,
}

impl ProjectionTrigger {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ProjectionTrigger::QuantityEdited => "QuantityEdited",
            ProjectionTrigger::DateEdited => "DateEdited",
            ProjectionTrigger::AllocationChanged => "AllocationChanged",
            ProjectionTrigger::MutationReconciled => "MutationReconciled",
            ProjectionTrigger::DatasetReloaded => "DatasetReloaded",
            ProjectionTrigger::ManualFlush => "ManualFlush",
        }
    }
}

/// 预测更新事件
///
/// 一次合并触发内重算完成的全部产品，聚合为一个事件下发，
/// 渲染层据此做一次整体重绘而不是逐产品刷新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionEvent {
    /// 本批重算完成的产品编码
    pub product_codes: Vec<String>,
    /// 触发类型
    pub trigger: ProjectionTrigger,
}

impl ProjectionEvent {
    pub fn new(product_codes: Vec<String>, trigger: ProjectionTrigger) -> Self {
        Self {
            product_codes,
            trigger,
        }
    }
}

/// 预测事件发布者 Trait
///
/// Engine 层定义，外层（渲染适配）实现。
pub trait ProjectionEventPublisher: Send + Sync {
    /// 发布预测更新事件
    fn publish(&self, event: ProjectionEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件下发的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ProjectionEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ProjectionEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            products = event.product_codes.len(),
            trigger = event.trigger.as_str(),
            "NoOpEventPublisher: 跳过事件发布"
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ProjectionEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ProjectionEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ProjectionEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）；发布失败只记日志，不影响重算结果
    pub fn publish(&self, event: ProjectionEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event) {
                tracing::error!("预测事件发布失败: {}", e);
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<ProjectionEvent>>,
    }

    impl ProjectionEventPublisher for RecordingPublisher {
        fn publish(&self, event: ProjectionEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = ProjectionEvent::new(vec!["A".to_string()], ProjectionTrigger::ManualFlush);
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(ProjectionEvent::new(vec![], ProjectionTrigger::ManualFlush));
    }

    #[test]
    fn test_optional_publisher_forwards() {
        let recording = Arc::new(RecordingPublisher::default());
        let publisher = OptionalEventPublisher::with_publisher(recording.clone());
        assert!(publisher.is_configured());

        publisher.publish(ProjectionEvent::new(
            vec!["A".to_string(), "B".to_string()],
            ProjectionTrigger::AllocationChanged,
        ));
        let events = recording.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].product_codes.len(), 2);
    }
}
