// ==========================================
// 订单履约管理台 - 预测引擎
// ==========================================
// 职责: 编排 采集 → 计算 → 快照缓存 → 聚合通知 的单产品重算
// 红线: 每次重算都在触发时刻重新采集，绝不用排队时的旧值
// ==========================================
// 数据流: 编辑 → 索引定位 → 调度器合并 → 采集器读最新值
//         → 计算器重算 29 日日账 → 快照替换 → 渲染层读取
// ==========================================

use crate::dataset::WorkingSet;
use crate::domain::{ProjectionSnapshot, StockEvent};
use crate::engine::collector::{DemandCollector, EditableLineStore};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{
    OptionalEventPublisher, ProjectionEvent, ProjectionEventPublisher, ProjectionTrigger,
};
use crate::engine::projection::ProjectionCalculator;
use crate::engine::scheduler::RecomputeHandler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 预测引擎
///
/// 持有工作数据集与最新预测快照；作为重算处理器被调度器回调。
/// 快照按同一化编码组内每个编码登记同一份，任一编码都能查到。
pub struct ProjectionEngine {
    dataset: Arc<Mutex<WorkingSet>>,
    /// UI 层注入的实时可编辑值读取（缺省读数据集中已提交值）
    live_store: Option<Arc<dyn EditableLineStore + Send + Sync>>,
    snapshots: Mutex<HashMap<String, ProjectionSnapshot>>,
    event_publisher: OptionalEventPublisher,
}

impl ProjectionEngine {
    /// 创建预测引擎
    pub fn new(
        dataset: Arc<Mutex<WorkingSet>>,
        event_publisher: Option<Arc<dyn ProjectionEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        Self {
            dataset,
            live_store: None,
            snapshots: Mutex::new(HashMap::new()),
            event_publisher,
        }
    }

    /// 注入实时可编辑值读取实现
    pub fn with_live_store(mut self, store: Arc<dyn EditableLineStore + Send + Sync>) -> Self {
        self.live_store = Some(store);
        self
    }

    /// 重算单个产品的滚动预测
    ///
    /// 采集与库存合计都覆盖同一化编码组全体编码；
    /// 计算完成后快照在组内每个编码下整体替换。
    pub fn recompute_product(&self, product_code: &str) -> EngineResult<ProjectionSnapshot> {
        let (snapshot, group) = {
            let ws = self
                .dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;

            let group = ws.unification().resolve(product_code);
            let today = ws.today();

            let store: &dyn EditableLineStore = match &self.live_store {
                Some(s) => s.as_ref(),
                None => &*ws,
            };
            let (outbound, notes) = DemandCollector::collect(&ws, store, product_code, today);

            let inbound: Vec<StockEvent> = group
                .iter()
                .flat_map(|code| ws.production_of(code))
                .map(|p| StockEvent::new(p.date, p.quantity))
                .collect();

            let current_stock = ws.current_stock_of_group(&group);

            let result = ProjectionCalculator::project(current_stock, &outbound, &inbound, today);
            let snapshot = ProjectionSnapshot {
                product_code: product_code.to_string(),
                result,
                notes,
            };
            (snapshot, group)
        };

        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        for code in &group {
            snapshots.insert(code.clone(), snapshot.clone());
        }

        tracing::debug!(
            product_code,
            min_balance = snapshot.result.min_balance_first_8_days,
            stockout = snapshot.result.has_stockout(),
            "产品滚动预测已重算"
        );

        Ok(snapshot)
    }

    /// 读取最新预测快照（同组任一编码均可命中）
    pub fn snapshot_of(&self, product_code: &str) -> Option<ProjectionSnapshot> {
        self.snapshots
            .lock()
            .ok()
            .and_then(|s| s.get(product_code).cloned())
    }

    /// 读取前 8 日最低结余
    pub fn min_balance_of(&self, product_code: &str) -> Option<f64> {
        self.snapshot_of(product_code)
            .map(|s| s.result.min_balance_first_8_days)
    }

    /// 与服务端独立计算的最低结余对账
    ///
    /// 屏幕数字始终用本地值；只在偏差超出容差时记告警日志。
    pub fn reconcile_server_min_balance(
        &self,
        product_code: &str,
        server_min: f64,
        epsilon: f64,
    ) {
        if let Some(local) = self.min_balance_of(product_code) {
            if (local - server_min).abs() > epsilon {
                tracing::warn!(
                    product_code,
                    local_min = local,
                    server_min,
                    "本地与服务端最低结余不一致，采用本地值"
                );
            }
        }
    }

    /// 工作数据集句柄
    pub fn dataset(&self) -> Arc<Mutex<WorkingSet>> {
        Arc::clone(&self.dataset)
    }
}

impl RecomputeHandler for ProjectionEngine {
    fn recompute(&self, product_code: &str) {
        if let Err(e) = self.recompute_product(product_code) {
            tracing::error!(product_code, "重算失败: {}", e);
        }
    }

    fn batch_completed(&self, product_codes: &[String], trigger: ProjectionTrigger) {
        self.event_publisher
            .publish(ProjectionEvent::new(product_codes.to_vec(), trigger));
    }
}
