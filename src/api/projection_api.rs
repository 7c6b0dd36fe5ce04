// ==========================================
// 订单履约管理台 - 预测 API
// ==========================================
// 职责: 面向数据加载层与渲染层的业务接口
// 数据流: 编辑 → 数据集变更 → 可见性对账(分配路径) → 调度器合并
//         → 引擎重算 → 快照/可见性供渲染层读取
// ==========================================
// 红线: 变更只在调用方（外部 API 层）确认成功后应用，
//       保存失败时工作数据集保持编辑前状态
// ==========================================

use crate::config::EngineConfig;
use crate::dataset::{DatasetBatch, WorkingSet};
use crate::domain::{
    AllocationMutationResult, DemandLine, LoadReport, ProjectionSnapshot, VisibilityState,
};
use crate::engine::collector::EditableLineStore;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{ProjectionEventPublisher, ProjectionTrigger};
use crate::engine::recompute::ProjectionEngine;
use crate::engine::scheduler::{RecomputeHandler, RecomputeScheduler};
use crate::engine::visibility::VisibilityReconciler;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 预测 API - 核心对外门面
///
/// 组合工作数据集、预测引擎、重算调度器与可见性对账器。
/// 必须在 tokio 运行时内使用（防抖定时器依赖运行时）。
pub struct ProjectionApi {
    engine: Arc<ProjectionEngine>,
    scheduler: RecomputeScheduler,
    reconciler: VisibilityReconciler,
    config: EngineConfig,
}

impl ProjectionApi {
    /// 创建预测 API
    ///
    /// # 参数
    /// - `config`: 引擎配置
    /// - `event_publisher`: 聚合更新事件发布者（可选）
    /// - `live_store`: UI 层实时可编辑值读取（可选，缺省读已提交值）
    pub fn new(
        config: EngineConfig,
        event_publisher: Option<Arc<dyn ProjectionEventPublisher>>,
        live_store: Option<Arc<dyn EditableLineStore + Send + Sync>>,
    ) -> Self {
        let dataset = Arc::new(Mutex::new(WorkingSet::empty()));
        let mut engine = ProjectionEngine::new(dataset, event_publisher);
        if let Some(store) = live_store {
            engine = engine.with_live_store(store);
        }
        let engine = Arc::new(engine);

        let handler: Arc<dyn RecomputeHandler> = engine.clone();
        let scheduler = RecomputeScheduler::new(handler, config.debounce_delay());
        let reconciler = VisibilityReconciler::new(config.visibility_epsilon);

        Self {
            engine,
            scheduler,
            reconciler,
            config,
        }
    }

    // ==========================================
    // 数据集加载
    // ==========================================

    /// 全量加载数据集
    ///
    /// 重建同一化编码映射与需求索引，对账全部订单行可见性，
    /// 并为每个被引用的产品登记初始重算。
    pub fn load_dataset(&self, batch: DatasetBatch) -> EngineResult<LoadReport> {
        let products: Vec<String>;
        let report;
        {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            report = ws.load(batch);
            self.reconciler.reconcile_all(&mut ws);

            let mut seen: HashSet<String> = HashSet::new();
            products = ws
                .lines()
                .iter()
                .filter(|l| seen.insert(l.product_code.clone()))
                .map(|l| l.product_code.clone())
                .collect();
        }

        for product in &products {
            self.scheduler
                .schedule(product, ProjectionTrigger::DatasetReloaded);
        }
        Ok(report)
    }

    // ==========================================
    // 订单行编辑
    // ==========================================

    /// 编辑订单行数量（收敛到 [0, 剩余可分配量]）
    pub fn edit_order_quantity(&self, line_id: &str, quantity: f64) -> EngineResult<()> {
        let product = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            ws.set_order_quantity(line_id, quantity)?
        };
        self.scheduler
            .schedule(&product, ProjectionTrigger::QuantityEdited);
        Ok(())
    }

    /// 编辑订单行出库日期（None 表示清除）
    pub fn edit_order_date(&self, line_id: &str, date: Option<NaiveDate>) -> EngineResult<()> {
        let product = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            ws.set_order_date(line_id, date)?
        };
        self.scheduler
            .schedule(&product, ProjectionTrigger::DateEdited);
        Ok(())
    }

    // ==========================================
    // 分配行生命周期
    // ==========================================

    /// 从订单行创建分配行
    ///
    /// # 返回
    /// 新分配行的 line_id
    pub fn create_allocation(
        &self,
        order_line_id: &str,
        lot_id: &str,
        quantity: f64,
        date: Option<NaiveDate>,
    ) -> EngineResult<String> {
        let (line_id, order_id, product) = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;

            let source = ws
                .line(order_line_id)
                .ok_or_else(|| crate::dataset::DatasetError::LineNotFound {
                    line_id: order_line_id.to_string(),
                })?;
            if !source.is_order() {
                return Err(crate::dataset::DatasetError::KindMismatch {
                    line_id: order_line_id.to_string(),
                    expected: "ORDER".to_string(),
                }
                .into());
            }
            let order_id = source.order_id.clone();
            let product = source.product_code.clone();

            let allocation =
                DemandLine::new_allocation(&product, &order_id, lot_id, quantity, date);
            let line_id = ws.insert_allocation(allocation)?;
            self.reconciler.reconcile(&mut ws, &order_id, &product);
            (line_id, order_id, product)
        };

        tracing::info!(order_id = %order_id, lot_id, quantity, "分配行已创建");
        self.scheduler
            .schedule(&product, ProjectionTrigger::AllocationChanged);
        Ok(line_id)
    }

    /// 编辑分配数量（联动同批次全部行；归零即移除，剩余量折回订单行）
    pub fn edit_allocation_quantity(&self, lot_id: &str, quantity: f64) -> EngineResult<()> {
        self.mutate_lot(lot_id, |ws| ws.set_allocation_quantity(lot_id, quantity))
    }

    /// 编辑分配出库日期（联动同批次全部行）
    pub fn edit_allocation_date(&self, lot_id: &str, date: NaiveDate) -> EngineResult<()> {
        self.mutate_lot(lot_id, |ws| ws.set_allocation_date(lot_id, date))
    }

    fn mutate_lot(
        &self,
        lot_id: &str,
        op: impl FnOnce(&mut WorkingSet) -> crate::dataset::DatasetResult<Vec<(String, String)>>,
    ) -> EngineResult<()> {
        let affected = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            let affected = op(&mut ws)?;
            for (order_id, product) in &affected {
                self.reconciler.reconcile(&mut ws, order_id, product);
            }
            affected
        };

        tracing::debug!(lot_id, pairs = affected.len(), "分配批次变更完成");
        for (_, product) in &affected {
            self.scheduler
                .schedule(product, ProjectionTrigger::AllocationChanged);
        }
        Ok(())
    }

    /// 删除单条分配行
    pub fn delete_allocation(&self, line_id: &str) -> EngineResult<()> {
        let (order_id, product) = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            let (order_id, product) = ws.remove_allocation(line_id)?;
            self.reconciler.reconcile(&mut ws, &order_id, &product);
            (order_id, product)
        };

        tracing::info!(order_id = %order_id, line_id, "分配行已删除");
        self.scheduler
            .schedule(&product, ProjectionTrigger::AllocationChanged);
        Ok(())
    }

    // ==========================================
    // 服务端回执对账
    // ==========================================

    /// 应用分配变更回执
    ///
    /// 剩余可分配量采用服务端值（据此翻转可见性）；逐日数字仍由
    /// 本地重算给出，服务端最低结余只做对账告警。找不到对应订单
    /// 行时为空操作。
    pub fn apply_mutation_result(&self, result: &AllocationMutationResult) -> EngineResult<()> {
        let hit = {
            let dataset = self.engine.dataset();
            let mut ws = dataset
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            ws.apply_mutation_result(result, self.config.visibility_epsilon)
        };

        if let Some(product) = hit {
            if let Some(server_min) = result.server_min_balance {
                self.engine.reconcile_server_min_balance(
                    &product,
                    server_min,
                    self.config.visibility_epsilon,
                );
            }
            self.scheduler
                .schedule(&product, ProjectionTrigger::MutationReconciled);
        }
        Ok(())
    }

    // ==========================================
    // 渲染层读取
    // ==========================================

    /// 最新预测快照（29 日日账 + 前 8 日最低结余 + 数据质量备注）
    pub fn projection_for(&self, product_code: &str) -> Option<ProjectionSnapshot> {
        self.engine.snapshot_of(product_code)
    }

    /// 前 8 日最低结余
    pub fn min_balance_first_8_days(&self, product_code: &str) -> Option<f64> {
        self.engine.min_balance_of(product_code)
    }

    /// 订单行可见性
    pub fn visibility_of(&self, line_id: &str) -> EngineResult<Option<VisibilityState>> {
        let dataset = self.engine.dataset();
        let ws = dataset
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        Ok(ws.visibility_of(line_id))
    }

    /// 订单行剩余可分配量
    pub fn remaining_balance_of(&self, line_id: &str) -> EngineResult<Option<f64>> {
        let dataset = self.engine.dataset();
        let ws = dataset
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        Ok(ws.line(line_id).map(|l| l.remaining_balance))
    }

    // ==========================================
    // 调度控制
    // ==========================================

    /// 立即冲刷全部待重算（不等防抖定时器）
    pub fn flush_now(&self) -> Vec<String> {
        self.scheduler.flush_now()
    }

    /// 取消全部待重算
    pub fn cancel_pending(&self) {
        self.scheduler.cancel();
    }

    /// 校验需求索引，失效时全量重建
    ///
    /// # 返回
    /// 是否执行了重建
    pub fn verify_and_repair_index(&self) -> EngineResult<bool> {
        let dataset = self.engine.dataset();
        let mut ws = dataset
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;
        match ws.verify_index() {
            Ok(()) => Ok(false),
            Err(e) => {
                tracing::warn!("索引失效，执行全量重建: {}", e);
                ws.rebuild_index();
                Ok(true)
            }
        }
    }

    /// 工作数据集句柄（测试与适配层使用）
    pub fn dataset(&self) -> Arc<Mutex<WorkingSet>> {
        self.engine.dataset()
    }
}
