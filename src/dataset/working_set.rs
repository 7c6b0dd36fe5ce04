// ==========================================
// 订单履约管理台 - 工作数据集
// ==========================================
// 职责: 持有当前加载的需求行/库存/不可见出库，提供受控的编辑操作
// 红线: 仅由主逻辑线程变更；变更失败必须保持编辑前状态
// ==========================================
// 说明: 这是可随时重建的派生工作区，不是持久化账本；
//       全量重载会整体替换内容并全量重建索引
// ==========================================

use crate::dataset::error::{DatasetError, DatasetResult};
use crate::domain::{
    AllocationMutationResult, DemandLine, DqNote, LoadReport, NonVisibleOutflow, ProductionEntry,
    ProductionRecord, VisibilityState,
};
use crate::engine::collector::EditableLineStore;
use crate::engine::demand_index::DemandIndex;
use crate::engine::error::EngineResult;
use crate::engine::unification::UnificationMap;
use chrono::NaiveDate;
use std::collections::HashMap;

/// 批量加载数据（由数据加载层传入）
///
/// `today` 由加载层在客户端时钟上解析，作为整个会话的预测基准日。
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DatasetBatch {
    /// 预测基准日（今天）
    pub today: NaiveDate,
    /// 订单行
    pub order_lines: Vec<DemandLine>,
    /// 分配行
    pub allocation_lines: Vec<DemandLine>,
    /// 生产入库原始记录（日期待解析）
    pub production: Vec<ProductionRecord>,
    /// 不可见出库承诺: 产品编码 → 明细
    pub non_visible_outflows: HashMap<String, Vec<NonVisibleOutflow>>,
    /// 同一化编码组: 规范编码 → 成员编码
    pub unification_groups: HashMap<String, Vec<String>>,
    /// 现有库存: 产品编码 → 数量
    pub current_stock: HashMap<String, f64>,
}

/// 工作数据集
///
/// 同一化编码映射与需求索引作为内部组成持有：
/// 映射在加载后只读，索引随行的增删同步维护。
#[derive(Debug, Default)]
pub struct WorkingSet {
    today: NaiveDate,
    lines: Vec<DemandLine>,
    unification: UnificationMap,
    index: DemandIndex,
    production: HashMap<String, Vec<ProductionEntry>>,
    non_visible: HashMap<String, Vec<NonVisibleOutflow>>,
    current_stock: HashMap<String, f64>,
    /// 订单行可见性（派生状态，line_id → 状态）
    visibility: HashMap<String, VisibilityState>,
}

impl WorkingSet {
    /// 创建空数据集（基准日取客户端当天，加载时会被批量数据覆盖）
    pub fn empty() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            ..Default::default()
        }
    }

    // ==========================================
    // 加载
    // ==========================================

    /// 全量加载数据集
    ///
    /// 整体替换现有内容并全量重建索引（绝不增量打补丁）。
    /// 生产入库记录的日期在此解析，解析失败的记录被排除并
    /// 记入数据质量备注，不中断加载。
    ///
    /// 注意: 可见性在加载后由 VisibilityReconciler 统一推导，
    /// 此处仅初始化为显示。
    pub fn load(&mut self, batch: DatasetBatch) -> LoadReport {
        let mut report = LoadReport {
            order_line_count: batch.order_lines.len(),
            allocation_line_count: batch.allocation_lines.len(),
            ..Default::default()
        };

        self.today = batch.today;
        self.unification = UnificationMap::build(&batch.unification_groups);
        self.non_visible = batch.non_visible_outflows;
        self.current_stock = batch.current_stock;

        // 解析生产入库日期
        self.production.clear();
        for record in &batch.production {
            match NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") {
                Ok(date) => {
                    self.production
                        .entry(record.product_code.clone())
                        .or_default()
                        .push(ProductionEntry {
                            product_code: record.product_code.clone(),
                            date,
                            quantity: record.quantity,
                        });
                    report.production_count += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        product_code = %record.product_code,
                        raw_date = %record.date,
                        "生产入库日期无法解析，已排除"
                    );
                    report.notes.push(DqNote {
                        product_code: record.product_code.clone(),
                        field: "production.date".to_string(),
                        raw_value: record.date.clone(),
                        reason: format!("日期解析失败: {}", e),
                    });
                }
            }
        }

        // 替换需求行并全量重建索引
        self.lines = batch.order_lines;
        self.lines.extend(batch.allocation_lines);
        self.index.rebuild(&self.lines, &self.unification);

        // 可见性初始化为显示，随后由对账器推导
        self.visibility.clear();
        for line in self.lines.iter().filter(|l| l.is_order()) {
            self.visibility
                .insert(line.line_id.clone(), VisibilityState::Shown);
        }

        tracing::info!(
            order_lines = report.order_line_count,
            allocation_lines = report.allocation_line_count,
            production = report.production_count,
            dq_notes = report.notes.len(),
            "工作数据集加载完成"
        );

        report
    }

    // ==========================================
    // 订单行编辑
    // ==========================================

    /// 设置订单行的可编辑数量
    ///
    /// 数量被收敛到 [0, 剩余可分配量] 区间。
    ///
    /// # 返回
    /// 该行的产品编码（调用方据此调度重算）
    pub fn set_order_quantity(&mut self, line_id: &str, quantity: f64) -> DatasetResult<String> {
        let line = self.order_line_mut(line_id)?;
        let clamped = quantity.max(0.0).min(line.remaining_balance);
        line.quantity = clamped;
        let product_code = line.product_code.clone();

        tracing::debug!(line_id, quantity = clamped, "订单行数量已更新");
        Ok(product_code)
    }

    /// 设置订单行的出库日期（None 表示清除日期）
    pub fn set_order_date(
        &mut self,
        line_id: &str,
        date: Option<NaiveDate>,
    ) -> DatasetResult<String> {
        let line = self.order_line_mut(line_id)?;
        line.outbound_date = date;
        let product_code = line.product_code.clone();

        tracing::debug!(line_id, ?date, "订单行出库日期已更新");
        Ok(product_code)
    }

    fn order_line_mut(&mut self, line_id: &str) -> DatasetResult<&mut DemandLine> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or_else(|| DatasetError::LineNotFound {
                line_id: line_id.to_string(),
            })?;
        if !line.is_order() {
            return Err(DatasetError::KindMismatch {
                line_id: line_id.to_string(),
                expected: "ORDER".to_string(),
            });
        }
        Ok(line)
    }

    // ==========================================
    // 分配行生命周期
    // ==========================================

    /// 插入新分配行（索引增量追加）
    ///
    /// # 返回
    /// 新行的 line_id
    pub fn insert_allocation(&mut self, line: DemandLine) -> DatasetResult<String> {
        if !line.is_allocation() || line.lot_id.is_none() {
            return Err(DatasetError::ValidationError(
                "分配行必须携带批次 ID".to_string(),
            ));
        }
        if line.quantity < 0.0 {
            return Err(DatasetError::ValidationError(format!(
                "分配数量不能为负: {}",
                line.quantity
            )));
        }

        let line_id = line.line_id.clone();
        self.index.append(&line, &self.unification);
        self.lines.push(line);

        tracing::debug!(line_id = %line_id, "分配行已插入");
        Ok(line_id)
    }

    /// 设置分配数量（联动同批次全部行）
    ///
    /// 数量归零时移除这些行（索引同步剪除），其剩余量由可见性
    /// 对账折回源订单行的剩余可分配量。
    ///
    /// # 返回
    /// 受影响的 (order_id, product_code) 对，供对账与重算调度
    pub fn set_allocation_quantity(
        &mut self,
        lot_id: &str,
        quantity: f64,
    ) -> DatasetResult<Vec<(String, String)>> {
        let affected = self.lot_members(lot_id)?;

        if quantity <= 0.0 {
            // 数量归零: 移除同批次全部行
            let removed_ids: Vec<String> = self
                .lines
                .iter()
                .filter(|l| l.lot_id.as_deref() == Some(lot_id))
                .map(|l| l.line_id.clone())
                .collect();
            for id in &removed_ids {
                self.index.remove(id);
            }
            self.lines.retain(|l| l.lot_id.as_deref() != Some(lot_id));
            tracing::debug!(lot_id, removed = removed_ids.len(), "分配批次数量归零，行已移除");
        } else {
            for line in self
                .lines
                .iter_mut()
                .filter(|l| l.lot_id.as_deref() == Some(lot_id))
            {
                line.quantity = quantity;
            }
            tracing::debug!(lot_id, quantity, "分配批次数量已联动更新");
        }

        Ok(affected)
    }

    /// 设置分配出库日期（联动同批次全部行）
    pub fn set_allocation_date(
        &mut self,
        lot_id: &str,
        date: NaiveDate,
    ) -> DatasetResult<Vec<(String, String)>> {
        let affected = self.lot_members(lot_id)?;

        for line in self
            .lines
            .iter_mut()
            .filter(|l| l.lot_id.as_deref() == Some(lot_id))
        {
            line.outbound_date = Some(date);
        }

        tracing::debug!(lot_id, %date, "分配批次出库日期已联动更新");
        Ok(affected)
    }

    /// 删除单条分配行
    ///
    /// # 返回
    /// 该行的 (order_id, product_code)
    pub fn remove_allocation(&mut self, line_id: &str) -> DatasetResult<(String, String)> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or_else(|| DatasetError::LineNotFound {
                line_id: line_id.to_string(),
            })?;
        if !self.lines[pos].is_allocation() {
            return Err(DatasetError::KindMismatch {
                line_id: line_id.to_string(),
                expected: "ALLOCATION".to_string(),
            });
        }

        let line = self.lines.remove(pos);
        self.index.remove(&line.line_id);

        tracing::debug!(line_id, "分配行已删除");
        Ok((line.order_id, line.product_code))
    }

    fn lot_members(&self, lot_id: &str) -> DatasetResult<Vec<(String, String)>> {
        let mut affected: Vec<(String, String)> = Vec::new();
        for line in self.lines.iter().filter(|l| l.lot_id.as_deref() == Some(lot_id)) {
            let pair = (line.order_id.clone(), line.product_code.clone());
            if !affected.contains(&pair) {
                affected.push(pair);
            }
        }
        if affected.is_empty() {
            return Err(DatasetError::LotNotFound {
                lot_id: lot_id.to_string(),
            });
        }
        Ok(affected)
    }

    // ==========================================
    // 服务端回执对账
    // ==========================================

    /// 应用分配变更回执
    ///
    /// 剩余可分配量以服务端为准（可见性据此翻转）；
    /// 逐日预测数字仍由本地重算给出。找不到对应订单行时为空操作。
    ///
    /// # 返回
    /// 命中的产品编码（调用方据此调度重算），未命中返回 None
    pub fn apply_mutation_result(
        &mut self,
        result: &AllocationMutationResult,
        epsilon: f64,
    ) -> Option<String> {
        let group = self.unification.resolve(&result.product_code);

        let line = self.lines.iter_mut().find(|l| {
            l.is_order() && l.order_id == result.order_id && group.contains(&l.product_code)
        })?;

        line.remaining_balance = result.remaining_balance;
        // 可编辑数量不得超出新的剩余可分配量
        if line.quantity > result.remaining_balance {
            line.quantity = result.remaining_balance.max(0.0);
        }
        let line_id = line.line_id.clone();

        let state = if result.remaining_balance.abs() <= epsilon {
            VisibilityState::Hidden
        } else {
            VisibilityState::Shown
        };
        self.visibility.insert(line_id.clone(), state);

        if let Some(stock) = result.refreshed_stock {
            self.current_stock
                .insert(result.product_code.clone(), stock);
        }

        tracing::debug!(
            order_id = %result.order_id,
            product_code = %result.product_code,
            remaining_balance = result.remaining_balance,
            visibility = state.as_str(),
            "分配变更回执已对账"
        );

        Some(result.product_code.clone())
    }

    // ==========================================
    // 读取访问
    // ==========================================

    /// 预测基准日
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// 同一化编码映射
    pub fn unification(&self) -> &UnificationMap {
        &self.unification
    }

    /// 需求索引
    pub fn index(&self) -> &DemandIndex {
        &self.index
    }

    /// 校验索引一致性（失效时调用方应执行 `rebuild_index`）
    pub fn verify_index(&self) -> EngineResult<()> {
        self.index.verify(&self.lines, &self.unification)
    }

    /// 全量重建索引（失效索引的恢复策略）
    pub fn rebuild_index(&mut self) {
        self.index.rebuild(&self.lines, &self.unification);
    }

    /// 按行 ID 查找
    pub fn line(&self, line_id: &str) -> Option<&DemandLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    /// 全部需求行
    pub fn lines(&self) -> &[DemandLine] {
        &self.lines
    }

    /// 同组现有库存合计（同一化编码指向同一物理品项）
    pub fn current_stock_of_group(&self, group: &[String]) -> f64 {
        group
            .iter()
            .filter_map(|code| self.current_stock.get(code))
            .sum()
    }

    /// 指定编码的生产入库事件
    pub fn production_of(&self, code: &str) -> &[ProductionEntry] {
        self.production.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定编码的不可见出库承诺
    pub fn non_visible_of(&self, code: &str) -> &[NonVisibleOutflow] {
        self.non_visible.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 订单行可见性
    pub fn visibility_of(&self, line_id: &str) -> Option<VisibilityState> {
        self.visibility.get(line_id).copied()
    }

    /// 设置订单行可见性（由可见性对账器调用）
    pub fn set_visibility(&mut self, line_id: &str, state: VisibilityState) {
        self.visibility.insert(line_id.to_string(), state);
    }

    /// 按行 ID 可变访问（由可见性对账器调用）
    pub(crate) fn line_mut(&mut self, line_id: &str) -> Option<&mut DemandLine> {
        self.lines.iter_mut().find(|l| l.line_id == line_id)
    }
}

// ==========================================
// EditableLineStore 实现 - 已提交值
// ==========================================

/// 默认的可编辑值读取实现: 直接读工作数据集中已提交的行值。
/// UI 层可注入自己的实现（例如读取输入框的实时值）。
impl EditableLineStore for WorkingSet {
    fn current_quantity(&self, line_id: &str) -> Option<f64> {
        self.line(line_id).map(|l| l.quantity)
    }

    fn current_outbound_date(&self, line_id: &str) -> Option<NaiveDate> {
        self.line(line_id).and_then(|l| l.outbound_date)
    }
}
