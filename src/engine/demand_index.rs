// ==========================================
// 订单履约管理台 - 需求索引
// ==========================================
// 职责: 维护 产品编码 → 需求行位置 的倒排索引，O(k) 定位受影响行
// 红线: 全量重载必须 rebuild，不许悄悄打补丁；增删单行用 append/remove
// ==========================================
// 不变式: 产品 P 的每条需求行，在 P 同一化编码组内每个编码下恰好出现一次
// ==========================================

use crate::domain::DemandLine;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::unification::UnificationMap;
use std::collections::HashMap;

/// 需求索引
///
/// 失效索引（行在数据集中存在、却查不到）属于数据完整性缺陷，
/// 恢复策略是全量重建，而不是局部修补。
#[derive(Debug, Default)]
pub struct DemandIndex {
    /// 编码 → 行 ID 列表
    by_code: HashMap<String, Vec<String>>,
    /// 行 ID → 该行被索引到的编码列表（删除时反查用）
    codes_of_line: HashMap<String, Vec<String>>,
}

impl DemandIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全量重建索引
    ///
    /// 数据集（重新）加载、或整批插入/删除行之后必须调用。
    /// 先清空再重扫，避免残留失效引用。
    pub fn rebuild(&mut self, lines: &[DemandLine], unification: &UnificationMap) {
        self.by_code.clear();
        self.codes_of_line.clear();

        for line in lines {
            self.append(line, unification);
        }

        tracing::debug!(
            line_count = lines.len(),
            code_count = self.by_code.len(),
            "需求索引已全量重建"
        );
    }

    /// 追加单行索引
    ///
    /// 新分配行插入时调用；同组每个编码下各登记一次。
    pub fn append(&mut self, line: &DemandLine, unification: &UnificationMap) {
        let group = unification.resolve(&line.product_code);
        for code in &group {
            let ids = self.by_code.entry(code.clone()).or_default();
            if !ids.contains(&line.line_id) {
                ids.push(line.line_id.clone());
            }
        }
        self.codes_of_line.insert(line.line_id.clone(), group);
    }

    /// 删除单行索引
    ///
    /// 分配行数量归零被移除时调用。行不在索引中则为空操作。
    pub fn remove(&mut self, line_id: &str) {
        if let Some(codes) = self.codes_of_line.remove(line_id) {
            for code in codes {
                if let Some(ids) = self.by_code.get_mut(&code) {
                    ids.retain(|id| id != line_id);
                }
            }
        }
    }

    /// 查询编码下的需求行 ID 列表
    pub fn index_of(&self, code: &str) -> &[String] {
        self.by_code.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 校验索引与数据集的一致性
    ///
    /// 发现"行存在于数据集但未被其编码索引"时返回
    /// [`EngineError::StaleIndex`]，调用方应执行全量 `rebuild`。
    pub fn verify(&self, lines: &[DemandLine], unification: &UnificationMap) -> EngineResult<()> {
        for line in lines {
            for code in unification.resolve(&line.product_code) {
                if !self.index_of(&code).contains(&line.line_id) {
                    tracing::error!(
                        line_id = %line.line_id,
                        product_code = %code,
                        "检测到失效索引，需要全量重建"
                    );
                    return Err(EngineError::StaleIndex {
                        line_id: line.line_id.clone(),
                        product_code: code,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn unification_ab() -> UnificationMap {
        let mut groups = StdHashMap::new();
        groups.insert("A".to_string(), vec!["B".to_string()]);
        UnificationMap::build(&groups)
    }

    fn order_line(product: &str, order: &str) -> DemandLine {
        DemandLine::new_order(product, order, 10.0, None, 10.0, 10.0)
    }

    #[test]
    fn test_rebuild_indexes_under_every_group_code() {
        let unification = unification_ab();
        let lines = vec![order_line("A", "SO-1"), order_line("B", "SO-2")];
        let mut index = DemandIndex::new();
        index.rebuild(&lines, &unification);

        // 两条行都应出现在 A 和 B 两个编码下
        assert_eq!(index.index_of("A").len(), 2);
        assert_eq!(index.index_of("B").len(), 2);
        index.verify(&lines, &unification).unwrap();
    }

    #[test]
    fn test_append_and_remove() {
        let unification = unification_ab();
        let mut index = DemandIndex::new();
        let line = order_line("A", "SO-1");
        index.append(&line, &unification);
        assert_eq!(index.index_of("A"), [line.line_id.clone()]);
        assert_eq!(index.index_of("B"), [line.line_id.clone()]);

        index.remove(&line.line_id);
        assert!(index.index_of("A").is_empty());
        assert!(index.index_of("B").is_empty());
    }

    #[test]
    fn test_append_is_idempotent_per_line() {
        let unification = unification_ab();
        let mut index = DemandIndex::new();
        let line = order_line("A", "SO-1");
        index.append(&line, &unification);
        index.append(&line, &unification);
        // 同一行不会重复登记
        assert_eq!(index.index_of("A").len(), 1);
    }

    #[test]
    fn test_verify_detects_stale_index() {
        let unification = unification_ab();
        let lines = vec![order_line("A", "SO-1")];
        let index = DemandIndex::new(); // 空索引，未重建

        let err = index.verify(&lines, &unification).unwrap_err();
        assert!(matches!(err, EngineError::StaleIndex { .. }));
    }

    #[test]
    fn test_unknown_code_returns_empty() {
        let index = DemandIndex::new();
        assert!(index.index_of("NOPE").is_empty());
    }
}
