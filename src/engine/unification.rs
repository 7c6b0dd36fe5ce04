// ==========================================
// 订单履约管理台 - 同一化编码映射
// ==========================================
// 职责: 把指向同一物理品项的多个外部产品编码归并为一个查询组
// 红线: 数据集加载时一次性构建，会话中只读，绝不中途修改
// ==========================================

use std::collections::HashMap;

/// 同一化编码映射
///
/// 任何"针对产品 P 的操作"都必须解释为"针对 P 同组内全部编码的操作"。
/// 未知编码解析为它自身，没有其他失败模式。
#[derive(Debug, Clone, Default)]
pub struct UnificationMap {
    /// 编码 → 同组其余编码（不含自身）
    peers: HashMap<String, Vec<String>>,
}

impl UnificationMap {
    /// 构建同一化编码映射
    ///
    /// # 参数
    /// - `groups`: 规范编码 → 同组编码集合（服务端随批量加载下发）
    ///
    /// 组内任一编码都能解析出完整的组，与入口编码无关。
    pub fn build(groups: &HashMap<String, Vec<String>>) -> Self {
        let mut peers: HashMap<String, Vec<String>> = HashMap::new();

        for (canonical, members) in groups {
            // 完整组 = 规范编码 + 成员编码（去重）
            let mut full: Vec<String> = Vec::with_capacity(members.len() + 1);
            full.push(canonical.clone());
            for m in members {
                if !full.contains(m) {
                    full.push(m.clone());
                }
            }

            for code in &full {
                let entry = peers.entry(code.clone()).or_default();
                for other in &full {
                    if other != code && !entry.contains(other) {
                        entry.push(other.clone());
                    }
                }
            }
        }

        Self { peers }
    }

    /// 解析编码所属的同一化编码组
    ///
    /// # 返回
    /// 始终以 `code` 自身开头的完整组；未定义分组时返回 `[code]`。
    pub fn resolve(&self, code: &str) -> Vec<String> {
        let mut group = Vec::with_capacity(4);
        group.push(code.to_string());
        if let Some(others) = self.peers.get(code) {
            group.extend(others.iter().cloned());
        }
        group
    }

    /// 编码是否属于某个多编码组
    pub fn is_unified(&self, code: &str) -> bool {
        self.peers.get(code).is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> UnificationMap {
        let mut groups = HashMap::new();
        groups.insert("A".to_string(), vec!["B".to_string(), "C".to_string()]);
        UnificationMap::build(&groups)
    }

    #[test]
    fn test_resolve_includes_self_first() {
        let map = sample_map();
        let group = map.resolve("A");
        assert_eq!(group[0], "A");
        assert!(group.contains(&"B".to_string()));
        assert!(group.contains(&"C".to_string()));
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_resolve_from_member_code() {
        // 从组内任一成员出发都能得到完整组
        let map = sample_map();
        let group = map.resolve("B");
        assert_eq!(group[0], "B");
        assert!(group.contains(&"A".to_string()));
        assert!(group.contains(&"C".to_string()));
    }

    #[test]
    fn test_unknown_code_resolves_to_itself() {
        let map = sample_map();
        assert_eq!(map.resolve("X"), vec!["X".to_string()]);
        assert!(!map.is_unified("X"));
    }

    #[test]
    fn test_empty_map() {
        let map = UnificationMap::default();
        assert_eq!(map.resolve("P001"), vec!["P001".to_string()]);
    }
}
