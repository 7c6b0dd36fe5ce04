// ==========================================
// 订单履约管理台 - 引擎配置
// ==========================================
// 职责: 预测引擎的可调参数（防抖延迟、零值容差）
// 说明: 预测区间(29日)与最低结余窗口(8日)是业务常量，不在配置内
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 重算防抖延迟（毫秒），典型值 100~200
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// 剩余可分配量与 0 比较的容差（数量为 f64 小数）
    #[serde(default = "default_visibility_epsilon")]
    pub visibility_epsilon: f64,
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_visibility_epsilon() -> f64 {
    1e-9
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            visibility_epsilon: default_visibility_epsilon(),
        }
    }
}

impl EngineConfig {
    /// 防抖延迟
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 从 JSON 配置文件加载（缺失字段取默认值）
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;

        if !(100..=200).contains(&config.debounce_ms) {
            tracing::warn!(
                debounce_ms = config.debounce_ms,
                "防抖延迟超出典型范围 100~200ms"
            );
        }
        Ok(config)
    }
}
