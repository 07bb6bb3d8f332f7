//! ExportBlueprint - Config Loader 输出
//!
//! 描述导出模块的完整配置：发送方主机名与目的地列表。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DestinationSettings;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的导出配置蓝图
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExportBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 发送方设置
    #[serde(default)]
    pub sender: SenderConfig,

    /// 目的地列表 (按配置顺序)
    #[serde(default)]
    #[validate(nested)]
    pub destinations: Vec<DestinationSettings>,
}

/// 发送方设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// 本机主机名 (None = 使用系统主机名)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl ExportBlueprint {
    /// 按别名查找目的地
    pub fn destination(&self, alias: &str) -> Option<&DestinationSettings> {
        self.destinations.iter().find(|d| d.alias == alias)
    }
}
