use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::outcome_entity;

fn default_slot() -> i32 {
    0
}

/// 新增奖项请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateOutcomeRequest {
    /// 选取槽位 (转盘/单骰子固定为0, 三骰子为 0..=2)
    #[serde(default = "default_slot")]
    pub slot: i32,
    /// 奖项名称 (扇区文案 / 骰面文案)
    pub label: String,
    /// 金额 (美分), 0 = 无金额
    #[serde(default)]
    pub amount: i64,
    /// 配额 (最多被抽中次数), 0 = 无限制
    #[serde(default)]
    pub max_wins: i64,
    /// 展示位置 (同一 slot 内唯一)
    pub display_order: i32,
}

/// 修改奖项请求 (缺省字段保持原值; 任何修改都会重建 rotation sequence)
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateOutcomeRequest {
    pub label: Option<String>,
    pub amount: Option<i64>,
    pub max_wins: Option<i64>,
    pub display_order: Option<i32>,
}

/// 奖项信息响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OutcomeResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub slot: i32,
    pub label: String,
    /// 金额 (美分) - 无金额类为 0
    pub amount: i64,
    /// 配额 (0 = 无限制)
    pub max_wins: i64,
    /// 已被抽中次数
    pub current_wins: i64,
    pub display_order: i32,
}

impl From<outcome_entity::Model> for OutcomeResponse {
    fn from(m: outcome_entity::Model) -> Self {
        OutcomeResponse {
            id: m.id,
            campaign_id: m.campaign_id,
            slot: m.slot,
            label: m.label,
            amount: m.amount,
            max_wins: m.max_wins,
            current_wins: m.current_wins,
            display_order: m.display_order,
        }
    }
}
