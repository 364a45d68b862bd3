use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{GameType, campaign_entity};

use super::{CreateOutcomeRequest, OutcomeResponse};

/// 创建活动请求 (可同时带初始奖项列表)
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub game_type: GameType,
    /// 计划中奖总次数 (展示目标, 非硬性停止条件)
    #[serde(default)]
    pub total_winners: i64,
    /// 预算上限 (美分, 可不设)
    pub total_amount: Option<i64>,
    /// 初始奖项列表 (可为空, 之后单独添加)
    #[serde(default)]
    pub outcomes: Vec<CreateOutcomeRequest>,
}

/// 活动基础信息响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignResponse {
    pub id: i64,
    pub name: String,
    pub game_type: GameType,
    pub total_winners: i64,
    pub total_amount: Option<i64>,
    pub current_winners: i64,
    /// 已发放金额 (美分)
    pub current_spent: i64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<campaign_entity::Model> for CampaignResponse {
    fn from(m: campaign_entity::Model) -> Self {
        CampaignResponse {
            id: m.id,
            name: m.name,
            game_type: m.game_type,
            total_winners: m.total_winners,
            total_amount: m.total_amount,
            current_winners: m.current_winners,
            current_spent: m.current_spent,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

/// 活动详情响应 (含奖项与各 slot 序列消费进度)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignDetailResponse {
    #[serde(flatten)]
    pub campaign: CampaignResponse,
    pub outcomes: Vec<OutcomeResponse>,
    pub rotations: Vec<RotationProgress>,
}

/// 单个 slot 的序列消费进度
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RotationProgress {
    pub slot: i32,
    /// 序列总长度 (= 各配额之和)
    pub sequence_length: i32,
    /// 已消费位置数
    pub consumed: i32,
}

/// 活动进度汇总 (报表展示用, 只读)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignProgressResponse {
    pub campaign_id: i64,
    pub total_winners: i64,
    pub total_amount: Option<i64>,
    pub current_winners: i64,
    pub current_spent: i64,
    pub rotations: Vec<RotationProgress>,
    pub outcomes: Vec<OutcomeResponse>,
}
