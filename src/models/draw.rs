use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::draw_result_entity;

use super::PaginatedResponse;

/// 单次选取结果 (转盘一次一条, 三骰子一次三条)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawPick {
    pub slot: i32,
    pub outcome_id: i64,
    pub label: String,
    /// 金额 (美分) - 无金额类为 0
    pub amount: i64,
    /// 本次消费的序列位置; None 表示走了随机回退
    pub sequence_position: Option<i32>,
    /// 奖项的展示位置 (前端据此计算停针角度 / 骰面, 引擎不关心)
    pub display_order: i32,
}

/// 抽奖响应
/// exhausted = true 时 picks 为空: 所有配额奖项耗尽且没有安慰奖,
/// 活动事实上已结束 (这是正常业务结果, 不是错误)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub draw_id: Uuid,
    pub exhausted: bool,
    pub picks: Vec<DrawPick>,
}

impl DrawResponse {
    pub fn exhausted() -> Self {
        DrawResponse {
            draw_id: Uuid::new_v4(),
            exhausted: true,
            picks: Vec::new(),
        }
    }
}

/// 抽奖记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawResultQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

/// 抽奖历史记录响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResultResponse {
    pub id: i64,
    pub draw_id: Uuid,
    pub slot: i32,
    pub outcome_id: i64,
    /// 奖项名称 (历史快照)
    pub label: String,
    /// 金额 (美分)
    pub amount: i64,
    pub sequence_position: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<draw_result_entity::Model> for DrawResultResponse {
    fn from(m: draw_result_entity::Model) -> Self {
        DrawResultResponse {
            id: m.id,
            draw_id: m.draw_id,
            slot: m.slot,
            outcome_id: m.outcome_id,
            label: m.label,
            amount: m.amount,
            sequence_position: m.sequence_position,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 抽奖记录分页响应
pub type DrawResultPageResponse = PaginatedResponse<DrawResultResponse>;
