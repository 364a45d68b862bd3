use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 抽奖结果实体 (每个 slot 的选取各一行)
/// 概念说明:
/// - draw_id: 同一次抽奖请求产生的各 slot 结果共享同一个 uuid
/// - label / amount: 奖项信息历史快照 (奖项配置改动不影响历史记录)
/// - sequence_position: 消费的序列位置, NULL 表示走了随机回退路径
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "draw_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub draw_id: Uuid,
    pub slot: i32,
    pub outcome_id: i64,
    pub label: String,
    pub amount: i64,
    pub sequence_position: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
