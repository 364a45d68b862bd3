use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 预洗牌序列实体, 每个 (campaign, slot) 一行
/// 概念说明:
/// - sequence: JSON 数组, 元素是奖项的 display_order, 每个带配额奖项恰好
///   出现 max_wins 次; 空数组表示无配额约束 (抽奖永远走随机回退)
/// - current_index: 消费游标, 只增不减, 0 <= current_index <= len(sequence);
///   推进必须通过条件 UPDATE (where current_index = 期望值) 做 CAS
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rotations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub slot: i32,
    pub sequence: Json,
    pub current_index: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 反序列化序列 (display_order 列表)
    pub fn sequence_entries(&self) -> Vec<i32> {
        serde_json::from_value(self.sequence.clone()).unwrap_or_default()
    }

    /// 游标处尚未消费的序列项 (序列为空或已耗尽返回 None)
    pub fn pending_entry(&self) -> Option<i32> {
        let entries = self.sequence_entries();
        entries.get(self.current_index as usize).copied()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
