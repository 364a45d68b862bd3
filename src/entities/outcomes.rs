use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖项实体 (转盘扇区 / 骰子面)
/// 概念说明:
/// - slot: 所属选取槽位 (转盘/单骰子恒为0, 三骰子为 0..=2)
/// - amount: 奖项金额 (美分), 0 表示无金额 (安慰奖)
/// - max_wins: 配额 (最多被抽中次数), 0 表示无配额限制
/// - display_order: 稳定展示位置, 同时是 rotation sequence 里的引用键
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "outcomes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub slot: i32,
    pub label: String,
    /// 金额 (美分) - 无金额类为 0
    pub amount: i64,
    /// 配额 (0 = 无限制 / 安慰奖)
    pub max_wins: i64,
    /// 已被抽中次数
    pub current_wins: i64,
    /// 展示位置 (同一 campaign+slot 内唯一)
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 是否带配额 (参与 rotation sequence)
    pub fn is_quota_bearing(&self) -> bool {
        self.max_wins > 0
    }

    /// 配额是否还有剩余 (无配额恒为 true)
    pub fn has_remaining_quota(&self) -> bool {
        self.max_wins == 0 || self.current_wins < self.max_wins
    }

    /// 是否是安慰奖 (无配额限制, 随机回退第二梯队, 永远可用;
    /// 配置校验保证带金额的奖项必有配额, 所以安慰奖金额恒为 0)
    pub fn is_consolation(&self) -> bool {
        self.max_wins == 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
