use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 游戏类型 (每种类型同时最多一个激活的活动)
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// 大转盘
    #[sea_orm(string_value = "wheel")]
    Wheel,
    /// 单骰子
    #[sea_orm(string_value = "single_die")]
    SingleDie,
    /// 三骰子 (一次请求独立掷三次, 每个骰子有自己的奖项集)
    #[sea_orm(string_value = "triple_dice")]
    TripleDice,
}

impl GameType {
    /// 一次抽奖请求包含的独立选取次数 (即 slot 数)
    pub fn picks_per_draw(&self) -> i32 {
        match self {
            GameType::Wheel | GameType::SingleDie => 1,
            GameType::TripleDice => 3,
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Wheel => write!(f, "wheel"),
            GameType::SingleDie => write!(f, "single_die"),
            GameType::TripleDice => write!(f, "triple_dice"),
        }
    }
}

/// 抽奖活动实体
/// 概念说明:
/// - total_winners: 计划中奖总次数 (展示用目标, 不是硬性停止条件)
/// - total_amount: 预算上限 (美分, NULL 表示未设置, 仅用于进度展示)
/// - current_winners / current_spent: 运行累计, 只增不减, 仅 reset 清零
/// - is_active: 同一 game_type 同时只有一个激活活动
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub game_type: GameType,
    /// 计划中奖总次数
    pub total_winners: i64,
    /// 预算上限 (美分, NULL=未设置)
    pub total_amount: Option<i64>,
    /// 已产生的中奖次数 (等于 draw_results 行数)
    pub current_winners: i64,
    /// 已发放金额累计 (美分)
    pub current_spent: i64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
