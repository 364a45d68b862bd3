use sea_orm_migration::prelude::*;

/// Campaigns (抽奖活动表)
#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Name,
    GameType,
    TotalWinners,
    TotalAmount,
    CurrentWinners,
    CurrentSpent,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Outcomes (奖项配置表 - 转盘扇区 / 骰子面)
#[derive(DeriveIden)]
enum Outcomes {
    Table,
    Id,
    CampaignId,
    Slot,
    Label,
    Amount,
    MaxWins,
    CurrentWins,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

/// Rotations (每个 slot 一行: 预洗牌序列 + 游标)
#[derive(DeriveIden)]
enum Rotations {
    Table,
    Id,
    CampaignId,
    Slot,
    Sequence,
    CurrentIndex,
    UpdatedAt,
}

/// Draw Results (抽奖结果记录)
#[derive(DeriveIden)]
enum DrawResults {
    Table,
    Id,
    CampaignId,
    DrawId,
    Slot,
    OutcomeId,
    Label,
    Amount,
    SequencePosition,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 建表说明:
/// - amount 单位为美分; 0 表示无金额 (安慰奖)
/// - max_wins = 0 表示无配额限制 (不进入 rotation sequence)
/// - rotations.sequence 为 JSON 数组, 元素是 outcome 的 display_order
/// - rotations.current_index 是并发安全的消费游标 (条件 UPDATE 做 CAS)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 活动表
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Campaigns::GameType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::TotalWinners)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::TotalAmount)
                            .big_integer()
                            .null(), // NULL = 未设置预算
                    )
                    .col(
                        ColumnDef::new(Campaigns::CurrentWinners)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CurrentSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 按游戏类型查询当前激活活动
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_game_type_active")
                    .table(Campaigns::Table)
                    .col(Campaigns::GameType)
                    .col(Campaigns::IsActive)
                    .to_owned(),
            )
            .await?;

        // 奖项表
        manager
            .create_table(
                Table::create()
                    .table(Outcomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Outcomes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Outcomes::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Outcomes::Slot)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Outcomes::Label).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Outcomes::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Outcomes::MaxWins)
                            .big_integer()
                            .not_null()
                            .default(0), // 0 = 无配额
                    )
                    .col(
                        ColumnDef::new(Outcomes::CurrentWins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Outcomes::DisplayOrder).integer().not_null())
                    .col(
                        ColumnDef::new(Outcomes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Outcomes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一活动同一 slot 内 display_order 唯一 (序列引用靠它定位)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_outcomes_campaign_slot_order_unique")
                    .table(Outcomes::Table)
                    .col(Outcomes::CampaignId)
                    .col(Outcomes::Slot)
                    .col(Outcomes::DisplayOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Outcomes::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_outcomes_campaign")
                            .from_tbl(Outcomes::Table)
                            .from_col(Outcomes::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 序列/游标表
        manager
            .create_table(
                Table::create()
                    .table(Rotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rotations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Rotations::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rotations::Slot)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Rotations::Sequence).json().not_null())
                    .col(
                        ColumnDef::new(Rotations::CurrentIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rotations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个 (campaign, slot) 只有一行游标
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rotations_campaign_slot_unique")
                    .table(Rotations::Table)
                    .col(Rotations::CampaignId)
                    .col(Rotations::Slot)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Rotations::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_rotations_campaign")
                            .from_tbl(Rotations::Table)
                            .from_col(Rotations::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖结果表
        manager
            .create_table(
                Table::create()
                    .table(DrawResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DrawResults::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawResults::DrawId).uuid().not_null())
                    .col(
                        ColumnDef::new(DrawResults::Slot)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DrawResults::OutcomeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawResults::Label)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawResults::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DrawResults::SequencePosition)
                            .integer()
                            .null(), // NULL = 走了随机回退路径
                    )
                    .col(
                        ColumnDef::new(DrawResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_results_campaign")
                    .table(DrawResults::Table)
                    .col(DrawResults::CampaignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_results_draw")
                    .table(DrawResults::Table)
                    .col(DrawResults::DrawId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(DrawResults::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_draw_results_campaign")
                            .from_tbl(DrawResults::Table)
                            .from_col(DrawResults::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序: 结果 -> 序列 -> 奖项 -> 活动
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DrawResults::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Rotations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Outcomes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Campaigns::Table).to_owned())
            .await?;

        Ok(())
    }
}
