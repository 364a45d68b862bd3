use crate::entities::{
    GameType, campaign_entity as campaigns, draw_result_entity as results,
    outcome_entity as outcomes, rotation_entity as rotations,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CampaignDetailResponse, CampaignProgressResponse, CampaignResponse, CreateCampaignRequest,
    CreateOutcomeRequest, DrawResultPageResponse, DrawResultQuery, DrawResultResponse,
    OutcomeResponse, PaginatedResponse, PaginationParams, RotationProgress, UpdateOutcomeRequest,
};
use crate::services::sequence;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::sea_query::Expr;

#[derive(Clone)]
pub struct CampaignService {
    pool: DatabaseConnection,
}

impl CampaignService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建活动 (含初始奖项), 创建即生成 rotation sequence
    ///
    /// 新活动默认不激活, 需要显式调用 activate; 同一游戏类型同时只有
    /// 一个激活活动。
    pub async fn create_campaign(
        &self,
        req: &CreateCampaignRequest,
    ) -> AppResult<CampaignDetailResponse> {
        if req.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Campaign name must not be empty".into(),
            ));
        }
        if req.total_winners < 0 {
            return Err(AppError::ValidationError(
                "total_winners must not be negative".into(),
            ));
        }
        if let Some(total) = req.total_amount
            && total < 0
        {
            return Err(AppError::ValidationError(
                "total_amount must not be negative".into(),
            ));
        }
        for item in &req.outcomes {
            validate_outcome_config(
                req.game_type,
                item.slot,
                &item.label,
                item.amount,
                item.max_wins,
            )?;
        }
        check_duplicate_positions(&req.outcomes)?;

        let txn = self.pool.begin().await?;

        let campaign = campaigns::ActiveModel {
            name: Set(req.name.trim().to_string()),
            game_type: Set(req.game_type),
            total_winners: Set(req.total_winners),
            total_amount: Set(req.total_amount),
            current_winners: Set(0),
            current_spent: Set(0),
            is_active: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for item in &req.outcomes {
            outcomes::ActiveModel {
                campaign_id: Set(campaign.id),
                slot: Set(item.slot),
                label: Set(item.label.trim().to_string()),
                amount: Set(item.amount),
                max_wins: Set(item.max_wins),
                current_wins: Set(0),
                display_order: Set(item.display_order),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let all_outcomes = load_outcomes(&txn, campaign.id).await?;
        sequence::regenerate_rotations(
            &txn,
            campaign.id,
            campaign.game_type.picks_per_draw(),
            &all_outcomes,
        )
        .await?;

        let rotation_rows = load_rotations(&txn, campaign.id).await?;
        txn.commit().await?;

        log::info!(
            "Created campaign {} ({}) with {} outcomes",
            campaign.id,
            campaign.game_type,
            all_outcomes.len()
        );
        Ok(detail_response(campaign, all_outcomes, rotation_rows))
    }

    pub async fn list_campaigns(&self) -> AppResult<Vec<CampaignResponse>> {
        let list = campaigns::Entity::find()
            .order_by_desc(campaigns::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get_campaign(&self, campaign_id: i64) -> AppResult<CampaignDetailResponse> {
        let campaign = self.find_campaign(&self.pool, campaign_id).await?;
        let all_outcomes = load_outcomes(&self.pool, campaign_id).await?;
        let rotation_rows = load_rotations(&self.pool, campaign_id).await?;
        Ok(detail_response(campaign, all_outcomes, rotation_rows))
    }

    /// 激活活动, 同类型的其它活动自动取消激活 (后写者胜, 管理操作非热路径)
    ///
    /// 激活前校验每个 slot 都配置了奖项 — 缺 slot 的活动激活后每次抽奖
    /// 都会失败, 这种配置错误要在管理端就暴露出来。
    pub async fn activate_campaign(&self, campaign_id: i64) -> AppResult<CampaignResponse> {
        let txn = self.pool.begin().await?;
        let campaign = self.find_campaign(&txn, campaign_id).await?;

        let all_outcomes = load_outcomes(&txn, campaign_id).await?;
        check_slot_coverage(campaign.game_type, &all_outcomes)?;

        campaigns::Entity::update_many()
            .col_expr(campaigns::Column::IsActive, Expr::value(false))
            .filter(campaigns::Column::GameType.eq(campaign.game_type))
            .filter(campaigns::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let mut am = campaign.into_active_model();
        am.is_active = Set(true);
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        txn.commit().await?;
        log::info!("Activated campaign {campaign_id} ({})", updated.game_type);
        Ok(updated.into())
    }

    /// 删除活动及其全部奖项 / 序列 / 抽奖记录 (一个事务)
    pub async fn delete_campaign(&self, campaign_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        self.find_campaign(&txn, campaign_id).await?;

        results::Entity::delete_many()
            .filter(results::Column::CampaignId.eq(campaign_id))
            .exec(&txn)
            .await?;
        rotations::Entity::delete_many()
            .filter(rotations::Column::CampaignId.eq(campaign_id))
            .exec(&txn)
            .await?;
        outcomes::Entity::delete_many()
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .exec(&txn)
            .await?;
        campaigns::Entity::delete_by_id(campaign_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!("Deleted campaign {campaign_id}");
        Ok(())
    }

    /// 新增奖项; 奖项集变了, 同事务内重建序列
    pub async fn add_outcome(
        &self,
        campaign_id: i64,
        req: &CreateOutcomeRequest,
    ) -> AppResult<OutcomeResponse> {
        let txn = self.pool.begin().await?;
        let campaign = self.find_campaign(&txn, campaign_id).await?;
        validate_outcome_config(
            campaign.game_type,
            req.slot,
            &req.label,
            req.amount,
            req.max_wins,
        )?;

        let clash = outcomes::Entity::find()
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .filter(outcomes::Column::Slot.eq(req.slot))
            .filter(outcomes::Column::DisplayOrder.eq(req.display_order))
            .one(&txn)
            .await?;
        if clash.is_some() {
            return Err(AppError::ValidationError(format!(
                "display_order {} already used in slot {}",
                req.display_order, req.slot
            )));
        }

        let inserted = outcomes::ActiveModel {
            campaign_id: Set(campaign_id),
            slot: Set(req.slot),
            label: Set(req.label.trim().to_string()),
            amount: Set(req.amount),
            max_wins: Set(req.max_wins),
            current_wins: Set(0),
            display_order: Set(req.display_order),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let all_outcomes = load_outcomes(&txn, campaign_id).await?;
        sequence::regenerate_rotations(
            &txn,
            campaign_id,
            campaign.game_type.picks_per_draw(),
            &all_outcomes,
        )
        .await?;

        txn.commit().await?;
        Ok(inserted.into())
    }

    /// 修改奖项 (名称 / 金额 / 配额 / 展示位置); 同事务内重建序列。
    /// 不重建就改奖项集是未定义行为, 所以这里不提供绕过重建的入口。
    pub async fn update_outcome(
        &self,
        campaign_id: i64,
        outcome_id: i64,
        req: &UpdateOutcomeRequest,
    ) -> AppResult<OutcomeResponse> {
        let txn = self.pool.begin().await?;
        let campaign = self.find_campaign(&txn, campaign_id).await?;

        let existing = outcomes::Entity::find_by_id(outcome_id)
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Outcome {outcome_id} not found")))?;

        let label = req.label.clone().unwrap_or_else(|| existing.label.clone());
        let amount = req.amount.unwrap_or(existing.amount);
        let max_wins = req.max_wins.unwrap_or(existing.max_wins);
        let display_order = req.display_order.unwrap_or(existing.display_order);
        validate_outcome_config(campaign.game_type, existing.slot, &label, amount, max_wins)?;

        if display_order != existing.display_order {
            let clash = outcomes::Entity::find()
                .filter(outcomes::Column::CampaignId.eq(campaign_id))
                .filter(outcomes::Column::Slot.eq(existing.slot))
                .filter(outcomes::Column::DisplayOrder.eq(display_order))
                .one(&txn)
                .await?;
            if clash.is_some() {
                return Err(AppError::ValidationError(format!(
                    "display_order {display_order} already used in slot {}",
                    existing.slot
                )));
            }
        }

        let mut am = existing.into_active_model();
        am.label = Set(label.trim().to_string());
        am.amount = Set(amount);
        am.max_wins = Set(max_wins);
        am.display_order = Set(display_order);
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        let all_outcomes = load_outcomes(&txn, campaign_id).await?;
        sequence::regenerate_rotations(
            &txn,
            campaign_id,
            campaign.game_type.picks_per_draw(),
            &all_outcomes,
        )
        .await?;

        txn.commit().await?;
        Ok(updated.into())
    }

    /// 删除奖项; 同事务内重建序列
    pub async fn remove_outcome(&self, campaign_id: i64, outcome_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let campaign = self.find_campaign(&txn, campaign_id).await?;

        let existing = outcomes::Entity::find_by_id(outcome_id)
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Outcome {outcome_id} not found")))?;
        outcomes::Entity::delete_by_id(existing.id).exec(&txn).await?;

        let all_outcomes = load_outcomes(&txn, campaign_id).await?;
        sequence::regenerate_rotations(
            &txn,
            campaign_id,
            campaign.game_type.picks_per_draw(),
            &all_outcomes,
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    /// 活动进度汇总 (报表展示, 只读)
    pub async fn get_progress(&self, campaign_id: i64) -> AppResult<CampaignProgressResponse> {
        let campaign = self.find_campaign(&self.pool, campaign_id).await?;
        let all_outcomes = load_outcomes(&self.pool, campaign_id).await?;
        let rotation_rows = load_rotations(&self.pool, campaign_id).await?;

        Ok(CampaignProgressResponse {
            campaign_id: campaign.id,
            total_winners: campaign.total_winners,
            total_amount: campaign.total_amount,
            current_winners: campaign.current_winners,
            current_spent: campaign.current_spent,
            rotations: rotation_rows.iter().map(rotation_progress).collect(),
            outcomes: all_outcomes.into_iter().map(Into::into).collect(),
        })
    }

    /// 抽奖历史 (分页, 倒序)
    pub async fn list_results(
        &self,
        campaign_id: i64,
        query: &DrawResultQuery,
    ) -> AppResult<DrawResultPageResponse> {
        self.find_campaign(&self.pool, campaign_id).await?;

        let params = PaginationParams::new(query.page, query.per_page);
        let offset = params.get_offset();
        let limit = params.get_limit();

        let base_query =
            results::Entity::find().filter(results::Column::CampaignId.eq(campaign_id));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items_models = base_query
            .order_by(results::Column::CreatedAt, Order::Desc)
            .order_by(results::Column::Id, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<DrawResultResponse> = items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1).max(1),
            limit,
            total,
        ))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn find_campaign<C: ConnectionTrait>(
        &self,
        conn: &C,
        campaign_id: i64,
    ) -> AppResult<campaigns::Model> {
        campaigns::Entity::find_by_id(campaign_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {campaign_id} not found")))
    }
}

async fn load_outcomes<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
) -> AppResult<Vec<outcomes::Model>> {
    Ok(outcomes::Entity::find()
        .filter(outcomes::Column::CampaignId.eq(campaign_id))
        .order_by_asc(outcomes::Column::Slot)
        .order_by_asc(outcomes::Column::DisplayOrder)
        .all(conn)
        .await?)
}

async fn load_rotations<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
) -> AppResult<Vec<rotations::Model>> {
    Ok(rotations::Entity::find()
        .filter(rotations::Column::CampaignId.eq(campaign_id))
        .order_by_asc(rotations::Column::Slot)
        .all(conn)
        .await?)
}

fn rotation_progress(row: &rotations::Model) -> RotationProgress {
    RotationProgress {
        slot: row.slot,
        sequence_length: row.sequence_entries().len() as i32,
        consumed: row.current_index,
    }
}

fn detail_response(
    campaign: campaigns::Model,
    all_outcomes: Vec<outcomes::Model>,
    rotation_rows: Vec<rotations::Model>,
) -> CampaignDetailResponse {
    CampaignDetailResponse {
        campaign: campaign.into(),
        outcomes: all_outcomes.into_iter().map(Into::into).collect(),
        rotations: rotation_rows.iter().map(rotation_progress).collect(),
    }
}

/// 奖项配置校验
///
/// 带金额的奖项必须声明配额 — 否则随机回退可以无限发钱,
/// 这类配置在进入引擎之前就被拒绝。
fn validate_outcome_config(
    game_type: GameType,
    slot: i32,
    label: &str,
    amount: i64,
    max_wins: i64,
) -> AppResult<()> {
    if label.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Outcome label must not be empty".into(),
        ));
    }
    if amount < 0 {
        return Err(AppError::ValidationError(
            "Outcome amount must not be negative".into(),
        ));
    }
    if max_wins < 0 {
        return Err(AppError::ValidationError(
            "Outcome max_wins must not be negative".into(),
        ));
    }
    if amount > 0 && max_wins == 0 {
        return Err(AppError::ValidationError(
            "Outcome with a monetary amount must declare a quota (max_wins > 0)".into(),
        ));
    }
    let picks = game_type.picks_per_draw();
    if slot < 0 || slot >= picks {
        return Err(AppError::ValidationError(format!(
            "slot {slot} out of range for {game_type} (0..{picks})"
        )));
    }
    Ok(())
}

/// 激活前校验: 每个 slot 至少要有一个奖项 (三骰子要配满 3 个 slot)
fn check_slot_coverage(game_type: GameType, all_outcomes: &[outcomes::Model]) -> AppResult<()> {
    let picks = game_type.picks_per_draw();
    for slot in 0..picks {
        if !all_outcomes.iter().any(|o| o.slot == slot) {
            return Err(AppError::ValidationError(format!(
                "slot {slot} has no outcomes; {game_type} needs all {picks} slots configured before activation"
            )));
        }
    }
    Ok(())
}

/// 同一 slot 内 display_order 不得重复 (序列靠它定位奖项)
fn check_duplicate_positions(specs: &[CreateOutcomeRequest]) -> AppResult<()> {
    let mut seen = std::collections::HashSet::new();
    for item in specs {
        if !seen.insert((item.slot, item.display_order)) {
            return Err(AppError::ValidationError(format!(
                "display_order {} duplicated in slot {}",
                item.display_order, item.slot
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monetary_outcome_without_quota_is_rejected() {
        let err = validate_outcome_config(GameType::Wheel, 0, "Grand Prize", 500, 0);
        assert!(matches!(err, Err(AppError::ValidationError(_))));
        // 声明配额后合法
        assert!(validate_outcome_config(GameType::Wheel, 0, "Grand Prize", 500, 3).is_ok());
    }

    #[test]
    fn consolation_outcome_needs_no_quota() {
        assert!(validate_outcome_config(GameType::Wheel, 0, "Better luck next time", 0, 0).is_ok());
    }

    #[test]
    fn slot_bounds_follow_game_type() {
        assert!(validate_outcome_config(GameType::Wheel, 1, "Oops", 0, 0).is_err());
        assert!(validate_outcome_config(GameType::SingleDie, 0, "One", 0, 0).is_ok());
        assert!(validate_outcome_config(GameType::TripleDice, 2, "Six", 0, 0).is_ok());
        assert!(validate_outcome_config(GameType::TripleDice, 3, "Six", 0, 0).is_err());
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(validate_outcome_config(GameType::Wheel, 0, "Bad", -1, 0).is_err());
        assert!(validate_outcome_config(GameType::Wheel, 0, "Bad", 0, -2).is_err());
        assert!(validate_outcome_config(GameType::Wheel, 0, "  ", 0, 0).is_err());
    }

    #[test]
    fn duplicate_display_order_within_slot_is_rejected() {
        let specs = vec![
            CreateOutcomeRequest {
                slot: 0,
                label: "A".into(),
                amount: 0,
                max_wins: 0,
                display_order: 1,
            },
            CreateOutcomeRequest {
                slot: 1,
                label: "B".into(),
                amount: 0,
                max_wins: 0,
                display_order: 1, // 不同 slot, 允许
            },
            CreateOutcomeRequest {
                slot: 0,
                label: "C".into(),
                amount: 0,
                max_wins: 0,
                display_order: 1, // 与 A 冲突
            },
        ];
        assert!(check_duplicate_positions(&specs[..2]).is_ok());
        assert!(check_duplicate_positions(&specs).is_err());
    }

    #[test]
    fn activation_requires_every_slot_configured() {
        fn outcome_in_slot(slot: i32) -> outcomes::Model {
            outcomes::Model {
                id: slot as i64 + 1,
                campaign_id: 1,
                slot,
                label: format!("outcome-{slot}"),
                amount: 0,
                max_wins: 0,
                current_wins: 0,
                display_order: 0,
                created_at: None,
                updated_at: None,
            }
        }
        let full: Vec<outcomes::Model> = (0..3).map(outcome_in_slot).collect();
        assert!(check_slot_coverage(GameType::TripleDice, &full).is_ok());

        // 缺 slot 2 的三骰子活动不能激活
        assert!(matches!(
            check_slot_coverage(GameType::TripleDice, &full[..2]),
            Err(AppError::ValidationError(_))
        ));

        // 单 slot 游戏只看 slot 0
        assert!(check_slot_coverage(GameType::Wheel, &full[..1]).is_ok());
        assert!(check_slot_coverage(GameType::SingleDie, &[]).is_err());
    }
}
