use crate::config::DrawConfig;
use crate::entities::{
    campaign_entity as campaigns, draw_result_entity as results, outcome_entity as outcomes,
    rotation_entity as rotations,
};
use crate::error::{AppError, AppResult};
use crate::models::{DrawPick, DrawResponse};
use crate::services::sequence;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, UpdateResult,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
    config: DrawConfig,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection, config: DrawConfig) -> Self {
        Self { pool, config }
    }

    /// 抽奖
    ///
    /// 逻辑 (每个 slot, 整个请求在一个事务里):
    /// 1. 读取活动 / 奖项 / 序列游标
    /// 2. 序列有未消费项 -> 该项就是赢家 ("预定" 路径), 条件 UPDATE 推进游标
    /// 3. 序列为空或已耗尽 -> 两级随机回退; 两级都空 -> Exhausted (回滚, 不落任何记录)
    /// 4. 赢家确定后: 写 draw_results, 奖项 current_wins +1, 活动计数累加, 提交
    ///
    /// 游标 CAS 失败说明另一个并发请求抢到了同一个序列位置,
    /// 整个抽奖从头重试 (有限次), 重试耗尽才向上抛 Conflict。
    pub async fn draw(&self, campaign_id: i64) -> AppResult<DrawResponse> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_draw(campaign_id).await {
                Err(AppError::Conflict(msg))
                    if retry_after_conflict(attempts, self.config.max_conflict_retries) =>
                {
                    log::warn!(
                        "Draw lost a race on campaign {campaign_id} (attempt {attempts}): {msg}"
                    );
                    continue;
                }
                result => return result,
            }
        }
    }

    async fn try_draw(&self, campaign_id: i64) -> AppResult<DrawResponse> {
        let txn = self.pool.begin().await?;

        let campaign = campaigns::Entity::find_by_id(campaign_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {campaign_id} not found")))?;
        // 未激活的活动对抽奖方不可见
        if !campaign.is_active {
            return Err(AppError::NotFound(format!(
                "Campaign {campaign_id} is not active"
            )));
        }

        let all_outcomes = outcomes::Entity::find()
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .order_by_asc(outcomes::Column::Slot)
            .order_by_asc(outcomes::Column::DisplayOrder)
            .all(&txn)
            .await?;
        if all_outcomes.is_empty() {
            return Err(AppError::ValidationError(
                "No outcomes configured for campaign".into(),
            ));
        }

        let rotation_rows = rotations::Entity::find()
            .filter(rotations::Column::CampaignId.eq(campaign_id))
            .all(&txn)
            .await?;

        let draw_id = Uuid::new_v4();
        let mut picks: Vec<DrawPick> = Vec::new();
        let mut spent_delta: i64 = 0;

        for slot in 0..campaign.game_type.picks_per_draw() {
            let slot_outcomes: Vec<&outcomes::Model> =
                all_outcomes.iter().filter(|o| o.slot == slot).collect();
            if slot_outcomes.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "No outcomes configured for slot {slot}"
                )));
            }

            let rotation = rotation_rows.iter().find(|r| r.slot == slot);
            let pick = match rotation.and_then(|r| r.pending_entry().map(|e| (r, e))) {
                Some((rotation, entry)) => {
                    self.consume_sequence_entry(&txn, rotation, entry, slot, &slot_outcomes)
                        .await?
                }
                None => match self.fallback_pick(&txn, slot, &slot_outcomes).await? {
                    Some(pick) => pick,
                    None => {
                        // 任一 slot 耗尽则整次抽奖视为 Exhausted, 不留下半截结果
                        txn.rollback().await?;
                        log::info!("Campaign {campaign_id} exhausted at slot {slot}");
                        return Ok(DrawResponse::exhausted());
                    }
                },
            };

            results::ActiveModel {
                campaign_id: Set(campaign_id),
                draw_id: Set(draw_id),
                slot: Set(slot),
                outcome_id: Set(pick.outcome_id),
                label: Set(pick.label.clone()),
                amount: Set(pick.amount),
                sequence_position: Set(pick.sequence_position),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            spent_delta += pick.amount;
            picks.push(pick);
        }

        // 活动累计计数: 数据库端原子累加, 不走读-改-写
        campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::CurrentWinners,
                Expr::col(campaigns::Column::CurrentWinners).add(picks.len() as i64),
            )
            .col_expr(
                campaigns::Column::CurrentSpent,
                Expr::col(campaigns::Column::CurrentSpent).add(spent_delta),
            )
            .filter(campaigns::Column::Id.eq(campaign_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(DrawResponse {
            draw_id,
            exhausted: false,
            picks,
        })
    }

    /// 预定路径: 消费序列当前游标指向的项
    ///
    /// 游标推进用条件 UPDATE (where current_index = 读到的值) 做 CAS,
    /// 0 行生效说明游标被并发请求抢先推进, 返回 Conflict 让上层整体重试。
    async fn consume_sequence_entry(
        &self,
        txn: &DatabaseTransaction,
        rotation: &rotations::Model,
        entry: i32,
        slot: i32,
        slot_outcomes: &[&outcomes::Model],
    ) -> AppResult<DrawPick> {
        let cursor = rotation.current_index;

        let update_result: UpdateResult = rotations::Entity::update_many()
            .col_expr(rotations::Column::CurrentIndex, Expr::value(cursor + 1))
            .filter(rotations::Column::Id.eq(rotation.id))
            .filter(rotations::Column::CurrentIndex.eq(cursor))
            .exec(txn)
            .await?;
        if update_result.rows_affected != 1 {
            return Err(AppError::Conflict(format!(
                "rotation cursor for slot {slot} was advanced concurrently"
            )));
        }

        let winner = slot_outcomes
            .iter()
            .find(|o| o.display_order == entry)
            .ok_or_else(|| {
                // 只会在奖项集变更未触发重建时出现, 配置层禁止这种状态
                AppError::InternalError(format!(
                    "rotation sequence references missing outcome (display_order {entry})"
                ))
            })?;

        // 序列位置独占消费, 配额由序列内容保证, 这里直接累加
        outcomes::Entity::update_many()
            .col_expr(
                outcomes::Column::CurrentWins,
                Expr::col(outcomes::Column::CurrentWins).add(1),
            )
            .filter(outcomes::Column::Id.eq(winner.id))
            .exec(txn)
            .await?;

        Ok(DrawPick {
            slot,
            outcome_id: winner.id,
            label: winner.label.clone(),
            amount: winner.amount,
            sequence_position: Some(cursor),
            display_order: winner.display_order,
        })
    }

    /// 随机回退路径 (序列为空或已耗尽时)
    ///
    /// 第一梯队: 带金额且配额未用完的奖项, 均匀随机; 命中后用带守卫的
    /// 原子累加 (where current_wins < max_wins) 兑现配额, 竞争失败就剔除
    /// 该奖项重新抽。第二梯队: 安慰奖, 均匀随机, 永远可用。
    /// 都抽不到返回 None (Exhausted)。
    async fn fallback_pick(
        &self,
        txn: &DatabaseTransaction,
        slot: i32,
        slot_outcomes: &[&outcomes::Model],
    ) -> AppResult<Option<DrawPick>> {
        let tiers = sequence::fallback_tiers(slot_outcomes);

        // 第一梯队: 抽中后兑现配额, 竞争失败的奖项不再回到候选集
        let mut valuable = tiers.valuable;
        while let Some(chosen) = take_random(&mut valuable) {
            let update_result: UpdateResult = outcomes::Entity::update_many()
                .col_expr(
                    outcomes::Column::CurrentWins,
                    Expr::col(outcomes::Column::CurrentWins).add(1),
                )
                .filter(outcomes::Column::Id.eq(chosen.id))
                .filter(outcomes::Column::CurrentWins.lt(chosen.max_wins))
                .exec(txn)
                .await?;

            if update_result.rows_affected == 1 {
                return Ok(Some(DrawPick {
                    slot,
                    outcome_id: chosen.id,
                    label: chosen.label,
                    amount: chosen.amount,
                    sequence_position: None,
                    display_order: chosen.display_order,
                }));
            }
            // 配额已被并发请求用完, 换下一个候选
        }

        // 第二梯队: 安慰奖
        let mut consolation = tiers.consolation;
        let Some(chosen) = take_random(&mut consolation) else {
            return Ok(None);
        };

        outcomes::Entity::update_many()
            .col_expr(
                outcomes::Column::CurrentWins,
                Expr::col(outcomes::Column::CurrentWins).add(1),
            )
            .filter(outcomes::Column::Id.eq(chosen.id))
            .exec(txn)
            .await?;

        Ok(Some(DrawPick {
            slot,
            outcome_id: chosen.id,
            label: chosen.label,
            amount: chosen.amount,
            sequence_position: None,
            display_order: chosen.display_order,
        }))
    }

    /// 重置活动
    ///
    /// 一个事务内完成: 删除全部抽奖记录 -> 活动与奖项计数清零 ->
    /// 重建各 slot 序列并把游标归零。与抽奖共用事务边界,
    /// 保证重置不会与进行中的抽奖交错。对结果状态幂等。
    pub async fn reset(&self, campaign_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let campaign = campaigns::Entity::find_by_id(campaign_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {campaign_id} not found")))?;
        // 与抽奖同一可见性规则: 未激活活动对 draw/reset 均不可见
        if !campaign.is_active {
            return Err(AppError::NotFound(format!(
                "Campaign {campaign_id} is not active"
            )));
        }

        results::Entity::delete_many()
            .filter(results::Column::CampaignId.eq(campaign_id))
            .exec(&txn)
            .await?;

        outcomes::Entity::update_many()
            .col_expr(outcomes::Column::CurrentWins, Expr::value(0i64))
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .exec(&txn)
            .await?;

        campaigns::Entity::update_many()
            .col_expr(campaigns::Column::CurrentWinners, Expr::value(0i64))
            .col_expr(campaigns::Column::CurrentSpent, Expr::value(0i64))
            .filter(campaigns::Column::Id.eq(campaign_id))
            .exec(&txn)
            .await?;

        let all_outcomes = outcomes::Entity::find()
            .filter(outcomes::Column::CampaignId.eq(campaign_id))
            .order_by_asc(outcomes::Column::DisplayOrder)
            .all(&txn)
            .await?;
        sequence::regenerate_rotations(
            &txn,
            campaign_id,
            campaign.game_type.picks_per_draw(),
            &all_outcomes,
        )
        .await?;

        txn.commit().await?;
        log::info!("Campaign {campaign_id} reset");
        Ok(())
    }
}

/// 冲突重试判定: 已尝试 attempts 次后还要不要再试一次。
/// max_attempts 封顶, 之后 Conflict 原样抛给调用方。
fn retry_after_conflict(attempts: u32, max_attempts: u32) -> bool {
    attempts < max_attempts
}

/// 均匀随机取出一个候选奖项。取出即从候选集移除:
/// 兑现失败 (配额被并发请求用完) 的奖项不会回流重抽。
fn take_random(candidates: &mut Vec<outcomes::Model>) -> Option<outcomes::Model> {
    if candidates.is_empty() {
        return None;
    }
    let idx = {
        let mut rng = rand::rng();
        rng.random_range(0..candidates.len())
    };
    Some(candidates.swap_remove(idx))
}

#[cfg(test)]
mod tests {
    //! 用内存状态机模拟引擎的状态转移规则 (序列消费 / 回退梯队 / 计数累加),
    //! 覆盖配额兑现、耗尽降级与端到端场景。

    use super::{retry_after_conflict, take_random};
    use crate::entities::outcome_entity as outcomes;
    use crate::error::AppError;
    use crate::services::sequence::{fallback_tiers, generate_rotation};

    struct SimState {
        outcomes: Vec<outcomes::Model>,
        sequence: Vec<i32>,
        cursor: usize,
        current_winners: i64,
        current_spent: i64,
    }

    enum SimPick {
        Won { display_order: i32, amount: i64 },
        Exhausted,
    }

    impl SimState {
        fn new(outcomes: Vec<outcomes::Model>) -> Self {
            let sequence = generate_rotation(&outcomes);
            SimState {
                outcomes,
                sequence,
                cursor: 0,
                current_winners: 0,
                current_spent: 0,
            }
        }

        /// try_draw 的单 slot 状态转移, 与 DrawService 同一套规则
        fn draw(&mut self) -> SimPick {
            let winner_order = if let Some(&entry) = self.sequence.get(self.cursor) {
                self.cursor += 1;
                entry
            } else {
                let refs: Vec<&outcomes::Model> = self.outcomes.iter().collect();
                let tiers = fallback_tiers(&refs);
                if let Some(o) = tiers.valuable.first() {
                    o.display_order
                } else if let Some(o) = tiers.consolation.first() {
                    o.display_order
                } else {
                    return SimPick::Exhausted;
                }
            };
            let winner = self
                .outcomes
                .iter_mut()
                .find(|o| o.display_order == winner_order)
                .expect("sequence entry maps to an outcome");
            winner.current_wins += 1;
            self.current_winners += 1;
            self.current_spent += winner.amount;
            SimPick::Won {
                display_order: winner.display_order,
                amount: winner.amount,
            }
        }
    }

    fn outcome(display_order: i32, amount: i64, max_wins: i64) -> outcomes::Model {
        outcomes::Model {
            id: display_order as i64 + 1,
            campaign_id: 1,
            slot: 0,
            label: format!("outcome-{display_order}"),
            amount,
            max_wins,
            current_wins: 0,
            display_order,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn draining_the_sequence_hits_every_quota_exactly() {
        let mut state = SimState::new(vec![
            outcome(0, 100, 3),
            outcome(1, 500, 2),
            outcome(2, 0, 0),
        ]);
        assert_eq!(state.sequence.len(), 5);
        for _ in 0..5 {
            assert!(matches!(state.draw(), SimPick::Won { .. }));
        }
        for o in &state.outcomes {
            if o.max_wins > 0 {
                assert_eq!(o.current_wins, o.max_wins);
            }
        }
        assert_eq!(state.current_winners, 5);
        assert_eq!(state.current_spent, 3 * 100 + 2 * 500);
    }

    #[test]
    fn quota_never_exceeded_after_sequence_exhaustion() {
        let mut state = SimState::new(vec![outcome(0, 100, 2), outcome(1, 0, 0)]);
        // 耗尽序列后继续抽, 配额奖项不再出现
        for _ in 0..10 {
            state.draw();
        }
        let quota_outcome = &state.outcomes[0];
        assert_eq!(quota_outcome.current_wins, quota_outcome.max_wins);
        // 其余全部落在安慰奖上
        assert_eq!(state.outcomes[1].current_wins, 8);
    }

    #[test]
    fn exhausted_when_no_consolation_remains() {
        let mut state = SimState::new(vec![outcome(0, 100, 1)]);
        assert!(matches!(state.draw(), SimPick::Won { .. }));
        assert!(matches!(state.draw(), SimPick::Exhausted));
        // Exhausted 不改变任何计数
        assert_eq!(state.current_winners, 1);
        assert_eq!(state.outcomes[0].current_wins, 1);
    }

    #[test]
    fn end_to_end_scenario_a2_b1_c_consolation() {
        // A(配额2, 金额100), B(配额1, 金额500), C(无配额无金额)
        let mut state = SimState::new(vec![
            outcome(0, 100, 2),
            outcome(1, 500, 1),
            outcome(2, 0, 0),
        ]);
        assert_eq!(state.sequence.len(), 3);

        let mut sequence_draws: Vec<i32> = Vec::new();
        for _ in 0..3 {
            match state.draw() {
                SimPick::Won { display_order, .. } => sequence_draws.push(display_order),
                SimPick::Exhausted => panic!("sequence draw must not exhaust"),
            }
        }
        sequence_draws.sort_unstable();
        assert_eq!(sequence_draws, vec![0, 0, 1]);

        // 第四次起永远是安慰奖 C
        match state.draw() {
            SimPick::Won {
                display_order,
                amount,
            } => {
                assert_eq!(display_order, 2);
                assert_eq!(amount, 0);
            }
            SimPick::Exhausted => panic!("consolation outcome must keep the campaign open"),
        }

        assert_eq!(state.current_winners, 4);
        assert_eq!(state.current_spent, 600);
    }

    #[test]
    fn reset_postconditions_are_idempotent() {
        let set = vec![outcome(0, 100, 2), outcome(1, 500, 1)];
        let mut state = SimState::new(set);
        state.draw();
        state.draw();

        // 模拟 reset: 计数清零 + 重建序列 + 游标归零
        let reset = |state: &mut SimState| {
            for o in state.outcomes.iter_mut() {
                o.current_wins = 0;
            }
            state.current_winners = 0;
            state.current_spent = 0;
            state.sequence = generate_rotation(&state.outcomes);
            state.cursor = 0;
        };

        reset(&mut state);
        reset(&mut state); // 二次 reset 的结果状态等价

        assert_eq!(state.cursor, 0);
        assert_eq!(state.current_winners, 0);
        assert_eq!(state.current_spent, 0);
        assert_eq!(state.sequence.len(), 3);
        assert!(state.outcomes.iter().all(|o| o.current_wins == 0));
    }

    #[test]
    fn conflict_surfaces_only_after_retries_are_spent() {
        // 模拟 try_draw 的结果序列, 套用 draw() 的重试规则
        fn run(mut results: Vec<Result<(), AppError>>, max: u32) -> (u32, Result<(), AppError>) {
            let mut attempts = 0;
            loop {
                attempts += 1;
                match results.remove(0) {
                    Err(AppError::Conflict(_)) if retry_after_conflict(attempts, max) => continue,
                    other => return (attempts, other),
                }
            }
        }
        let lost = || Err(AppError::Conflict("rotation cursor advanced concurrently".into()));

        // 每次都输掉游标 CAS: 恰好尝试 max 次, 然后 Conflict 抛给调用方
        let (attempts, out) = run(vec![lost(), lost(), lost()], 3);
        assert_eq!(attempts, 3);
        assert!(matches!(out, Err(AppError::Conflict(_))));

        // 第二次就成功: 冲突被重试吸收, 调用方看不到
        let (attempts, out) = run(vec![lost(), Ok(())], 3);
        assert_eq!(attempts, 2);
        assert!(out.is_ok());

        // 上限 1 即不重试
        assert!(!retry_after_conflict(1, 1));
    }

    #[test]
    fn lost_fallback_claim_is_dropped_not_retried() {
        // 三个候选, 只有 1 号的守卫 UPDATE 能生效 (其余配额被并发用完)
        let mut candidates = vec![outcome(0, 100, 1), outcome(1, 200, 1), outcome(2, 300, 1)];
        let mut drawn: Vec<i32> = Vec::new();
        let mut winner = None;
        while let Some(chosen) = take_random(&mut candidates) {
            drawn.push(chosen.display_order);
            if chosen.display_order == 1 {
                winner = Some(chosen);
                break;
            }
        }
        assert_eq!(winner.expect("claimable candidate must win").display_order, 1);
        // 输掉的候选被移出, 最多各抽到一次, 循环必然有界
        assert!(drawn.len() <= 3);
        for d in [0, 2] {
            assert!(drawn.iter().filter(|&&x| x == d).count() <= 1);
        }
        // 候选耗尽时返回 None, 上层降级到安慰奖 / Exhausted
        let mut none_left: Vec<outcomes::Model> = Vec::new();
        assert!(take_random(&mut none_left).is_none());
    }
}
