//! Rotation sequence 生成与回退梯队划分
//!
//! 序列是配额兑现的核心: 把每个带配额奖项的 display_order 重复 max_wins 次
//! 组成多重集合, Fisher–Yates 洗牌后按序消费, 天然保证整个活动周期内
//! 每个奖项恰好中 max_wins 次, 既不会超发也不会少发。

use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entities::{outcome_entity as outcomes, rotation_entity as rotations};
use crate::error::AppResult;

/// 生成一条新的 rotation sequence (display_order 列表)
///
/// 无配额奖项不进入序列; 没有任何配额时返回空序列,
/// 抽奖将永远走随机回退路径。
pub fn generate_rotation(outcomes: &[outcomes::Model]) -> Vec<i32> {
    let mut seq: Vec<i32> = Vec::new();
    for o in outcomes.iter().filter(|o| o.is_quota_bearing()) {
        for _ in 0..o.max_wins {
            seq.push(o.display_order);
        }
    }
    let mut rng = rand::rng();
    seq.shuffle(&mut rng);
    seq
}

/// 随机回退的两级梯队
///
/// 第一梯队: 带金额且配额未用完的奖项;
/// 第二梯队: 安慰奖 (无配额, 永远可用)。
/// 两个梯队都为空时抽奖结果为 Exhausted。
pub fn fallback_tiers(slot_outcomes: &[&outcomes::Model]) -> FallbackTiers {
    let valuable: Vec<outcomes::Model> = slot_outcomes
        .iter()
        .filter(|o| o.amount > 0 && o.is_quota_bearing() && o.has_remaining_quota())
        .map(|o| (*o).clone())
        .collect();
    let consolation: Vec<outcomes::Model> = slot_outcomes
        .iter()
        .filter(|o| o.is_consolation())
        .map(|o| (*o).clone())
        .collect();
    FallbackTiers {
        valuable,
        consolation,
    }
}

#[derive(Debug, Clone)]
pub struct FallbackTiers {
    /// 带金额且配额未用完
    pub valuable: Vec<outcomes::Model>,
    /// 安慰奖, 不受配额约束
    pub consolation: Vec<outcomes::Model>,
}

impl FallbackTiers {
    pub fn is_exhausted(&self) -> bool {
        self.valuable.is_empty() && self.consolation.is_empty()
    }
}

/// 为活动的每个 slot 重建序列并把游标归零
///
/// 必须在调用方的事务里执行; 任何奖项集变更 (增/删/改配额或金额) 与 reset
/// 都要走这里。旧序列未消费的部分被整体丢弃 — 配额组合变了, 保留部分进度
/// 没有意义。
pub async fn regenerate_rotations<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
    picks_per_draw: i32,
    all_outcomes: &[outcomes::Model],
) -> AppResult<()> {
    for slot in 0..picks_per_draw {
        let slot_outcomes: Vec<outcomes::Model> = all_outcomes
            .iter()
            .filter(|o| o.slot == slot)
            .cloned()
            .collect();
        let seq = generate_rotation(&slot_outcomes);
        log::info!(
            "Regenerated rotation for campaign {campaign_id} slot {slot}: {} entries",
            seq.len()
        );
        let seq_json = serde_json::to_value(&seq)?;

        let existing = rotations::Entity::find()
            .filter(rotations::Column::CampaignId.eq(campaign_id))
            .filter(rotations::Column::Slot.eq(slot))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.sequence = Set(seq_json);
                am.current_index = Set(0);
                am.updated_at = Set(Some(Utc::now()));
                am.update(conn).await?;
            }
            None => {
                rotations::ActiveModel {
                    campaign_id: Set(campaign_id),
                    slot: Set(slot),
                    sequence: Set(seq_json),
                    current_index: Set(0),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn outcome(display_order: i32, amount: i64, max_wins: i64, current_wins: i64) -> outcomes::Model {
        outcomes::Model {
            id: display_order as i64 + 1,
            campaign_id: 1,
            slot: 0,
            label: format!("outcome-{display_order}"),
            amount,
            max_wins,
            current_wins,
            display_order,
            created_at: None,
            updated_at: None,
        }
    }

    fn counts(seq: &[i32]) -> HashMap<i32, i64> {
        let mut map = HashMap::new();
        for &entry in seq {
            *map.entry(entry).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn sequence_contains_each_quota_outcome_exactly_max_wins_times() {
        let set = vec![
            outcome(0, 100, 2, 0),
            outcome(1, 500, 1, 0),
            outcome(2, 0, 0, 0), // 安慰奖, 不进序列
            outcome(3, 250, 4, 0),
        ];
        let seq = generate_rotation(&set);
        assert_eq!(seq.len(), 7);
        let by_order = counts(&seq);
        assert_eq!(by_order.get(&0), Some(&2));
        assert_eq!(by_order.get(&1), Some(&1));
        assert_eq!(by_order.get(&2), None);
        assert_eq!(by_order.get(&3), Some(&4));
    }

    #[test]
    fn no_quotas_yields_empty_sequence() {
        let set = vec![outcome(0, 0, 0, 0), outcome(1, 0, 0, 0)];
        assert!(generate_rotation(&set).is_empty());
        assert!(generate_rotation(&[]).is_empty());
    }

    #[test]
    fn shuffle_preserves_multiset_across_regenerations() {
        let set = vec![outcome(0, 100, 5, 0), outcome(1, 200, 3, 0)];
        let first = generate_rotation(&set);
        // 重新生成: 顺序可以不同, 内容(多重集合)必须一致
        let second = generate_rotation(&set);
        assert_eq!(counts(&first), counts(&second));
        assert_eq!(first.len(), 8);
    }

    #[test]
    fn valuable_tier_requires_amount_and_remaining_quota() {
        let spent = outcome(0, 100, 2, 2); // 配额用完
        let open = outcome(1, 500, 3, 1); // 还有剩余
        let consolation = outcome(2, 0, 0, 7); // 安慰奖, 中过多少次都可用
        let refs: Vec<&outcomes::Model> = vec![&spent, &open, &consolation];
        let tiers = fallback_tiers(&refs);
        assert_eq!(tiers.valuable.len(), 1);
        assert_eq!(tiers.valuable[0].display_order, 1);
        assert_eq!(tiers.consolation.len(), 1);
        assert_eq!(tiers.consolation[0].display_order, 2);
        assert!(!tiers.is_exhausted());
    }

    #[test]
    fn all_quotas_spent_without_consolation_is_exhausted() {
        let a = outcome(0, 100, 2, 2);
        let b = outcome(1, 500, 1, 1);
        let refs: Vec<&outcomes::Model> = vec![&a, &b];
        let tiers = fallback_tiers(&refs);
        assert!(tiers.valuable.is_empty());
        assert!(tiers.consolation.is_empty());
        assert!(tiers.is_exhausted());
    }

    #[test]
    fn consolation_stays_available_after_quotas_spent() {
        let a = outcome(0, 100, 2, 2);
        let c = outcome(1, 0, 0, 999);
        let refs: Vec<&outcomes::Model> = vec![&a, &c];
        let tiers = fallback_tiers(&refs);
        assert!(tiers.valuable.is_empty());
        assert_eq!(tiers.consolation.len(), 1);
        assert!(!tiers.is_exhausted());
    }
}
