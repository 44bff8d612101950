use std::collections::BTreeMap;

use super::{round2, ComponentKind, ComponentScore, ScoringComponent, ScoringContext};
use crate::store::MatchStore;

/// 既存チームメンバーとの協働実績から相性を採点する。
/// チームがまだ空・履歴なしの場合は中立スコアを低確信度で返す。
pub struct TeamChemistryScorer<'a> {
    store: &'a dyn MatchStore,
}

impl<'a> TeamChemistryScorer<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self { store }
    }
}

impl ScoringComponent for TeamChemistryScorer<'_> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::TeamChemistry
    }

    fn default_weight(&self) -> f64 {
        0.15
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        if context.current_team.is_empty() {
            return ComponentScore::new(
                75.0,
                "No existing team members to evaluate chemistry",
                0.5,
            );
        }

        let candidate_id = context.candidate.id;
        let teammate_ids: Vec<i64> = context.current_team.iter().map(|m| m.id).collect();
        let collaborations = self
            .store
            .collaborations_between(candidate_id, &teammate_ids);

        if collaborations.is_empty() {
            return ComponentScore::new(
                70.0,
                "No previous collaboration history with team members",
                0.4,
            );
        }

        // 相手ごとに平均してから全体平均を取る（偏った相手の件数に引きずられない）
        let mut by_teammate: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for collab in &collaborations {
            if let Some(partner) = collab.partner_of(candidate_id) {
                by_teammate
                    .entry(partner)
                    .or_default()
                    .push(collab.collaboration_score());
            }
        }

        let overall_chemistry = by_teammate
            .values()
            .map(|scores| scores.iter().sum::<f64>() / scores.len() as f64)
            .sum::<f64>()
            / by_teammate.len() as f64;

        let would_work_again_rate = collaborations
            .iter()
            .filter(|c| c.would_work_together_again)
            .count() as f64
            / collaborations.len() as f64
            * 100.0;

        let score = overall_chemistry * 0.7 + would_work_again_rate * 0.3;

        ComponentScore::new(
            round2(score),
            format!(
                "Worked with {} current team members before, {:.0}% would work together again",
                by_teammate.len(),
                would_work_again_rate
            ),
            (collaborations.len() as f64 / 10.0).min(1.0),
        )
        .with_detail("average_chemistry", round2(overall_chemistry))
        .with_detail("would_work_again_rate", round2(would_work_again_rate))
        .with_detail("collaborations_count", collaborations.len())
        .with_detail("unique_teammates", by_teammate.len())
    }
}
