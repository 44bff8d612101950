use super::{round2, ComponentKind, ComponentScore, ScoringComponent, ScoringContext};
use crate::store::MatchStore;

/// 直近 3 プロジェクトの実績から採点する。
/// 実績が無い新人は 70 点・確信度 0.3 で返し、集約側の確信度正規化に委ねる。
pub struct PerformanceScorer<'a> {
    store: &'a dyn MatchStore,
}

impl<'a> PerformanceScorer<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self { store }
    }
}

impl ScoringComponent for PerformanceScorer<'_> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Performance
    }

    fn default_weight(&self) -> f64 {
        0.20
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        let performances = self.store.recent_performance(context.candidate.id, 3);

        if performances.is_empty() {
            return ComponentScore::new(70.0, "New employee - no performance history", 0.3);
        }

        let count = performances.len() as f64;
        let avg_delivery_rate =
            performances.iter().map(|p| p.delivery_rate()).sum::<f64>() / count;
        let avg_quality = performances.iter().map(|p| p.quality_score()).sum::<f64>() / count;
        let avg_manager_rating =
            performances.iter().map(|p| p.manager_rating as f64).sum::<f64>() / count * 20.0;
        let avg_estimation_accuracy = performances
            .iter()
            .map(|p| p.estimation_accuracy())
            .sum::<f64>()
            / count;

        let score = avg_delivery_rate * 0.35
            + avg_quality * 0.30
            + avg_manager_rating * 0.25
            + avg_estimation_accuracy * 0.10;

        ComponentScore::new(
            round2(score),
            format!(
                "Based on {} recent projects: {:.0}% on-time delivery, {:.0}% quality score",
                performances.len(),
                avg_delivery_rate,
                avg_quality
            ),
            (count / 3.0).min(1.0),
        )
        .with_detail("delivery_rate", round2(avg_delivery_rate))
        .with_detail("quality_score", round2(avg_quality))
        .with_detail("manager_rating", round2(avg_manager_rating / 20.0))
        .with_detail("projects_evaluated", performances.len())
    }
}
