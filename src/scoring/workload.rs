use super::{ComponentKind, ComponentScore, ScoringComponent, ScoringContext};

/// 現在の割当率から負荷バランスを採点する。60% 以下が理想
/// （打ち合わせ・学習・緊急対応の余地を残す）、100% は追加不可で 0。
pub struct WorkloadBalanceScorer;

impl ScoringComponent for WorkloadBalanceScorer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::WorkloadBalance
    }

    fn default_weight(&self) -> f64 {
        0.10
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        let current_allocation = context.candidate.current_allocation_percentage();

        let (score, explanation) = if current_allocation <= 60 {
            (
                100.0,
                format!("Ideal workload at {current_allocation}% allocation"),
            )
        } else if current_allocation <= 80 {
            (
                90.0,
                format!("Good workload at {current_allocation}% allocation"),
            )
        } else if current_allocation < 100 {
            (
                60.0,
                format!("High workload at {current_allocation}% allocation"),
            )
        } else {
            (0.0, "Already at 100% allocation".to_string())
        };

        ComponentScore::new(score, explanation, 1.0)
            .with_detail("current_allocation", current_allocation)
            .with_detail("available_capacity", 100 - current_allocation)
            .with_detail("is_overloaded", current_allocation >= 100)
    }
}
