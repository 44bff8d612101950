use super::{ComponentKind, ComponentScore, ScoringComponent, ScoringContext};

/// 要求習熟度とのギャップを段階的に採点する。
/// ギャップ +2 以上で満点、ちょうどで 80、不足は急減させる。
pub struct ProficiencyScorer;

impl ScoringComponent for ProficiencyScorer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Proficiency
    }

    fn default_weight(&self) -> f64 {
        0.30
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        let Some(employee_skill) = context.candidate.skill(context.required_skill.id) else {
            return ComponentScore::new(0.0, "Employee doesn't have the required skill", 1.0);
        };

        let actual = employee_skill.proficiency;
        let required = context.required_proficiency;
        let gap = actual.gap(required);

        let (score, explanation) = match gap {
            g if g >= 2 => (
                100.0,
                format!("Significantly exceeds requirement ({actual} vs {required})"),
            ),
            1 => (90.0, format!("Exceeds requirement ({actual} vs {required})")),
            0 => (80.0, format!("Meets requirement exactly ({actual})")),
            -1 => (
                60.0,
                format!("Slightly below requirement ({actual} vs {required})"),
            ),
            _ => (40.0, format!("Below requirement ({actual} vs {required})")),
        };

        ComponentScore::new(score, explanation, 1.0)
            .with_detail("employee_proficiency", actual.as_ref())
            .with_detail("required_proficiency", required.as_ref())
            .with_detail("proficiency_gap", gap)
    }
}
