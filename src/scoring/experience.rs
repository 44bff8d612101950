use super::{months_between, ComponentKind, ComponentScore, ScoringComponent, ScoringContext};

/// スキルの保有期間と直近の使用状況から採点する。
/// 長期保有ほど基礎点が高く、長く使っていないスキルには減点を入れる。
pub struct ExperienceScorer;

impl ScoringComponent for ExperienceScorer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Experience
    }

    fn default_weight(&self) -> f64 {
        0.05
    }

    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore {
        let Some(employee_skill) = context.candidate.skill(context.required_skill.id) else {
            return ComponentScore::new(0.0, "No experience with this skill", 1.0);
        };

        let experience_months = months_between(employee_skill.acquired_date, context.now);
        let last_used_months_ago = employee_skill
            .last_used_date
            .map(|used| months_between(used, context.now))
            .unwrap_or(0.0);

        let base_score: f64 = if experience_months >= 60.0 {
            100.0
        } else if experience_months >= 36.0 {
            85.0
        } else if experience_months >= 24.0 {
            70.0
        } else if experience_months >= 12.0 {
            55.0
        } else if experience_months >= 6.0 {
            40.0
        } else {
            25.0
        };

        let recency_penalty = if last_used_months_ago > 12.0 {
            20.0
        } else if last_used_months_ago > 6.0 {
            10.0
        } else if last_used_months_ago > 3.0 {
            5.0
        } else {
            0.0
        };

        let final_score = (base_score - recency_penalty).max(0.0);
        let years_experience = (experience_months / 12.0 * 10.0).round() / 10.0;

        let mut explanation = format!("{years_experience} years experience");
        if recency_penalty > 0.0 {
            explanation.push_str(&format!(
                ", last used {:.0} months ago",
                last_used_months_ago
            ));
        }

        ComponentScore::new(final_score, explanation, 1.0)
            .with_detail("experience_months", experience_months.round())
            .with_detail("last_used_months_ago", last_used_months_ago.round())
            .with_detail("years_experience", years_experience)
            .with_detail("recency_penalty", recency_penalty)
    }
}
