use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Employee, ProficiencyLevel, Skill};
use crate::error::MatchError;
use crate::scoring::round2;

/// ベースラインマッチャーの 3 要素スコア。
/// 習熟度 0.4 / 空き状況 0.3 / 経験 0.3 の固定重みで合成する。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub proficiency_score: f64,
    pub availability_score: f64,
    pub experience_score: f64,
    pub total_score: f64,
    pub explanation: String,
}

impl MatchScore {
    pub fn new(
        proficiency_score: f64,
        availability_score: f64,
        experience_score: f64,
        explanation: impl Into<String>,
    ) -> Result<Self, MatchError> {
        for (name, value) in [
            ("proficiency", proficiency_score),
            ("availability", availability_score),
            ("experience", experience_score),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(MatchError::InvalidInput(format!(
                    "{name} score must be between 0 and 100, got {value}"
                )));
            }
        }

        let total_score =
            proficiency_score * 0.4 + availability_score * 0.3 + experience_score * 0.3;

        Ok(Self {
            proficiency_score,
            availability_score,
            experience_score,
            total_score,
            explanation: explanation.into(),
        })
    }

    pub fn is_better_than(&self, other: &MatchScore) -> bool {
        self.total_score > other.total_score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub employee: Employee,
    pub required_skill: Skill,
    pub score: MatchScore,
    pub is_available: bool,
    pub current_allocation: i32,
}

impl MatchCandidate {
    /// 追加割当を受けられるか（空きがあり、合計が 100% に収まる）。
    pub fn can_be_assigned(&self, required_allocation: i32) -> bool {
        self.is_available && self.current_allocation + required_allocation <= 100
    }
}

/// 1 スキル要件に対するランク付き候補一覧。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatch {
    pub required_skill: Skill,
    pub required_proficiency: ProficiencyLevel,
    pub required_count: i32,
    pub candidates: Vec<MatchCandidate>,
}

impl SkillMatch {
    pub fn new(
        required_skill: Skill,
        required_proficiency: ProficiencyLevel,
        required_count: i32,
    ) -> Self {
        Self {
            required_skill,
            required_proficiency,
            required_count,
            candidates: Vec::new(),
        }
    }

    pub fn add_candidate(&mut self, candidate: MatchCandidate) -> Result<(), MatchError> {
        if candidate.required_skill.id != self.required_skill.id {
            return Err(MatchError::InvalidInput(
                "candidate skill doesn't match required skill".into(),
            ));
        }
        self.candidates.push(candidate);
        Ok(())
    }

    /// 総合点の降順で必要人数分を返す。同点は登録順を保つ。
    pub fn top_candidates(&self) -> Vec<&MatchCandidate> {
        let mut sorted: Vec<&MatchCandidate> = self.candidates.iter().collect();
        sorted.sort_by(|a, b| {
            b.score
                .total_score
                .partial_cmp(&a.score.total_score)
                .unwrap_or(Ordering::Equal)
        });
        sorted.truncate(self.required_count as usize);
        sorted
    }

    /// フル割当（100%）を受けられる候補が必要人数以上いるか。
    pub fn is_fulfilled(&self) -> bool {
        self.candidates
            .iter()
            .filter(|c| c.can_be_assigned(100))
            .count()
            >= self.required_count as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillAssignment {
    pub skill_id: i64,
    pub skill_name: String,
    pub allocation_percentage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMember {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub total_allocation: i32,
    pub skill_assignments: Vec<SkillAssignment>,
}

impl TeamMember {
    fn new(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            total_allocation: 0,
            skill_assignments: Vec::new(),
        }
    }

    fn add_skill_assignment(
        &mut self,
        skill: &Skill,
        allocation_percentage: i32,
    ) -> Result<(), MatchError> {
        if self.total_allocation + allocation_percentage > 100 {
            return Err(MatchError::InvalidAllocation(format!(
                "total allocation for {} {} exceeds 100%",
                self.first_name, self.last_name
            )));
        }

        self.skill_assignments.push(SkillAssignment {
            skill_id: skill.id,
            skill_name: skill.name.clone(),
            allocation_percentage,
        });
        self.total_allocation += allocation_percentage;
        Ok(())
    }
}

/// マッチング結果として組み上がったチーム編成。
/// メンバー一覧と、要件ごとの候補ランキング（SkillMatch）を両方保持する。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamComposition {
    pub project_id: i64,
    pub composed_at: DateTime<Utc>,
    pub composed_by: String,
    pub overall_score: f64,
    pub is_optimal: bool,
    pub team_members: Vec<TeamMember>,
    pub skill_matches: Vec<SkillMatch>,
}

impl TeamComposition {
    pub fn new(project_id: i64, composed_by: impl Into<String>, composed_at: DateTime<Utc>) -> Self {
        Self {
            project_id,
            composed_at,
            composed_by: composed_by.into(),
            overall_score: 0.0,
            is_optimal: false,
            team_members: Vec::new(),
            skill_matches: Vec::new(),
        }
    }

    /// メンバーを追加し、同一人物なら既存メンバーにスキル割当を積み増す。
    /// 合計が 100% を超える割当はエラー。
    pub fn add_team_member(
        &mut self,
        employee: &Employee,
        skill: &Skill,
        allocation_percentage: i32,
        _score: &MatchScore,
    ) -> Result<(), MatchError> {
        match self
            .team_members
            .iter_mut()
            .find(|tm| tm.employee_id == employee.id)
        {
            Some(member) => member.add_skill_assignment(skill, allocation_percentage)?,
            None => {
                let mut member = TeamMember::new(employee);
                member.add_skill_assignment(skill, allocation_percentage)?;
                self.team_members.push(member);
            }
        }

        self.recalculate_overall_score();
        Ok(())
    }

    pub fn add_skill_match(&mut self, skill_match: SkillMatch) {
        self.skill_matches.push(skill_match);
        self.recalculate_overall_score();
    }

    fn recalculate_overall_score(&mut self) {
        let top_scores: Vec<f64> = self
            .skill_matches
            .iter()
            .flat_map(|sm| sm.top_candidates())
            .map(|c| c.score.total_score)
            .collect();

        if top_scores.is_empty() {
            return;
        }

        self.overall_score = round2(top_scores.iter().sum::<f64>() / top_scores.len() as f64);
    }

    pub fn mark_as_optimal(&mut self) {
        self.is_optimal = true;
    }

    pub fn are_all_requirements_met(&self) -> bool {
        !self.skill_matches.is_empty() && self.skill_matches.iter().all(|sm| sm.is_fulfilled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Seniority;
    use chrono::TimeZone;

    fn skill(id: i64, name: &str) -> Skill {
        Skill {
            id,
            name: name.into(),
            category: "Backend".into(),
        }
    }

    fn employee(id: i64) -> Employee {
        Employee {
            id,
            first_name: format!("E{id}"),
            last_name: "Test".into(),
            email: format!("e{id}@example.com"),
            department: "Engineering".into(),
            title: "Engineer".into(),
            seniority: Seniority::Mid,
            is_active: true,
            skills: vec![],
            assignments: vec![],
        }
    }

    fn candidate(id: i64, skill_id: i64, total_hint: f64, available: bool) -> MatchCandidate {
        // total_hint をそのまま 3 要素に割り当てて total_score == total_hint にする
        MatchCandidate {
            employee: employee(id),
            required_skill: skill(skill_id, "Go"),
            score: MatchScore::new(total_hint, total_hint, total_hint, "test").unwrap(),
            is_available: available,
            current_allocation: 0,
        }
    }

    #[test]
    fn match_score_applies_fixed_weights() {
        let score = MatchScore::new(80.0, 100.0, 50.0, "").unwrap();
        assert!((score.total_score - (80.0 * 0.4 + 100.0 * 0.3 + 50.0 * 0.3)).abs() < 1e-9);

        let better = MatchScore::new(100.0, 100.0, 100.0, "").unwrap();
        assert!(better.is_better_than(&score));
    }

    #[test]
    fn match_score_rejects_out_of_range_values() {
        assert!(MatchScore::new(101.0, 0.0, 0.0, "").is_err());
        assert!(MatchScore::new(0.0, -1.0, 0.0, "").is_err());
    }

    #[test]
    fn skill_match_ranks_and_truncates_candidates() {
        let mut skill_match = SkillMatch::new(skill(10, "Go"), ProficiencyLevel::Advanced, 2);
        skill_match.add_candidate(candidate(1, 10, 60.0, true)).unwrap();
        skill_match.add_candidate(candidate(2, 10, 90.0, true)).unwrap();
        skill_match.add_candidate(candidate(3, 10, 75.0, true)).unwrap();

        let top = skill_match.top_candidates();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].employee.id, 2);
        assert_eq!(top[1].employee.id, 3);
    }

    #[test]
    fn skill_match_rejects_mismatched_candidates() {
        let mut skill_match = SkillMatch::new(skill(10, "Go"), ProficiencyLevel::Advanced, 1);
        let err = skill_match.add_candidate(candidate(1, 11, 80.0, true));
        assert!(matches!(err, Err(MatchError::InvalidInput(_))));
    }

    #[test]
    fn fulfillment_requires_assignable_candidates() {
        let mut skill_match = SkillMatch::new(skill(10, "Go"), ProficiencyLevel::Advanced, 2);
        skill_match.add_candidate(candidate(1, 10, 90.0, true)).unwrap();

        let mut busy = candidate(2, 10, 85.0, true);
        busy.current_allocation = 50; // 100% 追加は受けられない
        skill_match.add_candidate(busy).unwrap();

        assert!(!skill_match.is_fulfilled());

        skill_match.add_candidate(candidate(3, 10, 70.0, true)).unwrap();
        assert!(skill_match.is_fulfilled());
    }

    #[test]
    fn composition_accumulates_member_allocations() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut composition = TeamComposition::new(1, "pm@example.com", now);
        let e = employee(1);
        let score = MatchScore::new(80.0, 80.0, 80.0, "").unwrap();

        composition
            .add_team_member(&e, &skill(10, "Go"), 60, &score)
            .unwrap();
        composition
            .add_team_member(&e, &skill(11, "Rust"), 40, &score)
            .unwrap();

        assert_eq!(composition.team_members.len(), 1);
        assert_eq!(composition.team_members[0].total_allocation, 100);
        assert_eq!(composition.team_members[0].skill_assignments.len(), 2);

        let err = composition.add_team_member(&e, &skill(12, "SQL"), 10, &score);
        assert!(matches!(err, Err(MatchError::InvalidAllocation(_))));
    }

    #[test]
    fn overall_score_averages_top_candidates() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut composition = TeamComposition::new(1, "pm@example.com", now);

        let mut go_match = SkillMatch::new(skill(10, "Go"), ProficiencyLevel::Advanced, 1);
        go_match.add_candidate(candidate(1, 10, 90.0, true)).unwrap();
        go_match.add_candidate(candidate(2, 10, 50.0, true)).unwrap();
        composition.add_skill_match(go_match);

        let mut rust_match = SkillMatch::new(skill(11, "Rust"), ProficiencyLevel::Advanced, 1);
        rust_match.add_candidate(candidate(3, 11, 70.0, true)).unwrap();
        composition.add_skill_match(rust_match);

        // top は 90 と 70 のみ
        assert_eq!(composition.overall_score, 80.0);
    }

    #[test]
    fn requirements_met_only_when_every_match_is_fulfilled() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut composition = TeamComposition::new(1, "pm@example.com", now);
        assert!(!composition.are_all_requirements_met());

        let mut fulfilled = SkillMatch::new(skill(10, "Go"), ProficiencyLevel::Advanced, 1);
        fulfilled.add_candidate(candidate(1, 10, 90.0, true)).unwrap();
        composition.add_skill_match(fulfilled);
        assert!(composition.are_all_requirements_met());

        let unfulfilled = SkillMatch::new(skill(11, "Rust"), ProficiencyLevel::Advanced, 1);
        composition.add_skill_match(unfulfilled);
        assert!(!composition.are_all_requirements_met());
    }
}
