use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::allocation::AllocationOracle;
use crate::domain::{Employee, ProficiencyLevel, Project, Skill};
use crate::error::MatchError;
use crate::matching::composition::{MatchCandidate, MatchScore, SkillMatch, TeamComposition};
use crate::scoring::months_between;
use crate::store::MatchStore;

/// 3 要素スコアによるベースラインマッチャー。
/// 要件ごとに候補を集めて上位 N 名を 100% 割当でチームに入れる。
pub struct MatchingService<'a> {
    store: &'a dyn MatchStore,
    oracle: AllocationOracle<'a>,
}

impl<'a> MatchingService<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self {
            store,
            oracle: AllocationOracle::new(store),
        }
    }

    /// プロジェクトの全要件を走査してチーム編成を組み立てる。
    /// プロジェクト・スキルの不在は構造エラーとして即座に返す。
    /// 全要件が充足可能なら optimal をマークする。
    #[instrument(skip(self))]
    pub fn team_composition(
        &self,
        project_id: i64,
        requested_by: &str,
        now: DateTime<Utc>,
    ) -> Result<TeamComposition, MatchError> {
        let project = self
            .store
            .project(project_id)
            .ok_or(MatchError::ProjectNotFound(project_id))?;

        info!(
            project_id,
            requirements = project.requirements.len(),
            "building team composition"
        );

        let mut composition = TeamComposition::new(project_id, requested_by, now);

        for requirement in &project.requirements {
            let skill = self
                .store
                .skill(requirement.skill_id)
                .ok_or(MatchError::SkillNotFound(requirement.skill_id))?;

            let mut skill_match = SkillMatch::new(
                skill.clone(),
                requirement.minimum_proficiency,
                requirement.required_count,
            );

            let candidates = self.find_candidates_for_skill(
                requirement.skill_id,
                requirement.minimum_proficiency,
                &project,
                100,
                now,
            )?;
            debug!(
                skill = %skill.name,
                candidates = candidates.len(),
                "ranked candidates for requirement"
            );

            for candidate in candidates {
                skill_match.add_candidate(candidate)?;
            }

            let top: Vec<MatchCandidate> =
                skill_match.top_candidates().into_iter().cloned().collect();
            for candidate in &top {
                composition.add_team_member(&candidate.employee, &skill, 100, &candidate.score)?;
            }

            composition.add_skill_match(skill_match);
        }

        if composition.are_all_requirements_met() {
            composition.mark_as_optimal();
        } else {
            warn!(project_id, "not every requirement can be fully staffed");
        }

        Ok(composition)
    }

    /// 指定スキル・習熟度を満たす候補を総合点の降順で返す。
    /// 空き判定は要求割当率でのプロジェクト期間に対する衝突チェック。
    pub fn find_candidates_for_skill(
        &self,
        skill_id: i64,
        required_proficiency: ProficiencyLevel,
        project: &Project,
        required_allocation: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        let skill = self
            .store
            .skill(skill_id)
            .ok_or(MatchError::SkillNotFound(skill_id))?;

        let mut candidates = Vec::new();
        for employee in self.store.employees_with_skill(skill_id, required_proficiency) {
            let has_conflict = self.oracle.check_conflict(
                employee.id,
                required_allocation,
                project.start_date,
                project.end_date,
            );
            let current_allocation = employee.current_allocation_percentage();
            let score = self.calculate_match_score(&employee, &skill, required_proficiency, now)?;

            candidates.push(MatchCandidate {
                employee,
                required_skill: skill.clone(),
                score,
                is_available: !has_conflict,
                current_allocation,
            });
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_score
                .partial_cmp(&a.score.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }

    /// 習熟度 0.4 / 空き 0.3 / 経験 0.3 の単純合成スコア。
    pub fn calculate_match_score(
        &self,
        employee: &Employee,
        required_skill: &Skill,
        required_proficiency: ProficiencyLevel,
        now: DateTime<Utc>,
    ) -> Result<MatchScore, MatchError> {
        let Some(employee_skill) = employee.skill(required_skill.id) else {
            return MatchScore::new(0.0, 0.0, 0.0, "Employee doesn't have the required skill");
        };

        let proficiency_score = proficiency_score(employee_skill.proficiency, required_proficiency);

        let current_allocation = employee.current_allocation_percentage();
        let availability_score = f64::from(100 - current_allocation.min(100));

        // スキル保有 1 ヶ月につき 2 点、上限 100
        let months_with_skill = months_between(employee_skill.acquired_date, now) as i32;
        let experience_score = f64::from((months_with_skill * 2).min(100));

        let explanation = build_explanation(
            employee_skill.proficiency,
            required_proficiency,
            current_allocation,
            months_with_skill,
        );

        MatchScore::new(
            proficiency_score,
            availability_score,
            experience_score,
            explanation,
        )
    }
}

fn proficiency_score(actual: ProficiencyLevel, required: ProficiencyLevel) -> f64 {
    match actual.gap(required) {
        d if d >= 2 => 100.0,
        1 => 90.0,
        0 => 80.0,
        -1 => 60.0,
        _ => 40.0,
    }
}

fn build_explanation(
    actual: ProficiencyLevel,
    required: ProficiencyLevel,
    current_allocation: i32,
    months_experience: i32,
) -> String {
    let mut parts = Vec::new();

    if actual >= required {
        parts.push(format!(
            "Meets proficiency requirement ({actual} vs {required} required)"
        ));
    } else {
        parts.push(format!(
            "Below required proficiency ({actual} vs {required} required)"
        ));
    }

    parts.push(format!("Currently {current_allocation}% allocated"));
    parts.push(format!(
        "{months_experience} months of experience with this skill"
    ));

    parts.join(". ")
}
