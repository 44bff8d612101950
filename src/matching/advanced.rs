use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::allocation::AllocationOracle;
use crate::domain::{Employee, ProficiencyLevel, Project};
use crate::error::MatchError;
use crate::matching::composition::{MatchScore, SkillMatch, TeamComposition};
use crate::scoring::{
    aggregate, default_components, ComponentKind, ComponentScore, ComponentWeights,
    ScoringComponent, ScoringContext, DEFAULT_WEIGHTS,
};
use crate::store::MatchStore;

/// 6 コンポーネント採点済みの候補。ordering とスコアはストア状態の
/// 純関数なので、同一入力に対しては常に同じ結果になる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub employee: Employee,
    pub total_score: f64,
    pub component_scores: BTreeMap<ComponentKind, ComponentScore>,
    pub is_available: bool,
    pub current_allocation: i32,
}

/// チームに採用されたメンバーの採点内訳。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberScore {
    pub employee_id: i64,
    pub employee_name: String,
    pub current_allocation: i32,
    pub total_score: f64,
    pub component_scores: BTreeMap<ComponentKind, ComponentScore>,
}

/// 高度マッチングの結果一式。編成に加えて内訳・推奨・リスクを返す。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedMatchResult {
    pub composition: TeamComposition,
    pub member_scores: Vec<TeamMemberScore>,
    pub recommendations: BTreeMap<String, String>,
    pub risks: Vec<String>,
}

/// コンポーネント合成スコアによる高度マッチャー。
/// スコアラー一覧はコンストラクタで注入でき、テストではモックに差し替える。
pub struct AdvancedMatchingService<'a> {
    store: &'a dyn MatchStore,
    oracle: AllocationOracle<'a>,
    components: Vec<Box<dyn ScoringComponent + 'a>>,
}

impl<'a> AdvancedMatchingService<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self::with_components(store, default_components(store))
    }

    pub fn with_components(
        store: &'a dyn MatchStore,
        components: Vec<Box<dyn ScoringComponent + 'a>>,
    ) -> Self {
        Self {
            store,
            oracle: AllocationOracle::new(store),
            components,
        }
    }

    /// ベースラインと同じ走査だが、候補は集計スコアでランク付けし、
    /// プロジェクト期間にフル割当の衝突が無い候補だけを採用対象にする。
    #[instrument(skip(self, custom_weights))]
    pub fn team_composition_with_scoring(
        &self,
        project_id: i64,
        requested_by: &str,
        custom_weights: Option<ComponentWeights>,
        now: DateTime<Utc>,
    ) -> Result<AdvancedMatchResult, MatchError> {
        let weights = custom_weights.unwrap_or(DEFAULT_WEIGHTS);
        weights.validate()?;

        let project = self
            .store
            .project(project_id)
            .ok_or(MatchError::ProjectNotFound(project_id))?;

        info!(
            project_id,
            requirements = project.requirements.len(),
            "building scored team composition"
        );

        let mut composition = TeamComposition::new(project_id, requested_by, now);
        let mut member_scores: Vec<TeamMemberScore> = Vec::new();
        let mut current_team: Vec<Employee> = Vec::new();

        for requirement in &project.requirements {
            let skill = self
                .store
                .skill(requirement.skill_id)
                .ok_or(MatchError::SkillNotFound(requirement.skill_id))?;

            let candidates = self.scored_candidates_for_skill(
                requirement.skill_id,
                requirement.minimum_proficiency,
                &project,
                &current_team,
                &weights,
                now,
            )?;

            let mut skill_match = SkillMatch::new(
                skill.clone(),
                requirement.minimum_proficiency,
                requirement.required_count,
            );

            let top: Vec<&ScoredCandidate> = candidates
                .iter()
                .filter(|c| c.is_available)
                .take(requirement.required_count as usize)
                .collect();

            for candidate in top {
                let match_score = compat_match_score(candidate)?;

                composition.add_team_member(&candidate.employee, &skill, 100, &match_score)?;
                skill_match.add_candidate(crate::matching::composition::MatchCandidate {
                    employee: candidate.employee.clone(),
                    required_skill: skill.clone(),
                    score: match_score,
                    is_available: candidate.is_available,
                    current_allocation: candidate.current_allocation,
                })?;

                if !current_team.iter().any(|e| e.id == candidate.employee.id) {
                    current_team.push(candidate.employee.clone());
                }
                if !member_scores
                    .iter()
                    .any(|m| m.employee_id == candidate.employee.id)
                {
                    member_scores.push(TeamMemberScore {
                        employee_id: candidate.employee.id,
                        employee_name: candidate.employee.full_name(),
                        current_allocation: candidate.current_allocation,
                        total_score: candidate.total_score,
                        component_scores: candidate.component_scores.clone(),
                    });
                }
            }

            composition.add_skill_match(skill_match);
        }

        let recommendations = build_recommendations(&member_scores);
        let risks = analyze_risks(&composition, &member_scores);

        if composition.are_all_requirements_met() {
            composition.mark_as_optimal();
        } else {
            warn!(project_id, "not every requirement can be fully staffed");
        }

        Ok(AdvancedMatchResult {
            composition,
            member_scores,
            recommendations,
            risks,
        })
    }

    /// 指定スキルの候補全員を 6 コンポーネントで採点し、総合点の降順で返す。
    /// ストア状態が変わらない限り呼び出しごとの結果は同一。
    pub fn scored_candidates_for_skill(
        &self,
        skill_id: i64,
        required_proficiency: ProficiencyLevel,
        project: &Project,
        current_team: &[Employee],
        weights: &ComponentWeights,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredCandidate>, MatchError> {
        let skill = self
            .store
            .skill(skill_id)
            .ok_or(MatchError::SkillNotFound(skill_id))?;

        let mut scored = Vec::new();
        for candidate in self.store.employees_with_skill(skill_id, required_proficiency) {
            let has_conflict = self.oracle.check_conflict(
                candidate.id,
                100,
                project.start_date,
                project.end_date,
            );
            let current_allocation = candidate.current_allocation_percentage();

            let context = ScoringContext {
                candidate: &candidate,
                required_skill: &skill,
                required_proficiency,
                project,
                current_team,
                now,
            };

            let mut component_scores = BTreeMap::new();
            for component in &self.components {
                component_scores.insert(component.kind(), component.calculate(&context));
            }

            let total_score = aggregate(&component_scores, weights);
            debug!(
                employee_id = candidate.id,
                total_score, "scored candidate"
            );

            scored.push(ScoredCandidate {
                employee: candidate,
                total_score,
                component_scores,
                is_available: !has_conflict,
                current_allocation,
            });
        }

        scored.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
        });
        Ok(scored)
    }
}

/// 旧来の 3 要素 MatchScore を採点内訳から組み立てる（互換用）。
/// Experience コンポーネントが無い構成では 50 を既定値にする。
fn compat_match_score(candidate: &ScoredCandidate) -> Result<MatchScore, MatchError> {
    let component = |kind: ComponentKind| -> Option<f64> {
        candidate.component_scores.get(&kind).map(|c| c.score)
    };

    MatchScore::new(
        component(ComponentKind::Proficiency).unwrap_or(0.0),
        component(ComponentKind::Availability).unwrap_or(0.0),
        component(ComponentKind::Experience).unwrap_or(50.0),
        format!("Advanced scoring: {:.1}/100", candidate.total_score),
    )
}

fn build_recommendations(member_scores: &[TeamMemberScore]) -> BTreeMap<String, String> {
    let mut recommendations = BTreeMap::new();

    let below = |member: &TeamMemberScore, kind: ComponentKind, threshold: f64| {
        member
            .component_scores
            .get(&kind)
            .map(|c| c.score < threshold)
            .unwrap_or(false)
    };

    let overloaded: Vec<&str> = member_scores
        .iter()
        .filter(|m| below(m, ComponentKind::WorkloadBalance, 70.0))
        .map(|m| m.employee_name.as_str())
        .collect();
    if !overloaded.is_empty() {
        recommendations.insert(
            "Workload".to_string(),
            format!("Consider reducing load on: {}", overloaded.join(", ")),
        );
    }

    if member_scores
        .iter()
        .any(|m| below(m, ComponentKind::TeamChemistry, 60.0))
    {
        recommendations.insert(
            "TeamBuilding".to_string(),
            "Schedule team building activities - some members have limited collaboration history"
                .to_string(),
        );
    }

    if member_scores
        .iter()
        .any(|m| below(m, ComponentKind::Performance, 70.0))
    {
        recommendations.insert(
            "Monitoring".to_string(),
            "Close monitoring recommended for team members with recent performance challenges"
                .to_string(),
        );
    }

    recommendations
}

fn analyze_risks(composition: &TeamComposition, member_scores: &[TeamMemberScore]) -> Vec<String> {
    let mut risks = Vec::new();

    // バス係数: 担当者が 1 名しかいないスキル数
    let mut coverage: BTreeMap<i64, usize> = BTreeMap::new();
    for member in &composition.team_members {
        for assignment in &member.skill_assignments {
            *coverage.entry(assignment.skill_id).or_insert(0) += 1;
        }
    }
    let single_points = coverage.values().filter(|&&count| count == 1).count();
    if single_points > 0 {
        risks.push(format!(
            "Single point of failure: {single_points} skills have only one person assigned"
        ));
    }

    // 確信度の低いコンポーネントを 1 つでも持つメンバーが過半数なら新人過多
    let low_confidence = member_scores
        .iter()
        .filter(|m| m.component_scores.values().any(|c| c.confidence < 0.5))
        .count();
    if !composition.team_members.is_empty() && low_confidence > composition.team_members.len() / 2 {
        risks.push("Over 50% of team members are new - consider adding experienced members".into());
    }

    if member_scores.iter().any(|m| m.current_allocation == 100) {
        risks.push("Some team members at 100% allocation - no buffer for emergencies".into());
    }

    risks
}
