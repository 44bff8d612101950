use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::allocation::AllocationOracle;
use crate::domain::Project;
use crate::error::MatchError;
use crate::matching::advanced::{AdvancedMatchingService, ScoredCandidate};
use crate::optimization::option::{
    HourAllocation, OptimizationStrategy, TeamOption, HOURS_PER_PERSON, MIN_COMMIT_HOURS,
};
use crate::optimization::{OptimizationConstraints, OptimizationSummary, TeamOptimizationResult};
use crate::scoring::{round2, DEFAULT_WEIGHTS};
use crate::store::MatchStore;

/// 4 戦略のチーム案を生成する貪欲ヒューリスティック。
///
/// 各戦略は「要件ごとに候補をポリシー順に並べ、埋まるまで時間を割り当てる」
/// 局所探索で、大域最適は保証しない。入力が同じなら結果は決定的。
pub struct TeamOptimizationService<'a> {
    store: &'a dyn MatchStore,
    matcher: AdvancedMatchingService<'a>,
    oracle: AllocationOracle<'a>,
}

impl<'a> TeamOptimizationService<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self {
            store,
            matcher: AdvancedMatchingService::new(store),
            oracle: AllocationOracle::new(store),
        }
    }

    /// 4 案を生成してサマリ・警告・推奨と共に返す。
    /// 要件を満たせない案も `meets_all_requirements=false` として返り、
    /// 最適化全体が失敗するのはプロジェクト・スキル不在の場合だけ。
    #[instrument(skip(self, constraints))]
    pub fn optimize_team(
        &self,
        project_id: i64,
        constraints: &OptimizationConstraints,
        now: DateTime<Utc>,
    ) -> Result<TeamOptimizationResult, MatchError> {
        let project = self
            .store
            .project(project_id)
            .ok_or(MatchError::ProjectNotFound(project_id))?;

        info!(
            project_id,
            requirements = project.requirements.len(),
            "generating team options"
        );

        let mut options = Vec::with_capacity(OptimizationStrategy::ALL.len());
        for strategy in OptimizationStrategy::ALL {
            options.push(self.build_option(&project, constraints, strategy, now)?);
        }

        let summary = self.build_summary(&project, &options)?;
        let warnings = build_warnings(&options, constraints);
        let recommendations = build_recommendations(&options);

        Ok(TeamOptimizationResult {
            options,
            summary,
            warnings,
            recommendations,
        })
    }

    fn build_option(
        &self,
        project: &Project,
        constraints: &OptimizationConstraints,
        strategy: OptimizationStrategy,
        now: DateTime<Utc>,
    ) -> Result<TeamOption, MatchError> {
        let mut option = TeamOption::new(project.id, strategy);

        // Risk-Averse はバックアップ人員計画向けに予約されており、
        // 割当なしの空案を同じ採点で返す。
        if strategy != OptimizationStrategy::RiskAverse {
            for requirement in &project.requirements {
                let skill = self
                    .store
                    .skill(requirement.skill_id)
                    .ok_or(MatchError::SkillNotFound(requirement.skill_id))?;

                let mut candidates = self.matcher.scored_candidates_for_skill(
                    requirement.skill_id,
                    requirement.minimum_proficiency,
                    project,
                    &[],
                    &DEFAULT_WEIGHTS,
                    now,
                )?;
                candidates
                    .retain(|c| !constraints.excluded_employee_ids.contains(&c.employee.id));
                sort_by_strategy(&mut candidates, strategy);
                if !constraints.required_employee_ids.is_empty() {
                    // 安定ソートなのでポリシー順を保ったまま必須メンバーが先頭に来る
                    candidates.sort_by_key(|c| {
                        !constraints.required_employee_ids.contains(&c.employee.id)
                    });
                }

                let hours_needed = requirement.required_count * HOURS_PER_PERSON;
                let mut hours_allocated = 0;
                let mut senior_hours = 0;

                for candidate in &candidates {
                    if hours_allocated >= hours_needed {
                        break;
                    }

                    let seniority = candidate.employee.seniority;
                    if strategy == OptimizationStrategy::Balanced
                        && seniority.is_senior_tier()
                        && f64::from(senior_hours) > f64::from(hours_needed) * 0.4
                    {
                        continue;
                    }

                    // 同一案内で先の要件に使った時間も空きから差し引く
                    let available = self.oracle.available_hours_per_week(
                        candidate.employee.id,
                        project.start_date,
                        project.end_date,
                    ) - option.committed_hours(candidate.employee.id);
                    if available <= constraints.min_buffer_hours_per_person {
                        continue;
                    }

                    let to_allocate = (available - constraints.min_buffer_hours_per_person)
                        .min(hours_needed - hours_allocated);
                    if to_allocate < MIN_COMMIT_HOURS {
                        continue;
                    }

                    let allocation = HourAllocation::new(
                        project.id,
                        candidate.employee.id,
                        candidate.employee.full_name(),
                        requirement.skill_id,
                        to_allocate,
                        seniority.effort_multiplier(),
                        format!("{} - {}", skill.name, strategy.allocation_note()),
                    )?;
                    debug!(
                        %strategy,
                        employee_id = candidate.employee.id,
                        hours = to_allocate,
                        skill = %skill.name,
                        "committed allocation"
                    );
                    option.add_allocation(allocation, seniority.hourly_cost());

                    hours_allocated += to_allocate;
                    if seniority.is_senior_tier() {
                        senior_hours += to_allocate;
                    }
                }
            }
        }

        let quality = self.quality_score(&option);
        let risk = risk_score(&option);
        let meets = meets_requirements(&option, project);
        if !meets && strategy != OptimizationStrategy::RiskAverse {
            warn!(%strategy, project_id = project.id, "option leaves requirements understaffed");
        }
        option.set_scores(quality, risk, meets);
        apply_trade_offs(&mut option, strategy);

        Ok(option)
    }

    /// 時間加重の職位品質スコア。工数係数の逆数寄りの補正
    /// `(2 − multiplier)` で、速いシニアほど品質への寄与が大きい。
    fn quality_score(&self, option: &TeamOption) -> f64 {
        let mut score = 0.0;
        let mut total_weight = 0.0;

        for allocation in &option.allocations {
            let Some(employee) = self.store.employee(allocation.employee_id) else {
                continue;
            };

            let weight = f64::from(allocation.hours_per_week);
            total_weight += weight;
            score += employee.seniority.quality_score()
                * (2.0 - allocation.effort_multiplier)
                * weight;
        }

        if total_weight > 0.0 {
            round2(score / total_weight)
        } else {
            0.0
        }
    }

    fn build_summary(
        &self,
        project: &Project,
        options: &[TeamOption],
    ) -> Result<OptimizationSummary, MatchError> {
        let mut summary = OptimizationSummary {
            total_hours_required: project
                .requirements
                .iter()
                .map(|r| r.required_count * HOURS_PER_PERSON)
                .sum(),
            ..OptimizationSummary::default()
        };

        if !options.is_empty() {
            let mean_hours = options
                .iter()
                .map(|o| o.total_hours_per_week())
                .sum::<i32>() as f64
                / options.len() as f64;
            summary.total_hours_allocated = mean_hours as i32;

            let mut employee_ids: Vec<i64> = options
                .iter()
                .flat_map(|o| o.allocations.iter().map(|a| a.employee_id))
                .collect();
            employee_ids.sort_unstable();
            employee_ids.dedup();

            if !employee_ids.is_empty() {
                summary.average_utilization = round2(
                    f64::from(summary.total_hours_allocated)
                        / (employee_ids.len() as f64 * f64::from(HOURS_PER_PERSON))
                        * 100.0,
                );
            }
        }

        for requirement in &project.requirements {
            let skill = self
                .store
                .skill(requirement.skill_id)
                .ok_or(MatchError::SkillNotFound(requirement.skill_id))?;
            summary
                .hours_by_skill
                .insert(skill.name, requirement.required_count * HOURS_PER_PERSON);
        }

        Ok(summary)
    }
}

fn sort_by_strategy(candidates: &mut [ScoredCandidate], strategy: OptimizationStrategy) {
    match strategy {
        OptimizationStrategy::MinimumCost => {
            candidates.sort_by(|a, b| {
                a.employee
                    .seniority
                    .hourly_cost()
                    .partial_cmp(&b.employee.seniority.hourly_cost())
                    .unwrap_or(Ordering::Equal)
                    .then(
                        b.total_score
                            .partial_cmp(&a.total_score)
                            .unwrap_or(Ordering::Equal),
                    )
            });
        }
        OptimizationStrategy::MaximumQuality => {
            candidates.sort_by(|a, b| {
                b.total_score
                    .partial_cmp(&a.total_score)
                    .unwrap_or(Ordering::Equal)
                    .then(
                        a.employee
                            .seniority
                            .effort_multiplier()
                            .partial_cmp(&b.employee.seniority.effort_multiplier())
                            .unwrap_or(Ordering::Equal),
                    )
            });
        }
        OptimizationStrategy::Balanced => {
            let value = |c: &ScoredCandidate| {
                c.total_score / (1.0 + c.employee.seniority.hourly_cost() / 100.0)
            };
            candidates.sort_by(|a, b| value(b).partial_cmp(&value(a)).unwrap_or(Ordering::Equal));
        }
        OptimizationStrategy::RiskAverse => {}
    }
}

/// 3 つのサブリスク（バス係数・チーム規模・ジュニア比率）の平均。
fn risk_score(option: &TeamOption) -> f64 {
    let mut risks = Vec::with_capacity(3);

    // スキル単位で担当者 1 名の箇所を数える（1 箇所につき 20 点、上限 100）
    let mut coverage: BTreeMap<i64, usize> = BTreeMap::new();
    for allocation in &option.allocations {
        *coverage.entry(allocation.skill_id).or_insert(0) += 1;
    }
    let single_points = coverage.values().filter(|&&count| count == 1).count();
    risks.push((single_points as f64 * 20.0).min(100.0));

    risks.push(match option.unique_employee_count() {
        1 => 90.0,
        2 => 70.0,
        3 => 40.0,
        4 => 20.0,
        _ => 10.0,
    });

    // 工数係数 > 1.2 をジュニア扱いとして時間比率を見る
    let junior_hours: i32 = option
        .allocations
        .iter()
        .filter(|a| a.effort_multiplier > 1.2)
        .map(|a| a.hours_per_week)
        .sum();
    let total_hours = option.total_hours_per_week();
    let junior_ratio = if total_hours > 0 {
        f64::from(junior_hours) / f64::from(total_hours)
    } else {
        0.0
    };
    risks.push(junior_ratio * 100.0);

    round2(risks.iter().sum::<f64>() / risks.len() as f64)
}

/// 要件ごとに実効時間が必要時間の 90% 以上あるか。
fn meets_requirements(option: &TeamOption, project: &Project) -> bool {
    project.requirements.iter().all(|requirement| {
        let skill_hours: f64 = option
            .allocations
            .iter()
            .filter(|a| a.skill_id == requirement.skill_id)
            .map(|a| a.effective_hours())
            .sum();

        skill_hours >= f64::from(requirement.required_count * HOURS_PER_PERSON) * 0.9
    })
}

fn apply_trade_offs(option: &mut TeamOption, strategy: OptimizationStrategy) {
    match strategy {
        OptimizationStrategy::MinimumCost => {
            option.add_trade_off("Cost", "Lowest cost option with more junior developers");
            option.add_trade_off(
                "Quality",
                "May require more time for tasks due to less experience",
            );
            option.add_trade_off("Risk", "Higher risk of delays or rework");
        }
        OptimizationStrategy::MaximumQuality => {
            option.add_trade_off("Quality", "Highest quality with experienced developers");
            option.add_trade_off("Cost", "Higher cost due to senior resources");
            option.add_trade_off("Speed", "Faster delivery due to experience");
        }
        OptimizationStrategy::Balanced => {
            option.add_trade_off("Balance", "Good mix of experience levels");
            option.add_trade_off("Cost", "Moderate cost with quality considerations");
            option.add_trade_off("Mentoring", "Senior members can guide juniors");
        }
        OptimizationStrategy::RiskAverse => {
            option.add_trade_off(
                "Coverage",
                "Reserved for redundant staffing per skill - no allocations generated",
            );
            option.add_trade_off("Risk", "Empty plan carries no staffing commitments");
        }
    }
}

fn build_warnings(options: &[TeamOption], constraints: &OptimizationConstraints) -> Vec<String> {
    fn push_unique(warnings: &mut Vec<String>, warning: String) {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    let mut warnings: Vec<String> = Vec::new();

    for option in options {
        if let Some(max_budget) = constraints.max_budget_per_week {
            if option.total_cost_per_week > max_budget {
                push_unique(
                    &mut warnings,
                    format!(
                        "{} exceeds budget by ${:.2}/week",
                        option.strategy,
                        option.total_cost_per_week - max_budget
                    ),
                );
            }
        }

        let team_size = option.unique_employee_count();
        if let Some(max_team_size) = constraints.max_team_size {
            if team_size > max_team_size {
                push_unique(
                    &mut warnings,
                    format!(
                        "{} has {team_size} members (max: {max_team_size})",
                        option.strategy
                    ),
                );
            }
        }

        if option.risk_score > 70.0 {
            push_unique(
                &mut warnings,
                format!(
                    "{} has high risk score: {}",
                    option.strategy, option.risk_score
                ),
            );
        }
    }

    warnings
}

fn build_recommendations(options: &[TeamOption]) -> BTreeMap<String, String> {
    let mut recommendations = BTreeMap::new();
    if options.is_empty() {
        return recommendations;
    }

    let average_cost =
        options.iter().map(|o| o.total_cost_per_week).sum::<f64>() / options.len() as f64;
    if average_cost > 5000.0 {
        recommendations.insert(
            "Cost".to_string(),
            "Consider extending timeline to reduce weekly team size and cost".to_string(),
        );
    }

    let average_risk = options.iter().map(|o| o.risk_score).sum::<f64>() / options.len() as f64;
    if average_risk > 60.0 {
        recommendations.insert(
            "Risk".to_string(),
            "All options have elevated risk. Consider adding senior developers or extending timeline"
                .to_string(),
        );
    }

    let best_quality = options
        .iter()
        .max_by(|a, b| {
            a.quality_score
                .partial_cmp(&b.quality_score)
                .unwrap_or(Ordering::Equal)
        })
        .map(|o| o.total_cost_per_week);
    let cheapest = options
        .iter()
        .map(|o| o.total_cost_per_week)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    if let (Some(quality_cost), Some(min_cost)) = (best_quality, cheapest) {
        if quality_cost > min_cost * 1.5 {
            recommendations.insert(
                "Trade-off".to_string(),
                "Significant cost difference between quality and budget options. Consider the balanced approach"
                    .to_string(),
            );
        }
    }

    recommendations
}
