use std::collections::BTreeMap;

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::error::MatchError;

/// 週あたりの最小コミット時間。これ未満の細切れ割当は作らない。
pub const MIN_COMMIT_HOURS: i32 = 8;

/// 1 要件あたりのフルタイム換算時間（人数 × 36h/週）。
pub const HOURS_PER_PERSON: i32 = 36;

/// 最適化戦略。4 案を常に同時生成して比較材料にする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
pub enum OptimizationStrategy {
    #[strum(serialize = "Minimum Cost")]
    MinimumCost,
    #[strum(serialize = "Maximum Quality")]
    MaximumQuality,
    #[strum(serialize = "Balanced")]
    Balanced,
    #[strum(serialize = "Risk-Averse")]
    RiskAverse,
}

impl OptimizationStrategy {
    pub const ALL: [OptimizationStrategy; 4] = [
        OptimizationStrategy::MinimumCost,
        OptimizationStrategy::MaximumQuality,
        OptimizationStrategy::Balanced,
        OptimizationStrategy::RiskAverse,
    ];

    /// 割当ノートに付ける短い説明。
    pub(crate) fn allocation_note(self) -> &'static str {
        match self {
            OptimizationStrategy::MinimumCost => "Cost optimized",
            OptimizationStrategy::MaximumQuality => "Quality optimized",
            OptimizationStrategy::Balanced => "Balanced allocation",
            OptimizationStrategy::RiskAverse => "Backup coverage",
        }
    }
}

/// 1 人 × 1 スキルへの週次時間割当。スキル id を持たせることで
/// バス係数や要件充足の判定をスキル単位で行える。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourAllocation {
    pub project_id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub skill_id: i64,
    pub hours_per_week: i32,
    pub effort_multiplier: f64,
    pub note: String,
}

impl HourAllocation {
    pub fn new(
        project_id: i64,
        employee_id: i64,
        employee_name: impl Into<String>,
        skill_id: i64,
        hours_per_week: i32,
        effort_multiplier: f64,
        note: impl Into<String>,
    ) -> Result<Self, MatchError> {
        if !(4..=40).contains(&hours_per_week) {
            return Err(MatchError::InvalidAllocation(format!(
                "hours per week must be between 4 and 40, got {hours_per_week}"
            )));
        }
        if !(0.5..=2.0).contains(&effort_multiplier) {
            return Err(MatchError::InvalidAllocation(format!(
                "effort multiplier must be between 0.5 and 2.0, got {effort_multiplier}"
            )));
        }

        Ok(Self {
            project_id,
            employee_id,
            employee_name: employee_name.into(),
            skill_id,
            hours_per_week,
            effort_multiplier,
            note: note.into(),
        })
    }

    /// 工数係数込みの実効時間。
    pub fn effective_hours(&self) -> f64 {
        f64::from(self.hours_per_week) * self.effort_multiplier
    }
}

/// 1 戦略分のチーム案。割当・コスト・評価スコア・トレードオフ説明を束ねる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOption {
    pub project_id: i64,
    pub strategy: OptimizationStrategy,
    pub total_cost_per_week: f64,
    pub quality_score: f64,
    pub risk_score: f64,
    pub meets_all_requirements: bool,
    pub allocations: Vec<HourAllocation>,
    pub trade_offs: BTreeMap<String, String>,
}

impl TeamOption {
    pub fn new(project_id: i64, strategy: OptimizationStrategy) -> Self {
        Self {
            project_id,
            strategy,
            total_cost_per_week: 0.0,
            quality_score: 0.0,
            risk_score: 0.0,
            meets_all_requirements: false,
            allocations: Vec::new(),
            trade_offs: BTreeMap::new(),
        }
    }

    pub fn add_allocation(&mut self, allocation: HourAllocation, hourly_cost: f64) {
        self.total_cost_per_week += f64::from(allocation.hours_per_week) * hourly_cost;
        self.allocations.push(allocation);
    }

    pub fn set_scores(&mut self, quality_score: f64, risk_score: f64, meets_requirements: bool) {
        self.quality_score = quality_score;
        self.risk_score = risk_score;
        self.meets_all_requirements = meets_requirements;
    }

    pub fn add_trade_off(&mut self, aspect: impl Into<String>, description: impl Into<String>) {
        self.trade_offs.insert(aspect.into(), description.into());
    }

    pub fn total_hours_per_week(&self) -> i32 {
        self.allocations.iter().map(|a| a.hours_per_week).sum()
    }

    pub fn effective_hours_per_week(&self) -> f64 {
        self.allocations.iter().map(|a| a.effective_hours()).sum()
    }

    /// 案内でこの従業員に既に割り当て済みの週次時間。
    pub fn committed_hours(&self, employee_id: i64) -> i32 {
        self.allocations
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .map(|a| a.hours_per_week)
            .sum()
    }

    pub fn unique_employee_count(&self) -> usize {
        let mut ids: Vec<i64> = self.allocations.iter().map(|a| a.employee_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
