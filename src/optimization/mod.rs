pub mod option;
pub mod service;

use std::collections::BTreeMap;

use serde::Serialize;

pub use option::{
    HourAllocation, OptimizationStrategy, TeamOption, HOURS_PER_PERSON, MIN_COMMIT_HOURS,
};
pub use service::TeamOptimizationService;

/// 呼び出し側が渡す最適化の制約。明示的に指定しない限り予算・人数は
/// 無制限、バッファは 4h/週。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationConstraints {
    pub max_budget_per_week: Option<f64>,
    pub max_team_size: Option<usize>,
    pub min_senior_members: i32,
    /// Risk-Averse 戦略向けに予約。現状の生成ロジックでは参照しない。
    pub require_backup_coverage: bool,
    pub min_buffer_hours_per_person: i32,
    pub required_employee_ids: Vec<i64>,
    pub excluded_employee_ids: Vec<i64>,
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        Self {
            max_budget_per_week: None,
            max_team_size: None,
            min_senior_members: 0,
            require_backup_coverage: true,
            min_buffer_hours_per_person: 4,
            required_employee_ids: Vec::new(),
            excluded_employee_ids: Vec::new(),
        }
    }
}

/// 4 案全体の時間サマリ。allocated は案ごとの平均値。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationSummary {
    pub total_hours_required: i32,
    pub total_hours_allocated: i32,
    pub average_utilization: f64,
    pub hours_by_skill: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOptimizationResult {
    pub options: Vec<TeamOption>,
    pub summary: OptimizationSummary,
    pub warnings: Vec<String>,
    pub recommendations: BTreeMap<String, String>,
}
