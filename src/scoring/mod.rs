pub mod aggregator;
pub mod availability;
pub mod chemistry;
pub mod config;
pub mod experience;
pub mod performance;
pub mod proficiency;
pub mod workload;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

use crate::domain::{Employee, ProficiencyLevel, Project, Skill};
use crate::store::MatchStore;

pub use aggregator::aggregate;
pub use availability::AvailabilityScorer;
pub use chemistry::TeamChemistryScorer;
pub use config::{ComponentWeights, DEFAULT_WEIGHTS};
pub use experience::ExperienceScorer;
pub use performance::PerformanceScorer;
pub use proficiency::ProficiencyScorer;
pub use workload::WorkloadBalanceScorer;

/// スコアリングコンポーネントの閉じた集合。文字列キーの重みマップだと
/// タイプミスが黙って既定値に落ちるため、enum で網羅を強制する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr,
)]
pub enum ComponentKind {
    Proficiency,
    Availability,
    Performance,
    TeamChemistry,
    WorkloadBalance,
    Experience,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Proficiency,
        ComponentKind::Availability,
        ComponentKind::Performance,
        ComponentKind::TeamChemistry,
        ComponentKind::WorkloadBalance,
        ComponentKind::Experience,
    ];
}

/// 1 コンポーネントの判定結果。スコアは 0-100、確信度は 0-1。
/// details には内訳（ギャップ・現在割当率など）を呼び出し元向けに残す。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScore {
    pub score: f64,
    pub explanation: String,
    pub confidence: f64,
    pub details: Map<String, Value>,
}

impl ComponentScore {
    pub fn new(score: f64, explanation: impl Into<String>, confidence: f64) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            confidence,
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// スコアリング対象 1 候補分の入力。`now` を明示的に渡すことで
/// 経験月数などの計算を入力の純関数に保つ。
pub struct ScoringContext<'a> {
    pub candidate: &'a Employee,
    pub required_skill: &'a Skill,
    pub required_proficiency: ProficiencyLevel,
    pub project: &'a Project,
    pub current_team: &'a [Employee],
    pub now: DateTime<Utc>,
}

pub trait ScoringComponent {
    fn kind(&self) -> ComponentKind;
    fn default_weight(&self) -> f64;
    fn calculate(&self, context: &ScoringContext<'_>) -> ComponentScore;
}

/// 既定の 6 コンポーネントを明示的なリストとして組み立てる。
/// グローバルなレジストリは持たず、テストではモック実装に差し替えられる。
pub fn default_components<'a>(
    store: &'a dyn MatchStore,
) -> Vec<Box<dyn ScoringComponent + 'a>> {
    vec![
        Box::new(ProficiencyScorer),
        Box::new(AvailabilityScorer::new(store)),
        Box::new(PerformanceScorer::new(store)),
        Box::new(TeamChemistryScorer::new(store)),
        Box::new(WorkloadBalanceScorer),
        Box::new(ExperienceScorer),
    ]
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_days() as f64 / 30.0
}
