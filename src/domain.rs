use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::error::MatchError;

/// スキル習熟度（順序付き）。ギャップ計算は数値として比較する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum ProficiencyLevel {
    Beginner = 1,
    Intermediate = 2,
    Advanced = 3,
    Expert = 4,
    Master = 5,
}

impl ProficiencyLevel {
    pub fn gap(self, required: ProficiencyLevel) -> i32 {
        self as i32 - required as i32
    }
}

/// 職位ティア。単価・工数係数・品質スコアは全てここから導出する。
///
/// 元の設計では肩書き文字列の部分一致を呼び出しごとに評価していたが、
/// 判定順が呼び出し箇所によって食い違う問題があったため、明示的な
/// ティアとして従業員レコードに持たせる。肩書きからの推定は
/// `infer_from_title` による一度きりの取り込み処理に限定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
}

impl Seniority {
    /// 時給単価（USD）。
    pub fn hourly_cost(self) -> f64 {
        match self {
            Seniority::Junior => 50.0,
            Seniority::Mid => 80.0,
            Seniority::Senior => 120.0,
            Seniority::Lead => 150.0,
            Seniority::Principal => 180.0,
        }
    }

    /// 工数係数。1.0 を基準に、ジュニアは時間がかかり、シニア以上は速い。
    pub fn effort_multiplier(self) -> f64 {
        match self {
            Seniority::Junior => 1.5,
            Seniority::Mid => 1.0,
            Seniority::Senior => 0.8,
            Seniority::Lead => 0.7,
            Seniority::Principal => 0.6,
        }
    }

    /// チーム品質スコア算出用の基礎点。
    pub fn quality_score(self) -> f64 {
        match self {
            Seniority::Junior => 60.0,
            Seniority::Mid => 70.0,
            Seniority::Senior => 80.0,
            Seniority::Lead => 90.0,
            Seniority::Principal => 100.0,
        }
    }

    /// バランス戦略でシニア枠として数えるかどうか。
    pub fn is_senior_tier(self) -> bool {
        matches!(self, Seniority::Senior | Seniority::Lead)
    }

    /// 肩書き文字列からの一度きりの推定。上位ティアから順に部分一致を
    /// 試すので "Junior Lead" のような肩書きは Lead 扱いになる。
    pub fn infer_from_title(title: &str) -> Seniority {
        let title = title.to_lowercase();
        if title.contains("principal") {
            Seniority::Principal
        } else if title.contains("lead") {
            Seniority::Lead
        } else if title.contains("senior") {
            Seniority::Senior
        } else if title.contains("junior") {
            Seniority::Junior
        } else {
            Seniority::Mid
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSkill {
    pub employee_id: i64,
    pub skill_id: i64,
    pub proficiency: ProficiencyLevel,
    pub acquired_date: DateTime<Utc>,
    pub last_used_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub project_id: i64,
    pub employee_id: i64,
    pub role: String,
    pub allocation_percentage: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

impl ProjectAssignment {
    pub fn new(
        project_id: i64,
        employee_id: i64,
        role: impl Into<String>,
        allocation_percentage: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, MatchError> {
        if !(1..=100).contains(&allocation_percentage) {
            return Err(MatchError::InvalidAllocation(format!(
                "allocation percentage must be between 1 and 100, got {allocation_percentage}"
            )));
        }
        if end_date <= start_date {
            return Err(MatchError::InvalidInput(
                "assignment end date must be after start date".into(),
            ));
        }

        Ok(Self {
            project_id,
            employee_id,
            role: role.into(),
            allocation_percentage,
            start_date,
            end_date,
            is_active: true,
        })
    }

    /// 指定日がアサイン期間に含まれるか（日単位、両端含む）。
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub title: String,
    pub seniority: Seniority,
    pub is_active: bool,
    pub skills: Vec<EmployeeSkill>,
    pub assignments: Vec<ProjectAssignment>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn skill(&self, skill_id: i64) -> Option<&EmployeeSkill> {
        self.skills.iter().find(|es| es.skill_id == skill_id)
    }

    pub fn has_skill_at(&self, skill_id: i64, min_proficiency: ProficiencyLevel) -> bool {
        self.skill(skill_id)
            .map(|es| es.proficiency >= min_proficiency)
            .unwrap_or(false)
    }

    /// 有効なアサインの割当率合計。
    pub fn current_allocation_percentage(&self) -> i32 {
        self.assignments
            .iter()
            .filter(|a| a.is_active)
            .map(|a| a.allocation_percentage)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    Approved,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequirement {
    pub project_id: i64,
    pub skill_id: i64,
    pub minimum_proficiency: ProficiencyLevel,
    pub required_count: i32,
}

impl ProjectRequirement {
    pub fn new(
        project_id: i64,
        skill_id: i64,
        minimum_proficiency: ProficiencyLevel,
        required_count: i32,
    ) -> Result<Self, MatchError> {
        if required_count <= 0 {
            return Err(MatchError::InvalidInput(
                "required count must be greater than 0".into(),
            ));
        }

        Ok(Self {
            project_id,
            skill_id,
            minimum_proficiency,
            required_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub department: String,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: i32,
    pub requirements: Vec<ProjectRequirement>,
}

impl Project {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, MatchError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MatchError::InvalidInput("project name is required".into()));
        }
        if end_date <= start_date {
            return Err(MatchError::InvalidInput(
                "project end date must be after start date".into(),
            ));
        }

        Ok(Self {
            id,
            name,
            description: String::new(),
            department: String::new(),
            status: ProjectStatus::Planning,
            start_date,
            end_date,
            priority: 3,
            requirements: Vec::new(),
        })
    }

    /// 優先度は 1（最高）〜 5（最低）。
    pub fn set_priority(&mut self, priority: i32) -> Result<(), MatchError> {
        if !(1..=5).contains(&priority) {
            return Err(MatchError::InvalidInput(format!(
                "priority must be between 1 and 5, got {priority}"
            )));
        }
        self.priority = priority;
        Ok(())
    }

    pub fn add_requirement(
        &mut self,
        skill_id: i64,
        minimum_proficiency: ProficiencyLevel,
        required_count: i32,
    ) -> Result<(), MatchError> {
        if self.requirements.iter().any(|r| r.skill_id == skill_id) {
            return Err(MatchError::InvalidInput(format!(
                "skill requirement already exists for skill {skill_id}"
            )));
        }

        self.requirements.push(ProjectRequirement::new(
            self.id,
            skill_id,
            minimum_proficiency,
            required_count,
        )?);
        Ok(())
    }
}

/// プロジェクト単位の個人実績。品質・納期・見積精度は保存せず読み出し時に導出する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProjectPerformance {
    pub employee_id: i64,
    pub project_id: i64,
    pub evaluated_at: DateTime<Utc>,
    pub tasks_assigned: i32,
    pub tasks_completed: i32,
    pub tasks_delivered_on_time: i32,
    pub bugs_reported: i32,
    pub code_review_issues: i32,
    pub estimated_hours: i32,
    pub actual_hours: i32,
    pub manager_rating: i32,
}

impl EmployeeProjectPerformance {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(1..=5).contains(&self.manager_rating) {
            return Err(MatchError::InvalidInput(
                "manager rating must be between 1 and 5".into(),
            ));
        }
        Ok(())
    }

    /// 納期遵守率（タスク未割当の場合は 100）。
    pub fn delivery_rate(&self) -> f64 {
        if self.tasks_assigned == 0 {
            return 100.0;
        }
        self.tasks_delivered_on_time as f64 / self.tasks_assigned as f64 * 100.0
    }

    pub fn completion_rate(&self) -> f64 {
        if self.tasks_assigned == 0 {
            return 100.0;
        }
        self.tasks_completed as f64 / self.tasks_assigned as f64 * 100.0
    }

    /// バグ・レビュー指摘によるペナルティを引いた品質スコア（0-100）。
    pub fn quality_score(&self) -> f64 {
        let bug_penalty = (self.bugs_reported as f64 * 5.0).min(30.0);
        let review_penalty = (self.code_review_issues as f64 * 2.0).min(20.0);
        (100.0 - bug_penalty - review_penalty).max(0.0)
    }

    /// 見積精度（見積 0 の場合は 0）。
    pub fn estimation_accuracy(&self) -> f64 {
        if self.estimated_hours == 0 {
            return 0.0;
        }
        let variance =
            (self.actual_hours - self.estimated_hours).abs() as f64 / self.estimated_hours as f64;
        (100.0 - variance * 100.0).max(0.0)
    }
}

/// 2人の従業員間の協働実績。ペアは小さい id を employee1 側に正規化して
/// 重複行を避ける。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCollaboration {
    pub project_id: i64,
    pub employee1_id: i64,
    pub employee2_id: i64,
    pub collaboration_date: DateTime<Utc>,
    pub communication_rating: i32,
    pub conflicts_resolved: i32,
    pub conflicts_escalated: i32,
    pub would_work_together_again: bool,
}

impl TeamCollaboration {
    pub fn new(
        project_id: i64,
        employee1_id: i64,
        employee2_id: i64,
        collaboration_date: DateTime<Utc>,
    ) -> Self {
        let (employee1_id, employee2_id) = if employee1_id > employee2_id {
            (employee2_id, employee1_id)
        } else {
            (employee1_id, employee2_id)
        };

        Self {
            project_id,
            employee1_id,
            employee2_id,
            collaboration_date,
            communication_rating: 3,
            conflicts_resolved: 0,
            conflicts_escalated: 0,
            would_work_together_again: true,
        }
    }

    pub fn set_metrics(
        &mut self,
        communication_rating: i32,
        conflicts_resolved: i32,
        conflicts_escalated: i32,
        would_work_together_again: bool,
    ) -> Result<(), MatchError> {
        if !(1..=5).contains(&communication_rating) {
            return Err(MatchError::InvalidInput(
                "communication rating must be between 1 and 5".into(),
            ));
        }

        self.communication_rating = communication_rating;
        self.conflicts_resolved = conflicts_resolved;
        self.conflicts_escalated = conflicts_escalated;
        self.would_work_together_again = would_work_together_again;
        Ok(())
    }

    pub fn involves(&self, employee_id: i64) -> bool {
        self.employee1_id == employee_id || self.employee2_id == employee_id
    }

    pub fn partner_of(&self, employee_id: i64) -> Option<i64> {
        if self.employee1_id == employee_id {
            Some(self.employee2_id)
        } else if self.employee2_id == employee_id {
            Some(self.employee1_id)
        } else {
            None
        }
    }

    /// 協働スコア（0-100）: コミュニケーション 40% + 衝突解決 30% + 再共働意思 30%。
    /// 衝突が無かった場合は解決分を満点とする。
    pub fn collaboration_score(&self) -> f64 {
        let mut score = self.communication_rating as f64 / 5.0 * 40.0;

        let total_conflicts = self.conflicts_resolved + self.conflicts_escalated;
        if total_conflicts > 0 {
            score += self.conflicts_resolved as f64 / total_conflicts as f64 * 30.0;
        } else {
            score += 30.0;
        }

        if self.would_work_together_again {
            score += 30.0;
        }

        (score * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn proficiency_levels_are_ordered() {
        assert!(ProficiencyLevel::Master > ProficiencyLevel::Expert);
        assert!(ProficiencyLevel::Beginner < ProficiencyLevel::Intermediate);
        assert_eq!(
            ProficiencyLevel::Master.gap(ProficiencyLevel::Advanced),
            2
        );
        assert_eq!(
            ProficiencyLevel::Beginner.gap(ProficiencyLevel::Advanced),
            -2
        );
    }

    #[test]
    fn seniority_inference_prefers_highest_tier() {
        assert_eq!(
            Seniority::infer_from_title("Junior Lead Engineer"),
            Seniority::Lead
        );
        assert_eq!(
            Seniority::infer_from_title("SENIOR developer"),
            Seniority::Senior
        );
        assert_eq!(
            Seniority::infer_from_title("Principal Architect"),
            Seniority::Principal
        );
        assert_eq!(Seniority::infer_from_title("Engineer II"), Seniority::Mid);
    }

    #[test]
    fn seniority_rates_follow_tier() {
        assert_eq!(Seniority::Junior.hourly_cost(), 50.0);
        assert_eq!(Seniority::Principal.hourly_cost(), 180.0);
        assert_eq!(Seniority::Lead.effort_multiplier(), 0.7);
        assert_eq!(Seniority::Mid.effort_multiplier(), 1.0);
        assert!(Seniority::Senior.is_senior_tier());
        assert!(Seniority::Lead.is_senior_tier());
        assert!(!Seniority::Principal.is_senior_tier());
    }

    #[test]
    fn assignment_rejects_out_of_range_allocation() {
        let err = ProjectAssignment::new(1, 1, "dev", 0, date(2026, 1, 1), date(2026, 6, 1));
        assert!(matches!(err, Err(MatchError::InvalidAllocation(_))));

        let err = ProjectAssignment::new(1, 1, "dev", 101, date(2026, 1, 1), date(2026, 6, 1));
        assert!(matches!(err, Err(MatchError::InvalidAllocation(_))));

        let ok = ProjectAssignment::new(1, 1, "dev", 100, date(2026, 1, 1), date(2026, 6, 1));
        assert!(ok.is_ok());
    }

    #[test]
    fn current_allocation_ignores_inactive_assignments() {
        let mut active =
            ProjectAssignment::new(1, 7, "dev", 60, date(2026, 1, 1), date(2026, 6, 1)).unwrap();
        let mut ended =
            ProjectAssignment::new(2, 7, "dev", 40, date(2026, 1, 1), date(2026, 6, 1)).unwrap();
        ended.is_active = false;
        active.is_active = true;

        let employee = Employee {
            id: 7,
            first_name: "Aki".into(),
            last_name: "Tanaka".into(),
            email: "aki@example.com".into(),
            department: "Engineering".into(),
            title: "Senior Engineer".into(),
            seniority: Seniority::Senior,
            is_active: true,
            skills: vec![],
            assignments: vec![active, ended],
        };

        assert_eq!(employee.current_allocation_percentage(), 60);
    }

    #[test]
    fn project_priority_is_range_checked() {
        let mut project = Project::new(1, "Platform", date(2026, 1, 1), date(2026, 12, 1)).unwrap();
        assert!(project.set_priority(1).is_ok());
        assert!(project.set_priority(5).is_ok());
        assert!(project.set_priority(0).is_err());
        assert!(project.set_priority(6).is_err());
    }

    #[test]
    fn project_rejects_duplicate_requirements() {
        let mut project = Project::new(1, "Platform", date(2026, 1, 1), date(2026, 12, 1)).unwrap();
        project
            .add_requirement(10, ProficiencyLevel::Advanced, 2)
            .unwrap();

        let err = project.add_requirement(10, ProficiencyLevel::Beginner, 1);
        assert!(matches!(err, Err(MatchError::InvalidInput(_))));
    }

    #[test]
    fn performance_rates_derive_from_metrics() {
        let perf = EmployeeProjectPerformance {
            employee_id: 1,
            project_id: 1,
            evaluated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            tasks_assigned: 10,
            tasks_completed: 9,
            tasks_delivered_on_time: 8,
            bugs_reported: 2,
            code_review_issues: 5,
            estimated_hours: 100,
            actual_hours: 120,
            manager_rating: 4,
        };

        assert_eq!(perf.delivery_rate(), 80.0);
        assert_eq!(perf.completion_rate(), 90.0);
        // 100 - min(30, 10) - min(20, 10)
        assert_eq!(perf.quality_score(), 80.0);
        // |120-100|/100 = 20% off
        assert!((perf.estimation_accuracy() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn performance_rates_handle_empty_denominators() {
        let perf = EmployeeProjectPerformance {
            employee_id: 1,
            project_id: 1,
            evaluated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            tasks_assigned: 0,
            tasks_completed: 0,
            tasks_delivered_on_time: 0,
            bugs_reported: 0,
            code_review_issues: 0,
            estimated_hours: 0,
            actual_hours: 50,
            manager_rating: 3,
        };

        assert_eq!(perf.delivery_rate(), 100.0);
        assert_eq!(perf.estimation_accuracy(), 0.0);
    }

    #[test]
    fn collaboration_canonicalizes_pair_order() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let collab = TeamCollaboration::new(1, 9, 3, now);
        assert_eq!(collab.employee1_id, 3);
        assert_eq!(collab.employee2_id, 9);
        assert_eq!(collab.partner_of(3), Some(9));
        assert_eq!(collab.partner_of(9), Some(3));
        assert_eq!(collab.partner_of(4), None);
    }

    #[test]
    fn collaboration_score_weighs_components() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut collab = TeamCollaboration::new(1, 1, 2, now);

        // defaults: rating 3, no conflicts, would work again
        assert_eq!(collab.collaboration_score(), 84.0);

        collab.set_metrics(5, 3, 1, true).unwrap();
        // 40 + 0.75*30 + 30
        assert_eq!(collab.collaboration_score(), 92.5);

        collab.set_metrics(1, 0, 2, false).unwrap();
        // 8 + 0 + 0
        assert_eq!(collab.collaboration_score(), 8.0);
    }
}
