use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::domain::{Employee, ProficiencyLevel};
use crate::store::MatchStore;

/// 標準週労働時間と、常に確保する緊急対応バッファ。
pub const STANDARD_HOURS_PER_WEEK: i32 = 40;
pub const DEFAULT_BUFFER_HOURS: i32 = 4;

/// 割当の衝突判定オラクル。追加割当が既存アサインと合わせて 100% を
/// 超える日が無いかを日単位で走査する。
///
/// 計算量は O(日数 × アサイン数)。現実的な期間では十分速いが、
/// 長期間を頻繁に問い合わせる場合は日毎の割当を索引化する余地がある。
pub struct AllocationOracle<'a> {
    store: &'a dyn MatchStore,
}

impl<'a> AllocationOracle<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self { store }
    }

    /// `[start, end]`（両端含む）のいずれかの日で
    /// 既存割当 + required_percentage が 100 を超えるなら衝突。
    /// 従業員が存在しない場合はフェイルクローズで衝突扱いにする。
    pub fn check_conflict(
        &self,
        employee_id: i64,
        required_percentage: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> bool {
        let Some(employee) = self.store.employee(employee_id) else {
            debug!(employee_id, "conflict check for unknown employee");
            return true;
        };

        let mut day = start_date;
        while day <= end_date {
            let daily_allocation: i32 = employee
                .assignments
                .iter()
                .filter(|a| a.is_active && a.covers(day))
                .map(|a| a.allocation_percentage)
                .sum();

            if daily_allocation + required_percentage > 100 {
                return true;
            }

            let Some(next) = day.checked_add_days(Days::new(1)) else {
                break;
            };
            day = next;
        }

        false
    }

    /// 指定スキルを保有し、期間中に衝突なく required_percentage を
    /// 割り当てられる従業員を列挙する。
    pub fn find_available(
        &self,
        skill_id: i64,
        min_proficiency: ProficiencyLevel,
        required_percentage: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<Employee> {
        self.store
            .employees_with_skill(skill_id, min_proficiency)
            .into_iter()
            .filter(|e| !self.check_conflict(e.id, required_percentage, start_date, end_date))
            .collect()
    }

    /// 期間と重なる有効アサインを時間換算し、標準 40h からバッファ 4h と
    /// 既存割当分を引いた週あたりの空き時間を返す（下限 0）。
    pub fn available_hours_per_week(
        &self,
        employee_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> i32 {
        let Some(employee) = self.store.employee(employee_id) else {
            return 0;
        };

        let allocated_hours: i32 = employee
            .assignments
            .iter()
            .filter(|a| a.is_active && a.start_date <= end_date && a.end_date >= start_date)
            .map(|a| {
                (a.allocation_percentage as f64 / 100.0 * STANDARD_HOURS_PER_WEEK as f64) as i32
            })
            .sum();

        (STANDARD_HOURS_PER_WEEK - DEFAULT_BUFFER_HOURS - allocated_hours).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmployeeSkill, ProjectAssignment, Seniority};
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee_with_assignments(id: i64, assignments: Vec<ProjectAssignment>) -> crate::Employee {
        crate::Employee {
            id,
            first_name: format!("E{id}"),
            last_name: "Test".into(),
            email: format!("e{id}@example.com"),
            department: "Engineering".into(),
            title: "Engineer".into(),
            seniority: Seniority::Mid,
            is_active: true,
            skills: vec![EmployeeSkill {
                employee_id: id,
                skill_id: 10,
                proficiency: ProficiencyLevel::Advanced,
                acquired_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                last_used_date: None,
            }],
            assignments,
        }
    }

    #[test]
    fn missing_employee_is_a_conflict() {
        let store = InMemoryStore::new();
        let oracle = AllocationOracle::new(&store);

        assert!(oracle.check_conflict(99, 10, date(2026, 1, 1), date(2026, 1, 10)));
    }

    #[test]
    fn detects_conflict_on_any_overlapping_day() {
        let mut store = InMemoryStore::new();
        let assignment =
            ProjectAssignment::new(1, 1, "dev", 60, date(2026, 2, 1), date(2026, 2, 28)).unwrap();
        store.add_employee(employee_with_assignments(1, vec![assignment]));
        let oracle = AllocationOracle::new(&store);

        // window が既存アサインの末尾 1 日だけ重なるケース
        assert!(oracle.check_conflict(1, 50, date(2026, 2, 28), date(2026, 3, 15)));
        // 重ならない期間なら衝突なし
        assert!(!oracle.check_conflict(1, 50, date(2026, 3, 1), date(2026, 3, 15)));
        // 60 + 40 = 100 は上限ちょうどで許容
        assert!(!oracle.check_conflict(1, 40, date(2026, 2, 1), date(2026, 2, 28)));
        assert!(oracle.check_conflict(1, 41, date(2026, 2, 1), date(2026, 2, 28)));
    }

    #[test]
    fn inactive_assignments_do_not_count() {
        let mut store = InMemoryStore::new();
        let mut assignment =
            ProjectAssignment::new(1, 1, "dev", 100, date(2026, 2, 1), date(2026, 2, 28)).unwrap();
        assignment.is_active = false;
        store.add_employee(employee_with_assignments(1, vec![assignment]));
        let oracle = AllocationOracle::new(&store);

        assert!(!oracle.check_conflict(1, 100, date(2026, 2, 1), date(2026, 2, 28)));
    }

    #[test]
    fn find_available_filters_conflicted_candidates() {
        let mut store = InMemoryStore::new();
        let busy =
            ProjectAssignment::new(1, 1, "dev", 80, date(2026, 1, 1), date(2026, 12, 1)).unwrap();
        store.add_employee(employee_with_assignments(1, vec![busy]));
        store.add_employee(employee_with_assignments(2, vec![]));
        let oracle = AllocationOracle::new(&store);

        let available = oracle.find_available(
            10,
            ProficiencyLevel::Advanced,
            50,
            date(2026, 3, 1),
            date(2026, 6, 1),
        );

        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, 2);
    }

    #[test]
    fn available_hours_subtract_buffer_and_existing_load() {
        let mut store = InMemoryStore::new();
        let half =
            ProjectAssignment::new(1, 1, "dev", 50, date(2026, 1, 1), date(2026, 12, 1)).unwrap();
        store.add_employee(employee_with_assignments(1, vec![half]));
        store.add_employee(employee_with_assignments(2, vec![]));
        let oracle = AllocationOracle::new(&store);

        // 40 - 4 - 20
        assert_eq!(
            oracle.available_hours_per_week(1, date(2026, 3, 1), date(2026, 6, 1)),
            16
        );
        // 期間が重ならなければ満額
        assert_eq!(
            oracle.available_hours_per_week(1, date(2027, 1, 1), date(2027, 3, 1)),
            36
        );
        assert_eq!(
            oracle.available_hours_per_week(2, date(2026, 3, 1), date(2026, 6, 1)),
            36
        );
        // 不在従業員は 0
        assert_eq!(
            oracle.available_hours_per_week(99, date(2026, 3, 1), date(2026, 6, 1)),
            0
        );
    }

    #[test]
    fn fully_allocated_employee_conflicts_with_any_extra_load() {
        let mut store = InMemoryStore::new();
        let full =
            ProjectAssignment::new(1, 1, "dev", 100, date(2026, 1, 1), date(2026, 12, 1)).unwrap();
        store.add_employee(employee_with_assignments(1, vec![full]));
        let oracle = AllocationOracle::new(&store);

        assert!(oracle.check_conflict(1, 1, date(2026, 5, 1), date(2026, 5, 2)));
        assert_eq!(
            oracle.available_hours_per_week(1, date(2026, 5, 1), date(2026, 5, 2)),
            0
        );
    }
}
