use std::collections::HashMap;

use crate::domain::{
    Employee, EmployeeProjectPerformance, ProficiencyLevel, Project, Skill, TeamCollaboration,
};

/// マッチングコアが必要とする読み取り専用ストアの契約。
/// 永続化層（RDB など）はこのトレイト越しにのみ見える。コアは一切書き込まない。
pub trait MatchStore {
    fn project(&self, id: i64) -> Option<Project>;
    fn skill(&self, id: i64) -> Option<Skill>;
    fn employee(&self, id: i64) -> Option<Employee>;

    /// 指定スキルを最低習熟度以上で保有する有効な従業員を返す。
    fn employees_with_skill(
        &self,
        skill_id: i64,
        min_proficiency: ProficiencyLevel,
    ) -> Vec<Employee>;

    /// 評価日の新しい順に最大 `limit` 件の実績を返す。
    fn recent_performance(&self, employee_id: i64, limit: usize)
        -> Vec<EmployeeProjectPerformance>;

    /// 候補者と指定メンバー群の間の協働実績を全て返す。
    fn collaborations_between(
        &self,
        employee_id: i64,
        teammate_ids: &[i64],
    ) -> Vec<TeamCollaboration>;
}

/// テストおよびデータを手元に持つ呼び出し元向けのインメモリ実装。
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    projects: HashMap<i64, Project>,
    skills: HashMap<i64, Skill>,
    employees: HashMap<i64, Employee>,
    performances: Vec<EmployeeProjectPerformance>,
    collaborations: Vec<TeamCollaboration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.insert(project.id, project);
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.skills.insert(skill.id, skill);
    }

    pub fn add_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    pub fn add_performance(&mut self, performance: EmployeeProjectPerformance) {
        self.performances.push(performance);
    }

    pub fn add_collaboration(&mut self, collaboration: TeamCollaboration) {
        self.collaborations.push(collaboration);
    }
}

impl MatchStore for InMemoryStore {
    fn project(&self, id: i64) -> Option<Project> {
        self.projects.get(&id).cloned()
    }

    fn skill(&self, id: i64) -> Option<Skill> {
        self.skills.get(&id).cloned()
    }

    fn employee(&self, id: i64) -> Option<Employee> {
        self.employees.get(&id).cloned()
    }

    fn employees_with_skill(
        &self,
        skill_id: i64,
        min_proficiency: ProficiencyLevel,
    ) -> Vec<Employee> {
        let mut matched: Vec<Employee> = self
            .employees
            .values()
            .filter(|e| e.is_active && e.has_skill_at(skill_id, min_proficiency))
            .cloned()
            .collect();

        // HashMap の列挙順に依存しないよう id で安定化する
        matched.sort_by_key(|e| e.id);
        matched
    }

    fn recent_performance(
        &self,
        employee_id: i64,
        limit: usize,
    ) -> Vec<EmployeeProjectPerformance> {
        let mut records: Vec<EmployeeProjectPerformance> = self
            .performances
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.evaluated_at.cmp(&a.evaluated_at));
        records.truncate(limit);
        records
    }

    fn collaborations_between(
        &self,
        employee_id: i64,
        teammate_ids: &[i64],
    ) -> Vec<TeamCollaboration> {
        self.collaborations
            .iter()
            .filter(|c| {
                c.partner_of(employee_id)
                    .map(|partner| teammate_ids.contains(&partner))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}
