pub mod allocation;
pub mod domain;
pub mod error;
pub mod logging;
pub mod matching;
pub mod optimization;
pub mod scoring;
pub mod store;

pub use allocation::AllocationOracle;
pub use domain::{
    Employee, EmployeeProjectPerformance, EmployeeSkill, ProficiencyLevel, Project,
    ProjectAssignment, ProjectRequirement, Seniority, Skill, TeamCollaboration,
};
pub use error::MatchError;
pub use matching::{AdvancedMatchingService, MatchingService};
pub use optimization::{OptimizationConstraints, TeamOptimizationService};
pub use scoring::ComponentWeights;
pub use store::{InMemoryStore, MatchStore};
