pub mod advanced;
pub mod baseline;
pub mod composition;

pub use advanced::{
    AdvancedMatchResult, AdvancedMatchingService, ScoredCandidate, TeamMemberScore,
};
pub use baseline::MatchingService;
pub use composition::{MatchCandidate, MatchScore, SkillAssignment, SkillMatch, TeamComposition, TeamMember};
