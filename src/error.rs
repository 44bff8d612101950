use thiserror::Error;

/// マッチングコア全体で使うエラー型。
/// 構造的なエラー（プロジェクト不在・設定不正）は呼び出し元へ伝播し、
/// 要員不足などの部分的な欠損は結果オブジェクト側のフラグで表現する。
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("project not found: {0}")]
    ProjectNotFound(i64),
    #[error("employee not found: {0}")]
    EmployeeNotFound(i64),
    #[error("skill not found: {0}")]
    SkillNotFound(i64),
    #[error("invalid scoring configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid allocation: {0}")]
    InvalidAllocation(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_messages_for_callers() {
        let err = MatchError::ProjectNotFound(42);
        assert_eq!(err.to_string(), "project not found: 42");

        let err = MatchError::InvalidConfiguration("weights sum to 0.5".into());
        assert!(err.to_string().contains("weights sum to 0.5"));
    }
}
