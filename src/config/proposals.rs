//! Proposal service configuration

use serde::Deserialize;

use crate::domain::proposal::RootFilterPolicy;

/// Tunables of the proposal service.
///
/// Length limits are fixed by the domain and are not configurable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalsConfig {
    /// When listing restricts to root proposals: `author_scoped` or
    /// `whenever_filtered`
    #[serde(default)]
    pub root_filter: RootFilterPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_author_scoped() {
        assert_eq!(
            ProposalsConfig::default().root_filter,
            RootFilterPolicy::AuthorScoped
        );
    }

    #[test]
    fn test_policy_deserializes_snake_case() {
        let config: ProposalsConfig =
            serde_json::from_str(r#"{"root_filter": "whenever_filtered"}"#).unwrap();
        assert_eq!(config.root_filter, RootFilterPolicy::WheneverFiltered);
    }
}
