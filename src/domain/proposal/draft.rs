//! Input shapes for creating and editing proposals.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProposalId, TagId, UserId, ValidationError};

/// Maximum length of a proposal's text, in characters.
pub const MAX_TEXT_LENGTH: usize = 400;

/// Maximum length of a proposal's source, in characters.
pub const MAX_SOURCE_LENGTH: usize = 300;

/// Checks the length limits shared by creation and edits.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_content(text: &str, source: &str) -> Result<(), ValidationError> {
    let text_len = text.chars().count();
    if text_len > MAX_TEXT_LENGTH {
        return Err(ValidationError::too_long("text", MAX_TEXT_LENGTH, text_len));
    }

    let source_len = source.chars().count();
    if source_len > MAX_SOURCE_LENGTH {
        return Err(ValidationError::too_long(
            "source",
            MAX_SOURCE_LENGTH,
            source_len,
        ));
    }

    Ok(())
}

/// A proposal that has not been stored yet. The store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub text: String,
    pub source: String,
    pub author_id: UserId,
    pub is_root: bool,
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
}

impl ProposalDraft {
    /// Starts a root proposal with no tags.
    pub fn root(author_id: UserId, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            author_id,
            is_root: true,
            tags: BTreeSet::new(),
        }
    }

    /// Starts a non-root proposal with no tags.
    pub fn reply(author_id: UserId, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            is_root: false,
            ..Self::root(author_id, text, source)
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.text, &self.source)
    }
}

/// The editable part of an existing proposal.
///
/// Author, creation time, tallies, replies and followers are not editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalEdit {
    pub id: ProposalId,
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
}

impl ProposalEdit {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.text, &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_text_at_limit() {
        let text = "a".repeat(MAX_TEXT_LENGTH);
        assert!(validate_content(&text, "").is_ok());
    }

    #[test]
    fn rejects_text_over_limit() {
        let text = "a".repeat(MAX_TEXT_LENGTH + 1);
        assert_eq!(
            validate_content(&text, ""),
            Err(ValidationError::too_long("text", 400, 401))
        );
    }

    #[test]
    fn rejects_source_over_limit() {
        let source = "s".repeat(MAX_SOURCE_LENGTH + 1);
        let err = validate_content("ok", &source).unwrap_err();
        assert_eq!(err.field(), "source");
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 400 two-byte characters
        let text = "é".repeat(MAX_TEXT_LENGTH);
        assert!(text.len() > MAX_TEXT_LENGTH);
        assert!(validate_content(&text, "").is_ok());
    }

    #[test]
    fn reply_draft_is_not_root() {
        let draft = ProposalDraft::reply(UserId::new(1), "t", "s").with_tags([TagId::new(2)]);
        assert!(!draft.is_root);
        assert!(draft.tags.contains(&TagId::new(2)));
    }

    proptest! {
        #[test]
        fn validation_matches_length_limits(text_len in 0usize..600, source_len in 0usize..450) {
            let draft = ProposalDraft::root(UserId::new(1), "x".repeat(text_len), "y".repeat(source_len));
            let expected_ok = text_len <= MAX_TEXT_LENGTH && source_len <= MAX_SOURCE_LENGTH;
            prop_assert_eq!(draft.validate().is_ok(), expected_ok);
        }
    }
}
