use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{DomainError, DomainResult, Entity, MemoId, Owned, UserId};

/// Upper bound on memo length, counted in characters.
pub const MEMO_MAX_CHARS: usize = 2000;

/// A short personal note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: MemoId,
    pub owner: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memo {
    /// New, unsaved memo. The id is assigned by the store.
    pub fn new(owner: UserId, content: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: MemoId::new(0),
            owner,
            content: check_content(content)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn edit(&mut self, content: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.content = check_content(content)?;
        self.updated_at = now;
        Ok(())
    }
}

fn check_content(content: &str) -> DomainResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("memo content is required"));
    }
    if content.chars().count() > MEMO_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "memo content must be at most {MEMO_MAX_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

impl Entity for Memo {
    type Id = MemoId;

    fn id(&self) -> MemoId {
        self.id
    }
}

impl Owned for Memo {
    fn owner(&self) -> UserId {
        self.owner
    }

    fn assign_id(&mut self, id: MemoId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_memo_trims_content() {
        let memo = Memo::new(UserId::new(7), "  call the printer  ", Utc::now()).unwrap();
        assert_eq!(memo.content, "call the printer");
        assert_eq!(memo.owner(), UserId::new(7));
    }

    #[test]
    fn blank_memo_is_rejected() {
        let err = Memo::new(UserId::new(1), " \n ", Utc::now()).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn edit_keeps_creation_time() {
        let created = Utc::now();
        let mut memo = Memo::new(UserId::new(1), "draft", created).unwrap();
        let later = created + chrono::Duration::minutes(5);

        memo.edit("final", later).unwrap();

        assert_eq!(memo.content, "final");
        assert_eq!(memo.created_at, created);
        assert_eq!(memo.updated_at, later);
    }

    #[test]
    fn failed_edit_leaves_memo_untouched() {
        let mut memo = Memo::new(UserId::new(1), "draft", Utc::now()).unwrap();
        let before = memo.clone();
        assert!(memo.edit("", Utc::now()).is_err());
        assert_eq!(memo, before);
    }

    proptest! {
        /// Property: length limit is measured in characters, not bytes.
        #[test]
        fn length_limit_counts_chars(n in 1usize..2100) {
            let content = "메".repeat(n);
            let result = Memo::new(UserId::new(1), &content, Utc::now());
            prop_assert_eq!(result.is_ok(), n <= MEMO_MAX_CHARS);
        }
    }
}
