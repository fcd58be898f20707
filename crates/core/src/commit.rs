//! Commit messages attached to remote writes.
//!
//! Rendering: `case:<action>: <id>`. Messages are labels, not prose.

use casebook_types::CaseId;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CaseCommitAction {
    Create,
    Update,
    Delete,
    Import,
}

impl CaseCommitAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for CaseCommitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseCommitMessage<'a> {
    action: CaseCommitAction,
    id: &'a CaseId,
}

impl<'a> CaseCommitMessage<'a> {
    pub fn new(action: CaseCommitAction, id: &'a CaseId) -> Self {
        Self { action, id }
    }
}

impl fmt::Display for CaseCommitMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case:{}: {}", self.action, self.id)
    }
}
