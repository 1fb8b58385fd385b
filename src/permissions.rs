//! The "author or read-only" rule shared by posts and comments.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Comment, Post},
};

/// Access
///
/// What the caller is trying to do with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// list / retrieve
    Read,
    /// update / partial update / delete
    Write,
}

/// Records that remember who created them.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author
    }
}

/// authorize
///
/// Reads are always allowed. Writes are allowed only when the caller is the
/// record's author; anything else is `AppError::AccessDenied`.
pub fn authorize<R: Authored>(access: Access, caller: &AuthUser, record: &R) -> Result<(), AppError> {
    match access {
        Access::Read => Ok(()),
        Access::Write if caller.id == record.author_id() => Ok(()),
        Access::Write => {
            tracing::debug!(caller = %caller.id, author = %record.author_id(), "write denied: not the author");
            Err(AppError::permission_denied())
        }
    }
}
