//! Router Module Index
//!
//! One router per resource. Access control lives in the handlers' `AuthUser`
//! arguments; the comment router is additionally wrapped in the authentication
//! layer by `create_router`, since none of its routes are public.

/// Discovery and health endpoints, anonymous.
pub mod public;

/// `/api/posts/`: public reads, authenticated create, author-only writes.
pub mod posts;

/// `/api/comments/`: every route requires a validated user.
pub mod comments;

/// `/api/auth/`: registration, login and token refresh, anonymous.
pub mod accounts;
