//! Resource keys.
//!
//! Keys render as `posts`, `post:{id}`, `users` and `user:{id}` in logs.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// The full posts collection.
    Posts,
    /// A single post by id.
    Post(u64),
    /// The full users collection.
    Users,
    /// A single user by id.
    User(u64),
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posts => f.write_str("posts"),
            Self::Post(id) => write!(f, "post:{id}"),
            Self::Users => f.write_str("users"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}
