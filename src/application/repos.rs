//! Port describing the remote posts/users resource.

use async_trait::async_trait;
use postdeck_api_types::{Post, PostDraft, User};

use crate::domain::error::ResourceError;

/// Remote resource adapter. Implementations own transport concerns (base
/// URL, timeouts) and translate every failure into a [`ResourceError`].
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, ResourceError>;

    async fn get_post(&self, id: u64) -> Result<Post, ResourceError>;

    /// The server assigns the id of the returned post.
    async fn create_post(&self, draft: &PostDraft) -> Result<Post, ResourceError>;

    async fn update_post(&self, post: &Post) -> Result<Post, ResourceError>;

    async fn delete_post(&self, id: u64) -> Result<(), ResourceError>;

    async fn list_users(&self) -> Result<Vec<User>, ResourceError>;

    async fn get_user(&self, id: u64) -> Result<User, ResourceError>;
}
