//! In-memory doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use postdeck_api_types::{Post, PostDraft, User};

use crate::application::preferences::PreferenceStore;
use crate::application::repos::ResourceApi;
use crate::domain::error::ResourceError;
use crate::infra::error::InfraError;

pub(crate) fn post(id: u64, title: &str, user_id: u64) -> Post {
    Post {
        id,
        title: title.to_string(),
        body: format!("body of post {id}"),
        user_id,
    }
}

pub(crate) fn draft(title: &str, body: &str, user_id: u64) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        body: body.to_string(),
        user_id,
    }
}

pub(crate) fn user(id: u64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        username: name.to_lowercase().replace(' ', "."),
        email: format!("user{id}@example.com"),
        phone: None,
        website: None,
        company: None,
        address: None,
    }
}

/// Let spawned background fetches run to completion under a paused clock.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Remote resource backed by vectors, with call counting and injectable failures.
pub(crate) struct FakeApi {
    posts: Mutex<Vec<Post>>,
    users: Mutex<Vec<User>>,
    next_id: AtomicU64,
    delay: Duration,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, ResourceError>>,
}

impl FakeApi {
    pub(crate) fn seeded() -> Self {
        Self {
            posts: Mutex::new(vec![
                post(1, "sunt aut facere", 1),
                post(2, "qui est esse", 1),
                post(3, "ea molestias quasi", 2),
                post(4, "eum et est occaecati", 2),
            ]),
            users: Mutex::new(vec![user(1, "Leanne Graham"), user(2, "Ervin Howell")]),
            next_id: AtomicU64::new(101),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.calls.lock().expect("calls").get(op).copied().unwrap_or(0)
    }

    pub(crate) fn fail(&self, op: &'static str, err: ResourceError) {
        self.failures.lock().expect("failures").insert(op, err);
    }

    pub(crate) fn recover(&self, op: &str) {
        self.failures.lock().expect("failures").remove(op);
    }

    pub(crate) fn insert_remote(&self, post: Post) {
        self.posts.lock().expect("posts").push(post);
    }

    async fn enter(&self, op: &'static str) -> Result<(), ResourceError> {
        *self.calls.lock().expect("calls").entry(op).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failures.lock().expect("failures").get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn list_posts(&self) -> Result<Vec<Post>, ResourceError> {
        self.enter("list_posts").await?;
        Ok(self.posts.lock().expect("posts").clone())
    }

    async fn get_post(&self, id: u64) -> Result<Post, ResourceError> {
        self.enter("get_post").await?;
        self.posts
            .lock()
            .expect("posts")
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ResourceError::NotFound)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, ResourceError> {
        self.enter("create_post").await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let post = Post::from_draft(id, draft.clone());
        self.posts.lock().expect("posts").push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: &Post) -> Result<Post, ResourceError> {
        self.enter("update_post").await?;
        let mut posts = self.posts.lock().expect("posts");
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(ResourceError::NotFound)?;
        *slot = post.clone();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: u64) -> Result<(), ResourceError> {
        self.enter("delete_post").await?;
        let mut posts = self.posts.lock().expect("posts");
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(ResourceError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ResourceError> {
        self.enter("list_users").await?;
        Ok(self.users.lock().expect("users").clone())
    }

    async fn get_user(&self, id: u64) -> Result<User, ResourceError> {
        self.enter("get_user").await?;
        self.users
            .lock()
            .expect("users")
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(ResourceError::NotFound)
    }
}

/// Preference store whose saves always fail; loads find nothing.
pub(crate) struct ReadOnlyPreferenceStore;

impl PreferenceStore for ReadOnlyPreferenceStore {
    fn load(&self, _key: &str) -> Result<Option<String>, InfraError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), InfraError> {
        Err(InfraError::from(std::io::Error::other("read-only preferences")))
    }
}
