//! Create/update/delete with confirm-then-update cache semantics.
//!
//! The cache is only touched after the server confirms a mutation, so a
//! failed request needs no rollback. At most one mutation per target may be
//! in flight at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use postdeck_api_types::{Post, PostDraft};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::notifications::NotificationCenter;
use crate::application::repos::ResourceApi;
use crate::cache::effects::{MutationEffect, plan};
use crate::cache::{ResourceCache, lock};
use crate::domain::error::ResourceError;

pub const CREATED_MESSAGE: &str = "Post created successfully!";
pub const UPDATED_MESSAGE: &str = "Post updated successfully!";
pub const DELETED_MESSAGE: &str = "Post deleted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    NewPost,
    Post(u64),
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewPost => f.write_str("new post"),
            Self::Post(id) => write!(f, "post {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("a mutation of {target} is already in flight")]
    InFlight { target: MutationTarget },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl MutationError {
    pub fn as_resource(&self) -> Option<&ResourceError> {
        match self {
            Self::Resource(err) => Some(err),
            Self::InFlight { .. } => None,
        }
    }
}

type StateMap = Mutex<HashMap<MutationTarget, MutationState>>;

/// Marks a target in flight; resets it to idle if dropped unfinished.
struct InFlightGuard<'a> {
    states: &'a StateMap,
    target: MutationTarget,
    finished: bool,
}

impl InFlightGuard<'_> {
    fn finish(mut self, state: MutationState) {
        lock::lock(self.states, "mutation.finish").insert(self.target, state);
        self.finished = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock::lock(self.states, "mutation.abandon").insert(self.target, MutationState::Idle);
        }
    }
}

pub struct MutationCoordinator {
    api: Arc<dyn ResourceApi>,
    cache: ResourceCache,
    notifications: Arc<NotificationCenter>,
    states: StateMap,
}

impl fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        cache: ResourceCache,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            api,
            cache,
            notifications,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self, target: MutationTarget) -> MutationState {
        lock::lock(&self.states, "mutation.state")
            .get(&target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self, target: MutationTarget) -> bool {
        self.state(target) == MutationState::InFlight
    }

    pub async fn create(&self, draft: PostDraft) -> Result<Post, MutationError> {
        let guard = self.begin(MutationTarget::NewPost)?;
        let outcome = self.api.create_post(&draft).await;
        self.settle(
            guard,
            outcome.map(|post| (MutationEffect::Created(post.clone()), post)),
            CREATED_MESSAGE,
        )
    }

    pub async fn update(&self, post: Post) -> Result<Post, MutationError> {
        let guard = self.begin(MutationTarget::Post(post.id))?;
        let outcome = self.api.update_post(&post).await;
        self.settle(
            guard,
            outcome.map(|post| (MutationEffect::Updated(post.clone()), post)),
            UPDATED_MESSAGE,
        )
    }

    /// A `NotFound` reply is still reported as an error, but the id is
    /// evicted from the cache as if the delete had succeeded.
    pub async fn delete(&self, id: u64) -> Result<(), MutationError> {
        let guard = self.begin(MutationTarget::Post(id))?;
        let outcome = self.api.delete_post(id).await;
        if outcome == Err(ResourceError::NotFound) {
            debug!(post_id = id, "Evicting post the server no longer knows");
            self.cache.apply(plan(MutationEffect::Deleted(id)));
        }
        self.settle(
            guard,
            outcome.map(|()| (MutationEffect::Deleted(id), ())),
            DELETED_MESSAGE,
        )
    }

    fn begin(&self, target: MutationTarget) -> Result<InFlightGuard<'_>, MutationError> {
        let mut states = lock::lock(&self.states, "mutation.begin");
        if states.get(&target) == Some(&MutationState::InFlight) {
            debug!(mutation = %target, "Rejected overlapping mutation");
            return Err(MutationError::InFlight { target });
        }
        states.insert(target, MutationState::InFlight);
        Ok(InFlightGuard {
            states: &self.states,
            target,
            finished: false,
        })
    }

    fn settle<T>(
        &self,
        guard: InFlightGuard<'_>,
        outcome: Result<(MutationEffect, T), ResourceError>,
        success_message: &str,
    ) -> Result<T, MutationError> {
        match outcome {
            Ok((effect, value)) => {
                info!(mutation = %guard.target, post_id = effect.post_id(), "Mutation confirmed");
                self.cache.apply(plan(effect));
                guard.finish(MutationState::Succeeded);
                self.notifications.success(success_message);
                Ok(value)
            }
            Err(err) => {
                warn!(mutation = %guard.target, error = %err, error_kind = err.kind(), "Mutation failed");
                guard.finish(MutationState::Failed {
                    message: err.to_string(),
                });
                self.notifications.error(err.to_string());
                Err(err.into())
            }
        }
    }
}
