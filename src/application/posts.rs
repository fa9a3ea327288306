//! Session facade used by front ends: cached reads, filtered views,
//! validated submissions and user-facing notifications.

use std::sync::Arc;

use postdeck_api_types::{Post, User};
use tracing::debug;

use crate::application::mutations::{
    MutationCoordinator, MutationError, MutationState, MutationTarget,
};
use crate::application::notifications::NotificationCenter;
use crate::application::preferences::PreferencesController;
use crate::application::repos::ResourceApi;
use crate::cache::ResourceCache;
use crate::domain::error::ResourceError;
use crate::domain::preferences::{Preferences, SortOrder, ThemeMode, ViewMode};
use crate::domain::validation::PostForm;
use crate::domain::view::{AuthorFilter, FilterState};
use crate::infra::error::InfraError;

pub const LIST_FAILED_MESSAGE: &str = "Failed to fetch posts";
pub const DETAIL_FAILED_MESSAGE: &str = "Failed to fetch post";
pub const USERS_FAILED_MESSAGE: &str = "Failed to fetch users. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Ready(Vec<Post>),
    /// Calling [`PostsService::load_list`] again retries.
    Failed { message: String },
}

#[derive(Debug)]
pub struct PostsService {
    cache: ResourceCache,
    mutations: MutationCoordinator,
    notifications: Arc<NotificationCenter>,
    preferences: PreferencesController,
    filter: FilterState,
}

impl PostsService {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        cache: ResourceCache,
        notifications: Arc<NotificationCenter>,
        preferences: PreferencesController,
    ) -> Self {
        let Preferences {
            view_mode,
            sort_order,
            ..
        } = preferences.current();
        let filter = FilterState {
            sort_order,
            view_mode,
            ..FilterState::default()
        };
        let mutations = MutationCoordinator::new(api, cache.clone(), notifications.clone());
        Self {
            cache,
            mutations,
            notifications,
            preferences,
            filter,
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.current()
    }

    pub fn mutation_state(&self, target: MutationTarget) -> MutationState {
        self.mutations.state(target)
    }

    pub async fn load_list(&self) -> ListState {
        match self.cache.posts().await {
            Ok(posts) => ListState::Ready(self.filter.apply(&posts)),
            Err(err) => {
                debug!(error = %err, "Posts list unavailable");
                self.notifications.error(LIST_FAILED_MESSAGE);
                ListState::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    pub async fn load_detail(&self, id: u64) -> Result<Post, ResourceError> {
        self.cache.post(id).await.inspect_err(|err| {
            debug!(post_id = id, error = %err, "Post unavailable");
            self.notifications.error(DETAIL_FAILED_MESSAGE);
        })
    }

    /// Candidate authors; empty (with a notification) when users cannot be fetched.
    pub async fn authors(&self) -> Arc<Vec<User>> {
        match self.cache.users().await {
            Ok(users) => users,
            Err(err) => {
                debug!(error = %err, "Users unavailable");
                self.notifications.error(USERS_FAILED_MESSAGE);
                Arc::new(Vec::new())
            }
        }
    }

    /// Validate locally, then create (`editing == None`) or update the post.
    pub async fn submit(&self, form: PostForm, editing: Option<u64>) -> Result<Post, MutationError> {
        let draft = form.into_draft().inspect_err(|err| {
            self.notifications.error(err.to_string());
        })?;
        match editing {
            Some(id) => self.mutations.update(Post::from_draft(id, draft)).await,
            None => self.mutations.create(draft).await,
        }
    }

    pub async fn delete(&self, id: u64) -> Result<(), MutationError> {
        self.mutations.delete(id).await
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    pub fn set_selected_author(&mut self, author: AuthorFilter) {
        self.filter.selected_author = author;
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> Result<(), InfraError> {
        self.preferences.set_sort_order(sort_order)?;
        self.filter.sort_order = sort_order;
        Ok(())
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> Result<(), InfraError> {
        self.preferences.set_view_mode(view_mode)?;
        self.filter.view_mode = view_mode;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<ThemeMode, InfraError> {
        self.preferences.toggle_theme()
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<(), InfraError> {
        self.preferences.set_theme(theme)
    }

    /// Clear search and author and restore the default sort; view mode is kept.
    pub fn reset_filters(&mut self) -> Result<(), InfraError> {
        self.preferences.set_sort_order(SortOrder::default())?;
        self.filter.reset();
        Ok(())
    }
}
