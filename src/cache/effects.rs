//! Cache synchronization after confirmed mutations.
//!
//! A confirmed mutation is turned into a list of [`CacheDelta`]s by [`plan`];
//! [`super::ResourceCache::apply`] executes them. Keeping the planning pure
//! lets the rules be tested without any network or cache instance.

use postdeck_api_types::Post;

use super::keys::ResourceKey;

/// A server-confirmed change to the posts resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEffect {
    Created(Post),
    Updated(Post),
    Deleted(u64),
}

impl MutationEffect {
    pub fn post_id(&self) -> u64 {
        match self {
            Self::Created(post) | Self::Updated(post) => post.id,
            Self::Deleted(id) => *id,
        }
    }
}

/// One cache operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDelta {
    /// Put the post at the front of the cached list, creating the list if none is cached.
    PrependToList(Post),
    /// Swap the list element with the same id; no-op without a cached list.
    ReplaceInList(Post),
    /// Drop the element with this id; no-op without a cached list.
    RemoveFromList(u64),
    /// Overwrite the single-post entry.
    WritePost(Post),
    Invalidate(ResourceKey),
    Remove(ResourceKey),
}

pub fn plan(effect: MutationEffect) -> Vec<CacheDelta> {
    match effect {
        MutationEffect::Created(post) => vec![
            CacheDelta::PrependToList(post),
            CacheDelta::Invalidate(ResourceKey::Posts),
        ],
        MutationEffect::Updated(post) => {
            let key = ResourceKey::Post(post.id);
            vec![
                CacheDelta::ReplaceInList(post.clone()),
                CacheDelta::WritePost(post),
                CacheDelta::Invalidate(ResourceKey::Posts),
                CacheDelta::Invalidate(key),
            ]
        }
        MutationEffect::Deleted(id) => vec![
            CacheDelta::RemoveFromList(id),
            CacheDelta::Remove(ResourceKey::Post(id)),
            CacheDelta::Invalidate(ResourceKey::Posts),
        ],
    }
}

/// Apply one list delta to a posts list. Returns `true` if the list changed.
pub(crate) fn patch_list(list: &mut Vec<Post>, delta: &CacheDelta) -> bool {
    match delta {
        CacheDelta::PrependToList(post) => {
            list.insert(0, post.clone());
            true
        }
        CacheDelta::ReplaceInList(post) => {
            let mut changed = false;
            for slot in list.iter_mut().filter(|p| p.id == post.id) {
                *slot = post.clone();
                changed = true;
            }
            changed
        }
        CacheDelta::RemoveFromList(id) => {
            let before = list.len();
            list.retain(|p| p.id != *id);
            list.len() != before
        }
        CacheDelta::WritePost(_) | CacheDelta::Invalidate(_) | CacheDelta::Remove(_) => false,
    }
}
