//! Vote context

use std::ops::Deref;

use crate::entity::EntityCache;
use crate::transport::Transport;
use crate::types::Vote;

/// Votes of the current polling. The collection is driven entirely by the
/// polling context.
#[derive(Clone)]
pub struct VoteContext {
    cache: EntityCache<Vote>,
}

impl VoteContext {
    pub fn new(transport: &Transport) -> Self {
        Self {
            cache: EntityCache::new(transport, "vote"),
        }
    }
}

impl Deref for VoteContext {
    type Target = EntityCache<Vote>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}
