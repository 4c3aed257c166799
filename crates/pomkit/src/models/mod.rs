//! API entities and their shapes.

mod post;

pub use post::{CreatePost, Post, UpdatePost};

use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity served under one REST collection.
///
/// Each resource declares the shape of what the server returns and of what
/// may be sent for create/full-update, so both directions can be checked at
/// runtime.
pub trait Resource: DeserializeOwned + Serialize + Clone + std::fmt::Debug + Send + Sync {
    /// Full-replacement input (create and update)
    type Input: Serialize + Send + Sync;
    /// Partial input (patch)
    type Patch: Serialize + Send + Sync;

    /// Collection path, e.g. `/posts`
    const COLLECTION: &'static str;
    /// Shape of a stored entity
    const SCHEMA: Schema;
    /// Shape of [`Self::Input`]
    const INPUT_SCHEMA: Schema;
    /// Shape of [`Self::Patch`]
    const PATCH_SCHEMA: Schema;

    /// Identity
    fn id(&self) -> u64;
}
