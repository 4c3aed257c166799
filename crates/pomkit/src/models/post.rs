//! JSONPlaceholder post.

use super::Resource;
use crate::schema::{Field, FieldType, Schema};
use serde::{Deserialize, Serialize};

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Post {
    /// Author
    pub user_id: u64,
    /// Identity
    pub id: u64,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
}

/// Input for create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePost {
    /// Author
    pub user_id: u64,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
}

impl CreatePost {
    /// Create an input
    pub fn new(user_id: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePost {
    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl UpdatePost {
    /// Change only the title
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl Post {
    /// Whether `input`'s fields equal this post's
    #[must_use]
    pub fn matches(&self, input: &CreatePost) -> bool {
        self.user_id == input.user_id && self.title == input.title && self.body == input.body
    }
}

impl Resource for Post {
    type Input = CreatePost;
    type Patch = UpdatePost;

    const COLLECTION: &'static str = "/posts";

    const SCHEMA: Schema = Schema::new(
        "Post",
        &[
            Field::required("userId", FieldType::Integer),
            Field::required("id", FieldType::Integer),
            Field::required("title", FieldType::String),
            Field::required("body", FieldType::String),
        ],
    );

    const INPUT_SCHEMA: Schema = Schema::new(
        "CreatePost",
        &[
            Field::required("userId", FieldType::Integer),
            Field::required("title", FieldType::String),
            Field::required("body", FieldType::String),
        ],
    );

    const PATCH_SCHEMA: Schema = Schema::new(
        "UpdatePost",
        &[
            Field::optional("userId", FieldType::Integer),
            Field::optional("title", FieldType::String),
            Field::optional("body", FieldType::String),
        ],
    );

    fn id(&self) -> u64 {
        self.id
    }
}
