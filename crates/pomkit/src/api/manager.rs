//! Typed CRUD over one REST collection.
//!
//! Every entity a manager returns has passed [`Resource::SCHEMA`]; a
//! malformed response surfaces as [`PomError::Validation`] and never as a
//! value. Full-replacement input is checked against
//! [`Resource::INPUT_SCHEMA`] before any request is sent. Partial updates
//! are sent as given, without an input check.

use super::client::{ApiClient, RequestOptions};
use crate::models::{Post, Resource};
use crate::result::PomResult;
use serde_json::Value;
use std::marker::PhantomData;

/// CRUD manager for resource `R`.
#[derive(Debug, Clone)]
pub struct ResourceManager<R> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

/// Manager for JSONPlaceholder posts.
pub type PostManager = ResourceManager<Post>;

impl<R: Resource> ResourceManager<R> {
    /// Create a manager on top of `client`
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    /// Underlying client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    fn item_path(id: u64) -> String {
        format!("{}/{id}", R::COLLECTION)
    }

    /// Every entity in the collection.
    ///
    /// # Errors
    ///
    /// Status errors, or validation if any element is malformed.
    pub async fn list(&self) -> PomResult<Vec<R>> {
        self.list_with(RequestOptions::new()).await
    }

    /// Entities whose `field` equals `value` (query-parameter filter).
    ///
    /// # Errors
    ///
    /// Status errors, or validation if any element is malformed.
    pub async fn list_by_field(&self, field: &str, value: impl ToString) -> PomResult<Vec<R>> {
        self.list_with(RequestOptions::new().param(field, value))
            .await
    }

    async fn list_with(&self, options: RequestOptions) -> PomResult<Vec<R>> {
        let body = self
            .client
            .get(R::COLLECTION, options)
            .await?
            .error_for_status()?
            .json()?;
        R::SCHEMA.parse_list(body)
    }

    /// One entity by id.
    ///
    /// # Errors
    ///
    /// `HttpStatus` 404 for a missing id, validation for a malformed body.
    pub async fn get_by_id(&self, id: u64) -> PomResult<R> {
        let body = self
            .client
            .get(&Self::item_path(id), RequestOptions::new())
            .await?
            .error_for_status()?
            .json()?;
        R::SCHEMA.parse(body)
    }

    /// Create from typed input.
    ///
    /// # Errors
    ///
    /// See [`Self::create_json`].
    pub async fn create(&self, input: &R::Input) -> PomResult<R> {
        self.create_json(serde_json::to_value(input)?).await
    }

    /// Create from raw JSON. The input shape is checked before anything is
    /// sent.
    ///
    /// # Errors
    ///
    /// Validation of the input or the response, or status errors.
    pub async fn create_json(&self, input: Value) -> PomResult<R> {
        R::INPUT_SCHEMA.validate(&input)?;
        let body = self
            .client
            .post(R::COLLECTION, &input, RequestOptions::new())
            .await?
            .error_for_status()?
            .json()?;
        let created: R = R::SCHEMA.parse(body)?;
        tracing::info!(resource = R::COLLECTION, id = created.id(), "created");
        Ok(created)
    }

    /// Replace an entity from typed input.
    ///
    /// # Errors
    ///
    /// See [`Self::update_json`].
    pub async fn update(&self, id: u64, input: &R::Input) -> PomResult<R> {
        self.update_json(id, serde_json::to_value(input)?).await
    }

    /// Replace an entity from raw JSON, checked before sending.
    ///
    /// # Errors
    ///
    /// Validation of the input or the response, or status errors.
    pub async fn update_json(&self, id: u64, input: Value) -> PomResult<R> {
        R::INPUT_SCHEMA.validate(&input)?;
        let body = self
            .client
            .put(&Self::item_path(id), &input, RequestOptions::new())
            .await?
            .error_for_status()?
            .json()?;
        R::SCHEMA.parse(body)
    }

    /// Patch an entity from typed input.
    ///
    /// # Errors
    ///
    /// See [`Self::partial_update_json`].
    pub async fn partial_update(&self, id: u64, input: &R::Patch) -> PomResult<R> {
        self.partial_update_json(id, serde_json::to_value(input)?)
            .await
    }

    /// Patch an entity from raw JSON. The input is sent unchecked; only the
    /// response is validated.
    ///
    /// # Errors
    ///
    /// Validation of the response, or status errors.
    pub async fn partial_update_json(&self, id: u64, input: Value) -> PomResult<R> {
        let body = self
            .client
            .patch(&Self::item_path(id), &input, RequestOptions::new())
            .await?
            .error_for_status()?
            .json()?;
        R::SCHEMA.parse(body)
    }

    /// Delete an entity. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Status errors.
    pub async fn delete(&self, id: u64) -> PomResult<()> {
        let _ = self
            .client
            .delete(&Self::item_path(id), RequestOptions::new())
            .await?
            .error_for_status()?;
        tracing::info!(resource = R::COLLECTION, id, "deleted");
        Ok(())
    }
}

impl ResourceManager<Post> {
    /// Posts written by `user_id`
    ///
    /// # Errors
    ///
    /// Status errors, or validation if any element is malformed.
    pub async fn list_by_user_id(&self, user_id: u64) -> PomResult<Vec<Post>> {
        self.list_by_field("userId", user_id).await
    }
}
