// Persistence port
// Handlers depend on `Arc<dyn Store>`; production uses Postgres, tests use memory

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::models::{Role, User, UserChanges};
use crate::comments::{Comment, NewComment};
use crate::events::{Event, EventListing, EventQuery, UpdateEventRequest};
use crate::favorites::Favorite;
use crate::venues::{UpdateVenueRequest, Venue, VenueSummary};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Name of the meta record stamped by every dataset import
pub const DATASET_META: &str = "dataset";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Every read and write the API performs
///
/// Writes are single statements except `replace_dataset`. Nothing cascades:
/// deleting a venue leaves its events, comments and favorites in place.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<Option<User>>;
    async fn delete_user(&self, id: i32) -> StoreResult<bool>;
    async fn admin_exists(&self) -> StoreResult<bool>;

    // venues
    /// Ordered by name, each with its event count
    async fn list_venues(&self) -> StoreResult<Vec<VenueSummary>>;
    async fn find_venue(&self, id: &str) -> StoreResult<Option<Venue>>;
    async fn create_venue(&self, venue: &Venue) -> StoreResult<Venue>;
    async fn update_venue(&self, id: &str, changes: &UpdateVenueRequest) -> StoreResult<Option<Venue>>;
    async fn delete_venue(&self, id: &str) -> StoreResult<bool>;
    async fn count_venues(&self) -> StoreResult<i64>;

    // events
    /// One page of matching events and the total number of matches
    async fn list_events(&self, query: &EventQuery) -> StoreResult<(Vec<EventListing>, i64)>;
    async fn events_for_venue(&self, venue_id: &str) -> StoreResult<Vec<Event>>;
    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>>;
    /// Up to `count` events sampled at random
    async fn random_events(&self, venue_id: Option<&str>, count: u32) -> StoreResult<Vec<EventListing>>;
    async fn create_event(&self, event: &Event) -> StoreResult<Event>;
    async fn update_event(&self, id: &str, changes: &UpdateEventRequest) -> StoreResult<Option<Event>>;
    async fn delete_event(&self, id: &str) -> StoreResult<bool>;
    async fn count_events(&self) -> StoreResult<i64>;

    // comments
    /// Newest first
    async fn list_comments(&self, venue_id: &str) -> StoreResult<Vec<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn delete_comment(&self, id: i32) -> StoreResult<bool>;

    // favorites
    /// Newest first
    async fn list_favorites(&self, user_id: i32) -> StoreResult<Vec<Favorite>>;
    /// Fails with `Conflict` when the user already bookmarked the venue
    async fn create_favorite(&self, user_id: i32, venue_id: &str) -> StoreResult<Favorite>;
    /// With `owner`, only deletes a favorite belonging to that user
    async fn delete_favorite(&self, id: i32, owner: Option<i32>) -> StoreResult<bool>;

    // dataset
    /// Replaces all venues and events and stamps the dataset meta record
    async fn replace_dataset(
        &self,
        venues: &[Venue],
        events: &[Event],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    async fn dataset_last_updated(&self) -> StoreResult<Option<DateTime<Utc>>>;
}
