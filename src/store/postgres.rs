use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Store, StoreError, StoreResult, DATASET_META};
use crate::auth::models::{Role, User, UserChanges};
use crate::comments::{Comment, NewComment};
use crate::events::query::SQLQueryBuilder;
use crate::events::{Event, EventListing, EventQuery, UpdateEventRequest};
use crate::favorites::Favorite;
use crate::venues::{UpdateVenueRequest, Venue, VenueSummary};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";
const EVENT_COLUMNS: &str = "id, title, venue_id, date, description, presenter";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from ./migrations
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Maps a unique-key violation to `Conflict`, anything else to `Database`
fn conflict_or_database(error: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Database(error)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "Username already taken"))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = COALESCE($2, role), password_hash = COALESCE($3, password_hash) \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.role.map(|role| role.as_str()))
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn list_venues(&self) -> StoreResult<Vec<VenueSummary>> {
        let venues = sqlx::query_as::<_, VenueSummary>(
            "SELECT v.id, v.name, v.latitude, v.longitude, COUNT(e.id) AS event_count \
             FROM venues v LEFT JOIN events e ON e.venue_id = v.id \
             GROUP BY v.id ORDER BY v.name, v.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(venues)
    }

    async fn find_venue(&self, id: &str) -> StoreResult<Option<Venue>> {
        let venue = sqlx::query_as::<_, Venue>(
            "SELECT id, name, latitude, longitude FROM venues WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(venue)
    }

    async fn create_venue(&self, venue: &Venue) -> StoreResult<Venue> {
        sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (id, name, latitude, longitude) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, latitude, longitude",
        )
        .bind(&venue.id)
        .bind(&venue.name)
        .bind(venue.latitude)
        .bind(venue.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "Venue id already exists"))
    }

    async fn update_venue(&self, id: &str, changes: &UpdateVenueRequest) -> StoreResult<Option<Venue>> {
        let venue = sqlx::query_as::<_, Venue>(
            "UPDATE venues SET name = COALESCE($2, name), latitude = COALESCE($3, latitude), \
             longitude = COALESCE($4, longitude) WHERE id = $1 \
             RETURNING id, name, latitude, longitude",
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.latitude)
        .bind(changes.longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(venue)
    }

    async fn delete_venue(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_venues(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<(Vec<EventListing>, i64)> {
        let (sql, count_sql, params) = SQLQueryBuilder::from_query(query).build();
        tracing::debug!("Event listing query: {} with params {:?}", sql, params);

        let mut page = sqlx::query_as::<_, EventListing>(&sql);
        for param in &params {
            page = page.bind(param);
        }
        let items = page.fetch_all(&self.pool).await?;

        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &params {
            count = count.bind(param);
        }
        let total = count.fetch_one(&self.pool).await?;

        Ok((items, total))
    }

    async fn events_for_venue(&self, venue_id: &str) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE venue_id = $1 ORDER BY date, id",
            EVENT_COLUMNS
        ))
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn random_events(&self, venue_id: Option<&str>, count: u32) -> StoreResult<Vec<EventListing>> {
        let events = sqlx::query_as::<_, EventListing>(
            "SELECT e.id, e.title, e.venue_id, e.date, e.description, e.presenter, \
             v.name AS venue_name FROM events e LEFT JOIN venues v ON v.id = e.venue_id \
             WHERE ($1::TEXT IS NULL OR e.venue_id = $1) ORDER BY random() LIMIT $2",
        )
        .bind(venue_id)
        .bind(i64::from(count))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn create_event(&self, event: &Event) -> StoreResult<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = EVENT_COLUMNS
        ))
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.venue_id)
        .bind(&event.date)
        .bind(&event.description)
        .bind(&event.presenter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "Event id already exists"))
    }

    async fn update_event(&self, id: &str, changes: &UpdateEventRequest) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET title = COALESCE($2, title), venue_id = COALESCE($3, venue_id), \
             date = COALESCE($4, date), description = COALESCE($5, description), \
             presenter = COALESCE($6, presenter) WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(changes.title.as_deref().map(str::trim))
        .bind(changes.venue_id.as_deref().map(str::trim))
        .bind(changes.date.as_deref().map(str::trim))
        .bind(changes.description.as_deref())
        .bind(changes.presenter.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete_event(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_events(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_comments(&self, venue_id: &str) -> StoreResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, venue_id, user_id, username, text, created_at FROM comments \
             WHERE venue_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (venue_id, user_id, username, text) VALUES ($1, $2, $3, $4) \
             RETURNING id, venue_id, user_id, username, text, created_at",
        )
        .bind(comment.venue_id)
        .bind(comment.user_id)
        .bind(comment.username)
        .bind(comment.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: i32) -> StoreResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, venue_id, created_at FROM favorites WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    async fn create_favorite(&self, user_id: i32, venue_id: &str) -> StoreResult<Favorite> {
        sqlx::query_as::<_, Favorite>(
            "INSERT INTO favorites (user_id, venue_id) VALUES ($1, $2) \
             RETURNING id, user_id, venue_id, created_at",
        )
        .bind(user_id)
        .bind(venue_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "Venue already in favorites"))
    }

    async fn delete_favorite(&self, id: i32, owner: Option<i32>) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM favorites WHERE id = $1 AND ($2::INTEGER IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_dataset(
        &self,
        venues: &[Venue],
        events: &[Event],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Dropped without commit on any error, which rolls back
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM events").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM venues").execute(&mut *tx).await?;

        for venue in venues {
            sqlx::query("INSERT INTO venues (id, name, latitude, longitude) VALUES ($1, $2, $3, $4)")
                .bind(&venue.id)
                .bind(&venue.name)
                .bind(venue.latitude)
                .bind(venue.longitude)
                .execute(&mut *tx)
                .await?;
        }

        for event in events {
            sqlx::query(&format!(
                "INSERT INTO events ({}) VALUES ($1, $2, $3, $4, $5, $6)",
                EVENT_COLUMNS
            ))
            .bind(&event.id)
            .bind(&event.title)
            .bind(&event.venue_id)
            .bind(&event.date)
            .bind(&event.description)
            .bind(&event.presenter)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO meta (name, last_updated) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET last_updated = EXCLUDED.last_updated",
        )
        .bind(DATASET_META)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn dataset_last_updated(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let last_updated: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT last_updated FROM meta WHERE name = $1")
                .bind(DATASET_META)
                .fetch_optional(&self.pool)
                .await?;

        Ok(last_updated)
    }
}

// Run against a real database when TEST_DATABASE_URL is set; skipped otherwise.
// Tests share one database and truncate it, so they take a process-wide lock.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSortField, SortOrder};
    use std::sync::OnceLock;
    use tokio::sync::{Mutex, MutexGuard};

    fn database_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    /// Helper that connects, migrates and empties the test database
    async fn create_test_store() -> Option<(PgStore, MutexGuard<'static, ()>)> {
        let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping Postgres store test");
            return None;
        };
        let guard = database_lock().lock().await;

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        let store = PgStore::new(pool);
        store.run_migrations().await.expect("Failed to run migrations");

        sqlx::query("TRUNCATE favorites, comments, events, venues, users, meta RESTART IDENTITY")
            .execute(&store.pool)
            .await
            .expect("Failed to clean test data");

        Some((store, guard))
    }

    fn venue(id: &str, name: &str) -> Venue {
        Venue {
            id: id.to_string(),
            name: name.to_string(),
            latitude: 22.3,
            longitude: 114.17,
        }
    }

    fn event(id: &str, title: &str, venue_id: &str, date: &str, presenter: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            venue_id: venue_id.to_string(),
            date: date.to_string(),
            description: String::new(),
            presenter: presenter.to_string(),
        }
    }

    async fn seed_listing(store: &PgStore) {
        let venues = [venue("v1", "Concert Hall"), venue("v2", "Town Hall")];
        let events = [
            event("e1", "apple", "v1", "2025-11-01", "LCSD"),
            event("e2", "Banana", "v1", "2025-11-02", "HK Phil"),
            event("e3", "banana", "v2", "2025-11-02", "HK Phil"),
            event("e4", "100% Jazz", "v2", "2025-11-03", "Jazz_Club"),
            event("e5", "100 Jazz Hits", "v2", "2025-11-04", "JazzXClub"),
        ];
        store
            .replace_dataset(&venues, &events, Utc::now())
            .await
            .expect("seed dataset");
    }

    fn ids(items: &[EventListing]) -> Vec<&str> {
        items.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_user_crud_and_conflict() {
        let Some((store, _guard)) = create_test_store().await else { return };

        let user = store.create_user("alice", "hash-1", Role::User).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert!(!store.admin_exists().await.unwrap());

        let duplicate = store.create_user("alice", "hash-2", Role::User).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(msg)) if msg == "Username already taken"));

        let promoted = store
            .update_user(
                user.id,
                UserChanges {
                    role: Some(Role::Admin),
                    password_hash: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(promoted.password_hash, "hash-1");
        assert!(store.admin_exists().await.unwrap());

        let rehashed = store
            .update_user(
                user.id,
                UserChanges {
                    role: None,
                    password_hash: Some("hash-3".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rehashed.role, Role::Admin);
        assert_eq!(rehashed.password_hash, "hash-3");

        assert!(store.update_user(9999, UserChanges::default()).await.unwrap().is_none());
        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.find_user_by_id(user.id).await.unwrap().is_none());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_venue_partial_update_and_counts() {
        let Some((store, _guard)) = create_test_store().await else { return };
        seed_listing(&store).await;

        let duplicate = store.create_venue(&venue("v1", "Again")).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(msg)) if msg == "Venue id already exists"));

        let changes = UpdateVenueRequest {
            name: Some("  Grand Hall ".to_string()),
            ..Default::default()
        };
        let updated = store.update_venue("v1", &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Grand Hall");
        assert_eq!(updated.latitude, 22.3);

        let venues = store.list_venues().await.unwrap();
        let counts: Vec<(&str, i64)> = venues.iter().map(|v| (v.id.as_str(), v.event_count)).collect();
        assert_eq!(counts, vec![("v1", 2), ("v2", 3)]);
    }

    #[tokio::test]
    async fn test_deleting_venue_keeps_events() {
        let Some((store, _guard)) = create_test_store().await else { return };
        seed_listing(&store).await;

        assert!(store.delete_venue("v1").await.unwrap());
        assert_eq!(store.count_venues().await.unwrap(), 1);
        assert_eq!(store.count_events().await.unwrap(), 5);

        let query = EventQuery {
            venue_id: Some("v1".to_string()),
            ..Default::default()
        };
        let (items, total) = store.list_events(&query).await.unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|e| e.venue_name.is_none()));
    }

    #[tokio::test]
    async fn test_listing_sorts_by_byte_order_with_id_tiebreak() {
        let Some((store, _guard)) = create_test_store().await else { return };
        seed_listing(&store).await;

        let by_title = EventQuery {
            sort_field: EventSortField::Title,
            ..Default::default()
        };
        let (items, total) = store.list_events(&by_title).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(ids(&items), vec!["e5", "e4", "e2", "e1", "e3"]);

        let by_date_desc = EventQuery {
            sort_field: EventSortField::Date,
            sort_order: SortOrder::Desc,
            limit: 2,
            offset: 1,
            ..Default::default()
        };
        let (items, total) = store.list_events(&by_date_desc).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(ids(&items), vec!["e4", "e2"]);
        assert_eq!(items[0].venue_name.as_deref(), Some("Town Hall"));
    }

    #[tokio::test]
    async fn test_listing_filters_escape_like_wildcards() {
        let Some((store, _guard)) = create_test_store().await else { return };
        seed_listing(&store).await;

        let percent = EventQuery {
            title: Some("100%".to_string()),
            ..Default::default()
        };
        let (items, _) = store.list_events(&percent).await.unwrap();
        assert_eq!(ids(&items), vec!["e4"]);

        let underscore = EventQuery {
            presenter: Some("jazz_club".to_string()),
            ..Default::default()
        };
        let (items, _) = store.list_events(&underscore).await.unwrap();
        assert_eq!(ids(&items), vec!["e4"]);

        let case_insensitive = EventQuery {
            title: Some("BANANA".to_string()),
            date_from: Some("2025-11-02".to_string()),
            date_to: Some("2025-11-02".to_string()),
            ..Default::default()
        };
        let (items, total) = store.list_events(&case_insensitive).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(ids(&items), vec!["e2", "e3"]);
    }

    #[tokio::test]
    async fn test_event_partial_update_and_random_pick() {
        let Some((store, _guard)) = create_test_store().await else { return };
        seed_listing(&store).await;

        let duplicate = store.create_event(&event("e1", "Copy", "v1", "2025-12-01", "")).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(msg)) if msg == "Event id already exists"));

        let changes = UpdateEventRequest {
            title: Some(" Apple Pie ".to_string()),
            ..Default::default()
        };
        let updated = store.update_event("e1", &changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "Apple Pie");
        assert_eq!(updated.venue_id, "v1");
        assert_eq!(updated.presenter, "LCSD");

        let picked = store.random_events(Some("v2"), 3).await.unwrap();
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|e| e.venue_id == "v2"));
        assert_eq!(store.random_events(None, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_comments_newest_first() {
        let Some((store, _guard)) = create_test_store().await else { return };

        for text in ["first", "second"] {
            store
                .create_comment(NewComment {
                    venue_id: "v1".to_string(),
                    user_id: 1,
                    username: "user1".to_string(),
                    text: text.to_string(),
                })
                .await
                .unwrap();
        }

        let comments = store.list_comments("v1").await.unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);

        assert!(store.delete_comment(comments[0].id).await.unwrap());
        assert!(!store.delete_comment(comments[0].id).await.unwrap());
    }

    #[tokio::test]
    async fn test_favorite_delete_is_owner_scoped() {
        let Some((store, _guard)) = create_test_store().await else { return };

        let favorite = store.create_favorite(1, "v1").await.unwrap();
        let duplicate = store.create_favorite(1, "v1").await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(msg)) if msg == "Venue already in favorites"));

        assert!(!store.delete_favorite(favorite.id, Some(2)).await.unwrap());
        assert_eq!(store.list_favorites(1).await.unwrap().len(), 1);

        assert!(store.delete_favorite(favorite.id, Some(1)).await.unwrap());

        let other = store.create_favorite(2, "v1").await.unwrap();
        assert!(store.delete_favorite(other.id, None).await.unwrap());
        assert!(store.list_favorites(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_dataset_is_atomic() {
        let Some((store, _guard)) = create_test_store().await else { return };
        assert!(store.dataset_last_updated().await.unwrap().is_none());
        seed_listing(&store).await;
        let stamped = store.dataset_last_updated().await.unwrap();
        assert!(stamped.is_some());

        let broken = [
            event("x1", "One", "v9", "2025-12-01", ""),
            event("x1", "Duplicate id", "v9", "2025-12-02", ""),
        ];
        let result = store
            .replace_dataset(&[venue("v9", "New Hall")], &broken, Utc::now())
            .await;
        assert!(result.is_err());

        assert_eq!(store.count_venues().await.unwrap(), 2);
        assert_eq!(store.count_events().await.unwrap(), 5);
        assert!(store.find_venue("v9").await.unwrap().is_none());
        assert_eq!(store.dataset_last_updated().await.unwrap(), stamped);
    }
}
