use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use super::{Store, StoreError, StoreResult};
use crate::auth::models::{Role, User, UserChanges};
use crate::comments::{Comment, NewComment};
use crate::events::{Event, EventListing, EventQuery, UpdateEventRequest};
use crate::favorites::Favorite;
use crate::venues::{UpdateVenueRequest, Venue, VenueSummary};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    venues: Vec<Venue>,
    events: Vec<Event>,
    comments: Vec<Comment>,
    favorites: Vec<Favorite>,
    dataset_updated: Option<DateTime<Utc>>,
    next_user_id: i32,
    next_comment_id: i32,
    next_favorite_id: i32,
}

impl Inner {
    fn venue_name(&self, venue_id: &str) -> Option<String> {
        self.venues
            .iter()
            .find(|v| v.id == venue_id)
            .map(|v| v.name.clone())
    }

    fn listing(&self, event: &Event) -> EventListing {
        EventListing::from_event(event.clone(), self.venue_name(&event.venue_id))
    }
}

/// In-process store with the same observable behavior as `PgStore`
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> StoreResult<User> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }
        let user = User {
            id: next_id(&mut inner.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut inner = self.lock();
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() < before)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        Ok(self.lock().users.iter().any(|u| u.role == Role::Admin))
    }

    async fn list_venues(&self) -> StoreResult<Vec<VenueSummary>> {
        let inner = self.lock();
        let mut venues: Vec<VenueSummary> = inner
            .venues
            .iter()
            .map(|v| VenueSummary {
                id: v.id.clone(),
                name: v.name.clone(),
                latitude: v.latitude,
                longitude: v.longitude,
                event_count: inner.events.iter().filter(|e| e.venue_id == v.id).count() as i64,
            })
            .collect();
        venues.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(venues)
    }

    async fn find_venue(&self, id: &str) -> StoreResult<Option<Venue>> {
        Ok(self.lock().venues.iter().find(|v| v.id == id).cloned())
    }

    async fn create_venue(&self, venue: &Venue) -> StoreResult<Venue> {
        let mut inner = self.lock();
        if inner.venues.iter().any(|v| v.id == venue.id) {
            return Err(StoreError::Conflict("Venue id already exists".to_string()));
        }
        inner.venues.push(venue.clone());
        Ok(venue.clone())
    }

    async fn update_venue(&self, id: &str, changes: &UpdateVenueRequest) -> StoreResult<Option<Venue>> {
        let mut inner = self.lock();
        let Some(venue) = inner.venues.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            venue.name = name.trim().to_string();
        }
        if let Some(latitude) = changes.latitude {
            venue.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            venue.longitude = longitude;
        }
        Ok(Some(venue.clone()))
    }

    async fn delete_venue(&self, id: &str) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.venues.len();
        inner.venues.retain(|v| v.id != id);
        Ok(inner.venues.len() < before)
    }

    async fn count_venues(&self) -> StoreResult<i64> {
        Ok(self.lock().venues.len() as i64)
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<(Vec<EventListing>, i64)> {
        let inner = self.lock();
        let mut matching: Vec<&Event> = inner.events.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|e| inner.listing(e))
            .collect();
        Ok((items, total))
    }

    async fn events_for_venue(&self, venue_id: &str) -> StoreResult<Vec<Event>> {
        let inner = self.lock();
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.venue_id == venue_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self.lock().events.iter().find(|e| e.id == id).cloned())
    }

    async fn random_events(&self, venue_id: Option<&str>, count: u32) -> StoreResult<Vec<EventListing>> {
        let inner = self.lock();
        let pool: Vec<&Event> = inner
            .events
            .iter()
            .filter(|e| venue_id.map_or(true, |id| e.venue_id == id))
            .collect();
        let picked = pool
            .choose_multiple(&mut rand::thread_rng(), count as usize)
            .map(|e| inner.listing(e))
            .collect();
        Ok(picked)
    }

    async fn create_event(&self, event: &Event) -> StoreResult<Event> {
        let mut inner = self.lock();
        if inner.events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::Conflict("Event id already exists".to_string()));
        }
        inner.events.push(event.clone());
        Ok(event.clone())
    }

    async fn update_event(&self, id: &str, changes: &UpdateEventRequest) -> StoreResult<Option<Event>> {
        let mut inner = self.lock();
        let Some(event) = inner.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            event.title = title.trim().to_string();
        }
        if let Some(venue_id) = &changes.venue_id {
            event.venue_id = venue_id.trim().to_string();
        }
        if let Some(date) = &changes.date {
            event.date = date.trim().to_string();
        }
        if let Some(description) = &changes.description {
            event.description = description.clone();
        }
        if let Some(presenter) = &changes.presenter {
            event.presenter = presenter.clone();
        }
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, id: &str) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        Ok(inner.events.len() < before)
    }

    async fn count_events(&self) -> StoreResult<i64> {
        Ok(self.lock().events.len() as i64)
    }

    async fn list_comments(&self, venue_id: &str) -> StoreResult<Vec<Comment>> {
        let inner = self.lock();
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.venue_id == venue_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut inner = self.lock();
        let stored = Comment {
            id: next_id(&mut inner.next_comment_id),
            venue_id: comment.venue_id,
            user_id: comment.user_id,
            username: comment.username,
            text: comment.text,
            created_at: Utc::now(),
        };
        inner.comments.push(stored.clone());
        Ok(stored)
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.comments.len();
        inner.comments.retain(|c| c.id != id);
        Ok(inner.comments.len() < before)
    }

    async fn list_favorites(&self, user_id: i32) -> StoreResult<Vec<Favorite>> {
        let inner = self.lock();
        let mut favorites: Vec<Favorite> = inner
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(favorites)
    }

    async fn create_favorite(&self, user_id: i32, venue_id: &str) -> StoreResult<Favorite> {
        let mut inner = self.lock();
        if inner
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.venue_id == venue_id)
        {
            return Err(StoreError::Conflict("Venue already in favorites".to_string()));
        }
        let favorite = Favorite {
            id: next_id(&mut inner.next_favorite_id),
            user_id,
            venue_id: venue_id.to_string(),
            created_at: Utc::now(),
        };
        inner.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn delete_favorite(&self, id: i32, owner: Option<i32>) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.favorites.len();
        inner
            .favorites
            .retain(|f| !(f.id == id && owner.map_or(true, |owner| f.user_id == owner)));
        Ok(inner.favorites.len() < before)
    }

    async fn replace_dataset(
        &self,
        venues: &[Venue],
        events: &[Event],
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.venues = venues.to_vec();
        inner.events = events.to_vec();
        inner.dataset_updated = Some(updated_at);
        Ok(())
    }

    async fn dataset_last_updated(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.lock().dataset_updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: &str, name: &str) -> Venue {
        Venue {
            id: id.to_string(),
            name: name.to_string(),
            latitude: 22.3,
            longitude: 114.2,
        }
    }

    fn event(id: &str, venue_id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            venue_id: venue_id.to_string(),
            date: "2025-11-01".to_string(),
            description: String::new(),
            presenter: String::new(),
        }
    }

    #[tokio::test]
    async fn test_venue_listing_counts_events() {
        let store = MemoryStore::new();
        store
            .replace_dataset(
                &[venue("b", "Beta Hall"), venue("a", "Alpha Hall")],
                &[event("1", "a"), event("2", "a"), event("3", "b")],
                Utc::now(),
            )
            .await
            .unwrap();

        let venues = store.list_venues().await.unwrap();
        assert_eq!(venues[0].name, "Alpha Hall");
        assert_eq!(venues[0].event_count, 2);
        assert_eq!(venues[1].event_count, 1);
    }

    #[tokio::test]
    async fn test_random_events_respects_count_and_venue() {
        let store = MemoryStore::new();
        let events: Vec<Event> = (0..6).map(|i| event(&i.to_string(), if i < 4 { "a" } else { "b" })).collect();
        store
            .replace_dataset(&[venue("a", "A"), venue("b", "B")], &events, Utc::now())
            .await
            .unwrap();

        assert_eq!(store.random_events(None, 3).await.unwrap().len(), 3);
        let from_b = store.random_events(Some("b"), 3).await.unwrap();
        assert_eq!(from_b.len(), 2);
        assert!(from_b.iter().all(|e| e.venue_id == "b"));
    }

    #[tokio::test]
    async fn test_delete_favorite_checks_owner() {
        let store = MemoryStore::new();
        let favorite = store.create_favorite(1, "a").await.unwrap();

        assert!(!store.delete_favorite(favorite.id, Some(2)).await.unwrap());
        assert!(store.delete_favorite(favorite.id, Some(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_favorite_conflicts() {
        let store = MemoryStore::new();
        store.create_favorite(1, "a").await.unwrap();
        assert!(matches!(
            store.create_favorite(1, "a").await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.create_favorite(2, "a").await.is_ok());
    }
}
