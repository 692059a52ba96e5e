// Startup seeding: default accounts and the venue/event dataset

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::auth::{error::AuthError, models::Role, password::PasswordService};
use crate::events::Event;
use crate::store::{Store, StoreError};
use crate::venues::Venue;

pub const VENUES_FILE: &str = "venues_clean.json";
pub const EVENTS_FILE: &str = "events_clean.json";
pub const EXPECTED_VENUES: usize = 10;
pub const MIN_EVENTS_PER_VENUE: usize = 3;

/// Accounts created when no admin exists: (username, password, role)
const DEFAULT_USERS: [(&str, &str, Role); 2] = [
    ("admin", "admin123", Role::Admin),
    ("user1", "user123", Role::User),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {file}: {source}")]
    Json {
        file: &'static str,
        source: serde_json::Error,
    },
    #[error("invalid dataset: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to hash default password: {0}")]
    Password(#[from] AuthError),
}

/// Result of a dataset import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub venue_count: usize,
    pub event_count: usize,
    pub last_updated: DateTime<Utc>,
}

/// Ids appear as JSON strings or numbers in the preprocessed files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        }
    }

    fn number(&self) -> f64 {
        match self {
            Scalar::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            Scalar::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    id: Option<Scalar>,
    name: Option<String>,
    latitude: Option<Scalar>,
    longitude: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RawVenueRef {
    id: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_id: Option<Scalar>,
    id: Option<Scalar>,
    title: Option<String>,
    venue: Option<RawVenueRef>,
    venue_id: Option<Scalar>,
    venueid: Option<Scalar>,
    #[serde(default)]
    dates: Vec<String>,
    date: Option<String>,
    description: Option<String>,
    presenter: Option<String>,
}

/// Decodes the HTML entities found in the source feed and collapses whitespace
pub fn clean_text(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let decoded = raw
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    whitespace.replace_all(&decoded, " ").trim().to_string()
}

fn clean_opt(raw: Option<&str>) -> String {
    raw.map(clean_text).unwrap_or_default()
}

impl From<RawVenue> for Venue {
    fn from(raw: RawVenue) -> Self {
        Venue {
            id: raw.id.as_ref().map(Scalar::text).unwrap_or_default(),
            name: clean_opt(raw.name.as_deref()),
            latitude: raw.latitude.as_ref().map_or(f64::NAN, Scalar::number),
            longitude: raw.longitude.as_ref().map_or(f64::NAN, Scalar::number),
        }
    }
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        let id = raw
            .event_id
            .as_ref()
            .or(raw.id.as_ref())
            .map(Scalar::text)
            .unwrap_or_default();
        let venue_id = raw
            .venue
            .as_ref()
            .and_then(|venue| venue.id.as_ref())
            .or(raw.venue_id.as_ref())
            .or(raw.venueid.as_ref())
            .map(Scalar::text)
            .unwrap_or_default();
        let date = if raw.dates.is_empty() {
            raw.date.as_deref().map(str::trim).unwrap_or_default().to_string()
        } else {
            raw.dates
                .iter()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Event {
            id,
            title: clean_opt(raw.title.as_deref()),
            venue_id,
            date,
            description: clean_opt(raw.description.as_deref()),
            presenter: clean_opt(raw.presenter.as_deref()),
        }
    }
}

/// A cleaned and validated set of venues and events
#[derive(Debug, Clone)]
pub struct Dataset {
    pub venues: Vec<Venue>,
    pub events: Vec<Event>,
}

impl Dataset {
    /// Parses, cleans and validates the two dataset documents
    pub fn parse(venues_json: &str, events_json: &str) -> Result<Self, SeedError> {
        let raw_venues: Vec<RawVenue> = serde_json::from_str(venues_json)
            .map_err(|source| SeedError::Json { file: VENUES_FILE, source })?;
        let raw_events: Vec<RawEvent> = serde_json::from_str(events_json)
            .map_err(|source| SeedError::Json { file: EVENTS_FILE, source })?;

        let dataset = Dataset {
            venues: raw_venues.into_iter().map(Venue::from).collect(),
            events: raw_events.into_iter().map(Event::from).collect(),
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reads `venues_clean.json` and `events_clean.json` from `dir`
    pub async fn load(dir: &Path) -> Result<Self, SeedError> {
        let venues = read_file(&dir.join(VENUES_FILE)).await?;
        let events = read_file(&dir.join(EVENTS_FILE)).await?;
        Self::parse(&venues, &events)
    }

    /// Event count per venue id
    pub fn event_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for event in &self.events {
            *counts.entry(event.venue_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        if self.venues.len() != EXPECTED_VENUES {
            return Err(SeedError::Invalid(format!(
                "expected {} venues, got {}",
                EXPECTED_VENUES,
                self.venues.len()
            )));
        }

        let mut venue_ids = HashSet::new();
        for venue in &self.venues {
            if venue.id.is_empty() {
                return Err(SeedError::Invalid("venue missing id".to_string()));
            }
            if venue.name.is_empty() {
                return Err(SeedError::Invalid(format!("venue {} missing name", venue.id)));
            }
            if !venue.latitude.is_finite() || !venue.longitude.is_finite() {
                return Err(SeedError::Invalid(format!("venue {} has invalid coordinates", venue.id)));
            }
            if !venue_ids.insert(venue.id.as_str()) {
                return Err(SeedError::Invalid(format!("duplicate venue id {}", venue.id)));
            }
        }

        for event in &self.events {
            if event.id.is_empty() {
                return Err(SeedError::Invalid("event missing id".to_string()));
            }
            if event.title.is_empty() {
                return Err(SeedError::Invalid(format!("event {} missing title", event.id)));
            }
            if event.date.is_empty() {
                return Err(SeedError::Invalid(format!("event {} missing date", event.id)));
            }
            if !venue_ids.contains(event.venue_id.as_str()) {
                return Err(SeedError::Invalid(format!(
                    "event {} references unknown venue '{}'",
                    event.id, event.venue_id
                )));
            }
        }

        let counts = self.event_counts();
        for venue in &self.venues {
            let count = counts.get(venue.id.as_str()).copied().unwrap_or(0);
            if count < MIN_EVENTS_PER_VENUE {
                return Err(SeedError::Invalid(format!(
                    "venue {} has only {} events (fewer than {})",
                    venue.id, count, MIN_EVENTS_PER_VENUE
                )));
            }
        }

        Ok(())
    }
}

async fn read_file(path: &Path) -> Result<String, SeedError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates the default admin and user accounts when no admin exists
pub async fn seed_users_if_needed(
    store: &dyn Store,
    passwords: &PasswordService,
) -> Result<bool, SeedError> {
    if store.admin_exists().await? {
        info!("Admin account exists, skipping user seed");
        return Ok(false);
    }

    for (username, password, role) in DEFAULT_USERS {
        if store.find_user_by_username(username).await?.is_some() {
            debug!("Default user {} already exists", username);
            continue;
        }
        let hash = passwords.hash_password(password)?;
        store.create_user(username, &hash, role).await?;
    }

    info!("Seeded default users: admin, user1");
    Ok(true)
}

/// Replaces venues and events with the dataset in `dir`
pub async fn import_dataset(store: &dyn Store, dir: &Path) -> Result<ImportSummary, SeedError> {
    let dataset = Dataset::load(dir).await?;

    let counts = dataset.event_counts();
    for venue in &dataset.venues {
        debug!("{}: {} events", venue.name, counts.get(venue.id.as_str()).copied().unwrap_or(0));
    }

    let last_updated = Utc::now();
    store
        .replace_dataset(&dataset.venues, &dataset.events, last_updated)
        .await?;

    info!(
        "Imported {} venues and {} events, lastUpdated={}",
        dataset.venues.len(),
        dataset.events.len(),
        last_updated.to_rfc3339()
    );
    Ok(ImportSummary {
        venue_count: dataset.venues.len(),
        event_count: dataset.events.len(),
        last_updated,
    })
}

/// Imports the dataset only when the store holds no venues
pub async fn seed_dataset_if_needed(
    store: &dyn Store,
    dir: &Path,
) -> Result<Option<ImportSummary>, SeedError> {
    let venue_count = store.count_venues().await?;
    if venue_count > 0 {
        info!("Venues exist ({}), skipping dataset import", venue_count);
        return Ok(None);
    }

    info!("No venues found, importing dataset from {}", dir.display());
    import_dataset(store, dir).await.map(Some)
}
