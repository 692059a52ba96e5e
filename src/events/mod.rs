// Event module
// Paginated listing, random picks and event detail

pub mod handlers;
pub mod models;
pub mod query;

pub use models::{
    CreateEventRequest, Event, EventDetailResponse, EventListing, EventPage,
    RandomEventsResponse, UpdateEventRequest,
};
pub use query::{EventQuery, EventQueryParams, EventSortField, QueryValidator, SortOrder};
