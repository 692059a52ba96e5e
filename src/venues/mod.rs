// Venue module
// Venue listing with event counts and venue detail

pub mod handlers;
pub mod models;

pub use models::{
    CreateVenueRequest, UpdateVenueRequest, Venue, VenueDetailResponse, VenueSummary,
};
