mod admin;
mod auth;
mod client;
mod error;
mod events;
mod geo;
mod listing;
mod marketplace;
pub mod types;

pub use client::ApiResponse;
pub use client::Client;
pub use client::ClientOptions;
pub use client::DEFAULT_BASE_URL;
pub use client::RenewalPolicy;
pub use client::RequestOptions;
pub use error::ApiError;
pub use error::ErrorKind;
pub use error::Result;
pub use events::AuthEvent;
pub use geo::DEFAULT_GEOCODER_URL;
pub use geo::Geocoder;
pub use geo::MapTarget;
pub use geo::Place;
pub use listing::AddressFilter;
pub use listing::ListingFilter;
pub use listing::SortField;
pub use listing::SortOrder;
pub use listing::normalize_address;
pub use marketplace::ChatItem;
pub use marketplace::ChatReply;
pub use marketplace::upsert_review;

pub use estate_login::Role;
pub use estate_login::SessionStore;
pub use reqwest::Method;
pub use reqwest::StatusCode;
