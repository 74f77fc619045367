mod link;

pub use link::{AnalyticsResponse, CreateLinkRequest, ErrorResponse, ShortLink, ShortenResponse};
