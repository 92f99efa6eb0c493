// HTTP handlers
// The user resource plus shared extractors and response envelopes.

pub mod extractors;
pub mod response;
pub mod users;

pub use users::user_routes;
