// Data models and DTOs
// Persisted user accounts and their embedded addresses.

pub mod user;

pub use user::{Address, Avatar, NewUser, ProfileChanges, User};
