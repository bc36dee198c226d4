//! Ready-made services for the application's own endpoints.

pub mod auth;

pub use auth::AuthApi;
