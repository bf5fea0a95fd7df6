// Template lifecycle: validation, the in-memory registry, and its API
// handlers. Templates are authored by external tooling; everything here
// treats them as read-only data.

pub mod handlers;
pub mod store;
pub mod validation;
