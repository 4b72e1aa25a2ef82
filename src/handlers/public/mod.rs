// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition only. Everything else sits behind the JWT middleware.

pub mod identity;

pub use identity::{login, register};
