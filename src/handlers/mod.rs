// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (JWT auth)

pub mod protected; // JWT authentication required
pub mod public; // Token acquisition
