// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer token, owner-scoped)
pub mod public;    // /, /health, /api/test/*
pub mod protected; // /api/expenses/*
