// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (bearer token required)

pub mod public;    // /api, /health, /api/auth/*
pub mod protected; // /api/notes/*
