// handlers/mod.rs - two tiers of pages
//
// Public (no session): sign-in, sign-out, health
// Dashboard (session required): everything under /dashboard, behind the page guard
pub mod dashboard;
pub mod public;
