pub mod auth;
pub mod blueprints;
pub mod challenges;
pub mod check_ins;
pub mod entries;
pub mod goals;
pub mod health;
pub mod reflections;
pub mod stats;
