//! Table-session synchronization core
//!
//! Keeps one piece of state — the per-table session (cart, request log,
//! lock flag, session epoch) — consistent across many independently
//! connected clients and an authoritative store reached over an
//! unreliable network.
//!
//! # Architecture
//!
//! ```text
//! SessionService (commands)
//!     ├─ optimistic apply ──▶ SessionCache (confirmed snapshot + overlay)
//!     ├─ persist ───────────▶ SessionStore (per-entity writes)
//!     │                          │
//!     │                          └─ change signals (broadcast, payload-free)
//!     └─ on failure: discard overlay + forced reload
//!
//! Reconciler (task)
//!     └─ change signals ──▶ debounce ──▶ full reload ──▶ SessionCache
//!                                        (epoch filter, archive suppression,
//!                                         overlay pruned by value)
//! ```
//!
//! Convergence is reload-after-notification; there is no consensus
//! protocol and brief windows of divergence between clients are expected.

pub mod archive;
pub mod cache;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod money;
pub mod reconcile;
pub mod seed;
pub mod store;

pub use cache::SessionCache;
pub use catalog::CatalogService;
pub use commands::SessionService;
pub use config::Config;
pub use reconcile::{reload, Reconciler};
pub use seed::{seed_default_menu, seed_default_tables};
pub use store::{ChangeSignal, Collection, MemoryStore, SessionStore};
