//! Scheduler core for the neomind productivity app.
//!
//! - `store` is the boundary to the event store (with an in-process,
//!   file-backed `LocalStore`)
//! - `cache` holds the live mirror of a user's events
//! - `filter` projects the cache through search and category filters
//! - `surface` tracks the calendar grid and turns gestures into records
//! - `pipeline` is the single write path
//! - `scheduler` wires them together for one signed-in user
//! - `ai` and `review` back the weekly review and note/goal helpers

pub mod ai;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod review;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod surface;

pub use cache::{CacheStatus, EventCache, ListenerGuard};
pub use config::NeomindConfig;
pub use error::{NeoError, NeoResult};
pub use event::{CalendarEvent, Category, EventFields, EventId, EventPatch};
pub use filter::{CategoryFilter, EventFilter, FilterView};
pub use pipeline::{MutationOutcome, MutationPipeline};
pub use scheduler::Scheduler;
pub use session::{AppContext, Session, Theme, UserId};
pub use store::{EventStore, LocalStore, Snapshot, Subscription};
