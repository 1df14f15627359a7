//! `sipp-search` — focal safe-interval path planning for one agent at a time.
//!
//! # Episode
//!
//! ```text
//! coordinator                       SippSearch                 SafeIntervalTable
//!     │  find_path(table, request)      │                              │
//!     │ ──────────────────────────────▶ │  first_free_interval(start)  │
//!     │                                 │ ───────────────────────────▶ │
//!     │                                 │  loop: pop FOCAL,            │
//!     │                                 │   reachable_intervals(..)    │
//!     │                                 │ ───────────────────────────▶ │
//!     │  SearchOutcome { path, .. }     │                              │
//!     │ ◀────────────────────────────── │                              │
//!     │  insert_path / reserve_goal                                    │
//!     │ ─────────────────────────────────────────────────────────────▶ │
//! ```
//!
//! The search only ever borrows the table immutably; committing a plan is the
//! caller's job.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`config`]    | `SearchConfig`, `GoalPolicy`                               |
//! | [`sipp`]      | `SippSearch`, `SearchRequest`, `SearchOutcome`             |
//! | [`conflicts`] | `ConflictOracle`, `NoSoftConflicts`, `SoftPathTable`       |
//! | [`batch`]     | `plan_independent`                                         |
//! | [`stats`]     | `SearchStats`                                              |
//! | [`error`]     | `SearchError`, `SearchResult`                              |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | `plan_independent` runs on Rayon's thread pool.            |
//! | `serde`    | Serialize/deserialize `SearchConfig` and `SearchStats`.    |

pub mod batch;
pub mod config;
pub mod conflicts;
pub mod error;
pub(crate) mod lists;
pub mod sipp;
pub mod stats;


pub use batch::plan_independent;
pub use config::{GoalPolicy, SearchConfig};
pub use conflicts::{ConflictOracle, NoSoftConflicts, SoftPathTable};
pub use error::{SearchError, SearchResult};
pub use sipp::{SearchOutcome, SearchRequest, SippSearch};
pub use stats::SearchStats;
