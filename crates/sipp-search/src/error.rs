use sipp_core::{AgentId, CoreError, LocationId, Timestep};
use thiserror::Error;

/// Normal ways a single-agent search can end without a path.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{agent} cannot start at {location} at {timestep}: location is reserved")]
    StartBlocked {
        agent:    AgentId,
        location: LocationId,
        timestep: Timestep,
    },

    #[error("no path for {agent} from {start} to {goal}")]
    NoPath {
        agent: AgentId,
        start: LocationId,
        goal:  LocationId,
    },

    #[error("history of length {len} cannot be spliced at {start_time}")]
    HistoryTooShort { len: usize, start_time: Timestep },

    #[error("search configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SearchResult<T> = Result<T, SearchError>;
