//! Independent planning for many agents against one reservation table.
//!
//! The table is only read here, so every request sees the same reservation
//! state; nothing planned in a batch is committed.  Callers commit the
//! results (or feed them to a [`SoftPathTable`](crate::SoftPathTable) as
//! soft constraints) afterwards.

use sipp_map::Graph;
use sipp_table::SafeIntervalTable;

use crate::{ConflictOracle, SearchConfig, SearchOutcome, SearchRequest, SearchResult, SippSearch};

/// Plan every request against `table`.  Results are in request order.
///
/// With the `parallel` Cargo feature the searches run on Rayon's thread
/// pool, one [`SippSearch`] (and node pool) per worker.  Each search seeds its
/// tie-break stream from `config.seed` and its agent, so results do not
/// depend on scheduling.
pub fn plan_independent<G: Graph, O: ConflictOracle + ?Sized>(
    graph:    &G,
    table:    &SafeIntervalTable,
    config:   &SearchConfig,
    requests: &[SearchRequest<'_>],
    oracle:   &O,
) -> SearchResult<Vec<SearchResult<SearchOutcome>>> {
    tracing::debug!(requests = requests.len(), "planning independent batch");

    #[cfg(not(feature = "parallel"))]
    {
        let mut search = SippSearch::new(graph, config.clone())?;
        Ok(requests.iter().map(|request| search.find_path(table, request, oracle)).collect())
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        use crate::SearchError;

        // Surface configuration errors once, before any worker starts.
        SippSearch::new(graph, config.clone())?;
        Ok(requests
            .par_iter()
            .map_init(
                || SippSearch::new(graph, config.clone()),
                |search, request| match search {
                    Ok(search) => search.find_path(table, request, oracle),
                    Err(e) => Err(SearchError::Config(e.to_string())),
                },
            )
            .collect())
    }
}
