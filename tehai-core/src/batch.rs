//! Batch hand analysis with rayon parallelism.
//!
//! Runs independent analyses (waits, tenpai reports, discard tables) over
//! many hands on a dedicated rayon ThreadPool. Results keep input order.

use rayon::prelude::*;
use tracing::debug;

use tehai_engine::errors::EngineResult;
use tehai_engine::shanten::{waiting_tiles, WaitResult};
use tehai_engine::tile::Tile;
use tehai_engine::types::Hand;

use crate::analysis::{respond_tenpai, ApiResponse, TenpaiReport, TenpaiRequest};
use crate::discard::{analyze_discards, DiscardOption};

/// Parallel batch analyzer using a dedicated rayon ThreadPool.
pub struct BatchAnalyzer {
    pool: rayon::ThreadPool,
}

impl BatchAnalyzer {
    /// Create a new analyzer with the given thread count (None = num CPUs).
    pub fn new(num_threads: Option<usize>) -> anyhow::Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Waits of many 13-tile hands.
    pub fn waits(&self, hands: &[Vec<Tile>]) -> Vec<EngineResult<WaitResult>> {
        debug!(hands = hands.len(), "batch waits");
        self.pool
            .install(|| hands.par_iter().map(|h| waiting_tiles(h)).collect())
    }

    pub fn tenpai(&self, requests: &[TenpaiRequest]) -> Vec<ApiResponse<TenpaiReport>> {
        self.pool
            .install(|| requests.par_iter().map(respond_tenpai).collect())
    }

    pub fn discards(&self, hands: &[Hand]) -> Vec<EngineResult<Vec<DiscardOption>>> {
        self.pool
            .install(|| hands.par_iter().map(analyze_discards).collect())
    }
}

/// Convenience: batch waits on rayon's global thread pool.
pub fn waits_simple(hands: &[Vec<Tile>]) -> Vec<EngineResult<WaitResult>> {
    hands.par_iter().map(|h| waiting_tiles(h)).collect()
}
