//! Units of search work.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Engine;

/// One `(engine, dork, page)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchTask {
    /// Engine to query.
    pub engine: Engine,
    /// The search terms.
    pub dork: String,
    /// Page number (0-indexed).
    pub page: u32,
}

impl SearchTask {
    pub fn new(engine: Engine, dork: impl Into<String>, page: u32) -> Self {
        Self {
            engine,
            dork: dork.into(),
            page,
        }
    }

    /// Expands every dork, engine and page into its own task.
    ///
    /// Tasks are ordered by dork, then engine, then page.
    pub fn cross_product(dorks: &[String], engines: &[Engine], pages: u32) -> Vec<SearchTask> {
        let mut tasks = Vec::with_capacity(dorks.len() * engines.len() * pages as usize);
        for dork in dorks {
            for engine in engines {
                for page in 0..pages {
                    tasks.push(SearchTask::new(*engine, dork.as_str(), page));
                }
            }
        }
        tasks
    }
}

impl fmt::Display for SearchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' page {}", self.engine, self.dork, self.page + 1)
    }
}
