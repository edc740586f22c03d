//! Recent commits served from a [`Precacher`].
//!
//! The producer fetches one list per interval; callers ask for a prefix of it
//! without ever waiting on the upstream API.

use std::sync::Arc;
use std::time::SystemTime;

use crate::{
    config::PollerConfig,
    core::Precacher,
    error::{ConfigError, PollError},
    events::Bus,
    producers::Producer,
};

/// A repository a commit belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    /// `owner/name` slug.
    pub name: String,
    /// Public web link to the repository.
    pub url: String,
}

/// Author or committer of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Name as recorded in the commit.
    pub name: String,
    /// Email as recorded in the commit.
    pub email: String,
    /// When this person authored or applied the change, if reported.
    pub date: Option<SystemTime>,
}

/// A single commit, newest first when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Full object hash.
    pub sha: String,
    /// Who wrote the change.
    pub author: CommitAuthor,
    /// Who applied it, when different from the author.
    pub committer: Option<CommitAuthor>,
    /// Full commit message.
    pub message: String,
    /// Public web link to the commit.
    pub url: String,
    /// Repository the commit was pushed to.
    pub repo: Repo,
    /// Ordering key for "recent"; newest first.
    pub timestamp: SystemTime,
}

/// Precached list of recent commits.
pub struct RecentCommits {
    cache: Precacher<Vec<Commit>>,
}

impl RecentCommits {
    /// Wraps an existing precacher.
    pub fn new(cache: Precacher<Vec<Commit>>) -> Self {
        Self { cache }
    }

    /// Starts precaching `producer` with `cfg`, publishing to `bus`.
    pub fn spawn<P>(producer: Arc<P>, cfg: PollerConfig, bus: Bus) -> Result<Self, ConfigError>
    where
        P: Producer<Value = Vec<Commit>> + ?Sized,
    {
        let cache = Precacher::builder(producer).config(cfg).bus(bus).spawn()?;
        Ok(Self::new(cache))
    }

    /// Returns up to `limit` of the most recently fetched commits (all when `None`).
    ///
    /// Fails with the latest producer error even if an older list is cached, and
    /// with [`PollError::CacheEmpty`] before the first fetch completed.
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<Commit>, PollError> {
        let Some(all) = self.cache.get()? else {
            return Ok(Vec::new());
        };
        let n = limit.map_or(all.len(), |l| l.min(all.len()));
        Ok(all[..n].to_vec())
    }

    /// Returns the underlying cache.
    pub fn cache(&self) -> &Precacher<Vec<Commit>> {
        &self.cache
    }

    /// Stops refreshing; the last list keeps being served.
    pub fn stop(&self) {
        self.cache.stop();
    }
}
