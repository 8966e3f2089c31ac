//! Pipeline-run enumeration and billed activity collection.
//!
//! Runs are processed strictly one at a time; each pipeline-run page and each
//! run's activity query gets a freshly issued token. Only [`AuthError`] aborts
//! a scan, every other failure skips the affected page, run or record.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::billing::{billable_activity, candidate_id, ActivityRun};
use crate::azure::{
    AuthError, BearerToken, FactoryApi, FetchError, PipelineRun, TimeWindow, TokenSource,
};

/// Counters for one scan, logged when it finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub runs_seen: usize,
    pub runs_skipped: usize,
    pub candidates: usize,
    pub billable: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub activities: Vec<ActivityRun>,
    pub stats: ScanStats,
}

/// Lazy sequence of pipeline-run pages for one window.
///
/// Call [`RunPaginator::next`] until it yields `None`; [`RunPaginator::restart`]
/// rewinds to the first page.
pub struct RunPaginator<'a, A, T> {
    api: &'a A,
    tokens: &'a T,
    window: TimeWindow,
    continuation: Option<String>,
    seen_tokens: HashSet<String>,
    exhausted: bool,
    stats: ScanStats,
}

impl<'a, A: FactoryApi, T: TokenSource> RunPaginator<'a, A, T> {
    pub fn new(api: &'a A, tokens: &'a T, window: TimeWindow) -> Self {
        Self {
            api,
            tokens,
            window,
            continuation: None,
            seen_tokens: HashSet::new(),
            exhausted: false,
            stats: ScanStats::default(),
        }
    }

    pub fn restart(&mut self) {
        self.continuation = None;
        self.seen_tokens.clear();
        self.exhausted = false;
        self.stats = ScanStats::default();
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Next non-empty page of runs, `None` once the service stops returning
    /// a continuation token.
    pub async fn next(&mut self) -> Result<Option<Vec<PipelineRun>>, AuthError> {
        while !self.exhausted {
            let filter = self.window.filter(self.continuation.take());
            let token = self.tokens.token().await?;

            let page = match self.api.query_pipeline_runs(&token, &filter).await {
                Ok(page) => page,
                Err(err) => {
                    // no continuation token to resume from
                    warn!(error = %err, "Pipeline run query failed, ending pagination");
                    self.stats.pages_failed += 1;
                    self.exhausted = true;
                    return Ok(None);
                }
            };
            self.stats.pages_fetched += 1;

            match page.next_token() {
                Some(next) if !self.seen_tokens.insert(next.to_string()) => {
                    warn!(token = next, "Continuation token repeated, ending pagination");
                    self.exhausted = true;
                }
                Some(next) => self.continuation = Some(next.to_string()),
                None => self.exhausted = true,
            }

            match page.pipeline_runs() {
                Ok(runs) if runs.is_empty() => debug!("Empty pipeline run page"),
                Ok(runs) => return Ok(Some(runs)),
                Err(err) => {
                    warn!(error = %err, "Skipping malformed pipeline run page");
                    self.stats.pages_skipped += 1;
                }
            }
        }

        Ok(None)
    }
}

/// Raw activity-run candidates of one pipeline run, unfiltered.
pub struct ActivityFetcher<'a, A> {
    api: &'a A,
}

impl<'a, A: FactoryApi> ActivityFetcher<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Follows activity continuation tokens until the run is exhausted.
    /// Any failed page fails the whole batch.
    pub async fn fetch_activities(
        &self,
        run_id: &str,
        token: &BearerToken,
        window: &TimeWindow,
    ) -> Result<Vec<Value>, FetchError> {
        let mut candidates = Vec::new();
        let mut continuation = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let filter = window.filter(continuation.take());
            let page = self.api.query_activity_runs(token, run_id, &filter).await?;
            let next = page.next_token().map(str::to_string);

            match page.into_candidates() {
                Some(items) => candidates.extend(items),
                None => warn!(run_id, "Skipping malformed activity run page"),
            }

            match next {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    warn!(run_id, token = %next, "Activity continuation token repeated");
                    break;
                }
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        Ok(candidates)
    }
}

pub struct RunCollector<'a, A, T> {
    api: &'a A,
    tokens: &'a T,
}

impl<'a, A: FactoryApi, T: TokenSource> RunCollector<'a, A, T> {
    pub fn new(api: &'a A, tokens: &'a T) -> Self {
        Self { api, tokens }
    }

    pub fn runs(&self, window: TimeWindow) -> RunPaginator<'a, A, T> {
        RunPaginator::new(self.api, self.tokens, window)
    }

    /// Every pipeline run updated inside the window.
    pub async fn collect_runs(&self, window: TimeWindow) -> Result<Vec<PipelineRun>, AuthError> {
        let mut pages = self.runs(window);
        let mut runs = Vec::new();
        while let Some(page) = pages.next().await? {
            runs.extend(page);
        }
        Ok(runs)
    }

    /// Billed activity runs of every pipeline run inside the window.
    pub async fn collect_billable(&self, window: TimeWindow) -> Result<Collection, AuthError> {
        let fetcher = ActivityFetcher::new(self.api);
        let mut pages = self.runs(window);
        let mut activities = Vec::new();
        let mut stats = ScanStats::default();

        while let Some(runs) = pages.next().await? {
            for run in runs {
                stats.runs_seen += 1;
                info!(run_id = %run.run_id, pipeline = %run.pipeline_name, "Collecting activity runs");

                let token = self.tokens.token().await?;
                let candidates = match fetcher.fetch_activities(&run.run_id, &token, &window).await {
                    Ok(candidates) => candidates,
                    Err(err) => {
                        warn!(run_id = %run.run_id, error = %err, "Skipping activity runs of pipeline run");
                        stats.runs_skipped += 1;
                        continue;
                    }
                };

                for candidate in &candidates {
                    stats.candidates += 1;
                    match billable_activity(&run, candidate) {
                        Ok(Some(activity)) => {
                            stats.billable += 1;
                            activities.push(activity);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(
                                run_id = %run.run_id,
                                activity_run_id = candidate_id(candidate),
                                error = %err,
                                "Discarding activity run"
                            );
                            stats.malformed += 1;
                        }
                    }
                }
            }
        }

        let paging = pages.stats();
        stats.pages_fetched = paging.pages_fetched;
        stats.pages_skipped = paging.pages_skipped;
        stats.pages_failed = paging.pages_failed;

        info!(
            pages = stats.pages_fetched,
            runs = stats.runs_seen,
            runs_skipped = stats.runs_skipped,
            candidates = stats.candidates,
            billable = stats.billable,
            malformed = stats.malformed,
            "Scan finished"
        );

        Ok(Collection { activities, stats })
    }
}
