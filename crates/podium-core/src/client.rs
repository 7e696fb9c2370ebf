//! Leaderboard client: score submission pipeline and listing queries.
//!
//! Submissions that fail transiently are journaled to the retry queue and
//! replayed by a single background drain task with exponential backoff.
//! Listing queries are stateless and report failures in the returned page
//! rather than unwinding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::account::AccountProvider;
use crate::config::{ClientConfig, limits, retry as retry_cfg};
use crate::error::{Error, Result};
use crate::network::{ApiRequest, ApiResponse, Method, Transport};
use crate::queue::FailedQueue;
use crate::record::{ScorePage, ScoresResponse};
use crate::retry::RetryState;
use crate::submission::ScoreSubmission;

/// Wall-clock source in unix seconds, injectable for tests.
pub type Clock = fn() -> f64;

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Options for [`LeaderboardClient::submit_guest_score`].
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub nickname: String,
    pub metadata: Map<String, Value>,
    /// Unix seconds; `0.0` means "now".
    pub timestamp: f64,
    /// Queue the submission for background retry on transient failure.
    pub auto_retry: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            metadata: Map::new(),
            timestamp: 0.0,
            auto_retry: true,
        }
    }
}

/// Paging and time-window filters shared by the listing endpoints.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub offset: i64,
    pub limit: i64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
            start_time: None,
            end_time: None,
        }
    }
}

pub struct LeaderboardClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    account: Arc<dyn AccountProvider>,
    clock: Clock,
    queue: Mutex<FailedQueue>,
    retry: Mutex<RetryState>,
    // Separate single-flight guards so a listing refresh cannot starve a
    // submission (or the other way round).
    submit_busy: AtomicBool,
    query_busy: AtomicBool,
}

impl LeaderboardClient {
    /// Build a client and recover any submissions journaled by a previous
    /// process. Call [`resume_pending`](Self::resume_pending) to restart
    /// their background retries.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        account: Arc<dyn AccountProvider>,
    ) -> Arc<Self> {
        Self::with_clock(config, transport, account, unix_now)
    }

    pub fn with_clock(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        account: Arc<dyn AccountProvider>,
        clock: Clock,
    ) -> Arc<Self> {
        let mut queue = FailedQueue::new(&config.queue_path);
        if let Err(e) = queue.load_from_disk() {
            warn!("Failed to load pending submissions: {}", e);
        }

        Arc::new(Self {
            config,
            transport,
            account,
            clock,
            queue: Mutex::new(queue),
            retry: Mutex::new(RetryState::new()),
            submit_busy: AtomicBool::new(false),
            query_busy: AtomicBool::new(false),
        })
    }

    /// Number of submissions waiting for retry.
    pub fn pending_retries(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Restart background retries for submissions recovered from disk.
    pub fn resume_pending(self: &Arc<Self>) {
        self.kick_if_idle();
    }

    /// Submit a score on behalf of the current (guest) player.
    ///
    /// Returns the outcome of this attempt only: a transiently failed
    /// submission may be queued for background retry, but the call still
    /// reports the failure.
    pub async fn submit_guest_score(
        self: &Arc<Self>,
        leaderboard_id: &str,
        score: f64,
        opts: SubmitOptions,
    ) -> Result<()> {
        if opts.nickname.chars().count() > limits::MAX_NICKNAME_LEN {
            // Retrying would fail identically, so this never reaches the queue.
            return Err(Error::InvalidInput(format!(
                "nickname exceeds {} characters",
                limits::MAX_NICKNAME_LEN
            )));
        }

        let timestamp = if opts.timestamp == 0.0 {
            (self.clock)()
        } else {
            opts.timestamp
        };
        let submission =
            ScoreSubmission::new(leaderboard_id, score, opts.nickname, opts.metadata, timestamp);

        if !self.account.is_logged_in() && !self.account.register_guest().await {
            warn!("Guest registration failed");
            if opts.auto_retry {
                self.enqueue_for_retry(submission);
            }
            return Err(Error::AuthFailure);
        }

        let result = self.post_submission(&submission).await;
        if let Err(e) = &result
            && e.is_retryable()
            && opts.auto_retry
        {
            self.enqueue_for_retry(submission);
        }
        result
    }

    /// Send one submission, holding the submission single-flight guard for
    /// the duration of the exchange.
    async fn post_submission(&self, submission: &ScoreSubmission) -> Result<()> {
        if self
            .submit_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }

        let result = self.dispatch_submission(submission).await;
        self.submit_busy.store(false, Ordering::Release);
        result
    }

    async fn dispatch_submission(&self, submission: &ScoreSubmission) -> Result<()> {
        let url = format!(
            "{}/leaderboards/{}/scores/post/",
            self.config.base_url, submission.leaderboard_id
        );
        let request = ApiRequest {
            method: Method::Post,
            url,
            query: Vec::new(),
            body: Some(submission.to_body()),
            bearer: self.account.token(),
        };

        let response = self.transport.send(request).await?;
        classify_post(&response)
    }

    fn enqueue_for_retry(self: &Arc<Self>, submission: ScoreSubmission) {
        {
            let mut queue = self.queue.lock().unwrap();
            if let Err(e) = queue.enqueue(submission) {
                // Best-effort durability: the entry stays in memory.
                warn!("Failed to persist queued submission: {}", e);
            }
            info!("Queued submission for retry ({} pending)", queue.len());
        }
        self.kick_if_idle();
    }

    /// Start the drain task unless one is already running.
    fn kick_if_idle(self: &Arc<Self>) {
        {
            let mut retry = self.retry.lock().unwrap();
            if retry.armed {
                return;
            }
            if self.queue.lock().unwrap().is_empty() {
                return;
            }
            retry.armed = true;
        }

        let client = Arc::clone(self);
        tokio::spawn(async move { client.drain_queue().await });
    }

    /// Background drain: one submission per pass, queue tail first, with
    /// exponential backoff between failed passes. The first pass runs
    /// immediately; successful passes continue at the initial delay rather
    /// than in a burst.
    async fn drain_queue(self: Arc<Self>) {
        loop {
            let next = self.queue.lock().unwrap().peek_next().cloned();
            let Some(submission) = next else {
                // An enqueue may have landed after the queue was observed
                // empty, with its kick seeing this task still armed; only
                // disarm once the re-check under the lock agrees.
                if self.try_disarm() {
                    debug!("Retry queue drained");
                    return;
                }
                continue;
            };

            match self.retry_submission(&submission).await {
                Ok(()) => {
                    let remaining = self.pop_resolved();
                    info!("Queued submission delivered ({} remaining)", remaining);
                    if remaining > 0 {
                        tokio::time::sleep(retry_cfg::INITIAL_BACKOFF).await;
                    }
                }
                Err(e) if e.is_retryable() || matches!(e, Error::Busy) => {
                    let delay = self.retry.lock().unwrap().backoff.next_delay();
                    warn!(
                        "Retry failed ({}), next attempt in {}s",
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    // Permanently rejected while queued; nothing left to do
                    // with it but drop it.
                    let remaining = self.pop_resolved();
                    warn!(
                        "Dropping permanently rejected submission ({}), {} remaining",
                        e, remaining
                    );
                    if remaining > 0 {
                        tokio::time::sleep(retry_cfg::INITIAL_BACKOFF).await;
                    }
                }
            }
        }
    }

    /// Disarm the drain task, unless a submission slipped in after the
    /// queue was observed empty. Takes the retry lock before re-checking
    /// the queue (the same order `kick_if_idle` uses), so a concurrent
    /// enqueue either sees the task armed or the task sees its entry.
    fn try_disarm(&self) -> bool {
        let mut retry = self.retry.lock().unwrap();
        if !self.queue.lock().unwrap().is_empty() {
            return false;
        }
        retry.armed = false;
        retry.backoff.reset();
        true
    }

    /// Pop the entry the drain task just resolved and reset backoff.
    fn pop_resolved(&self) -> usize {
        let remaining = {
            let mut queue = self.queue.lock().unwrap();
            queue.pop_next();
            queue.len()
        };
        self.retry.lock().unwrap().backoff.reset();
        remaining
    }

    /// Guest-post path used by the drain task: same login check as a
    /// foreground submission, but the caller owns requeueing.
    async fn retry_submission(&self, submission: &ScoreSubmission) -> Result<()> {
        if !self.account.is_logged_in() && !self.account.register_guest().await {
            return Err(Error::AuthFailure);
        }
        self.post_submission(submission).await
    }

    /// Fetch a page of scores for a leaderboard.
    pub async fn get_scores(&self, leaderboard_id: &str, opts: QueryOptions) -> ScorePage {
        self.fetch_page(leaderboard_id, "scores/", &opts).await
    }

    /// Fetch a page of the current player's scores.
    pub async fn get_player_scores(&self, leaderboard_id: &str, opts: QueryOptions) -> ScorePage {
        self.fetch_page(leaderboard_id, "scores/player/", &opts)
            .await
    }

    /// Fetch a page of scores with the current player's entry marked.
    pub async fn get_scores_with_player(
        &self,
        leaderboard_id: &str,
        opts: QueryOptions,
    ) -> ScorePage {
        self.fetch_page(leaderboard_id, "scores-with-player/", &opts)
            .await
    }

    /// Fetch the scores surrounding the current player. Requires a player
    /// session.
    pub async fn get_nearby_scores(
        &self,
        leaderboard_id: &str,
        nearby_count: i64,
        anchor: Option<&str>,
        opts: QueryOptions,
    ) -> ScorePage {
        if let Some(message) = validate_paging(&opts) {
            return ScorePage::failed(message);
        }
        if !(1..=limits::MAX_NEARBY_COUNT).contains(&nearby_count) {
            return ScorePage::failed(format!(
                "nearby_count must be between 1 and {}",
                limits::MAX_NEARBY_COUNT
            ));
        }
        if self.account.token().is_none() {
            return ScorePage::failed("nearby scores require a player session");
        }

        let mut query = vec![("nearby_count".to_string(), nearby_count.to_string())];
        if let Some(anchor) = anchor {
            query.push(("anchor".to_string(), anchor.to_string()));
        }
        push_time_window(&mut query, &opts);

        self.dispatch_query(leaderboard_id, "scores/nearby/", query)
            .await
    }

    async fn fetch_page(
        &self,
        leaderboard_id: &str,
        path: &str,
        opts: &QueryOptions,
    ) -> ScorePage {
        // Validation failures never produce network traffic.
        if let Some(message) = validate_paging(opts) {
            return ScorePage::failed(message);
        }

        let mut query = vec![
            ("offset".to_string(), opts.offset.to_string()),
            ("limit".to_string(), opts.limit.to_string()),
        ];
        push_time_window(&mut query, opts);

        self.dispatch_query(leaderboard_id, path, query).await
    }

    async fn dispatch_query(
        &self,
        leaderboard_id: &str,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ScorePage {
        if self
            .query_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return ScorePage::failed(Error::Busy.to_string());
        }

        let request = ApiRequest {
            method: Method::Get,
            url: format!(
                "{}/leaderboards/{}/{}",
                self.config.base_url, leaderboard_id, path
            ),
            query,
            body: None,
            bearer: self.account.token().or_else(|| {
                if self.config.service_token.is_empty() {
                    None
                } else {
                    Some(self.config.service_token.clone())
                }
            }),
        };

        let page = match self.transport.send(request).await {
            Ok(response) => parse_score_page(&response),
            Err(e) => ScorePage::failed(e.to_string()),
        };

        self.query_busy.store(false, Ordering::Release);
        page
    }
}

/// Paging validation shared by every listing query, nearby included (its
/// request omits the paging parameters, but bad values are still refused).
fn validate_paging(opts: &QueryOptions) -> Option<String> {
    if opts.offset < 0 {
        return Some("offset must be non-negative".to_string());
    }
    if !(1..=limits::MAX_PAGE_LIMIT).contains(&opts.limit) {
        return Some(format!(
            "limit must be between 1 and {}",
            limits::MAX_PAGE_LIMIT
        ));
    }
    None
}

/// Map a score-post response onto success / transient / permanent.
fn classify_post(response: &ApiResponse) -> Result<()> {
    match response.status {
        200..=299 => Ok(()),
        400..=499 => Err(Error::PermanentReject {
            status: response.status,
        }),
        status => Err(Error::TransientServer { status }),
    }
}

fn parse_score_page(response: &ApiResponse) -> ScorePage {
    if !response.is_success() {
        return ScorePage::failed(format!(
            "score listing failed (status {})",
            response.status
        ));
    }

    match serde_json::from_str::<ScoresResponse>(&response.body) {
        Ok(parsed) => ScorePage {
            has_more_scores: parsed.next_url.is_some_and(|url| !url.is_empty()),
            scores: parsed.scores,
            error: None,
        },
        Err(e) => ScorePage::failed(format!("failed to parse score listing: {}", e)),
    }
}

fn push_time_window(query: &mut Vec<(String, String)>, opts: &QueryOptions) {
    if let Some(start) = opts.start_time {
        query.push(("start_time".to_string(), start.to_string()));
    }
    if let Some(end) = opts.end_time {
        query.push(("end_time".to_string(), end.to_string()));
    }
}
