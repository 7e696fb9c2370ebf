//! Durable retry queue for failed score submissions.
//!
//! Mirrors its contents in a newline-delimited JSON log so pending scores
//! survive a process restart. Capacity is bounded; overflow evicts the entry
//! with the worst score and rewrites the log in full, since an interior
//! element may have been removed.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::queue::MAX_FAILED_QUEUE_SIZE;
use crate::error::Result;
use crate::submission::ScoreSubmission;

pub struct FailedQueue {
    path: PathBuf,
    entries: Vec<ScoreSubmission>,
}

impl FailedQueue {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// Rebuild the in-memory queue from the on-disk log.
    ///
    /// A missing file means an empty queue. Lines that fail to parse are
    /// skipped and logged rather than aborting the load.
    pub fn load_from_disk(&mut self) -> Result<()> {
        self.entries.clear();

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScoreSubmission>(&line) {
                Ok(submission) => self.entries.push(submission),
                Err(e) => warn!("Skipping corrupt queue entry at line {}: {}", idx + 1, e),
            }
        }

        debug!(
            "Loaded {} pending submission(s) from {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Append a failed submission to the queue and its log.
    ///
    /// The entry is kept in memory even when the disk write fails; callers
    /// log the returned error and move on (durability is best-effort).
    pub fn enqueue(&mut self, submission: ScoreSubmission) -> Result<()> {
        self.entries.push(submission.clone());

        if self.entries.len() > MAX_FAILED_QUEUE_SIZE {
            self.evict_worst();
            self.rewrite()
        } else {
            self.append_line(&submission)
        }
    }

    /// Next submission to retry.
    ///
    /// Retries pull from the tail of the sequence (most recently enqueued
    /// first). This mirrors the behavior scores have always had on the wire
    /// and is deliberate; do not swap it for head-first order.
    pub fn peek_next(&self) -> Option<&ScoreSubmission> {
        self.entries.last()
    }

    /// Remove the tail entry once a retry has resolved it.
    ///
    /// Disk truncation is lazy: the log is only rewritten on eviction, and
    /// deleted exactly when the queue drains empty.
    pub fn pop_next(&mut self) -> Option<ScoreSubmission> {
        let popped = self.entries.pop();
        if self.entries.is_empty() {
            self.delete_log();
        }
        popped
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the entry with the worst score (lowest score first; among equal
    /// scores the ordering key prefers the later timestamp). Works on a
    /// sorted copy so the surviving entries keep their insertion order.
    fn evict_worst(&mut self) {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(b.timestamp.total_cmp(&a.timestamp))
        });

        if let Some(worst) = ranked.first()
            && let Some(pos) = self.entries.iter().position(|s| s == worst)
        {
            let dropped = self.entries.remove(pos);
            warn!(
                "Retry queue over capacity; dropping submission with score {}",
                dropped.score
            );
        }
    }

    fn append_line(&self, submission: &ScoreSubmission) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(submission)?)?;
        file.flush()?;
        Ok(())
    }

    fn rewrite(&self) -> Result<()> {
        let mut buf = String::new();
        for entry in &self.entries {
            buf.push_str(&serde_json::to_string(entry)?);
            buf.push('\n');
        }
        fs::write(&self.path, buf)?;
        Ok(())
    }

    fn delete_log(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed drained queue log {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove queue log: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::TempDir;

    fn submission(score: f64, timestamp: f64) -> ScoreSubmission {
        ScoreSubmission::new("weekly", score, "", Map::new(), timestamp)
    }

    fn queue_in(dir: &TempDir) -> FailedQueue {
        FailedQueue::new(dir.path().join("pending.ndjson"))
    }

    #[test]
    fn test_enqueue_persists_one_line() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);

        queue.enqueue(submission(10.0, 100.0)).unwrap();

        let content = fs::read_to_string(queue.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: ScoreSubmission = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, submission(10.0, 100.0));
    }

    #[test]
    fn test_overflow_evicts_lowest_score_and_rewrites() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);

        for i in 0..21 {
            queue.enqueue(submission(i as f64, 100.0 + i as f64)).unwrap();
        }

        assert_eq!(queue.len(), MAX_FAILED_QUEUE_SIZE);
        assert!(queue.entries.iter().all(|s| s.score != 0.0));

        // Survivors keep insertion order, on disk as in memory.
        let content = fs::read_to_string(queue.path()).unwrap();
        let disk_scores: Vec<f64> = content
            .lines()
            .map(|l| serde_json::from_str::<ScoreSubmission>(l).unwrap().score)
            .collect();
        let mem_scores: Vec<f64> = queue.entries.iter().map(|s| s.score).collect();
        assert_eq!(disk_scores, mem_scores);
        assert_eq!(disk_scores, (1..21).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_eviction_tie_drops_later_timestamp() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);

        for i in 0..19 {
            queue.enqueue(submission(50.0, 1_000.0 + i as f64)).unwrap();
        }
        queue.enqueue(submission(1.0, 100.0)).unwrap();
        queue.enqueue(submission(1.0, 200.0)).unwrap();

        // Equal worst scores rank by timestamp descending, so the later
        // entry sits at the front of the sorted copy and is the one evicted.
        assert_eq!(queue.len(), MAX_FAILED_QUEUE_SIZE);
        let low_timestamps: Vec<f64> = queue
            .entries
            .iter()
            .filter(|s| s.score == 1.0)
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(low_timestamps, vec![100.0]);
    }

    #[test]
    fn test_reload_after_restart_preserves_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.ndjson");

        let mut queue = FailedQueue::new(&path);
        queue.enqueue(submission(5.0, 100.0)).unwrap();
        queue.enqueue(submission(7.0, 200.0)).unwrap();

        let mut reloaded = FailedQueue::new(&path);
        reloaded.load_from_disk().unwrap();

        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entries, queue.entries);
        // Tail-first retry order survives the restart.
        assert_eq!(reloaded.peek_next().unwrap().score, 7.0);
    }

    #[test]
    fn test_load_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.ndjson");

        let good = serde_json::to_string(&submission(5.0, 100.0)).unwrap();
        fs::write(&path, format!("{}\nnot json{{\n", good)).unwrap();

        let mut queue = FailedQueue::new(&path);
        queue.load_from_disk().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_next().unwrap().score, 5.0);
    }

    #[test]
    fn test_load_missing_file_is_empty_queue() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);
        queue.load_from_disk().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_retries_pull_from_tail() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);

        queue.enqueue(submission(1.0, 100.0)).unwrap();
        queue.enqueue(submission(2.0, 200.0)).unwrap();
        queue.enqueue(submission(3.0, 300.0)).unwrap();

        assert_eq!(queue.peek_next().unwrap().score, 3.0);
        assert_eq!(queue.pop_next().unwrap().score, 3.0);
        assert_eq!(queue.peek_next().unwrap().score, 2.0);
    }

    #[test]
    fn test_log_deleted_exactly_when_drained() {
        let dir = TempDir::new().unwrap();
        let mut queue = queue_in(&dir);

        queue.enqueue(submission(1.0, 100.0)).unwrap();
        queue.enqueue(submission(2.0, 200.0)).unwrap();

        queue.pop_next();
        assert!(queue.path().exists());

        queue.pop_next();
        assert!(queue.is_empty());
        assert!(!queue.path().exists());
    }
}
