//! TaskStore: ordered in-memory task list plus the displayed score.
//!
//! Score rules:
//! - `toggle` sets the score to the exact completed-credit sum.
//! - `replace_all` only ever raises it: `max(previous, new sum)`.
//! - `remove` leaves it alone.
//!
//! The asymmetry is a product rule, kept on purpose.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::ValidationError;
use crate::rank::{self, Rank};
use crate::task::{Task, TaskDraft};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    score: u64,
}

impl TaskStore {
    /// Build a store from already-validated tasks. The score starts at the
    /// completed sum.
    pub fn new(tasks: Vec<Task>) -> Self {
        let score = completed_credits(&tasks);
        Self { tasks, score }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The displayed aggregate.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Exact sum of credits over completed tasks right now.
    pub fn completed_credits(&self) -> u64 {
        completed_credits(&self.tasks)
    }

    pub fn rank(&self) -> &'static Rank {
        rank::rank_for(self.score)
    }

    /// Flip pending/completed. Unknown ids are a no-op.
    pub fn toggle(&mut self, id: &str) -> Option<&Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let next = self.tasks[idx].status.toggled();
        self.tasks[idx].status = next;
        self.score = self.completed_credits();
        debug!(id, status = next.as_str(), score = self.score, "task toggled");
        self.tasks.get(idx)
    }

    /// Delete by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(idx);
        debug!(id, "task removed");
        Some(removed)
    }

    /// Validate the whole batch, then swap it in. Any invalid draft rejects
    /// the batch and leaves the store untouched.
    pub fn replace_all(&mut self, drafts: &[TaskDraft]) -> Result<(), ValidationError> {
        let tasks = validate_batch(drafts)?;
        let fresh = completed_credits(&tasks);
        let previous = self.score;

        self.tasks = tasks;
        self.score = previous.max(fresh);

        info!(
            count = self.tasks.len(),
            completed_credits = fresh,
            score = self.score,
            "task list replaced"
        );
        Ok(())
    }
}

/// Validate every draft and check id uniqueness across the batch.
pub fn validate_batch(drafts: &[TaskDraft]) -> Result<Vec<Task>, ValidationError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(drafts.len());
    let mut out = Vec::with_capacity(drafts.len());

    for d in drafts {
        let t = d.validate()?;
        if !seen.insert(t.id.clone()) {
            return Err(ValidationError::DuplicateId { id: t.id });
        }
        out.push(t);
    }

    Ok(out)
}

pub fn completed_credits(tasks: &[Task]) -> u64 {
    tasks
        .iter()
        .filter(|t| t.is_completed())
        .map(|t| u64::from(t.credits))
        .sum()
}
