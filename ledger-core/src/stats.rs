//! Aggregate views over a task list: completion, priority spread, credit
//! yield, deadlines.

use chrono::NaiveDate;
use serde::Serialize;

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub med: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedgerStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded percentage, 0 for an empty list.
    pub completion_rate: u8,
    pub by_priority: PriorityCounts,
    /// Credits across every task, completed or not.
    pub potential_credits: u64,
    pub earned_credits: u64,
    pub overdue: usize,
}

impl LedgerStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let mut s = LedgerStats {
            total: tasks.len(),
            ..Default::default()
        };

        for t in tasks {
            let credits = u64::from(t.credits);
            s.potential_credits += credits;
            if t.is_completed() {
                s.completed += 1;
                s.earned_credits += credits;
            }
            match t.priority {
                Priority::Low => s.by_priority.low += 1,
                Priority::Med => s.by_priority.med += 1,
                Priority::High => s.by_priority.high += 1,
            }
            if is_overdue(t, today) {
                s.overdue += 1;
            }
        }

        s.pending = s.total - s.completed;
        if s.total > 0 {
            s.completion_rate = ((s.completed as f64 / s.total as f64) * 100.0).round() as u8;
        }
        s
    }

    /// Share of potential credits already earned, 0..=100.
    pub fn yield_percent(&self) -> u8 {
        if self.potential_credits == 0 {
            return 0;
        }
        (self.earned_credits * 100 / self.potential_credits) as u8
    }
}

/// Pending and past its deadline.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.is_completed() && task.deadline.is_some_and(|d| d < today)
}

pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|t| t.deadline == Some(date)).collect()
}
