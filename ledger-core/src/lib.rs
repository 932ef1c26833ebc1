//! ledger-core: task model, store, rank ladder and command dispatch for Neon Ledger

pub mod dispatcher;
pub mod error;
pub mod interpreter;
pub mod ledger;
pub mod prompt;
pub mod rank;
pub mod reply;
pub mod stats;
pub mod store;
pub mod task;

pub use dispatcher::{DispatchState, Dispatcher};
pub use error::{DispatchError, SEVERED_MESSAGE, SubmitError, ValidationError};
pub use interpreter::{CommandInterpreter, CommandRequest};
pub use ledger::{INITIAL_MESSAGE, Ledger};
pub use rank::{RANKS, Rank, RankProgress, next_rank, rank_for};
pub use reply::{CommandReply, parse_reply};
pub use stats::{LedgerStats, PriorityCounts, is_overdue, tasks_due_on};
pub use store::TaskStore;
pub use task::{Priority, Task, TaskDraft, TaskStatus, seed_tasks};
