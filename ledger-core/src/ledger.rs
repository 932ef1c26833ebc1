//! One user session: the task store, the dispatcher and the status
//! line shown to the user.
//!
//! `submit` borrows the session mutably for the whole round-trip, so local
//! toggles/removals cannot interleave with an in-flight command.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dispatcher::{DispatchState, Dispatcher};
use crate::error::SubmitError;
use crate::rank::RankProgress;
use crate::stats::LedgerStats;
use crate::store::TaskStore;
use crate::task::Task;

pub const INITIAL_MESSAGE: &str = "System initialized. Awaiting input.";

#[derive(Debug)]
pub struct Ledger {
    store: TaskStore,
    dispatcher: Dispatcher,
    system_message: String,
}

impl Ledger {
    pub fn new(store: TaskStore, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            dispatcher,
            system_message: INITIAL_MESSAGE.to_string(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    pub fn today(&self) -> NaiveDate {
        self.dispatcher.today()
    }

    pub fn rank_progress(&self) -> RankProgress {
        RankProgress::for_score(self.store.score())
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats::compute(self.store.tasks(), self.today())
    }

    pub fn toggle(&mut self, id: &str) -> Option<&Task> {
        self.store.toggle(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        self.store.remove(id)
    }

    /// Send `command` with the current list and apply the reply.
    ///
    /// On any failure the store is left as it was and the status line falls
    /// back to the generic severed-link message.
    pub async fn submit(&mut self, command: &str) -> Result<&str, SubmitError> {
        let today = self.today();
        self.submit_on(command, today).await
    }

    pub async fn submit_on(&mut self, command: &str, today: NaiveDate) -> Result<&str, SubmitError> {
        let reply = match self
            .dispatcher
            .execute_on(command, self.store.tasks(), today)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_unavailable() {
                    self.system_message = e.user_message().to_string();
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.replace_all(&reply.tasks) {
            warn!(error = %e, "discarding reply that failed validation");
            let err = SubmitError::from(e);
            self.system_message = err.user_message().to_string();
            return Err(err);
        }

        info!(score = self.store.score(), "command applied");
        self.system_message = reply.system_message;
        Ok(&self.system_message)
    }
}
