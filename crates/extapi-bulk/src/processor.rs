use serde_json::Value;
use tracing::{debug, info};

use extapi_gate::{AccessGate, AccessRequest};
use extapi_store::{Project, RecordStore, StoreError};
use extapi_types::{Permission, Principal};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::params::TimeEntryParams;
use crate::result::{BatchResult, ItemFailure, ItemOutcome};

/// Creates time entries one by one, recording a per-item outcome.
///
/// Items are independent: a failing item never stops or undoes the others,
/// and each successful item is persisted before the next one is looked at.
/// Only an empty or oversized batch is rejected as a whole.
pub struct BatchProcessor<'a> {
    store: &'a dyn RecordStore,
    config: &'a BatchConfig,
    gate: AccessGate,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(store: &'a dyn RecordStore, config: &'a BatchConfig) -> Self {
        Self {
            store,
            config,
            gate: AccessGate::project_permission(Permission::LogTime),
        }
    }

    /// Reject batches that cannot be processed at all.
    pub fn check_size(&self, len: usize) -> Result<(), BatchError> {
        if len == 0 {
            return Err(BatchError::Empty);
        }
        if len > self.config.max_items {
            return Err(BatchError::TooLarge {
                limit: self.config.max_items,
                given: len,
            });
        }
        Ok(())
    }

    pub fn process(
        &self,
        principal: &Principal,
        items: Vec<Value>,
    ) -> Result<BatchResult, BatchError> {
        self.check_size(items.len())?;

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let outcome = self.process_item(principal, index, item)?;
            match &outcome {
                Ok(entry) => debug!(index, id = %entry.id, "item created"),
                Err(failure) => debug!(index, errors = ?failure.errors, "item failed"),
            }
            outcomes.push(outcome);
        }

        let result = BatchResult::collect(outcomes);
        info!(
            user = %principal.login,
            total = result.summary.total,
            created = result.summary.created,
            failed = result.summary.failed,
            status = result.status().http_code(),
            "bulk time entry batch processed"
        );
        Ok(result)
    }

    fn process_item(
        &self,
        principal: &Principal,
        index: usize,
        item: Value,
    ) -> Result<ItemOutcome, BatchError> {
        let params: TimeEntryParams = match serde_json::from_value(item) {
            Ok(params) => params,
            Err(err) => {
                return Ok(Err(ItemFailure::validation(
                    index,
                    vec![format!("Invalid time entry: {err}")],
                )))
            }
        };

        let project = self.resolve_project(&params)?;
        let request = AccessRequest::on_project(principal, project.as_ref());
        let access = self.gate.evaluate(&request, self.store)?;
        let Some(project) = project.filter(|_| access.is_granted()) else {
            return Ok(Err(ItemFailure::permission(index)));
        };

        let draft = params.into_draft(principal.id, project.id);
        match self.store.create_time_entry(draft) {
            Ok(entry) => Ok(Ok(entry)),
            Err(StoreError::Invalid(errors)) => {
                Ok(Err(ItemFailure::validation(index, errors.into_messages())))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// The issue's project when an issue is given, the named project
    /// otherwise.
    fn resolve_project(&self, params: &TimeEntryParams) -> Result<Option<Project>, StoreError> {
        match (params.issue_id, params.project_id) {
            (Some(issue), _) => self.store.container_of_leaf(issue),
            (None, Some(project)) => self.store.find_container(project),
            (None, None) => Ok(None),
        }
    }
}
