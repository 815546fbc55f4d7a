//! Recording a follow-up: one log row plus the paired lead update.

use crate::Mutation;
use crate::error::StoreError;
use crate::interactions::InteractionLog;
use crate::leads::LeadStore;
use chrono::NaiveDateTime;
use leadflow_core::validate::validate_follow_up;
use leadflow_core::{Catalog, FollowUp, InteractionEvent, Lead};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFollowUp {
    pub event: InteractionEvent,
    pub lead: Lead,
}

/// Append the follow-up to the log, then update the lead's stage, next
/// action, last-contact date and (when unowned) owner.
///
/// The log is written first. If the lead vanishes between the two writes
/// the log row stays and `NotFound` is returned.
pub fn record_follow_up(
    leads: &LeadStore,
    log: &InteractionLog,
    lead_id: &str,
    follow_up: &FollowUp,
    catalog: &Catalog,
    now: NaiveDateTime,
) -> Result<Mutation<RecordedFollowUp>, StoreError> {
    if let Err(errors) = validate_follow_up(follow_up, catalog) {
        return Ok(Mutation::Rejected(errors));
    }

    let Some(lead) = leads
        .load()?
        .into_iter()
        .find(|lead| lead.id == lead_id)
    else {
        return Ok(Mutation::NotFound(lead_id.to_string()));
    };

    let event = log.append(follow_up.to_event(String::new(), &lead, now))?;
    let patch = follow_up.lead_patch(&lead, now);
    Ok(match leads.apply_unchecked(lead_id, patch, now)? {
        Mutation::Applied(lead) => Mutation::Applied(RecordedFollowUp { event, lead }),
        Mutation::NotFound(id) => {
            warn!(lead = %id, event = %event.id, "lead disappeared after logging follow-up");
            Mutation::NotFound(id)
        }
        Mutation::Rejected(errors) => Mutation::Rejected(errors),
    })
}
