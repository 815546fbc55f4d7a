use crate::lead::{Lead, LeadPatch};
use crate::stage::Stage;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message kind logged for composed outreach messages.
pub const DEFAULT_MESSAGE_KIND: &str = "WhatsApp (compuesto)";

/// One logged outreach touch. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: String,
    /// May reference a lead that no longer exists.
    pub lead_id: String,
    /// `None` when the stored date is missing or unreadable.
    pub date: Option<NaiveDate>,
    pub time: NaiveTime,
    /// Stage of the lead at the time of the event.
    pub stage: Stage,
    pub next_action_on: Option<NaiveDate>,
    pub message_kind: String,
    pub message_status: String,
    pub channel: String,
    pub operator: String,
    pub notes: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl InteractionEvent {
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        self.date.map(|date| date.and_time(self.time))
    }
}

/// Input of the "record follow-up" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    /// New stage; `None` keeps the current one.
    pub stage: Option<Stage>,
    pub next_action_on: Option<NaiveDate>,
    pub next_action: String,
    pub channel: String,
    pub message_status: String,
    pub message_kind: String,
    pub operator: String,
    pub message: String,
    /// Calendar day being worked. When it equals `next_action_on`, the
    /// scheduled action is considered done and cleared from the lead.
    pub closes_action_on: Option<NaiveDate>,
}

impl FollowUp {
    pub fn new(operator: &str, message: &str) -> Self {
        Self {
            stage: None,
            next_action_on: None,
            next_action: String::new(),
            channel: "WhatsApp".to_string(),
            message_status: "Enviado".to_string(),
            message_kind: DEFAULT_MESSAGE_KIND.to_string(),
            operator: operator.to_string(),
            message: message.to_string(),
            closes_action_on: None,
        }
    }

    /// Log row for this follow-up against `lead`.
    pub fn to_event(&self, id: String, lead: &Lead, now: NaiveDateTime) -> InteractionEvent {
        InteractionEvent {
            id,
            lead_id: lead.id.clone(),
            date: Some(now.date()),
            time: now.time().with_nanosecond(0).unwrap_or(now.time()),
            stage: self.stage.unwrap_or(lead.stage),
            next_action_on: self.next_action_on,
            message_kind: self.message_kind.trim().to_string(),
            message_status: self.message_status.trim().to_string(),
            channel: self.channel.trim().to_string(),
            operator: self.operator.trim().to_string(),
            notes: self.message.trim().to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Lead changes paired with this follow-up: stage, next action,
    /// last-contact date, and the operator as owner when the lead has none.
    pub fn lead_patch(&self, lead: &Lead, now: NaiveDateTime) -> LeadPatch {
        let closes_scheduled =
            self.closes_action_on.is_some() && self.closes_action_on == self.next_action_on;
        let (next_action_on, next_action) = if closes_scheduled {
            (None, String::new())
        } else {
            (self.next_action_on, self.next_action.clone())
        };
        let operator = self.operator.trim();
        let owner = (!lead.has_owner() && !operator.is_empty()).then(|| operator.to_string());

        LeadPatch {
            stage: self.stage,
            next_action_on: Some(next_action_on),
            next_action: Some(next_action),
            last_contact_on: Some(Some(now.date())),
            owner,
            ..LeadPatch::default()
        }
    }
}

/// Events of one lead ordered by `(date, time)` ascending; undated events
/// come first and ties keep log order.
pub fn history_for<'a>(events: &'a [InteractionEvent], lead_id: &str) -> Vec<&'a InteractionEvent> {
    let mut history: Vec<&InteractionEvent> = events
        .iter()
        .filter(|event| event.lead_id == lead_id)
        .collect();
    history.sort_by_key(|event| event.occurred_at());
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn history_is_sorted_and_scoped() {
        let base = testing::now();
        let mut late = testing::event("1", "7", base + chrono::Duration::days(2));
        late.notes = "late".to_string();
        let mut early = testing::event("2", "7", base);
        early.notes = "early".to_string();
        let other = testing::event("3", "8", base);
        let events = vec![late, other, early];

        let history = history_for(&events, "7");
        let notes: Vec<&str> = history.iter().map(|e| e.notes.as_str()).collect();
        assert_eq!(notes, vec!["early", "late"]);
    }

    #[test]
    fn event_keeps_current_stage_when_none_requested() {
        let lead = testing::lead("4", "Ana");
        let follow_up = testing::follow_up("Nancy");
        let event = follow_up.to_event("1".to_string(), &lead, testing::now());
        assert_eq!(event.stage, lead.stage);
        assert_eq!(event.lead_id, "4");
        assert_eq!(event.message_kind, DEFAULT_MESSAGE_KIND);
    }

    #[test]
    fn closing_the_worked_day_clears_next_action() {
        let lead = testing::lead("4", "Ana");
        let day = testing::now().date();
        let mut follow_up = testing::follow_up("Nancy");
        follow_up.next_action_on = Some(day);
        follow_up.next_action = "llamar".to_string();
        follow_up.closes_action_on = Some(day);

        let patch = follow_up.lead_patch(&lead, testing::now());
        assert_eq!(patch.next_action_on, Some(None));
        assert_eq!(patch.next_action.as_deref(), Some(""));
        assert_eq!(patch.last_contact_on, Some(Some(day)));
    }

    #[test]
    fn operator_becomes_owner_only_for_unowned_leads() {
        let mut lead = testing::lead("4", "Ana");
        let follow_up = testing::follow_up("Nancy");
        assert_eq!(
            follow_up.lead_patch(&lead, testing::now()).owner.as_deref(),
            Some("Nancy")
        );

        lead.owner = "Favio".to_string();
        assert_eq!(follow_up.lead_patch(&lead, testing::now()).owner, None);
    }
}
