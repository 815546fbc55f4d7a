use crate::{FollowUp, InteractionEvent, Lead, LeadDraft, Stage};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Fixed clock for tests: 2026-10-16 10:30:00.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .and_then(|d| d.and_hms_opt(10, 30, 0))
        .expect("valid fixture timestamp")
}

/// Lead with every optional field empty and a zero score.
pub fn blank_lead() -> Lead {
    let at = now();
    Lead {
        id: String::new(),
        registered_on: Some(at.date()),
        registered_at: at.time(),
        name: String::new(),
        surname: String::new(),
        gender: String::new(),
        age: String::new(),
        mobile: String::new(),
        landline: String::new(),
        email: String::new(),
        course: String::new(),
        channel: String::new(),
        stage: Stage::Awareness,
        legacy_stage: String::new(),
        last_contact_on: None,
        notes: String::new(),
        owner: String::new(),
        next_action_on: None,
        next_action: String::new(),
        close_probability: String::new(),
        estimated_amount: String::new(),
        loss_reason: String::new(),
        stage_entered_on: None,
        age_years: 0,
        score: 0,
        extra: BTreeMap::new(),
    }
}

/// Valid unowned lead with a mobile number, acquired through a non-bonus channel.
pub fn lead(id: &str, name: &str) -> Lead {
    Lead::register(id.to_string(), draft(name), "", now())
}

pub fn draft(name: &str) -> LeadDraft {
    LeadDraft {
        name: name.to_string(),
        mobile: "5511112222".to_string(),
        course: "Inglés".to_string(),
        channel: "Otro".to_string(),
        ..LeadDraft::default()
    }
}

pub fn follow_up(operator: &str) -> FollowUp {
    FollowUp::new(operator, "Hola, ¿te comparto el temario?")
}

pub fn event(id: &str, lead_id: &str, at: NaiveDateTime) -> InteractionEvent {
    InteractionEvent {
        id: id.to_string(),
        lead_id: lead_id.to_string(),
        date: Some(at.date()),
        time: at.time(),
        stage: Stage::Contacted,
        next_action_on: None,
        message_kind: crate::interaction::DEFAULT_MESSAGE_KIND.to_string(),
        message_status: "Enviado".to_string(),
        channel: "WhatsApp".to_string(),
        operator: "Nancy".to_string(),
        notes: String::new(),
        extra: BTreeMap::new(),
    }
}
