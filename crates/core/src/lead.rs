use crate::age::parse_age;
use crate::scoring::lead_score;
use crate::stage::Stage;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default close probability assigned to freshly registered leads.
pub const DEFAULT_CLOSE_PROBABILITY: &str = "0.2";

/// One prospective customer tracked through the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Sequential identifier, never reused.
    pub id: String,
    /// `None` when the stored date is missing or unreadable.
    pub registered_on: Option<NaiveDate>,
    pub registered_at: NaiveTime,
    pub name: String,
    pub surname: String,
    pub gender: String,
    /// Age exactly as captured; see [`Lead::age_years`] for the parsed value.
    pub age: String,
    /// Mobile phone, digits only.
    pub mobile: String,
    pub landline: String,
    /// Email, trimmed and lower-cased.
    pub email: String,
    pub course: String,
    pub channel: String,
    pub stage: Stage,
    /// Legacy free-text funnel column, carried through untouched.
    pub legacy_stage: String,
    pub last_contact_on: Option<NaiveDate>,
    pub notes: String,
    pub owner: String,
    pub next_action_on: Option<NaiveDate>,
    pub next_action: String,
    pub close_probability: String,
    pub estimated_amount: String,
    pub loss_reason: String,
    /// Date of the most recent canonical stage change.
    pub stage_entered_on: Option<NaiveDate>,
    /// Derived from `age`.
    pub age_years: u32,
    /// Derived, always in `0..=100`.
    pub score: u8,
    /// Columns found in storage that this version does not know about.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Input of the "register lead" action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub name: String,
    pub surname: String,
    pub gender: String,
    pub age: String,
    pub mobile: String,
    pub landline: String,
    pub email: String,
    pub course: String,
    pub channel: String,
    pub stage: Stage,
    pub notes: String,
}

/// Partial update of a lead. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub mobile: Option<String>,
    pub landline: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub channel: Option<String>,
    pub stage: Option<Stage>,
    pub notes: Option<String>,
    pub owner: Option<String>,
    pub next_action_on: Option<Option<NaiveDate>>,
    pub next_action: Option<String>,
    pub last_contact_on: Option<Option<NaiveDate>>,
    pub close_probability: Option<String>,
    pub estimated_amount: Option<String>,
    pub loss_reason: Option<String>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Lead {
    /// Build a new lead from a draft. Contact fields are normalized, the
    /// stage-entry date is the registration date and derived fields are
    /// computed.
    pub fn register(id: String, draft: LeadDraft, owner: &str, now: NaiveDateTime) -> Self {
        let mut lead = Self {
            id,
            registered_on: Some(now.date()),
            registered_at: truncate_to_seconds(now.time()),
            name: draft.name.trim().to_string(),
            surname: draft.surname.trim().to_string(),
            gender: draft.gender.trim().to_string(),
            age: draft.age.trim().to_string(),
            mobile: normalize_phone(&draft.mobile),
            landline: normalize_phone(&draft.landline),
            email: normalize_email(&draft.email),
            course: draft.course.trim().to_string(),
            channel: draft.channel.trim().to_string(),
            stage: draft.stage,
            legacy_stage: String::new(),
            last_contact_on: None,
            notes: draft.notes.trim().to_string(),
            owner: owner.trim().to_string(),
            next_action_on: None,
            next_action: String::new(),
            close_probability: DEFAULT_CLOSE_PROBABILITY.to_string(),
            estimated_amount: String::new(),
            loss_reason: String::new(),
            stage_entered_on: Some(now.date()),
            age_years: 0,
            score: 0,
            extra: BTreeMap::new(),
        };
        lead.refresh_derived();
        lead
    }

    /// Apply a partial update, then recompute derived fields.
    ///
    /// The stage-entry date moves to `now` if and only if the canonical stage
    /// differs from the one held before the patch. Returns whether it did.
    pub fn apply(&mut self, patch: LeadPatch, now: NaiveDateTime) -> bool {
        let previous_stage = self.stage;

        let trimmed = |value: String| value.trim().to_string();
        if let Some(value) = patch.name {
            self.name = trimmed(value);
        }
        if let Some(value) = patch.surname {
            self.surname = trimmed(value);
        }
        if let Some(value) = patch.gender {
            self.gender = trimmed(value);
        }
        if let Some(value) = patch.age {
            self.age = trimmed(value);
        }
        if let Some(value) = patch.mobile {
            self.mobile = normalize_phone(&value);
        }
        if let Some(value) = patch.landline {
            self.landline = normalize_phone(&value);
        }
        if let Some(value) = patch.email {
            self.email = normalize_email(&value);
        }
        if let Some(value) = patch.course {
            self.course = trimmed(value);
        }
        if let Some(value) = patch.channel {
            self.channel = trimmed(value);
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(value) = patch.notes {
            self.notes = trimmed(value);
        }
        if let Some(value) = patch.owner {
            self.owner = trimmed(value);
        }
        if let Some(value) = patch.next_action_on {
            self.next_action_on = value;
        }
        if let Some(value) = patch.next_action {
            self.next_action = trimmed(value);
        }
        if let Some(value) = patch.last_contact_on {
            self.last_contact_on = value;
        }
        if let Some(value) = patch.close_probability {
            self.close_probability = trimmed(value);
        }
        if let Some(value) = patch.estimated_amount {
            self.estimated_amount = trimmed(value);
        }
        if let Some(value) = patch.loss_reason {
            self.loss_reason = trimmed(value);
        }

        let stage_changed = self.stage != previous_stage;
        if stage_changed {
            self.stage_entered_on = Some(now.date());
        }
        self.refresh_derived();
        stage_changed
    }

    /// Recompute parsed age and score from the current record state.
    pub fn refresh_derived(&mut self) {
        self.age_years = parse_age(&self.age, 0);
        self.score = lead_score(self);
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }

    /// Mobile if present, landline otherwise.
    pub fn contact_phone(&self) -> &str {
        if self.mobile.is_empty() {
            &self.landline
        } else {
            &self.mobile
        }
    }

    /// Picker label: `"<name> <surname> • <gender> • <phone>"`, omitting empty tags.
    pub fn label(&self) -> String {
        let mut label = self.full_name();
        if !self.gender.trim().is_empty() {
            label.push_str(" • ");
            label.push_str(self.gender.trim());
        }
        let phone = self.contact_phone();
        if !phone.is_empty() {
            label.push_str(" • ");
            label.push_str(phone);
        }
        label
    }

    pub fn has_owner(&self) -> bool {
        !self.owner.trim().is_empty()
    }
}

/// Strip everything that is not an ASCII digit.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Numeric value of an identifier: the trailing run of ASCII digits.
pub fn numeric_suffix(id: &str) -> Option<u64> {
    let id = id.trim();
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    id[digits_start..].parse().ok()
}

/// Highest numeric identifier plus one; `1` when none is parseable.
///
/// When the highest identifier is `u64::MAX` the lowest unused positive
/// value is returned instead, so an identifier is never handed out twice.
pub fn next_sequential_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> u64 {
    let used: BTreeSet<u64> = ids.into_iter().filter_map(numeric_suffix).collect();
    match used.last() {
        None => 1,
        Some(max) => max.checked_add(1).unwrap_or_else(|| lowest_unused(&used)),
    }
}

fn lowest_unused(used: &BTreeSet<u64>) -> u64 {
    let mut candidate = 1;
    for id in used {
        if *id == candidate {
            candidate += 1;
        } else if *id > candidate {
            break;
        }
    }
    candidate
}

fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    time.with_nanosecond(0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn register_normalizes_contact_fields() {
        let draft = LeadDraft {
            name: "  Ana ".to_string(),
            surname: "Pérez".to_string(),
            mobile: "55 1234 5678".to_string(),
            email: "  Ana@Example.COM ".to_string(),
            course: "Inglés".to_string(),
            channel: "Referido".to_string(),
            ..LeadDraft::default()
        };
        let lead = Lead::register("1".to_string(), draft, "Favio", testing::now());
        assert_eq!(lead.name, "Ana");
        assert_eq!(lead.mobile, "5512345678");
        assert_eq!(lead.email, "ana@example.com");
        assert_eq!(lead.stage, Stage::Awareness);
        assert_eq!(lead.stage_entered_on, Some(testing::now().date()));
        assert_eq!(lead.close_probability, "0.2");
        assert_eq!(lead.owner, "Favio");
    }

    #[test]
    fn stage_change_moves_stage_entry_date() {
        let mut lead = testing::lead("1", "Ana");
        let later = testing::now() + chrono::Duration::days(3);
        let changed = lead.apply(
            LeadPatch {
                stage: Some(Stage::Won),
                ..LeadPatch::default()
            },
            later,
        );
        assert!(changed);
        assert_eq!(lead.stage_entered_on, Some(later.date()));
    }

    #[test]
    fn other_edits_keep_stage_entry_date() {
        let mut lead = testing::lead("1", "Ana");
        let before = lead.stage_entered_on;
        let stage = lead.stage;
        let later = testing::now() + chrono::Duration::days(3);
        let changed = lead.apply(
            LeadPatch {
                notes: Some("llamar el lunes".to_string()),
                stage: Some(stage),
                ..LeadPatch::default()
            },
            later,
        );
        assert!(!changed);
        assert_eq!(lead.stage_entered_on, before);
        assert_eq!(lead.notes, "llamar el lunes");
    }

    #[test]
    fn apply_recomputes_score_and_age() {
        let mut lead = testing::lead("1", "Ana");
        lead.apply(
            LeadPatch {
                age: Some("30-40".to_string()),
                ..LeadPatch::default()
            },
            testing::now(),
        );
        assert_eq!(lead.age_years, 35);
        assert_eq!(lead.score, 10);
    }

    #[test]
    fn next_id_uses_numeric_suffix() {
        assert_eq!(next_sequential_id(Vec::<&str>::new()), 1);
        assert_eq!(next_sequential_id(["1", "7", "3"]), 8);
        assert_eq!(next_sequential_id(["L-0009", "L-0010"]), 11);
        assert_eq!(next_sequential_id(["abc", ""]), 1);
    }

    #[test]
    fn next_id_after_max_value_is_never_reused() {
        let max = u64::MAX.to_string();
        assert_eq!(next_sequential_id([max.as_str()]), 1);
        assert_eq!(next_sequential_id([max.as_str(), "1", "2", "4"]), 3);
    }

    #[test]
    fn label_skips_empty_tags() {
        let mut lead = testing::lead("1", "Ana");
        lead.surname = "Pérez".to_string();
        lead.mobile = "5512345678".to_string();
        assert_eq!(lead.label(), "Ana Pérez • 5512345678");
        lead.gender = "Mujer".to_string();
        assert_eq!(lead.label(), "Ana Pérez • Mujer • 5512345678");
    }
}
