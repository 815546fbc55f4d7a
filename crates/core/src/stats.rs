use crate::interaction::InteractionEvent;
use crate::lead::Lead;
use crate::stage::Stage;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Named reporting windows, resolved against a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPreset {
    Today,
    /// Monday through Sunday of the reference week.
    ThisWeek,
    /// The reference day and the six days before it.
    Last7Days,
    ThisMonth,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Period {
    /// Bounds given in either order are swapped into place.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn preset(preset: PeriodPreset, today: NaiveDate) -> Self {
        match preset {
            PeriodPreset::Today => Self::new(today, today),
            PeriodPreset::ThisWeek => {
                let offset = u64::from(today.weekday().num_days_from_monday());
                let monday = today - Days::new(offset);
                Self::new(monday, monday + Days::new(6))
            }
            PeriodPreset::Last7Days => Self::new(today - Days::new(6), today),
            PeriodPreset::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                Self::new(first, last)
            }
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    pub fn contains_opt(&self, day: Option<NaiveDate>) -> bool {
        day.is_some_and(|day| self.contains(day))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(|day| *day <= self.to)
    }
}

/// Optional restrictions applied before counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub course: Option<String>,
    pub owner: Option<String>,
    pub stage: Option<Stage>,
}

impl ReportFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn matches(&self, lead: &Lead) -> bool {
        self.course.as_ref().is_none_or(|course| *course == lead.course)
            && self.owner.as_ref().is_none_or(|owner| *owner == lead.owner)
            && self.stage.is_none_or(|stage| stage == lead.stage)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseBreakdown {
    pub course: String,
    pub new_leads: u64,
    pub events: u64,
    pub won: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub new_leads: u64,
    pub events: u64,
    pub won: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelReport {
    pub period: Period,
    /// Every stage in funnel order, zero counts included.
    pub stage_counts: Vec<(Stage, u64)>,
    pub new_leads: u64,
    pub won_in_period: u64,
    pub events_in_period: u64,
    /// `won_in_period / new_leads`, zero when there are no new leads.
    pub conversion_ratio: f64,
    /// Sorted by course name.
    pub by_course: Vec<CourseBreakdown>,
    pub daily: Vec<DailyPoint>,
}

impl FunnelReport {
    pub fn conversion_percent(&self) -> f64 {
        self.conversion_ratio * 100.0
    }
}

/// Count leads and log events for one period.
///
/// Leads are new when registered within the period, and won when they sit in
/// `Won` with a stage-entry date inside it. Events are matched to their lead
/// for course attribution; when a filter is active, events whose lead is
/// missing or filtered out are not counted.
pub fn build_report(
    leads: &[Lead],
    events: &[InteractionEvent],
    period: Period,
    filter: &ReportFilter,
) -> FunnelReport {
    let scoped: Vec<&Lead> = leads.iter().filter(|lead| filter.matches(lead)).collect();
    let by_id: HashMap<&str, &Lead> = leads.iter().map(|lead| (lead.id.as_str(), lead)).collect();

    let mut stage_counts: Vec<(Stage, u64)> = Stage::ALL.iter().map(|stage| (*stage, 0)).collect();
    for lead in &scoped {
        if let Some(slot) = stage_counts.iter_mut().find(|(stage, _)| *stage == lead.stage) {
            slot.1 += 1;
        }
    }

    let new_leads: Vec<&Lead> = scoped
        .iter()
        .copied()
        .filter(|lead| period.contains_opt(lead.registered_on))
        .collect();
    let won: Vec<&Lead> = scoped
        .iter()
        .copied()
        .filter(|lead| lead.stage == Stage::Won && period.contains_opt(lead.stage_entered_on))
        .collect();
    let period_events: Vec<(&InteractionEvent, Option<&Lead>)> = events
        .iter()
        .filter(|event| period.contains_opt(event.date))
        .map(|event| (event, by_id.get(event.lead_id.as_str()).copied()))
        .filter(|(_, lead)| filter.is_empty() || lead.is_some_and(|lead| filter.matches(lead)))
        .collect();

    let mut courses: BTreeMap<String, CourseBreakdown> = BTreeMap::new();
    for lead in &new_leads {
        course_entry(&mut courses, &lead.course).new_leads += 1;
    }
    for (_, lead) in &period_events {
        course_entry(&mut courses, lead.map_or("", |lead| lead.course.as_str())).events += 1;
    }
    for lead in &won {
        course_entry(&mut courses, &lead.course).won += 1;
    }

    let daily = period
        .days()
        .map(|day| DailyPoint {
            date: day,
            new_leads: count(new_leads.iter().filter(|lead| lead.registered_on == Some(day))),
            events: count(period_events.iter().filter(|(event, _)| event.date == Some(day))),
            won: count(won.iter().filter(|lead| lead.stage_entered_on == Some(day))),
        })
        .collect();

    let new_count = new_leads.len() as u64;
    let won_count = won.len() as u64;
    let conversion_ratio = if new_count == 0 {
        0.0
    } else {
        won_count as f64 / new_count as f64
    };

    FunnelReport {
        period,
        stage_counts,
        new_leads: new_count,
        won_in_period: won_count,
        events_in_period: period_events.len() as u64,
        conversion_ratio,
        by_course: courses.into_values().collect(),
        daily,
    }
}

fn course_entry<'a>(
    courses: &'a mut BTreeMap<String, CourseBreakdown>,
    course: &str,
) -> &'a mut CourseBreakdown {
    courses
        .entry(course.to_string())
        .or_insert_with(|| CourseBreakdown {
            course: course.to_string(),
            ..CourseBreakdown::default()
        })
}

fn count<I: Iterator>(iter: I) -> u64 {
    iter.count() as u64
}
