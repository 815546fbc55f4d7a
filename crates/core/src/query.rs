use crate::lead::Lead;
use crate::stage::Stage;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Lead table filter. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    /// Case-insensitive substring over name, surname, gender, email and phones.
    pub search: Option<String>,
    pub stages: Vec<Stage>,
    pub courses: Vec<String>,
    pub owners: Vec<String>,
    pub genders: Vec<String>,
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        matches_search(lead, self.search.as_deref())
            && (self.stages.is_empty() || self.stages.contains(&lead.stage))
            && (self.courses.is_empty() || self.courses.iter().any(|c| *c == lead.course))
            && (self.owners.is_empty() || self.owners.iter().any(|o| *o == lead.owner))
            && (self.genders.is_empty() || self.genders.iter().any(|g| *g == lead.gender))
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

fn matches_search(lead: &Lead, search: Option<&str>) -> bool {
    let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    let haystack = [
        lead.name.as_str(),
        lead.surname.as_str(),
        lead.gender.as_str(),
        lead.email.as_str(),
        lead.mobile.as_str(),
        lead.landline.as_str(),
    ]
    .join(" ")
    .to_lowercase();
    haystack.contains(&needle)
}

/// Position of a page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based, clamped to the last page.
    pub index: usize,
    pub size: usize,
    pub total_items: usize,
    /// Never less than one.
    pub total_pages: usize,
}

/// Slice `items` into the requested page, clamping out-of-range indexes.
pub fn paginate<T>(items: &[T], size: usize, index: usize) -> (Page, &[T]) {
    let size = size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(size).max(1);
    let index = index.min(total_pages - 1);
    let start = (index * size).min(total_items);
    let end = (start + size).min(total_items);
    (
        Page {
            index,
            size,
            total_items,
            total_pages,
        },
        &items[start..end],
    )
}

/// Leads whose next action falls on `day`, optionally restricted to one owner.
pub fn due_on<'a>(
    leads: &'a [Lead],
    day: NaiveDate,
    owner: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Lead> {
    leads
        .iter()
        .filter(|lead| lead.next_action_on == Some(day))
        .filter(|lead| owner.is_none_or(|owner| lead.owner == owner))
        .filter(|lead| matches_search(lead, search))
        .collect()
}

/// Distinct non-empty owners, sorted.
pub fn owners(leads: &[Lead]) -> Vec<String> {
    leads
        .iter()
        .map(|lead| lead.owner.trim())
        .filter(|owner| !owner.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn find<'a>(leads: &'a [Lead], id: &str) -> Option<&'a Lead> {
    let id = id.trim();
    leads.iter().find(|lead| lead.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn sample() -> Vec<Lead> {
        let mut ana = testing::lead("1", "Ana");
        ana.email = "ana@example.com".to_string();
        ana.course = "Inglés".to_string();
        ana.owner = "Nancy".to_string();
        let mut luis = testing::lead("2", "Luis");
        luis.stage = Stage::Won;
        luis.gender = "Hombre".to_string();
        luis.owner = "Favio".to_string();
        let mut eva = testing::lead("3", "Eva");
        eva.mobile = "5598765432".to_string();
        vec![ana, luis, eva]
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let leads = sample();
        assert_eq!(LeadFilter::default().apply(&leads).len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_over_contact_fields() {
        let leads = sample();
        let filter = LeadFilter {
            search: Some("ANA@".to_string()),
            ..LeadFilter::default()
        };
        let ids: Vec<&str> = filter.apply(&leads).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);

        let by_phone = LeadFilter {
            search: Some("98765".to_string()),
            ..LeadFilter::default()
        };
        assert_eq!(by_phone.apply(&leads)[0].id, "3");
    }

    #[test]
    fn list_filters_combine() {
        let leads = sample();
        let filter = LeadFilter {
            stages: vec![Stage::Won, Stage::Awareness],
            owners: vec!["Favio".to_string()],
            ..LeadFilter::default()
        };
        let ids: Vec<&str> = filter.apply(&leads).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn pagination_clamps_index() {
        let items: Vec<u32> = (0..25).collect();
        let (page, slice) = paginate(&items, 10, 0);
        assert_eq!(page.total_pages, 3);
        assert_eq!(slice.len(), 10);

        let (page, slice) = paginate(&items, 10, 9);
        assert_eq!(page.index, 2);
        assert_eq!(slice, &[20, 21, 22, 23, 24]);

        let empty: Vec<u32> = Vec::new();
        let (page, slice) = paginate(&empty, 10, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.index, 0);
        assert!(slice.is_empty());
    }

    #[test]
    fn due_list_matches_day_and_owner() {
        let mut leads = sample();
        let day = testing::now().date();
        leads[0].next_action_on = Some(day);
        leads[1].next_action_on = Some(day);
        assert_eq!(due_on(&leads, day, None, None).len(), 2);
        assert_eq!(due_on(&leads, day, Some("Nancy"), None).len(), 1);
        assert_eq!(due_on(&leads, day, None, Some("luis")).len(), 1);
    }

    #[test]
    fn owners_are_distinct_and_sorted() {
        let leads = sample();
        assert_eq!(owners(&leads), vec!["Favio".to_string(), "Nancy".to_string()]);
    }
}
