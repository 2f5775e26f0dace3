//! Trial search.
//!
//! The registry only supports one free-text term, so a search fetches a generous window of
//! studies for the most specific criterion and then applies every filter locally. Sorting and
//! pagination happen after filtering, so `total` and `totalPages` always describe the filtered
//! set.

use crate::constants::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_TERM, MIN_PREFETCH_WINDOW};
use crate::ranking::normalize_status;
use crate::scoring::compact_phase;
use crate::validation::lenient_number;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use trial_types::{NonEmptyText, Trial};
use utoipa::{IntoParams, ToSchema};

/// Raw search parameters as received on the query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Cancer type to look for in condition, title or description.
    pub cancer_type: Option<String>,
    /// City, state, country or ZIP code.
    pub location: Option<String>,
    /// Phase such as `phase2` or `Phase 2`.
    pub phase: Option<String>,
    /// One of `18-30`, `31-50`, `51-70`, `70+`.
    pub age_range: Option<String>,
    pub search_text: Option<String>,
    pub status: Option<String>,
    pub sponsor: Option<String>,
    pub treatment_type: Option<String>,
    /// Size bucket prefix such as `Small` or `Large`.
    pub trial_size: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<u32>,
    /// `relevance`, `title`, `phase`, `status` or `participants`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Title,
    Phase,
    Status,
    Participants,
}

impl SortBy {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("title") => Self::Title,
            Some("phase") => Self::Phase,
            Some("status") => Self::Status,
            Some("participants") => Self::Participants,
            _ => Self::Relevance,
        }
    }

    /// Direction used when the request does not name one.
    fn natural_order(self) -> SortOrder {
        match self {
            Self::Title | Self::Phase | Self::Status => SortOrder::Asc,
            Self::Relevance | Self::Participants => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("asc") => Some(Self::Asc),
            Some("desc") => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Age bands offered by the search form, matched heuristically against eligibility text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeRange {
    YoungAdult,
    Adult,
    OlderAdult,
    Senior,
}

impl AgeRange {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "18-30" => Some(Self::YoungAdult),
            "31-50" => Some(Self::Adult),
            "51-70" => Some(Self::OlderAdult),
            "70+" => Some(Self::Senior),
            _ => None,
        }
    }

    fn admits(self, eligibility_lc: &str) -> bool {
        let has = |needle: &str| eligibility_lc.contains(needle);
        let broad_adult = has("18") && has("75");
        match self {
            Self::YoungAdult => has("18") && has("30"),
            Self::Adult => has("31") || has("50") || broad_adult,
            Self::OlderAdult => has("51") || has("70") || broad_adult,
            Self::Senior => has("70") || has("elderly") || has("senior"),
        }
    }
}

/// Normalised search criteria: blank and `all` values are dropped, paging has defaults.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[schema(value_type = Option<String>)]
    pub cancer_type: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub location: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub phase: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub age_range: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub search_text: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub status: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub sponsor: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub treatment_type: Option<NonEmptyText>,
    #[schema(value_type = Option<String>)]
    pub trial_size: Option<NonEmptyText>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortBy,
    pub sort_order: Option<SortOrder>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self::from_query(&SearchQuery::default())
    }
}

impl SearchFilters {
    pub fn from_query(query: &SearchQuery) -> Self {
        let text = |value: &Option<String>| NonEmptyText::filter_value(value.as_deref());
        Self {
            cancer_type: text(&query.cancer_type),
            location: text(&query.location),
            phase: text(&query.phase),
            age_range: text(&query.age_range),
            search_text: text(&query.search_text),
            status: text(&query.status),
            sponsor: text(&query.sponsor),
            treatment_type: text(&query.treatment_type),
            trial_size: text(&query.trial_size),
            page: query.page.filter(|p| *p > 0).unwrap_or(1),
            limit: query
                .limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_SEARCH_LIMIT),
            sort_by: SortBy::parse(query.sort_by.as_deref()),
            sort_order: SortOrder::parse(query.sort_order.as_deref()),
        }
    }

    /// The single free-text term sent to the registry.
    pub fn upstream_term(&self) -> &str {
        self.cancer_type
            .as_ref()
            .or(self.search_text.as_ref())
            .or(self.location.as_ref())
            .map_or(DEFAULT_SEARCH_TERM, NonEmptyText::as_str)
    }

    /// Number of registry records to fetch: `max(100, 3 × limit)`, capped at `max_window`.
    pub fn prefetch_window(&self, max_window: usize) -> usize {
        MIN_PREFETCH_WINDOW
            .max(3 * self.limit as usize)
            .min(max_window)
    }

    /// True when `trial` passes every active filter.
    pub fn matches(&self, trial: &Trial) -> bool {
        let lc = |s: &str| s.to_lowercase();

        if let Some(ct) = &self.cancer_type {
            let ct = ct.to_lowercase();
            if ![&trial.condition, &trial.title, &trial.description]
                .iter()
                .any(|field| lc(field).contains(&ct))
            {
                return false;
            }
        }

        if let Some(loc) = &self.location {
            let loc = loc.to_lowercase();
            let place = lc(&trial.location);
            let zip = trial.zip_code.as_deref().map(lc).unwrap_or_default();
            let hit = |needle: &str| place.contains(needle) || zip.contains(needle);
            if !(hit(&loc) || loc.split_whitespace().any(hit)) {
                return false;
            }
        }

        if let Some(phase) = &self.phase {
            let wanted = phase.to_lowercase();
            let stripped = wanted.replace("phase", "");
            let stripped = stripped.trim();
            let have = lc(&trial.phase);
            let hit = have.contains(&wanted)
                || (!stripped.is_empty() && have.contains(stripped))
                || compact_phase(&trial.phase).contains(&compact_phase(&wanted));
            if !hit {
                return false;
            }
        }

        if let Some(range) = self.age_range.as_ref().and_then(|r| AgeRange::parse(r.as_str())) {
            if !range.admits(&lc(&trial.eligibility)) {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if !normalize_status(&trial.status).contains(&normalize_status(status.as_str())) {
                return false;
            }
        }

        let contains = |field: &str, filter: &Option<NonEmptyText>| {
            filter
                .as_ref()
                .map_or(true, |f| lc(field).contains(&f.to_lowercase()))
        };
        if !contains(&trial.treatment_type, &self.treatment_type)
            || !contains(&trial.sponsor, &self.sponsor)
        {
            return false;
        }

        if let Some(size) = &self.trial_size {
            if !lc(&trial.trial_size).starts_with(&size.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

/// Keywords looked for in title and description for each treatment-type filter.
const TREATMENT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "immunotherapy",
        &["immunotherapy", "immune therapy", "checkpoint inhibitor", "car-t", "t-cell"],
    ),
    (
        "targeted",
        &["targeted therapy", "targeted", "precision medicine", "genetic", "molecular"],
    ),
    ("chemotherapy", &["chemotherapy", "chemo", "cytotoxic"]),
    ("radiation", &["radiation", "radiotherapy", "radiation therapy"]),
    ("surgery", &["surgery", "surgical", "resection"]),
    ("hormone", &["hormone therapy", "hormonal", "endocrine"]),
    ("vaccine", &["vaccine", "vaccination", "preventive"]),
    ("stem_cell", &["stem cell", "bone marrow", "transplant"]),
];

const PRESTIGIOUS_SPONSORS: &[&str] = &[
    "university",
    "medical center",
    "cancer center",
    "institute",
    "clinic",
];

fn phase_filter_bonus(filter: &str, trial_phase: &str) -> bool {
    let phase = compact_phase(trial_phase);
    let has = |n: u8| phase.contains(&format!("phase{n}"));
    match compact_phase(filter).as_str() {
        "early" => has(1) || has(2),
        "late" => has(3) || has(4),
        "phase1" => has(1),
        "phase2" => has(2),
        "phase3" => has(3),
        "phase4" => has(4),
        _ => false,
    }
}

/// Weighted relevance of `trial` to `search_lc` (already lower-cased) under `filters`.
pub fn relevance_score(trial: &Trial, search_lc: &str, filters: &SearchFilters) -> u32 {
    let title = trial.title.to_lowercase();
    let description = trial.description.to_lowercase();
    let condition = trial.condition.to_lowercase();
    let sponsor = trial.sponsor.to_lowercase();
    let mut score = 0;

    if title.contains(search_lc) {
        score += 100;
        if title == search_lc {
            score += 50;
        }
        if title.starts_with(search_lc) {
            score += 25;
        }
    }

    if description.contains(search_lc) {
        let occurrences = description.matches(search_lc).count() as u32;
        score += 50 + (occurrences * 5).min(20);
    }

    if condition.contains(search_lc) {
        score += 50;
        if condition == search_lc {
            score += 25;
        }
    }

    if sponsor.contains(search_lc) {
        score += 25;
        if PRESTIGIOUS_SPONSORS.iter().any(|inst| sponsor.contains(inst)) {
            score += 10;
        }
    }

    if trial.eligibility.to_lowercase().contains(search_lc) {
        score += 40;
    }

    if let Some(status) = &filters.status {
        if normalize_status(&trial.status) == normalize_status(status.as_str()) {
            score += 15;
        }
    }

    if let Some(loc) = &filters.location {
        let loc = loc.to_lowercase();
        if trial.location.to_lowercase().contains(&loc) {
            score += if loc.chars().count() > 3 { 15 } else { 10 };
        }
    }

    if let Some(phase) = &filters.phase {
        if phase_filter_bonus(phase.as_str(), &trial.phase) {
            score += 10;
        }
    }

    if let Some(ct) = &filters.cancer_type {
        let ct = ct.to_lowercase();
        if condition.contains(&ct) || title.contains(&ct) {
            score += 15;
            if condition == ct || title.contains(&ct) {
                score += 10;
            }
        }
    }

    if let Some(tt) = &filters.treatment_type {
        let key = tt.to_lowercase();
        let hit = TREATMENT_KEYWORDS
            .iter()
            .find(|(k, _)| *k == key)
            .is_some_and(|(_, terms)| {
                terms
                    .iter()
                    .any(|term| title.contains(term) || description.contains(term))
            });
        if hit {
            score += 20;
        }
    }

    if trial.id.contains("NCT05") || trial.id.contains("NCT06") {
        score += 5;
    }

    if (1..=100).contains(&trial.participant_count()) {
        score += 5;
    }

    score
}

/// One page of search results plus the echo of the criteria that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub trials: Vec<Trial>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub filters: SearchFilters,
    pub sort_by: SortBy,
}

fn sort(trials: &mut [Trial], filters: &SearchFilters) {
    let order = filters
        .sort_order
        .unwrap_or_else(|| filters.sort_by.natural_order());
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match filters.sort_by {
        SortBy::Relevance => {
            let Some(search) = &filters.search_text else {
                return;
            };
            let search_lc = search.to_lowercase();
            let mut keyed: Vec<(u32, Trial)> = trials
                .iter()
                .map(|t| (relevance_score(t, &search_lc, filters), t.clone()))
                .collect();
            keyed.sort_by(|a, b| directed(a.0.cmp(&b.0)));
            for (slot, (_, trial)) in trials.iter_mut().zip(keyed) {
                *slot = trial;
            }
        }
        SortBy::Title => {
            trials.sort_by_cached_key(|t| t.title.to_lowercase());
            if order == SortOrder::Desc {
                trials.reverse();
            }
        }
        SortBy::Phase => trials.sort_by(|a, b| directed(a.phase.cmp(&b.phase))),
        SortBy::Status => trials.sort_by(|a, b| directed(a.status.cmp(&b.status))),
        SortBy::Participants => trials.sort_by(|a, b| {
            directed(a.participant_count().cmp(&b.participant_count()))
        }),
    }
}

/// Filters, sorts and paginates `fetched` (the registry window) under `filters`.
pub fn run(filters: SearchFilters, fetched: Vec<Trial>) -> SearchPage {
    let fetched_count = fetched.len();
    let mut matching: Vec<Trial> = fetched.into_iter().filter(|t| filters.matches(t)).collect();
    sort(&mut matching, &filters);

    let total = matching.len();
    let limit = filters.limit.max(1) as usize;
    let start = (filters.page.max(1) as usize - 1).saturating_mul(limit);
    let end = start.saturating_add(limit);
    let trials: Vec<Trial> = matching
        .into_iter()
        .skip(start)
        .take(limit)
        .collect();

    tracing::debug!(
        fetched = fetched_count,
        matched = total,
        returned = trials.len(),
        "search filtered"
    );

    SearchPage {
        trials,
        total,
        page: filters.page,
        limit: filters.limit,
        total_pages: total.div_ceil(limit),
        has_next_page: end < total,
        has_prev_page: filters.page > 1,
        sort_by: filters.sort_by,
        filters,
    }
}
