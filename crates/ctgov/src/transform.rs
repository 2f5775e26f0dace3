//! Flattening of registry studies into [`Trial`] records.
//!
//! Only the first listed site is kept for location, ZIP code and coordinates. Missing text is
//! replaced with readable placeholders so that downstream matching never has to deal with
//! absent fields.

use std::collections::BTreeSet;

use trial_types::{CentralContact, Coordinates, FilterOptions, Trial};

use crate::wire::{EnrollmentInfo, Intervention, Location, Study};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const UNKNOWN: &str = "Unknown";

/// Converts one registry study into a flat [`Trial`].
pub fn to_trial(study: &Study) -> Trial {
    let protocol = &study.protocol_section;
    let identification = &protocol.identification_module;
    let status = &protocol.status_module;
    let design = &protocol.design_module;
    let eligibility = &protocol.eligibility_module;
    let contacts = &protocol.contacts_locations_module;
    let first_site = contacts.locations.first();

    Trial {
        id: text_or(identification.nct_id.as_deref(), UNKNOWN),
        title: identification
            .brief_title
            .as_deref()
            .or(identification.official_title.as_deref())
            .map(str::to_owned)
            .unwrap_or_else(|| "No title available".into()),
        phase: join_or_default(&design.phases),
        condition: join_or_default(&protocol.conditions_module.conditions),
        location: format_location(first_site),
        status: text_or(status.overall_status.as_deref(), UNKNOWN),
        participants: format_participants(design.enrollment_info.as_ref()),
        description: text_or(
            protocol.description_module.brief_summary.as_deref(),
            "No description available",
        ),
        eligibility: text_or(
            eligibility.eligibility_criteria.as_deref(),
            "Eligibility criteria not specified",
        ),
        sponsor: text_or(
            protocol
                .sponsor_collaborators_module
                .lead_sponsor
                .as_ref()
                .and_then(|s| s.name.as_deref()),
            NOT_SPECIFIED,
        ),
        treatment_type: format_interventions(&protocol.arms_interventions_module.interventions),
        trial_size: trial_size(design.enrollment_info.as_ref()).to_owned(),
        zip_code: first_site.and_then(|site| site.zip.clone()),
        coordinates: first_site.and_then(coordinates),
        eligibility_criteria: criteria_lines(eligibility.eligibility_criteria.as_deref()),
        start_date: text_or(
            status.start_date_struct.as_ref().and_then(|d| d.date.as_deref()),
            NOT_SPECIFIED,
        ),
        completion_date: text_or(
            status
                .completion_date_struct
                .as_ref()
                .and_then(|d| d.date.as_deref()),
            NOT_SPECIFIED,
        ),
        study_type: text_or(design.study_type.as_deref(), NOT_SPECIFIED),
        minimum_age: eligibility.minimum_age.clone(),
        maximum_age: eligibility.maximum_age.clone(),
        sex: eligibility.sex.clone(),
        central_contact: contacts.central_contacts.first().map(|c| CentralContact {
            name: c.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
        }),
    }
}

/// Distinct filter values drawn from the first condition, phase, city, status and intervention
/// type of every sampled study. Each list is sorted and de-duplicated.
pub fn filter_options(studies: &[Study]) -> FilterOptions {
    let mut cancer_types = BTreeSet::new();
    let mut phases = BTreeSet::new();
    let mut locations = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    let mut treatment_types = BTreeSet::new();

    for study in studies {
        let protocol = &study.protocol_section;
        insert_trimmed(
            &mut cancer_types,
            protocol.conditions_module.conditions.first(),
        );
        insert_trimmed(&mut phases, protocol.design_module.phases.first());
        insert_trimmed(
            &mut locations,
            protocol
                .contacts_locations_module
                .locations
                .first()
                .and_then(|l| l.city.as_ref()),
        );
        insert_trimmed(&mut statuses, protocol.status_module.overall_status.as_ref());
        insert_trimmed(
            &mut treatment_types,
            protocol
                .arms_interventions_module
                .interventions
                .first()
                .and_then(|i| i.kind.as_ref()),
        );
    }

    FilterOptions {
        cancer_types: cancer_types.into_iter().collect(),
        phases: phases.into_iter().collect(),
        locations: locations.into_iter().collect(),
        statuses: statuses.into_iter().collect(),
        treatment_types: treatment_types.into_iter().collect(),
    }
}

fn insert_trimmed(set: &mut BTreeSet<String>, value: Option<&String>) {
    if let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        set.insert(value.to_owned());
    }
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => fallback.to_owned(),
    }
}

fn join_or_default(values: &[String]) -> String {
    if values.is_empty() {
        NOT_SPECIFIED.to_owned()
    } else {
        values.join(", ")
    }
}

fn format_location(site: Option<&Location>) -> String {
    let parts: Vec<&str> = site
        .map(|s| {
            [&s.facility, &s.city, &s.state, &s.country]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        "Location not specified".to_owned()
    } else {
        parts.join(", ")
    }
}

fn format_participants(enrollment: Option<&EnrollmentInfo>) -> String {
    match enrollment.and_then(|e| e.count.filter(|c| *c > 0).map(|c| (c, e.kind.as_deref()))) {
        Some((count, Some(kind))) => format!("{count} ({})", kind.to_lowercase()),
        Some((count, None)) => count.to_string(),
        None => NOT_SPECIFIED.to_owned(),
    }
}

fn format_interventions(interventions: &[Intervention]) -> String {
    if interventions.is_empty() {
        return NOT_SPECIFIED.to_owned();
    }
    let mut seen = Vec::<&str>::new();
    for intervention in interventions {
        let kind = intervention.kind.as_deref().unwrap_or(UNKNOWN);
        if !seen.contains(&kind) {
            seen.push(kind);
        }
    }
    seen.join(", ")
}

/// Enrollment size bucket. A missing or zero count is `"Unknown"`.
pub fn trial_size(enrollment: Option<&EnrollmentInfo>) -> &'static str {
    match enrollment.and_then(|e| e.count) {
        None | Some(0) => UNKNOWN,
        Some(count) if count <= 50 => "Small (≤50)",
        Some(count) if count <= 200 => "Medium (51-200)",
        Some(count) if count <= 1000 => "Large (201-1000)",
        Some(_) => "Very Large (>1000)",
    }
}

fn coordinates(site: &Location) -> Option<Coordinates> {
    let point = site.geo_point?;
    Some(Coordinates {
        lat: point.lat?,
        lng: point.lon?,
    })
}

/// Splits a criteria blob into its non-empty trimmed lines.
pub fn criteria_lines(criteria: Option<&str>) -> Vec<String> {
    criteria
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn study(value: serde_json::Value) -> Study {
        serde_json::from_value(value).expect("fixture should decode")
    }

    #[test]
    fn flattens_a_full_study() {
        let study = study(json!({
            "protocolSection": {
                "identificationModule": { "nctId": "NCT01234567", "briefTitle": "Lung Study" },
                "statusModule": {
                    "overallStatus": "RECRUITING",
                    "startDateStruct": { "date": "2024-01" }
                },
                "conditionsModule": { "conditions": ["Lung Cancer", "NSCLC"] },
                "designModule": {
                    "studyType": "INTERVENTIONAL",
                    "phases": ["PHASE1", "PHASE2"],
                    "enrollmentInfo": { "count": 120, "type": "ESTIMATED" }
                },
                "armsInterventionsModule": {
                    "interventions": [
                        { "type": "DRUG", "name": "A" },
                        { "type": "DRUG", "name": "B" },
                        { "type": "RADIATION" }
                    ]
                },
                "eligibilityModule": {
                    "eligibilityCriteria": "Inclusion:\n\n  Age 18 or older \r\n",
                    "minimumAge": "18 Years"
                },
                "contactsLocationsModule": {
                    "locations": [{
                        "facility": "General Hospital",
                        "city": "Boston",
                        "state": "Massachusetts",
                        "zip": "02114",
                        "country": "United States",
                        "geoPoint": { "lat": 42.36, "lon": -71.06 }
                    }]
                }
            }
        }));

        let trial = to_trial(&study);
        assert_eq!(trial.id, "NCT01234567");
        assert_eq!(trial.phase, "PHASE1, PHASE2");
        assert_eq!(trial.condition, "Lung Cancer, NSCLC");
        assert_eq!(
            trial.location,
            "General Hospital, Boston, Massachusetts, United States"
        );
        assert_eq!(trial.participants, "120 (estimated)");
        assert_eq!(trial.trial_size, "Medium (51-200)");
        assert_eq!(trial.treatment_type, "DRUG, RADIATION");
        assert_eq!(trial.zip_code.as_deref(), Some("02114"));
        assert_eq!(
            trial.coordinates,
            Some(Coordinates {
                lat: 42.36,
                lng: -71.06
            })
        );
        assert_eq!(trial.eligibility_criteria, vec!["Inclusion:", "Age 18 or older"]);
        assert_eq!(trial.completion_date, NOT_SPECIFIED);
        assert_eq!(trial.minimum_age.as_deref(), Some("18 Years"));
    }

    #[test]
    fn empty_study_uses_placeholders() {
        let trial = to_trial(&Study::default());
        assert_eq!(trial.id, UNKNOWN);
        assert_eq!(trial.title, "No title available");
        assert_eq!(trial.location, "Location not specified");
        assert_eq!(trial.participants, NOT_SPECIFIED);
        assert_eq!(trial.trial_size, UNKNOWN);
        assert_eq!(trial.treatment_type, NOT_SPECIFIED);
        assert!(trial.coordinates.is_none());
        assert!(trial.eligibility_criteria.is_empty());
    }

    #[test]
    fn size_buckets_follow_enrollment_count() {
        let info = |count| EnrollmentInfo {
            count: Some(count),
            kind: None,
        };
        assert_eq!(trial_size(Some(&info(50))), "Small (≤50)");
        assert_eq!(trial_size(Some(&info(51))), "Medium (51-200)");
        assert_eq!(trial_size(Some(&info(1000))), "Large (201-1000)");
        assert_eq!(trial_size(Some(&info(1001))), "Very Large (>1000)");
    }

    #[test]
    fn filter_options_are_sorted_and_unique() {
        let studies = vec![
            study(json!({ "protocolSection": {
                "conditionsModule": { "conditions": ["Melanoma", "Skin"] },
                "statusModule": { "overallStatus": "RECRUITING" }
            }})),
            study(json!({ "protocolSection": {
                "conditionsModule": { "conditions": [" Breast Cancer "] },
                "statusModule": { "overallStatus": "RECRUITING" },
                "designModule": { "phases": ["PHASE3"] }
            }})),
        ];

        let options = filter_options(&studies);
        assert_eq!(options.cancer_types, vec!["Breast Cancer", "Melanoma"]);
        assert_eq!(options.statuses, vec!["RECRUITING"]);
        assert_eq!(options.phases, vec!["PHASE3"]);
        assert!(options.locations.is_empty());
    }
}
