//! One rule per scoring factor.
//!
//! Every rule has the same shape: read its answer, abstain when it is absent, otherwise search
//! the trial text and award points. [`evaluate`] wraps the verdict into a [`FactorOutcome`] with
//! the factor's label, weight band and maximum.

use super::synonyms::related_terms;
use super::{Factor, FactorOutcome, TrialText};
use crate::answers::{AnswerField, Answers};

/// Points awarded by a rule, whether it counts as a match, and the explanation shown to the user.
struct Verdict {
    points: u32,
    matched: bool,
    description: String,
}

impl Verdict {
    fn new(points: u32, matched: bool, description: impl Into<String>) -> Self {
        Self {
            points,
            matched,
            description: description.into(),
        }
    }

    /// A verdict that matches exactly when points were awarded.
    fn scored(points: u32, description: impl Into<String>) -> Self {
        Self::new(points, points > 0, description)
    }
}

type Rule = fn(&TrialText<'_>, &Answers) -> Option<Verdict>;

fn rule_for(factor: Factor) -> Rule {
    match factor {
        Factor::CancerType => cancer_type,
        Factor::Stage => stage,
        Factor::Age => age,
        Factor::TreatmentHistory => treatment_history,
        Factor::HealthStatus => health_status,
        Factor::TravelWillingness => travel_willingness,
        Factor::TreatmentPreferences => treatment_preferences,
        Factor::TrialPhasePreferences => phase_preferences,
        Factor::SpecialConsiderations => special_considerations,
        Factor::GeneticTesting => genetic_testing,
        Factor::OrganFunction => organ_function,
    }
}

/// Evaluates `factor`; `None` when its answer is absent.
pub(crate) fn evaluate(
    factor: Factor,
    text: &TrialText<'_>,
    answers: &Answers,
) -> Option<FactorOutcome> {
    let verdict = rule_for(factor)(text, answers)?;
    let max_points = factor.max_points();
    Some(FactorOutcome {
        factor,
        matched: verdict.matched,
        weight: factor.weight(),
        points: verdict.points.min(max_points),
        max_points,
        description: verdict.description,
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// `needle` appears as whole words: `"stage i"` is found in `"stage i-ii"` but not in
/// `"stage iv"`.
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Lower-case, whitespace-free form used to compare phases (`"Phase 1"` and `"PHASE1"` agree).
pub(crate) fn compact_phase(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn cancer_type(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::CancerType)?;

    if answer.eq_ignore_ascii_case("other") {
        let generic = [&text.condition_lc, &text.title_lc, &text.description_lc]
            .iter()
            .any(|field| contains_any(field, &["cancer", "tumor", "neoplasm"]));
        let verbatim = text.condition.contains(answer) || text.title.contains(answer);
        return Some(if generic || verbatim {
            Verdict::new(25, true, "Your cancer type matches this general cancer trial")
        } else {
            Verdict::new(0, false, "This trial is not for your type of cancer")
        });
    }

    if text.condition.contains(answer) || text.title.contains(answer) {
        return Some(Verdict::new(
            40,
            true,
            format!("Your cancer type ({answer}) exactly matches this trial's condition"),
        ));
    }

    let answer_lc = answer.to_lowercase();
    let fields = [&text.condition_lc, &text.title_lc, &text.description_lc];
    let mentions = |term: &str| fields.iter().any(|field| field.contains(term));
    let related = mentions(&answer_lc) || related_terms(&answer_lc).any(mentions);

    Some(if related {
        Verdict::new(
            30,
            true,
            format!("Your cancer type ({answer}) is related to this trial's condition"),
        )
    } else {
        Verdict::new(
            0,
            false,
            format!("Your cancer type ({answer}) doesn't match this trial's condition"),
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageTier {
    Any,
    Early,
    Advanced,
    Metastatic,
    Remission,
    RelapsedRefractory,
    Resectable,
    Intermediate,
}

impl StageTier {
    fn classify(stage_lc: &str) -> Option<Self> {
        let tier = if stage_lc.contains("any stage") {
            Self::Any
        } else if stage_lc.contains("metastatic") {
            Self::Metastatic
        } else if stage_lc.contains("remission") {
            Self::Remission
        } else if contains_any(stage_lc, &["relapsed", "refractory"]) {
            Self::RelapsedRefractory
        } else if stage_lc.contains("resectable") {
            Self::Resectable
        } else if stage_lc.contains("intermediate") {
            Self::Intermediate
        } else if contains_any(stage_lc, &["early", "stage i-ii"]) {
            Self::Early
        } else if contains_any(stage_lc, &["advanced", "stage iii-iv"]) {
            Self::Advanced
        } else {
            match stage_lc.trim() {
                "stage i" | "stage ii" | "stage 1" | "stage 2" => Self::Early,
                "stage iii" | "stage iv" | "stage 3" | "stage 4" => Self::Advanced,
                _ => return None,
            }
        };
        Some(tier)
    }

    fn trial_terms(self) -> &'static [&'static str] {
        match self {
            Self::Any => &[],
            Self::Early => &["early", "stage i", "stage ii"],
            Self::Advanced => &["advanced", "stage iii", "stage iv"],
            Self::Metastatic => &["metastatic"],
            Self::Remission => &["remission"],
            Self::RelapsedRefractory => &["relapsed", "refractory"],
            Self::Resectable => &["resectable"],
            Self::Intermediate => &["intermediate"],
        }
    }
}

fn stage(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::Stage)?;
    let matched = match StageTier::classify(&answer.to_lowercase()) {
        Some(StageTier::Any) => true,
        Some(tier) => [&text.eligibility_lc, &text.description_lc]
            .iter()
            .any(|field| {
                tier.trial_terms()
                    .iter()
                    .any(|term| contains_token(field, term))
            }),
        None => false,
    };

    Some(if matched {
        Verdict::new(
            25,
            true,
            format!("Your cancer stage ({answer}) matches this trial's requirements"),
        )
    } else {
        Verdict::new(
            0,
            false,
            format!("Your cancer stage ({answer}) may not meet this trial's requirements"),
        )
    })
}

fn age(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::Age)?;
    let e = text.eligibility_lc.as_str();

    let points = match answers.age() {
        None => 0,
        Some(age) => {
            if e.contains("18") && e.contains("75") {
                if (18..=75).contains(&age) { 20 } else { 0 }
            } else if e.contains("18") && e.contains("70") {
                if (18..=70).contains(&age) { 20 } else { 0 }
            } else if contains_any(e, &["pediatric", "child"]) {
                if age < 18 { 20 } else { 0 }
            } else if contains_any(e, &["elderly", "senior"]) {
                if age >= 65 { 20 } else { 0 }
            } else if e.contains("adult") {
                if age >= 18 { 15 } else { 0 }
            } else {
                0
            }
        }
    };

    Some(Verdict::scored(
        points,
        if points > 0 {
            format!("Your age ({answer}) meets this trial's age requirements")
        } else {
            format!("Your age ({answer}) may not meet this trial's age requirements")
        },
    ))
}

/// Broad category of a previous-treatment answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TreatmentHistory {
    Naive,
    Chemotherapy,
    Immunotherapy,
    Other,
}

impl TreatmentHistory {
    pub(crate) fn classify(answer: &str) -> Self {
        let lc = answer.to_lowercase();
        if contains_any(&lc, &["no previous", "no treatment", "naive"]) {
            Self::Naive
        } else if lc.contains("chemotherapy") {
            Self::Chemotherapy
        } else if lc.contains("immunotherapy") {
            Self::Immunotherapy
        } else {
            Self::Other
        }
    }
}

fn treatment_history(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::PreviousTreatment)?;
    let e = text.eligibility_lc.as_str();

    let (points, matched) = match TreatmentHistory::classify(answer) {
        TreatmentHistory::Naive => {
            if contains_any(e, &["no previous", "treatment naive"]) {
                (20, true)
            } else {
                (0, false)
            }
        }
        TreatmentHistory::Chemotherapy => {
            prior_therapy(e, &["previous chemotherapy", "chemo"], "chemotherapy")
        }
        TreatmentHistory::Immunotherapy => {
            prior_therapy(e, &["previous immunotherapy", "immune"], "immunotherapy")
        }
        TreatmentHistory::Other => (10, true),
    };

    Some(Verdict::new(
        points,
        matched,
        if matched {
            format!("Your treatment history ({answer}) is compatible with this trial")
        } else {
            format!("Your treatment history ({answer}) may not be compatible")
        },
    ))
}

/// 20 on an explicit mention, 0 when the trial wants untreated patients, otherwise neutral 10.
fn prior_therapy(eligibility: &str, mentions: &[&str], therapy: &str) -> (u32, bool) {
    if contains_any(eligibility, mentions) {
        (20, true)
    } else if eligibility.contains("no previous") && !eligibility.contains(therapy) {
        (0, false)
    } else {
        (10, true)
    }
}

fn health_status(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::PerformanceStatus)?;
    let lc = answer.to_lowercase();
    let e = text.eligibility_lc.as_str();

    let (points, matched) = if contains_any(&lc, &["ecog 3", "ecog 4", "poor"]) {
        if contains_any(e, &["poor", "limited"]) {
            (15, true)
        } else {
            (0, false)
        }
    } else if contains_any(&lc, &["ecog 2", "fair"]) {
        if contains_any(e, &["fair", "adequate"]) {
            (15, true)
        } else {
            (5, true)
        }
    } else if contains_any(
        &lc,
        &["ecog 0", "ecog 1", "kps", "karnofsky", "lansky", "excellent", "good"],
    ) {
        if contains_any(
            e,
            &["good", "excellent", "performance status", "overall health"],
        ) {
            (15, true)
        } else {
            (10, true)
        }
    } else {
        (0, false)
    };

    Some(Verdict::new(
        points,
        matched,
        if matched {
            format!("Your performance status ({answer}) meets this trial's requirements")
        } else {
            format!("Your performance status ({answer}) may not meet this trial's requirements")
        },
    ))
}

/// Points for a travel answer: far 10, 50 miles 8, 25 miles 5.
pub(crate) fn travel_points(answer: &str) -> u32 {
    let lc = answer.to_lowercase();
    if contains_any(&lc, &["any distance", "100", "state", "country"]) {
        10
    } else if lc.contains("50") {
        8
    } else if lc.contains("25") {
        5
    } else {
        0
    }
}

fn travel_willingness(_text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::TravelWillingness)?;
    let points = travel_points(answer);
    Some(Verdict::scored(
        points,
        if points > 0 {
            format!("Your travel preference ({answer}) is compatible with trial participation")
        } else {
            format!("Your travel preference ({answer}) may limit trial participation")
        },
    ))
}

/// Treatment preference option and the keyword that must appear in the trial text.
const TREATMENT_KEYWORDS: &[(&str, &str)] = &[
    ("surgery", "surgery"),
    ("immunotherapy", "immunotherapy"),
    ("targeted therapy", "targeted"),
    ("chemotherapy", "chemotherapy"),
    ("radiation therapy", "radiation"),
    ("hormone therapy", "hormone"),
    ("stem cell therapy", "stem cell"),
    ("vaccine therapy", "vaccine"),
    ("proton therapy", "proton"),
    ("precision medicine", "precision"),
    ("clinical trials", "trial"),
];

/// True when one preference is satisfied by the lower-cased trial text.
pub(crate) fn treatment_preference_matches(preference: &str, trial_text_lc: &str) -> bool {
    let pref = preference.to_lowercase();
    pref == "any treatment type"
        || TREATMENT_KEYWORDS
            .iter()
            .any(|(option, keyword)| pref == *option && trial_text_lc.contains(keyword))
}

fn treatment_preferences(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let prefs = answers.items(AnswerField::TreatmentPreferences);
    if prefs.is_empty() {
        return None;
    }
    let haystack = format!(
        "{} {} {} {}",
        text.title_lc, text.description_lc, text.eligibility_lc, text.treatment_lc
    );
    let matched = prefs
        .iter()
        .any(|pref| treatment_preference_matches(pref, &haystack));

    Some(if matched {
        Verdict::new(15, true, "Your treatment preferences match this trial's approach")
    } else {
        Verdict::new(0, false, "Your treatment preferences may not align with this trial")
    })
}

/// True when one phase preference is satisfied by the trial's phase text.
pub(crate) fn phase_preference_matches(preference: &str, trial_phase: &str) -> bool {
    let pref = compact_phase(preference);
    if pref.contains("anyphase") {
        return true;
    }
    let phase = compact_phase(trial_phase);
    (1..=4).any(|n| {
        let token = format!("phase{n}");
        pref.contains(&token) && phase.contains(&token)
    })
}

fn phase_preferences(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let prefs = answers.items(AnswerField::TrialPhasePreferences);
    if prefs.is_empty() {
        return None;
    }
    let matched = prefs
        .iter()
        .any(|pref| phase_preference_matches(pref, text.phase));

    Some(if matched {
        Verdict::new(
            12,
            true,
            format!("Your preferred trial phases match this trial ({})", text.phase),
        )
    } else {
        Verdict::new(
            0,
            false,
            format!("Your preferred trial phases don't match this trial ({})", text.phase),
        )
    })
}

/// Consideration keyword in the answer and the term that must appear in the trial text.
const CONSIDERATION_KEYWORDS: &[(&str, &str)] = &[
    ("hiv", "hiv"),
    ("transplant", "transplant"),
    ("pregnant", "pregnancy"),
    ("pediatric", "pediatric"),
    ("geriatric", "geriatric"),
    ("rare cancer", "rare"),
    ("genetic mutations", "genetic"),
];

fn special_considerations(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let considerations = answers.items(AnswerField::SpecialConsiderations);
    if considerations.is_empty() {
        return None;
    }
    let haystack = format!(
        "{} {} {}",
        text.title_lc, text.description_lc, text.eligibility_lc
    );
    let matched = considerations.iter().any(|c| {
        let lc = c.to_lowercase();
        lc == "none"
            || CONSIDERATION_KEYWORDS
                .iter()
                .any(|(keyword, term)| lc.contains(keyword) && haystack.contains(term))
    });

    Some(if matched {
        Verdict::new(10, true, "Your special considerations are addressed by this trial")
    } else {
        Verdict::new(0, false, "This trial may not address your special considerations")
    })
}

fn genetic_testing(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers.text(AnswerField::GeneticTesting)?;
    let lc = answer.to_lowercase();
    let haystack = format!(
        "{} {} {}",
        text.title_lc, text.description_lc, text.eligibility_lc
    );

    let points = if lc.contains("brca") && haystack.contains("brca") {
        8
    } else if lc.contains("lynch") && haystack.contains("lynch") {
        8
    } else if lc.contains("other cancer genes") && haystack.contains("genetic") {
        6
    } else if lc == "no" || lc == "don't know" {
        5
    } else {
        0
    };

    Some(Verdict::scored(
        points,
        if points > 0 {
            "Your genetic testing status is compatible with this trial"
        } else {
            "Your genetic testing status may not be compatible"
        },
    ))
}

fn organ_function(text: &TrialText<'_>, answers: &Answers) -> Option<Verdict> {
    let answer = answers
        .text(AnswerField::OrganFunctionOverall)
        .or_else(|| answers.text(AnswerField::OrganFunction))?;
    let lc = answer.to_lowercase();
    let haystack = format!(
        "{} {} {}",
        text.title_lc, text.description_lc, text.eligibility_lc
    );

    let (points, matched) = if contains_any(&lc, &["not adequate", "poor"]) {
        if contains_any(&haystack, &["adequate", "limited"]) {
            (3, true)
        } else {
            (0, false)
        }
    } else if contains_any(&lc, &["excellent", "good", "adequate"]) {
        if contains_any(&haystack, &["adequate", "good", "excellent"]) {
            (5, true)
        } else {
            (3, true)
        }
    } else if lc.contains("fair") {
        if contains_any(&haystack, &["adequate", "fair"]) {
            (5, true)
        } else {
            (2, true)
        }
    } else {
        (0, false)
    };

    Some(Verdict::new(
        points,
        matched,
        if matched {
            "Your organ function status is compatible with this trial"
        } else {
            "Your organ function status may limit trial participation"
        },
    ))
}
