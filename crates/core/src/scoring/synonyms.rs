//! Related-term table for cancer-type matching.
//!
//! A key applies when it appears inside the patient's lower-cased cancer type answer; any of its
//! terms appearing in the trial text then counts as a related match.

const RELATED_TERMS: &[(&str, &[&str])] = &[
    (
        "lung",
        &[
            "pulmonary",
            "respiratory",
            "bronchogenic",
            "non-small cell",
            "nsclc",
            "small cell",
            "sclc",
        ],
    ),
    (
        "breast",
        &[
            "mammary",
            "ductal",
            "lobular",
            "triple negative",
            "her2+",
            "her2 positive",
        ],
    ),
    (
        "colorectal",
        &["colon", "rectal", "bowel", "intestinal", "adenocarcinoma"],
    ),
    (
        "lymphoma",
        &["lymphatic", "lymph", "hodgkin", "non-hodgkin", "nhl", "hl"],
    ),
    (
        "leukemia",
        &[
            "leukemic",
            "blood cancer",
            "acute",
            "chronic",
            "myeloid",
            "lymphocytic",
        ],
    ),
    (
        "prostate",
        &["prostatic", "adenocarcinoma", "castration resistant"],
    ),
    (
        "mesothelioma",
        &[
            "pleural mesothelioma",
            "peritoneal mesothelioma",
            "asbestos-related",
        ],
    ),
    (
        "cholangiocarcinoma",
        &[
            "bile duct cancer",
            "biliary cancer",
            "fgfr2 fusion",
            "idh1 mutation",
        ],
    ),
    (
        "endometrial",
        &["uterine cancer", "endometrium", "uterine adenocarcinoma"],
    ),
    (
        "testicular",
        &["testis cancer", "germ cell tumor", "seminoma", "non-seminoma"],
    ),
    (
        "esophageal",
        &[
            "esophagus cancer",
            "esophageal adenocarcinoma",
            "squamous cell",
        ],
    ),
    (
        "bladder",
        &[
            "urinary bladder",
            "transitional cell carcinoma",
            "urothelial",
        ],
    ),
    (
        "renal",
        &["kidney cancer", "renal cell carcinoma", "rcc", "clear cell"],
    ),
    (
        "head and neck",
        &[
            "oropharyngeal",
            "laryngeal",
            "nasopharyngeal",
            "oral cancer",
        ],
    ),
    (
        "osteosarcoma",
        &["bone cancer", "skeletal sarcoma", "high-risk bone"],
    ),
    (
        "uveal",
        &[
            "eye cancer",
            "ocular melanoma",
            "choroidal melanoma",
            "iris melanoma",
        ],
    ),
    (
        "pediatric",
        &["childhood cancer", "pediatric oncology", "rare pediatric"],
    ),
    (
        "geriatric",
        &["elderly cancer", "senior oncology", "aging cancer"],
    ),
];

/// Related terms for every table key contained in `answer_lc`.
pub(crate) fn related_terms(answer_lc: &str) -> impl Iterator<Item = &'static str> + '_ {
    RELATED_TERMS
        .iter()
        .filter(move |(key, _)| answer_lc.contains(key))
        .flat_map(|(_, terms)| terms.iter().copied())
}
