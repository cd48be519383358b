//! Built-in symptom knowledge: the quick-select list, the set of symptoms
//! that call for emergency services, and canned checker advice.

use crate::entities::SymptomAdvice;

/// Symptoms offered for quick selection
pub const COMMON_SYMPTOMS: &[&str] = &[
    "Chest Pain",
    "Shortness of Breath",
    "Fever",
    "Headache",
    "Dizziness",
    "Nausea / Vomiting",
    "Severe Bleeding",
    "Allergic Reaction",
    "Loss of Consciousness",
    "Seizure",
    "Stroke Symptoms (F.A.S.T.)",
    "Abdominal Pain",
    "Confusion",
    "Difficulty Speaking",
    "Weakness or Numbness",
];

/// Lowercase fragments identifying a life-threatening symptom
const CRITICAL_SYMPTOMS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "severe bleeding",
    "allergic reaction",
    "loss of consciousness",
    "seizure",
    "stroke",
    "difficulty speaking",
    "weakness or numbness",
    "confusion",
];

struct CheckerEntry {
    key: &'static str,
    title: &'static str,
    advice: &'static [&'static str],
}

// Matched in order against the lowercased query
const CHECKER_TABLE: &[CheckerEntry] = &[
    CheckerEntry {
        key: "chest pain",
        title: "Guidance for Chest Pain",
        advice: &[
            "Call emergency services immediately.",
            "Rest in a comfortable position, often half-sitting.",
            "If prescribed, take nitroglycerin.",
            "Chew and swallow aspirin if not allergic and no contraindications.",
            "Stay calm and await assistance.",
        ],
    },
    CheckerEntry {
        key: "shortness of breath",
        title: "Guidance for Shortness of Breath",
        advice: &[
            "Call emergency services if severe or sudden.",
            "Sit upright to ease breathing.",
            "Use any prescribed inhalers (e.g., for asthma).",
            "Try pursed-lip breathing.",
            "Ensure good ventilation in the room.",
        ],
    },
    CheckerEntry {
        key: "severe bleeding",
        title: "Guidance for Severe Bleeding",
        advice: &[
            "Call emergency services immediately.",
            "Apply direct pressure to the wound using a clean cloth or bandage.",
            "Elevate the injured part above the heart if possible.",
            "Do not remove any objects impaled in the wound.",
            "Maintain pressure until help arrives.",
        ],
    },
    CheckerEntry {
        key: "fever cough",
        title: "Guidance for Fever and Cough",
        advice: &[
            "Rest and drink plenty of fluids.",
            "Use over-the-counter medications for fever (e.g., acetaminophen, ibuprofen) if appropriate.",
            "Monitor symptoms. If they worsen or include difficulty breathing, seek medical attention.",
            "Consider COVID-19 or flu testing if symptoms are new.",
            "Isolate to prevent spread if infectious illness is suspected.",
        ],
    },
];

/// Whether a symptom description names a life-threatening condition
pub fn is_critical_symptom(symptom: &str) -> bool {
    let symptom = symptom.to_lowercase();
    CRITICAL_SYMPTOMS.iter().any(|critical| symptom.contains(critical))
}

/// Look up canned advice for free-text symptoms. `None` when nothing matches
/// or the query is blank.
pub fn check_symptoms(query: &str) -> Option<SymptomAdvice> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    CHECKER_TABLE
        .iter()
        .find(|entry| query.contains(entry.key))
        .map(|entry| SymptomAdvice {
            title: entry.title.to_string(),
            advice: entry.advice.iter().map(|s| s.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_symptoms() {
        assert!(is_critical_symptom("Chest Pain"));
        assert!(is_critical_symptom("Stroke Symptoms (F.A.S.T.)"));
        assert!(is_critical_symptom("sudden CONFUSION after a fall"));
        assert!(!is_critical_symptom("Headache"));
        assert!(!is_critical_symptom("Fever"));
    }

    #[test]
    fn test_every_quick_symptom_is_non_empty() {
        assert_eq!(COMMON_SYMPTOMS.len(), 15);
        assert!(COMMON_SYMPTOMS.iter().all(|s| !s.trim().is_empty()));
    }

    #[test]
    fn test_checker_matches_substring() {
        let advice = check_symptoms("  I have CHEST PAIN and sweating ").unwrap();
        assert_eq!(advice.title, "Guidance for Chest Pain");
        assert_eq!(advice.advice[0], "Call emergency services immediately.");
    }

    #[test]
    fn test_checker_uses_first_match_in_table_order() {
        let advice = check_symptoms("severe bleeding with chest pain").unwrap();
        assert_eq!(advice.title, "Guidance for Chest Pain");
    }

    #[test]
    fn test_checker_not_found() {
        assert!(check_symptoms("sprained ankle").is_none());
        assert!(check_symptoms("   ").is_none());
        // The key is matched as a whole phrase
        assert!(check_symptoms("cough and fever").is_none());
        assert!(check_symptoms("fever cough").is_some());
    }
}
