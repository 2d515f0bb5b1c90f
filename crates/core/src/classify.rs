//! Criticality classification from the AEMPS observation text.
//!
//! The verdict drives the badge on each report entry: does the observation
//! imply a substitute treatment exists, or must the pharmacy escalate
//! (foreign-medicine request, controlled distribution)?
//!
//! The rule ordering is a business contract, not an implementation detail:
//! alleviation phrases override critical phrases when both occur in the same
//! note, and silence defaults to critical — absence of information is read
//! as maximum risk.

use crate::record::ShortageRecord;

/// Classifier verdict for one shortage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No substitute implied; requires pharmacy action.
    Critical,
    /// A substitute treatment is implied available, or the shortage is
    /// inactive.
    Alleviated,
}

/// Phrases indicating a substitute exists. Checked before the critical set.
const ALLEVIATION_PHRASES: &[&str] = &[
    "existe/n otro/s",
    "existen otros",
    "existe otro",
    "tratamientos alternativos",
    // Usually "El médico determinará...": alternatives exist but need a
    // prescription change.
    "el médico",
    "tratamientos comercializados",
    "principio activo",
    "principios activos",
    "misma vía de administración",
    // Accent-tolerant catch-alls for "vía de administración".
    "de administracion",
    "de administración",
];

/// Phrases indicating controlled supply or foreign-medicine sourcing.
const CRITICAL_PHRASES: &[&str] = &[
    "medicamento extranjero",
    "distribución controlada",
    "suministro controlado",
];

/// Maps a shortage record's status and observation text to a verdict.
///
/// Priority order:
/// 1. An explicitly inactive record is never critical.
/// 2. Any alleviation phrase in the (lowercased, whitespace-collapsed)
///    observation wins, even if a critical phrase also occurs.
/// 3. Otherwise any critical phrase yields `Critical`.
/// 4. Otherwise — including an empty observation — the default is
///    `Critical`.
///
/// Total: every record yields a definite verdict.
pub fn classify(record: &ShortageRecord) -> Verdict {
    if record.active == Some(false) {
        return Verdict::Alleviated;
    }

    let obs = normalized_observation(record);

    if ALLEVIATION_PHRASES.iter().any(|p| obs.contains(p)) {
        return Verdict::Alleviated;
    }
    if CRITICAL_PHRASES.iter().any(|p| obs.contains(p)) {
        return Verdict::Critical;
    }

    Verdict::Critical
}

/// Lowercases the observation and collapses whitespace runs (newlines, tabs,
/// repeated spaces) to single spaces; empty when absent.
fn normalized_observation(record: &ShortageRecord) -> String {
    record
        .observation
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(active: Option<bool>, observation: &str) -> ShortageRecord {
        ShortageRecord {
            code: Some("712345".into()),
            registry_number: None,
            name: Some("AMOXICILINA 500MG".into()),
            active,
            observation: if observation.is_empty() {
                None
            } else {
                Some(observation.into())
            },
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_inactive_record_is_alleviated_even_with_critical_phrase() {
        let r = record(Some(false), "medicamento extranjero");
        assert_eq!(classify(&r), Verdict::Alleviated);
    }

    #[test]
    fn test_alleviation_phrase_overrides_critical_phrase() {
        let r = record(
            Some(true),
            "Existe/n otro/s medicamento con el mismo principio activo. Distribución controlada.",
        );
        assert_eq!(classify(&r), Verdict::Alleviated);
    }

    #[test]
    fn test_critical_phrase_alone_is_critical() {
        for obs in [
            "Medicamento extranjero disponible previa solicitud",
            "El laboratorio realiza una DISTRIBUCIÓN   controlada",
            "suministro controlado por el titular",
        ] {
            assert_eq!(classify(&record(Some(true), obs)), Verdict::Critical, "{obs}");
        }
    }

    #[test]
    fn test_silence_defaults_to_critical() {
        assert_eq!(classify(&record(Some(true), "")), Verdict::Critical);
        assert_eq!(classify(&record(None, "")), Verdict::Critical);
    }

    #[test]
    fn test_unrecognized_text_defaults_to_critical() {
        let r = record(Some(true), "Problema de fabricación en la planta.");
        assert_eq!(classify(&r), Verdict::Critical);
    }

    #[test]
    fn test_whitespace_runs_are_collapsed_before_matching() {
        let r = record(Some(true), "existen\n\totros   medicamentos disponibles");
        assert_eq!(classify(&r), Verdict::Alleviated);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let r = record(Some(true), "TRATAMIENTOS ALTERNATIVOS disponibles");
        assert_eq!(classify(&r), Verdict::Alleviated);
    }
}
