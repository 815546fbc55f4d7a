use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical funnel position of a lead.
///
/// Transitions are unrestricted: any stage may move to any other stage
/// through an explicit edit or follow-up. `Won` and `Lost` are terminal only
/// by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Captured but not yet worked.
    Awareness,
    Contacted,
    /// Information sent.
    #[serde(rename = "MQL")]
    Mql,
    /// Qualified opportunity.
    #[serde(rename = "SQL")]
    Sql,
    Nurturing,
    /// Meeting or deposit booked.
    #[serde(rename = "Demo_Booked")]
    DemoBooked,
    Won,
    Lost,
    /// Reactivated after going cold.
    #[serde(rename = "Re_Engaged")]
    ReEngaged,
}

impl Default for Stage {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Historical free-text labels mapped onto canonical stages.
const LEGACY_LABELS: &[(&str, Stage)] = &[
    ("Captado", Stage::Awareness),
    ("Contactado", Stage::Contacted),
    ("Info enviada", Stage::Mql),
    ("Info_enviada", Stage::Mql),
    ("Interesado", Stage::Sql),
    ("En seguimiento", Stage::Nurturing),
    ("En_seguimiento", Stage::Nurturing),
    ("Depósito", Stage::DemoBooked),
    ("Preinscripción", Stage::DemoBooked),
    ("Inscrito", Stage::Won),
    ("Inscrita", Stage::Won),
    ("Perdido", Stage::Lost),
    ("Reactivado", Stage::ReEngaged),
];

impl Stage {
    pub const INITIAL: Stage = Stage::Awareness;

    /// All stages in funnel display order.
    pub const ALL: [Stage; 9] = [
        Stage::Awareness,
        Stage::Contacted,
        Stage::Mql,
        Stage::Sql,
        Stage::Nurturing,
        Stage::DemoBooked,
        Stage::Won,
        Stage::Lost,
        Stage::ReEngaged,
    ];

    /// Token written to storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awareness => "Awareness",
            Self::Contacted => "Contacted",
            Self::Mql => "MQL",
            Self::Sql => "SQL",
            Self::Nurturing => "Nurturing",
            Self::DemoBooked => "Demo_Booked",
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::ReEngaged => "Re_Engaged",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Awareness => "Awareness (Captado)",
            Self::Contacted => "Contacted (Contactado)",
            Self::Mql => "MQL (Info enviada)",
            Self::Sql => "SQL (Interesado / Oportunidad)",
            Self::Nurturing => "Nurturing (En seguimiento / Temario)",
            Self::DemoBooked => "Demo_Booked (Depósito / Preinscripción)",
            Self::Won => "Won (Inscrito / Cliente)",
            Self::Lost => "Lost (Perdido)",
            Self::ReEngaged => "Re_Engaged (Reactivado)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Awareness => "Conoce la marca por primera vez.",
            Self::Contacted => "Se realizó el primer contacto.",
            Self::Mql => "Se envió información/temario y detalles del curso.",
            Self::Sql => "Oportunidad real; tiene intención clara.",
            Self::Nurturing => "Seguimiento con temario/contenidos y próximas fechas.",
            Self::DemoBooked => "Depósito/Preinscripción para asegurar lugar.",
            Self::Won => "Cliente inscrito.",
            Self::Lost => "No se convirtió en cliente.",
            Self::ReEngaged => "Lead reactivado con nuevas fechas o promociones.",
        }
    }

    /// The two stages that earn the hot-lead scoring bonus.
    pub fn is_hot(&self) -> bool {
        matches!(self, Self::Sql | Self::DemoBooked)
    }

    /// Exact canonical token lookup (no legacy translation, no fallback).
    pub fn from_token(token: &str) -> Option<Stage> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == token)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map arbitrary stored stage text onto a canonical stage.
///
/// Never fails: empty or unrecognized input yields [`Stage::INITIAL`]. An
/// exact canonical token wins over the legacy label table.
pub fn normalize(raw: &str) -> Stage {
    let value = raw.trim();
    if value.is_empty() {
        return Stage::INITIAL;
    }
    if let Some(stage) = Stage::from_token(value) {
        return stage;
    }
    LEGACY_LABELS
        .iter()
        .find(|(label, _)| *label == value)
        .map(|(_, stage)| *stage)
        .unwrap_or(Stage::INITIAL)
}

/// Same as [`normalize`] for optional input.
pub fn normalize_opt(raw: Option<&str>) -> Stage {
    raw.map(normalize).unwrap_or(Stage::INITIAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tokens_map_to_themselves() {
        for stage in Stage::ALL {
            assert_eq!(normalize(stage.as_str()), stage);
        }
    }

    #[test]
    fn legacy_labels_translate() {
        assert_eq!(normalize("Contactado"), Stage::Contacted);
        assert_eq!(normalize("Interesado"), Stage::Sql);
        assert_eq!(normalize("Inscrito"), Stage::Won);
        assert_eq!(normalize("Inscrita"), Stage::Won);
        assert_eq!(normalize("Preinscripción"), Stage::DemoBooked);
        assert_eq!(normalize("  En seguimiento "), Stage::Nurturing);
        assert_eq!(normalize("Reactivado"), Stage::ReEngaged);
    }

    #[test]
    fn normalization_is_idempotent_for_every_legacy_label() {
        for (label, _) in LEGACY_LABELS {
            let once = normalize(label);
            assert!(Stage::ALL.contains(&once));
            assert_eq!(normalize(once.as_str()), once);
        }
    }

    #[test]
    fn unknown_and_empty_fall_back_to_initial() {
        assert_eq!(normalize(""), Stage::Awareness);
        assert_eq!(normalize("   "), Stage::Awareness);
        assert_eq!(normalize("won"), Stage::Awareness);
        assert_eq!(normalize("something else"), Stage::Awareness);
        assert_eq!(normalize_opt(None), Stage::Awareness);
    }

    #[test]
    fn serde_uses_storage_tokens() {
        let json = serde_json::to_string(&Stage::DemoBooked).expect("serialize");
        assert_eq!(json, "\"Demo_Booked\"");
        let back: Stage = serde_json::from_str("\"SQL\"").expect("deserialize");
        assert_eq!(back, Stage::Sql);
    }
}
