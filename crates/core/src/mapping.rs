//! Field mapping between roster columns and template placeholders.
//!
//! The roster generators this replaces varied placeholder keys and
//! column names between deployments, so both are configurable. The
//! default mapping reproduces the canonical variant; a JSON file can
//! override keys and add header aliases for a specific roster layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::fold_header;

/// A roster field a table column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterField {
    /// Team name (the grouping key).
    TeamName,
    /// School name.
    School,
    /// City/state line.
    CityState,
    /// Member name.
    MemberName,
    /// Member role (leader/escort/student).
    Role,
    /// Launch range in meters.
    Range,
}

/// Placeholder keys and header aliases for one roster layout.
///
/// Deserializable from JSON, e.g.:
///
/// ```json
/// {
///   "team_name_key": "NOME_EQUIPE",
///   "range_label": "ALCANCE",
///   "header_aliases": { "agremiacao": "team_name" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Placeholder key for the team name.
    pub team_name_key: String,
    /// Placeholder key for the school.
    pub school_key: String,
    /// Placeholder key for the city/state line.
    pub city_state_key: String,
    /// Placeholder key for the member-name list.
    pub members_key: String,
    /// Placeholder key for the best-range line.
    pub best_range_key: String,
    /// Label prefixed to the formatted range value.
    pub range_label: String,
    /// Extra header-to-field aliases; keys are folded before matching.
    pub header_aliases: HashMap<String, RosterField>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            team_name_key: "TEAM_NAME".to_string(),
            school_key: "SCHOOL".to_string(),
            city_state_key: "CITY_STATE".to_string(),
            members_key: "MEMBERS".to_string(),
            best_range_key: "BEST_RANGE".to_string(),
            range_label: "RANGE".to_string(),
            header_aliases: HashMap::new(),
        }
    }
}

impl FieldMapping {
    /// Create the default mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a header cell to a roster field, if recognized.
    ///
    /// Configured aliases win over the built-in header names.
    pub fn field_for_header(&self, header: &str) -> Option<RosterField> {
        let folded = fold_header(header);
        if folded.is_empty() {
            return None;
        }
        if let Some(field) = self
            .header_aliases
            .iter()
            .find(|(alias, _)| fold_header(alias) == folded)
            .map(|(_, field)| *field)
        {
            return Some(field);
        }
        builtin_field(&folded)
    }

    /// Render a placeholder key as the `{{KEY}}` token found in slides.
    pub fn token(key: &str) -> String {
        format!("{{{{{}}}}}", key)
    }
}

/// Built-in header names, English and Portuguese (the original roster
/// corpus is Portuguese).
fn builtin_field(folded: &str) -> Option<RosterField> {
    match folded {
        "team" | "team name" | "equipe" | "nome da equipe" | "nome equipe" => {
            Some(RosterField::TeamName)
        }
        "school" | "school name" | "escola" | "nome da escola" => Some(RosterField::School),
        "city" | "citystate" | "city state" | "cidade" | "cidadeuf" | "cidade uf"
        | "municipio" => Some(RosterField::CityState),
        "member" | "student" | "name" | "aluno" | "nome" | "nome do aluno" | "participante" => {
            Some(RosterField::MemberName)
        }
        "role" | "funcao" | "cargo" | "tipo" => Some(RosterField::Role),
        "range" | "range m" | "distance" | "alcance" | "alcance m" | "melhor alcance" => {
            Some(RosterField::Range)
        }
        _ => None,
    }
}
