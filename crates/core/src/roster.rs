//! Roster aggregation: raw table rows in, one record per team out.
//!
//! The roster table has one row per member; rows sharing a team name
//! collapse into a single [`TeamRecord`] carrying the member list and
//! the team's best launch range.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mapping::{FieldMapping, RosterField};
use crate::normalize::{fold_header, parse_range};
use crate::types::{MemberRole, RawTable, Roster, TeamMember, TeamRecord};

/// Column indices resolved from the roster header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    /// Team-name column (required).
    pub team: usize,
    /// School column.
    pub school: Option<usize>,
    /// City/state column.
    pub city_state: Option<usize>,
    /// Member-name column.
    pub member: Option<usize>,
    /// Role column.
    pub role: Option<usize>,
    /// Range column.
    pub range: Option<usize>,
    /// Unrecognized columns as (index, folded header) pairs.
    pub extras: Vec<(usize, String)>,
}

impl HeaderMap {
    /// Resolve a header row against the field mapping.
    ///
    /// The first column matching each field wins; later duplicates are
    /// logged and ignored. A missing team-name column is an error.
    pub fn detect(header: &[String], mapping: &FieldMapping) -> Result<Self> {
        let mut team = None;
        let mut school = None;
        let mut city_state = None;
        let mut member = None;
        let mut role = None;
        let mut range = None;
        let mut extras = Vec::new();

        for (idx, cell) in header.iter().enumerate() {
            match mapping.field_for_header(cell) {
                Some(RosterField::TeamName) => assign(&mut team, idx, cell),
                Some(RosterField::School) => assign(&mut school, idx, cell),
                Some(RosterField::CityState) => assign(&mut city_state, idx, cell),
                Some(RosterField::MemberName) => assign(&mut member, idx, cell),
                Some(RosterField::Role) => assign(&mut role, idx, cell),
                Some(RosterField::Range) => assign(&mut range, idx, cell),
                None => {
                    let folded = fold_header(cell);
                    if !folded.is_empty() {
                        extras.push((idx, folded));
                    }
                }
            }
        }

        let team = team.ok_or_else(|| {
            Error::HeaderError(format!(
                "no team-name column found in header: {:?}",
                header
            ))
        })?;

        Ok(Self {
            team,
            school,
            city_state,
            member,
            role,
            range,
            extras,
        })
    }
}

fn assign(slot: &mut Option<usize>, idx: usize, cell: &str) {
    if slot.is_some() {
        log::debug!("Ignoring duplicate roster column '{}'", cell);
    } else {
        *slot = Some(idx);
    }
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

impl Roster {
    /// Aggregate a raw roster table into team records.
    ///
    /// Rows group by team name in first-occurrence order; each team
    /// keeps its member list (roster order) and the maximum of its
    /// range cells. Teams come back sorted by best range, descending.
    pub fn from_table(table: &RawTable, mapping: &FieldMapping) -> Result<Self> {
        let header = table
            .header()
            .ok_or_else(|| Error::HeaderError("roster table has no rows".to_string()))?;
        let columns = HeaderMap::detect(header, mapping)?;

        let mut roster = Roster::new();

        for (row_idx, row) in table.data_rows().iter().enumerate() {
            let team_name = cell(row, Some(columns.team));
            if team_name.is_empty() {
                log::warn!("Skipping roster row {} with empty team name", row_idx + 2);
                continue;
            }

            let team_idx = match roster.teams.iter().position(|t| t.name == team_name) {
                Some(idx) => idx,
                None => {
                    roster.teams.push(TeamRecord::new(team_name));
                    roster.teams.len() - 1
                }
            };
            let team = &mut roster.teams[team_idx];

            let school = cell(row, columns.school);
            if team.school.is_none() && !school.is_empty() {
                team.school = Some(school.to_string());
            }

            let city_state = cell(row, columns.city_state);
            if team.city_state.is_none() && !city_state.is_empty() {
                team.city_state = Some(city_state.to_string());
            }

            let member_name = cell(row, columns.member);
            if !member_name.is_empty() {
                let role = MemberRole::parse(cell(row, columns.role));
                team.add_member(TeamMember::new(member_name, role));
            }

            let range_cell = cell(row, columns.range);
            if !range_cell.is_empty() {
                match parse_range(range_cell) {
                    Some(meters) => team.record_range(meters),
                    None => log::warn!(
                        "Unparseable range '{}' for team '{}'",
                        range_cell,
                        team_name
                    ),
                }
            }

            for (idx, folded_header) in &columns.extras {
                let value = cell(row, Some(*idx));
                if !value.is_empty() && !team.extras.iter().any(|(k, _)| k == folded_header) {
                    team.extras.push((folded_header.clone(), value.to_string()));
                }
            }
        }

        roster.sort_by_range();
        Ok(roster)
    }
}

impl TeamRecord {
    /// Render this record into a `{{KEY}} → value` substitution map.
    ///
    /// Member names join with `\n` (one slide line each); the range
    /// renders as `LABEL: 12.34 m`, or an empty string when the team
    /// has no parseable range. Unrecognized roster columns become
    /// tokens from their uppercased header (`categoria` →
    /// `{{CATEGORIA}}`).
    pub fn placeholder_map(&self, mapping: &FieldMapping) -> HashMap<String, String> {
        let mut values = HashMap::new();

        values.insert(
            FieldMapping::token(&mapping.team_name_key),
            self.name.clone(),
        );
        values.insert(
            FieldMapping::token(&mapping.school_key),
            self.school.clone().unwrap_or_default(),
        );
        values.insert(
            FieldMapping::token(&mapping.city_state_key),
            self.city_state.clone().unwrap_or_default(),
        );
        values.insert(
            FieldMapping::token(&mapping.members_key),
            self.member_names_ordered().join("\n"),
        );

        let range_line = match self.best_range_m {
            Some(meters) => format!("{}: {:.2} m", mapping.range_label, meters),
            None => String::new(),
        };
        values.insert(FieldMapping::token(&mapping.best_range_key), range_line);

        for (folded_header, value) in &self.extras {
            let key = folded_header.to_uppercase().replace(' ', "_");
            values.insert(FieldMapping::token(&key), value.clone());
        }

        values
    }
}
