//! Domain types for the roster and the per-team records fed into the
//! slide template.

use serde::{Deserialize, Serialize};

use crate::normalize::fold_header;

/// A raw table lifted out of the roster document.
///
/// Rows are cell texts in document order; paragraphs inside a cell are
/// joined with `\n`. No interpretation has happened yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    /// Rows of cell text, including the header row.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row of cells.
    pub fn add_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// The header row, if the table has any rows.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    /// Data rows (everything after the header).
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    /// Whether the table has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Role of a roster member within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    /// Team leader; listed first on the slide.
    Leader,
    /// Accompanying adult (teacher/chaperone); listed after the leader.
    Escort,
    /// Regular student member.
    Student,
}

impl MemberRole {
    /// Parse a role cell, accent- and case-insensitively.
    ///
    /// Unknown or empty role text falls back to [`MemberRole::Student`].
    pub fn parse(cell: &str) -> Self {
        match fold_header(cell).as_str() {
            "leader" | "lider" | "capitao" | "captain" => Self::Leader,
            "escort" | "chaperone" | "acompanhante" | "professor" | "professora" => Self::Escort,
            _ => Self::Student,
        }
    }

    /// Ordering rank used when listing members (leader first).
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Leader => 0,
            Self::Escort => 1,
            Self::Student => 2,
        }
    }
}

/// A single team member from the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member name as written in the roster.
    pub name: String,
    /// Role within the team.
    pub role: MemberRole,
}

impl TeamMember {
    /// Create a new member.
    pub fn new(name: impl Into<String>, role: MemberRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// One aggregated record per competition team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Team name (the grouping key).
    pub name: String,

    /// School the team represents, if the roster has that column.
    pub school: Option<String>,

    /// City/state line, if the roster has that column.
    pub city_state: Option<String>,

    /// Members in roster order.
    pub members: Vec<TeamMember>,

    /// Best recorded range in meters across the team's rows.
    pub best_range_m: Option<f64>,

    /// Columns the header map did not recognize, kept as
    /// (folded header, first non-empty value) pairs.
    pub extras: Vec<(String, String)>,
}

impl TeamRecord {
    /// Create a new record for the given team name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            school: None,
            city_state: None,
            members: Vec::new(),
            best_range_m: None,
            extras: Vec::new(),
        }
    }

    /// Add a member.
    pub fn add_member(&mut self, member: TeamMember) {
        self.members.push(member);
    }

    /// Record a range measurement, keeping the team's maximum.
    pub fn record_range(&mut self, meters: f64) {
        match self.best_range_m {
            Some(best) if best >= meters => {}
            _ => self.best_range_m = Some(meters),
        }
    }

    /// Member names ordered leader, escort, then students, preserving
    /// roster order within each role.
    pub fn member_names_ordered(&self) -> Vec<&str> {
        let mut indexed: Vec<(u8, usize, &str)> = self
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.role.rank(), i, m.name.as_str()))
            .collect();
        indexed.sort_by_key(|&(rank, idx, _)| (rank, idx));
        indexed.into_iter().map(|(_, _, name)| name).collect()
    }
}

/// An ordered collection of team records, ready for slide generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// Teams in presentation order.
    pub teams: Vec<TeamRecord>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of teams.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the roster has no teams.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Sort teams by best range, descending (competition ranking).
    ///
    /// Teams without a parseable range sort after all ranked teams;
    /// the sort is stable, so ties keep roster order.
    pub fn sort_by_range(&mut self) {
        self.teams.sort_by(|a, b| {
            match (a.best_range_m, b.best_range_m) {
                (Some(ra), Some(rb)) => rb
                    .partial_cmp(&ra)
                    .unwrap_or(std::cmp::Ordering::Equal),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_parse() {
        assert_eq!(MemberRole::parse("Líder"), MemberRole::Leader);
        assert_eq!(MemberRole::parse("LIDER"), MemberRole::Leader);
        assert_eq!(MemberRole::parse("Acompanhante"), MemberRole::Escort);
        assert_eq!(MemberRole::parse("Aluno"), MemberRole::Student);
        assert_eq!(MemberRole::parse(""), MemberRole::Student);
    }

    #[test]
    fn test_record_range_keeps_max() {
        let mut team = TeamRecord::new("Alpha");
        team.record_range(10.0);
        team.record_range(25.5);
        team.record_range(12.0);
        assert_eq!(team.best_range_m, Some(25.5));
    }

    #[test]
    fn test_member_names_ordered() {
        let mut team = TeamRecord::new("Alpha");
        team.add_member(TeamMember::new("Student A", MemberRole::Student));
        team.add_member(TeamMember::new("The Leader", MemberRole::Leader));
        team.add_member(TeamMember::new("Student B", MemberRole::Student));
        team.add_member(TeamMember::new("The Escort", MemberRole::Escort));

        assert_eq!(
            team.member_names_ordered(),
            vec!["The Leader", "The Escort", "Student A", "Student B"]
        );
    }

    #[test]
    fn test_sort_by_range_descending() {
        let mut roster = Roster::new();
        let mut a = TeamRecord::new("A");
        a.record_range(10.0);
        let mut b = TeamRecord::new("B");
        b.record_range(30.0);
        let c = TeamRecord::new("C"); // no range
        let mut d = TeamRecord::new("D");
        d.record_range(20.0);
        roster.teams = vec![a, c, b, d];

        roster.sort_by_range();

        let names: Vec<&str> = roster.teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_sort_by_range_stable_on_ties() {
        let mut roster = Roster::new();
        let mut a = TeamRecord::new("First");
        a.record_range(15.0);
        let mut b = TeamRecord::new("Second");
        b.record_range(15.0);
        roster.teams = vec![a, b];

        roster.sort_by_range();

        assert_eq!(roster.teams[0].name, "First");
        assert_eq!(roster.teams[1].name, "Second");
    }

    #[test]
    fn test_raw_table_rows() {
        let mut table = RawTable::new();
        table.add_row(vec!["Team".into(), "School".into()]);
        table.add_row(vec!["Alpha".into(), "North High".into()]);

        assert_eq!(table.header().unwrap(), &["Team", "School"]);
        assert_eq!(table.data_rows().len(), 1);
    }
}
