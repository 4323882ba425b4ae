//! Core domain types, roster aggregation, and placeholder mapping
//! for competition slide-deck generation.

pub mod error;
pub mod mapping;
pub mod normalize;
pub mod roster;
pub mod types;

pub use error::{Error, Result};
pub use mapping::{FieldMapping, RosterField};
pub use roster::HeaderMap;
pub use types::{MemberRole, RawTable, Roster, TeamMember, TeamRecord};
