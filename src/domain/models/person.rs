//! Canonical person identity linking legislator records and donor-recipient
//! entities.

use serde::{Deserialize, Serialize};

/// Canonical person identifier, owned by the external identity-resolution
/// collaborator.
pub type PersonId = i64;

/// Legislator record identifier. A person may have served under several
/// legislator records across sessions.
pub type LegislatorId = i64;

/// Campaign-finance entity identifier (committees, donor counterparties).
pub type EntityId = i64;

/// A resolved canonical person.
///
/// Immutable once resolved for a query; this engine never creates or
/// destroys persons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,

    /// Display name as resolved upstream.
    pub display_name: String,

    /// Current party affiliation, when known.
    pub party: Option<String>,

    /// Legislator records this person has served under.
    pub legislator_ids: Vec<LegislatorId>,

    /// Donor-recipient entities (campaign committees) this person controls.
    pub entity_ids: Vec<EntityId>,
}
