//! Pure projections over a point-in-time copy of the record store.

use std::{collections::HashSet, sync::Arc};

use crate::model::{Department, Location, RecordId, TeamMember};

/// Immutable view of all three collections, in fetch order.
#[derive(Clone, Debug)]
pub struct Snapshot {
    members: Arc<[TeamMember]>,
    departments: Arc<[Department]>,
    locations: Arc<[Location]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

impl Snapshot {
    pub fn new(
        members: Vec<TeamMember>,
        departments: Vec<Department>,
        locations: Vec<Location>,
    ) -> Self {
        Self::from_shared(
            Arc::from(members),
            Arc::from(departments),
            Arc::from(locations),
        )
    }

    pub(crate) fn from_shared(
        members: Arc<[TeamMember]>,
        departments: Arc<[Department]>,
        locations: Arc<[Location]>,
    ) -> Self {
        Self {
            members,
            departments,
            locations,
        }
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn member(&self, id: RecordId) -> Option<&TeamMember> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn department(&self, id: RecordId) -> Option<&Department> {
        self.departments.iter().find(|department| department.id == id)
    }

    pub fn location(&self, id: RecordId) -> Option<&Location> {
        self.locations.iter().find(|location| location.id == id)
    }

    /// Members whose manager is `manager_id`, in store order.
    pub fn direct_reports(&self, manager_id: RecordId) -> Vec<&TeamMember> {
        self.members
            .iter()
            .filter(|member| member.manager_id == Some(manager_id))
            .collect()
    }

    /// Case-insensitive search over full name, position and email, combined
    /// with an exact department label match. Empty inputs match everything.
    pub fn filter_members(&self, search: &str, department: &str) -> Vec<&TeamMember> {
        let needle = search.to_lowercase();
        self.members
            .iter()
            .filter(|member| matches_search(member, &needle) && matches_department(member, department))
            .collect()
    }

    /// Distinct department labels carried by members, first-seen order.
    pub fn department_labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .map(|member| member.department.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    pub fn manager_of(&self, id: RecordId) -> Option<&TeamMember> {
        self.member(id)
            .and_then(|member| member.manager_id)
            .and_then(|manager_id| self.member(manager_id))
    }

    /// Managers above `id`, nearest first. Stops at a dangling reference or
    /// the first id already visited, so cyclic data still terminates.
    pub fn management_chain(&self, id: RecordId) -> Vec<&TeamMember> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut cursor = self.manager_of(id);
        while let Some(manager) = cursor {
            if !visited.insert(manager.id) {
                break;
            }
            chain.push(manager);
            cursor = self.manager_of(manager.id);
        }
        chain
    }
}

fn matches_search(member: &TeamMember, needle: &str) -> bool {
    needle.is_empty()
        || member.full_name().to_lowercase().contains(needle)
        || member.position.to_lowercase().contains(needle)
        || member.email.to_lowercase().contains(needle)
}

fn matches_department(member: &TeamMember, department: &str) -> bool {
    department.is_empty() || member.department == department
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(
        id: RecordId,
        name: (&str, &str),
        position: &str,
        department: &str,
        manager_id: Option<RecordId>,
    ) -> TeamMember {
        TeamMember {
            id,
            first_name: name.0.into(),
            last_name: name.1.into(),
            email: format!("{}@example.test", name.0.to_lowercase()),
            position: position.into(),
            department: department.into(),
            department_id: None,
            location_id: None,
            manager_id,
        }
    }

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![
                member(1, ("Ada", "Lovelace"), "CTO", "Engineering", None),
                member(2, ("Grace", "Hopper"), "Compiler Lead", "Engineering", Some(1)),
                member(3, ("Katherine", "Johnson"), "Analyst", "Research", Some(1)),
                member(4, ("Alan", "Turing"), "Researcher", "Research", Some(3)),
            ],
            vec![Department {
                id: 10,
                name: "Engineering".into(),
            }],
            vec![Location {
                id: 20,
                name: "London".into(),
            }],
        )
    }

    fn ids(members: &[&TeamMember]) -> Vec<RecordId> {
        members.iter().map(|member| member.id).collect()
    }

    #[test]
    fn lookup_returns_none_for_unknown_ids() {
        let snapshot = sample();
        assert_eq!(snapshot.member(2).map(|m| m.first_name.as_str()), Some("Grace"));
        assert!(snapshot.member(99).is_none());
        assert_eq!(snapshot.department(10).map(|d| d.name.as_str()), Some("Engineering"));
        assert!(snapshot.location(10).is_none());
    }

    #[test]
    fn direct_reports_keep_store_order() {
        let snapshot = sample();
        assert_eq!(ids(&snapshot.direct_reports(1)), [2, 3]);
        assert_eq!(ids(&snapshot.direct_reports(3)), [4]);
        assert!(snapshot.direct_reports(4).is_empty());
    }

    #[test]
    fn empty_filters_return_everything_in_order() {
        let snapshot = sample();
        assert_eq!(ids(&snapshot.filter_members("", "")), [1, 2, 3, 4]);
    }

    #[test]
    fn search_spans_name_position_and_email() {
        let snapshot = sample();
        assert_eq!(ids(&snapshot.filter_members("ada love", "")), [1]);
        assert_eq!(ids(&snapshot.filter_members("COMPILER", "")), [2]);
        assert_eq!(ids(&snapshot.filter_members("katherine@", "")), [3]);
        assert_eq!(ids(&snapshot.filter_members("re", "Research")), [4]);
        assert!(snapshot.filter_members("nobody", "").is_empty());
    }

    #[test]
    fn department_filter_is_exact() {
        let snapshot = sample();
        assert_eq!(ids(&snapshot.filter_members("", "Research")), [3, 4]);
        assert!(snapshot.filter_members("", "research").is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let snapshot = sample();
        let once = ids(&snapshot.filter_members("a", "Engineering"));
        let twice = ids(&snapshot.filter_members("a", "Engineering"));
        assert_eq!(once, twice);

        let narrowed = Snapshot::new(
            snapshot
                .filter_members("a", "Engineering")
                .into_iter()
                .cloned()
                .collect(),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(ids(&narrowed.filter_members("a", "Engineering")), once);
    }

    #[test]
    fn department_labels_are_distinct() {
        assert_eq!(sample().department_labels(), ["Engineering", "Research"]);
    }

    #[test]
    fn management_chain_walks_upwards() {
        let snapshot = sample();
        assert_eq!(ids(&snapshot.management_chain(4)), [3, 1]);
        assert!(snapshot.management_chain(1).is_empty());
        assert_eq!(snapshot.manager_of(2).map(|m| m.id), Some(1));
    }

    #[test]
    fn management_chain_survives_cycles() {
        let snapshot = Snapshot::new(
            vec![
                member(1, ("A", "A"), "x", "d", Some(3)),
                member(2, ("B", "B"), "x", "d", Some(1)),
                member(3, ("C", "C"), "x", "d", Some(2)),
            ],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(ids(&snapshot.management_chain(1)), [3, 2]);
        let self_managed = Snapshot::new(
            vec![member(5, ("S", "S"), "x", "d", Some(5))],
            Vec::new(),
            Vec::new(),
        );
        assert!(self_managed.management_chain(5).is_empty());
    }
}
