//! Stores the directed edges between entities.
//!
//! An edge is either a containment (the child element is nested in its parent) or a reference
//! (the parent holds an `…IDRef` element pointing to the target). Next to its kind, each edge
//! records its role: the kind of the element through which it was expressed. This is what tells
//! an `audioComplementaryObjectIDRef` apart from an `audioObjectIDRef`.
use fnv::{FnvHashMap, FnvHashSet};

use crate::graph::entities::EntityStore;
use crate::graph::ids::EntityId;
use crate::schema::EntityKind;

/// Enumerates the kinds of relationships.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RelationKind {
    /// The target is nested within the source.
    Containment,
    /// The source references the target by its ADM id.
    Reference,
}

/// Represents a directed edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Relationship {
    /// The source of the edge.
    pub from: EntityId,
    /// The target of the edge.
    pub to: EntityId,
    /// The kind of the edge.
    pub kind: RelationKind,
    /// The kind of the element which expressed the edge.
    pub role: EntityKind,
}

/// Keeps all relationships in insertion order.
///
/// # Example
/// ```
/// # use adm::graph::ids::IdAllocator;
/// # use adm::graph::relationships::{RelationKind, RelationshipStore};
/// # use adm::schema::EntityKind;
/// let allocator = IdAllocator::new();
/// let object = allocator.parse("AO_1001", EntityKind::Object).unwrap();
/// let pack = allocator.parse("AP_00010002", EntityKind::PackFormat).unwrap();
///
/// let mut store = RelationshipStore::default();
/// assert!(store.add(object, pack, RelationKind::Reference, EntityKind::PackFormat));
/// // Identical edges are only stored once...
/// assert!(!store.add(object, pack, RelationKind::Reference, EntityKind::PackFormat));
///
/// assert!(store.exists(object, pack));
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Default)]
pub struct RelationshipStore {
    edges: Vec<Relationship>,
    outgoing: FnvHashMap<EntityId, Vec<usize>>,
    keys: FnvHashSet<(EntityId, EntityId, RelationKind, EntityKind)>,
}

impl RelationshipStore {
    /// Adds an edge unless an edge with the same source, target, kind and role already exists.
    ///
    /// The same pair of entities may therefore be connected several times, as long as each edge
    /// plays another role (e.g. `audioObjectIDRef` and `audioComplementaryObjectIDRef`).
    ///
    /// Returns `true` if the edge was added.
    pub fn add(&mut self, from: EntityId, to: EntityId, kind: RelationKind, role: EntityKind) -> bool {
        if !self.keys.insert((from, to, kind, role)) {
            return false;
        }

        self.outgoing.entry(from).or_default().push(self.edges.len());
        self.edges.push(Relationship {
            from,
            to,
            kind,
            role,
        });

        true
    }

    /// Determines if any edge leads from `from` to `to`.
    pub fn exists(&self, from: EntityId, to: EntityId) -> bool {
        self.outgoing(from).any(|edge| edge.to == to)
    }

    /// Determines if any edge leads from `from` to an entity of the given kind.
    pub fn exists_with_target_kind(
        &self,
        from: EntityId,
        kind: EntityKind,
        entities: &EntityStore,
    ) -> bool {
        self.to_kind(from, kind, entities).next().is_some()
    }

    /// Counts the edges which lead from `from` to entities of the given kind.
    pub fn count(&self, from: EntityId, kind: EntityKind, entities: &EntityStore) -> usize {
        self.to_kind(from, kind, entities).count()
    }

    /// Iterates over all edges.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.edges.iter()
    }

    fn outgoing(&self, from: EntityId) -> impl Iterator<Item = &Relationship> {
        self.outgoing
            .get(&from)
            .into_iter()
            .flatten()
            .filter_map(move |index| self.edges.get(*index))
    }

    /// Iterates over the edges starting at `from`, optionally limited to the given kind.
    pub fn from(
        &self,
        from: EntityId,
        kind: Option<RelationKind>,
    ) -> impl Iterator<Item = &Relationship> {
        self.outgoing(from)
            .filter(move |edge| kind.map_or(true, |kind| edge.kind == kind))
    }

    /// Iterates over the edges of the given kind starting at `from` which match the predicate.
    pub fn from_filtered<'a, P>(
        &'a self,
        from: EntityId,
        kind: RelationKind,
        predicate: P,
    ) -> impl Iterator<Item = &'a Relationship>
    where
        P: Fn(&Relationship) -> bool + 'a,
    {
        self.from(from, Some(kind))
            .filter(move |edge| predicate(edge))
    }

    /// Iterates over the edges starting at `from` whose target has the given kind.
    ///
    /// Targets which are unknown to the entity store are skipped.
    pub fn to_kind<'a>(
        &'a self,
        from: EntityId,
        kind: EntityKind,
        entities: &'a EntityStore,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.outgoing(from).filter(move |edge| {
            entities
                .get(edge.to)
                .map(|record| record.kind() == kind)
                .unwrap_or(false)
        })
    }

    /// Returns the number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Determines if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Removes all edges.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.outgoing.clear();
        self.keys.clear();
    }
}
