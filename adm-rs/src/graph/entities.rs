//! Stores the typed attribute records of all entities.
use linked_hash_map::LinkedHashMap;

use crate::adm_error;
use crate::graph::ids::EntityId;
use crate::graph::values::AttributeValue;
use crate::schema::{AttributeTag, EntityKind};
use crate::status::AdmResult;

/// Contains the values of a single entity.
///
/// Values are kept in insertion order, which is also the order in which they are written.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    kind: EntityKind,
    values: LinkedHashMap<AttributeTag, AttributeValue>,
    mutable: bool,
    common: bool,
}

impl EntityRecord {
    /// Returns the kind of the entity.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the value stored for the given tag.
    pub fn value(&self, tag: AttributeTag) -> Option<&AttributeValue> {
        self.values.get(&tag)
    }

    /// Iterates over all values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = (AttributeTag, &AttributeValue)> {
        self.values.iter().map(|(tag, value)| (*tag, value))
    }

    /// Determines if values may still be changed.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Determines if the entity stems from the common definitions.
    pub fn is_common(&self) -> bool {
        self.common
    }
}

/// Maps identifiers to entity records.
///
/// # Example
/// ```
/// # use adm::graph::entities::EntityStore;
/// # use adm::graph::ids::IdAllocator;
/// # use adm::graph::values::AttributeValue;
/// # use adm::schema::{AttributeTag, EntityKind};
/// let allocator = IdAllocator::new();
/// let mut store = EntityStore::default();
///
/// let id = allocator.parse("AO_1001", EntityKind::Object).unwrap();
/// store.add(id, EntityKind::Object).unwrap();
/// store.set_value(id, AttributeTag::Name, AttributeValue::String("Dialog".to_owned())).unwrap();
///
/// assert_eq!(store.get_value(id, AttributeTag::Name).unwrap().as_str(), Some("Dialog"));
/// assert!(store.add(id, EntityKind::Object).is_err());
/// ```
#[derive(Default)]
pub struct EntityStore {
    records: LinkedHashMap<EntityId, EntityRecord>,
}

impl EntityStore {
    /// Creates a new and empty record for the given id.
    ///
    /// Fails with `NOT_UNIQUE` if the id is already in use.
    pub fn add(&mut self, id: EntityId, kind: EntityKind) -> AdmResult<()> {
        if self.records.contains_key(&id) {
            return Err(adm_error!(NotUnique, "The entity {} already exists", id));
        }

        let _ = self.records.insert(
            id,
            EntityRecord {
                kind,
                values: LinkedHashMap::new(),
                mutable: true,
                common: false,
            },
        );

        Ok(())
    }

    /// Fetches the record of the given id.
    pub fn get(&self, id: EntityId) -> AdmResult<&EntityRecord> {
        self.records
            .get(&id)
            .ok_or_else(|| adm_error!(NotFound, "Unknown entity: {}", id))
    }

    fn get_mut(&mut self, id: EntityId) -> AdmResult<&mut EntityRecord> {
        self.records
            .get_mut(&id)
            .ok_or_else(|| adm_error!(NotFound, "Unknown entity: {}", id))
    }

    /// Determines if a record exists for the given id.
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Stores a value for the given tag.
    ///
    /// Fails with `VALUE_TYPE_MISMATCH` if the value doesn't have the type of the tag and with
    /// `INVALID_ARGUMENT` if the entity is immutable (which common definitions always are).
    pub fn set_value(
        &mut self,
        id: EntityId,
        tag: AttributeTag,
        value: AttributeValue,
    ) -> AdmResult<()> {
        let record = self.get_mut(id)?;
        if record.common || !record.mutable {
            return Err(adm_error!(
                InvalidArgument,
                "The entity {} cannot be modified",
                id
            ));
        }
        if value.value_type() != tag.value_type() {
            return Err(adm_error!(
                ValueTypeMismatch,
                "{:?} expects a {:?} value but got {:?}",
                tag,
                tag.value_type(),
                value.value_type()
            ));
        }

        let _ = record.values.insert(tag, value);

        Ok(())
    }

    /// Fetches the value stored for the given tag.
    pub fn get_value(&self, id: EntityId, tag: AttributeTag) -> AdmResult<&AttributeValue> {
        self.get(id)?
            .values
            .get(&tag)
            .ok_or_else(|| adm_error!(NotFound, "The entity {} has no value for {:?}", id, tag))
    }

    /// Controls if values of the given entity may be changed.
    pub fn set_mutable(&mut self, id: EntityId, mutable: bool) -> AdmResult<()> {
        let record = self.get_mut(id)?;
        if record.common {
            return Err(adm_error!(
                InvalidArgument,
                "The common entity {} cannot be made mutable",
                id
            ));
        }
        record.mutable = mutable;

        Ok(())
    }

    /// Marks the entity as part of the common definitions, which also makes it immutable.
    pub fn set_common(&mut self, id: EntityId) -> AdmResult<()> {
        let record = self.get_mut(id)?;
        record.common = true;
        record.mutable = false;

        Ok(())
    }

    /// Invokes the callback for each entity of the given kind which matches the filter.
    ///
    /// Entities are visited in insertion order.
    pub fn for_each<F, C>(&self, kind: EntityKind, filter: F, mut callback: C)
    where
        F: Fn(EntityId, &EntityRecord) -> bool,
        C: FnMut(EntityId, &EntityRecord),
    {
        for (id, record) in self.iter_kind(kind) {
            if filter(id, record) {
                callback(id, record);
            }
        }
    }

    /// Iterates over all entities of the given kind in insertion order.
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.iter().filter(move |(_, record)| record.kind == kind)
    }

    /// Iterates over all entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Determines if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes all entities.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
