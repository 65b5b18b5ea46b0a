//! Provides the schema registry which describes all known ADM elements.
//!
//! Each element of the ADM vocabulary is described by an [EntityDescriptor]. The descriptors
//! are indexed twice: by element name (which is globally unique) and by [EntityKind]. As the
//! definition of an entity (e.g. `audioObject`) and its reference occurrence
//! (`audioObjectIDRef`) share a kind, a lookup by kind alone might be ambiguous.
//!
//! The registry is built once via [Schema::load], which also verifies the invariants of the
//! table, and is then shared by all containers.
//!
//! # Example
//!
//! ```
//! use adm::schema::{EntityKind, Schema};
//! use adm::status::Status;
//!
//! let schema = Schema::load().unwrap();
//!
//! let object = schema.lookup_by_name("audioObject").unwrap();
//! assert_eq!(object.kind, EntityKind::Object);
//!
//! // "audioObject" and "audioObjectIDRef" share the same kind...
//! let lookup = schema.lookup_by_kind(EntityKind::Object).unwrap();
//! assert_eq!(lookup.status(), Status::NotUnique);
//!
//! // ...which is resolved by also specifying whether the reference is requested.
//! let reference = schema.lookup_by_kind_and_reference(EntityKind::Object, true).unwrap();
//! assert_eq!(reference.name, "audioObjectIDRef");
//! ```
use std::sync::Arc;

use fnv::FnvHashMap;

use crate::adm_error;
use crate::status::{AdmResult, Status};

mod kinds;
mod table;

pub use kinds::{AttributeTag, EntityKind, ValueType};

/// Describes an element of the ADM vocabulary.
#[derive(Debug, PartialEq)]
pub struct EntityDescriptor {
    /// The element name as used in XML.
    pub name: &'static str,
    /// The kind of entities described by this element.
    pub kind: EntityKind,
    /// Determines if the element contains child elements.
    pub is_composite: bool,
    /// Determines if the element carries (or references) an ADM id.
    pub has_identifier: bool,
    /// Determines if the element is a reference occurrence like `audioObjectIDRef`.
    pub is_reference: bool,
    /// Determines if the identifier is drawn from the parent's subcomponent counter
    /// rather than the per kind sequence.
    pub ordinal: bool,
    /// Contains the attribute holding the ADM id of a definition or the value slot of a leaf.
    pub identifying_tag: Option<AttributeTag>,
    /// Contains the declared attributes as pairs of XML name and tag.
    pub attributes: &'static [(&'static str, AttributeTag)],
}

impl EntityDescriptor {
    /// Resolves the XML attribute name into its tag.
    ///
    /// # Example
    /// ```
    /// # use adm::schema::{AttributeTag, Schema};
    /// let schema = Schema::load().unwrap();
    /// let programme = schema.lookup_by_name("audioProgramme").unwrap();
    /// assert_eq!(programme.attribute_tag("audioProgrammeName"), Some(AttributeTag::Name));
    /// assert_eq!(programme.attribute_tag("audioObjectName"), None);
    /// ```
    pub fn attribute_tag(&self, name: &str) -> Option<AttributeTag> {
        self.attributes
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .map(|(_, tag)| *tag)
    }

    /// Determines the XML attribute name used by this element for the given tag.
    ///
    /// # Example
    /// ```
    /// # use adm::schema::{AttributeTag, Schema};
    /// let schema = Schema::load().unwrap();
    /// let object = schema.lookup_by_name("audioObject").unwrap();
    /// assert_eq!(object.attribute_name(AttributeTag::Name), Some("audioObjectName"));
    /// assert_eq!(object.attribute_name(AttributeTag::Id), Some("audioObjectID"));
    /// ```
    pub fn attribute_name(&self, tag: AttributeTag) -> Option<&'static str> {
        self.attributes
            .iter()
            .find(|(_, attribute_tag)| *attribute_tag == tag)
            .map(|(name, _)| *name)
    }

    /// Returns the tag which holds the text content of a leaf element.
    pub fn value_tag(&self) -> Option<AttributeTag> {
        if self.has_identifier {
            None
        } else {
            self.identifying_tag
        }
    }
}

/// Represents the result of a lookup by kind.
#[derive(Debug, Copy, Clone)]
pub enum KindLookup {
    /// Exactly one descriptor uses the kind.
    Unique(&'static EntityDescriptor),
    /// Several descriptors use the kind. The first one in table order is reported.
    Ambiguous(&'static EntityDescriptor),
}

impl KindLookup {
    /// Returns the descriptor which has been found.
    pub fn descriptor(&self) -> &'static EntityDescriptor {
        match self {
            KindLookup::Unique(descriptor) | KindLookup::Ambiguous(descriptor) => *descriptor,
        }
    }

    /// Reports [Status::NotUnique] for ambiguous lookups.
    pub fn status(&self) -> Status {
        match self {
            KindLookup::Unique(_) => Status::Ok,
            KindLookup::Ambiguous(_) => Status::NotUnique,
        }
    }

    /// Returns the descriptor or fails if the lookup was ambiguous.
    pub fn unique(self) -> AdmResult<&'static EntityDescriptor> {
        match self {
            KindLookup::Unique(descriptor) => Ok(descriptor),
            KindLookup::Ambiguous(descriptor) => Err(adm_error!(
                NotUnique,
                "The kind {:?} is used by several elements",
                descriptor.kind
            )),
        }
    }
}

/// Provides the registry of all known element descriptors.
pub struct Schema {
    by_name: FnvHashMap<&'static str, &'static EntityDescriptor>,
    by_kind: FnvHashMap<EntityKind, Vec<&'static EntityDescriptor>>,
}

impl Schema {
    /// Builds the registry and verifies the invariants of the descriptor table.
    ///
    /// These are: element names are unique, `(kind, is_reference)` is unique and every
    /// definition declares its identifying attribute.
    pub fn load() -> AdmResult<Arc<Schema>> {
        Schema::from_descriptors(table::DESCRIPTORS).map(Arc::new)
    }

    fn from_descriptors(descriptors: &'static [EntityDescriptor]) -> AdmResult<Schema> {
        let mut schema = Schema {
            by_name: FnvHashMap::default(),
            by_kind: FnvHashMap::default(),
        };

        for descriptor in descriptors {
            if schema.by_name.insert(descriptor.name, descriptor).is_some() {
                return Err(adm_error!(
                    Error,
                    "The element name {} is declared twice",
                    descriptor.name
                ));
            }

            let siblings = schema.by_kind.entry(descriptor.kind).or_default();
            if siblings
                .iter()
                .any(|sibling| sibling.is_reference == descriptor.is_reference)
            {
                return Err(adm_error!(
                    Error,
                    "The kind {:?} is used by more than one {} ({})",
                    descriptor.kind,
                    if descriptor.is_reference {
                        "reference"
                    } else {
                        "definition"
                    },
                    descriptor.name
                ));
            }
            siblings.push(descriptor);

            if descriptor.has_identifier
                && !descriptor.is_reference
                && descriptor.attribute_name(AttributeTag::Id).is_none()
            {
                return Err(adm_error!(
                    Error,
                    "The definition {} doesn't declare its identifying attribute",
                    descriptor.name
                ));
            }
        }

        Ok(schema)
    }

    /// Resolves the descriptor for the given element name.
    pub fn lookup_by_name(&self, name: &str) -> AdmResult<&'static EntityDescriptor> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| adm_error!(NotFound, "Unknown element: {}", name))
    }

    /// Resolves the descriptors which use the given kind.
    ///
    /// # Example
    /// ```
    /// # use adm::schema::{EntityKind, KindLookup, Schema};
    /// let schema = Schema::load().unwrap();
    /// match schema.lookup_by_kind(EntityKind::Gain).unwrap() {
    ///     KindLookup::Unique(descriptor) => assert_eq!(descriptor.name, "gain"),
    ///     _ => panic!("gain should be unique"),
    /// }
    /// ```
    pub fn lookup_by_kind(&self, kind: EntityKind) -> AdmResult<KindLookup> {
        match self.by_kind.get(&kind).map(|descriptors| descriptors.as_slice()) {
            Some([descriptor]) => Ok(KindLookup::Unique(*descriptor)),
            Some([descriptor, ..]) => Ok(KindLookup::Ambiguous(*descriptor)),
            _ => Err(adm_error!(NotFound, "No element uses the kind {:?}", kind)),
        }
    }

    /// Resolves either the definition or the reference descriptor of the given kind.
    pub fn lookup_by_kind_and_reference(
        &self,
        kind: EntityKind,
        is_reference: bool,
    ) -> AdmResult<&'static EntityDescriptor> {
        self.by_kind
            .get(&kind)
            .and_then(|descriptors| {
                descriptors
                    .iter()
                    .find(|descriptor| descriptor.is_reference == is_reference)
            })
            .copied()
            .ok_or_else(|| {
                adm_error!(
                    NotFound,
                    "No {} uses the kind {:?}",
                    if is_reference {
                        "reference"
                    } else {
                        "definition"
                    },
                    kind
                )
            })
    }

    /// Returns all descriptors in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static EntityDescriptor> + '_ {
        self.by_name.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{AttributeTag, EntityDescriptor, EntityKind, KindLookup, Schema};
    use crate::status::Status;

    #[test]
    fn object_lookups_are_ambiguous_unless_qualified() {
        let schema = Schema::load().unwrap();

        let lookup = schema.lookup_by_kind(EntityKind::Object).unwrap();
        assert_eq!(lookup.status(), Status::NotUnique);
        assert!(matches!(lookup, KindLookup::Ambiguous(_)));
        assert_eq!(lookup.unique().unwrap_err().status(), Status::NotUnique);

        let definition = schema
            .lookup_by_kind_and_reference(EntityKind::Object, false)
            .unwrap();
        assert_eq!(definition.name, "audioObject");
        let reference = schema
            .lookup_by_kind_and_reference(EntityKind::Object, true)
            .unwrap();
        assert_eq!(reference.name, "audioObjectIDRef");
    }

    #[test]
    fn complementary_objects_are_references_only() {
        let schema = Schema::load().unwrap();

        let lookup = schema.lookup_by_kind(EntityKind::ComplementaryObject).unwrap();
        assert_eq!(lookup.status(), Status::Ok);
        assert_eq!(lookup.descriptor().name, "audioComplementaryObjectIDRef");
        assert_eq!(
            schema
                .lookup_by_kind_and_reference(EntityKind::ComplementaryObject, false)
                .unwrap_err()
                .status(),
            Status::NotFound
        );
    }

    #[test]
    fn unknown_names_are_reported() {
        let schema = Schema::load().unwrap();
        assert_eq!(
            schema.lookup_by_name("vendorExtension").unwrap_err().status(),
            Status::NotFound
        );
    }

    #[test]
    fn table_is_consistent() {
        let schema = Schema::load().unwrap();
        for descriptor in schema.descriptors() {
            if descriptor.is_reference {
                assert!(descriptor.has_identifier, "{}", descriptor.name);
                assert!(!descriptor.is_composite, "{}", descriptor.name);
            }
            if let Some(tag) = descriptor.value_tag() {
                assert!(!descriptor.is_composite, "{}", descriptor.name);
                assert_eq!(descriptor.attribute_name(tag), None, "{}", descriptor.name);
            }
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        static BROKEN: &[EntityDescriptor] = &[
            EntityDescriptor {
                name: "gain",
                kind: EntityKind::Gain,
                is_composite: false,
                has_identifier: false,
                is_reference: false,
                ordinal: true,
                identifying_tag: Some(AttributeTag::Gain),
                attributes: &[],
            },
            EntityDescriptor {
                name: "gain",
                kind: EntityKind::Width,
                is_composite: false,
                has_identifier: false,
                is_reference: false,
                ordinal: true,
                identifying_tag: Some(AttributeTag::Width),
                attributes: &[],
            },
        ];

        assert_eq!(
            Schema::from_descriptors(BROKEN).err().unwrap().status(),
            Status::Error
        );
    }
}
