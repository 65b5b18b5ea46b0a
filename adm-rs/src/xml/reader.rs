//! Builds the entity graph from the structure reported by the tokenizer.
//!
//! The [DocumentReader] is a push-down automaton: each open element is represented by an
//! [OpenElement] on an explicit stack whose base is the document root.
//!
//! * Unknown elements (and anything nested within leaves or references) are skipped including
//!   their whole subtree. This keeps vendor extensions from breaking ingestion.
//! * Elements without an ADM id are numbered immediately, either by the sequence of their kind
//!   or within their parent.
//! * Definitions collect their attributes until the identifying attribute arrives. Only then is
//!   the entity created and the collected values are stored.
//! * References resolve their text into an identifier and link it to the enclosing entity.
//!   Whether the target actually exists is checked once the document is complete, so that
//!   forward references work.
//! * Closing an element links it to its parent. While reading common definitions, the closed
//!   entity is also marked as common.
use linked_hash_map::LinkedHashMap;

use crate::adm_error;
use crate::graph::entities::EntityStore;
use crate::graph::ids::{EntityId, IdAllocator};
use crate::graph::relationships::{RelationKind, RelationshipStore};
use crate::graph::values::AttributeValue;
use crate::schema::{AttributeTag, EntityDescriptor, Schema};
use crate::status::{AdmResult, Status};
use crate::xml::tokenizer::{TokenHandler, DECLARATION};

/// Tracks the XML declaration, which must precede all elements and may only occur once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeclarationState {
    /// Neither a declaration nor an element has been seen.
    NotStarted,
    /// The attributes of the declaration are being reported.
    InProgress,
    /// The declaration is complete (or was omitted).
    Complete,
}

/// Represents an element on the stack of the reader.
#[derive(Debug)]
pub enum OpenElement {
    /// An unknown (or irrelevant) element whose subtree is skipped.
    Opaque,
    /// A definition which hasn't received its identifying attribute yet.
    Deferred {
        /// The descriptor of the element.
        descriptor: &'static EntityDescriptor,
        /// The attributes received so far in document order.
        attributes: LinkedHashMap<String, String>,
    },
    /// An element whose entity has been created.
    Finalized {
        /// The descriptor of the element.
        descriptor: &'static EntityDescriptor,
        /// The id of the created entity.
        id: EntityId,
    },
    /// A reference occurrence like `audioObjectIDRef`.
    Reference {
        /// The descriptor of the element.
        descriptor: &'static EntityDescriptor,
        /// The id of the referenced entity, once the text has been read.
        resolved: Option<EntityId>,
    },
}

/// Ingests a single document into the given stores.
pub struct DocumentReader<'a> {
    schema: &'a Schema,
    entities: &'a mut EntityStore,
    relationships: &'a mut RelationshipStore,
    allocator: &'a mut IdAllocator,
    root: EntityId,
    common: bool,
    declaration: DeclarationState,
    stack: Vec<OpenElement>,
    pending_references: Vec<(EntityId, EntityId)>,
}

impl<'a> DocumentReader<'a> {
    /// Creates a reader which attaches all top level elements to the given root entity.
    ///
    /// If `common` is set, every entity which is read is marked as common definition.
    pub fn new(
        schema: &'a Schema,
        entities: &'a mut EntityStore,
        relationships: &'a mut RelationshipStore,
        allocator: &'a mut IdAllocator,
        root: EntityId,
        common: bool,
    ) -> AdmResult<Self> {
        let descriptor = schema.lookup_by_kind_and_reference(entities.get(root)?.kind(), false)?;

        Ok(DocumentReader {
            schema,
            entities,
            relationships,
            allocator,
            root,
            common,
            declaration: DeclarationState::NotStarted,
            stack: vec![OpenElement::Finalized {
                descriptor,
                id: root,
            }],
            pending_references: Vec::new(),
        })
    }

    /// Verifies that the document is complete and all references can be resolved.
    pub fn finish(self) -> AdmResult<()> {
        if self.stack.len() != 1 {
            return Err(adm_error!(
                Error,
                "The document ended with {} open elements",
                self.stack.len() - 1
            ));
        }

        for (from, to) in &self.pending_references {
            if !self.entities.contains(*to) {
                return Err(adm_error!(
                    InvalidRelationship,
                    "{} references the unknown entity {}",
                    from,
                    to
                ));
            }
        }

        Ok(())
    }

    fn top(&mut self) -> AdmResult<&mut OpenElement> {
        self.stack
            .last_mut()
            .ok_or_else(|| adm_error!(Error, "No element is open"))
    }

    /// Returns the id of the entity enclosing the innermost element.
    fn enclosing_id(&self) -> AdmResult<EntityId> {
        match self.stack.iter().rev().nth(1) {
            Some(OpenElement::Finalized { id, .. }) => Ok(*id),
            _ => Err(adm_error!(Error, "The element has no enclosing entity")),
        }
    }

    fn open_known_element(
        &mut self,
        parent: EntityId,
        descriptor: &'static EntityDescriptor,
    ) -> AdmResult<OpenElement> {
        if descriptor.is_reference {
            return Ok(OpenElement::Reference {
                descriptor,
                resolved: None,
            });
        }
        if descriptor.has_identifier {
            return Ok(OpenElement::Deferred {
                descriptor,
                attributes: LinkedHashMap::new(),
            });
        }

        let id = if descriptor.ordinal {
            self.allocator.subcomponent_id(descriptor.kind, parent)?
        } else {
            self.allocator.sequence_id(descriptor.kind)?
        };
        self.entities.add(id, descriptor.kind)?;

        Ok(OpenElement::Finalized { descriptor, id })
    }

    /// Creates the entity of a deferred definition once its id is known.
    fn finalize(
        &mut self,
        descriptor: &'static EntityDescriptor,
        text: &str,
        attributes: LinkedHashMap<String, String>,
    ) -> AdmResult<EntityId> {
        let id = self.allocator.parse(text, descriptor.kind)?;
        if self.entities.contains(id) {
            return Err(adm_error!(
                NotUnique,
                "The {} {} is defined more than once",
                descriptor.name,
                text
            ));
        }
        self.entities.add(id, descriptor.kind)?;

        for (name, value) in attributes {
            store_attribute(self.entities, descriptor, id, &name, &value)?;
        }

        Ok(id)
    }

    fn store_declaration(&mut self, name: &str, value: &str) -> AdmResult<()> {
        let descriptor = self.schema.lookup_by_name(DECLARATION)?;
        store_attribute(self.entities, descriptor, self.root, name, value)
    }
}

/// Parses and stores an attribute value, ignoring attributes which aren't declared.
fn store_attribute(
    entities: &mut EntityStore,
    descriptor: &EntityDescriptor,
    id: EntityId,
    name: &str,
    value: &str,
) -> AdmResult<()> {
    match descriptor.attribute_tag(name) {
        Some(AttributeTag::Id) => Err(adm_error!(
            NotUnique,
            "The {} {} received a second identifying attribute",
            descriptor.name,
            id
        )),
        Some(tag) => {
            let value = AttributeValue::parse(tag.value_type(), value)
                .map_err(|error| error.context(format!("Invalid value for {}", name)))?;
            entities.set_value(id, tag, value)
        }
        None => {
            log::debug!(
                "Ignoring unknown attribute {} of {}...",
                name,
                descriptor.name
            );
            Ok(())
        }
    }
}

impl TokenHandler for DocumentReader<'_> {
    fn declaration_start(&mut self) -> AdmResult<()> {
        if self.declaration != DeclarationState::NotStarted {
            return Err(adm_error!(
                Error,
                "The XML declaration must occur once at the start of the document"
            ));
        }
        self.declaration = DeclarationState::InProgress;

        Ok(())
    }

    fn declaration_end(&mut self) -> AdmResult<()> {
        self.declaration = DeclarationState::Complete;
        Ok(())
    }

    fn element_start(&mut self, name: &str) -> AdmResult<()> {
        self.declaration = DeclarationState::Complete;

        let next = match self.top()? {
            OpenElement::Opaque | OpenElement::Reference { .. } => OpenElement::Opaque,
            OpenElement::Deferred { descriptor, .. } => {
                return Err(adm_error!(
                    InvalidArgument,
                    "The {} received a child before its identifying attribute",
                    descriptor.name
                ));
            }
            OpenElement::Finalized { descriptor, .. } if !descriptor.is_composite => {
                OpenElement::Opaque
            }
            OpenElement::Finalized { id, .. } => {
                let parent = *id;
                match self.schema.lookup_by_name(name) {
                    Ok(descriptor) => self.open_known_element(parent, descriptor)?,
                    Err(_) => {
                        log::debug!("Skipping unknown element {}...", name);
                        OpenElement::Opaque
                    }
                }
            }
        };

        self.stack.push(next);
        Ok(())
    }

    fn attribute(&mut self, element: &str, name: &str, value: &str) -> AdmResult<()> {
        if self.declaration == DeclarationState::InProgress && element == DECLARATION {
            return self.store_declaration(name, value);
        }

        match self.top()? {
            OpenElement::Opaque | OpenElement::Reference { .. } => Ok(()),
            OpenElement::Finalized { descriptor, id } => {
                let (descriptor, id) = (*descriptor, *id);
                store_attribute(self.entities, descriptor, id, name, value)
            }
            OpenElement::Deferred {
                descriptor,
                attributes,
            } => {
                let descriptor = *descriptor;
                if descriptor.attribute_tag(name) != Some(AttributeTag::Id) {
                    let _ = attributes.insert(name.to_owned(), value.to_owned());
                    return Ok(());
                }

                let attributes = std::mem::take(attributes);
                let id = self.finalize(descriptor, value, attributes)?;
                *self.top()? = OpenElement::Finalized { descriptor, id };

                Ok(())
            }
        }
    }

    fn element_text(&mut self, _element: &str, text: &str) -> AdmResult<()> {
        match self.top()? {
            OpenElement::Opaque => Ok(()),
            OpenElement::Deferred { descriptor, .. } => Err(adm_error!(
                InvalidArgument,
                "The {} received text before its identifying attribute",
                descriptor.name
            )),
            OpenElement::Finalized { descriptor, id } => {
                let (descriptor, id) = (*descriptor, *id);
                match descriptor.value_tag() {
                    Some(tag) => {
                        let value = AttributeValue::parse(tag.value_type(), text).map_err(
                            |error| error.context(format!("Invalid value for {}", descriptor.name)),
                        )?;
                        self.entities.set_value(id, tag, value)
                    }
                    None => Ok(()),
                }
            }
            OpenElement::Reference {
                descriptor,
                resolved,
            } => {
                if resolved.is_some() {
                    return Err(adm_error!(
                        InvalidRelationship,
                        "The {} contains more than one id",
                        descriptor.name
                    ));
                }

                let descriptor = *descriptor;
                let target = self
                    .allocator
                    .parse(text, descriptor.kind)
                    .map_err(|error| error.with_status(Status::InvalidRelationship))?;
                if let OpenElement::Reference { resolved, .. } = self.top()? {
                    *resolved = Some(target);
                }

                let from = self.enclosing_id()?;
                let _ = self
                    .relationships
                    .add(from, target, RelationKind::Reference, descriptor.kind);
                self.pending_references.push((from, target));

                Ok(())
            }
        }
    }

    fn element_end(&mut self, _name: &str) -> AdmResult<()> {
        if self.stack.len() < 2 {
            return Err(adm_error!(Error, "Unexpected closing tag"));
        }

        let element = self
            .stack
            .pop()
            .ok_or_else(|| adm_error!(Error, "Unexpected closing tag"))?;
        match element {
            OpenElement::Opaque => Ok(()),
            OpenElement::Deferred { descriptor, .. } => Err(adm_error!(
                InvalidArgument,
                "The {} was closed without its identifying attribute",
                descriptor.name
            )),
            OpenElement::Reference {
                descriptor,
                resolved: None,
            } => Err(adm_error!(
                InvalidRelationship,
                "The {} is empty",
                descriptor.name
            )),
            OpenElement::Reference { .. } => Ok(()),
            OpenElement::Finalized { descriptor, id } => {
                if let Some(OpenElement::Finalized { id: parent, .. }) = self.stack.last() {
                    let _ = self.relationships.add(
                        *parent,
                        id,
                        RelationKind::Containment,
                        descriptor.kind,
                    );
                }
                if self.common {
                    self.entities.set_common(id)?;
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::ids::EntityId;
    use crate::graph::relationships::RelationKind;
    use crate::graph::values::AttributeValue;
    use crate::schema::{AttributeTag, EntityKind};
    use crate::status::Status;
    use crate::testing::container;

    #[test]
    fn identifiers_may_arrive_after_other_attributes() {
        let mut container = container();
        container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectName="Dialog" start="00:00:00.00000" audioObjectID="AO_1001">
                        <audioObjectLabel language="en">Dialogue</audioObjectLabel>
                    </audioObject>
                </audioFormatExtended>"#,
            )
            .unwrap();

        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();
        let record = container.entities().get(object).unwrap();
        let tags: Vec<_> = record.values().map(|(tag, _)| tag).collect();
        assert_eq!(tags, vec![AttributeTag::Name, AttributeTag::Start]);

        let label = container
            .relationships()
            .from(object, Some(RelationKind::Containment))
            .next()
            .unwrap()
            .to;
        assert_eq!(label.kind(), EntityKind::ObjectLabel);
        assert_eq!(
            container
                .entities()
                .get_value(label, AttributeTag::Label)
                .unwrap(),
            &AttributeValue::String("Dialogue".to_owned())
        );
    }

    #[test]
    fn unknown_extensions_are_skipped() {
        let mut container = container();
        let entities = container.entities().len();
        let relationships = container.relationships().len();

        container
            .read(
                br#"<vendorExtension version="2">
                    <audioObject audioObjectID="AO_1001"><gain>1</gain></audioObject>
                    <nested><deeper attribute="x">text</deeper></nested>
                </vendorExtension>"#,
            )
            .unwrap();

        assert_eq!(container.entities().len(), entities);
        assert_eq!(container.relationships().len(), relationships);
    }

    #[test]
    fn custom_metadata_sets_are_skipped() {
        let mut plain = container();
        plain.read(b"<audioFormatExtended/>").unwrap();

        let mut custom = container();
        custom
            .read(
                br#"<audioFormatExtended>
                    <audioFormatCustom>
                        <audioFormatCustomSet audioFormatCustomSetType="UNKNOWN_TYPE">
                            <unknownMetadata1>x</unknownMetadata1>
                            <unknownMetadata2 a="1"/>
                        </audioFormatCustomSet>
                    </audioFormatCustom>
                </audioFormatExtended>"#,
            )
            .unwrap();

        assert_eq!(custom.entities().len(), plain.entities().len());
        assert_eq!(custom.relationships().len(), plain.relationships().len());
        assert_eq!(
            custom.write_to_bytes(64).unwrap(),
            plain.write_to_bytes(64).unwrap()
        );
    }

    #[test]
    fn elements_nested_in_leaves_are_skipped() {
        let mut container = container();
        container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectID="AO_1001" vendorFlag="1">
                        <gain>0.5<vendorGain>2</vendorGain></gain>
                    </audioObject>
                </audioFormatExtended>"#,
            )
            .unwrap();

        assert_eq!(container.entities().iter_kind(EntityKind::Gain).count(), 1);
    }

    #[test]
    fn forward_references_are_resolved() {
        let mut container = container();
        container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectID="AO_1001">
                        <audioComplementaryObjectIDRef>AO_1002</audioComplementaryObjectIDRef>
                    </audioObject>
                    <audioObject audioObjectID="AO_1002"/>
                </audioFormatExtended>"#,
            )
            .unwrap();

        let allocator = container.allocator();
        let first = allocator.parse("AO_1001", EntityKind::Object).unwrap();
        let second = allocator.parse("AO_1002", EntityKind::Object).unwrap();
        let edge = container
            .relationships()
            .from(first, Some(RelationKind::Reference))
            .next()
            .unwrap();
        assert_eq!(edge.to, second);
        assert_eq!(edge.role, EntityKind::ComplementaryObject);
    }

    #[test]
    fn the_same_target_may_be_referenced_in_several_roles() {
        let mut container = container();
        container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectID="AO_1001">
                        <audioObjectIDRef>AO_1002</audioObjectIDRef>
                        <audioComplementaryObjectIDRef>AO_1002</audioComplementaryObjectIDRef>
                    </audioObject>
                    <audioObject audioObjectID="AO_1002"/>
                </audioFormatExtended>"#,
            )
            .unwrap();

        let allocator = container.allocator();
        let first = allocator.parse("AO_1001", EntityKind::Object).unwrap();
        let second = allocator.parse("AO_1002", EntityKind::Object).unwrap();
        let edges: Vec<_> = container
            .relationships()
            .from(first, Some(RelationKind::Reference))
            .map(|edge| (edge.to, edge.role))
            .collect();
        assert_eq!(
            edges,
            vec![
                (second, EntityKind::Object),
                (second, EntityKind::ComplementaryObject)
            ]
        );

        let output = String::from_utf8(container.write_to_bytes(256).unwrap().to_vec()).unwrap();
        assert!(output.contains("<audioObjectIDRef>AO_1002</audioObjectIDRef>"));
        assert!(output
            .contains("<audioComplementaryObjectIDRef>AO_1002</audioComplementaryObjectIDRef>"));
    }

    #[test]
    fn unresolvable_references_are_rejected() {
        let mut container = container();
        let error = container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectID="AO_1001">
                        <audioPackFormatIDRef>AP_00019999</audioPackFormatIDRef>
                    </audioObject>
                </audioFormatExtended>"#,
            )
            .unwrap_err();
        assert_eq!(error.status(), Status::InvalidRelationship);

        for document in [
            &br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"><audioPackFormatIDRef>AO_1001</audioPackFormatIDRef></audioObject></audioFormatExtended>"#[..],
            &br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"><audioPackFormatIDRef/></audioObject></audioFormatExtended>"#[..],
        ] {
            let mut container = crate::testing::container();
            assert_eq!(
                container.read(document).unwrap_err().status(),
                Status::InvalidRelationship
            );
        }
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut container = container();
        let error = container
            .read(
                br#"<audioFormatExtended>
                    <audioObject audioObjectID="AO_1001"/>
                    <audioObject audioObjectID="AO_1001"/>
                </audioFormatExtended>"#,
            )
            .unwrap_err();
        assert_eq!(error.status(), Status::NotUnique);
        assert!(error.to_string().contains("line 3"), "{}", error);
    }

    #[test]
    fn definitions_need_their_identifier() {
        for document in [
            &br#"<audioFormatExtended><audioObject audioObjectName="x"/></audioFormatExtended>"#[..],
            &br#"<audioFormatExtended><audioObject><gain>1</gain></audioObject></audioFormatExtended>"#[..],
        ] {
            let mut container = container();
            assert_eq!(
                container.read(document).unwrap_err().status(),
                Status::InvalidArgument
            );
        }
    }

    #[test]
    fn values_must_match_their_type() {
        let mut container = container();
        let error = container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001" interact="maybe"/></audioFormatExtended>"#)
            .unwrap_err();
        assert_eq!(error.status(), Status::ValueTypeMismatch);
    }

    #[test]
    fn declarations_are_stored_on_the_root() {
        let mut container = container();
        container
            .read(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><frame/>"#)
            .unwrap();
        assert_eq!(
            container
                .entities()
                .get_value(EntityId::TOP_LEVEL, AttributeTag::Standalone)
                .unwrap()
                .as_str(),
            Some("yes")
        );

        let mut container = crate::testing::container();
        assert_eq!(
            container
                .read(br#"<frame><?xml version="1.0"?></frame>"#)
                .unwrap_err()
                .status(),
            Status::Error
        );
    }

    #[test]
    fn ordinal_children_are_numbered_per_parent() {
        let mut container = container();
        container
            .read(
                br#"<frame><frameHeader>
                    <transportTrackFormat transportID="TP_0001">
                        <audioTrack trackID="1"/><audioTrack trackID="2"/><audioTrack trackID="3"/>
                    </transportTrackFormat>
                    <transportTrackFormat transportID="TP_0002">
                        <audioTrack trackID="1"/><audioTrack trackID="2"/><audioTrack trackID="3"/>
                    </transportTrackFormat>
                </frameHeader></frame>"#,
            )
            .unwrap();

        let mut tracks = Vec::new();
        for transport in ["TP_0001", "TP_0002"] {
            let transport = container
                .allocator()
                .parse(transport, EntityKind::TransportTrackFormat)
                .unwrap();
            let numbers: Vec<_> = container
                .relationships()
                .from(transport, Some(RelationKind::Containment))
                .map(|edge| {
                    tracks.push(edge.to);
                    edge.to.number()
                })
                .collect();
            assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
        }

        tracks.sort();
        tracks.dedup();
        assert_eq!(tracks.len(), 6);
    }
}
