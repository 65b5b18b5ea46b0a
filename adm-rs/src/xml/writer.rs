//! Serializes the entity graph back into XML.
//!
//! Starting at a root entity, the writer walks the containment edges in insertion order. Each
//! element is written as its open tag (with the ADM id rendered as identifying attribute and all
//! other values as attributes in insertion order), the scalar value of leaf elements, all
//! contained children and finally one `…IDRef` element per reference.
//!
//! If the root is one of the document roots, the XML declaration is emitted first, followed by
//! the elements contained in the root. As the output is always UTF-8, the declaration states so,
//! no matter which encoding the input declared.
use quick_xml::escape::escape;

use crate::graph::entities::{EntityRecord, EntityStore};
use crate::graph::ids::{EntityId, IdAllocator};
use crate::graph::relationships::{RelationKind, RelationshipStore};
use crate::graph::values::AttributeValue;
use crate::schema::{AttributeTag, EntityDescriptor, EntityKind, Schema};
use crate::status::AdmResult;
use crate::xml::output::{ChunkSink, Output};

const SPACES: &[u8] = &[b' '; 64];

/// Contains the formatting settings of a writer.
#[derive(Clone, Debug, PartialEq)]
pub struct WriterSettings {
    /// The number of spaces per nesting level.
    pub indent: usize,
    /// The nesting level after which the indentation stops growing.
    pub max_indent_depth: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        WriterSettings {
            indent: 4,
            max_indent_depth: 32,
        }
    }
}

/// Determines how an element is written.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WriteMethod {
    /// A leaf without attributes: `<gain>0.5</gain>`.
    Immediate,
    /// An element without children: `<position coordinate="azimuth">30</position>` or
    /// `<audioTrackUID UID="ATU_00000001"/>`.
    Simple,
    /// An element with contained or referenced children, written on several lines.
    Compound,
}

/// Writes the entities reachable from a root as XML.
pub struct DocumentWriter<'a> {
    schema: &'a Schema,
    entities: &'a EntityStore,
    relationships: &'a RelationshipStore,
    allocator: &'a IdAllocator,
    settings: WriterSettings,
}

impl<'a> DocumentWriter<'a> {
    /// Creates a writer for the given graph.
    pub fn new(
        schema: &'a Schema,
        entities: &'a EntityStore,
        relationships: &'a RelationshipStore,
        allocator: &'a IdAllocator,
        settings: WriterSettings,
    ) -> Self {
        DocumentWriter {
            schema,
            entities,
            relationships,
            allocator,
            settings,
        }
    }

    /// Determines how the given entity is written.
    pub fn write_method(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> AdmResult<WriteMethod> {
        let record = self.entities.get(id)?;
        if self.relationships.from(id, None).next().is_some() {
            Ok(WriteMethod::Compound)
        } else if !descriptor.is_composite
            && record.values().all(|(tag, _)| Some(tag) == descriptor.value_tag())
        {
            Ok(WriteMethod::Immediate)
        } else {
            Ok(WriteMethod::Simple)
        }
    }

    /// Writes everything reachable from the given root and returns the number of bytes written.
    pub fn write<S: ChunkSink>(&self, root: EntityId, sink: &mut S) -> AdmResult<usize> {
        let mut output = Output::new(sink);
        let record = self.entities.get(root)?;
        if record.kind() == EntityKind::Xml {
            self.write_declaration(&mut output, record)?;
            for edge in self.relationships.from(root, Some(RelationKind::Containment)) {
                self.write_element(&mut output, edge.to, 0)?;
            }
        } else {
            self.write_element(&mut output, root, 0)?;
        }

        output.finish()
    }

    fn write_declaration<S: ChunkSink>(
        &self,
        output: &mut Output<S>,
        record: &EntityRecord,
    ) -> AdmResult<()> {
        let version = record
            .value(AttributeTag::Version)
            .map(|value| value.to_string())
            .unwrap_or_else(|| "1.0".to_owned());

        output.write_str("<?xml version=\"")?;
        output.write(&escape(version.as_bytes()))?;
        output.write_str("\" encoding=\"UTF-8\"")?;
        if let Some(standalone) = record.value(AttributeTag::Standalone) {
            output.write_str(" standalone=\"")?;
            output.write(&escape(standalone.to_string().as_bytes()))?;
            output.write_str("\"")?;
        }
        output.write_str("?>\n")
    }

    fn indent<S: ChunkSink>(&self, output: &mut Output<S>, depth: usize) -> AdmResult<()> {
        let mut width = self
            .settings
            .indent
            .saturating_mul(depth.min(self.settings.max_indent_depth));
        while width > 0 {
            let chunk = width.min(SPACES.len());
            output.write(&SPACES[..chunk])?;
            width -= chunk;
        }

        Ok(())
    }

    fn write_element<S: ChunkSink>(
        &self,
        output: &mut Output<S>,
        id: EntityId,
        depth: usize,
    ) -> AdmResult<()> {
        let record = self.entities.get(id)?;
        let descriptor = self
            .schema
            .lookup_by_kind_and_reference(record.kind(), false)?;
        let method = self.write_method(descriptor, id)?;

        self.indent(output, depth)?;
        output.write_str("<")?;
        output.write_str(descriptor.name)?;
        self.write_attributes(output, descriptor, id, record)?;

        let value = descriptor.value_tag().and_then(|tag| record.value(tag));
        match (method, value) {
            (WriteMethod::Compound, _) => {
                output.write_str(">")?;
                if let Some(value) = value {
                    write_value(output, value)?;
                }
                output.write_str("\n")?;
                self.write_children(output, id, depth + 1)?;
                self.indent(output, depth)?;
            }
            (_, Some(value)) => {
                output.write_str(">")?;
                write_value(output, value)?;
            }
            (_, None) => return output.write_str("/>\n"),
        }

        output.write_str("</")?;
        output.write_str(descriptor.name)?;
        output.write_str(">\n")
    }

    fn write_attributes<S: ChunkSink>(
        &self,
        output: &mut Output<S>,
        descriptor: &EntityDescriptor,
        id: EntityId,
        record: &EntityRecord,
    ) -> AdmResult<()> {
        if descriptor.has_identifier {
            if let Some(name) = descriptor.attribute_name(AttributeTag::Id) {
                write_attribute(output, name, &self.allocator.render(id)?)?;
            }
        }

        for (tag, value) in record.values() {
            if Some(tag) == descriptor.value_tag() {
                continue;
            }
            if let Some(name) = descriptor.attribute_name(tag) {
                match (tag, value) {
                    (AttributeTag::TypeDefinition, AttributeValue::AudioType(audio_type)) => {
                        write_attribute(output, name, audio_type.definition())?
                    }
                    _ => write_attribute(output, name, &value.to_string())?,
                }
            }
        }

        Ok(())
    }

    fn write_children<S: ChunkSink>(
        &self,
        output: &mut Output<S>,
        id: EntityId,
        depth: usize,
    ) -> AdmResult<()> {
        for edge in self.relationships.from(id, Some(RelationKind::Containment)) {
            self.write_element(output, edge.to, depth)?;
        }

        for edge in self.relationships.from(id, Some(RelationKind::Reference)) {
            let descriptor = self.schema.lookup_by_kind_and_reference(edge.role, true)?;
            self.indent(output, depth)?;
            output.write_str("<")?;
            output.write_str(descriptor.name)?;
            output.write_str(">")?;
            output.write_str(&self.allocator.render(edge.to)?)?;
            output.write_str("</")?;
            output.write_str(descriptor.name)?;
            output.write_str(">\n")?;
        }

        Ok(())
    }
}

fn write_attribute<S: ChunkSink>(output: &mut Output<S>, name: &str, value: &str) -> AdmResult<()> {
    output.write_str(" ")?;
    output.write_str(name)?;
    output.write_str("=\"")?;
    output.write(&escape(value.as_bytes()))?;
    output.write_str("\"")
}

fn write_value<S: ChunkSink>(output: &mut Output<S>, value: &AttributeValue) -> AdmResult<()> {
    output.write(&escape(value.to_string().as_bytes()))
}
