//! Owns the entity graph of one or more documents and provides the operations on it.
//!
//! A [Container] holds two roots: the top level which receives every regular document and the
//! root of the common definitions. Common definitions (the standard pack, channel, stream and
//! track formats) are preloaded once and can then be referenced by any document. They are
//! immutable and are never written as part of the top level.
//!
//! # Example
//!
//! ```
//! # use adm::container::{Container, ContainerSettings};
//! # use adm::schema::Schema;
//! # use adm::status::AdmResult;
//! # fn main() -> AdmResult<()> {
//! let mut container = Container::new(Schema::load()?, ContainerSettings::default());
//! container.read(br#"<audioFormatExtended>
//!     <audioObject audioObjectID="AO_1001" audioObjectName="Dialog"><gain>0.5</gain></audioObject>
//! </audioFormatExtended>"#)?;
//!
//! let output = container.write_to_bytes(64)?;
//! assert_eq!(
//!     std::str::from_utf8(&output).unwrap(),
//!     r#"<?xml version="1.0" encoding="UTF-8"?>
//! <audioFormatExtended>
//!     <audioObject audioObjectID="AO_1001" audioObjectName="Dialog">
//!         <gain>0.5</gain>
//!     </audioObject>
//! </audioFormatExtended>
//! "#
//! );
//! # Ok(())
//! # }
//! ```
use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};

use crate::adm_error;
use crate::config::Config;
use crate::graph::entities::EntityStore;
use crate::graph::ids::{EntityId, IdAllocator};
use crate::graph::relationships::{RelationKind, RelationshipStore};
use crate::graph::values::AttributeValue;
use crate::schema::{AttributeTag, EntityKind, Schema};
use crate::status::{AdmResult, Status};
use crate::xml::lines::LineBuffer;
use crate::xml::output::{BytesSink, ChunkSink};
use crate::xml::reader::DocumentReader;
use crate::xml::tokenizer::tokenize;
use crate::xml::writer::{DocumentWriter, WriterSettings};

/// The default size of the chunks used when writing into a file or stream.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Contains the settings of a [Container].
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerSettings {
    /// The file which is loaded by [Container::load_common_definitions].
    pub common_definitions: Option<PathBuf>,
    /// The formatting settings used when writing.
    pub writer: WriterSettings,
    /// The chunk size to use when writing into a file or stream.
    pub buffer_size: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            common_definitions: None,
            writer: WriterSettings::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ContainerSettings {
    /// Reads the settings from the given config, using defaults for everything missing.
    ///
    /// # Example
    /// ```
    /// # use adm::config::Config;
    /// # use adm::container::ContainerSettings;
    /// let config = Config::from_string("
    /// common_definitions: data/common_definitions.xml
    /// writer:
    ///     indent: 2
    /// ").unwrap();
    ///
    /// let settings = ContainerSettings::from_config(&config);
    /// assert_eq!(settings.writer.indent, 2);
    /// assert_eq!(settings.writer.max_indent_depth, 32);
    /// assert_eq!(settings.buffer_size, 8192);
    /// assert!(settings.common_definitions.is_some());
    /// ```
    pub fn from_config(config: &Config) -> Self {
        let defaults = ContainerSettings::default();
        let number = |path: &str, minimum: i64, default: usize| {
            config
                .query(path)
                .as_i64()
                .filter(|value| *value >= minimum)
                .map(|value| value as usize)
                .unwrap_or(default)
        };

        ContainerSettings {
            common_definitions: config
                .query("common_definitions")
                .as_str()
                .map(PathBuf::from),
            writer: WriterSettings {
                indent: number("writer.indent", 0, defaults.writer.indent),
                max_indent_depth: number(
                    "writer.max_indent_depth",
                    0,
                    defaults.writer.max_indent_depth,
                ),
            },
            buffer_size: number("writer.buffer_size", 1, defaults.buffer_size),
        }
    }
}

/// Stores the entities and relationships of the documents read so far.
pub struct Container {
    schema: Arc<Schema>,
    settings: ContainerSettings,
    entities: EntityStore,
    relationships: RelationshipStore,
    allocator: IdAllocator,
}

impl Container {
    /// Creates an empty container which only contains the two document roots.
    pub fn new(schema: Arc<Schema>, settings: ContainerSettings) -> Self {
        let mut container = Container {
            schema,
            settings,
            entities: EntityStore::default(),
            relationships: RelationshipStore::default(),
            allocator: IdAllocator::new(),
        };
        container.create_roots();

        container
    }

    fn create_roots(&mut self) {
        for root in [EntityId::TOP_LEVEL, EntityId::COMMON_DEFINITIONS] {
            // The store is empty at this point, so this cannot fail...
            let _ = self.entities.add(root, EntityKind::Xml);
        }
    }

    /// Drops all entities, relationships and counters.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.relationships.clear();
        self.allocator.clear();
        self.create_roots();
    }

    /// Reads the given document into the top level.
    pub fn read(&mut self, data: &[u8]) -> AdmResult<()> {
        self.read_document(data, EntityId::TOP_LEVEL, false)
    }

    /// Reads the given file into the top level.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> AdmResult<()> {
        let path = path.as_ref();
        let data = read_file_contents(path)?;

        self.read(&data)
            .map_err(|error| error.context(format!("Failed to process {}", path.display())))
    }

    /// Loads the common definitions from the file named in the settings.
    pub fn load_common_definitions(&mut self) -> AdmResult<()> {
        let path = self
            .settings
            .common_definitions
            .clone()
            .ok_or_else(|| adm_error!(NotFound, "No common definitions are configured"))?;

        log::info!("Loading common definitions from {}...", path.display());
        let data = read_file_contents(&path)?;

        self.load_common_definitions_from(&data)
    }

    /// Loads the given document as common definitions.
    pub fn load_common_definitions_from(&mut self, data: &[u8]) -> AdmResult<()> {
        self.read_document(data, EntityId::COMMON_DEFINITIONS, true)
    }

    fn read_document(&mut self, data: &[u8], root: EntityId, common: bool) -> AdmResult<()> {
        let entities = self.entities.len();
        let relationships = self.relationships.len();

        let data = transcode(data)?;
        let mut lines = LineBuffer::new(&data);
        let result = DocumentReader::new(
            &self.schema,
            &mut self.entities,
            &mut self.relationships,
            &mut self.allocator,
            root,
            common,
        )
        .and_then(|mut reader| {
            tokenize(&mut lines, &mut reader)?;
            reader.finish()
        });

        if let Err(error) = result {
            return Err(match error.position() {
                Some(position) => {
                    let line = lines.line_of(position);
                    error.context(format!("Failed to read document (line {})", line))
                }
                None => error.context("Failed to read document"),
            });
        }

        log::debug!(
            "Read {} lines: {} entities and {} relationships were added.",
            lines.line_of(data.len()),
            self.entities.len() - entities,
            self.relationships.len() - relationships
        );

        Ok(())
    }

    /// Writes the top level into the given sink and returns the number of bytes written.
    pub fn write<S: ChunkSink>(&self, sink: &mut S) -> AdmResult<usize> {
        self.write_from(EntityId::TOP_LEVEL, sink)
    }

    /// Writes the given entity (and everything it contains) into the given sink.
    ///
    /// If a document root is given, the XML declaration is written first.
    pub fn write_from<S: ChunkSink>(&self, root: EntityId, sink: &mut S) -> AdmResult<usize> {
        DocumentWriter::new(
            &self.schema,
            &self.entities,
            &self.relationships,
            &self.allocator,
            self.settings.writer.clone(),
        )
        .write(root, sink)
    }

    /// Writes the top level using chunks of the given size and returns the result.
    pub fn write_to_bytes(&self, chunk_size: usize) -> AdmResult<Bytes> {
        let mut sink = BytesSink::new(chunk_size);
        let _ = self.write(&mut sink)?;

        Ok(sink.into_bytes())
    }

    /// Returns the first `audioFormatExtended` which isn't part of the common definitions.
    pub fn format_root(&self) -> AdmResult<EntityId> {
        self.entities
            .iter_kind(EntityKind::AudioFormatExtended)
            .find(|(_, record)| !record.is_common())
            .map(|(id, _)| id)
            .ok_or_else(|| adm_error!(NotFound, "No audioFormatExtended has been read"))
    }

    /// Changes a value of the given entity.
    ///
    /// The tag must be declared for the element of the entity. Fails with `INVALID_ARGUMENT`
    /// for common or immutable entities and with `VALUE_TYPE_MISMATCH` if the value doesn't
    /// match the type of the tag.
    pub fn set_value(
        &mut self,
        id: EntityId,
        tag: AttributeTag,
        value: AttributeValue,
    ) -> AdmResult<()> {
        let kind = self.entities.get(id)?.kind();
        let descriptor = self.schema.lookup_by_kind_and_reference(kind, false)?;
        let declared = descriptor.value_tag() == Some(tag)
            || descriptor
                .attributes
                .iter()
                .any(|(_, declared)| *declared == tag);
        if tag == AttributeTag::Id || !declared {
            return Err(adm_error!(
                NotFound,
                "The {} has no attribute {:?}",
                descriptor.name,
                tag
            ));
        }

        self.entities.set_value(id, tag, value)
    }

    /// Marks the given entity as (im)mutable.
    pub fn set_mutable(&mut self, id: EntityId, mutable: bool) -> AdmResult<()> {
        self.entities.set_mutable(id, mutable)
    }

    /// Adds a reference from one entity to another.
    ///
    /// Both entities must exist, the source must be an element which can hold `…IDRef` children
    /// and the target must be referenceable. Entities which are part of
    /// the common definitions cannot be changed, but can be referenced. Returns `false` if the
    /// reference already existed.
    pub fn add_reference(&mut self, from: EntityId, to: EntityId) -> AdmResult<bool> {
        let source = self.entities.get(from).map_err(|error| {
            error
                .with_status(Status::InvalidRelationship)
                .context("Unknown source of reference")
        })?;
        if source.is_common() {
            return Err(adm_error!(
                InvalidArgument,
                "The common definition {} cannot be changed",
                from
            ));
        }
        let holds_references = source.kind() != EntityKind::Xml
            && self
                .schema
                .lookup_by_kind_and_reference(source.kind(), false)
                .map(|descriptor| descriptor.is_composite)
                .unwrap_or(false);
        if !holds_references {
            return Err(adm_error!(
                InvalidRelationship,
                "{} cannot hold references",
                from
            ));
        }

        let target = self.entities.get(to).map_err(|error| {
            error
                .with_status(Status::InvalidRelationship)
                .context("Unknown target of reference")
        })?;
        let descriptor = self
            .schema
            .lookup_by_kind_and_reference(target.kind(), true)
            .map_err(|error| error.with_status(Status::InvalidRelationship))?;

        Ok(self
            .relationships
            .add(from, to, RelationKind::Reference, descriptor.kind))
    }

    /// Provides access to all entities.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Provides access to all relationships.
    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    /// Provides access to the id allocator which can parse and render ADM ids.
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Returns the schema in use.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the settings in use.
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }
}

/// Converts UTF-16 input (detected by its byte order mark) into UTF-8.
/// Reads the given file, reporting only a missing file as `NotFound`.
fn read_file_contents(path: &Path) -> AdmResult<Vec<u8>> {
    std::fs::read(path).map_err(|error| match error.kind() {
        ErrorKind::NotFound => adm_error!(NotFound, "Cannot read {}: {}", path.display(), error),
        _ => adm_error!(Error, "Cannot read {}: {}", path.display(), error),
    })
}

fn transcode(data: &[u8]) -> AdmResult<Cow<[u8]>> {
    match Encoding::for_bom(data) {
        Some((encoding, _)) if encoding != UTF_8 => {
            let (text, _, malformed) = encoding.decode(data);
            if malformed {
                return Err(adm_error!(
                    Error,
                    "The document is not valid {}",
                    encoding.name()
                ));
            }

            Ok(Cow::Owned(text.into_owned().into_bytes()))
        }
        _ => Ok(Cow::Borrowed(data)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::container::{Container, ContainerSettings};
    use crate::graph::ids::EntityId;
    use crate::graph::relationships::{RelationKind, Relationship};
    use crate::graph::values::AttributeValue;
    use crate::schema::{AttributeTag, EntityKind};
    use crate::status::Status;
    use crate::testing::{container, container_with_common_definitions, DOLBY_E_51_20, SCHEMA};
    use crate::xml::output::BytesSink;

    fn relationships(container: &Container) -> HashSet<Relationship> {
        container.relationships().iter().copied().collect()
    }

    #[test]
    fn documents_survive_a_round_trip() {
        let mut first = container_with_common_definitions();
        first.read(DOLBY_E_51_20.as_bytes()).unwrap();
        let output = first.write_to_bytes(4096).unwrap();

        let mut second = container_with_common_definitions();
        second.read(&output).unwrap();

        assert_eq!(
            first.entities().iter().collect::<Vec<_>>(),
            second.entities().iter().collect::<Vec<_>>()
        );
        assert_eq!(relationships(&first), relationships(&second));
        assert_eq!(output, second.write_to_bytes(4096).unwrap());
    }

    #[test]
    fn the_chunk_size_does_not_change_the_output() {
        let mut container = container_with_common_definitions();
        container.read(DOLBY_E_51_20.as_bytes()).unwrap();

        let expected = container.write_to_bytes(4096).unwrap();
        assert!(expected.starts_with(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<frame "));
        assert_eq!(container.write_to_bytes(64).unwrap(), expected);
        assert_eq!(container.write_to_bytes(1).unwrap(), expected);

        let mut sink = BytesSink::new(7);
        assert_eq!(container.write(&mut sink).unwrap(), expected.len());
    }

    #[test]
    fn documents_can_be_read_from_files() {
        let mut container = container_with_common_definitions();
        container.read_file("test-data/dolbyE_51_20.xml").unwrap();
        assert_eq!(
            container
                .entities()
                .iter_kind(EntityKind::TrackUid)
                .filter(|(_, record)| !record.is_common())
                .count(),
            8
        );

        assert_eq!(
            container
                .read_file("test-data/unknown.xml")
                .unwrap_err()
                .status(),
            Status::NotFound
        );
        assert_eq!(
            container.read_file("test-data").unwrap_err().status(),
            Status::Error
        );
    }

    #[test]
    fn unreadable_common_definitions_are_reported() {
        for (path, status) in [
            ("test-data/missing.xml", Status::NotFound),
            ("test-data", Status::Error),
        ] {
            let settings = ContainerSettings {
                common_definitions: Some(PathBuf::from(path)),
                ..ContainerSettings::default()
            };
            let mut container = Container::new(SCHEMA.clone(), settings);
            assert_eq!(
                container.load_common_definitions().unwrap_err().status(),
                status
            );
        }
    }

    #[test]
    fn utf16_input_is_transcoded() {
        let document = r#"<?xml version="1.0" encoding="UTF-16"?>
<audioFormatExtended><audioObject audioObjectID="AO_1001" audioObjectName="Dialog"/></audioFormatExtended>"#;
        let mut data = vec![0xFF, 0xFE];
        for unit in document.encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }

        let mut container = container();
        container.read(&data).unwrap();
        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();
        assert_eq!(
            container
                .entities()
                .get_value(object, AttributeTag::Name)
                .unwrap()
                .as_str(),
            Some("Dialog")
        );

        let output = container.write_to_bytes(64).unwrap();
        let output = std::str::from_utf8(&output).unwrap();
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(!output.contains("UTF-16"));

        let mut copy = crate::testing::container();
        copy.read(output.as_bytes()).unwrap();
        assert_eq!(copy.entities().len(), container.entities().len());
    }

    #[test]
    fn common_definitions_are_immutable_but_referenceable() {
        let mut container = container_with_common_definitions();
        let pack = container
            .allocator()
            .parse("AP_00010003", EntityKind::PackFormat)
            .unwrap();
        assert!(container.entities().get(pack).unwrap().is_common());
        assert_eq!(
            container
                .set_value(
                    pack,
                    AttributeTag::Name,
                    AttributeValue::String("Changed".to_owned())
                )
                .unwrap_err()
                .status(),
            Status::InvalidArgument
        );

        container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"/></audioFormatExtended>"#)
            .unwrap();
        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();
        assert!(container.add_reference(object, pack).unwrap());
        assert!(!container.add_reference(object, pack).unwrap());
        assert_eq!(
            container.add_reference(pack, object).unwrap_err().status(),
            Status::InvalidArgument
        );

        let output = container.write_to_bytes(128).unwrap();
        let output = std::str::from_utf8(&output).unwrap();
        assert!(output.contains("<audioPackFormatIDRef>AP_00010003</audioPackFormatIDRef>"));
        assert!(!output.contains("audioPackFormatName"));

        assert_eq!(
            container
                .load_common_definitions_from(crate::testing::COMMON_DEFINITIONS.as_bytes())
                .unwrap_err()
                .status(),
            Status::NotUnique
        );
    }

    #[test]
    fn references_need_existing_targets() {
        let mut container = container();
        container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"><gain>1</gain></audioObject></audioFormatExtended>"#)
            .unwrap();
        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();
        let missing = container
            .allocator()
            .parse("AO_1002", EntityKind::Object)
            .unwrap();
        let gain = container
            .relationships()
            .from(object, Some(RelationKind::Containment))
            .next()
            .unwrap()
            .to;

        assert_eq!(
            container.add_reference(object, missing).unwrap_err().status(),
            Status::InvalidRelationship
        );
        assert_eq!(
            container.add_reference(object, gain).unwrap_err().status(),
            Status::InvalidRelationship
        );
    }

    #[test]
    fn only_composite_elements_hold_references() {
        let mut container = container_with_common_definitions();
        container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"><gain>1</gain></audioObject></audioFormatExtended>"#)
            .unwrap();
        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();
        let pack = container
            .allocator()
            .parse("AP_00010003", EntityKind::PackFormat)
            .unwrap();
        let gain = container
            .relationships()
            .from(object, Some(RelationKind::Containment))
            .next()
            .unwrap()
            .to;
        let edges = container.relationships().len();

        for source in [gain, EntityId::TOP_LEVEL] {
            assert_eq!(
                container.add_reference(source, pack).unwrap_err().status(),
                Status::InvalidRelationship
            );
        }
        assert_eq!(container.relationships().len(), edges);

        let output = container.write_to_bytes(128).unwrap();
        assert!(!std::str::from_utf8(&output)
            .unwrap()
            .contains("audioPackFormatIDRef"));
    }

    #[test]
    fn only_declared_values_can_be_set() {
        let mut container = container();
        container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"/></audioFormatExtended>"#)
            .unwrap();
        let object = container
            .allocator()
            .parse("AO_1001", EntityKind::Object)
            .unwrap();

        assert_eq!(
            container
                .set_value(object, AttributeTag::Rtime, AttributeValue::Bool(true))
                .unwrap_err()
                .status(),
            Status::NotFound
        );
        assert_eq!(
            container
                .set_value(object, AttributeTag::Interact, AttributeValue::Float(1.0))
                .unwrap_err()
                .status(),
            Status::ValueTypeMismatch
        );

        container.set_mutable(object, false).unwrap();
        assert_eq!(
            container
                .set_value(object, AttributeTag::Interact, AttributeValue::Bool(true))
                .unwrap_err()
                .status(),
            Status::InvalidArgument
        );
    }

    #[test]
    fn malformed_documents_report_their_line() {
        let mut container = container();
        let error = container
            .read(b"<audioFormatExtended>\n<audioObject audioObjectID=\"AO_1001\">\n</audioFormatExtended>")
            .unwrap_err();
        assert_eq!(error.status(), Status::Error);
        assert!(error.to_string().contains("(line 3)"), "{}", error);

        // The container remains usable...
        container.clear();
        assert_eq!(container.entities().len(), 2);
        container
            .read(br#"<audioFormatExtended><audioObject audioObjectID="AO_1001"/></audioFormatExtended>"#)
            .unwrap();
    }

    #[test]
    fn the_format_root_is_found() {
        let mut container = container_with_common_definitions();
        assert_eq!(
            container.format_root().unwrap_err().status(),
            Status::NotFound
        );

        container.read(DOLBY_E_51_20.as_bytes()).unwrap();
        let root = container.format_root().unwrap();
        assert_eq!(
            container.relationships().to_kind(root, EntityKind::Object, container.entities()).count(),
            2
        );

        let mut sink = BytesSink::new(256);
        let _ = container.write_from(root, &mut sink).unwrap();
        assert!(sink.into_bytes().starts_with(b"<audioFormatExtended version="));
    }

    #[test]
    fn clearing_restores_the_roots() {
        let mut container = container_with_common_definitions();
        container.read(DOLBY_E_51_20.as_bytes()).unwrap();
        container.clear();

        assert_eq!(container.entities().len(), 2);
        assert!(container.entities().contains(EntityId::TOP_LEVEL));
        assert!(container.entities().contains(EntityId::COMMON_DEFINITIONS));
        assert!(container.relationships().is_empty());
    }

    #[test]
    fn settings_are_read_from_the_config() {
        let config = Config::from_string(
            "
writer:
    indent: 0
    max_indent_depth: 4
    buffer_size: -1
",
        )
        .unwrap();

        let settings = ContainerSettings::from_config(&config);
        assert_eq!(settings.writer.indent, 0);
        assert_eq!(settings.writer.max_indent_depth, 4);
        assert_eq!(settings.buffer_size, 8192);
        assert_eq!(settings.common_definitions, None);
        assert_eq!(
            ContainerSettings::from_config(&Config::empty()),
            ContainerSettings::default()
        );
    }
}
