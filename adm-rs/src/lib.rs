//! ADM is a library for reading, inspecting, modifying and writing audio metadata which follows
//! the **Audio Definition Model** (ITU-R BS.2076) and its serial representation **S-ADM**
//! (ITU-R BS.2125).
//!
//! # Introduction
//! ADM documents describe the audio of a production: which programmes exist, which contents and
//! objects make them up and how each object is rendered via pack, channel, stream and track
//! formats. The format is XML, but processing it as generic XML gets tedious fast: elements are
//! identified by ADM ids like `AO_1001` or `AB_00010001_00000002`, reference each other via
//! `…IDRef` elements and a large part of each document consists of well known *common
//! definitions* which are shared by all documents.
//!
//! Therefore this library maps each document onto a typed **entity graph**: each element becomes
//! an entity with a compact 64-bit id and typed attribute values, nesting becomes containment
//! edges and `…IDRef` elements become reference edges. The graph can be queried, modified and
//! written back as XML.
//!
//! # Features
//! * **Schema driven**: A static table describes every known element: its kind, whether it is
//!   a definition (with an ADM id), a reference or a leaf value and which attributes it supports
//!   (see [schema]).
//! * **Tolerant reading**: Unknown elements (like vendor extensions) are skipped including their
//!   subtree, unknown attributes are ignored. Everything else is validated: ids must be well
//!   formed and unique, values must match their type and every reference must be resolvable
//!   once the document is complete.
//! * **Common definitions**: The standard formats can be preloaded once. They are immutable and
//!   can be referenced by all documents read afterwards (see [container]).
//! * **Chunked output**: The writer emits into caller provided chunks of any size, so that output
//!   can be streamed into files, sockets or fixed buffers (see [xml::output]).
//! * **Stable status codes**: Every error carries one of the [status codes](status::Status)
//!   known by other ADM tooling, along with a readable cause and the line of the input in which
//!   it occurred.
//!
//! # Example
//! ```
//! # use adm::container::{Container, ContainerSettings};
//! # use adm::graph::values::AttributeValue;
//! # use adm::schema::{AttributeTag, EntityKind, Schema};
//! # use adm::status::AdmResult;
//! # fn main() -> AdmResult<()> {
//! let mut container = Container::new(Schema::load()?, ContainerSettings::default());
//! container.read(br#"<audioFormatExtended>
//!     <audioObject audioObjectID="AO_1001" audioObjectName="Dialog"/>
//! </audioFormatExtended>"#)?;
//!
//! let object = container.allocator().parse("AO_1001", EntityKind::Object)?;
//! container.set_value(object, AttributeTag::Importance, AttributeValue::Unsigned(10))?;
//!
//! let output = container.write_to_bytes(1024)?;
//! assert!(std::str::from_utf8(&output)
//!     .unwrap()
//!     .contains(r#"<audioObject audioObjectID="AO_1001" audioObjectName="Dialog" importance="10"/>"#));
//! # Ok(())
//! # }
//! ```
//!
//! # Using ADM
//! A complete example which converts files (and applies the configured formatting) can be found
//! in the **adm-io** binary of this workspace.
#![deny(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results
)]
use simplelog::{format_description, ConfigBuilder, LevelFilter, SimpleLogger};
use std::sync::Once;

#[doc(hidden)]
pub use anyhow;

pub mod config;
pub mod container;
pub mod graph;
pub mod schema;
pub mod status;
pub mod xml;

/// Contains the version of the ADM library.
pub const ADM_VERSION: &str = "DEVELOPMENT-SNAPSHOT";

/// Contains the git commit hash of the ADM build being used.
pub const ADM_REVISION: &str = "NO-REVISION";

/// Initializes the logging system.
///
/// This can safely be called several times, only the first call has an effect.
pub fn init_logging() {
    static INIT_LOGGING: Once = Once::new();

    // Tests might call this several times...
    INIT_LOGGING.call_once(|| {
        if let Err(error) = SimpleLogger::init(
            LevelFilter::Debug,
            ConfigBuilder::new()
                .set_time_format_custom(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
                ))
                .set_thread_level(LevelFilter::Trace)
                .set_target_level(LevelFilter::Error)
                .set_location_level(LevelFilter::Trace)
                .build(),
        ) {
            panic!("Failed to initialize logging system: {}", error);
        }
    });
}

#[cfg(test)]
mod testing {
    use std::sync::Arc;

    use lazy_static::lazy_static;

    use crate::container::{Container, ContainerSettings};
    use crate::schema::Schema;

    lazy_static! {
        /// Provides a schema shared by all tests.
        pub static ref SCHEMA: Arc<Schema> = Schema::load().unwrap();
    }

    /// Contains an S-ADM frame which carries a 5.1 and a stereo programme.
    pub const DOLBY_E_51_20: &str = include_str!("../test-data/dolbyE_51_20.xml");

    /// Contains the standard formats referenced by [DOLBY_E_51_20].
    pub const COMMON_DEFINITIONS: &str = include_str!("../test-data/common_definitions.xml");

    /// Creates an empty container.
    pub fn container() -> Container {
        crate::init_logging();
        Container::new(SCHEMA.clone(), ContainerSettings::default())
    }

    /// Creates a container with preloaded common definitions.
    pub fn container_with_common_definitions() -> Container {
        let mut container = container();
        container
            .load_common_definitions_from(COMMON_DEFINITIONS.as_bytes())
            .unwrap();

        container
    }
}
