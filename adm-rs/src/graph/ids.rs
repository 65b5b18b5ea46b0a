//! Translates between ADM id strings and compact 64-bit identifiers.
//!
//! # Layout
//!
//! Bits 56 to 63 of an [EntityId] hold the [EntityKind]. Bit 55 marks generically numbered
//! entities (everything without an ADM id). The remaining 55 bits are used as follows:
//!
//! * ADM ids keep their primary number in bits 23 to 54 and their secondary number (the block
//!   index of `AB_` or the counter of `AT_`) in bits 0 to 22. Frame format ids (`FF_`) use the
//!   whole 55 bits for their (up to 44 bit) number.
//! * Generic ids keep a scope in bits 24 to 54 and a number in bits 0 to 23. Scope 0 is the
//!   document wide sequence of the kind, all other scopes are handed out to parents which
//!   number their children.
//!
//! # Example
//!
//! ```
//! use adm::graph::ids::IdAllocator;
//! use adm::schema::EntityKind;
//!
//! let allocator = IdAllocator::new();
//! let id = allocator.parse("AB_00010001_00000002", EntityKind::BlockFormat).unwrap();
//! assert_eq!(id.kind(), EntityKind::BlockFormat);
//! assert_eq!(allocator.render(id).unwrap(), "AB_00010001_00000002");
//! ```
use std::fmt::{Display, Formatter};

use fnv::FnvHashMap;
use num_traits::FromPrimitive;
use regex::Regex;

use crate::adm_error;
use crate::schema::EntityKind;
use crate::status::AdmResult;

const KIND_SHIFT: u32 = 56;
const GENERIC_FLAG: u64 = 1 << 55;
const PAYLOAD_MASK: u64 = (1 << 55) - 1;
const PRIMARY_SHIFT: u32 = 23;
const SECONDARY_MASK: u64 = (1 << PRIMARY_SHIFT) - 1;
const SCOPE_SHIFT: u32 = 24;
const NUMBER_MASK: u64 = (1 << SCOPE_SHIFT) - 1;

/// The largest scope. It is reserved for the two root singletons.
const RESERVED_SCOPE: u64 = (1 << 31) - 1;

/// Represents the identifier of an entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// The root of each document.
    pub const TOP_LEVEL: EntityId = EntityId::generic(EntityKind::Xml, RESERVED_SCOPE, 0);

    /// The root of the common definitions.
    pub const COMMON_DEFINITIONS: EntityId =
        EntityId::generic(EntityKind::Xml, RESERVED_SCOPE, 1);

    const fn generic(kind: EntityKind, scope: u64, number: u64) -> EntityId {
        EntityId(
            ((kind as u64) << KIND_SHIFT)
                | GENERIC_FLAG
                | (scope << SCOPE_SHIFT)
                | (number & NUMBER_MASK),
        )
    }

    fn adm(kind: EntityKind, payload: u64) -> EntityId {
        EntityId(((kind as u64) << KIND_SHIFT) | (payload & PAYLOAD_MASK))
    }

    /// Returns the kind of the identified entity.
    pub fn kind(self) -> EntityKind {
        // Identifiers are only created by the constructors above, which always use a valid kind.
        EntityKind::from_u64(self.0 >> KIND_SHIFT).unwrap_or(EntityKind::Xml)
    }

    /// Determines if this id has been generated rather than parsed from an ADM id.
    pub fn is_generic(self) -> bool {
        self.0 & GENERIC_FLAG != 0
    }

    /// Returns the raw 64-bit value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the number of a generic id within its scope.
    ///
    /// # Example
    /// ```
    /// # use adm::graph::ids::{EntityId, IdAllocator};
    /// # use adm::schema::EntityKind;
    /// let mut allocator = IdAllocator::new();
    /// let parent = EntityId::TOP_LEVEL;
    /// let id = allocator.subcomponent_id(EntityKind::AudioTrack, parent).unwrap();
    /// assert_eq!(id.number(), Some(1));
    /// ```
    pub fn number(self) -> Option<u32> {
        if self.is_generic() {
            Some((self.0 & NUMBER_MASK) as u32)
        } else {
            None
        }
    }

    fn scope(self) -> u64 {
        (self.0 & PAYLOAD_MASK) >> SCOPE_SHIFT
    }

    fn payload(self) -> u64 {
        self.0 & PAYLOAD_MASK
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_generic() {
            write!(
                f,
                "{:?}#{}.{}",
                self.kind(),
                self.scope(),
                self.0 & NUMBER_MASK
            )
        } else {
            match render(*self) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{:?}#{:X}", self.kind(), self.payload()),
            }
        }
    }
}

/// Describes how the ADM id of a kind is spelled.
struct IdFormat {
    prefix: &'static str,
    primary_digits: usize,
    secondary_digits: Option<usize>,
}

fn id_format(kind: EntityKind) -> Option<IdFormat> {
    let (prefix, primary_digits, secondary_digits) = match kind.target_kind() {
        EntityKind::Programme => ("APR", 4, None),
        EntityKind::Content => ("ACO", 4, None),
        EntityKind::Object => ("AO", 4, None),
        EntityKind::PackFormat => ("AP", 8, None),
        EntityKind::ChannelFormat => ("AC", 8, None),
        EntityKind::BlockFormat => ("AB", 8, Some(8)),
        EntityKind::StreamFormat => ("AS", 8, None),
        EntityKind::TrackFormat => ("AT", 8, Some(2)),
        EntityKind::TrackUid => ("ATU", 8, None),
        EntityKind::FrameFormat => ("FF", 11, None),
        EntityKind::TransportTrackFormat => ("TP", 4, None),
        _ => return None,
    };

    Some(IdFormat {
        prefix,
        primary_digits,
        secondary_digits,
    })
}

lazy_static::lazy_static! {
    static ref ADM_ID: Regex =
        Regex::new(r"^([A-Z]{2,3})_([0-9a-fA-F]+)(?:_([0-9a-fA-F]+))?$").unwrap();
}

fn parse(text: &str, kind: EntityKind) -> AdmResult<EntityId> {
    let format = id_format(kind)
        .ok_or_else(|| adm_error!(InvalidArgument, "The kind {:?} has no ADM id", kind))?;
    let captures = ADM_ID
        .captures(text)
        .ok_or_else(|| adm_error!(InvalidArgument, "Malformed ADM id: {}", text))?;

    let prefix = captures.get(1).map(|group| group.as_str()).unwrap_or_default();
    if prefix != format.prefix {
        return Err(adm_error!(
            InvalidArgument,
            "Expected an id starting with {}_ but got {}",
            format.prefix,
            text
        ));
    }

    let primary = captures.get(2).map(|group| group.as_str()).unwrap_or_default();
    let secondary = captures.get(3).map(|group| group.as_str());
    if primary.len() != format.primary_digits
        || secondary.map(|digits| digits.len()) != format.secondary_digits
    {
        return Err(adm_error!(
            InvalidArgument,
            "Invalid number of digits in ADM id: {}",
            text
        ));
    }

    let hex = |digits: &str| {
        u64::from_str_radix(digits, 16)
            .map_err(|_| adm_error!(InvalidArgument, "Malformed ADM id: {}", text))
    };

    let primary = hex(primary)?;
    let payload = match secondary {
        None if format.primary_digits > 8 => primary,
        None => primary << PRIMARY_SHIFT,
        Some(digits) => {
            let secondary = hex(digits)?;
            if secondary > SECONDARY_MASK {
                return Err(adm_error!(
                    OutOfRange,
                    "The secondary number of {} exceeds {}",
                    text,
                    SECONDARY_MASK
                ));
            }
            (primary << PRIMARY_SHIFT) | secondary
        }
    };

    Ok(EntityId::adm(kind.target_kind(), payload))
}

fn render(id: EntityId) -> AdmResult<String> {
    if id.is_generic() {
        return Err(adm_error!(
            InvalidArgument,
            "The generic id {} has no ADM representation",
            id
        ));
    }

    let format = id_format(id.kind())
        .ok_or_else(|| adm_error!(InvalidArgument, "The kind {:?} has no ADM id", id.kind()))?;
    let payload = id.payload();

    Ok(match format.secondary_digits {
        None if format.primary_digits > 8 => format!(
            "{}_{:0width$X}",
            format.prefix,
            payload,
            width = format.primary_digits
        ),
        None => format!(
            "{}_{:0width$X}",
            format.prefix,
            payload >> PRIMARY_SHIFT,
            width = format.primary_digits
        ),
        Some(secondary_digits) => format!(
            "{}_{:0width$X}_{:0secondary_width$X}",
            format.prefix,
            payload >> PRIMARY_SHIFT,
            payload & SECONDARY_MASK,
            width = format.primary_digits,
            secondary_width = secondary_digits
        ),
    })
}

/// Hands out identifiers for entities which don't carry an ADM id.
///
/// Entities are either numbered by a sequence per kind or by a counter per parent entity
/// ("subcomponents", e.g. the tracks of a transport track format). Each parent which numbers
/// children is assigned a scope of its own so that ids of different parents never collide.
#[derive(Default)]
pub struct IdAllocator {
    sequences: FnvHashMap<EntityKind, u64>,
    scopes: FnvHashMap<EntityId, (u64, u64)>,
    next_scope: u64,
}

impl IdAllocator {
    /// Creates a new allocator with all counters reset.
    pub fn new() -> Self {
        IdAllocator::default()
    }

    /// Returns the next number of the per kind sequence, starting at 1.
    pub fn next_sequence(&mut self, kind: EntityKind) -> AdmResult<u32> {
        let counter = self.sequences.entry(kind).or_insert(0);
        if *counter >= NUMBER_MASK {
            return Err(adm_error!(
                OutOfRange,
                "The sequence of {:?} is exhausted",
                kind
            ));
        }
        *counter += 1;

        Ok(*counter as u32)
    }

    /// Returns the next number within the given parent, starting at 1.
    pub fn next_subcomponent(&mut self, parent: EntityId) -> AdmResult<u32> {
        let (_, counter) = self.scope_of(parent)?;
        if *counter >= NUMBER_MASK {
            return Err(adm_error!(
                OutOfRange,
                "The subcomponents of {} are exhausted",
                parent
            ));
        }
        *counter += 1;

        Ok(*counter as u32)
    }

    fn scope_of(&mut self, parent: EntityId) -> AdmResult<&mut (u64, u64)> {
        if !self.scopes.contains_key(&parent) {
            if self.next_scope + 1 >= RESERVED_SCOPE {
                return Err(adm_error!(OutOfRange, "No more scopes are available"));
            }
            self.next_scope += 1;
            let _ = self.scopes.insert(parent, (self.next_scope, 0));
        }

        self.scopes
            .get_mut(&parent)
            .ok_or_else(|| adm_error!(NotFound, "Unknown scope for {}", parent))
    }

    /// Creates an id of the given kind using the next number of its sequence.
    ///
    /// # Example
    /// ```
    /// # use adm::graph::ids::IdAllocator;
    /// # use adm::schema::EntityKind;
    /// let mut allocator = IdAllocator::new();
    /// let first = allocator.sequence_id(EntityKind::Frame).unwrap();
    /// let second = allocator.sequence_id(EntityKind::Frame).unwrap();
    /// assert_ne!(first, second);
    /// assert_eq!(second.number(), Some(2));
    /// ```
    pub fn sequence_id(&mut self, kind: EntityKind) -> AdmResult<EntityId> {
        let number = self.next_sequence(kind)?;
        Ok(EntityId::generic(kind, 0, number as u64))
    }

    /// Creates an id of the given kind using the next number within the given parent.
    pub fn subcomponent_id(&mut self, kind: EntityKind, parent: EntityId) -> AdmResult<EntityId> {
        let number = self.next_subcomponent(parent)?;
        let (scope, _) = self.scope_of(parent)?;
        Ok(EntityId::generic(kind, *scope, number as u64))
    }

    /// Parses the ADM id of an entity of the given kind.
    ///
    /// Fails with `INVALID_ARGUMENT` if the prefix or the number of digits don't match the kind
    /// and with `OUT_OF_RANGE` if a number exceeds the bits available for it.
    pub fn parse(&self, text: &str, kind: EntityKind) -> AdmResult<EntityId> {
        parse(text, kind)
    }

    /// Renders the ADM id of the given identifier.
    ///
    /// Fails with `INVALID_ARGUMENT` for generic ids.
    pub fn render(&self, id: EntityId) -> AdmResult<String> {
        render(id)
    }

    /// Returns the root of each document.
    pub fn top_level_id(&self) -> EntityId {
        EntityId::TOP_LEVEL
    }

    /// Resets all counters.
    pub fn clear(&mut self) {
        self.sequences.clear();
        self.scopes.clear();
        self.next_scope = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::ids::{EntityId, IdAllocator};
    use crate::schema::EntityKind;
    use crate::status::Status;

    #[test]
    fn adm_ids_survive_parsing_and_rendering() {
        let allocator = IdAllocator::new();
        for (text, kind) in [
            ("APR_1001", EntityKind::Programme),
            ("ACO_1002", EntityKind::Content),
            ("AO_100A", EntityKind::Object),
            ("AP_00010003", EntityKind::PackFormat),
            ("AC_00010001", EntityKind::ChannelFormat),
            ("AB_00010001_00000001", EntityKind::BlockFormat),
            ("AS_00010001", EntityKind::StreamFormat),
            ("AT_00010001_01", EntityKind::TrackFormat),
            ("ATU_00000001", EntityKind::TrackUid),
            ("FF_00000000001", EntityKind::FrameFormat),
            ("TP_0001", EntityKind::TransportTrackFormat),
        ] {
            let id = allocator.parse(text, kind).unwrap();
            assert_eq!(id.kind(), kind);
            assert!(!id.is_generic());
            assert_eq!(allocator.render(id).unwrap(), text);
        }

        // Hex digits are accepted in either case but always rendered in upper case...
        let id = allocator.parse("ao_100a", EntityKind::Object);
        assert!(id.is_err());
        let id = allocator.parse("AO_100a", EntityKind::Object).unwrap();
        assert_eq!(allocator.render(id).unwrap(), "AO_100A");
    }

    #[test]
    fn complementary_references_resolve_to_objects() {
        let allocator = IdAllocator::new();
        let id = allocator
            .parse("AO_1001", EntityKind::ComplementaryObject)
            .unwrap();
        assert_eq!(id, allocator.parse("AO_1001", EntityKind::Object).unwrap());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let allocator = IdAllocator::new();
        let status = |text: &str, kind: EntityKind| allocator.parse(text, kind).unwrap_err().status();

        assert_eq!(status("AP_00010003", EntityKind::Object), Status::InvalidArgument);
        assert_eq!(status("AO_01001", EntityKind::Object), Status::InvalidArgument);
        assert_eq!(status("AO_1001_01", EntityKind::Object), Status::InvalidArgument);
        assert_eq!(status("AB_00010001", EntityKind::BlockFormat), Status::InvalidArgument);
        assert_eq!(status("", EntityKind::TrackUid), Status::InvalidArgument);
        assert_eq!(status("AO_1001", EntityKind::Gain), Status::InvalidArgument);
        assert_eq!(
            status("AB_00010001_00800000", EntityKind::BlockFormat),
            Status::OutOfRange
        );
    }

    #[test]
    fn generic_ids_cannot_be_rendered() {
        let mut allocator = IdAllocator::new();
        let id = allocator.sequence_id(EntityKind::Frame).unwrap();
        assert!(id.is_generic());
        assert_eq!(allocator.render(id).unwrap_err().status(), Status::InvalidArgument);
        assert_eq!(
            allocator.render(EntityId::TOP_LEVEL).unwrap_err().status(),
            Status::InvalidArgument
        );
    }

    #[test]
    fn sequences_count_per_kind() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.next_sequence(EntityKind::Frame).unwrap(), 1);
        assert_eq!(allocator.next_sequence(EntityKind::Frame).unwrap(), 2);
        assert_eq!(allocator.next_sequence(EntityKind::Format).unwrap(), 1);

        allocator.clear();
        assert_eq!(allocator.next_sequence(EntityKind::Frame).unwrap(), 1);
    }

    #[test]
    fn subcomponents_are_scoped_per_parent() {
        let mut allocator = IdAllocator::new();
        let first = allocator
            .parse("TP_0001", EntityKind::TransportTrackFormat)
            .unwrap();
        let second = allocator
            .parse("TP_0002", EntityKind::TransportTrackFormat)
            .unwrap();

        let mut ids = Vec::new();
        for parent in [first, second] {
            for expected in 1..=3 {
                let id = allocator
                    .subcomponent_id(EntityKind::AudioTrack, parent)
                    .unwrap();
                assert_eq!(id.number(), Some(expected));
                assert_eq!(id.kind(), EntityKind::AudioTrack);
                ids.push(id);
            }
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert_ne!(EntityId::TOP_LEVEL, EntityId::COMMON_DEFINITIONS);
        assert_eq!(EntityId::TOP_LEVEL.kind(), EntityKind::Xml);
    }
}
