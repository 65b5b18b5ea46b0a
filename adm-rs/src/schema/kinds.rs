//! Enumerates the element kinds and attribute tags known to the schema.
use num_derive::FromPrimitive;

/// Enumerates the kinds of entities which can be stored in the graph.
///
/// A kind is shared by at most one definition and one reference descriptor, e.g.
/// `audioObject` and `audioObjectIDRef` both have the kind [EntityKind::Object].
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, FromPrimitive)]
pub enum EntityKind {
    /// The document itself (and the root of the common definitions).
    Xml = 1,
    /// The S-ADM frame wrapper.
    Frame,
    /// The S-ADM frame header.
    FrameHeader,
    /// The S-ADM frame format.
    FrameFormat,
    /// The S-ADM transport track format.
    TransportTrackFormat,
    /// A track within a transport track format.
    AudioTrack,
    /// The `ituADM` wrapper of a BS.2076 document.
    ItuAdm,
    /// The `coreMetadata` wrapper.
    CoreMetadata,
    /// The `format` wrapper.
    Format,
    /// The `audioFormatExtended` element which holds all ADM definitions.
    AudioFormatExtended,
    /// An `audioProgramme`.
    Programme,
    /// An `audioContent`.
    Content,
    /// An `audioObject`.
    Object,
    /// A complementary object reference. Its targets are objects.
    ComplementaryObject,
    /// An `audioPackFormat`.
    PackFormat,
    /// An `audioChannelFormat`.
    ChannelFormat,
    /// An `audioBlockFormat`.
    BlockFormat,
    /// An `audioStreamFormat`.
    StreamFormat,
    /// An `audioTrackFormat`.
    TrackFormat,
    /// An `audioTrackUID`.
    TrackUid,
    /// A label of a programme.
    ProgrammeLabel,
    /// A label of a content.
    ContentLabel,
    /// A label of an object.
    ObjectLabel,
    /// A `loudnessMetadata` block.
    LoudnessMetadata,
    /// The integrated loudness value.
    IntegratedLoudness,
    /// The loudness range value.
    LoudnessRange,
    /// The maximal true peak value.
    MaxTruePeak,
    /// The maximal momentary loudness value.
    MaxMomentary,
    /// The maximal short term loudness value.
    MaxShortTerm,
    /// The dialogue loudness value.
    DialogueLoudness,
    /// The dialogue classification of a content.
    Dialogue,
    /// A gain value.
    Gain,
    /// The head locked flag.
    HeadLocked,
    /// An importance value.
    Importance,
    /// The `audioObjectInteraction` block.
    ObjectInteraction,
    /// A gain interaction range bound.
    GainInteractionRange,
    /// A position interaction range bound.
    PositionInteractionRange,
    /// A position coordinate.
    Position,
    /// A speaker label.
    SpeakerLabel,
    /// The cartesian flag.
    Cartesian,
    /// The width of an object.
    Width,
    /// The height of an object.
    Height,
    /// The depth of an object.
    Depth,
    /// The diffuseness of an object.
    Diffuse,
    /// The jump position flag.
    JumpPosition,
    /// The channel lock flag.
    ChannelLock,
    /// The object divergence.
    ObjectDivergence,
    /// The screen reference flag.
    ScreenRef,
    /// The HOA normalization.
    Normalization,
    /// The HOA near field compensation distance.
    NfcRefDist,
    /// The HOA equation.
    Equation,
    /// The HOA order.
    Order,
    /// The HOA degree.
    Degree,
    /// A frequency limit.
    Frequency,
    /// A zone exclusion block.
    ZoneExclusion,
    /// A single excluded zone.
    Zone,
}

impl EntityKind {
    /// Returns the kind of entity an element of this kind points to.
    ///
    /// This is the kind itself for everything but complementary object references, which
    /// point to objects.
    ///
    /// # Example
    /// ```
    /// # use adm::schema::EntityKind;
    /// assert_eq!(EntityKind::ComplementaryObject.target_kind(), EntityKind::Object);
    /// assert_eq!(EntityKind::PackFormat.target_kind(), EntityKind::PackFormat);
    /// ```
    pub fn target_kind(self) -> EntityKind {
        match self {
            EntityKind::ComplementaryObject => EntityKind::Object,
            other => other,
        }
    }
}

/// Enumerates the types which an attribute value can have.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// A flag rendered as `0` or `1`.
    Bool,
    /// A non-negative integer.
    Unsigned,
    /// A signed integer.
    Signed,
    /// A floating point number.
    Float,
    /// One of the ADM audio types.
    AudioType,
    /// An ADM timecode.
    Timecode,
    /// Plain text.
    String,
}

/// Enumerates the value slots of an entity.
///
/// A tag is a logical attribute. Several elements may spell it differently, e.g.
/// `audioProgrammeName` and `audioObjectName` both map to [AttributeTag::Name]. Leaf elements
/// store their text content in a tag as well (e.g. `gain` uses [AttributeTag::Gain]).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AttributeTag {
    /// The ADM id of a definition. This is never stored as value but makes up the identifier.
    Id,
    /// A version string.
    Version,
    /// The declared encoding of the document.
    Encoding,
    /// The standalone flag of the document.
    Standalone,
    /// An XML namespace.
    Xmlns,
    /// The type of an S-ADM frame.
    FrameType,
    /// A start time.
    Start,
    /// An end time.
    End,
    /// A duration.
    Duration,
    /// The time reference of an S-ADM frame.
    TimeReference,
    /// The flow id of an S-ADM frame.
    FlowId,
    /// The number of frames until a full frame is sent.
    CountToFull,
    /// The number of metadata chunks.
    NumMetadataChunks,
    /// The number of frames until the same chunk is sent.
    CountToSameChunk,
    /// The number of ids within a transport track format.
    NumIds,
    /// The number of tracks within a transport track format.
    NumTracks,
    /// The id of a track.
    TrackId,
    /// A format label.
    FormatLabel,
    /// A format definition.
    FormatDefinition,
    /// A name.
    Name,
    /// A language code.
    Language,
    /// The text of a label.
    Label,
    /// The maximal ducking depth of a programme.
    MaxDuckingDepth,
    /// An importance value.
    Importance,
    /// The interact flag of an object.
    Interact,
    /// The disable ducking flag of an object.
    DisableDucking,
    /// The type label of a pack or channel format.
    TypeLabel,
    /// The type definition of a pack or channel format.
    TypeDefinition,
    /// The absolute distance of a pack format.
    AbsoluteDistance,
    /// The start time of a block relative to its object.
    Rtime,
    /// A sample rate.
    SampleRate,
    /// A bit depth.
    BitDepth,
    /// The loudness measurement method.
    LoudnessMethod,
    /// The loudness recommendation type.
    LoudnessRecType,
    /// The loudness correction type.
    LoudnessCorrectionType,
    /// An integrated loudness value.
    IntegratedLoudness,
    /// A loudness range value.
    LoudnessRange,
    /// A maximal true peak value.
    MaxTruePeak,
    /// A maximal momentary loudness value.
    MaxMomentary,
    /// A maximal short term loudness value.
    MaxShortTerm,
    /// A dialogue loudness value.
    DialogueLoudness,
    /// The dialogue classification.
    Dialogue,
    /// The kind of non-dialogue content.
    NonDialogueContentKind,
    /// The kind of dialogue content.
    DialogueContentKind,
    /// The kind of mixed content.
    MixedContentKind,
    /// A gain value.
    Gain,
    /// The unit of a gain value.
    GainUnit,
    /// The head locked flag.
    HeadLocked,
    /// The on/off interaction flag.
    OnOffInteract,
    /// The gain interaction flag.
    GainInteract,
    /// The position interaction flag.
    PositionInteract,
    /// Marks a range value as `min` or `max`.
    Bound,
    /// The coordinate of a position value.
    Coordinate,
    /// The value of an interaction range.
    InteractionRange,
    /// A position coordinate value.
    Position,
    /// The screen edge lock of a position.
    ScreenEdgeLock,
    /// A speaker label.
    SpeakerLabel,
    /// The cartesian flag.
    Cartesian,
    /// A width.
    Width,
    /// A height.
    Height,
    /// A depth.
    Depth,
    /// A diffuseness.
    Diffuse,
    /// The jump position flag.
    JumpPosition,
    /// The interpolation length of a jump.
    InterpolationLength,
    /// The channel lock flag.
    ChannelLock,
    /// The maximal distance of a channel lock.
    MaxDistance,
    /// The object divergence.
    ObjectDivergence,
    /// The azimuth range of a divergence.
    AzimuthRange,
    /// The position range of a divergence.
    PositionRange,
    /// The screen reference flag.
    ScreenRef,
    /// The HOA normalization.
    Normalization,
    /// The HOA near field compensation distance.
    NfcRefDist,
    /// The HOA equation.
    Equation,
    /// The HOA order.
    Order,
    /// The HOA degree.
    Degree,
    /// A frequency limit.
    Frequency,
    /// The type of a frequency limit (`lowPass` or `highPass`).
    FrequencyType,
    /// The lower x bound of a zone.
    MinX,
    /// The upper x bound of a zone.
    MaxX,
    /// The lower y bound of a zone.
    MinY,
    /// The upper y bound of a zone.
    MaxY,
    /// The lower z bound of a zone.
    MinZ,
    /// The upper z bound of a zone.
    MaxZ,
}

impl AttributeTag {
    /// Returns the type which values stored in this tag must have.
    ///
    /// # Example
    /// ```
    /// # use adm::schema::{AttributeTag, ValueType};
    /// assert_eq!(AttributeTag::Gain.value_type(), ValueType::Float);
    /// assert_eq!(AttributeTag::TypeDefinition.value_type(), ValueType::AudioType);
    /// ```
    pub fn value_type(self) -> ValueType {
        use AttributeTag::*;

        match self {
            Interact | DisableDucking | HeadLocked | OnOffInteract | GainInteract
            | PositionInteract | Cartesian | JumpPosition | ChannelLock | ScreenRef => {
                ValueType::Bool
            }
            CountToFull | NumMetadataChunks | CountToSameChunk | NumIds | NumTracks | TrackId
            | Importance | SampleRate | BitDepth | Dialogue | NonDialogueContentKind
            | DialogueContentKind | MixedContentKind | Order => ValueType::Unsigned,
            Degree => ValueType::Signed,
            MaxDuckingDepth | AbsoluteDistance | IntegratedLoudness | LoudnessRange
            | MaxTruePeak | MaxMomentary | MaxShortTerm | DialogueLoudness | Gain
            | InteractionRange | Position | Width | Height | Depth | Diffuse
            | InterpolationLength | MaxDistance | ObjectDivergence | AzimuthRange
            | PositionRange | NfcRefDist | Frequency | MinX | MaxX | MinY | MaxY | MinZ | MaxZ => {
                ValueType::Float
            }
            TypeLabel | TypeDefinition => ValueType::AudioType,
            Start | End | Duration | Rtime => ValueType::Timecode,
            Id | Version | Encoding | Standalone | Xmlns | FrameType | TimeReference | FlowId
            | FormatLabel | FormatDefinition | Name | Language | Label | LoudnessMethod
            | LoudnessRecType | LoudnessCorrectionType | GainUnit | Bound | Coordinate
            | ScreenEdgeLock | SpeakerLabel | Normalization | Equation | FrequencyType => {
                ValueType::String
            }
        }
    }
}
