//! Contains the static table of all known elements.
use crate::schema::kinds::AttributeTag::{self, *};
use crate::schema::kinds::EntityKind;
use crate::schema::EntityDescriptor;

/// A composite element which is numbered by the per kind sequence.
const fn structural(
    name: &'static str,
    kind: EntityKind,
    attributes: &'static [(&'static str, AttributeTag)],
) -> EntityDescriptor {
    EntityDescriptor {
        name,
        kind,
        is_composite: true,
        has_identifier: false,
        is_reference: false,
        ordinal: false,
        identifying_tag: None,
        attributes,
    }
}

/// A composite element which is numbered within its parent.
const fn ordinal(
    name: &'static str,
    kind: EntityKind,
    attributes: &'static [(&'static str, AttributeTag)],
) -> EntityDescriptor {
    EntityDescriptor {
        ordinal: true,
        ..structural(name, kind, attributes)
    }
}

/// An element whose identifier is given by one of its attributes.
const fn definition(
    name: &'static str,
    kind: EntityKind,
    attributes: &'static [(&'static str, AttributeTag)],
) -> EntityDescriptor {
    EntityDescriptor {
        has_identifier: true,
        identifying_tag: Some(Id),
        ..structural(name, kind, attributes)
    }
}

/// An element whose text is the ADM id of another entity.
const fn reference(name: &'static str, kind: EntityKind) -> EntityDescriptor {
    EntityDescriptor {
        name,
        kind,
        is_composite: false,
        has_identifier: true,
        is_reference: true,
        ordinal: false,
        identifying_tag: None,
        attributes: &[],
    }
}

/// An element whose text is a scalar value stored in the given tag.
const fn leaf(
    name: &'static str,
    kind: EntityKind,
    value: AttributeTag,
    attributes: &'static [(&'static str, AttributeTag)],
) -> EntityDescriptor {
    EntityDescriptor {
        name,
        kind,
        is_composite: false,
        has_identifier: false,
        is_reference: false,
        ordinal: true,
        identifying_tag: Some(value),
        attributes,
    }
}

const LANGUAGE: &[(&str, AttributeTag)] = &[("language", Language)];

pub(crate) static DESCRIPTORS: &[EntityDescriptor] = &[
    // Document structure and the S-ADM frame header...
    structural(
        "xml",
        EntityKind::Xml,
        &[
            ("version", Version),
            ("encoding", Encoding),
            ("standalone", Standalone),
        ],
    ),
    structural(
        "frame",
        EntityKind::Frame,
        &[("version", Version), ("xmlns", Xmlns)],
    ),
    structural("frameHeader", EntityKind::FrameHeader, &[]),
    definition(
        "frameFormat",
        EntityKind::FrameFormat,
        &[
            ("frameFormatID", Id),
            ("type", FrameType),
            ("start", Start),
            ("duration", Duration),
            ("timeReference", TimeReference),
            ("flowID", FlowId),
            ("countToFull", CountToFull),
            ("numMetadataChunks", NumMetadataChunks),
            ("countToSameChunk", CountToSameChunk),
        ],
    ),
    definition(
        "transportTrackFormat",
        EntityKind::TransportTrackFormat,
        &[
            ("transportID", Id),
            ("transportName", Name),
            ("numIDs", NumIds),
            ("numTracks", NumTracks),
        ],
    ),
    ordinal(
        "audioTrack",
        EntityKind::AudioTrack,
        &[
            ("trackID", TrackId),
            ("formatLabel", FormatLabel),
            ("formatDefinition", FormatDefinition),
        ],
    ),
    structural("ituADM", EntityKind::ItuAdm, &[("xmlns", Xmlns)]),
    structural("coreMetadata", EntityKind::CoreMetadata, &[]),
    structural("format", EntityKind::Format, &[]),
    structural(
        "audioFormatExtended",
        EntityKind::AudioFormatExtended,
        &[("version", Version)],
    ),
    // The main ADM definitions...
    definition(
        "audioProgramme",
        EntityKind::Programme,
        &[
            ("audioProgrammeID", Id),
            ("audioProgrammeName", Name),
            ("audioProgrammeLanguage", Language),
            ("start", Start),
            ("end", End),
            ("maxDuckingDepth", MaxDuckingDepth),
        ],
    ),
    definition(
        "audioContent",
        EntityKind::Content,
        &[
            ("audioContentID", Id),
            ("audioContentName", Name),
            ("audioContentLanguage", Language),
        ],
    ),
    definition(
        "audioObject",
        EntityKind::Object,
        &[
            ("audioObjectID", Id),
            ("audioObjectName", Name),
            ("start", Start),
            ("duration", Duration),
            ("importance", Importance),
            ("interact", Interact),
            ("disableDucking", DisableDucking),
        ],
    ),
    definition(
        "audioPackFormat",
        EntityKind::PackFormat,
        &[
            ("audioPackFormatID", Id),
            ("audioPackFormatName", Name),
            ("typeLabel", TypeLabel),
            ("typeDefinition", TypeDefinition),
            ("importance", Importance),
            ("absoluteDistance", AbsoluteDistance),
        ],
    ),
    definition(
        "audioChannelFormat",
        EntityKind::ChannelFormat,
        &[
            ("audioChannelFormatID", Id),
            ("audioChannelFormatName", Name),
            ("typeLabel", TypeLabel),
            ("typeDefinition", TypeDefinition),
        ],
    ),
    definition(
        "audioBlockFormat",
        EntityKind::BlockFormat,
        &[
            ("audioBlockFormatID", Id),
            ("rtime", Rtime),
            ("duration", Duration),
        ],
    ),
    definition(
        "audioStreamFormat",
        EntityKind::StreamFormat,
        &[
            ("audioStreamFormatID", Id),
            ("audioStreamFormatName", Name),
            ("formatLabel", FormatLabel),
            ("formatDefinition", FormatDefinition),
        ],
    ),
    definition(
        "audioTrackFormat",
        EntityKind::TrackFormat,
        &[
            ("audioTrackFormatID", Id),
            ("audioTrackFormatName", Name),
            ("formatLabel", FormatLabel),
            ("formatDefinition", FormatDefinition),
        ],
    ),
    definition(
        "audioTrackUID",
        EntityKind::TrackUid,
        &[
            ("UID", Id),
            ("sampleRate", SampleRate),
            ("bitDepth", BitDepth),
        ],
    ),
    leaf(
        "audioProgrammeLabel",
        EntityKind::ProgrammeLabel,
        Label,
        LANGUAGE,
    ),
    leaf("audioContentLabel", EntityKind::ContentLabel, Label, LANGUAGE),
    leaf("audioObjectLabel", EntityKind::ObjectLabel, Label, LANGUAGE),
    // References...
    reference("audioContentIDRef", EntityKind::Content),
    reference("audioObjectIDRef", EntityKind::Object),
    reference(
        "audioComplementaryObjectIDRef",
        EntityKind::ComplementaryObject,
    ),
    reference("audioPackFormatIDRef", EntityKind::PackFormat),
    reference("audioChannelFormatIDRef", EntityKind::ChannelFormat),
    reference("audioStreamFormatIDRef", EntityKind::StreamFormat),
    reference("audioTrackFormatIDRef", EntityKind::TrackFormat),
    reference("audioTrackUIDRef", EntityKind::TrackUid),
    // Loudness...
    ordinal(
        "loudnessMetadata",
        EntityKind::LoudnessMetadata,
        &[
            ("loudnessMethod", LoudnessMethod),
            ("loudnessRecType", LoudnessRecType),
            ("loudnessCorrectionType", LoudnessCorrectionType),
        ],
    ),
    leaf(
        "integratedLoudness",
        EntityKind::IntegratedLoudness,
        IntegratedLoudness,
        &[],
    ),
    leaf(
        "loudnessRange",
        EntityKind::LoudnessRange,
        LoudnessRange,
        &[],
    ),
    leaf("maxTruePeak", EntityKind::MaxTruePeak, MaxTruePeak, &[]),
    leaf("maxMomentary", EntityKind::MaxMomentary, MaxMomentary, &[]),
    leaf("maxShortTerm", EntityKind::MaxShortTerm, MaxShortTerm, &[]),
    leaf(
        "dialogueLoudness",
        EntityKind::DialogueLoudness,
        DialogueLoudness,
        &[],
    ),
    // Content and object properties...
    leaf(
        "dialogue",
        EntityKind::Dialogue,
        Dialogue,
        &[
            ("nonDialogueContentKind", NonDialogueContentKind),
            ("dialogueContentKind", DialogueContentKind),
            ("mixedContentKind", MixedContentKind),
        ],
    ),
    leaf("gain", EntityKind::Gain, Gain, &[("gainUnit", GainUnit)]),
    leaf("headLocked", EntityKind::HeadLocked, HeadLocked, &[]),
    leaf("importance", EntityKind::Importance, Importance, &[]),
    ordinal(
        "audioObjectInteraction",
        EntityKind::ObjectInteraction,
        &[
            ("onOffInteract", OnOffInteract),
            ("gainInteract", GainInteract),
            ("positionInteract", PositionInteract),
        ],
    ),
    leaf(
        "gainInteractionRange",
        EntityKind::GainInteractionRange,
        InteractionRange,
        &[("bound", Bound)],
    ),
    leaf(
        "positionInteractionRange",
        EntityKind::PositionInteractionRange,
        InteractionRange,
        &[("coordinate", Coordinate), ("bound", Bound)],
    ),
    // Block format properties...
    leaf(
        "position",
        EntityKind::Position,
        Position,
        &[
            ("coordinate", Coordinate),
            ("screenEdgeLock", ScreenEdgeLock),
            ("bound", Bound),
        ],
    ),
    leaf("speakerLabel", EntityKind::SpeakerLabel, SpeakerLabel, &[]),
    leaf("cartesian", EntityKind::Cartesian, Cartesian, &[]),
    leaf("width", EntityKind::Width, Width, &[]),
    leaf("height", EntityKind::Height, Height, &[]),
    leaf("depth", EntityKind::Depth, Depth, &[]),
    leaf("diffuse", EntityKind::Diffuse, Diffuse, &[]),
    leaf(
        "jumpPosition",
        EntityKind::JumpPosition,
        JumpPosition,
        &[("interpolationLength", InterpolationLength)],
    ),
    leaf(
        "channelLock",
        EntityKind::ChannelLock,
        ChannelLock,
        &[("maxDistance", MaxDistance)],
    ),
    leaf(
        "objectDivergence",
        EntityKind::ObjectDivergence,
        ObjectDivergence,
        &[("azimuthRange", AzimuthRange), ("positionRange", PositionRange)],
    ),
    leaf("screenRef", EntityKind::ScreenRef, ScreenRef, &[]),
    leaf(
        "normalization",
        EntityKind::Normalization,
        Normalization,
        &[],
    ),
    leaf("nfcRefDist", EntityKind::NfcRefDist, NfcRefDist, &[]),
    leaf("equation", EntityKind::Equation, Equation, &[]),
    leaf("order", EntityKind::Order, Order, &[]),
    leaf("degree", EntityKind::Degree, Degree, &[]),
    leaf(
        "frequency",
        EntityKind::Frequency,
        Frequency,
        &[("typeDefinition", FrequencyType)],
    ),
    ordinal("zoneExclusion", EntityKind::ZoneExclusion, &[]),
    ordinal(
        "zone",
        EntityKind::Zone,
        &[
            ("minX", MinX),
            ("maxX", MaxX),
            ("minY", MinY),
            ("maxY", MaxY),
            ("minZ", MinZ),
            ("maxZ", MaxZ),
        ],
    ),
];
