//! Tagged binary payload codec
//!
//! The de-obfuscated bytes of every frame are one tagged message: a notice
//! (inbound) or a command (outbound). Layouts per tag:
//!
//! ```text
//! FIELD_MATCH_ASSIGNED    [tag][flags][field_id: u32?][match tuple?]
//!                         flags: 0x01 field id present, 0x02 match present
//! FIELD_ACTIVATED         [tag][field_id: u32]
//! MATCH_STARTED           [tag][field_id: u32]
//! MATCH_STOPPED           [tag][field_id: u32]
//! AUDIENCE_DISPLAY_CHANGED[tag][display: u8]
//!
//! START / END_EARLY /
//! ABORT / RESET           [tag][field_id: u32]
//! QUEUE_PREV_MATCH        [tag]
//! QUEUE_NEXT_MATCH        [tag]
//! QUEUE_SKILLS            [tag][skills_type: u8]
//! SET_AUDIENCE_DISPLAY    [tag][display: u8]
//!
//! match tuple             [session: i32][division: i32][round: u8]
//!                         [instance: i32][match: i32]
//! ```
//!
//! Multi-byte integers are big-endian. The tag vocabulary is owned by the
//! [`SchemaRegistry`], which is built once per process and injected into
//! [`FrameCodec`]; see `vextm-client`'s schema module for the single-flight
//! initializer.

use crate::error::{Error, Result};
use crate::types::*;
use crate::wire;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Notice tag codes
pub mod notice_tag {
    pub const FIELD_MATCH_ASSIGNED: u8 = 0x01;
    pub const FIELD_ACTIVATED: u8 = 0x02;
    pub const MATCH_STARTED: u8 = 0x03;
    pub const MATCH_STOPPED: u8 = 0x04;
    pub const AUDIENCE_DISPLAY_CHANGED: u8 = 0x05;
}

/// Command tag codes
pub mod command_tag {
    pub const START: u8 = 0x10;
    pub const END_EARLY: u8 = 0x11;
    pub const ABORT: u8 = 0x12;
    pub const RESET: u8 = 0x13;
    pub const QUEUE_PREV_MATCH: u8 = 0x14;
    pub const QUEUE_NEXT_MATCH: u8 = 0x15;
    pub const QUEUE_SKILLS: u8 = 0x16;
    pub const SET_AUDIENCE_DISPLAY: u8 = 0x17;
}

/// FIELD_MATCH_ASSIGNED flag bits
mod assigned_flags {
    pub const HAS_FIELD_ID: u8 = 0x01;
    pub const HAS_MATCH: u8 = 0x02;
}

/// Descriptor table for the message schema.
///
/// Owns the closed tag vocabulary consulted during decode and encode.
/// Constructed once per process (single-flight, in the client crate) and
/// shared by reference with every codec instance.
#[derive(Debug)]
pub struct SchemaRegistry {
    notice_tags: Vec<(u8, NoticeKind)>,
}

impl SchemaRegistry {
    /// Build the registry from the compiled-in schema tables.
    pub fn load() -> Self {
        let notice_tags = NOTICE_KINDS
            .iter()
            .map(|&kind| (Self::tag_for(kind), kind))
            .collect();
        Self { notice_tags }
    }

    fn tag_for(kind: NoticeKind) -> u8 {
        match kind {
            NoticeKind::FieldMatchAssigned => notice_tag::FIELD_MATCH_ASSIGNED,
            NoticeKind::FieldActivated => notice_tag::FIELD_ACTIVATED,
            NoticeKind::MatchStarted => notice_tag::MATCH_STARTED,
            NoticeKind::MatchStopped => notice_tag::MATCH_STOPPED,
            NoticeKind::AudienceDisplayChanged => notice_tag::AUDIENCE_DISPLAY_CHANGED,
        }
    }

    /// Look up the notice kind for a wire tag.
    pub fn notice_kind(&self, tag: u8) -> Option<NoticeKind> {
        self.notice_tags
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, k)| *k)
    }

    /// Wire tag for a notice kind.
    pub fn notice_tag(&self, kind: NoticeKind) -> u8 {
        Self::tag_for(kind)
    }

    /// Wire tag for a command.
    pub fn command_tag(&self, command: &FieldsetCommand) -> u8 {
        match command {
            FieldsetCommand::Start { .. } => command_tag::START,
            FieldsetCommand::EndEarly { .. } => command_tag::END_EARLY,
            FieldsetCommand::Abort { .. } => command_tag::ABORT,
            FieldsetCommand::Reset { .. } => command_tag::RESET,
            FieldsetCommand::QueuePrevMatch => command_tag::QUEUE_PREV_MATCH,
            FieldsetCommand::QueueNextMatch => command_tag::QUEUE_NEXT_MATCH,
            FieldsetCommand::QueueSkills { .. } => command_tag::QUEUE_SKILLS,
            FieldsetCommand::SetAudienceDisplay { .. } => command_tag::SET_AUDIENCE_DISPLAY,
        }
    }
}

/// Stateless frame codec bound to a schema registry.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> FrameCodec<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Decode one inbound frame: strip the XOR layer, then parse the
    /// notice payload against the schema.
    pub fn decode_notice(&self, frame: &[u8]) -> Result<FieldsetNotice> {
        let payload = wire::deobfuscate(frame)?;
        self.decode_notice_payload(&payload)
    }

    /// Parse a de-obfuscated notice payload.
    pub fn decode_notice_payload(&self, payload: &[u8]) -> Result<FieldsetNotice> {
        let mut buf = payload;
        let tag = get_u8(&mut buf)?;
        let kind = self
            .registry
            .notice_kind(tag)
            .ok_or(Error::UnknownNoticeTag(tag))?;

        match kind {
            NoticeKind::FieldMatchAssigned => {
                let flags = get_u8(&mut buf)?;
                let field_id = if flags & assigned_flags::HAS_FIELD_ID != 0 {
                    Some(get_u32(&mut buf)?)
                } else {
                    None
                };
                let match_tuple = if flags & assigned_flags::HAS_MATCH != 0 {
                    Some(decode_match_tuple(&mut buf)?)
                } else {
                    None
                };
                Ok(FieldsetNotice::FieldMatchAssigned {
                    field_id,
                    match_tuple,
                })
            }
            NoticeKind::FieldActivated => Ok(FieldsetNotice::FieldActivated {
                field_id: get_u32(&mut buf)?,
            }),
            NoticeKind::MatchStarted => Ok(FieldsetNotice::MatchStarted {
                field_id: get_u32(&mut buf)?,
            }),
            NoticeKind::MatchStopped => Ok(FieldsetNotice::MatchStopped {
                field_id: get_u32(&mut buf)?,
            }),
            NoticeKind::AudienceDisplayChanged => {
                let code = get_u8(&mut buf)?;
                let display =
                    AudienceDisplay::from_code(code).ok_or(Error::UnknownDisplay(code))?;
                Ok(FieldsetNotice::AudienceDisplayChanged { display })
            }
        }
    }

    /// Encode a notice payload (no XOR layer). Used by tests and tools
    /// that fabricate inbound traffic.
    pub fn encode_notice_payload(&self, notice: &FieldsetNotice) -> Bytes {
        let mut buf = BytesMut::with_capacity(32);
        buf.put_u8(self.registry.notice_tag(notice.kind()));

        match notice {
            FieldsetNotice::FieldMatchAssigned {
                field_id,
                match_tuple,
            } => {
                let mut flags = 0u8;
                if field_id.is_some() {
                    flags |= assigned_flags::HAS_FIELD_ID;
                }
                if match_tuple.is_some() {
                    flags |= assigned_flags::HAS_MATCH;
                }
                buf.put_u8(flags);
                if let Some(id) = field_id {
                    buf.put_u32(*id);
                }
                if let Some(tuple) = match_tuple {
                    encode_match_tuple(&mut buf, tuple);
                }
            }
            FieldsetNotice::FieldActivated { field_id }
            | FieldsetNotice::MatchStarted { field_id }
            | FieldsetNotice::MatchStopped { field_id } => {
                buf.put_u32(*field_id);
            }
            FieldsetNotice::AudienceDisplayChanged { display } => {
                buf.put_u8(display.code());
            }
        }

        buf.freeze()
    }

    /// Serialize a command payload (no XOR layer).
    pub fn encode_command_payload(&self, command: &FieldsetCommand) -> Bytes {
        let mut buf = BytesMut::with_capacity(8);
        buf.put_u8(self.registry.command_tag(command));

        match command {
            FieldsetCommand::Start { field_id }
            | FieldsetCommand::EndEarly { field_id }
            | FieldsetCommand::Abort { field_id }
            | FieldsetCommand::Reset { field_id } => {
                buf.put_u32(*field_id);
            }
            FieldsetCommand::QueuePrevMatch | FieldsetCommand::QueueNextMatch => {}
            FieldsetCommand::QueueSkills { skills_type } => {
                buf.put_u8(skills_type.code());
            }
            FieldsetCommand::SetAudienceDisplay { display } => {
                buf.put_u8(display.code());
            }
        }

        buf.freeze()
    }

    /// Serialize and XOR-wrap a command, ready for the transport.
    pub fn encode_command(&self, command: &FieldsetCommand) -> Bytes {
        self.encode_command_with_magic(command, wire::pick_magic())
    }

    /// Serialize and XOR-wrap a command under an explicit magic byte.
    pub fn encode_command_with_magic(&self, command: &FieldsetCommand, magic: u8) -> Bytes {
        let payload = self.encode_command_payload(command);
        wire::obfuscate(&payload, magic)
    }
}

fn encode_match_tuple(buf: &mut BytesMut, tuple: &MatchTuple) {
    buf.put_i32(tuple.session);
    buf.put_i32(tuple.division);
    buf.put_u8(tuple.round.code());
    buf.put_i32(tuple.instance);
    buf.put_i32(tuple.match_num);
}

fn decode_match_tuple(buf: &mut &[u8]) -> Result<MatchTuple> {
    let session = get_i32(buf)?;
    let division = get_i32(buf)?;
    let round_code = get_u8(buf)?;
    let round = MatchRound::from_code(round_code).ok_or(Error::UnknownRound(round_code))?;
    let instance = get_i32(buf)?;
    let match_num = get_i32(buf)?;
    Ok(MatchTuple {
        session,
        division,
        round,
        instance,
        match_num,
    })
}

fn get_u8(buf: &mut &[u8]) -> Result<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn get_u32(buf: &mut &[u8]) -> Result<u32> {
    need(buf, 4)?;
    Ok(buf.get_u32())
}

fn get_i32(buf: &mut &[u8]) -> Result<i32> {
    need(buf, 4)?;
    Ok(buf.get_i32())
}

fn need(buf: &&[u8], needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(Error::PayloadTooShort {
            needed,
            have: buf.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple() -> MatchTuple {
        MatchTuple {
            session: 1,
            division: 1,
            round: MatchRound::Qualification,
            instance: 1,
            match_num: 27,
        }
    }

    #[test]
    fn notice_roundtrip_every_kind() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        let notices = vec![
            FieldsetNotice::FieldMatchAssigned {
                field_id: None,
                match_tuple: None,
            },
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(2),
                match_tuple: None,
            },
            FieldsetNotice::FieldMatchAssigned {
                field_id: Some(2),
                match_tuple: Some(tuple()),
            },
            FieldsetNotice::FieldActivated { field_id: 5 },
            FieldsetNotice::MatchStarted { field_id: 1 },
            FieldsetNotice::MatchStopped { field_id: 3 },
            FieldsetNotice::AudienceDisplayChanged {
                display: AudienceDisplay::Rankings,
            },
        ];

        for notice in notices {
            let payload = codec.encode_notice_payload(&notice);
            let decoded = codec.decode_notice_payload(&payload).unwrap();
            assert_eq!(decoded, notice);
        }
    }

    #[test]
    fn notice_roundtrip_through_obfuscation() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        let notice = FieldsetNotice::MatchStarted { field_id: 7 };
        let payload = codec.encode_notice_payload(&notice);
        let frame = crate::wire::obfuscate(&payload, 0xA7);

        assert_eq!(codec.decode_notice(&frame).unwrap(), notice);
    }

    #[test]
    fn command_layouts() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        let start = codec.encode_command_payload(&FieldsetCommand::Start { field_id: 1 });
        assert_eq!(start.as_ref(), &[command_tag::START, 0, 0, 0, 1]);

        let prev = codec.encode_command_payload(&FieldsetCommand::QueuePrevMatch);
        assert_eq!(prev.as_ref(), &[command_tag::QUEUE_PREV_MATCH]);

        let skills = codec.encode_command_payload(&FieldsetCommand::QueueSkills {
            skills_type: SkillsType::Driver,
        });
        assert_eq!(skills.as_ref(), &[command_tag::QUEUE_SKILLS, 2]);

        let display = codec.encode_command_payload(&FieldsetCommand::SetAudienceDisplay {
            display: AudienceDisplay::InMatch,
        });
        assert_eq!(display.as_ref(), &[command_tag::SET_AUDIENCE_DISPLAY, 3]);
    }

    #[test]
    fn command_wrapped_frame_deobfuscates() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        let cmd = FieldsetCommand::Abort { field_id: 2 };
        let frame = codec.encode_command_with_magic(&cmd, 20);
        let payload = crate::wire::deobfuscate(&frame).unwrap();

        assert_eq!(payload, codec.encode_command_payload(&cmd));
    }

    #[test]
    fn unknown_tag_rejected() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        assert!(matches!(
            codec.decode_notice_payload(&[0x7F]),
            Err(Error::UnknownNoticeTag(0x7F))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        // MATCH_STARTED with only two of four field-id bytes
        assert!(matches!(
            codec.decode_notice_payload(&[notice_tag::MATCH_STARTED, 0, 0]),
            Err(Error::PayloadTooShort { .. })
        ));
    }

    #[test]
    fn unknown_display_rejected() {
        let registry = SchemaRegistry::load();
        let codec = FrameCodec::new(&registry);

        assert!(matches!(
            codec.decode_notice_payload(&[notice_tag::AUDIENCE_DISPLAY_CHANGED, 200]),
            Err(Error::UnknownDisplay(200))
        ));
    }

    #[test]
    fn registry_tag_lookup() {
        let registry = SchemaRegistry::load();
        assert_eq!(
            registry.notice_kind(notice_tag::FIELD_ACTIVATED),
            Some(NoticeKind::FieldActivated)
        );
        assert_eq!(registry.notice_kind(0xEE), None);
        assert_eq!(
            registry.command_tag(&FieldsetCommand::QueueNextMatch),
            command_tag::QUEUE_NEXT_MATCH
        );
    }
}
