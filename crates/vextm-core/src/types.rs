//! Protocol types for field-set control
//!
//! The tagged unions here mirror the server's notice/command vocabulary
//! exactly: each variant carries the fields of its tag and nothing else.

use serde::{Deserialize, Serialize};

/// Round of a scheduled match.
///
/// Serde names match the strings the TM web server uses in its REST
/// responses; the `u8` codes are the binary wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchRound {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "PRACTICE")]
    Practice,
    #[serde(rename = "QUAL")]
    Qualification,
    #[serde(rename = "QF")]
    Quarterfinal,
    #[serde(rename = "SF")]
    Semifinal,
    #[serde(rename = "F")]
    Final,
    #[serde(rename = "R16")]
    RoundOf16,
    #[serde(rename = "R32")]
    RoundOf32,
    #[serde(rename = "R64")]
    RoundOf64,
    #[serde(rename = "R128")]
    RoundOf128,
    #[serde(rename = "TOP_N")]
    TopN,
    #[serde(rename = "ROUND_ROBIN")]
    RoundRobin,
    #[serde(rename = "SKILLS")]
    Skills,
    #[serde(rename = "TIMEOUT")]
    Timeout,
}

impl MatchRound {
    pub fn code(self) -> u8 {
        match self {
            MatchRound::None => 0,
            MatchRound::Practice => 1,
            MatchRound::Qualification => 2,
            MatchRound::Quarterfinal => 3,
            MatchRound::Semifinal => 4,
            MatchRound::Final => 5,
            MatchRound::RoundOf16 => 6,
            MatchRound::RoundOf32 => 7,
            MatchRound::RoundOf64 => 8,
            MatchRound::RoundOf128 => 9,
            MatchRound::TopN => 10,
            MatchRound::RoundRobin => 11,
            MatchRound::Skills => 12,
            MatchRound::Timeout => 13,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MatchRound::None),
            1 => Some(MatchRound::Practice),
            2 => Some(MatchRound::Qualification),
            3 => Some(MatchRound::Quarterfinal),
            4 => Some(MatchRound::Semifinal),
            5 => Some(MatchRound::Final),
            6 => Some(MatchRound::RoundOf16),
            7 => Some(MatchRound::RoundOf32),
            8 => Some(MatchRound::RoundOf64),
            9 => Some(MatchRound::RoundOf128),
            10 => Some(MatchRound::TopN),
            11 => Some(MatchRound::RoundRobin),
            12 => Some(MatchRound::Skills),
            13 => Some(MatchRound::Timeout),
            _ => None,
        }
    }
}

/// Skills run type for `queueSkills`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillsType {
    #[serde(rename = "NO_SKILLS")]
    None,
    #[serde(rename = "PROGRAMMING")]
    Programming,
    #[serde(rename = "DRIVER")]
    Driver,
}

impl SkillsType {
    pub fn code(self) -> u8 {
        match self {
            SkillsType::None => 0,
            SkillsType::Programming => 1,
            SkillsType::Driver => 2,
        }
    }
}

/// Screen currently shown on the audience displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudienceDisplay {
    #[default]
    Blank,
    Logo,
    Intro,
    InMatch,
    SavedMatchResults,
    Schedule,
    Rankings,
    SkillsRankings,
    AllianceSelection,
    Bracket,
    Awards,
    Inspection,
}

impl AudienceDisplay {
    pub fn code(self) -> u8 {
        match self {
            AudienceDisplay::Blank => 0,
            AudienceDisplay::Logo => 1,
            AudienceDisplay::Intro => 2,
            AudienceDisplay::InMatch => 3,
            AudienceDisplay::SavedMatchResults => 4,
            AudienceDisplay::Schedule => 5,
            AudienceDisplay::Rankings => 6,
            AudienceDisplay::SkillsRankings => 7,
            AudienceDisplay::AllianceSelection => 8,
            AudienceDisplay::Bracket => 9,
            AudienceDisplay::Awards => 10,
            AudienceDisplay::Inspection => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AudienceDisplay::Blank),
            1 => Some(AudienceDisplay::Logo),
            2 => Some(AudienceDisplay::Intro),
            3 => Some(AudienceDisplay::InMatch),
            4 => Some(AudienceDisplay::SavedMatchResults),
            5 => Some(AudienceDisplay::Schedule),
            6 => Some(AudienceDisplay::Rankings),
            7 => Some(AudienceDisplay::SkillsRankings),
            8 => Some(AudienceDisplay::AllianceSelection),
            9 => Some(AudienceDisplay::Bracket),
            10 => Some(AudienceDisplay::Awards),
            11 => Some(AudienceDisplay::Inspection),
            _ => None,
        }
    }
}

/// Identifies one scheduled match. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchTuple {
    pub session: i32,
    pub division: i32,
    pub round: MatchRound,
    pub instance: i32,
    #[serde(rename = "match")]
    pub match_num: i32,
}

/// Kind of an inbound field-set notice; the dispatcher's subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    FieldMatchAssigned,
    FieldActivated,
    MatchStarted,
    MatchStopped,
    AudienceDisplayChanged,
}

/// All notice kinds, in tag order. Used by the schema registry.
pub const NOTICE_KINDS: [NoticeKind; 5] = [
    NoticeKind::FieldMatchAssigned,
    NoticeKind::FieldActivated,
    NoticeKind::MatchStarted,
    NoticeKind::MatchStopped,
    NoticeKind::AudienceDisplayChanged,
];

/// Server-to-client event on a field set
#[derive(Debug, Clone, PartialEq)]
pub enum FieldsetNotice {
    /// A match (or nothing) was assigned to a field. An empty match payload
    /// with a field id present means a timeout slot was queued; empty with
    /// no field id means the field set was cleared.
    FieldMatchAssigned {
        field_id: Option<u32>,
        match_tuple: Option<MatchTuple>,
    },
    FieldActivated { field_id: u32 },
    MatchStarted { field_id: u32 },
    MatchStopped { field_id: u32 },
    AudienceDisplayChanged { display: AudienceDisplay },
}

impl FieldsetNotice {
    pub fn kind(&self) -> NoticeKind {
        match self {
            FieldsetNotice::FieldMatchAssigned { .. } => NoticeKind::FieldMatchAssigned,
            FieldsetNotice::FieldActivated { .. } => NoticeKind::FieldActivated,
            FieldsetNotice::MatchStarted { .. } => NoticeKind::MatchStarted,
            FieldsetNotice::MatchStopped { .. } => NoticeKind::MatchStopped,
            FieldsetNotice::AudienceDisplayChanged { .. } => NoticeKind::AudienceDisplayChanged,
        }
    }
}

/// Client-to-server instruction for a field set
#[derive(Debug, Clone, PartialEq)]
pub enum FieldsetCommand {
    Start { field_id: u32 },
    EndEarly { field_id: u32 },
    Abort { field_id: u32 },
    Reset { field_id: u32 },
    QueuePrevMatch,
    QueueNextMatch,
    QueueSkills { skills_type: SkillsType },
    SetAudienceDisplay { display: AudienceDisplay },
}

/// Play state of the current match slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Unplayed,
    Running,
    Stopped,
}

/// What is currently occupying the field set.
///
/// Only `Timeout` and `Match` carry a play state; `None` carries nothing.
/// A timeout is a field-set activity slot with no real match behind it
/// (e.g. a scheduled break), tracked with the same state shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldsetMatch {
    None,
    Timeout {
        state: MatchState,
        field_id: u32,
        active: bool,
    },
    Match {
        state: MatchState,
        tuple: MatchTuple,
        field_id: Option<u32>,
        active: bool,
    },
}

/// Live state of one connected field set.
///
/// Created alongside the connection and mutated only by [`crate::reduce`]
/// in response to inbound notices.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldsetState {
    pub current_match: FieldsetMatch,
    pub audience_display: AudienceDisplay,
}

impl Default for FieldsetState {
    fn default() -> Self {
        Self {
            current_match: FieldsetMatch::None,
            audience_display: AudienceDisplay::Blank,
        }
    }
}
