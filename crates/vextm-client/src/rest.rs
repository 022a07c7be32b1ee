//! REST data transfer objects
//!
//! Shapes the TM web server returns from its `/api` endpoints. Field
//! names follow the server's camelCase JSON.

use serde::Deserialize;
use vextm_core::MatchTuple;

#[derive(Debug, Clone, Deserialize)]
pub struct EventInfo {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Division {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "HIGH_SCHOOL")]
    HighSchool,
    #[serde(rename = "MIDDLE_SCHOOL")]
    MiddleSchool,
    #[serde(rename = "ELEMENTARY_SCHOOL")]
    ElementarySchool,
    #[serde(rename = "COLLEGE")]
    College,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub number: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub age_group: AgeGroup,
    pub div_id: i32,
    pub checked_in: bool,
}

/// Schedule state of a match as reported by the web server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MatchScheduleState {
    #[serde(rename = "UNPLAYED")]
    Unplayed,
    #[serde(rename = "SCORED")]
    Scored,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    pub number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchAlliance {
    pub teams: Vec<TeamRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub time_scheduled: i64,
    pub state: MatchScheduleState,
    pub alliances: Vec<MatchAlliance>,
    pub match_tuple: MatchTuple,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub winning_alliance: i32,
    pub final_score: Vec<i32>,
    pub match_info: MatchInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankAlliance {
    pub name: String,
    pub teams: Vec<TeamRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: i32,
    pub tied: bool,
    pub alliance: Vec<RankAlliance>,
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
    pub wp: f64,
    pub ap: f64,
    pub sp: f64,
    pub avg_points: f64,
    pub total_points: i32,
    pub high_score: i32,
    pub num_matches: i32,
    pub min_num_matches: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsRanking {
    pub rank: i32,
    pub tie: bool,
    pub number: String,
    pub total_score: i32,
    pub prog_high_score: i32,
    pub prog_attempts: i32,
    pub driver_high_score: i32,
    pub driver_attempts: i32,
}

/// One field set as listed by `GET /api/fieldsets`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldsetInfo {
    pub id: i32,
    pub name: String,
}

/// One field within a field set.
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub id: i32,
    pub name: String,
}

// Response envelopes

#[derive(Debug, Deserialize)]
pub(crate) struct DivisionsResponse {
    pub divisions: Vec<Division>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldsetsResponse {
    pub field_sets: Vec<FieldsetInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldsResponse {
    pub fields: Vec<Field>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchesResponse {
    pub matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingsResponse {
    pub rankings: Vec<Ranking>,
}
