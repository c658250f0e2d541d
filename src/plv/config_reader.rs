use crate::plv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

impl OutputSettings {
    pub fn named(contest_name: &str) -> OutputSettings {
        OutputSettings {
            contest_name: contest_name.to_string(),
            output_directory: None,
            contest_date: None,
            contest_jurisdiction: None,
            contest_office: None,
        }
    }
}

/// The header of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub seats: String,
    pub ballots: String,
    pub parties: String,
    pub candidates: String,
    pub quota: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PlvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

impl PlvRules {
    pub fn tiebreak_mode(&self) -> PlvResult<TieBreakMode> {
        match self.tiebreak_mode.as_deref() {
            None | Some("random") => Ok(TieBreakMode::Random),
            Some("seeded") => match self.random_seed.as_ref().map(|s| s.trim().parse::<u64>()) {
                Some(Ok(seed)) => Ok(TieBreakMode::Seeded(seed)),
                x => whatever!("tiebreak mode seeded needs a numeric randomSeed, got {:?}", x),
            },
            Some(x) => whatever!("unknown tiebreak mode: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PlvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotFileSources", default)]
    pub ballot_file_sources: Vec<FileSource>,
    pub rules: Option<PlvRules>,
}

pub fn read_config(path: &str) -> BPlvResult<PlvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PlvConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BPlvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
