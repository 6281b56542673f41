use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// One of the two fixed template slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemplateRole {
    Intro,
    Outro,
}

impl TemplateRole {
    pub const ALL: [TemplateRole; 2] = [TemplateRole::Intro, TemplateRole::Outro];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateRole::Intro => "intro",
            TemplateRole::Outro => "outro",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateRole::Intro => "intro.mp4",
            TemplateRole::Outro => "outro.mp4",
        }
    }
}

impl fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTemplateRole(pub String);

impl fmt::Display for UnknownTemplateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown template type '{}'", self.0)
    }
}

impl std::error::Error for UnknownTemplateRole {}

impl FromStr for TemplateRole {
    type Err = UnknownTemplateRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intro" => Ok(TemplateRole::Intro),
            "outro" => Ok(TemplateRole::Outro),
            other => Err(UnknownTemplateRole(other.to_string())),
        }
    }
}
