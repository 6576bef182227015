// used to decode and re-encode records
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// used for the `created` timestamp carried by every record
use chrono::{DateTime, Utc};

// used to print out readable forms of enumerated values
use std::fmt;
use std::sync::Arc;

use crate::filter::{FieldPolicy, PredicateMode};

pub type Ref<T> = Arc<T>; // records are shared between dataset, filtered view and responses

pub type RecordId = u64;

/// A kind of record served by one collection endpoint of the catalog.
///
/// Implementors declare where they live (`COLLECTION`), which fields can be
/// filtered and how (`FILTERS`), and what their cross-references point at
/// (`Detail`). The engine in [`crate::view`] is generic over this trait, so the
/// three kinds share one implementation.
pub trait Record: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static {
    // static stuff which needs to be implemented downstream
    const COLLECTION: &'static str;
    const FILTERS: &'static [FieldPolicy];
    type Detail: Record;
    fn id(&self) -> RecordId;
    /// Current value of a queryable field, `None` for fields outside `FILTERS`.
    fn field(&self, field: &str) -> Option<&str>;
    /// URLs of the records this one refers to, in upstream order.
    fn cross_refs(&self) -> &[String];
}

// ------------- Enumerated values -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Alive,
    Dead,
    #[serde(rename = "unknown")]
    Unknown,
}
impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Alive => "Alive",
            Status::Dead => "Dead",
            Status::Unknown => "unknown",
        }
    }
}
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}
impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Genderless => "Genderless",
            Gender::Unknown => "unknown",
        }
    }
}
impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name and URL of a location a character is tied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLink {
    pub name: String,
    pub url: String,
}

// ------------- Character -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: RecordId,
    pub name: String,
    pub status: Status,
    pub species: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub origin: NamedLink,
    #[serde(default)]
    pub location: NamedLink,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub episode: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Record for Character {
    const COLLECTION: &'static str = "character";
    const FILTERS: &'static [FieldPolicy] = &[
        FieldPolicy::new("name", PredicateMode::SubstringAllTerms),
        FieldPolicy::new("status", PredicateMode::Exact),
        FieldPolicy::new("species", PredicateMode::Substring),
        FieldPolicy::new("gender", PredicateMode::Exact),
    ];
    type Detail = Episode;
    fn id(&self) -> RecordId {
        self.id
    }
    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "status" => Some(self.status.as_str()),
            "species" => Some(&self.species),
            "gender" => Some(self.gender.as_str()),
            _ => None,
        }
    }
    fn cross_refs(&self) -> &[String] {
        &self.episode
    }
}

// ------------- Location -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub residents: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Record for Location {
    const COLLECTION: &'static str = "location";
    const FILTERS: &'static [FieldPolicy] = &[
        FieldPolicy::new("name", PredicateMode::Substring),
        FieldPolicy::new("type", PredicateMode::Substring),
        FieldPolicy::new("dimension", PredicateMode::Substring),
    ];
    type Detail = Character;
    fn id(&self) -> RecordId {
        self.id
    }
    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "type" => Some(&self.kind),
            "dimension" => Some(&self.dimension),
            _ => None,
        }
    }
    fn cross_refs(&self) -> &[String] {
        &self.residents
    }
}

// ------------- Episode -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub air_date: String,
    /// Season and episode code, e.g. `S01E01`.
    pub episode: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Record for Episode {
    const COLLECTION: &'static str = "episode";
    const FILTERS: &'static [FieldPolicy] = &[
        FieldPolicy::new("name", PredicateMode::SubstringAllTerms),
        FieldPolicy::new("episode", PredicateMode::Substring),
    ];
    type Detail = Character;
    fn id(&self) -> RecordId {
        self.id
    }
    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "episode" => Some(&self.episode),
            _ => None,
        }
    }
    fn cross_refs(&self) -> &[String] {
        &self.characters
    }
}
