use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error as ThisError;
use urlencoding::encode;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
}

/// Numeric id of a post or comment. Posts and comments share one id space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContentId {
    fn from(value: u64) -> Self {
        ContentId(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 16;

    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Username",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            // dot-separated segments, each >= 3 chars, starting with a letter
            static ref RE: Regex =
                Regex::new(r"^[a-z][a-z0-9-]+[a-z0-9](\.[a-z][a-z0-9-]+[a-z0-9])*$").unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&string.len())
            && Self::single_regex().is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!("/@{}", encode(self.as_str()))
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Username {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Username::from_string(value)
    }
}

impl FromStr for Username {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Username::from_string(s.to_string())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> String {
        value.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permlink(String);

impl Permlink {
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Permlink",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^[a-z0-9-]{1,256}$").unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        Self::single_regex().is_match(string)
    }
}

impl fmt::Display for Permlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Permlink {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Permlink::from_string(value)
    }
}

impl FromStr for Permlink {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permlink::from_string(s.to_string())
    }
}

impl From<Permlink> for String {
    fn from(value: Permlink) -> String {
        value.0
    }
}

/// Author and permlink, which together name a post uniquely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PostRef {
    pub author: Username,
    pub permlink: Permlink,
}

impl PostRef {
    pub fn new(author: Username, permlink: Permlink) -> Self {
        Self { author, permlink }
    }

    // From "@author/permlink", optionally prefixed by "/category"
    pub fn from_string(string: String) -> Result<Self, RefError> {
        let bad_format = || RefError::BadFormat {
            ref_type: "Post",
            input: string.clone(),
        };

        let caps = Self::single_regex()
            .captures(string.as_str())
            .ok_or_else(bad_format)?;
        let author = caps
            .name("author")
            .map(|m| m.as_str())
            .ok_or_else(bad_format)?;
        let permlink = caps
            .name("permlink")
            .map(|m| m.as_str())
            .ok_or_else(bad_format)?;

        Ok(Self {
            author: author.parse().map_err(|_| bad_format())?,
            permlink: permlink.parse().map_err(|_| bad_format())?,
        })
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^(?:/[^/@]+)?/?@(?P<author>[^/]+)/(?P<permlink>[^/]+)$").unwrap();
        }
        &*RE
    }

    pub fn is_match(string: &str) -> bool {
        Self::from_string(string.to_string()).is_ok()
    }

    pub fn to_page_url(&self) -> String {
        format!(
            "/@{}/{}",
            encode(self.author.as_str()),
            encode(self.permlink.as_str())
        )
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.author, self.permlink)
    }
}

impl TryFrom<String> for PostRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PostRef::from_string(value)
    }
}

impl FromStr for PostRef {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostRef::from_string(s.to_string())
    }
}
