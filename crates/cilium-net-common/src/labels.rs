//! Security labels and their content digest.
//!
//! A `Labels` set is keyed by label key and kept in a `BTreeMap`, so the
//! canonical form hashed into a `LabelDigest` never depends on the order in
//! which labels were inserted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A single `key=value` token. The value may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `"key=value"` or a bare `"key"`. Never fails; the key is trimmed.
    pub fn parse(s: &str) -> Self {
        match s.split_once('=') {
            Some((k, v)) => Label::new(k.trim(), v),
            None => Label::new(s.trim(), ""),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.key)
        } else {
            write!(f, "{}={}", self.key, self.value)
        }
    }
}

impl FromStr for Label {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Label::parse(s))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Label::parse(&s))
    }
}

/// A label set. One value per key; iteration is in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, replacing any previous value for the key.
    pub fn insert(&mut self, label: Label) -> Option<String> {
        self.0.insert(label.key, label.value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Does the set carry `label`? An empty selector value matches on key only.
    pub fn matches(&self, label: &Label) -> bool {
        match self.0.get(&label.key) {
            Some(v) => label.value.is_empty() || *v == label.value,
            None => false,
        }
    }

    /// Canonical serialization: sorted `key=value;` tokens, with `\`, `=` and
    /// `;` inside keys and values backslash-escaped so distinct sets never
    /// share a form.
    pub fn normalized(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.0 {
            push_escaped(&mut out, k);
            out.push('=');
            push_escaped(&mut out, v);
            out.push(';');
        }
        out
    }

    /// SHA-256 over the canonical serialization.
    pub fn digest(&self) -> LabelDigest {
        let mut h = Sha256::new();
        h.update(self.normalized().as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&h.finalize());
        LabelDigest(out)
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        if matches!(c, '\\' | '=' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
}

impl FromIterator<Label> for Labels {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut out = Labels::new();
        for l in iter {
            out.insert(l);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| Label::new(k, v)).collect()
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Labels {
    fn from(m: BTreeMap<K, V>) -> Self {
        m.into_iter().collect()
    }
}

/// Content address of a label set (SHA-256), shown as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelDigest([u8; 32]);

impl LabelDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex chars. `None` for anything else.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(LabelDigest(out))
    }
}

impl fmt::Display for LabelDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for LabelDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelDigest({})", self.to_hex())
    }
}

impl Serialize for LabelDigest {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LabelDigest {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        LabelDigest::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom("digest must be 64 hex chars"))
    }
}

/// A security identity: a deduplicated label set and its holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecCtxLabel {
    /// Numeric identity, allocated monotonically.
    pub id: u32,
    pub labels: Labels,
    pub digest: LabelDigest,
    /// Number of outstanding holders.
    pub refcount: u32,
}
