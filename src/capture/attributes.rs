use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::capture::context::EventContext;

/// Locator attributes, in the fixed precedence used for predicate assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrKey {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "label")]
    Label,
    #[serde(rename = "dataId")]
    DataId,
}

/// Precedence order paired with the left-hand side of each predicate.
pub const PREDICATES: [(AttrKey, &str); 7] = [
    (AttrKey::Id, "@id"),
    (AttrKey::Text, "text()"),
    (AttrKey::Name, "name"),
    (AttrKey::Type, "@type"),
    (AttrKey::Value, "@value"),
    (AttrKey::Label, "@aria-label"),
    (AttrKey::DataId, "@data-id"),
];

impl AttrKey {
    pub fn as_str(self) -> &'static str {
        match self {
            AttrKey::Id => "id",
            AttrKey::Text => "text",
            AttrKey::Name => "name",
            AttrKey::Type => "type",
            AttrKey::Value => "value",
            AttrKey::Label => "label",
            AttrKey::DataId => "dataId",
        }
    }

    pub fn parse(key: &str) -> Option<AttrKey> {
        PREDICATES.iter().map(|(k, _)| *k).find(|k| k.as_str() == key)
    }

    fn rank(self) -> usize {
        PREDICATES
            .iter()
            .position(|(k, _)| *k == self)
            .unwrap_or(PREDICATES.len())
    }

    /// The context field this attribute reads.
    pub fn value_of(self, ctx: &EventContext) -> &str {
        match self {
            AttrKey::Id => &ctx.id,
            AttrKey::Text => &ctx.text,
            AttrKey::Name => &ctx.name,
            AttrKey::Type => &ctx.input_type,
            AttrKey::Value => &ctx.value,
            AttrKey::Label => &ctx.label,
            AttrKey::DataId => &ctx.data_id,
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute name → included-in-selector flag.
///
/// Entries are kept in precedence order regardless of how they were
/// inserted or deserialized; absent attributes have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredItems {
    entries: Vec<(AttrKey, bool)>,
}

impl RequiredItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: AttrKey, required: bool) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = required,
            None => {
                self.entries.push((key, required));
                self.entries.sort_by_key(|(k, _)| k.rank());
            }
        }
    }

    pub fn get(&self, key: AttrKey) -> Option<bool> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn is_required(&self, key: AttrKey) -> bool {
        self.get(key).unwrap_or(false)
    }

    pub fn any_required(&self) -> bool {
        self.entries.iter().any(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(AttrKey, bool)> for RequiredItems {
    fn from_iter<I: IntoIterator<Item = (AttrKey, bool)>>(iter: I) -> Self {
        let mut items = RequiredItems::new();
        for (k, v) in iter {
            items.set(k, v);
        }
        items
    }
}

impl Serialize for RequiredItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequiredItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = RequiredItems;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute name to boolean")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RequiredItems, A::Error> {
                let mut items = RequiredItems::new();
                while let Some((key, value)) = access.next_entry::<String, bool>()? {
                    // Unknown keys come from newer producers; skip them.
                    if let Some(k) = AttrKey::parse(&key) {
                        items.set(k, value);
                    }
                }
                Ok(items)
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}

/// Decide which attributes the structural locator uses.
///
/// `id` and `text` are always required when present and switch every
/// later attribute off; otherwise all present attributes are required.
pub fn required_items(ctx: &EventContext) -> RequiredItems {
    let mut items = RequiredItems::new();
    let mut required = true;
    if !ctx.id.is_empty() {
        items.set(AttrKey::Id, true);
        required = false;
    }
    if !ctx.text.is_empty() {
        items.set(AttrKey::Text, true);
        required = false;
    }
    for (key, _) in &PREDICATES[2..] {
        if !key.value_of(ctx).is_empty() {
            items.set(*key, required);
        }
    }
    items
}

/// Recompute requirements from per-attribute enable flags: an attribute is
/// required only when enabled and non-blank after trimming.
pub fn required_items_from_flags(ctx: &EventContext, enabled: &HashMap<AttrKey, bool>) -> RequiredItems {
    PREDICATES
        .iter()
        .filter(|(key, _)| !key.value_of(ctx).is_empty())
        .map(|(key, _)| {
            let flag = enabled.get(key).copied().unwrap_or(false);
            (*key, flag && !key.value_of(ctx).trim().is_empty())
        })
        .collect()
}

/// Quote a predicate literal. Values containing `"` switch to single
/// quotes; values containing both quote kinds become a `concat(...)`.
pub fn literal(value: &str) -> String {
    match (value.contains('"'), value.contains('\'')) {
        (false, _) => format!("\"{}\"", value),
        (true, false) => format!("'{}'", value),
        (true, true) => {
            let mut parts = Vec::new();
            for (i, chunk) in value.split('"').enumerate() {
                if i > 0 {
                    parts.push("'\"'".to_string());
                }
                if !chunk.is_empty() {
                    parts.push(format!("\"{}\"", chunk));
                }
            }
            format!("concat({})", parts.join(","))
        }
    }
}

/// Build `tag[pred1][pred2]...` for the required attributes.
pub fn candidate(ctx: &EventContext, items: &RequiredItems) -> String {
    let mut selector = ctx.tag_name.clone();
    for (key, lhs) in &PREDICATES {
        if items.is_required(*key) {
            selector.push_str(&format!("[{}={}]", lhs, literal(key.value_of(ctx))));
        }
    }
    selector
}
