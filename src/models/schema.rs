//! Structured-output schema descriptors and their normalization.
//!
//! Clients send a JSON-schema-like tree as `config.responseSchema`. Before it is
//! forwarded, every `type` string naming a member of the provider's type
//! enumeration is re-typed as that member. Strings outside the enumeration are
//! carried through untouched: the tree comes from untrusted client JSON and
//! rejecting unknown names would break newer clients.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// The provider's schema type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    TypeUnspecified,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

static TYPE_NAMES: OnceLock<HashMap<&'static str, SchemaType>> = OnceLock::new();

/// Names the provider recognizes, keyed exactly as the provider SDK spells them.
fn type_names() -> &'static HashMap<&'static str, SchemaType> {
    TYPE_NAMES.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("TYPE_UNSPECIFIED", SchemaType::TypeUnspecified);
        m.insert("STRING", SchemaType::String);
        m.insert("NUMBER", SchemaType::Number);
        m.insert("INTEGER", SchemaType::Integer);
        m.insert("BOOLEAN", SchemaType::Boolean);
        m.insert("ARRAY", SchemaType::Array);
        m.insert("OBJECT", SchemaType::Object);
        m.insert("NULL", SchemaType::Null);
        m
    })
}

impl SchemaType {
    /// Look up an enumeration member by name. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        type_names().get(name).copied()
    }
}

/// Value of a descriptor's `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    /// Resolved member of the provider enumeration.
    Known(SchemaType),
    /// String as received from the client, not (or not yet) resolved.
    Raw(String),
    /// Non-string value (e.g. a JSON-schema type union), passed through verbatim.
    Opaque(Value),
}

impl TypeName {
    /// Resolve a raw name against the enumeration; everything else is returned as is.
    pub fn normalize(self) -> Self {
        match self {
            TypeName::Raw(name) => match SchemaType::from_name(&name) {
                Some(known) => TypeName::Known(known),
                None => TypeName::Raw(name),
            },
            other => other,
        }
    }
}

impl Serialize for TypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TypeName::Known(t) => t.serialize(serializer),
            TypeName::Raw(s) => serializer.serialize_str(s),
            TypeName::Opaque(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => TypeName::Raw(s),
            other => TypeName::Opaque(other),
        })
    }
}

/// A `type` key that is present is kept, even when it holds `null`.
fn present_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<TypeName>, D::Error> {
    TypeName::deserialize(deserializer).map(Some)
}

/// A node of the structured-output schema tree.
///
/// Only `type`, `properties` and `items` are interpreted. Every other key
/// (`description`, `enum`, `required`, `nullable`, ...) lives in `extra` and is
/// forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_name: Option<TypeName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaDescriptor>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaDescriptor>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Structural view of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptorKind<'a> {
    Leaf,
    Object(&'a BTreeMap<String, SchemaDescriptor>),
    Array(&'a SchemaDescriptor),
}

impl DescriptorKind<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Leaf => "leaf",
            DescriptorKind::Object(_) => "object",
            DescriptorKind::Array(_) => "array",
        }
    }
}

impl SchemaDescriptor {
    pub fn leaf(type_name: &str) -> Self {
        Self {
            type_name: Some(TypeName::Raw(type_name.to_string())),
            ..Default::default()
        }
    }

    pub fn object<I, K>(type_name: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaDescriptor)>,
        K: Into<String>,
    {
        Self {
            type_name: Some(TypeName::Raw(type_name.to_string())),
            properties: Some(properties.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            ..Default::default()
        }
    }

    pub fn array(type_name: &str, items: SchemaDescriptor) -> Self {
        Self {
            type_name: Some(TypeName::Raw(type_name.to_string())),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Classify the node. A node carrying both `properties` and `items`
    /// reports as an object; both subtrees are still normalized.
    pub fn kind(&self) -> DescriptorKind<'_> {
        match (&self.properties, &self.items) {
            (Some(props), _) => DescriptorKind::Object(props),
            (None, Some(items)) => DescriptorKind::Array(items),
            (None, None) => DescriptorKind::Leaf,
        }
    }

    /// Rebuild the tree, passing every `type` through `f`.
    ///
    /// Nodes are visited depth-first: the node's own `type`, then each entry of
    /// `properties` in key order, then `items`.
    pub fn map_types<F>(self, f: &mut F) -> Self
    where
        F: FnMut(TypeName) -> TypeName,
    {
        let type_name = self.type_name.map(&mut *f);
        let properties = self.properties.map(|props| {
            props
                .into_iter()
                .map(|(name, child)| (name, child.map_types(f)))
                .collect()
        });
        let items = self.items.map(|child| Box::new(child.map_types(f)));

        Self {
            type_name,
            properties,
            items,
            extra: self.extra,
        }
    }

    /// Re-type every recognized `type` name as the provider enumeration member.
    pub fn normalize(self) -> Self {
        self.map_types(&mut TypeName::normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_known_names_resolve() {
        assert_eq!(SchemaType::from_name("OBJECT"), Some(SchemaType::Object));
        assert_eq!(SchemaType::from_name("TYPE_UNSPECIFIED"), Some(SchemaType::TypeUnspecified));
        assert_eq!(SchemaType::from_name("object"), None);
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let schema = SchemaDescriptor::object("object", [("n", SchemaDescriptor::leaf("decimal"))]);
        let normalized = schema.normalize();
        assert_eq!(normalized.type_name, Some(TypeName::Raw("object".to_string())));
        let n = &normalized.properties.as_ref().unwrap()["n"];
        assert_eq!(n.type_name, Some(TypeName::Raw("decimal".to_string())));
    }

    #[test]
    fn test_non_type_fields_are_preserved() {
        let raw = json!({
            "type": "OBJECT",
            "description": "passage",
            "required": ["rvr1960"],
            "properties": {
                "rvr1960": { "type": "STRING", "nullable": true }
            }
        });
        let schema: SchemaDescriptor = serde_json::from_value(raw).unwrap();
        let out = serde_json::to_value(schema.normalize()).unwrap();
        assert_eq!(out["description"], "passage");
        assert_eq!(out["required"], json!(["rvr1960"]));
        assert_eq!(out["properties"]["rvr1960"]["nullable"], true);
        assert_eq!(out["properties"]["rvr1960"]["type"], "STRING");
    }

    #[test]
    fn test_type_union_is_opaque() {
        let schema: SchemaDescriptor =
            serde_json::from_value(json!({ "type": ["STRING", "NULL"] })).unwrap();
        let normalized = schema.normalize();
        assert_eq!(
            normalized.type_name,
            Some(TypeName::Opaque(json!(["STRING", "NULL"])))
        );
    }

    #[test]
    fn test_null_type_is_kept() {
        let raw = json!({ "description": "d", "type": null });
        let schema: SchemaDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(schema.type_name, Some(TypeName::Opaque(Value::Null)));
        assert_eq!(serde_json::to_value(schema.normalize()).unwrap(), raw);

        let untyped: SchemaDescriptor = serde_json::from_value(json!({ "description": "d" })).unwrap();
        assert_eq!(untyped.type_name, None);
        assert_eq!(serde_json::to_value(untyped).unwrap(), json!({ "description": "d" }));
    }

    #[test]
    fn test_depth_first_visit_order() {
        // properties nested three deep, items chained two deep
        let schema = SchemaDescriptor::object(
            "OBJECT",
            [
                (
                    "a",
                    SchemaDescriptor::object(
                        "OBJECT",
                        [("b", SchemaDescriptor::object("OBJECT", [("c", SchemaDescriptor::leaf("STRING"))]))],
                    ),
                ),
                (
                    "list",
                    SchemaDescriptor::array("ARRAY", SchemaDescriptor::array("ARRAY", SchemaDescriptor::leaf("INTEGER"))),
                ),
            ],
        );

        let mut seen = Vec::new();
        let mut tag = 0;
        let relabeled = schema.map_types(&mut |t: TypeName| {
            if let TypeName::Raw(name) = &t {
                seen.push(name.clone());
            }
            tag += 1;
            TypeName::Raw(format!("t{}", tag))
        });

        assert_eq!(
            seen,
            vec!["OBJECT", "OBJECT", "OBJECT", "STRING", "ARRAY", "ARRAY", "INTEGER"]
        );

        // every node visited exactly once
        let a = &relabeled.properties.as_ref().unwrap()["a"];
        let c = &a.properties.as_ref().unwrap()["b"].properties.as_ref().unwrap()["c"];
        assert_eq!(c.type_name, Some(TypeName::Raw("t4".to_string())));
        let list = &relabeled.properties.as_ref().unwrap()["list"];
        let innermost = list.items.as_ref().unwrap().items.as_ref().unwrap();
        assert_eq!(innermost.type_name, Some(TypeName::Raw("t7".to_string())));
        assert!(matches!(innermost.kind(), DescriptorKind::Leaf));
    }

    #[test]
    fn test_properties_and_items_both_normalized() {
        let mut schema = SchemaDescriptor::object("OBJECT", [("x", SchemaDescriptor::leaf("STRING"))]);
        schema.items = Some(Box::new(SchemaDescriptor::leaf("NUMBER")));
        let normalized = schema.normalize();
        assert!(matches!(normalized.kind(), DescriptorKind::Object(_)));
        assert_eq!(normalized.kind().as_str(), "object");
        assert_eq!(
            normalized.items.unwrap().type_name,
            Some(TypeName::Known(SchemaType::Number))
        );
    }

    fn arb_type_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("STRING".to_string()),
            Just("OBJECT".to_string()),
            Just("ARRAY".to_string()),
            Just("NULL".to_string()),
            "[a-z]{1,8}",
        ]
    }

    fn arb_descriptor() -> impl Strategy<Value = SchemaDescriptor> {
        let leaf = arb_type_name().prop_map(|t| SchemaDescriptor::leaf(&t));
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                (arb_type_name(), prop::collection::btree_map("[a-z]{1,5}", inner.clone(), 0..4))
                    .prop_map(|(t, props)| SchemaDescriptor::object(&t, props)),
                (arb_type_name(), inner).prop_map(|(t, items)| SchemaDescriptor::array(&t, items)),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(schema in arb_descriptor()) {
            let once = schema.normalize();
            let twice = once.clone().normalize();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalize_preserves_wire_shape(schema in arb_descriptor()) {
            // re-typing never changes the serialized strings
            let before = serde_json::to_value(&schema).unwrap();
            let after = serde_json::to_value(schema.normalize()).unwrap();
            prop_assert_eq!(before, after);
        }
    }
}
