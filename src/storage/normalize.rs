//! Document value normalization
//!
//! The driver hands out nested values in more than one representation: an
//! owned [`Bson`] tree for decoded documents, and borrowed [`RawBsonRef`]
//! values for documents read straight off the wire. Both carry the same three
//! shapes (mapping, sequence, scalar), so normalization is one recursive walk
//! over [`Shape`] instead of a case per driver type.
//!
//! The reverse direction, [`to_bson`], turns a [`GenericValue`] into the
//! document value that gets persisted.

use mongodb::bson::{doc, Bson, Document, RawBsonRef, RawDocument};
use serde_json::{Map, Number};

use super::traits::{EntityId, GenericValue, StorageError, StorageResult};

/// Field holding the entity state inside a stored document.
pub const DATA_FIELD: &str = "data";

/// Primary key field of a stored document.
pub const ID_FIELD: &str = "_id";

/// Iterator over the entries of a mapping-shaped value.
pub type Entries<'a, V> = Box<dyn Iterator<Item = StorageResult<(&'a str, V)>> + 'a>;

/// Iterator over the elements of a sequence-shaped value.
pub type Elements<'a, V> = Box<dyn Iterator<Item = StorageResult<V>> + 'a>;

/// Closed set of shapes a stored value can take.
pub enum Shape<'a, V> {
    /// Nested mapping, whatever its driver representation
    Mapping(Entries<'a, V>),
    /// Ordered sequence
    Sequence(Elements<'a, V>),
    /// Leaf value, already converted
    Scalar(GenericValue),
}

/// A driver value that can be classified into a [`Shape`].
pub trait DocumentValue<'a>: Sized + 'a {
    /// Classify this value; children keep the same representation.
    fn shape(self) -> StorageResult<Shape<'a, Self>>;
}

impl<'a> DocumentValue<'a> for &'a Bson {
    fn shape(self) -> StorageResult<Shape<'a, Self>> {
        Ok(match self {
            Bson::Document(doc) => Shape::Mapping(Box::new(
                doc.iter()
                    .map(|(k, v)| Ok::<_, StorageError>((k.as_str(), v))),
            )),
            Bson::Array(items) => {
                Shape::Sequence(Box::new(items.iter().map(Ok::<_, StorageError>)))
            }
            scalar => Shape::Scalar(scalar_to_generic(scalar.clone())?),
        })
    }
}

impl<'a> DocumentValue<'a> for RawBsonRef<'a> {
    fn shape(self) -> StorageResult<Shape<'a, Self>> {
        Ok(match self {
            RawBsonRef::Document(doc) => Shape::Mapping(Box::new(
                doc.into_iter()
                    .map(|entry| entry.map_err(|e| StorageError::Decode(e.to_string()))),
            )),
            RawBsonRef::Array(items) => Shape::Sequence(Box::new(
                items
                    .into_iter()
                    .map(|item| item.map_err(|e| StorageError::Decode(e.to_string()))),
            )),
            scalar => {
                let owned = Bson::try_from(scalar.to_raw_bson())
                    .map_err(|e| StorageError::Decode(e.to_string()))?;
                Shape::Scalar(scalar_to_generic(owned)?)
            }
        })
    }
}

/// Recursively convert a driver value into the canonical [`GenericValue`].
///
/// Every mapping at every depth becomes a `serde_json::Map`; sequences keep
/// their order and length.
pub fn normalize<'a, V: DocumentValue<'a>>(value: V) -> StorageResult<GenericValue> {
    match value.shape()? {
        Shape::Mapping(entries) => {
            let mut map = Map::new();
            for entry in entries {
                let (key, child) = entry?;
                map.insert(key.to_string(), normalize(child)?);
            }
            Ok(GenericValue::Object(map))
        }
        Shape::Sequence(elements) => elements
            .map(|element| element.and_then(|child| normalize(child)))
            .collect::<StorageResult<Vec<_>>>()
            .map(GenericValue::Array),
        Shape::Scalar(scalar) => Ok(scalar),
    }
}

fn scalar_to_generic(value: Bson) -> StorageResult<GenericValue> {
    Ok(match value {
        Bson::Null | Bson::Undefined => GenericValue::Null,
        Bson::Boolean(b) => GenericValue::Bool(b),
        Bson::String(s) => GenericValue::String(s),
        Bson::Int32(i) => GenericValue::Number(i.into()),
        Bson::Int64(i) => GenericValue::Number(i.into()),
        Bson::Double(f) => Number::from_f64(f)
            .map(GenericValue::Number)
            .ok_or_else(|| StorageError::Decode(format!("non-finite double {}", f)))?,
        // ObjectId, DateTime, Binary, Decimal128, ... written by other tools
        other => other.into_relaxed_extjson(),
    })
}

/// Convert a [`GenericValue`] into the BSON value that gets stored.
///
/// Integers that fit in 32 bits are stored as Int32, wider ones as Int64.
pub fn to_bson(value: &GenericValue) -> StorageResult<Bson> {
    Ok(match value {
        GenericValue::Null => Bson::Null,
        GenericValue::Bool(b) => Bson::Boolean(*b),
        GenericValue::String(s) => Bson::String(s.clone()),
        GenericValue::Number(n) => number_to_bson(n)?,
        GenericValue::Array(items) => {
            Bson::Array(items.iter().map(to_bson).collect::<StorageResult<Vec<_>>>()?)
        }
        GenericValue::Object(map) => {
            let mut doc = Document::new();
            for (key, child) in map {
                doc.insert(key.clone(), to_bson(child)?);
            }
            Bson::Document(doc)
        }
    })
}

fn number_to_bson(n: &Number) -> StorageResult<Bson> {
    if let Some(i) = n.as_i64() {
        return Ok(match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        });
    }
    if let Some(u) = n.as_u64() {
        return Err(StorageError::Encode(format!(
            "integer {} exceeds the signed 64-bit range",
            u
        )));
    }
    n.as_f64()
        .map(Bson::Double)
        .ok_or_else(|| StorageError::Encode(format!("unrepresentable number {}", n)))
}

/// Build the stored document `{_id: id, data: value}`.
pub fn entity_document(id: &EntityId, value: &GenericValue) -> StorageResult<Document> {
    Ok(doc! {
        ID_FIELD: id.as_str(),
        DATA_FIELD: to_bson(value)?,
    })
}

/// Normalized entity state held in a stored document's `data` field.
///
/// A document without that field fails with [`StorageError::Decode`].
pub fn entity_data(doc: &RawDocument) -> StorageResult<GenericValue> {
    let data = doc
        .get(DATA_FIELD)
        .map_err(|e| StorageError::Decode(e.to_string()))?
        .ok_or_else(|| {
            StorageError::Decode(format!("document has no {} field", DATA_FIELD))
        })?;
    normalize(data)
}

/// Entity id held in a stored document's `_id` field.
///
/// Only string ids are entity ids; anything else fails with
/// [`StorageError::Decode`].
pub fn entity_id(doc: &RawDocument) -> StorageResult<EntityId> {
    doc.get_str(ID_FIELD)
        .map(EntityId::from)
        .map_err(|e| StorageError::Decode(format!("invalid {}: {}", ID_FIELD, e)))
}
