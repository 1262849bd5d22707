use serde_json::{Map, Value};

/// One row of tabular data as an ordered field → value mapping.
///
/// Field order follows insertion order (the workspace enables
/// `serde_json/preserve_order`), so column order survives a round trip.
pub type Record = Map<String, Value>;

/// Build a record from `(field, value)` pairs, keeping their order.
pub fn record<K, V, I>(fields: I) -> Record
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
