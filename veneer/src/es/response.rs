//! Response shaping for the portal
//!
//! ES 7+ reports `hits.total` as `{"value": N, "relation": "eq"}`; the
//! portal was written against the flat integer from ES 6 and renders "NaN
//! results" when handed the object. It also assumes `max_score` and
//! `aggregations` always exist. Cluster bookkeeping like `_shards` is
//! dropped, hit envelopes pass through untouched.

use serde_json::{json, Map, Value};

/// Shape a raw search response into the envelope the portal expects:
/// `took`, `timed_out`, `hits` (with integer `total` and non-null
/// `max_score`) and `aggregations`.
pub fn normalise_response(resp: Value) -> Value {
    let mut resp = match resp {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let took = resp.remove("took").unwrap_or(json!(0));
    let timed_out = resp.remove("timed_out").unwrap_or(json!(false));

    let mut hits = match resp.remove("hits") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let total = match hits.get("total") {
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_i64).unwrap_or(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    };
    hits.insert("total".to_string(), json!(total));

    if hits.get("max_score").map_or(true, Value::is_null) {
        hits.insert("max_score".to_string(), json!(0.0));
    }

    let aggregations = match resp.remove("aggregations") {
        Some(aggs @ Value::Object(_)) => aggs,
        _ => json!({}),
    };

    let mut out = Map::new();
    out.insert("took".to_string(), took);
    out.insert("timed_out".to_string(), timed_out);
    out.insert("hits".to_string(), Value::Object(hits));
    out.insert("aggregations".to_string(), aggregations);

    // pagination helpers occasionally put a flat total on the top level
    if let Some(total) = resp.get("total") {
        if total.is_i64() || total.is_u64() {
            out.insert("total".to_string(), total.clone());
        }
    }

    Value::Object(out)
}
