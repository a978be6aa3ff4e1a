//! JSON snapshot codec
//!
//! Document shape:
//!
//! ```json
//! {
//!   "nodes": [ { "id": "1", "label": "book", "properties": { ... } } ],
//!   "edges": [ { "source": "1", "target": "2", "weight": 1.0 } ]
//! }
//! ```

use super::{PersistenceError, PersistenceResult};
use crate::graph::GraphSnapshot;

/// Serialize a snapshot as pretty-printed UTF-8 JSON
pub fn encode(snapshot: &GraphSnapshot) -> PersistenceResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a snapshot document.
///
/// Empty or whitespace-only input is the empty graph. Anything else that is
/// not a well-formed snapshot document is `PersistenceError::Malformed`.
pub fn decode(bytes: &[u8]) -> PersistenceResult<GraphSnapshot> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(GraphSnapshot::empty());
    }
    serde_json::from_slice(bytes).map_err(|e| PersistenceError::Malformed(e.to_string()))
}
