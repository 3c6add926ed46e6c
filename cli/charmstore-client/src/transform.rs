//! Turning charmstore response bodies into lists of entities.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::entity::{Entity, EntityProcessor};
use crate::error::ShapeError;

/// Caller supplied hook applied to every processed entity.
pub type PostProcess = Arc<dyn Fn(Entity) -> Entity + Send + Sync>;

/// Extract the records of a response body and process each of them.
///
/// Search responses wrap their records in `Results`. Any other body is
/// itself a single record. Record order is preserved.
pub fn transform(
    body: &Value,
    processor: &EntityProcessor,
    post_process: Option<&PostProcess>,
) -> Result<Vec<Entity>, ShapeError> {
    let records = match body.get("Results") {
        Some(Value::Array(records)) => records.iter().collect::<Vec<_>>(),
        None | Some(Value::Null) => vec![body],
        Some(_) => return Err(ShapeError::InvalidResults),
    };
    debug!(records = records.len(), "transforming query results");

    records
        .into_iter()
        .map(|record| {
            let entity = processor.process(record)?;
            Ok(match post_process {
                Some(hook) => hook(entity),
                None => entity,
            })
        })
        .collect()
}
