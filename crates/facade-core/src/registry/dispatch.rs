//! Request dispatch shared by every backend handler.

use super::{lock, Shared, WeakShared};
use crate::backend::Handler;
use crate::error::FacadeError;
use crate::routes::RouteAction;
use crate::store::table::{id_segment, record_id};
use crate::types::{Request, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Backend handler resolving requests against the registry behind `weak`.
pub(crate) fn route_handler(weak: WeakShared) -> Handler {
    Arc::new(move |request: &Request| {
        let shared = weak.upgrade().ok_or(FacadeError::RegistryDropped)?;
        dispatch(&shared, request)
    })
}

/// Resolve a request to its route and answer it.
///
/// A pending override wins over the route's default behavior. Custom
/// callbacks and `create_default` factories run without the registry lock.
pub(crate) fn dispatch(shared: &Shared, request: &Request) -> Result<Response, FacadeError> {
    let mut inner = lock(shared);
    let route = inner
        .world
        .routes
        .find_route_mut(request.method, &request.url)?;

    if let Some(special) = route.get_special_response() {
        debug!(route = route.key(), status = special.status, "answering with override");
        return Ok(special.into_response());
    }
    debug!(route = route.key(), "dispatching request");

    let resource = route.resource().to_owned();
    let action = route.action().clone();

    match action {
        RouteAction::Index => {
            let records = inner.world.table(&resource)?.get_all();
            Ok(Response::ok(&Value::Array(records)))
        }
        RouteAction::Show { id } => {
            let record = inner.world.table(&resource)?.find(&id)?;
            Ok(Response::ok(record))
        }
        RouteAction::Update { id } => {
            let changes = request.json_body()?;
            let Value::Object(changes) = changes else {
                return Err(FacadeError::validation(format!(
                    "PUT {} expects a JSON object body",
                    request.url
                )));
            };
            let record = inner.world.table_mut(&resource)?.find_mut(&id)?;
            if let Some(fields) = record.as_object_mut() {
                fields.extend(changes);
            }
            Ok(Response::ok(record))
        }
        RouteAction::Destroy { id } => {
            let removed = inner.world.table_mut(&resource)?.delete(&id)?;
            Ok(Response::ok(&removed))
        }
        RouteAction::Create => {
            let payload = request.json_body()?;
            let factory = inner.world.resource(&resource)?.create_default.clone();
            drop(inner);

            let record = match factory {
                Some(factory) if record_id(&payload).is_none() => factory(&payload),
                _ => payload,
            };
            let created = lock(shared).add_item(&Arc::downgrade(shared), &resource, record)?;
            Ok(Response::ok(&created))
        }
        RouteAction::Item { id, callback } => {
            let body = request.json_body()?;
            let mut record = inner.world.table(&resource)?.find(&id)?.clone();
            drop(inner);

            let result = callback.call(&body, &mut record, &request.headers);
            if record_id(&record) != Some(&id) {
                return Err(FacadeError::validation(format!(
                    "{} {} changed the id of record {}",
                    request.method,
                    request.url,
                    id_segment(&id)
                )));
            }

            *lock(shared).world.table_mut(&resource)?.find_mut(&id)? = record.clone();
            respond(result, record)
        }
        RouteAction::Collection { callback } => {
            let body = request.json_body()?;
            let mut records = inner.world.table(&resource)?.get_all();
            drop(inner);

            let result = callback.call(&body, &mut records, &request.headers);
            let ids = records
                .iter()
                .map(|record| {
                    record_id(record).cloned().ok_or_else(|| {
                        FacadeError::validation(format!(
                            "{} {} left a record without an id: {record}",
                            request.method, request.url
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            // Upsert by id. New ids go through `add_item` so they get routes;
            // records dropped from the vector stay in the table.
            let weak = Arc::downgrade(shared);
            let mut inner = lock(shared);
            for (id, record) in ids.iter().zip(&records) {
                if inner.world.table(&resource)?.contains(id) {
                    inner.world.table_mut(&resource)?.create(record.clone())?;
                } else {
                    inner.add_item(&weak, &resource, record.clone())?;
                }
            }
            respond(result, Value::Array(records))
        }
    }
}

/// `null` from a custom callback means "200 with the default data".
fn respond(result: Value, default: Value) -> Result<Response, FacadeError> {
    match result {
        Value::Null => Ok(Response::ok(&default)),
        tuple => Response::try_from(tuple),
    }
}
