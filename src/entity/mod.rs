//! Generic entity cache
//!
//! An [`EntityCache`] keeps a reactive collection of one entity kind in step
//! with the server. CRUD calls go out as RPCs to `{kind}_service`; the
//! collection itself only changes through the `{kind}_created`,
//! `{kind}_updated` and `{kind}_deleted` pushes the server emits for every
//! mutation, or through an explicit `replace`/`query(save)`.
//!
//! CRUD failures never propagate: they are logged and reported as `None`.

pub mod reconcile;

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, warn};

use crate::protocol::{PushEvent, RpcCall, RpcResponse};
use crate::store::Store;
use crate::transport::{RpcError, Transport};
use crate::types::{Entity, EntityRef, QueryFilter, QueryOptions, QueryRead};

/// Reactive cache of one entity kind
pub struct EntityCache<T> {
    inner: Arc<CacheInner<T>>,
}

struct CacheInner<T> {
    kind: String,
    service: String,
    transport: Transport,
    entities: Store<Vec<T>>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Entity> EntityCache<T> {
    /// Create a cache for `kind`, talking to `{kind}_service`
    pub fn new(transport: &Transport, kind: &str) -> Self {
        Self::with_service(transport, kind, None)
    }

    /// Create a cache for `kind` with an explicit service name
    pub fn with_service(transport: &Transport, kind: &str, service: Option<&str>) -> Self {
        let service = service
            .map(str::to_string)
            .unwrap_or_else(|| format!("{kind}_service"));
        let entities = Store::new(Vec::new());

        let store = entities.clone();
        transport.listen(format!("{kind}_created"), move |event| {
            if let Some(entity) = decode_push::<T>(event) {
                store.update(|items| reconcile::created(items, entity));
            }
        });

        let store = entities.clone();
        transport.listen(format!("{kind}_updated"), move |event| {
            if let Some(entity) = decode_push::<T>(event) {
                store.update(|items| reconcile::updated(items, entity));
            }
        });

        let store = entities.clone();
        transport.listen(format!("{kind}_deleted"), move |event| {
            if let Some(removed) = decode_push::<EntityRef>(event) {
                store.update(|items| reconcile::deleted(items, &removed.id));
            }
        });

        Self {
            inner: Arc::new(CacheInner {
                kind: kind.to_string(),
                service,
                transport: transport.clone(),
                entities,
            }),
        }
    }

    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    pub fn service(&self) -> &str {
        &self.inner.service
    }

    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// The reactive collection
    pub fn entities(&self) -> &Store<Vec<T>> {
        &self.inner.entities
    }

    /// Point-in-time copy of the collection
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.entities.get()
    }

    /// Look up an entity in the current collection
    pub fn find(&self, id: &str) -> Option<T> {
        self.inner
            .entities
            .with(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    /// Replace the whole collection. Used by parent contexts to cascade a
    /// selection into this cache.
    pub fn replace(&self, items: Vec<T>) {
        self.inner.entities.set(items);
    }

    // ─── RPC ─────────────────────────────────────────────────────────────

    /// Call `method` on this kind's service
    pub async fn call(&self, method: &str, data: Value) -> Result<RpcResponse, RpcError> {
        self.inner
            .transport
            .send_and_wait(RpcCall::new(&self.inner.service, method, data))
            .await
    }

    /// Query the service with a flat list of filters.
    ///
    /// With `options.save` the result replaces the local collection.
    pub async fn query(&self, filters: Vec<QueryFilter>, options: QueryOptions) -> Option<Vec<T>> {
        let response = self
            .call("query", json!({ "filters": filters }))
            .await
            .map_err(|e| error!(error = %e, kind = %self.inner.kind, "query failed"))
            .ok()?;
        let read: QueryRead<T> = self.decode_result(response, "query")?;

        if options.save {
            self.replace(read.items.clone());
        }
        Some(read.items)
    }

    /// Fetch one entity
    pub async fn retrieve(&self, id: &str) -> Option<T> {
        let response = self
            .call("retrieve", json!({ "entity_id": id }))
            .await
            .map_err(|e| error!(error = %e, kind = %self.inner.kind, id, "retrieve failed"))
            .ok()?;
        self.decode_result(response, "retrieve")
    }

    /// Create an entity. The collection picks it up from the push event.
    pub async fn create(&self, entity: &T) -> Option<T> {
        let response = self
            .call("create", json!({ "payload": entity }))
            .await
            .map_err(|e| error!(error = %e, kind = %self.inner.kind, "create failed"))
            .ok()?;
        self.decode_result(response, "create")
    }

    /// Update an entity. The collection picks it up from the push event.
    pub async fn update(&self, id: &str, entity: &T) -> Option<T> {
        let response = self
            .call("update", json!({ "entity_id": id, "payload": entity }))
            .await
            .map_err(|e| error!(error = %e, kind = %self.inner.kind, id, "update failed"))
            .ok()?;
        self.decode_result(response, "update")
    }

    /// Delete an entity. The collection picks it up from the push event.
    pub async fn remove(&self, id: &str) {
        if let Err(e) = self.call("delete", json!({ "entity_id": id })).await {
            error!(error = %e, kind = %self.inner.kind, id, "delete failed");
        }
    }

    /// Decode `response.result`, logging payloads that do not match
    pub fn decode_result<R: serde::de::DeserializeOwned>(
        &self,
        response: RpcResponse,
        method: &str,
    ) -> Option<R> {
        serde_json::from_value(response.result)
            .map_err(|e| {
                error!(error = %e, kind = %self.inner.kind, method, "unexpected result payload")
            })
            .ok()
    }
}

/// Decode a push payload, dropping (and logging) anything malformed
pub(crate) fn decode_push<R: serde::de::DeserializeOwned>(event: &PushEvent) -> Option<R> {
    event
        .decode()
        .map_err(|e| warn!(error = %e, event = %event.event, "dropping undecodable push"))
        .ok()
}
