//! NATS API handler: exposes the world surface over request/reply.
//!
//! Subjects (all under a configurable prefix, default "world"):
//!
//!   Request/Reply:
//!     {prefix}.info             world name, address, instance id
//!     {prefix}.uuid             next identifier
//!     {prefix}.component        module bound to a component name
//!     {prefix}.system           module bound to a system name
//!     {prefix}.entity           read component fields of an entity
//!     {prefix}.entities         entities of a partition holding a component
//!     {prefix}.is_initialized   bootstrap status
//!     {prefix}.execute          run a system
//!     {prefix}.initialize       run the authorization bootstrap
//!     {prefix}.set_executor     move the execution target
//!     {prefix}.register_component  bind an installed component module (admin)
//!     {prefix}.register_system     bind an installed system module (admin)
//!
//!   `execute` runs as an ordinary call, so host-only systems such as
//!   `GrantRole` refuse it. Registration takes the hex reference of a module
//!   already installed in the execution target; artifacts are not uploaded.
//!
//!   Publish (broadcast):
//!     {prefix}.events.{kind}    world notifications, see `WorldEvent`

use async_nats::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use world_core::{ModuleKind, World, WorldEvent};
use world_types::{Address, Entity, ModuleRef, Partition, Query, Route};

pub struct Api {
    handler: Handler,
    client: Client,
    prefix: String,
}

/// Dispatches decoded requests to the world. Transport-free so it can be
/// driven directly in tests.
pub struct Handler {
    world: World,
    instance_id: String,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NameRequest {
    name: String,
}

#[derive(Deserialize)]
struct EntityRequest {
    component: String,
    entity: Entity,
    #[serde(default)]
    partition: Partition,
    #[serde(default)]
    offset: usize,
    length: usize,
}

#[derive(Deserialize)]
struct EntitiesRequest {
    component: String,
    #[serde(default)]
    partition: Partition,
}

#[derive(Deserialize)]
struct ExecuteRequest {
    system: String,
    #[serde(default)]
    args: Vec<u8>,
}

#[derive(Deserialize)]
struct InitializeRequest {
    caller: Address,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Deserialize)]
struct SetExecutorRequest {
    caller: Address,
    address: Address,
}

#[derive(Deserialize)]
struct RegisterRequest {
    caller: Address,
    module: ModuleRef,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    fn ok(value: Value) -> Self {
        Self {
            ok: Some(value),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: None,
            error: Some(msg.into()),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| b"{}".to_vec())
    }
}

fn parse<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, ApiResponse> {
    serde_json::from_slice(payload).map_err(|e| ApiResponse::error(format!("invalid request: {e}")))
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

impl Handler {
    pub fn new(world: World, instance_id: impl Into<String>) -> Self {
        Self {
            world,
            instance_id: instance_id.into(),
        }
    }

    #[cfg(test)]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Handle one operation. Never fails: errors are reported in the
    /// response.
    pub fn handle(&mut self, op: &str, payload: &[u8]) -> ApiResponse {
        let result = match op {
            "info" => Ok(self.handle_info()),
            "uuid" => Ok(self.handle_uuid()),
            "component" => self.handle_component(payload),
            "system" => self.handle_system(payload),
            "entity" => self.handle_entity(payload),
            "entities" => self.handle_entities(payload),
            "is_initialized" => Ok(ApiResponse::ok(
                json!({ "initialized": self.world.is_initialized() }),
            )),
            "execute" => self.handle_execute(payload),
            "initialize" => self.handle_initialize(payload),
            "set_executor" => self.handle_set_executor(payload),
            "register_component" => self.handle_register(ModuleKind::Component, payload),
            "register_system" => self.handle_register(ModuleKind::System, payload),
            _ => {
                warn!(op = %op, "unknown operation");
                Ok(ApiResponse::error(format!("unknown operation: {op}")))
            }
        };
        result.unwrap_or_else(|response| response)
    }

    /// Notifications produced by the requests handled so far.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        self.world.take_events()
    }

    fn handle_info(&self) -> ApiResponse {
        let config = self.world.config();
        ApiResponse::ok(json!({
            "name": config.name,
            "address": config.address,
            "instance_id": self.instance_id,
            "executor": self.world.executor_address(),
            "components": self.world.components().len(),
            "systems": self.world.systems().len(),
        }))
    }

    fn handle_uuid(&mut self) -> ApiResponse {
        match self.world.uuid() {
            Ok(id) => ApiResponse::ok(json!({ "id": id })),
            Err(e) => ApiResponse::error(e.to_string()),
        }
    }

    fn handle_component(&self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: NameRequest = parse(payload)?;
        let module = self.world.component(&req.name);
        Ok(ApiResponse::ok(json!({ "module": module, "registered": !module.is_zero() })))
    }

    fn handle_system(&self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: NameRequest = parse(payload)?;
        let module = self.world.system(&req.name);
        Ok(ApiResponse::ok(json!({ "module": module, "registered": !module.is_zero() })))
    }

    fn handle_entity(&self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: EntityRequest = parse(payload)?;
        let query = Query::new(req.entity, req.partition);
        Ok(
            match self
                .world
                .entity(&req.component, &query, req.offset, req.length)
            {
                Ok(values) => ApiResponse::ok(json!({ "values": values })),
                Err(e) => ApiResponse::error(e.to_string()),
            },
        )
    }

    fn handle_entities(&self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: EntitiesRequest = parse(payload)?;
        Ok(match self.world.entities(&req.component, req.partition) {
            Ok(ids) => ApiResponse::ok(json!({
                "entities": ids,
                "count": ids.len(),
            })),
            Err(e) => ApiResponse::error(e.to_string()),
        })
    }

    fn handle_execute(&mut self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: ExecuteRequest = parse(payload)?;
        Ok(match self.world.execute(&req.system, &req.args) {
            Ok(result) => ApiResponse::ok(json!({ "result": result })),
            Err(e) => ApiResponse::error(e.to_string()),
        })
    }

    fn handle_initialize(&mut self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: InitializeRequest = parse(payload)?;
        Ok(match self.world.initialize(req.caller, &req.routes) {
            Ok(()) => ApiResponse::ok(Value::Null),
            Err(e) => ApiResponse::error(e.to_string()),
        })
    }

    fn handle_set_executor(&mut self, payload: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let req: SetExecutorRequest = parse(payload)?;
        Ok(match self.world.set_executor(req.caller, req.address) {
            Ok(()) => ApiResponse::ok(Value::Null),
            Err(e) => ApiResponse::error(e.to_string()),
        })
    }

    fn handle_register(
        &mut self,
        kind: ModuleKind,
        payload: &[u8],
    ) -> Result<ApiResponse, ApiResponse> {
        let req: RegisterRequest = parse(payload)?;
        if let Err(e) = self.world.ensure_admin(req.caller) {
            return Ok(ApiResponse::error(e.to_string()));
        }

        let registered = match kind {
            ModuleKind::Component => self.world.register_component(req.module),
            ModuleKind::System => self.world.register_system(req.module),
        };
        let name = match registered {
            Ok(name) => name,
            Err(e) => return Ok(ApiResponse::error(e.to_string())),
        };

        let registry = match kind {
            ModuleKind::Component => self.world.components(),
            ModuleKind::System => self.world.systems(),
        };
        let version = registry.binding(&name).map_or(0, |binding| binding.version);
        info!(caller = %req.caller, %kind, name = %name, version, "module registered over api");
        Ok(ApiResponse::ok(json!({
            "name": name,
            "module": req.module,
            "version": version,
        })))
    }
}

// ---------------------------------------------------------------------------
// NATS loop
// ---------------------------------------------------------------------------

impl Api {
    pub fn new(handler: Handler, client: Client, prefix: String) -> Self {
        Self {
            handler,
            client,
            prefix,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        use futures_util::StreamExt;

        // Announce anything queued during startup (spawn, builtin registration).
        self.publish_events().await;

        let subject = format!("{}.>", self.prefix);
        info!(subject = %subject, "subscribing to API subjects");
        let mut sub = self.client.subscribe(subject).await?;

        info!("world-server ready, listening for requests");

        while let Some(msg) = sub.next().await {
            let subject = msg.subject.as_str().to_string();
            let op = subject
                .strip_prefix(&self.prefix)
                .and_then(|s| s.strip_prefix('.'))
                .unwrap_or("");

            // Our own broadcasts come back through the wildcard.
            if op.starts_with("events.") {
                continue;
            }

            debug!(op = %op, "received request");
            let response = self.handler.handle(op, &msg.payload);

            if let Some(reply_to) = msg.reply {
                if let Err(e) = self
                    .client
                    .publish(reply_to, response.to_bytes().into())
                    .await
                {
                    error!(%e, "failed to publish reply");
                }
            }

            self.publish_events().await;
        }

        Ok(())
    }

    async fn publish_events(&mut self) {
        for event in self.handler.take_events() {
            let subject = format!("{}.events.{}", self.prefix, event.kind());
            let payload = match serde_json::to_vec(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(%e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = self.client.publish(subject, payload.into()).await {
                error!(%e, kind = event.kind(), "failed to publish event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use world_core::{
        ComponentSchema, MemoryDatabase, ModuleHost, SystemFn, WorldConfig,
    };
    use world_builtin::RoleGrant;
    use world_types::{Permission, encode};

    use super::*;

    const ADMIN: u64 = 0xad;

    fn handler() -> (Handler, Arc<ModuleHost>) {
        let host = Arc::new(ModuleHost::new());
        let mut world = World::new(
            WorldConfig::new("test"),
            MemoryDatabase::new(),
            Address(0xe0),
            host.clone(),
        );
        world_builtin::install(&mut world, &host).unwrap();
        world_builtin::grant_role(&mut world, Address(ADMIN), "Admin").unwrap();

        let position = host.install(ComponentSchema::new("Position", &["x", "y"]));
        world.register_component(position).unwrap();
        let spawn = host.install(SystemFn::new("Spawn", "1", |world, args| {
            let id = world.uuid()?;
            let q = Query::new(Entity(id), Partition(u64::from(args.first().copied().unwrap_or(0))));
            world.set_entity("Position", &q, 0, &[id, id])?;
            Ok(id.to_be_bytes().to_vec())
        }));
        world.register_system(spawn).unwrap();

        (Handler::new(world, "instance"), host)
    }

    fn ok(response: ApiResponse) -> Value {
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
        response.ok.unwrap_or(Value::Null)
    }

    #[test]
    fn test_uuid_increments() {
        let (mut h, _) = handler();
        let a = ok(h.handle("uuid", b""))["id"].as_u64().unwrap();
        let b = ok(h.handle("uuid", b""))["id"].as_u64().unwrap();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_lookup_component_and_system() {
        let (mut h, _) = handler();
        let found = ok(h.handle("component", br#"{"name":"Position"}"#));
        assert_eq!(found["registered"], true);
        assert_eq!(
            found["module"],
            Value::String(h.world().component("Position").to_hex())
        );

        let missing = ok(h.handle("system", br#"{"name":"Nope"}"#));
        assert_eq!(missing["registered"], false);
        assert_eq!(missing["module"], Value::String(ModuleRef::ZERO.to_hex()));
    }

    #[test]
    fn test_execute_then_read_back() {
        let (mut h, _) = handler();
        ok(h.handle("execute", br#"{"system":"Spawn","args":[4]}"#));
        ok(h.handle("execute", br#"{"system":"Spawn","args":[4]}"#));

        let listed = ok(h.handle("entities", br#"{"component":"Position","partition":4}"#));
        assert_eq!(listed["count"], 2);
        let first = listed["entities"][0].as_u64().unwrap();

        let payload = json!({
            "component": "Position",
            "entity": first,
            "partition": 4,
            "length": 2,
        });
        let read = ok(h.handle("entity", payload.to_string().as_bytes()));
        assert_eq!(read["values"], json!([first, first]));
    }

    #[test]
    fn test_missing_entity_reads_empty() {
        let (mut h, _) = handler();
        let read = ok(h.handle(
            "entity",
            br#"{"component":"Position","entity":99,"length":2}"#,
        ));
        assert_eq!(read["values"], json!([]));
    }

    #[test]
    fn test_initialize_flow() {
        let (mut h, _) = handler();
        assert_eq!(ok(h.handle("is_initialized", b""))["initialized"], false);

        let denied = h.handle("initialize", br#"{"caller":1}"#);
        assert!(denied.error.unwrap().contains("permission denied"));

        let position = h.world().component("Position");
        let body = json!({
            "caller": ADMIN,
            "routes": [{ "component": position, "system": "Spawn", "permission": 2 }],
        });
        ok(h.handle("initialize", body.to_string().as_bytes()));
        assert_eq!(ok(h.handle("is_initialized", b""))["initialized"], true);

        let again = h.handle("initialize", body.to_string().as_bytes());
        assert!(again.error.unwrap().contains("already initialized"));
    }

    #[test]
    fn test_set_executor_requires_attached_address() {
        let (mut h, _) = handler();
        let unknown = h.handle("set_executor", br#"{"caller":173,"address":7}"#);
        assert!(unknown.error.unwrap().contains("no executor attached"));

        h.world_mut()
            .attach_executor(Address(7), Arc::new(ModuleHost::new()));
        ok(h.handle("set_executor", br#"{"caller":173,"address":7}"#));
        assert_eq!(h.world().executor_address(), Address(7));
    }

    #[test]
    fn test_bad_requests() {
        let (mut h, _) = handler();
        let malformed = h.handle("execute", b"not json");
        assert!(malformed.error.unwrap().starts_with("invalid request"));
        let unknown = h.handle("spawn", b"{}");
        assert_eq!(unknown.error.unwrap(), "unknown operation: spawn");
    }

    #[test]
    fn test_events_are_drained_once() {
        let (mut h, _) = handler();
        h.take_events();
        let position = h.world().component("Position");
        let body = json!({ "caller": ADMIN, "routes": [{ "component": position, "system": "Spawn", "permission": 2 }] });
        ok(h.handle("initialize", body.to_string().as_bytes()));

        let events = h.take_events();
        assert_eq!(events, vec![WorldEvent::Initialized { routes: 1 }]);
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn test_info() {
        let (mut h, _) = handler();
        let info = ok(h.handle("info", b""));
        assert_eq!(info["name"], "test");
        assert_eq!(info["instance_id"], "instance");
        assert_eq!(info["executor"], 0xe0);
    }

    #[test]
    fn test_remote_execute_cannot_grant_roles() {
        let (mut h, _) = handler();
        let denied = h.handle("initialize", br#"{"caller":102}"#);
        assert!(denied.error.unwrap().contains("permission denied"));

        let args = encode(&RoleGrant::new(Address(0x66), "Admin")).unwrap();
        let body = json!({ "system": "GrantRole", "args": args });
        let refused = h.handle("execute", body.to_string().as_bytes());
        assert!(refused.error.unwrap().contains("granted by the host"));

        let still_denied = h.handle("initialize", br#"{"caller":102}"#);
        assert!(still_denied.error.unwrap().contains("permission denied"));
        assert!(!h.world().is_initialized());
    }

    #[test]
    fn test_register_fresh_modules() {
        let (mut h, host) = handler();
        let velocity = host.install(ComponentSchema::new("Velocity", &["dx", "dy"]));
        let idle = host.install(SystemFn::new("Idle", "1", |_, _| Ok(Vec::new())));

        let body = json!({ "caller": ADMIN, "module": velocity });
        let component = ok(h.handle("register_component", body.to_string().as_bytes()));
        assert_eq!(component["name"], "Velocity");
        assert_eq!(component["version"], 1);
        assert_eq!(h.world().component("Velocity"), velocity);

        let body = json!({ "caller": ADMIN, "module": idle });
        let system = ok(h.handle("register_system", body.to_string().as_bytes()));
        assert_eq!(system["name"], "Idle");
        assert_eq!(system["module"], Value::String(idle.to_hex()));
        assert_eq!(h.world().system("Idle"), idle);

        let events = h.take_events();
        assert!(events.iter().any(|event| matches!(
            event,
            WorldEvent::ComponentRegistered { name, .. } if name == "Velocity"
        )));
    }

    #[test]
    fn test_register_upgrade_keeps_grants() {
        let (mut h, host) = handler();
        let position = h.world().component("Position");
        let body = json!({
            "caller": ADMIN,
            "routes": [{ "component": position, "system": "Spawn", "permission": 2 }],
        });
        ok(h.handle("initialize", body.to_string().as_bytes()));

        let spawn_v2 = host.install(SystemFn::new("Spawn", "2", |_, _| Ok(Vec::new())));
        let body = json!({ "caller": ADMIN, "module": spawn_v2 });
        let upgraded = ok(h.handle("register_system", body.to_string().as_bytes()));
        assert_eq!(upgraded["version"], 2);
        assert_eq!(h.world().system("Spawn"), spawn_v2);
        assert_eq!(
            world_builtin::authorization(h.world(), "Spawn", position).unwrap(),
            Permission::WRITE
        );
    }

    #[test]
    fn test_register_requires_admin() {
        let (mut h, host) = handler();
        let idle = host.install(SystemFn::new("Idle", "1", |_, _| Ok(Vec::new())));
        let body = json!({ "caller": 1, "module": idle });
        let denied = h.handle("register_system", body.to_string().as_bytes());
        assert!(denied.error.unwrap().contains("permission denied"));
        assert!(h.world().system("Idle").is_zero());

        let stray = ModuleRef::from_artifact(b"never installed");
        let body = json!({ "caller": ADMIN, "module": stray });
        let missing = h.handle("register_component", body.to_string().as_bytes());
        assert!(missing.error.is_some());
    }
}
