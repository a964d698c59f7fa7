use super::traits::HttpBackend;
use super::types::{ApiResponse, ClientError};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// 预置负载均衡器的ID
pub const SEEDED_LOAD_BALANCER_ID: u64 = 71;
/// 预置虚拟IP的ID
pub const SEEDED_VIRTUAL_IP_ID: u64 = 1000;

const FIRST_LOAD_BALANCER_ID: u64 = 72;
const FIRST_NODE_ID: u64 = 410;
const FIRST_VIRTUAL_IP_ID: u64 = 1001;

const LB_UPDATABLE_FIELDS: &[&str] = &["name", "algorithm", "protocol", "port"];
/// 创建请求中与 `loadBalancer` 并列的可选字段
const LB_OPTIONAL_FIELDS: &[&str] = &[
    "accessList",
    "algorithm",
    "connectionLogging",
    "connectionThrottle",
    "healthMonitor",
    "metadata",
    "port",
    "sessionPersistence",
];
const NODE_UPDATABLE_FIELDS: &[&str] = &["condition", "type", "weight"];

#[derive(Debug, Default)]
struct StubLoadBalancer {
    record: Map<String, Value>,
    nodes: BTreeMap<u64, Value>,
    virtual_ips: BTreeMap<u64, Value>,
}

impl StubLoadBalancer {
    fn summary(&self) -> Value {
        let mut record = self.record.clone();
        record.insert(
            "virtualIps".to_string(),
            Value::Array(self.virtual_ips.values().cloned().collect()),
        );
        Value::Object(record)
    }

    fn detail(&self) -> Value {
        let mut detail = self.summary();
        detail["nodes"] = Value::Array(self.nodes.values().cloned().collect());
        detail
    }
}

#[derive(Debug)]
struct StubState {
    load_balancers: BTreeMap<u64, StubLoadBalancer>,
    next_load_balancer_id: u64,
    next_node_id: u64,
    next_virtual_ip_id: u64,
}

impl StubState {
    fn empty() -> Self {
        Self {
            load_balancers: BTreeMap::new(),
            next_load_balancer_id: FIRST_LOAD_BALANCER_ID,
            next_node_id: FIRST_NODE_ID,
            next_virtual_ip_id: FIRST_VIRTUAL_IP_ID,
        }
    }

    fn seeded() -> Self {
        let mut state = Self::empty();

        let mut seeded = StubLoadBalancer {
            record: object(json!({
                "id": SEEDED_LOAD_BALANCER_ID,
                "name": "lb-71",
                "protocol": "HTTP",
                "port": 80,
                "algorithm": "RANDOM",
                "status": "ACTIVE",
                "addresses": {
                    "public": ["206.10.10.210"],
                    "private": ["10.183.252.71"]
                },
                "created": { "time": "2011-04-13T14:18:07Z" },
                "updated": { "time": "2011-04-13T14:18:07Z" }
            })),
            ..Default::default()
        };
        seeded.virtual_ips.insert(
            SEEDED_VIRTUAL_IP_ID,
            json!({
                "id": SEEDED_VIRTUAL_IP_ID,
                "address": "206.10.10.210",
                "type": "PUBLIC",
                "ipVersion": "IPV4"
            }),
        );
        state.load_balancers.insert(SEEDED_LOAD_BALANCER_ID, seeded);
        state
    }

    fn load_balancer(&mut self, id: u64) -> Result<&mut StubLoadBalancer, ClientError> {
        self.load_balancers
            .get_mut(&id)
            .ok_or_else(|| not_found(&format!("Load balancer {id} not found")))
    }

    fn new_node(&mut self, mut node: Map<String, Value>) -> Value {
        let id = self.next_node_id;
        self.next_node_id += 1;
        node.insert("id".to_string(), json!(id));
        node.entry("type").or_insert_with(|| json!("PRIMARY"));
        node.entry("weight").or_insert_with(|| json!(1));
        node.insert("status".to_string(), json!("ONLINE"));
        Value::Object(node)
    }

    fn new_virtual_ip(&mut self, mut vip: Map<String, Value>) -> Value {
        let id = self.next_virtual_ip_id;
        self.next_virtual_ip_id += 1;
        let ipv6 = vip.get("ipVersion").and_then(Value::as_str) == Some("IPV6");
        let address = if ipv6 {
            format!("2001:4800:7901::{:x}", id)
        } else {
            format!("206.10.{}.{}", id / 256, id % 256)
        };
        vip.insert("id".to_string(), json!(id));
        vip.entry("ipVersion").or_insert_with(|| json!("IPV4"));
        vip.insert("address".to_string(), json!(address));
        Value::Object(vip)
    }

    /// 所有定义都通过校验后才分配ID
    fn create_load_balancer(&mut self, body: &Value) -> Result<Value, ClientError> {
        let spec = body
            .get("loadBalancer")
            .ok_or_else(|| bad_request("Missing 'loadBalancer'"))?;
        let mut record = spec_object(spec, "load balancer")?;
        require_fields(&record, &["name", "protocol", "nodes", "virtualIps"])?;

        let nodes = node_specs(&take_array(&mut record, "nodes")?)?;
        let virtual_ips = take_array(&mut record, "virtualIps")?
            .iter()
            .map(virtual_ip_spec)
            .collect::<Result<Vec<_>, _>>()?;

        for key in LB_OPTIONAL_FIELDS {
            if let Some(value) = body.get(*key) {
                record.insert(key.to_string(), value.clone());
            }
        }

        let id = self.next_load_balancer_id;
        self.next_load_balancer_id += 1;
        record.insert("id".to_string(), json!(id));
        record.insert("status".to_string(), json!("BUILD"));
        record.entry("algorithm").or_insert_with(|| json!("RANDOM"));

        let mut load_balancer = StubLoadBalancer {
            record,
            ..Default::default()
        };
        for spec in nodes {
            let node = self.new_node(spec);
            load_balancer.nodes.insert(id_of(&node), node);
        }
        for spec in virtual_ips {
            let vip = self.new_virtual_ip(spec);
            load_balancer.virtual_ips.insert(id_of(&vip), vip);
        }

        let detail = load_balancer.detail();
        self.load_balancers.insert(id, load_balancer);
        Ok(detail)
    }
}

/// 内存中的负载均衡服务
///
/// 实现完整的URL表，带状态：创建的资源会出现在之后的列表中。
/// 预置负载均衡器71（ACTIVE，含虚拟IP 1000），新节点ID从410开始。
pub struct StubBackend {
    state: Mutex<StubState>,
}

impl StubBackend {
    /// 带预置数据的服务
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState::seeded()),
        }
    }

    /// 没有任何负载均衡器的服务
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(StubState::empty()),
        }
    }

    pub fn load_balancer_count(&self) -> usize {
        self.state.lock().load_balancers.len()
    }

    fn route(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut state = self.state.lock();

        match segments.as_slice() {
            ["loadbalancers"] => match *method {
                Method::GET => {
                    let items: Vec<Value> = state
                        .load_balancers
                        .values()
                        .map(StubLoadBalancer::summary)
                        .collect();
                    ok(200, json!({ "loadBalancers": items }))
                }
                Method::POST => {
                    let detail = state.create_load_balancer(require_body(body)?)?;
                    ok(202, json!({ "loadBalancer": detail }))
                }
                _ => method_not_allowed(method, path),
            },
            ["loadbalancers", lb_id] => {
                let lb_id = parse_id(lb_id)?;
                match *method {
                    Method::GET => {
                        let detail = state.load_balancer(lb_id)?.detail();
                        ok(200, json!({ "loadBalancer": detail }))
                    }
                    Method::PUT => {
                        let changes = require_body(body)?
                            .get("loadBalancer")
                            .ok_or_else(|| bad_request("Missing 'loadBalancer'"))?;
                        let lb = state.load_balancer(lb_id)?;
                        merge_fields(&mut lb.record, changes, LB_UPDATABLE_FIELDS)?;
                        accepted()
                    }
                    Method::DELETE => {
                        state
                            .load_balancers
                            .remove(&lb_id)
                            .ok_or_else(|| not_found(&format!("Load balancer {lb_id} not found")))?;
                        accepted()
                    }
                    _ => method_not_allowed(method, path),
                }
            }
            ["loadbalancers", lb_id, "nodes"] => {
                let lb_id = parse_id(lb_id)?;
                match *method {
                    Method::GET => {
                        let nodes: Vec<Value> =
                            state.load_balancer(lb_id)?.nodes.values().cloned().collect();
                        ok(200, json!({ "nodes": nodes }))
                    }
                    Method::POST => {
                        state.load_balancer(lb_id)?;
                        let specs = match require_body(body)?.get("nodes") {
                            Some(Value::Array(items)) => node_specs(items)?,
                            Some(single @ Value::Object(_)) => {
                                node_specs(std::slice::from_ref(single))?
                            }
                            _ => return Err(bad_request("Missing 'nodes'")),
                        };
                        let created: Vec<Value> =
                            specs.into_iter().map(|spec| state.new_node(spec)).collect();
                        let lb = state.load_balancer(lb_id)?;
                        for node in &created {
                            lb.nodes.insert(id_of(node), node.clone());
                        }
                        ok(202, json!({ "nodes": created }))
                    }
                    _ => method_not_allowed(method, path),
                }
            }
            ["loadbalancers", lb_id, "nodes", node_id] => {
                let lb_id = parse_id(lb_id)?;
                let node_id = parse_id(node_id)?;
                let lb = state.load_balancer(lb_id)?;
                let missing = || not_found(&format!("Node {node_id} not found"));
                match *method {
                    Method::GET => {
                        let node = lb.nodes.get(&node_id).cloned().ok_or_else(missing)?;
                        ok(200, json!({ "node": node }))
                    }
                    Method::PUT => {
                        let changes = require_body(body)?
                            .get("node")
                            .ok_or_else(|| bad_request("Missing 'node'"))?;
                        match lb.nodes.get_mut(&node_id) {
                            Some(Value::Object(node)) => {
                                merge_fields(node, changes, NODE_UPDATABLE_FIELDS)?
                            }
                            _ => return Err(missing()),
                        }
                        accepted()
                    }
                    Method::DELETE => {
                        lb.nodes.remove(&node_id).ok_or_else(missing)?;
                        accepted()
                    }
                    _ => method_not_allowed(method, path),
                }
            }
            ["loadbalancers", lb_id, "virtualips"] => {
                let lb_id = parse_id(lb_id)?;
                match *method {
                    Method::GET => {
                        let vips: Vec<Value> = state
                            .load_balancer(lb_id)?
                            .virtual_ips
                            .values()
                            .cloned()
                            .collect();
                        ok(200, json!({ "virtualIps": vips }))
                    }
                    Method::POST => {
                        state.load_balancer(lb_id)?;
                        let spec = virtual_ip_spec(require_body(body)?)?;
                        let vip = state.new_virtual_ip(spec);
                        state
                            .load_balancer(lb_id)?
                            .virtual_ips
                            .insert(id_of(&vip), vip.clone());
                        // 与真实服务一致，新建的虚拟IP不带信封
                        ok(202, vip)
                    }
                    _ => method_not_allowed(method, path),
                }
            }
            ["loadbalancers", lb_id, "virtualips", vip_id] => {
                let lb_id = parse_id(lb_id)?;
                let vip_id = parse_id(vip_id)?;
                match *method {
                    Method::DELETE => {
                        state
                            .load_balancer(lb_id)?
                            .virtual_ips
                            .remove(&vip_id)
                            .ok_or_else(|| not_found(&format!("Virtual IP {vip_id} not found")))?;
                        accepted()
                    }
                    _ => method_not_allowed(method, path),
                }
            }
            _ => Err(not_found(&format!("No route for {path}"))),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpBackend for StubBackend {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let result = self.route(&method, path, body);
        if let Err(e) = &result {
            tracing::debug!("stub {} {} -> {}", method, path, e);
        }
        result
    }
}

fn ok(status: u16, body: Value) -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(status, Some(body)))
}

fn accepted() -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(202, None))
}

fn fault(status: u16, kind: &str, message: &str) -> ClientError {
    ClientError::UpstreamError {
        status,
        body: json!({ kind: { "code": status, "message": message } }).to_string(),
    }
}

fn not_found(message: &str) -> ClientError {
    fault(404, "itemNotFound", message)
}

fn bad_request(message: &str) -> ClientError {
    fault(400, "badRequest", message)
}

fn method_not_allowed(method: &Method, path: &str) -> Result<ApiResponse, ClientError> {
    Err(fault(
        405,
        "methodNotAllowed",
        &format!("{method} not allowed on {path}"),
    ))
}

fn parse_id(raw: &str) -> Result<u64, ClientError> {
    raw.parse()
        .map_err(|_| not_found(&format!("Invalid id '{raw}'")))
}

fn require_body(body: Option<&Value>) -> Result<&Value, ClientError> {
    body.ok_or_else(|| bad_request("Missing request body"))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn spec_object(spec: &Value, what: &str) -> Result<Map<String, Value>, ClientError> {
    spec.as_object()
        .cloned()
        .ok_or_else(|| bad_request(&format!("Invalid {what} definition")))
}

fn require_fields(map: &Map<String, Value>, fields: &[&str]) -> Result<(), ClientError> {
    for field in fields {
        if !map.contains_key(*field) {
            return Err(bad_request(&format!("Missing '{field}'")));
        }
    }
    Ok(())
}

fn node_specs(specs: &[Value]) -> Result<Vec<Map<String, Value>>, ClientError> {
    specs
        .iter()
        .map(|spec| {
            let node = spec_object(spec, "node")?;
            require_fields(&node, &["address", "port", "condition"])?;
            Ok(node)
        })
        .collect()
}

fn virtual_ip_spec(spec: &Value) -> Result<Map<String, Value>, ClientError> {
    let vip = spec_object(spec, "virtual IP")?;
    require_fields(&vip, &["type"])?;
    Ok(vip)
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>, ClientError> {
    match map.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(bad_request(&format!("'{key}' must be a list"))),
    }
}

fn merge_fields(
    target: &mut Map<String, Value>,
    changes: &Value,
    allowed: &[&str],
) -> Result<(), ClientError> {
    let changes = changes
        .as_object()
        .ok_or_else(|| bad_request("Update body must be an object"))?;
    for (key, value) in changes {
        if !allowed.contains(&key.as_str()) {
            return Err(bad_request(&format!("Attribute '{key}' cannot be updated")));
        }
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn id_of(value: &Value) -> u64 {
    value.get("id").and_then(Value::as_u64).unwrap_or_default()
}
