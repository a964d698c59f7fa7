use lbaas_core::{ClientError, HttpBackend, Method, RecordingBackend, StubBackend};
use lbaas_resources::resources::{
    Algorithm, NodeCondition, NodeType, VirtualIpType, VirtualIpVersion,
};
use lbaas_resources::{
    getid, CreateLoadBalancer, LoadBalancerClient, LoadBalancerUpdate, ManagerWithFind,
    NodeSpec, NodeUpdate, Resource, VirtualIpSpec,
};
use serde_json::json;
use std::sync::Arc;

fn create_test_client() -> (Arc<RecordingBackend<StubBackend>>, LoadBalancerClient) {
    let backend = Arc::new(RecordingBackend::new(StubBackend::new()));
    let api: Arc<dyn HttpBackend> = backend.clone();
    (backend, LoadBalancerClient::new(api))
}

fn sample_node() -> NodeSpec {
    NodeSpec::new("10.0.0.1", 80, NodeCondition::Enabled)
}

#[tokio::test]
async fn test_get_load_balancer() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();

    let lb = client.load_balancers.get(71_u64).await?;

    backend.assert_called(Method::GET, "/loadbalancers/71");
    assert_eq!(lb.id(), 71);
    assert_eq!(lb.status(), Some("ACTIVE"));
    assert_eq!(lb.public_ip(), "206.10.10.210");
    Ok(())
}

#[tokio::test]
async fn test_list_load_balancers() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();

    let lbs = client.load_balancers.list().await?;

    backend.assert_called(Method::GET, "/loadbalancers");
    assert_eq!(lbs.len(), 1);
    assert_eq!(lbs[0].name(), "lb-71");
    Ok(())
}

#[tokio::test]
async fn test_create_sends_only_required_keys() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();

    let request = CreateLoadBalancer::new(
        "my-lb",
        "HTTP",
        vec![sample_node()],
        vec![VirtualIpSpec::new(VirtualIpType::Public)],
    );
    let lb = client.load_balancers.create(request).await?;

    backend.assert_called(Method::POST, "/loadbalancers");
    let call = backend.last_call().unwrap();
    let body = call.body.unwrap();
    let mut keys: Vec<&str> = body["loadBalancer"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, ["name", "nodes", "protocol", "virtualIps"]);

    assert_eq!(lb.name(), "my-lb");
    assert_eq!(lb.status(), Some("BUILD"));
    assert_eq!(lb.info().nodes.len(), 1);
    assert_eq!(lb.info().virtual_ips.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_create_then_list_round_trip() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();

    let request = CreateLoadBalancer::new(
        "round-trip",
        "HTTPS",
        vec![sample_node()],
        vec![VirtualIpSpec::new(VirtualIpType::Servicenet)],
    )
    .with_port(443)
    .with_algorithm(Algorithm::RoundRobin);
    let created = client.load_balancers.create(request).await?;

    let body = backend.last_call().unwrap().body.unwrap();
    assert_eq!(body["port"], 443);
    assert_eq!(body["algorithm"], "ROUND_ROBIN");
    assert!(body["loadBalancer"].get("port").is_none());

    let ids: Vec<u64> = client
        .load_balancers
        .list()
        .await?
        .iter()
        .map(Resource::id)
        .collect();
    assert!(ids.contains(&created.id()));

    let fetched = client.load_balancers.get(&created).await?;
    assert_eq!(fetched, created);
    assert_eq!(fetched.port(), Some(443));
    assert_eq!(fetched.algorithm(), Some(Algorithm::RoundRobin));
    Ok(())
}

#[tokio::test]
async fn test_add_node_returns_list() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;

    let nodes = lb.nodes.add(sample_node()).await?;

    backend.assert_called(Method::POST, "/loadbalancers/71/nodes");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].id(), 410);
    assert_eq!(nodes[0].load_balancer_id(), 71);
    assert_eq!(
        backend.last_call().unwrap().body,
        Some(json!({"nodes": {"address": "10.0.0.1", "port": 80, "condition": "ENABLED"}}))
    );
    Ok(())
}

#[tokio::test]
async fn test_remove_node_by_id_and_by_instance() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;
    lb.nodes.add(sample_node()).await?;
    let node = lb.nodes.get(410_u64).await?;
    backend.assert_called(Method::GET, "/loadbalancers/71/nodes/410");

    node.remove().await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71/nodes/410");
    let via_node = backend.last_call().unwrap();

    // 节点已删除，后两次调用返回404，但发出的请求必须相同
    let error = lb.nodes.remove(&node).await.unwrap_err();
    assert_eq!(error.status(), Some(404));
    let via_instance = backend.last_call().unwrap();

    let error = lb.nodes.remove(410_u64).await.unwrap_err();
    assert_eq!(error.status(), Some(404));
    let via_id = backend.last_call().unwrap();

    assert_eq!(via_node, via_instance);
    assert_eq!(via_instance, via_id);
    assert!(lb.nodes.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_load_balancer_update_and_delete_by_id_and_by_instance() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;
    let changes = LoadBalancerUpdate::new().algorithm(Algorithm::LeastConnections);

    lb.update(changes.clone()).await?;
    let via_lb = backend.last_call().unwrap();
    client.load_balancers.update(&lb, changes.clone()).await?;
    let via_instance = backend.last_call().unwrap();
    client.load_balancers.update(71_u64, changes).await?;
    let via_id = backend.last_call().unwrap();
    assert_eq!(via_lb, via_instance);
    assert_eq!(via_instance, via_id);
    assert_eq!(via_id.method, Method::PUT);
    assert_eq!(via_id.path, "/loadbalancers/71");

    lb.delete().await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71");
    let via_lb = backend.last_call().unwrap();
    client.load_balancers.delete(&lb).await.unwrap_err();
    let via_instance = backend.last_call().unwrap();
    client.load_balancers.delete(71_u64).await.unwrap_err();
    let via_id = backend.last_call().unwrap();
    assert_eq!(via_lb, via_instance);
    assert_eq!(via_instance, via_id);
    Ok(())
}

#[tokio::test]
async fn test_remove_virtual_ip_by_id_and_by_instance() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;
    let vip = lb.virtual_ips.list().await?.remove(0);

    vip.remove().await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71/virtualips/1000");
    let via_vip = backend.last_call().unwrap();
    lb.virtual_ips.remove(&vip).await.unwrap_err();
    let via_instance = backend.last_call().unwrap();
    lb.virtual_ips.remove(1000_u64).await.unwrap_err();
    let via_id = backend.last_call().unwrap();

    assert_eq!(via_vip, via_instance);
    assert_eq!(via_instance, via_id);
    Ok(())
}

#[tokio::test]
async fn test_instance_and_raw_id_produce_same_path() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;
    let node = lb.nodes.add(sample_node()).await?.remove(0);

    client.load_balancers.get(&lb).await?;
    let by_instance = backend.last_call().unwrap();
    client.load_balancers.get(getid(&lb)).await?;
    let by_id = backend.last_call().unwrap();
    assert_eq!(by_instance, by_id);

    let update = NodeUpdate::new().weight(5);
    lb.nodes.update(&node, update.clone()).await?;
    let by_instance = backend.last_call().unwrap();
    lb.nodes.update(410_u64, update).await?;
    let by_id = backend.last_call().unwrap();
    assert_eq!(by_instance, by_id);
    assert_eq!(by_id.path, "/loadbalancers/71/nodes/410");
    Ok(())
}

#[tokio::test]
async fn test_empty_updates_make_no_request() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;
    let node = lb.nodes.add(sample_node()).await?.remove(0);
    backend.clear();

    client
        .load_balancers
        .update(71_u64, LoadBalancerUpdate::new())
        .await?;
    lb.update(LoadBalancerUpdate::default()).await?;
    lb.nodes.update(410_u64, NodeUpdate::new()).await?;
    node.update(NodeUpdate::default()).await?;

    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_update_load_balancer_then_refresh() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let mut lb = client.load_balancers.get(71_u64).await?;

    lb.update(LoadBalancerUpdate::new().name("renamed").port(8080))
        .await?;
    backend.assert_called(Method::PUT, "/loadbalancers/71");
    assert_eq!(
        backend.last_call().unwrap().body,
        Some(json!({"loadBalancer": {"name": "renamed", "port": 8080}}))
    );

    // 本地快照在刷新前保持不变
    assert_eq!(lb.name(), "lb-71");
    lb.refresh().await?;
    assert_eq!(lb.name(), "renamed");
    assert_eq!(lb.port(), Some(8080));
    assert_eq!(lb.nodes.load_balancer_id(), 71);
    Ok(())
}

#[tokio::test]
async fn test_update_node() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let nodes = client.load_balancers.nodes(71_u64);
    let node = nodes.add(sample_node()).await?.remove(0);

    node.update(
        NodeUpdate::new()
            .condition(NodeCondition::Draining)
            .node_type(NodeType::Secondary),
    )
    .await?;
    backend.assert_called(Method::PUT, "/loadbalancers/71/nodes/410");

    let node = nodes.get(&node).await?;
    assert_eq!(node.condition(), Some(NodeCondition::Draining));
    assert_eq!(node.node_type(), Some(NodeType::Secondary));
    Ok(())
}

#[tokio::test]
async fn test_delete_load_balancer() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;

    lb.delete().await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71");

    let error = client.load_balancers.get(71_u64).await.unwrap_err();
    assert_eq!(error.status(), Some(404));
    assert!(error.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_virtual_ip_lifecycle() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();
    let lb = client.load_balancers.get(71_u64).await?;

    let vips = lb.virtual_ips.list().await?;
    backend.assert_called(Method::GET, "/loadbalancers/71/virtualips");
    assert_eq!(vips.len(), 1);
    assert_eq!(vips[0].address(), Some("206.10.10.210"));

    let vip = lb
        .virtual_ips
        .add(VirtualIpType::Public, Some(VirtualIpVersion::Ipv6))
        .await?;
    backend.assert_called(Method::POST, "/loadbalancers/71/virtualips");
    assert_eq!(
        backend.last_call().unwrap().body,
        Some(json!({"type": "PUBLIC", "ipVersion": "IPV6"}))
    );
    assert_eq!(vip.id(), 1001);
    assert_eq!(vip.ip_version(), Some(VirtualIpVersion::Ipv6));

    lb.virtual_ips.remove(1000_u64).await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71/virtualips/1000");
    vip.remove().await?;
    backend.assert_called(Method::DELETE, "/loadbalancers/71/virtualips/1001");

    assert!(lb.virtual_ips.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_add_virtual_ip_without_version() -> anyhow::Result<()> {
    let (backend, client) = create_test_client();

    let vip = client
        .load_balancers
        .virtual_ips(71_u64)
        .add(VirtualIpType::Servicenet, None)
        .await?;

    assert_eq!(
        backend.last_call().unwrap().body,
        Some(json!({"type": "SERVICENET"}))
    );
    assert_eq!(vip.vip_type(), Some(VirtualIpType::Servicenet));
    Ok(())
}

#[tokio::test]
async fn test_find_and_findall() -> anyhow::Result<()> {
    let (_backend, client) = create_test_client();
    let nodes = client.load_balancers.nodes(71_u64);
    nodes.add(sample_node()).await?;
    nodes
        .add(NodeSpec::new("10.0.0.2", 8080, NodeCondition::Disabled))
        .await?;

    let found = nodes.find(&[("address", json!("10.0.0.2"))]).await?;
    assert_eq!(found.id(), 411);

    let online = nodes.findall(&[("status", json!("ONLINE"))]).await?;
    assert_eq!(online.len(), 2);

    let error = nodes.find(&[("status", json!("ONLINE"))]).await.unwrap_err();
    assert!(matches!(error, ClientError::NoUniqueMatch(_)));

    let error = nodes.find(&[("port", json!(9999))]).await.unwrap_err();
    assert!(matches!(error, ClientError::NotFound(_)));

    let lb = client
        .load_balancers
        .find(&[("name", json!("lb-71"))])
        .await?;
    assert_eq!(lb.id(), 71);
    Ok(())
}

#[tokio::test]
async fn test_errors_propagate_unchanged() {
    let (backend, client) = create_test_client();

    let error = client.load_balancers.get(12_u64).await.unwrap_err();
    assert!(matches!(error, ClientError::UpstreamError { status: 404, .. }));

    let error = client
        .load_balancers
        .nodes(71_u64)
        .update(999_u64, NodeUpdate::new().weight(3))
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(404));

    // 失败的调用同样是可观察的
    backend.assert_called(Method::PUT, "/loadbalancers/71/nodes/999");
    assert_eq!(backend.call_count(), 2);
}
