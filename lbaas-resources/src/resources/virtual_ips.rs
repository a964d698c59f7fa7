use super::base::{AsResourceId, Manager, Resource, ResourceId, Result};
use super::traits::ManagerWithFind;
use super::types::{VirtualIpType, VirtualIpVersion};
use async_trait::async_trait;
use lbaas_core::HttpBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualIpInfo {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vip_type: Option<VirtualIpType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<VirtualIpVersion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 绑定在负载均衡器上的虚拟IP
#[derive(Debug, Clone)]
pub struct VirtualIp {
    info: VirtualIpInfo,
    manager: VirtualIpManager,
}

impl VirtualIp {
    pub(crate) fn new(manager: VirtualIpManager, info: VirtualIpInfo) -> Self {
        Self { info, manager }
    }

    pub fn address(&self) -> Option<&str> {
        self.info.address.as_deref()
    }

    pub fn vip_type(&self) -> Option<VirtualIpType> {
        self.info.vip_type
    }

    pub fn ip_version(&self) -> Option<VirtualIpVersion> {
        self.info.ip_version
    }

    pub fn load_balancer_id(&self) -> ResourceId {
        self.manager.load_balancer_id()
    }

    /// 从所属负载均衡器上移除这个虚拟IP
    pub async fn remove(&self) -> Result<()> {
        self.manager.remove(self).await
    }
}

impl Resource for VirtualIp {
    type Info = VirtualIpInfo;
    const KIND: &'static str = "virtual IP";

    fn info(&self) -> &VirtualIpInfo {
        &self.info
    }

    fn id(&self) -> ResourceId {
        self.info.id
    }
}

impl AsResourceId for VirtualIp {
    fn resource_id(&self) -> ResourceId {
        self.info.id
    }
}

impl PartialEq for VirtualIp {
    fn eq(&self, other: &Self) -> bool {
        self.info.id == other.info.id
    }
}

impl fmt::Display for VirtualIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<VirtualIP: {}>",
            self.info.address.as_deref().unwrap_or_default()
        )
    }
}

/// 某个负载均衡器下的虚拟IP管理器
#[derive(Debug, Clone)]
pub struct VirtualIpManager {
    base: Manager,
    load_balancer_id: ResourceId,
}

impl VirtualIpManager {
    pub fn new(api: Arc<dyn HttpBackend>, load_balancer: impl AsResourceId) -> Self {
        Self {
            base: Manager::new(api),
            load_balancer_id: load_balancer.resource_id(),
        }
    }

    pub fn load_balancer_id(&self) -> ResourceId {
        self.load_balancer_id
    }

    /// `/loadbalancers/{lb_id}/virtualips`
    pub fn collection_path(&self) -> String {
        format!("/loadbalancers/{}/virtualips", self.load_balancer_id)
    }

    pub fn virtual_ip_path(&self, virtual_ip: impl AsResourceId) -> String {
        format!("{}/{}", self.collection_path(), virtual_ip.resource_id())
    }

    fn wrap(&self, info: VirtualIpInfo) -> VirtualIp {
        VirtualIp::new(self.clone(), info)
    }

    pub async fn list(&self) -> Result<Vec<VirtualIp>> {
        let infos: Vec<VirtualIpInfo> = self
            .base
            .list(&self.collection_path(), "virtualIps")
            .await?;
        Ok(infos.into_iter().map(|info| self.wrap(info)).collect())
    }

    /// 为负载均衡器添加一个虚拟IP
    pub async fn add(
        &self,
        vip_type: VirtualIpType,
        ip_version: Option<VirtualIpVersion>,
    ) -> Result<VirtualIp> {
        let mut body = json!({ "type": vip_type.as_str() });
        if let Some(ip_version) = ip_version {
            body["ipVersion"] = ip_version.as_str().into();
        }

        let info: VirtualIpInfo = self
            .base
            .create_unwrapped(&self.collection_path(), &body, "virtualIp")
            .await?;

        tracing::info!(
            "Added virtual IP {} to load balancer {}",
            info.id,
            self.load_balancer_id
        );
        Ok(self.wrap(info))
    }

    pub async fn remove(&self, virtual_ip: impl AsResourceId) -> Result<()> {
        let path = self.virtual_ip_path(virtual_ip);
        self.base.delete(&path).await?;
        tracing::info!("Removed virtual IP {}", path);
        Ok(())
    }
}

#[async_trait]
impl ManagerWithFind for VirtualIpManager {
    type Item = VirtualIp;

    async fn list_all(&self) -> Result<Vec<VirtualIp>> {
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbaas_core::StubBackend;

    fn create_test_manager() -> VirtualIpManager {
        VirtualIpManager::new(Arc::new(StubBackend::new()), 71_u64)
    }

    #[test]
    fn test_paths_are_scoped_to_load_balancer() {
        let manager = create_test_manager();
        assert_eq!(manager.collection_path(), "/loadbalancers/71/virtualips");
        assert_eq!(
            manager.virtual_ip_path(1000_u64),
            "/loadbalancers/71/virtualips/1000"
        );
    }

    #[test]
    fn test_virtual_ip_info_wire_format() {
        let info: VirtualIpInfo = serde_json::from_value(json!({
            "id": 1000,
            "address": "206.10.10.210",
            "type": "PUBLIC",
            "ipVersion": "IPV4"
        }))
        .unwrap();
        assert_eq!(info.vip_type, Some(VirtualIpType::Public));
        assert_eq!(info.ip_version, Some(VirtualIpVersion::Ipv4));
        assert!(info.extra.is_empty());

        let vip = VirtualIp::new(create_test_manager(), info);
        assert_eq!(vip.to_string(), "<VirtualIP: 206.10.10.210>");
        assert_eq!(vip.attribute("ipVersion"), Some(json!("IPV4")));
        assert_eq!(vip.load_balancer_id(), 71);
    }
}
