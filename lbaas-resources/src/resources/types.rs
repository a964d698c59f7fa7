use super::base::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 节点在负载均衡器中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// 正常参与轮转接收流量
    Primary,
    /// 只有所有主节点都失效时才接收流量
    Secondary,
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Primary => "PRIMARY",
            NodeType::Secondary => "SECONDARY",
        }
    }
}

/// 节点状态，决定节点是否接受新连接
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeCondition {
    /// 允许接受新连接
    Enabled,
    /// 不接受任何新连接，现有连接被强制断开
    Disabled,
    /// 只服务已建立的连接和会话保持带来的连接
    Draining,
}

impl NodeCondition {
    pub fn as_str(&self) -> &str {
        match self {
            NodeCondition::Enabled => "ENABLED",
            NodeCondition::Disabled => "DISABLED",
            NodeCondition::Draining => "DRAINING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VirtualIpType {
    /// 公网虚拟IP
    Public,
    /// 私有 ServiceNet 网络上的虚拟IP
    Servicenet,
}

impl VirtualIpType {
    pub fn as_str(&self) -> &str {
        match self {
            VirtualIpType::Public => "PUBLIC",
            VirtualIpType::Servicenet => "SERVICENET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VirtualIpVersion {
    #[serde(rename = "IPV4")]
    Ipv4,
    #[serde(rename = "IPV6")]
    Ipv6,
}

impl VirtualIpVersion {
    pub fn as_str(&self) -> &str {
        match self {
            VirtualIpVersion::Ipv4 => "IPV4",
            VirtualIpVersion::Ipv6 => "IPV6",
        }
    }
}

/// 在后端节点之间分配流量的算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    LeastConnections,
    Random,
    RoundRobin,
    WeightedLeastConnections,
    /// 使用节点的 weight 属性
    WeightedRoundRobin,
}

impl Algorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Algorithm::LeastConnections => "LEAST_CONNECTIONS",
            Algorithm::Random => "RANDOM",
            Algorithm::RoundRobin => "ROUND_ROBIN",
            Algorithm::WeightedLeastConnections => "WEIGHTED_LEAST_CONNECTIONS",
            Algorithm::WeightedRoundRobin => "WEIGHTED_ROUND_ROBIN",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_str!(NodeType, NodeCondition, VirtualIpType, VirtualIpVersion, Algorithm);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkItemType {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthMonitorType {
    Connect,
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceType {
    HttpCookie,
    SourceIp,
}

/// 服务端时间戳，线上格式为 `{"time": "2011-04-13T14:18:07Z"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub time: DateTime<Utc>,
}

/// 新建节点的定义
///
/// `weight` 只在 WEIGHTED_* 算法下生效，取值应为 1 到 100，客户端不做校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub address: String,
    pub port: u16,
    pub condition: NodeCondition,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl NodeSpec {
    pub fn new(address: impl Into<String>, port: u16, condition: NodeCondition) -> Self {
        Self {
            address: address.into(),
            port,
            condition,
            node_type: None,
            weight: None,
        }
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// 创建负载均衡器时的虚拟IP定义：新分配一个，或共享已有的虚拟IP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualIpSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vip_type: Option<VirtualIpType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<VirtualIpVersion>,
}

impl VirtualIpSpec {
    pub fn new(vip_type: VirtualIpType) -> Self {
        Self {
            id: None,
            vip_type: Some(vip_type),
            ip_version: None,
        }
    }

    /// 共享另一个负载均衡器已有的虚拟IP
    pub fn shared(id: ResourceId) -> Self {
        Self {
            id: Some(id),
            vip_type: None,
            ip_version: None,
        }
    }

    pub fn with_ip_version(mut self, ip_version: VirtualIpVersion) -> Self {
        self.ip_version = Some(ip_version);
        self
    }
}

/// 访问控制列表中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkItem {
    pub address: String,
    #[serde(rename = "type")]
    pub item_type: NetworkItemType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionLogging {
    pub enabled: bool,
}

/// 每个IP的连接限制
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionThrottle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connection_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMonitor {
    #[serde(rename = "type")]
    pub monitor_type: HealthMonitorType,
    pub delay: u32,
    pub timeout: u32,
    pub attempts_before_deactivation: u32,
    /// 仅 HTTP/HTTPS 监控
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_regex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

impl MetadataItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPersistence {
    pub persistence_type: PersistenceType,
}
