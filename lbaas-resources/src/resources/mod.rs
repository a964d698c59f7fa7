pub mod base;
pub mod load_balancers;
pub mod nodes;
pub mod traits;
pub mod types;
pub mod virtual_ips;

pub use base::{getid, AsResourceId, Manager, Resource, ResourceId, Result};
pub use load_balancers::{
    CreateLoadBalancer, LoadBalancer, LoadBalancerInfo, LoadBalancerManager, LoadBalancerUpdate,
};
pub use nodes::{Node, NodeInfo, NodeManager, NodeUpdate};
pub use traits::ManagerWithFind;
pub use types::{
    Algorithm, ConnectionLogging, ConnectionThrottle, HealthMonitor, HealthMonitorType,
    MetadataItem, NetworkItem, NetworkItemType, NodeCondition, NodeSpec, NodeType,
    PersistenceType, SessionPersistence, Timestamp, VirtualIpSpec, VirtualIpType,
    VirtualIpVersion,
};
pub use virtual_ips::{VirtualIp, VirtualIpInfo, VirtualIpManager};
