//! Load Balancer Resources Library
//!
//! Typed resources and managers for the load balancer REST API:
//! - Load balancers, with node and virtual IP managers scoped to each one
//! - Partial updates that only send the fields that were set
//! - Client-side lookup by attribute
//! - A client entry point built from configuration or any HTTP backend

pub mod client;
pub mod resources;

// Re-export commonly used types
pub use client::LoadBalancerClient;
pub use resources::{
    getid, AsResourceId, CreateLoadBalancer, LoadBalancer, LoadBalancerManager,
    LoadBalancerUpdate, ManagerWithFind, Node, NodeManager, NodeSpec, NodeUpdate, Resource,
    ResourceId, VirtualIp, VirtualIpManager, VirtualIpSpec,
};
