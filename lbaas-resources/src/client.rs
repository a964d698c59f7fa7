use crate::resources::LoadBalancerManager;
use lbaas_core::{ClientError, Config, HttpBackend, RestClient};
use std::sync::Arc;

/// 负载均衡服务的入口
///
/// 持有共享的HTTP后端，`load_balancers` 是所有资源操作的起点。
#[derive(Debug, Clone)]
pub struct LoadBalancerClient {
    pub load_balancers: LoadBalancerManager,
}

impl LoadBalancerClient {
    pub fn new(api: Arc<dyn HttpBackend>) -> Self {
        Self {
            load_balancers: LoadBalancerManager::new(api),
        }
    }

    /// 根据配置创建基于reqwest的客户端
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let rest = RestClient::from_config(config)?;
        tracing::debug!("Load balancer client targeting {}", rest.base_url());
        Ok(Self::new(Arc::new(rest)))
    }

    pub fn api(&self) -> &Arc<dyn HttpBackend> {
        self.load_balancers.api()
    }
}
