use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub endpoint: EndpointSettings,
    #[serde(default)]
    pub settings: GlobalSettings,
}

/// 负载均衡服务端点
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointSettings {
    /// 服务根路径，所有资源路径都拼接在它后面
    pub base_url: String,
    /// 以 `X-Auth-Token` 头发送，令牌的获取与刷新不在本库范围内
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GlobalSettings {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions
fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("lbaas-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// 只用服务根路径构造配置，其余取默认值
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            endpoint: EndpointSettings {
                base_url: base_url.into(),
                auth_token: None,
                headers: HashMap::new(),
            },
            settings: GlobalSettings::default(),
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.validate_endpoint(&self.endpoint)?;
        self.validate_settings(&self.settings)?;
        Ok(())
    }

    fn validate_endpoint(&self, endpoint: &EndpointSettings) -> Result<()> {
        if endpoint.base_url.is_empty() {
            anyhow::bail!("Endpoint has empty base_url");
        }

        // URL格式验证
        if !endpoint.base_url.starts_with("http://") && !endpoint.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "Endpoint has invalid base_url format: '{}'. Must start with http:// or https://",
                endpoint.base_url
            );
        }

        if let Some(token) = &endpoint.auth_token {
            if token.is_empty() {
                anyhow::bail!("Endpoint has empty auth_token (omit it instead)");
            }
            if token.contains(' ') || token.contains('\t') || token.contains('\n') {
                anyhow::bail!("Endpoint has invalid auth_token format (cannot contain whitespace)");
            }
        }

        // 验证自定义头部格式
        for (header_name, header_value) in &endpoint.headers {
            if header_name.is_empty() {
                anyhow::bail!("Endpoint has empty header name");
            }
            if header_value.is_empty() {
                anyhow::bail!("Endpoint has empty header value for header '{}'", header_name);
            }
        }

        Ok(())
    }

    fn validate_settings(&self, settings: &GlobalSettings) -> Result<()> {
        if settings.request_timeout_seconds == 0 {
            anyhow::bail!("Invalid request_timeout_seconds: cannot be 0");
        }

        if settings.request_timeout_seconds > 300 {
            anyhow::bail!(
                "request_timeout_seconds too large: {} (maximum 300 seconds)",
                settings.request_timeout_seconds
            );
        }

        if settings.connect_timeout_seconds == 0 {
            anyhow::bail!("Invalid connect_timeout_seconds: cannot be 0");
        }

        if settings.connect_timeout_seconds > settings.request_timeout_seconds {
            anyhow::bail!(
                "connect_timeout_seconds ({}) > request_timeout_seconds ({})",
                settings.connect_timeout_seconds,
                settings.request_timeout_seconds
            );
        }

        if settings.user_agent.trim().is_empty() {
            anyhow::bail!("Empty user_agent");
        }

        Ok(())
    }
}
