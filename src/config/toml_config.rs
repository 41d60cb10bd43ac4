use crate::config::StorageConfig;
use crate::utils::error::{Result, StorageError};
use regex::Regex;
use std::path::Path;

/// Overrides are read from `REST_STORAGE_ENDPOINT`, `REST_STORAGE_TOKEN` and
/// `REST_STORAGE_TIMEOUT_SECONDS`.
pub const ENV_PREFIX: &str = "REST_STORAGE";

impl StorageConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    ///
    /// `${VAR}` references are replaced from the environment first, so a token
    /// can stay out of the file.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${REST_STORAGE_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            StorageError::ConfigError {
                message: format!("invalid substitution pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 以環境變數覆蓋已載入的設定
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_with_prefix(ENV_PREFIX)
    }

    /// Reads `<prefix>_ENDPOINT`, `<prefix>_TOKEN` and `<prefix>_TIMEOUT_SECONDS`.
    fn apply_overrides_with_prefix(&mut self, prefix: &str) -> Result<()> {
        if let Ok(endpoint) = std::env::var(format!("{}_ENDPOINT", prefix)) {
            self.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var(format!("{}_TOKEN", prefix)) {
            self.token = token;
        }

        let timeout_var = format!("{}_TIMEOUT_SECONDS", prefix);
        if let Ok(timeout) = std::env::var(&timeout_var) {
            let seconds = timeout
                .parse()
                .map_err(|_| StorageError::InvalidConfigValueError {
                    field: timeout_var.clone(),
                    value: timeout.clone(),
                    reason: "Value must be a whole number of seconds".to_string(),
                })?;
            self.request_timeout_seconds = Some(seconds);
        }
        Ok(())
    }
}
