use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Detail URL carries an `{id}` placeholder
/// - Bond and chocolate flags are set and distinct
/// - TTL and timeouts are non-zero
/// - File paths are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !config.upstream.equip_detail_url.contains("{id}") {
        return Err(ConfigError::ValidationError(
            "upstream.equip_detail_url must contain an {id} placeholder".to_string(),
        ));
    }

    if config.upstream.timeout_secs == 0 || config.upstream.export_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream timeouts cannot be 0".to_string(),
        ));
    }

    if config.sync.bond_flag.is_empty() || config.sync.choco_flag.is_empty() {
        return Err(ConfigError::ValidationError(
            "sync.bond_flag and sync.choco_flag cannot be empty".to_string(),
        ));
    }

    if config.sync.bond_flag == config.sync.choco_flag {
        return Err(ConfigError::ValidationError(
            "sync.bond_flag and sync.choco_flag must differ".to_string(),
        ));
    }

    if config.servant_cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "servant_cache.ttl_secs cannot be 0".to_string(),
        ));
    }

    if config.catalog.path.as_os_str().is_empty() || config.servant_cache.path.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "catalog.path and servant_cache.path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
