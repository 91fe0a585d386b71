//! Runtime bring-up. Initialization:
//! 1. overrides the global config, from a hand-crafted entity, a YAML file, or the environment
//! 2. initializes the global logger
//! 3. spawns the background collectors (metric log flush, system stat sampling, time ticker)

use crate::config::{self, ConfigEntity};
use crate::{log::metric, system_metric, utils, Result};

/// Initializes using configuration from the system environment and defaults.
#[inline]
pub fn init_default() -> Result<()> {
    init_sentinel(&mut String::new())
}

/// Initializes using a hand-crafted config entity.
#[inline]
pub fn init_with_config(config_entity: ConfigEntity) -> Result<()> {
    config_entity.check()?;
    config::reset_global_config(config_entity);
    config::override_items_from_system_env()?;
    #[cfg(any(feature = "env_logger", feature = "log4rs"))]
    config::init_log()?;
    init_core_components()
}

/// Initializes from general configuration loaded from the given YAML file.
#[inline]
pub fn init_with_config_file(config_path: &mut String) -> Result<()> {
    init_sentinel(config_path)
}

#[inline]
fn init_sentinel(config_path: &mut String) -> Result<()> {
    if !config_path.is_empty() {
        config::init_config_with_yaml(config_path)?;
    }
    init_core_components()
}

#[inline]
fn init_core_components() -> Result<()> {
    if config::metric_log_flush_interval_sec() > 0 {
        metric::init_task();
    }

    let system_interval = config::system_stat_collect_interval_ms();
    let mut load_interval = system_interval;
    let mut cpu_interval = system_interval;
    let mut mem_interval = system_interval;

    if config::load_stat_collec_interval_ms() > 0 {
        load_interval = config::load_stat_collec_interval_ms();
    }
    if config::cpu_stat_collec_interval_ms() > 0 {
        cpu_interval = config::cpu_stat_collec_interval_ms();
    }
    if config::memory_stat_collec_interval_ms() > 0 {
        mem_interval = config::memory_stat_collec_interval_ms();
    }

    if load_interval > 0 {
        system_metric::init_load_collector(load_interval);
    }
    if cpu_interval > 0 {
        system_metric::init_cpu_collector(cpu_interval);
    }
    if mem_interval > 0 {
        system_metric::init_memory_collector(mem_interval);
    }

    if config::use_cache_time() {
        utils::start_time_ticker();
    }
    Ok(())
}
