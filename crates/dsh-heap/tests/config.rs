use dsh_heap::config::GlobalConfig;
use dsh_heap::config::logger::AllocLogLevel;
use dsh_heap::memory_management::MemoryBlockManager;
use dsh_heap::storage::BytesBackend;
use serial_test::serial;

#[test_log::test]
#[serial]
fn global_config_is_set_once() {
    let mut config = GlobalConfig::default();
    config.memory.refresh_threshold = 4;
    config.memory.page_size = 65536;
    GlobalConfig::set(config).unwrap();

    assert_eq!(GlobalConfig::get().memory.refresh_threshold, 4);
    assert!(GlobalConfig::set(GlobalConfig::default()).is_err());

    let mut manager = MemoryBlockManager::from_global_config(BytesBackend::default());
    assert_eq!(manager.options().refresh_threshold, 4);

    manager.register_heap(0, 100, false).unwrap();
    assert_eq!(manager.total_size(), 65536);
}

#[cfg(any(target_os = "windows", target_os = "linux", target_os = "macos"))]
#[test_log::test]
#[serial]
fn environment_overrides_the_file() {
    // SAFETY: tests touching the environment run serially.
    unsafe {
        std::env::set_var("DSH_HEAP_LOG", "full");
        std::env::set_var("DSH_HEAP_REFRESH_THRESHOLD", "32");
    }
    let config = GlobalConfig::default().override_from_env();
    assert_eq!(config.memory.logger.level, AllocLogLevel::Full);
    assert_eq!(config.memory.refresh_threshold, 32);

    unsafe {
        std::env::set_var("DSH_HEAP_LOG", "0");
        std::env::set_var("DSH_HEAP_REFRESH_THRESHOLD", "many");
    }
    let config = GlobalConfig::default().override_from_env();
    assert_eq!(config.memory.logger.level, AllocLogLevel::Disabled);
    assert_eq!(config.memory.refresh_threshold, 128);

    unsafe {
        std::env::remove_var("DSH_HEAP_LOG");
        std::env::remove_var("DSH_HEAP_REFRESH_THRESHOLD");
    }
}

#[cfg(any(target_os = "windows", target_os = "linux", target_os = "macos"))]
#[test_log::test]
#[serial]
fn saved_config_parses_back() {
    let mut config = GlobalConfig::default();
    config.memory.pool_max_count = 256;
    config.memory.logger.level = AllocLogLevel::Disabled;

    let path = std::env::temp_dir().join(format!("dsh-heap-{}.toml", std::process::id()));
    config.save(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let parsed = GlobalConfig::from_toml(&content).unwrap();
    assert_eq!(parsed.memory.pool_max_count, 256);
    assert_eq!(parsed.memory.logger.level, AllocLogLevel::Disabled);
}
