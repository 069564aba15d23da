use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::adb::client::{
    devices_args, dir_size_args, dump_package_args, getprop_args, list_packages_args,
    package_path_args, BridgeRunner,
};
use crate::app::adb::parse::{
    parse_device_list, parse_package_dump, parse_package_list, parse_package_path, parse_size,
};
use crate::app::config::AppConfig;
use crate::app::error::{AdbError, ParseWarning};
use crate::app::models::{AppPackage, Device};

const LIST_PACKAGES_TIMEOUT: Duration = Duration::from_secs(30);
const SIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// One device's app inventory plus any per-item degradations that
/// happened while building it.
#[derive(Debug, Clone, Default)]
pub struct AppInventory {
    pub apps: Vec<AppPackage>,
    pub warnings: Vec<ParseWarning>,
}

/// Owns every catalog cache. Discovery is always live; device detail and
/// app inventories are cached per device until an explicit `refresh` or
/// a device change evicts them. Nothing else holds this data.
pub struct DeviceCatalog<B: BridgeRunner> {
    bridge: B,
    prop_timeout: Duration,
    dump_timeout: Duration,
    fetch_sizes: bool,
    detail_cache: HashMap<String, Device>,
    app_cache: HashMap<String, AppInventory>,
}

impl<B: BridgeRunner> DeviceCatalog<B> {
    pub fn new(bridge: B, config: &AppConfig) -> Self {
        Self {
            bridge,
            prop_timeout: Duration::from_secs(config.adb.prop_timeout_secs),
            dump_timeout: Duration::from_secs(config.adb.command_timeout_secs),
            fetch_sizes: config.catalog.fetch_sizes,
            detail_cache: HashMap::new(),
            app_cache: HashMap::new(),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Lists currently attached devices. Never cached: a stale device
    /// list is worse than a slow one.
    pub fn discover_devices(&self) -> Result<Vec<Device>, AdbError> {
        let output = self.bridge.run(&devices_args(), self.prop_timeout)?;
        Ok(parse_device_list(&output.stdout))
    }

    /// Fills in the four detail properties for a discovered device.
    /// Each property is best-effort; a property query failure leaves the
    /// field empty rather than failing the device.
    pub fn load_device_detail(&mut self, basic: &Device) -> Device {
        if let Some(cached) = self.detail_cache.get(&basic.id) {
            return cached.clone();
        }

        let trace_id = Uuid::new_v4().to_string();
        let mut device = basic.clone();
        let model = self.get_prop(&basic.id, "ro.product.model", &trace_id);
        if !model.is_empty() {
            device.model = model;
        }
        device.manufacturer = self.get_prop(&basic.id, "ro.product.manufacturer", &trace_id);
        device.android_version = self.get_prop(&basic.id, "ro.build.version.release", &trace_id);
        device.sdk_level = self
            .get_prop(&basic.id, "ro.build.version.sdk", &trace_id)
            .parse()
            .unwrap_or(0);

        info!(
            trace_id = %trace_id,
            device_id = %device.id,
            model = %device.model,
            sdk_level = device.sdk_level,
            "loaded device detail"
        );
        self.detail_cache.insert(basic.id.clone(), device.clone());
        device
    }

    fn get_prop(&self, device_id: &str, prop: &str, trace_id: &str) -> String {
        match self
            .bridge
            .run(&getprop_args(device_id, prop), self.prop_timeout)
        {
            Ok(output) => output.stdout.trim().to_string(),
            Err(err) => {
                warn!(trace_id = %trace_id, device_id = %device_id, prop = %prop, error = %err, "getprop failed");
                String::new()
            }
        }
    }

    /// Builds the app inventory for one device: a single package listing
    /// (the only fatal call here), then one sequential dump per package.
    /// A failed dump degrades that one package to safe defaults with a
    /// warning; it never aborts the load.
    pub fn load_apps(&mut self, device_id: &str) -> Result<AppInventory, AdbError> {
        if let Some(cached) = self.app_cache.get(device_id) {
            return Ok(cached.clone());
        }

        let trace_id = Uuid::new_v4().to_string();
        let listing = self
            .bridge
            .run(&list_packages_args(device_id), LIST_PACKAGES_TIMEOUT)?;
        let packages = parse_package_list(&listing.stdout);

        let mut inventory = AppInventory::default();
        for package in packages {
            let dump = match self
                .bridge
                .run(&dump_package_args(device_id, &package), self.dump_timeout)
            {
                Ok(output) => parse_package_dump(&output.stdout, 0),
                Err(err) => {
                    warn!(
                        trace_id = %trace_id,
                        device_id = %device_id,
                        package = %package,
                        error = %err,
                        "package dump failed, using defaults"
                    );
                    inventory.warnings.push(ParseWarning::new(
                        format!("dumpsys package {package}"),
                        err.to_string(),
                    ));
                    Default::default()
                }
            };

            let size_mb = if self.fetch_sizes {
                self.app_size(device_id, &package)
            } else {
                None
            };

            inventory.apps.push(AppPackage {
                package,
                enabled: dump.enabled,
                origin: dump.origin,
                size_mb,
            });
        }

        inventory.apps.sort_by(|a, b| a.package.cmp(&b.package));
        info!(
            trace_id = %trace_id,
            device_id = %device_id,
            app_count = inventory.apps.len(),
            warning_count = inventory.warnings.len(),
            "loaded app inventory"
        );
        self.app_cache
            .insert(device_id.to_string(), inventory.clone());
        Ok(inventory)
    }

    fn app_size(&self, device_id: &str, package: &str) -> Option<f64> {
        let path_output = self
            .bridge
            .run(&package_path_args(device_id, package), self.prop_timeout)
            .ok()?;
        let dir = parse_package_path(&path_output.stdout)?;
        let size_output = self
            .bridge
            .run(&dir_size_args(device_id, &dir), SIZE_TIMEOUT)
            .ok()?;
        parse_size(&size_output.stdout)
    }

    /// Drops everything cached for one device. Called on manual refresh
    /// and on device change.
    pub fn refresh(&mut self, device_id: &str) {
        self.detail_cache.remove(device_id);
        self.app_cache.remove(device_id);
    }
}
