//! The marketplace admission service.
//!
//! `validate_deployment` is the top-level gate between "operator picked
//! a recipe and a device" and "a deployment may be materialized".
//! Unknown recipe, unknown device, and an offline device are hard
//! stops; everything after that accumulates into one verdict.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use skiff_catalog::RecipeLoader;
use skiff_core::{
    Device, Recipe, UserConfig, ValidationResult, scalar_to_string, template,
};

use crate::config::{ConfigValidationError, validate_config};
use crate::exec::{DeviceStore, RemoteExecutor, ResourceProbe};

const DOCKER_VERSION_CMD: &str = "docker --version";
const DOCKER_INFO_CMD: &str = "docker info";

/// Default deadline for each on-device check.
const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrates recipe resolution, config validation, device probing,
/// and template preview into a single admission verdict.
pub struct MarketplaceService {
    loader: Arc<RecipeLoader>,
    devices: Arc<dyn DeviceStore>,
    executor: Arc<dyn RemoteExecutor>,
    probe: Arc<dyn ResourceProbe>,
    check_timeout: Duration,
}

impl MarketplaceService {
    pub fn new(
        loader: Arc<RecipeLoader>,
        devices: Arc<dyn DeviceStore>,
        executor: Arc<dyn RemoteExecutor>,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        Self {
            loader,
            devices,
            executor,
            probe,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Devices currently eligible as deployment targets: every known
    /// device that is online.
    pub async fn deployable_devices(&self) -> anyhow::Result<Vec<Device>> {
        let devices = self.devices.list_devices().await?;
        Ok(devices
            .into_iter()
            .filter(|d| d.status.is_online())
            .collect())
    }

    /// Validate a user configuration payload against a recipe's schema.
    pub async fn validate_config_for(
        &self,
        slug: &str,
        config: &UserConfig,
    ) -> Result<(), ConfigValidationError> {
        let recipe = self
            .loader
            .get(slug)
            .await
            .map_err(|e| ConfigValidationError(vec![e.to_string()]))?;
        validate_config(&recipe, config)
    }

    /// The admission gate. See the crate docs for the hard-stop vs.
    /// accumulate split.
    pub async fn validate_deployment(
        &self,
        slug: &str,
        device_id: &str,
        config: &UserConfig,
    ) -> ValidationResult {
        // Hard stop: unknown recipe.
        let Ok(recipe) = self.loader.get(slug).await else {
            return ValidationResult::rejected(format!("recipe not found: {slug}"));
        };

        // Hard stop: unknown device (a store failure is equally
        // terminal — there is nothing to admit against).
        let device = match self.devices.get_device(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                return ValidationResult::rejected(format!("device not found: {device_id}"));
            }
            Err(e) => {
                return ValidationResult::rejected(format!("device lookup failed: {e}"));
            }
        };

        // Hard stop: device offline.
        if !device.status.is_online() {
            return ValidationResult::rejected(format!("device '{}' is not online", device.name));
        }

        let mut result = ValidationResult::new();

        // Missing required fields accumulate; later checks still run.
        for option in recipe.required_options() {
            if !config.contains_key(&option.name) {
                result.record_error(format!("missing required field: {}", option.name));
            }
        }

        let (docker_installed, docker_running) = self.check_docker(&device, &mut result).await;
        self.check_resources(
            &recipe,
            &device,
            config,
            docker_installed,
            docker_running,
            &mut result,
        )
        .await;
        self.render_preview(&recipe, &device, config, &mut result);

        let result = result.finalize();
        info!(
            recipe = slug,
            device = device_id,
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "admission verdict"
        );
        result
    }

    /// Probe Docker presence and daemon state over the executor seam.
    /// Failures accumulate; they never stop the pipeline.
    async fn check_docker(&self, device: &Device, result: &mut ValidationResult) -> (bool, bool) {
        let version = self
            .executor
            .execute_with_timeout(
                &device.address,
                device.ssh_port,
                DOCKER_VERSION_CMD,
                self.check_timeout,
            )
            .await;

        let installed = match version {
            Ok(_) => true,
            Err(e) => {
                debug!(device = %device.id, error = %e, "docker version check failed");
                result.record_error(format!("Docker is not installed on device '{}'", device.name));
                return (false, false);
            }
        };

        let running = match self
            .executor
            .execute_with_timeout(
                &device.address,
                device.ssh_port,
                DOCKER_INFO_CMD,
                self.check_timeout,
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(device = %device.id, error = %e, "docker info check failed");
                result.record_error(format!(
                    "Docker daemon is not running on device '{}'",
                    device.name
                ));
                false
            }
        };

        (installed, running)
    }

    /// Resource admission. Fail-open on probe failure: a device we
    /// cannot measure is assumed sufficient, with a warning so the
    /// operator knows the check was skipped.
    async fn check_resources(
        &self,
        recipe: &Recipe,
        device: &Device,
        config: &UserConfig,
        docker_installed: bool,
        docker_running: bool,
        result: &mut ValidationResult,
    ) {
        let ports = derive_ports(recipe, config);

        let report = tokio::time::timeout(
            self.check_timeout,
            self.probe.validate(
                device,
                recipe.resources.min_ram_mb,
                recipe.resources.min_storage_gb,
                recipe.resources.cpu_cores,
                &ports,
            ),
        )
        .await;

        let report = match report {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(device = %device.id, error = %e, "resource probe failed; assuming capacity");
                result.record_warning(format!(
                    "resource probe failed; assuming sufficient capacity: {e}"
                ));
                return;
            }
            Err(_) => {
                warn!(device = %device.id, "resource probe timed out; assuming capacity");
                result.record_warning(
                    "resource probe timed out; assuming sufficient capacity".to_string(),
                );
                return;
            }
        };

        let mut check = report.check;
        // The executor's findings are fresher than the probe's view.
        check.docker_installed = docker_installed;
        check.docker_running = docker_running;

        if !check.ram_sufficient {
            result.record_error(format!(
                "insufficient RAM: recipe requires {} MB, device has {} MB available",
                check.required_ram_mb, check.available_ram_mb
            ));
        }
        if !check.storage_sufficient {
            result.record_error(format!(
                "insufficient storage: recipe requires {} GB, device has {} GB available",
                check.required_storage_gb, check.available_storage_gb
            ));
        }
        if !report.conflicting_ports.is_empty() {
            let listing = report
                .conflicting_ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            result.record_error(format!("ports already in use on device: {listing}"));
            result.conflicting_ports = Some(report.conflicting_ports);
        }

        result.resource_check = Some(check);
    }

    /// Render the template with preview identity variables. A render
    /// failure accumulates like any other check.
    fn render_preview(
        &self,
        recipe: &Recipe,
        device: &Device,
        config: &UserConfig,
        result: &mut ValidationResult,
    ) {
        let mut vars = BTreeMap::new();
        for (key, value) in config {
            let text = scalar_to_string(value);
            // Templates address variables in upper case; keep the
            // original key too for templates that don't.
            vars.insert(key.to_uppercase(), text.clone());
            vars.insert(key.clone(), text);
        }
        vars.insert("DEPLOYMENT_ID".to_string(), "preview".to_string());
        vars.insert(
            "COMPOSE_PROJECT".to_string(),
            format!("{}-preview", recipe.slug),
        );
        vars.insert("DEVICE_IP".to_string(), device.address.clone());

        match template::render(&recipe.template, &vars) {
            Ok(rendered) => result.template_preview = Some(rendered),
            Err(e) => result.record_error(format!("template render failed: {e}")),
        }
    }
}

/// The ports a configuration implies the workload will bind: the
/// health-check port plus every port-named config value that parses.
fn derive_ports(recipe: &Recipe, config: &UserConfig) -> Vec<u16> {
    let mut ports = vec![recipe.health_check.port];
    for (name, value) in config {
        if name == "port" || name.ends_with("_port") {
            if let Ok(port) = scalar_to_string(value).parse::<u16>() {
                ports.push(port);
            }
        }
    }
    ports.sort_unstable();
    ports.dedup();
    ports
}
