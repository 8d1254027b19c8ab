//! Collaborator seams the admission service drives.
//!
//! The transports behind these traits (SSH, database-backed device
//! records, the probe agent) live outside this core; admission only
//! needs their contracts.

use std::time::Duration;

use async_trait::async_trait;

use skiff_core::{Device, ResourceCheck};

/// Runs a command string against a host and returns its output.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(&self, host: &str, port: u16, command: &str) -> anyhow::Result<String>;

    /// Deadline-bounded variant. A timeout surfaces as an ordinary
    /// execution failure so callers need no separate timeout handling.
    async fn execute_with_timeout(
        &self,
        host: &str,
        port: u16,
        command: &str,
        timeout: Duration,
    ) -> anyhow::Result<String> {
        match tokio::time::timeout(timeout, self.execute(host, port, command)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("command timed out after {timeout:?}: {command}"),
        }
    }
}

/// The slice of the record store admission reads: device lookups.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn get_device(&self, id: &str) -> anyhow::Result<Option<Device>>;
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>>;
}

/// Live resource admission snapshot plus the ports that collide.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub check: ResourceCheck,
    pub conflicting_ports: Vec<u16>,
}

/// Probes a device's live capacity against a recipe's requirements.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn validate(
        &self,
        device: &Device,
        min_ram_mb: u64,
        min_storage_gb: u64,
        cpu_cores: u32,
        ports: &[u16],
    ) -> anyhow::Result<ProbeReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowExecutor;

    #[async_trait]
    impl RemoteExecutor for SlowExecutor {
        async fn execute(&self, _host: &str, _port: u16, _command: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn execute_with_timeout_bounds_a_hung_command() {
        let result = SlowExecutor
            .execute_with_timeout("10.0.0.1", 22, "docker info", Duration::from_millis(50))
            .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
