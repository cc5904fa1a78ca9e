//! Server creation, floating IP assignment and the reachability check.

use std::net::IpAddr;

use tracing::{error, info, warn};

use crate::cloud::{CloudError, CloudOps, Server, ServerRequest};

use super::config::RunConfig;
use super::error::{CheckError, CheckResult, ProvisionStage};
use super::lock::RunLock;
use super::probe::ReachabilityProbe;
use super::trail::{Step, StatusTrail};

/// Brings up a reachable server, recording each step into `trail`.
///
/// Returns the server only if every step succeeded. The lock is taken as
/// soon as the server is `ACTIVE` and is not released here on later
/// failures: the server still exists and stays held for manual cleanup.
pub async fn provision(
    cloud: &dyn CloudOps,
    config: &RunConfig,
    probe: &ReachabilityProbe,
    lock: &RunLock,
    trail: &mut StatusTrail,
) -> CheckResult<Server> {
    let server = match create_server(cloud, config).await {
        Ok(server) => server,
        Err(err) => {
            trail.failure(Step::Created);
            error!(error = %err, "VM creation failed");
            return Err(err);
        }
    };

    if let Err(source) = lock.acquire(&server.id) {
        trail.failure(Step::Created);
        let err = CheckError::LockAcquire {
            server_id: server.id.clone(),
            path: lock.path().to_path_buf(),
            source,
        };
        error!(error = %err, "VM creation failed");
        discard(cloud, &server, config).await;
        return Err(err);
    }
    trail.success(Step::Created);
    info!(server_id = %server.id, name = %server.name, "VM created");

    let (server, address) = match assign_floating_ip(cloud, config, server).await {
        Ok(assigned) => assigned,
        Err(err) => {
            trail.failure(Step::IpAssigned);
            error!(error = %err, "Floating IP assignment failed");
            return Err(err);
        }
    };
    trail.success(Step::IpAssigned);
    info!(server_id = %server.id, %address, "Floating IP assigned");

    match probe.check(address).await {
        Ok(report) => {
            trail.success(Step::SshConnection);
            info!(
                server_id = %server.id,
                %address,
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "SSH port reachable"
            );
            Ok(server)
        }
        Err(source) => {
            trail.failure(Step::SshConnection);
            let err = CheckError::Reachability {
                server_id: server.id.clone(),
                source,
            };
            error!(error = %err, "SSH connection failed");
            Err(err)
        }
    }
}

async fn create_server(cloud: &dyn CloudOps, config: &RunConfig) -> CheckResult<Server> {
    let image = cloud
        .find_image(&config.image_name)
        .await
        .map_err(at(ProvisionStage::Image))?;
    let flavor = cloud
        .find_flavor(&config.flavor_name)
        .await
        .map_err(at(ProvisionStage::Flavor))?;
    let network = cloud
        .find_network(&config.network_name)
        .await
        .map_err(at(ProvisionStage::Network))?;
    let keypair = cloud
        .find_keypair(&config.keypair_name)
        .await
        .map_err(at(ProvisionStage::Keypair))?;

    let request = ServerRequest {
        name: config.server_name.clone(),
        image_id: image.id,
        flavor_id: flavor.id,
        network_id: network.id,
        key_name: keypair.name,
    };
    let server = cloud
        .create_server(&request)
        .await
        .map_err(at(ProvisionStage::Create))?;

    match cloud.wait_for_server(&server, config.create_timeout).await {
        Ok(server) => Ok(server),
        Err(source) => {
            discard(cloud, &server, config).await;
            Err(CheckError::Provision {
                stage: ProvisionStage::Wait,
                source,
            })
        }
    }
}

async fn assign_floating_ip(
    cloud: &dyn CloudOps,
    config: &RunConfig,
    server: Server,
) -> CheckResult<(Server, IpAddr)> {
    let server_id = server.id.clone();
    let assign = async move {
        let server = cloud.wait_for_server(&server, config.create_timeout).await?;
        let ip = cloud.allocate_floating_ip(&config.floating_ip_pool).await?;
        cloud.associate_floating_ip(&server, &ip).await?;
        let server = Server {
            floating_ip: Some(ip.address),
            ..server
        };
        Ok::<_, CloudError>((server, ip.address))
    };

    assign
        .await
        .map_err(|source| CheckError::NetworkAssign { server_id, source })
}

/// Deletes a server that never made it under the lock.
async fn discard(cloud: &dyn CloudOps, server: &Server, config: &RunConfig) {
    match cloud.delete_server(server, config.delete_timeout).await {
        Ok(()) => info!(server_id = %server.id, "Discarded unlocked VM"),
        Err(e) => warn!(server_id = %server.id, error = %e, "Could not discard unlocked VM"),
    }
}

fn at(stage: ProvisionStage) -> impl FnOnce(CloudError) -> CheckError {
    move |source| CheckError::Provision { stage, source }
}
