//! Manifests for a server's Deployment and Service, and the status
//! derivations read back from them.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, Pod, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::adapter::outbound::labels::{managed_labels, workload_env};
use crate::domain::server::{Server, ServerStatus};
use crate::domain::stats::{HealthCheck, HealthStatus};
use crate::port::outbound::orchestrator::ProvisionOptions;

/// Control-plane HTTP port inside the pod.
pub const HTTP_PORT: i32 = 8080;
/// Data-plane UDP port inside the pod.
pub const VPN_PORT: i32 = 51820;
/// Port the load balancer exposes for HTTP.
pub const SERVICE_HTTP_PORT: i32 = 80;
pub const HEALTH_PATH: &str = "/health";

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

fn health_probe(initial_delay: i32, period: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(HEALTH_PATH.to_string()),
            port: IntOrString::Int(HTTP_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        ..Default::default()
    }
}

/// Selector matching the server's pods.
#[must_use]
pub fn pod_selector(server_name: &str) -> String {
    format!("app={server_name}")
}

/// One-replica Deployment running the server's image.
#[must_use]
pub fn build_deployment(
    server: &Server,
    image: &str,
    namespace: &str,
    options: &ProvisionOptions,
) -> Deployment {
    let labels = managed_labels(server);
    let selector = BTreeMap::from([("app".to_string(), server.name.clone())]);

    let container = Container {
        name: server.name.clone(),
        image: Some(image.to_string()),
        command: options.command.clone(),
        ports: Some(vec![
            ContainerPort {
                name: Some("http".into()),
                container_port: HTTP_PORT,
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some("vpn".into()),
                container_port: VPN_PORT,
                protocol: Some("UDP".into()),
                ..Default::default()
            },
        ]),
        env: Some(
            workload_env(server, options)
                .into_iter()
                .map(|(name, value)| EnvVar {
                    name,
                    value: Some(value),
                    value_from: None,
                })
                .collect(),
        ),
        resources: Some(ResourceRequirements {
            requests: Some(quantities("100m", "128Mi")),
            limits: Some(quantities("500m", "512Mi")),
            ..Default::default()
        }),
        liveness_probe: Some(health_probe(30, 10)),
        readiness_probe: Some(health_probe(5, 5)),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(server.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Load-balanced Service exposing both ports.
#[must_use]
pub fn build_service(server: &Server, namespace: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(server.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels(server)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".into()),
            selector: Some(BTreeMap::from([(
                "app".to_string(),
                server.name.clone(),
            )])),
            ports: Some(vec![
                ServicePort {
                    name: Some("http".into()),
                    port: SERVICE_HTTP_PORT,
                    target_port: Some(IntOrString::Int(HTTP_PORT)),
                    protocol: Some("TCP".into()),
                    ..Default::default()
                },
                ServicePort {
                    name: Some("vpn".into()),
                    port: VPN_PORT,
                    target_port: Some(IntOrString::Int(VPN_PORT)),
                    protocol: Some("UDP".into()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Desired and ready replica counts of a Deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaCounts {
    pub desired: i32,
    pub ready: i32,
}

impl ReplicaCounts {
    #[must_use]
    pub fn of(deployment: &Deployment) -> Self {
        let status = deployment.status.as_ref();
        let desired = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .or_else(|| status.and_then(|s| s.replicas))
            .unwrap_or(0);
        let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);
        Self { desired, ready }
    }

    /// Status of a listed workload: any ready replica means running, zero
    /// desired means stopped, anything else is still coming up.
    #[must_use]
    pub const fn server_status(self) -> ServerStatus {
        if self.ready > 0 {
            ServerStatus::Running
        } else if self.desired == 0 {
            ServerStatus::Stopped
        } else {
            ServerStatus::Creating
        }
    }
}

/// Health from replica readiness, demoted to error when any pod failed.
#[must_use]
pub fn derive_health(counts: ReplicaCounts, pods: &[Pod]) -> (HealthStatus, String, Vec<HealthCheck>) {
    let (mut status, mut message) = if counts.ready > 0 {
        (HealthStatus::Running, "server is running".to_string())
    } else if counts.desired == 0 {
        (HealthStatus::Stopped, "server is stopped".to_string())
    } else {
        (HealthStatus::Starting, "server is starting".to_string())
    };

    let failed = pods
        .iter()
        .filter(|p| {
            p.status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .is_some_and(|phase| phase == "Failed")
        })
        .count();
    if failed > 0 {
        status = HealthStatus::Error;
        message = format!("{failed} pod(s) failed");
    }

    let checks = vec![
        HealthCheck::new(
            "replicas",
            counts.desired == 0 || counts.ready >= counts.desired,
            format!("{}/{} ready", counts.ready, counts.desired),
        ),
        HealthCheck::new("pods", failed == 0, format!("{failed} failed of {}", pods.len())),
    ];
    (status, message, checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::ServerType;
    use k8s_openapi::api::apps::v1::DeploymentStatus;
    use k8s_openapi::api::core::v1::PodStatus;

    fn server() -> Server {
        Server::new("vpn-1", ServerType::Vpn, "us-east-1").unwrap()
    }

    fn pod(phase: &str) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: Some(phase.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn deployment_matches_workload_template() {
        let d = build_deployment(&server(), "silence/vpn-core:latest", "edge", &ProvisionOptions::default());
        assert_eq!(d.metadata.name.as_deref(), Some("vpn-1"));
        assert_eq!(d.metadata.namespace.as_deref(), Some("edge"));
        assert_eq!(d.metadata.labels.as_ref().unwrap()["managed"], "server-manager");

        let spec = d.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let pod = spec.template.spec.unwrap();
        let c = &pod.containers[0];
        assert_eq!(c.image.as_deref(), Some("silence/vpn-core:latest"));

        let ports = c.ports.as_ref().unwrap();
        assert_eq!(ports[0].container_port, 8080);
        assert_eq!(ports[1].container_port, 51820);
        assert_eq!(ports[1].protocol.as_deref(), Some("UDP"));

        let resources = c.resources.as_ref().unwrap();
        assert_eq!(resources.requests.as_ref().unwrap()["cpu"].0, "100m");
        assert_eq!(resources.limits.as_ref().unwrap()["memory"].0, "512Mi");

        let liveness = c.liveness_probe.as_ref().unwrap();
        assert_eq!(liveness.initial_delay_seconds, Some(30));
        assert_eq!(liveness.period_seconds, Some(10));
        let readiness = c.readiness_probe.as_ref().unwrap();
        assert_eq!(readiness.initial_delay_seconds, Some(5));

        let env = c.env.as_ref().unwrap();
        assert!(env.iter().any(|e| e.name == "SERVER_TYPE" && e.value.as_deref() == Some("vpn")));
    }

    #[test]
    fn service_is_load_balanced_on_both_ports() {
        let s = build_service(&server(), "edge").spec.unwrap();
        assert_eq!(s.type_.as_deref(), Some("LoadBalancer"));
        let ports = s.ports.unwrap();
        assert_eq!(ports[0].port, 80);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(8080)));
        assert_eq!(ports[1].port, 51820);
        assert_eq!(s.selector.unwrap()["app"], "vpn-1");
    }

    #[test]
    fn status_from_replica_counts() {
        let at = |desired, ready| ReplicaCounts { desired, ready }.server_status();
        assert_eq!(at(1, 1), ServerStatus::Running);
        assert_eq!(at(0, 0), ServerStatus::Stopped);
        assert_eq!(at(3, 0), ServerStatus::Creating);
    }

    #[test]
    fn counts_fall_back_to_observed_replicas() {
        let d = Deployment {
            status: Some(DeploymentStatus {
                replicas: Some(2),
                ready_replicas: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(ReplicaCounts::of(&d), ReplicaCounts { desired: 2, ready: 1 });
    }

    #[test]
    fn failed_pod_demotes_health() {
        let counts = ReplicaCounts { desired: 1, ready: 1 };
        let (status, _, _) = derive_health(counts, &[pod("Running")]);
        assert_eq!(status, HealthStatus::Running);

        let (status, message, checks) = derive_health(counts, &[pod("Running"), pod("Failed")]);
        assert_eq!(status, HealthStatus::Error);
        assert!(message.contains("1 pod(s) failed"));
        assert!(!checks[1].passed);
    }

    #[test]
    fn zero_desired_is_stopped() {
        let (status, _, checks) = derive_health(ReplicaCounts { desired: 0, ready: 0 }, &[]);
        assert_eq!(status, HealthStatus::Stopped);
        assert!(checks[0].passed);
    }
}
