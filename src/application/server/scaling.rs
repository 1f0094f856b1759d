//! Scaling policy pass-through. Evaluating policies against live metrics is
//! left to an external autoscaler.

use std::sync::Arc;

use tracing::{debug, info};

use super::ServerService;
use crate::domain::id::RecordId;
use crate::domain::policy::ScalingPolicy;
use crate::error::{Error, Result};
use crate::port::outbound::repository::ScalingRepository;

impl ServerService {
    fn scaling_repo(&self) -> Result<&Arc<dyn ScalingRepository>> {
        self.scaling
            .as_ref()
            .ok_or(Error::Unconfigured("scaling repository"))
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` without a scaling repository.
    pub async fn list_scaling_policies(&self) -> Result<Vec<ScalingPolicy>> {
        self.scaling_repo()?.list_policies().await
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or `NotFound`.
    pub async fn get_scaling_policy(&self, id: &RecordId) -> Result<ScalingPolicy> {
        self.scaling_repo()?
            .get_policy(id)
            .await?
            .ok_or_else(|| Error::not_found("scaling policy", id.as_str()))
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or a validation error.
    pub async fn create_scaling_policy(&self, policy: ScalingPolicy) -> Result<ScalingPolicy> {
        let repo = self.scaling_repo()?;
        policy.validate()?;
        repo.save_policy(&policy).await?;
        info!(policy_id = %policy.id, name = %policy.name, "Scaling policy created");
        Ok(policy)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured`, a validation error, or `NotFound`.
    pub async fn update_scaling_policy(&self, policy: ScalingPolicy) -> Result<ScalingPolicy> {
        let repo = self.scaling_repo()?;
        policy.validate()?;
        repo.update_policy(&policy).await?;
        Ok(policy)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or `NotFound`.
    pub async fn delete_scaling_policy(&self, id: &RecordId) -> Result<()> {
        self.scaling_repo()?.delete_policy(id).await
    }

    /// Count the enabled policies an autoscaler would consider.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured` without a scaling repository.
    pub async fn evaluate_scaling(&self) -> Result<usize> {
        let policies = self.scaling_repo()?.list_policies().await?;
        let enabled: Vec<_> = policies.iter().filter(|p| p.enabled).collect();
        for policy in &enabled {
            debug!(
                policy = %policy.name,
                min = policy.min_replicas,
                max = policy.max_replicas,
                cpu_threshold = policy.cpu_threshold,
                "Scaling policy considered"
            );
        }
        Ok(enabled.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::adapter::outbound::memory::{MemoryScalingRepository, MemoryServerRepository};
    use crate::application::server::ServerService;
    use crate::domain::id::RecordId;
    use crate::domain::policy::ScalingPolicy;
    use crate::error::ErrorKind;
    use crate::testkit::orchestrator::ScriptedOrchestrator;

    fn policy(name: &str, enabled: bool) -> ScalingPolicy {
        ScalingPolicy {
            id: RecordId::generate(),
            name: name.to_string(),
            min_replicas: 1,
            max_replicas: 4,
            cpu_threshold: 75.0,
            memory_threshold: 80.0,
            scale_up_cooldown_secs: 60,
            scale_down_cooldown_secs: 300,
            enabled,
        }
    }

    fn service() -> ServerService {
        ServerService::new(
            Arc::new(MemoryServerRepository::new()),
            Arc::new(ScriptedOrchestrator::new()),
        )
    }

    #[tokio::test]
    async fn policies_require_a_repository() {
        let err = service().list_scaling_policies().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconfigured);
    }

    #[tokio::test]
    async fn policy_crud_and_evaluation() {
        let service = service().with_scaling_repo(Arc::new(MemoryScalingRepository::new()));
        let mut busy = service
            .create_scaling_policy(policy("busy", true))
            .await
            .unwrap();
        service
            .create_scaling_policy(policy("idle", false))
            .await
            .unwrap();
        assert_eq!(service.evaluate_scaling().await.unwrap(), 1);

        busy.max_replicas = 0;
        let err = service.update_scaling_policy(busy.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        service.delete_scaling_policy(&busy.id).await.unwrap();
        assert!(service.get_scaling_policy(&busy.id).await.unwrap_err().is_not_found());
        assert_eq!(service.list_scaling_policies().await.unwrap().len(), 1);
    }
}
