//! The periodic pull -> correlate -> project cycle.
//!
//! Each run computes the notification window from the tracked repositories'
//! own bookkeeping, pulls the window from the scanning service, resolves and
//! projects every notification, and stamps the repositories up to date. A
//! failed pull marks the affected repositories out of date and ends the
//! cycle; per-notification failures never do.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use quayguard_core::properties::{GatePropertyService, InspectionStatus, UpdateStatus};
use quayguard_core::repo::ArtifactPath;

use crate::client::ScanServiceClient;
use crate::notifications::{NotificationProcessor, RepositoryProjectLookup};
use crate::projection::NotificationProjection;

/// What one update cycle accomplished.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Repositories whose window participated in the pull.
    pub repos_considered: usize,
    /// Resolved policy records projected.
    pub policy_records: usize,
    /// Resolved vulnerability records projected.
    pub vulnerability_records: usize,
    /// Artifact property sets written.
    pub artifacts_updated: usize,
}

pub struct MetadataUpdateService {
    client: Arc<dyn ScanServiceClient>,
    service: GatePropertyService,
    processor: NotificationProcessor,
    projection: NotificationProjection,
    tracked_repos: Vec<String>,
}

impl MetadataUpdateService {
    pub fn new(
        client: Arc<dyn ScanServiceClient>,
        service: GatePropertyService,
        tracked_repos: Vec<String>,
    ) -> Self {
        Self {
            processor: NotificationProcessor::new(client.clone()),
            projection: NotificationProjection::new(service.clone(), tracked_repos.clone()),
            client,
            service,
            tracked_repos,
        }
    }

    /// Run one cycle over the tracked repositories.
    pub async fn run(&self) -> UpdateOutcome {
        let now = Utc::now();
        let mut outcome = UpdateOutcome::default();

        let (active_roots, window_start) = self.collect_window(now);
        if active_roots.is_empty() {
            debug!("no repository is ready for a notification update");
            return outcome;
        }
        outcome.repos_considered = active_roots.len();

        let repo_keys: Vec<String> = active_roots
            .iter()
            .map(|root| root.repo_key().to_string())
            .collect();
        let lookup = RepositoryProjectLookup::from_properties(&self.service, &repo_keys);

        let policy_notifications = match self
            .client
            .fetch_policy_notifications(window_start, now)
            .await
        {
            Ok(notifications) => notifications,
            Err(err) => return self.mark_out_of_date(&active_roots, &err, outcome),
        };
        let vulnerability_notifications = match self
            .client
            .fetch_vulnerability_notifications(window_start, now)
            .await
        {
            Ok(notifications) => notifications,
            Err(err) => return self.mark_out_of_date(&active_roots, &err, outcome),
        };

        let latest_notification = policy_notifications
            .latest_created_at()
            .into_iter()
            .chain(
                vulnerability_notifications
                    .iter()
                    .map(|notification| notification.created_at),
            )
            .max()
            .unwrap_or(window_start);

        let resolved_policy = self
            .processor
            .process_policy_notifications(&policy_notifications, &lookup)
            .await;
        let resolved_vulnerabilities = self
            .processor
            .process_vulnerability_notifications(&vulnerability_notifications, &lookup)
            .await;

        outcome.policy_records = resolved_policy.len();
        outcome.vulnerability_records = resolved_vulnerabilities.len();
        for resolved in &resolved_policy {
            outcome.artifacts_updated += self.projection.apply_policy(resolved);
        }
        for resolved in &resolved_vulnerabilities {
            outcome.artifacts_updated += self.projection.apply_vulnerability(resolved);
        }

        for root in &active_roots {
            if self
                .service
                .assert_inspection_status(root, InspectionStatus::Success)
            {
                self.service.set_update_status(root, UpdateStatus::UpToDate);
                self.service
                    .set_inspection_status(root, InspectionStatus::Success, None, None);
                // Do not skip ahead past notifications that arrived during
                // the cycle: the stamp is the newest notification seen, not
                // `now`.
                self.service.set_last_update(root, latest_notification);
            }
        }

        info!(
            repos = outcome.repos_considered,
            policy_records = outcome.policy_records,
            vulnerability_records = outcome.vulnerability_records,
            artifacts = outcome.artifacts_updated,
            "notification update cycle complete"
        );
        outcome
    }

    /// Determine which repositories participate and the earliest timestamp
    /// any of them last saw. Repositories without any timestamp cannot be
    /// windowed and have their inspection failed for re-initialization.
    fn collect_window(&self, now: DateTime<Utc>) -> (Vec<ArtifactPath>, DateTime<Utc>) {
        let mut window_start = now;
        let mut active_roots = Vec::new();

        for repo_key in &self.tracked_repos {
            let root = ArtifactPath::repo_root(repo_key);
            let initialized = self
                .service
                .assert_inspection_status(&root, InspectionStatus::Success)
                || self
                    .service
                    .assert_inspection_status(&root, InspectionStatus::Pending);
            if !initialized {
                debug!(repo = %repo_key, "repository not initialized, skipping update");
                continue;
            }

            let last_seen = self
                .service
                .last_update(&root)
                .or_else(|| self.service.last_inspection(&root));
            match last_seen {
                Some(timestamp) => {
                    if timestamp < window_start {
                        window_start = timestamp;
                    }
                    active_roots.push(root);
                }
                None => {
                    let message = format!(
                        "could not find a timestamp property on {repo_key}; the repository requires re-inspection"
                    );
                    debug!(repo = %repo_key, "{message}");
                    self.service.fail_inspection(&root, &message);
                }
            }
        }

        (active_roots, window_start)
    }

    fn mark_out_of_date(
        &self,
        active_roots: &[ArtifactPath],
        err: &crate::error::IntelError,
        outcome: UpdateOutcome,
    ) -> UpdateOutcome {
        error!(%err, "notification pull failed, marking repositories out of date");
        for root in active_roots {
            self.service.set_update_status(root, UpdateStatus::OutOfDate);
        }
        outcome
    }
}
