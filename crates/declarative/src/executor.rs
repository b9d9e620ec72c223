//! Convergence engine - evaluates resources in order and propagates
//! notifications

use crate::context::{ApplyContext, Host, NoProgress, ProgressCallback};
use crate::diff::ResourceDiff;
use crate::error::{Error, Result};
use crate::guard::{PlatformFacts, Support};
use crate::notify::NotificationQueue;
use crate::planner::ResourceCollection;
use crate::resource::{Resource, ResourceExt};
use crate::types::{
    ActionPlan, ExecuteOptions, NotificationReport, NotifyAction, Outcome, PlanStep,
    ResourceReport, Timing,
};

/// Converge a collection of resources on a host
///
/// Resources are evaluated strictly in declaration order. A resource whose
/// observed state already matches its desired state is a no-op and fires
/// no notifications. Immediate notifications run before the next resource
/// is evaluated; deferred ones run once each, after every resource, in the
/// order first scheduled.
///
/// With `opts.dry_run` nothing is mutated and the returned plan describes
/// what a real run would do.
///
/// # Errors
///
/// - `Error::UnsupportedPlatform` before anything is probed, when the
///   platform is unsupported and support is required
/// - a validation error when the collection is inconsistent
/// - `Error::Collaborator` at the first failing probe, apply or notify call;
///   resources applied before the failure are left in place
pub fn converge<P: ProgressCallback>(
    collection: &ResourceCollection,
    facts: &PlatformFacts,
    host: &dyn Host,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ActionPlan> {
    if let Support::NotApplicable { reason } = collection.policy().check(facts)? {
        log::info!("Skipping run: {reason}");
        return Ok(ActionPlan::not_applicable(opts.dry_run, reason));
    }

    collection.validate()?;

    let ctx = ApplyContext::new(facts, host)
        .with_dry_run(opts.dry_run)
        .with_verbose(opts.verbose);

    let mut run = Run {
        collection,
        ctx: &ctx,
        plan: ActionPlan::new(opts.dry_run),
        queue: NotificationQueue::new(),
        progress,
    };

    for resource in collection.resources() {
        run.converge_resource(resource.as_ref())?;
    }

    for pending in run.queue.drain() {
        run.fire(&pending.source, &pending.target, pending.action, Timing::Deferred)?;
    }

    Ok(run.plan)
}

/// Simple convergence without progress reporting
pub fn converge_simple(
    collection: &ResourceCollection,
    facts: &PlatformFacts,
    host: &dyn Host,
    opts: &ExecuteOptions,
) -> Result<ActionPlan> {
    converge(collection, facts, host, opts, &mut NoProgress)
}

/// State of one convergence run
struct Run<'a, P> {
    collection: &'a ResourceCollection,
    ctx: &'a ApplyContext<'a>,
    plan: ActionPlan,
    queue: NotificationQueue,
    progress: &'a mut P,
}

impl<P: ProgressCallback> Run<'_, P> {
    fn converge_resource(&mut self, resource: &dyn Resource) -> Result<()> {
        let id = resource.id();
        self.progress.on_resource_start(&id, &resource.description());

        let report = evaluate(resource, self.ctx)?;
        self.progress.on_resource_complete(&report);
        let changed = report.outcome.is_change();
        self.plan.steps.push(PlanStep::Resource(report));

        if !changed {
            return Ok(());
        }

        let collection = self.collection;
        for edge in collection.edges_from(&id) {
            match edge.timing {
                Timing::Immediate => self.fire(&id, &edge.target, edge.action, Timing::Immediate)?,
                Timing::Deferred => {
                    if !self.queue.schedule(&id, &edge.target, edge.action) {
                        log::debug!(
                            "{} {} already scheduled, collapsing notification from {id}",
                            edge.target,
                            edge.action
                        );
                    }
                }
            }
        }

        Ok(())
    }

    fn fire(&mut self, source: &str, target_id: &str, action: NotifyAction, timing: Timing) -> Result<()> {
        let target = self
            .collection
            .find(target_id)
            .ok_or_else(|| Error::UnknownNotificationTarget {
                notifier: source.to_string(),
                target: target_id.to_string(),
            })?;

        if !target.applies_to(self.ctx.facts) {
            log::debug!("{target_id} not applicable here, dropping {action} from {source}");
            return Ok(());
        }

        log::debug!("{source} triggers {action} on {target_id} ({timing})");
        if !self.ctx.dry_run {
            target
                .notify(action, self.ctx)
                .map_err(|e| Error::collaborator(target_id, e))?;
        }

        self.progress.on_notification(target_id, action, timing);
        self.plan
            .steps
            .push(PlanStep::Notification(NotificationReport {
                source: source.to_string(),
                target: target_id.to_string(),
                action,
                timing,
            }));
        Ok(())
    }
}

/// Take one resource to a terminal state
fn evaluate(resource: &dyn Resource, ctx: &ApplyContext) -> Result<ResourceReport> {
    let id = resource.id();
    let report = |outcome, diff: Option<ResourceDiff>| {
        let (current, desired) = match diff {
            Some(d) => (Some(d.current), Some(d.desired)),
            None => (None, None),
        };
        ResourceReport {
            id: id.clone(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            outcome,
            current,
            desired,
        }
    };

    if !resource.applies_to(ctx.facts) {
        return Ok(report(
            Outcome::Skipped {
                reason: format!("guard: {}", resource.guard()),
            },
            None,
        ));
    }

    if resource.is_passive() {
        return Ok(report(
            Outcome::Skipped {
                reason: "only runs when notified".to_string(),
            },
            None,
        ));
    }

    let diff = ResourceDiff::evaluate(resource, ctx).map_err(|e| Error::collaborator(&id, e))?;

    let Some(change) = diff.change() else {
        return Ok(report(Outcome::NoOp, Some(diff)));
    };

    if !ctx.dry_run {
        resource
            .apply(change, ctx)
            .map_err(|e| Error::collaborator(&id, e))?;
    }

    Ok(report(Outcome::Applied { change }, Some(diff)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileAttrs;
    use crate::guard::{Guard, SupportPolicy};
    use crate::testing::{FakeCommand, FakeDirectory, FakeHost, FakeService, FakeTemplate};
    use crate::types::ChangeKind;

    fn ubuntu() -> PlatformFacts {
        PlatformFacts::new("ubuntu", "debian")
    }

    fn opts() -> ExecuteOptions {
        ExecuteOptions::default()
    }

    /// directory /etc/sup, template /etc/sup/conf (port=9001), service
    /// subscribing to the template with an immediate reload
    fn scenario() -> ResourceCollection {
        let mut collection = ResourceCollection::with_policy(SupportPolicy::new(
            &["debian", "ubuntu", "smartos"],
            true,
        ));
        collection.add(FakeDirectory::new("/etc/sup", 0o755));
        let conf = collection.add(FakeTemplate::new("/etc/sup/conf", "sup.conf").var("port", "9001"));
        let service = collection.add(FakeService::new("sup"));
        collection.subscribes(&service, &conf, NotifyAction::Reload, Timing::Immediate);
        collection
    }

    fn step_names(plan: &ActionPlan) -> Vec<String> {
        plan.steps
            .iter()
            .map(|step| match step {
                PlanStep::Resource(r) => match &r.outcome {
                    Outcome::Applied { change } => format!("{change} {}", r.id),
                    Outcome::NoOp => format!("noop {}", r.id),
                    Outcome::Skipped { .. } => format!("skip {}", r.id),
                },
                PlanStep::Notification(n) => format!("{} {}", n.action, n.target),
            })
            .collect()
    }

    #[test]
    fn test_scenario_creates_then_reloads() {
        let host = FakeHost::new().with_service("sup", true, true);
        let plan = converge_simple(&scenario(), &ubuntu(), &host, &opts()).unwrap();

        assert_eq!(
            step_names(&plan),
            vec![
                "create directory[/etc/sup]",
                "create template[/etc/sup/conf]",
                "reload service[sup]",
                "noop service[sup]",
            ]
        );
        assert_eq!(
            host.calls(),
            vec![
                "create_directory /etc/sup",
                "render /etc/sup/conf",
                "reload sup",
            ]
        );
        assert_eq!(
            host.file_content("/etc/sup/conf").as_deref(),
            Some("# sup.conf\nport=9001\n")
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let host = FakeHost::new();
        let collection = scenario();

        let first = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();
        assert!(!first.is_noop());

        host.clear_calls();
        let second = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();

        assert!(second.is_noop());
        assert_eq!(second.notifications().count(), 0);
        assert!(second.resources().all(|r| r.outcome == Outcome::NoOp));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_unsupported_platform_skipped_when_not_required() {
        let mut collection = ResourceCollection::with_policy(SupportPolicy::new(&["debian"], false));
        collection.add(FakeDirectory::new("/etc/sup", 0o755));
        let host = FakeHost::new();

        let plan =
            converge_simple(&collection, &PlatformFacts::new("centos", "rhel"), &host, &opts())
                .unwrap();

        assert!(plan.is_not_applicable());
        assert!(plan.steps.is_empty());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_unsupported_platform_fatal_when_required() {
        let host = FakeHost::new();
        let err = converge_simple(
            &scenario(),
            &PlatformFacts::new("arch", "arch"),
            &host,
            &opts(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::UnsupportedPlatform { ref platform, .. } if platform == "arch"));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_immediate_notification_runs_before_next_resource() {
        let mut collection = ResourceCollection::new();
        let conf = collection.add(FakeTemplate::new("/etc/a.conf", "a"));
        let service = collection.add(FakeService::new("a"));
        collection.add(FakeDirectory::new("/var/log/a", 0o755));
        collection.notifies(&conf, &service, NotifyAction::Restart, Timing::Immediate);

        let host = FakeHost::new().with_service("a", true, true);
        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();

        assert_eq!(
            step_names(&plan),
            vec![
                "create template[/etc/a.conf]",
                "restart service[a]",
                "noop service[a]",
                "create directory[/var/log/a]",
            ]
        );
        assert_eq!(
            host.calls(),
            vec!["render /etc/a.conf", "restart a", "create_directory /var/log/a"]
        );
    }

    #[test]
    fn test_deferred_notifications_collapse_to_one() {
        let mut collection = ResourceCollection::new();
        let a = collection.add(FakeTemplate::new("/etc/a.conf", "a"));
        let b = collection.add(FakeTemplate::new("/etc/b.conf", "b"));
        let service = collection.add(FakeService::new("sup"));
        collection.add(FakeDirectory::new("/var/log/sup", 0o755));
        collection.notifies(&a, &service, NotifyAction::Restart, Timing::Deferred);
        collection.notifies(&b, &service, NotifyAction::Restart, Timing::Deferred);

        let host = FakeHost::new().with_service("sup", true, true);
        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();

        let deferred: Vec<_> = plan.deferred_notifications().collect();
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].target, "service[sup]");
        assert_eq!(deferred[0].source, "template[/etc/a.conf]");
        // fires after every resource
        assert_eq!(step_names(&plan).last().map(String::as_str), Some("restart service[sup]"));
        assert_eq!(
            host.calls().iter().filter(|c| *c == "restart sup").count(),
            1
        );
    }

    #[test]
    fn test_unchanged_source_does_not_notify() {
        let host = FakeHost::new()
            .with_directory("/etc/sup", FileAttrs::root(0o755))
            .with_service("sup", true, true);
        let mut collection = ResourceCollection::new();
        let dir = collection.add(FakeDirectory::new("/etc/sup", 0o755));
        let service = collection.add(FakeService::new("sup"));
        collection.notifies(&dir, &service, NotifyAction::Reload, Timing::Immediate);

        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();
        assert!(plan.is_noop());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_guarded_resource_is_skipped_without_notifications() {
        let mut collection = ResourceCollection::new();
        let dir = collection.add(FakeDirectory::new("/etc/default/sup", 0o755).only_if(Guard::family("rhel")));
        let service = collection.add(FakeService::new("sup"));
        collection.notifies(&dir, &service, NotifyAction::Reload, Timing::Immediate);

        let host = FakeHost::new().with_service("sup", true, true);
        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();

        let report = plan.report("directory[/etc/default/sup]").unwrap();
        assert!(matches!(report.outcome, Outcome::Skipped { .. }));
        assert!(report.current.is_none());
        assert_eq!(plan.notifications().count(), 0);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_update_of_existing_resource() {
        let host = FakeHost::new().with_directory("/etc/sup", FileAttrs::root(0o700));
        let mut collection = ResourceCollection::new();
        collection.add(FakeDirectory::new("/etc/sup", 0o755));

        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();
        let report = plan.report("directory[/etc/sup]").unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Applied {
                change: ChangeKind::Update
            }
        );
        assert_eq!(host.calls(), vec!["set_attributes /etc/sup"]);
        assert_eq!(host.attrs("/etc/sup").unwrap().mode, 0o755);
    }

    #[test]
    fn test_collaborator_failure_aborts_without_rollback() {
        let host = FakeHost::new().with_service("sup", true, true);
        host.fail_on("render /etc/sup/conf");

        let err = converge_simple(&scenario(), &ubuntu(), &host, &opts()).unwrap_err();

        assert!(matches!(err, Error::Collaborator { ref resource, .. } if resource == "template[/etc/sup/conf]"));
        // the directory created before the failure stays, nothing after it ran
        assert_eq!(host.calls(), vec!["create_directory /etc/sup"]);
        assert!(host.attrs("/etc/sup").is_some());
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let host = FakeHost::new().with_service("sup", true, true);
        let opts = ExecuteOptions {
            dry_run: true,
            verbose: false,
        };

        let plan = converge_simple(&scenario(), &ubuntu(), &host, &opts).unwrap();

        assert!(plan.dry_run);
        assert_eq!(plan.changed().len(), 2);
        assert_eq!(plan.notifications().count(), 1);
        assert!(host.calls().is_empty());
        assert!(host.attrs("/etc/sup").is_none());
    }

    #[test]
    fn test_passive_resource_runs_only_when_notified() {
        let mut collection = ResourceCollection::new();
        let manifest = collection.add(FakeTemplate::new("/opt/smf/manifest.xml", "manifest.xml"));
        let import = collection.add(FakeCommand::new("svccfg-import", "svccfg import /opt/smf/manifest.xml"));
        collection.notifies(&manifest, &import, NotifyAction::Run, Timing::Immediate);

        let host = FakeHost::new();
        let plan = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();

        assert_eq!(
            step_names(&plan),
            vec![
                "create template[/opt/smf/manifest.xml]",
                "run execute[svccfg-import]",
                "skip execute[svccfg-import]",
            ]
        );
        assert_eq!(
            host.calls(),
            vec![
                "render /opt/smf/manifest.xml",
                "run svccfg import /opt/smf/manifest.xml",
            ]
        );

        host.clear_calls();
        let again = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap();
        assert!(again.is_noop());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_invalid_collection_fails_before_any_change() {
        let mut collection = ResourceCollection::new();
        let dir = collection.add(FakeDirectory::new("/etc/sup", 0o755));
        collection.notifies(&dir, "service[ghost]", NotifyAction::Reload, Timing::Immediate);

        let host = FakeHost::new();
        let err = converge_simple(&collection, &ubuntu(), &host, &opts()).unwrap_err();
        assert!(matches!(err, Error::UnknownNotificationTarget { .. }));
        assert!(host.calls().is_empty());
    }
}
