#[cfg(test)]
mod tests {
    use crate::model::{InstanceStatus, Reconciled, WorkerStatus};

    #[test]
    fn test_reconcile_known_statuses() {
        assert_eq!(InstanceStatus::reconcile("running"), Reconciled::Keep(InstanceStatus::Running));
        assert_eq!(InstanceStatus::reconcile("standby"), Reconciled::Keep(InstanceStatus::Standby));
        assert_eq!(InstanceStatus::reconcile("paused"), Reconciled::Keep(InstanceStatus::Paused));
        assert_eq!(
            InstanceStatus::reconcile("checkpointed"),
            Reconciled::Keep(InstanceStatus::Checkpointed)
        );
    }

    #[test]
    fn test_reconcile_is_case_and_whitespace_insensitive() {
        assert_eq!(InstanceStatus::reconcile(" Running\n"), Reconciled::Keep(InstanceStatus::Running));
    }

    #[test]
    fn test_reconcile_terminal_statuses_drop_instance() {
        assert_eq!(InstanceStatus::reconcile("exited"), Reconciled::Drop);
        assert_eq!(InstanceStatus::reconcile("stopped"), Reconciled::Drop);
    }

    #[test]
    fn test_reconcile_unknown_status_is_isolated() {
        assert_eq!(
            InstanceStatus::reconcile("restoring"),
            Reconciled::Unknown("restoring".to_string())
        );
        assert_eq!(InstanceStatus::reconcile(""), Reconciled::Unknown(String::new()));
    }

    #[test]
    fn test_primed_statuses() {
        assert!(InstanceStatus::Standby.is_primed());
        assert!(InstanceStatus::Checkpointed.is_primed());
        assert!(!InstanceStatus::Running.is_primed());
        assert!(!InstanceStatus::Paused.is_primed());
    }

    #[test]
    fn test_status_serialization_is_lowercase() {
        assert_eq!(serde_json::to_string(&WorkerStatus::Down).unwrap(), "\"down\"");
        assert_eq!(serde_json::to_string(&InstanceStatus::Checkpointed).unwrap(), "\"checkpointed\"");
    }
}
