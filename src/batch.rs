//! Sequential batch execution.
//!
//! Entities are visited in listing order. Each one is classified exactly
//! once: skipped when the filters exclude it, otherwise handed to the
//! [`Performer`] for a single attempt whose outcome is final.

use anyhow::Result;

use crate::{entity::Entity, filter::FilterSet, runlog::RunLog};

/// The per-entity operation of a batch (one export, one import, ...).
#[allow(async_fn_in_trait)]
pub trait Performer {
    /// Verb used in transcripts, e.g. "export"
    fn verb(&self) -> &'static str;

    /// Run the operation once for `entity`. `Err` marks the entity failed.
    async fn perform(&mut self, entity: &Entity, log: &mut RunLog) -> Result<()>;
}

/// Tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Entities the filters let through
    pub fn matched(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Run `performer` over every matching entity.
///
/// A failure is recorded and the batch moves on; nothing is retried.
pub async fn run_batch<P: Performer>(
    entities: &[Entity],
    filters: &FilterSet,
    performer: &mut P,
    log: &mut RunLog,
) -> BatchResult {
    let mut result = BatchResult::default();
    let total = entities.len();

    for (index, entity) in entities.iter().enumerate() {
        let position = format!("[{}/{}]", index + 1, total);
        if !filters.matches(entity) {
            log.line(&format!("{position} skip {entity}"));
            result.skipped += 1;
            continue;
        }

        log.line(&format!("{position} {} {entity}", performer.verb()));
        match performer.perform(entity, log).await {
            Ok(()) => {
                log.line(&format!("{position} ok {entity}"));
                result.succeeded += 1;
            }
            Err(e) => {
                log.line(&format!("{position} FAILED {entity}: {e:#}"));
                tracing::debug!(entity = %entity, error = ?e, "per-entity operation failed");
                result.failed += 1;
            }
        }
    }

    result
}

/// Dry-run classification of one entity
#[derive(Debug, Clone, Copy)]
pub struct PlanEntry<'a> {
    pub entity: &'a Entity,
    pub included: bool,
}

/// What a real run would do, computed without touching anything.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    pub entries: Vec<PlanEntry<'a>>,
}

impl Plan<'_> {
    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|e| e.included).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.len() - self.matched()
    }
}

pub fn plan<'a>(entities: &'a [Entity], filters: &FilterSet) -> Plan<'a> {
    Plan {
        entries: entities
            .iter()
            .map(|entity| PlanEntry {
                entity,
                included: filters.matches(entity),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Records every call and fails for the named entities
    struct Recorder {
        calls: Vec<String>,
        fail: Vec<&'static str>,
    }

    impl Performer for Recorder {
        fn verb(&self) -> &'static str {
            "export"
        }

        async fn perform(&mut self, entity: &Entity, _log: &mut RunLog) -> Result<()> {
            self.calls.push(entity.name.clone());
            if self.fail.contains(&entity.name.as_str()) {
                Err(anyhow!("apictl exited with status 1"))
            } else {
                Ok(())
            }
        }
    }

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("A", "1.0", "p1", "PUBLISHED"),
            Entity::new("B", "2.0", "p2", "CREATED"),
            Entity::new("C", "1.0", "p1", "PUBLISHED"),
        ]
    }

    #[tokio::test]
    async fn test_skipped_entities_are_never_performed() {
        let filters = FilterSet::from_args(&[], &[], None, Some("PUBLISHED")).unwrap();
        let mut recorder = Recorder { calls: vec![], fail: vec![] };
        let mut log = RunLog::console();

        let result = run_batch(&entities(), &filters, &mut recorder, &mut log).await;

        assert_eq!(recorder.calls, vec!["A", "C"]);
        assert_eq!(
            result,
            BatchResult {
                succeeded: 2,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let mut recorder = Recorder { calls: vec![], fail: vec!["A"] };
        let mut log = RunLog::console();

        let result = run_batch(&entities(), &FilterSet::default(), &mut recorder, &mut log).await;

        assert_eq!(recorder.calls, vec!["A", "B", "C"]);
        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.total(), 3);
    }

    #[tokio::test]
    async fn test_each_entity_performed_once_in_listing_order() {
        let mut list = entities();
        list.push(Entity::new("A", "1.0", "p1", "PUBLISHED"));
        let mut recorder = Recorder { calls: vec![], fail: vec![] };
        let mut log = RunLog::console();

        let result = run_batch(&list, &FilterSet::default(), &mut recorder, &mut log).await;

        assert_eq!(recorder.calls, vec!["A", "B", "C", "A"]);
        assert_eq!(result.total(), list.len());
    }

    #[test]
    fn test_plan_counts() {
        let list = entities();
        let filters = FilterSet::from_args(&["A*".to_string()], &[], None, None).unwrap();
        let plan = plan(&list, &filters);
        assert_eq!(plan.matched(), 1);
        assert_eq!(plan.skipped(), 2);
        assert!(plan.entries[0].included);
        assert_eq!(plan.entries[1].entity.name, "B");
    }
}
