use anyhow::{anyhow, Result};
use apim_bulk::{
    batch::{plan, run_batch, BatchResult, Performer},
    entity::Entity,
    filter::FilterSet,
    runlog::RunLog,
    summary::{report, RunOutcome},
};

struct Scripted {
    fail: Vec<String>,
    performed: usize,
}

impl Scripted {
    fn succeeding() -> Self {
        Scripted {
            fail: vec![],
            performed: 0,
        }
    }
}

impl Performer for Scripted {
    fn verb(&self) -> &'static str {
        "export"
    }

    async fn perform(&mut self, entity: &Entity, _log: &mut RunLog) -> Result<()> {
        self.performed += 1;
        if self.fail.contains(&entity.name) {
            return Err(anyhow!("exit status: 1"));
        }
        Ok(())
    }
}

fn two_apis() -> Vec<Entity> {
    vec![
        Entity::new("A", "1.0", "p1", "PUBLISHED"),
        Entity::new("B", "2.0", "p2", "CREATED"),
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_status_filter_exports_published_only() {
    let filters = FilterSet::from_args(&[], &[], None, Some("PUBLISHED")).unwrap();
    let mut performer = Scripted::succeeding();
    let mut log = RunLog::console();

    let result = run_batch(&two_apis(), &filters, &mut performer, &mut log).await;

    assert_eq!(
        result,
        BatchResult {
            succeeded: 1,
            failed: 0,
            skipped: 1
        }
    );
    assert_eq!(report(&result, "export", &mut log), RunOutcome::Completed);
}

#[tokio::test]
async fn test_pattern_matching_nothing_is_a_zero_match_error() {
    let filters = FilterSet::from_args(&strings(&["C*"]), &[], None, None).unwrap();
    let mut performer = Scripted::succeeding();
    let mut log = RunLog::console();

    let result = run_batch(&two_apis(), &filters, &mut performer, &mut log).await;

    assert_eq!(performer.performed, 0);
    assert_eq!(result.skipped, 2);
    let outcome = report(&result, "export", &mut log);
    assert_eq!(outcome, RunOutcome::NoMatch);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_partial_failure_keeps_counts() {
    let mut performer = Scripted {
        fail: strings(&["A"]),
        performed: 0,
    };
    let mut log = RunLog::console();

    let result = run_batch(&two_apis(), &FilterSet::default(), &mut performer, &mut log).await;

    assert_eq!(performer.performed, 2);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed, 1);
    assert_eq!(RunOutcome::classify(&result), RunOutcome::PartialFailure);
}

#[tokio::test]
async fn test_counters_always_cover_every_entity() {
    let entities: Vec<Entity> = (0..25)
        .map(|i| {
            let status = if i % 3 == 0 { "PUBLISHED" } else { "CREATED" };
            Entity::new(&format!("Api{i}"), "1.0", "admin", status)
        })
        .collect();
    let filters = FilterSet::from_args(&strings(&["Api1*", "Api2?"]), &[], Some("admin"), None).unwrap();
    let mut performer = Scripted {
        fail: strings(&["Api12", "Api21"]),
        performed: 0,
    };
    let mut log = RunLog::console();

    let result = run_batch(&entities, &filters, &mut performer, &mut log).await;

    assert_eq!(result.total(), entities.len());
    assert_eq!(result.matched(), performer.performed);
    assert_eq!(result.failed, 2);
}

#[test]
fn test_selector_with_mismatched_provider_filter_is_excluded() {
    let filters = FilterSet::from_args(&[], &strings(&["A:1.0"]), Some("p9"), None).unwrap();
    let entities = vec![Entity::new("A", "1.0", "p1", "PUBLISHED")];

    let plan = plan(&entities, &filters);

    assert_eq!(plan.matched(), 0);
    assert_eq!(plan.skipped(), 1);
}

#[test]
fn test_dry_run_plan_never_performs() {
    let filters = FilterSet::from_args(&[], &[], None, Some("PUBLISHED")).unwrap();
    let entities = two_apis();

    let plan = plan(&entities, &filters);

    assert_eq!(plan.matched(), 1);
    assert_eq!(plan.skipped(), 1);
    assert_eq!(plan.entries[0].entity.name, "A");
    assert!(plan.entries[0].included);
    assert!(!plan.entries[1].included);
}
