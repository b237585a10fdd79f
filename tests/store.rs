use growth_planner::{
    assemble_plan, compute_simulation, Cadence, OperationPurpose, PlanInput, PlanStore,
    PlannerConfig, StrategyPlan,
};
use jiff::civil::date;
use jiff::Timestamp;

fn plan_at(created_at: &str) -> StrategyPlan {
    let input = PlanInput {
        current_followers: 500,
        target_followers: 560,
        operation_purpose: OperationPurpose::Acquisition,
        weekly_posts: Cadence::Weekly1To2,
        reel_capability: Cadence::None,
        story_frequency: Cadence::Daily,
        start_date: date(2025, 3, 3),
        target_audience: Some("地元の家族連れ".to_string()),
        posting_time: None,
    };
    let simulation = compute_simulation(&input, None).unwrap();
    let now: Timestamp = created_at.parse().unwrap();
    assemble_plan(&input, &simulation, None, &PlannerConfig::default(), now)
}

#[tokio::test]
async fn newest_plan_is_listed_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = PlanStore::load(dir.path().join("plans.json"), 20).await.unwrap();

    let older = plan_at("2025-03-01T00:00:00Z");
    let newer = plan_at("2025-03-02T00:00:00Z");
    store.save("alice", older.clone()).await.unwrap();
    store.save("alice", newer.clone()).await.unwrap();
    store.save("bob", plan_at("2025-03-03T00:00:00Z")).await.unwrap();

    let ids: Vec<String> = store.list("alice").await.into_iter().map(|plan| plan.id).collect();
    assert_eq!(ids, vec![newer.id.clone(), older.id.clone()]);
    assert_eq!(store.latest("alice").await.unwrap().id, newer.id);
    assert_eq!(store.get("alice", &older.id).await.unwrap(), older);
    assert!(store.get("bob", &older.id).await.is_none());
    assert_eq!(store.list("bob").await.len(), 1);
    assert!(store.latest("carol").await.is_none());
}

#[tokio::test]
async fn saving_the_same_id_replaces_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = PlanStore::load(dir.path().join("plans.json"), 20).await.unwrap();

    let plan = plan_at("2025-03-01T00:00:00Z");
    let other = plan_at("2025-03-02T00:00:00Z");
    store.save("alice", plan.clone()).await.unwrap();
    store.save("alice", other.clone()).await.unwrap();

    let mut edited = plan.clone();
    edited.features = vec!["手書きメモ".to_string()];
    store.save("alice", edited.clone()).await.unwrap();

    let plans = store.list("alice").await;
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0], edited);
    assert_eq!(plans[1].id, other.id);
}

#[tokio::test]
async fn per_user_history_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let store = PlanStore::load(dir.path().join("plans.json"), 2).await.unwrap();

    let first = plan_at("2025-03-01T00:00:00Z");
    let second = plan_at("2025-03-02T00:00:00Z");
    let third = plan_at("2025-03-03T00:00:00Z");
    store.save("bob", plan_at("2025-02-01T00:00:00Z")).await.unwrap();
    for plan in [&first, &second, &third] {
        store.save("alice", plan.clone()).await.unwrap();
    }

    let ids: Vec<String> = store.list("alice").await.into_iter().map(|plan| plan.id).collect();
    assert_eq!(ids, vec![third.id, second.id]);
    assert_eq!(store.list("bob").await.len(), 1);
}

#[tokio::test]
async fn delete_reports_whether_a_plan_was_removed() {
    let dir = tempfile::tempdir().unwrap();
    let store = PlanStore::load(dir.path().join("plans.json"), 20).await.unwrap();
    let plan = plan_at("2025-03-01T00:00:00Z");
    store.save("alice", plan.clone()).await.unwrap();

    assert!(!store.delete("bob", &plan.id).await.unwrap());
    assert!(store.delete("alice", &plan.id).await.unwrap());
    assert!(!store.delete("alice", &plan.id).await.unwrap());
    assert!(store.get("alice", &plan.id).await.is_none());
}

#[tokio::test]
async fn plans_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("plans.json");

    let plan = plan_at("2025-03-01T00:00:00Z");
    {
        let store = PlanStore::load(path.clone(), 20).await.unwrap();
        store.save("alice", plan.clone()).await.unwrap();
    }
    assert!(path.exists());

    let reloaded = PlanStore::load(path, 20).await.unwrap();
    let restored = reloaded.latest("alice").await.unwrap();
    assert_eq!(restored.id, plan.id);
    assert_eq!(restored.created_at, plan.created_at);
    assert_eq!(restored.input, plan.input);
    assert_eq!(restored.weekly_plans, plan.weekly_plans);
    assert_eq!(restored.schedule, plan.schedule);
}

#[tokio::test]
async fn empty_store_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");
    std::fs::write(&path, "  \n").unwrap();

    let store = PlanStore::load(path, 20).await.unwrap();
    assert!(store.list("alice").await.is_empty());
}

#[tokio::test]
async fn failed_save_leaves_memory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let store = PlanStore::load(blocker.join("plans.json"), 20).await.unwrap();
    let plan = plan_at("2025-03-01T00:00:00Z");

    assert!(store.save("alice", plan.clone()).await.is_err());
    assert!(store.list("alice").await.is_empty());
    assert!(store.get("alice", &plan.id).await.is_none());
}

#[tokio::test]
async fn failed_delete_keeps_the_plan() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    let store = PlanStore::load(nested.join("plans.json"), 20).await.unwrap();
    let plan = plan_at("2025-03-01T00:00:00Z");
    store.save("alice", plan.clone()).await.unwrap();

    std::fs::remove_dir_all(&nested).unwrap();
    std::fs::write(&nested, "not a directory").unwrap();

    assert!(store.delete("alice", &plan.id).await.is_err());
    assert_eq!(store.get("alice", &plan.id).await.unwrap().id, plan.id);
}
