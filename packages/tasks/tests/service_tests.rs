// ABOUTME: Integration tests for single-task operations and admin views
// ABOUTME: Assignment rules, visibility per user type, filters, statistics and upload batches

mod common;

use chrono::{TimeZone, Utc};
use common::fixture;
use pretty_assertions::assert_eq;
use tasklane_agents::UserType;
use tasklane_tasks::{
    AdminTaskQuery, BatchQuery, NewTask, TaskError, TaskPriority, TaskQuery, TaskStatus,
    TaskUpdateInput,
};

fn new_task(title: &str, assigned_to: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: String::new(),
        assigned_to: assigned_to.to_string(),
        priority: TaskPriority::High,
        due_date: None,
    }
}

#[tokio::test]
async fn test_agent_assigns_to_own_active_sub_agent_only() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let rival = fx.agent("Rival", UserType::Agent, None).await;
    let mine = fx.sub_agent("Mine", &boss).await;
    let theirs = fx.sub_agent("Theirs", &rival).await;

    let task = service
        .create_task(&boss, new_task("  Call client  ", &mine.id))
        .await
        .unwrap();
    assert_eq!(task.title, "Call client");
    assert_eq!(task.assigned_to, mine.id);
    assert_eq!(task.assignee_name.as_deref(), Some("Mine"));
    assert_eq!(task.status, TaskStatus::Pending);

    let err = service
        .create_task(&boss, new_task("Steal work", &theirs.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidAssignment));
}

#[tokio::test]
async fn test_sub_agent_may_only_assign_to_itself() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let worker = fx.sub_agent("Worker", &boss).await;
    let sibling = fx.sub_agent("Sibling", &boss).await;

    let err = service
        .create_task(&worker, new_task("Delegate", &sibling.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Forbidden(_)));

    let task = service
        .create_task(&worker, new_task("Self", &worker.id))
        .await
        .unwrap();
    assert_eq!(task.assigned_to, worker.id);
    assert_eq!(task.created_by, worker.id);
}

#[tokio::test]
async fn test_admin_and_blank_titles_are_rejected() {
    let fx = fixture().await;
    let service = fx.task_service();
    let admin = fx.agent("Root", UserType::Admin, None).await;
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let worker = fx.sub_agent("Worker", &boss).await;

    let err = service
        .create_task(&admin, new_task("Anything", &worker.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidAssignment));

    let err = service
        .create_task(&boss, new_task("   ", &worker.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::MissingTitle));
}

#[tokio::test]
async fn test_single_create_rejects_duplicates() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let worker = fx.sub_agent("Worker", &boss).await;

    service
        .create_task(&boss, new_task("Buy milk", &worker.id))
        .await
        .unwrap();
    let err = service
        .create_task(&boss, new_task(" Buy milk ", &worker.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::DuplicateTask { .. }));

    // Case variants are accepted here and left to the duplicate scan
    let variant = service
        .create_task(&boss, new_task("buy milk", &worker.id))
        .await
        .unwrap();
    assert!(!variant.is_duplicate);
}

#[tokio::test]
async fn test_listing_depends_on_user_type() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let a = fx.sub_agent("A", &boss).await;
    let b = fx.sub_agent("B", &boss).await;

    for i in 0..3 {
        service
            .create_task(&boss, new_task(&format!("for a {}", i), &a.id))
            .await
            .unwrap();
    }
    service.create_task(&boss, new_task("for b", &b.id)).await.unwrap();
    service.create_task(&b, new_task("b self", &b.id)).await.unwrap();

    let boss_view = service.list_tasks(&boss, TaskQuery::default()).await.unwrap();
    assert_eq!(boss_view.pagination.results, 4);
    assert_eq!(boss_view.tasks[0].title, "for b");

    let filtered = service
        .list_tasks(
            &boss,
            TaskQuery {
                assigned_to: Some(a.id.clone()),
                limit: Some(2),
                page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.pagination.results, 3);
    assert_eq!(filtered.pagination.total, 2);
    assert_eq!(filtered.pagination.current, 2);
    assert_eq!(filtered.tasks.len(), 1);
    assert_eq!(filtered.tasks[0].title, "for a 0");

    let b_view = service.list_tasks(&b, TaskQuery::default()).await.unwrap();
    let titles: Vec<&str> = b_view.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b self", "for b"]);
}

#[tokio::test]
async fn test_get_update_status_delete_authorization() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let other = fx.agent("Other", UserType::Agent, None).await;
    let worker = fx.sub_agent("Worker", &boss).await;

    let task = service
        .create_task(&boss, new_task("Quarterly report", &worker.id))
        .await
        .unwrap();

    assert!(service.get_task(&worker, &task.id).await.is_ok());
    assert!(matches!(
        service.get_task(&other, &task.id).await.unwrap_err(),
        TaskError::NotFound(_)
    ));

    let moved = service
        .update_status(&worker, &task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(moved.status, TaskStatus::InProgress);

    // Only the creator edits and deletes
    let err = service
        .update_task(
            &worker,
            &task.id,
            TaskUpdateInput {
                title: Some("Hijack".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::NotFound(_)));
    assert!(service.delete_task(&worker, &task.id).await.is_err());

    let updated = service
        .update_task(
            &boss,
            &task.id,
            TaskUpdateInput {
                title: Some("  Annual report ".to_string()),
                priority: Some(TaskPriority::Low),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Annual report");
    assert_eq!(updated.priority, TaskPriority::Low);
    assert_eq!(updated.status, TaskStatus::InProgress);

    service.delete_task(&boss, &task.id).await.unwrap();
    assert!(fx.tasks.find_task(&task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_admin_list_filters_and_statistics() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let other = fx.agent("Other", UserType::Agent, None).await;
    let a = fx.sub_agent("A", &boss).await;
    let z = fx.sub_agent("Z", &other).await;

    let t1 = fx.insert_task("Invoice March", &a, &boss).await;
    fx.insert_task("invoice march", &a, &boss).await;
    fx.insert_task("Cleanup", &a, &a).await;
    fx.insert_task("Invoice April", &z, &other).await;
    fx.tasks
        .update_status(&t1.id, TaskStatus::Completed)
        .await
        .unwrap();
    fx.duplicates.detect().await.unwrap();

    let everything = service.admin_list(AdminTaskQuery::default()).await.unwrap();
    assert_eq!(everything.pagination.results, 4);
    assert_eq!(everything.statistics.total_tasks, 4);
    assert_eq!(everything.statistics.completed, 1);
    assert_eq!(everything.statistics.pending, 3);
    assert_eq!(everything.statistics.duplicates, 1);
    assert_eq!(everything.upload_distribution[0].agent_id, boss.id);
    assert_eq!(everything.upload_distribution[0].task_count, 2);

    // Created by Boss or assigned to Boss's sub-agents
    let owned = service
        .admin_list(AdminTaskQuery {
            agent_id: Some(boss.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(owned.pagination.results, 3);

    let owned_search = service
        .admin_list(AdminTaskQuery {
            agent_id: Some(boss.id.clone()),
            search: Some("INVOICE".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(owned_search.pagination.results, 2);

    let duplicates_only = service
        .admin_list(AdminTaskQuery {
            has_duplicates: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(duplicates_only.tasks.len(), 1);
    assert!(duplicates_only.tasks[0].is_duplicate);

    let for_z = service
        .admin_list(AdminTaskQuery {
            sub_agent_id: Some(z.id.clone()),
            status: Some(TaskStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_z.tasks.len(), 1);
    assert_eq!(for_z.tasks[0].title, "Invoice April");
}

#[tokio::test]
async fn test_upload_batches_split_by_creator_and_gap() {
    let fx = fixture().await;
    let service = fx.task_service();
    let boss = fx.agent("Boss", UserType::Agent, None).await;
    let other = fx.agent("Other", UserType::Agent, None).await;
    let a = fx.sub_agent("A", &boss).await;
    let z = fx.sub_agent("Z", &other).await;

    let plan = [
        (&a, &boss, 9, 0),
        (&a, &boss, 9, 2),
        (&z, &other, 9, 3),
        (&a, &boss, 11, 0),
    ];
    for (i, (assignee, creator, hour, minute)) in plan.into_iter().enumerate() {
        let task = fx.insert_task(&format!("t{}", i), assignee, creator).await;
        let created_at = Utc.with_ymd_and_hms(2025, 2, 3, hour, minute, 0).unwrap();
        fx.set_created_at(&task, created_at).await;
    }
    let stray = fx.insert_task("next day", &a, &boss).await;
    fx.set_created_at(&stray, Utc.with_ymd_and_hms(2025, 2, 4, 9, 0, 0).unwrap())
        .await;

    let listing = service
        .upload_batches(BatchQuery {
            agent_id: None,
            date: chrono::NaiveDate::from_ymd_opt(2025, 2, 3),
        })
        .await
        .unwrap();

    assert_eq!(listing.total_tasks, 4);
    let shape: Vec<(String, usize)> = listing
        .batches
        .iter()
        .map(|b| (b.creator_id.clone(), b.task_count))
        .collect();
    assert_eq!(
        shape,
        vec![(boss.id.clone(), 1), (other.id.clone(), 1), (boss.id.clone(), 2)]
    );
    assert_eq!(listing.total_batches, 3);
    assert_eq!(listing.batches[2].batch_id, "batch_3");

    let by_creator = service
        .upload_batches(BatchQuery {
            agent_id: Some(other.id.clone()),
            date: None,
        })
        .await
        .unwrap();
    assert_eq!(by_creator.total_tasks, 1);
}
