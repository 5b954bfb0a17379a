// ABOUTME: Integration tests for agent storage operations
// ABOUTME: Tests CRUD, email uniqueness and sub-agent ownership lookups

use pretty_assertions::assert_eq;
use tasklane_agents::{AgentCreateInput, AgentStorage, AgentUpdateInput, UserType};
use tasklane_storage::{connect_in_memory, StorageError};

fn input(name: &str, email: &str, user_type: UserType, parent: Option<&str>) -> AgentCreateInput {
    AgentCreateInput {
        name: name.to_string(),
        email: email.to_string(),
        mobile: "+15550100".to_string(),
        user_type,
        parent_agent_id: parent.map(str::to_string),
        created_by: parent.map(str::to_string),
    }
}

async fn storage() -> AgentStorage {
    AgentStorage::new(connect_in_memory().await.unwrap())
}

#[tokio::test]
async fn test_create_agent_normalizes_fields() {
    let storage = storage().await;

    let agent = storage
        .create_agent(input("  Alice  ", " Alice@Example.COM ", UserType::Agent, None))
        .await
        .unwrap();

    assert!(agent.id.starts_with("agt-"));
    assert_eq!(agent.name, "Alice");
    assert_eq!(agent.email, "alice@example.com");
    assert_eq!(agent.user_type, UserType::Agent);
    assert!(agent.is_active);
    assert!(agent.can_create_sub_agents());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let storage = storage().await;
    storage
        .create_agent(input("Alice", "alice@example.com", UserType::Agent, None))
        .await
        .unwrap();

    let result = storage
        .create_agent(input("Other", "ALICE@example.com", UserType::Agent, None))
        .await;

    assert!(matches!(result, Err(StorageError::Conflict(_))));
}

#[tokio::test]
async fn test_create_agent_validates_input() {
    let storage = storage().await;

    let missing_name = storage
        .create_agent(input("  ", "x@example.com", UserType::Agent, None))
        .await;
    assert!(matches!(missing_name, Err(StorageError::InvalidInput(_))));

    let bad_email = storage
        .create_agent(input("X", "not-an-email", UserType::Agent, None))
        .await;
    assert!(matches!(bad_email, Err(StorageError::InvalidInput(_))));

    let orphan = storage
        .create_agent(input("X", "x@example.com", UserType::SubAgent, None))
        .await;
    assert!(matches!(orphan, Err(StorageError::InvalidInput(_))));
}

#[tokio::test]
async fn test_list_sub_agents_in_creation_order() {
    let storage = storage().await;
    let parent = storage
        .create_agent(input("Parent", "parent@example.com", UserType::Agent, None))
        .await
        .unwrap();
    let other = storage
        .create_agent(input("Other", "other@example.com", UserType::Agent, None))
        .await
        .unwrap();

    let a = storage
        .create_agent(input("A", "a@example.com", UserType::SubAgent, Some(&parent.id)))
        .await
        .unwrap();
    let b = storage
        .create_agent(input("B", "b@example.com", UserType::SubAgent, Some(&parent.id)))
        .await
        .unwrap();
    let c = storage
        .create_agent(input("C", "c@example.com", UserType::SubAgent, Some(&parent.id)))
        .await
        .unwrap();
    storage
        .create_agent(input("D", "d@example.com", UserType::SubAgent, Some(&other.id)))
        .await
        .unwrap();

    storage
        .update_agent(
            &b.id,
            AgentUpdateInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let all: Vec<String> = storage
        .list_sub_agents(&parent.id, false)
        .await
        .unwrap()
        .into_iter()
        .map(|agent| agent.id)
        .collect();
    assert_eq!(all, vec![a.id.clone(), b.id.clone(), c.id.clone()]);

    let active: Vec<String> = storage
        .list_sub_agents(&parent.id, true)
        .await
        .unwrap()
        .into_iter()
        .map(|agent| agent.id)
        .collect();
    assert_eq!(active, vec![a.id, c.id]);
}

#[tokio::test]
async fn test_get_sub_agent_checks_ownership() {
    let storage = storage().await;
    let parent = storage
        .create_agent(input("Parent", "parent@example.com", UserType::Agent, None))
        .await
        .unwrap();
    let stranger = storage
        .create_agent(input("Stranger", "stranger@example.com", UserType::Agent, None))
        .await
        .unwrap();
    let sub = storage
        .create_agent(input("Sub", "sub@example.com", UserType::SubAgent, Some(&parent.id)))
        .await
        .unwrap();

    assert_eq!(storage.get_sub_agent(&parent.id, &sub.id).await.unwrap().id, sub.id);
    assert!(matches!(
        storage.get_sub_agent(&stranger.id, &sub.id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn test_update_and_delete_agent() {
    let storage = storage().await;
    let agent = storage
        .create_agent(input("Alice", "alice@example.com", UserType::Agent, None))
        .await
        .unwrap();

    let updated = storage
        .update_agent(
            &agent.id,
            AgentUpdateInput {
                name: Some("Alice Cooper".to_string()),
                mobile: Some("   ".to_string()),
                is_active: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Cooper");
    // Blank values leave the field untouched
    assert_eq!(updated.mobile, "+15550100");

    storage.delete_agent(&agent.id).await.unwrap();
    assert!(storage.find_agent(&agent.id).await.unwrap().is_none());
    assert!(matches!(
        storage.delete_agent(&agent.id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn test_list_agents_by_type() {
    let storage = storage().await;
    storage
        .create_agent(input("Root", "root@example.com", UserType::Admin, None))
        .await
        .unwrap();
    storage
        .create_agent(input("Alice", "alice@example.com", UserType::Agent, None))
        .await
        .unwrap();

    assert_eq!(storage.list_agents(None).await.unwrap().len(), 2);
    let admins = storage.list_agents(Some(UserType::Admin)).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert!(admins[0].is_admin());
    assert!(storage
        .find_by_email("ALICE@example.com")
        .await
        .unwrap()
        .is_some());
}
