//! Instance and binding lifecycle against the in-memory backing server,
//! plus an opt-in round trip against a real MariaDB server.

use std::sync::Arc;

use mariadb_broker::broker::{
    derive, AdminCommand, AdminConfig, BrokerError, CommandKind, MemoryBackend, MySqlAdmin,
    ProvisioningController, Role,
};
use uuid::Uuid;

fn controller() -> ProvisioningController<MemoryBackend> {
    let admin = AdminConfig {
        host: "mariadb.example".to_string(),
        port: 3306,
        ..AdminConfig::default()
    };
    ProvisioningController::new(MemoryBackend::new(), admin)
}

#[tokio::test]
async fn test_abc_123_scenario() {
    let controller = controller();
    let backend = controller.backend().clone();

    controller.create_instance("abc-123").await.unwrap();

    let database = derive(Role::Database, "abc-123");
    let username = derive(Role::User, "abc-123");
    let snapshot = backend.snapshot();
    assert!(snapshot.databases.contains(&database));
    assert!(snapshot.users.contains_key(&username));
    assert_eq!(snapshot.grants[&username].len(), 1);
    assert!(snapshot.grants[&username].contains(&database));

    let credentials = controller.bind("abc-123", "bind-1").unwrap();
    assert_eq!(
        credentials.uri,
        format!(
            "mysql://{}:{}@mariadb.example:3306/{}",
            username,
            derive(Role::Password, "abc-123"),
            database
        )
    );

    controller.remove_instance("abc-123").await.unwrap();
    let snapshot = backend.snapshot();
    assert!(!snapshot.databases.contains(&database));
    assert!(!snapshot.users.contains_key(&username));

    // Second removal succeeds
    controller.remove_instance("abc-123").await.unwrap();
}

#[tokio::test]
async fn test_create_is_idempotent() {
    let controller = controller();
    let backend = controller.backend().clone();

    controller.create_instance("abc-123").await.unwrap();
    let first = backend.snapshot();
    controller.create_instance("abc-123").await.unwrap();

    assert_eq!(backend.snapshot(), first);
    assert_eq!(first.databases.len(), 1);
    assert_eq!(first.users.len(), 1);
}

#[tokio::test]
async fn test_remove_never_created() {
    let controller = controller();
    controller
        .remove_instance(&Uuid::new_v4().to_string())
        .await
        .unwrap();
    assert!(controller.backend().snapshot().databases.is_empty());
}

#[tokio::test]
async fn test_round_trip_credentials() {
    let controller = controller();
    let backend = controller.backend().clone();
    let id = Uuid::new_v4().to_string();

    controller.create_instance(&id).await.unwrap();
    let credentials = controller.bind(&id, "binding").unwrap();
    assert!(backend.authenticate(
        &credentials.username,
        &credentials.password,
        &credentials.database
    ));

    controller.remove_instance(&id).await.unwrap();
    assert!(!backend.authenticate(
        &credentials.username,
        &credentials.password,
        &credentials.database
    ));
}

#[test]
fn test_bind_is_stable_across_controllers() {
    // A fresh controller stands in for a restarted process
    let first = controller().bind("abc-123", "bind-1").unwrap();
    let second = controller().bind("abc-123", "bind-9").unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_instances_are_isolated() {
    let controller = controller();
    let backend = controller.backend().clone();
    let id1 = Uuid::new_v4().to_string();
    let id2 = Uuid::new_v4().to_string();

    for role in [Role::Database, Role::User, Role::Password] {
        assert_ne!(derive(role, &id1), derive(role, &id2));
    }

    controller.create_instance(&id1).await.unwrap();
    controller.create_instance(&id2).await.unwrap();

    let db2 = derive(Role::Database, &id2);
    let user1 = derive(Role::User, &id1);
    for command in backend.journal() {
        if let AdminCommand::GrantAll { database, username } = command {
            if username == user1 {
                assert_ne!(database, db2);
            }
        }
    }

    let creds1 = controller.bind(&id1, "b").unwrap();
    assert!(!backend.authenticate(&creds1.username, &creds1.password, &db2));

    // Removing one instance leaves the other intact
    controller.remove_instance(&id1).await.unwrap();
    let creds2 = controller.bind(&id2, "b").unwrap();
    assert!(backend.authenticate(&creds2.username, &creds2.password, &creds2.database));
}

#[tokio::test]
async fn test_unbind_does_not_touch_server() {
    let controller = controller();
    let backend = controller.backend().clone();
    controller.create_instance("abc-123").await.unwrap();

    let before = backend.snapshot();
    let journal_before = backend.journal().len();
    controller.unbind("abc-123", "bind-1").unwrap();
    controller.unbind("never-created", "bind-2").unwrap();

    assert_eq!(backend.snapshot(), before);
    assert_eq!(backend.journal().len(), journal_before);
}

#[tokio::test]
async fn test_connections_released_on_every_path() {
    let controller = controller();
    let backend = controller.backend().clone();

    controller.create_instance("a").await.unwrap();
    backend.fail_command(Some(CommandKind::GrantAll));
    assert!(controller.create_instance("b").await.is_err());
    backend.fail_command(Some(CommandKind::DropUser));
    assert!(controller.remove_instance("a").await.is_err());
    backend.fail_command(None);
    controller.remove_instance("a").await.unwrap();

    assert_eq!(backend.open_sessions(), 0);
}

#[tokio::test]
async fn test_concurrent_instances() {
    let controller = Arc::new(controller());
    let ids: Vec<String> = (0..16).map(|_| Uuid::new_v4().to_string()).collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.create_instance(&id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = controller.backend().snapshot();
    assert_eq!(snapshot.databases.len(), ids.len());
    assert_eq!(snapshot.users.len(), ids.len());
    assert_eq!(controller.backend().open_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_creates_same_instance() {
    let controller = Arc::new(controller());
    let id = Uuid::new_v4().to_string();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let controller = controller.clone();
            let id = id.clone();
            tokio::spawn(async move { controller.create_instance(&id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = controller.backend().snapshot();
    assert_eq!(snapshot.databases.len(), 1);
    assert_eq!(snapshot.users.len(), 1);
    let credentials = controller.bind(&id, "b").unwrap();
    assert!(controller.backend().authenticate(
        &credentials.username,
        &credentials.password,
        &credentials.database
    ));
}

#[tokio::test]
async fn test_get_instance_is_unsupported() {
    let err = controller().get_instance("abc-123").await.unwrap_err();
    assert!(matches!(err, BrokerError::Unimplemented { .. }));
}

/// Admin settings for the live test, from MARIADB_BROKER_TEST_{HOST,PORT,USER,PASS}
fn live_config() -> Option<AdminConfig> {
    let host = std::env::var("MARIADB_BROKER_TEST_HOST").ok()?;
    Some(AdminConfig {
        host,
        port: std::env::var("MARIADB_BROKER_TEST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306),
        username: std::env::var("MARIADB_BROKER_TEST_USER").unwrap_or_else(|_| "root".to_string()),
        password: std::env::var("MARIADB_BROKER_TEST_PASS").unwrap_or_default(),
        ..AdminConfig::default()
    })
}

#[tokio::test]
#[ignore = "requires a MariaDB server, see live_config"]
async fn test_live_round_trip() {
    use sqlx::{Connection, MySqlConnection};

    let Some(admin) = live_config() else {
        return;
    };
    let controller = ProvisioningController::new(MySqlAdmin::new(&admin), admin.clone());
    let id = Uuid::new_v4().to_string();

    controller.create_instance(&id).await.unwrap();
    controller.create_instance(&id).await.unwrap();

    let credentials = controller.bind(&id, "live").unwrap();
    let conn = MySqlConnection::connect(&credentials.uri).await.unwrap();
    conn.close().await.unwrap();

    controller.remove_instance(&id).await.unwrap();
    assert!(MySqlConnection::connect(&credentials.uri).await.is_err());

    controller.remove_instance(&id).await.unwrap();
}
