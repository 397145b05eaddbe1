mod common;

use common::{received_kinds, TestApp};
use stayhub::domain::{DomainError, HostRequestStatus, UserRole};

#[tokio::test]
async fn approval_promotes_the_applicant_to_host() {
    let mut app = TestApp::new().await;
    let admin = app.user("ada", UserRole::Admin).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let service = &app.state.host_requests;

    let request = service
        .submit(&guest.id, Some("  I have a flat in Lyon  ".into()))
        .await
        .unwrap();
    assert_eq!(request.status, HostRequestStatus::Pending);
    assert_eq!(request.message.as_deref(), Some("I have a flat in Lyon"));

    let approved = service.approve(&admin.id, &request.id).await.unwrap();
    assert_eq!(approved.status, HostRequestStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("ada"));

    let user = app.state.repos.users().find_by_id(&guest.id).await.unwrap().unwrap();
    assert_eq!(user.role, UserRole::Host);
    assert!(user.can_list_properties());

    assert_eq!(
        received_kinds(&mut app.notifications, 1).await,
        vec!["host_request_approved"]
    );
}

#[tokio::test]
async fn rejection_records_the_reason_and_keeps_the_role() {
    let app = TestApp::new().await;
    let admin = app.user("ada", UserRole::Admin).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let service = &app.state.host_requests;

    let request = service.submit(&guest.id, None).await.unwrap();
    let rejected = service
        .reject(&admin.id, &request.id, Some("incomplete profile".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, HostRequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("incomplete profile"));

    let user = app.state.repos.users().find_by_id(&guest.id).await.unwrap().unwrap();
    assert_eq!(user.role, UserRole::Guest);

    // A decided request can be followed by a new one.
    service.submit(&guest.id, None).await.unwrap();
}

#[tokio::test]
async fn duplicate_and_redundant_requests_conflict() {
    let app = TestApp::new().await;
    let host = app.user("hank", UserRole::Host).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let service = &app.state.host_requests;

    assert!(matches!(
        service.submit(&host.id, None).await,
        Err(DomainError::Conflict(_))
    ));

    service.submit(&guest.id, None).await.unwrap();
    assert!(matches!(
        service.submit(&guest.id, None).await,
        Err(DomainError::Conflict(_))
    ));
}

#[tokio::test]
async fn only_admins_decide() {
    let app = TestApp::new().await;
    let admin = app.user("ada", UserRole::Admin).await;
    let guest = app.user("gina", UserRole::Guest).await;
    let host = app.user("hank", UserRole::Host).await;
    let service = &app.state.host_requests;

    let request = service.submit(&guest.id, None).await.unwrap();
    assert!(matches!(
        service.approve(&host.id, &request.id).await,
        Err(DomainError::Forbidden(_))
    ));

    service.approve(&admin.id, &request.id).await.unwrap();
    assert!(matches!(
        service.reject(&admin.id, &request.id, None).await,
        Err(DomainError::InvalidTransition { entity: "HostRequest", .. })
    ));
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller_unless_admin() {
    let app = TestApp::new().await;
    let admin = app.user("ada", UserRole::Admin).await;
    let gina = app.user("gina", UserRole::Guest).await;
    let olga = app.user("olga", UserRole::Guest).await;
    let service = &app.state.host_requests;

    let first = service.submit(&gina.id, None).await.unwrap();
    service.submit(&olga.id, None).await.unwrap();
    service.approve(&admin.id, &first.id).await.unwrap();

    assert_eq!(service.list(&admin.id, None).await.unwrap().len(), 2);
    let pending = service
        .list(&admin.id, Some(HostRequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, "olga");

    let own = service.list(&gina.id, None).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, first.id);
}
