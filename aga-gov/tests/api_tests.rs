//! Integration tests for aga-gov API endpoints
//!
//! Each test builds the full router over a fresh in-memory store and drives
//! it with `oneshot` requests.

use aga_common::api::auth::{signature_header_value, SIGNATURE_HEADER};
use aga_common::config::GovernanceConfig;
use aga_common::db::Store;
use aga_gov::api::caller::{TENANT_HEADER, USER_HEADER};
use aga_gov::{build_router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

const SECRET: &str = "test-webhook-secret";
const TENANT: &str = "tenant-1";
const USER: &str = "user-1";

/// Test helper: app over an in-memory store with a webhook secret
async fn setup_app() -> Router {
    let store = Store::in_memory().await.expect("Should create in-memory store");
    let config = GovernanceConfig {
        webhook_secret: Some(SECRET.to_string()),
        ..Default::default()
    };
    build_router(AppState::new(store, config))
}

/// Test helper: app with no database configured
fn setup_unconfigured_app() -> Router {
    build_router(AppState::new(Store::unconfigured(), GovernanceConfig::default()))
}

/// Test helper: request carrying the caller identity headers
fn test_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(TENANT_HEADER, TENANT)
        .header(USER_HEADER, USER);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: webhook request signed with `secret`
fn signed_webhook(uri: &str, body: &Value, secret: &str) -> Request<Body> {
    let raw = body.to_string();
    let signature = signature_header_value(secret, raw.as_bytes()).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(raw))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: send a request and return status plus JSON body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

/// Test helper: create an artifact through the API and return its id
async fn create_artifact(app: &Router, module: &str, entity_type: &str, entity_id: &str, pcf: Option<&str>) -> String {
    let (status, body) = send(
        app,
        test_request(
            "POST",
            "/api/artifacts",
            Some(json!({
                "sourceModule": module,
                "sourceEntityType": entity_type,
                "sourceEntityId": entity_id,
                "artifactName": format!("{} {}", entity_type, entity_id),
                "pcfCategoryId": pcf,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["artifact"]["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health and identity
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_identity_required() {
    let app = setup_app().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "aga-gov");
    assert_eq!(body["storeConfigured"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_missing_identity_headers_return_401() {
    let app = setup_app().await;

    let request = Request::builder().uri("/api/artifacts").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_tenant_isolation() {
    let app = setup_app().await;
    let id = create_artifact(&app, "requirements_manager", "business", "req-1", None).await;

    let request = Request::builder()
        .uri(format!("/api/artifacts/{}", id))
        .header(TENANT_HEADER, "tenant-2")
        .header(USER_HEADER, USER)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Webhooks
// =============================================================================

fn created_event(entity_id: &str) -> Value {
    json!({
        "tenantId": TENANT,
        "sourceModule": "strategic_compass",
        "sourceEntityType": "gap",
        "sourceEntityId": entity_id,
        "artifactName": "Order fulfilment gap",
        "pcfCategoryId": "4.0",
    })
}

#[tokio::test]
async fn test_webhook_with_valid_signature_registers_artifact() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        signed_webhook("/api/webhooks/artifact-created", &created_event("gap-1"), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert!(body["artifactId"].is_string());
}

#[tokio::test]
async fn test_webhook_with_wrong_secret_returns_401() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        signed_webhook("/api/webhooks/artifact-created", &created_event("gap-1"), "other-secret"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, test_request("GET", "/api/artifacts", None)).await;
    assert_eq!(body["artifacts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_webhook_without_signature_returns_401() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/artifact-created")
        .header("content-type", "application/json")
        .body(Body::from(created_event("gap-1").to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_missing_fields_returns_400() {
    let app = setup_app().await;

    let body = json!({ "tenantId": TENANT, "sourceModule": "strategic_compass" });
    let (status, body) = send(&app, signed_webhook("/api/webhooks/artifact-created", &body, SECRET)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("sourceEntityType"));
    assert!(message.contains("artifactName"));
}

#[tokio::test]
async fn test_registering_twice_keeps_one_artifact() {
    let app = setup_app().await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            signed_webhook("/api/webhooks/artifact-created", &created_event("gap-1"), SECRET),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, test_request("GET", "/api/artifacts", None)).await;
    let artifacts = body["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0]["tags"].as_array().unwrap().len(), 1);
    assert_eq!(artifacts[0]["tags"][0]["domain"], "business");
    assert_eq!(artifacts[0]["autoTagConfidence"], 0.85);
}

#[tokio::test]
async fn test_status_changed_webhook() {
    let app = setup_app().await;
    send(
        &app,
        signed_webhook("/api/webhooks/artifact-created", &created_event("gap-1"), SECRET),
    )
    .await;

    let event = json!({
        "tenantId": TENANT,
        "sourceModule": "strategic_compass",
        "sourceEntityType": "gap",
        "sourceEntityId": "gap-1",
        "newStatus": "archived",
    });
    let (status, body) = send(&app, signed_webhook("/api/webhooks/status-changed", &event, SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "status_changed");
    assert_eq!(body["newStatus"], "archived");

    let unknown = json!({
        "tenantId": TENANT,
        "sourceModule": "strategic_compass",
        "sourceEntityType": "gap",
        "sourceEntityId": "gap-404",
        "newStatus": "archived",
    });
    let (status, _) = send(&app, signed_webhook("/api/webhooks/status-changed", &unknown, SECRET)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Validation gate
// =============================================================================

#[tokio::test]
async fn test_low_confidence_artifact_enters_validation_queue() {
    let app = setup_app().await;
    let id = create_artifact(&app, "voice_of_customer", "feedback", "fb-1", None).await;
    create_artifact(&app, "strategic_compass", "gap", "gap-1", None).await;

    let (_, body) = send(&app, test_request("GET", "/api/artifacts/validation-queue", None)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["artifacts"][0]["id"], id.as_str());

    let (status, body) = send(
        &app,
        test_request(
            "POST",
            &format!("/api/artifacts/{}/validate", id),
            Some(json!({ "confirmed": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["artifact"]["humanValidated"], true);
    assert_eq!(body["artifact"]["validatedBy"], USER);

    let (_, body) = send(&app, test_request("GET", "/api/artifacts/validation-queue", None)).await;
    assert_eq!(body["count"], 0);
}

// =============================================================================
// Conflicts
// =============================================================================

#[tokio::test]
async fn test_scan_twice_creates_no_new_conflicts() {
    let app = setup_app().await;
    create_artifact(&app, "initiative_planner", "initiative", "init-1", Some("4.0")).await;
    create_artifact(&app, "initiative_planner", "initiative", "init-2", Some("4.0")).await;

    let (status, first) = send(&app, test_request("POST", "/api/conflicts/scan", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["summary"]["capabilityOverlaps"], 1);
    assert_eq!(first["summary"]["newConflictsCreated"], 1);

    let (_, second) = send(&app, test_request("POST", "/api/conflicts/scan", None)).await;
    assert_eq!(second["summary"]["capabilityOverlaps"], 1);
    assert_eq!(second["summary"]["newConflictsCreated"], 0);

    let (_, body) = send(&app, test_request("GET", "/api/conflicts", None)).await;
    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["conflictType"], "capability_overlap");
    assert_eq!(conflicts[0]["resolutionStatus"], "open");
}

#[tokio::test]
async fn test_resolving_conflict_records_resolver() {
    let app = setup_app().await;
    let a = create_artifact(&app, "initiative_planner", "initiative", "init-1", Some("4.0")).await;
    let b = create_artifact(&app, "initiative_planner", "initiative", "init-2", Some("4.0")).await;

    let (status, body) = send(
        &app,
        test_request(
            "POST",
            "/api/conflicts",
            Some(json!({
                "conflictType": "resource_contention",
                "severity": "medium",
                "artifactAId": a,
                "artifactBId": b,
                "description": "Both need the same team",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "report failed: {}", body);
    let conflict_id = body["conflict"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        test_request(
            "PATCH",
            &format!("/api/conflicts/{}", conflict_id),
            Some(json!({ "resolutionStatus": "resolved", "resolutionNotes": "Sequenced" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conflict"]["resolutionStatus"], "resolved");
    assert_eq!(body["conflict"]["resolvedBy"], USER);
    assert!(body["conflict"]["resolvedAt"].is_string());
}

// =============================================================================
// Principles and compliance
// =============================================================================

#[tokio::test]
async fn test_compliance_report_rate() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        test_request(
            "POST",
            "/api/principles",
            Some(json!({
                "principleName": "Reuse before buy",
                "domain": "technology",
                "priority": 1,
                "status": "active",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let principle_id = body["principle"]["id"].as_str().unwrap().to_string();

    let statuses = ["compliant", "compliant", "compliant", "non_compliant", "not_applicable"];
    for (i, compliance_status) in statuses.iter().enumerate() {
        let artifact_id = create_artifact(&app, "requirements_manager", "functional", &format!("req-{}", i), None).await;
        let (status, _) = send(
            &app,
            test_request(
                "POST",
                &format!("/api/artifacts/{}/compliance", artifact_id),
                Some(json!({ "principleId": principle_id, "complianceStatus": compliance_status })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, test_request("GET", "/api/compliance/report", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["overallRate"], 75);
    assert_eq!(body["report"]["principles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_assessing_unknown_principle_returns_404() {
    let app = setup_app().await;
    let artifact_id = create_artifact(&app, "requirements_manager", "functional", "req-1", None).await;

    let (status, _) = send(
        &app,
        test_request(
            "POST",
            &format!("/api/artifacts/{}/compliance", artifact_id),
            Some(json!({ "principleId": "missing", "complianceStatus": "compliant" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// ADM cycles
// =============================================================================

#[tokio::test]
async fn test_adm_cycle_runs_through_all_phases() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        test_request("POST", "/api/adm-cycles", Some(json!({ "cycleName": "FY27 planning" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cycle"]["currentPhase"], "preliminary");
    assert_eq!(body["cycle"]["cycleNumber"], 1);
    let cycle_id = body["cycle"]["id"].as_str().unwrap().to_string();
    let phase_uri = format!("/api/adm-cycles/{}/phase", cycle_id);

    for _ in 0..8 {
        let (status, body) = send(&app, test_request("POST", &phase_uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"], false);
    }

    let (_, body) = send(&app, test_request("POST", &phase_uri, None)).await;
    assert_eq!(body["completed"], true);
    assert_eq!(body["cycle"]["status"], "completed");
    assert_eq!(body["cycle"]["currentPhase"], "change_management");
    assert!(body["cycle"]["completedAt"].is_string());

    let (status, _) = send(&app, test_request("POST", &phase_uri, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, test_request("GET", &format!("/api/adm-cycles/{}/states", cycle_id), None)).await;
    let states = body["states"].as_array().unwrap();
    assert_eq!(states.len(), 9);
    assert_eq!(states[0]["stateType"], "baseline");
    assert_eq!(states[1]["stateType"], "transitional");
}

#[tokio::test]
async fn test_adm_cycle_requires_name() {
    let app = setup_app().await;

    let (status, _) = send(&app, test_request("POST", "/api/adm-cycles", Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_abandoned_cycle_cannot_advance() {
    let app = setup_app().await;
    let (_, body) = send(
        &app,
        test_request("POST", "/api/adm-cycles", Some(json!({ "cycleName": "Short-lived" }))),
    )
    .await;
    let cycle_id = body["cycle"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        test_request("POST", &format!("/api/adm-cycles/{}/abandon", cycle_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle"]["status"], "abandoned");

    let (status, _) = send(
        &app,
        test_request("POST", &format!("/api/adm-cycles/{}/phase", cycle_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Parking lot
// =============================================================================

#[tokio::test]
async fn test_parking_and_reactivating_restores_artifact() {
    let app = setup_app().await;
    let artifact_id = create_artifact(&app, "initiative_planner", "initiative", "init-1", Some("4.0")).await;

    let (status, body) = send(
        &app,
        test_request(
            "POST",
            "/api/parking-lot",
            Some(json!({
                "artifactId": artifact_id,
                "itemType": "initiative",
                "itemName": "Warehouse automation",
                "reasonParked": "budget_constraint",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "park failed: {}", body);
    assert_eq!(body["item"]["status"], "parked");
    assert_eq!(body["item"]["parkedBy"], USER);
    let item_id = body["item"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, test_request("GET", &format!("/api/artifacts/{}", artifact_id), None)).await;
    assert_eq!(body["artifact"]["lifecycleStatus"], "parking_lot");

    let (status, body) = send(
        &app,
        test_request("POST", &format!("/api/parking-lot/{}/reactivate", item_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["status"], "reactivated");

    let (_, body) = send(&app, test_request("GET", &format!("/api/artifacts/{}", artifact_id), None)).await;
    assert_eq!(body["artifact"]["lifecycleStatus"], "active");

    let (status, _) = send(
        &app,
        test_request("POST", &format!("/api/parking-lot/{}/cancel", item_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Maturity loop through links
// =============================================================================

#[tokio::test]
async fn test_archiving_linked_requirements_matures_capability() {
    let app = setup_app().await;
    let (status, _) = send(
        &app,
        test_request("POST", "/api/capabilities", Some(json!({ "pcfId": "4.0" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let gap = create_artifact(&app, "strategic_compass", "gap", "gap-1", Some("4.0")).await;
    let mut requirements = Vec::new();
    for i in 0..4 {
        let requirement = create_artifact(&app, "requirements_manager", "business", &format!("req-{}", i), None).await;
        let (status, _) = send(
            &app,
            test_request(
                "POST",
                "/api/requirement-gap-links",
                Some(json!({
                    "requirementArtifactId": requirement,
                    "gapArtifactId": gap,
                    "linkType": "addresses",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        requirements.push(requirement);
    }

    for requirement in requirements.iter().take(3) {
        let (status, _) = send(
            &app,
            test_request(
                "PATCH",
                &format!("/api/artifacts/{}", requirement),
                Some(json!({ "lifecycleStatus": "archived" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, test_request("GET", "/api/capabilities", None)).await;
    let capability = &body["capabilities"][0];
    assert_eq!(capability["pcfId"], "4.0");
    assert_eq!(capability["maturityScore"], 4);
    assert_eq!(capability["maturityCurrent"], "yellow");
}

#[tokio::test]
async fn test_self_link_rejected() {
    let app = setup_app().await;
    let id = create_artifact(&app, "strategic_compass", "gap", "gap-1", None).await;

    let (status, _) = send(
        &app,
        test_request(
            "POST",
            "/api/requirement-gap-links",
            Some(json!({ "requirementArtifactId": id, "gapArtifactId": id, "linkType": "addresses" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Dashboard and unconfigured store
// =============================================================================

#[tokio::test]
async fn test_dashboard_stats_counts() {
    let app = setup_app().await;
    create_artifact(&app, "voice_of_customer", "feedback", "fb-1", None).await;
    create_artifact(&app, "strategic_compass", "gap", "gap-1", None).await;

    let (status, body) = send(&app, test_request("GET", "/api/dashboard/stats", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["artifactCount"], 2);
    assert_eq!(body["pendingValidationCount"], 1);
    assert_eq!(body["openConflictCount"], 0);
    assert!(body["currentAdmPhase"].is_null());
}

#[tokio::test]
async fn test_governance_report_summarises_tenant() {
    let app = setup_app().await;
    create_artifact(&app, "initiative_planner", "initiative", "init-1", Some("4.0")).await;
    create_artifact(&app, "initiative_planner", "initiative", "init-2", Some("4.0")).await;
    send(&app, test_request("POST", "/api/conflicts/scan", None)).await;

    let (status, body) = send(&app, test_request("GET", "/api/reports/governance", None)).await;
    assert_eq!(status, StatusCode::OK, "report failed: {}", body);
    let summary = &body["report"]["summary"];
    assert_eq!(summary["totalArtifacts"], 2);
    assert_eq!(summary["activeArtifacts"], 2);
    assert_eq!(summary["openConflicts"], 1);
    assert_eq!(summary["admPhase"], "No active cycle");
    assert_eq!(body["report"]["topConflicts"][0]["type"], "capability_overlap");
}

#[tokio::test]
async fn test_unconfigured_store_reads_empty_and_rejects_writes() {
    let app = setup_unconfigured_app();

    let (status, body) = send(&app, test_request("GET", "/api/artifacts", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["artifacts"].as_array().unwrap().len(), 0);

    let (status, body) = send(
        &app,
        test_request(
            "POST",
            "/api/principles",
            Some(json!({ "principleName": "Reuse", "domain": "business" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "NOT_CONFIGURED");

    let (status, _) = send(&app, test_request("GET", "/api/reports/governance", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
