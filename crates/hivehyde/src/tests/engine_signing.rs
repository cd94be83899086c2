use super::*;

use httpmock::MockServer;

#[tokio::test]
async fn detached_host_signs_with_sentinel_fingerprints() {
    let server = MockServer::start_async().await;
    session_endpoint(&server, TEST_SESSION_KEY, "tok-1").await;
    let clock = ManualClock::at(1_700_000_000_000);
    let hive = hive_for(&server, Arc::new(DetachedHost), clock.clone());
    hive.initialize().await.unwrap();

    let package = hive
        .process_request("GET", "api/ping", &json!({}))
        .await
        .unwrap();

    assert_eq!(package.timestamp_ms, 1_700_000_000_000);
    assert!(package.nonce.starts_with("1700000000000-"));
    assert_eq!(package.token, "tok-1");
    assert_eq!(package.risk_score, 38);

    let fingerprint =
        decrypt_fingerprint(TEST_SESSION_KEY, &package.encrypted_fingerprint).unwrap();
    assert_eq!(
        fingerprint,
        r#"{"platform":"N/A","renderer":"N/A","audio":"err_no_offline_context"}"#
    );
}

#[tokio::test]
async fn server_side_reconstruction_matches_the_signature() {
    let server = MockServer::start_async().await;
    session_endpoint(&server, TEST_SESSION_KEY, "tok-1").await;
    let clock = ManualClock::at(1_700_000_000_000);
    let hive = hive_for(&server, Arc::new(desktop_host()), clock.clone());
    hive.initialize().await.unwrap();

    let params = json!({"b": 2, "a": 1});
    let package = hive
        .process_request("POST", "api/orders", &params)
        .await
        .unwrap();

    // Mirror what the verification middleware does: decrypt the envelope,
    // recompose the record from transported material, recompute the HMAC.
    let fingerprint =
        decrypt_fingerprint(TEST_SESSION_KEY, &package.encrypted_fingerprint).unwrap();
    assert_eq!(
        fingerprint,
        r#"{"platform":"Linux x86_64","renderer":"ANGLE (NVIDIA, GeForce RTX 3060)","audio":"125"}"#
    );

    let record = compose_signing_record(
        package.timestamp_ms,
        &package.nonce,
        "POST",
        "/api/orders",
        &serialize_params("POST", &params),
        package.risk_score,
        &fingerprint,
    );
    let key = parse_session_key(TEST_SESSION_KEY).unwrap();
    assert_eq!(
        hmac_sha256_hex(&key, record.as_bytes()).unwrap(),
        package.signature
    );
    assert!(record.contains("||{\"a\":1,\"b\":2}||"));
}

#[tokio::test]
async fn desktop_host_with_no_interaction_scores_low() {
    let server = MockServer::start_async().await;
    session_endpoint(&server, TEST_SESSION_KEY, "tok-1").await;
    let hive = hive_for(
        &server,
        Arc::new(desktop_host()),
        ManualClock::at(1_700_000_000_000),
    );
    hive.initialize().await.unwrap();

    let package = hive
        .process_request("GET", "api/ping", &json!({}))
        .await
        .unwrap();
    // Empty trajectory and an untouched click counter are the only
    // penalties on a clean desktop.
    assert_eq!(package.risk_score, 4);
}

#[tokio::test]
async fn signature_headers_render_the_full_bundle() {
    let server = MockServer::start_async().await;
    session_endpoint(&server, TEST_SESSION_KEY, "tok-1").await;
    let hive = hive_for(&server, Arc::new(DetachedHost), ManualClock::at(1_000));
    hive.initialize().await.unwrap();

    let package = hive
        .process_request("GET", "api/ping", &json!({}))
        .await
        .unwrap();
    let headers = signature_headers(&package);
    let names: Vec<&str> = headers.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec![
            "X-Hive-Timestamp",
            "X-Hive-Nonce",
            "X-Hive-Signature",
            "X-Hive-Token",
            "X-Hive-RiskScore",
            "X-Hive-Fingerprint-Json",
        ]
    );
    assert_eq!(headers[0].1, package.timestamp_ms.to_string());
    assert_eq!(headers[4].1, package.risk_score.to_string());
}

#[tokio::test]
async fn handles_reject_use_before_initialization() {
    let server = MockServer::start_async().await;
    let hive = hive_for(&server, Arc::new(DetachedHost), ManualClock::at(0));

    let result = hive.process_request("GET", "api/ping", &json!({})).await;
    assert!(matches!(result, Err(HiveHydeError::NotInitialized)));
    assert!(matches!(
        hive.attach(),
        Err(HiveHydeError::NotInitialized)
    ));
    assert!(matches!(
        hive.policy(),
        Err(HiveHydeError::NotInitialized)
    ));
}

#[tokio::test]
async fn initialize_failure_propagates_and_leaves_handle_unusable() {
    let server = MockServer::start_async().await;
    session_endpoint_raw(&server, 500, json!({"error": "down"})).await;
    let hive = hive_for(&server, Arc::new(DetachedHost), ManualClock::at(0));

    let result = hive.initialize().await;
    assert!(matches!(result, Err(HiveHydeError::SessionEnvelope { .. })));
    assert!(matches!(
        hive.process_request("GET", "api/ping", &json!({})).await,
        Err(HiveHydeError::NotInitialized)
    ));
}

#[tokio::test]
async fn repeated_initialization_is_a_no_op() {
    let server = MockServer::start_async().await;
    let mock = session_endpoint(&server, TEST_SESSION_KEY, "tok-1").await;
    let hive = hive_for(&server, Arc::new(DetachedHost), ManualClock::at(0));

    hive.initialize().await.unwrap();
    hive.initialize().await.unwrap();
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn signing_without_a_session_fails_cleanly() {
    let server = MockServer::start_async().await;
    let clock = ManualClock::at(0);
    let vault = Arc::new(vault_for(&server, clock.clone()));
    let tracker = Arc::new(TrajectoryTracker::new(clock.clone()));
    let loom = Arc::new(DataLoom::new(Arc::new(DetachedHost), tracker));
    let policy = Arc::new(schedule_policy(
        &CapabilitySnapshot::default(),
        &PolicyOverrides::default(),
    ));
    let engine = crate::engine::RiskMatrix::new(vault, loom, policy, clock);

    let result = engine.sign_request("POST", "/api/orders", &json!({})).await;
    assert!(matches!(
        result,
        Err(HiveHydeError::SessionKeyUnavailable)
    ));
}

#[test]
fn missing_base_url_fails_the_build() {
    assert!(matches!(
        HiveHyde::builder().build(),
        Err(HiveHydeError::ConfigMissing)
    ));
    assert!(matches!(
        HiveHyde::builder().api_base_url("   ").build(),
        Err(HiveHydeError::ConfigMissing)
    ));
    assert!(matches!(
        HiveHyde::builder().api_base_url("not a url").build(),
        Err(HiveHydeError::InvalidBaseUrl { .. })
    ));
}
