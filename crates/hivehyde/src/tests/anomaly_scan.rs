use super::*;

async fn scan(host: ScriptedHost) -> AnomalyReport {
    AnomalyScanner::new(Arc::new(host)).scan().await
}

#[tokio::test]
async fn genuine_desktop_scans_clean() {
    let report = scan(desktop_host()).await;
    assert!(!report.webdriver);
    assert!(!report.webdriver_tampered);
    assert!(!report.headless_chrome);
    assert!(!report.tostring_tampered);
    assert_eq!(report.stack_anomaly, StackVerdict::Clean);
    assert_eq!(report.permissions_denied, PermissionVerdict::NotDenied);
}

#[tokio::test]
async fn webdriver_flag_is_reported() {
    let mut host = desktop_host();
    host.webdriver_flag = Some(true);
    assert!(scan(host).await.webdriver);
}

#[tokio::test]
async fn configurable_descriptor_counts_as_tampering() {
    let mut host = desktop_host();
    host.webdriver_descriptor = Some(DescriptorShape { configurable: true });
    assert!(scan(host).await.webdriver_tampered);

    let mut host = desktop_host();
    host.webdriver_descriptor = Some(DescriptorShape {
        configurable: false,
    });
    assert!(!scan(host).await.webdriver_tampered);
}

#[tokio::test]
async fn chrome_runtime_without_csi_looks_headless() {
    let mut host = desktop_host();
    host.chrome_runtime = Some(ChromeRuntimeShape {
        has_callable_csi: false,
    });
    assert!(scan(host).await.headless_chrome);

    let mut host = desktop_host();
    host.chrome_runtime = Some(ChromeRuntimeShape {
        has_callable_csi: true,
    });
    assert!(!scan(host).await.headless_chrome);

    // No Chrome runtime at all is not a headless signal.
    assert!(!scan(desktop_host()).await.headless_chrome);
}

#[tokio::test]
async fn tostring_hooks_are_detected_on_either_sample() {
    let mut host = desktop_host();
    host.to_string_samples = Some(ToStringSamples {
        builtin: "function toString() { return hook(); }".to_string(),
        user_function: genuine_to_string_samples().user_function,
    });
    assert!(scan(host).await.tostring_tampered);

    let mut host = desktop_host();
    host.to_string_samples = Some(ToStringSamples {
        builtin: genuine_to_string_samples().builtin,
        user_function: "function probe() { return 'rewritten'; }".to_string(),
    });
    assert!(scan(host).await.tostring_tampered);
}

#[tokio::test]
async fn stack_shape_is_classified() {
    let mut host = desktop_host();
    host.stack_sample = None;
    assert_eq!(scan(host).await.stack_anomaly, StackVerdict::NoStack);

    let mut host = desktop_host();
    host.stack_sample = Some(
        "Error: probe\n    at Puppeteer.launch (node:internal)\n    at main (app.js:1:1)"
            .to_string(),
    );
    assert_eq!(
        scan(host).await.stack_anomaly,
        StackVerdict::ContainsKeyword
    );

    let mut host = desktop_host();
    host.stack_sample = Some("Error: probe\n    at main (app.js:1:1)".to_string());
    assert_eq!(scan(host).await.stack_anomaly, StackVerdict::StackTooShort);
}

#[tokio::test]
async fn permission_states_are_classified() {
    let mut host = desktop_host();
    host.permission = PermissionProbe::Unsupported;
    assert_eq!(
        scan(host).await.permissions_denied,
        PermissionVerdict::NoPermissionsApi
    );

    let mut host = desktop_host();
    host.permission = PermissionProbe::Failed;
    assert_eq!(
        scan(host).await.permissions_denied,
        PermissionVerdict::PermissionsError
    );

    let mut host = desktop_host();
    host.permission = PermissionProbe::States {
        query: PermissionState::Denied,
        legacy: PermissionState::Denied,
    };
    assert_eq!(
        scan(host).await.permissions_denied,
        PermissionVerdict::Denied
    );

    // Only one side reporting denied is not a denial.
    let mut host = desktop_host();
    host.permission = PermissionProbe::States {
        query: PermissionState::Denied,
        legacy: PermissionState::Granted,
    };
    assert_eq!(
        scan(host).await.permissions_denied,
        PermissionVerdict::NotDenied
    );
}
