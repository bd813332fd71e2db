//! Integration tests for the ENS lookup HTTP clients.
//!
//! Uses `wiremock` to stand in for the reverse resolution API and the ENS
//! subgraph, covering successful lookups, upstream errors, malformed bodies
//! and timeouts.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

use ens_access_gate::domain::{LookupError, NameResolver, OwnedNamesSource, WalletAddress};
use ens_access_gate::infra::{EnsReverseResolver, EnsSubgraphClient, HttpLookupConfig};

const ALICE: &str = "0x00000000000000000000000000000000000000a1";

fn alice() -> WalletAddress {
    ALICE.parse().unwrap()
}

fn fast_config() -> HttpLookupConfig {
    HttpLookupConfig::default().with_timeout(Duration::from_millis(300))
}

// ============================================================================
// REVERSE RESOLUTION API TESTS
// ============================================================================

mod reverse_resolution_tests {
    use super::*;

    fn resolver_for(server: &MockServer) -> EnsReverseResolver {
        EnsReverseResolver::new(Some(server.uri()), &fast_config()).unwrap()
    }

    #[tokio::test]
    async fn test_primary_name_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/ens/resolve/{}", ALICE)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "address": ALICE,
                "name": "alice.allthingscrypto.eth",
                "displayName": "alice.allthingscrypto.eth",
                "avatar": null
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let name = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("alice.allthingscrypto.eth"));
    }

    #[tokio::test]
    async fn test_primary_name_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/ens/resolve/{}", ALICE)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "address": ALICE,
                "name": null,
                "displayName": "0x0000...00a1"
            })))
            .mount(&mock_server)
            .await;

        let name = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap();
        assert!(name.is_none());
    }

    #[tokio::test]
    async fn test_empty_name_treated_as_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/ens/resolve/{}", ALICE)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "address": ALICE, "name": "" })),
            )
            .mount(&mock_server)
            .await;

        let name = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap();
        assert!(name.is_none());
    }

    #[tokio::test]
    async fn test_server_error_surfaces_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap_err();
        match err {
            LookupError::ApiError { status_code, .. } => assert_eq!(status_code, 503),
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "name": "late.allthingscrypto.eth" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server)
            .primary_name(&alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_health_check_probes_api() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": null })))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert!(resolver_for(&mock_server).health_check().await.is_ok());
    }
}

// ============================================================================
// ENS SUBGRAPH TESTS
// ============================================================================

mod subgraph_tests {
    use super::*;
    use secrecy::SecretString;

    fn client_for(server: &MockServer) -> EnsSubgraphClient {
        EnsSubgraphClient::new(Some(server.uri()), None, &fast_config()).unwrap()
    }

    #[tokio::test]
    async fn test_owned_names_registry_then_wrapped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "owner": ALICE } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "domains": [
                        { "name": "alice.eth" },
                        { "name": null },
                        { "name": "vip.allthingscrypto.eth" }
                    ],
                    "wrappedDomains": [
                        { "name": "" },
                        { "name": "founder.allthingscrypto.eth" }
                    ]
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let names = client_for(&mock_server).owned_names(&alice()).await.unwrap();
        assert_eq!(
            names,
            vec![
                "alice.eth",
                "vip.allthingscrypto.eth",
                "founder.allthingscrypto.eth"
            ]
        );
    }

    #[tokio::test]
    async fn test_name_suffix_filters_server_side() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "owner": ALICE, "suffix": ".allthingscrypto.eth", "first": 100 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "domains": [],
                    "wrappedDomains": [{ "name": "late.allthingscrypto.eth" }]
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).with_name_suffix(".allthingscrypto.eth");
        let names = client.owned_names(&alice()).await.unwrap();
        assert_eq!(names, vec!["late.allthingscrypto.eth"]);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(
            body["query"]
                .as_str()
                .unwrap()
                .contains("name_ends_with: $suffix")
        );
    }

    #[tokio::test]
    async fn test_owned_names_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "domains": [], "wrappedDomains": [] }
            })))
            .mount(&mock_server)
            .await;

        let names = client_for(&mock_server).owned_names(&alice()).await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_are_api_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "indexer not ready" }]
            })))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .owned_names(&alice())
            .await
            .unwrap_err();
        match err {
            LookupError::ApiError { message, .. } => assert!(message.contains("indexer not ready")),
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_data_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .owned_names(&alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .owned_names(&alice())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::ApiError {
                status_code: 429,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("authorization", "Bearer graph-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "domains": [{ "name": "a.allthingscrypto.eth" }], "wrappedDomains": [] }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = EnsSubgraphClient::new(
            Some(mock_server.uri()),
            Some(SecretString::from("graph-key".to_string())),
            &fast_config(),
        )
        .unwrap();
        let names = client.owned_names(&alice()).await.unwrap();
        assert_eq!(names, vec!["a.allthingscrypto.eth"]);
    }
}

// ============================================================================
// END-TO-END VERIFICATION AGAINST MOCKED SOURCES
// ============================================================================

mod verifier_tests {
    use super::*;
    use ens_access_gate::app::AccessVerifier;
    use ens_access_gate::domain::{AccessTier, LookupStep, StepOutcome};
    use ens_access_gate::infra::StaticFallbackDirectory;

    fn verifier_for(reverse: &MockServer, subgraph: &MockServer) -> AccessVerifier {
        AccessVerifier::new(".allthingscrypto.eth")
            .with_resolver(Arc::new(
                EnsReverseResolver::new(Some(reverse.uri()), &fast_config()).unwrap(),
            ))
            .with_registry(Arc::new(
                EnsSubgraphClient::new(Some(subgraph.uri()), None, &fast_config())
                    .unwrap()
                    .with_name_suffix(".allthingscrypto.eth"),
            ))
    }

    #[tokio::test]
    async fn test_primary_name_outside_suffix_falls_through_to_registry() {
        let reverse = MockServer::start().await;
        let subgraph = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "alice.eth" })))
            .mount(&reverse)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "domains": [{ "name": "pro-alice.allthingscrypto.eth" }],
                    "wrappedDomains": []
                }
            })))
            .expect(1)
            .mount(&subgraph)
            .await;

        let verifier = verifier_for(&reverse, &subgraph);
        let report = verifier.verify_detailed(ALICE).await.unwrap();

        assert!(report.result.granted);
        assert_eq!(
            report.result.name.as_deref(),
            Some("pro-alice.allthingscrypto.eth")
        );
        assert_eq!(report.result.tier, AccessTier::Premium);
        assert_eq!(report.matched_step(), Some(LookupStep::RegistryScan));
    }

    #[tokio::test]
    async fn test_primary_match_skips_registry() {
        let reverse = MockServer::start().await;
        let subgraph = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "name": "Diamond.AllThingsCrypto.eth" })),
            )
            .mount(&reverse)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&subgraph)
            .await;

        let verifier = verifier_for(&reverse, &subgraph);
        let result = verifier.verify(ALICE).await.unwrap();

        assert!(result.granted);
        assert_eq!(result.name.as_deref(), Some("Diamond.AllThingsCrypto.eth"));
        assert_eq!(result.tier, AccessTier::Diamond);
    }

    #[tokio::test]
    async fn test_both_sources_down_uses_fallback() {
        let reverse = MockServer::start().await;
        let subgraph = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&reverse)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&subgraph)
            .await;

        let fallback =
            StaticFallbackDirectory::from_pairs(&format!("{}=founder.allthingscrypto.eth", ALICE))
                .unwrap();
        let verifier = verifier_for(&reverse, &subgraph).with_fallback(Arc::new(fallback));

        let report = verifier.verify_detailed(ALICE).await.unwrap();
        assert!(report.result.granted);
        assert_eq!(report.result.tier, AccessTier::Founder);
        assert_eq!(report.matched_step(), Some(LookupStep::FallbackTable));
        assert!(report.had_failures());
        assert!(matches!(
            report.steps[0].outcome,
            StepOutcome::Failed(LookupError::ApiError {
                status_code: 500,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_all_sources_down_is_denied_not_error() {
        let reverse = MockServer::start().await;
        let subgraph = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&reverse)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
            .mount(&subgraph)
            .await;

        let verifier = verifier_for(&reverse, &subgraph);
        let result = verifier.verify(ALICE).await.unwrap();

        assert!(!result.granted);
        assert!(result.name.is_none());
        assert_eq!(result.tier, AccessTier::None);
    }
}
