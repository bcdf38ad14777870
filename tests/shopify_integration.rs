//! Integration tests for the Shopify catalog against a local mock server.
//!
//! These verify request shape, response decoding, and error mapping without
//! network access. Live store tests are behind the `live_shopify_tests`
//! feature flag.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reftrace::catalog::shopify::ShopifyCatalog;
use reftrace::catalog::{Catalog, CatalogError};
use reftrace::core::types::MetafieldType;
use reftrace::resolver::{ErrorKind, Resolver, ResolverOptions};

const GRAPHQL_PATH: &str = "/admin/api/2025-10/graphql.json";
const TOKEN: &str = "shpat_test_token";

fn catalog(server: &MockServer) -> ShopifyCatalog {
    ShopifyCatalog::with_endpoint(format!("{}{}", server.uri(), GRAPHQL_PATH), TOKEN)
}

fn products_body(nodes: Value, has_next_page: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "products": {
                "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor },
                "nodes": nodes
            }
        }
    })
}

fn metaobjects_body(nodes: Value) -> Value {
    json!({
        "data": {
            "metaobjects": {
                "pageInfo": { "hasNextPage": false, "endCursor": null },
                "nodes": nodes
            }
        }
    })
}

fn product_node(id: &str, title: &str, skus: &[&str], add_ons: Option<&str>) -> Value {
    let variants: Vec<Value> = skus
        .iter()
        .enumerate()
        .map(|(i, sku)| json!({ "id": format!("{}/variant/{}", id, i), "sku": sku }))
        .collect();
    json!({
        "id": id,
        "title": title,
        "variants": { "nodes": variants },
        "addOns": add_ons.map(|v| json!({ "value": v })),
        "options": null
    })
}

// =============================================================================
// Request shape and decoding
// =============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn product_search_sends_filter_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(header("X-Shopify-Access-Token", TOKEN))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "variables": { "query": "sku:*GAR-1*", "first": 10, "variants": 50, "after": null }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([product_node("gid://shopify/Product/1", "Hose", &["GAR-1"], None)]),
                false,
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let page = catalog(&server)
            .fetch_products_page("sku:*GAR-1*", None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id.as_str(), "gid://shopify/Product/1");
        assert_eq!(page.items[0].variants[0].sku.as_deref(), Some("GAR-1"));
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn search_fetches_remaining_variant_pages() {
        let server = MockServer::start().await;

        let mut first_page = product_node("P1", "Kit", &["KIT-A"], None);
        first_page["variants"]["pageInfo"] = json!({ "hasNextPage": true, "endCursor": "v1" });
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "query": "sku:*GAR-7*" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([first_page]),
                false,
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "id": "P1", "first": 50, "after": "v1" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "product": { "variants": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": [{ "id": "P1/variant/51", "sku": "GAR-7-XL" }]
                }}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = catalog(&server)
            .fetch_products_page("sku:*GAR-7*", None)
            .await
            .unwrap();

        let skus: Vec<Option<&str>> = page.items[0]
            .variants
            .iter()
            .map(|v| v.sku.as_deref())
            .collect();
        assert_eq!(skus, vec![Some("KIT-A"), Some("GAR-7-XL")]);
    }

    #[tokio::test]
    async fn variant_page_without_cursor_is_decode_error() {
        let server = MockServer::start().await;

        let mut node = product_node("P1", "Kit", &["KIT-A"], None);
        node["variants"]["pageInfo"] = json!({ "hasNextPage": true, "endCursor": null });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([node]),
                false,
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = catalog(&server).fetch_products_page("sku:*X*", None).await;

        assert!(matches!(result, Err(CatalogError::Decode(_))));
    }

    #[tokio::test]
    async fn full_scan_passes_cursor_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "after": "abc", "first": 100, "variants": 1 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([product_node("P9", "Set", &["SET-9"], Some(r#"["M1"]"#))]),
                true,
                Some("def"),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let page = catalog(&server)
            .with_page_size(100)
            .fetch_all_products_page(Some("abc"))
            .await
            .unwrap();

        assert_eq!(page.items[0].add_ons_refs.as_deref(), Some(r#"["M1"]"#));
        assert_eq!(page.items[0].options_refs, None);
        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn metaobjects_decode_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "type": "add_ons" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(metaobjects_body(json!([{
                "id": "M1",
                "displayName": "Gift wrap",
                "fields": [
                    { "key": "title", "value": "Gift wrap" },
                    { "key": "products", "value": "[\"P1\",\"P2\"]" },
                    { "key": "notes", "value": null }
                ]
            }]))))
            .mount(&server)
            .await;

        let page = catalog(&server)
            .fetch_metaobjects_page("add_ons", None)
            .await
            .unwrap();

        let m = &page.items[0];
        assert_eq!(m.display_name, "Gift wrap");
        assert_eq!(m.fields.len(), 3);
        let refs: Vec<String> = m.referenced_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(refs, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn shop_info_probe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "first": 5 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "shop": { "name": "Garden Supply", "myshopifyDomain": "garden.myshopify.com" },
                    "products": { "nodes": [{ "id": "P1", "title": "Hose" }] }
                }
            })))
            .mount(&server)
            .await;

        let info = catalog(&server).shop_info().await.unwrap();

        assert_eq!(info.name, "Garden Supply");
        assert_eq!(info.myshopify_domain, "garden.myshopify.com");
        assert_eq!(info.sample_products.len(), 1);
        assert_eq!(info.sample_products[0].title, "Hose");
    }
}

// =============================================================================
// Error mapping
// =============================================================================

mod errors {
    use super::*;

    async fn respond(template: ResponseTemplate) -> Result<(), CatalogError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(template)
            .mount(&server)
            .await;

        catalog(&server)
            .fetch_products_page("sku:*X*", None)
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn unauthorized() {
        let result = respond(ResponseTemplate::new(401).set_body_json(json!({
            "errors": "[API] Invalid API key or access token"
        })))
        .await;

        assert!(matches!(result, Err(CatalogError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn forbidden_keeps_message() {
        let result = respond(ResponseTemplate::new(403).set_body_json(json!({
            "errors": "Access denied for metaobjects field"
        })))
        .await;

        assert!(matches!(result, Err(CatalogError::AuthFailed(msg)) if msg.contains("Access denied")));
    }

    #[tokio::test]
    async fn too_many_requests() {
        let result = respond(ResponseTemplate::new(429)).await;
        assert_eq!(result, Err(CatalogError::RateLimited));
    }

    #[tokio::test]
    async fn server_error() {
        let result = respond(ResponseTemplate::new(503).set_body_string("upstream unavailable")).await;

        assert!(matches!(
            result,
            Err(CatalogError::ApiError { status: 503, message }) if message.contains("upstream unavailable")
        ));
    }

    #[tokio::test]
    async fn graphql_errors_win_over_data() {
        let result = respond(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [
                { "message": "Field 'metafield' doesn't exist" },
                { "message": "Second problem" }
            ]
        })))
        .await;

        assert_eq!(
            result,
            Err(CatalogError::GraphQl(
                "Field 'metafield' doesn't exist; Second problem".into()
            ))
        );
    }

    #[tokio::test]
    async fn graphql_error_string_is_upstream_error() {
        let result = respond(ResponseTemplate::new(200).set_body_json(json!({
            "errors": "Internal error. Looks like something went wrong on our end."
        })))
        .await;

        assert_eq!(
            result,
            Err(CatalogError::GraphQl(
                "Internal error. Looks like something went wrong on our end.".into()
            ))
        );
    }

    #[tokio::test]
    async fn throttled_payload_is_rate_limited() {
        let result = respond(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }]
        })))
        .await;

        assert_eq!(result, Err(CatalogError::RateLimited));
    }

    #[tokio::test]
    async fn unexpected_shape_is_decode_error() {
        let result = respond(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "products": { "nodes": [] } }
        })))
        .await;

        assert!(matches!(result, Err(CatalogError::Decode(_))));
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let result = respond(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;
        assert!(matches!(result, Err(CatalogError::Decode(_))));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(products_body(json!([]), false, None))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let result = catalog(&server)
            .with_timeout(Duration::from_millis(50))
            .fetch_products_page("sku:*X*", None)
            .await;

        assert!(matches!(result, Err(CatalogError::Timeout(_))));
    }

    #[tokio::test]
    async fn configured_timeout_applies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(products_body(json!([]), false, None))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let result = catalog(&server)
            .try_with_timeout(Duration::from_millis(50))
            .unwrap()
            .fetch_all_products_page(None)
            .await;

        assert!(matches!(result, Err(CatalogError::Timeout(_))));
    }
}

// =============================================================================
// Full search over HTTP
// =============================================================================

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn search_resolves_through_graphql() {
        let server = MockServer::start().await;

        // SKU search (up to 50 variants per candidate)
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "query": "sku:*gar-1*", "variants": 50 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([
                    product_node("P1", "Hose", &["GAR-1"], None),
                    product_node("P3", "Shovel", &["SHO-1"], None)
                ]),
                false,
                None,
            )))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "type": "add_ons" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(metaobjects_body(json!([
                { "id": "M1", "displayName": "Reel", "fields": [{ "key": "products", "value": "[\"P1\"]" }] },
                { "id": "M2", "displayName": "Other", "fields": [{ "key": "products", "value": "[\"P3\"]" }] }
            ]))))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "type": "options" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(metaobjects_body(json!([]))))
            .mount(&server)
            .await;

        // Full scan, two pages
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "variants": 1, "after": null } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([product_node("P1", "Hose", &["GAR-1"], None)]),
                true,
                Some("page-2"),
            )))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "variables": { "variants": 1, "after": "page-2" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
                json!([product_node("P2", "Bundle", &["BUN-1"], Some(r#"["M1","M2"]"#))]),
                false,
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = Resolver::new(Arc::new(catalog(&server)), ResolverOptions::default());
        let response = resolver.search("gar-1").await;

        assert_eq!(response.status_code(), 200, "{:?}", response.error);
        assert_eq!(response.found_in_products.len(), 1);
        assert_eq!(response.results.len(), 1);
        let parent = &response.results[0].parent_products[0];
        assert_eq!(parent.product_id.as_str(), "P2");
        assert_eq!(parent.metafield_type, MetafieldType::AddOns);
        assert_eq!(parent.metaobject_ids.len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let resolver = Resolver::new(Arc::new(catalog(&server)), ResolverOptions::default());
        let response = resolver.search("GAR-1").await;

        assert_eq!(response.error_kind, Some(ErrorKind::UpstreamError));
        assert_eq!(response.status_code(), 502);
        assert!(response.results.is_empty());
    }
}

// =============================================================================
// Live Shopify API Tests (behind feature flag)
// =============================================================================

#[cfg(feature = "live_shopify_tests")]
mod live_tests {
    use super::*;
    use reftrace::core::config::Config;

    fn live_catalog() -> Option<ShopifyCatalog> {
        let loaded = Config::load(None).ok()?;
        ShopifyCatalog::from_config(&loaded.config).ok()
    }

    #[tokio::test]
    async fn live_shop_info() {
        let Some(catalog) = live_catalog() else {
            eprintln!("Skipping: store domain or access token not configured");
            return;
        };

        let info = catalog.shop_info().await.unwrap();
        assert!(!info.myshopify_domain.is_empty());
    }

    #[tokio::test]
    async fn live_search_for_nonexistent_sku() {
        let Some(catalog) = live_catalog() else {
            eprintln!("Skipping: store domain or access token not configured");
            return;
        };

        let resolver = Resolver::new(Arc::new(catalog), ResolverOptions::default());
        let response = resolver.search("definitely-not-a-sku-xyz-123").await;

        assert_eq!(response.status_code(), 200);
        assert!(response.found_in_products.is_empty());
    }
}
