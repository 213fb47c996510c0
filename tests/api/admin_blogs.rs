use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn publish_returns_200_with_the_persisted_post() {
    let test_app = TestApp::spawn_app().await;
    let body = json!({
        "title": "  Hello, World!  ",
        "excerpt": " First post ",
        "content": "<p>Welcome to the blog</p>",
        "category": "News",
        "tags": "a, b , ,c",
        "featuredImage": "https://cdn.example.com/front.jpg"
    });

    let response = test_app
        .post_blog(&body, Some(&test_app.admin_token()))
        .await;

    assert_eq!(200, response.status().as_u16());
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["message"], "Blog post created successfully");

    let post = &payload["blogPost"];
    assert_eq!(post["title"], "Hello, World!");
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["excerpt"], "First post");
    assert_eq!(post["tags"], json!(["a", "b", "c"]));
    assert_eq!(post["featuredImage"], "https://cdn.example.com/front.jpg");
    assert_eq!(post["isPublished"], true);
    assert!(post["publishedAt"].is_string());
    assert_eq!(post["author"]["id"], test_app.admin.id.to_string());
    assert_eq!(post["author"]["firstName"], "Jordan");
    assert_eq!(post["author"]["email"], "jordan@brokerage.example.com");

    assert_eq!(test_app.store.posts().unwrap().len(), 1);
}

#[tokio::test]
async fn structured_tags_are_kept_as_sent() {
    let test_app = TestApp::spawn_app().await;
    let body = json!({"title": "Tags", "content": "<p>x</p>", "tags": ["x", "y"]});

    let response = test_app
        .post_blog(&body, Some(&test_app.admin_token()))
        .await;

    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["blogPost"]["tags"], json!(["x", "y"]));
}

#[tokio::test]
async fn publish_returns_400_when_title_or_content_is_missing() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber("reader@example.com", true);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let test_cases = vec![
        (json!({"content": "<p>Body</p>"}), "missing title"),
        (json!({"title": "Title"}), "missing content"),
        (json!({"title": "   ", "content": "<p>Body</p>"}), "blank title"),
        (json!({"title": "!!!", "content": "<p>Body</p>"}), "title without a slug"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app
            .post_blog(&invalid_body, Some(&test_app.admin_token()))
            .await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
        let payload: serde_json::Value = response.json().await.unwrap();
        assert!(payload["error"].is_string());
    }

    assert_eq!(test_app.store.call_count(), 0);
    assert!(test_app.store.posts().unwrap().is_empty());
}

#[tokio::test]
async fn publish_returns_400_for_a_title_with_an_existing_slug() {
    let test_app = TestApp::spawn_app().await;
    test_app.publish("Open House!").await;

    let body = json!({"title": "open house", "content": "<p>Again</p>"});
    let response = test_app
        .post_blog(&body, Some(&test_app.admin_token()))
        .await;

    assert_eq!(400, response.status().as_u16());
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["error"], "A blog post with this title already exists");
    assert_eq!(test_app.store.posts().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_publishes_of_the_same_title_create_one_post() {
    let test_app = TestApp::spawn_app().await;
    let body = json!({"title": "Race Day", "content": "<p>Go</p>"});
    let token = test_app.admin_token();

    let (first, second) = tokio::join!(
        test_app.post_blog(&body, Some(&token)),
        test_app.post_blog(&body, Some(&token))
    );

    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 400]);
    assert_eq!(test_app.store.posts().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_endpoints_reject_missing_invalid_and_non_admin_tokens() {
    let test_app = TestApp::spawn_app().await;
    let body = json!({"title": "Sneaky", "content": "<p>No</p>"});
    let user_token = test_app.user_token();
    let test_cases = vec![
        (None, 401, "no token"),
        (Some("not-a-jwt"), 401, "an invalid token"),
        (Some(user_token.as_str()), 403, "a non-admin token"),
    ];

    for (token, status, description) in test_cases {
        let responses = vec![
            test_app.post_blog(&body, token).await,
            test_app.get_blogs("", token).await,
            test_app.get_admin_users(token).await,
        ];

        for response in responses {
            assert_eq!(
                status,
                response.status().as_u16(),
                "Unexpected status for {} with {}",
                response.url(),
                description
            );
        }
    }

    assert_eq!(test_app.store.call_count(), 0);
}

#[tokio::test]
async fn non_admin_with_a_malformed_body_is_still_forbidden() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/admin/blogs", test_app.address))
        .bearer_auth(test_app.user_token())
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn malformed_body_from_an_admin_is_a_400() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/admin/blogs", test_app.address))
        .bearer_auth(test_app.admin_token())
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    assert_eq!(test_app.store.call_count(), 0);
}

#[tokio::test]
async fn notifications_are_delivered_to_active_subscribers_only() {
    let test_app = TestApp::spawn_app().await;
    for i in 0..3 {
        test_app.add_subscriber(&format!("active{}@example.com", i), true);
    }
    for i in 0..2 {
        test_app.add_subscriber(&format!("inactive{}@example.com", i), false);
    }

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&test_app.email_server)
        .await;

    test_app.publish("Three Bedroom Listings").await;

    let received = test_app.wait_for_emails(3).await;
    assert_eq!(received.len(), 3);

    let mut recipients: Vec<String> = received
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["personalizations"][0]["to"][0]["email"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    recipients.sort();
    assert_eq!(
        recipients,
        vec![
            "active0@example.com",
            "active1@example.com",
            "active2@example.com"
        ]
    );
}

#[tokio::test]
async fn notification_links_to_the_published_post() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber("reader@example.com", true);

    Mock::given(path("/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    test_app.publish("Mortgage Rates in May").await;

    let received = test_app.wait_for_emails(1).await;
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["subject"], "New Blog Post: Mortgage Rates in May");

    let html = body["content"][0]["value"].as_str().unwrap();
    let links: Vec<_> = linkify::LinkFinder::new()
        .links(html)
        .filter(|l| *l.kind() == linkify::LinkKind::Url)
        .map(|l| l.as_str().to_string())
        .collect();
    let site_url = test_app.site_url.trim_end_matches('/');
    assert!(links.contains(&format!("{}/blog/mortgage-rates-in-may", site_url)));
    assert!(links.contains(&format!("{}/newsletter/unsubscribe", site_url)));
    assert!(html.contains("Read our latest blog post!"));
}

#[tokio::test]
async fn publish_succeeds_even_when_every_notification_fails() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber("one@example.com", true);
    test_app.add_subscriber("two@example.com", true);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&test_app.email_server)
        .await;

    let body = json!({"title": "Still Published", "content": "<p>Yes</p>"});
    let response = test_app
        .post_blog(&body, Some(&test_app.admin_token()))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(test_app.wait_for_emails(2).await.len(), 2);
    assert_eq!(test_app.store.posts().unwrap().len(), 1);
}

#[tokio::test]
async fn second_page_of_fifteen_posts_has_five_posts() {
    let test_app = TestApp::spawn_app().await;
    for i in 0..15 {
        test_app.publish(&format!("Listing number {}", i)).await;
    }

    let response = test_app
        .get_blogs("?page=2&limit=10", Some(&test_app.admin_token()))
        .await;

    assert_eq!(200, response.status().as_u16());
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["posts"].as_array().unwrap().len(), 5);
    assert_eq!(
        payload["pagination"],
        json!({"page": 2, "limit": 10, "total": 15, "totalPages": 2})
    );
}

#[tokio::test]
async fn listing_falls_back_to_defaults_and_caps_the_limit() {
    let test_app = TestApp::spawn_app().await;
    test_app.publish("Only Post").await;
    let token = test_app.admin_token();

    let defaults: serde_json::Value = test_app
        .get_blogs("?page=abc&limit=", Some(&token))
        .await
        .json()
        .await
        .unwrap();
    let capped: serde_json::Value = test_app
        .get_blogs("?limit=1000", Some(&token))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(defaults["pagination"]["page"], 1);
    assert_eq!(defaults["pagination"]["limit"], 10);
    assert_eq!(capped["pagination"]["limit"], 100);
    assert_eq!(capped["posts"][0]["slug"], "only-post");
}

#[tokio::test]
async fn listing_a_page_far_past_the_end_returns_no_posts() {
    let test_app = TestApp::spawn_app().await;
    test_app.publish("Lonely Post").await;

    let response = test_app
        .get_blogs(
            "?page=9223372036854775807&limit=10",
            Some(&test_app.admin_token()),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["posts"], json!([]));
    assert_eq!(payload["pagination"]["total"], 1);
}
