use serde_json::json;

use crate::common::{TestApp, routes};

struct Scenario {
    app: TestApp,
    owner: String,
    server: i32,
}

async fn scenario() -> Scenario {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin", "adminpass").await;
    let owner = app.create_authenticated_user("owner", "ownerpass").await;
    let category = app.create_category(&admin, "A").await;
    let server = app.create_server(&owner, "home", category).await;
    Scenario { app, owner, server }
}

mod channel_names {
    use super::*;

    #[tokio::test]
    async fn name_is_lowercased_on_create() {
        let s = scenario().await;

        let res = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "General-CHAT", "topic": "Hi"}),
                &s.owner,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "general-chat");
    }

    #[tokio::test]
    async fn name_is_lowercased_on_update() {
        let s = scenario().await;
        let created = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "general", "topic": "Hi"}),
                &s.owner,
            )
            .await;
        let id = created.id();

        let res = s
            .app
            .patch_with_token(&routes::channel(id), &json!({"name": "OffTopic"}), &s.owner)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "offtopic");
        assert_eq!(res.body["topic"], "Hi");

        let list = s
            .app
            .get_without_token(&routes::server_channels(s.server))
            .await;
        assert_eq!(list.body[0]["name"], "offtopic");
    }
}

mod channel_access {
    use super::*;

    #[tokio::test]
    async fn outsider_cannot_create_channel() {
        let s = scenario().await;
        let outsider = s.app.create_authenticated_user("eve", "evepassword").await;

        let res = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "spam", "topic": ""}),
                &outsider,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn member_can_create_channel() {
        let s = scenario().await;
        let member = s.app.create_authenticated_user("bob", "bobpassword").await;
        s.app.join_server(s.server, &member).await;

        let res = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "Bobs", "topic": "mine"}),
                &member,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn server_owner_can_delete_members_channel() {
        let s = scenario().await;
        let member = s.app.create_authenticated_user("bob", "bobpassword").await;
        s.app.join_server(s.server, &member).await;
        let created = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "bobs", "topic": ""}),
                &member,
            )
            .await;

        let res = s
            .app
            .delete_with_token(&routes::channel(created.id()), &s.owner)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let list = s
            .app
            .get_without_token(&routes::server_channels(s.server))
            .await;
        assert!(list.ids().is_empty());
    }

    #[tokio::test]
    async fn topic_longer_than_limit_is_rejected() {
        let s = scenario().await;

        let res = s
            .app
            .post_with_token(
                &routes::server_channels(s.server),
                &json!({"name": "long", "topic": "x".repeat(101)}),
                &s.owner,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
