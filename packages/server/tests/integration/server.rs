use serde_json::json;

use crate::common::{TestApp, routes};

mod server_creation {
    use super::*;

    #[tokio::test]
    async fn creator_becomes_owner() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let category = app.create_category(&admin, "A").await;
        let me = app.get_with_token(routes::ME, &token).await;

        let res = app
            .post_with_token(
                routes::SERVERS,
                &json!({"name": "Rustaceans", "category_id": category}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["owner_id"], me.body["id"]);
        assert_eq!(res.body["category_id"], category);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(
                routes::SERVERS,
                &json!({"name": "Orphan", "category_id": 4242}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn anonymous_user_cannot_create_server() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::SERVERS, &json!({"name": "x", "category_id": 1}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod membership {
    use super::*;

    #[tokio::test]
    async fn join_and_leave_change_member_count() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let user = app.create_authenticated_user("alice", "securepass").await;
        let category = app.create_category(&admin, "A").await;
        let server = app.create_server(&admin, "s", category).await;
        let counted = format!("{}?with_num_members=true", routes::SERVERS);

        app.join_server(server, &user).await;
        app.join_server(server, &user).await;
        let res = app.get_without_token(&counted).await;
        assert_eq!(res.body[0]["num_members"], 1);

        let left = app
            .delete_with_token(&routes::server_members(server), &user)
            .await;
        assert_eq!(left.status, 204);
        let res = app.get_without_token(&counted).await;
        assert_eq!(res.body[0]["num_members"], 0);
    }
}

mod server_deletion {
    use super::*;

    #[tokio::test]
    async fn only_owner_or_admin_can_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let owner = app.create_authenticated_user("owner", "ownerpass").await;
        let other = app.create_authenticated_user("other", "otherpass").await;
        let category = app.create_category(&admin, "A").await;
        let server = app.create_server(&owner, "s", category).await;
        app.join_server(server, &other).await;
        app.create_channel(&other, server, "general").await;

        let denied = app.delete_with_token(&routes::server(server), &other).await;
        assert_eq!(denied.status, 403);
        assert_eq!(app.dependent_rows(server).await, (1, 1));

        let res = app.delete_with_token(&routes::server(server), &owner).await;
        assert_eq!(res.status, 204);

        let list = app.get_without_token(routes::SERVERS).await;
        assert!(list.ids().is_empty());
        assert_eq!(app.dependent_rows(server).await, (0, 0));
    }
}
