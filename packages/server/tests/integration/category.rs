use serde_json::json;

use crate::common::{TestApp, routes};

mod category_management {
    use super::*;

    #[tokio::test]
    async fn admin_created_category_is_persisted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Education", "description": "Learning"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let list = app.get_without_token(routes::CATEGORIES).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body[0]["name"], "Education");
        assert_eq!(list.body[0]["description"], "Learning");
        assert!(list.body[0]["icon"].is_null());
    }

    #[tokio::test]
    async fn non_admin_cannot_create_category() {
        let app = TestApp::spawn().await;
        let user = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"name": "Nope"}), &user)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn patch_updates_name_and_clears_description() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Old").await;

        let res = app
            .patch_with_token(
                &routes::category(id),
                &json!({"name": "New", "description": null}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "New");
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn deleting_category_removes_its_servers() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Doomed").await;
        let server = app.create_server(&admin, "s", id).await;
        app.join_server(server, &admin).await;
        app.create_channel(&admin, server, "general").await;

        let res = app.delete_with_token(&routes::category(id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let list = app.get_without_token(routes::SERVERS).await;
        assert!(!list.ids().contains(&server));
        assert_eq!(app.dependent_rows(server).await, (0, 0));
    }
}

mod category_icon {
    use super::*;

    #[tokio::test]
    async fn uploaded_icon_is_stored_under_category_path() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Art").await;

        let res = app
            .put_file_with_token(&routes::category_icon(id), "logo.png", b"png".to_vec(), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body["icon"],
            format!("category/{id}/category_icon/logo.png")
        );
        assert!(
            app.media
                .path()
                .join(format!("category/{id}/category_icon/logo.png"))
                .exists()
        );
    }

    #[tokio::test]
    async fn replacing_icon_deletes_the_previous_file() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Art").await;

        let first = app
            .put_file_with_token(&routes::category_icon(id), "old.png", b"old".to_vec(), &admin)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        let second = app
            .put_file_with_token(&routes::category_icon(id), "new.svg", b"<svg/>".to_vec(), &admin)
            .await;
        assert_eq!(second.status, 200, "{}", second.text);

        let dir = app.media.path().join(format!("category/{id}/category_icon"));
        assert!(!dir.join("old.png").exists());
        assert!(dir.join("new.svg").exists());

        let res = app
            .client
            .get(app.url(&routes::category_icon(id)))
            .send()
            .await
            .expect("Failed to send GET request");
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "image/svg+xml"
        );
        assert_eq!(res.bytes().await.unwrap().as_ref(), b"<svg/>");
    }

    #[tokio::test]
    async fn clearing_icon_deletes_the_file() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Art").await;
        app.put_file_with_token(&routes::category_icon(id), "a.png", b"a".to_vec(), &admin)
            .await;

        let res = app
            .delete_with_token(&routes::category_icon(id), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["icon"].is_null());
        assert!(
            !app.media
                .path()
                .join(format!("category/{id}/category_icon/a.png"))
                .exists()
        );
        let missing = app.get_without_token(&routes::category_icon(id)).await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn traversal_filename_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Art").await;

        let res = app
            .put_file_with_token(&routes::category_icon(id), "..", b"x".to_vec(), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_icon_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin", "adminpass").await;
        let id = app.create_category(&admin, "Art").await;

        let res = app
            .put_file_with_token(
                &routes::category_icon(id),
                "huge.png",
                vec![0u8; 64 * 1024 + 1],
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
