mod common;

use common::*;
use tinta::db::users;

#[tokio::test]
async fn login_sets_cookie_that_resolves_to_the_user() {
    let app = TestApp::new();
    let alice = app.register("alice", "hunter2").await;

    let cookie = app.login("alice", "hunter2").await;
    let token = cookie.trim_start_matches("token=");
    assert_eq!(app.state.keys.verify(token).unwrap(), alice.id);

    let response = app.send(get("/profile", Some(&cookie))).await;
    assert_eq!(response.status(), 200);
    assert!(body_text(response).await.contains("alice"));
}

#[tokio::test]
async fn login_redirects_by_role() {
    let app = TestApp::new();
    app.register("reader", "pw").await;
    app.admin("boss", "pw").await;

    let response = app
        .send(form_request("POST", "/admin", "username=reader&password=pw", None))
        .await;
    assert_eq!(location(&response), "/");

    let response = app
        .send(form_request("POST", "/admin", "username=boss&password=pw", None))
        .await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn bad_credentials_redirect_back_with_notice() {
    let app = TestApp::new();
    app.register("alice", "right").await;

    for body in ["username=alice&password=wrong", "username=nobody&password=right"] {
        let response = app.send(form_request("POST", "/admin", body, None)).await;
        assert_eq!(response.status(), 303);
        assert_eq!(location(&response), "/admin");
        assert!(token_cookie(&response).is_none());
        assert!(set_cookies(&response).iter().any(|c| c.starts_with("flash=Invalid")));
    }
}

#[tokio::test]
async fn missing_or_tampered_cookie_redirects_to_login() {
    let app = TestApp::new();
    app.register("alice", "pw").await;
    let cookie = app.login("alice", "pw").await;

    let response = app.send(get("/profile", None)).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/admin");

    let tampered = format!("{}x", cookie);
    let response = app.send(get("/profile", Some(&tampered))).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn role_change_applies_to_the_next_request() {
    let app = TestApp::new();
    let alice = app.register("alice", "pw").await;
    let cookie = app.login("alice", "pw").await;

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), 403);

    {
        let conn = app.state.db.get().unwrap();
        conn.execute("UPDATE users SET role = 'admin' WHERE id = ?1", [&alice.id])
            .unwrap();
    }

    // Same token, new role.
    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn deleted_user_token_is_rejected() {
    let app = TestApp::new();
    let alice = app.register("alice", "pw").await;
    let cookie = app.login("alice", "pw").await;

    {
        let conn = app.state.db.get().unwrap();
        conn.execute("DELETE FROM users WHERE id = ?1", [&alice.id]).unwrap();
    }

    let response = app.send(get("/profile", Some(&cookie))).await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn register_logs_in_and_rejects_duplicates() {
    let app = TestApp::new();

    let response = app
        .send(form_request("POST", "/register", "username=newbie&password=pw", None))
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/admin");
    assert!(token_cookie(&response).is_some());

    let response = app
        .send(form_request("POST", "/register", "username=newbie&password=other", None))
        .await;
    assert_eq!(location(&response), "/register");
    assert!(token_cookie(&response).is_none());
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("flash=")));
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = TestApp::new();
    let response = app.send(get("/logout", None)).await;
    assert_eq!(location(&response), "/");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn rename_rules() {
    let app = TestApp::new();
    let alice = app.register("alice", "pw").await;
    app.register("bob", "pw").await;
    app.admin("boss", "pw").await;
    let alice_cookie = app.login("alice", "pw").await;
    let boss_cookie = app.login("boss", "pw").await;

    let rename = |cookie: String, name: &'static str| {
        form_request(
            "POST",
            "/update-username",
            &format!("newUsername={}", name),
            Some(&cookie),
        )
    };

    let response = app.send(rename(alice_cookie.clone(), "ADMIN")).await;
    assert_eq!(response.status(), 403);

    let response = app.send(rename(alice_cookie.clone(), "bob")).await;
    assert_eq!(response.status(), 409);

    let response = app.send(rename(boss_cookie.clone(), "bigboss")).await;
    assert_eq!(response.status(), 403);

    let response = app.send(rename(alice_cookie.clone(), "alicia")).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/profile");

    let conn = app.state.db.get().unwrap();
    let renamed = users::find_by_id(&conn, &alice.id).unwrap().unwrap();
    assert_eq!(renamed.username, "alicia");
}
