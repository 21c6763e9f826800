mod common;

use common::TestEnvironment;
use chrono::Utc;
use serde_json::{json, Value};

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse response body")
}

// Auth

#[tokio::test]
async fn test_signup_returns_token() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .post(format!("{}/api/v1/auth/signup", env.base_url))
        .json(&json!({
            "email": "kim@example.com",
            "password": "passw0rd!",
            "name": "김철수",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body = body(response).await;
    assert_eq!(body["result"], "SUCCESS");
    assert!(body["data"]["access_token"].as_str().is_some());
    assert!(body["data"]["member_id"].as_str().is_some());
    assert_eq!(body["data"]["expires_in_seconds"], 3600);
}

#[tokio::test]
async fn test_signup_duplicate_email_conflict() {
    let env = TestEnvironment::new().await;
    env.signup("dup@example.com", "첫번째").await;

    let response = env
        .client
        .post(format!("{}/api/v1/auth/signup", env.base_url))
        .json(&json!({
            "email": "dup@example.com",
            "password": "passw0rd!",
            "name": "두번째",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    let body = body(response).await;
    assert_eq!(body["result"], "ERROR");
    assert_eq!(body["error"]["code"], "E409");
}

#[tokio::test]
async fn test_signup_weak_password_rejected() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .post(format!("{}/api/v1/auth/signup", env.base_url))
        .json(&json!({
            "email": "weak@example.com",
            "password": "short",
            "name": "약한비번",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(body(response).await["error"]["code"], "E422");
}

#[tokio::test]
async fn test_login_and_wrong_password() {
    let env = TestEnvironment::new().await;
    env.signup("login@example.com", "로그인").await;

    let response = env
        .client
        .post(format!("{}/api/v1/auth/login", env.base_url))
        .json(&json!({"email": "login@example.com", "password": "passw0rd!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(body(response).await["data"]["access_token"].as_str().is_some());

    let response = env
        .client
        .post(format!("{}/api/v1/auth/login", env.base_url))
        .json(&json!({"email": "login@example.com", "password": "wrongpw1!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(body(response).await["error"]["code"], "E401");
}

#[tokio::test]
async fn test_account_locks_after_repeated_failures() {
    let env = TestEnvironment::new().await;
    env.signup("lock@example.com", "잠금").await;

    for _ in 0..4 {
        let response = env
            .client
            .post(format!("{}/api/v1/auth/login", env.base_url))
            .json(&json!({"email": "lock@example.com", "password": "wrongpw1!"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    // The fifth failure locks the account
    let response = env
        .client
        .post(format!("{}/api/v1/auth/login", env.base_url))
        .json(&json!({"email": "lock@example.com", "password": "wrongpw1!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Correct password no longer helps once the account is locked
    let response = env
        .client
        .post(format!("{}/api/v1/auth/login", env.base_url))
        .json(&json!({"email": "lock@example.com", "password": "passw0rd!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(body(response).await["error"]["code"], "E403");
}

#[tokio::test]
async fn test_missing_token_unauthorized() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .get(format!("{}/api/v1/home/dashboard", env.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(body(response).await["error"]["code"], "E401");
}

// Onboarding

#[tokio::test]
async fn test_profile_update_and_duplicate_nickname() {
    let env = TestEnvironment::new().await;
    let token_a = env.signup("a@example.com", "회원A").await;
    let token_b = env.signup("b@example.com", "회원B").await;

    let response = env
        .post("/api/v1/onboarding/profile", &token_a, json!({"nickname": "밥순이"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["nickname"], "밥순이");

    let response = env
        .post("/api/v1/onboarding/profile", &token_b, json!({"nickname": "밥순이"}))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(body(response).await["error"]["code"], "E409");
}

#[tokio::test]
async fn test_first_address_becomes_primary() {
    let env = TestEnvironment::new().await;
    let token = env.signup("addr@example.com", "주소").await;

    let response = env
        .post(
            "/api/v1/onboarding/address",
            &token,
            json!({
                "alias": "집",
                "road_address": "서울시 관악구 봉천로 1",
                "detail": "101동 202호",
                "kind": "home",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(body(response).await["data"]["is_primary"], true);

    let response = env
        .post(
            "/api/v1/onboarding/address",
            &token,
            json!({
                "alias": "회사",
                "road_address": "서울시 강남구 테헤란로 2",
                "kind": "work",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(body(response).await["data"]["is_primary"], false);
}

#[tokio::test]
async fn test_budget_setup_and_repeat_conflict() {
    let env = TestEnvironment::new().await;
    let token = env.signup("budget@example.com", "예산").await;

    let request = json!({
        "monthly_budget": 300_000,
        "daily_budget": 10_000,
        "meal_budgets": {"breakfast": 2_000, "lunch": 5_000, "dinner": 3_000},
    });

    let response = env.post("/api/v1/onboarding/budget", &token, request.clone()).await;
    assert_eq!(response.status().as_u16(), 201);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["monthly_budget"]["amount"], 300_000);
    assert_eq!(body_json["data"]["daily_budget"]["amount"], 10_000);
    assert_eq!(
        body_json["data"]["daily_budget"]["meal_budgets"]
            .as_array()
            .unwrap()
            .len(),
        3
    );

    let response = env.post("/api/v1/onboarding/budget", &token, request).await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(body(response).await["error"]["code"], "E409");
}

#[tokio::test]
async fn test_budget_setup_rejects_bad_meal_split() {
    let env = TestEnvironment::new().await;
    let token = env.signup("split@example.com", "배분").await;

    let response = env
        .post(
            "/api/v1/onboarding/budget",
            &token,
            json!({
                "monthly_budget": 300_000,
                "daily_budget": 10_000,
                "meal_budgets": {"breakfast": 2_000, "lunch": 5_000, "dinner": 5_000},
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(body(response).await["error"]["code"], "E422");
}

#[tokio::test]
async fn test_policy_agreement_requires_mandatory_policies() {
    let env = TestEnvironment::new().await;
    let token = env.signup("policy@example.com", "약관").await;

    let response = env
        .post(
            "/api/v1/onboarding/policy-agreement",
            &token,
            json!({"agreements": [{"policy_id": "marketing", "agreed": true}]}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(body(response).await["error"]["code"], "E422");

    let response = env
        .post(
            "/api/v1/onboarding/policy-agreement",
            &token,
            json!({"agreements": [
                {"policy_id": "terms-of-service", "agreed": true},
                {"policy_id": "marketing", "agreed": false},
            ]}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"].as_array().unwrap().len(), 2);
}

// Budgets

async fn setup_budget(env: &TestEnvironment, token: &str) {
    let response = env
        .post(
            "/api/v1/onboarding/budget",
            token,
            json!({
                "monthly_budget": 300_000,
                "daily_budget": 10_000,
                "meal_budgets": {"breakfast": 2_000, "lunch": 5_000, "dinner": 3_000},
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_get_and_update_monthly_budget() {
    let env = TestEnvironment::new().await;
    let token = env.signup("monthly@example.com", "월예산").await;
    setup_budget(&env, &token).await;

    let response = env.get("/api/v1/budgets/monthly", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["amount"], 300_000);
    assert_eq!(body_json["data"]["remaining"], 300_000);
    let month = body_json["data"]["budget_month"].as_str().unwrap().to_string();

    let response = env
        .put(
            &format!("/api/v1/budgets/monthly/{}", month),
            &token,
            json!({"amount": 350_000}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["amount"], 350_000);
}

#[tokio::test]
async fn test_monthly_budget_missing_and_bad_month() {
    let env = TestEnvironment::new().await;
    let token = env.signup("nomonthly@example.com", "무예산").await;

    let response = env.get("/api/v1/budgets/monthly", &token).await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(body(response).await["error"]["code"], "E404");

    let response = env
        .put("/api/v1/budgets/monthly/2025-13", &token, json!({"amount": 1}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(body(response).await["error"]["code"], "E400");
}

#[tokio::test]
async fn test_get_and_update_daily_budget() {
    let env = TestEnvironment::new().await;
    let token = env.signup("daily@example.com", "일예산").await;
    setup_budget(&env, &token).await;

    let response = env.get("/api/v1/budgets/daily", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["amount"], 10_000);
    let date = body_json["data"]["budget_date"].as_str().unwrap().to_string();

    let response = env
        .put(
            &format!("/api/v1/budgets/daily/{}", date),
            &token,
            json!({
                "amount": 12_000,
                "meal_budgets": {"breakfast": 3_000, "lunch": 5_000, "dinner": 4_000},
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["amount"], 12_000);

    // Mismatched split is rejected
    let response = env
        .put(
            &format!("/api/v1/budgets/daily/{}", date),
            &token,
            json!({
                "amount": 12_000,
                "meal_budgets": {"breakfast": 1_000, "lunch": 1_000, "dinner": 1_000},
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
}

// Cart and checkout

#[tokio::test]
async fn test_cart_flow_and_checkout() {
    let env = TestEnvironment::new().await;
    let token = env.signup("cart@example.com", "장바구니").await;
    setup_budget(&env, &token).await;

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S001", "food_id": "F001", "quantity": 2}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["replaced_cart"], false);
    assert_eq!(body_json["data"]["cart"]["subtotal"], 9_000);

    // A second store conflicts unless the cart is replaced
    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S002", "food_id": "F003", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(body(response).await["error"]["code"], "E409");

    let response = env.get("/api/v1/cart", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"].as_array().unwrap().len(), 1);

    let response = env
        .put(
            "/api/v1/cart/items/F001",
            &token,
            json!({"store_id": "S001", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["subtotal"], 4_500);

    let response = env
        .post(
            "/api/v1/cart/checkout",
            &token,
            json!({"store_id": "S001", "discount_amount": 500, "meal_type": "lunch"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["subtotal"], 4_500);
    assert_eq!(body_json["data"]["final_amount"], 4_000);
    assert_eq!(body_json["data"]["budget_summary"]["daily_budget_after"], 6_000);
    assert_eq!(body_json["data"]["budget_summary"]["meal_budget_after"], 1_000);
    assert_eq!(
        body_json["data"]["budget_summary"]["monthly_budget_after"],
        296_000
    );

    // Checkout clears the cart
    let response = env.get("/api/v1/cart", &token).await;
    assert_eq!(body(response).await["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cart_replace_across_stores() {
    let env = TestEnvironment::new().await;
    let token = env.signup("replace@example.com", "교체").await;

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S001", "food_id": "F001", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S002", "food_id": "F003", "quantity": 1, "replace_cart": true}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["replaced_cart"], true);
    assert_eq!(body_json["data"]["cart"]["store_id"], "S002");
}

#[tokio::test]
async fn test_remove_last_item_deletes_cart() {
    let env = TestEnvironment::new().await;
    let token = env.signup("remove@example.com", "삭제").await;

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S001", "food_id": "F001", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = env
        .delete("/api/v1/cart/items/F001?store_id=S001", &token)
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let response = env.get("/api/v1/cart", &token).await;
    assert_eq!(body(response).await["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_checkout_discount_exceeding_subtotal_rejected() {
    let env = TestEnvironment::new().await;
    let token = env.signup("discount@example.com", "할인").await;
    setup_budget(&env, &token).await;

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S001", "food_id": "F001", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = env
        .post(
            "/api/v1/cart/checkout",
            &token,
            json!({"store_id": "S001", "discount_amount": 99_999}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(body(response).await["error"]["code"], "E422");
}

#[tokio::test]
async fn test_checkout_without_budget_plan_fails() {
    let env = TestEnvironment::new().await;
    let token = env.signup("noplan@example.com", "무계획").await;

    let response = env
        .post(
            "/api/v1/cart/items",
            &token,
            json!({"store_id": "S001", "food_id": "F001", "quantity": 1}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = env
        .post("/api/v1/cart/checkout", &token, json!({"store_id": "S001"}))
        .await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(body(response).await["error"]["code"], "E404");
}

// Expenditures

#[tokio::test]
async fn test_expenditure_lifecycle() {
    let env = TestEnvironment::new().await;
    let token = env.signup("spend@example.com", "지출").await;
    setup_budget(&env, &token).await;

    let response = env
        .post(
            "/api/v1/expenditures",
            &token,
            json!({
                "store_name": "김밥천국",
                "amount": 7_000,
                "meal_type": "lunch",
                "memo": "점심",
                "spent_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body_json = body(response).await;
    let expenditure_id = body_json["data"]["expenditure_id"].as_str().unwrap().to_string();
    assert_eq!(body_json["data"]["amount"], 7_000);

    let response = env.get("/api/v1/expenditures", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["total_count"], 1);

    let response = env
        .get(&format!("/api/v1/expenditures/{}", expenditure_id), &token)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["memo"], "점심");

    let response = env
        .put(
            &format!("/api/v1/expenditures/{}", expenditure_id),
            &token,
            json!({"memo": "회사 점심", "meal_type": "lunch"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["memo"], "회사 점심");

    let response = env
        .delete(&format!("/api/v1/expenditures/{}", expenditure_id), &token)
        .await;
    assert_eq!(response.status().as_u16(), 200);

    // Deleted expenditures disappear from reads and listings
    let response = env
        .get(&format!("/api/v1/expenditures/{}", expenditure_id), &token)
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = env.get("/api/v1/expenditures", &token).await;
    assert_eq!(body(response).await["data"]["total_count"], 0);
}

#[tokio::test]
async fn test_expenditure_of_another_member_is_denied() {
    let env = TestEnvironment::new().await;
    let owner_token = env.signup("owner@example.com", "주인").await;
    let other_token = env.signup("other@example.com", "타인").await;
    setup_budget(&env, &owner_token).await;

    let response = env
        .post(
            "/api/v1/expenditures",
            &owner_token,
            json!({
                "store_name": "김밥천국",
                "amount": 7_000,
                "meal_type": "lunch",
                "spent_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let expenditure_id = body(response).await["data"]["expenditure_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = env
        .get(&format!("/api/v1/expenditures/{}", expenditure_id), &other_token)
        .await;
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(body(response).await["error"]["code"], "E403");

    let response = env
        .put(
            &format!("/api/v1/expenditures/{}", expenditure_id),
            &other_token,
            json!({"memo": "남의 지출"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let response = env
        .delete(&format!("/api/v1/expenditures/{}", expenditure_id), &other_token)
        .await;
    assert_eq!(response.status().as_u16(), 403);

    // The owner still sees it untouched
    let response = env
        .get(&format!("/api/v1/expenditures/{}", expenditure_id), &owner_token)
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_expenditure_requires_budget_plan() {
    let env = TestEnvironment::new().await;
    let token = env.signup("nobudget@example.com", "무예산지출").await;

    let response = env
        .post(
            "/api/v1/expenditures",
            &token,
            json!({
                "store_name": "김밥천국",
                "amount": 7_000,
                "spent_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(body(response).await["error"]["code"], "E404");
}

#[tokio::test]
async fn test_expenditure_list_filters_by_meal_type() {
    let env = TestEnvironment::new().await;
    let token = env.signup("filter@example.com", "필터").await;
    setup_budget(&env, &token).await;

    for (meal, amount) in [("breakfast", 2_000), ("lunch", 6_000)] {
        let response = env
            .post(
                "/api/v1/expenditures",
                &token,
                json!({
                    "store_name": "김밥천국",
                    "amount": amount,
                    "meal_type": meal,
                    "spent_at": Utc::now().to_rfc3339(),
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let response = env
        .get("/api/v1/expenditures?meal_type=lunch", &token)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["total_count"], 1);
    assert_eq!(body_json["data"]["expenditures"][0]["amount"], 6_000);
}

#[tokio::test]
async fn test_parse_sms_kb_message() {
    let env = TestEnvironment::new().await;
    let token = env.signup("sms@example.com", "문자").await;

    let response = env
        .post(
            "/api/v1/expenditures/parse-sms",
            &token,
            json!({"message": "[KB국민카드] 08/25 12:30 승인 12,000원 홍길동 김밥천국 강남점"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["amount"], 12_000);
    assert_eq!(body_json["data"]["store_name"], "김밥천국 강남점");
}

#[tokio::test]
async fn test_parse_sms_unrecognized_message() {
    let env = TestEnvironment::new().await;
    let token = env.signup("badsms@example.com", "못읽음").await;

    let response = env
        .post(
            "/api/v1/expenditures/parse-sms",
            &token,
            json!({"message": "오늘 점심 뭐 먹을까?"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(body(response).await["error"]["code"], "E422");
}

// Catalog

#[tokio::test]
async fn test_catalog_browsing() {
    let env = TestEnvironment::new().await;
    let token = env.signup("catalog@example.com", "목록").await;

    let response = env.get("/api/v1/foods?category=분식", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["total_count"], 2);

    let response = env.get("/api/v1/foods/F001", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["name"], "참치김밥");

    let response = env.get("/api/v1/foods/F999", &token).await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(body(response).await["error"]["code"], "E404");

    let response = env.get("/api/v1/stores?name=김밥", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["total_count"], 1);
    assert_eq!(body_json["data"]["stores"][0]["store_id"], "S001");

    let response = env.get("/api/v1/stores/S002", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["name"], "한솥도시락");
}

// Home dashboard

#[tokio::test]
async fn test_home_dashboard() {
    let env = TestEnvironment::new().await;
    let token = env.signup("home@example.com", "홈").await;

    let response = env
        .post(
            "/api/v1/onboarding/address",
            &token,
            json!({"alias": "집", "road_address": "서울시 관악구 봉천로 1", "kind": "home"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    setup_budget(&env, &token).await;

    let response = env
        .post(
            "/api/v1/expenditures",
            &token,
            json!({
                "store_name": "김밥천국",
                "amount": 4_000,
                "meal_type": "lunch",
                "spent_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = env.get("/api/v1/home/dashboard", &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body_json = body(response).await;
    assert_eq!(body_json["data"]["primary_address"]["alias"], "집");
    assert_eq!(body_json["data"]["monthly_budget"]["remaining"], 296_000);
    assert_eq!(body_json["data"]["today_spent"], 4_000);

    let lunch = body_json["data"]["meal_spending"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["meal_type"] == "lunch")
        .unwrap()
        .clone();
    assert_eq!(lunch["spent"], 4_000);
}

#[tokio::test]
async fn test_home_dashboard_requires_primary_address() {
    let env = TestEnvironment::new().await;
    let token = env.signup("noaddr@example.com", "무주소").await;

    let response = env.get("/api/v1/home/dashboard", &token).await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(body(response).await["error"]["code"], "E404");
}

// Middleware and health

#[tokio::test]
async fn test_non_json_content_type_rejected() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .post(format!("{}/api/v1/auth/login", env.base_url))
        .header("content-type", "text/plain")
        .body("email=a@b.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 415);
    assert_eq!(body(response).await["error"]["code"], "E415");
}

#[tokio::test]
async fn test_health_endpoints() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .get(format!("{}/health/liveness", env.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(body(response).await["data"]["status"], "UP");

    let response = env
        .client
        .get(format!("{}/health/readiness", env.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}
