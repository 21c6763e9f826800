use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use mealtable_rs::create_app;
use mealtable_rs::handlers::ApiState;
use mealtable_rs::models::{
    AddressHistory, Cart, CatalogFilters, DailyBudget, Expenditure, ExpenditureFilters, Food,
    MealBudget, MealType, Member, MemberCredentials, MonthlyBudget, Policy, PolicyAgreement,
    RepositoryResult, Store,
};
use mealtable_rs::observability::Metrics;
use mealtable_rs::repositories::{
    AddressRepository, BudgetRepository, CartRepository, CatalogRepository, ExpenditureRepository,
    MemberRepository, PolicyRepository,
};
use mealtable_rs::services::{
    AuthService, BudgetService, CartService, CatalogService, DisabledSmsParsingClient,
    ExpenditureService, HomeService, OnboardingService,
};

const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

// In-memory repository implementations backing the real services

#[derive(Default)]
struct InMemoryMemberRepository {
    members: Mutex<HashMap<String, Member>>,
    credentials: Mutex<HashMap<String, MemberCredentials>>,
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find_member(&self, member_id: &str) -> RepositoryResult<Option<Member>> {
        Ok(self.members.lock().unwrap().get(member_id).cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn nickname_exists(&self, nickname: &str) -> RepositoryResult<bool> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .any(|m| m.nickname == nickname))
    }

    async fn save_member(&self, member: Member) -> RepositoryResult<Member> {
        self.members
            .lock()
            .unwrap()
            .insert(member.member_id.clone(), member.clone());
        Ok(member)
    }

    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<MemberCredentials>> {
        Ok(self.credentials.lock().unwrap().get(email).cloned())
    }

    async fn save_credentials(
        &self,
        credentials: MemberCredentials,
    ) -> RepositoryResult<MemberCredentials> {
        self.credentials
            .lock()
            .unwrap()
            .insert(credentials.email.clone(), credentials.clone());
        Ok(credentials)
    }
}

#[derive(Default)]
struct InMemoryAddressRepository {
    addresses: Mutex<Vec<AddressHistory>>,
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_addresses(&self, member_id: &str) -> RepositoryResult<Vec<AddressHistory>> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn find_primary_address(
        &self,
        member_id: &str,
    ) -> RepositoryResult<Option<AddressHistory>> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.member_id == member_id && a.is_primary)
            .cloned())
    }

    async fn save_address(&self, address: AddressHistory) -> RepositoryResult<AddressHistory> {
        self.addresses.lock().unwrap().push(address.clone());
        Ok(address)
    }
}

#[derive(Default)]
struct InMemoryPolicyRepository {
    policies: Mutex<HashMap<String, Policy>>,
    agreements: Mutex<Vec<PolicyAgreement>>,
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn find_policies(&self) -> RepositoryResult<Vec<Policy>> {
        Ok(self.policies.lock().unwrap().values().cloned().collect())
    }

    async fn save_policy(&self, policy: Policy) -> RepositoryResult<Policy> {
        self.policies
            .lock()
            .unwrap()
            .insert(policy.policy_id.clone(), policy.clone());
        Ok(policy)
    }

    async fn find_agreements(&self, member_id: &str) -> RepositoryResult<Vec<PolicyAgreement>> {
        Ok(self
            .agreements
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn save_agreement(
        &self,
        agreement: PolicyAgreement,
    ) -> RepositoryResult<PolicyAgreement> {
        self.agreements.lock().unwrap().push(agreement.clone());
        Ok(agreement)
    }
}

#[derive(Default)]
struct InMemoryBudgetRepository {
    monthly: Mutex<HashMap<(String, String), MonthlyBudget>>,
    daily: Mutex<HashMap<(String, NaiveDate), DailyBudget>>,
    meals: Mutex<HashMap<(String, NaiveDate, MealType), MealBudget>>,
}

#[async_trait]
impl BudgetRepository for InMemoryBudgetRepository {
    async fn find_monthly(
        &self,
        member_id: &str,
        month: &str,
    ) -> RepositoryResult<Option<MonthlyBudget>> {
        Ok(self
            .monthly
            .lock()
            .unwrap()
            .get(&(member_id.to_string(), month.to_string()))
            .cloned())
    }

    async fn save_monthly(&self, budget: MonthlyBudget) -> RepositoryResult<MonthlyBudget> {
        self.monthly.lock().unwrap().insert(
            (budget.member_id.clone(), budget.budget_month.clone()),
            budget.clone(),
        );
        Ok(budget)
    }

    async fn find_daily(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailyBudget>> {
        Ok(self
            .daily
            .lock()
            .unwrap()
            .get(&(member_id.to_string(), date))
            .cloned())
    }

    async fn save_daily(&self, budget: DailyBudget) -> RepositoryResult<DailyBudget> {
        self.daily
            .lock()
            .unwrap()
            .insert((budget.member_id.clone(), budget.budget_date), budget.clone());
        Ok(budget)
    }

    async fn find_meal_budgets(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<MealBudget>> {
        let meals = self.meals.lock().unwrap();
        Ok(MealType::ALL
            .into_iter()
            .filter_map(|mt| meals.get(&(member_id.to_string(), date, mt)).cloned())
            .collect())
    }

    async fn find_meal_budget(
        &self,
        member_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> RepositoryResult<Option<MealBudget>> {
        Ok(self
            .meals
            .lock()
            .unwrap()
            .get(&(member_id.to_string(), date, meal_type))
            .cloned())
    }

    async fn save_meal_budget(&self, budget: MealBudget) -> RepositoryResult<MealBudget> {
        self.meals.lock().unwrap().insert(
            (
                budget.member_id.clone(),
                budget.budget_date,
                budget.meal_type,
            ),
            budget.clone(),
        );
        Ok(budget)
    }
}

#[derive(Default)]
struct InMemoryCartRepository {
    carts: Mutex<HashMap<(String, String), Cart>>,
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<Option<Cart>> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .get(&(member_id.to_string(), store_id.to_string()))
            .cloned())
    }

    async fn find_carts(&self, member_id: &str) -> RepositoryResult<Vec<Cart>> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        self.carts
            .lock()
            .unwrap()
            .insert((cart.member_id.clone(), cart.store_id.clone()), cart.clone());
        Ok(cart)
    }

    async fn delete_cart(&self, member_id: &str, store_id: &str) -> RepositoryResult<()> {
        self.carts
            .lock()
            .unwrap()
            .remove(&(member_id.to_string(), store_id.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryExpenditureRepository {
    expenditures: Mutex<Vec<Expenditure>>,
}

#[async_trait]
impl ExpenditureRepository for InMemoryExpenditureRepository {
    async fn find_expenditure(
        &self,
        expenditure_id: &str,
    ) -> RepositoryResult<Option<Expenditure>> {
        Ok(self
            .expenditures
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.expenditure_id == expenditure_id)
            .cloned())
    }

    async fn find_expenditures(
        &self,
        member_id: &str,
        filters: &ExpenditureFilters,
    ) -> RepositoryResult<Vec<Expenditure>> {
        let mut matches: Vec<Expenditure> = self
            .expenditures
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.member_id == member_id && !e.deleted)
            .filter(|e| {
                let date = e.spent_at.date_naive();
                filters.start_date.map_or(true, |start| date >= start)
                    && filters.end_date.map_or(true, |end| date <= end)
                    && filters.meal_type.map_or(true, |mt| e.meal_type == Some(mt))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.spent_at.cmp(&a.spent_at));
        Ok(matches)
    }

    async fn save_expenditure(&self, expenditure: Expenditure) -> RepositoryResult<Expenditure> {
        let mut expenditures = self.expenditures.lock().unwrap();
        if let Some(existing) = expenditures
            .iter_mut()
            .find(|e| e.expenditure_id == expenditure.expenditure_id)
        {
            *existing = expenditure.clone();
        } else {
            expenditures.push(expenditure.clone());
        }
        Ok(expenditure)
    }
}

#[derive(Default)]
struct InMemoryCatalogRepository {
    foods: Mutex<HashMap<String, Food>>,
    stores: Mutex<HashMap<String, Store>>,
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_food(&self, food_id: &str) -> RepositoryResult<Option<Food>> {
        Ok(self.foods.lock().unwrap().get(food_id).cloned())
    }

    async fn find_foods(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Food>> {
        Ok(self
            .foods
            .lock()
            .unwrap()
            .values()
            .filter(|f| matches_name(&f.name, &filters.name))
            .filter(|f| matches_name(&f.category, &filters.category))
            .cloned()
            .collect())
    }

    async fn save_food(&self, food: Food) -> RepositoryResult<Food> {
        self.foods
            .lock()
            .unwrap()
            .insert(food.food_id.clone(), food.clone());
        Ok(food)
    }

    async fn find_store(&self, store_id: &str) -> RepositoryResult<Option<Store>> {
        Ok(self.stores.lock().unwrap().get(store_id).cloned())
    }

    async fn find_stores(&self, filters: &CatalogFilters) -> RepositoryResult<Vec<Store>> {
        Ok(self
            .stores
            .lock()
            .unwrap()
            .values()
            .filter(|s| matches_name(&s.name, &filters.name))
            .filter(|s| {
                filters.category.as_ref().map_or(true, |category| {
                    s.categories
                        .iter()
                        .any(|c| c.to_lowercase().contains(&category.to_lowercase()))
                })
            })
            .cloned()
            .collect())
    }

    async fn save_store(&self, store: Store) -> RepositoryResult<Store> {
        self.stores
            .lock()
            .unwrap()
            .insert(store.store_id.clone(), store.clone());
        Ok(store)
    }
}

fn matches_name(value: &str, filter: &Option<String>) -> bool {
    filter
        .as_ref()
        .map_or(true, |f| value.to_lowercase().contains(&f.to_lowercase()))
}

fn seed_catalog(catalog: &InMemoryCatalogRepository) {
    let mut stores = catalog.stores.lock().unwrap();
    stores.insert(
        "S001".to_string(),
        Store {
            store_id: "S001".to_string(),
            name: "김밥천국".to_string(),
            road_address: "서울시 관악구 봉천로 1".to_string(),
            categories: vec!["분식".to_string()],
            phone_number: Some("02-1234-5678".to_string()),
        },
    );
    stores.insert(
        "S002".to_string(),
        Store {
            store_id: "S002".to_string(),
            name: "한솥도시락".to_string(),
            road_address: "서울시 관악구 남부순환로 2".to_string(),
            categories: vec!["도시락".to_string()],
            phone_number: None,
        },
    );
    drop(stores);

    let mut foods = catalog.foods.lock().unwrap();
    foods.insert(
        "F001".to_string(),
        Food {
            food_id: "F001".to_string(),
            name: "참치김밥".to_string(),
            category: "분식".to_string(),
            price: Some(4_500),
            average_price: 4_000,
            store_id: Some("S001".to_string()),
        },
    );
    foods.insert(
        "F002".to_string(),
        Food {
            food_id: "F002".to_string(),
            name: "라면".to_string(),
            category: "분식".to_string(),
            price: None,
            average_price: 5_000,
            store_id: Some("S001".to_string()),
        },
    );
    foods.insert(
        "F003".to_string(),
        Food {
            food_id: "F003".to_string(),
            name: "치킨마요".to_string(),
            category: "도시락".to_string(),
            price: Some(5_500),
            average_price: 5_000,
            store_id: Some("S002".to_string()),
        },
    );
}

fn seed_policies(policies: &InMemoryPolicyRepository) {
    let mut map = policies.policies.lock().unwrap();
    map.insert(
        "terms-of-service".to_string(),
        Policy {
            policy_id: "terms-of-service".to_string(),
            title: "서비스 이용약관".to_string(),
            content: "서비스 이용약관 전문".to_string(),
            required: true,
        },
    );
    map.insert(
        "marketing".to_string(),
        Policy {
            policy_id: "marketing".to_string(),
            title: "마케팅 정보 수신 동의".to_string(),
            content: "마케팅 정보 수신 동의 전문".to_string(),
            required: false,
        },
    );
}

fn build_state() -> ApiState {
    let member_repository = Arc::new(InMemoryMemberRepository::default());
    let address_repository = Arc::new(InMemoryAddressRepository::default());
    let policy_repository = Arc::new(InMemoryPolicyRepository::default());
    let budget_repository = Arc::new(InMemoryBudgetRepository::default());
    let cart_repository = Arc::new(InMemoryCartRepository::default());
    let expenditure_repository = Arc::new(InMemoryExpenditureRepository::default());
    let catalog_repository = Arc::new(InMemoryCatalogRepository::default());

    seed_catalog(&catalog_repository);
    seed_policies(&policy_repository);

    ApiState {
        auth_service: Arc::new(AuthService::new(
            member_repository.clone(),
            TEST_JWT_SECRET.to_string(),
            3600,
        )),
        onboarding_service: Arc::new(OnboardingService::new(
            member_repository.clone(),
            address_repository.clone(),
            budget_repository.clone(),
            policy_repository,
        )),
        budget_service: Arc::new(BudgetService::new(budget_repository.clone())),
        cart_service: Arc::new(CartService::new(
            cart_repository,
            catalog_repository.clone(),
            budget_repository.clone(),
            expenditure_repository.clone(),
        )),
        catalog_service: Arc::new(CatalogService::new(catalog_repository)),
        expenditure_service: Arc::new(ExpenditureService::new(
            expenditure_repository.clone(),
            budget_repository.clone(),
            Arc::new(DisabledSmsParsingClient),
        )),
        home_service: Arc::new(HomeService::new(
            member_repository,
            address_repository,
            budget_repository,
            expenditure_repository,
        )),
    }
}

impl TestEnvironment {
    /// Start the real app on an ephemeral port, backed by in-memory stores
    pub async fn new() -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let app = create_app(metrics, build_state());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Sign up a fresh member and return their bearer token
    pub async fn signup(&self, email: &str, name: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/v1/auth/signup", self.base_url))
            .json(&json!({
                "email": email,
                "password": "passw0rd!",
                "name": name,
            }))
            .send()
            .await
            .expect("Failed to send signup request");

        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.expect("Failed to parse signup body");
        body["data"]["access_token"]
            .as_str()
            .expect("Token missing from signup response")
            .to_string()
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to send POST request")
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to send PUT request")
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send DELETE request")
    }
}
