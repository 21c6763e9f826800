use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use mealtable_rs::{
    create_app,
    handlers::ApiState,
    init_observability,
    observability::Metrics,
    repositories::{
        seed_catalog, seed_policies, CatalogRepository, DynamoDbAddressRepository,
        DynamoDbBudgetRepository, DynamoDbCartRepository, DynamoDbCatalogRepository,
        DynamoDbExpenditureRepository, DynamoDbMemberRepository, DynamoDbPolicyRepository,
        PolicyRepository, TableManager,
    },
    services::{
        AuthService, BudgetService, CartService, CatalogService, DisabledSmsParsingClient,
        ExpenditureService, HomeService, OnboardingService,
    },
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref().unwrap_or(""),
        config.observability.enable_json_logging,
    )?;

    info!("Starting mealtable-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB tables: budgets={}, carts={}, expenditures={}",
        config.database.budgets_table, config.database.carts_table, config.database.expenditures_table
    );

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    let region = config.database.region.clone();

    let table_manager = TableManager::new(dynamodb_client.clone());
    if let Err(e) = table_manager.create_all_tables(&config.database).await {
        warn!("Table setup failed, continuing with existing tables: {}", e);
    }

    let member_repository = Arc::new(DynamoDbMemberRepository::new(
        dynamodb_client.clone(),
        config.database.members_table.clone(),
        config.database.credentials_table.clone(),
        region.clone(),
    ));
    let address_repository = Arc::new(DynamoDbAddressRepository::new(
        dynamodb_client.clone(),
        config.database.addresses_table.clone(),
        region.clone(),
    ));
    let policy_repository = Arc::new(DynamoDbPolicyRepository::new(
        dynamodb_client.clone(),
        config.database.policies_table.clone(),
        config.database.agreements_table.clone(),
        region.clone(),
    ));
    let budget_repository = Arc::new(DynamoDbBudgetRepository::new(
        dynamodb_client.clone(),
        config.database.budgets_table.clone(),
        region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        dynamodb_client.clone(),
        config.database.carts_table.clone(),
        region.clone(),
    ));
    let expenditure_repository = Arc::new(DynamoDbExpenditureRepository::new(
        dynamodb_client.clone(),
        config.database.expenditures_table.clone(),
        region.clone(),
    ));
    let catalog_repository = Arc::new(DynamoDbCatalogRepository::new(
        dynamodb_client.clone(),
        config.database.foods_table.clone(),
        config.database.stores_table.clone(),
        region.clone(),
    ));
    info!("Repositories initialized successfully");

    if let Err(e) = seed_reference_data(policy_repository.as_ref(), catalog_repository.as_ref()).await
    {
        warn!("Seeding reference data failed: {}", e);
    }

    let auth_service = Arc::new(AuthService::new(
        member_repository.clone(),
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_seconds(),
    ));
    let onboarding_service = Arc::new(OnboardingService::new(
        member_repository.clone(),
        address_repository.clone(),
        budget_repository.clone(),
        policy_repository.clone(),
    ));
    let budget_service = Arc::new(BudgetService::new(budget_repository.clone()));
    let cart_service = Arc::new(CartService::new(
        cart_repository.clone(),
        catalog_repository.clone(),
        budget_repository.clone(),
        expenditure_repository.clone(),
    ));
    let catalog_service = Arc::new(CatalogService::new(catalog_repository.clone()));
    let expenditure_service = Arc::new(ExpenditureService::new(
        expenditure_repository.clone(),
        budget_repository.clone(),
        Arc::new(DisabledSmsParsingClient),
    ));
    let home_service = Arc::new(HomeService::new(
        member_repository,
        address_repository,
        budget_repository,
        expenditure_repository,
    ));
    info!("Services initialized successfully");

    let state = ApiState {
        auth_service,
        onboarding_service,
        budget_service,
        cart_service,
        catalog_service,
        expenditure_service,
        home_service,
    };

    let app = create_app(metrics, state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Seed the policy and catalog tables with reference data. Existing items
/// are overwritten, which keeps the seed idempotent.
async fn seed_reference_data(
    policy_repository: &dyn PolicyRepository,
    catalog_repository: &dyn CatalogRepository,
) -> anyhow::Result<()> {
    for policy in seed_policies() {
        policy_repository.save_policy(policy).await?;
    }

    let (stores, foods) = seed_catalog();
    for store in stores {
        catalog_repository.save_store(store).await?;
    }
    for food in foods {
        catalog_repository.save_food(food).await?;
    }

    info!("Reference data seeded");
    Ok(())
}
