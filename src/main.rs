//! plangate - tiered content catalog administration

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plangate::{
    auth::{admin_bypass, can_access, upgrade_hint, Identity, MemorySessionStore, PlanSimulator},
    catalog::{CatalogAdmin, CatalogFilter, FixedCatalog, HybridResolver},
    config::{Args, Command, DynamicCommand, MatrixCommand},
    db::{MongoCatalogStore, MongoClient},
    features::FeatureMatrixService,
    logging::{AuditEvent, AuditEventType, AuditLogger},
    store::{CatalogStore, DynamicItemPatch, MemoryCatalogStore, NewDynamicItem, OverridePatch},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so command output on stdout stays machine-readable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("plangate={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  plangate - tiered content catalog");
    info!("======================================");
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    if !args.dev_mode {
        info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    }

    let audit = AuditLogger::new();
    if let Some(path) = args.audit_log.clone() {
        audit
            .init_file(path)
            .await
            .context("Failed to open audit log")?;
    }

    if args.dev_mode {
        info!("Using in-memory catalog store");
        run(args, Arc::new(MemoryCatalogStore::new()), audit).await
    } else {
        let client = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => client,
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        };
        let store = MongoCatalogStore::new(&client).await?;
        run(args, Arc::new(store), audit).await
    }
}

async fn run<S: CatalogStore + 'static>(
    args: Args,
    store: Arc<S>,
    audit: AuditLogger,
) -> anyhow::Result<()> {
    let fixed = Arc::new(FixedCatalog::builtin());
    let resolver = HybridResolver::new(store.clone(), fixed.clone());
    let admin = CatalogAdmin::new(store.clone(), fixed, audit.clone());
    let matrix = FeatureMatrixService::new(store, audit.clone());
    let actor = Identity::admin(args.actor.as_str());

    match args.command {
        Command::Resolve {
            kind,
            plan,
            category,
            age_range,
            search,
            include_inactive,
        } => {
            let items = resolver.resolve(kind).await?;

            let mut filter = CatalogFilter::new();
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if let Some(age_range) = age_range {
                filter = filter.age_range(age_range);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }
            if include_inactive {
                filter = filter.include_inactive();
            }
            if let Some(plan) = plan {
                filter = filter.accessible_for(plangate::auth::EffectivePlan::real(plan), false);
            }

            print_json(&filter.apply(&items))?;
            info!(kind = %kind, stats = ?resolver.get_stats(), "Resolved");
        }

        Command::Override {
            item_id,
            url,
            clear_url,
            active,
        } => {
            let patch = OverridePatch {
                access_url: if clear_url { Some(None) } else { url.map(Some) },
                active,
            };
            print_json(&admin.set_override(&actor, &item_id, patch).await?)?;
        }

        Command::ResetOverride { item_id } => {
            print_json(&admin.reset_override(&actor, &item_id).await?)?;
        }

        Command::Dynamic { command } => match command {
            DynamicCommand::Add {
                kind,
                title,
                url,
                description,
                category,
                age_range,
                media_ref,
                plans,
                inactive,
            } => {
                let item = NewDynamicItem {
                    title,
                    description,
                    media_ref,
                    access_url: url,
                    category,
                    age_range,
                    available_plans: plans.to_plan_set().unwrap_or_default(),
                    active: !inactive,
                };
                print_json(&admin.create_dynamic_item(&actor, kind, item).await?)?;
            }
            DynamicCommand::Update {
                kind,
                id,
                title,
                url,
                description,
                category,
                plans,
                active,
            } => {
                let patch = DynamicItemPatch {
                    title,
                    description,
                    access_url: url,
                    category,
                    available_plans: plans.to_plan_set(),
                    active,
                    ..Default::default()
                };
                print_json(&admin.update_dynamic_item(&actor, kind, &id, patch).await?)?;
            }
            DynamicCommand::Remove { kind, id } => {
                admin.delete_dynamic_item(&actor, kind, &id).await?;
                info!(kind = %kind, id = %id, "Removed");
            }
        },

        Command::Matrix { command } => {
            let current = match command {
                MatrixCommand::Show => matrix.load().await?,
                MatrixCommand::Set {
                    tier,
                    feature,
                    included,
                } => matrix.set_feature(&actor, tier, feature, included).await?,
                MatrixCommand::Reset => matrix.reset(&actor).await?,
            };
            print_json(&current.to_rows())?;
        }

        Command::Access {
            kind,
            item_id,
            plan,
            simulate,
        } => {
            let items = resolver.resolve(kind).await?;
            let item = items
                .iter()
                .find(|i| i.id == item_id)
                .ok_or_else(|| anyhow!("No {} item with id {}", kind, item_id))?;

            let simulator = PlanSimulator::new(Arc::new(MemorySessionStore::new()));
            let identity = if simulate {
                let effective = simulator.set_simulated_tier(&actor, plan);
                audit
                    .log(
                        AuditEvent::new(AuditEventType::PlanSimulationChanged, &actor.id)
                            .with_target(effective.tier.key()),
                    )
                    .await;
                actor.clone()
            } else {
                Identity::member("plangate-cli-member", plan)
            };

            let effective = simulator.effective_plan(&identity);
            let is_admin = admin_bypass(&identity, &effective);
            print_json(&AccessReport {
                item_id: &item.id,
                plan: effective.tier.key(),
                simulating: effective.is_simulating,
                granted: can_access(item, &effective, is_admin),
                upgrade_hint: upgrade_hint(item, &effective, is_admin).map(|t| t.key()),
            })?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessReport<'a> {
    item_id: &'a str,
    plan: &'static str,
    simulating: bool,
    granted: bool,
    upgrade_hint: Option<&'static str>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
