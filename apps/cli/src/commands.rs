use anyhow::bail;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use repricer_core::market_data::{MarketSide, SyncOutcome, SyncRequest, DEFAULT_INTERVAL_COUNT};
use repricer_core::variants::NewVariant;

use crate::main_lib::AppState;

#[derive(Parser, Debug)]
#[command(name = "repricer", version, about = "Marketplace sales history sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a variant to track
    AddVariant(AddVariantArgs),
    /// Register every size of a catalog product
    ImportProduct {
        /// Style id, UPC or search text
        query: String,
    },
    /// List registered variants
    ListVariants,
    /// Fetch new sales and price points for one variant
    Sync {
        /// Local variant id
        variant: String,
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Sync every registered variant
    SyncAll(SyncArgs),
    /// Show stored sales
    Sales {
        variant: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show stored historical price points
    Prices {
        variant: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show live bids or asks
    Levels {
        variant: String,
        #[arg(long, value_enum)]
        side: SideArg,
    },
}

#[derive(Debug, Args)]
pub struct AddVariantArgs {
    /// Local id; generated when omitted
    #[arg(long)]
    id: Option<String>,
    /// Marketplace variant UUID
    #[arg(long)]
    external_id: String,
    /// Marketplace product UUID
    #[arg(long)]
    product_id: String,
    #[arg(long)]
    name: String,
    /// Size label
    #[arg(long)]
    value: Option<String>,
    #[arg(long)]
    upc: Option<String>,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct SyncArgs {
    /// Number of historical intervals to request
    #[arg(long, default_value_t = DEFAULT_INTERVAL_COUNT)]
    intervals: u32,
    /// Explicit window start (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Explicit window end (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl From<SyncArgs> for SyncRequest {
    fn from(args: SyncArgs) -> Self {
        SyncRequest {
            interval_count: args.intervals,
            start_date: args.start,
            end_date: args.end,
        }
    }
}

#[derive(Debug, Clone, Copy, Args)]
pub struct RangeArgs {
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SideArg {
    Bid,
    Ask,
}

impl From<SideArg> for MarketSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Bid => MarketSide::Bid,
            SideArg::Ask => MarketSide::Ask,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncAllEntry {
    variant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Whether re-running the sync later may succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl SyncAllEntry {
    fn new(variant_id: String, result: repricer_core::Result<SyncOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                variant_id,
                outcome: Some(outcome),
                error: None,
                retryable: None,
            },
            Err(e) => Self {
                variant_id,
                outcome: None,
                error: Some(e.to_string()),
                retryable: Some(e.is_retryable()),
            },
        }
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(command: Command, state: &AppState) -> anyhow::Result<()> {
    match command {
        Command::AddVariant(args) => {
            let variant = state
                .variant_service
                .create_variant(NewVariant {
                    id: args.id,
                    external_id: args.external_id,
                    product_id: args.product_id,
                    name: args.name,
                    value: args.value,
                    upc: args.upc,
                })
                .await?;
            tracing::info!("Registered variant {}", variant.id);
            print_json(&variant)
        }
        Command::ImportProduct { query } => {
            let import = state.import_service.import_product(&query).await?;
            tracing::info!(
                "Product {}: {} variants registered, {} already present",
                import.product.style_id,
                import.created.len(),
                import.existing.len()
            );
            print_json(&import)
        }
        Command::ListVariants => print_json(&state.variant_service.list_variants().await?),
        Command::Sync { variant, sync } => {
            let outcome = state
                .market_data_service
                .sync(&variant, sync.into())
                .await?;
            tracing::info!(
                "Variant {}: {} new sales, {} new price points",
                variant,
                outcome.sales_count,
                outcome.price_points_count
            );
            print_json(&outcome)
        }
        Command::SyncAll(sync) => {
            let results = state.market_data_service.sync_all(sync.into()).await?;
            let entries: Vec<_> = results
                .into_iter()
                .map(|(variant_id, result)| SyncAllEntry::new(variant_id, result))
                .collect();
            let total = entries.len();
            let failed = entries.iter().filter(|e| e.failed()).count();
            print_json(&entries)?;
            if failed > 0 {
                bail!("{} of {} variants failed to sync", failed, total);
            }
            Ok(())
        }
        Command::Sales { variant, range } => print_json(
            &state
                .market_data_service
                .get_sales(&variant, range.start, range.end)
                .await?,
        ),
        Command::Prices { variant, range } => print_json(
            &state
                .market_data_service
                .get_price_points(&variant, range.start, range.end)
                .await?,
        ),
        Command::Levels { variant, side } => print_json(
            &state
                .market_data_service
                .get_price_levels(&variant, side.into())
                .await?,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use repricer_core::errors::{DatabaseError, Error};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_arguments() {
        let cli = Cli::try_parse_from([
            "repricer",
            "sync",
            "v1",
            "--intervals",
            "50",
            "--start",
            "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Command::Sync { variant, sync } => {
                assert_eq!(variant, "v1");
                let request = SyncRequest::from(sync);
                assert_eq!(request.interval_count, 50);
                assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(request.end_date, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_sync_all_defaults_to_400_intervals() {
        let cli = Cli::try_parse_from(["repricer", "sync-all"]).unwrap();
        match cli.command {
            Command::SyncAll(sync) => {
                let request = SyncRequest::from(sync);
                assert_eq!(request, SyncRequest::default());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_levels_requires_known_side() {
        let cli = Cli::try_parse_from(["repricer", "levels", "v1", "--side", "ask"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Levels {
                side: SideArg::Ask,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["repricer", "levels", "v1", "--side", "mid"]).is_err());
    }

    #[test]
    fn test_import_product_takes_query() {
        let cli = Cli::try_parse_from(["repricer", "import-product", "DZ5485-612"]).unwrap();
        match cli.command {
            Command::ImportProduct { query } => assert_eq!(query, "DZ5485-612"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["repricer", "import-product"]).is_err());
    }

    #[test]
    fn test_sync_all_entry_reports_retryable_failures() {
        let ok = SyncAllEntry::new("v1".into(), Ok(SyncOutcome::default()));
        assert!(!ok.failed());
        let ok = serde_json::to_value(&ok).unwrap();
        assert!(ok.get("retryable").is_none());
        assert_eq!(ok["outcome"]["salesCount"], 0);

        let busy = SyncAllEntry::new(
            "v2".into(),
            Err(Error::Database(DatabaseError::QueryFailed("busy".into()))),
        );
        assert!(busy.failed());
        assert_eq!(serde_json::to_value(&busy).unwrap()["retryable"], true);

        let missing = SyncAllEntry::new("v3".into(), Err(Error::NotFound("Variant v3".into())));
        assert_eq!(missing.retryable, Some(false));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["repricer", "sales", "v1", "--start", "01/02/2024"]).is_err());
    }
}
