//! Main entry point for the checkout service.
//!
//! `checkout submit` runs one checkout against the configured ordering
//! backend and prints every view the customer would see. `checkout serve`
//! runs an in-memory demo backend to submit against.

use checkout_config::Config;
use checkout_core::{CheckoutBuilder, CheckoutEngine, CheckoutError, CheckoutFactories};
use checkout_store::CartStore;
use checkout_types::{cart_total, CartItem, CustomerFormData, FormField, SubmissionState};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod render;
mod server;

// Import implementations from individual crates
use checkout_delivery::implementations::http::create_http_delivery;
use checkout_delivery::implementations::mock::create_mock_delivery;

/// Command-line arguments for the checkout service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Submits the cart as an order, printing each checkout view
	Submit(SubmitArgs),
	/// Runs the demo orders backend
	Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
struct SubmitArgs {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// JSON file with the cart items
	#[arg(long)]
	cart: PathBuf,

	/// Full name of the customer
	#[arg(long, default_value = "")]
	name: String,

	/// E-mail address of the customer
	#[arg(long, default_value = "")]
	email: String,

	#[arg(long, default_value = "")]
	street: String,

	#[arg(long, default_value = "")]
	city: String,

	#[arg(long, default_value = "")]
	zip: String,
}

impl SubmitArgs {
	fn form_data(&self) -> CustomerFormData {
		CustomerFormData::new()
			.with(FormField::Name, self.name.as_str())
			.with(FormField::Email, self.email.as_str())
			.with(FormField::Street, self.street.as_str())
			.with(FormField::City, self.city.as_str())
			.with(FormField::Zip, self.zip.as_str())
	}
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(short, long, default_value_t = 3000)]
	port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	// Create env filter with default from args
	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	match args.command {
		Command::Submit(submit) => run_checkout(submit).await?,
		Command::Serve(serve) => server::start_server(&serve.host, serve.port).await?,
	}

	Ok(())
}

/// Runs one checkout: opens it, submits the form and acknowledges the
/// order on success. Fails when the order was not accepted.
async fn run_checkout(args: SubmitArgs) -> Result<(), Box<dyn std::error::Error>> {
	let config = Config::from_file(&args.config).await?;
	tracing::info!(orders_url = %config.checkout.orders_url(), "Loaded configuration");

	let items = load_cart(&args.cart).await?;
	let engine = build_engine(config, items)?;

	engine.open_checkout().await;
	print_view(&engine).await;

	let state = match engine.submit(&args.form_data()).await {
		Ok(state) => state,
		Err(CheckoutError::InvalidForm(errors)) => {
			print_view(&engine).await;
			return Err(errors.into());
		},
		Err(e) => return Err(e.into()),
	};
	print_view(&engine).await;

	match state {
		SubmissionState::Succeeded { data, .. } => {
			if let Some(id) = data.get("id").and_then(|id| id.as_str()) {
				tracing::info!(order_id = %id, "Order accepted");
			}
			engine.acknowledge_success().await?;
			Ok(())
		},
		SubmissionState::Failed { message, .. } => {
			Err(format!("Failed to submit order: {}", message).into())
		},
		other => Err(format!("Unexpected submission state: {}", other.status()).into()),
	}
}

async fn print_view(engine: &CheckoutEngine) {
	if let Some(view) = engine.view().await {
		println!("{}", render::render_view(&view));
	}
}

/// Reads the cart items from a JSON array file. Carts whose total cannot be
/// computed are rejected.
async fn load_cart(path: &Path) -> Result<Vec<CartItem>, Box<dyn std::error::Error>> {
	let content = tokio::fs::read_to_string(path)
		.await
		.map_err(|e| format!("Cannot read cart file {}: {}", path.display(), e))?;
	let items: Vec<CartItem> = serde_json::from_str(&content)
		.map_err(|e| format!("Invalid cart file {}: {}", path.display(), e))?;
	cart_total(&items).map_err(|e| format!("Invalid cart file {}: {}", path.display(), e))?;
	Ok(items)
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value, &str) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the checkout engine with all delivery implementations.
fn build_engine(
	config: Config,
	items: Vec<CartItem>,
) -> Result<CheckoutEngine, Box<dyn std::error::Error>> {
	let delivery_factories = create_factory_map!(
		checkout_delivery::OrderDeliveryInterface,
		checkout_delivery::DeliveryError,
		"http" => create_http_delivery,
		"mock" => create_mock_delivery,
	);

	let engine = CheckoutBuilder::new(config)
		.with_cart(Arc::new(CartStore::with_items(items)?))
		.build(CheckoutFactories { delivery_factories })?;
	Ok(engine)
}
