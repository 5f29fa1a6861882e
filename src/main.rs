use clap::{Parser, Subcommand};
use droppit::application::checkout::Checkout;
use droppit::application::intents::IntentService;
use droppit::application::ledger::{BookingLedger, Promotion};
use droppit::application::sizing::SizingAdvisor;
use droppit::config::{DEFAULT_API_URL, DEFAULT_LISTEN_ADDR, StoreArgs};
use droppit::domain::booking::Booking;
use droppit::domain::checkout::CheckoutRequest;
use droppit::domain::payment::PaymentDetails;
use droppit::domain::ports::{IntentGatewayBox, IntentIssuerBox, PaymentProviderBox};
use droppit::infrastructure::gemini::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE, GeminiModel};
use droppit::infrastructure::simulated::{SimulatedIssuer, SimulatedOutcome, SimulatedProvider};
use droppit::infrastructure::stripe::{StripeIntentIssuer, StripePaymentProvider};
use droppit::interfaces::csv::booking_writer::BookingWriter;
use droppit::interfaces::http::client::{HttpIntentGateway, review_url};
use droppit::interfaces::http::server;
use droppit::telemetry;
use miette::{IntoDiagnostic, Result, miette};
use serde_json::Value;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage a booking in the pending slot ahead of checkout
    Stage {
        #[arg(long)]
        order_id: String,

        /// Extra booking field as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Pay for an order and record its booking
    Checkout {
        #[arg(long)]
        order_id: String,

        #[arg(long)]
        amount_cents: String,

        /// Payment method collected by the provider's entry surface
        #[arg(long, default_value = "pm_card_visa")]
        payment_method: String,

        /// Return URL for payment methods that force a redirect
        /// [default: <api-url origin>/review?orderId=<order-id>]
        #[arg(long)]
        return_url: Option<String>,

        /// Base URL of the checkout backend
        #[arg(long, env = "DROPPIT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        #[arg(long, env = "STRIPE_PUBLISHABLE_KEY", default_value = "", hide_env_values = true)]
        publishable_key: String,

        /// Run offline: the provider answers every confirmation with this outcome
        /// (a payment status such as succeeded or requires_action, or declined, or error)
        #[arg(long)]
        simulate: Option<SimulatedOutcome>,
    },

    /// Promote the pending booking of an already paid order
    Promote {
        #[arg(long)]
        order_id: String,
    },

    /// Print the booking collection as CSV, newest first
    Bookings,

    /// Suggest a package size for an item description
    Size {
        description: String,

        #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
        api_key: String,

        #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
        model: String,

        #[arg(long, default_value = GEMINI_API_BASE)]
        api_base: String,
    },

    /// Serve the create-payment-intent endpoint
    Serve {
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        addr: SocketAddr,

        #[arg(long, env = "STRIPE_SECRET_KEY", default_value = "", hide_env_values = true)]
        secret_key: String,

        /// Issue simulated intents instead of calling Stripe
        #[arg(long)]
        simulate: bool,
    },
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Stage { order_id, fields } => {
            let booking = fields
                .into_iter()
                .fold(Booking::new(order_id), |booking, (key, value)| {
                    // Numbers and booleans keep their JSON type.
                    let value = serde_json::from_str::<Value>(&value)
                        .ok()
                        .filter(|v| !v.is_string())
                        .unwrap_or(Value::String(value));
                    booking.with_field(key, value)
                });
            let ledger = BookingLedger::new(cli.store.open().into_diagnostic()?);
            ledger.stage(&booking).await.into_diagnostic()?;
            println!("staged pending booking {}", booking.id);
        }

        Command::Checkout {
            order_id,
            amount_cents,
            payment_method,
            return_url,
            api_url,
            publishable_key,
            simulate,
        } => {
            let request = CheckoutRequest::parse(Some(&order_id), Some(&amount_cents))
                .into_diagnostic()?;
            let return_url = match return_url {
                Some(url) => url,
                None => review_url(&api_url, request.order_id()).into_diagnostic()?,
            };
            let ledger = BookingLedger::new(cli.store.open().into_diagnostic()?);

            let (gateway, provider): (IntentGatewayBox, PaymentProviderBox) = match simulate {
                Some(outcome) => (
                    Box::new(IntentService::new(Box::new(SimulatedIssuer::new()))),
                    Box::new(SimulatedProvider::new(outcome)),
                ),
                None => (
                    Box::new(HttpIntentGateway::new(api_url)),
                    Box::new(StripePaymentProvider::new(publishable_key)),
                ),
            };

            println!("checkout {} for {}", request.order_id(), request.amount());
            let checkout = Checkout::new(request, gateway, provider, ledger);
            let paid = checkout.paid().await;

            checkout.boot().await.into_diagnostic()?;
            let state = checkout.state();
            if !state.can_submit() {
                println!("state: {}", state);
                return Ok(());
            }

            let details = PaymentDetails::new(payment_method).with_return_url(return_url);
            let state = checkout.submit(Some(&details)).await.into_diagnostic()?;
            println!("state: {}", state);

            if let Some(Ok(order)) = paid.map(|mut rx| rx.try_recv()) {
                println!("paid: {} ({})", order.order_id, order.status);
            }
        }

        Command::Promote { order_id } => {
            let ledger = BookingLedger::new(cli.store.open().into_diagnostic()?);
            match ledger.promote(&order_id).await.into_diagnostic()? {
                Promotion::Promoted => println!("promoted {}", order_id),
                Promotion::NoPending => println!("no pending booking"),
                Promotion::Mismatch { pending_id } => {
                    println!("pending booking belongs to {}; nothing promoted", pending_id)
                }
                Promotion::AlreadyRecorded => println!("{} already recorded", order_id),
            }
        }

        Command::Bookings => {
            let ledger = BookingLedger::new(cli.store.open().into_diagnostic()?);
            let bookings = ledger.bookings().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = BookingWriter::new(stdout.lock());
            writer.write_bookings(&bookings).into_diagnostic()?;
        }

        Command::Size {
            description,
            api_key,
            model,
            api_base,
        } => {
            let model = GeminiModel::new(api_key)
                .with_model(model)
                .with_base_url(api_base);
            let advisor = SizingAdvisor::new(Box::new(model));
            println!("{}", advisor.suggest(&description).await);
        }

        Command::Serve {
            addr,
            secret_key,
            simulate,
        } => {
            let issuer: IntentIssuerBox = if simulate {
                Box::new(SimulatedIssuer::new())
            } else if secret_key.trim().is_empty() {
                return Err(miette!(
                    "STRIPE_SECRET_KEY is required unless --simulate is set"
                ));
            } else {
                Box::new(StripeIntentIssuer::new(secret_key))
            };
            let service = Arc::new(IntentService::new(issuer));
            server::serve(addr, service).await.into_diagnostic()?;
        }
    }

    Ok(())
}
