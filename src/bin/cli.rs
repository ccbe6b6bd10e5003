//! MTP CLI Client
//!
//! Command-line interface for talking to an MTP product server.

use clap::{Parser, Subcommand};
use mtp::market::{MarketClient, Product};
use mtp::{Client, Message};

/// MTP CLI
#[derive(Parser, Debug)]
#[command(name = "mtp-cli")]
#[command(about = "CLI for the MTP product catalog")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all products
    List,

    /// Show one product
    Get {
        /// Product id
        id: u64,
    },

    /// Add a product
    Add {
        /// Product name
        name: String,

        /// Price in minor currency units
        price: i64,
    },

    /// Send a raw message and print the reply
    Send {
        /// Message type
        kind: u64,

        /// Payload line
        #[arg(default_value = "")]
        payload: String,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> mtp::Result<()> {
    let server = args.server.as_str();

    match args.command {
        Commands::List => with_market(server, |client| {
            for product in client.products()? {
                print_product(&product);
            }
            Ok(())
        }),
        Commands::Get { id } => with_market(server, |client| {
            print_product(&client.product(id)?);
            Ok(())
        }),
        Commands::Add { name, price } => with_market(server, |client| {
            print_product(&client.add_product(Product::new(name, price))?);
            Ok(())
        }),
        Commands::Send { kind, payload } => {
            let mut client = Client::dial(server)?;
            let reply = client.request(&Message::new(kind, payload))?;
            println!("{}", reply);
            client.close()
        }
    }
}

fn with_market<F>(server: &str, action: F) -> mtp::Result<()>
where
    F: FnOnce(&mut MarketClient) -> mtp::Result<()>,
{
    let mut client = MarketClient::dial(server)?;
    action(&mut client)?;
    client.close()
}

fn print_product(product: &Product) {
    println!("{:>4}  {:<24} {:>10}", product.id, product.name, product.price);
}
